//! The user resource and its wire representation.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::validate::Schema;

/// A user as submitted by clients. Identity lives outside the struct.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct User {
    pub first_name: String,
    pub last_name: String,
    pub bio: String,
}

impl Schema for User {
    const FIELDS: &'static [&'static str] = &["first_name", "last_name", "bio"];
    const REQUIRED: &'static [&'static str] = &["first_name", "last_name", "bio"];
    const MISSING_MESSAGE: &'static str = "please provide FirstName LastName and bio for the user";
}

/// A stored user with its identifier, flattened into one JSON object:
/// `{"id":"…","first_name":"…","last_name":"…","bio":"…"}`.
#[derive(Debug, Serialize)]
pub struct UserRecord<'a> {
    pub id: Uuid,
    #[serde(flatten)]
    pub user: &'a User,
}

impl<'a> UserRecord<'a> {
    pub fn new(id: Uuid, user: &'a User) -> Self {
        Self { id, user }
    }
}
