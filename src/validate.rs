//! Request body validation against a declarative field schema.
//!
//! The body is parsed once into a JSON object. Keys are then checked
//! against the schema before the object is converted into the target type:
//!
//! 1. anything the schema does not recognise is rejected,
//! 2. every required key must be present and non-`null`,
//! 3. the remaining object must deserialize into `T`.
//!
//! Presence is the only requirement. `"bio": ""` satisfies the check;
//! omitting `bio` or sending `"bio": null` does not.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// Field layout of a JSON request body.
pub trait Schema: DeserializeOwned {
    /// Every key the body may contain.
    const FIELDS: &'static [&'static str];
    /// Keys that must be present with a non-`null` value.
    const REQUIRED: &'static [&'static str];
    /// Message reported when required keys are missing.
    const MISSING_MESSAGE: &'static str;
}

/// Why a request body was rejected.
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("malformed request body: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("request body must be a JSON object")]
    NotAnObject,

    #[error("unknown field `{0}`")]
    UnknownField(String),

    #[error("{message}")]
    MissingFields {
        message: &'static str,
        fields: Vec<&'static str>,
    },
}

/// Decodes `body` into `T`, enforcing `T`'s [`Schema`].
pub fn decode<T: Schema>(body: &[u8]) -> Result<T, ValidationError> {
    let object = match serde_json::from_slice::<Value>(body)? {
        Value::Object(object) => object,
        _ => return Err(ValidationError::NotAnObject),
    };

    if let Some(unknown) = object.keys().find(|key| !T::FIELDS.contains(&key.as_str())) {
        return Err(ValidationError::UnknownField(unknown.clone()));
    }

    let missing = missing_fields(&object, T::REQUIRED);
    if !missing.is_empty() {
        return Err(ValidationError::MissingFields {
            message: T::MISSING_MESSAGE,
            fields: missing,
        });
    }

    Ok(serde_json::from_value(Value::Object(object))?)
}

fn missing_fields(object: &Map<String, Value>, required: &[&'static str]) -> Vec<&'static str> {
    required
        .iter()
        .copied()
        .filter(|field| object.get(*field).is_none_or(Value::is_null))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::user::User;

    fn decode_user(body: &str) -> Result<User, ValidationError> {
        decode::<User>(body.as_bytes())
    }

    #[test]
    fn accepts_all_fields() {
        let user = decode_user(r#"{"first_name":"A","last_name":"B","bio":"C"}"#).unwrap();
        assert_eq!(user.first_name, "A");
        assert_eq!(user.last_name, "B");
        assert_eq!(user.bio, "C");
    }

    #[test]
    fn empty_strings_count_as_present() {
        let user = decode_user(r#"{"first_name":"","last_name":"","bio":""}"#).unwrap();
        assert_eq!(user, User::default());
    }

    #[test]
    fn missing_field_is_rejected_with_fixed_message() {
        let err = decode_user(r#"{"first_name":"A","last_name":"B"}"#).unwrap_err();
        assert_eq!(err.to_string(), "please provide FirstName LastName and bio for the user");
        match err {
            ValidationError::MissingFields { fields, .. } => assert_eq!(fields, vec!["bio"]),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn null_counts_as_missing() {
        let err = decode_user(r#"{"first_name":null,"last_name":"B","bio":"C"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::MissingFields { .. }));
    }

    #[test]
    fn unknown_field_is_rejected() {
        let err = decode_user(r#"{"first_name":"A","last_name":"B","bio":"C","age":3}"#).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField(ref f) if f == "age"));
    }

    #[test]
    fn field_names_are_case_sensitive() {
        let err = decode_user(r#"{"FIRST_NAME":"A","last_name":"B","bio":"C"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField(ref f) if f == "FIRST_NAME"));
    }

    #[test]
    fn unknown_field_wins_over_missing_fields() {
        let err = decode_user(r#"{"nickname":"x"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::UnknownField(_)));
    }

    #[test]
    fn invalid_json_is_malformed() {
        assert!(matches!(decode_user("{not json"), Err(ValidationError::Malformed(_))));
        assert!(matches!(decode_user(""), Err(ValidationError::Malformed(_))));
    }

    #[test]
    fn non_object_is_rejected() {
        assert!(matches!(decode_user(r#"["A","B","C"]"#), Err(ValidationError::NotAnObject)));
    }

    #[test]
    fn wrong_type_is_malformed() {
        let err = decode_user(r#"{"first_name":1,"last_name":"B","bio":"C"}"#).unwrap_err();
        assert!(matches!(err, ValidationError::Malformed(_)));
    }
}
