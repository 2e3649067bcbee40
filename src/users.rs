//! The `/users` resource: list, get, create, update, delete.
//!
//! Every handler receives the shared [`UserStore`] and returns
//! `Result<Response, ApiError>`, so each failure leaves the handler through
//! `?` with exactly one response.

use std::sync::Arc;

use http::header::{self, HeaderValue};
use http::StatusCode;
use serde::Serialize;
use tracing::{debug, error};
use uuid::Uuid;

use crate::request::Request;
use crate::response::{IntoResponse, Response};
use crate::router::Router;
use crate::store::UserStore;
use crate::user::{User, UserRecord};
use crate::validate;

/// Builds the router serving the user resource over `store`.
pub fn routes(store: Arc<UserStore>) -> Router<Arc<UserStore>> {
    Router::new(store)
        .get("/users", list)
        .get("/users/{id}", find)
        .post("/users", create)
        .put("/users/{id}", update)
        .delete("/users/{id}", delete)
}

/// Why a user request was turned away.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid ID")]
    InvalidId,

    #[error("User not found")]
    NotFound,

    #[error("Invalid request body")]
    InvalidBody,

    #[error("Error parsing response")]
    Encode(#[source] serde_json::Error),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::InvalidId | Self::InvalidBody => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if let Self::Encode(e) = &self {
            error!("failed to serialize response: {e}");
        }
        Response::error(self.status(), &self.to_string())
    }
}

/// `GET /users`
pub async fn list(store: Arc<UserStore>, _req: Request) -> Result<Response, ApiError> {
    let users = store.list();
    let records: Vec<UserRecord<'_>> = users
        .iter()
        .map(|(id, user)| UserRecord::new(*id, user))
        .collect();
    Ok(Response::json(encode(&records)?))
}

/// `GET /users/{id}`
pub async fn find(store: Arc<UserStore>, req: Request) -> Result<Response, ApiError> {
    let id = parse_id(&req)?;
    let user = store.get(&id).ok_or(ApiError::NotFound)?;
    Ok(Response::json(encode(&UserRecord::new(id, &user))?))
}

/// `POST /users`
pub async fn create(store: Arc<UserStore>, req: Request) -> Result<Response, ApiError> {
    let user = decode_user(&req)?;
    let id = store.insert(user.clone());
    debug!(%id, "user created");
    let body = encode(&UserRecord::new(id, &user))?;

    let mut res = Response::builder().status(StatusCode::CREATED);
    if let Ok(location) = HeaderValue::from_str(&format!("/users/{id}")) {
        res = res.header(header::LOCATION, location);
    }
    Ok(res.json(body))
}

/// `PUT /users/{id}`
///
/// Always writes. Replacing an id that did not exist still stores the user
/// but answers `404`, telling the caller there was nothing to update.
pub async fn update(store: Arc<UserStore>, req: Request) -> Result<Response, ApiError> {
    let id = parse_id(&req)?;
    let user = decode_user(&req)?;

    if store.put(id, user.clone()).is_none() {
        debug!(%id, "update stored a previously unknown user");
        return Err(ApiError::NotFound);
    }

    Ok(Response::json(encode(&UserRecord::new(id, &user))?))
}

/// `DELETE /users/{id}`
pub async fn delete(store: Arc<UserStore>, req: Request) -> Result<StatusCode, ApiError> {
    let id = parse_id(&req)?;
    if !store.delete(&id) {
        return Err(ApiError::NotFound);
    }
    debug!(%id, "user deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn parse_id(req: &Request) -> Result<Uuid, ApiError> {
    req.param("id")
        .and_then(|raw| Uuid::parse_str(raw).ok())
        .ok_or(ApiError::InvalidId)
}

fn decode_user(req: &Request) -> Result<User, ApiError> {
    validate::decode::<User>(req.body()).map_err(|e| {
        error!(
            request_id = req.request_id(),
            method = %req.method(),
            path = req.path(),
            error = %e,
            "request body validation error"
        );
        ApiError::InvalidBody
    })
}

fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, ApiError> {
    serde_json::to_vec(value).map_err(ApiError::Encode)
}
