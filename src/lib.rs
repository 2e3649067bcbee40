//! # roster
//!
//! An in-memory CRUD service for a single "user" resource, on top of a
//! small HTTP core. Nothing is persisted: restart the process and the users
//! are gone.
//!
//! ## Endpoints
//!
//! | Method | Path | Success | Failure |
//! |---|---|---|---|
//! | `GET` | `/users` | 200, JSON array | 500 serialize error |
//! | `GET` | `/users/{id}` | 200, JSON object | 400 invalid id, 404 |
//! | `POST` | `/users` | 201, JSON object with new id | 400 invalid body |
//! | `PUT` | `/users/{id}` | 200, JSON object | 400, 404 (the write still happens) |
//! | `DELETE` | `/users/{id}` | 204 | 400, 404 |
//!
//! Bodies are exactly `{"first_name", "last_name", "bio"}`: unknown keys are
//! rejected, missing or `null` keys are rejected, empty strings are fine.
//!
//! ## The HTTP core
//!
//! - Radix-tree routing, one tree per method, via [`matchit`]
//! - hyper 1.x on tokio, HTTP/1.1 and HTTP/2
//! - Shared state injected into every handler call
//! - Request ids, access logging, panic recovery
//! - Graceful shutdown on SIGTERM / Ctrl-C, draining in-flight requests
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use roster::{Server, UserStore, users};
//!
//! #[tokio::main]
//! async fn main() {
//!     let app = users::routes(Arc::new(UserStore::new()));
//!     Server::bind("localhost:8080").serve(app).await.unwrap();
//! }
//! ```

mod error;
mod handler;
mod request;
mod response;
mod router;
mod server;

pub mod config;
pub mod logging;
pub mod middleware;
pub mod store;
pub mod user;
pub mod users;
pub mod validate;

pub use config::Config;
pub use error::Error;
pub use handler::Handler;
pub use request::Request;
pub use response::{IntoResponse, Response, ResponseBuilder};
pub use router::{BoxError, DEFAULT_MAX_BODY_BYTES, Router};
pub use server::Server;
pub use store::{Store, UserStore};
pub use user::{User, UserRecord};
