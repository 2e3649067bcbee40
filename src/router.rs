//! Radix-tree request router.
//!
//! One tree per HTTP method. O(path-length) lookup. You register a path, you
//! get a handler, and the router's shared state is handed to it on every
//! call.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;

use bytes::Bytes;
use http::header::{self, HeaderValue};
use http::{Method, StatusCode};
use http_body_util::{BodyExt, Full, LengthLimitError, Limited};
use hyper::body::Body;
use matchit::Router as MatchitRouter;
use tracing::{Instrument, info_span, warn};

use crate::handler::{BoxedHandler, Handler};
use crate::middleware::{self, REQUEST_ID_HEADER};
use crate::request::Request;
use crate::response::Response;

/// Boxed error type accepted from request bodies.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Request bodies larger than this are answered with `413`.
pub const DEFAULT_MAX_BODY_BYTES: usize = 1024 * 1024;

/// The application router.
///
/// Build it once at startup; pass it to [`Server::serve`](crate::Server::serve).
/// Each registration returns `self` so calls chain naturally.
pub struct Router<S> {
    routes: HashMap<Method, MatchitRouter<BoxedHandler<S>>>,
    state: S,
    max_body_bytes: usize,
}

impl<S> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// Creates an empty router whose handlers all receive a clone of `state`.
    pub fn new(state: S) -> Self {
        Self { routes: HashMap::new(), state, max_body_bytes: DEFAULT_MAX_BODY_BYTES }
    }

    /// Register a handler for a method + path pair.
    ///
    /// Path parameters use `{name}` syntax; `req.param("name")` retrieves them.
    ///
    /// # Panics
    ///
    /// Panics if `path` is not a valid route or conflicts with one already
    /// registered for `method`.
    pub fn on(self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.add(method, path, handler)
    }

    pub fn get(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::GET, path, handler)
    }

    pub fn post(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::POST, path, handler)
    }

    pub fn put(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::PUT, path, handler)
    }

    pub fn delete(self, path: &str, handler: impl Handler<S>) -> Self {
        self.on(Method::DELETE, path, handler)
    }

    /// Caps the size of request bodies. Defaults to [`DEFAULT_MAX_BODY_BYTES`].
    pub fn max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    pub fn state(&self) -> &S {
        &self.state
    }

    fn add(mut self, method: Method, path: &str, handler: impl Handler<S>) -> Self {
        self.routes
            .entry(method)
            .or_default()
            .insert(path, handler.into_boxed_handler())
            .unwrap_or_else(|e| panic!("invalid route `{path}`: {e}"));
        self
    }

    pub(crate) fn lookup(
        &self,
        method: &Method,
        path: &str,
    ) -> Option<(BoxedHandler<S>, HashMap<String, String>)> {
        let tree = self.routes.get(method)?;
        let matched = tree.at(path).ok()?;
        let handler = Arc::clone(matched.value);
        let params = matched
            .params
            .iter()
            .map(|(k, v)| (k.to_owned(), v.to_owned()))
            .collect();
        Some((handler, params))
    }

    /// Methods that have a route matching `path`, in a stable order.
    fn allowed_methods(&self, path: &str) -> Vec<&Method> {
        let mut methods: Vec<&Method> = self
            .routes
            .iter()
            .filter(|(_, tree)| tree.at(path).is_ok())
            .map(|(method, _)| method)
            .collect();
        methods.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        methods
    }

    /// Runs one request through the full pipeline: request id, span, body
    /// collection, routing, the handler, and the access log.
    ///
    /// The server calls this once per request. Tests can call it directly
    /// with any `http::Request` whose body yields [`Bytes`].
    pub async fn handle<B>(&self, req: http::Request<B>) -> http::Response<Full<Bytes>>
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let started = Instant::now();
        let request_id = middleware::request_id(req.headers());
        let method = req.method().clone();
        let path = req.uri().path().to_owned();
        let span = info_span!("request", id = %request_id, %method, path = %path);

        let mut response = self.route(req, request_id.clone()).instrument(span.clone()).await;

        if let Ok(value) = HeaderValue::from_str(&request_id) {
            response.headers_mut().insert(REQUEST_ID_HEADER.clone(), value);
        }
        span.in_scope(|| middleware::log_access(&method, &path, response.status_code(), started));

        response.into_inner()
    }

    async fn route<B>(&self, req: http::Request<B>, request_id: String) -> Response
    where
        B: Body<Data = Bytes> + Send + 'static,
        B::Error: Into<BoxError>,
    {
        let Some((handler, params)) = self.lookup(req.method(), req.uri().path()) else {
            return self.unmatched(req.uri().path());
        };

        let (parts, body) = req.into_parts();
        let body = match Limited::new(body, self.max_body_bytes).collect().await {
            Ok(collected) => collected.to_bytes(),
            Err(e) if e.downcast_ref::<LengthLimitError>().is_some() => {
                return Response::error(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large");
            }
            Err(e) => {
                warn!("failed to read request body: {e}");
                return Response::error(StatusCode::BAD_REQUEST, "Error reading request body");
            }
        };

        let req = Request::new(parts, body, params, request_id);
        middleware::recover(handler.call(self.state.clone(), req)).await
    }

    fn unmatched(&self, path: &str) -> Response {
        let allowed = self.allowed_methods(path);
        if allowed.is_empty() {
            return Response::error(StatusCode::NOT_FOUND, "404 page not found");
        }

        let allow = allowed.iter().map(|m| m.as_str()).collect::<Vec<_>>().join(", ");
        let mut response = Response::builder().status(StatusCode::METHOD_NOT_ALLOWED);
        if let Ok(value) = HeaderValue::from_str(&allow) {
            response = response.header(header::ALLOW, value);
        }
        response.no_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::StatusCode;

    async fn echo_id(_state: (), req: Request) -> String {
        req.param("id").unwrap_or("none").to_owned()
    }

    async fn echo_body(_state: (), req: Request) -> Response {
        Response::json(req.body().to_vec())
    }

    async fn count(state: Arc<std::sync::atomic::AtomicUsize>, _req: Request) -> StatusCode {
        state.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        StatusCode::NO_CONTENT
    }

    fn request(method: Method, path: &str, body: &'static str) -> http::Request<Full<Bytes>> {
        http::Request::builder()
            .method(method)
            .uri(path)
            .body(Full::new(Bytes::from_static(body.as_bytes())))
            .unwrap()
    }

    async fn body_of(res: http::Response<Full<Bytes>>) -> Bytes {
        res.into_body().collect().await.unwrap().to_bytes()
    }

    #[tokio::test]
    async fn path_params_reach_the_handler() {
        let app = Router::new(()).get("/users/{id}", echo_id);
        let res = app.handle(request(Method::GET, "/users/42", "")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(res).await, "42");
    }

    #[tokio::test]
    async fn state_is_shared_between_calls() {
        let hits = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let app = Router::new(Arc::clone(&hits)).post("/hit", count);
        for _ in 0..3 {
            let res = app.handle(request(Method::POST, "/hit", "")).await;
            assert_eq!(res.status(), StatusCode::NO_CONTENT);
        }
        assert_eq!(hits.load(std::sync::atomic::Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn unknown_path_is_404() {
        let app = Router::new(()).get("/users/{id}", echo_id);
        let res = app.handle(request(Method::GET, "/nope", "")).await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(res).await, "404 page not found\n");
    }

    #[tokio::test]
    async fn wrong_method_is_405_with_allow() {
        let app = Router::new(())
            .get("/users/{id}", echo_id)
            .delete("/users/{id}", echo_id);
        let res = app.handle(request(Method::PATCH, "/users/1", "")).await;
        assert_eq!(res.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(res.headers()[header::ALLOW], "DELETE, GET");
        assert!(body_of(res).await.is_empty());
    }

    #[tokio::test]
    async fn on_registers_any_method() {
        async fn describe(_state: (), req: Request) -> String {
            format!("{} {} {}", req.method(), req.path(), req.request_id())
        }

        let app = Router::new(()).on(Method::PATCH, "/users/{id}", describe);
        let req = http::Request::builder()
            .method(Method::PATCH)
            .uri("/users/7?full=true")
            .header("x-request-id", "req-1")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let res = app.handle(req).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(res).await, "PATCH /users/7 req-1");
    }

    #[tokio::test]
    async fn oversized_body_is_413() {
        let app = Router::new(()).post("/echo", echo_body).max_body_bytes(4);
        let res = app.handle(request(Method::POST, "/echo", "too long")).await;
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let res = app.handle(request(Method::POST, "/echo", "ok")).await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_of(res).await, "ok");
    }

    #[tokio::test]
    async fn response_carries_request_id() {
        let app = Router::new(()).get("/users/{id}", echo_id);
        let req = http::Request::builder()
            .uri("/users/1")
            .header("x-request-id", "trace-me")
            .body(Full::new(Bytes::new()))
            .unwrap();
        let res = app.handle(req).await;
        assert_eq!(res.headers()["x-request-id"], "trace-me");
    }

    #[test]
    #[should_panic(expected = "invalid route")]
    fn conflicting_route_panics() {
        let _ = Router::new(())
            .get("/users/{id}", echo_id)
            .get("/users/{name}", echo_id);
    }
}
