//! Hand-rolled request dispatcher.
//!
//! The bridge routes without a framework router: a fixed list of
//! `(pattern, method -> handler)` rules matched by segment count and
//! literal/`:param` equality. At fewer than ten routes a linear scan per
//! request needs no more machinery than this. axum is used purely as the
//! connection/serve layer; every request falls through to [`dispatch`].

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
};
use futures::future::BoxFuture;

use crate::error::AccessBridgeError;
use crate::AppState;

/// Path parameters bound from `:`-prefixed pattern segments.
pub type PathParams = HashMap<String, String>;

type Handler = Arc<
    dyn Fn(AppState, Request, PathParams) -> BoxFuture<'static, Result<Response, AccessBridgeError>>
        + Send
        + Sync,
>;

/// Methods the dispatcher considers at all; anything else is rejected
/// before pattern matching.
const ALLOWED_METHODS: [Method; 4] = [Method::GET, Method::POST, Method::PUT, Method::DELETE];

/// One endpoint pattern with its per-method handlers.
pub struct Route {
    pattern: &'static str,
    handlers: Vec<(Method, Handler)>,
}

impl Route {
    pub fn new(pattern: &'static str) -> Self {
        Self {
            pattern,
            handlers: Vec::new(),
        }
    }

    pub fn get<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(AppState, Request, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, AccessBridgeError>> + Send + 'static,
    {
        self.on(Method::GET, handler)
    }

    pub fn post<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(AppState, Request, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, AccessBridgeError>> + Send + 'static,
    {
        self.on(Method::POST, handler)
    }

    pub fn put<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(AppState, Request, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, AccessBridgeError>> + Send + 'static,
    {
        self.on(Method::PUT, handler)
    }

    pub fn delete<H, Fut>(self, handler: H) -> Self
    where
        H: Fn(AppState, Request, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, AccessBridgeError>> + Send + 'static,
    {
        self.on(Method::DELETE, handler)
    }

    fn on<H, Fut>(mut self, method: Method, handler: H) -> Self
    where
        H: Fn(AppState, Request, PathParams) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Response, AccessBridgeError>> + Send + 'static,
    {
        let handler: Handler = Arc::new(
            move |state: AppState,
                  request: Request,
                  params: PathParams|
                  -> BoxFuture<'static, Result<Response, AccessBridgeError>> {
                Box::pin(handler(state, request, params))
            },
        );
        self.handlers.push((method, handler));
        self
    }

    /// Match a URL path against the pattern. Both are split on `/`; the
    /// pattern matches only if the segment counts are equal and every
    /// non-`:` segment matches literally. `:`-segments bind into the
    /// returned params map.
    fn matches(&self, path: &str) -> Option<PathParams> {
        let pattern_segments: Vec<&str> = self.pattern.split('/').collect();
        let path_segments: Vec<&str> = path.split('/').collect();
        if pattern_segments.len() != path_segments.len() {
            return None;
        }

        let mut params = PathParams::new();
        for (pattern_segment, path_segment) in pattern_segments.iter().zip(&path_segments) {
            if let Some(name) = pattern_segment.strip_prefix(':') {
                params.insert(name.to_string(), (*path_segment).to_string());
            } else if pattern_segment != path_segment {
                return None;
            }
        }
        Some(params)
    }

    fn handler_for(&self, method: &Method) -> Option<&Handler> {
        self.handlers
            .iter()
            .find(|(registered, _)| registered == method)
            .map(|(_, handler)| handler)
    }

    fn registered_methods(&self) -> Vec<String> {
        self.handlers
            .iter()
            .map(|(method, _)| method.to_string())
            .collect()
    }
}

/// Entry point for every inbound request.
///
/// Whatever the outcome, the response carries a JSON content type and a
/// permissive CORS header.
pub async fn dispatch(State(state): State<AppState>, request: Request) -> Response {
    let mut response = route_request(state, request).await;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(
        header::ACCESS_CONTROL_ALLOW_ORIGIN,
        HeaderValue::from_static("*"),
    );
    response
}

async fn route_request(state: AppState, request: Request) -> Response {
    let method = request.method().clone();
    if !ALLOWED_METHODS.contains(&method) {
        let allowed = ALLOWED_METHODS.iter().map(Method::to_string);
        return AccessBridgeError::method_not_allowed(allowed).into_response();
    }

    let path = request.uri().path().to_owned();
    let routes = state.routes.clone();
    for route in routes.iter() {
        let Some(params) = route.matches(&path) else {
            continue;
        };

        // First matching pattern wins; later patterns are never consulted.
        let Some(handler) = route.handler_for(&method) else {
            return AccessBridgeError::method_not_allowed(route.registered_methods())
                .into_response();
        };

        return match handler(state, request, params).await {
            Ok(response) => response,
            Err(error) => {
                if error.status() == StatusCode::INTERNAL_SERVER_ERROR {
                    tracing::error!(%method, %path, "request failed: {}", error);
                }
                error.into_response()
            }
        };
    }

    AccessBridgeError::not_found().into_response()
}
