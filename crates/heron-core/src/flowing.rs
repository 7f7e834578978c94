//! Values threaded through a pipeline.
//!
//! A [`FlowingRequest`] carries everything a stage may need about the
//! request plus per-request state (captures, negotiated type, fault) in its
//! extensions. Stages never mutate a flowing value in place; every `with_*`
//! call returns a new value.

use std::sync::Arc;

use bytes::Bytes;
use heron_router::{split_path, Captures, MimeType, QueryParams, RoutableRequest};
use http::header::{HeaderName, HeaderValue, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};

use crate::args::Args;
use crate::extensions::{Extensions, Key};
use crate::fault::Fault;
use crate::message::{Request, Response};

/// Well-known extension keys set by the dispatcher.
pub mod keys {
    use super::{Args, Captures, Fault, Key, MimeType};

    /// Values captured from the path.
    pub const CAPTURES: Key<Captures> = Key::new("heron.captures");
    /// The negotiated response content type.
    pub const CONTENT_TYPE: Key<MimeType> = Key::new("heron.content_type");
    /// The fault being handled by a server-error pipeline.
    pub const FAULT: Key<Fault> = Key::new("heron.fault");
    /// Set when a `HEAD` request is served by a `GET` route.
    pub const HEAD_AS_GET: Key<bool> = Key::new("heron.head_as_get");
    /// Arguments resolved by the binding stage.
    pub const ARGS: Key<Args> = Key::new("heron.args");
}

#[derive(Debug)]
struct Head {
    method: Method,
    path: String,
    segments: Vec<String>,
    query: QueryParams,
}

/// An immutable, cheap-to-clone request flowing through a pipeline.
///
/// # Example
///
/// ```
/// use heron_core::{keys, FlowingRequest, Request};
/// use heron_router::MimeType;
///
/// let original = FlowingRequest::from(Request::get("/a/b"));
/// let negotiated = original.with(&keys::CONTENT_TYPE, MimeType::json());
///
/// assert_eq!(negotiated.content_type(), Some(&MimeType::json()));
/// assert_eq!(original.content_type(), None);
/// assert_eq!(negotiated.segments(), ["a", "b"]);
/// ```
#[derive(Debug, Clone)]
pub struct FlowingRequest {
    head: Arc<Head>,
    headers: Arc<HeaderMap>,
    body: Option<Bytes>,
    extensions: Extensions,
}

impl From<Request> for FlowingRequest {
    fn from(request: Request) -> Self {
        let (method, path, headers, query, body) = request.into_parts();
        let segments = split_path(&path).into_iter().map(str::to_string).collect();
        Self {
            head: Arc::new(Head {
                method,
                path,
                segments,
                query,
            }),
            headers: Arc::new(headers),
            body,
            extensions: Extensions::new(),
        }
    }
}

impl FlowingRequest {
    /// The method as received.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.head.method
    }

    /// The raw path.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.head.path
    }

    /// The non-empty path segments.
    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.head.segments
    }

    /// The query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.head.query
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The extension bag.
    #[must_use]
    pub fn extensions(&self) -> &Extensions {
        &self.extensions
    }

    /// Reads an extension.
    #[must_use]
    pub fn get<T>(&self, key: &Key<T>) -> Option<&T>
    where
        T: Send + Sync + 'static,
    {
        self.extensions.get(key)
    }

    /// Returns a copy with an extension set.
    #[must_use]
    pub fn with<T>(&self, key: &Key<T>, value: T) -> Self
    where
        T: Send + Sync + 'static,
    {
        Self {
            extensions: self.extensions.with(key, value),
            ..self.clone()
        }
    }

    /// Returns a copy with a different body.
    #[must_use]
    pub fn with_body(&self, body: Option<Bytes>) -> Self {
        Self {
            body,
            ..self.clone()
        }
    }

    /// Returns a copy with a header set, replacing existing values.
    #[must_use]
    pub fn with_header(&self, name: HeaderName, value: HeaderValue) -> Self {
        let mut headers = HeaderMap::clone(&self.headers);
        headers.insert(name, value);
        Self {
            headers: Arc::new(headers),
            ..self.clone()
        }
    }

    /// The captured path values; empty before routing.
    #[must_use]
    pub fn captures(&self) -> Captures {
        self.get(&keys::CAPTURES).cloned().unwrap_or_default()
    }

    /// The negotiated content type.
    #[must_use]
    pub fn content_type(&self) -> Option<&MimeType> {
        self.get(&keys::CONTENT_TYPE)
    }

    /// The fault being handled, inside a server-error pipeline.
    #[must_use]
    pub fn fault(&self) -> Option<&Fault> {
        self.get(&keys::FAULT)
    }

    /// Returns true when a `HEAD` request is being served by a `GET` route.
    #[must_use]
    pub fn is_head_as_get(&self) -> bool {
        self.get(&keys::HEAD_AS_GET).copied().unwrap_or(false)
    }

    /// The resolved handler arguments.
    #[must_use]
    pub fn args(&self) -> Args {
        self.get(&keys::ARGS).cloned().unwrap_or_default()
    }
}

impl RoutableRequest for FlowingRequest {
    fn method(&self) -> &Method {
        &self.head.method
    }

    fn path_segments(&self) -> &[String] {
        &self.head.segments
    }

    fn query(&self) -> &QueryParams {
        &self.head.query
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// An immutable response flowing back through output stages.
///
/// Carries the flowing request that produced it so output stages can read
/// the negotiated type and other request state.
#[derive(Debug, Clone)]
pub struct FlowingResponse {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
    request: FlowingRequest,
}

impl FlowingResponse {
    /// Pairs a handler response with the request that produced it.
    #[must_use]
    pub fn new(response: Response, request: FlowingRequest) -> Self {
        let (status, headers, body) = response.into_parts();
        Self {
            status,
            headers,
            body,
            request,
        }
    }

    /// The status.
    #[must_use]
    pub fn status(&self) -> StatusCode {
        self.status
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The request that produced this response.
    #[must_use]
    pub fn request(&self) -> &FlowingRequest {
        &self.request
    }

    /// Returns the response with a different status.
    #[must_use]
    pub fn with_status(self, status: StatusCode) -> Self {
        Self { status, ..self }
    }

    /// Returns the response with a header set, replacing existing values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Returns the response with a header set only if it is absent.
    #[must_use]
    pub fn with_header_if_absent(mut self, name: HeaderName, value: HeaderValue) -> Self {
        if !self.headers.contains_key(&name) {
            self.headers.insert(name, value);
        }
        self
    }

    /// Returns the response with a different body.
    #[must_use]
    pub fn with_body(self, body: Option<Bytes>) -> Self {
        Self { body, ..self }
    }

    /// The `content-type` header as a string.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Converts into the outgoing response.
    #[must_use]
    pub fn into_response(self) -> Response {
        Response::from_parts(self.status, self.headers, self.body)
    }
}
