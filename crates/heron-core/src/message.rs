//! The request consumed and the response produced by the dispatcher.

use bytes::Bytes;
use heron_router::QueryParams;
use http::header::{HeaderName, HeaderValue, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, Method, StatusCode};

/// An incoming request, already parsed by the transport.
///
/// # Example
///
/// ```
/// use heron_core::Request;
/// use http::Method;
///
/// let req = Request::new(Method::GET, "/users/7?expand=full")
///     .with_header("accept", "application/json");
///
/// assert_eq!(req.path(), "/users/7");
/// assert_eq!(req.query().first("expand"), Some("full"));
/// ```
#[derive(Debug, Clone, Default)]
pub struct Request {
    method: Method,
    path: String,
    headers: HeaderMap,
    query: QueryParams,
    body: Option<Bytes>,
}

impl Request {
    /// Creates a request from a method and a target `path[?query]`.
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            path: path.to_string(),
            headers: HeaderMap::new(),
            query: QueryParams::parse(query),
            body: None,
        }
    }

    /// A `GET` request.
    #[must_use]
    pub fn get(target: &str) -> Self {
        Self::new(Method::GET, target)
    }

    /// A `POST` request.
    #[must_use]
    pub fn post(target: &str) -> Self {
        Self::new(Method::POST, target)
    }

    /// A `HEAD` request.
    #[must_use]
    pub fn head(target: &str) -> Self {
        Self::new(Method::HEAD, target)
    }

    /// Appends a header. Invalid names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            self.headers.append(name, value);
        }
        self
    }

    /// Replaces the headers.
    #[must_use]
    pub fn with_headers(mut self, headers: HeaderMap) -> Self {
        self.headers = headers;
        self
    }

    /// Replaces the query parameters.
    #[must_use]
    pub fn with_query(mut self, query: QueryParams) -> Self {
        self.query = query;
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// The method.
    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The path, without query.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The headers.
    #[must_use]
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// The query parameters.
    #[must_use]
    pub fn query(&self) -> &QueryParams {
        &self.query
    }

    /// The body, if any.
    #[must_use]
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    pub(crate) fn into_parts(self) -> (Method, String, HeaderMap, QueryParams, Option<Bytes>) {
        (self.method, self.path, self.headers, self.query, self.body)
    }
}

/// A response produced by the dispatcher.
#[derive(Debug, Clone, PartialEq)]
pub struct Response {
    status: StatusCode,
    headers: HeaderMap,
    body: Option<Bytes>,
}

impl Default for Response {
    fn default() -> Self {
        Self::new(StatusCode::OK)
    }
}

impl Response {
    /// An empty response with the given status.
    #[must_use]
    pub fn new(status: StatusCode) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    /// An empty `200 OK`.
    #[must_use]
    pub fn ok() -> Self {
        Self::new(StatusCode::OK)
    }

    /// A `text/plain` response.
    #[must_use]
    pub fn text(status: StatusCode, body: impl Into<String>) -> Self {
        let body: String = body.into();
        Self::new(status)
            .with_header(CONTENT_TYPE, HeaderValue::from_static("text/plain"))
            .with_body(body)
    }

    /// Sets the status.
    #[must_use]
    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }

    /// Sets a header, replacing existing values.
    #[must_use]
    pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Sets the body.
    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    /// Sets the body along with a matching `content-length` header.
    #[must_use]
    pub fn with_sized_body(self, body: impl Into<Bytes>) -> Self {
        let body = body.into();
        let length = HeaderValue::from(body.len());
        self.with_header(CONTENT_LENGTH, length).with_body(body)
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

    /// The `content-type` header as a string.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get(CONTENT_TYPE).and_then(|v| v.to_str().ok())
    }

    /// Splits into status, headers and body.
    #[must_use]
    pub fn into_parts(self) -> (StatusCode, HeaderMap, Option<Bytes>) {
        (self.status, self.headers, self.body)
    }

    /// Reassembles a response from its parts.
    #[must_use]
    pub fn from_parts(status: StatusCode, headers: HeaderMap, body: Option<Bytes>) -> Self {
        Self {
            status,
            headers,
            body,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_target_split() {
        let req = Request::post("/a/b?x=1&x=2").with_body("payload");
        assert_eq!(req.method(), Method::POST);
        assert_eq!(req.path(), "/a/b");
        assert_eq!(req.query().get_all("x"), ["1", "2"]);
        assert_eq!(req.body().map(|b| &b[..]), Some(&b"payload"[..]));
    }

    #[test]
    fn test_request_invalid_header_ignored() {
        let req = Request::get("/").with_header("bad header", "x");
        assert!(req.headers().is_empty());
    }

    #[test]
    fn test_text_response() {
        let res = Response::text(StatusCode::NOT_FOUND, "missing");
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(res.content_type(), Some("text/plain"));
        assert_eq!(res.body().map(|b| &b[..]), Some(&b"missing"[..]));
    }

    #[test]
    fn test_sized_body() {
        let res = Response::ok().with_sized_body("12345");
        assert_eq!(
            res.headers().get(CONTENT_LENGTH).and_then(|v| v.to_str().ok()),
            Some("5")
        );
    }
}
