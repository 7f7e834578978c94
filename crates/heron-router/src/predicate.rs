//! Composite route predicates.
//!
//! A [`RoutePredicate`] combines every constraint a route declares. It is
//! built once at registration and evaluated against each request in a fixed
//! order: method, query, headers, negotiation, path.

use http::header::ACCEPT;
use http::{HeaderMap, Method};

use crate::accept::DEFAULT_ACCEPT_LIMIT;
use crate::captures::Captures;
use crate::constraint::{KeyValueConstraint, QueryParams};
use crate::error::{RouterError, RouterResult};
use crate::method::{MethodAdmission, MethodSet};
use crate::mime::MimeType;
use crate::negotiate::Produces;
use crate::pattern::{split_path, PathPattern};

/// The view of a request that predicates evaluate.
pub trait RoutableRequest {
    /// The request method.
    fn method(&self) -> &Method;

    /// The non-empty path segments.
    fn path_segments(&self) -> &[String];

    /// The decoded query parameters.
    fn query(&self) -> &QueryParams;

    /// The request headers.
    fn headers(&self) -> &HeaderMap;
}

/// A plain owned request usable with predicates and tables.
#[derive(Debug, Clone, Default)]
pub struct RequestParts {
    /// Request method
    pub method: Method,
    /// Non-empty path segments
    pub segments: Vec<String>,
    /// Decoded query parameters
    pub query: QueryParams,
    /// Request headers
    pub headers: HeaderMap,
}

impl RequestParts {
    /// Creates request parts from a method and a path with optional query.
    ///
    /// ```rust
    /// use heron_router::{RequestParts, RoutableRequest};
    /// use http::Method;
    ///
    /// let req = RequestParts::new(Method::GET, "/users/7?expand=true");
    /// assert_eq!(req.path_segments(), ["users", "7"]);
    /// assert_eq!(req.query().first("expand"), Some("true"));
    /// ```
    #[must_use]
    pub fn new(method: Method, target: &str) -> Self {
        let (path, query) = target.split_once('?').unwrap_or((target, ""));
        Self {
            method,
            segments: split_path(path).into_iter().map(str::to_string).collect(),
            query: QueryParams::parse(query),
            headers: HeaderMap::new(),
        }
    }

    /// Adds a header.
    ///
    /// Invalid header names or values are ignored.
    #[must_use]
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            http::HeaderName::try_from(name),
            http::HeaderValue::try_from(value),
        ) {
            self.headers.append(name, value);
        }
        self
    }
}

impl RoutableRequest for RequestParts {
    fn method(&self) -> &Method {
        &self.method
    }

    fn path_segments(&self) -> &[String] {
        &self.segments
    }

    fn query(&self) -> &QueryParams {
        &self.query
    }

    fn headers(&self) -> &HeaderMap {
        &self.headers
    }
}

/// Knobs applied while evaluating predicates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOptions {
    /// Maximum number of `Accept` entries considered
    pub accept_limit: usize,
    /// Whether `GET` routes also serve `HEAD`
    pub head_as_get: bool,
    /// `Accept` value assumed when the request carries none
    pub default_accept: String,
}

impl Default for MatchOptions {
    fn default() -> Self {
        Self {
            accept_limit: DEFAULT_ACCEPT_LIMIT,
            head_as_get: true,
            default_accept: "*/*".to_string(),
        }
    }
}

/// A successful predicate evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PredicateMatch {
    /// Values captured from the path
    pub captures: Captures,
    /// The negotiated response content type
    pub content_type: MimeType,
    /// True when a `HEAD` request was admitted by a `GET` route
    pub head_as_get: bool,
}

/// An immutable composite predicate.
#[derive(Debug, Clone, Default)]
pub struct RoutePredicate {
    methods: MethodSet,
    paths: Vec<PathPattern>,
    query: KeyValueConstraint,
    headers: KeyValueConstraint,
    produces: Produces,
}

impl RoutePredicate {
    /// Starts building a predicate.
    #[must_use]
    pub fn builder() -> RoutePredicateBuilder {
        RoutePredicateBuilder::default()
    }

    /// The accepted methods.
    #[must_use]
    pub fn methods(&self) -> &MethodSet {
        &self.methods
    }

    /// The alternative path patterns.
    #[must_use]
    pub fn paths(&self) -> &[PathPattern] {
        &self.paths
    }

    /// The producible content types.
    #[must_use]
    pub fn produces(&self) -> &Produces {
        &self.produces
    }

    /// Number of values a match captures.
    #[must_use]
    pub fn capture_count(&self) -> usize {
        self.paths.first().map_or(0, PathPattern::capture_count)
    }

    /// Evaluates the predicate. `None` means the request does not match.
    pub fn evaluate<R>(&self, request: &R, options: &MatchOptions) -> Option<PredicateMatch>
    where
        R: RoutableRequest + ?Sized,
    {
        let admission = self.methods.admits(request.method(), options.head_as_get)?;

        if !self.query.matches_query(request.query()) {
            return None;
        }
        if !self.headers.matches_headers(request.headers()) {
            return None;
        }

        let content_type = self.negotiate(request.headers(), options)?;

        let captures = if self.paths.is_empty() {
            Captures::new()
        } else {
            let segments = request.path_segments();
            self.paths
                .iter()
                .find_map(|pattern| pattern.matches(segments).into_captures())?
        };

        Some(PredicateMatch {
            captures,
            content_type,
            head_as_get: admission == MethodAdmission::HeadAsGet,
        })
    }

    fn negotiate(&self, headers: &HeaderMap, options: &MatchOptions) -> Option<MimeType> {
        let values: Vec<&str> = headers
            .get_all(ACCEPT)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect();
        if values.is_empty() {
            self.produces
                .negotiate(Some(&options.default_accept), options.accept_limit)
        } else {
            self.produces
                .negotiate(Some(&values.join(",")), options.accept_limit)
        }
    }
}

/// Builder for [`RoutePredicate`].
#[derive(Debug, Default)]
pub struct RoutePredicateBuilder {
    methods: MethodSet,
    paths: Vec<PathPattern>,
    query: KeyValueConstraint,
    headers: KeyValueConstraint,
    produces: Produces,
}

impl RoutePredicateBuilder {
    /// Adds an accepted method.
    #[must_use]
    pub fn method(mut self, method: Method) -> Self {
        self.methods.insert(method);
        self
    }

    /// Replaces the accepted method set.
    #[must_use]
    pub fn methods(mut self, methods: MethodSet) -> Self {
        self.methods = methods;
        self
    }

    /// Adds an alternative path pattern.
    #[must_use]
    pub fn path(mut self, pattern: PathPattern) -> Self {
        self.paths.push(pattern);
        self
    }

    /// Compiles and adds an alternative path pattern.
    pub fn path_str(self, pattern: &str) -> RouterResult<Self> {
        Ok(self.path(PathPattern::parse(pattern)?))
    }

    /// Adds query constraints.
    #[must_use]
    pub fn query(mut self, constraint: &KeyValueConstraint) -> Self {
        self.query.merge(constraint);
        self
    }

    /// Adds header constraints.
    #[must_use]
    pub fn headers(mut self, constraint: &KeyValueConstraint) -> Self {
        self.headers.merge(constraint);
        self
    }

    /// Sets the producible types.
    #[must_use]
    pub fn produces(mut self, produces: Produces) -> Self {
        self.produces = produces;
        self
    }

    /// Builds the predicate, checking that alternative paths agree on
    /// capture count.
    pub fn build(self) -> RouterResult<RoutePredicate> {
        if let Some(first) = self.paths.first() {
            let expected = first.capture_count();
            if let Some(other) = self.paths.iter().find(|p| p.capture_count() != expected) {
                return Err(RouterError::CaptureArityMismatch {
                    expected,
                    found: other.capture_count(),
                });
            }
        }
        Ok(RoutePredicate {
            methods: self.methods,
            paths: self.paths,
            query: self.query,
            headers: self.headers,
            produces: self.produces,
        })
    }
}
