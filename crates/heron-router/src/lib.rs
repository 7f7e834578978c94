//! Request matching for Heron.
//!
//! This crate decides *whether* a request matches a route. It knows nothing
//! about handlers or pipelines; a [`RouteTable`] maps predicates to arbitrary
//! targets supplied by the caller.
//!
//! # Features
//!
//! - **Path Patterns**: literals, `*` wildcards, `**` end captures and
//!   `re:` regex segments, any of which can be captured with `{...}`
//! - **Content Negotiation**: ranked `Accept` parsing and selection among the
//!   types a route produces
//! - **Composite Predicates**: method, query, header, negotiation and path
//!   checks evaluated in a fixed order
//! - **Freeze-on-First-Lookup**: registration is closed the moment the table
//!   serves its first request, after which lookups are lock-free
//!
//! # Example
//!
//! ```rust
//! use heron_router::{
//!     KeyValueConstraint, MimeType, PathPattern, Produces, RequestParts, Route,
//!     RoutePredicate, RouteTable,
//! };
//! use http::Method;
//!
//! let table = RouteTable::new();
//!
//! let fast = RoutePredicate::builder()
//!     .method(Method::GET)
//!     .path(PathPattern::parse("/search").unwrap())
//!     .query(&KeyValueConstraint::query(["mode=fast"]).unwrap())
//!     .produces(Produces::new([MimeType::json()]))
//!     .build()
//!     .unwrap();
//! let any = RoutePredicate::builder()
//!     .method(Method::GET)
//!     .path(PathPattern::parse("/search").unwrap())
//!     .build()
//!     .unwrap();
//!
//! table.register(Route::new(fast, "fast")).unwrap();
//! table.register(Route::new(any, "slow")).unwrap();
//!
//! let hit = table.lookup(&RequestParts::new(Method::GET, "/search?mode=fast")).unwrap();
//! assert_eq!(*hit.target, "fast");
//! assert_eq!(hit.matched.content_type, MimeType::json());
//!
//! let hit = table.lookup(&RequestParts::new(Method::GET, "/search")).unwrap();
//! assert_eq!(*hit.target, "slow");
//! ```

#![doc(html_root_url = "https://docs.rs/heron-router/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod accept;
mod captures;
mod constraint;
mod error;
mod method;
mod mime;
mod negotiate;
mod pattern;
mod predicate;
mod table;

pub use accept::{parse_accept, AcceptEntry, DEFAULT_ACCEPT_LIMIT};
pub use captures::Captures;
pub use constraint::{KeyValueConstraint, QueryParams};
pub use error::{RouterError, RouterResult};
pub use method::{MethodAdmission, MethodSet};
pub use mime::MimeType;
pub use negotiate::Produces;
pub use pattern::{split_path, PathMatch, PathPattern};
pub use predicate::{
    MatchOptions, PredicateMatch, RequestParts, RoutableRequest, RoutePredicate,
    RoutePredicateBuilder,
};
pub use table::{Route, RouteMatch, RouteTable};

#[cfg(test)]
mod tests {
    use super::*;
    use http::Method;

    fn get(path: &str) -> RoutePredicate {
        RoutePredicate::builder()
            .method(Method::GET)
            .path_str(path)
            .unwrap()
            .build()
            .unwrap()
    }

    #[test]
    fn test_wildcard_routes() {
        let table = RouteTable::new();
        table.register(Route::new(get("/{*}/list"), "list")).unwrap();

        let hit = table
            .lookup(&RequestParts::new(Method::GET, "/res1/list"))
            .unwrap();
        assert_eq!(hit.matched.captures.get(0), Some("res1"));
        assert!(table
            .lookup(&RequestParts::new(Method::GET, "/res1/res2/list"))
            .is_none());
    }

    #[test]
    fn test_end_capture_route() {
        let table = RouteTable::new();
        table.register(Route::new(get("/ec/{**}"), "ec")).unwrap();

        let hit = table
            .lookup(&RequestParts::new(Method::GET, "/ec/a/b/c"))
            .unwrap();
        assert_eq!(hit.matched.captures.get(0), Some("a/b/c"));
    }

    #[test]
    fn test_regex_route() {
        let table = RouteTable::new();
        table.register(Route::new(get("/re/{re:\\d+}"), "re")).unwrap();

        assert!(table.lookup(&RequestParts::new(Method::GET, "/re/42")).is_some());
        assert!(table.lookup(&RequestParts::new(Method::GET, "/re/NaN")).is_none());
    }

    #[test]
    fn test_method_routing() {
        let table = RouteTable::new();
        let post = RoutePredicate::builder()
            .method(Method::POST)
            .path_str("/users")
            .unwrap()
            .build()
            .unwrap();
        table.register(Route::new(get("/users"), "list")).unwrap();
        table.register(Route::new(post, "create")).unwrap();

        let hit = table.lookup(&RequestParts::new(Method::POST, "/users")).unwrap();
        assert_eq!(*hit.target, "create");
        assert!(table.lookup(&RequestParts::new(Method::DELETE, "/users")).is_none());
    }
}
