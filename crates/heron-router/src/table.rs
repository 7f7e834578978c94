//! The route table.
//!
//! Routes are registered while the table is mutable. The first lookup freezes
//! the table into an immutable snapshot; every later lookup reads that
//! snapshot without locking, and registration is rejected.

use std::fmt;
use std::sync::OnceLock;

use parking_lot::Mutex;

use crate::error::{RouterError, RouterResult};
use crate::predicate::{MatchOptions, PredicateMatch, RoutableRequest, RoutePredicate};

/// A registered route.
#[derive(Debug, Clone)]
pub struct Route<T> {
    /// When the route applies
    pub predicate: RoutePredicate,
    /// What the route dispatches to
    pub target: T,
}

impl<T> Route<T> {
    /// Creates a route.
    #[must_use]
    pub fn new(predicate: RoutePredicate, target: T) -> Self {
        Self { predicate, target }
    }
}

/// A route selected for a request.
#[derive(Debug, Clone)]
pub struct RouteMatch<'a, T> {
    /// The matched target
    pub target: &'a T,
    /// Captures, negotiated type and head-as-get flag
    pub matched: PredicateMatch,
}

/// An ordered table of routes that freezes on first lookup.
///
/// # Example
///
/// ```rust
/// use heron_router::{PathPattern, RequestParts, Route, RoutePredicate, RouteTable};
/// use http::Method;
///
/// let table = RouteTable::new();
/// let predicate = RoutePredicate::builder()
///     .method(Method::GET)
///     .path(PathPattern::parse("/users/{*}").unwrap())
///     .build()
///     .unwrap();
/// table.register(Route::new(predicate, "get_user")).unwrap();
///
/// let found = table.lookup(&RequestParts::new(Method::GET, "/users/42")).unwrap();
/// assert_eq!(*found.target, "get_user");
/// assert_eq!(found.matched.captures.get(0), Some("42"));
///
/// // the table is now frozen
/// assert!(table.is_frozen());
/// ```
pub struct RouteTable<T> {
    pending: Mutex<Vec<Route<T>>>,
    frozen: OnceLock<Box<[Route<T>]>>,
    options: MatchOptions,
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for RouteTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteTable")
            .field("routes", &self.len())
            .field("frozen", &self.is_frozen())
            .finish_non_exhaustive()
    }
}

impl<T> RouteTable<T> {
    /// Creates an empty table with default match options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(MatchOptions::default())
    }

    /// Creates an empty table.
    #[must_use]
    pub fn with_options(options: MatchOptions) -> Self {
        Self {
            pending: Mutex::new(Vec::new()),
            frozen: OnceLock::new(),
            options,
        }
    }

    /// The options used for every lookup.
    #[must_use]
    pub fn options(&self) -> &MatchOptions {
        &self.options
    }

    /// Registers a route. Fails once the table is frozen.
    pub fn register(&self, route: Route<T>) -> RouterResult<()> {
        let mut pending = self.pending.lock();
        if self.frozen.get().is_some() {
            return Err(RouterError::TableFrozen);
        }
        pending.push(route);
        Ok(())
    }

    /// Returns true once the first lookup has happened.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.frozen.get().is_some()
    }

    /// Number of registered routes.
    #[must_use]
    pub fn len(&self) -> usize {
        match self.frozen.get() {
            Some(routes) => routes.len(),
            None => self.pending.lock().len(),
        }
    }

    /// Returns true if no routes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the frozen routes, freezing on first call.
    pub fn snapshot(&self) -> &[Route<T>] {
        if let Some(routes) = self.frozen.get() {
            return routes;
        }
        // Holding the lock keeps a concurrent register from slipping in
        // between draining and publishing.
        let mut pending = self.pending.lock();
        self.frozen.get_or_init(|| {
            let routes = std::mem::take(&mut *pending).into_boxed_slice();
            tracing::debug!(routes = routes.len(), "route table frozen");
            routes
        })
    }

    /// Returns the first route matching the request.
    pub fn lookup<R>(&self, request: &R) -> Option<RouteMatch<'_, T>>
    where
        R: RoutableRequest + ?Sized,
    {
        self.candidates(request).next()
    }

    /// Iterates every route matching the request, in registration order.
    pub fn candidates<'a, 'r, R>(
        &'a self,
        request: &'r R,
    ) -> impl Iterator<Item = RouteMatch<'a, T>> + 'r
    where
        'a: 'r,
        R: RoutableRequest + ?Sized,
    {
        let options = &self.options;
        self.snapshot().iter().filter_map(move |route| {
            route
                .predicate
                .evaluate(request, options)
                .map(|matched| RouteMatch {
                    target: &route.target,
                    matched,
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::PathPattern;
    use crate::predicate::RequestParts;
    use http::Method;

    fn route(path: &str, target: &'static str) -> Route<&'static str> {
        Route::new(
            RoutePredicate::builder()
                .method(Method::GET)
                .path(PathPattern::parse(path).unwrap())
                .build()
                .unwrap(),
            target,
        )
    }

    #[test]
    fn test_first_match_wins() {
        let table = RouteTable::new();
        table.register(route("/a/{*}", "first")).unwrap();
        table.register(route("/a/b", "second")).unwrap();

        let req = RequestParts::new(Method::GET, "/a/b");
        assert_eq!(*table.lookup(&req).unwrap().target, "first");
        let all: Vec<_> = table.candidates(&req).map(|m| *m.target).collect();
        assert_eq!(all, vec!["first", "second"]);
    }

    #[test]
    fn test_lookup_idempotent() {
        let table = RouteTable::new();
        table.register(route("/x/{*}", "x")).unwrap();
        let req = RequestParts::new(Method::GET, "/x/1");

        let a = table.lookup(&req).unwrap();
        let b = table.lookup(&req).unwrap();
        assert_eq!(a.target, b.target);
        assert_eq!(a.matched, b.matched);
    }

    #[test]
    fn test_register_after_lookup_rejected() {
        let table = RouteTable::new();
        table.register(route("/x", "x")).unwrap();
        assert!(!table.is_frozen());

        assert!(table.lookup(&RequestParts::new(Method::GET, "/nothing")).is_none());
        assert!(table.is_frozen());

        let err = table.register(route("/y", "y")).unwrap_err();
        assert_eq!(err, RouterError::TableFrozen);
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_empty_table() {
        let table: RouteTable<()> = RouteTable::new();
        assert!(table.is_empty());
        assert!(table.lookup(&RequestParts::new(Method::GET, "/")).is_none());
    }

    #[test]
    fn test_concurrent_lookups() {
        let table = std::sync::Arc::new(RouteTable::new());
        for i in 0..16 {
            table
                .register(route(&format!("/r{i}/{{*}}"), "r"))
                .unwrap();
        }
        let handles: Vec<_> = (0..8)
            .map(|i| {
                let table = std::sync::Arc::clone(&table);
                std::thread::spawn(move || {
                    let req = RequestParts::new(Method::GET, &format!("/r{i}/v"));
                    table.lookup(&req).map(|m| m.matched.captures.get(0).map(str::to_string))
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), Some(Some("v".to_string())));
        }
        assert_eq!(table.len(), 16);
    }
}
