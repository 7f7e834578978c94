//! Request dispatch and recovery.
//!
//! The [`Dispatcher`] owns the frozen route table, the not-found pipeline
//! and the server-error pipelines. For each request it:
//!
//! 1. Tries every matching route pipeline in registration order. A pipeline
//!    that overflows hands the request to the next candidate.
//! 2. Runs the not-found pipeline when no candidate completes.
//! 3. Sends any fault through the server-error pipelines, once.
//! 4. Answers a fault raised while handling a fault with a fixed response.
//!
//! # Example
//!
//! ```
//! use heron_core::{handler_fn, Fault, Invocation, Request, Response};
//! use heron_pipeline::{Dispatcher, HandlerSpec, Tag};
//! use http::StatusCode;
//!
//! # tokio_test::block_on(async {
//! let dispatcher = Dispatcher::builder()
//!     .register_handler(
//!         HandlerSpec::route(
//!             "hello",
//!             handler_fn(|_inv: Invocation| async move {
//!                 Ok::<_, Fault>(Response::ok().with_body("hello"))
//!             }),
//!         )
//!         .tag(Tag::path("/hello")),
//!     )
//!     .register_handler(HandlerSpec::not_found(
//!         "missing",
//!         handler_fn(|_inv: Invocation| async move {
//!             Ok(Response::new(StatusCode::NOT_FOUND))
//!         }),
//!     ))
//!     .register_handler(HandlerSpec::server_error(
//!         "failed",
//!         handler_fn(|_inv: Invocation| async move {
//!             Ok(Response::new(StatusCode::INTERNAL_SERVER_ERROR))
//!         }),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let response = dispatcher.route(Request::get("/hello")).await;
//! assert_eq!(response.status(), StatusCode::OK);
//!
//! let response = dispatcher.route(Request::get("/nowhere")).await;
//! assert_eq!(response.status(), StatusCode::NOT_FOUND);
//! # });
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::FutureExt;
use heron_core::{
    keys, ConfigError, ConfigResult, Fault, FlowingRequest, Request, Response, RoutingConfig,
};
use heron_router::{PredicateMatch, Route, RouteTable};
use heron_telemetry::{log_double_fault, log_fault, log_overflow};
use http::header::{CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderName, HeaderValue, StatusCode};

use crate::assemble::Assembler;
use crate::capability::CapabilityRegistry;
use crate::controller::{Controller, HandlerRole, HandlerSpec};
use crate::pipeline::{Pipeline, PipelineOutcome, Stage};
use crate::tag::Tag;

/// Body of the response sent on a double fault.
pub const DOUBLE_FAULT_BODY: &str = "500 Internal Server Error: fault while handling a fault\n";

/// Header marking a double fault response.
pub const DOUBLE_FAULT_HEADER: &str = "x-heron-double-fault";

/// Builds the fixed response sent when fault handling itself faults.
///
/// Every call returns an identical response.
#[must_use]
pub fn double_fault_response() -> Response {
    Response::new(StatusCode::INTERNAL_SERVER_ERROR)
        .with_header(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        )
        .with_header(
            HeaderName::from_static(DOUBLE_FAULT_HEADER),
            HeaderValue::from_static("1"),
        )
        .with_header(CONTENT_LENGTH, HeaderValue::from(DOUBLE_FAULT_BODY.len()))
        .with_body(DOUBLE_FAULT_BODY)
}

struct Inner {
    table: RouteTable<Arc<Pipeline>>,
    not_found: Arc<Pipeline>,
    server_error: Vec<Arc<Pipeline>>,
    registry: CapabilityRegistry,
    config: RoutingConfig,
}

/// Routes requests through assembled pipelines.
///
/// Cheap to clone; clones share the same table and pipelines.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("routes", &self.inner.table.len())
            .field("frozen", &self.inner.table.is_frozen())
            .field("not_found", &self.inner.not_found.name())
            .field("server_error", &self.inner.server_error.len())
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    /// Starts building a dispatcher.
    #[must_use]
    pub fn builder() -> DispatcherBuilder {
        DispatcherBuilder::default()
    }

    /// The routing settings in effect.
    #[must_use]
    pub fn config(&self) -> &RoutingConfig {
        &self.inner.config
    }

    /// Number of route pipelines.
    #[must_use]
    pub fn route_count(&self) -> usize {
        self.inner.table.len()
    }

    /// Returns true once the first request has been routed.
    #[must_use]
    pub fn is_frozen(&self) -> bool {
        self.inner.table.is_frozen()
    }

    /// The not-found pipeline.
    #[must_use]
    pub fn not_found_pipeline(&self) -> &Pipeline {
        &self.inner.not_found
    }

    /// The server-error pipelines, in registration order.
    pub fn server_error_pipelines(&self) -> impl Iterator<Item = &Pipeline> {
        self.inner.server_error.iter().map(|p| &**p)
    }

    /// Adds a route handler after build.
    ///
    /// # Errors
    ///
    /// - `ConfigError::SpecialHandlerAfterBuild` for a not-found or
    ///   server-error handler
    /// - `ConfigError::Router(RouterError::TableFrozen)` once a request has
    ///   been routed
    /// - any assembly error
    pub fn register(&self, spec: HandlerSpec) -> ConfigResult<()> {
        self.register_with(&[], spec)
    }

    /// Adds every route handler of a controller after build.
    ///
    /// # Errors
    ///
    /// As [`Dispatcher::register`]. Handlers before the failing one stay
    /// registered.
    pub fn register_controller<C>(&self, controller: &C) -> ConfigResult<()>
    where
        C: Controller + ?Sized,
    {
        let container = controller.tags();
        for spec in controller.handlers() {
            self.register_with(&container, spec)?;
        }
        Ok(())
    }

    fn register_with(&self, container: &[Tag], spec: HandlerSpec) -> ConfigResult<()> {
        if spec.role() != HandlerRole::Route {
            return Err(ConfigError::SpecialHandlerAfterBuild {
                handler: spec.name().to_string(),
            });
        }
        if self.inner.table.is_frozen() {
            return Err(heron_router::RouterError::TableFrozen.into());
        }
        let pipeline = Assembler::new(&self.inner.registry)
            .with_max_meta_depth(self.inner.config.max_meta_depth)
            .assemble(container, spec)?;
        register_route(&self.inner.table, pipeline)
    }

    /// Routes one request to a response.
    ///
    /// Never fails: unmatched requests reach the not-found pipeline, faults
    /// reach the server-error pipelines, and a fault during fault handling
    /// produces [`double_fault_response`].
    pub async fn route(&self, request: Request) -> Response {
        let request = FlowingRequest::from(request);
        let inner = &*self.inner;

        for candidate in inner.table.candidates(&request) {
            let pipeline = &**candidate.target;
            let flowing = attach(&request, candidate.matched);
            match execute(pipeline, flowing.clone()).await {
                Ok(PipelineOutcome::Complete(response)) => return response.into_response(),
                Ok(PipelineOutcome::Overflow(stage)) => {
                    log_overflow!(request.method(), request.path(), pipeline.name(), stage);
                }
                Err(fault) => return self.recover(flowing, pipeline.name(), fault).await,
            }
        }

        self.not_found(request).await
    }

    async fn not_found(&self, request: FlowingRequest) -> Response {
        let pipeline = &*self.inner.not_found;
        let options = self.inner.table.options();

        let Some(matched) = pipeline.predicate().evaluate(&request, options) else {
            log_overflow!(request.method(), request.path(), pipeline.name(), Stage::Predicate);
            let fault = not_found_overflow(&request, pipeline, Stage::Predicate);
            return self.recover(request, pipeline.name(), fault).await;
        };

        let flowing = attach(&request, matched);
        match execute(pipeline, flowing.clone()).await {
            Ok(PipelineOutcome::Complete(response)) => response.into_response(),
            Ok(PipelineOutcome::Overflow(stage)) => {
                log_overflow!(request.method(), request.path(), pipeline.name(), stage);
                let fault = not_found_overflow(&request, pipeline, stage);
                self.recover(flowing, pipeline.name(), fault).await
            }
            Err(fault) => self.recover(flowing, pipeline.name(), fault).await,
        }
    }

    async fn recover(&self, request: FlowingRequest, origin: &str, fault: Fault) -> Response {
        log_fault!(request.method(), request.path(), origin, fault);

        let request = request.with(&keys::FAULT, fault.clone());
        let options = self.inner.table.options();

        let (declared, rest): (Vec<&Arc<Pipeline>>, Vec<&Arc<Pipeline>>) = self
            .inner
            .server_error
            .iter()
            .partition(|pipeline| pipeline.declares(&fault));

        for pipeline in declared.into_iter().chain(rest) {
            let Some(matched) = pipeline.predicate().evaluate(&request, options) else {
                log_overflow!(request.method(), request.path(), pipeline.name(), Stage::Predicate);
                continue;
            };
            match execute(pipeline, attach(&request, matched)).await {
                Ok(PipelineOutcome::Complete(response)) => return response.into_response(),
                Ok(PipelineOutcome::Overflow(stage)) => {
                    log_overflow!(request.method(), request.path(), pipeline.name(), stage);
                }
                Err(second) => {
                    log_double_fault!(request.method(), request.path(), second);
                    return double_fault_response();
                }
            }
        }

        let unhandled = Fault::invariant(format!("no server-error pipeline handled fault: {fault}"));
        log_double_fault!(request.method(), request.path(), unhandled);
        double_fault_response()
    }
}

/// Builds a [`Dispatcher`].
///
/// Handlers are assembled at [`DispatcherBuilder::build`], after the
/// registry and config are settled.
#[derive(Default)]
pub struct DispatcherBuilder {
    registry: Option<CapabilityRegistry>,
    config: RoutingConfig,
    pending: Vec<(Arc<[Tag]>, HandlerSpec)>,
}

impl std::fmt::Debug for DispatcherBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DispatcherBuilder")
            .field("registry", &self.registry)
            .field("config", &self.config)
            .field("handlers", &self.pending.len())
            .finish()
    }
}

impl DispatcherBuilder {
    /// Registers every handler of a controller under its container tags.
    #[must_use]
    pub fn register<C>(mut self, controller: &C) -> Self
    where
        C: Controller + ?Sized,
    {
        let container: Arc<[Tag]> = controller.tags().into();
        for spec in controller.handlers() {
            self.pending.push((Arc::clone(&container), spec));
        }
        self
    }

    /// Registers a single handler with no container tags.
    #[must_use]
    pub fn register_handler(mut self, spec: HandlerSpec) -> Self {
        self.pending.push((Arc::from(Vec::new()), spec));
        self
    }

    /// Uses a custom capability registry instead of the built-in one.
    #[must_use]
    pub fn registry(mut self, registry: CapabilityRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the routing settings.
    #[must_use]
    pub fn config(mut self, config: RoutingConfig) -> Self {
        self.config = config;
        self
    }

    /// Assembles every handler and builds the dispatcher.
    ///
    /// # Errors
    ///
    /// - `ConfigError::DuplicateNotFoundHandler` for a second not-found
    ///   handler
    /// - `ConfigError::MissingNotFoundHandler` without one
    /// - `ConfigError::MissingServerErrorHandler` without any server-error
    ///   handler
    /// - any assembly error
    pub fn build(self) -> ConfigResult<Dispatcher> {
        let registry = self
            .registry
            .unwrap_or_else(|| CapabilityRegistry::builtin().clone());
        let assembler = Assembler::new(&registry).with_max_meta_depth(self.config.max_meta_depth);
        let table = RouteTable::with_options(self.config.match_options());
        let mut not_found: Option<Arc<Pipeline>> = None;
        let mut server_error = Vec::new();

        for (container, spec) in self.pending {
            let pipeline = assembler.assemble(&container, spec)?;
            match pipeline.role() {
                HandlerRole::Route => register_route(&table, pipeline)?,
                HandlerRole::NotFound => {
                    if let Some(first) = &not_found {
                        return Err(ConfigError::DuplicateNotFoundHandler {
                            first: first.name().to_string(),
                            second: pipeline.name().to_string(),
                        });
                    }
                    not_found = Some(Arc::new(pipeline));
                }
                HandlerRole::ServerError => server_error.push(Arc::new(pipeline)),
            }
        }

        let not_found = not_found.ok_or(ConfigError::MissingNotFoundHandler)?;
        if server_error.is_empty() {
            return Err(ConfigError::MissingServerErrorHandler);
        }

        tracing::debug!(
            routes = table.len(),
            not_found = not_found.name(),
            server_error = server_error.len(),
            "dispatcher built"
        );

        Ok(Dispatcher {
            inner: Arc::new(Inner {
                table,
                not_found,
                server_error,
                registry,
                config: self.config,
            }),
        })
    }
}

fn register_route(table: &RouteTable<Arc<Pipeline>>, pipeline: Pipeline) -> ConfigResult<()> {
    let predicate = pipeline.predicate().clone();
    table.register(Route::new(predicate, Arc::new(pipeline)))?;
    Ok(())
}

fn attach(request: &FlowingRequest, matched: PredicateMatch) -> FlowingRequest {
    request
        .with(&keys::CAPTURES, matched.captures)
        .with(&keys::CONTENT_TYPE, matched.content_type)
        .with(&keys::HEAD_AS_GET, matched.head_as_get)
}

async fn execute(pipeline: &Pipeline, request: FlowingRequest) -> Result<PipelineOutcome, Fault> {
    match AssertUnwindSafe(pipeline.run(request)).catch_unwind().await {
        Ok(result) => result,
        Err(payload) => Err(Fault::panic(payload)),
    }
}

fn not_found_overflow(request: &FlowingRequest, pipeline: &Pipeline, stage: Stage) -> Fault {
    tracing::error!(
        http.method = %request.method(),
        http.path = %request.path(),
        pipeline = pipeline.name(),
        stage = %stage,
        "not-found pipeline overflowed"
    );
    Fault::invariant(format!(
        "not-found pipeline '{}' overflowed at {stage}",
        pipeline.name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{handler_fn, Invocation};
    use heron_router::RouterError;

    use crate::pipe::filter_fn;

    fn ok(body: &'static str) -> heron_core::HandlerFn {
        handler_fn(move |_inv: Invocation| async move { Ok(Response::ok().with_body(body)) })
    }

    fn base() -> DispatcherBuilder {
        Dispatcher::builder()
            .register_handler(HandlerSpec::not_found("missing", ok("missing")))
            .register_handler(HandlerSpec::server_error("failed", ok("failed")))
    }

    fn body(response: &Response) -> &[u8] {
        response.body().map_or(&[][..], |b| &b[..])
    }

    #[test]
    fn test_dispatcher_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Dispatcher>();
    }

    #[test]
    fn test_double_fault_response_fixed() {
        let a = double_fault_response();
        let b = double_fault_response();
        assert_eq!(a.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(a.body(), b.body());
        assert_eq!(a.headers(), b.headers());
        assert_eq!(body(&a), DOUBLE_FAULT_BODY.as_bytes());
        assert_eq!(
            a.headers().get(CONTENT_LENGTH).unwrap(),
            &DOUBLE_FAULT_BODY.len().to_string()
        );
        assert!(a.headers().contains_key(DOUBLE_FAULT_HEADER));
    }

    #[test]
    fn test_build_requires_not_found() {
        let err = Dispatcher::builder()
            .register_handler(HandlerSpec::server_error("failed", ok("failed")))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingNotFoundHandler);
    }

    #[test]
    fn test_build_requires_server_error() {
        let err = Dispatcher::builder()
            .register_handler(HandlerSpec::not_found("missing", ok("missing")))
            .build()
            .unwrap_err();
        assert_eq!(err, ConfigError::MissingServerErrorHandler);
    }

    #[test]
    fn test_build_rejects_second_not_found() {
        let err = base()
            .register_handler(HandlerSpec::not_found("again", ok("again")))
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateNotFoundHandler {
                first: "missing".to_string(),
                second: "again".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_register_after_build_until_frozen() {
        let dispatcher = base().build().unwrap();
        dispatcher
            .register(HandlerSpec::route("late", ok("late")).tag(Tag::path("/late")))
            .unwrap();
        assert_eq!(dispatcher.route_count(), 1);

        let response = dispatcher.route(Request::get("/late")).await;
        assert_eq!(body(&response), b"late");
        assert!(dispatcher.is_frozen());

        let err = dispatcher
            .register(HandlerSpec::route("later", ok("later")).tag(Tag::path("/later")))
            .unwrap_err();
        assert_eq!(err, ConfigError::Router(RouterError::TableFrozen));
    }

    #[test]
    fn test_special_handlers_rejected_after_build() {
        let dispatcher = base().build().unwrap();
        let err = dispatcher
            .register(HandlerSpec::server_error("more", ok("more")))
            .unwrap_err();
        assert_eq!(
            err,
            ConfigError::SpecialHandlerAfterBuild {
                handler: "more".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_overflow_falls_through_to_next_candidate() {
        let dispatcher = base()
            .register_handler(
                HandlerSpec::route("picky", ok("picky"))
                    .tag(Tag::path("/a"))
                    .tag(Tag::filter(filter_fn("never", |_req| false))),
            )
            .register_handler(HandlerSpec::route("easy", ok("easy")).tag(Tag::path("/a")))
            .build()
            .unwrap();

        let response = dispatcher.route(Request::get("/a")).await;
        assert_eq!(body(&response), b"easy");
    }

    #[tokio::test]
    async fn test_not_found_overflow_is_recovered_once() {
        let dispatcher = Dispatcher::builder()
            .register_handler(
                HandlerSpec::not_found("missing", ok("missing"))
                    .tag(Tag::filter(filter_fn("never", |_req| false))),
            )
            .register_handler(HandlerSpec::server_error(
                "failed",
                handler_fn(|inv: Invocation| async move {
                    let invariant = inv
                        .fault
                        .as_ref()
                        .is_some_and(|f| f.is::<heron_core::InvariantViolation>());
                    Ok(Response::ok().with_body(if invariant { "invariant" } else { "other" }))
                }),
            ))
            .build()
            .unwrap();

        let response = dispatcher.route(Request::get("/none")).await;
        assert_eq!(body(&response), b"invariant");
    }

    #[tokio::test]
    async fn test_all_error_pipelines_overflowing_is_double_fault() {
        let dispatcher = Dispatcher::builder()
            .register_handler(HandlerSpec::not_found(
                "missing",
                handler_fn(|_inv: Invocation| async move { Err(Fault::msg("lost")) }),
            ))
            .register_handler(
                HandlerSpec::server_error("failed", ok("failed"))
                    .tag(Tag::filter(filter_fn("never", |_req| false))),
            )
            .build()
            .unwrap();

        let response = dispatcher.route(Request::get("/none")).await;
        assert_eq!(body(&response), DOUBLE_FAULT_BODY.as_bytes());
    }
}
