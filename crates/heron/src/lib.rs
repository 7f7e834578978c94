//! # Heron
//!
//! **Request matching and dispatch with capability-assembled pipelines**
//!
//! Heron routes requests to handlers declared with tags:
//!
//! - **Path patterns** with single-segment, end and regex captures
//! - **Content negotiation** over `Accept` with quality ranking
//! - **Capabilities** that turn tags into predicates and pipes, extensible
//!   with user kinds
//! - **Recovery** through not-found and server-error pipelines, with a fixed
//!   response when recovery itself faults
//!
//! ## Quick Start
//!
//! ```rust
//! use heron::prelude::*;
//!
//! # tokio_test::block_on(async {
//! let config = HeronConfig::default();
//! let dispatcher = heron::builder(&config)
//!     .register_handler(
//!         HandlerSpec::route(
//!             "get_user",
//!             handler_fn(|inv: Invocation| async move {
//!                 let id: i64 = inv.args.get(0).unwrap_or_default();
//!                 Ok(Response::ok().with_body(format!("user {id}")))
//!             }),
//!         )
//!         .tag(Tag::path("/users/{*}"))
//!         .params(ParamBinding::new().capture(Converter::I64)),
//!     )
//!     .register_handler(HandlerSpec::not_found(
//!         "missing",
//!         handler_fn(|_inv: Invocation| async move {
//!             Ok(Response::text(StatusCode::NOT_FOUND, "not found"))
//!         }),
//!     ))
//!     .register_handler(HandlerSpec::server_error(
//!         "failed",
//!         handler_fn(|_inv: Invocation| async move {
//!             Ok(Response::text(StatusCode::INTERNAL_SERVER_ERROR, "failed"))
//!         }),
//!     ))
//!     .build()
//!     .unwrap();
//!
//! let response = dispatcher.route(Request::get("/users/7")).await;
//! assert_eq!(response.body().map(|b| &b[..]), Some(&b"user 7"[..]));
//! # });
//! ```

#![doc(html_root_url = "https://docs.rs/heron/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub use heron_config as config;
pub use heron_core as core;
pub use heron_pipeline as pipeline;
pub use heron_router as router;
pub use heron_telemetry as telemetry;

use heron_config::{ConfigLoadError, HeronConfig};
use heron_core::ConfigError;
use heron_pipeline::{Dispatcher, DispatcherBuilder};
use heron_telemetry::TelemetryError;

/// Errors from setting Heron up.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Loading or validating configuration failed
    #[error(transparent)]
    Load(#[from] ConfigLoadError),

    /// Installing the log subscriber failed
    #[error(transparent)]
    Telemetry(#[from] TelemetryError),

    /// Registering or assembling handlers failed
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Starts a dispatcher builder with the routing settings from `config`.
#[must_use]
pub fn builder(config: &HeronConfig) -> DispatcherBuilder {
    Dispatcher::builder().config(config.routing_config())
}

/// Validates `config`, installs logging, and starts a dispatcher builder.
///
/// # Errors
///
/// Returns an error if the config is invalid or a global subscriber is
/// already installed.
pub fn init(config: &HeronConfig) -> Result<DispatcherBuilder, Error> {
    config.validate()?;
    heron_telemetry::init_logging(&config.log_config())?;
    Ok(builder(config))
}

/// Prelude module for convenient imports.
///
/// ```rust
/// use heron::prelude::*;
/// ```
pub mod prelude {
    pub use heron_config::{ConfigLoader, HeronConfig};
    pub use heron_core::{
        handler_fn, BodyCodec, ConfigError, Converter, Fault, FaultType, FlowingRequest,
        FlowingResponse, Invocation, ParamBinding, Request, Response, RoutingConfig,
    };
    pub use heron_pipeline::pipe::{filter_fn, input_fn, output_fn};
    pub use heron_pipeline::{
        Capability, CapabilityRegistry, Controller, Dispatcher, HandlerSpec, InputOutcome,
        MergeStrategy, Tag, TagValue,
    };
    pub use heron_router::{MimeType, RouterError};
    pub use http::{Method, StatusCode};
}
