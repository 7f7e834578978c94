//! # Heron Core
//!
//! Core types shared by the Heron dispatcher and its users:
//!
//! - [`Request`] / [`Response`] - what the dispatcher consumes and produces
//! - [`FlowingRequest`] / [`FlowingResponse`] - immutable per-request values
//!   threaded through pipeline stages, with typed [`Key`] extensions
//! - [`Fault`] - a cloneable handler failure, and [`FaultType`] to scope
//!   server-error handlers
//! - [`ConfigError`] - registration and assembly errors
//! - [`ParamBinding`] / [`Args`] - explicit argument binding with typed
//!   [`Converter`]s
//! - [`HandlerFn`] / [`BodyCodec`] - the handler and codec seams

#![doc(html_root_url = "https://docs.rs/heron-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod args;
mod config;
mod error;
mod extensions;
mod fault;
mod flowing;
mod handler;
mod message;

pub use args::{ArgSource, ArgValue, Args, Converter, FromArg, ParamBinding, ParamSpec};
pub use config::{RoutingConfig, DEFAULT_MAX_META_DEPTH};
pub use error::{ConfigError, ConfigResult, ConversionError};
pub use extensions::{Extensions, Key};
pub use fault::{Fault, FaultType, InvariantViolation, PanicFault};
pub use flowing::{keys, FlowingRequest, FlowingResponse};
pub use handler::{handler_fn, BodyCodec, BoxFuture, HandlerFn, Invocation};
pub use message::{Request, Response};
