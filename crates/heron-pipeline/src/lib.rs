//! # Heron Pipeline
//!
//! Capability-based pipeline assembly and request dispatch.
//!
//! Handlers are registered as [`HandlerSpec`]s, usually grouped by a
//! [`Controller`] that contributes shared container tags. Each handler's
//! tags are interpreted by the [`CapabilityRegistry`] and compiled into an
//! immutable [`Pipeline`]:
//!
//! ```text
//! predicate → filters → input pipes → handler → output pipes
//! ```
//!
//! The [`Dispatcher`] tries every matching route pipeline in registration
//! order, falls back to the not-found pipeline, and sends faults through the
//! server-error pipelines:
//!
//! | Outcome | Next step |
//! |---------|-----------|
//! | complete | response returned |
//! | overflow | next candidate, then not-found |
//! | fault | server-error pipelines, declared types first |
//! | fault while handling a fault | fixed 500 response |
//!
//! ## Tags
//!
//! | Tag | Merge | Effect |
//! |-----|-------|--------|
//! | [`Tag::method`] | combining | allowed methods, `GET` when absent |
//! | [`Tag::path`] | combining | alternative path patterns |
//! | [`Tag::query`] / [`Tag::header`] | combining | `key=value` constraints |
//! | [`Tag::produces`] | combining | declared response types |
//! | [`Tag::default_type`] | replacing | fallback response type |
//! | [`Tag::codec`] | replacing | body codec override |
//! | [`Tag::filter`] | combining | custom request filters |
//! | [`Tag::meta`] | n/a | a named bundle of other tags |
//!
//! New kinds are added with [`CapabilityRegistry::builder`].

#![doc(html_root_url = "https://docs.rs/heron-pipeline/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod assemble;
mod capability;
mod controller;
mod dispatch;
pub mod pipe;
mod pipeline;
pub mod pipes;
mod tag;

pub use assemble::Assembler;
pub use capability::{
    Assembly, Capability, CapabilityRegistry, CapabilityRegistryBuilder, CodecCapability,
    DefaultTypeCapability, FilterCapability, HeaderCapability, MergeStrategy, MethodCapability,
    PathCapability, ProducesCapability, QueryCapability,
};
pub use controller::{Controller, HandlerRole, HandlerSpec};
pub use dispatch::{
    double_fault_response, Dispatcher, DispatcherBuilder, DOUBLE_FAULT_BODY, DOUBLE_FAULT_HEADER,
};
pub use pipe::{Filter, InputOutcome, InputPipe, OutputPipe};
pub use pipeline::{Pipeline, PipelineOutcome, Stage};
pub use tag::{kinds, Tag, TagValue};
