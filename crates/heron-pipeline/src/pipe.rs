//! The three kinds of pipe a pipeline is made of.
//!
//! Pipes are synchronous and stateless between requests. Everything a pipe
//! learns about a request travels in the [`FlowingRequest`] it returns.
//!
//! | Pipe | Runs | May |
//! |------|------|-----|
//! | [`Filter`] | before inputs | reject the request, overflowing the pipeline |
//! | [`InputPipe`] | before the handler | replace the request, overflow, or fault |
//! | [`OutputPipe`] | after the handler | replace the response, or fault |

use std::fmt;
use std::sync::Arc;

use heron_core::{Fault, FlowingRequest, FlowingResponse};

/// A yes/no check run before any input pipe.
pub trait Filter: Send + Sync + 'static {
    /// Returns the name used in logs.
    fn name(&self) -> &str;

    /// Returns false to overflow the pipeline.
    fn accepts(&self, request: &FlowingRequest) -> bool;
}

/// What an input pipe decided.
#[derive(Debug, Clone)]
pub enum InputOutcome {
    /// Continue with this request
    Continue(FlowingRequest),
    /// Give up on this pipeline and try the next candidate
    Overflow,
}

/// Transforms the request on its way to the handler.
pub trait InputPipe: Send + Sync + 'static {
    /// Returns the name used in logs.
    fn name(&self) -> &str;

    /// Transforms the request.
    ///
    /// An `Err` is a fault and enters server-error handling.
    fn pipe_in(&self, request: FlowingRequest) -> Result<InputOutcome, Fault>;
}

/// Transforms the response on its way out.
pub trait OutputPipe: Send + Sync + 'static {
    /// Returns the name used in logs.
    fn name(&self) -> &str;

    /// Transforms the response.
    fn pipe_out(&self, response: FlowingResponse) -> Result<FlowingResponse, Fault>;
}

/// A [`Filter`] backed by a closure.
///
/// # Example
///
/// ```
/// use heron_pipeline::pipe::{filter_fn, Filter};
///
/// let has_tenant = filter_fn("has_tenant", |req| req.headers().contains_key("x-tenant"));
/// assert_eq!(has_tenant.name(), "has_tenant");
/// ```
pub fn filter_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn Filter>
where
    F: Fn(&FlowingRequest) -> bool + Send + Sync + 'static,
{
    Arc::new(FnFilter {
        name: name.into(),
        f,
    })
}

/// An [`InputPipe`] backed by a closure.
pub fn input_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn InputPipe>
where
    F: Fn(FlowingRequest) -> Result<InputOutcome, Fault> + Send + Sync + 'static,
{
    Arc::new(FnInput {
        name: name.into(),
        f,
    })
}

/// An [`OutputPipe`] backed by a closure.
pub fn output_fn<F>(name: impl Into<String>, f: F) -> Arc<dyn OutputPipe>
where
    F: Fn(FlowingResponse) -> Result<FlowingResponse, Fault> + Send + Sync + 'static,
{
    Arc::new(FnOutput {
        name: name.into(),
        f,
    })
}

struct FnFilter<F> {
    name: String,
    f: F,
}

impl<F> Filter for FnFilter<F>
where
    F: Fn(&FlowingRequest) -> bool + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn accepts(&self, request: &FlowingRequest) -> bool {
        (self.f)(request)
    }
}

struct FnInput<F> {
    name: String,
    f: F,
}

impl<F> InputPipe for FnInput<F>
where
    F: Fn(FlowingRequest) -> Result<InputOutcome, Fault> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn pipe_in(&self, request: FlowingRequest) -> Result<InputOutcome, Fault> {
        (self.f)(request)
    }
}

struct FnOutput<F> {
    name: String,
    f: F,
}

impl<F> OutputPipe for FnOutput<F>
where
    F: Fn(FlowingResponse) -> Result<FlowingResponse, Fault> + Send + Sync + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn pipe_out(&self, response: FlowingResponse) -> Result<FlowingResponse, Fault> {
        (self.f)(response)
    }
}

impl fmt::Debug for dyn Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Filter({})", self.name())
    }
}

impl fmt::Debug for dyn InputPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "InputPipe({})", self.name())
    }
}

impl fmt::Debug for dyn OutputPipe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OutputPipe({})", self.name())
    }
}
