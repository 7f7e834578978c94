//! Assembled pipelines.
//!
//! A [`Pipeline`] is built once at registration and never changes. Running
//! it walks a fixed sequence:
//!
//! ```text
//! filters ──reject──▶ Overflow
//!    │
//! inputs ───overflow─▶ Overflow
//!    │
//! handler ──Err/panic─▶ Fault
//!    │
//! outputs ──Err──────▶ Fault
//!    │
//! Complete(response)
//! ```

use std::fmt;
use std::sync::Arc;

use heron_core::{Fault, FaultType, FlowingRequest, FlowingResponse, HandlerFn, Invocation};
use heron_router::RoutePredicate;

use crate::controller::HandlerRole;
use crate::pipe::{Filter, InputOutcome, InputPipe, OutputPipe};

/// The stage at which a pipeline overflowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// The route predicate did not match
    Predicate,
    /// A filter rejected the request
    Filter,
    /// An input pipe gave up
    Input,
}

impl Stage {
    /// Returns the stage name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Predicate => "predicate",
            Self::Filter => "filter",
            Self::Input => "input",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The result of running a pipeline that did not fault.
#[derive(Debug)]
pub enum PipelineOutcome {
    /// The pipeline produced a response
    Complete(FlowingResponse),
    /// The pipeline declined the request
    Overflow(Stage),
}

/// An immutable chain of filters, input pipes, a handler and output pipes.
pub struct Pipeline {
    pub(crate) name: String,
    pub(crate) role: HandlerRole,
    pub(crate) fault_types: Vec<FaultType>,
    pub(crate) predicate: RoutePredicate,
    pub(crate) filters: Vec<Arc<dyn Filter>>,
    pub(crate) inputs: Vec<Arc<dyn InputPipe>>,
    pub(crate) handler: HandlerFn,
    pub(crate) outputs: Vec<Arc<dyn OutputPipe>>,
}

impl Pipeline {
    /// The handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handler role.
    #[must_use]
    pub fn role(&self) -> HandlerRole {
        self.role
    }

    /// The declared fault types; empty for a catch-all.
    #[must_use]
    pub fn fault_types(&self) -> &[FaultType] {
        &self.fault_types
    }

    /// The compiled route predicate.
    #[must_use]
    pub fn predicate(&self) -> &RoutePredicate {
        &self.predicate
    }

    /// Filter names, in order.
    #[must_use]
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Input pipe names, in order.
    #[must_use]
    pub fn input_names(&self) -> Vec<&str> {
        self.inputs.iter().map(|p| p.name()).collect()
    }

    /// Output pipe names, in order.
    #[must_use]
    pub fn output_names(&self) -> Vec<&str> {
        self.outputs.iter().map(|p| p.name()).collect()
    }

    /// Returns true if this server-error pipeline explicitly declares a
    /// type matching `fault`.
    #[must_use]
    pub fn declares(&self, fault: &Fault) -> bool {
        self.fault_types.iter().any(|ty| ty.matches(fault))
    }

    /// Returns true if the handler should see `fault`: it declares a
    /// matching type or declares none.
    #[must_use]
    pub fn accepts_fault(&self, fault: &Fault) -> bool {
        self.fault_types.is_empty() || self.declares(fault)
    }

    /// Runs the pipeline on a request that already passed its predicate.
    ///
    /// Panics inside the handler or a pipe are not caught here; the
    /// dispatcher catches them around this future.
    pub async fn run(&self, request: FlowingRequest) -> Result<PipelineOutcome, Fault> {
        for filter in &self.filters {
            if !filter.accepts(&request) {
                tracing::trace!(pipeline = %self.name, filter = filter.name(), "filter rejected");
                return Ok(PipelineOutcome::Overflow(Stage::Filter));
            }
        }

        let mut request = request;
        for pipe in &self.inputs {
            request = match pipe.pipe_in(request)? {
                InputOutcome::Continue(next) => next,
                InputOutcome::Overflow => {
                    tracing::trace!(pipeline = %self.name, input = pipe.name(), "input overflowed");
                    return Ok(PipelineOutcome::Overflow(Stage::Input));
                }
            };
        }

        let fault = request
            .fault()
            .filter(|fault| self.role == HandlerRole::ServerError && self.accepts_fault(fault))
            .cloned();
        let invocation = Invocation {
            args: request.args(),
            request: request.clone(),
            fault,
        };
        let response = (self.handler)(invocation).await?;

        let mut response = FlowingResponse::new(response, request);
        for pipe in &self.outputs {
            response = pipe.pipe_out(response)?;
        }
        Ok(PipelineOutcome::Complete(response))
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("fault_types", &self.fault_types)
            .field("filters", &self.filter_names())
            .field("inputs", &self.input_names())
            .field("outputs", &self.output_names())
            .finish_non_exhaustive()
    }
}
