//! Argument binding.

use heron_core::{keys, Fault, FlowingRequest, ParamBinding};

use crate::pipe::{InputOutcome, InputPipe};

/// Resolves handler arguments and stores them under [`keys::ARGS`].
///
/// A value that cannot be converted overflows the pipeline, so the request
/// falls through to the next candidate and eventually to not-found.
#[derive(Debug, Clone)]
pub struct BindArguments {
    handler: String,
    binding: ParamBinding,
}

impl BindArguments {
    /// Creates the pipe for `handler`.
    #[must_use]
    pub fn new(handler: impl Into<String>, binding: ParamBinding) -> Self {
        Self {
            handler: handler.into(),
            binding,
        }
    }
}

impl InputPipe for BindArguments {
    fn name(&self) -> &str {
        "bind_arguments"
    }

    fn pipe_in(&self, request: FlowingRequest) -> Result<InputOutcome, Fault> {
        let resolved = self
            .binding
            .resolve(&request.captures(), request.query(), request.headers());
        match resolved {
            Ok(args) => Ok(InputOutcome::Continue(request.with(&keys::ARGS, args))),
            Err(error) => {
                tracing::debug!(
                    pipeline = %self.handler,
                    error = %error,
                    "argument conversion failed"
                );
                Ok(InputOutcome::Overflow)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{Converter, Request};
    use heron_router::Captures;

    fn routed(target: &str, captures: &[&str]) -> FlowingRequest {
        FlowingRequest::from(Request::get(target))
            .with(&keys::CAPTURES, captures.iter().copied().collect::<Captures>())
    }

    #[test]
    fn test_binds_typed_capture() {
        let pipe = BindArguments::new("get", ParamBinding::new().capture(Converter::I64));
        let outcome = pipe.pipe_in(routed("/re/42", &["42"])).unwrap();
        let InputOutcome::Continue(request) = outcome else {
            panic!("expected continue");
        };
        assert_eq!(request.args().get::<i64>(0), Some(42));
    }

    #[test]
    fn test_conversion_failure_overflows() {
        let pipe = BindArguments::new("get", ParamBinding::new().capture(Converter::U8));
        let outcome = pipe.pipe_in(routed("/re/300", &["300"])).unwrap();
        assert!(matches!(outcome, InputOutcome::Overflow));
    }

    #[test]
    fn test_missing_query_overflows() {
        let pipe = BindArguments::new("search", ParamBinding::new().query("q", Converter::Str));
        let outcome = pipe.pipe_in(routed("/search", &[])).unwrap();
        assert!(matches!(outcome, InputOutcome::Overflow));

        let outcome = pipe.pipe_in(routed("/search?q=owl", &[])).unwrap();
        let InputOutcome::Continue(request) = outcome else {
            panic!("expected continue");
        };
        assert_eq!(request.args().str(0), Some("owl"));
    }

    #[test]
    fn test_implicit_binding_passes_strings() {
        let pipe = BindArguments::new("get", ParamBinding::default());
        let InputOutcome::Continue(request) = pipe.pipe_in(routed("/a/b", &["a", "b"])).unwrap() else {
            panic!("expected continue");
        };
        assert_eq!(request.args().len(), 2);
        assert_eq!(request.args().str(1), Some("b"));
    }
}
