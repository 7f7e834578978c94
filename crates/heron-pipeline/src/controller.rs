//! Handler registration.
//!
//! A [`HandlerSpec`] describes one handler: its role, its tags, how its
//! arguments are bound, and the handler function. A [`Controller`] groups
//! handlers under shared container tags.

use std::fmt;

use heron_core::{FaultType, HandlerFn, ParamBinding};

use crate::tag::Tag;

/// What a handler is for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerRole {
    /// An ordinary route
    Route,
    /// The single handler for requests no route accepts
    NotFound,
    /// A handler for faults raised while serving a request
    ServerError,
}

impl HandlerRole {
    /// Returns the role name used in logs.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Route => "route",
            Self::NotFound => "not_found",
            Self::ServerError => "server_error",
        }
    }
}

impl fmt::Display for HandlerRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A handler waiting to be assembled into a pipeline.
///
/// # Example
///
/// ```
/// use heron_core::{handler_fn, Converter, Invocation, ParamBinding, Response};
/// use heron_pipeline::{HandlerSpec, Tag};
///
/// let spec = HandlerSpec::route(
///     "get_user",
///     handler_fn(|inv: Invocation| async move {
///         let id: i64 = inv.args.get(0).unwrap_or_default();
///         Ok(Response::ok().with_body(id.to_string()))
///     }),
/// )
/// .tag(Tag::path("/users/{re:\\d+}"))
/// .params(ParamBinding::new().capture(Converter::I64));
///
/// assert_eq!(spec.name(), "get_user");
/// ```
#[derive(Clone)]
pub struct HandlerSpec {
    name: String,
    role: HandlerRole,
    fault_types: Vec<FaultType>,
    tags: Vec<Tag>,
    params: ParamBinding,
    handler: HandlerFn,
}

impl HandlerSpec {
    fn with_role(name: impl Into<String>, role: HandlerRole, handler: HandlerFn) -> Self {
        Self {
            name: name.into(),
            role,
            fault_types: Vec::new(),
            tags: Vec::new(),
            params: ParamBinding::default(),
            handler,
        }
    }

    /// An ordinary route handler.
    #[must_use]
    pub fn route(name: impl Into<String>, handler: HandlerFn) -> Self {
        Self::with_role(name, HandlerRole::Route, handler)
    }

    /// The not-found handler.
    #[must_use]
    pub fn not_found(name: impl Into<String>, handler: HandlerFn) -> Self {
        Self::with_role(name, HandlerRole::NotFound, handler)
    }

    /// A server-error handler. Without [`handles`](Self::handles) it
    /// catches every fault.
    #[must_use]
    pub fn server_error(name: impl Into<String>, handler: HandlerFn) -> Self {
        Self::with_role(name, HandlerRole::ServerError, handler)
    }

    /// Adds a tag.
    #[must_use]
    pub fn tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Adds several tags.
    #[must_use]
    pub fn tags(mut self, tags: impl IntoIterator<Item = Tag>) -> Self {
        self.tags.extend(tags);
        self
    }

    /// Sets the parameter binding.
    #[must_use]
    pub fn params(mut self, params: ParamBinding) -> Self {
        self.params = params;
        self
    }

    /// Declares a fault type this server-error handler handles.
    #[must_use]
    pub fn handles<E>(self) -> Self
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.handles_type(FaultType::of::<E>())
    }

    /// Declares a fault type this server-error handler handles.
    #[must_use]
    pub fn handles_type(mut self, fault_type: FaultType) -> Self {
        self.fault_types.push(fault_type);
        self
    }

    /// The handler name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The role.
    #[must_use]
    pub fn role(&self) -> HandlerRole {
        self.role
    }

    /// The declared fault types.
    #[must_use]
    pub fn fault_types(&self) -> &[FaultType] {
        &self.fault_types
    }

    /// The handler's own tags.
    #[must_use]
    pub fn tag_list(&self) -> &[Tag] {
        &self.tags
    }

    /// The parameter binding.
    #[must_use]
    pub fn param_binding(&self) -> &ParamBinding {
        &self.params
    }

    /// The handler function.
    #[must_use]
    pub fn handler(&self) -> &HandlerFn {
        &self.handler
    }
}

impl fmt::Debug for HandlerSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerSpec")
            .field("name", &self.name)
            .field("role", &self.role)
            .field("fault_types", &self.fault_types)
            .field("tags", &self.tags)
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// A group of handlers sharing container tags.
///
/// Container tags apply to every handler before the handler's own tags, so
/// a handler can refine or (for replacing kinds) override them.
pub trait Controller {
    /// Tags shared by every handler.
    fn tags(&self) -> Vec<Tag> {
        Vec::new()
    }

    /// The handlers.
    fn handlers(&self) -> Vec<HandlerSpec>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use heron_core::{handler_fn, Fault, InvariantViolation, Invocation, Response};

    fn noop() -> HandlerFn {
        handler_fn(|_inv: Invocation| async move { Ok::<_, Fault>(Response::ok()) })
    }

    #[test]
    fn test_roles() {
        assert_eq!(HandlerSpec::route("a", noop()).role(), HandlerRole::Route);
        assert_eq!(HandlerSpec::not_found("b", noop()).role(), HandlerRole::NotFound);
        assert_eq!(HandlerSpec::server_error("c", noop()).role(), HandlerRole::ServerError);
        assert_eq!(HandlerRole::NotFound.to_string(), "not_found");
    }

    #[test]
    fn test_default_binding_is_implicit() {
        assert!(HandlerSpec::route("a", noop()).param_binding().is_implicit());
    }

    #[test]
    fn test_handles() {
        let spec = HandlerSpec::server_error("oops", noop()).handles::<InvariantViolation>();
        assert_eq!(spec.fault_types(), [FaultType::of::<InvariantViolation>()]);
    }

    #[test]
    fn test_tags_accumulate() {
        let spec = HandlerSpec::route("a", noop())
            .tag(Tag::path("/a"))
            .tags([Tag::produces("text/plain"), Tag::query("x=1")]);
        assert_eq!(spec.tag_list().len(), 3);
    }

    struct Users;

    impl Controller for Users {
        fn tags(&self) -> Vec<Tag> {
            vec![Tag::produces("application/json")]
        }

        fn handlers(&self) -> Vec<HandlerSpec> {
            vec![HandlerSpec::route("list", noop()).tag(Tag::path("/users"))]
        }
    }

    #[test]
    fn test_controller() {
        assert_eq!(Users.tags().len(), 1);
        assert_eq!(Users.handlers()[0].name(), "list");
    }
}
