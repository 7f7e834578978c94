//! Capabilities: what each tag kind means.
//!
//! A [`Capability`] owns one tag kind. During assembly every tag of that
//! kind is interpreted, merged according to the kind's [`MergeStrategy`],
//! and finally compiled into predicate parts and pipes on an [`Assembly`].
//!
//! The built-in kinds live in a registry created once per process
//! ([`CapabilityRegistry::builtin`]). Applications add their own kinds with
//! [`CapabilityRegistry::builder`].

mod builtin;

use std::fmt;
use std::sync::{Arc, OnceLock};

use heron_core::ConfigResult;
use heron_router::{KeyValueConstraint, MethodSet, PathPattern, Produces, RoutePredicateBuilder};
use indexmap::IndexMap;

use crate::controller::HandlerRole;
use crate::pipe::{Filter, InputPipe, OutputPipe};
use crate::tag::TagValue;

pub use builtin::{
    CodecCapability, DefaultTypeCapability, FilterCapability, HeaderCapability,
    MethodCapability, PathCapability, ProducesCapability, QueryCapability,
};

/// How repeated tags of one kind combine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeStrategy {
    /// Every occurrence is kept, in declaration order
    Combining,
    /// The last occurrence wins
    Replacing,
}

/// One tag kind.
pub trait Capability: Send + Sync + 'static {
    /// The tag kind this capability owns.
    fn kind(&self) -> &str;

    /// How repeated tags combine.
    fn merge_strategy(&self) -> MergeStrategy;

    /// The value assumed when a handler carries no tag of this kind.
    ///
    /// Returning `Some` makes the kind required: it is always compiled.
    fn default_value(&self, role: HandlerRole) -> Option<TagValue> {
        let _ = role;
        None
    }

    /// Validates and parses a tag value.
    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        Ok(value.clone())
    }

    /// Compiles the merged values into the assembly.
    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()>;
}

/// The pipeline under construction, handed to [`Capability::compile`].
pub struct Assembly {
    handler: String,
    role: HandlerRole,
    predicate: RoutePredicateBuilder,
    produces: Produces,
    pub(crate) filters: Vec<Arc<dyn Filter>>,
    pub(crate) inputs: Vec<Arc<dyn InputPipe>>,
    pub(crate) outputs: Vec<Arc<dyn OutputPipe>>,
}

impl Assembly {
    pub(crate) fn new(handler: impl Into<String>, role: HandlerRole) -> Self {
        Self {
            handler: handler.into(),
            role,
            predicate: RoutePredicateBuilder::default(),
            produces: Produces::default(),
            filters: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// The handler being assembled.
    #[must_use]
    pub fn handler_name(&self) -> &str {
        &self.handler
    }

    /// Its role.
    #[must_use]
    pub fn role(&self) -> HandlerRole {
        self.role
    }

    /// Sets the accepted methods.
    pub fn set_methods(&mut self, methods: MethodSet) {
        self.predicate = std::mem::take(&mut self.predicate).methods(methods);
    }

    /// Adds an alternative path pattern.
    pub fn add_path(&mut self, pattern: PathPattern) {
        self.predicate = std::mem::take(&mut self.predicate).path(pattern);
    }

    /// Adds query constraints.
    pub fn add_query(&mut self, constraint: &KeyValueConstraint) {
        self.predicate = std::mem::take(&mut self.predicate).query(constraint);
    }

    /// Adds header constraints.
    pub fn add_headers(&mut self, constraint: &KeyValueConstraint) {
        self.predicate = std::mem::take(&mut self.predicate).headers(constraint);
    }

    /// The producible types so far.
    #[must_use]
    pub fn produces(&self) -> &Produces {
        &self.produces
    }

    /// Replaces the producible types.
    pub fn set_produces(&mut self, produces: Produces) {
        self.produces = produces;
    }

    /// Transforms the producible types.
    pub fn map_produces(&mut self, f: impl FnOnce(Produces) -> Produces) {
        self.produces = f(std::mem::take(&mut self.produces));
    }

    /// Appends a filter.
    pub fn add_filter(&mut self, filter: Arc<dyn Filter>) {
        self.filters.push(filter);
    }

    /// Appends an input pipe.
    pub fn add_input(&mut self, pipe: Arc<dyn InputPipe>) {
        self.inputs.push(pipe);
    }

    /// Appends an output pipe.
    pub fn add_output(&mut self, pipe: Arc<dyn OutputPipe>) {
        self.outputs.push(pipe);
    }

    pub(crate) fn take_predicate(&mut self) -> RoutePredicateBuilder {
        let produces = std::mem::take(&mut self.produces);
        std::mem::take(&mut self.predicate).produces(produces)
    }
}

impl fmt::Debug for Assembly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Assembly")
            .field("handler", &self.handler)
            .field("role", &self.role)
            .field("filters", &self.filters.len())
            .field("inputs", &self.inputs.len())
            .field("outputs", &self.outputs.len())
            .finish_non_exhaustive()
    }
}

/// The set of known capabilities, in compile order.
#[derive(Clone)]
pub struct CapabilityRegistry {
    capabilities: IndexMap<String, Arc<dyn Capability>>,
}

static BUILTIN: OnceLock<CapabilityRegistry> = OnceLock::new();

impl CapabilityRegistry {
    /// The built-in capabilities.
    ///
    /// Compile order: method, path, query, header, produces, default type,
    /// codec, filter.
    pub fn builtin() -> &'static Self {
        BUILTIN.get_or_init(|| {
            let mut registry = Self {
                capabilities: IndexMap::new(),
            };
            registry.insert(Arc::new(MethodCapability));
            registry.insert(Arc::new(PathCapability));
            registry.insert(Arc::new(QueryCapability));
            registry.insert(Arc::new(HeaderCapability));
            registry.insert(Arc::new(ProducesCapability));
            registry.insert(Arc::new(DefaultTypeCapability));
            registry.insert(Arc::new(CodecCapability));
            registry.insert(Arc::new(FilterCapability));
            registry
        })
    }

    /// Starts from the built-ins.
    ///
    /// # Example
    ///
    /// ```
    /// use heron_pipeline::{Assembly, Capability, CapabilityRegistry, MergeStrategy, TagValue};
    /// use heron_core::ConfigResult;
    ///
    /// struct Audit;
    ///
    /// impl Capability for Audit {
    ///     fn kind(&self) -> &str {
    ///         "audit"
    ///     }
    ///
    ///     fn merge_strategy(&self) -> MergeStrategy {
    ///         MergeStrategy::Replacing
    ///     }
    ///
    ///     fn compile(&self, _values: &[TagValue], _assembly: &mut Assembly) -> ConfigResult<()> {
    ///         Ok(())
    ///     }
    /// }
    ///
    /// let registry = CapabilityRegistry::builder().register(Audit).build();
    /// assert!(registry.get("audit").is_some());
    /// assert!(registry.get("path").is_some());
    /// ```
    #[must_use]
    pub fn builder() -> CapabilityRegistryBuilder {
        CapabilityRegistryBuilder {
            registry: Self::builtin().clone(),
        }
    }

    /// Looks up the capability for `kind`.
    #[must_use]
    pub fn get(&self, kind: &str) -> Option<&Arc<dyn Capability>> {
        self.capabilities.get(kind)
    }

    /// The capabilities in compile order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Capability>> {
        self.capabilities.values()
    }

    /// The registered kinds in compile order.
    pub fn kinds(&self) -> impl Iterator<Item = &str> {
        self.capabilities.keys().map(String::as_str)
    }

    /// The number of capabilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.capabilities.len()
    }

    /// Returns true if no capability is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.capabilities.is_empty()
    }

    fn insert(&mut self, capability: Arc<dyn Capability>) {
        self.capabilities
            .insert(capability.kind().to_string(), capability);
    }
}

impl fmt::Debug for CapabilityRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.kinds()).finish()
    }
}

/// Builder for a [`CapabilityRegistry`].
#[derive(Debug)]
pub struct CapabilityRegistryBuilder {
    registry: CapabilityRegistry,
}

impl CapabilityRegistryBuilder {
    /// Adds a capability after the existing ones, or replaces the one that
    /// owns the same kind in place.
    #[must_use]
    pub fn register<C: Capability>(mut self, capability: C) -> Self {
        self.registry.insert(Arc::new(capability));
        self
    }

    /// Finishes the registry.
    #[must_use]
    pub fn build(self) -> CapabilityRegistry {
        self.registry
    }
}
