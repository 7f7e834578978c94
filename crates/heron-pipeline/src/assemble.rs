//! Pipeline assembly.
//!
//! Assembly turns a handler's tags into a [`Pipeline`]:
//!
//! 1. Every required kind is seeded with its default for the handler role.
//! 2. Container tags, then handler tags, are walked in order. Meta tags are
//!    expanded in place, up to a depth bound. Each tag is interpreted by the
//!    capability owning its kind and merged into that kind's accumulator.
//!    The first real tag of a seeded kind discards the seed.
//! 3. Accumulators are compiled in registry order.
//! 4. The parameter binding is checked against the route's capture count.
//!
//! The assembler adds two pipes of its own: argument binding as the first
//! input and `HEAD` body removal as the last output.

use std::collections::HashMap;
use std::sync::Arc;

use heron_core::{ConfigError, ConfigResult, DEFAULT_MAX_META_DEPTH};

use crate::capability::{Assembly, CapabilityRegistry, MergeStrategy};
use crate::controller::{HandlerRole, HandlerSpec};
use crate::pipe::InputPipe;
use crate::pipeline::Pipeline;
use crate::pipes::{BindArguments, DropHeadBody};
use crate::tag::{Tag, TagValue};

#[derive(Debug, Default)]
struct Accumulator {
    values: Vec<TagValue>,
    seeded: bool,
}

/// Builds pipelines from handler specs.
#[derive(Debug, Clone, Copy)]
pub struct Assembler<'r> {
    registry: &'r CapabilityRegistry,
    max_meta_depth: usize,
}

impl<'r> Assembler<'r> {
    /// Creates an assembler over `registry`.
    #[must_use]
    pub fn new(registry: &'r CapabilityRegistry) -> Self {
        Self {
            registry,
            max_meta_depth: DEFAULT_MAX_META_DEPTH,
        }
    }

    /// Sets the meta tag nesting bound.
    #[must_use]
    pub fn with_max_meta_depth(mut self, depth: usize) -> Self {
        self.max_meta_depth = depth;
        self
    }

    /// Assembles `spec` under a controller's `container_tags`.
    ///
    /// # Errors
    ///
    /// - `ConfigError::UnknownCapability` for a tag kind not in the registry
    /// - `ConfigError::MetaTagTooDeep` when meta tags nest past the bound
    /// - `ConfigError::InvalidTag` or `ConfigError::Router` for a bad value
    /// - `ConfigError::InvalidBinding` when the binding reads a capture the
    ///   route does not have
    ///
    /// # Example
    ///
    /// ```
    /// use heron_core::{handler_fn, Invocation, Response};
    /// use heron_pipeline::{Assembler, CapabilityRegistry, HandlerSpec, Tag};
    ///
    /// let spec = HandlerSpec::route(
    ///     "list",
    ///     handler_fn(|_inv: Invocation| async move { Ok(Response::ok()) }),
    /// )
    /// .tag(Tag::path("/{*}/list"));
    ///
    /// let pipeline = Assembler::new(CapabilityRegistry::builtin())
    ///     .assemble(&[Tag::produces("application/json")], spec)
    ///     .unwrap();
    /// assert_eq!(pipeline.predicate().capture_count(), 1);
    /// ```
    pub fn assemble(&self, container_tags: &[Tag], spec: HandlerSpec) -> ConfigResult<Pipeline> {
        let role = spec.role();
        let mut accumulators: HashMap<String, Accumulator> = HashMap::new();

        for capability in self.registry.iter() {
            if let Some(seed) = capability.default_value(role) {
                accumulators.insert(
                    capability.kind().to_string(),
                    Accumulator {
                        values: vec![seed],
                        seeded: true,
                    },
                );
            }
        }

        self.collect(container_tags, 0, &mut accumulators)?;
        self.collect(spec.tag_list(), 0, &mut accumulators)?;

        let mut assembly = Assembly::new(spec.name(), role);
        for capability in self.registry.iter() {
            if let Some(accumulator) = accumulators.get(capability.kind()) {
                if !accumulator.values.is_empty() {
                    capability.compile(&accumulator.values, &mut assembly)?;
                }
            }
        }

        let predicate = assembly.take_predicate().build()?;
        spec.param_binding()
            .validate(predicate.capture_count())
            .map_err(|reason| ConfigError::invalid_binding(spec.name(), reason))?;

        let mut inputs: Vec<Arc<dyn InputPipe>> = Vec::with_capacity(assembly.inputs.len() + 1);
        inputs.push(Arc::new(BindArguments::new(
            spec.name(),
            spec.param_binding().clone(),
        )));
        inputs.append(&mut assembly.inputs);

        let mut outputs = std::mem::take(&mut assembly.outputs);
        outputs.push(Arc::new(DropHeadBody));

        tracing::debug!(
            pipeline = spec.name(),
            role = %role,
            filters = assembly.filters.len(),
            inputs = inputs.len(),
            outputs = outputs.len(),
            "pipeline assembled"
        );

        Ok(Pipeline {
            name: spec.name().to_string(),
            role,
            fault_types: if role == HandlerRole::ServerError {
                spec.fault_types().to_vec()
            } else {
                Vec::new()
            },
            predicate,
            filters: std::mem::take(&mut assembly.filters),
            inputs,
            handler: Arc::clone(spec.handler()),
            outputs,
        })
    }

    fn collect(
        &self,
        tags: &[Tag],
        depth: usize,
        accumulators: &mut HashMap<String, Accumulator>,
    ) -> ConfigResult<()> {
        for tag in tags {
            if let Some((name, inner)) = tag.as_meta() {
                if depth >= self.max_meta_depth {
                    return Err(ConfigError::MetaTagTooDeep {
                        name: name.to_string(),
                        limit: self.max_meta_depth,
                    });
                }
                self.collect(inner, depth + 1, accumulators)?;
                continue;
            }

            let (Some(kind), Some(value)) = (tag.kind(), tag.value()) else {
                continue;
            };
            let capability = self
                .registry
                .get(kind)
                .ok_or_else(|| ConfigError::UnknownCapability {
                    kind: kind.to_string(),
                })?;
            let value = capability.interpret(value)?;

            let accumulator = accumulators.entry(kind.to_string()).or_default();
            if accumulator.seeded {
                accumulator.values.clear();
                accumulator.seeded = false;
            }
            match capability.merge_strategy() {
                MergeStrategy::Combining => accumulator.values.push(value),
                MergeStrategy::Replacing => accumulator.values = vec![value],
            }
        }
        Ok(())
    }
}
