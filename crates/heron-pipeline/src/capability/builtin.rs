//! The built-in capabilities.

use std::sync::Arc;

use heron_core::{ConfigError, ConfigResult};
use heron_router::{KeyValueConstraint, MethodSet, MimeType, PathPattern, Produces};
use http::Method;

use super::{Assembly, Capability, MergeStrategy};
use crate::controller::HandlerRole;
use crate::pipes::{CodecDecode, CodecEncode, InjectContentType};
use crate::tag::{kinds, TagValue};

fn unexpected(kind: &str, value: &TagValue) -> ConfigError {
    ConfigError::invalid_tag(kind, format!("unexpected {} value", value.describe()))
}

/// Accepted methods. Routes default to `GET`; not-found and server-error
/// handlers default to every method.
#[derive(Debug, Clone, Copy, Default)]
pub struct MethodCapability;

impl Capability for MethodCapability {
    fn kind(&self) -> &str {
        kinds::METHOD
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Combining
    }

    fn default_value(&self, role: HandlerRole) -> Option<TagValue> {
        match role {
            HandlerRole::Route => Some(TagValue::Methods(vec![Method::GET])),
            HandlerRole::NotFound | HandlerRole::ServerError => Some(TagValue::Methods(Vec::new())),
        }
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Methods(_) => Ok(value.clone()),
            TagValue::Text(text) => Method::from_bytes(text.trim().as_bytes())
                .map(|method| TagValue::Methods(vec![method]))
                .map_err(|_| ConfigError::invalid_tag(kinds::METHOD, format!("'{text}' is not a method"))),
            other => Err(unexpected(kinds::METHOD, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        let mut methods = MethodSet::default();
        for value in values {
            match value {
                TagValue::Methods(list) if list.is_empty() => {
                    assembly.set_methods(MethodSet::any());
                    return Ok(());
                }
                TagValue::Methods(list) => methods.extend(list.iter().cloned()),
                other => return Err(unexpected(kinds::METHOD, other)),
            }
        }
        assembly.set_methods(methods);
        Ok(())
    }
}

/// Alternative path patterns.
#[derive(Debug, Clone, Copy, Default)]
pub struct PathCapability;

impl Capability for PathCapability {
    fn kind(&self) -> &str {
        kinds::PATH
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Combining
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Text(text) => Ok(TagValue::Pattern(PathPattern::parse(text)?)),
            TagValue::Pattern(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::PATH, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        for value in values {
            match value {
                TagValue::Pattern(pattern) => assembly.add_path(pattern.clone()),
                other => return Err(unexpected(kinds::PATH, other)),
            }
        }
        Ok(())
    }
}

/// Required query values.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryCapability;

impl Capability for QueryCapability {
    fn kind(&self) -> &str {
        kinds::QUERY
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Combining
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Text(text) => Ok(TagValue::Constraint(KeyValueConstraint::query([
                text.as_str()
            ])?)),
            TagValue::Constraint(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::QUERY, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        for value in values {
            match value {
                TagValue::Constraint(constraint) => assembly.add_query(constraint),
                other => return Err(unexpected(kinds::QUERY, other)),
            }
        }
        Ok(())
    }
}

/// Required header values, with case-insensitive names.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeaderCapability;

impl Capability for HeaderCapability {
    fn kind(&self) -> &str {
        kinds::HEADER
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Combining
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Text(text) => Ok(TagValue::Constraint(KeyValueConstraint::header([
                text.as_str()
            ])?)),
            TagValue::Constraint(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::HEADER, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        for value in values {
            match value {
                TagValue::Constraint(constraint) => assembly.add_headers(constraint),
                other => return Err(unexpected(kinds::HEADER, other)),
            }
        }
        Ok(())
    }
}

/// Producible types. Always compiled; with nothing declared every request
/// negotiates to `application/octet-stream`. Adds [`InjectContentType`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ProducesCapability;

impl Capability for ProducesCapability {
    fn kind(&self) -> &str {
        kinds::PRODUCES
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Combining
    }

    fn default_value(&self, _role: HandlerRole) -> Option<TagValue> {
        Some(TagValue::Flag(false))
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Text(text) => Ok(TagValue::Mime(MimeType::parse(text)?)),
            TagValue::Mime(_) | TagValue::Flag(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::PRODUCES, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        let mut types = Vec::new();
        let mut matches_anything = false;
        for value in values {
            match value {
                TagValue::Mime(mime) => types.push(mime.clone()),
                TagValue::Flag(flag) => matches_anything |= *flag,
                other => return Err(unexpected(kinds::PRODUCES, other)),
            }
        }
        assembly.set_produces(Produces::new(types).with_matches_anything(matches_anything));
        assembly.add_output(Arc::new(InjectContentType));
        Ok(())
    }
}

/// The fallback content type. The last declaration wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultTypeCapability;

impl Capability for DefaultTypeCapability {
    fn kind(&self) -> &str {
        kinds::DEFAULT_TYPE
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Replacing
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Text(text) => Ok(TagValue::Mime(MimeType::parse(text)?)),
            TagValue::Mime(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::DEFAULT_TYPE, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        match values.last() {
            Some(TagValue::Mime(mime)) => {
                let mime = mime.clone();
                assembly.map_produces(|produces| produces.with_default(mime));
                Ok(())
            }
            Some(other) => Err(unexpected(kinds::DEFAULT_TYPE, other)),
            None => Ok(()),
        }
    }
}

/// Body codec override. The last declaration wins; compiles to a decode
/// input and an encode output.
#[derive(Debug, Clone, Copy, Default)]
pub struct CodecCapability;

impl Capability for CodecCapability {
    fn kind(&self) -> &str {
        kinds::CODEC
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Replacing
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Codec(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::CODEC, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        match values.last() {
            Some(TagValue::Codec(codec)) => {
                assembly.add_input(Arc::new(CodecDecode::new(Arc::clone(codec))));
                assembly.add_output(Arc::new(CodecEncode::new(Arc::clone(codec))));
                Ok(())
            }
            Some(other) => Err(unexpected(kinds::CODEC, other)),
            None => Ok(()),
        }
    }
}

/// Custom filters, in declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct FilterCapability;

impl Capability for FilterCapability {
    fn kind(&self) -> &str {
        kinds::FILTER
    }

    fn merge_strategy(&self) -> MergeStrategy {
        MergeStrategy::Combining
    }

    fn interpret(&self, value: &TagValue) -> ConfigResult<TagValue> {
        match value {
            TagValue::Filter(_) => Ok(value.clone()),
            other => Err(unexpected(kinds::FILTER, other)),
        }
    }

    fn compile(&self, values: &[TagValue], assembly: &mut Assembly) -> ConfigResult<()> {
        for value in values {
            match value {
                TagValue::Filter(filter) => assembly.add_filter(Arc::clone(filter)),
                other => return Err(unexpected(kinds::FILTER, other)),
            }
        }
        Ok(())
    }
}
