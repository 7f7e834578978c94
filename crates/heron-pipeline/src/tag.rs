//! Declarative tags.
//!
//! A tag is a `(kind, value)` pair attached to a controller or a handler.
//! The [`CapabilityRegistry`](crate::CapabilityRegistry) maps each kind to
//! the capability that interprets and compiles it. Meta tags bundle other
//! tags under a name and are expanded during assembly.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use heron_core::BodyCodec;
use heron_router::{KeyValueConstraint, MimeType, PathPattern};
use http::Method;

use crate::pipe::Filter;

/// Built-in capability kinds.
pub mod kinds {
    /// Accepted methods.
    pub const METHOD: &str = "method";
    /// Alternative path patterns.
    pub const PATH: &str = "path";
    /// Required query values.
    pub const QUERY: &str = "query";
    /// Required header values.
    pub const HEADER: &str = "header";
    /// Producible content types.
    pub const PRODUCES: &str = "produces";
    /// The content type used when negotiation falls back.
    pub const DEFAULT_TYPE: &str = "default_type";
    /// Body codec override.
    pub const CODEC: &str = "codec";
    /// Custom filters.
    pub const FILTER: &str = "filter";
}

/// The value carried by a tag.
///
/// Tag constructors produce the raw forms (`Text`, `Flag`, ...); capabilities
/// interpret them into the parsed forms (`Pattern`, `Mime`, `Constraint`).
#[derive(Clone)]
pub enum TagValue {
    /// Raw text such as a pattern or `key=value` declaration
    Text(String),
    /// A switch
    Flag(bool),
    /// Methods; an empty list admits every method
    Methods(Vec<Method>),
    /// A compiled path pattern
    Pattern(PathPattern),
    /// A parsed media type
    Mime(MimeType),
    /// A parsed key/value constraint
    Constraint(KeyValueConstraint),
    /// A body codec
    Codec(Arc<dyn BodyCodec>),
    /// A filter pipe
    Filter(Arc<dyn Filter>),
    /// Anything else, for user capabilities
    Custom(Arc<dyn Any + Send + Sync>),
}

impl TagValue {
    /// Returns the text, if this is a `Text` value.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Downcasts a `Custom` value.
    #[must_use]
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Self::Custom(value) => value.downcast_ref(),
            _ => None,
        }
    }

    /// A short description of the variant, for error messages.
    #[must_use]
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Text(_) => "text",
            Self::Flag(_) => "flag",
            Self::Methods(_) => "methods",
            Self::Pattern(_) => "path pattern",
            Self::Mime(_) => "media type",
            Self::Constraint(_) => "constraint",
            Self::Codec(_) => "codec",
            Self::Filter(_) => "filter",
            Self::Custom(_) => "custom value",
        }
    }
}

impl fmt::Debug for TagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.debug_tuple("Text").field(text).finish(),
            Self::Flag(flag) => f.debug_tuple("Flag").field(flag).finish(),
            Self::Methods(methods) => f.debug_tuple("Methods").field(methods).finish(),
            Self::Pattern(pattern) => f.debug_tuple("Pattern").field(&pattern.as_str()).finish(),
            Self::Mime(mime) => f.debug_tuple("Mime").field(&mime.to_string()).finish(),
            Self::Constraint(constraint) => f.debug_tuple("Constraint").field(constraint).finish(),
            Self::Codec(codec) => f.debug_tuple("Codec").field(&codec.name()).finish(),
            Self::Filter(filter) => f.debug_tuple("Filter").field(&filter.name()).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[derive(Debug, Clone)]
enum TagInner {
    Capability {
        kind: Cow<'static, str>,
        value: TagValue,
    },
    Meta {
        name: Cow<'static, str>,
        tags: Arc<[Tag]>,
    },
}

/// A declarative tag.
///
/// # Example
///
/// ```
/// use heron_pipeline::Tag;
/// use http::Method;
///
/// let tags = [
///     Tag::path("/users/{*}"),
///     Tag::method(Method::GET),
///     Tag::produces("application/json"),
/// ];
/// assert_eq!(tags[0].kind(), Some("path"));
/// ```
#[derive(Debug, Clone)]
pub struct Tag {
    inner: TagInner,
}

impl Tag {
    /// A tag of any kind.
    #[must_use]
    pub fn custom(kind: impl Into<Cow<'static, str>>, value: TagValue) -> Self {
        Self {
            inner: TagInner::Capability {
                kind: kind.into(),
                value,
            },
        }
    }

    /// A meta tag standing for `tags`.
    #[must_use]
    pub fn meta(name: impl Into<Cow<'static, str>>, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            inner: TagInner::Meta {
                name: name.into(),
                tags: tags.into_iter().collect(),
            },
        }
    }

    /// An alternative path pattern.
    #[must_use]
    pub fn path(pattern: impl Into<String>) -> Self {
        Self::custom(kinds::PATH, TagValue::Text(pattern.into()))
    }

    /// An accepted method.
    #[must_use]
    pub fn method(method: Method) -> Self {
        Self::methods([method])
    }

    /// Accepted methods.
    #[must_use]
    pub fn methods(methods: impl IntoIterator<Item = Method>) -> Self {
        Self::custom(kinds::METHOD, TagValue::Methods(methods.into_iter().collect()))
    }

    /// A meta tag admitting every method.
    #[must_use]
    pub fn all_methods() -> Self {
        Self::meta("all_methods", [Self::methods(Vec::new())])
    }

    /// A required query value, declared as `key=value`.
    #[must_use]
    pub fn query(declaration: impl Into<String>) -> Self {
        Self::custom(kinds::QUERY, TagValue::Text(declaration.into()))
    }

    /// A required header value, declared as `Name=value`.
    #[must_use]
    pub fn header(declaration: impl Into<String>) -> Self {
        Self::custom(kinds::HEADER, TagValue::Text(declaration.into()))
    }

    /// A producible content type.
    #[must_use]
    pub fn produces(mime: impl Into<String>) -> Self {
        Self::custom(kinds::PRODUCES, TagValue::Text(mime.into()))
    }

    /// Falls back to the default type when nothing in `Accept` matches.
    #[must_use]
    pub fn produces_anything() -> Self {
        Self::custom(kinds::PRODUCES, TagValue::Flag(true))
    }

    /// The fallback content type.
    #[must_use]
    pub fn default_type(mime: impl Into<String>) -> Self {
        Self::custom(kinds::DEFAULT_TYPE, TagValue::Text(mime.into()))
    }

    /// Overrides the body codec.
    #[must_use]
    pub fn codec(codec: Arc<dyn BodyCodec>) -> Self {
        Self::custom(kinds::CODEC, TagValue::Codec(codec))
    }

    /// Adds a filter.
    #[must_use]
    pub fn filter(filter: Arc<dyn Filter>) -> Self {
        Self::custom(kinds::FILTER, TagValue::Filter(filter))
    }

    /// The capability kind, or `None` for a meta tag.
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        match &self.inner {
            TagInner::Capability { kind, .. } => Some(&**kind),
            TagInner::Meta { .. } => None,
        }
    }

    /// The value, or `None` for a meta tag.
    #[must_use]
    pub fn value(&self) -> Option<&TagValue> {
        match &self.inner {
            TagInner::Capability { value, .. } => Some(value),
            TagInner::Meta { .. } => None,
        }
    }

    /// The name and contents of a meta tag.
    #[must_use]
    pub fn as_meta(&self) -> Option<(&str, &[Tag])> {
        match &self.inner {
            TagInner::Meta { name, tags } => Some((&**name, &**tags)),
            TagInner::Capability { .. } => None,
        }
    }
}
