//! Handler argument binding.
//!
//! A [`ParamBinding`] is computed once when a handler is registered. It lists,
//! in handler parameter order, where each argument comes from and how the raw
//! string is converted. At request time [`ParamBinding::resolve`] produces
//! [`Args`]; a conversion failure makes the route overflow.

use std::fmt;

use heron_router::{Captures, QueryParams};
use http::HeaderMap;

use crate::error::ConversionError;

/// A converted argument value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// A string
    Str(String),
    /// A boolean
    Bool(bool),
    /// A signed integer
    Int(i64),
    /// An unsigned integer
    UInt(u64),
    /// A float
    Float(f64),
}

/// A string-to-value converter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Converter {
    /// Keep the string
    Str,
    /// `true` or `false`, case-insensitive
    Bool,
    /// `i8`
    I8,
    /// `i16`
    I16,
    /// `i32`
    I32,
    /// `i64`
    I64,
    /// `u8`
    U8,
    /// `u16`
    U16,
    /// `u32`
    U32,
    /// `u64`
    U64,
    /// `f32`
    F32,
    /// `f64`
    F64,
}

impl Converter {
    /// The target type name.
    #[must_use]
    pub fn type_name(self) -> &'static str {
        match self {
            Self::Str => "string",
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::U8 => "u8",
            Self::U16 => "u16",
            Self::U32 => "u32",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Converts a raw string. `Err` holds the reason.
    pub fn convert(self, raw: &str) -> Result<ArgValue, String> {
        fn int<T>(raw: &str) -> Result<ArgValue, String>
        where
            T: std::str::FromStr + Into<i64>,
            T::Err: fmt::Display,
        {
            raw.parse::<T>()
                .map(|v| ArgValue::Int(v.into()))
                .map_err(|e| e.to_string())
        }
        fn uint<T>(raw: &str) -> Result<ArgValue, String>
        where
            T: std::str::FromStr + Into<u64>,
            T::Err: fmt::Display,
        {
            raw.parse::<T>()
                .map(|v| ArgValue::UInt(v.into()))
                .map_err(|e| e.to_string())
        }

        match self {
            Self::Str => Ok(ArgValue::Str(raw.to_string())),
            Self::Bool => {
                if raw.eq_ignore_ascii_case("true") {
                    Ok(ArgValue::Bool(true))
                } else if raw.eq_ignore_ascii_case("false") {
                    Ok(ArgValue::Bool(false))
                } else {
                    Err("expected 'true' or 'false'".to_string())
                }
            }
            Self::I8 => int::<i8>(raw),
            Self::I16 => int::<i16>(raw),
            Self::I32 => int::<i32>(raw),
            Self::I64 => int::<i64>(raw),
            Self::U8 => uint::<u8>(raw),
            Self::U16 => uint::<u16>(raw),
            Self::U32 => uint::<u32>(raw),
            Self::U64 => uint::<u64>(raw),
            Self::F32 => raw
                .parse::<f32>()
                .map(|v| ArgValue::Float(f64::from(v)))
                .map_err(|e| e.to_string()),
            Self::F64 => raw
                .parse::<f64>()
                .map(ArgValue::Float)
                .map_err(|e| e.to_string()),
        }
    }
}

/// Where an argument's raw string comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArgSource {
    /// The captured path value at this index
    Capture(usize),
    /// The first value of a query parameter
    Query(String),
    /// The first value of a header
    Header(String),
}

impl fmt::Display for ArgSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture(index) => write!(f, "capture {index}"),
            Self::Query(name) => write!(f, "query '{name}'"),
            Self::Header(name) => write!(f, "header '{name}'"),
        }
    }
}

/// One bound parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParamSpec {
    /// Where the value comes from
    pub source: ArgSource,
    /// How it is converted
    pub converter: Converter,
}

/// The ordered parameter binding of a handler.
///
/// The default binding passes every capture through as a string.
///
/// # Example
///
/// ```
/// use heron_core::{Converter, ParamBinding};
/// use heron_router::{Captures, QueryParams};
/// use http::HeaderMap;
///
/// let binding = ParamBinding::new()
///     .capture(Converter::I64)
///     .query("verbose", Converter::Bool);
///
/// let captures: Captures = ["42"].into_iter().collect();
/// let query = QueryParams::parse("verbose=true");
/// let args = binding.resolve(&captures, &query, &HeaderMap::new()).unwrap();
///
/// assert_eq!(args.get::<i64>(0), Some(42));
/// assert_eq!(args.get::<bool>(1), Some(true));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParamBinding {
    params: Vec<ParamSpec>,
    explicit: bool,
    next_capture: usize,
}

impl ParamBinding {
    /// An explicit, initially empty binding.
    #[must_use]
    pub fn new() -> Self {
        Self {
            explicit: true,
            ..Self::default()
        }
    }

    /// The implicit binding: every capture as a string.
    #[must_use]
    pub fn captures_as_strings() -> Self {
        Self::default()
    }

    /// Binds the next capture.
    #[must_use]
    pub fn capture(mut self, converter: Converter) -> Self {
        let index = self.next_capture;
        self.next_capture += 1;
        self.push(ArgSource::Capture(index), converter)
    }

    /// Binds the capture at `index`.
    #[must_use]
    pub fn capture_at(self, index: usize, converter: Converter) -> Self {
        self.push(ArgSource::Capture(index), converter)
    }

    /// Binds the first value of query parameter `name`.
    #[must_use]
    pub fn query(self, name: impl Into<String>, converter: Converter) -> Self {
        self.push(ArgSource::Query(name.into()), converter)
    }

    /// Binds the first value of header `name`.
    #[must_use]
    pub fn header(self, name: impl Into<String>, converter: Converter) -> Self {
        self.push(ArgSource::Header(name.into().to_ascii_lowercase()), converter)
    }

    fn push(mut self, source: ArgSource, converter: Converter) -> Self {
        self.explicit = true;
        self.params.push(ParamSpec { source, converter });
        self
    }

    /// Returns true if this is the implicit all-captures binding.
    #[must_use]
    pub fn is_implicit(&self) -> bool {
        !self.explicit
    }

    /// The explicit parameters.
    #[must_use]
    pub fn params(&self) -> &[ParamSpec] {
        &self.params
    }

    /// Checks the binding against a route's capture count.
    ///
    /// `Err` holds the reason.
    pub fn validate(&self, capture_count: usize) -> Result<(), String> {
        for spec in &self.params {
            if let ArgSource::Capture(index) = spec.source {
                if index >= capture_count {
                    return Err(format!(
                        "binds capture {index} but the route captures {capture_count} value(s)"
                    ));
                }
            }
        }
        Ok(())
    }

    /// Resolves arguments for one request.
    pub fn resolve(
        &self,
        captures: &Captures,
        query: &QueryParams,
        headers: &HeaderMap,
    ) -> Result<Args, ConversionError> {
        if !self.explicit {
            return Ok(Args {
                values: captures.iter().map(|c| ArgValue::Str(c.to_string())).collect(),
            });
        }

        let mut values = Vec::with_capacity(self.params.len());
        for spec in &self.params {
            let raw = match &spec.source {
                ArgSource::Capture(index) => captures.get(*index),
                ArgSource::Query(name) => query.first(name),
                ArgSource::Header(name) => headers.get(name.as_str()).and_then(|v| v.to_str().ok()),
            };
            let Some(raw) = raw else {
                return Err(ConversionError {
                    source_desc: spec.source.to_string(),
                    value: String::new(),
                    target: spec.converter.type_name(),
                    reason: "value missing".to_string(),
                });
            };
            let value = spec.converter.convert(raw).map_err(|reason| ConversionError {
                source_desc: spec.source.to_string(),
                value: raw.to_string(),
                target: spec.converter.type_name(),
                reason,
            })?;
            values.push(value);
        }
        Ok(Args { values })
    }
}

/// Resolved handler arguments, in parameter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    values: Vec<ArgValue>,
}

impl Args {
    /// No arguments.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of arguments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if there are no arguments.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The raw value at `index`.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&ArgValue> {
        self.values.get(index)
    }

    /// The string at `index`, if that argument is a string.
    #[must_use]
    pub fn str(&self, index: usize) -> Option<&str> {
        match self.values.get(index)? {
            ArgValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// The argument at `index` as a `T`.
    #[must_use]
    pub fn get<T: FromArg>(&self, index: usize) -> Option<T> {
        T::from_arg(self.values.get(index)?)
    }
}

impl FromIterator<ArgValue> for Args {
    fn from_iter<I: IntoIterator<Item = ArgValue>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Extraction of a typed value from an [`ArgValue`].
pub trait FromArg: Sized {
    /// Returns the value if the argument has a compatible type.
    fn from_arg(value: &ArgValue) -> Option<Self>;
}

impl FromArg for String {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Str(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromArg for bool {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromArg for f64 {
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Float(f) => Some(*f),
            _ => None,
        }
    }
}

impl FromArg for f32 {
    #[allow(clippy::cast_possible_truncation)]
    fn from_arg(value: &ArgValue) -> Option<Self> {
        match value {
            ArgValue::Float(f) => Some(*f as f32),
            _ => None,
        }
    }
}

macro_rules! from_arg_int {
    ($($ty:ty),*) => {
        $(
            impl FromArg for $ty {
                fn from_arg(value: &ArgValue) -> Option<Self> {
                    match value {
                        ArgValue::Int(i) => <$ty>::try_from(*i).ok(),
                        ArgValue::UInt(u) => <$ty>::try_from(*u).ok(),
                        _ => None,
                    }
                }
            }
        )*
    };
}

from_arg_int!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);
