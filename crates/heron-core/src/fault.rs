//! Handler faults.
//!
//! A [`Fault`] is anything that goes wrong while serving a matched request:
//! a handler returning `Err`, a panic inside a handler future, or a pipe
//! failing. Faults are cheap to clone so they can travel inside the flowing
//! request to the server-error pipeline.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

/// A handler future panicked.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("handler panicked: {message}")]
pub struct PanicFault {
    /// The panic payload, when it was a string
    pub message: String,
}

/// The dispatcher reached a state that configuration should have ruled out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invariant violated: {message}")]
pub struct InvariantViolation {
    /// What went wrong
    pub message: String,
}

/// A cloneable handler fault wrapping an arbitrary error.
///
/// # Example
///
/// ```
/// use heron_core::Fault;
///
/// #[derive(Debug, thiserror::Error)]
/// #[error("no such user")]
/// struct NoSuchUser;
///
/// let fault = Fault::new(NoSuchUser);
/// assert!(fault.is::<NoSuchUser>());
/// assert_eq!(fault.to_string(), "no such user");
/// ```
#[derive(Clone)]
pub struct Fault {
    inner: Arc<anyhow::Error>,
}

impl Fault {
    /// Wraps an error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(anyhow::Error::new(error)),
        }
    }

    /// Creates a fault from a message.
    pub fn msg<M>(message: M) -> Self
    where
        M: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(anyhow::Error::msg(message)),
        }
    }

    /// Creates a fault from a caught panic payload.
    pub fn panic(payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self::new(PanicFault { message })
    }

    /// Creates an invariant violation fault.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::new(InvariantViolation {
            message: message.into(),
        })
    }

    /// Returns true if the underlying error is an `E`.
    #[must_use]
    pub fn is<E>(&self) -> bool
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.is::<E>()
    }

    /// Returns the underlying error as an `E`, if it is one.
    #[must_use]
    pub fn downcast_ref<E>(&self) -> Option<&E>
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        self.inner.downcast_ref::<E>()
    }

    /// Returns true if this fault came from a panic.
    #[must_use]
    pub fn is_panic(&self) -> bool {
        self.is::<PanicFault>()
    }

    /// Returns the underlying error.
    #[must_use]
    pub fn as_error(&self) -> &anyhow::Error {
        &self.inner
    }
}

impl From<anyhow::Error> for Fault {
    fn from(error: anyhow::Error) -> Self {
        Self {
            inner: Arc::new(error),
        }
    }
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.inner, f)
    }
}

impl fmt::Debug for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&*self.inner, f)
    }
}

/// A fault type a server-error handler declares it handles.
///
/// ```
/// use heron_core::{Fault, FaultType, InvariantViolation};
///
/// let ty = FaultType::of::<InvariantViolation>();
/// assert!(ty.matches(&Fault::invariant("x")));
/// assert!(!ty.matches(&Fault::msg("other")));
/// ```
#[derive(Clone, Copy)]
pub struct FaultType {
    name: &'static str,
    test: fn(&Fault) -> bool,
}

impl FaultType {
    /// The fault type `E`.
    #[must_use]
    pub fn of<E>() -> Self
    where
        E: fmt::Display + fmt::Debug + Send + Sync + 'static,
    {
        Self {
            name: std::any::type_name::<E>(),
            test: |fault| fault.is::<E>(),
        }
    }

    /// The type name, for diagnostics.
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Returns true if `fault` is of this type.
    #[must_use]
    pub fn matches(&self, fault: &Fault) -> bool {
        (self.test)(fault)
    }
}

impl fmt::Debug for FaultType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("FaultType").field(&self.name).finish()
    }
}

impl PartialEq for FaultType {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
    }
}
