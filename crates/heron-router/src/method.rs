//! Method membership.

use http::Method;
use smallvec::SmallVec;

/// How a request method was admitted by a [`MethodSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodAdmission {
    /// The method is a member of the set.
    Direct,
    /// A `HEAD` request admitted because the set allows `GET`.
    HeadAsGet,
}

/// The methods a route accepts. An empty set accepts every method.
///
/// # Example
///
/// ```rust
/// use heron_router::{MethodAdmission, MethodSet};
/// use http::Method;
///
/// let set = MethodSet::from_iter([Method::GET, Method::POST]);
/// assert_eq!(set.admits(&Method::POST, true), Some(MethodAdmission::Direct));
/// assert_eq!(set.admits(&Method::HEAD, true), Some(MethodAdmission::HeadAsGet));
/// assert_eq!(set.admits(&Method::HEAD, false), None);
/// assert!(MethodSet::any().admits(&Method::PATCH, true).is_some());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MethodSet {
    methods: SmallVec<[Method; 4]>,
}

impl MethodSet {
    /// A set accepting every method.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Adds a method. Duplicates are ignored.
    pub fn insert(&mut self, method: Method) {
        if !self.methods.contains(&method) {
            self.methods.push(method);
        }
    }

    /// Returns true if the set accepts every method.
    #[must_use]
    pub fn is_any(&self) -> bool {
        self.methods.is_empty()
    }

    /// Returns true if `method` is an explicit member.
    #[must_use]
    pub fn contains(&self, method: &Method) -> bool {
        self.methods.contains(method)
    }

    /// Returns the explicit members.
    pub fn iter(&self) -> impl Iterator<Item = &Method> {
        self.methods.iter()
    }

    /// Checks whether `method` is admitted.
    #[must_use]
    pub fn admits(&self, method: &Method, head_as_get: bool) -> Option<MethodAdmission> {
        if self.is_any() || self.contains(method) {
            return Some(MethodAdmission::Direct);
        }
        if head_as_get && *method == Method::HEAD && self.contains(&Method::GET) {
            return Some(MethodAdmission::HeadAsGet);
        }
        None
    }
}

impl FromIterator<Method> for MethodSet {
    fn from_iter<I: IntoIterator<Item = Method>>(iter: I) -> Self {
        let mut set = Self::default();
        for method in iter {
            set.insert(method);
        }
        set
    }
}

impl Extend<Method> for MethodSet {
    fn extend<I: IntoIterator<Item = Method>>(&mut self, iter: I) {
        for method in iter {
            self.insert(method);
        }
    }
}
