//! Declarative method descriptors.
//!
//! A controller describes each of its methods once: how it is mapped (verb
//! and path), what shape it returns, and which role each parameter plays.
//! The [`RouteTable`](crate::RouteTable) scanner turns these descriptors into
//! route entries; nothing else reads them.
//!
//! ```rust
//! use routelog::{Method, MethodDescriptor, Param};
//!
//! let get = MethodDescriptor::new("getById")
//!     .get("{id}")
//!     .param(Param::of::<i64>("id").path_variable());
//!
//! let search = MethodDescriptor::new("search")
//!     .request(Method::Put, "search")
//!     .param(Param::of::<String>("q").query());
//!
//! assert_eq!(get.signature().to_string(), "getById(i64)");
//! assert_eq!(search.signature().name(), "search");
//! ```

use std::any::type_name;
use std::fmt;

use crate::method::Method;

// ── Signature ─────────────────────────────────────────────────────────────────

/// Identity of a declared method: its name plus the ordered type names of
/// its parameters. Methods sharing a name but not a parameter list are
/// distinct.
#[derive(Clone, Debug, Eq, Hash, PartialEq)]
pub struct Signature {
    name: String,
    params: Vec<&'static str>,
}

impl Signature {
    /// A signature with no parameters yet.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), params: Vec::new() }
    }

    /// Appends a parameter of type `T`. Returns `self` for chaining.
    pub fn param<T: ?Sized>(mut self) -> Self {
        self.params.push(type_name::<T>());
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn params(&self) -> &[&'static str] { &self.params }
}

/// Renders as `name(Type, Type)` with module paths stripped.
impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, p) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            f.write_str(short_type_name(p))?;
        }
        f.write_str(")")
    }
}

fn short_type_name(full: &str) -> &str {
    // Generic types keep their full path; stripping inside `<..>` is not worth it.
    if full.contains('<') {
        return full;
    }
    full.rsplit("::").next().unwrap_or(full)
}

// ── Mappings ──────────────────────────────────────────────────────────────────

/// The generic mapping marker: a path plus an explicit list of methods.
/// Only the first method counts; an empty list maps nothing.
#[derive(Clone, Debug)]
pub struct RequestMapping {
    pub methods: Vec<Method>,
    pub path: String,
}

/// What a method hands back when called.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ReturnShape {
    /// An asynchronous single value. The only shape eligible for routing.
    #[default]
    Async,
    /// A plain value or nothing.
    Value,
}

// ── Parameters ────────────────────────────────────────────────────────────────

/// A role marker on a parameter. A parameter may carry several; the scanner
/// resolves them first-match-wins in the order body, path variable, query.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Marker {
    Body,
    /// Path variable, optionally under a name other than the parameter's.
    PathVariable(Option<String>),
    /// Query parameter, optionally under a name other than the parameter's.
    QueryParam(Option<String>),
}

/// One declared parameter.
#[derive(Clone, Debug)]
pub struct Param {
    name: String,
    type_name: &'static str,
    markers: Vec<Marker>,
}

impl Param {
    /// A parameter named `name` of type `T`, with no role yet.
    pub fn of<T: ?Sized>(name: impl Into<String>) -> Self {
        Self { name: name.into(), type_name: type_name::<T>(), markers: Vec::new() }
    }

    pub fn body(self) -> Self {
        self.marker(Marker::Body)
    }

    pub fn path_variable(self) -> Self {
        self.marker(Marker::PathVariable(None))
    }

    pub fn path_variable_named(self, name: impl Into<String>) -> Self {
        self.marker(Marker::PathVariable(Some(name.into())))
    }

    pub fn query(self) -> Self {
        self.marker(Marker::QueryParam(None))
    }

    pub fn query_named(self, name: impl Into<String>) -> Self {
        self.marker(Marker::QueryParam(Some(name.into())))
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.markers.push(marker);
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn type_name(&self) -> &'static str { self.type_name }
    pub fn markers(&self) -> &[Marker] { &self.markers }

    pub(crate) fn has(&self, f: impl Fn(&Marker) -> bool) -> bool {
        self.markers.iter().any(f)
    }
}

// ── MethodDescriptor ──────────────────────────────────────────────────────────

/// Everything a controller declares about one of its methods.
///
/// A method with no mapping at all is still worth declaring: calls to it
/// pass through the interceptor untouched.
#[derive(Clone, Debug)]
pub struct MethodDescriptor {
    name: String,
    get: Option<String>,
    post: Option<String>,
    request: Option<RequestMapping>,
    returns: ReturnShape,
    params: Vec<Param>,
}

impl MethodDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            get: None,
            post: None,
            request: None,
            returns: ReturnShape::Async,
            params: Vec::new(),
        }
    }

    /// GET mapping.
    pub fn get(mut self, path: impl Into<String>) -> Self {
        self.get = Some(path.into());
        self
    }

    /// POST mapping.
    pub fn post(mut self, path: impl Into<String>) -> Self {
        self.post = Some(path.into());
        self
    }

    /// Generic mapping with one explicit method.
    pub fn request(self, method: Method, path: impl Into<String>) -> Self {
        self.request_mapping(RequestMapping { methods: vec![method], path: path.into() })
    }

    pub fn request_mapping(mut self, mapping: RequestMapping) -> Self {
        self.request = Some(mapping);
        self
    }

    pub fn returns(mut self, shape: ReturnShape) -> Self {
        self.returns = shape;
        self
    }

    pub fn param(mut self, param: Param) -> Self {
        self.params.push(param);
        self
    }

    pub fn name(&self) -> &str { &self.name }
    pub fn params(&self) -> &[Param] { &self.params }
    pub fn return_shape(&self) -> ReturnShape { self.returns }

    /// The identity this method is keyed by.
    pub fn signature(&self) -> Signature {
        Signature {
            name: self.name.clone(),
            params: self.params.iter().map(Param::type_name).collect(),
        }
    }

    /// Verb and raw (unprefixed) path, checked GET, then POST, then the
    /// generic mapping. `None` when the method is not mapped.
    pub fn mapping(&self) -> Option<(Method, &str)> {
        if let Some(path) = &self.get {
            return Some((Method::Get, path.as_str()));
        }
        if let Some(path) = &self.post {
            return Some((Method::Post, path.as_str()));
        }
        let rm = self.request.as_ref()?;
        let method = *rm.methods.first()?;
        Some((method, rm.path.as_str()))
    }
}
