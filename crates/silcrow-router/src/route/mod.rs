//! Route records and matched parameters

pub mod pattern;

pub use pattern::{classify_segment, generate_url, param_names, CompiledPattern, PatternSegment};

/// One named parameter extracted by a successful lookup
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RouteParam {
    pub name: String,
    pub value: String,
}

impl RouteParam {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A compiled pattern bound to an opaque payload
#[derive(Debug, Clone)]
pub struct RouteRecord<T> {
    pub pattern: CompiledPattern,
    pub payload: T,
}
