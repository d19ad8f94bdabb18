//! # Silcrow Router
//!
//! The route table behind Silcrow page navigation. It maps a URL path to a
//! declared page plus its ordered parameters, and maps a page pattern plus
//! positional arguments back to a URL.
//!
//! - Static segments (`/about`)
//! - Named parameters (`/user/:id`)
//! - Trailing catch-all (`/docs/*path`)
//!
//! ## Lifecycle
//!
//! Routes are collected first, then the table is built exactly once. After
//! `build()` the table is read-only: `add_route` fails and `lookup` works.
//!
//! ## Matching order
//!
//! Patterns are ordered segment by segment: at the first position where two
//! patterns differ in kind, a literal beats a parameter and a parameter beats
//! a catch-all. Patterns of equal rank keep their registration order.
//!
//! ## Example
//!
//! ```
//! use silcrow_router::{generate_url, RouteTable};
//!
//! let mut table = RouteTable::new();
//! table.add_route("/", "home").unwrap();
//! table.add_route("/user/:id", "user").unwrap();
//! table.build().unwrap();
//!
//! let found = table.lookup("/user/42").unwrap().unwrap();
//! assert_eq!(*found.payload, "user");
//! assert_eq!(found.params[0].value, "42");
//!
//! assert_eq!(generate_url("/user/:id", &[Some("42")]).unwrap(), "/user/42");
//! ```

use std::collections::HashMap;

mod error;
pub mod path;
pub mod route;

pub use error::RouteError;
pub use path::{is_valid_path, join_path, normalize_path, strip_base};
pub use route::pattern::{generate_url, param_names};
pub use route::{CompiledPattern, PatternSegment, RouteParam, RouteRecord};

// ============================================================================
// Lookup result
// ============================================================================

/// Result of a successful lookup
#[derive(Debug, Clone, PartialEq)]
pub struct RouteMatch<'a, T> {
    /// Payload registered with the matching pattern
    pub payload: &'a T,
    /// The pattern that matched, as declared
    pub pattern: &'a str,
    /// Extracted parameters in declaration order
    pub params: Vec<RouteParam>,
}

impl<T> RouteMatch<'_, T> {
    /// Gets a parameter value by name
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|p| p.name == name)
            .map(|p| p.value.as_str())
    }

    /// The parameters as a name -> value map
    pub fn param_map(&self) -> HashMap<String, String> {
        self.params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect()
    }
}

// ============================================================================
// Route table
// ============================================================================

/// Collects route records, compiles them once, then answers lookups
#[derive(Debug, Clone)]
pub struct RouteTable<T> {
    records: Vec<RouteRecord<T>>,
    built: bool,
    case_insensitive: bool,
}

impl<T> RouteTable<T> {
    /// Creates an empty, case-sensitive table
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            built: false,
            case_insensitive: false,
        }
    }

    /// Configures case-insensitive literal matching (builder)
    ///
    /// # Examples
    ///
    /// ```
    /// use silcrow_router::RouteTable;
    ///
    /// let mut table = RouteTable::new().with_case_insensitive(true);
    /// table.add_route("/About", ()).unwrap();
    /// table.build().unwrap();
    /// assert!(table.lookup("/about").unwrap().is_some());
    /// ```
    pub fn with_case_insensitive(mut self, case_insensitive: bool) -> Self {
        self.case_insensitive = case_insensitive;
        self
    }

    /// Registers a pattern with its payload
    ///
    /// Valid only before [`RouteTable::build`].
    pub fn add_route(&mut self, pattern: &str, payload: T) -> Result<(), RouteError> {
        if self.built {
            return Err(RouteError::AlreadyBuilt);
        }

        let pattern = CompiledPattern::compile(pattern)?;
        tracing::trace!(pattern = pattern.source(), "route.add");
        self.records.push(RouteRecord { pattern, payload });
        Ok(())
    }

    /// Compiles the registered records into their final matching order
    pub fn build(&mut self) -> Result<(), RouteError> {
        if self.built {
            return Err(RouteError::AlreadyBuilt);
        }

        // stable: equal specificity keeps registration order
        self.records.sort_by_cached_key(|r| r.pattern.specificity());
        self.built = true;

        tracing::debug!(routes = self.records.len(), "route table built");
        Ok(())
    }

    pub fn is_built(&self) -> bool {
        self.built
    }

    /// Resolves a path to the first matching record
    ///
    /// Returns `Ok(None)` when nothing matches and `Err(NotBuilt)` before
    /// the table is built.
    pub fn lookup(&self, path: &str) -> Result<Option<RouteMatch<'_, T>>, RouteError> {
        if !self.built {
            return Err(RouteError::NotBuilt);
        }

        let normalized = normalize_path(path);
        let path_segments = path::segments(&normalized);

        Ok(self.records.iter().find_map(|record| {
            record
                .pattern
                .match_segments(&path_segments, self.case_insensitive)
                .map(|params| RouteMatch {
                    payload: &record.payload,
                    pattern: record.pattern.source(),
                    params,
                })
        }))
    }

    /// Records in matching order (registration order before `build()`)
    pub fn records(&self) -> &[RouteRecord<T>] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl<T> Default for RouteTable<T> {
    fn default() -> Self {
        Self::new()
    }
}
