//! Pattern compilation for page routes
//!
//! A pattern like `/user/:id/files/*rest` compiles into typed segments.
//! The same source string drives both matching and reverse generation, so
//! the two directions cannot drift apart.

use crate::error::RouteError;
use crate::path::segments;
use crate::route::RouteParam;

/// A single compiled segment of a route pattern
///
/// # Examples
///
/// ```
/// use silcrow_router::route::pattern::{classify_segment, PatternSegment};
///
/// assert_eq!(classify_segment("about"), PatternSegment::Static("about".to_string()));
/// assert_eq!(classify_segment(":id"), PatternSegment::Param("id".to_string()));
/// assert_eq!(classify_segment("*rest"), PatternSegment::CatchAll("rest".to_string()));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternSegment {
    /// Literal text, matched exactly
    Static(String),
    /// `:name`, matches one path segment
    Param(String),
    /// `*name`, matches one or more trailing segments
    CatchAll(String),
}

impl PatternSegment {
    /// Specificity rank used for the matching order (lower wins)
    fn rank(&self) -> u8 {
        match self {
            PatternSegment::Static(_) => 0,
            PatternSegment::Param(_) => 1,
            PatternSegment::CatchAll(_) => 2,
        }
    }

    fn param_name(&self) -> Option<&str> {
        match self {
            PatternSegment::Param(name) | PatternSegment::CatchAll(name) => Some(name),
            PatternSegment::Static(_) => None,
        }
    }
}

/// Returns true when a raw pattern segment is a parameter placeholder
pub fn is_placeholder(segment: &str) -> bool {
    segment.starts_with(':') || segment.starts_with('*')
}

/// Classifies one raw segment of a pattern
pub fn classify_segment(segment: &str) -> PatternSegment {
    if let Some(name) = segment.strip_prefix(':') {
        PatternSegment::Param(name.to_string())
    } else if let Some(name) = segment.strip_prefix('*') {
        PatternSegment::CatchAll(name.to_string())
    } else {
        PatternSegment::Static(segment.to_string())
    }
}

/// Names of all placeholders in `pattern`, in declaration order
///
/// # Examples
///
/// ```
/// use silcrow_router::route::pattern::param_names;
///
/// assert_eq!(param_names("/org/:org/repo/:repo"), vec!["org", "repo"]);
/// assert!(param_names("/about").is_empty());
/// ```
pub fn param_names(pattern: &str) -> Vec<String> {
    segments(pattern)
        .into_iter()
        .map(classify_segment)
        .filter_map(|seg| seg.param_name().map(str::to_string))
        .collect()
}

/// A route pattern compiled for matching
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledPattern {
    source: String,
    segments: Vec<PatternSegment>,
    params: Vec<String>,
}

impl CompiledPattern {
    /// Compiles a pattern, rejecting malformed placeholders
    pub fn compile(pattern: &str) -> Result<Self, RouteError> {
        let compiled: Vec<PatternSegment> = segments(pattern)
            .into_iter()
            .map(classify_segment)
            .collect();

        let mut params: Vec<String> = Vec::new();
        for (idx, seg) in compiled.iter().enumerate() {
            let Some(name) = seg.param_name() else {
                continue;
            };
            if name.is_empty() {
                return Err(RouteError::invalid(pattern, "empty parameter name"));
            }
            if matches!(seg, PatternSegment::CatchAll(_)) && idx + 1 != compiled.len() {
                return Err(RouteError::invalid(
                    pattern,
                    format!("catch-all \"*{}\" must be the last segment", name),
                ));
            }
            if params.iter().any(|p| p == name) {
                return Err(RouteError::invalid(
                    pattern,
                    format!("duplicate parameter \"{}\"", name),
                ));
            }
            params.push(name.to_string());
        }

        Ok(Self {
            source: pattern.to_string(),
            segments: compiled,
            params,
        })
    }

    /// The pattern exactly as declared
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Parameter names in declaration order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    pub fn segments(&self) -> &[PatternSegment] {
        &self.segments
    }

    /// Sort key for the deterministic matching order
    ///
    /// Compared lexicographically: at the first segment where two patterns
    /// differ in kind, literal < parameter < catch-all.
    pub(crate) fn specificity(&self) -> Vec<u8> {
        self.segments.iter().map(PatternSegment::rank).collect()
    }

    /// Matches already-split path segments, returning ordered parameters
    pub fn match_segments(
        &self,
        path_segments: &[&str],
        case_insensitive: bool,
    ) -> Option<Vec<RouteParam>> {
        fn walk(
            pattern: &[PatternSegment],
            path: &[&str],
            mut params: Vec<RouteParam>,
            case_insensitive: bool,
        ) -> Option<Vec<RouteParam>> {
            let Some((head, rest)) = pattern.split_first() else {
                return path.is_empty().then_some(params);
            };

            match head {
                PatternSegment::CatchAll(name) => {
                    if path.is_empty() {
                        return None;
                    }
                    params.push(RouteParam::new(name, path.join("/")));
                    Some(params)
                }
                PatternSegment::Param(name) => {
                    let (value, path_rest) = path.split_first()?;
                    params.push(RouteParam::new(name, *value));
                    walk(rest, path_rest, params, case_insensitive)
                }
                PatternSegment::Static(literal) => {
                    let (value, path_rest) = path.split_first()?;
                    let same = if case_insensitive {
                        literal.eq_ignore_ascii_case(value)
                    } else {
                        literal == value
                    };
                    if !same {
                        return None;
                    }
                    walk(rest, path_rest, params, case_insensitive)
                }
            }
        }

        walk(
            &self.segments,
            path_segments,
            Vec::with_capacity(self.params.len()),
            case_insensitive,
        )
    }
}

/// Generates a path from a pattern and positional arguments
///
/// Walks the pattern left to right. Each placeholder consumes the next
/// argument and emits it, or emits nothing when the argument is `None`.
/// Literal text is copied verbatim.
///
/// # Examples
///
/// ```
/// use silcrow_router::generate_url;
///
/// assert_eq!(generate_url("/user/:id", &[Some("42")]).unwrap(), "/user/42");
/// assert!(generate_url("/user/:id", &[] as &[Option<&str>]).is_err());
/// ```
pub fn generate_url<S: AsRef<str>>(pattern: &str, args: &[Option<S>]) -> Result<String, RouteError> {
    let expected = segments(pattern)
        .into_iter()
        .filter(|seg| is_placeholder(seg))
        .count();

    if expected != args.len() {
        return Err(RouteError::ParamCountMismatch {
            pattern: pattern.to_string(),
            expected,
            got: args.len(),
        });
    }

    let mut next_arg = args.iter();
    let url = pattern
        .split('/')
        .map(|piece| {
            if is_placeholder(piece) {
                next_arg
                    .next()
                    .and_then(|arg| arg.as_ref())
                    .map(|value| value.as_ref().to_string())
                    .unwrap_or_default()
            } else {
                piece.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("/");

    Ok(url)
}
