// File: silcrow-nav/src/error.rs
// Purpose: Error taxonomy for configuration, resolution and transitions

use silcrow_router::RouteError;
use thiserror::Error;

pub type NavResult<T> = Result<T, NavError>;

/// Everything that can stop the navigation core
///
/// Configuration and resolution errors mean the app definition is broken.
/// Only [`RouteError::ParamCountMismatch`] (via `NavError::Route`) is meant to
/// be handled by callers, since URL generation may be probed.
#[derive(Debug, Error)]
pub enum NavError {
    // Configuration
    #[error("app container doesn't exist")]
    MissingContainer,

    #[error("a <sc-section> doesn't have a name or has an empty one")]
    EmptySlotName,

    #[error("invalid character {ch:?} in sc-section name \"{name}\"")]
    InvalidSlotName { name: String, ch: char },

    #[error("an sc-replace element has no target")]
    MissingReplaceTarget,

    #[error("display scope \"{0}\" is registered twice")]
    DuplicateScope(String),

    #[error("no such page or page group \"{0}\"")]
    UnknownScope(String),

    #[error("no such page \"{0}\"")]
    UnknownPage(String),

    #[error("\"{0}\" is a page group, not a page")]
    NotAPage(String),

    #[error("custom tag \"{0}\" has no sc-element definition in the template")]
    UnknownCustomTag(String),

    #[error("element #{0} used to declare a custom tag must be an sc-element")]
    NotACustomTagDefinition(String),

    #[error("custom tag \"{tag}\" could not build its model: {source}")]
    CustomTagModel {
        tag: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("element has no valid {attr} attribute")]
    MissingModelId { attr: &'static str },

    // Resolution
    #[error("page not found for \"{path}\" and no not-found page is declared")]
    PageNotFound { path: String },

    #[error("not-found page path \"{path}\" doesn't resolve to any route")]
    NotFoundUnresolvable { path: String },

    // Routing / generation
    #[error(transparent)]
    Route(#[from] RouteError),

    // Controllers
    #[error("controller of \"{scope}\" failed: {source}")]
    Controller {
        scope: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("controller of \"{scope}\" panicked")]
    ControllerPanicked { scope: String },

    #[error("controller barrier was dropped before all controllers finished")]
    BarrierDropped,
}

impl NavError {
    /// True for errors a caller may reasonably recover from
    pub fn is_recoverable(&self) -> bool {
        matches!(self, NavError::Route(RouteError::ParamCountMismatch { .. }))
    }
}
