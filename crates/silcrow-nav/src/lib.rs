//! # Silcrow Nav
//!
//! The page lifecycle engine of Silcrow. It maps browser URLs to declared
//! pages, decides which parts of the shared template are visible on each
//! page, runs page-entry controllers and hands the resulting models to the
//! binding layer.
//!
//! ## Pieces
//!
//! - [`display`]: pages, page groups and the global scope
//! - [`controller`]: controllers and the concurrent runner with its barrier
//! - [`content`]: turns the template into one page's content
//! - [`manager`]: the transition state machine tying it all together
//!
//! The DOM, the browser history and the data binding engine stay outside and
//! are reached through the traits in [`collaborators`].
//!
//! ## Example
//!
//! ```ignore
//! let mut builder = PageManagerBuilder::new(config, history, document, binding)?;
//! builder.register_display_scopes(
//!     [Page::new("home", "/", "Home"), Page::new("user", "/user/:id", "User {id}")],
//!     Vec::<PageGroup>::new(),
//! )?;
//! builder.register_controller("user", Controller::from_fn(|scope| {
//!     scope.bind("userId", &scope.param("id"))
//! }))?;
//! let manager = builder.prepare().await?;
//! manager.redirect_to_page("user", &[Some("42")]).await?;
//! ```

use std::sync::{Mutex, MutexGuard, PoisonError};

pub mod collaborators;
pub mod config;
pub mod content;
pub mod controller;
pub mod custom_tags;
pub mod display;
mod error;
pub mod manager;
pub mod markup;
pub mod scope;

pub use collaborators::{BindEngine, Document, History, LinkHandler, PopStateHandler};
pub use config::{NavConfig, PagesConfig, RoutingConfig};
pub use controller::{Controller, ControllerRunner, Countdown, ScopedController};
pub use custom_tags::{CustomTagRegistry, TagModel};
pub use display::{DisplayScope, Page, PageGroup, ScopeRegistry, GLOBAL_SCOPE_ID};
pub use error::{NavError, NavResult};
pub use manager::{LinkDisposition, PageManager, PageManagerBuilder, TransitionOutcome, TransitionState};
pub use markup::{Element, Fragment, Node};
pub use scope::{Model, Scope};

pub use silcrow_router::{RouteError, RouteParam};

/// Locks a std mutex, recovering the data if a holder panicked
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
