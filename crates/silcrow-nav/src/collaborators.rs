// File: silcrow-nav/src/collaborators.rs
// Purpose: Narrow interfaces to the document, browser history and binding engine

use std::sync::Arc;

use crate::markup::Fragment;
use crate::scope::Model;

/// Called on every activated link with its href; returns true when the
/// default browser navigation must be prevented
pub type LinkHandler = Arc<dyn Fn(&str) -> bool + Send + Sync>;

/// Called when the user moves through history (back/forward)
pub type PopStateHandler = Arc<dyn Fn() + Send + Sync>;

/// The host document: template source, mount region and title
pub trait Document: Send + Sync {
    /// Whether the app's mount region exists
    fn has_container(&self) -> bool;

    /// The raw template content holding every page's markup
    fn template(&self) -> Fragment;

    /// Replaces the mount region's content
    fn mount(&self, content: &Fragment);

    fn hide(&self);

    fn show(&self);

    fn set_title(&self, title: &str);

    /// Routes link activations inside the mount region to `handler`
    fn listen_link_clicks(&self, handler: LinkHandler);
}

/// Browser history integration
pub trait History: Send + Sync {
    fn replace_state(&self, title: &str, path: &str);

    fn push_state(&self, title: &str, path: &str);

    fn on_pop_state(&self, handler: PopStateHandler);

    fn current_path(&self) -> String;

    /// Full browser navigation, leaving the app
    fn redirect_to(&self, url: &str);
}

/// The data-binding engine that turns models into a live UI
pub trait BindEngine: Send + Sync {
    /// Attaches reactivity for `models` to the mounted `root`
    fn bind_models(&self, root: &Fragment, models: &[Model], once: bool);

    /// Drops every watcher of the previous page, before remounting
    fn reset_watchers(&self);

    /// Marks the end of a transition, after binding
    fn checkpoint(&self);
}
