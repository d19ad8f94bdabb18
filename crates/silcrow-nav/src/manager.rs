//! Page manager: owns the route table and display scopes and drives page
//! transitions
//!
//! A transition walks `Idle -> Resolving -> Committing -> RunningControllers
//! -> Bound -> Idle`. Transitions never overlap: each one holds an async
//! mutex from resolution until the new scope is published, so a controller
//! must spawn a navigation rather than await it.

use silcrow_router::{generate_url, join_path, normalize_path, strip_base, RouteParam, RouteTable};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};
use tokio::runtime::Handle;

use crate::collaborators::{BindEngine, Document, History};
use crate::config::NavConfig;
use crate::content;
use crate::controller::{Controller, ControllerRunner};
use crate::custom_tags::CustomTagRegistry;
use crate::display::{Page, PageGroup, ScopeRegistry};
use crate::error::{NavError, NavResult};
use crate::lock;
use crate::markup::{Element, Fragment};
use crate::scope::Scope;

/// Where the manager is in a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionState {
    Idle,
    Resolving,
    Committing,
    RunningControllers,
    Bound,
}

/// What a finished navigation request did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransitionOutcome {
    /// A new page was mounted and its controllers ran
    Mounted { page_id: String },
    /// The target resolved to the page already shown; nothing was remounted
    Unchanged { page_id: String },
    /// The URL is outside the app and was handed to the browser
    External { url: String },
}

/// Whether a link click is handled in-app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkDisposition {
    Intercept,
    Passthrough,
}

// ============================================================================
// Builder
// ============================================================================

/// Collects pages, groups, controllers and custom tags before the app starts
pub struct PageManagerBuilder {
    config: NavConfig,
    history: Arc<dyn History>,
    document: Arc<dyn Document>,
    binding: Arc<dyn BindEngine>,
    scopes: ScopeRegistry,
    custom_tags: CustomTagRegistry,
}

impl PageManagerBuilder {
    /// Fails when the document has no mount region
    pub fn new(
        config: NavConfig,
        history: Arc<dyn History>,
        document: Arc<dyn Document>,
        binding: Arc<dyn BindEngine>,
    ) -> NavResult<Self> {
        if !document.has_container() {
            return Err(NavError::MissingContainer);
        }

        Ok(Self {
            config,
            history,
            document,
            binding,
            scopes: ScopeRegistry::new(),
            custom_tags: CustomTagRegistry::new(),
        })
    }

    pub fn register_display_scopes<P, G>(&mut self, pages: P, groups: G) -> NavResult<()>
    where
        P: IntoIterator<Item = Page>,
        G: IntoIterator<Item = PageGroup>,
    {
        self.scopes.register_display_scopes(pages, groups)
    }

    /// Attaches `controller` to a page, a page group or the global scope
    pub fn register_controller(&mut self, scope_id: &str, controller: Controller) -> NavResult<()> {
        self.scopes.register_controller(scope_id, controller)
    }

    pub fn register_custom_tag<F>(&mut self, tag_id: &str, factory: F)
    where
        F: Fn(&Element) -> anyhow::Result<serde_json::Value> + Send + Sync + 'static,
    {
        self.custom_tags.register(tag_id, factory);
    }

    /// Freezes the configuration, wires history and link handling, and shows
    /// the page for the current browser path
    pub async fn prepare(self) -> NavResult<Arc<PageManager>> {
        let Self {
            config,
            history,
            document,
            binding,
            scopes,
            mut custom_tags,
        } = self;

        let mut routes = RouteTable::new().with_case_insensitive(config.routing.case_insensitive);
        for page in scopes.pages() {
            routes.add_route(page.path(), page.id().to_string())?;
        }
        routes.build()?;
        tracing::info!(routes = routes.len(), "route table built");

        for page_id in [&config.pages.start_page, &config.pages.not_found_page]
            .into_iter()
            .flatten()
        {
            scopes.page(page_id)?;
        }

        let mut template = document.template();
        let sections = content::prepare_sections(&mut template)?;
        content::check_belong_scopes(&template, &scopes)?;
        custom_tags.prepare(&mut template)?;
        tracing::debug!(sections, "template prepared");

        let base_path = normalize_path(&config.routing.base_path).into_owned();
        let manager = Arc::new(PageManager {
            base_path,
            start_page: config.pages.start_page,
            not_found_page: config.pages.not_found_page,
            history,
            document,
            binding,
            scopes,
            routes,
            template,
            custom_tags,
            runtime: Handle::current(),
            transition: tokio::sync::Mutex::new(()),
            state: Mutex::new(TransitionState::Idle),
            current: RwLock::new(None),
            mounted: Mutex::new(None),
        });

        manager.wire_handlers();

        let initial = manager.history.current_path();
        manager.update_page(&initial, false).await?;

        Ok(manager)
    }
}

// ============================================================================
// Manager
// ============================================================================

pub struct PageManager {
    base_path: String,
    start_page: Option<String>,
    not_found_page: Option<String>,

    history: Arc<dyn History>,
    document: Arc<dyn Document>,
    binding: Arc<dyn BindEngine>,

    scopes: ScopeRegistry,
    routes: RouteTable<String>,
    template: Fragment,
    custom_tags: CustomTagRegistry,

    runtime: Handle,
    transition: tokio::sync::Mutex<()>,
    state: Mutex<TransitionState>,
    current: RwLock<Option<Arc<Scope>>>,
    /// Page whose content is mounted and bound; cleared while a commit is
    /// in flight so an aborted transition never counts as shown
    mounted: Mutex<Option<String>>,
}

/// A route hit with owned data, so no borrow of the table outlives lookup
struct Resolved {
    page_id: String,
    path: String,
    params: Vec<RouteParam>,
}

impl PageManager {
    fn wire_handlers(self: &Arc<Self>) {
        let weak: Weak<Self> = Arc::downgrade(self);
        self.history.on_pop_state(Arc::new(move || {
            if let Some(manager) = weak.upgrade() {
                let path = manager.history.current_path();
                manager.spawn_transition(path, false);
            }
        }));

        let weak: Weak<Self> = Arc::downgrade(self);
        self.document.listen_link_clicks(Arc::new(move |href: &str| {
            weak.upgrade()
                .map(|manager| manager.handle_link_click(href) == LinkDisposition::Intercept)
                .unwrap_or(false)
        }));
    }

    fn spawn_transition(self: &Arc<Self>, url: String, push_state: bool) {
        let manager = Arc::clone(self);
        self.runtime.spawn(async move {
            if let Err(e) = manager.update_page(&url, push_state).await {
                tracing::error!(url = %url, error = %e, "background transition failed");
            }
        });
    }

    /// Decides whether a clicked link is handled in-app; in-app links start
    /// a transition with a history push
    pub fn handle_link_click(self: &Arc<Self>, href: &str) -> LinkDisposition {
        if !self.is_app_url(href) {
            tracing::trace!(href = %href, "link left to the browser");
            return LinkDisposition::Passthrough;
        }

        self.spawn_transition(href.to_string(), true);
        LinkDisposition::Intercept
    }

    /// Navigates to `url`, mounting its page unless it is already shown
    pub async fn update_page(&self, url: &str, push_state: bool) -> NavResult<TransitionOutcome> {
        let _serial = self.transition.lock().await;

        let result = self.transition(url, push_state).await;
        self.set_state(TransitionState::Idle);

        match &result {
            Ok(outcome) => tracing::debug!(url = %url, ?outcome, "transition finished"),
            Err(e) => tracing::warn!(url = %url, error = %e, "transition aborted"),
        }
        result
    }

    async fn transition(&self, url: &str, push_state: bool) -> NavResult<TransitionOutcome> {
        self.set_state(TransitionState::Resolving);
        let (target, push_state) = self.resolve(url, push_state)?;
        let page = self.scopes.page(&target.page_id)?;

        let params = target
            .params
            .iter()
            .map(|p| (p.name.clone(), p.value.clone()))
            .collect();
        let title = content::format_title(page.title(), &params);

        if push_state {
            self.history.push_state(&title, &self.full_path(&target.path));
        }

        if lock(&self.mounted).as_deref() == Some(target.page_id.as_str()) {
            tracing::debug!(page = %target.page_id, "page already shown");
            return Ok(TransitionOutcome::Unchanged {
                page_id: target.page_id,
            });
        }

        self.set_state(TransitionState::Committing);
        *lock(&self.mounted) = None;
        let page_content = content::render_page(&self.template, &self.scopes, &target.page_id)?;
        self.document.hide();
        self.document.mount(&page_content);
        self.binding.reset_watchers();

        self.set_state(TransitionState::RunningControllers);
        let scope = Arc::new(Scope::new(target.page_id.clone(), target.params));
        let chain = self.scopes.controller_chain(&target.page_id)?;
        ControllerRunner::run(chain, Arc::clone(&scope)).await?;

        self.set_state(TransitionState::Bound);
        self.binding.bind_models(&page_content, &scope.models(), false);
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(scope);
        *lock(&self.mounted) = Some(target.page_id.clone());
        self.document.show();
        self.document.set_title(&title);
        self.binding.checkpoint();

        tracing::info!(page = %target.page_id, path = %target.path, "page mounted");
        Ok(TransitionOutcome::Mounted {
            page_id: target.page_id,
        })
    }

    /// Maps a URL to a page; falls back to the start page for the app root
    /// and to the not-found page on a miss
    fn resolve(&self, url: &str, push_state: bool) -> NavResult<(Resolved, bool)> {
        let mut path = self.relative_path(url);

        if path == "/" {
            if let Some(start_id) = &self.start_page {
                let start = self.scopes.page(start_id)?;
                path = start.path().to_string();
                self.history
                    .replace_state(start.title(), &self.full_path(&path));
            }
        }

        if let Some(found) = self.lookup(&path)? {
            return Ok((found, push_state));
        }

        let Some(not_found_id) = &self.not_found_page else {
            return Err(NavError::PageNotFound { path });
        };
        let not_found = self.scopes.page(not_found_id)?;
        tracing::debug!(path = %path, fallback = %not_found.path(), "page not found");

        match self.lookup(not_found.path())? {
            Some(found) => Ok((found, false)),
            None => Err(NavError::NotFoundUnresolvable {
                path: not_found.path().to_string(),
            }),
        }
    }

    fn lookup(&self, path: &str) -> NavResult<Option<Resolved>> {
        Ok(self.routes.lookup(path)?.map(|hit| Resolved {
            page_id: hit.payload.clone(),
            path: path.to_string(),
            params: hit.params,
        }))
    }

    /// Navigates to a page given its id and positional parameters
    pub async fn redirect_to_page<S: AsRef<str>>(
        &self,
        page_id: &str,
        params: &[Option<S>],
    ) -> NavResult<TransitionOutcome> {
        let url = self.page_url(page_id, params)?;
        self.update_page(&url, true).await
    }

    /// Navigates in-app when `url` is under the base path, otherwise leaves
    /// the app through the browser
    pub async fn redirect_to_url(&self, url: &str) -> NavResult<TransitionOutcome> {
        if self.is_app_url(url) {
            self.update_page(url, true).await
        } else {
            tracing::debug!(url = %url, "leaving the app");
            self.history.redirect_to(url);
            Ok(TransitionOutcome::External {
                url: url.to_string(),
            })
        }
    }

    /// Full URL of a page for the given positional parameters
    pub fn page_url<S: AsRef<str>>(&self, page_id: &str, params: &[Option<S>]) -> NavResult<String> {
        let page = self.scopes.page(page_id)?;
        let path = generate_url(page.path(), params)?;
        Ok(self.full_path(&path))
    }

    pub fn current_page_id(&self) -> Option<String> {
        self.current_scope().map(|scope| scope.page_id().to_string())
    }

    /// The scope published by the last completed transition
    pub fn current_scope(&self) -> Option<Arc<Scope>> {
        self.current
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> TransitionState {
        *lock(&self.state)
    }

    pub fn base_path(&self) -> &str {
        &self.base_path
    }

    /// Prefixes an app path with the base path
    pub fn full_path(&self, path: &str) -> String {
        join_path(&self.base_path, path)
    }

    pub fn custom_tags(&self) -> &CustomTagRegistry {
        &self.custom_tags
    }

    pub fn scopes(&self) -> &ScopeRegistry {
        &self.scopes
    }

    fn set_state(&self, state: TransitionState) {
        let mut current = lock(&self.state);
        if *current != state {
            tracing::trace!(from = ?*current, to = ?state, "transition state");
            *current = state;
        }
    }

    /// Whether `url` lives under the base path
    fn is_app_url(&self, url: &str) -> bool {
        let path = path_part(url);
        // protocol-relative URLs point at another origin
        if path.starts_with("//") || path.starts_with("/\\") {
            return false;
        }
        if self.base_path == "/" {
            return path.starts_with('/');
        }
        match path.strip_prefix(self.base_path.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }

    /// The app-relative, normalized path of a URL
    fn relative_path(&self, url: &str) -> String {
        let path = path_part(url);
        let relative = if self.is_app_url(path) {
            strip_base(path, &self.base_path)
        } else {
            path
        };
        normalize_path(relative).into_owned()
    }
}

/// Drops the query string and fragment of a URL
fn path_part(url: &str) -> &str {
    url.split(|c| c == '?' || c == '#').next().unwrap_or(url)
}

impl std::fmt::Debug for PageManagerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageManagerBuilder")
            .field("config", &self.config)
            .field("scopes", &self.scopes)
            .field("custom_tags", &self.custom_tags)
            .finish_non_exhaustive()
    }
}

impl std::fmt::Debug for PageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PageManager")
            .field("base_path", &self.base_path)
            .field("routes", &self.routes.len())
            .field("state", &self.state())
            .field("current", &self.current_page_id())
            .finish_non_exhaustive()
    }
}
