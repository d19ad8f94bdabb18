// File: silcrow-nav/src/display.rs
// Purpose: Display scopes (pages, page groups, global) and their registry

use std::collections::HashMap;

use crate::controller::{Controller, ScopedController};
use crate::error::{NavError, NavResult};

/// Id of the implicit scope every page belongs to
pub const GLOBAL_SCOPE_ID: &str = "__global__";

/// A routable page
#[derive(Debug, Clone)]
pub struct Page {
    id: String,
    path: String,
    title: String,
    groups: Vec<String>,
    controllers: Vec<Controller>,
}

impl Page {
    /// Declares a page with its route pattern and title template
    ///
    /// The title may reference route parameters as `{name}`.
    pub fn new(id: impl Into<String>, path: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            path: path.into(),
            title: title.into(),
            groups: Vec::new(),
            controllers: Vec::new(),
        }
    }

    /// Attaches a controller at declaration time (builder)
    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    /// Ids of the groups this page belongs to, in group registration order
    pub fn groups(&self) -> &[String] {
        &self.groups
    }
}

/// A named set of pages sharing controllers and visible content
#[derive(Debug, Clone)]
pub struct PageGroup {
    id: String,
    pages: Vec<String>,
    controllers: Vec<Controller>,
}

impl PageGroup {
    pub fn new<I, S>(id: impl Into<String>, pages: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            pages: pages.into_iter().map(Into::into).collect(),
            controllers: Vec::new(),
        }
    }

    pub fn with_controller(mut self, controller: Controller) -> Self {
        self.controllers.push(controller);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn pages(&self) -> &[String] {
        &self.pages
    }
}

/// Controllers that run on every page
#[derive(Debug, Clone, Default)]
pub struct GlobalScope {
    controllers: Vec<Controller>,
}

/// A region of applicability: one page, a group of pages, or everything
#[derive(Debug, Clone)]
pub enum DisplayScope {
    Page(Page),
    Group(PageGroup),
    Global(GlobalScope),
}

impl DisplayScope {
    pub fn id(&self) -> &str {
        match self {
            DisplayScope::Page(page) => &page.id,
            DisplayScope::Group(group) => &group.id,
            DisplayScope::Global(_) => GLOBAL_SCOPE_ID,
        }
    }

    /// Whether `page_id` falls inside this scope
    pub fn has_page(&self, page_id: &str) -> bool {
        match self {
            DisplayScope::Page(page) => page.id == page_id,
            DisplayScope::Group(group) => group.pages.iter().any(|p| p == page_id),
            DisplayScope::Global(_) => true,
        }
    }

    pub fn controllers(&self) -> &[Controller] {
        match self {
            DisplayScope::Page(page) => &page.controllers,
            DisplayScope::Group(group) => &group.controllers,
            DisplayScope::Global(global) => &global.controllers,
        }
    }

    pub fn add_controller(&mut self, controller: Controller) {
        match self {
            DisplayScope::Page(page) => page.controllers.push(controller),
            DisplayScope::Group(group) => group.controllers.push(controller),
            DisplayScope::Global(global) => global.controllers.push(controller),
        }
    }

    pub fn as_page(&self) -> Option<&Page> {
        match self {
            DisplayScope::Page(page) => Some(page),
            _ => None,
        }
    }
}

/// All registered display scopes, keyed by id
///
/// Owned by the page manager builder while the app is configured; frozen
/// into the manager by `prepare()`.
#[derive(Debug, Clone)]
pub struct ScopeRegistry {
    scopes: HashMap<String, DisplayScope>,
    page_order: Vec<String>,
}

impl ScopeRegistry {
    pub fn new() -> Self {
        let mut scopes = HashMap::new();
        scopes.insert(
            GLOBAL_SCOPE_ID.to_string(),
            DisplayScope::Global(GlobalScope::default()),
        );
        Self {
            scopes,
            page_order: Vec::new(),
        }
    }

    /// Registers pages, then groups
    ///
    /// Groups may only list pages that are registered by now. Each member
    /// page records the group, so a page's groups follow registration order.
    pub fn register_display_scopes<P, G>(&mut self, pages: P, groups: G) -> NavResult<()>
    where
        P: IntoIterator<Item = Page>,
        G: IntoIterator<Item = PageGroup>,
    {
        for page in pages {
            self.ensure_free(&page.id)?;
            tracing::trace!(page = %page.id, path = %page.path, "register page");
            self.page_order.push(page.id.clone());
            self.scopes.insert(page.id.clone(), DisplayScope::Page(page));
        }

        for group in groups {
            self.ensure_free(&group.id)?;
            for member in &group.pages {
                match self.scopes.get_mut(member) {
                    Some(DisplayScope::Page(page)) => page.groups.push(group.id.clone()),
                    Some(_) => return Err(NavError::NotAPage(member.clone())),
                    None => return Err(NavError::UnknownPage(member.clone())),
                }
            }
            tracing::trace!(group = %group.id, pages = group.pages.len(), "register page group");
            self.scopes.insert(group.id.clone(), DisplayScope::Group(group));
        }

        Ok(())
    }

    fn ensure_free(&self, id: &str) -> NavResult<()> {
        if self.scopes.contains_key(id) {
            Err(NavError::DuplicateScope(id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Attaches a controller to the global scope, a group or a page
    pub fn register_controller(&mut self, scope_id: &str, controller: Controller) -> NavResult<()> {
        self.scopes
            .get_mut(scope_id)
            .ok_or_else(|| NavError::UnknownScope(scope_id.to_string()))?
            .add_controller(controller);
        Ok(())
    }

    pub fn scope(&self, id: &str) -> NavResult<&DisplayScope> {
        self.scopes
            .get(id)
            .ok_or_else(|| NavError::UnknownScope(id.to_string()))
    }

    pub fn page(&self, id: &str) -> NavResult<&Page> {
        match self.scopes.get(id) {
            Some(DisplayScope::Page(page)) => Ok(page),
            Some(_) => Err(NavError::NotAPage(id.to_string())),
            None => Err(NavError::UnknownPage(id.to_string())),
        }
    }

    /// Pages in registration order
    pub fn pages(&self) -> impl Iterator<Item = &Page> {
        self.page_order
            .iter()
            .filter_map(|id| self.scopes.get(id).and_then(DisplayScope::as_page))
    }

    /// Whether content tagged with `scope_id` stays visible on `page_id`
    pub fn belongs(&self, scope_id: &str, page_id: &str) -> NavResult<bool> {
        Ok(self.scope(scope_id)?.has_page(page_id))
    }

    /// Controllers for entering `page_id`: global, then groups, then the page
    pub fn controller_chain(&self, page_id: &str) -> NavResult<Vec<ScopedController>> {
        let page = self.page(page_id)?;

        let mut chain = Vec::new();
        let mut add = |scope: &DisplayScope| {
            chain.extend(scope.controllers().iter().map(|controller| ScopedController {
                scope_id: scope.id().to_string(),
                controller: controller.clone(),
            }));
        };

        add(self.scope(GLOBAL_SCOPE_ID)?);
        for group_id in &page.groups {
            add(self.scope(group_id)?);
        }
        add(self.scope(page_id)?);

        Ok(chain)
    }
}

impl Default for ScopeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
