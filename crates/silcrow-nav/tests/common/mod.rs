//! In-memory collaborators recording every call into one shared journal

#![allow(dead_code)]

use silcrow_nav::{
    BindEngine, Document, Element, Fragment, History, LinkHandler, Model, PopStateHandler,
};
use std::sync::{Arc, Mutex};

pub type Journal = Arc<Mutex<Vec<String>>>;

fn record(journal: &Journal, entry: impl Into<String>) {
    journal.lock().unwrap().push(entry.into());
}

// ============================================================================
// Document
// ============================================================================

pub struct FakeDocument {
    journal: Journal,
    has_container: bool,
    template: Fragment,
    mounted: Mutex<Option<Fragment>>,
    title: Mutex<String>,
    visible: Mutex<bool>,
    link_handler: Mutex<Option<LinkHandler>>,
}

impl FakeDocument {
    pub fn new(journal: Journal, template: Fragment) -> Arc<Self> {
        Arc::new(Self::build(journal, template, true))
    }

    pub fn without_container(journal: Journal) -> Arc<Self> {
        Arc::new(Self::build(journal, Fragment::default(), false))
    }

    fn build(journal: Journal, template: Fragment, has_container: bool) -> Self {
        Self {
            journal,
            has_container,
            template,
            mounted: Mutex::new(None),
            title: Mutex::new(String::new()),
            visible: Mutex::new(true),
            link_handler: Mutex::new(None),
        }
    }

    pub fn mounted(&self) -> String {
        self.mounted
            .lock()
            .unwrap()
            .as_ref()
            .map(ToString::to_string)
            .unwrap_or_default()
    }

    pub fn title(&self) -> String {
        self.title.lock().unwrap().clone()
    }

    pub fn is_visible(&self) -> bool {
        *self.visible.lock().unwrap()
    }

    /// Simulates a click on a link; returns whether the default was prevented
    pub fn click(&self, href: &str) -> bool {
        let handler = self.link_handler.lock().unwrap().clone();
        handler.map(|h| h(href)).unwrap_or(false)
    }
}

impl Document for FakeDocument {
    fn has_container(&self) -> bool {
        self.has_container
    }

    fn template(&self) -> Fragment {
        self.template.clone()
    }

    fn mount(&self, content: &Fragment) {
        record(&self.journal, "mount");
        *self.mounted.lock().unwrap() = Some(content.clone());
    }

    fn hide(&self) {
        record(&self.journal, "hide");
        *self.visible.lock().unwrap() = false;
    }

    fn show(&self) {
        record(&self.journal, "show");
        *self.visible.lock().unwrap() = true;
    }

    fn set_title(&self, title: &str) {
        record(&self.journal, format!("title {}", title));
        *self.title.lock().unwrap() = title.to_string();
    }

    fn listen_link_clicks(&self, handler: LinkHandler) {
        *self.link_handler.lock().unwrap() = Some(handler);
    }
}

// ============================================================================
// History
// ============================================================================

pub struct FakeHistory {
    journal: Journal,
    path: Mutex<String>,
    pop_handler: Mutex<Option<PopStateHandler>>,
}

impl FakeHistory {
    pub fn at(journal: Journal, path: &str) -> Arc<Self> {
        Arc::new(Self {
            journal,
            path: Mutex::new(path.to_string()),
            pop_handler: Mutex::new(None),
        })
    }

    /// Simulates back/forward landing on `path`
    pub fn pop_to(&self, path: &str) {
        *self.path.lock().unwrap() = path.to_string();
        let handler = self.pop_handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler();
        }
    }
}

impl History for FakeHistory {
    fn replace_state(&self, title: &str, path: &str) {
        record(&self.journal, format!("replace {} {}", title, path));
        *self.path.lock().unwrap() = path.to_string();
    }

    fn push_state(&self, title: &str, path: &str) {
        record(&self.journal, format!("push {} {}", title, path));
        *self.path.lock().unwrap() = path.to_string();
    }

    fn on_pop_state(&self, handler: PopStateHandler) {
        *self.pop_handler.lock().unwrap() = Some(handler);
    }

    fn current_path(&self) -> String {
        self.path.lock().unwrap().clone()
    }

    fn redirect_to(&self, url: &str) {
        record(&self.journal, format!("redirect {}", url));
    }
}

// ============================================================================
// Binding
// ============================================================================

pub struct FakeBinding {
    journal: Journal,
    bound: Mutex<Vec<Vec<Model>>>,
}

impl FakeBinding {
    pub fn new(journal: Journal) -> Arc<Self> {
        Arc::new(Self {
            journal,
            bound: Mutex::new(Vec::new()),
        })
    }

    /// Models passed to each `bind_models` call
    pub fn bound(&self) -> Vec<Vec<Model>> {
        self.bound.lock().unwrap().clone()
    }
}

impl BindEngine for FakeBinding {
    fn bind_models(&self, _root: &Fragment, models: &[Model], once: bool) {
        record(&self.journal, format!("bind once={}", once));
        self.bound.lock().unwrap().push(models.to_vec());
    }

    fn reset_watchers(&self) {
        record(&self.journal, "reset");
    }

    fn checkpoint(&self) {
        record(&self.journal, "checkpoint");
    }
}

// ============================================================================
// Fixture
// ============================================================================

/// Shared template: a header section filled per page and scoped blocks
pub fn template() -> Fragment {
    Fragment::default()
        .with_node(Element::new("sc-define").with_text("authoring notes"))
        .with_node(
            Element::new("main").with_child(
                Element::new("sc-section")
                    .with_attr("name", "body")
                    .with_text("empty"),
            ),
        )
        .with_node(
            Element::new("div").with_attr("sc-belong", "home").with_child(
                Element::new("sc-replace")
                    .with_attr("target", "body")
                    .with_child(Element::new("h1").with_text("Home")),
            ),
        )
        .with_node(
            Element::new("div").with_attr("sc-belong", "user").with_child(
                Element::new("sc-replace")
                    .with_attr("target", "body")
                    .with_child(Element::new("h1").with_text("Profile")),
            ),
        )
        .with_node(
            Element::new("nav")
                .with_attr("sc-belong", "admin")
                .with_text("admin menu"),
        )
        .with_node(
            Element::new("div").with_attr("sc-belong", "not-found").with_child(
                Element::new("sc-replace")
                    .with_attr("target", "body")
                    .with_child(Element::new("h1").with_text("Not found")),
            ),
        )
}

/// Routes core logs to the test output; later calls are no-ops
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .with_test_writer()
        .try_init();
}

pub struct Fixture {
    pub journal: Journal,
    pub history: Arc<FakeHistory>,
    pub document: Arc<FakeDocument>,
    pub binding: Arc<FakeBinding>,
}

impl Fixture {
    pub fn at(path: &str) -> Self {
        Self::with_template(path, template())
    }

    pub fn with_template(path: &str, template: Fragment) -> Self {
        init_tracing();
        let journal: Journal = Arc::default();
        Self {
            history: FakeHistory::at(journal.clone(), path),
            document: FakeDocument::new(journal.clone(), template),
            binding: FakeBinding::new(journal.clone()),
            journal,
        }
    }

    pub fn entries(&self) -> Vec<String> {
        self.journal.lock().unwrap().clone()
    }

    pub fn clear(&self) {
        self.journal.lock().unwrap().clear();
    }

    pub fn count(&self, prefix: &str) -> usize {
        self.entries()
            .iter()
            .filter(|e| e.starts_with(prefix))
            .count()
    }
}
