//! Integration tests for the page manager
//!
//! Drives full transitions against in-memory document, history and binding
//! fakes and checks what each collaborator saw.

mod common;

use common::Fixture;
use pretty_assertions::assert_eq;
use rstest::rstest;
use silcrow_nav::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn pages() -> Vec<Page> {
    vec![
        Page::new("home", "/", "Home"),
        Page::new("user", "/user/:id", "User {id}"),
        Page::new("dashboard", "/admin", "Dashboard"),
        Page::new("settings", "/admin/settings", "Settings"),
        Page::new("not-found", "/404", "Not Found"),
    ]
}

fn groups() -> Vec<PageGroup> {
    vec![PageGroup::new("admin", ["dashboard", "settings"])]
}

fn config() -> NavConfig {
    NavConfig::default()
        .with_start_page("home")
        .with_not_found_page("not-found")
}

fn builder(fx: &Fixture, config: NavConfig) -> PageManagerBuilder {
    let mut builder = PageManagerBuilder::new(
        config,
        fx.history.clone(),
        fx.document.clone(),
        fx.binding.clone(),
    )
    .unwrap();
    builder.register_display_scopes(pages(), groups()).unwrap();
    builder
}

async fn start(fx: &Fixture) -> Arc<PageManager> {
    builder(fx, config()).prepare().await.unwrap()
}

fn counter(hits: &Arc<AtomicUsize>) -> Controller {
    let hits = Arc::clone(hits);
    Controller::from_fn(move |_| {
        hits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    })
}

/// Waits for a background transition to land on `page_id`
async fn settle(manager: &PageManager, page_id: &str) {
    for _ in 0..200 {
        if manager.current_page_id().as_deref() == Some(page_id)
            && manager.state() == TransitionState::Idle
        {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("never reached page {}", page_id);
}

// ============================================================================
// Initial load
// ============================================================================

#[tokio::test]
async fn test_root_shows_start_page() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;

    assert_eq!(manager.current_page_id().as_deref(), Some("home"));
    assert_eq!(
        fx.document.mounted(),
        r#"<main><h1>Home</h1></main><div sc-belong="home"></div>"#
    );
    assert_eq!(fx.document.title(), "Home");
    assert!(fx.document.is_visible());
    assert!(fx.entries().contains(&"replace Home /".to_string()));
    assert_eq!(fx.count("push"), 0);
}

#[tokio::test]
async fn test_transition_order() {
    let fx = Fixture::at("/user/42");
    start(&fx).await;

    assert_eq!(
        fx.entries(),
        vec![
            "hide",
            "mount",
            "reset",
            "bind once=false",
            "show",
            "title User 42",
            "checkpoint",
        ]
    );
}

#[tokio::test]
async fn test_route_params_reach_scope_and_binding() {
    let fx = Fixture::at("/user/42");
    let mut builder = builder(&fx, config());
    builder
        .register_controller(
            "user",
            Controller::new(|scope| async move {
                let id = scope.param("id").unwrap_or_default().to_string();
                scope.bind("userId", &id)?;
                Ok(())
            }),
        )
        .unwrap();
    let manager = builder.prepare().await.unwrap();

    let scope = manager.current_scope().unwrap();
    assert_eq!(scope.page_id(), "user");
    assert_eq!(scope.param("id"), Some("42"));

    let bound = fx.binding.bound();
    assert_eq!(bound.len(), 1);
    assert_eq!(bound[0][0].name, "userId");
    assert_eq!(bound[0][0].value, serde_json::json!("42"));
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test]
async fn test_redirect_to_page_pushes_history() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;
    fx.clear();

    let outcome = manager.redirect_to_page("user", &[Some("7")]).await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Mounted {
            page_id: "user".into()
        }
    );
    assert_eq!(fx.entries()[0], "push User 7 /user/7");
    assert_eq!(fx.document.title(), "User 7");
}

#[tokio::test]
async fn test_page_url_argument_count() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;

    assert_eq!(manager.page_url("user", &[Some("42")]).unwrap(), "/user/42");

    let err = manager.page_url("user", &[] as &[Option<&str>]).unwrap_err();
    assert!(err.is_recoverable());
    assert!(matches!(
        err,
        NavError::Route(RouteError::ParamCountMismatch { expected: 1, got: 0, .. })
    ));

    assert!(matches!(
        manager.page_url("admin", &[] as &[Option<&str>]),
        Err(NavError::NotAPage(_))
    ));
}

#[tokio::test]
async fn test_same_page_is_not_remounted() {
    let fx = Fixture::at("/user/42");
    let hits = Arc::new(AtomicUsize::new(0));
    let mut builder = builder(&fx, config());
    builder.register_controller("user", counter(&hits)).unwrap();
    let manager = builder.prepare().await.unwrap();
    fx.clear();

    let outcome = manager.update_page("/user/43", true).await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Unchanged {
            page_id: "user".into()
        }
    );
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert_eq!(fx.entries(), vec!["push User 43 /user/43"]);
    assert_eq!(manager.current_scope().unwrap().param("id"), Some("42"));
}

#[tokio::test]
async fn test_group_controller_reruns_between_member_pages() {
    let fx = Fixture::at("/admin");
    let hits = Arc::new(AtomicUsize::new(0));
    let mut builder = builder(&fx, config());
    builder.register_controller("admin", counter(&hits)).unwrap();
    let manager = builder.prepare().await.unwrap();

    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(fx.document.mounted().contains("admin menu"));

    manager.redirect_to_page("settings", &[] as &[Option<&str>]).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(fx.document.mounted().contains("admin menu"));

    manager.redirect_to_page("home", &[] as &[Option<&str>]).await.unwrap();
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(!fx.document.mounted().contains("admin menu"));
}

#[tokio::test]
async fn test_controllers_run_global_then_group_then_page_on_one_scope() {
    let fx = Fixture::at("/admin/settings");
    let mut builder = builder(&fx, config());
    builder
        .register_controller(GLOBAL_SCOPE_ID, Controller::from_fn(|s| s.bind("app", &"silcrow")))
        .unwrap();
    builder
        .register_controller("admin", Controller::from_fn(|s| s.bind("menu", &["users"])))
        .unwrap();
    builder
        .register_controller("settings", Controller::from_fn(|s| s.bind("theme", &"dark")))
        .unwrap();
    let manager = builder.prepare().await.unwrap();

    let scope = manager.current_scope().unwrap();
    let mut names: Vec<String> = scope.models().into_iter().map(|m| m.name).collect();
    names.sort();
    assert_eq!(names, vec!["app", "menu", "theme"]);
    assert_eq!(fx.binding.bound()[0].len(), 3);
}

// ============================================================================
// Not found
// ============================================================================

#[tokio::test]
async fn test_missing_path_lands_on_not_found_without_push() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;
    fx.clear();

    let outcome = manager.update_page("/missing", true).await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Mounted {
            page_id: "not-found".into()
        }
    );
    assert_eq!(fx.count("push"), 0);
    assert!(fx.document.mounted().contains("Not found"));
}

#[tokio::test]
async fn test_missing_path_without_not_found_page() {
    let fx = Fixture::at("/");
    let manager = builder(&fx, NavConfig::default().with_start_page("home"))
        .prepare()
        .await
        .unwrap();

    let err = manager.update_page("/missing", false).await.unwrap_err();
    assert!(matches!(err, NavError::PageNotFound { ref path } if path == "/missing"));
    assert_eq!(manager.current_page_id().as_deref(), Some("home"));
    assert_eq!(manager.state(), TransitionState::Idle);
}

// ============================================================================
// Base path, links and history
// ============================================================================

fn app_config() -> NavConfig {
    config().with_base_path("/app")
}

#[tokio::test]
async fn test_base_path_urls() {
    let fx = Fixture::at("/app");
    let manager = builder(&fx, app_config()).prepare().await.unwrap();

    assert_eq!(manager.base_path(), "/app");
    assert!(fx.entries().contains(&"replace Home /app".to_string()));
    assert_eq!(manager.page_url("user", &[Some("5")]).unwrap(), "/app/user/5");

    manager.redirect_to_url("/app/user/5").await.unwrap();
    assert!(fx.entries().contains(&"push User 5 /app/user/5".to_string()));
    assert_eq!(manager.current_page_id().as_deref(), Some("user"));

    let outcome = manager.redirect_to_url("/elsewhere").await.unwrap();
    assert_eq!(
        outcome,
        TransitionOutcome::External {
            url: "/elsewhere".into()
        }
    );
    assert!(fx.entries().contains(&"redirect /elsewhere".to_string()));
    assert_eq!(manager.current_page_id().as_deref(), Some("user"));
}

#[rstest]
#[case("/app/user/1", true)]
#[case("/app/admin?tab=2", true)]
#[case("/app", true)]
#[case("/application", false)]
#[case("/other", false)]
#[case("https://example.com/app", false)]
#[case("//example.com/app", false)]
#[tokio::test]
async fn test_link_disposition(#[case] href: &str, #[case] intercepted: bool) {
    let fx = Fixture::at("/app/404");
    let manager = builder(&fx, app_config()).prepare().await.unwrap();

    assert_eq!(fx.document.click(href), intercepted);
    let expected = if intercepted {
        LinkDisposition::Intercept
    } else {
        LinkDisposition::Passthrough
    };
    assert_eq!(manager.handle_link_click(href), expected);
}

#[rstest]
#[case("/user/1", true)]
#[case("/", true)]
#[case("//example.com/x", false)]
#[case("/\\example.com/x", false)]
#[case("https://example.com/", false)]
#[tokio::test]
async fn test_link_disposition_at_root(#[case] href: &str, #[case] intercepted: bool) {
    let fx = Fixture::at("/404");
    let manager = start(&fx).await;

    assert_eq!(fx.document.click(href), intercepted);
    let expected = if intercepted {
        LinkDisposition::Intercept
    } else {
        LinkDisposition::Passthrough
    };
    assert_eq!(manager.handle_link_click(href), expected);
}

#[tokio::test]
async fn test_protocol_relative_url_leaves_the_app() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;
    fx.clear();

    let outcome = manager.redirect_to_url("//example.com/x").await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::External {
            url: "//example.com/x".into()
        }
    );
    assert_eq!(fx.entries(), vec!["redirect //example.com/x"]);
    assert_eq!(manager.current_page_id().as_deref(), Some("home"));
}

#[tokio::test]
async fn test_link_click_navigates_in_background() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;

    assert!(fx.document.click("/user/3"));
    settle(&manager, "user").await;

    assert!(fx.entries().contains(&"push User 3 /user/3".to_string()));
}

#[tokio::test]
async fn test_pop_state_navigates_without_push() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;
    fx.clear();

    fx.history.pop_to("/admin");
    settle(&manager, "dashboard").await;

    assert_eq!(fx.count("push"), 0);
    assert_eq!(fx.document.title(), "Dashboard");
}

#[tokio::test]
async fn test_transitions_do_not_interleave() {
    let fx = Fixture::at("/");
    let manager = start(&fx).await;
    fx.clear();

    let (a, b) = tokio::join!(
        manager.update_page("/user/1", true),
        manager.update_page("/admin", true)
    );
    a.unwrap();
    b.unwrap();

    let marks: Vec<String> = fx
        .entries()
        .into_iter()
        .filter(|e| e == "hide" || e == "checkpoint")
        .collect();
    assert_eq!(marks, vec!["hide", "checkpoint", "hide", "checkpoint"]);
}

// ============================================================================
// Failures
// ============================================================================

#[tokio::test]
async fn test_controller_failure_aborts_transition() {
    let fx = Fixture::at("/");
    let mut builder = builder(&fx, config());
    builder
        .register_controller("user", Controller::from_fn(|_| anyhow::bail!("user service down")))
        .unwrap();
    let manager = builder.prepare().await.unwrap();
    fx.clear();

    let err = manager.redirect_to_page("user", &[Some("1")]).await.unwrap_err();

    assert!(matches!(err, NavError::Controller { ref scope, .. } if scope == "user"));
    assert_eq!(manager.current_page_id().as_deref(), Some("home"));
    assert_eq!(fx.count("show"), 0);
    assert_eq!(fx.count("checkpoint"), 0);
    assert_eq!(manager.state(), TransitionState::Idle);
}

#[tokio::test]
async fn test_failed_transition_does_not_count_as_shown() {
    let fx = Fixture::at("/");
    let mut builder = builder(&fx, config());
    builder
        .register_controller("user", Controller::from_fn(|_| anyhow::bail!("user service down")))
        .unwrap();
    let manager = builder.prepare().await.unwrap();

    manager.redirect_to_page("user", &[Some("1")]).await.unwrap_err();
    assert!(!fx.document.is_visible());

    let outcome = manager.update_page("/", false).await.unwrap();

    assert_eq!(
        outcome,
        TransitionOutcome::Mounted {
            page_id: "home".into()
        }
    );
    assert!(fx.document.is_visible());
    assert_eq!(
        fx.document.mounted(),
        r#"<main><h1>Home</h1></main><div sc-belong="home"></div>"#
    );

    // the failed page is retried rather than treated as already shown
    let err = manager.redirect_to_page("user", &[Some("1")]).await.unwrap_err();
    assert!(matches!(err, NavError::Controller { .. }));
}

#[test]
fn test_missing_container() {
    let fx = Fixture::at("/");
    let err = PageManagerBuilder::new(
        config(),
        fx.history.clone(),
        common::FakeDocument::without_container(fx.journal.clone()),
        fx.binding.clone(),
    )
    .unwrap_err();
    assert!(matches!(err, NavError::MissingContainer));
}

#[tokio::test]
async fn test_invalid_section_name_fails_prepare() {
    let template = Fragment::default()
        .with_node(Element::new("sc-section").with_attr("name", "side/bar"));
    let fx = Fixture::with_template("/", template);

    let err = builder(&fx, config()).prepare().await.unwrap_err();
    assert!(matches!(err, NavError::InvalidSlotName { ch: '/', .. }));
}

#[tokio::test]
async fn test_unknown_belong_scope_fails_prepare() {
    let template = Fragment::default().with_node(Element::new("p").with_attr("sc-belong", "ghost"));
    let fx = Fixture::with_template("/", template);

    let err = builder(&fx, config()).prepare().await.unwrap_err();
    assert!(matches!(err, NavError::UnknownScope(ref id) if id == "ghost"));
}

#[tokio::test]
async fn test_unknown_belong_scope_outside_start_page_fails_prepare() {
    let template = common::template().with_node(
        Element::new("div")
            .with_attr("sc-belong", "admin")
            .with_child(Element::new("p").with_attr("sc-belong", "ghost")),
    );
    let fx = Fixture::with_template("/", template);

    let err = builder(&fx, config()).prepare().await.unwrap_err();

    assert!(matches!(err, NavError::UnknownScope(ref id) if id == "ghost"));
    assert_eq!(fx.count("mount"), 0);
}

#[tokio::test]
async fn test_unknown_start_page() {
    let fx = Fixture::at("/");
    let err = builder(&fx, NavConfig::default().with_start_page("nope"))
        .prepare()
        .await
        .unwrap_err();
    assert!(matches!(err, NavError::UnknownPage(ref id) if id == "nope"));
}

#[tokio::test]
async fn test_invalid_route_pattern() {
    let fx = Fixture::at("/");
    let mut builder = builder(&fx, config());
    builder
        .register_display_scopes([Page::new("docs", "/docs/*rest/edit", "Docs")], Vec::<PageGroup>::new())
        .unwrap();

    let err = builder.prepare().await.unwrap_err();
    assert!(matches!(err, NavError::Route(RouteError::InvalidPattern { .. })));
}

// ============================================================================
// Custom tags
// ============================================================================

#[tokio::test]
async fn test_custom_tag_models_are_referenced_by_index() {
    let template = common::template()
        .with_node(
            Element::new("sc-define")
                .with_child(Element::new("sc-element").with_attr("id", "avatar")),
        )
        .with_node(Element::new("avatar").with_attr("src", "/me.png"));
    let fx = Fixture::with_template("/", template);

    let mut builder = builder(&fx, config());
    builder.register_custom_tag("avatar", |el: &Element| {
        Ok(serde_json::json!({ "src": el.attr("src") }))
    });
    let manager = builder.prepare().await.unwrap();

    assert!(fx
        .document
        .mounted()
        .contains(r#"<avatar src="/me.png" data-sc-model-id="0"></avatar>"#));
    assert_eq!(
        manager.custom_tags().models()[0].value,
        serde_json::json!({ "src": "/me.png" })
    );
}
