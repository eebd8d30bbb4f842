//! End-to-end tests for the capture pipeline.
//!
//! Each test builds an in-memory page, attaches a capture engine and drives
//! it through the same helpers a host bridge uses. Time is paused, so the
//! scroll debounce and overlay delays advance deterministically.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use tasker_recorder::config::RecorderConfig;
use tasker_recorder::dom::{Element, ListenerTarget, Rect, Window};
use tasker_recorder::error::{RecorderError, Result};
use tasker_recorder::models::{Coordinates, StepType};
use tasker_recorder::recording::{
    CaptureContext, CaptureEngine, ElementRenderer, RecorderControl, RenderOptions,
    ScreenshotAdapter, SessionManager,
};
use tasker_recorder::store::{MemoryScreenshotStore, MemoryStore, ScreenshotStore};

const START_URL: &str = "https://app.test/";

struct Page {
    window: Arc<Window>,
    control: RecorderControl,
    engine: Arc<CaptureEngine>,
}

fn page_with(config: RecorderConfig, screenshots: Arc<dyn ScreenshotStore>) -> Page {
    let window = Arc::new(Window::new(START_URL));
    let session = Arc::new(SessionManager::new(Arc::new(MemoryStore::new())));
    let control = RecorderControl::new(Arc::clone(&session), Arc::clone(&screenshots));
    let ctx = CaptureContext::new(Arc::clone(&window), session, screenshots).with_config(config);
    Page {
        window,
        control,
        engine: Arc::new(CaptureEngine::new(ctx)),
    }
}

fn page() -> Page {
    page_with(RecorderConfig::default(), Arc::new(MemoryScreenshotStore::new()))
}

/// Append a sized element to the body
fn mount(window: &Window, element: Element) -> Element {
    window.document().body().append_child(&element);
    element
}

/// Let the capture worker drain its queue
async fn settle() {
    sleep(Duration::from_millis(10)).await;
}

/// Accepts nothing
struct FullScreenshotStore;

#[async_trait]
impl ScreenshotStore for FullScreenshotStore {
    async fn set(&self, _id: &str, _data_uri: String) -> Result<()> {
        Err(RecorderError::Storage("quota exceeded".to_string()))
    }

    async fn get_many(&self, _ids: &[String]) -> Result<HashMap<String, String>> {
        Ok(HashMap::new())
    }
}

/// Crashes on every render
struct PanickingRenderer;

#[async_trait]
impl ElementRenderer for PanickingRenderer {
    async fn render(&self, _element: &Element, _options: RenderOptions) -> Result<Vec<u8>> {
        panic!("renderer bug");
    }
}

// ============================================================================
// Clicks and the session gate
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_click_recorded_only_while_active() {
    let page = page();
    let go = mount(
        &page.window,
        Element::new("button")
            .with_id("go")
            .with_class("primary")
            .with_rect(Rect::new(0.0, 0.0, 80.0, 30.0)),
    );
    let other = mount(
        &page.window,
        Element::new("button").with_rect(Rect::new(0.0, 40.0, 80.0, 30.0)),
    );
    page.engine.initialize();

    page.control.start_recording().await;
    page.window.click(&go, 10, 20);
    settle().await;

    page.control.pause_recording().await;
    page.window.click(&other, 5, 45);
    settle().await;

    page.control.resume_recording().await;
    settle().await;

    let session = page.control.session().await;
    assert_eq!(session.steps.len(), 1, "paused click must not be recorded");

    let step = &session.steps[0];
    assert_eq!(step.step_type, StepType::Click);
    assert_eq!(step.data.selector.as_deref(), Some("#go"));
    assert_eq!(step.data.coordinates, Some(Coordinates { x: 10, y: 20 }));
    assert_eq!(step.data.description.as_deref(), Some("Click on button#go.primary"));
    assert!(step.data.style_info.is_some());
    assert!(step
        .data
        .html_content
        .as_deref()
        .is_some_and(|html| html.starts_with("<button")));
    assert_eq!(session.current_step_id.as_deref(), Some(step.id.as_str()));

    let screenshot_id = step.data.screenshot_id.clone().expect("click should carry a screenshot");
    assert!(screenshot_id.starts_with("screenshot_"));
    let blobs = page.control.screenshots(&[screenshot_id.clone()]).await.unwrap();
    assert!(blobs[&screenshot_id].starts_with("data:image/png;base64,"));

    page.control.stop_recording().await;
    let status = page.control.recording_status().await;
    assert!(!status.is_recording);
    assert_eq!(status.step_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_click_before_start_is_ignored() {
    let page = page();
    let go = mount(&page.window, Element::new("button").with_id("go"));
    page.engine.initialize();

    page.window.click(&go, 1, 1);
    settle().await;
    page.control.start_recording().await;
    settle().await;

    assert_eq!(page.control.recording_status().await.step_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_click_without_screenshot_still_recorded() {
    let page = page();
    // No layout box, not a raster element: both capture paths fail.
    let link = mount(&page.window, Element::new("a").with_id("home"));
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.click(&link, 3, 4);
    settle().await;

    let steps = page.control.session().await.steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step_type, StepType::Click);
    assert!(steps[0].data.screenshot_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_screenshot_store_failure_drops_reference() {
    let page = page_with(RecorderConfig::default(), Arc::new(FullScreenshotStore));
    let go = mount(
        &page.window,
        Element::new("button")
            .with_id("go")
            .with_rect(Rect::new(0.0, 0.0, 40.0, 20.0)),
    );
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.click(&go, 1, 1);
    settle().await;

    let steps = page.control.session().await.steps;
    assert_eq!(steps.len(), 1);
    assert!(steps[0].data.screenshot_id.is_none());
}

#[tokio::test(start_paused = true)]
async fn test_malformed_color_does_not_stop_recording() {
    let page = page();
    let go = mount(
        &page.window,
        Element::new("button")
            .with_id("go")
            .with_rect(Rect::new(0.0, 0.0, 40.0, 20.0))
            .with_style("background-color", "#aéabc"),
    );
    let name = mount(&page.window, Element::new("input").with_id("name"));
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.click(&go, 2, 2);
    settle().await;
    page.window.type_text(&name, "Ada");
    settle().await;

    let kinds: Vec<StepType> = page
        .control
        .session()
        .await
        .steps
        .iter()
        .map(|s| s.step_type)
        .collect();
    assert_eq!(kinds, vec![StepType::Click, StepType::Input]);
}

#[tokio::test(start_paused = true)]
async fn test_renderer_crash_costs_only_the_screenshot() {
    let window = Arc::new(Window::new(START_URL));
    let screenshots: Arc<dyn ScreenshotStore> = Arc::new(MemoryScreenshotStore::new());
    let session = Arc::new(SessionManager::new(Arc::new(MemoryStore::new())));
    let control = RecorderControl::new(Arc::clone(&session), Arc::clone(&screenshots));
    let engine = CaptureEngine::new(
        CaptureContext::new(Arc::clone(&window), session, screenshots)
            .with_adapter(ScreenshotAdapter::new(Arc::new(PanickingRenderer))),
    );
    let go = mount(&window, Element::new("button").with_id("go"));
    let name = mount(&window, Element::new("input").with_id("name"));
    engine.initialize();
    control.start_recording().await;

    window.click(&go, 1, 1);
    settle().await;
    window.click(&go, 1, 1);
    settle().await;
    window.type_text(&name, "Ada");
    settle().await;

    let steps = control.session().await.steps;
    let kinds: Vec<StepType> = steps.iter().map(|s| s.step_type).collect();
    assert_eq!(kinds, vec![StepType::Click, StepType::Click, StepType::Input]);
    assert!(steps[0].data.screenshot_id.is_none());
    assert_eq!(steps[2].data.value.as_deref(), Some("Ada"));
}

#[tokio::test(start_paused = true)]
async fn test_overlay_shown_during_capture() {
    let page = page();
    let go = mount(&page.window, Element::new("button").with_id("go"));
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.click(&go, 1, 1);
    settle().await;
    assert!(page.engine.context().overlay.is_visible());

    sleep(Duration::from_millis(1100)).await;
    assert!(!page.engine.context().overlay.is_visible());
}

#[tokio::test(start_paused = true)]
async fn test_markup_is_capped() {
    let config = RecorderConfig {
        max_markup_len: 16,
        ..RecorderConfig::default()
    };
    let page = page_with(config, Arc::new(MemoryScreenshotStore::new()));
    let card = mount(
        &page.window,
        Element::new("div")
            .with_id("card")
            .with_text("a long paragraph of text that goes past the cap"),
    );
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.click(&card, 1, 1);
    settle().await;

    let steps = page.control.session().await.steps;
    let html = steps[0].data.html_content.clone().unwrap();
    assert_eq!(html.chars().count(), 17);
    assert!(html.ends_with('…'));
}

// ============================================================================
// Input and scroll
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_input_step() {
    let page = page();
    let email = mount(
        &page.window,
        Element::new("input")
            .with_id("email")
            .with_attribute("type", "email"),
    );
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.type_text(&email, "a@b.test");
    settle().await;

    let steps = page.control.session().await.steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step_type, StepType::Input);
    assert_eq!(steps[0].data.selector.as_deref(), Some("#email"));
    assert_eq!(steps[0].data.value.as_deref(), Some("a@b.test"));
    assert_eq!(
        steps[0].data.description.as_deref(),
        Some("Input \"a@b.test\" into email field")
    );
}

#[tokio::test(start_paused = true)]
async fn test_scroll_burst_coalesced() {
    let page = page();
    page.engine.initialize();
    page.control.start_recording().await;

    for i in 1..=10 {
        page.window.scroll_to(0, i * 100);
        sleep(Duration::from_millis(20)).await;
    }

    sleep(Duration::from_millis(100)).await;
    assert_eq!(
        page.control.recording_status().await.step_count,
        0,
        "nothing recorded before the quiet period"
    );

    sleep(Duration::from_millis(300)).await;
    let steps = page.control.session().await.steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step_type, StepType::Scroll);
    assert_eq!(steps[0].data.selector.as_deref(), Some("window"));
    assert_eq!(steps[0].data.coordinates, Some(Coordinates { x: 0, y: 1000 }));
}

#[tokio::test(start_paused = true)]
async fn test_element_scroll_uses_element_offsets() {
    let page = page();
    let feed = mount(&page.window, Element::new("ul").with_id("feed"));
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.scroll_element_to(&feed, 0, 250);
    sleep(Duration::from_millis(400)).await;

    let steps = page.control.session().await.steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].data.selector.as_deref(), Some("#feed"));
    assert_eq!(steps[0].data.coordinates, Some(Coordinates { x: 0, y: 250 }));
}

#[tokio::test(start_paused = true)]
async fn test_pending_scroll_dropped_on_cleanup() {
    let page = page();
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.scroll_to(0, 500);
    settle().await;
    page.engine.cleanup();
    sleep(Duration::from_millis(500)).await;

    assert_eq!(page.control.recording_status().await.step_count, 0);
}

// ============================================================================
// Navigation
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_spa_navigation_steps() {
    let page = page();
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.history().push_state("/inbox");
    page.window.history().replace_state("/inbox?page=2");
    page.window.back();
    page.window.navigate("https://other.test/login");
    settle().await;

    let urls: Vec<String> = page
        .control
        .session()
        .await
        .steps
        .into_iter()
        .inspect(|step| assert_eq!(step.step_type, StepType::Navigate))
        .filter_map(|step| step.data.url)
        .collect();
    assert_eq!(
        urls,
        vec![
            "https://app.test/inbox",
            "https://app.test/inbox?page=2",
            "https://app.test/",
            "https://other.test/login",
        ]
    );
}

#[tokio::test(start_paused = true)]
async fn test_navigation_while_paused_ignored() {
    let page = page();
    page.engine.initialize();
    page.control.start_recording().await;
    page.control.pause_recording().await;

    page.window.history().push_state("/settings");
    settle().await;

    assert_eq!(page.control.recording_status().await.step_count, 0);
    assert_eq!(page.window.location(), "https://app.test/settings");
}

// ============================================================================
// Lifecycle
// ============================================================================

#[tokio::test(start_paused = true)]
async fn test_cleanup_restores_page() {
    let page = page();
    let push = page.window.history().push_mutator();
    let replace = page.window.history().replace_mutator();

    page.engine.initialize();
    page.engine.initialize();
    assert!(page.engine.is_initialized());
    assert_eq!(page.window.listener_count(ListenerTarget::Document), 3);
    assert_eq!(page.window.listener_count(ListenerTarget::Window), 2);

    page.engine.cleanup();
    page.engine.cleanup();
    assert!(!page.engine.is_initialized());
    assert_eq!(page.window.listener_count(ListenerTarget::Document), 0);
    assert_eq!(page.window.listener_count(ListenerTarget::Window), 0);
    assert!(Arc::ptr_eq(&page.window.history().push_mutator(), &push));
    assert!(Arc::ptr_eq(&page.window.history().replace_mutator(), &replace));

    let go = mount(&page.window, Element::new("button").with_id("go"));
    page.control.start_recording().await;
    page.window.click(&go, 1, 1);
    page.window.history().push_state("/after");
    settle().await;
    assert_eq!(page.control.recording_status().await.step_count, 0);
}

#[tokio::test(start_paused = true)]
async fn test_drop_cleans_up() {
    let page = page();
    page.engine.initialize();
    let Page { window, engine, .. } = page;

    drop(engine);
    assert_eq!(window.listener_count(ListenerTarget::Document), 0);
    assert_eq!(window.listener_count(ListenerTarget::Window), 0);
}

#[tokio::test(start_paused = true)]
async fn test_follow_session_attaches_and_detaches() {
    let config = RecorderConfig {
        initial_navigation: true,
        ..RecorderConfig::default()
    };
    let page = page_with(config, Arc::new(MemoryScreenshotStore::new()));
    page.engine.follow_session();
    settle().await;
    assert!(!page.engine.is_initialized());

    page.control.start_recording().await;
    settle().await;
    assert!(page.engine.is_initialized());

    let steps = page.control.session().await.steps;
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].step_type, StepType::Navigate);
    assert_eq!(steps[0].data.url.as_deref(), Some(START_URL));

    page.control.stop_recording().await;
    settle().await;
    assert!(!page.engine.is_initialized());
    assert_eq!(page.window.listener_count(ListenerTarget::Document), 0);
}

#[tokio::test(start_paused = true)]
async fn test_complete_hands_back_steps() {
    let page = page();
    let go = mount(&page.window, Element::new("button").with_id("go"));
    page.engine.initialize();
    page.control.start_recording().await;

    page.window.click(&go, 1, 1);
    settle().await;
    page.engine.add_wait_step(750, None).await;
    page.window.history().push_state("/done");
    settle().await;

    let steps = page.control.complete_recording().await;
    let kinds: Vec<StepType> = steps.iter().map(|s| s.step_type).collect();
    assert_eq!(kinds, vec![StepType::Click, StepType::Wait, StepType::Navigate]);
    assert!(steps.windows(2).all(|w| w[0].timestamp <= w[1].timestamp));
    assert_eq!(steps[1].data.description.as_deref(), Some("Wait for 750ms"));

    let after = page.control.session().await;
    assert!(!after.is_recording);
    assert!(after.steps.is_empty());
}
