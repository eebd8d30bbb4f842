//! Event capture for one page context
//!
//! Listener callbacks run synchronously inside event dispatch, so they do as
//! little as possible: check the live session gate, snapshot what the event
//! carried (selector, coordinates, field value) and hand it to a worker task.
//! The worker handles events one at a time in arrival order, which is where
//! screenshots are taken, scroll bursts are debounced and steps are appended.

use parking_lot::Mutex;
use std::sync::Arc;
use tokio::sync::{broadcast, mpsc};
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tokio::time::{sleep, Instant};

use super::navigation::NavigationInterceptor;
use super::overlay::CaptureOverlay;
use super::screenshot::ScreenshotAdapter;
use super::selector::selector;
use super::session::SessionManager;
use crate::config::RecorderConfig;
use crate::dom::{DomEvent, Element, EventType, ListenerId, ListenerTarget, ScrollTarget, Window};
use crate::models::{screenshot_id, Coordinates, NewStep, Step, StepData, StepType, StyleInfo};
use crate::store::ScreenshotStore;

/// Everything the engine needs from its context
pub struct CaptureContext {
    pub window: Arc<Window>,
    pub session: Arc<SessionManager>,
    pub screenshots: Arc<dyn ScreenshotStore>,
    pub adapter: Arc<ScreenshotAdapter>,
    pub overlay: Arc<CaptureOverlay>,
    pub config: RecorderConfig,
}

impl CaptureContext {
    pub fn new(
        window: Arc<Window>,
        session: Arc<SessionManager>,
        screenshots: Arc<dyn ScreenshotStore>,
    ) -> Self {
        Self {
            window,
            session,
            screenshots,
            adapter: Arc::new(ScreenshotAdapter::default()),
            overlay: Arc::new(CaptureOverlay::new()),
            config: RecorderConfig::default(),
        }
    }

    pub fn with_adapter(mut self, adapter: ScreenshotAdapter) -> Self {
        self.adapter = Arc::new(adapter);
        self
    }

    pub fn with_overlay(mut self, overlay: Arc<CaptureOverlay>) -> Self {
        self.overlay = overlay;
        self
    }

    pub fn with_config(mut self, config: RecorderConfig) -> Self {
        self.config = config;
        self
    }
}

/// What a listener hands to the worker
enum CapturedEvent {
    Click {
        target: Element,
        selector: String,
        x: i32,
        y: i32,
    },
    Scroll(NewStep),
    Step(NewStep),
}

impl CapturedEvent {
    fn label(&self) -> &'static str {
        match self {
            CapturedEvent::Click { .. } => "Click",
            CapturedEvent::Scroll(_) => "Scroll",
            CapturedEvent::Step(step) => step.step_type.label(),
        }
    }
}

/// Listeners, history patch and worker that exist while initialized
struct Attached {
    listeners: Vec<ListenerId>,
    navigation: NavigationInterceptor,
    cancel: broadcast::Sender<()>,
    _worker: JoinHandle<()>,
}

/// The recorder living in a page context.
///
/// Construct one per context. Listeners only exist between
/// [`initialize`](Self::initialize) and [`cleanup`](Self::cleanup); both are
/// idempotent and dropping the engine cleans up.
pub struct CaptureEngine {
    ctx: Arc<CaptureContext>,
    attached: Mutex<Option<Attached>>,
    follower: Mutex<Option<JoinHandle<()>>>,
}

impl CaptureEngine {
    pub fn new(ctx: CaptureContext) -> Self {
        Self {
            ctx: Arc::new(ctx),
            attached: Mutex::new(None),
            follower: Mutex::new(None),
        }
    }

    pub fn context(&self) -> &CaptureContext {
        &self.ctx
    }

    pub fn is_initialized(&self) -> bool {
        self.attached.lock().is_some()
    }

    /// Attach document listeners and the navigation interceptor, and start
    /// the worker. Must be called from within a tokio runtime.
    pub fn initialize(&self) {
        let mut attached = self.attached.lock();
        if attached.is_some() {
            return;
        }

        let window = &self.ctx.window;
        let (tx, rx) = mpsc::unbounded_channel();
        let (cancel_tx, cancel_rx) = broadcast::channel(1);
        let gate = self.ctx.session.subscribe();
        let mut listeners = Vec::with_capacity(3);

        let (click_tx, click_gate) = (tx.clone(), gate.clone());
        listeners.push(window.add_event_listener(
            ListenerTarget::Document,
            EventType::Click,
            true,
            Arc::new(move |event: &DomEvent| {
                let DomEvent::Click {
                    target,
                    client_x,
                    client_y,
                } = event
                else {
                    return;
                };
                if !click_gate.borrow().is_active() {
                    return;
                }
                forward(
                    &click_tx,
                    CapturedEvent::Click {
                        selector: selector(target),
                        target: target.clone(),
                        x: *client_x,
                        y: *client_y,
                    },
                );
            }),
        ));

        let (input_tx, input_gate) = (tx.clone(), gate.clone());
        listeners.push(window.add_event_listener(
            ListenerTarget::Document,
            EventType::Input,
            true,
            Arc::new(move |event: &DomEvent| {
                let DomEvent::Input { target } = event else {
                    return;
                };
                if !input_gate.borrow().is_active() {
                    return;
                }
                let input_type = target.get_attribute("type");
                let step = NewStep::input(
                    selector(target),
                    target.value().unwrap_or_default(),
                    input_type.as_deref(),
                );
                forward(&input_tx, CapturedEvent::Step(step));
            }),
        ));

        let (scroll_tx, scroll_gate) = (tx.clone(), gate.clone());
        let scroll_window = Arc::downgrade(window);
        listeners.push(window.add_event_listener(
            ListenerTarget::Document,
            EventType::Scroll,
            true,
            Arc::new(move |event: &DomEvent| {
                let DomEvent::Scroll { target } = event else {
                    return;
                };
                if !scroll_gate.borrow().is_active() {
                    return;
                }
                // Position is read now; only the debounce happens later.
                let step = match target {
                    ScrollTarget::Document => {
                        let Some(window) = scroll_window.upgrade() else {
                            return;
                        };
                        let (x, y) = window.scroll_offset();
                        NewStep::scroll("window".to_string(), x, y)
                    }
                    ScrollTarget::Element(element) => {
                        let (x, y) = element.scroll_offset();
                        NewStep::scroll(selector(element), x, y)
                    }
                };
                forward(&scroll_tx, CapturedEvent::Scroll(step));
            }),
        ));

        let navigation = NavigationInterceptor::install(
            window,
            Arc::new(move |url| {
                if gate.borrow().is_active() {
                    forward(&tx, CapturedEvent::Step(NewStep::navigate(url)));
                }
            }),
        );

        let worker = tokio::spawn(run_worker(Arc::clone(&self.ctx), rx, cancel_rx));

        *attached = Some(Attached {
            listeners,
            navigation,
            cancel: cancel_tx,
            _worker: worker,
        });
        tracing::info!("Capture listeners attached on {}", window.location());
    }

    /// Remove every listener, restore history and stop the worker, dropping
    /// any pending scroll
    pub fn cleanup(&self) {
        let Some(attached) = self.attached.lock().take() else {
            return;
        };

        for id in &attached.listeners {
            self.ctx
                .window
                .remove_event_listener(ListenerTarget::Document, *id);
        }
        attached.navigation.restore();
        let _ = attached.cancel.send(());

        tracing::info!("Capture listeners removed");
    }

    /// Attach while the session is recording and detach when it stops,
    /// following the shared record
    pub fn follow_session(self: &Arc<Self>) {
        let mut follower = self.follower.lock();
        if follower.is_some() {
            return;
        }

        let engine = Arc::downgrade(self);
        let mut rx = self.ctx.session.subscribe();
        *follower = Some(tokio::spawn(async move {
            loop {
                let recording = rx.borrow_and_update().is_recording;
                let Some(engine) = engine.upgrade() else {
                    break;
                };

                if recording && !engine.is_initialized() {
                    engine.initialize();
                    if engine.ctx.config.initial_navigation {
                        let url = engine.ctx.window.location();
                        engine.ctx.session.add_step(NewStep::navigate(url)).await;
                    }
                } else if !recording && engine.is_initialized() {
                    engine.cleanup();
                }
                drop(engine);

                if rx.changed().await.is_err() {
                    break;
                }
            }
        }));
    }

    /// Record an intentional pause. Ignored unless recording and not paused.
    pub async fn add_wait_step(&self, duration_ms: u64, description: Option<String>) -> Option<Step> {
        self.ctx
            .session
            .add_step(NewStep::wait(duration_ms, description))
            .await
    }
}

impl Drop for CaptureEngine {
    fn drop(&mut self) {
        if let Some(follower) = self.follower.lock().take() {
            follower.abort();
        }
        self.cleanup();
    }
}

/// Hand an event to the worker, logging if it is no longer running
fn forward(tx: &UnboundedSender<CapturedEvent>, event: CapturedEvent) {
    if let Err(mpsc::error::SendError(event)) = tx.send(event) {
        tracing::error!("Capture worker is gone, dropping {} event", event.label());
    }
}

async fn run_worker(
    ctx: Arc<CaptureContext>,
    mut events: mpsc::UnboundedReceiver<CapturedEvent>,
    mut cancel: broadcast::Receiver<()>,
) {
    let debounce = ctx.config.scroll_debounce();
    let mut pending_scroll: Option<NewStep> = None;
    let timer = sleep(debounce);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            biased;

            _ = cancel.recv() => {
                tracing::debug!("Capture worker cancelled");
                break;
            }
            _ = &mut timer, if pending_scroll.is_some() => {
                if let Some(step) = pending_scroll.take() {
                    ctx.session.add_step(step).await;
                }
            }
            event = events.recv() => match event {
                Some(CapturedEvent::Scroll(step)) => {
                    pending_scroll = Some(step);
                    timer.as_mut().reset(Instant::now() + debounce);
                }
                Some(CapturedEvent::Click { target, selector, x, y }) => {
                    record_click(&ctx, target, selector, x, y).await;
                }
                Some(CapturedEvent::Step(step)) => {
                    ctx.session.add_step(step).await;
                }
                None => break,
            }
        }
    }

    tracing::debug!("Capture worker stopped");
}

async fn record_click(ctx: &CaptureContext, target: Element, selector: String, x: i32, y: i32) {
    // Skip the expensive part if recording stopped while this was queued.
    if !ctx.session.is_active_now() {
        return;
    }

    ctx.overlay.show_then_hide(ctx.config.overlay_hide_delay());

    let screenshot_id = match capture_screenshot(ctx, &target).await {
        Some(data_uri) => store_screenshot(ctx, data_uri).await,
        None => None,
    };

    let step = NewStep {
        step_type: StepType::Click,
        data: StepData {
            selector: Some(selector),
            coordinates: Some(Coordinates { x, y }),
            description: Some(click_description(&target)),
            screenshot_id,
            style_info: Some(style_snapshot(&target)),
            html_content: Some(truncate_markup(&target.outer_html(), ctx.config.max_markup_len)),
            ..Default::default()
        },
    };
    ctx.session.add_step(step).await;
}

/// Run the adapter on its own task so a crash inside rendering costs one
/// screenshot, not the worker
async fn capture_screenshot(ctx: &CaptureContext, target: &Element) -> Option<String> {
    let adapter = Arc::clone(&ctx.adapter);
    let element = target.clone();
    let device_pixel_ratio = ctx.window.device_pixel_ratio();

    match tokio::spawn(async move { adapter.capture(&element, device_pixel_ratio).await }).await {
        Ok(data_uri) => data_uri,
        Err(e) => {
            tracing::error!("Screenshot capture of {:?} aborted: {}", target, e);
            None
        }
    }
}

/// Returns the blob key, or `None` if it could not be stored
async fn store_screenshot(ctx: &CaptureContext, data_uri: String) -> Option<String> {
    let id = screenshot_id();
    match ctx.screenshots.set(&id, data_uri).await {
        Ok(()) => Some(id),
        Err(e) => {
            tracing::warn!("Failed to store screenshot {}: {}", id, e);
            None
        }
    }
}

fn click_description(target: &Element) -> String {
    let mut description = format!("Click on {}", target.tag_name());
    let id = target.id();
    if !id.is_empty() {
        description.push('#');
        description.push_str(&id);
    }
    for class in target.class_list() {
        description.push('.');
        description.push_str(&class);
    }
    description
}

fn style_snapshot(target: &Element) -> StyleInfo {
    StyleInfo {
        background_color: Some(target.computed_style("background-color")),
        color: Some(target.computed_style("color")),
        font_size: Some(target.computed_style("font-size")),
        border: Some(target.computed_style("border")),
        padding: Some(target.computed_style("padding")),
        width: Some(target.computed_style("width")),
        height: Some(target.computed_style("height")),
    }
}

/// Cap serialized markup at `max_chars` characters; 0 disables the cap
fn truncate_markup(html: &str, max_chars: usize) -> String {
    if max_chars == 0 {
        return html.to_string();
    }
    match html.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}…", &html[..cut]),
        None => html.to_string(),
    }
}
