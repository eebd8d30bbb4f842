pub mod control;
pub mod engine;
pub mod navigation;
pub mod overlay;
pub mod screenshot;
pub mod selector;
pub mod session;

pub use control::RecorderControl;
pub use engine::{CaptureContext, CaptureEngine};
pub use navigation::{NavigationCallback, NavigationInterceptor};
pub use overlay::{CaptureOverlay, OverlayState};
pub use screenshot::{ElementRenderer, RenderOptions, ScreenshotAdapter, StyleBoxRenderer};
pub use selector::selector;
pub use session::SessionManager;
