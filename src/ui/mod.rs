pub mod preview;
pub mod render;
pub mod terminal;
pub mod terminal_guard;
pub mod theme;

pub use preview::{render_image, GraphicsContext, ImagePlacement, PreviewPlan};
pub use terminal::TuiManager;
pub use terminal_guard::TerminalGuard;
