pub mod capability;
pub mod codec;
pub mod kitty;
pub mod viewport;

pub use capability::{fallback_notice, CapabilityDetector, GraphicsMode, TerminalCapability};
pub use codec::{fit_to_budget, fit_to_exact, measure, ImageAsset, ImageInfo};
pub use kitty::{KittyTransport, ScaleUnit};
pub use viewport::{CellMetrics, DisplayRegion};
