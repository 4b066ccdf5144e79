pub mod image_cache;
pub mod window;

use thiserror::Error;

pub use image_cache::{CacheEntry, ImageCache};
pub use window::{distance, PrefetchWindow};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Failed to start preload workers: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}
