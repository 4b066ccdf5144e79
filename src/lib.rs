//! clipdeck: terminal clipboard history with inline image previews

pub mod app;
pub mod cache;
pub mod engine;
pub mod input;
pub mod rendering;
pub mod storage;
pub mod ui;
