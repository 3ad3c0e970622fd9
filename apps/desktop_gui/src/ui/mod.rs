//! UI layer for desktop GUI: app shell and the single interaction panel.

pub mod app;

pub use app::DappGuiApp;
