//! Desktop GUI (egui-based)
//!
//! The window owns a [`StudioState`](crate::studio::StudioState); generation
//! runs on a background worker thread.

mod app;
mod worker;

pub use app::DesktopApp;
pub use worker::WorkerHandle;
