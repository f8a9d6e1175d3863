//! L'Atelier - an AI patissier
//!
//! Turns a handful of keywords into an avant-garde dessert concept using
//! Google Gemini:
//! - Structured recipe generation with optional cost/price targets and refinement
//! - A hero photograph plus a pencil sketch per preparation step
//! - Terminal studio and desktop GUI (egui-based) front ends

pub mod cli;
pub mod commands;
pub mod config;
pub mod data_uri;
#[cfg(feature = "desktop")]
pub mod desktop;
pub mod error;
pub mod generator;
pub mod paths;
pub mod prompt;
pub mod provider;
pub mod recipe;
pub mod render;
pub mod studio;

pub use config::Config;
pub use error::{GenerationError, Locale};
pub use generator::{GenerationEvent, RecipeGenerator};
pub use recipe::{GeneratedSweet, Recipe};
