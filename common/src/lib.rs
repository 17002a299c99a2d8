//! Shared deck model, icon set and configuration.

pub mod config;
pub mod icons;
pub mod image;
pub mod types;

pub use config::*;
pub use icons::*;
pub use image::*;
pub use types::*;
