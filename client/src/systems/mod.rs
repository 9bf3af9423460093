//! Client-side walkthrough systems
//!
//! Organized into submodules for maintainability.

mod avatar;
mod frame;
mod graphics;
mod scene;

// Re-export everything for easy access from main.rs
pub use avatar::*;
pub use frame::*;
pub use graphics::*;
pub use scene::*;
