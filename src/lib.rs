//! Collage composition: masonry, fixed-aspect grid, and square grid layouts.
//!
//! Layout planning is pure geometry — planners consume image dimensions and
//! produce a [`CanvasPlan`] describing every placement; the [`render`]
//! module executes plans against actual pixel data and encodes the result.
//!
//! # Modules
//!
//! - [`layout`] — planners and shared geometry (masonry, grid, square)
//! - [`color`] — canvas color type and parsing
//! - [`loader`] — input discovery and decoding
//! - [`render`] — plan execution and encoding
//! - [`cli`] — command-line front end

#![forbid(unsafe_code)]

pub mod cli;
pub mod color;
pub mod error;
pub mod layout;
pub mod loader;
pub mod render;

// Re-exports: core types for library consumers
pub use color::CanvasColor;
pub use error::MergeError;
pub use render::{compose_grid, compose_masonry, compose_square};
pub use layout::grid::{FitMode, GridConfig, SquareConfig};
pub use layout::masonry::MasonryConfig;
pub use layout::{
    Alignment, Backdrop, CanvasPlan, Flow, ImagePlacement, LayoutError, Rect, Size,
};
