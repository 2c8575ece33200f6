//! Tool-level error type.
//!
//! Layout errors stay plain enums in [`crate::layout`]; everything that
//! touches files or pixel data is wrapped here. Failures are never retried —
//! the whole invocation aborts and no partial output is written.

use std::path::PathBuf;

use crate::layout::LayoutError;

/// Errors from loading, layout, rendering, or encoding.
#[derive(Debug, thiserror::Error)]
pub enum MergeError {
    #[error("layout failed: {0}")]
    Layout(#[from] LayoutError),

    #[error("failed to decode {}", path.display())]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to write {}", path.display())]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("unsupported output format: {}", path.display())]
    UnsupportedOutput { path: PathBuf },

    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },

    #[error("no supported images found")]
    NoInputs,

    #[error("plan references image {index} but only {count} were supplied")]
    PlanMismatch { index: usize, count: usize },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
