//! Error type for the CLI.

use terratile::TilerError;
use thiserror::Error;

/// Errors surfaced by the `terratile` command.
#[derive(Debug, Error)]
pub enum CliError {
    /// A tiling-library error.
    #[error(transparent)]
    Tiler(#[from] TilerError),

    /// Failed to serialize the layer metadata document.
    #[error("Failed to write layer metadata: {0}")]
    LayerMetadata(#[from] serde_json::Error),

    /// I/O error writing output files.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Some tiles could not be built or written.
    #[error("{failed} of {total} tiles failed; see warnings above")]
    TilesFailed {
        /// Number of failed tiles.
        failed: u64,
        /// Number of tiles attempted.
        total: u64,
    },
}
