//! Media server library with per-file QR codes.
//!
//! This crate serves a directory of media files over HTTP, renders a "media
//! page" for each file, and generates QR codes that link to those pages. It
//! can be used as a standalone binary or embedded in another application.

pub mod batch;
pub mod config;
pub mod error;
pub mod handlers;
pub mod media;
pub mod qr;
pub mod routes;
pub mod targets;

use std::path::PathBuf;
use std::sync::Arc;

pub use config::Config;
pub use error::MediaServerError;
pub use media::MediaKind;
pub use qr::{PngQrEncoder, QrEncoder, RenderOptions};
pub use targets::{derive_targets, DerivedTargets};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Directory of media files being served
    pub media_root: PathBuf,
    /// Directory that QR images are written to
    pub qr_dir: PathBuf,
    /// Advertised base URL, no trailing slash
    pub base_host: String,
    /// Configuration
    pub config: Arc<Config>,
    /// QR-encoding collaborator
    pub encoder: Arc<dyn QrEncoder>,
}

impl AppState {
    /// Create an AppState with the production PNG encoder.
    pub fn new(media_root: PathBuf, base_host: String, config: Config) -> Self {
        Self::with_encoder(media_root, base_host, config, Arc::new(PngQrEncoder))
    }

    /// Create an AppState with an injected encoder.
    pub fn with_encoder(
        media_root: PathBuf,
        base_host: String,
        config: Config,
        encoder: Arc<dyn QrEncoder>,
    ) -> Self {
        Self {
            media_root,
            qr_dir: config.qr_dir.clone(),
            base_host: base_host.trim_end_matches('/').to_string(),
            config: Arc::new(config),
            encoder,
        }
    }
}
