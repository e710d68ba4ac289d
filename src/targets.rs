use std::path::{Path, PathBuf};

use crate::error::MediaServerError;

/// URLs and filesystem paths derived for one media file.
///
/// `media_url` is absolute (it ends up inside a QR code and must work from any
/// device), while `direct_url` is deliberately page-relative and resolves
/// against whatever origin served the page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedTargets {
    /// Absolute URL of the media page
    pub media_url: String,
    /// Page-relative URL of the raw file
    pub direct_url: String,
    /// Output image filename, file stem plus ".png"
    pub qr_output_name: String,
    /// Full path of the output image under the QR directory
    pub qr_output_path: PathBuf,
}

/// Derive the media-page URL, direct-file URL and QR output paths for one
/// filename. Pure string/path computation, no I/O.
///
/// The filename goes percent-encoded into `media_url` since directory entries
/// may contain spaces or other characters unsafe in a URL path segment.
///
/// Two filenames sharing a stem (`a.png`, `a.jpg`) derive the same
/// `qr_output_name`; whichever encodes last owns the image on disk.
pub fn derive_targets(
    filename: &str,
    base_host: &str,
    output_dir: &Path,
) -> Result<DerivedTargets, MediaServerError> {
    if filename.is_empty() {
        return Err(MediaServerError::InvalidFilename(
            "empty filename".to_string(),
        ));
    }

    let media_url = format!(
        "{}/media/{}",
        base_host.trim_end_matches('/'),
        urlencoding::encode(filename)
    );
    let direct_url = format!("/files/{}", filename);

    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let qr_output_name = format!("{}.png", stem);
    let qr_output_path = output_dir.join(&qr_output_name);

    Ok(DerivedTargets {
        media_url,
        direct_url,
        qr_output_name,
        qr_output_path,
    })
}
