use std::path::Path;

use axum::{
    body::Body,
    extract::{Path as UrlPath, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::fs;
use tokio_util::io::ReaderStream;
use tracing::{debug, info};

use crate::batch::{self, BatchReport};
use crate::error::MediaServerError;
use crate::media::MediaKind;
use crate::targets::{derive_targets, DerivedTargets};
use crate::AppState;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub root: String,
}

/// Response for single-file QR generation
#[derive(Debug, Serialize)]
pub struct GenerateQrResponse {
    pub success: bool,
    pub message: String,
    pub qr_url: String,
    pub media_url: String,
}

/// One row of the index listing
struct MediaEntry {
    name: String,
    kind: MediaKind,
    size: Option<u64>,
    targets: DerivedTargets,
    qr_exists: bool,
}

// ============================================================================
// Helper functions
// ============================================================================

/// Validate a route filename as a single path segment under the served
/// directory. Separators and parent references are rejected outright rather
/// than rewritten, since the name has to match a directory entry exactly.
fn validate_filename(filename: &str) -> Result<(), MediaServerError> {
    if filename.is_empty() {
        return Err(MediaServerError::InvalidFilename(
            "empty filename".to_string(),
        ));
    }

    if filename.contains('/') || filename.contains('\\') {
        return Err(MediaServerError::PathTraversal);
    }

    if filename == "." || filename == ".." {
        return Err(MediaServerError::PathTraversal);
    }

    if filename.chars().any(|c| c.is_control()) {
        return Err(MediaServerError::InvalidFilename(
            "control characters in filename".to_string(),
        ));
    }

    Ok(())
}

/// Escape a value for interpolation into HTML text or attributes
fn escape_html(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

fn format_size_mb(bytes: u64) -> String {
    format!("{:.2} MB", bytes as f64 / (1024.0 * 1024.0))
}

/// Wrap a page body in the shared HTML shell
fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{title}</title>\n\
         <style>\n\
         body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #222; }}\n\
         table {{ border-collapse: collapse; width: 100%; }}\n\
         th, td {{ text-align: left; padding: 0.4rem 0.6rem; border-bottom: 1px solid #ddd; }}\n\
         img.qr-thumb {{ width: 64px; height: 64px; }}\n\
         video, img.preview {{ max-width: 100%; }}\n\
         .muted {{ color: #888; }}\n\
         </style>\n</head>\n<body>\n{body}\n</body>\n</html>\n",
        title = escape_html(title),
        body = body
    ))
}

/// Stream a file from disk with inline disposition.
///
/// Streaming keeps large media files out of memory.
async fn stream_file(path: &Path, requested: &str) -> Result<Response, MediaServerError> {
    let metadata = fs::metadata(path)
        .await
        .map_err(|_| MediaServerError::NotFound(requested.to_string()))?;

    if metadata.is_dir() {
        return Err(MediaServerError::NotFound(requested.to_string()));
    }

    debug!("Streaming file: {}", path.display());

    let file = fs::File::open(path).await.map_err(MediaServerError::Io)?;
    let stream = ReaderStream::new(file);
    let body = Body::from_stream(stream);

    let mime = mime_guess::from_path(path)
        .first_or_octet_stream()
        .to_string();

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let safe_filename = file_name.replace('"', "'");

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, mime),
            (header::CONTENT_LENGTH, metadata.len().to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("inline; filename=\"{}\"", safe_filename),
            ),
        ],
        body,
    )
        .into_response())
}

fn qr_image_url(qr_output_name: &str) -> String {
    format!("/qrcodes/{}", urlencoding::encode(qr_output_name))
}

// ============================================================================
// Handlers
// ============================================================================

/// GET /health - Health check endpoint
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        root: state.media_root.display().to_string(),
    })
}

/// GET / - HTML index of the media directory
pub async fn index(State(state): State<AppState>) -> Result<Html<String>, MediaServerError> {
    let qr_dir_name = state
        .qr_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned());

    let mut entries = Vec::new();
    for name in batch::list_media_entries(&state.media_root)? {
        if name.starts_with('.') {
            continue;
        }
        if Some(&name) == qr_dir_name.as_ref() {
            continue;
        }

        let targets = derive_targets(&name, &state.base_host, &state.qr_dir)?;
        let size = std::fs::metadata(state.media_root.join(&name))
            .ok()
            .filter(|m| m.is_file())
            .map(|m| m.len());

        entries.push(MediaEntry {
            kind: MediaKind::classify(&name),
            qr_exists: targets.qr_output_path.exists(),
            size,
            targets,
            name,
        });
    }

    let mut rows = String::new();
    for entry in &entries {
        let qr_cell = if entry.qr_exists {
            format!(
                "<a href=\"{url}\"><img class=\"qr-thumb\" src=\"{url}\" alt=\"QR code\"></a>",
                url = escape_html(&qr_image_url(&entry.targets.qr_output_name))
            )
        } else {
            format!(
                "<a href=\"/generate-qr/{}\">generate</a>",
                escape_html(&urlencoding::encode(&entry.name))
            )
        };

        rows.push_str(&format!(
            "<tr><td><a href=\"{media}\">{name}</a></td><td>{kind}</td><td>{size}</td>\
             <td><a href=\"{direct}\">raw</a></td><td>{qr}</td></tr>\n",
            media = escape_html(&entry.targets.media_url),
            name = escape_html(&entry.name),
            kind = entry.kind.label(),
            size = entry
                .size
                .map(format_size_mb)
                .unwrap_or_else(|| "-".to_string()),
            direct = escape_html(&entry.targets.direct_url),
            qr = qr_cell,
        ));
    }

    let body = format!(
        "<h1>Media files</h1>\n\
         <p class=\"muted\">{count} files &middot; <a href=\"/generate-all-qr\">regenerate all QR codes</a></p>\n\
         <table>\n<tr><th>File</th><th>Kind</th><th>Size</th><th>Link</th><th>QR</th></tr>\n{rows}</table>\n",
        count = entries.len(),
        rows = rows,
    );

    Ok(page("Media files", &body))
}

/// GET /media/:filename - Media page embedding one file by kind
pub async fn media_page(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, MediaServerError> {
    validate_filename(&filename)?;

    let path = state.media_root.join(&filename);
    let metadata = match fs::metadata(&path).await {
        Ok(m) if m.is_file() => m,
        _ => {
            let body = format!(
                "<h1>File not found</h1>\n<p>No file named <code>{}</code> is being served.</p>\n\
                 <p><a href=\"/\">Back to the file list</a></p>\n",
                escape_html(&filename)
            );
            return Ok((StatusCode::NOT_FOUND, page("File not found", &body)).into_response());
        }
    };

    let kind = MediaKind::classify(&filename);
    let targets = derive_targets(&filename, &state.base_host, &state.qr_dir)?;
    let direct = escape_html(&targets.direct_url);

    let embed = match kind {
        MediaKind::Video => format!(
            "<video controls src=\"{direct}\">Your browser cannot play this video.</video>"
        ),
        MediaKind::Image => format!(
            "<img class=\"preview\" src=\"{direct}\" alt=\"{name}\">",
            name = escape_html(&filename)
        ),
        MediaKind::Pdf => format!(
            "<embed src=\"{direct}\" type=\"application/pdf\" width=\"100%\" height=\"600\">"
        ),
        MediaKind::Other => "<p class=\"muted\">No inline preview for this file type.</p>".to_string(),
    };

    let qr_section = if targets.qr_output_path.exists() {
        format!(
            "<p><img class=\"qr-thumb\" src=\"{url}\" alt=\"QR code\"> \
             <a href=\"{url}\">QR code for this page</a></p>",
            url = escape_html(&qr_image_url(&targets.qr_output_name))
        )
    } else {
        format!(
            "<p><a href=\"/generate-qr/{}\">Generate a QR code for this page</a></p>",
            escape_html(&urlencoding::encode(&filename))
        )
    };

    let body = format!(
        "<h1>{name}</h1>\n\
         <p class=\"muted\">{kind} &middot; {size} &middot; <a href=\"{direct}\" download>download</a></p>\n\
         {embed}\n{qr}\n\
         <p><a href=\"/\">Back to the file list</a></p>\n",
        name = escape_html(&filename),
        kind = kind.label(),
        size = format_size_mb(metadata.len()),
        direct = direct,
        embed = embed,
        qr = qr_section,
    );

    Ok(page(&filename, &body).into_response())
}

/// GET /files/:filename - Stream a raw media file
pub async fn serve_file(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, MediaServerError> {
    validate_filename(&filename)?;
    stream_file(&state.media_root.join(&filename), &filename).await
}

/// GET /qrcodes/:filename - Stream a generated QR image
pub async fn serve_qr(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Response, MediaServerError> {
    validate_filename(&filename)?;
    stream_file(&state.qr_dir.join(&filename), &filename).await
}

/// GET /generate-qr/:filename - Generate one QR code on demand
pub async fn generate_qr(
    State(state): State<AppState>,
    UrlPath(filename): UrlPath<String>,
) -> Result<Json<GenerateQrResponse>, MediaServerError> {
    validate_filename(&filename)?;

    fs::create_dir_all(&state.qr_dir).await.map_err(|err| {
        MediaServerError::CreateDirFailed(format!("{}: {}", state.qr_dir.display(), err))
    })?;

    let targets = derive_targets(&filename, &state.base_host, &state.qr_dir)?;

    info!("Generating QR code for {}", filename);

    let encoder = state.encoder.clone();
    let options = state.config.render.clone();
    let path = targets.qr_output_path.clone();
    let payload = targets.media_url.clone();

    tokio::task::spawn_blocking(move || encoder.encode_to_file(&path, &payload, &options))
        .await
        .map_err(|err| {
            MediaServerError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                err.to_string(),
            ))
        })?
        .map_err(|err| MediaServerError::Encoding(err.to_string()))?;

    Ok(Json(GenerateQrResponse {
        success: true,
        message: format!("QR code generated for {}", filename),
        qr_url: qr_image_url(&targets.qr_output_name),
        media_url: targets.media_url,
    }))
}

/// GET /generate-all-qr - Regenerate QR codes for every served file
pub async fn generate_all_qr(
    State(state): State<AppState>,
) -> Result<Json<BatchReport>, MediaServerError> {
    let media_root = state.media_root.clone();
    let base_host = state.base_host.clone();
    let qr_dir = state.qr_dir.clone();
    let options = state.config.render.clone();
    let encoder = state.encoder.clone();

    let report = tokio::task::spawn_blocking(move || {
        batch::run(&media_root, &base_host, &qr_dir, &options, encoder.as_ref())
    })
    .await
    .map_err(|err| {
        MediaServerError::Io(std::io::Error::new(
            std::io::ErrorKind::Other,
            err.to_string(),
        ))
    })??;

    Ok(Json(report))
}
