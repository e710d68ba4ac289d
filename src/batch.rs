use std::path::Path;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::MediaServerError;
use crate::media::MediaKind;
use crate::qr::{QrEncoder, RenderOptions};
use crate::targets::derive_targets;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum GenerationStatus {
    Success,
    Error,
}

/// Outcome of one file's classify/derive/encode sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenerationResult {
    pub file: String,
    pub status: GenerationStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kind: Option<MediaKind>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qr_code: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Ordered per-file outcomes of a full generation run.
///
/// Counts are computed from the finished result sequence, so the report is a
/// pure function of the results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchReport {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub results: Vec<GenerationResult>,
}

impl BatchReport {
    pub fn from_results(results: Vec<GenerationResult>) -> Self {
        let succeeded = results
            .iter()
            .filter(|r| r.status == GenerationStatus::Success)
            .count();
        let failed = results.len() - succeeded;
        Self {
            total: results.len(),
            succeeded,
            failed,
            results,
        }
    }
}

/// Generate one QR code per directory entry, reporting in the order received.
///
/// Entries named like the output directory are skipped so a nested output
/// directory never regenerates itself. A per-file failure is recorded and the
/// batch keeps going; nothing here aborts it.
pub fn generate_all(
    entries: &[String],
    base_host: &str,
    output_dir: &Path,
    options: &RenderOptions,
    encoder: &dyn QrEncoder,
) -> BatchReport {
    let output_name = output_dir.file_name().map(|n| n.to_string_lossy());

    let results = entries
        .iter()
        .filter(|entry| match &output_name {
            Some(name) => entry.as_str() != name.as_ref(),
            None => true,
        })
        .map(|entry| process_entry(entry, base_host, output_dir, options, encoder))
        .collect();

    BatchReport::from_results(results)
}

fn process_entry(
    file: &str,
    base_host: &str,
    output_dir: &Path,
    options: &RenderOptions,
    encoder: &dyn QrEncoder,
) -> GenerationResult {
    let kind = MediaKind::classify(file);

    let targets = match derive_targets(file, base_host, output_dir) {
        Ok(targets) => targets,
        Err(err) => {
            warn!("Skipping {:?}: {}", file, err);
            return failure(file, err.to_string());
        }
    };

    debug!(
        "Generating QR code for {} [{}] -> {}",
        file,
        kind.label(),
        targets.media_url
    );

    match encoder.encode_to_file(&targets.qr_output_path, &targets.media_url, options) {
        Ok(()) => {
            info!("QR code saved: {}", targets.qr_output_name);
            GenerationResult {
                file: file.to_string(),
                status: GenerationStatus::Success,
                kind: Some(kind),
                qr_code: Some(targets.qr_output_name),
                url: Some(targets.media_url),
                error: None,
            }
        }
        Err(err) => {
            warn!("QR generation failed for {}: {}", file, err);
            failure(file, err.to_string())
        }
    }
}

fn failure(file: &str, error: String) -> GenerationResult {
    GenerationResult {
        file: file.to_string(),
        status: GenerationStatus::Error,
        kind: None,
        qr_code: None,
        url: None,
        error: Some(error),
    }
}

/// List the media directory (non-recursive, all entry types), sorted by name
/// so repeat runs over an unchanged directory produce identical reports.
pub fn list_media_entries(media_root: &Path) -> Result<Vec<String>, MediaServerError> {
    let dir = std::fs::read_dir(media_root).map_err(|err| {
        MediaServerError::DirectoryUnreadable(format!("{}: {}", media_root.display(), err))
    })?;

    let mut entries = Vec::new();
    for entry in dir {
        let entry = entry.map_err(|err| {
            MediaServerError::DirectoryUnreadable(format!("{}: {}", media_root.display(), err))
        })?;
        entries.push(entry.file_name().to_string_lossy().into_owned());
    }
    entries.sort();
    Ok(entries)
}

/// Run a full batch: list the media directory, make sure the output directory
/// exists, generate every code.
///
/// An unlistable media directory or an uncreatable output directory fails the
/// whole run; everything past that point is recovered per file.
pub fn run(
    media_root: &Path,
    base_host: &str,
    output_dir: &Path,
    options: &RenderOptions,
    encoder: &dyn QrEncoder,
) -> Result<BatchReport, MediaServerError> {
    let entries = list_media_entries(media_root)?;

    std::fs::create_dir_all(output_dir).map_err(|err| {
        MediaServerError::CreateDirFailed(format!("{}: {}", output_dir.display(), err))
    })?;

    let report = generate_all(&entries, base_host, output_dir, options, encoder);
    info!(
        "Batch complete: {} total, {} succeeded, {} failed",
        report.total, report.succeeded, report.failed
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::qr::EncodeError;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::TempDir;

    /// Encoder double that records calls and fails on demand.
    struct FakeEncoder {
        fail_for: Option<String>,
        calls: Mutex<Vec<(PathBuf, String)>>,
    }

    impl FakeEncoder {
        fn new() -> Self {
            Self {
                fail_for: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        fn failing_for(file_stem: &str) -> Self {
            Self {
                fail_for: Some(format!("{}.png", file_stem)),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(PathBuf, String)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl QrEncoder for FakeEncoder {
        fn encode_to_file(
            &self,
            path: &Path,
            payload: &str,
            _options: &RenderOptions,
        ) -> Result<(), EncodeError> {
            if let Some(fail_for) = &self.fail_for {
                if path.file_name().map(|n| n.to_string_lossy() == *fail_for) == Some(true) {
                    return Err(EncodeError::Qr(qrcode::types::QrError::DataTooLong));
                }
            }
            self.calls
                .lock()
                .unwrap()
                .push((path.to_path_buf(), payload.to_string()));
            Ok(())
        }
    }

    fn names(entries: &[&str]) -> Vec<String> {
        entries.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_directory_produces_empty_report() {
        let encoder = FakeEncoder::new();
        let report = generate_all(
            &[],
            "http://h",
            Path::new("/out"),
            &RenderOptions::default(),
            &encoder,
        );

        assert_eq!(report.total, 0);
        assert_eq!(report.succeeded, 0);
        assert_eq!(report.failed, 0);
        assert!(report.results.is_empty());
        assert!(encoder.calls().is_empty());
    }

    #[test]
    fn test_results_keep_listing_order() {
        let encoder = FakeEncoder::new();
        let entries = names(&["b.mp4", "a.pdf", "c.jpg"]);
        let report = generate_all(
            &entries,
            "http://h",
            Path::new("/out"),
            &RenderOptions::default(),
            &encoder,
        );

        let files: Vec<&str> = report.results.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, vec!["b.mp4", "a.pdf", "c.jpg"]);
    }

    #[test]
    fn test_success_result_carries_kind_and_urls() {
        let encoder = FakeEncoder::new();
        let report = generate_all(
            &names(&["a b.mp4"]),
            "http://h",
            Path::new("/out"),
            &RenderOptions::default(),
            &encoder,
        );

        let result = &report.results[0];
        assert_eq!(result.status, GenerationStatus::Success);
        assert_eq!(result.kind, Some(MediaKind::Video));
        assert_eq!(result.qr_code.as_deref(), Some("a b.png"));
        assert_eq!(result.url.as_deref(), Some("http://h/media/a%20b.mp4"));
        assert!(result.error.is_none());

        let calls = encoder.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, PathBuf::from("/out/a b.png"));
        assert_eq!(calls[0].1, "http://h/media/a%20b.mp4");
    }

    #[test]
    fn test_single_failure_never_aborts_the_batch() {
        let encoder = FakeEncoder::failing_for("bad");
        let entries = names(&["a.mp4", "bad.pdf", "c.jpg"]);
        let report = generate_all(
            &entries,
            "http://h",
            Path::new("/out"),
            &RenderOptions::default(),
            &encoder,
        );

        assert_eq!(report.total, 3);
        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, 1);

        let failed = &report.results[1];
        assert_eq!(failed.file, "bad.pdf");
        assert_eq!(failed.status, GenerationStatus::Error);
        assert!(failed.error.is_some());
        assert!(failed.qr_code.is_none());
    }

    #[test]
    fn test_output_directory_entry_is_excluded() {
        let encoder = FakeEncoder::new();
        let entries = names(&["a.mp4", "qrcodes", "b.jpg"]);
        let report = generate_all(
            &entries,
            "http://h",
            Path::new("/srv/qrcodes"),
            &RenderOptions::default(),
            &encoder,
        );

        assert_eq!(report.total, 2);
        assert!(report.results.iter().all(|r| r.file != "qrcodes"));
    }

    #[test]
    fn test_stem_collision_yields_two_successes_one_path() {
        let encoder = FakeEncoder::new();
        let entries = names(&["a.jpg", "a.png"]);
        let report = generate_all(
            &entries,
            "http://h",
            Path::new("/out"),
            &RenderOptions::default(),
            &encoder,
        );

        assert_eq!(report.succeeded, 2);
        let calls = encoder.calls();
        assert_eq!(calls.len(), 2);
        // Both encodes target the same file; the second payload wins on disk
        assert_eq!(calls[0].0, calls[1].0);
        assert_ne!(calls[0].1, calls[1].1);
    }

    #[test]
    fn test_run_lists_sorted_and_creates_output_dir() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("b.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("a.pdf"), b"x").unwrap();

        let output_dir = dir.path().join("qrcodes");
        let encoder = FakeEncoder::new();
        let report = run(
            dir.path(),
            "http://h",
            &output_dir,
            &RenderOptions::default(),
            &encoder,
        )
        .unwrap();

        assert!(output_dir.is_dir());
        let files: Vec<&str> = report.results.iter().map(|r| r.file.as_str()).collect();
        assert_eq!(files, vec!["a.pdf", "b.mp4"]);
    }

    #[test]
    fn test_run_is_idempotent_on_unchanged_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();
        std::fs::write(dir.path().join("b.jpg"), b"x").unwrap();

        let output_dir = dir.path().join("qrcodes");
        let encoder = FakeEncoder::new();
        let options = RenderOptions::default();

        let first = run(dir.path(), "http://h", &output_dir, &options, &encoder).unwrap();
        let second = run(dir.path(), "http://h", &output_dir, &options, &encoder).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_run_excludes_nested_output_directory() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.mp4"), b"x").unwrap();

        // Output directory nested inside the scanned directory
        let output_dir = dir.path().join("qrcodes");
        std::fs::create_dir(&output_dir).unwrap();

        let encoder = FakeEncoder::new();
        let report = run(
            dir.path(),
            "http://h",
            &output_dir,
            &RenderOptions::default(),
            &encoder,
        )
        .unwrap();

        assert_eq!(report.total, 1);
        assert_eq!(report.results[0].file, "a.mp4");
    }

    #[test]
    fn test_run_fails_when_directory_unreadable() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let encoder = FakeEncoder::new();
        let err = run(
            &missing,
            "http://h",
            &dir.path().join("qrcodes"),
            &RenderOptions::default(),
            &encoder,
        )
        .unwrap_err();

        assert!(matches!(err, MediaServerError::DirectoryUnreadable(_)));
        assert!(encoder.calls().is_empty());
    }
}
