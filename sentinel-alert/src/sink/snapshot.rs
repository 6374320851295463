//! Alert snapshot writer

use crate::dispatch::NotificationJob;
use crate::sink::NotificationSink;
use sentinel_core::{AlertEvent, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{error, info};

/// Ensure the snapshot folder exists, falling back to the current directory
/// if it cannot be created.
pub fn resolve_snapshot_dir(requested: &Path) -> PathBuf {
    match std::fs::create_dir_all(requested) {
        Ok(()) => requested.to_path_buf(),
        Err(e) => {
            error!(
                dir = %requested.display(),
                error = %e,
                "failed to create snapshot folder, falling back to current directory"
            );
            PathBuf::from(".")
        }
    }
}

/// Snapshot file name for an alert: `alert_<yyyymmdd_hhmmss>_<class>.jpg`.
pub fn snapshot_filename(event: &AlertEvent) -> String {
    format!(
        "alert_{}_{}.jpg",
        event.raised_at.format("%Y%m%d_%H%M%S"),
        event.class
    )
}

/// Writes the annotated frame of each alert as a JPEG. The target path
/// travels on the event itself (`AlertEvent::snapshot`), so the log record
/// and the file on disk always agree.
pub struct SnapshotSink;

impl SnapshotSink {
    pub fn new() -> Self {
        Self
    }
}

impl Default for SnapshotSink {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationSink for SnapshotSink {
    fn name(&self) -> &'static str {
        "snapshot"
    }

    fn notify(&self, job: &NotificationJob) -> Result<()> {
        let (path, image) = match (&job.event.snapshot, &job.image) {
            (Some(path), Some(image)) => (path, image),
            // No snapshot requested or no frame travelled with the event.
            _ => return Ok(()),
        };

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| Error::Sink(format!("snapshot folder: {e}")))?;
            }
        }

        image
            .save(path)
            .map_err(|e| Error::Sink(format!("saving {}: {e}", path.display())))?;
        info!(path = %path.display(), "snapshot saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::RgbImage;
    use sentinel_core::WeaponClass;

    #[test]
    fn test_snapshot_written_to_event_path() {
        let dir = tempfile::tempdir().unwrap();
        let mut event = AlertEvent::new(WeaponClass::Pistol, 0.95);
        let path = dir.path().join(snapshot_filename(&event));
        event.snapshot = Some(path.clone());

        let sink = SnapshotSink::new();
        sink.notify(&NotificationJob {
            event,
            image: Some(RgbImage::new(32, 32)),
        })
        .unwrap();

        assert!(path.exists());
        assert!(path.file_name().unwrap().to_str().unwrap().contains("pistol"));
    }

    #[test]
    fn test_missing_image_is_a_no_op() {
        let dir = tempfile::tempdir().unwrap();
        let mut event = AlertEvent::new(WeaponClass::Knife, 0.9);
        let path = dir.path().join(snapshot_filename(&event));
        event.snapshot = Some(path.clone());

        SnapshotSink::new()
            .notify(&NotificationJob { event, image: None })
            .unwrap();
        assert!(!path.exists());
    }

    #[test]
    fn test_unwritable_target_is_a_sink_error() {
        let mut event = AlertEvent::new(WeaponClass::Knife, 0.9);
        event.snapshot = Some(PathBuf::from("/proc/no-such-dir/alert.jpg"));

        let err = SnapshotSink::new()
            .notify(&NotificationJob {
                event,
                image: Some(RgbImage::new(8, 8)),
            })
            .unwrap_err();
        assert!(matches!(err, Error::Sink(_)));
    }

    #[test]
    fn test_resolve_dir_creates_missing_folder() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("nested").join("alerts");
        let resolved = resolve_snapshot_dir(&target);
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }

    #[test]
    fn test_resolve_dir_falls_back_on_failure() {
        let resolved = resolve_snapshot_dir(Path::new("/proc/cannot/create/here"));
        assert_eq!(resolved, PathBuf::from("."));
    }
}
