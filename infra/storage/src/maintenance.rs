use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

pub(crate) const TMP_MARKER: &str = ".svtmp.";

/// Temp files younger than this may belong to a write still in flight.
const STALE_AFTER: Duration = Duration::from_secs(300);

/// Removes orphaned temp files left by interrupted atomic writes. Returns how many went away.
pub(crate) async fn purge_tmp(root: &Path) -> usize {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || sweep(&root, now, STALE_AFTER)).await {
        Ok((removed, failed)) => {
            if removed > 0 || failed > 0 {
                info!(removed, failed, "Cleaned up temporary files");
            }
            removed
        }
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
            0
        }
    }
}

fn sweep(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    for entry in WalkDir::new(root).into_iter().flatten() {
        if !is_tmp(&entry) || !is_stale(&entry, now, threshold) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => removed += 1,
            Err(e) => {
                warn!(path = %entry.path().display(), error = %e, "Failed to remove temp file");
                failed += 1;
            }
        }
    }

    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file()
        && entry.file_name().to_str().is_some_and(|name| name.contains(TMP_MARKER))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn sweep_only_touches_stale_temp_files() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("n1").join("records");
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join("abc.svtmp.1"), b"half").unwrap();
        std::fs::write(dir.join("abc"), b"whole").unwrap();

        let (fresh, _) = sweep(tmp.path(), SystemTime::now(), STALE_AFTER);
        assert_eq!(fresh, 0, "young temp files may still be in flight");

        let later = SystemTime::now() + STALE_AFTER + Duration::from_secs(1);
        let (removed, failed) = sweep(tmp.path(), later, STALE_AFTER);
        assert_eq!((removed, failed), (1, 0));
        assert!(dir.join("abc").exists());
        assert!(!dir.join("abc.svtmp.1").exists());
    }
}
