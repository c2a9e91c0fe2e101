//! Candidate discovery: a one-shot sweep or a persistent filesystem watch.
//! Both policies apply the same media predicate and feed the controller the
//! same stream of paths.

use anyhow::Context;
use async_channel::Sender;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::path::{Path, PathBuf};
use tracing::{debug, error};

/// Media-type predicate shared by both discovery policies.
#[derive(Debug, Clone, Copy)]
pub struct MediaFilter {
    process_images: bool,
}

impl MediaFilter {
    pub fn new(process_images: bool) -> Self {
        Self { process_images }
    }

    /// Accepts paths whose guessed MIME type is `video/*` (or `image/*`
    /// when enabled). Dot-prefixed names are ignored.
    pub fn matches(&self, path: &Path) -> bool {
        let Some(name) = path.file_name().and_then(|name| name.to_str()) else {
            return false;
        };
        if name.starts_with('.') {
            return false;
        }
        let Some(mime) = mime_guess::from_path(path).first() else {
            return false;
        };

        mime.type_() == mime_guess::mime::VIDEO
            || (self.process_images && mime.type_() == mime_guess::mime::IMAGE)
    }
}

/// Lists the input directory once, returning the filtered candidate files
/// in deterministic order.
pub async fn sweep(input_dir: &Path, filter: MediaFilter) -> anyhow::Result<Vec<PathBuf>> {
    let mut entries = tokio::fs::read_dir(input_dir)
        .await
        .with_context(|| format!("failed to list input directory {input_dir:?}"))?;

    let mut candidates = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        let path = entry.path();
        if filter.matches(&path) {
            candidates.push(path);
        } else {
            debug!(?path, "Ignoring non-media entry");
        }
    }

    candidates.sort();
    Ok(candidates)
}

/// Subscribes to create events under the input directory and forwards each
/// filtered path into `tx`. The returned watcher must be kept alive for the
/// subscription to stay active.
pub fn watch(
    input_dir: &Path,
    filter: MediaFilter,
    tx: Sender<PathBuf>,
) -> anyhow::Result<RecommendedWatcher> {
    let mut watcher =
        notify::recommended_watcher(move |event: notify::Result<Event>| match event {
            Ok(event) => {
                if !matches!(event.kind, EventKind::Create(_)) {
                    return;
                }
                for path in event.paths {
                    if !filter.matches(&path) {
                        debug!(?path, "Ignoring non-media event");
                        continue;
                    }
                    // send_blocking fails only once the receiver is closed.
                    if tx.send_blocking(path).is_err() {
                        return;
                    }
                }
            }
            Err(error) => error!(%error, "Filesystem watch error"),
        })
        .context("failed to create filesystem watcher")?;

    watcher
        .watch(input_dir, RecursiveMode::NonRecursive)
        .with_context(|| format!("failed to watch input directory {input_dir:?}"))?;

    Ok(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filter_accepts_video_and_image_media() {
        let filter = MediaFilter::new(true);
        assert!(filter.matches(Path::new("/in/clip.mp4")));
        assert!(filter.matches(Path::new("/in/clip.mov")));
        assert!(filter.matches(Path::new("/in/photo.jpg")));
        assert!(!filter.matches(Path::new("/in/readme.txt")));
        assert!(!filter.matches(Path::new("/in/archive.tar.gz")));
    }

    #[test]
    fn filter_can_restrict_to_videos_only() {
        let filter = MediaFilter::new(false);
        assert!(filter.matches(Path::new("/in/clip.mp4")));
        assert!(!filter.matches(Path::new("/in/photo.jpg")));
    }

    #[test]
    fn filter_ignores_hidden_entries() {
        let filter = MediaFilter::new(true);
        assert!(!filter.matches(Path::new("/in/.clip.mp4")));
        assert!(!filter.matches(Path::new("/in/.DS_Store")));
    }

    #[tokio::test]
    async fn sweep_yields_only_media_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["photo.jpg", "clip.mp4", "readme.txt", ".hidden.mp4"] {
            std::fs::write(dir.path().join(name), b"x").unwrap();
        }
        std::fs::create_dir(dir.path().join("nested.mp4")).unwrap();

        let candidates = sweep(dir.path(), MediaFilter::new(true)).await.unwrap();
        let names: Vec<_> = candidates
            .iter()
            .map(|path| path.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["clip.mp4", "photo.jpg"]);
    }

    #[tokio::test]
    async fn sweep_of_missing_directory_errs() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope");
        assert!(sweep(&missing, MediaFilter::new(true)).await.is_err());
    }
}
