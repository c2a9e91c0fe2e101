use crate::engine::OutputFormat;
use std::path::{Path, PathBuf};

/// How output file names are derived from the source file name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamingPolicy {
    /// `<stem>_processed.mp4`, written as a fragmented MP4 regardless of the
    /// source container.
    ProcessedMp4,
    /// Source file name kept as-is; the container follows the extension.
    PreserveExtension,
}

impl NamingPolicy {
    pub fn output_file_name(&self, source: &Path) -> Option<String> {
        match self {
            NamingPolicy::ProcessedMp4 => {
                let stem = source.file_stem()?.to_str()?;
                Some(format!("{stem}_processed.mp4"))
            }
            NamingPolicy::PreserveExtension => {
                Some(source.file_name()?.to_str()?.to_string())
            }
        }
    }

    pub fn output_format(&self) -> OutputFormat {
        match self {
            NamingPolicy::ProcessedMp4 => OutputFormat::FragmentedMp4,
            NamingPolicy::PreserveExtension => OutputFormat::MatchExtension,
        }
    }
}

/// One discovered media file together with its derived output location.
/// Immutable once created; dropped when the controller finishes with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaTask {
    pub source_path: PathBuf,
    pub output_path: PathBuf,
}

impl MediaTask {
    /// Returns `None` when the source path has no usable file name.
    pub fn new(source: PathBuf, output_dir: &Path, naming: NamingPolicy) -> Option<Self> {
        let file_name = naming.output_file_name(&source)?;
        let output_path = output_dir.join(file_name);
        Some(Self { source_path: source, output_path })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mp4_policy_appends_processed_suffix() {
        let task = MediaTask::new(
            PathBuf::from("/in/clip.mov"),
            Path::new("/out"),
            NamingPolicy::ProcessedMp4,
        )
        .unwrap();
        assert_eq!(task.output_path, PathBuf::from("/out/clip_processed.mp4"));
    }

    #[test]
    fn preserve_policy_keeps_the_source_name() {
        let task = MediaTask::new(
            PathBuf::from("/in/clip.mov"),
            Path::new("/out"),
            NamingPolicy::PreserveExtension,
        )
        .unwrap();
        assert_eq!(task.output_path, PathBuf::from("/out/clip.mov"));
    }

    #[test]
    fn extensionless_sources_still_get_a_name() {
        let mp4 = NamingPolicy::ProcessedMp4.output_file_name(Path::new("/in/clip"));
        assert_eq!(mp4.as_deref(), Some("clip_processed.mp4"));

        let preserved = NamingPolicy::PreserveExtension.output_file_name(Path::new("/in/clip"));
        assert_eq!(preserved.as_deref(), Some("clip"));
    }

    #[test]
    fn pathless_source_yields_no_task() {
        assert!(MediaTask::new(PathBuf::from("/"), Path::new("/out"), NamingPolicy::ProcessedMp4).is_none());
    }

    #[test]
    fn policies_map_to_output_formats() {
        assert_eq!(NamingPolicy::ProcessedMp4.output_format(), OutputFormat::FragmentedMp4);
        assert_eq!(
            NamingPolicy::PreserveExtension.output_format(),
            OutputFormat::MatchExtension
        );
    }
}
