use super::audio_service::AudioError;
use std::path::{Path, PathBuf};

const SOUND_EXTENSIONS: &[&str] = &["mp3", "wav", "ogg", "flac"];

/// Sound effects are plain files in one directory; the file stem is the name
/// users type (`airhorn.mp3` plays with `/sfx play airhorn`).
pub struct SoundLibrary {
    root: PathBuf,
}

impl SoundLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Sorted sound names. A missing directory is an empty library.
    pub async fn list(&self) -> Result<Vec<String>, AudioError> {
        let mut names = Vec::new();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(names),
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            if is_sound_file(&path) {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    names.push(stem.to_string());
                }
            }
        }

        names.sort();
        names.dedup();
        Ok(names)
    }

    /// Path for a sound name. Names are matched case-insensitively and may not
    /// contain path separators.
    pub async fn resolve(&self, name: &str) -> Result<PathBuf, AudioError> {
        let name = name.trim();
        if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
            return Err(AudioError::UnknownSound(name.to_string()));
        }

        let wanted = name.to_lowercase();
        let mut dir = match tokio::fs::read_dir(&self.root).await {
            Ok(dir) => dir,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(AudioError::UnknownSound(name.to_string()))
            }
            Err(e) => return Err(e.into()),
        };

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let matches = path
                .file_stem()
                .and_then(|s| s.to_str())
                .is_some_and(|stem| stem.to_lowercase() == wanted);
            if matches && is_sound_file(&path) {
                return Ok(path);
            }
        }

        Err(AudioError::UnknownSound(name.to_string()))
    }
}

fn is_sound_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SOUND_EXTENSIONS.contains(&e.to_lowercase().as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn library_with(files: &[&str]) -> (tempfile::TempDir, SoundLibrary) {
        let dir = tempfile::tempdir().unwrap();
        for file in files {
            std::fs::write(dir.path().join(file), b"fake audio").unwrap();
        }
        let library = SoundLibrary::new(dir.path());
        (dir, library)
    }

    #[tokio::test]
    async fn test_list_only_sounds() {
        let (_dir, library) = library_with(&["airhorn.mp3", "bruh.ogg", "notes.txt"]);
        assert_eq!(library.list().await.unwrap(), vec!["airhorn", "bruh"]);
    }

    #[tokio::test]
    async fn test_resolve_case_insensitive() {
        let (_dir, library) = library_with(&["AirHorn.mp3"]);
        let path = library.resolve("airhorn").await.unwrap();
        assert!(path.ends_with("AirHorn.mp3"));
    }

    #[tokio::test]
    async fn test_resolve_rejects_traversal() {
        let (_dir, library) = library_with(&["airhorn.mp3"]);
        assert!(matches!(
            library.resolve("../secrets").await,
            Err(AudioError::UnknownSound(_))
        ));
        assert!(library.resolve("missing").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_directory_is_empty() {
        let library = SoundLibrary::new("/definitely/not/here");
        assert!(library.list().await.unwrap().is_empty());
    }
}
