use std::path::{Path, PathBuf};

use serde::Serialize;
use snafu::{ResultExt, Snafu};

/// Writes `value` as pretty JSON next to `path`, then renames it into place.
///
/// Readers see either the old file or the new one, never a partial write.
pub fn write_json_atomically<T>(path: &Path, value: &T) -> Result<(), AtomicWriteError>
where
    T: Serialize + ?Sized,
{
    if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).context(CreateDirSnafu {
            stage: "create-parent-directory",
            path: parent.to_path_buf(),
        })?;
    }

    let content = serde_json::to_string_pretty(value).context(SerializeSnafu {
        stage: "serialize-json",
    })?;

    let temp_path = path.with_extension("json.tmp");
    std::fs::write(&temp_path, content).context(WriteFileSnafu {
        stage: "write-temporary-file",
        path: temp_path.clone(),
    })?;

    std::fs::rename(&temp_path, path).context(RenameTempFileSnafu {
        stage: "rename-temporary-file",
        from: temp_path,
        to: path.to_path_buf(),
    })?;

    Ok(())
}

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum AtomicWriteError {
    #[snafu(display("failed to create directory {path:?} on `{stage}`: {source}"))]
    CreateDir {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to serialize json on `{stage}`: {source}"))]
    Serialize {
        stage: &'static str,
        source: serde_json::Error,
    },
    #[snafu(display("failed to write {path:?} on `{stage}`: {source}"))]
    WriteFile {
        stage: &'static str,
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("failed to replace {to:?} with {from:?} on `{stage}`: {source}"))]
    RenameTempFile {
        stage: &'static str,
        from: PathBuf,
        to: PathBuf,
        source: std::io::Error,
    },
}
