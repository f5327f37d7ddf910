//! Reading and writing keypoint sequences on disk.
//!
//! A subject directory holds one JSON record per frame, named
//! `<prefix>_<frame number>.json`. Frame numbers may skip.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use super::record::FrameRecord;
use crate::error::{InputError, Result};

/// File prefix of raw estimator output
pub const RAW_PREFIX: &str = "frame";
/// File prefix of pre-smoothed records
pub const SMOOTH_PREFIX: &str = "smooth";

/// Parse the frame number out of `<prefix>_<digits>.<ext>`.
pub fn frame_number(file_name: &str, prefix: &str) -> Option<u32> {
    let rest = file_name.strip_prefix(prefix)?.strip_prefix('_')?;
    let digits = rest.split('.').next()?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// List subject directories under `root`, ordered by their numeric name
/// (non-numeric names sort last, alphabetically).
pub fn subject_dirs(root: &Path) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(InputError::DirectoryNotFound(root.to_path_buf()).into());
    }

    let mut dirs: Vec<PathBuf> = fs::read_dir(root)?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_dir())
        .collect();

    dirs.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        (name.parse::<u64>().unwrap_or(u64::MAX), name)
    });
    Ok(dirs)
}

/// Load every `<prefix>_<n>.json` record in `dir`, sorted by frame number.
pub fn load_sequence(dir: &Path, prefix: &str) -> Result<Vec<(u32, FrameRecord)>> {
    if !dir.is_dir() {
        return Err(InputError::DirectoryNotFound(dir.to_path_buf()).into());
    }

    let mut frames = Vec::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let Some(frame) = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| frame_number(n, prefix))
        else {
            continue;
        };
        if path.extension().and_then(|e| e.to_str()) != Some("json") {
            continue;
        }
        frames.push((frame, read_record(&path)?));
    }

    if frames.is_empty() {
        return Err(InputError::NoFrames(dir.to_path_buf()).into());
    }

    frames.sort_by_key(|(frame, _)| *frame);
    debug!("Loaded {} {} frames from {}", frames.len(), prefix, dir.display());
    Ok(frames)
}

pub fn read_record(path: &Path) -> Result<FrameRecord> {
    let contents = fs::read_to_string(path).map_err(|e| InputError::ReadFrame {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    serde_json::from_str(&contents).map_err(|e| {
        InputError::ParseFrame {
            path: path.to_path_buf(),
            message: e.to_string(),
        }
        .into()
    })
}

/// Write records as `<prefix>_<n:012>.json`, creating `dir` if needed.
pub fn write_sequence(dir: &Path, prefix: &str, frames: &[(u32, FrameRecord)]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (frame, record) in frames {
        let path = dir.join(format!("{}_{:012}.json", prefix, frame));
        write_json(&path, record)?;
    }
    debug!("Wrote {} {} frames to {}", frames.len(), prefix, dir.display());
    Ok(())
}

/// Pretty-print any serializable value to `path`.
pub fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<()> {
    let write_error = |message: String| InputError::Write {
        path: path.to_path_buf(),
        message,
    };
    let json = serde_json::to_string_pretty(value).map_err(|e| write_error(e.to_string()))?;
    fs::write(path, json).map_err(|e| write_error(e.to_string()))?;
    Ok(())
}
