//! Filesystem discovery of task groups and image assets.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::ledger::LedgerFormat;

use super::error::ScanError;
use super::types::{Asset, AssetIndex, TaskGroup};

/// Image extensions recognized as assets (lowercase).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// Separator between the sequence number and the rest of an image filename.
pub const SEQUENCE_DELIMITER: char = '_';

/// Checks that `root` is an existing directory.
pub fn check_root(root: &Path) -> Result<(), ScanError> {
    if root.as_os_str().is_empty() {
        return Err(ScanError::RootNotConfigured);
    }
    if !root.exists() {
        return Err(ScanError::RootNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(ScanError::RootNotDirectory {
            path: root.to_path_buf(),
        });
    }
    Ok(())
}

/// Discovers task groups: direct subdirectories of `root` holding a ledger.
///
/// Groups come back sorted by directory name. A missing or unreadable root
/// is logged and yields no groups.
pub fn discover_groups(root: &Path) -> Vec<TaskGroup> {
    if let Err(e) = check_root(root) {
        error!("Cannot scan for task groups: {}", e);
        return Vec::new();
    }

    let entries = match fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to read root directory {}: {}", root.display(), e);
            return Vec::new();
        }
    };

    let mut dirs: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();

    let mut groups = Vec::new();
    for dir in dirs {
        let Some(ledger_path) = find_ledger(&dir) else {
            debug!("Skipping {}: no ledger file", dir.display());
            continue;
        };
        let Some(ledger_format) = LedgerFormat::from_path(&ledger_path) else {
            continue;
        };

        let name = dir
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| dir.display().to_string());

        let assets = AssetIndex::new(list_assets(&dir));
        assets.warn_duplicates(&name);

        groups.push(TaskGroup {
            name,
            directory: dir,
            ledger_path,
            ledger_format,
            assets,
        });
    }

    info!("Found {} task groups under {}", groups.len(), root.display());
    groups
}

/// Finds the ledger file of a group directory.
///
/// When several candidates exist, the lexicographically first filename wins
/// and the others are reported.
pub fn find_ledger(dir: &Path) -> Option<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            warn!("Failed to read group directory {}: {}", dir.display(), e);
            return None;
        }
    };

    let mut candidates: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && is_ledger_candidate(path))
        .collect();
    candidates.sort();

    let mut candidates = candidates.into_iter();
    let chosen = candidates.next()?;
    let ignored: Vec<String> = candidates
        .map(|p| p.file_name().unwrap_or_default().to_string_lossy().into_owned())
        .collect();
    if !ignored.is_empty() {
        warn!(
            "Multiple ledgers in {}, using {} and ignoring {}",
            dir.display(),
            chosen.display(),
            ignored.join(", ")
        );
    }
    Some(chosen)
}

fn is_ledger_candidate(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    // Hidden files, our own temp files and Office lock files
    if name.starts_with('.') || name.starts_with("~$") {
        return false;
    }
    LedgerFormat::from_path(path).is_some()
}

/// Lists the images of a directory that carry a parseable sequence number.
///
/// Files whose leading token is not an integer are skipped with a warning.
/// The result is sorted ascending by sequence number.
pub fn list_assets(dir: &Path) -> Vec<Asset> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!("Failed to list images in {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut assets = Vec::new();
    for path in entries.filter_map(|entry| entry.ok()).map(|entry| entry.path()) {
        if !path.is_file() || !is_image(&path) {
            continue;
        }
        let Some(file_name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        match parse_sequence(file_name) {
            Some(sequence) => assets.push(Asset { sequence, path }),
            None => warn!("Image filename has no sequence number, skipping: {}", file_name),
        }
    }

    assets.sort_by(|a, b| a.sequence.cmp(&b.sequence).then_with(|| a.path.cmp(&b.path)));
    info!("Found {} images in {}", assets.len(), dir.display());
    assets
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

/// Parses the leading sequence number of an image filename.
///
/// `"7_sunset.jpg"` yields `Some(7)`; `"abc.jpg"` and `"7.jpg"` yield `None`
/// because the token before the first `_` must be a bare integer.
pub fn parse_sequence(file_name: &str) -> Option<u32> {
    file_name
        .split(SEQUENCE_DELIMITER)
        .next()
        .and_then(|token| token.trim().parse::<u32>().ok())
}
