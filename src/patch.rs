//! Patch collection, interleaving and selection.
//!
//! The two source directories are listed in file-name order, merged
//! frontend/backend alternately, and cut down to the configured share.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::config::SourcesConfig;
use crate::error::ReplayError;

/// A patch file on disk. The file name is the ordering key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct PatchFile {
    pub path: PathBuf,
    pub name: String,
}

impl PatchFile {
    pub fn new(path: PathBuf) -> Self {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self { path, name }
    }
}

/// List the files in `dir` whose extension is `extension`, sorted by name.
///
/// Only regular files (or symlinks to them) are returned; sub-directories
/// are not searched.
///
/// # Errors
/// [`ReplayError::Collect`] if the directory cannot be read.
pub fn collect(dir: &Path, extension: &str) -> Result<Vec<PatchFile>, ReplayError> {
    let extension = extension.trim_start_matches('.');
    let collect_err = |source| ReplayError::Collect {
        dir: dir.to_owned(),
        source,
    };

    let mut patches = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(collect_err)? {
        let path = entry.map_err(collect_err)?.path();
        if path.extension() == Some(OsStr::new(extension)) && path.is_file() {
            patches.push(PatchFile::new(path));
        }
    }
    patches.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(patches)
}

/// Merge two sequences alternately: `a[0], b[0], a[1], b[1], ...`, then
/// whatever is left of the longer one.
pub fn interleave<T>(a: Vec<T>, b: Vec<T>) -> Vec<T> {
    let mut out = Vec::with_capacity(a.len() + b.len());
    let mut a = a.into_iter();
    let mut b = b.into_iter();
    loop {
        match (a.next(), b.next()) {
            (None, None) => break,
            (x, y) => out.extend(x.into_iter().chain(y)),
        }
    }
    out
}

/// Clamp a percentage to 0-100. NaN becomes 0.
#[must_use]
pub fn clamp_percentage(percentage: f64) -> f64 {
    if percentage.is_nan() {
        0.0
    } else {
        percentage.clamp(0.0, 100.0)
    }
}

/// `max(1, floor(P'/100 × total))` with `P'` the clamped percentage, never
/// more than `total`. Returns 0 only when `total` is 0.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn selection_count(percentage: f64, total: usize) -> usize {
    if total == 0 {
        return 0;
    }
    let p = clamp_percentage(percentage);
    // Multiply first so whole percentages of whole counts stay exact.
    let count = (p * total as f64 / 100.0).floor() as usize;
    count.clamp(1, total)
}

/// Keep the first [`selection_count`] items, in order.
pub fn select<T>(mut patches: Vec<T>, percentage: f64) -> Vec<T> {
    let count = selection_count(percentage, patches.len());
    patches.truncate(count);
    patches
}

// ---------------------------------------------------------------------------
// PatchSet
// ---------------------------------------------------------------------------

/// The patches chosen for a run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PatchSet {
    /// Frontend patches found.
    pub frontend: usize,
    /// Backend patches found.
    pub backend: usize,
    /// Selected patches in commit order.
    pub selected: Vec<PatchFile>,
}

impl PatchSet {
    /// Collect both sources, interleave them and select `percentage` of the
    /// result.
    ///
    /// # Errors
    /// [`ReplayError::Collect`] for an unreadable directory,
    /// [`ReplayError::NoPatches`] if both are empty.
    pub fn gather(sources: &SourcesConfig, percentage: f64) -> Result<Self, ReplayError> {
        let frontend = collect(&sources.frontend, &sources.extension)?;
        let backend = collect(&sources.backend, &sources.extension)?;
        let (frontend_count, backend_count) = (frontend.len(), backend.len());
        tracing::debug!(
            frontend = frontend_count,
            backend = backend_count,
            "collected patches"
        );

        let all = interleave(frontend, backend);
        if all.is_empty() {
            return Err(ReplayError::NoPatches {
                dirs: vec![sources.frontend.clone(), sources.backend.clone()],
                extension: sources.extension.trim_start_matches('.').to_owned(),
            });
        }

        let selected = select(all, percentage);
        tracing::info!(
            available = frontend_count + backend_count,
            selected = selected.len(),
            percentage = clamp_percentage(percentage),
            "selected patches"
        );
        Ok(Self {
            frontend: frontend_count,
            backend: backend_count,
            selected,
        })
    }

    /// Total patches found across both sources.
    #[must_use]
    pub const fn available(&self) -> usize {
        self.frontend + self.backend
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
