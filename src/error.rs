//! Replay error types.
//!
//! Defines [`ReplayError`], the single error type of a replay run. Every
//! variant is fatal: the run stops at the first one, prints it, and exits
//! with status 1. Messages name the file or command that failed, carry git's
//! own diagnostic, and end with a short "To fix" hint.
//!
//! Nothing is rolled back when a run fails; the hints say so where it
//! matters.

use std::fmt;
use std::path::PathBuf;

use crate::message::MessageError;

// ---------------------------------------------------------------------------
// ReplayError
// ---------------------------------------------------------------------------

/// Unified error type for a replay run.
#[derive(Debug)]
pub enum ReplayError {
    /// `patchline.toml` could not be loaded or failed validation.
    Config(crate::config::ConfigError),

    /// A patch source directory could not be listed.
    Collect {
        /// The directory that was being read.
        dir: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Neither source directory contained a patch.
    NoPatches {
        /// The directories that were searched.
        dirs: Vec<PathBuf>,
        /// The extension that was searched for.
        extension: String,
    },

    /// `git apply` rejected a patch.
    PatchApply {
        /// The patch file.
        patch: PathBuf,
        /// git's diagnostic output.
        stderr: String,
    },

    /// The commit message could not be read from a patch header.
    MessageExtraction {
        /// The patch file.
        patch: PathBuf,
        /// What was wrong.
        detail: String,
    },

    /// `git add` failed after a patch applied.
    Stage {
        /// The patch whose changes were being staged.
        patch: PathBuf,
        /// git's diagnostic output.
        stderr: String,
    },

    /// `git commit` failed.
    Commit {
        /// The patch whose changes were being committed.
        patch: PathBuf,
        /// git's diagnostic output.
        stderr: String,
    },

    /// The final push was rejected.
    Push {
        /// The remote name.
        remote: String,
        /// The branch that was pushed.
        branch: String,
        /// git's diagnostic output.
        stderr: String,
    },

    /// Progress output could not be written.
    Io(std::io::Error),
}

impl ReplayError {
    /// Process exit code for this error. Every failure exits with 1.
    #[must_use]
    pub const fn exit_code(&self) -> u8 {
        1
    }

    pub(crate) fn message_extraction(patch: PathBuf, err: &MessageError) -> Self {
        Self::MessageExtraction {
            patch,
            detail: err.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Display
// ---------------------------------------------------------------------------

fn stderr_block(f: &mut fmt::Formatter<'_>, stderr: &str) -> fmt::Result {
    if !stderr.is_empty() {
        write!(f, "\n  Error message:")?;
        for line in stderr.lines() {
            write!(f, "\n    {line}")?;
        }
    }
    Ok(())
}

impl fmt::Display for ReplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(err) => {
                write!(
                    f,
                    "{err}\n  To fix: edit the config file and correct the issue, then run `patchline check`."
                )
            }
            Self::Collect { dir, source } => {
                write!(
                    f,
                    "could not read patch directory '{}': {source}\n  To fix: check the path in [sources] and its permissions.",
                    dir.display()
                )
            }
            Self::NoPatches { dirs, extension } => {
                write!(f, "no .{extension} files found in the specified directories:")?;
                for d in dirs {
                    write!(f, "\n  - {}", d.display())?;
                }
                write!(
                    f,
                    "\n  To fix: generate patches (e.g. `git format-patch`) into these directories, or fix [sources]."
                )
            }
            Self::PatchApply { patch, stderr } => {
                write!(f, "failed to apply patch: {}", patch.display())?;
                stderr_block(f, stderr)?;
                write!(
                    f,
                    "\n  To fix: the working tree may be partially modified; restore it (e.g. `git reset --hard`) before re-running."
                )
            }
            Self::MessageExtraction { patch, detail } => {
                write!(
                    f,
                    "failed to extract commit message from patch: {}\n  Error: {detail}\n  To fix: the patch is already applied but not committed; restore the working tree before re-running.",
                    patch.display()
                )
            }
            Self::Stage { patch, stderr } => {
                write!(f, "failed to stage changes from patch: {}", patch.display())?;
                stderr_block(f, stderr)?;
                write!(f, "\n  To fix: check `git status` in the target repository.")
            }
            Self::Commit { patch, stderr } => {
                write!(f, "failed to commit changes from patch: {}", patch.display())?;
                stderr_block(f, stderr)?;
                write!(
                    f,
                    "\n  To fix: check hooks and `git status` in the target repository; earlier commits are kept."
                )
            }
            Self::Push {
                remote,
                branch,
                stderr,
            } => {
                write!(f, "failed to push '{branch}' to '{remote}'")?;
                stderr_block(f, stderr)?;
                write!(
                    f,
                    "\n  To fix: all commits exist locally; resolve the rejection and push manually:\n    git push {remote} {branch}"
                )
            }
            Self::Io(err) => {
                write!(f, "I/O error: {err}")
            }
        }
    }
}

// ---------------------------------------------------------------------------
// std::error::Error
// ---------------------------------------------------------------------------

impl std::error::Error for ReplayError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(err) => Some(err),
            Self::Collect { source, .. } => Some(source),
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls
// ---------------------------------------------------------------------------

impl From<std::io::Error> for ReplayError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<crate::config::ConfigError> for ReplayError {
    fn from(err: crate::config::ConfigError) -> Self {
        Self::Config(err)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;

    #[test]
    fn display_no_patches_lists_dirs() {
        let err = ReplayError::NoPatches {
            dirs: vec![PathBuf::from("/p/front"), PathBuf::from("/p/back")],
            extension: "patch".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("no .patch files"));
        assert!(msg.contains("/p/front"));
        assert!(msg.contains("/p/back"));
        assert!(msg.contains("To fix"));
    }

    #[test]
    fn display_patch_apply_includes_git_output() {
        let err = ReplayError::PatchApply {
            patch: PathBuf::from("0002-add-login.patch"),
            stderr: "error: patch failed: app.js:3\nerror: app.js: patch does not apply".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to apply patch: 0002-add-login.patch"));
        assert!(msg.contains("    error: patch failed: app.js:3"));
        assert!(msg.contains("    error: app.js: patch does not apply"));
        assert!(msg.contains("git reset --hard"));
    }

    #[test]
    fn display_commit_without_stderr_has_no_error_block() {
        let err = ReplayError::Commit {
            patch: PathBuf::from("x.patch"),
            stderr: String::new(),
        };
        let msg = err.to_string();
        assert!(!msg.contains("Error message"));
        assert!(msg.contains("earlier commits are kept"));
    }

    #[test]
    fn display_push_suggests_manual_push() {
        let err = ReplayError::Push {
            remote: "origin".to_owned(),
            branch: "main".to_owned(),
            stderr: "! [rejected] main -> main (fetch first)".to_owned(),
        };
        let msg = err.to_string();
        assert!(msg.contains("failed to push 'main' to 'origin'"));
        assert!(msg.contains("[rejected]"));
        assert!(msg.contains("git push origin main"));
    }

    #[test]
    fn display_message_extraction() {
        let err = ReplayError::message_extraction(
            PathBuf::from("0003.patch"),
            &MessageError::MissingSubject,
        );
        let msg = err.to_string();
        assert!(msg.contains("0003.patch"));
        assert!(msg.contains("Subject"));
    }

    #[test]
    fn config_error_converts_and_keeps_source() {
        let err: ReplayError = ConfigError {
            path: Some(PathBuf::from("patchline.toml")),
            message: "line 3: unknown field `x`".to_owned(),
        }
        .into();
        assert!(err.to_string().starts_with("patchline.toml: line 3"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn every_error_exits_with_one() {
        let errs = [
            ReplayError::NoPatches {
                dirs: vec![],
                extension: "patch".into(),
            },
            ReplayError::Push {
                remote: "origin".into(),
                branch: "main".into(),
                stderr: String::new(),
            },
            ReplayError::Io(std::io::Error::other("closed")),
        ];
        for err in &errs {
            assert_eq!(err.exit_code(), 1);
        }
    }
}
