//! [`PatchRepo`]: the four git operations a replay performs.
//!
//! | Operation   | git command                               |
//! |-------------|-------------------------------------------|
//! | Apply       | `git apply --whitespace=nowarn <patch>`   |
//! | Stage       | `git add --all`                           |
//! | Commit      | `git commit --author .. --date .. -m ..`  |
//! | Push        | `git push <remote> <branch>`              |

use std::path::Path;

use crate::error::GitError;
use crate::types::{CommandOutput, CommitSpec};

/// The narrow set of repository operations a replay needs.
///
/// Implementations may be backed by the git CLI ([`GitCli`](crate::GitCli))
/// or a test double. Every method blocks until the operation finishes; a
/// non-zero exit from the backend is reported as an error, never as a
/// successful [`CommandOutput`].
///
/// # Object safety
///
/// The trait is object-safe; callers may hold a `&dyn PatchRepo`.
pub trait PatchRepo {
    /// Apply a patch file to the working tree without committing it.
    ///
    /// Whitespace warnings are suppressed. On failure the working tree is
    /// left as the backend leaves it.
    fn apply_patch(&self, patch: &Path) -> Result<CommandOutput, GitError>;

    /// Stage every change in the working tree.
    fn stage_all(&self) -> Result<CommandOutput, GitError>;

    /// Record a commit from the staged index.
    ///
    /// Both the author and the committer fields carry `spec.identity` and
    /// `spec.date`, so neither the operator's configured identity nor the
    /// wall-clock time leaks into the commit.
    fn commit(&self, spec: &CommitSpec) -> Result<CommandOutput, GitError>;

    /// Push `branch` to `remote`. No retry, no force.
    ///
    /// A rejected push is reported as [`GitError::PushFailed`].
    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutput, GitError>;
}
