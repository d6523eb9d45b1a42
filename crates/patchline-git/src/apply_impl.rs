//! Working-tree operations: apply a patch, stage everything.

use std::ffi::OsStr;
use std::path::Path;

use crate::cli_repo::GitCli;
use crate::error::GitError;
use crate::types::CommandOutput;

pub fn apply_patch(repo: &GitCli, patch: &Path) -> Result<CommandOutput, GitError> {
    repo.run(
        [
            OsStr::new("apply"),
            OsStr::new("--whitespace=nowarn"),
            patch.as_os_str(),
        ],
        &[],
    )
}

pub fn stage_all(repo: &GitCli) -> Result<CommandOutput, GitError> {
    repo.run(["add", "--all"], &[])
}
