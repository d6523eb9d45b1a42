//! Push the replayed branch upstream.

use crate::cli_repo::GitCli;
use crate::error::GitError;
use crate::types::CommandOutput;

pub fn push_branch(repo: &GitCli, remote: &str, branch: &str) -> Result<CommandOutput, GitError> {
    repo.run(["push", remote, branch], &[]).map_err(|e| match e {
        GitError::CommandFailed { stderr, .. } => GitError::PushFailed {
            remote: remote.to_owned(),
            branch: branch.to_owned(),
            message: stderr,
        },
        other => other,
    })
}
