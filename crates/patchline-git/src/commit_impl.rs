//! Commit creation with a synthetic author and committer.

use crate::cli_repo::GitCli;
use crate::error::GitError;
use crate::types::{CommandOutput, CommitSpec};

/// `git commit` covers the author through flags; the committer side only
/// comes from the environment.
pub fn commit(repo: &GitCli, spec: &CommitSpec) -> Result<CommandOutput, GitError> {
    let author = spec.identity.to_string();
    let envs = [
        ("GIT_COMMITTER_NAME", spec.identity.name.as_str()),
        ("GIT_COMMITTER_EMAIL", spec.identity.email.as_str()),
        ("GIT_COMMITTER_DATE", spec.date.as_str()),
    ];
    repo.run(
        [
            "commit",
            "--author",
            author.as_str(),
            "--date",
            spec.date.as_str(),
            "-m",
            spec.message.as_str(),
        ],
        &envs,
    )
}
