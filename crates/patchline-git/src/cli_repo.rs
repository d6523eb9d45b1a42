//! The git CLI-backed implementation of [`PatchRepo`].

use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::Command;

use crate::error::GitError;
use crate::repo::PatchRepo;
use crate::types::{CommandOutput, CommitSpec};

/// A [`PatchRepo`] that shells out to `git` inside a working directory.
///
/// Every invocation runs with `GIT_TERMINAL_PROMPT=0` so a push that needs
/// credentials fails instead of blocking on a prompt.
#[derive(Clone, Debug)]
pub struct GitCli {
    pub(crate) workdir: PathBuf,
    pub(crate) program: OsString,
}

impl GitCli {
    /// Operate on the repository whose working tree is `workdir`.
    pub fn new(workdir: impl Into<PathBuf>) -> Self {
        Self {
            workdir: workdir.into(),
            program: OsString::from("git"),
        }
    }

    /// Use a different git executable (e.g. an absolute path).
    #[must_use]
    pub fn with_program(mut self, program: impl Into<OsString>) -> Self {
        self.program = program.into();
        self
    }

    /// Run git with `args` and extra environment, capturing both streams.
    pub(crate) fn run<I, S>(&self, args: I, envs: &[(&str, &str)]) -> Result<CommandOutput, GitError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let args: Vec<OsString> = args.into_iter().map(|a| a.as_ref().to_owned()).collect();
        let command = render_command(&self.program, &args);
        tracing::debug!(command = %command, workdir = %self.workdir.display(), "running git");

        let output = Command::new(&self.program)
            .args(&args)
            .current_dir(&self.workdir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .envs(envs.iter().copied())
            .output()
            .map_err(|source| GitError::Spawn {
                command: command.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        if output.status.success() {
            Ok(CommandOutput { stdout, stderr })
        } else {
            tracing::debug!(command = %command, code = ?output.status.code(), "git failed");
            Err(GitError::CommandFailed {
                command,
                stderr: stderr.trim().to_owned(),
                exit_code: output.status.code(),
            })
        }
    }
}

fn render_command(program: &OsStr, args: &[OsString]) -> String {
    let mut parts = vec![program.to_string_lossy().into_owned()];
    parts.extend(args.iter().map(|a| a.to_string_lossy().into_owned()));
    parts.join(" ")
}

impl PatchRepo for GitCli {
    fn apply_patch(&self, patch: &Path) -> Result<CommandOutput, GitError> {
        crate::apply_impl::apply_patch(self, patch)
    }

    fn stage_all(&self) -> Result<CommandOutput, GitError> {
        crate::apply_impl::stage_all(self)
    }

    fn commit(&self, spec: &CommitSpec) -> Result<CommandOutput, GitError> {
        crate::commit_impl::commit(self, spec)
    }

    fn push(&self, remote: &str, branch: &str) -> Result<CommandOutput, GitError> {
        crate::push_impl::push_branch(self, remote, branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_command_joins_program_and_args() {
        let args = vec![OsString::from("apply"), OsString::from("--whitespace=nowarn")];
        assert_eq!(
            render_command(OsStr::new("git"), &args),
            "git apply --whitespace=nowarn"
        );
    }

    #[test]
    fn missing_program_is_spawn_error() {
        let dir = tempfile::tempdir().unwrap();
        let repo = GitCli::new(dir.path()).with_program("patchline-no-such-git");
        let err = repo.stage_all().unwrap_err();
        assert!(matches!(err, GitError::Spawn { .. }), "got {err:?}");
    }
}
