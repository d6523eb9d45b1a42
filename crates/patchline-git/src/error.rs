//! Error types for git operations.
//!
//! [`GitError`] is the single error type returned by all
//! [`PatchRepo`](crate::PatchRepo) methods. Callers match on the variant to
//! tell a rejected push from a failed apply without parsing messages.

use thiserror::Error;

/// Errors returned by [`PatchRepo`](crate::PatchRepo) operations.
#[derive(Debug, Error)]
pub enum GitError {
    /// The git process could not be started at all (missing binary,
    /// unreadable working directory, ...).
    #[error("failed to run `{command}`: {source}")]
    Spawn {
        /// The command line that was attempted.
        command: String,
        /// The underlying OS error.
        #[source]
        source: std::io::Error,
    },

    /// git ran and exited with a non-zero status.
    #[error("`{command}` failed{}: {stderr}", exit_suffix(.exit_code))]
    CommandFailed {
        /// The command line that was run (e.g. `"git apply --whitespace=nowarn 0001.patch"`).
        command: String,
        /// Captured stderr, trimmed.
        stderr: String,
        /// Process exit code, `None` when killed by a signal.
        exit_code: Option<i32>,
    },

    /// The remote rejected the push or could not be reached.
    #[error("push of `{branch}` to `{remote}` failed: {message}")]
    PushFailed {
        /// The remote name (e.g. `"origin"`).
        remote: String,
        /// The branch that was pushed.
        branch: String,
        /// git's diagnostic output.
        message: String,
    },
}

impl GitError {
    /// The diagnostic text git printed for this failure.
    ///
    /// For spawn failures this is the OS error message.
    #[must_use]
    pub fn diagnostic(&self) -> String {
        match self {
            Self::Spawn { source, .. } => source.to_string(),
            Self::CommandFailed { stderr, .. } => stderr.clone(),
            Self::PushFailed { message, .. } => message.clone(),
        }
    }
}

#[allow(clippy::ref_option)]
fn exit_suffix(code: &Option<i32>) -> String {
    code.map_or_else(String::new, |c| format!(" (exit code {c})"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_failed_display_includes_exit_code_and_stderr() {
        let err = GitError::CommandFailed {
            command: "git apply 0002.patch".to_owned(),
            stderr: "error: patch failed: a.txt:1".to_owned(),
            exit_code: Some(1),
        };
        let msg = err.to_string();
        assert!(msg.contains("git apply 0002.patch"));
        assert!(msg.contains("(exit code 1)"));
        assert!(msg.contains("patch failed"));
    }

    #[test]
    fn command_failed_without_exit_code() {
        let err = GitError::CommandFailed {
            command: "git add --all".to_owned(),
            stderr: "killed".to_owned(),
            exit_code: None,
        };
        assert_eq!(err.to_string(), "`git add --all` failed: killed");
    }

    #[test]
    fn diagnostic_returns_git_output() {
        let err = GitError::PushFailed {
            remote: "origin".to_owned(),
            branch: "main".to_owned(),
            message: "! [rejected] main -> main (fetch first)".to_owned(),
        };
        assert_eq!(err.diagnostic(), "! [rejected] main -> main (fetch first)");
        assert!(err.to_string().contains("`main` to `origin`"));
    }
}
