//! Value types shared between the [`PatchRepo`](crate::PatchRepo) trait and
//! its callers. They carry no backend-specific state.

use std::fmt;

// ---------------------------------------------------------------------------
// Identity
// ---------------------------------------------------------------------------

/// A git identity: the name and email recorded on a commit.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Identity {
    pub name: String,
    pub email: String,
}

impl Identity {
    /// Create a new identity.
    pub fn new(name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            email: email.into(),
        }
    }
}

/// Formats as `Name <email>`, the form `git commit --author` expects.
impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} <{}>", self.name, self.email)
    }
}

// ---------------------------------------------------------------------------
// CommitSpec
// ---------------------------------------------------------------------------

/// Everything needed to record one commit from the staged index.
///
/// The same identity and date are used for both the author and the
/// committer fields.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommitSpec {
    /// Author and committer identity.
    pub identity: Identity,
    /// Author and committer date, in any format `git commit --date` accepts.
    pub date: String,
    /// Full commit message (subject, then body lines).
    pub message: String,
}

// ---------------------------------------------------------------------------
// CommandOutput
// ---------------------------------------------------------------------------

/// Captured output of a successful git invocation.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    /// `true` when git printed nothing on either stream.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.stdout.trim().is_empty() && self.stderr.trim().is_empty()
    }
}
