//! The apply/commit loop and the final push.
//!
//! Each scheduled patch moves through
//! `Pending → Applied → MessageExtracted → Committed`. Any failure marks it
//! `Failed` and ends the whole run; earlier commits stay, nothing is undone,
//! and the push is never attempted.
//!
//! Progress for each patch (file name, identity, date) is written before the
//! first git call for it, so the last block printed names the patch that
//! failed.

use std::io::Write;
use std::path::Path;

use tracing::instrument;

use patchline_git::{CommandOutput, CommitSpec, PatchRepo};

use crate::error::ReplayError;
use crate::message;
use crate::schedule::{Schedule, ScheduleEntry};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Where the finished history goes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReplayOptions {
    pub remote: String,
    pub branch: String,
    /// Skip the push and leave the commits local.
    pub push: bool,
}

/// Lifecycle of one patch within a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatchState {
    Pending,
    Applied,
    MessageExtracted,
    Committed,
    Failed,
}

/// A patch that made it into the history.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommittedPatch {
    pub name: String,
    pub author: String,
    pub date: String,
    pub subject: String,
}

/// Outcome of a successful run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReplayReport {
    pub committed: Vec<CommittedPatch>,
    pub pushed: bool,
}

/// Tracks one patch through its states and logs each transition.
struct PatchProgress<'a> {
    name: &'a str,
    state: PatchState,
}

impl<'a> PatchProgress<'a> {
    const fn new(name: &'a str) -> Self {
        Self {
            name,
            state: PatchState::Pending,
        }
    }

    fn advance(&mut self, next: PatchState) {
        tracing::debug!(patch = self.name, from = ?self.state, to = ?next, "patch state");
        self.state = next;
    }

    fn fail(&mut self, err: ReplayError) -> ReplayError {
        tracing::error!(patch = self.name, at = ?self.state, "patch failed");
        self.state = PatchState::Failed;
        err
    }
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Apply and commit every scheduled patch in order, then push.
///
/// Progress goes to `out`; diagnostics go through `tracing`.
///
/// # Errors
/// The first [`ReplayError`] encountered. The run stops there.
#[instrument(skip_all, fields(patches = schedule.len(), branch = %options.branch))]
pub fn run<R, W>(
    repo: &R,
    schedule: &Schedule,
    options: &ReplayOptions,
    out: &mut W,
) -> Result<ReplayReport, ReplayError>
where
    R: PatchRepo + ?Sized,
    W: Write,
{
    let mut report = ReplayReport::default();

    for entry in &schedule.entries {
        let committed = replay_one(repo, entry, out)?;
        report.committed.push(committed);
    }
    tracing::info!(commits = report.committed.len(), "all patches committed");

    if options.push {
        writeln!(out, "Pushing changes to the remote repository...")?;
        let output = repo
            .push(&options.remote, &options.branch)
            .map_err(|e| ReplayError::Push {
                remote: options.remote.clone(),
                branch: options.branch.clone(),
                stderr: e.diagnostic(),
            })?;
        echo(out, &output)?;
        report.pushed = true;
        writeln!(out, "All patches applied and pushed successfully.")?;
    } else {
        writeln!(
            out,
            "All patches applied; skipping push of '{}' to '{}'.",
            options.branch, options.remote
        )?;
    }

    Ok(report)
}

fn replay_one<R, W>(repo: &R, entry: &ScheduleEntry, out: &mut W) -> Result<CommittedPatch, ReplayError>
where
    R: PatchRepo + ?Sized,
    W: Write,
{
    let patch: &Path = &entry.patch.path;
    let identity = entry.contributor.identity();
    let mut progress = PatchProgress::new(&entry.patch.name);

    writeln!(out, "Applying patch: {}", entry.patch.name)?;
    writeln!(out, "Author & Committer: {identity}")?;
    writeln!(out, "Date: {}", entry.date)?;
    writeln!(out)?;

    let output = repo.apply_patch(patch).map_err(|e| {
        progress.fail(ReplayError::PatchApply {
            patch: patch.to_owned(),
            stderr: e.diagnostic(),
        })
    })?;
    echo(out, &output)?;
    progress.advance(PatchState::Applied);

    // Only the header is parsed; the diff may be in any encoding.
    let bytes = std::fs::read(patch).map_err(|e| {
        progress.fail(ReplayError::MessageExtraction {
            patch: patch.to_owned(),
            detail: e.to_string(),
        })
    })?;
    let message = message::extract(&String::from_utf8_lossy(&bytes))
        .map_err(|e| progress.fail(ReplayError::message_extraction(patch.to_owned(), &e)))?;
    progress.advance(PatchState::MessageExtracted);

    repo.stage_all().map_err(|e| {
        progress.fail(ReplayError::Stage {
            patch: patch.to_owned(),
            stderr: e.diagnostic(),
        })
    })?;

    let spec = CommitSpec {
        identity: identity.clone(),
        date: entry.date.clone(),
        message: message.to_string(),
    };
    let output = repo.commit(&spec).map_err(|e| {
        progress.fail(ReplayError::Commit {
            patch: patch.to_owned(),
            stderr: e.diagnostic(),
        })
    })?;
    echo(out, &output)?;
    progress.advance(PatchState::Committed);

    tracing::info!(
        patch = %entry.patch.name,
        author = %identity,
        date = %entry.date,
        "committed"
    );
    Ok(CommittedPatch {
        name: entry.patch.name.clone(),
        author: identity.to_string(),
        date: entry.date.clone(),
        subject: message.subject,
    })
}

/// Print whatever git said, skipping empty streams.
fn echo<W: Write>(out: &mut W, output: &CommandOutput) -> std::io::Result<()> {
    if output.is_empty() {
        return Ok(());
    }
    for stream in [&output.stdout, &output.stderr] {
        let text = stream.trim();
        if !text.is_empty() {
            writeln!(out, "{text}")?;
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
