//! Git boundary for patchline.
//!
//! The replay pipeline only ever talks to version control through
//! [`PatchRepo`]: apply a patch, stage, commit under a synthetic identity,
//! push. [`GitCli`] implements it by spawning `git` in a working directory;
//! tests substitute an in-memory double.
//!
//! Failures come back as [`GitError`], carrying git's stderr so callers can
//! show it verbatim.

pub mod error;
pub mod repo;
pub mod types;

// git CLI-backed implementation modules
mod apply_impl;
mod cli_repo;
mod commit_impl;
mod push_impl;

pub use cli_repo::GitCli;

pub use error::GitError;
pub use repo::PatchRepo;
pub use types::{CommandOutput, CommitSpec, Identity};
