//! patchline library crate: the replay pipeline behind the `patchline`
//! binary.
//!
//! Patches are collected and interleaved ([`patch`]), scheduled onto
//! contributors and dates ([`schedule`]), then applied and committed one at
//! a time ([`replay`]) through the [`patchline_git::PatchRepo`] trait.

pub mod config;
pub mod error;
pub mod format;
pub mod message;
pub mod patch;
pub mod replay;
pub mod schedule;
pub mod telemetry;

pub use config::{ConfigOverrides, Contributor, ReplayConfig};
pub use error::ReplayError;
pub use patch::{PatchFile, PatchSet};
pub use replay::{ReplayOptions, ReplayReport};
pub use schedule::{Schedule, ScheduleEntry, Window};
