//! Replay configuration (`patchline.toml`).
//!
//! Defines the typed configuration for a replay run: where the patches come
//! from, who the contributors are, the date window the commits are spread
//! over, and which repository/branch/remote receives them.
//!
//! The file is parsed once, CLI overrides are layered on top, and the
//! result is validated once before anything touches git.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{FixedOffset, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Deserializer, Serialize};

use crate::schedule::Window;
use patchline_git::Identity;

/// Tolerance when checking that contributor percentages sum to 100.
const PERCENT_EPSILON: f64 = 1e-6;

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

/// Top-level replay configuration.
///
/// Parsed from `patchline.toml`. Unlike most tools there is no useful
/// all-defaults configuration: sources, contributors and the schedule
/// window are required.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ReplayConfig {
    /// Patch source directories.
    pub sources: SourcesConfig,

    /// Synthetic authors and their share of the commits.
    #[serde(default)]
    pub contributors: Vec<Contributor>,

    /// Date window and selection settings.
    pub schedule: ScheduleConfig,

    /// Target repository settings.
    #[serde(default)]
    pub repo: RepoConfig,
}

// ---------------------------------------------------------------------------
// SourcesConfig
// ---------------------------------------------------------------------------

/// The two patch directories that get interleaved.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SourcesConfig {
    /// Frontend patches; these come first in each interleaved pair.
    pub frontend: PathBuf,
    /// Backend patches.
    pub backend: PathBuf,
    /// File extension of patch files, without the dot (default: `"patch"`).
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_extension() -> String {
    "patch".to_owned()
}

// ---------------------------------------------------------------------------
// Contributor
// ---------------------------------------------------------------------------

/// A synthetic author and the share of commits they should receive.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Contributor {
    pub name: String,
    pub email: String,
    /// Target share of the selected patches, 0-100.
    pub percentage: f64,
}

impl Contributor {
    /// The git identity used for both author and committer.
    #[must_use]
    pub fn identity(&self) -> Identity {
        Identity::new(&self.name, &self.email)
    }
}

// ---------------------------------------------------------------------------
// ScheduleConfig
// ---------------------------------------------------------------------------

/// When the commits happen and how many patches are used.
///
/// `start` and `end` are local date-times, written either as TOML local
/// date-times (`start = 2024-10-01T14:00:00`) or as strings.
///
/// ```toml
/// [schedule]
/// start = 2024-10-01T14:00:00
/// end = 2024-11-17T17:00:00
/// percentage = 50
/// utc_offset = "+02:00"
/// seed = 7
/// ```
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScheduleConfig {
    /// Timestamp of the first commit.
    #[serde(deserialize_with = "deserialize_datetime")]
    pub start: NaiveDateTime,

    /// Exclusive upper bound of the commit timestamps.
    #[serde(deserialize_with = "deserialize_datetime")]
    pub end: NaiveDateTime,

    /// Share of the available patches to apply (default: 100). Values
    /// outside 0-100 are clamped; at least one patch is always applied.
    #[serde(default = "default_percentage")]
    pub percentage: f64,

    /// UTC offset appended to every commit date (e.g. `"+02:00"`). When
    /// unset, git interprets the dates in its own local time zone.
    #[serde(default)]
    pub utc_offset: Option<String>,

    /// Seed for the contributor shuffle. Unset means a fresh random seed
    /// per run.
    #[serde(default)]
    pub seed: Option<u64>,
}

const fn default_percentage() -> f64 {
    100.0
}

impl ScheduleConfig {
    /// Build the commit window from `start`, `end` and `utc_offset`.
    ///
    /// # Errors
    /// Returns `ConfigError` if `utc_offset` is malformed.
    pub fn window(&self) -> Result<Window, ConfigError> {
        let offset = self
            .utc_offset
            .as_deref()
            .map(parse_utc_offset)
            .transpose()?;
        Ok(Window::new(self.start, self.end, offset))
    }

    /// [`window`](Self::window), checked against the number of commits it
    /// has to hold.
    ///
    /// Git records dates in whole seconds, so commits closer together than
    /// one second would share a date.
    ///
    /// # Errors
    /// Returns `ConfigError` if `utc_offset` is malformed or the window is
    /// too short for `total` commits.
    pub fn window_for(&self, total: usize) -> Result<Window, ConfigError> {
        let window = self.window()?;
        if total > 1 && window.interval(total) < TimeDelta::seconds(1) {
            return Err(ConfigError::invalid(format!(
                "schedule window {} .. {} is too short for {total} commits: they must be at least one second apart",
                self.start, self.end
            )));
        }
        Ok(window)
    }
}

/// Parse `+HH:MM`, `-HHMM`, `+HH` or `Z`.
fn parse_utc_offset(raw: &str) -> Result<FixedOffset, ConfigError> {
    let invalid = || ConfigError {
        path: None,
        message: format!(
            "invalid utc_offset '{raw}': expected a form like \"+02:00\", \"-0530\" or \"Z\""
        ),
    };

    let s = raw.trim();
    if s == "Z" || s == "z" {
        return FixedOffset::east_opt(0).ok_or_else(invalid);
    }
    let (sign, rest) = match s.as_bytes().first() {
        Some(b'+') => (1, &s[1..]),
        Some(b'-') => (-1, &s[1..]),
        _ => return Err(invalid()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if !digits.chars().all(|c| c.is_ascii_digit()) || !matches!(digits.len(), 2 | 4) {
        return Err(invalid());
    }
    let hours: i32 = digits[..2].parse().map_err(|_| invalid())?;
    let minutes: i32 = if digits.len() == 4 {
        digits[2..].parse().map_err(|_| invalid())?
    } else {
        0
    };
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Accept either a TOML local date-time or a string.
fn deserialize_datetime<'de, D>(deserializer: D) -> Result<NaiveDateTime, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = match toml::Value::deserialize(deserializer)? {
        toml::Value::String(s) => s,
        toml::Value::Datetime(dt) => dt.to_string(),
        other => {
            return Err(serde::de::Error::custom(format!(
                "expected a date-time, found {}",
                other.type_str()
            )));
        }
    };
    parse_datetime(&raw).map_err(serde::de::Error::custom)
}

fn parse_datetime(raw: &str) -> Result<NaiveDateTime, String> {
    const FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"];
    FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw.trim(), fmt).ok())
        .ok_or_else(|| {
            format!(
                "invalid date-time '{raw}': expected YYYY-MM-DDTHH:MM:SS without a zone (use utc_offset for the zone)"
            )
        })
}

// ---------------------------------------------------------------------------
// RepoConfig
// ---------------------------------------------------------------------------

/// Target repository settings.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepoConfig {
    /// Working tree the patches are applied to (default: `"."`).
    #[serde(default = "default_repo_path")]
    pub path: PathBuf,

    /// Branch pushed once all commits exist (default: `"main"`).
    #[serde(default = "default_branch")]
    pub branch: String,

    /// Remote the branch is pushed to (default: `"origin"`).
    #[serde(default = "default_remote")]
    pub remote: String,
}

impl Default for RepoConfig {
    fn default() -> Self {
        Self {
            path: default_repo_path(),
            branch: default_branch(),
            remote: default_remote(),
        }
    }
}

fn default_repo_path() -> PathBuf {
    PathBuf::from(".")
}

fn default_branch() -> String {
    "main".to_owned()
}

fn default_remote() -> String {
    "origin".to_owned()
}

// ---------------------------------------------------------------------------
// Overrides
// ---------------------------------------------------------------------------

/// Command-line values that take precedence over the file.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ConfigOverrides {
    pub percentage: Option<f64>,
    pub seed: Option<u64>,
    pub repo_path: Option<PathBuf>,
    pub branch: Option<String>,
    pub remote: Option<String>,
}

// ---------------------------------------------------------------------------
// Config error
// ---------------------------------------------------------------------------

/// Error loading, parsing or validating `patchline.toml`.
#[derive(Debug, Clone)]
pub struct ConfigError {
    /// The path that was being loaded (if available).
    pub path: Option<PathBuf>,
    /// Human-readable message with line-level detail when possible.
    pub message: String,
}

impl ConfigError {
    fn invalid(message: impl Into<String>) -> Self {
        Self {
            path: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(p) = &self.path {
            write!(f, "{}: {}", p.display(), self.message)
        } else {
            write!(f, "config error: {}", self.message)
        }
    }
}

impl std::error::Error for ConfigError {}

impl ReplayConfig {
    /// Load configuration from a TOML file.
    ///
    /// Relative `sources` and `repo.path` entries are resolved against the
    /// directory containing the file, so a config can travel with its
    /// patches.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|e| ConfigError {
            path: Some(path.to_owned()),
            message: format!("could not read file: {e}"),
        })?;
        let mut config = Self::parse(&contents).map_err(|mut e| {
            e.path = Some(path.to_owned());
            e
        })?;

        let base = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        let base = std::path::absolute(base).map_err(|e| ConfigError {
            path: Some(path.to_owned()),
            message: format!("could not resolve config directory: {e}"),
        })?;
        config.resolve_paths(&base);
        Ok(config)
    }

    /// Parse configuration from a TOML string. Paths are left as written.
    ///
    /// # Errors
    /// Returns `ConfigError` on invalid TOML, unknown fields or malformed
    /// date-times.
    pub fn parse(toml_str: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml_str).map_err(|e| {
            let mut message = e.message().to_owned();
            if let Some(span) = e.span() {
                // Calculate line number from byte offset.
                let line = toml_str[..span.start]
                    .chars()
                    .filter(|&c| c == '\n')
                    .count()
                    + 1;
                message = format!("line {line}: {message}");
            }
            ConfigError {
                path: None,
                message,
            }
        })
    }

    fn resolve_paths(&mut self, base: &Path) {
        for path in [
            &mut self.sources.frontend,
            &mut self.sources.backend,
            &mut self.repo.path,
        ] {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        }
    }

    /// Layer command-line overrides on top of the file values.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(p) = overrides.percentage {
            self.schedule.percentage = p;
        }
        if let Some(seed) = overrides.seed {
            self.schedule.seed = Some(seed);
        }
        if let Some(path) = &overrides.repo_path {
            self.repo.path.clone_from(path);
        }
        if let Some(branch) = &overrides.branch {
            self.repo.branch.clone_from(branch);
        }
        if let Some(remote) = &overrides.remote {
            self.repo.remote.clone_from(remote);
        }
    }

    /// Check everything that can be checked before the run starts.
    ///
    /// - at least one contributor, each with a name, an email and a
    ///   percentage in 0-100
    /// - contributor percentages sum to 100
    /// - `end` is after `start`
    /// - `percentage` is a number and `utc_offset` parses
    /// - both source directories and the repository path exist
    /// - branch, remote and extension are non-empty
    ///
    /// # Errors
    /// Returns the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.contributors.is_empty() {
            return Err(ConfigError::invalid(
                "no contributors configured; add at least one [[contributors]] entry",
            ));
        }
        for c in &self.contributors {
            if c.name.trim().is_empty() || c.email.trim().is_empty() {
                return Err(ConfigError::invalid(format!(
                    "contributor '{}' <{}> needs both a name and an email",
                    c.name, c.email
                )));
            }
            if !c.percentage.is_finite() || !(0.0..=100.0).contains(&c.percentage) {
                return Err(ConfigError::invalid(format!(
                    "contributor '{}' has percentage {}; expected 0-100",
                    c.name, c.percentage
                )));
            }
        }
        let total: f64 = self.contributors.iter().map(|c| c.percentage).sum();
        if (total - 100.0).abs() > PERCENT_EPSILON {
            return Err(ConfigError::invalid(format!(
                "contributor percentages sum to {total}, expected 100"
            )));
        }

        if self.schedule.end <= self.schedule.start {
            return Err(ConfigError::invalid(format!(
                "schedule end ({}) must be after start ({})",
                self.schedule.end, self.schedule.start
            )));
        }
        if self.schedule.percentage.is_nan() {
            return Err(ConfigError::invalid("schedule percentage is not a number"));
        }
        self.schedule.window()?;

        for (label, dir) in [
            ("frontend", &self.sources.frontend),
            ("backend", &self.sources.backend),
        ] {
            if !dir.is_dir() {
                return Err(ConfigError::invalid(format!(
                    "{label} patch directory '{}' does not exist",
                    dir.display()
                )));
            }
        }
        if !self.repo.path.is_dir() {
            return Err(ConfigError::invalid(format!(
                "repository path '{}' does not exist",
                self.repo.path.display()
            )));
        }
        if self.sources.extension.trim_start_matches('.').is_empty() {
            return Err(ConfigError::invalid("sources.extension must not be empty"));
        }
        if self.repo.branch.trim().is_empty() {
            return Err(ConfigError::invalid("repo.branch must not be empty"));
        }
        if self.repo.remote.trim().is_empty() {
            return Err(ConfigError::invalid("repo.remote must not be empty"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
