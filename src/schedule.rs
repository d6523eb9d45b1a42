//! Commit scheduling: who commits each patch, and when.
//!
//! Contributors receive `floor(percentage/100 × total)` slots each; any
//! shortfall from rounding goes to the contributor with the highest
//! percentage, any excess is cut from the end. The slot list is then
//! shuffled with a seedable RNG so one contributor's commits don't cluster.
//!
//! Timestamps are evenly spaced across the window: patch `k` of `total` is
//! dated `start + k × (end − start) / total`.
//!
//! With few patches and many contributors some contributors get no slot at
//! all; [`Schedule::idle_contributors`] reports them.

use chrono::{FixedOffset, NaiveDateTime, TimeDelta};
use rand::Rng;
use rand::seq::SliceRandom;
use serde::Serialize;

use crate::config::Contributor;
use crate::patch::PatchFile;

/// Format handed to `git commit --date`.
const GIT_DATE_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

// ---------------------------------------------------------------------------
// Window
// ---------------------------------------------------------------------------

/// The date range commits are spread over.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Window {
    start: NaiveDateTime,
    end: NaiveDateTime,
    offset: Option<FixedOffset>,
}

impl Window {
    #[must_use]
    pub const fn new(start: NaiveDateTime, end: NaiveDateTime, offset: Option<FixedOffset>) -> Self {
        Self { start, end, offset }
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    #[must_use]
    pub fn span(&self) -> TimeDelta {
        self.end - self.start
    }

    /// Spacing between consecutive commits, at millisecond resolution.
    /// Zero when `total` is zero.
    #[must_use]
    pub fn interval(&self, total: usize) -> TimeDelta {
        self.offset_of(1, total)
    }

    /// Timestamp of patch `k` (0-indexed) out of `total`.
    ///
    /// Computed from the whole span rather than by summing intervals, so
    /// rounding never accumulates.
    #[must_use]
    pub fn timestamp(&self, k: usize, total: usize) -> NaiveDateTime {
        self.start + self.offset_of(k, total)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn offset_of(&self, k: usize, total: usize) -> TimeDelta {
        if total == 0 {
            return TimeDelta::zero();
        }
        let span_ms = i128::from(self.span().num_milliseconds());
        let offset_ms = span_ms * k as i128 / total as i128;
        // |offset| <= |span| * k / total, which fits back into i64 for k <= total.
        TimeDelta::milliseconds(offset_ms as i64)
    }

    /// Render a timestamp the way `git commit --date` and
    /// `GIT_COMMITTER_DATE` receive it.
    #[must_use]
    pub fn git_date(&self, timestamp: NaiveDateTime) -> String {
        let local = timestamp.format(GIT_DATE_FORMAT);
        match self.offset {
            Some(offset) => format!("{local}{offset}"),
            None => local.to_string(),
        }
    }
}

// ---------------------------------------------------------------------------
// Allocation
// ---------------------------------------------------------------------------

/// Proportional slot allocation, in configuration order, before shuffling.
///
/// Returns `total` indices into `contributors`. Empty if there are no
/// contributors or `total` is zero.
#[must_use]
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
pub fn allocate(contributors: &[Contributor], total: usize) -> Vec<usize> {
    let Some(top) = highest_share(contributors) else {
        return Vec::new();
    };

    let mut slots = Vec::with_capacity(total);
    for (idx, c) in contributors.iter().enumerate() {
        let share = c.percentage.max(0.0);
        let count = (share * total as f64 / 100.0).floor() as usize;
        slots.extend(std::iter::repeat_n(idx, count));
    }

    if slots.len() < total {
        slots.resize(total, top);
    }
    slots.truncate(total);
    slots
}

/// Index of the contributor with the highest percentage; the first one wins
/// a tie.
fn highest_share(contributors: &[Contributor]) -> Option<usize> {
    contributors
        .iter()
        .enumerate()
        .fold(None, |best: Option<(usize, f64)>, (idx, c)| match best {
            Some((_, pct)) if pct >= c.percentage => best,
            _ => Some((idx, c.percentage)),
        })
        .map(|(idx, _)| idx)
}

/// [`allocate`], then a uniform random permutation.
pub fn assign<R: Rng + ?Sized>(contributors: &[Contributor], total: usize, rng: &mut R) -> Vec<usize> {
    let mut slots = allocate(contributors, total);
    slots.shuffle(rng);
    slots
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// One patch with its assigned author and date.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ScheduleEntry {
    /// Position in the commit sequence (0-indexed).
    pub index: usize,
    pub patch: PatchFile,
    pub contributor: Contributor,
    pub timestamp: NaiveDateTime,
    /// `timestamp` as passed to git.
    pub date: String,
}

/// The full commit plan for a run.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Schedule {
    pub entries: Vec<ScheduleEntry>,
    /// Spacing between commits, in whole seconds.
    pub interval_seconds: i64,
    /// Contributors that received no commit.
    pub idle: Vec<Contributor>,
}

impl Schedule {
    /// Pair every patch with a timestamp and a shuffled contributor slot.
    pub fn build<R: Rng + ?Sized>(
        patches: Vec<PatchFile>,
        contributors: &[Contributor],
        window: &Window,
        rng: &mut R,
    ) -> Self {
        let total = patches.len();
        let slots = assign(contributors, total, rng);

        let entries: Vec<ScheduleEntry> = patches
            .into_iter()
            .zip(slots.iter().copied())
            .enumerate()
            .map(|(index, (patch, slot))| {
                let timestamp = window.timestamp(index, total);
                ScheduleEntry {
                    index,
                    patch,
                    contributor: contributors[slot].clone(),
                    timestamp,
                    date: window.git_date(timestamp),
                }
            })
            .collect();

        let idle: Vec<Contributor> = contributors
            .iter()
            .enumerate()
            .filter(|(idx, _)| !slots.contains(idx))
            .map(|(_, c)| c.clone())
            .collect();
        if !idle.is_empty() {
            tracing::warn!(
                patches = total,
                contributors = contributors.len(),
                idle = ?idle.iter().map(|c| c.name.as_str()).collect::<Vec<_>>(),
                "some contributors receive no commits"
            );
        }

        Self {
            entries,
            interval_seconds: window.interval(total).num_seconds(),
            idle,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Contributors configured with a share but assigned no commit.
    #[must_use]
    pub fn idle_contributors(&self) -> &[Contributor] {
        &self.idle
    }

    /// Commits per contributor name, in configuration order of first
    /// appearance in `contributors`.
    #[must_use]
    pub fn tally<'a>(&self, contributors: &'a [Contributor]) -> Vec<(&'a Contributor, usize)> {
        contributors
            .iter()
            .map(|c| {
                let n = self
                    .entries
                    .iter()
                    .filter(|e| e.contributor.email == c.email && e.contributor.name == c.name)
                    .count();
                (c, n)
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::path::PathBuf;

    fn contributor(name: &str, percentage: f64) -> Contributor {
        Contributor {
            name: name.to_owned(),
            email: format!("{}@example.com", name.to_lowercase()),
            percentage,
        }
    }

    fn dt(d: u32, h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 10, d)
            .unwrap()
            .and_hms_opt(h, 0, 0)
            .unwrap()
    }

    fn patches(n: usize) -> Vec<PatchFile> {
        (0..n)
            .map(|i| PatchFile::new(PathBuf::from(format!("/p/{i:04}.patch"))))
            .collect()
    }

    fn counts(slots: &[usize], n: usize) -> Vec<usize> {
        (0..n).map(|i| slots.iter().filter(|s| **s == i).count()).collect()
    }

    #[test]
    fn allocate_exact_split() {
        let cs = [contributor("Ada", 60.0), contributor("Grace", 40.0)];
        assert_eq!(allocate(&cs, 10), vec![0, 0, 0, 0, 0, 0, 1, 1, 1, 1]);
    }

    #[test]
    fn allocate_pads_with_highest_share() {
        let cs = [contributor("Ada", 40.0), contributor("Grace", 60.0)];
        // floor(0.8) = 0, floor(1.2) = 1 → one slot short, padded with Grace.
        assert_eq!(allocate(&cs, 2), vec![1, 1]);
        // floor(1.2) + floor(1.8) = 2 of 3.
        assert_eq!(counts(&allocate(&cs, 3), 2), vec![1, 2]);
    }

    #[test]
    fn allocate_tie_pads_with_first() {
        let cs = [contributor("Ada", 50.0), contributor("Grace", 50.0)];
        assert_eq!(allocate(&cs, 3), vec![0, 1, 0]);
    }

    #[test]
    fn allocate_truncates_from_end() {
        // Over-allocation can only come from shares summing past 100.
        let cs = [contributor("Ada", 80.0), contributor("Grace", 80.0)];
        assert_eq!(allocate(&cs, 5), vec![0, 0, 0, 0, 1]);
    }

    #[test]
    fn allocate_small_total_leaves_contributors_idle() {
        let cs = [
            contributor("Ada", 34.0),
            contributor("Grace", 33.0),
            contributor("Linus", 33.0),
        ];
        assert_eq!(allocate(&cs, 1), vec![0]);
    }

    #[test]
    fn allocate_degenerate_inputs() {
        assert!(allocate(&[], 4).is_empty());
        assert!(allocate(&[contributor("Ada", 100.0)], 0).is_empty());
    }

    #[test]
    fn assign_is_a_permutation_and_seeded() {
        let cs = [contributor("Ada", 60.0), contributor("Grace", 40.0)];
        let a = assign(&cs, 20, &mut StdRng::seed_from_u64(42));
        let b = assign(&cs, 20, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
        assert_eq!(counts(&a, 2), vec![12, 8]);
    }

    #[test]
    fn window_timestamps() {
        let w = Window::new(dt(1, 0), dt(1, 10), None);
        assert_eq!(w.interval(4), TimeDelta::minutes(150));
        assert_eq!(w.timestamp(0, 4), dt(1, 0));
        assert_eq!(w.timestamp(2, 4), dt(1, 5));
        assert!(w.timestamp(3, 4) < w.end());
        assert_eq!(w.interval(0), TimeDelta::zero());
    }

    #[test]
    fn git_date_with_and_without_offset() {
        let ts = dt(1, 14);
        let w = Window::new(dt(1, 0), dt(2, 0), None);
        assert_eq!(w.git_date(ts), "2024-10-01T14:00:00");
        let w = Window::new(dt(1, 0), dt(2, 0), FixedOffset::east_opt(2 * 3600));
        assert_eq!(w.git_date(ts), "2024-10-01T14:00:00+02:00");
        let w = Window::new(dt(1, 0), dt(2, 0), FixedOffset::west_opt(5 * 3600 + 1800));
        assert_eq!(w.git_date(ts), "2024-10-01T14:00:00-05:30");
    }

    #[test]
    fn git_date_truncates_subseconds() {
        let w = Window::new(dt(1, 0), dt(1, 0) + TimeDelta::seconds(10), None);
        // 10s / 3 = 3.333s
        assert_eq!(w.git_date(w.timestamp(1, 3)), "2024-10-01T00:00:03");
        assert_eq!(w.git_date(w.timestamp(2, 3)), "2024-10-01T00:00:06");
    }

    #[test]
    fn build_pairs_patches_in_order() {
        let cs = [contributor("Ada", 60.0), contributor("Grace", 40.0)];
        let w = Window::new(dt(1, 0), dt(3, 0), None);
        let s = Schedule::build(patches(4), &cs, &w, &mut StdRng::seed_from_u64(1));
        assert_eq!(s.len(), 4);
        assert_eq!(s.interval_seconds, 12 * 3600);
        for (k, e) in s.entries.iter().enumerate() {
            assert_eq!(e.index, k);
            assert_eq!(e.patch.name, format!("{k:04}.patch"));
            assert_eq!(e.timestamp, w.timestamp(k, 4));
            assert_eq!(e.date, w.git_date(e.timestamp));
        }
        let tally: Vec<usize> = s.tally(&cs).into_iter().map(|(_, n)| n).collect();
        // floor(2.4) + floor(1.6) = 3, padded with Ada.
        assert_eq!(tally, vec![3, 1]);
        assert!(s.idle_contributors().is_empty());
    }

    #[test]
    fn build_reports_idle_contributors() {
        let cs = [
            contributor("Ada", 50.0),
            contributor("Grace", 30.0),
            contributor("Linus", 20.0),
        ];
        let w = Window::new(dt(1, 0), dt(2, 0), None);
        let s = Schedule::build(patches(1), &cs, &w, &mut StdRng::seed_from_u64(3));
        assert_eq!(s.entries[0].contributor.name, "Ada");
        let idle: Vec<&str> = s.idle_contributors().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(idle, vec!["Grace", "Linus"]);
    }

    proptest! {
        #[test]
        fn allocation_sums_to_total(
            shares in prop::collection::vec(1u32..100, 1..6),
            total in 0usize..300,
        ) {
            // Normalize integer weights to percentages summing to 100.
            let sum: u32 = shares.iter().sum();
            let mut pcts: Vec<f64> = shares.iter().map(|s| f64::from(*s) * 100.0 / f64::from(sum)).collect();
            let drift: f64 = 100.0 - pcts.iter().sum::<f64>();
            pcts[0] += drift;
            let cs: Vec<Contributor> = pcts
                .iter()
                .enumerate()
                .map(|(i, p)| contributor(&format!("c{i}"), *p))
                .collect();
            let slots = allocate(&cs, total);
            prop_assert_eq!(slots.len(), total);
            prop_assert!(slots.iter().all(|s| *s < cs.len()));
        }

        #[test]
        fn timestamps_follow_formula(total in 1usize..200, hours in 1i64..2000) {
            let start = dt(1, 0);
            let w = Window::new(start, start + TimeDelta::hours(hours), None);
            let span_ms = i128::from(TimeDelta::hours(hours).num_milliseconds());
            let mut prev = None;
            for k in 0..total {
                let ts = w.timestamp(k, total);
                #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
                let expected = start + TimeDelta::milliseconds((span_ms * k as i128 / total as i128) as i64);
                prop_assert_eq!(ts, expected);
                prop_assert!(ts < w.end());
                if let Some(p) = prev {
                    prop_assert!(ts > p);
                }
                prev = Some(ts);
            }
        }
    }
}
