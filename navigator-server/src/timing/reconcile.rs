//! Gap, shift, scale and the reconciliation pass.

use std::ops::RangeInclusive;

use chrono::Duration;
use tracing::{debug, warn};

use crate::domain::{Leg, Timestamp};

/// A change made to a block of non-transit legs.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjustment {
    /// Every leg in the range moved by `by`
    Shift {
        range: RangeInclusive<usize>,
        by: Duration,
    },

    /// Every leg in the range was scaled about the block start
    Scale {
        range: RangeInclusive<usize>,
        factor: f64,
    },
}

/// An inconsistency that can't be fixed without moving a transit leg.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// The transit leg at `after` starts before the one at `before` ends.
    TransitOverlap {
        before: usize,
        after: usize,
        overlap: Duration,
    },
}

/// What a reconciliation pass did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Reconciliation {
    pub adjustments: Vec<Adjustment>,
    pub conflicts: Vec<Conflict>,
}

impl Reconciliation {
    /// Returns true if no leg was touched and nothing was flagged.
    pub fn is_noop(&self) -> bool {
        self.adjustments.is_empty() && self.conflicts.is_empty()
    }
}

/// Signed duration from the end of `legs[index]` to the start of `legs[index + 1]`.
///
/// Positive is idle time; negative is an overlap.
///
/// # Panics
///
/// Panics if `index + 1` is out of bounds.
pub fn gap_between(legs: &[Leg], index: usize) -> Duration {
    legs[index + 1].start_time() - legs[index].end_time()
}

/// Move every non-transit leg in `[first, last]` by `gap`.
///
/// # Panics
///
/// Panics if the range is out of bounds.
pub fn shift_range(legs: &mut [Leg], first: usize, last: usize, gap: Duration) {
    for leg in legs[first..=last].iter_mut().filter(|leg| !leg.is_transit()) {
        let start = leg.start_time() + gap;
        let end = leg.end_time() + gap;
        leg.set_times(start, end);
    }
}

/// Scale every non-transit leg in `[first, last]` about the start of `legs[first]`.
///
/// Each time `t` becomes `anchor + (t - anchor) * (1 + k)`, rounded to the
/// millisecond, so `k = -0.5` halves the block and `k = -1` collapses it onto
/// its start.
///
/// # Panics
///
/// Panics if the range is out of bounds.
pub fn scale_range(legs: &mut [Leg], first: usize, last: usize, k: f64) {
    let anchor = legs[first].start_time();
    let factor = 1.0 + k;
    let scale = |t: Timestamp| {
        let offset = (t - anchor).num_milliseconds() as f64 * factor;
        anchor + Duration::milliseconds(offset.round() as i64)
    };

    for leg in legs[first..=last].iter_mut().filter(|leg| !leg.is_transit()) {
        let start = scale(leg.start_time());
        let end = scale(leg.end_time());
        leg.set_times(start, end);
    }
}

/// Index of the first transit leg at or after `from`.
fn next_transit(legs: &[Leg], from: usize) -> Option<usize> {
    legs.iter()
        .skip(from)
        .position(Leg::is_transit)
        .map(|offset| from + offset)
}

/// Index of the last leg of the interlined run starting at `start`.
///
/// Only legs directly following a transit leg can join its run. An
/// interlined flag on a leg that follows a street leg is ignored, and that
/// leg anchors on its own.
fn interline_end(legs: &[Leg], start: usize) -> usize {
    let mut end = start;
    while legs.get(end + 1).is_some_and(Leg::is_interlined) {
        end += 1;
    }
    end
}

/// Glue non-transit legs to the (possibly realtime-adjusted) transit legs.
///
/// A single forward pass:
///
/// 1. The block before the first transit leg is shifted so it ends exactly
///    when that leg starts.
/// 2. Each transit leg, together with any legs interlined after it, is an
///    anchor. The block of non-transit legs following an anchor is shifted
///    so it starts exactly when the anchor ends.
/// 3. If that block would then overlap the next transit leg, it is scaled
///    down to fit the window between the two transit legs.
///
/// Transit leg times are never changed. Zero gaps are left alone. Two
/// transit legs that overlap with nothing between them, including legs of
/// the same interlined run, are reported as a [`Conflict`] and left as they
/// are.
pub fn reconcile(legs: &mut [Leg]) -> Reconciliation {
    let mut report = Reconciliation::default();

    if legs.len() < 2 {
        return report;
    }

    let Some(first_transit) = next_transit(legs, 0) else {
        return report;
    };

    if first_transit > 0 {
        let last = first_transit - 1;
        let gap = gap_between(legs, last);
        if !gap.is_zero() {
            shift_range(legs, 0, last, gap);
            report.adjustments.push(Adjustment::Shift {
                range: 0..=last,
                by: gap,
            });
        }
    }

    let mut anchor = Some(first_transit);
    while let Some(anchor_start) = anchor {
        let anchor_end = interline_end(legs, anchor_start);
        for i in anchor_start..anchor_end {
            let gap = gap_between(legs, i);
            if gap < Duration::zero() {
                flag_overlap(i, i + 1, gap, &mut report);
            }
        }

        let block_start = anchor_end + 1;
        let next = next_transit(legs, block_start);
        let block_end = next.unwrap_or(legs.len());

        if block_start < block_end {
            let last = block_end - 1;

            let gap = gap_between(legs, anchor_end);
            if !gap.is_zero() {
                shift_range(legs, block_start, last, -gap);
                report.adjustments.push(Adjustment::Shift {
                    range: block_start..=last,
                    by: -gap,
                });
            }

            if let Some(next) = next {
                if gap_between(legs, last) < Duration::zero() {
                    fit_block(legs, anchor_end, block_start..=last, next, &mut report);
                }
            }
        } else if let Some(next) = next {
            let gap = gap_between(legs, anchor_end);
            if gap < Duration::zero() {
                flag_overlap(anchor_end, next, gap, &mut report);
            }
        }

        anchor = next;
    }

    debug!(
        adjustments = report.adjustments.len(),
        conflicts = report.conflicts.len(),
        "reconciled legs"
    );

    report
}

/// Compress a block sitting between two anchors so it ends when `next` starts.
fn fit_block(
    legs: &mut [Leg],
    anchor_end: usize,
    block: RangeInclusive<usize>,
    next: usize,
    report: &mut Reconciliation,
) {
    let (first, last) = (*block.start(), *block.end());
    let window = legs[next].start_time() - legs[anchor_end].end_time();
    let length = legs[last].end_time() - legs[first].start_time();

    // Overlap implies length > window >= 0 unless the anchors themselves overlap
    let factor = if window <= Duration::zero() || length <= Duration::zero() {
        0.0
    } else {
        window.num_milliseconds() as f64 / length.num_milliseconds() as f64
    };

    scale_range(legs, first, last, factor - 1.0);
    report.adjustments.push(Adjustment::Scale {
        range: block,
        factor,
    });

    if window < Duration::zero() {
        flag_overlap(anchor_end, next, window, report);
    }
}

fn flag_overlap(before: usize, after: usize, gap: Duration, report: &mut Reconciliation) {
    warn!(
        before,
        after,
        overlap_ms = -gap.num_milliseconds(),
        "transit legs overlap after realtime update"
    );
    report.conflicts.push(Conflict::TransitOverlap {
        before,
        after,
        overlap: -gap,
    });
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
