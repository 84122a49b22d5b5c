//! Pillar conflicts within and between segments.
//!
//! Within a segment two helpers sharing a pillar cannot both be solved for;
//! the one configured later wins. Between adjacent segments the less
//! trusted one (larger priority number) gives way: its helpers whose
//! pillars come closer than its `min_distance` to the trusted neighbour are
//! dropped.

use pillar_core::Date;
use pillar_market::config::YieldCurveSegment;
use tracing::debug;

use crate::helpers::SharedHelper;

/// Priority settings of one segment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentRank {
    pub priority: u32,
    pub min_distance: u32,
}

impl From<&YieldCurveSegment> for SegmentRank {
    fn from(segment: &YieldCurveSegment) -> Self {
        Self {
            priority: segment.priority,
            min_distance: segment.min_distance,
        }
    }
}

impl SegmentRank {
    // Overlapping pillars are never kept, whatever the configured distance.
    fn required_gap(self) -> i64 {
        i64::from(self.min_distance.max(1))
    }
}

/// Sorts helpers by pillar, keeping the last configured of helpers that share one.
pub(crate) fn dedup_pillars(mut helpers: Vec<SharedHelper>) -> Vec<SharedHelper> {
    helpers.sort_by_key(|h| h.pillar_date());
    let mut kept: Vec<SharedHelper> = Vec::with_capacity(helpers.len());
    for helper in helpers {
        if let Some(last) = kept.last() {
            if last.pillar_date() == helper.pillar_date() {
                debug!(
                    dropped = last.quote_name(),
                    kept = helper.quote_name(),
                    pillar = %helper.pillar_date(),
                    "duplicate pillar in segment"
                );
                kept.pop();
            }
        }
        kept.push(helper);
    }
    kept
}

/// Drops helpers of less trusted segments that crowd a trusted neighbour.
///
/// Segment bounds are taken before any helper is dropped, so the outcome
/// does not depend on the order the pairs are visited in.
pub(crate) fn resolve_priorities(segments: &mut [Vec<SharedHelper>], ranks: &[SegmentRank]) {
    let bounds: Vec<Option<(Date, Date)>> = segments
        .iter()
        .map(|s| Some((s.first()?.pillar_date(), s.last()?.pillar_date())))
        .collect();

    for i in 0..segments.len().min(ranks.len()) {
        let rank = ranks[i];
        let gap = rank.required_gap();

        if let (Some(next), Some(Some((earliest, _)))) = (ranks.get(i + 1), bounds.get(i + 1)) {
            if rank.priority > next.priority {
                let earliest = *earliest;
                evict(&mut segments[i], i, |pillar| pillar.days_between(&earliest) < gap);
            }
        }

        if i > 0 && ranks[i - 1].priority < rank.priority {
            if let Some((_, latest)) = bounds[i - 1] {
                evict(&mut segments[i], i, |pillar| latest.days_between(&pillar) < gap);
            }
        }
    }
}

fn evict(helpers: &mut Vec<SharedHelper>, segment: usize, too_close: impl Fn(Date) -> bool) {
    helpers.retain(|h| {
        let drop = too_close(h.pillar_date());
        if drop {
            debug!(
                segment,
                quote = h.quote_name(),
                pillar = %h.pillar_date(),
                "helper evicted by a higher priority segment"
            );
        }
        !drop
    });
}
