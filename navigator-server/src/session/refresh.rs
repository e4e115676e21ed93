//! One refresh cycle: fetch, merge, reconcile.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::digitransit::LegSource;
use crate::domain::Leg;
use crate::timing::{Reconciliation, reconcile};

/// Result of a refresh cycle.
#[derive(Debug, Clone)]
pub struct Refreshed {
    pub legs: Vec<Leg>,
    pub report: Reconciliation,

    /// Legs whose realtime fetch succeeded
    pub updated: usize,

    /// Legs whose realtime fetch failed and kept their planned timing
    pub failed: usize,
}

/// Fetch every transit leg's realtime status and reconcile the result.
///
/// Starts from the planned legs. Fetches run concurrently; a failed fetch
/// only costs that leg its update.
pub async fn refresh_legs<S: LegSource>(source: &S, planned: &[Leg]) -> Refreshed {
    let mut legs = planned.to_vec();

    let requests = planned
        .iter()
        .enumerate()
        .filter_map(|(index, leg)| leg.leg_id().map(|id| (index, id)))
        .map(|(index, id)| async move { (index, id, source.fetch_leg(id).await) });

    let results = join_all(requests).await;

    let mut updated = 0;
    let mut failed = 0;
    for (index, id, result) in results {
        match result {
            Ok(realtime) => {
                legs[index].merge_realtime(&realtime);
                updated += 1;
            }
            Err(e) => {
                warn!(leg = %id, error = %e, "realtime fetch failed, keeping planned timing");
                failed += 1;
            }
        }
    }

    let report = reconcile(&mut legs);

    debug!(updated, failed, "refresh cycle complete");

    Refreshed {
        legs,
        report,
        updated,
        failed,
    }
}
