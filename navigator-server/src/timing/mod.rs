//! Leg timing model.
//!
//! Realtime updates only ever arrive for transit legs. This module moves
//! the walks, waits and transfers around them so the itinerary stays
//! consistent: every leg ends no later than the next one starts, and no
//! transit leg is ever moved.
//!
//! Everything here is a pure transform over a mutable leg slice.

mod reconcile;

pub use reconcile::{
    Adjustment, Conflict, Reconciliation, gap_between, reconcile, scale_range, shift_range,
};
