//! Trip navigator server.
//!
//! Tracks a planned public-transport itinerary while it is being travelled:
//! transit legs are refreshed from the Digitransit realtime API and the
//! walking, waiting and transfer legs around them are reconciled so the
//! whole trip stays consistent.

pub mod cache;
pub mod digitransit;
pub mod domain;
pub mod geometry;
pub mod interest;
pub mod session;
pub mod timing;
pub mod web;
