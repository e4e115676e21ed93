//! Digitransit routing API client.
//!
//! Digitransit is the OpenTripPlanner deployment behind the Finnish journey
//! planners. Itineraries come from its `plan` query; this module only needs
//! the `leg(id:)` query, which returns the current realtime view of one
//! transit leg.
//!
//! Key characteristics:
//! - Leg ids are opaque strings, valid while the router keeps the trip in
//!   its realtime index
//! - Times are ISO-8601 strings with the local offset
//! - A missing leg comes back as `leg: null`, not as an HTTP error

mod client;
mod convert;
mod error;
mod mock;
mod source;
mod types;

pub use client::{DigitransitClient, DigitransitConfig};
pub use convert::{
    ConversionError, convert_leg, convert_leg_time, convert_legs, convert_realtime_leg,
    leg_time_to_dto, leg_to_dto,
};
pub use error::DigitransitError;
pub use mock::MockLegSource;
pub use source::LegSource;
pub use types::{
    AvailabilityDto, EstimateDto, GeometryDto, LegDto, LegTimeDto, PlaceDto, RealtimeLegDto,
    RealtimePlaceDto, RentalStationDto, RentalVehicleDto, RouteDto, StopDto, TripDto,
};
