//! Conversion between Digitransit DTOs and domain types.
//!
//! Incoming legs are validated here: timestamps must carry an offset and a
//! leg must not end before it starts. Street legs are classified as walks or
//! transfers by whether transit legs surround them.

use crate::domain::{
    DomainError, Leg, LegId, LegKind, LegTime, Place, RealtimeLeg, RentalStation, RentalVehicle,
    StopRef, TimeError, Timestamp, TransitDetails,
};

use super::types::{
    AvailabilityDto, EstimateDto, GeometryDto, LegDto, LegTimeDto, PlaceDto, RealtimeLegDto,
    RentalStationDto, RentalVehicleDto, RouteDto, StopDto, TripDto,
};

/// Error during DTO to domain conversion.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    /// Failed to parse a timestamp
    #[error("invalid time: {0}")]
    InvalidTime(#[from] TimeError),

    /// A leg failed validation
    #[error("invalid leg {index}: {source}")]
    InvalidLeg { index: usize, source: DomainError },

    /// Missing required field
    #[error("missing required field: {0}")]
    MissingField(&'static str),
}

/// Convert a planner itinerary to domain legs.
pub fn convert_legs(legs: &[LegDto]) -> Result<Vec<Leg>, ConversionError> {
    let is_transit: Vec<bool> = legs.iter().map(is_transit_dto).collect();

    legs.iter()
        .enumerate()
        .map(|(index, dto)| {
            let between_transit =
                is_transit[..index].contains(&true) && is_transit[index + 1..].contains(&true);
            convert_leg(dto, between_transit)
                .map_err(|e| match e {
                    ConversionError::InvalidLeg { source, .. } => {
                        ConversionError::InvalidLeg { index, source }
                    }
                    other => other,
                })
        })
        .collect()
}

fn is_transit_dto(dto: &LegDto) -> bool {
    dto.transit_leg || dto.mode.is_transit()
}

/// Convert one leg. `between_transit` decides walk vs transfer for street legs.
pub fn convert_leg(dto: &LegDto, between_transit: bool) -> Result<Leg, ConversionError> {
    let kind = if is_transit_dto(dto) {
        LegKind::Transit(TransitDetails {
            mode: dto.mode,
            leg_id: dto.id.as_deref().map(LegId::new),
            interline_with_previous_leg: dto.interline_with_previous_leg.unwrap_or(false),
            realtime: dto.real_time.unwrap_or(false),
            realtime_state: dto.realtime_state,
            route: dto.route.as_ref().and_then(|r| r.short_name.clone()),
            headsign: dto.trip.as_ref().and_then(|t| t.trip_headsign.clone()),
        })
    } else {
        LegKind::street(dto.mode, between_transit)
    };

    let mut leg = Leg::new(
        kind,
        convert_leg_time(&dto.start)?,
        convert_leg_time(&dto.end)?,
        convert_place(&dto.from),
        convert_place(&dto.to),
    )
    .map_err(|source| ConversionError::InvalidLeg { index: 0, source })?
    .with_distance(dto.distance);

    if let Some(geometry) = &dto.leg_geometry {
        leg = leg.with_geometry(geometry.points.clone());
    }
    if dto.duration > 0.0 {
        leg.duration = dto.duration;
    }

    Ok(leg)
}

/// Parse a scheduled time and its optional estimate.
pub fn convert_leg_time(dto: &LegTimeDto) -> Result<LegTime, ConversionError> {
    let (scheduled, offset) = Timestamp::parse_iso(&dto.scheduled_time)?;
    let mut time = LegTime::scheduled(scheduled).with_offset(offset);

    if let Some(estimated) = &dto.estimated {
        let (estimate, _) = Timestamp::parse_iso(&estimated.time)?;
        time = time.with_estimate(estimate);
    }

    Ok(time)
}

fn convert_place(dto: &PlaceDto) -> Place {
    Place {
        name: dto.name.clone(),
        lat: dto.lat,
        lon: dto.lon,
        stop: dto.stop.as_ref().map(|s| StopRef {
            gtfs_id: s.gtfs_id.clone(),
            name: s.name.clone(),
            code: s.code.clone(),
        }),
        vehicle_rental_station: dto.vehicle_rental_station.as_ref().map(convert_rental_station),
        rental_vehicle: dto.rental_vehicle.as_ref().map(|v| RentalVehicle {
            vehicle_id: v.vehicle_id.clone(),
            name: v.name.clone(),
        }),
    }
}

fn convert_rental_station(dto: &RentalStationDto) -> RentalStation {
    RentalStation {
        station_id: dto.station_id.clone(),
        name: dto.name.clone(),
        vehicles_available: dto.available_vehicles.as_ref().map(|a| a.total),
        spaces_available: dto.available_spaces.as_ref().map(|a| a.total),
        operative: dto.operative,
    }
}

/// Convert a `leg(id:)` query result.
///
/// The router normally echoes the id back; `requested` is used when it
/// doesn't.
pub fn convert_realtime_leg(
    dto: &RealtimeLegDto,
    requested: &LegId,
) -> Result<RealtimeLeg, ConversionError> {
    let leg_id = dto
        .id
        .as_deref()
        .map_or_else(|| requested.clone(), LegId::new);

    Ok(RealtimeLeg {
        leg_id,
        realtime: dto.real_time.unwrap_or(false),
        realtime_state: dto.realtime_state,
        start: convert_leg_time(&dto.start)?,
        end: convert_leg_time(&dto.end)?,
        destination_rental_station: dto
            .to
            .vehicle_rental_station
            .as_ref()
            .map(convert_rental_station),
    })
}

/// Format a domain leg time for the wire.
pub fn leg_time_to_dto(time: &LegTime) -> Result<LegTimeDto, ConversionError> {
    let estimated = match time.estimated {
        Some(estimate) => Some(EstimateDto {
            time: estimate.time.to_iso(time.offset)?,
            delay: time.delay().map(|d| d.to_string()),
        }),
        None => None,
    };

    Ok(LegTimeDto {
        scheduled_time: time.scheduled.to_iso(time.offset)?,
        estimated,
    })
}

fn place_to_dto(place: &Place) -> PlaceDto {
    PlaceDto {
        name: place.name.clone(),
        lat: place.lat,
        lon: place.lon,
        stop: place.stop.as_ref().map(|s| StopDto {
            gtfs_id: s.gtfs_id.clone(),
            name: s.name.clone(),
            code: s.code.clone(),
        }),
        vehicle_rental_station: place.vehicle_rental_station.as_ref().map(|s| RentalStationDto {
            station_id: s.station_id.clone(),
            name: s.name.clone(),
            available_vehicles: s.vehicles_available.map(|total| AvailabilityDto { total }),
            available_spaces: s.spaces_available.map(|total| AvailabilityDto { total }),
            operative: s.operative,
        }),
        rental_vehicle: place.rental_vehicle.as_ref().map(|v| RentalVehicleDto {
            vehicle_id: v.vehicle_id.clone(),
            name: v.name.clone(),
        }),
    }
}

/// Convert a domain leg back to the planner's shape.
pub fn leg_to_dto(leg: &Leg) -> Result<LegDto, ConversionError> {
    let transit = leg.transit();

    Ok(LegDto {
        id: leg.leg_id().map(|id| id.as_str().to_string()),
        mode: leg.mode(),
        transit_leg: leg.is_transit(),
        start: leg_time_to_dto(&leg.start)?,
        end: leg_time_to_dto(&leg.end)?,
        from: place_to_dto(&leg.from),
        to: place_to_dto(&leg.to),
        leg_geometry: (!leg.geometry.is_empty()).then(|| GeometryDto {
            points: leg.geometry.clone(),
        }),
        distance: leg.distance,
        duration: leg.duration,
        interline_with_previous_leg: transit.map(|t| t.interline_with_previous_leg),
        real_time: transit.map(|t| t.realtime),
        realtime_state: transit.and_then(|t| t.realtime_state),
        route: transit.and_then(|t| t.route.clone()).map(|short_name| RouteDto {
            short_name: Some(short_name),
        }),
        trip: transit.and_then(|t| t.headsign.clone()).map(|headsign| TripDto {
            trip_headsign: Some(headsign),
        }),
    })
}
