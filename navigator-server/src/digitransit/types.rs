//! Digitransit GraphQL DTOs.
//!
//! These types map directly to the `gtfs/v1` schema's `Leg` shape. The
//! planner omits many fields per mode, so `Option` and `#[serde(default)]`
//! are used liberally. The same types are accepted by the web layer when a
//! client posts an itinerary to track.

use serde::{Deserialize, Serialize};

use crate::domain::{Mode, RealtimeState};

/// A scheduled time with an optional realtime estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegTimeDto {
    /// ISO-8601 with offset, e.g. "2024-05-20T10:15:00+03:00"
    pub scheduled_time: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated: Option<EstimateDto>,
}

/// A realtime estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EstimateDto {
    pub time: String,

    /// ISO-8601 duration, e.g. "PT2M"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay: Option<String>,
}

/// A stop reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StopDto {
    pub gtfs_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}

/// A vehicle rental station with availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalStationDto {
    pub station_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_vehicles: Option<AvailabilityDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_spaces: Option<AvailabilityDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operative: Option<bool>,
}

/// Availability counter as exposed by the rental schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDto {
    pub total: u32,
}

/// A free-floating rental vehicle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RentalVehicleDto {
    pub vehicle_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

/// One end of a leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    pub lat: f64,
    pub lon: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop: Option<StopDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vehicle_rental_station: Option<RentalStationDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rental_vehicle: Option<RentalVehicleDto>,
}

/// Encoded leg shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeometryDto {
    pub points: String,
}

/// Route summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
}

/// Trip summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripDto {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip_headsign: Option<String>,
}

/// A full itinerary leg.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LegDto {
    /// Leg id for realtime queries (transit legs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    pub mode: Mode,

    #[serde(default)]
    pub transit_leg: bool,

    pub start: LegTimeDto,
    pub end: LegTimeDto,
    pub from: PlaceDto,
    pub to: PlaceDto,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leg_geometry: Option<GeometryDto>,

    #[serde(default)]
    pub distance: f64,

    /// Seconds
    #[serde(default)]
    pub duration: f64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interline_with_previous_leg: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub real_time: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realtime_state: Option<RealtimeState>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub route: Option<RouteDto>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trip: Option<TripDto>,
}

/// Destination of a realtime leg; only rental availability is queried.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimePlaceDto {
    #[serde(default)]
    pub vehicle_rental_station: Option<RentalStationDto>,
}

/// The `leg(id:)` query result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealtimeLegDto {
    pub id: Option<String>,

    #[serde(default)]
    pub real_time: Option<bool>,

    #[serde(default)]
    pub realtime_state: Option<RealtimeState>,

    pub start: LegTimeDto,
    pub end: LegTimeDto,
    pub to: RealtimePlaceDto,
}

/// GraphQL request body.
#[derive(Debug, Serialize)]
pub struct GraphQlRequest<'a, V> {
    pub query: &'a str,
    pub variables: V,
}

/// Variables for the leg query.
#[derive(Debug, Serialize)]
pub struct LegQueryVariables<'a> {
    pub id: &'a str,
}

/// GraphQL response envelope.
#[derive(Debug, Deserialize)]
pub struct GraphQlResponse<T> {
    pub data: Option<T>,

    #[serde(default)]
    pub errors: Vec<GraphQlError>,
}

/// One GraphQL error.
#[derive(Debug, Clone, Deserialize)]
pub struct GraphQlError {
    pub message: String,
}

/// `data` of the leg query.
#[derive(Debug, Deserialize)]
pub struct LegQueryData {
    pub leg: Option<RealtimeLegDto>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserialize_transit_leg() {
        let json = r#"{
            "id": "rO0ABXc3ABhIU0w6MTA0MF8yMDI0MDUyMF8xXzEwMDA",
            "mode": "BUS",
            "transitLeg": true,
            "start": {
                "scheduledTime": "2024-05-20T10:15:00+03:00",
                "estimated": { "time": "2024-05-20T10:17:00+03:00", "delay": "PT2M" }
            },
            "end": { "scheduledTime": "2024-05-20T10:35:00+03:00", "estimated": null },
            "from": { "name": "Rautatientori", "lat": 60.1709, "lon": 24.9414,
                      "stop": { "gtfsId": "HSL:1020453", "code": "H2025" } },
            "to": { "name": "Kamppi", "lat": 60.1690, "lon": 24.9316 },
            "legGeometry": { "points": "_p~iF~ps|U" },
            "distance": 1234.5,
            "duration": 1200,
            "interlineWithPreviousLeg": false,
            "realTime": true,
            "realtimeState": "UPDATED",
            "route": { "shortName": "550" },
            "trip": { "tripHeadsign": "Itäkeskus" }
        }"#;

        let leg: LegDto = serde_json::from_str(json).unwrap();

        assert_eq!(leg.mode, Mode::Bus);
        assert!(leg.transit_leg);
        assert_eq!(
            leg.start.estimated.as_ref().map(|e| e.time.as_str()),
            Some("2024-05-20T10:17:00+03:00")
        );
        assert!(leg.end.estimated.is_none());
        assert_eq!(leg.realtime_state, Some(RealtimeState::Updated));
        assert_eq!(
            leg.from.stop.as_ref().map(|s| s.gtfs_id.as_str()),
            Some("HSL:1020453")
        );
        assert_eq!(leg.route.and_then(|r| r.short_name).as_deref(), Some("550"));
    }

    #[test]
    fn deserialize_minimal_walk_leg() {
        let json = r#"{
            "mode": "WALK",
            "start": { "scheduledTime": "2024-05-20T10:05:00+03:00" },
            "end": { "scheduledTime": "2024-05-20T10:15:00+03:00" },
            "from": { "lat": 60.17, "lon": 24.94 },
            "to": { "lat": 60.1709, "lon": 24.9414 }
        }"#;

        let leg: LegDto = serde_json::from_str(json).unwrap();

        assert_eq!(leg.mode, Mode::Walk);
        assert!(!leg.transit_leg);
        assert!(leg.id.is_none());
        assert!(leg.leg_geometry.is_none());
    }

    #[test]
    fn unknown_mode_is_other() {
        let json = r#""HOVERCRAFT""#;
        let mode: Mode = serde_json::from_str(json).unwrap();
        assert_eq!(mode, Mode::Other);
    }

    #[test]
    fn deserialize_leg_query_response() {
        let json = r#"{
            "data": {
                "leg": {
                    "id": "leg-1",
                    "realTime": true,
                    "realtimeState": "UPDATED",
                    "start": { "scheduledTime": "2024-05-20T10:15:00+03:00",
                               "estimated": { "time": "2024-05-20T10:19:00+03:00" } },
                    "end": { "scheduledTime": "2024-05-20T10:35:00+03:00" },
                    "to": { "vehicleRentalStation": {
                        "stationId": "smoove:070",
                        "availableVehicles": { "total": 4 },
                        "availableSpaces": { "total": 8 },
                        "operative": true
                    } }
                }
            }
        }"#;

        let response: GraphQlResponse<LegQueryData> = serde_json::from_str(json).unwrap();

        assert!(response.errors.is_empty());
        let leg = response.data.unwrap().leg.unwrap();
        assert_eq!(leg.realtime_state, Some(RealtimeState::Updated));
        let station = leg.to.vehicle_rental_station.unwrap();
        assert_eq!(station.available_vehicles.map(|a| a.total), Some(4));
    }

    #[test]
    fn deserialize_graphql_errors() {
        let json = r#"{ "data": null, "errors": [{ "message": "Invalid leg id" }] }"#;

        let response: GraphQlResponse<LegQueryData> = serde_json::from_str(json).unwrap();

        assert!(response.data.is_none());
        assert_eq!(response.errors[0].message, "Invalid leg id");
    }

    #[test]
    fn serialize_query_body() {
        let body = GraphQlRequest {
            query: "query Leg($id: String!) { leg(id: $id) { id } }",
            variables: LegQueryVariables { id: "leg-1" },
        };

        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["variables"]["id"], "leg-1");
    }
}
