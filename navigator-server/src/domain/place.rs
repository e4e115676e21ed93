//! Leg endpoints.

/// A stop reference on a transit endpoint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopRef {
    /// GTFS id, e.g. "HSL:1040129"
    pub gtfs_id: String,
    pub name: Option<String>,
    /// Rider-facing stop code
    pub code: Option<String>,
}

/// A city-bike (or other rental vehicle) station and its availability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalStation {
    pub station_id: String,
    pub name: Option<String>,
    pub vehicles_available: Option<u32>,
    pub spaces_available: Option<u32>,
    /// False when the station is closed for the season
    pub operative: Option<bool>,
}

impl RentalStation {
    /// Returns true if a vehicle can be picked up here right now.
    pub fn has_vehicles(&self) -> bool {
        self.operative != Some(false) && self.vehicles_available.is_some_and(|n| n > 0)
    }
}

/// A free-floating rental vehicle, e.g. a scooter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RentalVehicle {
    pub vehicle_id: String,
    pub name: Option<String>,
}

/// One end of a leg.
#[derive(Debug, Clone, PartialEq)]
pub struct Place {
    pub name: Option<String>,
    pub lat: f64,
    pub lon: f64,
    pub stop: Option<StopRef>,
    pub vehicle_rental_station: Option<RentalStation>,
    pub rental_vehicle: Option<RentalVehicle>,
}

impl Place {
    /// A bare coordinate with no stop or rental references.
    pub fn new(lat: f64, lon: f64) -> Self {
        Self {
            name: None,
            lat,
            lon,
            stop: None,
            vehicle_rental_station: None,
            rental_vehicle: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(vehicles: Option<u32>, operative: Option<bool>) -> RentalStation {
        RentalStation {
            station_id: "smoove:042".into(),
            name: None,
            vehicles_available: vehicles,
            spaces_available: Some(4),
            operative,
        }
    }

    #[test]
    fn station_availability() {
        assert!(station(Some(2), Some(true)).has_vehicles());
        assert!(station(Some(2), None).has_vehicles());
        assert!(!station(Some(0), Some(true)).has_vehicles());
        assert!(!station(Some(5), Some(false)).has_vehicles());
        assert!(!station(None, Some(true)).has_vehicles());
    }
}
