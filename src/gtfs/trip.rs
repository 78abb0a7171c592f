use serde::Deserialize;

use crate::gtfs::{route::RouteId, stop::StopId};

#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
pub struct TripId(String);

#[derive(Clone, Debug, Eq, PartialEq, Hash, Deserialize)]
pub struct ShapeId(String);

impl ShapeId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A row of trips.txt.
#[derive(Debug, Clone, Deserialize)]
pub struct Trip {
    #[serde(rename = "trip_id")]
    pub id: TripId,
    pub route_id: RouteId,
    #[serde(default)]
    pub shape_id: Option<ShapeId>,
}

/// A row of stop_times.txt.
#[derive(Debug, Clone, Deserialize)]
pub struct StopTime {
    pub trip_id: TripId,
    pub stop_id: StopId,
    pub stop_sequence: u32,
}

/// A row of shapes.txt.
#[derive(Debug, Clone, Deserialize)]
pub struct ShapePoint {
    pub shape_id: ShapeId,
    #[serde(rename = "shape_pt_lat")]
    pub lat: f64,
    #[serde(rename = "shape_pt_lon")]
    pub lng: f64,
    #[serde(rename = "shape_pt_sequence")]
    pub sequence: u32,
}
