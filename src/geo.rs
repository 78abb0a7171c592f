use anyhow::ensure;
use serde::{Deserialize, Serialize};

/// A WGS84 coordinate. Always within latitude [-90, 90] and longitude [-180, 180].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "GeoPointRepr")]
pub struct GeoPoint {
    #[serde(rename = "lat")]
    latitude: f64,
    #[serde(rename = "lng")]
    longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> anyhow::Result<Self> {
        ensure!(
            latitude.is_finite() && (-90.0..=90.0).contains(&latitude),
            "Latitude out of range: {latitude}"
        );
        ensure!(
            longitude.is_finite() && (-180.0..=180.0).contains(&longitude),
            "Longitude out of range: {longitude}"
        );

        Ok(Self {
            latitude,
            longitude,
        })
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl From<GeoPoint> for geo_types::Coord {
    fn from(p: GeoPoint) -> Self {
        geo_types::coord! { x: p.longitude, y: p.latitude }
    }
}

impl From<GeoPoint> for geo_types::Point {
    fn from(p: GeoPoint) -> Self {
        geo_types::Point::new(p.longitude, p.latitude)
    }
}

// Early drafts of the line endpoint sent `[lat, lng]` pairs, later ones objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum GeoPointRepr {
    Object { lat: f64, lng: f64 },
    Pair(f64, f64),
}

impl TryFrom<GeoPointRepr> for GeoPoint {
    type Error = String;

    fn try_from(repr: GeoPointRepr) -> Result<Self, Self::Error> {
        let (lat, lng) = match repr {
            GeoPointRepr::Object { lat, lng } => (lat, lng),
            GeoPointRepr::Pair(lat, lng) => (lat, lng),
        };

        GeoPoint::new(lat, lng).map_err(|e| e.to_string())
    }
}
