use std::fmt;

use serde::{Deserialize, Serialize};

use crate::geo::GeoPoint;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StopId(String);

impl StopId {
    pub fn new(str: &str) -> Self {
        Self(str.to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StopId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// Some backends hand out numeric station ids.
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Text(String),
    Number(i64),
}

fn text_or_number<'de, D>(deserializer: D) -> Result<StopId, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => StopId(s),
        IdRepr::Number(n) => StopId(n.to_string()),
    })
}

/// A row of stops.txt.
#[derive(Debug, Clone, Deserialize)]
pub struct Stop {
    #[serde(rename = "stop_id")]
    pub id: StopId,
    #[serde(rename = "stop_name")]
    pub name: String,
    #[serde(rename = "stop_lat")]
    pub lat: f64,
    #[serde(rename = "stop_lon")]
    pub lng: f64,
    #[serde(default)]
    pub location_type: Option<String>,
    #[serde(default)]
    pub parent_station: Option<String>,
}

impl Stop {
    /// Stops and platforms, as opposed to entrances, nodes and boarding areas.
    pub fn is_station(&self) -> bool {
        matches!(self.location_type.as_deref(), None | Some("") | Some("0"))
    }

    pub fn point(&self) -> anyhow::Result<GeoPoint> {
        GeoPoint::new(self.lat, self.lng)
    }
}

/// A stop as served to the map page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Station {
    #[serde(deserialize_with = "text_or_number")]
    pub id: StopId,
    pub name: String,
    #[serde(flatten)]
    pub point: GeoPoint,
}

impl TryFrom<&Stop> for Station {
    type Error = anyhow::Error;

    fn try_from(stop: &Stop) -> Result<Self, Self::Error> {
        Ok(Self {
            id: stop.id.clone(),
            name: stop.name.clone(),
            point: stop.point()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_station_wire_format() {
        let station = Station {
            id: StopId::new("101"),
            name: "Van Cortlandt Park-242 St".to_owned(),
            point: GeoPoint::new(40.889248, -73.898583).unwrap(),
        };

        assert_eq!(
            serde_json::to_value(&station).unwrap(),
            serde_json::json!({
                "id": "101",
                "name": "Van Cortlandt Park-242 St",
                "lat": 40.889248,
                "lng": -73.898583,
            })
        );
    }

    #[test]
    fn test_station_numeric_id() {
        let stations: Vec<Station> =
            serde_json::from_str(r#"[{"id": 1, "lat": 40.71, "lng": -74.00, "name": "A"}]"#)
                .unwrap();

        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, StopId::new("1"));
        assert_eq!(stations[0].point, GeoPoint::new(40.71, -74.0).unwrap());
    }

    #[test]
    fn test_is_station() {
        let mut stop = Stop {
            id: StopId::new("101N"),
            name: "Van Cortlandt Park-242 St".to_owned(),
            lat: 40.889248,
            lng: -73.898583,
            location_type: None,
            parent_station: Some("101".to_owned()),
        };
        assert!(stop.is_station());

        stop.location_type = Some("0".to_owned());
        assert!(stop.is_station());

        stop.location_type = Some("1".to_owned());
        assert!(!stop.is_station());
    }
}
