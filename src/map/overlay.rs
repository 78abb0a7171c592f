use serde::Serialize;

use crate::{geo::GeoPoint, gtfs::stop::StopId};

/// Shown when a marker has no text of its own.
pub const PIN_GLYPH: &str = "📍";

pub const FALLBACK_LINE_COLOR: &str = "#FF0000";

/// A label pinned to a point. Clicking it asks the page for that station's line.
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub point: GeoPoint,
    pub text: Option<String>,
    pub on_click: Option<StopId>,
}

impl Marker {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            point,
            text: None,
            on_click: None,
        }
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn clickable(mut self, station: StopId) -> Self {
        self.on_click = Some(station);
        self
    }

    pub fn label(&self) -> &str {
        self.text.as_deref().unwrap_or(PIN_GLYPH)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineStyle {
    pub stroke_color: String,
    pub stroke_opacity: f32,
    pub stroke_weight: u32,
    pub geodesic: bool,
}

impl LineStyle {
    pub fn with_color(color: Option<&str>) -> Self {
        Self {
            stroke_color: color.unwrap_or(FALLBACK_LINE_COLOR).to_owned(),
            stroke_opacity: 1.0,
            stroke_weight: 3,
            geodesic: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub path: Vec<GeoPoint>,
    pub style: LineStyle,
}

/// Anything drawn on the map surface.
#[derive(Debug, Clone, PartialEq)]
pub enum Overlay {
    Marker(Marker),
    Line(Polyline),
}

#[derive(Serialize)]
struct OverlayFeature<'a> {
    geometry: geojson::Geometry,
    kind: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    station: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    color: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    opacity: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    weight: Option<u32>,
}

impl<'a> From<&'a Overlay> for OverlayFeature<'a> {
    fn from(overlay: &'a Overlay) -> Self {
        match overlay {
            Overlay::Marker(m) => {
                let point: geo_types::Point = m.point.into();
                OverlayFeature {
                    geometry: geojson::Geometry::new(geojson::Value::from(&point)),
                    kind: "marker",
                    label: Some(m.label()),
                    station: m.on_click.as_ref().map(StopId::as_str),
                    color: None,
                    opacity: None,
                    weight: None,
                }
            }
            Overlay::Line(l) => {
                let line = l
                    .path
                    .iter()
                    .map(|p| geo_types::Coord::from(*p))
                    .collect::<geo_types::LineString>();
                OverlayFeature {
                    geometry: geojson::Geometry::new(geojson::Value::from(&line)),
                    kind: "line",
                    label: None,
                    station: None,
                    color: Some(&l.style.stroke_color),
                    opacity: Some(l.style.stroke_opacity),
                    weight: Some(l.style.stroke_weight),
                }
            }
        }
    }
}

pub fn to_feature_collection_string(overlays: &[Overlay]) -> anyhow::Result<String> {
    let features = overlays.iter().map(OverlayFeature::from).collect::<Vec<_>>();

    Ok(geojson::ser::to_feature_collection_string(&features)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_default_label() {
        let point = GeoPoint::new(40.71, -74.0).unwrap();

        assert_eq!(Marker::new(point).label(), PIN_GLYPH);
        assert_eq!(Marker::new(point).with_text("A").label(), "A");
    }

    #[test]
    fn test_line_style_fallback() {
        assert_eq!(LineStyle::with_color(None).stroke_color, "#FF0000");
        assert_eq!(LineStyle::with_color(Some("#00F")).stroke_color, "#00F");
    }

    #[test]
    fn test_feature_collection() {
        let a = GeoPoint::new(40.71, -74.0).unwrap();
        let b = GeoPoint::new(40.72, -74.01).unwrap();
        let overlays = vec![
            Overlay::Marker(Marker::new(a).with_text("A").clickable(StopId::new("1"))),
            Overlay::Line(Polyline {
                path: vec![a, b],
                style: LineStyle::with_color(Some("#00F")),
            }),
        ];

        let json: serde_json::Value =
            serde_json::from_str(&to_feature_collection_string(&overlays).unwrap()).unwrap();
        let features = json["features"].as_array().unwrap();

        assert_eq!(features.len(), 2);
        assert_eq!(features[0]["geometry"]["type"], "Point");
        assert_eq!(features[0]["geometry"]["coordinates"], serde_json::json!([-74.0, 40.71]));
        assert_eq!(features[0]["properties"]["label"], "A");
        assert_eq!(features[0]["properties"]["station"], "1");
        assert_eq!(features[1]["geometry"]["type"], "LineString");
        assert_eq!(features[1]["properties"]["color"], "#00F");
        assert_eq!(features[1]["properties"]["weight"], 3);
    }
}
