pub mod overlay;
pub mod provider;

use serde::{Deserialize, Serialize};

use crate::{
    geo::GeoPoint,
    map::{
        overlay::{LineStyle, Marker, Overlay, Polyline},
        provider::MapProvider,
    },
};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vehicle {
    pub name: String,
    #[serde(flatten)]
    pub point: GeoPoint,
}

/// One transit line to draw, with the vehicles currently running on it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    pub path: Vec<GeoPoint>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub vehicles: Vec<Vehicle>,
}

impl Route {
    pub fn polyline(&self) -> Polyline {
        Polyline {
            path: self.path.clone(),
            style: LineStyle::with_color(self.color.as_deref()),
        }
    }
}

/// What the map shows: the viewport, plus every overlay once the provider is up.
#[derive(Debug)]
pub struct Scene {
    pub center: GeoPoint,
    pub zoom: u8,
    pub overlays: Vec<Overlay>,
}

impl Scene {
    pub fn markers(&self) -> impl Iterator<Item = &Marker> {
        self.overlays.iter().filter_map(|o| match o {
            Overlay::Marker(m) => Some(m),
            Overlay::Line(_) => None,
        })
    }

    pub fn lines(&self) -> impl Iterator<Item = &Polyline> {
        self.overlays.iter().filter_map(|o| match o {
            Overlay::Line(l) => Some(l),
            Overlay::Marker(_) => None,
        })
    }

    pub fn to_geojson(&self) -> anyhow::Result<String> {
        overlay::to_feature_collection_string(&self.overlays)
    }
}

/// Map widget state. Owns the provider once it is ready and one line handle
/// per route, in route order, as of the last sync.
pub struct MapView<P: MapProvider> {
    center: GeoPoint,
    zoom: u8,
    routes: Vec<Route>,
    provider: Option<P>,
    lines: Vec<P::Line>,
}

impl<P: MapProvider> MapView<P> {
    pub fn new(center: GeoPoint, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            routes: vec![],
            provider: None,
            lines: vec![],
        }
    }

    /// Called by the provider once its engine is up. A second call replaces
    /// the provider; lines on the old surface are detached first.
    pub fn on_provider_ready(&mut self, provider: P) {
        if let Some(mut old) = self.provider.take() {
            log::debug!("Map provider replaced");
            for line in self.lines.drain(..) {
                old.detach(line);
            }
        }

        self.provider = Some(provider);
        self.sync();
    }

    pub fn set_routes(&mut self, routes: Vec<Route>) {
        self.routes = routes;
        self.sync();
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    pub fn provider(&self) -> Option<&P> {
        self.provider.as_ref()
    }

    pub fn lines(&self) -> &[P::Line] {
        &self.lines
    }

    /// Clears every drawn line and redraws one per route. Without a provider
    /// nothing is touched and the last drawing stays.
    fn sync(&mut self) {
        let Some(provider) = self.provider.as_mut() else {
            log::debug!("Map provider not ready, skipping redraw");
            return;
        };

        for line in self.lines.drain(..) {
            provider.detach(line);
        }

        for route in self.routes.iter() {
            let line = provider.draw(route.polyline());
            self.lines.push(line);
        }

        log::debug!("Drew {} lines", self.lines.len());
    }

    /// Renders `markers` (the page's children) along with vehicle markers and
    /// the drawn lines. Before the provider is ready only the viewport renders.
    pub fn render(&self, markers: Vec<Marker>) -> Scene {
        let mut scene = Scene {
            center: self.center,
            zoom: self.zoom,
            overlays: vec![],
        };

        let Some(provider) = self.provider.as_ref() else {
            return scene;
        };

        scene.overlays.extend(markers.into_iter().map(Overlay::Marker));

        let vehicles = self.routes.iter().flat_map(|r| r.vehicles.iter());
        scene.overlays.extend(
            vehicles.map(|v| Overlay::Marker(Marker::new(v.point).with_text(v.name.clone()))),
        );

        scene.overlays.extend(
            self.lines
                .iter()
                .filter_map(|l| provider.drawn(l))
                .cloned()
                .map(Overlay::Line),
        );

        scene
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::provider::Surface;

    fn point(lat: f64, lng: f64) -> GeoPoint {
        GeoPoint::new(lat, lng).unwrap()
    }

    fn blue_route() -> Route {
        serde_json::from_str(r##"{"path": [[40.71, -74.00], [40.72, -74.01]], "color": "#00F"}"##)
            .unwrap()
    }

    fn ready_map() -> MapView<Surface> {
        let mut map = MapView::new(point(40.7128, -74.006), 11);
        map.on_provider_ready(Surface::initialize(Some("key")).unwrap());
        map
    }

    fn drawn_lines(map: &MapView<Surface>) -> Vec<Polyline> {
        let surface = map.provider().unwrap();
        map.lines()
            .iter()
            .map(|l| surface.drawn(l).unwrap().clone())
            .collect()
    }

    #[test]
    fn test_single_blue_route() {
        let mut map = ready_map();
        map.set_routes(vec![blue_route()]);

        let lines = drawn_lines(&map);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].path, vec![point(40.71, -74.0), point(40.72, -74.01)]);
        assert_eq!(lines[0].style.stroke_color, "#00F");
        assert_eq!(lines[0].style.stroke_opacity, 1.0);
        assert_eq!(lines[0].style.stroke_weight, 3);
    }

    #[test]
    fn test_lines_match_routes_in_order() {
        let mut map = ready_map();
        let routes = vec![
            blue_route(),
            Route {
                path: vec![],
                color: None,
                vehicles: vec![],
            },
            Route {
                path: vec![point(40.75, -73.98)],
                color: Some("#EE352E".to_owned()),
                vehicles: vec![],
            },
        ];
        map.set_routes(routes.clone());

        let lines = drawn_lines(&map);
        assert_eq!(lines.len(), routes.len());
        for (line, route) in lines.iter().zip(routes.iter()) {
            assert_eq!(line.path, route.path);
        }
        assert_eq!(lines[1].style.stroke_color, "#FF0000");
        assert_eq!(map.provider().unwrap().attached(), 3);
    }

    #[test]
    fn test_resync_replaces_handles() {
        let mut map = ready_map();
        map.set_routes(vec![blue_route()]);
        let before = drawn_lines(&map);
        let first = map.lines()[0].clone();

        map.set_routes(vec![blue_route()]);
        let after = drawn_lines(&map);

        assert_eq!(before, after);
        assert_ne!(map.lines()[0], first);
        assert!(map.provider().unwrap().drawn(&first).is_none());
        assert_eq!(map.provider().unwrap().attached(), 1);
    }

    #[test]
    fn test_sync_waits_for_provider() {
        let mut map: MapView<Surface> = MapView::new(point(40.7128, -74.006), 11);
        map.set_routes(vec![blue_route()]);

        assert!(map.lines().is_empty());
        assert!(map.render(vec![]).overlays.is_empty());

        map.on_provider_ready(Surface::initialize(Some("key")).unwrap());
        assert_eq!(drawn_lines(&map).len(), 1);
    }

    #[test]
    fn test_empty_routes_clear_lines() {
        let mut map = ready_map();
        map.set_routes(vec![blue_route(), blue_route()]);
        map.set_routes(vec![]);

        assert!(map.lines().is_empty());
        assert_eq!(map.provider().unwrap().attached(), 0);
    }

    #[test]
    fn test_replacing_provider_redraws() {
        let mut map = ready_map();
        map.set_routes(vec![blue_route()]);

        map.on_provider_ready(Surface::initialize(Some("other")).unwrap());
        assert_eq!(drawn_lines(&map).len(), 1);
        assert_eq!(map.provider().unwrap().attached(), 1);
    }

    #[test]
    fn test_render_markers_vehicles_and_lines() {
        let mut map = ready_map();
        let mut route = blue_route();
        route.vehicles.push(Vehicle {
            name: "A train".to_owned(),
            point: point(40.715, -74.005),
        });
        map.set_routes(vec![route]);

        let scene = map.render(vec![Marker::new(point(40.71, -74.0)).with_text("A")]);
        let labels = scene.markers().map(Marker::label).collect::<Vec<_>>();

        assert_eq!(labels, vec!["A", "A train"]);
        assert_eq!(scene.lines().count(), 1);
        assert_eq!(scene.zoom, 11);
    }
}
