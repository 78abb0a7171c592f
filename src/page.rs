use chrono::NaiveDate;

use crate::{
    config::{default_center, DEFAULT_ZOOM},
    gtfs::stop::{Station, StopId},
    map::{overlay::Marker, provider::MapProvider, MapView, Route, Scene},
};

pub const TITLE: &str = "NYC Transit Map";

const DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// The backend the page reads stations and lines from.
// Page events run on one task, so the futures need not be Send.
#[allow(async_fn_in_trait)]
pub trait TransitApi {
    async fn fetch_stations(&self) -> anyhow::Result<Vec<Station>>;

    async fn fetch_routes(&self, station: &StopId) -> anyhow::Result<Vec<Route>>;
}

/// A route fetch in flight. Only the most recently issued one may update the map.
#[derive(Debug)]
pub struct RouteRequest {
    generation: u64,
    pub station: StopId,
}

pub struct PageView {
    pub title: &'static str,
    pub date: String,
    pub map: Scene,
}

pub struct Page<P: MapProvider> {
    map: MapView<P>,
    stations: Vec<Station>,
    generation: u64,
}

impl<P: MapProvider> Page<P> {
    pub fn new() -> Self {
        Self {
            map: MapView::new(default_center(), DEFAULT_ZOOM),
            stations: vec![],
            generation: 0,
        }
    }

    pub fn map(&self) -> &MapView<P> {
        &self.map
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn provider_ready(&mut self, provider: P) {
        self.map.on_provider_ready(provider);
    }

    /// Loads the station list once, on mount.
    pub async fn mount<A: TransitApi>(&mut self, api: &A) {
        let result = api.fetch_stations().await;
        self.stations_loaded(result);
    }

    pub fn stations_loaded(&mut self, result: anyhow::Result<Vec<Station>>) {
        match result {
            Ok(stations) => {
                log::info!("Loaded {} stations", stations.len());
                self.stations = stations;
            }
            Err(e) => log::error!("Error fetching stations: {e:#}"),
        }
    }

    /// Handles a marker click: fetches the station's line and redraws.
    pub async fn click<A: TransitApi>(&mut self, marker: &Marker, api: &A) {
        let Some(station) = marker.on_click.clone() else {
            return;
        };

        let request = self.begin_route_fetch(station);
        let result = api.fetch_routes(&request.station).await;
        self.routes_loaded(request, result);
    }

    pub fn begin_route_fetch(&mut self, station: StopId) -> RouteRequest {
        self.generation += 1;
        RouteRequest {
            generation: self.generation,
            station,
        }
    }

    pub fn routes_loaded(&mut self, request: RouteRequest, result: anyhow::Result<Vec<Route>>) {
        if request.generation != self.generation {
            log::debug!(
                "Dropping stale line for station {} (request {} of {})",
                request.station,
                request.generation,
                self.generation
            );
            return;
        }

        match result {
            Ok(routes) => self.map.set_routes(routes),
            Err(e) => log::error!("Error fetching line for station {}: {e:#}", request.station),
        }
    }

    /// One clickable marker per station, labelled with its name.
    pub fn markers(&self) -> Vec<Marker> {
        self.stations
            .iter()
            .map(|s| {
                Marker::new(s.point)
                    .with_text(s.name.clone())
                    .clickable(s.id.clone())
            })
            .collect()
    }

    pub fn marker_for(&self, station: &StopId) -> Option<Marker> {
        self.markers()
            .into_iter()
            .find(|m| m.on_click.as_ref() == Some(station))
    }

    pub fn render(&self, today: NaiveDate) -> PageView {
        PageView {
            title: TITLE,
            date: today.format(DATE_FORMAT).to_string(),
            map: self.map.render(self.markers()),
        }
    }
}

impl<P: MapProvider> Default for Page<P> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, collections::VecDeque};

    use anyhow::anyhow;

    use super::*;
    use crate::{geo::GeoPoint, map::provider::Surface};

    /// Replays queued responses in order.
    #[derive(Default)]
    struct ScriptedApi {
        stations: RefCell<VecDeque<anyhow::Result<Vec<Station>>>>,
        routes: RefCell<VecDeque<anyhow::Result<Vec<Route>>>>,
        requested: RefCell<Vec<StopId>>,
    }

    impl TransitApi for ScriptedApi {
        async fn fetch_stations(&self) -> anyhow::Result<Vec<Station>> {
            self.stations
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("No stations scripted")))
        }

        async fn fetch_routes(&self, station: &StopId) -> anyhow::Result<Vec<Route>> {
            self.requested.borrow_mut().push(station.clone());
            self.routes
                .borrow_mut()
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("No routes scripted")))
        }
    }

    fn station_a() -> Vec<Station> {
        serde_json::from_str(r#"[{"id": 1, "lat": 40.71, "lng": -74.00, "name": "A"}]"#).unwrap()
    }

    fn route() -> Route {
        Route {
            path: vec![
                GeoPoint::new(40.71, -74.0).unwrap(),
                GeoPoint::new(40.72, -74.01).unwrap(),
            ],
            color: None,
            vehicles: vec![],
        }
    }

    fn ready_page() -> Page<Surface> {
        let mut page = Page::new();
        page.provider_ready(Surface::initialize(Some("key")).unwrap());
        page
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 5).unwrap()
    }

    #[actix_web::test]
    async fn test_mount_renders_station_marker() {
        let api = ScriptedApi::default();
        api.stations.borrow_mut().push_back(Ok(station_a()));

        let mut page = ready_page();
        page.mount(&api).await;

        let view = page.render(today());
        let markers = view.map.markers().collect::<Vec<_>>();

        assert_eq!(view.title, "NYC Transit Map");
        assert_eq!(view.date, "Tuesday, March 5, 2024");
        assert_eq!(markers.len(), 1);
        assert_eq!(markers[0].label(), "A");
        assert_eq!(markers[0].point, GeoPoint::new(40.71, -74.0).unwrap());
    }

    #[actix_web::test]
    async fn test_click_then_empty_line_clears_map() {
        let api = ScriptedApi::default();
        api.stations.borrow_mut().push_back(Ok(station_a()));
        api.routes.borrow_mut().push_back(Ok(vec![route()]));
        api.routes.borrow_mut().push_back(Ok(vec![]));

        let mut page = ready_page();
        page.mount(&api).await;

        let marker = page.marker_for(&StopId::new("1")).unwrap();
        page.click(&marker, &api).await;
        assert_eq!(page.map().lines().len(), 1);

        page.click(&marker, &api).await;
        assert!(page.map().lines().is_empty());
        assert_eq!(page.map().provider().unwrap().attached(), 0);
        assert_eq!(api.requested.borrow().len(), 2);
    }

    #[actix_web::test]
    async fn test_fetch_errors_keep_state() {
        let api = ScriptedApi::default();
        api.stations.borrow_mut().push_back(Ok(station_a()));
        api.stations.borrow_mut().push_back(Err(anyhow!("connection refused")));
        api.routes.borrow_mut().push_back(Ok(vec![route()]));
        api.routes.borrow_mut().push_back(Err(anyhow!("connection refused")));

        let mut page = ready_page();
        page.mount(&api).await;
        page.mount(&api).await;
        assert_eq!(page.stations().len(), 1);

        let marker = page.marker_for(&StopId::new("1")).unwrap();
        page.click(&marker, &api).await;
        page.click(&marker, &api).await;
        assert_eq!(page.map().lines().len(), 1);
    }

    #[actix_web::test]
    async fn test_unclickable_marker_does_nothing() {
        let api = ScriptedApi::default();
        let mut page = ready_page();

        let marker = Marker::new(GeoPoint::new(40.71, -74.0).unwrap());
        page.click(&marker, &api).await;

        assert!(api.requested.borrow().is_empty());
    }

    #[test]
    fn test_stale_line_is_dropped() {
        let mut page = ready_page();

        let first = page.begin_route_fetch(StopId::new("1"));
        let second = page.begin_route_fetch(StopId::new("2"));

        page.routes_loaded(second, Ok(vec![route(), route()]));
        page.routes_loaded(first, Ok(vec![route()]));

        assert_eq!(page.map().lines().len(), 2);
    }

    #[test]
    fn test_no_provider_renders_container_only() {
        let mut page: Page<Surface> = Page::new();
        page.stations_loaded(Ok(station_a()));
        let request = page.begin_route_fetch(StopId::new("1"));
        page.routes_loaded(request, Ok(vec![route()]));

        let view = page.render(today());
        assert!(view.map.overlays.is_empty());
        assert_eq!(view.map.zoom, 11);
        assert_eq!(view.map.center, default_center());
    }
}
