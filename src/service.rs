use std::{collections::BTreeMap, sync::Arc};

use serde::Serialize;

use crate::{
    cache::{CacheStats, TtlCache},
    config::{cache_timeout, subway_feed_for_route, Category},
    geo::GeoPoint,
    gtfs::{route::Route as RouteInfo, stop::Station, Gtfs, RouteShapes, RouteStops},
    map::{Route, Vehicle},
    realtime::FeedSnapshot,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Invalid {category} feed: {id}")]
    InvalidFeed { category: &'static str, id: String },
    #[error("{0}")]
    NotFound(String),
    #[error("HTTP error: {0}")]
    UpstreamStatus(reqwest::StatusCode),
    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),
    #[error("{0:#}")]
    Decode(anyhow::Error),
}

#[derive(Debug, Serialize)]
pub struct AvailableFeeds {
    pub subway: Vec<&'static str>,
    pub lirr: Vec<&'static str>,
    pub mnr: Vec<&'static str>,
    pub alerts: Vec<&'static str>,
    pub accessibility: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ServiceCacheStats {
    pub feeds: CacheStats,
    pub documents: CacheStats,
    pub lines: CacheStats,
    pub shapes: CacheStats,
    pub route_stops: CacheStats,
}

#[derive(Debug, Serialize)]
pub struct StationAccessibility {
    pub station_id: String,
    pub equipment_count: usize,
    pub equipment: Vec<serde_json::Value>,
}

fn feed_ids(category: Category) -> Vec<&'static str> {
    category.feeds().iter().map(|(id, _)| *id).collect()
}

/// Answers every `/api` query: static GTFS lookups and cached realtime feeds.
pub struct DataService {
    gtfs: Gtfs,
    client: reqwest::Client,
    feeds: TtlCache<Arc<FeedSnapshot>>,
    documents: TtlCache<Arc<serde_json::Value>>,
    lines: TtlCache<Arc<Vec<GeoPoint>>>,
    shapes: TtlCache<Arc<RouteShapes>>,
    route_stops: TtlCache<Arc<RouteStops>>,
}

impl DataService {
    pub fn new(gtfs: Gtfs) -> Self {
        Self {
            gtfs,
            client: reqwest::Client::new(),
            feeds: TtlCache::new(),
            documents: TtlCache::new(),
            lines: TtlCache::new(),
            shapes: TtlCache::new(),
            route_stops: TtlCache::new(),
        }
    }

    pub fn available_feeds(&self) -> AvailableFeeds {
        AvailableFeeds {
            subway: feed_ids(Category::Subway),
            lirr: feed_ids(Category::Lirr),
            mnr: feed_ids(Category::Mnr),
            alerts: feed_ids(Category::Alerts),
            accessibility: feed_ids(Category::Accessibility),
        }
    }

    pub fn subway_feeds(&self) -> BTreeMap<&'static str, &'static str> {
        Category::Subway.feeds().iter().copied().collect()
    }

    pub fn cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats {
            feeds: self.feeds.stats(),
            documents: self.documents.stats(),
            lines: self.lines.stats(),
            shapes: self.shapes.stats(),
            route_stops: self.route_stops.stats(),
        }
    }

    pub fn clear_cache(&self) {
        self.feeds.clear();
        self.documents.clear();
        self.lines.clear();
        self.shapes.clear();
        self.route_stops.clear();
        log::info!("Cache cleared");
    }

    pub fn stations(&self) -> &[Station] {
        self.gtfs.stations()
    }

    pub fn routes(&self) -> &[RouteInfo] {
        self.gtfs.routes()
    }

    pub fn line(&self, id: &str) -> Result<Arc<Vec<GeoPoint>>, ServiceError> {
        let key = format!("line_{id}");
        if let Some(line) = self.lines.get(&key, cache_timeout(Category::Lines, id)) {
            return Ok(line);
        }

        let line = self
            .gtfs
            .line(id)
            .map(Arc::new)
            .ok_or_else(|| ServiceError::NotFound(format!("No data found for line {id}")))?;
        self.lines.set(key, line.clone());

        Ok(line)
    }

    pub fn line_shapes(&self, route_id: &str) -> Result<Arc<RouteShapes>, ServiceError> {
        let key = format!("line_shape_{route_id}");
        if let Some(shapes) = self.shapes.get(&key, cache_timeout(Category::Lines, route_id)) {
            return Ok(shapes);
        }

        let shapes = self.gtfs.line_shapes(route_id).map(Arc::new).ok_or_else(|| {
            ServiceError::NotFound(format!("No shapes found for route: {route_id}"))
        })?;
        self.shapes.set(key, shapes.clone());

        Ok(shapes)
    }

    pub fn stops_for_route(&self, route_id: &str) -> Result<Arc<RouteStops>, ServiceError> {
        let key = format!("route_stops_{route_id}");
        let timeout = cache_timeout(Category::RouteStops, route_id);
        if let Some(stops) = self.route_stops.get(&key, timeout) {
            return Ok(stops);
        }

        let stops = self
            .gtfs
            .stops_for_route(route_id)
            .map(Arc::new)
            .ok_or_else(|| ServiceError::NotFound(format!("No trips found for route: {route_id}")))?;
        self.route_stops.set(key, stops.clone());

        Ok(stops)
    }

    async fn fetch(&self, url: &str) -> Result<reqwest::Response, ServiceError> {
        log::debug!("Fetching {url}");
        let response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::UpstreamStatus(response.status()));
        }

        Ok(response)
    }

    /// A GTFS-realtime feed of the subway, LIRR, Metro-North or alert category.
    pub async fn realtime_feed(
        &self,
        category: Category,
        feed_id: &str,
    ) -> Result<Arc<FeedSnapshot>, ServiceError> {
        let url = category
            .feed_url(feed_id)
            .ok_or_else(|| ServiceError::InvalidFeed {
                category: category.as_str(),
                id: feed_id.to_owned(),
            })?;

        let key = format!("{}_{feed_id}", category.as_str());
        if let Some(snapshot) = self.feeds.get(&key, cache_timeout(category, feed_id)) {
            return Ok(snapshot);
        }

        let body = self.fetch(url).await?.bytes().await?;
        let snapshot =
            Arc::new(FeedSnapshot::decode(&body, feed_id).map_err(ServiceError::Decode)?);
        log::info!("Fetched {key}: {} entities", snapshot.entities.len());
        self.feeds.set(key, snapshot.clone());

        Ok(snapshot)
    }

    /// Elevator and escalator data, passed through as JSON.
    pub async fn accessibility(
        &self,
        data_type: &str,
    ) -> Result<Arc<serde_json::Value>, ServiceError> {
        let category = Category::Accessibility;
        let url = category
            .feed_url(data_type)
            .ok_or_else(|| ServiceError::InvalidFeed {
                category: "accessibility data",
                id: data_type.to_owned(),
            })?;

        let key = format!("{}_{data_type}", category.as_str());
        if let Some(document) = self.documents.get(&key, cache_timeout(category, data_type)) {
            return Ok(document);
        }

        let document: serde_json::Value = self.fetch(url).await?.json().await?;
        let document = Arc::new(document);
        self.documents.set(key, document.clone());

        Ok(document)
    }

    pub async fn station_accessibility(
        &self,
        station_id: &str,
    ) -> Result<StationAccessibility, ServiceError> {
        let document = self.accessibility("equipment").await?;

        Ok(equipment_at(&document, station_id))
    }

    /// The full route behind a line id: path, color and live vehicles.
    /// Vehicles are best effort; a failing feed leaves them empty.
    pub async fn route_detail(&self, id: &str) -> Result<Route, ServiceError> {
        let route_id = self
            .gtfs
            .resolve_route(id)
            .ok_or_else(|| ServiceError::NotFound(format!("No data found for line {id}")))?;
        let path = self.line(id)?;

        let color = self
            .gtfs
            .routes()
            .iter()
            .find(|r| r.id == route_id)
            .filter(|r| !r.color.is_empty())
            .map(|r| format!("#{}", r.color));

        let route_id = route_id.to_string();
        let vehicles = match subway_feed_for_route(&route_id) {
            Some(feed_id) => match self.realtime_feed(Category::Subway, feed_id).await {
                Ok(snapshot) => vehicles_on_route(&snapshot, &route_id),
                Err(e) => {
                    log::warn!("No live vehicles for route {route_id}: {e}");
                    vec![]
                }
            },
            None => vec![],
        };

        Ok(Route {
            path: path.to_vec(),
            color,
            vehicles,
        })
    }
}

fn vehicles_on_route(snapshot: &FeedSnapshot, route_id: &str) -> Vec<Vehicle> {
    snapshot
        .positioned_vehicles()
        .filter(|(_, v, _)| v.trip.as_ref().is_some_and(|t| t.route_id == route_id))
        .filter_map(|(entity, vehicle, position)| {
            let point =
                GeoPoint::new(position.latitude as f64, position.longitude as f64).ok()?;
            let name = vehicle
                .trip
                .as_ref()
                .map(|t| t.trip_id.clone())
                .filter(|id| !id.is_empty())
                .unwrap_or_else(|| entity.id.clone());
            Some(Vehicle { name, point })
        })
        .collect()
}

fn equipment_at(document: &serde_json::Value, station_id: &str) -> StationAccessibility {
    // The equipment list is either the document itself or under "equipment"
    let items = document
        .as_array()
        .or_else(|| document.get("equipment").and_then(|e| e.as_array()));

    let equipment = items
        .into_iter()
        .flatten()
        .filter(|item| item.get("station_id").and_then(|s| s.as_str()) == Some(station_id))
        .cloned()
        .collect::<Vec<_>>();

    StationAccessibility {
        station_id: station_id.to_owned(),
        equipment_count: equipment.len(),
        equipment,
    }
}
