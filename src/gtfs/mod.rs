pub mod io;
pub mod route;
pub mod stop;
pub mod trip;

use std::{
    collections::{HashMap, HashSet},
    io::Read,
    path::Path,
};

use anyhow::Context;
use itertools::Itertools;
use serde::Serialize;

use crate::{
    geo::GeoPoint,
    gtfs::{
        io::{read_file, read_records},
        route::{Route, RouteId},
        stop::{Station, Stop, StopId},
        trip::{ShapeId, ShapePoint, StopTime, Trip, TripId},
    },
};

#[derive(Debug, Serialize)]
pub struct ShapeCoordinates {
    pub shape_id: String,
    pub coordinates: Vec<GeoPoint>,
}

#[derive(Debug, Serialize)]
pub struct RouteShapes {
    pub route_id: RouteId,
    pub shapes: Vec<ShapeCoordinates>,
}

#[derive(Debug, Serialize)]
pub struct RouteStops {
    pub route_id: RouteId,
    pub stops: Vec<Station>,
}

/// Static GTFS data held in memory, indexed for the map queries.
pub struct Gtfs {
    stops: Vec<Stop>,
    stations: Vec<Station>,
    stop_points: HashMap<StopId, GeoPoint>,
    routes: Vec<Route>,
    trips: Vec<Trip>,
    shapes: HashMap<ShapeId, Vec<GeoPoint>>,
    stop_times: HashMap<TripId, Vec<StopId>>,
}

impl Gtfs {
    pub fn read<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let dir = path.as_ref();

        let stops = read_file(dir.join("stops.txt"))?;
        let routes = read_file(dir.join("routes.txt"))?;
        let trips = read_file(dir.join("trips.txt"))?;
        let stop_times = read_file(dir.join("stop_times.txt"))?;

        // shapes.txt is optional in GTFS
        let shapes_path = dir.join("shapes.txt");
        let shapes = if shapes_path.is_file() {
            read_file(shapes_path)?
        } else {
            log::warn!("No shapes.txt in {}, lines will follow stops", dir.display());
            vec![]
        };

        Self::new(stops, routes, trips, shapes, stop_times)
    }

    pub fn parse<R: Read>(
        stops: R,
        routes: R,
        trips: R,
        shapes: R,
        stop_times: R,
    ) -> anyhow::Result<Self> {
        Self::new(
            read_records(stops).context("stops.txt")?,
            read_records(routes).context("routes.txt")?,
            read_records(trips).context("trips.txt")?,
            read_records(shapes).context("shapes.txt")?,
            read_records(stop_times).context("stop_times.txt")?,
        )
    }

    fn new(
        stops: Vec<Stop>,
        routes: Vec<Route>,
        trips: Vec<Trip>,
        shape_points: Vec<ShapePoint>,
        stop_times: Vec<StopTime>,
    ) -> anyhow::Result<Self> {
        let mut stop_points = HashMap::with_capacity(stops.len());
        for stop in stops.iter() {
            let point = stop
                .point()
                .with_context(|| format!("Stop {} has invalid coordinates", stop.id))?;
            stop_points.insert(stop.id.clone(), point);
        }

        let stations = stops
            .iter()
            .filter(|s| s.is_station())
            .map(Station::try_from)
            .collect::<anyhow::Result<Vec<_>>>()?;

        let mut shapes = HashMap::new();
        for (shape_id, points) in shape_points.into_iter().into_group_map_by(|p| p.shape_id.clone())
        {
            let path = points
                .into_iter()
                .sorted_by_key(|p| p.sequence)
                .map(|p| GeoPoint::new(p.lat, p.lng))
                .collect::<anyhow::Result<Vec<_>>>()
                .with_context(|| format!("Shape {} has invalid coordinates", shape_id.as_str()))?;
            shapes.insert(shape_id, path);
        }

        let stop_times = stop_times
            .into_iter()
            .into_group_map_by(|st| st.trip_id.clone())
            .into_iter()
            .map(|(trip_id, times)| {
                let stops = times
                    .into_iter()
                    .sorted_by_key(|st| st.stop_sequence)
                    .map(|st| st.stop_id)
                    .collect();
                (trip_id, stops)
            })
            .collect();

        Ok(Self {
            stops,
            stations,
            stop_points,
            routes,
            trips,
            shapes,
            stop_times,
        })
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    fn trips_for_route<'a>(&'a self, route_id: &'a RouteId) -> impl Iterator<Item = &'a Trip> {
        self.trips.iter().filter(move |t| &t.route_id == route_id)
    }

    fn trip_stops(&self, trip_id: &TripId) -> &[StopId] {
        self.stop_times
            .get(trip_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Resolves a line id: a route id, or else a stop/parent station id,
    /// in which case the route of the first trip calling there is used.
    pub fn resolve_route(&self, id: &str) -> Option<RouteId> {
        if let Some(route) = self.routes.iter().find(|r| r.id == RouteId::new(id)) {
            return Some(route.id.clone());
        }

        let platforms: HashSet<&StopId> = self
            .stops
            .iter()
            .filter(|s| s.id.as_str() == id || s.parent_station.as_deref() == Some(id))
            .map(|s| &s.id)
            .collect();

        if platforms.is_empty() {
            return None;
        }

        self.trips
            .iter()
            .find(|t| self.trip_stops(&t.id).iter().any(|s| platforms.contains(s)))
            .map(|t| t.route_id.clone())
    }

    /// Coordinates of a line: its first shape, or the stops of its first trip.
    pub fn line(&self, id: &str) -> Option<Vec<GeoPoint>> {
        let route_id = self.resolve_route(id)?;

        let shape = self
            .trips_for_route(&route_id)
            .find_map(|t| t.shape_id.as_ref())
            .and_then(|shape_id| self.shapes.get(shape_id))
            .filter(|path| !path.is_empty());

        if let Some(path) = shape {
            log::debug!("Line {id} follows shape of route {route_id}");
            return Some(path.clone());
        }

        let trip = self.trips_for_route(&route_id).next()?;
        let coordinates = self
            .trip_stops(&trip.id)
            .iter()
            .filter_map(|s| self.stop_points.get(s).copied())
            .collect::<Vec<_>>();

        log::debug!("Line {id} built from {} stops", coordinates.len());

        if coordinates.is_empty() {
            None
        } else {
            Some(coordinates)
        }
    }

    pub fn line_shapes(&self, route_id: &str) -> Option<RouteShapes> {
        let route_id = RouteId::new(route_id);

        let shapes = self
            .trips_for_route(&route_id)
            .filter_map(|t| t.shape_id.as_ref())
            .unique()
            .map(|shape_id| ShapeCoordinates {
                shape_id: shape_id.as_str().to_owned(),
                coordinates: self.shapes.get(shape_id).cloned().unwrap_or_default(),
            })
            .collect::<Vec<_>>();

        if shapes.is_empty() {
            return None;
        }

        Some(RouteShapes { route_id, shapes })
    }

    pub fn stops_for_route(&self, route_id: &str) -> Option<RouteStops> {
        let route_id = RouteId::new(route_id);

        let mut trips = self.trips_for_route(&route_id).peekable();
        trips.peek()?;

        let served: HashSet<&StopId> = trips
            .flat_map(|t| self.trip_stops(&t.id).iter())
            .collect();

        let stops = self
            .stops
            .iter()
            .filter(|s| served.contains(&s.id))
            .map(Station::try_from)
            .collect::<anyhow::Result<Vec<_>>>()
            .ok()?;

        Some(RouteStops { route_id, stops })
    }
}
