use anyhow::{bail, Context};
use serde::de::DeserializeOwned;

use crate::{
    geo::GeoPoint,
    gtfs::stop::{Station, StopId},
    map::Route,
    page::TransitApi,
};

/// Talks to the `/api` endpoints of a running backend.
pub struct HttpTransitApi {
    base_url: String,
    client: reqwest::Client,
    detailed: bool,
}

impl HttpTransitApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            client: reqwest::Client::new(),
            detailed: false,
        }
    }

    /// Ask for full routes (color and live vehicles) instead of bare paths.
    pub fn detailed(mut self, detailed: bool) -> Self {
        self.detailed = detailed;
        self
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .with_context(|| format!("Request to {url} failed"))?;

        if !response.status().is_success() {
            bail!("HTTP {} from {url}", response.status());
        }

        response
            .json()
            .await
            .with_context(|| format!("Invalid response from {url}"))
    }
}

/// A bare line becomes a single uncolored route; an empty one draws nothing.
pub fn routes_from_path(path: Vec<GeoPoint>) -> Vec<Route> {
    if path.is_empty() {
        return vec![];
    }

    vec![Route {
        path,
        color: None,
        vehicles: vec![],
    }]
}

impl TransitApi for HttpTransitApi {
    async fn fetch_stations(&self) -> anyhow::Result<Vec<Station>> {
        self.get_json("/api/stations").await
    }

    async fn fetch_routes(&self, station: &StopId) -> anyhow::Result<Vec<Route>> {
        if self.detailed {
            let route: Route = self.get_json(&format!("/api/line/{station}/route")).await?;
            return Ok(vec![route]);
        }

        let path: Vec<GeoPoint> = self.get_json(&format!("/api/line/{station}")).await?;
        Ok(routes_from_path(path))
    }
}

#[cfg(test)]
mod tests {
    use actix_web::{web::Data, App, HttpServer};

    use super::*;
    use crate::{
        api,
        service::tests::{preload_num_s_feed, service},
    };

    #[test]
    fn test_routes_from_path() {
        assert!(routes_from_path(vec![]).is_empty());

        let path: Vec<GeoPoint> =
            serde_json::from_str(r#"[{"lat": 40.71, "lng": -74.0}, {"lat": 40.72, "lng": -74.01}]"#)
                .unwrap();
        let routes = routes_from_path(path);

        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path.len(), 2);
        assert_eq!(routes[0].color, None);
    }

    #[test]
    fn test_trims_base_url() {
        let api = HttpTransitApi::new("http://127.0.0.1:5000/");
        assert_eq!(api.base_url, "http://127.0.0.1:5000");
    }

    #[actix_web::test]
    async fn test_fetches_from_backend() {
        let service = Data::new(service());
        preload_num_s_feed(&service);

        let server = HttpServer::new(move || {
            App::new()
                .app_data(service.clone())
                .configure(api::configure)
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);

        let api = HttpTransitApi::new(format!("http://{addr}"));

        let stations = api.fetch_stations().await.unwrap();
        assert_eq!(stations.len(), 6);
        assert_eq!(stations[3].name, "8 Av");

        let routes = api.fetch_routes(&StopId::new("L01N")).await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path.len(), 2);
        assert_eq!(routes[0].color, None);

        assert!(api.fetch_routes(&StopId::new("Z")).await.is_err());

        let detailed = HttpTransitApi::new(format!("http://{addr}/")).detailed(true);
        let routes = detailed.fetch_routes(&StopId::new("101N")).await.unwrap();
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].path.len(), 3);
        assert_eq!(routes[0].color.as_deref(), Some("#EE352E"));
        assert_eq!(routes[0].vehicles.len(), 1);
        assert_eq!(routes[0].vehicles[0].name, "trip_v1");
        assert!((routes[0].vehicles[0].point.latitude() - 40.88).abs() < 1e-4);

        handle.stop(true).await;
    }
}
