use actix_cors::Cors;
use actix_web::{
    delete, get,
    http::StatusCode,
    web::{self, Data, Path},
    HttpResponse, ResponseError,
};
use serde_json::json;

use crate::{
    config::Category,
    service::{DataService, ServiceError},
};

type ApiResult = Result<HttpResponse, ServiceError>;

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::InvalidFeed { .. } => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::UpstreamStatus(_) | ServiceError::Upstream(_) | ServiceError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.status_code().is_server_error() {
            log::error!("{self}");
        }

        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .wrap(Cors::permissive())
            .service(health)
            .service(clear_cache)
            .service(feeds)
            .service(subway_feeds)
            .service(subway_feed)
            .service(lirr_feed)
            .service(mnr_feed)
            .service(alerts)
            .service(station_accessibility)
            .service(accessibility)
            .service(stations)
            .service(routes)
            .service(route_shape)
            .service(route_stops)
            .service(line_route)
            .service(line),
    );
}

#[get("/health")]
async fn health(service: Data<DataService>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Service is running",
        "cache": service.cache_stats(),
    }))
}

#[delete("/cache")]
async fn clear_cache(service: Data<DataService>) -> HttpResponse {
    service.clear_cache();
    HttpResponse::Ok().json(json!({ "status": "ok", "message": "Cache cleared" }))
}

#[get("/feeds")]
async fn feeds(service: Data<DataService>) -> HttpResponse {
    HttpResponse::Ok().json(service.available_feeds())
}

#[get("/subway/feeds")]
async fn subway_feeds(service: Data<DataService>) -> HttpResponse {
    HttpResponse::Ok().json(service.subway_feeds())
}

async fn realtime(service: &DataService, category: Category, feed_id: &str) -> ApiResult {
    let snapshot = service.realtime_feed(category, feed_id).await?;
    Ok(HttpResponse::Ok().json(&*snapshot))
}

#[get("/subway/feeds/{feed_id}")]
async fn subway_feed(service: Data<DataService>, feed_id: Path<String>) -> ApiResult {
    realtime(&service, Category::Subway, &feed_id).await
}

#[get("/lirr/feeds/{feed_id}")]
async fn lirr_feed(service: Data<DataService>, feed_id: Path<String>) -> ApiResult {
    realtime(&service, Category::Lirr, &feed_id).await
}

#[get("/mnr/feeds/{feed_id}")]
async fn mnr_feed(service: Data<DataService>, feed_id: Path<String>) -> ApiResult {
    realtime(&service, Category::Mnr, &feed_id).await
}

#[get("/alerts/{alert_type}")]
async fn alerts(service: Data<DataService>, alert_type: Path<String>) -> ApiResult {
    realtime(&service, Category::Alerts, &alert_type).await
}

// Registered before `/accessibility/{data_type}`, which would not match it anyway
#[get("/accessibility/station/{station_id}")]
async fn station_accessibility(service: Data<DataService>, station_id: Path<String>) -> ApiResult {
    let equipment = service.station_accessibility(&station_id).await?;
    Ok(HttpResponse::Ok().json(equipment))
}

#[get("/accessibility/{data_type}")]
async fn accessibility(service: Data<DataService>, data_type: Path<String>) -> ApiResult {
    let document = service.accessibility(&data_type).await?;
    Ok(HttpResponse::Ok().json(&*document))
}

#[get("/stations")]
async fn stations(service: Data<DataService>) -> HttpResponse {
    HttpResponse::Ok().json(service.stations())
}

#[get("/routes")]
async fn routes(service: Data<DataService>) -> HttpResponse {
    HttpResponse::Ok().json(service.routes())
}

#[get("/routes/{route_id}/shape")]
async fn route_shape(service: Data<DataService>, route_id: Path<String>) -> ApiResult {
    let shapes = service.line_shapes(&route_id)?;
    Ok(HttpResponse::Ok().json(&*shapes))
}

#[get("/routes/{route_id}/stops")]
async fn route_stops(service: Data<DataService>, route_id: Path<String>) -> ApiResult {
    let stops = service.stops_for_route(&route_id)?;
    Ok(HttpResponse::Ok().json(&*stops))
}

#[get("/line/{line_id}")]
async fn line(service: Data<DataService>, line_id: Path<String>) -> ApiResult {
    let path = service.line(&line_id)?;
    Ok(HttpResponse::Ok().json(&*path))
}

/// The line with its color and the vehicles currently running on it.
#[get("/line/{line_id}/route")]
async fn line_route(service: Data<DataService>, line_id: Path<String>) -> ApiResult {
    let route = service.route_detail(&line_id).await?;
    Ok(HttpResponse::Ok().json(route))
}
