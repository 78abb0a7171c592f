use anyhow::Context;
use chrono::{DateTime, Local};
use prost::Message;
use serde::Serialize;

use gtfs_realtime::{trip_update::StopTimeEvent, FeedMessage, TranslatedString, TripDescriptor};

const HUMAN_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local time of a POSIX timestamp; `None` for zero or out-of-range values.
fn human_time(timestamp: impl TryInto<i64>) -> Option<String> {
    let timestamp = timestamp.try_into().ok()?;
    if timestamp == 0 {
        return None;
    }

    DateTime::from_timestamp(timestamp, 0).map(|t| {
        t.with_timezone(&Local)
            .format(HUMAN_TIME_FORMAT)
            .to_string()
    })
}

#[derive(Debug, Serialize)]
pub struct Timestamp {
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_time: Option<String>,
}

impl From<u64> for Timestamp {
    fn from(timestamp: u64) -> Self {
        Self {
            timestamp,
            human_time: human_time(timestamp),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Header {
    pub timestamp: u64,
    pub human_time: Option<String>,
    pub feed_id: String,
}

#[derive(Debug, Serialize)]
pub struct TripRef {
    pub trip_id: String,
    pub route_id: String,
}

#[derive(Debug, Serialize)]
pub struct Position {
    pub latitude: f32,
    pub longitude: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bearing: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub speed: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VehicleStatus {
    IncomingAt,
    StoppedAt,
    InTransitTo,
    Unknown,
}

impl From<i32> for VehicleStatus {
    fn from(v: i32) -> Self {
        match v {
            0 => VehicleStatus::IncomingAt,
            1 => VehicleStatus::StoppedAt,
            2 => VehicleStatus::InTransitTo,
            _ => VehicleStatus::Unknown,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Vehicle {
    pub trip: Option<TripRef>,
    pub timestamp: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_status: Option<VehicleStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct StopEvent {
    pub time: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delay: Option<i32>,
}

impl From<&StopTimeEvent> for StopEvent {
    fn from(e: &StopTimeEvent) -> Self {
        let time = e.time.unwrap_or_default();
        Self {
            time,
            human_time: human_time(time),
            delay: e.delay,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StopUpdate {
    pub stop_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub arrival: Option<StopEvent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub departure: Option<StopEvent>,
}

#[derive(Debug, Serialize)]
pub struct TripUpdate {
    pub trip: TripRef,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub human_time: Option<String>,
    pub stop_time_updates: Vec<StopUpdate>,
}

#[derive(Debug, Default, Serialize)]
pub struct ActivePeriod {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<Timestamp>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<Timestamp>,
}

#[derive(Debug, Serialize)]
pub struct InformedEntity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agency_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub route_type: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_id: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Alert {
    pub active_period: Vec<ActivePeriod>,
    pub informed_entity: Vec<InformedEntity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cause: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub effect: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub header_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description_text: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Entity {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vehicle: Option<Vehicle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub trip_update: Option<TripUpdate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<Alert>,
}

/// A decoded GTFS-realtime feed, shaped for JSON.
#[derive(Debug, Serialize)]
pub struct FeedSnapshot {
    pub header: Header,
    pub entities: Vec<Entity>,
}

fn first_text(s: &Option<TranslatedString>) -> Option<String> {
    s.as_ref()
        .and_then(|s| s.translation.first())
        .map(|t| t.text.clone())
}

fn trip_ref(trip: &TripDescriptor) -> TripRef {
    TripRef {
        trip_id: trip.trip_id.clone().unwrap_or_default(),
        route_id: trip.route_id.clone().unwrap_or_default(),
    }
}

impl FeedSnapshot {
    pub fn decode(bytes: &[u8], feed_id: &str) -> anyhow::Result<Self> {
        let feed = FeedMessage::decode(bytes).context("Error parsing GTFS-RT data")?;

        let timestamp = feed.header.timestamp.unwrap_or_default();
        let header = Header {
            timestamp,
            human_time: human_time(timestamp),
            feed_id: feed_id.to_owned(),
        };

        let entities = feed
            .entity
            .iter()
            .map(|entity| Entity {
                id: entity.id.clone(),
                vehicle: entity.vehicle.as_ref().map(|v| {
                    let timestamp = v.timestamp.unwrap_or_default();
                    Vehicle {
                        trip: v.trip.as_ref().map(trip_ref),
                        timestamp,
                        human_time: human_time(timestamp),
                        position: v.position.as_ref().map(|p| Position {
                            latitude: p.latitude,
                            longitude: p.longitude,
                            bearing: p.bearing,
                            speed: p.speed,
                        }),
                        current_status: v.current_status.map(VehicleStatus::from),
                        stop_id: v.stop_id.clone(),
                    }
                }),
                trip_update: entity.trip_update.as_ref().map(|u| TripUpdate {
                    trip: trip_ref(&u.trip),
                    timestamp: u.timestamp,
                    human_time: u.timestamp.and_then(human_time),
                    stop_time_updates: u
                        .stop_time_update
                        .iter()
                        .map(|st| StopUpdate {
                            stop_id: st.stop_id.clone().unwrap_or_default(),
                            arrival: st.arrival.as_ref().map(StopEvent::from),
                            departure: st.departure.as_ref().map(StopEvent::from),
                        })
                        .collect(),
                }),
                alert: entity.alert.as_ref().map(|a| Alert {
                    active_period: a
                        .active_period
                        .iter()
                        .map(|p| ActivePeriod {
                            start: p.start.map(Timestamp::from),
                            end: p.end.map(Timestamp::from),
                        })
                        .collect(),
                    informed_entity: a
                        .informed_entity
                        .iter()
                        .map(|e| InformedEntity {
                            agency_id: e.agency_id.clone(),
                            route_id: e.route_id.clone(),
                            route_type: e.route_type,
                            stop_id: e.stop_id.clone(),
                        })
                        .collect(),
                    cause: a.cause,
                    effect: a.effect,
                    url: first_text(&a.url),
                    header_text: first_text(&a.header_text),
                    description_text: first_text(&a.description_text),
                }),
            })
            .collect();

        Ok(Self { header, entities })
    }

    /// Vehicles that report a position, for drawing on the map.
    pub fn positioned_vehicles(&self) -> impl Iterator<Item = (&Entity, &Vehicle, &Position)> {
        self.entities.iter().filter_map(|e| {
            let vehicle = e.vehicle.as_ref()?;
            let position = vehicle.position.as_ref()?;
            Some((e, vehicle, position))
        })
    }
}
