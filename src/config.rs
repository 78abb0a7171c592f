use std::time::Duration;

use crate::geo::GeoPoint;

pub const DEFAULT_CENTER: (f64, f64) = (40.7128, -74.0060);
pub const DEFAULT_ZOOM: u8 = 11;

/// Fallback when neither the item nor its category has a timeout.
const DEFAULT_TIMEOUT_SECS: u64 = 60;

pub const SUBWAY_FEEDS: &[(&str, &str)] = &[
    ("ace", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-ace"),
    ("bdfm", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-bdfm"),
    ("g", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-g"),
    ("jz", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-jz"),
    ("nqrw", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-nqrw"),
    ("l", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-l"),
    ("num_s", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs"),
    ("sir", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fgtfs-si"),
];

pub const LIRR_FEEDS: &[(&str, &str)] = &[(
    "lirr",
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/lirr%2Fgtfs-lirr",
)];

pub const MNR_FEEDS: &[(&str, &str)] = &[(
    "mnr",
    "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/mnr%2Fgtfs-mnr",
)];

pub const SERVICE_ALERT_FEEDS: &[(&str, &str)] = &[
    ("all_alerts", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fall-alerts"),
    ("subway_alerts", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fsubway-alerts"),
    ("bus_alerts", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fbus-alerts"),
    ("lirr_alerts", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Flirr-alerts"),
    ("mnr_alerts", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/camsys%2Fmnr-alerts"),
];

pub const ACCESSIBILITY_FEEDS: &[(&str, &str)] = &[
    ("current", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fnyct_ene.json"),
    ("upcoming", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fnyct_ene_upcoming.json"),
    ("equipment", "https://api-endpoint.mta.info/Dataservice/mtagtfsfeeds/nyct%2Fnyct_ene_equipments.json"),
];

/// Which subway feed carries each route's trains.
const SUBWAY_ROUTE_FEEDS: &[(&str, &[&str])] = &[
    ("ace", &["A", "C", "E", "H", "FS"]),
    ("bdfm", &["B", "D", "F", "FX", "M"]),
    ("g", &["G"]),
    ("jz", &["J", "Z"]),
    ("nqrw", &["N", "Q", "R", "W"]),
    ("l", &["L"]),
    ("num_s", &["1", "2", "3", "4", "5", "6", "6X", "7", "7X", "GS"]),
    ("sir", &["SI"]),
];

pub fn subway_feed_for_route(route_id: &str) -> Option<&'static str> {
    SUBWAY_ROUTE_FEEDS
        .iter()
        .find(|(_, routes)| routes.contains(&route_id))
        .map(|(feed, _)| *feed)
}

const CATEGORY_TIMEOUTS: &[(Category, u64)] = &[
    (Category::Subway, 30),
    (Category::Lirr, 60),
    (Category::Mnr, 60),
    (Category::Alerts, 180),
    (Category::Accessibility, 300),
    (Category::Lines, 86400),
    (Category::RouteStops, 86400),
];

const ITEM_TIMEOUTS: &[(&str, u64)] = &[
    ("lirr_alerts", 300),
    ("mnr_alerts", 300),
    // Planned elevator/escalator outages
    ("upcoming", 1800),
    ("equipment", 3600),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Subway,
    Lirr,
    Mnr,
    Alerts,
    Accessibility,
    Lines,
    RouteStops,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Subway => "subway",
            Category::Lirr => "lirr",
            Category::Mnr => "mnr",
            Category::Alerts => "alerts",
            Category::Accessibility => "accessibility",
            Category::Lines => "lines",
            Category::RouteStops => "route_stops",
        }
    }

    /// The upstream feeds of a realtime category, empty for static data.
    pub fn feeds(&self) -> &'static [(&'static str, &'static str)] {
        match self {
            Category::Subway => SUBWAY_FEEDS,
            Category::Lirr => LIRR_FEEDS,
            Category::Mnr => MNR_FEEDS,
            Category::Alerts => SERVICE_ALERT_FEEDS,
            Category::Accessibility => ACCESSIBILITY_FEEDS,
            _ => &[],
        }
    }

    pub fn feed_url(&self, feed_id: &str) -> Option<&'static str> {
        self.feeds()
            .iter()
            .find(|(id, _)| *id == feed_id)
            .map(|(_, url)| *url)
    }
}

/// How long a cached item stays fresh: the item's own override, else its
/// category default, else one minute.
pub fn cache_timeout(category: Category, item_id: &str) -> Duration {
    let item = ITEM_TIMEOUTS
        .iter()
        .find(|(id, _)| *id == item_id)
        .map(|(_, secs)| *secs);
    let category = CATEGORY_TIMEOUTS
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, secs)| *secs);

    let secs = item.or(category).unwrap_or(DEFAULT_TIMEOUT_SECS);

    Duration::from_secs(secs)
}

pub fn default_center() -> GeoPoint {
    GeoPoint::new(DEFAULT_CENTER.0, DEFAULT_CENTER.1).expect("Default center is a valid point")
}
