use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RouteId(String);

impl RouteId {
    pub fn new(str: &str) -> Self {
        Self(str.to_owned())
    }
}

impl fmt::Display for RouteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A row of routes.txt, serialized the way `/api/routes` lists it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    #[serde(rename(deserialize = "route_id"))]
    pub id: RouteId,
    #[serde(rename(deserialize = "route_short_name"), default)]
    pub short_name: String,
    #[serde(rename(deserialize = "route_long_name"), default)]
    pub long_name: String,
    #[serde(rename(deserialize = "route_color"), default)]
    pub color: String,
    #[serde(rename(deserialize = "route_text_color"), default)]
    pub text_color: String,
}
