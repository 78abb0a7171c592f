use std::collections::BTreeMap;

use anyhow::{anyhow, ensure};

use crate::map::overlay::Polyline;

/// The drawing API a map engine hands over once it has initialized.
pub trait MapProvider {
    /// Opaque reference to a line drawn on this provider's surface.
    type Line;

    /// Builds a line and attaches it to the map.
    fn draw(&mut self, polyline: Polyline) -> Self::Line;

    /// Unbinds a line from the map. The handle is consumed.
    fn detach(&mut self, line: Self::Line);

    /// The line as currently drawn, or `None` once detached.
    fn drawn(&self, line: &Self::Line) -> Option<&Polyline>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineId(u64);

/// A headless map surface that keeps drawn lines in memory.
#[derive(Debug)]
pub struct Surface {
    next_id: u64,
    lines: BTreeMap<u64, Polyline>,
}

impl Surface {
    /// Starts the engine. Without a credential the engine never becomes ready.
    pub fn initialize(credential: Option<&str>) -> anyhow::Result<Self> {
        let key = credential.ok_or_else(|| anyhow!("No map credential configured"))?;
        ensure!(!key.trim().is_empty(), "Map credential is blank");

        Ok(Self {
            next_id: 0,
            lines: BTreeMap::new(),
        })
    }

    /// Number of lines attached to the surface.
    pub fn attached(&self) -> usize {
        self.lines.len()
    }
}

impl MapProvider for Surface {
    type Line = LineId;

    fn draw(&mut self, polyline: Polyline) -> LineId {
        let id = self.next_id;
        self.next_id += 1;
        self.lines.insert(id, polyline);

        LineId(id)
    }

    fn detach(&mut self, line: LineId) {
        if self.lines.remove(&line.0).is_none() {
            log::warn!("Line {} was not attached", line.0);
        }
    }

    fn drawn(&self, line: &LineId) -> Option<&Polyline> {
        self.lines.get(&line.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{geo::GeoPoint, map::overlay::LineStyle};

    fn polyline() -> Polyline {
        Polyline {
            path: vec![GeoPoint::new(40.71, -74.0).unwrap()],
            style: LineStyle::with_color(None),
        }
    }

    #[test]
    fn test_requires_credential() {
        assert!(Surface::initialize(None).is_err());
        assert!(Surface::initialize(Some("  ")).is_err());
        assert!(Surface::initialize(Some("key")).is_ok());
    }

    #[test]
    fn test_draw_and_detach() {
        let mut surface = Surface::initialize(Some("key")).unwrap();

        let a = surface.draw(polyline());
        let b = surface.draw(polyline());
        assert_ne!(a, b);
        assert_eq!(surface.attached(), 2);

        surface.detach(a);
        assert_eq!(surface.attached(), 1);
        assert_eq!(surface.drawn(&b), Some(&polyline()));
    }
}
