// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Map coordinate mapping and pointer gesture resolution.
//!
//! Locations are stored in unscaled map space. The viewer renders the map
//! image at a zoom `Scale`, so pointer positions must be divided by the
//! scale (after removing the container origin) to land in map space, and
//! stored coordinates multiplied by it to render.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
#[cfg(feature = "binding-generation")]
use ts_rs::TS;

pub const MIN_SCALE: f64 = 0.5;
pub const MAX_SCALE: f64 = 2.0;
pub const SCALE_STEP: f64 = 0.1;

/// Movement (in screen pixels, either axis) at which a gesture becomes a drag.
pub const DRAG_THRESHOLD_PX: f64 = 5.0;

/// Hold time for a stationary touch to count as a long-press.
pub const LONG_PRESS_MS: u64 = 500;

/// A point in unscaled map space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub struct MapPoint {
    pub x: f64,
    pub y: f64,
}

/// A point in screen pixels, relative to whatever origin the caller uses.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScreenPoint {
    pub screen_x: f64,
    pub screen_y: f64,
}

impl ScreenPoint {
    pub fn new(screen_x: f64, screen_y: f64) -> Self {
        Self { screen_x, screen_y }
    }
}

/// Zoom factor, clamped to `[MIN_SCALE, MAX_SCALE]` in `SCALE_STEP` increments.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd)]
pub struct Scale(f64);

impl Scale {
    /// Clamp and snap a raw zoom factor onto the allowed grid.
    pub fn new(value: f64) -> Self {
        if !value.is_finite() {
            return Self::default();
        }
        let clamped = value.clamp(MIN_SCALE, MAX_SCALE);
        let snapped = (clamped / SCALE_STEP).round() * SCALE_STEP;
        Self(snapped.clamp(MIN_SCALE, MAX_SCALE))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn zoom_in(self) -> Self {
        Self::new(self.0 + SCALE_STEP)
    }

    pub fn zoom_out(self) -> Self {
        Self::new(self.0 - SCALE_STEP)
    }
}

impl Default for Scale {
    fn default() -> Self {
        Self(1.0)
    }
}

/// Convert a pointer position to map space.
pub fn to_map_point(client_x: f64, client_y: f64, origin: ScreenPoint, scale: Scale) -> MapPoint {
    MapPoint {
        x: (client_x - origin.screen_x) / scale.value(),
        y: (client_y - origin.screen_y) / scale.value(),
    }
}

/// Convert a map-space point to container-relative screen pixels.
pub fn to_screen_point(point: MapPoint, scale: Scale) -> ScreenPoint {
    ScreenPoint {
        screen_x: point.x * scale.value(),
        screen_y: point.y * scale.value(),
    }
}

/// How the viewer primarily interacts with the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "binding-generation", derive(TS))]
#[cfg_attr(
    feature = "binding-generation",
    ts(export, export_to = "web/src/lib/generated/")
)]
pub enum InteractionMode {
    /// Mouse: click places a point, drag pans.
    Desktop,
    /// Touch: single-finger drag pans, long-press places a point.
    Touch,
}

impl FromStr for InteractionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "desktop" => Ok(Self::Desktop),
            "touch" | "mobile" => Ok(Self::Touch),
            other => Err(format!("unknown interaction mode: {other}")),
        }
    }
}

/// What the pointer went down on.
#[derive(Debug, Clone, PartialEq)]
pub enum PointerTarget {
    /// Empty map area
    Map,
    /// An existing location marker
    Marker {
        location_id: String,
        owner_id: String,
        position: MapPoint,
    },
}

/// Outcome of a completed pointer gesture.
#[derive(Debug, Clone, PartialEq)]
pub enum Gesture {
    /// Register a new point at this map position.
    Place(MapPoint),
    /// Open the detail view of a marker.
    OpenDetail { location_id: String },
    /// Persist a dragged marker at its new position.
    MoveMarker { location_id: String, to: MapPoint },
    /// Pan the viewport by this many screen pixels.
    Pan { dx: f64, dy: f64 },
    /// Nothing to do (e.g. a non-owner tried to drag someone else's marker).
    None,
}

#[derive(Debug, Clone)]
struct PointerDown {
    client: ScreenPoint,
    at_ms: u64,
    target: PointerTarget,
}

/// Tracks one pointer from down to up and classifies the gesture.
#[derive(Debug, Clone)]
pub struct GestureTracker {
    mode: InteractionMode,
    viewer_uid: String,
    origin: ScreenPoint,
    scale: Scale,
    down: Option<PointerDown>,
}

impl GestureTracker {
    pub fn new(mode: InteractionMode, viewer_uid: impl Into<String>) -> Self {
        Self {
            mode,
            viewer_uid: viewer_uid.into(),
            origin: ScreenPoint::new(0.0, 0.0),
            scale: Scale::default(),
            down: None,
        }
    }

    pub fn scale(&self) -> Scale {
        self.scale
    }

    pub fn set_scale(&mut self, scale: Scale) {
        self.scale = scale;
    }

    /// Update the container's top-left corner in client coordinates.
    pub fn set_origin(&mut self, origin: ScreenPoint) {
        self.origin = origin;
    }

    pub fn pointer_down(&mut self, client_x: f64, client_y: f64, at_ms: u64, target: PointerTarget) {
        self.down = Some(PointerDown {
            client: ScreenPoint::new(client_x, client_y),
            at_ms,
            target,
        });
    }

    /// Abandon the gesture in progress (pointer left the map, second finger, ...).
    pub fn cancel(&mut self) {
        self.down = None;
    }

    /// Finish the gesture and decide what it meant.
    pub fn pointer_up(&mut self, client_x: f64, client_y: f64, at_ms: u64) -> Gesture {
        let Some(down) = self.down.take() else {
            return Gesture::None;
        };

        let dx = client_x - down.client.screen_x;
        let dy = client_y - down.client.screen_y;
        let dragged = is_drag(dx, dy);
        let held_ms = at_ms.saturating_sub(down.at_ms);

        match down.target {
            PointerTarget::Marker {
                location_id,
                owner_id,
                position,
            } => {
                if !dragged {
                    Gesture::OpenDetail { location_id }
                } else if owner_id == self.viewer_uid {
                    let to = MapPoint {
                        x: position.x + dx / self.scale.value(),
                        y: position.y + dy / self.scale.value(),
                    };
                    Gesture::MoveMarker { location_id, to }
                } else {
                    tracing::debug!(%location_id, "Ignoring drag of marker owned by another user");
                    Gesture::None
                }
            }
            PointerTarget::Map => {
                if dragged {
                    return Gesture::Pan { dx, dy };
                }
                let point = to_map_point(
                    down.client.screen_x,
                    down.client.screen_y,
                    self.origin,
                    self.scale,
                );
                match self.mode {
                    InteractionMode::Desktop => Gesture::Place(point),
                    InteractionMode::Touch if held_ms >= LONG_PRESS_MS => Gesture::Place(point),
                    InteractionMode::Touch => Gesture::None,
                }
            }
        }
    }
}

/// At or above the threshold on either axis counts as a drag.
fn is_drag(dx: f64, dy: f64) -> bool {
    dx.abs() >= DRAG_THRESHOLD_PX || dy.abs() >= DRAG_THRESHOLD_PX
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    fn marker(owner: &str) -> PointerTarget {
        PointerTarget::Marker {
            location_id: "loc-1".to_string(),
            owner_id: owner.to_string(),
            position: MapPoint { x: 100.0, y: 200.0 },
        }
    }

    #[test]
    fn test_scale_clamps_and_snaps() {
        assert_eq!(Scale::new(5.0).value(), MAX_SCALE);
        assert_eq!(Scale::new(0.1).value(), MIN_SCALE);
        assert!(approx(Scale::new(1.23).value(), 1.2));
        assert_eq!(Scale::new(f64::NAN), Scale::default());
    }

    #[test]
    fn test_zoom_steps_stop_at_bounds() {
        let mut scale = Scale::default();
        for _ in 0..20 {
            scale = scale.zoom_in();
        }
        assert_eq!(scale.value(), MAX_SCALE);

        for _ in 0..20 {
            scale = scale.zoom_out();
        }
        assert_eq!(scale.value(), MIN_SCALE);
    }

    #[test]
    fn test_screen_map_round_trip() {
        let p = MapPoint { x: 123.4, y: 56.7 };
        let origin = ScreenPoint::new(0.0, 0.0);
        for raw in [0.5, 0.7, 1.0, 1.3, 2.0] {
            let scale = Scale::new(raw);
            let screen = to_screen_point(p, scale);
            let back = to_map_point(screen.screen_x, screen.screen_y, origin, scale);
            assert!(approx(back.x, p.x) && approx(back.y, p.y), "scale {raw}");
        }
    }

    #[test]
    fn test_to_map_point_removes_origin() {
        let p = to_map_point(260.0, 420.0, ScreenPoint::new(60.0, 20.0), Scale::new(2.0));
        assert_eq!(p, MapPoint { x: 100.0, y: 200.0 });
    }

    #[test]
    fn test_small_marker_movement_is_a_click() {
        let mut tracker = GestureTracker::new(InteractionMode::Desktop, "alice");
        tracker.pointer_down(10.0, 10.0, 0, marker("alice"));
        let gesture = tracker.pointer_up(14.0, 14.0, 100);
        assert_eq!(
            gesture,
            Gesture::OpenDetail {
                location_id: "loc-1".to_string()
            }
        );
    }

    #[test]
    fn test_owner_drag_moves_marker_in_map_space() {
        let mut tracker = GestureTracker::new(InteractionMode::Desktop, "alice");
        tracker.set_scale(Scale::new(2.0));
        tracker.pointer_down(10.0, 10.0, 0, marker("alice"));
        let gesture = tracker.pointer_up(110.0, 15.0, 100);
        assert_eq!(
            gesture,
            Gesture::MoveMarker {
                location_id: "loc-1".to_string(),
                to: MapPoint { x: 150.0, y: 202.5 },
            }
        );
    }

    #[test]
    fn test_non_owner_drag_is_noop() {
        let mut tracker = GestureTracker::new(InteractionMode::Desktop, "bob");
        tracker.pointer_down(10.0, 10.0, 0, marker("alice"));
        assert_eq!(tracker.pointer_up(50.0, 50.0, 100), Gesture::None);
    }

    #[test]
    fn test_desktop_click_places_point() {
        let mut tracker = GestureTracker::new(InteractionMode::Desktop, "alice");
        tracker.set_origin(ScreenPoint::new(0.0, 100.0));
        tracker.pointer_down(50.0, 150.0, 0, PointerTarget::Map);
        assert_eq!(
            tracker.pointer_up(51.0, 150.0, 20),
            Gesture::Place(MapPoint { x: 50.0, y: 50.0 })
        );
    }

    #[test]
    fn test_touch_requires_long_press_to_place() {
        let mut tracker = GestureTracker::new(InteractionMode::Touch, "alice");
        tracker.pointer_down(50.0, 50.0, 0, PointerTarget::Map);
        assert_eq!(tracker.pointer_up(50.0, 50.0, 200), Gesture::None);

        tracker.pointer_down(50.0, 50.0, 1000, PointerTarget::Map);
        assert_eq!(
            tracker.pointer_up(52.0, 51.0, 1500),
            Gesture::Place(MapPoint { x: 50.0, y: 50.0 })
        );
    }

    #[test]
    fn test_map_drag_pans() {
        let mut tracker = GestureTracker::new(InteractionMode::Touch, "alice");
        tracker.pointer_down(50.0, 50.0, 0, PointerTarget::Map);
        assert_eq!(
            tracker.pointer_up(50.0, 45.0, 900),
            Gesture::Pan { dx: 0.0, dy: -5.0 }
        );
    }

    #[test]
    fn test_pointer_up_without_down() {
        let mut tracker = GestureTracker::new(InteractionMode::Desktop, "alice");
        assert_eq!(tracker.pointer_up(0.0, 0.0, 0), Gesture::None);
    }
}
