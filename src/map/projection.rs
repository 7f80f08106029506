use crate::conf::{DEFAULT_ZOOM, FALLBACK_CENTER};
use crate::delivery::{DeliveryRecord, Status, Stop};
use geo::{coord, BoundingRect, LineString, MultiLineString, Point, Rect};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject};
use serde::Serialize;
use serde_json::{json, Value};
use strum::Display;

pub const ORIGIN_LABEL: &str = "Warehouse/Origin";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RouteColor {
    Green,
    Blue,
    Red,
}

impl RouteColor {
    pub fn for_status(status: Status) -> Self {
        match status {
            Status::Complete => RouteColor::Green,
            Status::InProgress => RouteColor::Blue,
            Status::Incomplete | Status::Pending => RouteColor::Red,
        }
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        match self {
            RouteColor::Green => (0, 128, 0),
            RouteColor::Blue => (0, 0, 255),
            RouteColor::Red => (255, 0, 0),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub sequence_index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub label: String,
    pub color: RouteColor,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RouteOverlay {
    pub vehicle_id: i64,
    pub date: String,
    pub status: Status,
    pub color: RouteColor,
    /// Stops in visiting order, x is longitude and y is latitude.
    pub line: LineString<f64>,
    pub markers: Vec<Marker>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapView {
    /// (lat, lon)
    pub center: (f64, f64),
    pub zoom: u8,
    pub routes: Vec<RouteOverlay>,
}

/// Origin at both ends of the route, raw sequence index everywhere else.
pub fn stop_label(stop: &Stop, last_index: usize) -> String {
    if stop.sequence_index == 0 || stop.sequence_index == last_index {
        return ORIGIN_LABEL.into();
    }
    format!(
        "Stop: {} Delivery Location: {}",
        stop.sequence_index,
        stop.distributor_name.as_deref().unwrap_or("Unknown")
    )
}

pub fn project_route(record: &DeliveryRecord) -> RouteOverlay {
    let color = RouteColor::for_status(record.status);
    let last_index = record.route_sequence.len().saturating_sub(1);
    let line: LineString<f64> = record
        .route_sequence
        .iter()
        .map(|it| coord! { x: it.longitude, y: it.latitude })
        .collect();
    let markers = record
        .route_sequence
        .iter()
        .map(|it| Marker {
            sequence_index: it.sequence_index,
            latitude: it.latitude,
            longitude: it.longitude,
            label: stop_label(it, last_index),
            color,
        })
        .collect();
    RouteOverlay {
        vehicle_id: record.vehicle_id,
        date: record.date.clone(),
        status: record.status,
        color,
        line,
        markers,
    }
}

/// Every record keeps its own color. The view is centered on the first stop
/// of the first record.
pub fn project<'a>(records: impl IntoIterator<Item = &'a DeliveryRecord>) -> MapView {
    let routes: Vec<RouteOverlay> = records.into_iter().map(project_route).collect();
    let center = routes
        .first()
        .and_then(|it| it.markers.first())
        .map(|it| (it.latitude, it.longitude))
        .unwrap_or(FALLBACK_CENTER);
    MapView {
        center,
        zoom: DEFAULT_ZOOM,
        routes,
    }
}

impl MapView {
    pub fn bounds(&self) -> Option<Rect<f64>> {
        MultiLineString::new(self.routes.iter().map(|it| it.line.clone()).collect())
            .bounding_rect()
    }

    /// One line feature per route followed by its stop points.
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = vec![];
        for route in &self.routes {
            features.push(feature(
                Geometry::new(geojson::Value::from(&route.line)),
                json!({
                    "kind": "route",
                    "vehicle_id": route.vehicle_id,
                    "date": route.date,
                    "status": route.status,
                    "color": route.color,
                }),
            ));
            for marker in &route.markers {
                let point = Point::new(marker.longitude, marker.latitude);
                features.push(feature(
                    Geometry::new(geojson::Value::from(&point)),
                    json!({
                        "kind": "stop",
                        "vehicle_id": route.vehicle_id,
                        "sequence_index": marker.sequence_index,
                        "label": marker.label,
                        "color": marker.color,
                    }),
                ));
            }
        }
        let mut foreign_members = JsonObject::new();
        foreign_members.insert("center".into(), json!([self.center.0, self.center.1]));
        foreign_members.insert("zoom".into(), json!(self.zoom));
        if let Some(bounds) = self.bounds() {
            foreign_members.insert(
                "bounds".into(),
                json!([
                    [bounds.min().y, bounds.min().x],
                    [bounds.max().y, bounds.max().x]
                ]),
            );
        }
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign_members),
        }
    }
}

fn feature(geometry: Geometry, properties: Value) -> Feature {
    let properties = match properties {
        Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(geometry),
        id: None,
        properties,
        foreign_members: None,
    }
}
