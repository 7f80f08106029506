use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::str::FromStr;
use strum::{Display, EnumString};
use time::macros::format_description;
use time::Date;
use tracing::warn;

const ORIGIN_TOLERANCE_DEG: f64 = 1e-6;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
pub enum Status {
    Pending,
    #[serde(rename = "In Progress", alias = "InProgress")]
    #[strum(to_string = "In Progress", serialize = "InProgress")]
    InProgress,
    Complete,
    Incomplete,
}

impl Status {
    /// `Pending -> InProgress -> {Complete, Incomplete}`, nothing leaves a terminal status.
    pub fn can_transition_to(self, target: Status) -> bool {
        matches!(
            (self, target),
            (Status::Pending, Status::InProgress)
                | (Status::InProgress, Status::Complete)
                | (Status::InProgress, Status::Incomplete)
        )
    }

    /// Statuses a dispatcher may request. `InProgress` is only ever set by the backend.
    pub fn is_user_target(self) -> bool {
        matches!(self, Status::Complete | Status::Incomplete)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stop {
    pub sequence_index: usize,
    pub latitude: f64,
    pub longitude: f64,
    pub distributor_name: Option<String>,
    pub is_origin: bool,
}

/// One vehicle's route for one day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub vehicle_id: i64,
    pub date: String,
    pub status: Status,
    pub route_sequence: Vec<Stop>,
}

impl DeliveryRecord {
    pub fn delivery_stops(&self) -> impl Iterator<Item = &Stop> {
        self.route_sequence.iter().filter(|it| !it.is_origin)
    }

    pub fn is_same(&self, vehicle_id: i64, date: &str) -> bool {
        self.vehicle_id == vehicle_id && self.date == date
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn value(&self) -> Result<f64> {
        match self {
            Coordinate::Number(it) => Ok(*it),
            Coordinate::Text(it) => it
                .trim()
                .parse()
                .map_err(|_| Error::InvalidInput(format!("Invalid coordinate: {it}"))),
        }
    }
}

#[derive(Deserialize)]
struct WireStop {
    #[serde(rename = "Dest Geo Lat")]
    lat: Coordinate,
    #[serde(rename = "Dest Geo Lon")]
    lon: Coordinate,
    #[serde(rename = "Distributor Name", default)]
    distributor_name: Option<String>,
}

#[derive(Deserialize)]
struct WireDelivery {
    vehicle_id: i64,
    date: String,
    status: String,
    route_sequence: Vec<WireStop>,
}

impl TryFrom<WireDelivery> for DeliveryRecord {
    type Error = Error;

    fn try_from(wire: WireDelivery) -> Result<Self> {
        let status = Status::from_str(&wire.status)
            .map_err(|_| Error::InvalidInput(format!("Unknown status: {}", wire.status)))?;
        if wire.route_sequence.len() < 2 {
            Err(Error::InvalidInput(format!(
                "Route has {} stops, at least 2 expected",
                wire.route_sequence.len()
            )))?
        }
        let last_index = wire.route_sequence.len() - 1;
        let mut route_sequence = Vec::with_capacity(wire.route_sequence.len());
        for (index, stop) in wire.route_sequence.into_iter().enumerate() {
            route_sequence.push(Stop {
                sequence_index: index,
                latitude: stop.lat.value()?,
                longitude: stop.lon.value()?,
                distributor_name: stop.distributor_name,
                is_origin: index == 0 || index == last_index,
            });
        }
        let first = &route_sequence[0];
        let last = &route_sequence[last_index];
        if (first.latitude - last.latitude).abs() > ORIGIN_TOLERANCE_DEG
            || (first.longitude - last.longitude).abs() > ORIGIN_TOLERANCE_DEG
        {
            Err(Error::InvalidInput(
                "Route doesn't return to its origin".into(),
            ))?
        }
        Ok(DeliveryRecord {
            vehicle_id: wire.vehicle_id,
            date: wire.date,
            status,
            route_sequence,
        })
    }
}

/// Turns raw backend records into a snapshot. Records that break the route
/// invariants are dropped one by one, the rest still load.
pub fn records_from_wire(items: Vec<Value>) -> Vec<DeliveryRecord> {
    let mut seen = HashSet::new();
    let mut res = Vec::with_capacity(items.len());
    for (position, item) in items.into_iter().enumerate() {
        let record = serde_json::from_value::<WireDelivery>(item)
            .map_err(Error::from)
            .and_then(DeliveryRecord::try_from);
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                warn!(position, error = e.to_string(), "Skipping malformed delivery record");
                continue;
            }
        };
        if !seen.insert((record.vehicle_id, record.date.clone())) {
            warn!(
                vehicle_id = record.vehicle_id,
                date = %record.date,
                "Skipping duplicate delivery record"
            );
            continue;
        }
        res.push(record);
    }
    res
}

/// Converts a date picker value (`YYYY-MM-DD`) to the backend form (`MM/DD/YYYY`).
pub fn picker_to_backend(picker_date: &str) -> Result<String> {
    let date = Date::parse(picker_date.trim(), format_description!("[year]-[month]-[day]"))
        .map_err(|_| {
            Error::InvalidInput(format!(
                "Invalid date: {picker_date}, expected YYYY-MM-DD"
            ))
        })?;
    Ok(date.format(format_description!("[month]/[day]/[year]"))?)
}

/// Date label that is safe to put into a file name.
pub fn file_date_label(date: &str) -> String {
    date.replace('/', "-")
}
