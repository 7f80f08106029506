use super::{DeliveryRecord, Status};
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

/// Criteria for narrowing a snapshot. A `None` criterion matches everything.
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
pub struct DeliveryFilter {
    #[serde(default, deserialize_with = "status_or_empty")]
    pub status: Option<Status>,
    #[serde(default, deserialize_with = "text_or_empty")]
    pub date: Option<String>,
    #[serde(default, deserialize_with = "vehicle_id_or_empty")]
    pub vehicle_id: Option<i64>,
}

impl DeliveryFilter {
    pub fn by_vehicle(vehicle_id: i64) -> Self {
        DeliveryFilter {
            vehicle_id: Some(vehicle_id),
            ..Default::default()
        }
    }

    pub fn matches(&self, record: &DeliveryRecord) -> bool {
        self.status.map_or(true, |it| record.status == it)
            && self.date.as_ref().map_or(true, |it| &record.date == it)
            && self.vehicle_id.map_or(true, |it| record.vehicle_id == it)
    }
}

/// Returns the records matching every supplied criterion, in snapshot order.
pub fn filter<'a>(
    records: impl IntoIterator<Item = &'a DeliveryRecord>,
    criteria: &DeliveryFilter,
) -> Vec<&'a DeliveryRecord> {
    records
        .into_iter()
        .filter(|it| criteria.matches(it))
        .collect()
}

/// Vehicles that still have a route in progress, in snapshot order.
pub fn in_progress_vehicles<'a>(records: impl IntoIterator<Item = &'a DeliveryRecord>) -> Vec<i64> {
    let mut res = vec![];
    for record in records {
        if record.status == Status::InProgress && !res.contains(&record.vehicle_id) {
            res.push(record.vehicle_id);
        }
    }
    res
}

fn text_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value
        .map(|it| it.trim().to_string())
        .filter(|it| !it.is_empty()))
}

fn status_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Status>, D::Error> {
    match text_or_empty(deserializer)? {
        Some(text) => Status::from_str(&text)
            .map(Some)
            .map_err(|_| de::Error::custom(format!("unknown status: {text}"))),
        None => Ok(None),
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum VehicleId {
    Number(i64),
    Text(String),
}

/// Vehicle ids compare numerically, `"007"` selects vehicle 7.
fn vehicle_id_or_empty<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<i64>, D::Error> {
    match Option::<VehicleId>::deserialize(deserializer)? {
        Some(VehicleId::Number(it)) => Ok(Some(it)),
        Some(VehicleId::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(VehicleId::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| de::Error::custom(format!("invalid vehicle id: {text}"))),
        None => Ok(None),
    }
}
