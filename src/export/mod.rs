pub mod file;

use crate::delivery::model::file_date_label;
use crate::delivery::DeliveryRecord;
use crate::{Error, Result};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use time::macros::format_description;
use time::Date;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportScope {
    Vehicle(i64),
    All,
}

impl FromStr for ExportScope {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        if s.eq_ignore_ascii_case("all") {
            return Ok(ExportScope::All);
        }
        s.trim()
            .parse()
            .map(ExportScope::Vehicle)
            .map_err(|_| Error::InvalidInput(format!("Invalid export scope: {s}")))
    }
}

impl Display for ExportScope {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportScope::Vehicle(id) => write!(f, "vehicle {id}"),
            ExportScope::All => write!(f, "all vehicles"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Export {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Serializes the routes in `records` into CSV, one row per stop. `today` is
/// only used to name aggregate exports.
pub fn export<'a>(
    records: impl IntoIterator<Item = &'a DeliveryRecord>,
    scope: ExportScope,
    with_status: bool,
    today: Date,
) -> Result<Export> {
    let records: Vec<&DeliveryRecord> = records
        .into_iter()
        .filter(|it| match scope {
            ExportScope::Vehicle(id) => it.vehicle_id == id,
            ExportScope::All => true,
        })
        .collect();
    let file_name = match scope {
        ExportScope::Vehicle(id) => {
            let Some(first) = records.first() else {
                return Err(Error::NotFound(format!("No deliveries for vehicle {id}")));
            };
            format!("Vehicle_{id}({}).csv", file_date_label(&first.date))
        }
        ExportScope::All => {
            let today = today.format(format_description!("[year]-[month]-[day]"))?;
            if with_status {
                format!("All_Vehicle_Routes_With_Status({today}).csv")
            } else {
                format!("All_Vehicle_Routes({today}).csv")
            }
        }
    };
    Ok(Export {
        file_name,
        content: to_csv(&records, with_status)?,
    })
}

fn to_csv(records: &[&DeliveryRecord], with_status: bool) -> Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(vec![]);
    let mut header = vec!["Vehicle ID", "Date"];
    if with_status {
        header.push("Status");
    }
    header.extend(["Stop Number", "Latitude", "Longitude", "Distributor Name"]);
    writer.write_record(&header)?;
    for record in records {
        for stop in &record.route_sequence {
            let mut row = vec![record.vehicle_id.to_string(), record.date.clone()];
            if with_status {
                row.push(record.status.to_string());
            }
            row.push(stop.sequence_index.to_string());
            row.push(stop.latitude.to_string());
            row.push(stop.longitude.to_string());
            row.push(stop.distributor_name.clone().unwrap_or_default());
            writer.write_record(&row)?;
        }
    }
    writer
        .into_inner()
        .map_err(|e| Error::ExportFailed(e.to_string()))
}
