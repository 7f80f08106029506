use super::{DeliveryRecord, Status};
use crate::backend::Backend;
use crate::{Error, Result};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// Immutable view of every delivery record known at some point in time.
pub type Snapshot = Arc<Vec<DeliveryRecord>>;

/// Owns the current snapshot. Every change publishes a whole new snapshot, so
/// readers holding an older one never observe a half-applied update.
pub struct RouteDataStore {
    backend: Arc<dyn Backend>,
    snapshot: watch::Sender<Snapshot>,
}

impl RouteDataStore {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (snapshot, _) = watch::channel(Arc::new(vec![]));
        RouteDataStore { backend, snapshot }
    }

    /// Fetches all deliveries and makes them the current snapshot. On failure
    /// the previous snapshot stays in place.
    pub async fn load(&self) -> Result<Snapshot> {
        match self.backend.fetch_deliveries().await {
            Ok(records) => {
                let snapshot = Arc::new(records);
                self.snapshot.send_replace(snapshot.clone());
                info!(records = snapshot.len(), "Loaded delivery snapshot");
                Ok(snapshot)
            }
            Err(e) => {
                warn!(
                    error = e.to_string(),
                    kept_records = self.snapshot.borrow().len(),
                    "Failed to load deliveries, keeping previous snapshot"
                );
                match e {
                    Error::FetchFailed(_) => Err(e),
                    e => Err(Error::FetchFailed(e.to_string())),
                }
            }
        }
    }

    pub async fn refresh(&self) -> Result<usize> {
        Ok(self.load().await?.len())
    }

    pub fn current(&self) -> Snapshot {
        self.snapshot.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot.subscribe()
    }

    pub fn find(&self, vehicle_id: i64, date: &str) -> Option<DeliveryRecord> {
        self.snapshot
            .borrow()
            .iter()
            .find(|it| it.is_same(vehicle_id, date))
            .cloned()
    }

    /// Sets the status of a single record and returns the status it had before.
    pub fn replace(&self, vehicle_id: i64, date: &str, status: Status) -> Result<Status> {
        let mut previous = None;
        self.snapshot.send_if_modified(|snapshot| {
            let Some(index) = snapshot.iter().position(|it| it.is_same(vehicle_id, date)) else {
                return false;
            };
            let records = Arc::make_mut(snapshot);
            previous = Some(records[index].status);
            records[index].status = status;
            true
        });
        previous.ok_or_else(|| not_found(vehicle_id, date))
    }

    /// Same as [`RouteDataStore::replace`] but only applies while the record
    /// still has the `expected` status. Returns whether it was applied.
    pub fn compare_and_replace(
        &self,
        vehicle_id: i64,
        date: &str,
        expected: Status,
        status: Status,
    ) -> Result<bool> {
        let mut found = false;
        let applied = self.snapshot.send_if_modified(|snapshot| {
            let Some(index) = snapshot.iter().position(|it| it.is_same(vehicle_id, date)) else {
                return false;
            };
            found = true;
            if snapshot[index].status != expected {
                return false;
            }
            Arc::make_mut(snapshot)[index].status = status;
            true
        });
        if !found {
            Err(not_found(vehicle_id, date))?
        }
        Ok(applied)
    }

    /// Distinct dates in the order they first appear.
    pub fn available_dates(&self) -> Vec<String> {
        let mut res: Vec<String> = vec![];
        for record in self.snapshot.borrow().iter() {
            if !res.contains(&record.date) {
                res.push(record.date.clone());
            }
        }
        res
    }

    /// Distinct vehicle ids in the order they first appear.
    pub fn available_vehicles(&self) -> Vec<i64> {
        let mut res: Vec<i64> = vec![];
        for record in self.snapshot.borrow().iter() {
            if !res.contains(&record.vehicle_id) {
                res.push(record.vehicle_id);
            }
        }
        res
    }
}

fn not_found(vehicle_id: i64, date: &str) -> Error {
    Error::NotFound(format!(
        "Delivery for vehicle {vehicle_id} on {date} doesn't exist"
    ))
}
