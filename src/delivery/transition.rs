use super::{DeliveryRecord, RouteDataStore, Status};
use crate::backend::Backend;
use crate::{Error, Result};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{error, info, warn};

/// Applies dispatcher-requested status changes: validate, update the snapshot
/// optimistically, confirm with the backend, restore on rejection.
pub struct StatusTransitionManager {
    store: Arc<RouteDataStore>,
    backend: Arc<dyn Backend>,
    timeout: Duration,
    vehicle_locks: Mutex<HashMap<i64, Arc<tokio::sync::Mutex<()>>>>,
}

impl StatusTransitionManager {
    pub fn new(store: Arc<RouteDataStore>, backend: Arc<dyn Backend>, timeout: Duration) -> Self {
        StatusTransitionManager {
            store,
            backend,
            timeout,
            vehicle_locks: Mutex::new(HashMap::new()),
        }
    }

    pub async fn transition(
        &self,
        vehicle_id: i64,
        date: &str,
        target: Status,
    ) -> Result<DeliveryRecord> {
        // Transitions of the same vehicle run one after another
        let lock = self.vehicle_lock(vehicle_id)?;
        let _guard = lock.lock().await;

        let current = self.store.find(vehicle_id, date).ok_or_else(|| {
            Error::NotFound(format!(
                "Delivery for vehicle {vehicle_id} on {date} doesn't exist"
            ))
        })?;
        if current.status != Status::InProgress
            || !target.is_user_target()
            || !current.status.can_transition_to(target)
        {
            Err(Error::InvalidTransition {
                vehicle_id,
                date: date.to_string(),
                from: current.status,
                to: target,
            })?
        }

        let previous = self.store.replace(vehicle_id, date, target)?;
        let mut rollback = Rollback {
            store: &self.store,
            vehicle_id,
            date,
            optimistic: target,
            previous,
            armed: true,
        };
        info!(vehicle_id, date, from = %previous, to = %target, "Applied status optimistically");

        let confirmed = tokio::time::timeout(
            self.timeout,
            self.backend.update_delivery_status(vehicle_id, target),
        )
        .await;
        let rejection = match confirmed {
            Ok(Ok(true)) => None,
            Ok(Ok(false)) => Some("backend declined the update".to_string()),
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("no response within {:?}", self.timeout)),
        };

        match rejection {
            None => {
                rollback.armed = false;
                info!(vehicle_id, date, status = %target, "Status update confirmed");
                let mut record = current;
                record.status = target;
                Ok(record)
            }
            Some(reason) => {
                drop(rollback);
                warn!(vehicle_id, date, reason, "Status update rejected, restored previous status");
                Err(Error::TransitionRejected(reason))
            }
        }
    }

    fn vehicle_lock(&self, vehicle_id: i64) -> Result<Arc<tokio::sync::Mutex<()>>> {
        let mut locks = self
            .vehicle_locks
            .lock()
            .map_err(|_| Error::Generic("Vehicle lock table is poisoned".into()))?;
        Ok(locks.entry(vehicle_id).or_default().clone())
    }
}

/// Puts the pre-transition status back unless disarmed. Runs on rejection and
/// also when the transition future is dropped mid-flight.
struct Rollback<'a> {
    store: &'a RouteDataStore,
    vehicle_id: i64,
    date: &'a str,
    optimistic: Status,
    previous: Status,
    armed: bool,
}

impl Drop for Rollback<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        match self.store.compare_and_replace(
            self.vehicle_id,
            self.date,
            self.optimistic,
            self.previous,
        ) {
            Ok(true) => {}
            Ok(false) => warn!(
                vehicle_id = self.vehicle_id,
                date = self.date,
                "Record changed since the optimistic update, not restoring"
            ),
            Err(e) => error!(
                vehicle_id = self.vehicle_id,
                error = e.to_string(),
                "Failed to restore previous status"
            ),
        }
    }
}
