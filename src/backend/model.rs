use crate::delivery::Status;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Deserialize)]
pub struct DeliveriesResponse {
    #[serde(default)]
    pub deliveries: Vec<Value>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusRequest {
    pub vehicle_id: i64,
    pub status: Status,
}

#[derive(Deserialize)]
pub struct UpdateStatusResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}

/// `completion_rate` is a percentage here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRateEntry {
    pub date: String,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPointsEntry {
    pub date: String,
    pub delivery_points: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyDeliveriesEntry {
    pub date: String,
    #[serde(default)]
    pub completed_deliveries: i64,
    #[serde(default)]
    pub incomplete_deliveries: i64,
    #[serde(default)]
    pub pending_deliveries: i64,
}
