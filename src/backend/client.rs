use super::model::{
    CompletionRateEntry, DailyDeliveriesEntry, DeliveriesResponse, DeliveryPointsEntry,
    MessageResponse, UpdateStatusRequest, UpdateStatusResponse,
};
use super::{validate_manifest, Backend};
use crate::conf::Conf;
use crate::delivery::{model::records_from_wire, DeliveryRecord, Status};
use crate::export::ExportScope;
use crate::{Error, Result};
use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use url::Url;

const ALL_DELIVERIES: &str = "delivery/getAllDeliveries";
const UPDATE_STATUS: &str = "delivery/updateDeliveryStatus";
const UPLOAD_MANIFEST: &str = "route_optimization/upload";
const ROUTED_DELIVERIES: &str = "route_optimization/getRoutedDeliveries";
const COMPLETION_RATE: &str = "visualization/getCompletionRate";
const DELIVERY_POINTS: &str = "visualization/getDeliveryPoints";
const DAILY_DELIVERIES: &str = "visualization/getDailyDeliveries";
const DOWNLOAD_VEHICLE: &str = "download/download/";
const DOWNLOAD_ALL: &str = "download/download/all";
const DOWNLOAD_ALL_WITH_STATUS: &str = "download/downloadAllWithStatus";
const NO_DELIVERIES: &str = "No deliveries found";

/// HTTP client for the routing backend. Every request is bounded by the
/// configured timeout.
pub struct BackendClient {
    base_url: Url,
    http: reqwest::Client,
}

impl BackendClient {
    pub fn new(conf: &Conf) -> Result<Self> {
        let mut base_url = conf.backend_url.clone();
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let http = reqwest::Client::builder()
            .timeout(conf.request_timeout)
            .build()?;
        Ok(BackendClient { base_url, http })
    }

    fn url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("{path}: {e}")))?;
        info!(path, http_status_code = ?response.status(), "Got backend response");
        let response = ensure_success(response, &path).await?;
        response
            .json::<T>()
            .await
            .map_err(|e| Error::FetchFailed(format!("{path}: {e}")))
    }

    async fn get_deliveries(&self, path: &str) -> Result<Vec<DeliveryRecord>> {
        let url = self.url(path)?;
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::FetchFailed(format!("{path}: {e}")))?;
        info!(path, http_status_code = ?response.status(), "Got backend response");
        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| Error::FetchFailed(format!("{path}: {e}")))?;
        if status == StatusCode::NOT_FOUND && is_no_deliveries(&text) {
            return Ok(vec![]);
        }
        if !status.is_success() {
            warn!(path, status = status.as_u16(), text, "Backend request failed");
            Err(Error::FetchFailed(format!("{path}: HTTP {status}")))?
        }
        let body: DeliveriesResponse = serde_json::from_str(&text)
            .map_err(|e| Error::FetchFailed(format!("{path}: {e}")))?;
        let received = body.deliveries.len();
        let records = records_from_wire(body.deliveries);
        info!(received, accepted = records.len(), "Parsed delivery records");
        Ok(records)
    }

    pub async fn fetch_completion_rate(&self) -> Result<Vec<CompletionRateEntry>> {
        self.get_json(self.url(COMPLETION_RATE)?).await
    }

    pub async fn fetch_delivery_points(&self) -> Result<Vec<DeliveryPointsEntry>> {
        self.get_json(self.url(DELIVERY_POINTS)?).await
    }

    /// `date` is in the backend form (`MM/DD/YYYY`).
    pub async fn fetch_daily_deliveries(
        &self,
        date: Option<&str>,
    ) -> Result<Vec<DailyDeliveriesEntry>> {
        let mut url = self.url(DAILY_DELIVERIES)?;
        if let Some(date) = date {
            url.query_pairs_mut().append_pair("date", date);
        }
        self.get_json(url).await
    }

    /// Fetches the backend's own CSV for the scope.
    pub async fn download_export(&self, scope: ExportScope, with_status: bool) -> Result<Vec<u8>> {
        match (scope, with_status) {
            (ExportScope::Vehicle(id), _) => self.download_vehicle(id).await,
            (ExportScope::All, false) => self.download_all().await,
            (ExportScope::All, true) => self.download_all_with_status().await,
        }
    }

    pub async fn download_vehicle(&self, vehicle_id: i64) -> Result<Vec<u8>> {
        let url = self.url(&format!("{DOWNLOAD_VEHICLE}{vehicle_id}"))?;
        self.download(url).await
    }

    pub async fn download_all(&self) -> Result<Vec<u8>> {
        self.download(self.url(DOWNLOAD_ALL)?).await
    }

    pub async fn download_all_with_status(&self) -> Result<Vec<u8>> {
        self.download(self.url(DOWNLOAD_ALL_WITH_STATUS)?).await
    }

    async fn download(&self, url: Url) -> Result<Vec<u8>> {
        let path = url.path().to_string();
        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| Error::ExportFailed(format!("{path}: {e}")))?;
        if !response.status().is_success() {
            Err(Error::ExportFailed(format!(
                "{path}: HTTP {}",
                response.status()
            )))?
        }
        let bytes = response
            .bytes()
            .await
            .map_err(|e| Error::ExportFailed(format!("{path}: {e}")))?;
        Ok(bytes.to_vec())
    }
}

/// The backend answers 404 with this exact message when it holds no
/// deliveries. Any other 404 means the URL is wrong.
fn is_no_deliveries(body: &str) -> bool {
    serde_json::from_str::<MessageResponse>(body)
        .ok()
        .and_then(|it| it.message)
        .is_some_and(|it| it == NO_DELIVERIES)
}

async fn ensure_success(response: Response, path: &str) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    warn!(path, status = status.as_u16(), text, "Backend request failed");
    Err(Error::FetchFailed(format!("{path}: HTTP {status}")))
}

#[async_trait]
impl Backend for BackendClient {
    async fn fetch_deliveries(&self) -> Result<Vec<DeliveryRecord>> {
        self.get_deliveries(ALL_DELIVERIES).await
    }

    async fn update_delivery_status(&self, vehicle_id: i64, status: Status) -> Result<bool> {
        let response = self
            .http
            .post(self.url(UPDATE_STATUS)?)
            .json(&UpdateStatusRequest { vehicle_id, status })
            .send()
            .await
            .map_err(|e| Error::TransitionRejected(e.to_string()))?;
        let http_status = response.status();
        let body = response
            .json::<UpdateStatusResponse>()
            .await
            .map_err(|e| Error::TransitionRejected(e.to_string()))?;
        if !http_status.is_success() || !body.success {
            warn!(
                vehicle_id,
                status = %status,
                http_status = http_status.as_u16(),
                message = body.message.unwrap_or_default(),
                "Backend declined status update"
            );
            return Ok(false);
        }
        Ok(true)
    }

    async fn upload_manifest(&self, file_name: &str, bytes: Vec<u8>) -> Result<String> {
        validate_manifest(file_name, &bytes)?;
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str("text/csv")?;
        let response = self
            .http
            .post(self.url(UPLOAD_MANIFEST)?)
            .multipart(Form::new().part("file", part))
            .send()
            .await?;
        info!(file_name, http_status_code = ?response.status(), "Uploaded manifest");
        let response = ensure_success(response, UPLOAD_MANIFEST).await?;
        let body = response.json::<MessageResponse>().await?;
        Ok(body.message.unwrap_or_default())
    }

    async fn fetch_routed_deliveries(&self) -> Result<Vec<DeliveryRecord>> {
        self.get_deliveries(ROUTED_DELIVERIES).await
    }
}

#[cfg(test)]
mod test {
    use super::BackendClient;
    use crate::backend::Backend;
    use crate::conf::Conf;
    use crate::delivery::Status;
    use crate::export::ExportScope;
    use crate::{Error, Result};
    use actix_web::dev::ServerHandle;
    use actix_web::web::{self, Json, Query, ServiceConfig};
    use actix_web::{App, HttpResponse, HttpServer};
    use serde_json::{json, Value};
    use std::collections::HashMap;
    use url::Url;

    async fn serve(routes: fn(&mut ServiceConfig), path: &str) -> Result<(BackendClient, ServerHandle)> {
        let server = HttpServer::new(move || App::new().configure(routes))
            .workers(1)
            .bind(("127.0.0.1", 0))?;
        let addr = server.addrs()[0];
        let server = server.run();
        let handle = server.handle();
        actix_web::rt::spawn(server);
        let mut conf = Conf::mock();
        conf.backend_url = Url::parse(&format!("http://{addr}{path}"))?;
        Ok((BackendClient::new(&conf)?, handle))
    }

    fn routes(cfg: &mut ServiceConfig) {
        cfg.route(
            "/delivery/getAllDeliveries",
            web::get().to(|| async {
                HttpResponse::NotFound().json(json!({ "message": "No deliveries found" }))
            }),
        )
        .route(
            "/route_optimization/getRoutedDeliveries",
            web::get().to(|| async { HttpResponse::Ok().body("<html>maintenance</html>") }),
        )
        .route(
            "/delivery/updateDeliveryStatus",
            web::post().to(|body: Json<Value>| async move {
                match body["vehicleId"].as_i64() {
                    Some(1) => HttpResponse::Ok().json(json!({ "success": true })),
                    Some(2) => HttpResponse::NotFound().json(json!({
                        "success": false,
                        "message": "No matching delivery found to update"
                    })),
                    _ => HttpResponse::Ok().json(json!({ "success": false })),
                }
            }),
        )
        .route(
            "/visualization/getDailyDeliveries",
            web::get().to(|args: Query<HashMap<String, String>>| async move {
                HttpResponse::Ok().json(json!([{
                    "date": args.get("date").cloned().unwrap_or_default(),
                    "completed_deliveries": 3
                }]))
            }),
        )
        .route(
            "/download/download/all",
            web::get().to(|| async { HttpResponse::Ok().body("Vehicle,Date\n1,05/01/2024\n") }),
        )
        .default_service(web::to(|| async {
            HttpResponse::NotFound().content_type("text/html").body("<h1>Not Found</h1>")
        }));
    }

    #[test]
    fn joins_paths_under_base() -> Result<()> {
        let mut conf = Conf::mock();
        conf.backend_url = Url::parse("https://routes.example.com/api")?;
        let client = BackendClient::new(&conf)?;
        assert_eq!(
            "https://routes.example.com/api/delivery/getAllDeliveries",
            client.url(super::ALL_DELIVERIES)?.as_str()
        );
        Ok(())
    }

    #[actix_web::test]
    async fn rejects_non_csv_manifest() -> Result<()> {
        let client = BackendClient::new(&Conf::mock())?;
        let res = client.upload_manifest("routes.xlsx", vec![1, 2, 3]).await;
        assert!(matches!(res, Err(Error::InvalidInput(_))));
        let res = client.upload_manifest("routes.csv", vec![]).await;
        assert!(matches!(res, Err(Error::InvalidInput(_))));
        Ok(())
    }

    #[actix_web::test]
    async fn empty_backend_is_empty_snapshot() -> Result<()> {
        let (client, handle) = serve(routes, "/").await?;
        assert!(client.fetch_deliveries().await?.is_empty());
        handle.stop(true).await;
        Ok(())
    }

    #[actix_web::test]
    async fn unknown_path_is_fetch_failure() -> Result<()> {
        let (client, handle) = serve(routes, "/wrong-prefix").await?;
        let res = client.fetch_deliveries().await;
        assert!(matches!(res, Err(Error::FetchFailed(_))));
        handle.stop(true).await;
        Ok(())
    }

    #[actix_web::test]
    async fn non_json_body_is_fetch_failure() -> Result<()> {
        let (client, handle) = serve(routes, "/").await?;
        let res = client.fetch_routed_deliveries().await;
        assert!(matches!(res, Err(Error::FetchFailed(_))));
        handle.stop(true).await;
        Ok(())
    }

    #[actix_web::test]
    async fn status_update_outcomes() -> Result<()> {
        let (client, handle) = serve(routes, "/").await?;
        assert!(client.update_delivery_status(1, Status::Complete).await?);
        assert!(!client.update_delivery_status(2, Status::Complete).await?);
        assert!(!client.update_delivery_status(3, Status::Incomplete).await?);
        handle.stop(true).await;
        Ok(())
    }

    #[actix_web::test]
    async fn daily_deliveries_sends_date() -> Result<()> {
        let (client, handle) = serve(routes, "/").await?;
        let res = client.fetch_daily_deliveries(Some("05/01/2024")).await?;
        assert_eq!(1, res.len());
        assert_eq!("05/01/2024", res[0].date);
        assert_eq!(3, res[0].completed_deliveries);
        let res = client.fetch_daily_deliveries(None).await?;
        assert_eq!("", res[0].date);
        handle.stop(true).await;
        Ok(())
    }

    #[actix_web::test]
    async fn download_all_without_status() -> Result<()> {
        let (client, handle) = serve(routes, "/").await?;
        let res = client.download_export(ExportScope::All, false).await?;
        assert_eq!(b"Vehicle,Date\n1,05/01/2024\n".to_vec(), res);
        let res = client.download_export(ExportScope::All, true).await;
        assert!(matches!(res, Err(Error::ExportFailed(_))));
        handle.stop(true).await;
        Ok(())
    }
}
