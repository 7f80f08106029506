use crate::conf::SLOW_REQUEST_SECS;
use actix_web::{
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    Error, HttpMessage,
};
use std::time::Instant;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins, `info` otherwise. Release builds log JSON lines.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if cfg!(debug_assertions) {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(false)
            .init();
    }
}

/// Handlers put this into request extensions to report how many entities
/// they returned.
pub struct RequestExtension {
    pub entities: i64,
}

impl RequestExtension {
    pub fn new(entities: usize) -> Self {
        RequestExtension {
            entities: entities as i64,
        }
    }
}

pub async fn handle_request(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let started_at = Instant::now();
    let res = next.call(req).await;
    let Ok(res) = res else { return res };
    let extensions = res.request().extensions();
    let entities = extensions.get::<RequestExtension>().map(|it| it.entities);
    drop(extensions);
    let req_method = res.request().method().as_str().to_string();
    let req_path = res.request().path().to_string();
    let req_query_string = res.request().query_string().to_string();
    let res_status = res.response().status().as_u16();
    let res_time_sec = started_at.elapsed().as_secs_f64();
    if res_time_sec > SLOW_REQUEST_SECS {
        warn!(
            req_method,
            req_path,
            req_query_string,
            res_status,
            entities,
            res_time_sec,
            "Slow request"
        );
    } else {
        info!(
            req_method,
            req_path,
            req_query_string,
            res_status,
            entities,
            res_time_sec,
        );
    }
    Ok(res)
}
