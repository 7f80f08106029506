use crate::backend::BackendClient;
use crate::conf::Conf;
use crate::dashboard::{DashboardFeed, Slot};
use crate::delivery::model::picker_to_backend;
use crate::Result;
use serde::Serialize;
use std::cell::RefCell;
use tracing::info;

/// Requests all four metric series at once. Each one is applied and logged as
/// soon as it arrives, a slow or failed category never holds back the rest.
pub async fn run(conf: &Conf, args: &[String]) -> Result<()> {
    let date = match args.first() {
        Some(date) => Some(picker_to_backend(date)?),
        None => None,
    };
    let client = BackendClient::new(conf)?;
    let feed = RefCell::new(DashboardFeed::default());

    tokio::join!(
        async {
            let res = client.fetch_completion_rate().await;
            let mut feed = feed.borrow_mut();
            feed.apply_completion_rate(res);
            report("completion_rate", &feed.completion_rate);
        },
        async {
            let res = client.fetch_delivery_points().await;
            let mut feed = feed.borrow_mut();
            feed.apply_delivery_points(res);
            report("delivery_points", &feed.delivery_points);
        },
        async {
            let res = client.fetch_daily_deliveries(date.as_deref()).await;
            let mut feed = feed.borrow_mut();
            feed.apply_daily_deliveries(res);
            report("daily_deliveries", &feed.daily_deliveries);
        },
        async {
            let res = client.fetch_daily_deliveries(None).await;
            let mut feed = feed.borrow_mut();
            feed.apply_overall_status(res);
            report("overall_status", &feed.overall_status);
        },
    );

    let feed = feed.into_inner();
    info!(
        settled = feed.is_settled(),
        dashboard = serde_json::to_string(&feed)?,
        "Dashboard ready"
    );
    Ok(())
}

fn report<T: Serialize>(category: &str, slot: &Slot<T>) {
    if let Slot::Ready(data) = slot {
        info!(
            category,
            data = serde_json::to_string(data).unwrap_or_default(),
            "Dashboard metric arrived"
        );
    }
}
