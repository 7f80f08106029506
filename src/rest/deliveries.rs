use crate::delivery::{
    filter, in_progress_vehicles, DeliveryFilter, DeliveryRecord, RouteDataStore, Status,
    StatusTransitionManager,
};
use crate::log::RequestExtension;
use crate::Result;
use actix_web::web::{Data, Json, Path, Query};
use actix_web::{get, post, HttpMessage, HttpRequest};
use serde::{Deserialize, Serialize};

#[get("")]
pub async fn get(
    req: HttpRequest,
    args: Query<DeliveryFilter>,
    store: Data<RouteDataStore>,
) -> Result<Json<Vec<DeliveryRecord>>> {
    let snapshot = store.current();
    let items: Vec<DeliveryRecord> = filter(snapshot.iter(), &args)
        .into_iter()
        .cloned()
        .collect();
    req.extensions_mut()
        .insert(RequestExtension::new(items.len()));
    Ok(Json(items))
}

#[derive(Serialize, Deserialize)]
pub struct RefreshResponse {
    pub records: usize,
}

#[post("refresh")]
pub async fn post_refresh(store: Data<RouteDataStore>) -> Result<Json<RefreshResponse>> {
    let records = store.refresh().await?;
    Ok(Json(RefreshResponse { records }))
}

#[derive(Deserialize)]
pub struct PostStatusArgs {
    pub date: String,
    pub status: Status,
}

#[post("{vehicle_id}/status")]
pub async fn post_status(
    vehicle_id: Path<i64>,
    args: Json<PostStatusArgs>,
    transitions: Data<StatusTransitionManager>,
) -> Result<Json<DeliveryRecord>> {
    let record = transitions
        .transition(vehicle_id.into_inner(), &args.date, args.status)
        .await?;
    Ok(Json(record))
}

#[get("dates")]
pub async fn get_dates(store: Data<RouteDataStore>) -> Result<Json<Vec<String>>> {
    Ok(Json(store.available_dates()))
}

#[get("vehicles")]
pub async fn get_vehicles(store: Data<RouteDataStore>) -> Result<Json<Vec<i64>>> {
    Ok(Json(store.available_vehicles()))
}

#[get("vehicles/in-progress")]
pub async fn get_in_progress_vehicles(store: Data<RouteDataStore>) -> Result<Json<Vec<i64>>> {
    Ok(Json(in_progress_vehicles(store.current().iter())))
}

#[cfg(test)]
mod test {
    use crate::delivery::{DeliveryRecord, Status};
    use crate::error::ApiError;
    use crate::test::{mock_record, mock_state};
    use crate::Result;
    use actix_web::http::StatusCode;
    use actix_web::test::TestRequest;
    use actix_web::web::{scope, Data};
    use actix_web::{test, App};
    use serde_json::{json, Value};

    fn records() -> Vec<DeliveryRecord> {
        vec![
            mock_record(1, "05/01/2024", Status::Complete),
            mock_record(2, "05/01/2024", Status::InProgress),
            mock_record(1, "05/02/2024", Status::InProgress),
        ]
    }

    #[test]
    async fn get_filtered() -> Result<()> {
        let state = mock_state(records()).await;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.store.clone()))
                .service(scope("/").service(super::get)),
        )
        .await;
        let req = TestRequest::get().uri("/").to_request();
        let res: Vec<DeliveryRecord> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(3, res.len());
        let req = TestRequest::get()
            .uri("/?status=In%20Progress&vehicle_id=1")
            .to_request();
        let res: Vec<DeliveryRecord> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(1, res.len());
        assert_eq!("05/02/2024", res[0].date);
        let req = TestRequest::get()
            .uri("/?status=InProgress&date=&vehicle_id=")
            .to_request();
        let res: Vec<DeliveryRecord> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(2, res.len());
        Ok(())
    }

    #[test]
    async fn post_status() -> Result<()> {
        let state = mock_state(records()).await;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.transitions.clone()))
                .service(scope("").service(super::post_status)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/2/status")
            .set_json(json!({ "date": "05/01/2024", "status": "Complete" }))
            .to_request();
        let res: DeliveryRecord = test::call_and_read_body_json(&app, req).await;
        assert_eq!(Status::Complete, res.status);
        assert_eq!(
            Some(Status::Complete),
            state.store.find(2, "05/01/2024").map(|it| it.status)
        );
        assert_eq!(vec![(2, Status::Complete)], state.backend.updates());
        Ok(())
    }

    #[test]
    async fn post_status_conflict_and_not_found() -> Result<()> {
        let state = mock_state(records()).await;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.transitions.clone()))
                .service(scope("").service(super::post_status)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/1/status")
            .set_json(json!({ "date": "05/01/2024", "status": "Incomplete" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::CONFLICT, res.status());
        let body: ApiError = test::read_body_json(res).await;
        assert_eq!(409, body.http_code);
        let req = TestRequest::post()
            .uri("/9/status")
            .set_json(json!({ "date": "05/01/2024", "status": "Complete" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());
        assert!(state.backend.updates().is_empty());
        Ok(())
    }

    #[test]
    async fn post_status_rejected() -> Result<()> {
        let state = mock_state(records()).await;
        state.backend.decline_updates(true);
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.transitions.clone()))
                .service(scope("").service(super::post_status)),
        )
        .await;
        let req = TestRequest::post()
            .uri("/2/status")
            .set_json(json!({ "date": "05/01/2024", "status": "Complete" }))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_GATEWAY, res.status());
        assert_eq!(
            Some(Status::InProgress),
            state.store.find(2, "05/01/2024").map(|it| it.status)
        );
        Ok(())
    }

    #[test]
    async fn post_refresh() -> Result<()> {
        let state = mock_state(records()).await;
        state
            .backend
            .set_records(vec![mock_record(5, "05/03/2024", Status::Pending)]);
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.store.clone()))
                .service(scope("").service(super::post_refresh)),
        )
        .await;
        let req = TestRequest::post().uri("/refresh").to_request();
        let res: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(json!({ "records": 1 }), res);
        assert_eq!(2, state.backend.fetch_calls());
        state.backend.fail_fetches(true);
        let req = TestRequest::post().uri("/refresh").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::BAD_GATEWAY, res.status());
        assert_eq!(1, state.store.current().len());
        Ok(())
    }

    #[test]
    async fn get_pickers() -> Result<()> {
        let state = mock_state(records()).await;
        let app = test::init_service(
            App::new().app_data(Data::from(state.store.clone())).service(
                scope("")
                    .service(super::get_dates)
                    .service(super::get_vehicles)
                    .service(super::get_in_progress_vehicles),
            ),
        )
        .await;
        let req = TestRequest::get().uri("/dates").to_request();
        let res: Vec<String> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(vec!["05/01/2024", "05/02/2024"], res);
        let req = TestRequest::get().uri("/vehicles").to_request();
        let res: Vec<i64> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(vec![1, 2], res);
        let req = TestRequest::get().uri("/vehicles/in-progress").to_request();
        let res: Vec<i64> = test::call_and_read_body_json(&app, req).await;
        assert_eq!(vec![2, 1], res);
        Ok(())
    }
}
