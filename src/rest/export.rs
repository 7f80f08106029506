use crate::delivery::RouteDataStore;
use crate::export::{export, ExportScope};
use crate::Result;
use actix_web::http::header;
use actix_web::web::{Data, Query};
use actix_web::{get, HttpResponse};
use serde::Deserialize;
use time::OffsetDateTime;

#[derive(Deserialize)]
pub struct GetArgs {
    pub vehicle_id: Option<i64>,
    #[serde(default)]
    pub with_status: bool,
}

#[get("")]
pub async fn get(args: Query<GetArgs>, store: Data<RouteDataStore>) -> Result<HttpResponse> {
    let scope = match args.vehicle_id {
        Some(id) => ExportScope::Vehicle(id),
        None => ExportScope::All,
    };
    let snapshot = store.current();
    let export = export(
        snapshot.iter(),
        scope,
        args.with_status,
        OffsetDateTime::now_utc().date(),
    )?;
    Ok(HttpResponse::Ok()
        .content_type("text/csv")
        .insert_header((
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.file_name),
        ))
        .body(export.content))
}

#[cfg(test)]
mod test {
    use crate::delivery::Status;
    use crate::test::{mock_record, mock_state};
    use crate::Result;
    use actix_web::http::{header, StatusCode};
    use actix_web::test::TestRequest;
    use actix_web::web::{scope, Data};
    use actix_web::{test, App};

    #[test]
    async fn get_vehicle() -> Result<()> {
        let state = mock_state(vec![
            mock_record(7, "05/01/2024", Status::InProgress),
            mock_record(8, "05/01/2024", Status::Complete),
        ])
        .await;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.store.clone()))
                .service(scope("/").service(super::get)),
        )
        .await;
        let req = TestRequest::get().uri("/?vehicle_id=7").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::OK, res.status());
        assert_eq!(
            "attachment; filename=\"Vehicle_7(05-01-2024).csv\"",
            res.headers()
                .get(header::CONTENT_DISPOSITION)
                .unwrap()
                .to_str()
                .unwrap()
        );
        let body = test::read_body(res).await;
        assert_eq!(5, String::from_utf8(body.to_vec()).unwrap().lines().count());
        Ok(())
    }

    #[test]
    async fn get_all_with_status() -> Result<()> {
        let state = mock_state(vec![mock_record(7, "05/01/2024", Status::InProgress)]).await;
        let app = test::init_service(
            App::new()
                .app_data(Data::from(state.store.clone()))
                .service(scope("/").service(super::get)),
        )
        .await;
        let req = TestRequest::get().uri("/?with_status=true").to_request();
        let res = test::call_service(&app, req).await;
        let disposition = res
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .unwrap()
            .to_str()
            .unwrap()
            .to_string();
        assert!(disposition.contains("All_Vehicle_Routes_With_Status("));
        let req = TestRequest::get().uri("/?vehicle_id=99").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(StatusCode::NOT_FOUND, res.status());
        Ok(())
    }
}
