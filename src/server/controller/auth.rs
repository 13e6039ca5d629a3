use actix_web::body::{BoxBody, MessageBody};
use actix_web::dev::{ServiceRequest, ServiceResponse};
use actix_web::error::ResponseError;
use actix_web::http::header;
use actix_web::middleware::Next;
use actix_web::web;

use crate::server::controller::error::CustomError;
use crate::server::state::AppState;

/// Shared-secret bearer guard; the venue runs one token for all staff
/// devices, there are no per-user accounts.
pub(crate) async fn require_token(
    req: ServiceRequest,
    next: Next<impl MessageBody + 'static>,
) -> Result<ServiceResponse<BoxBody>, actix_web::Error> {
    let expected = req
        .app_data::<web::Data<AppState>>()
        .map(|state| state.auth_token().to_string());
    let presented = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::to_string);

    match (expected, presented) {
        (Some(expected), Some(presented)) if expected == presented => next
            .call(req)
            .await
            .map(ServiceResponse::map_into_boxed_body),
        _ => Ok(req.into_response(CustomError::Unauthorized.error_response())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::server::database::pool::Pool;
    use actix_web::http::StatusCode;
    use actix_web::middleware::from_fn;
    use actix_web::{test, App, HttpResponse};

    fn state() -> AppState {
        AppState::new(Pool::new("read"), Pool::new("write"), "sekrit".to_string())
    }

    #[actix_web::test]
    async fn rejects_requests_without_the_shared_token() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(require_token))
                .app_data(web::Data::new(state()))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get().uri("/ping").to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header((header::AUTHORIZATION, "Bearer wrong"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn passes_requests_with_the_shared_token() {
        let app = test::init_service(
            App::new()
                .wrap(from_fn(require_token))
                .app_data(web::Data::new(state()))
                .route("/ping", web::get().to(HttpResponse::Ok)),
        )
        .await;

        let req = test::TestRequest::get()
            .uri("/ping")
            .insert_header((header::AUTHORIZATION, "Bearer sekrit"))
            .to_request();
        let res = test::call_service(&app, req).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
}
