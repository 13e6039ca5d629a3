use std::time::Duration;

use actix_web::rt::time;
use actix_web::{post, web, Responder};
use log::warn;

use crate::server::checkout;
use crate::server::controller::error::CustomError;
use crate::server::controller::DB_TIMEOUT_SECONDS;
use crate::server::model::ticket::CheckoutRequest;
use crate::server::state::AppState;

#[post("/v1/checkout")]
/// Charge a ticket: price every line, deplete the bottles it draws from, and
/// persist ticket + lines atomically. Any failure rolls the whole thing back.
pub(crate) async fn post_checkout(
    body: web::Json<CheckoutRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let Some(mut conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let sleep = time::sleep(Duration::from_secs(DB_TIMEOUT_SECONDS));
    tokio::pin!(sleep);
    let txn = conn.transaction().await.map_err(CustomError::from_db)?;
    tokio::select! {
        result = async {
            let receipt = checkout::process(&txn, &body).await?;
            txn.commit().await.map_err(CustomError::from_db)?;
            Ok::<_, CustomError>(receipt)
        } => result.map(web::Json),
        _ = &mut sleep => {
            // dropping the in-flight transaction rolls it back
            warn!("timeout processing checkout");
            Err(CustomError::Timeout)
        }
    }
}
