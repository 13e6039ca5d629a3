use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::server::controller::error::CustomError;
use crate::server::controller::DB_TIMEOUT_SECONDS;
use crate::server::ledger;
use crate::server::model::bottle::{
    BottleRow, CreateBottleRequest, GetStockResponse, SnapshotRequest, UpdateBottleRequest,
};
use crate::server::model::CreatedResponse;
use crate::server::state::AppState;
use crate::server::util::time::helper::{get_utc_now, today};

const TS_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

#[get("/v1/stock")]
/// full bottle inventory, for the admin screen
pub(crate) async fn get_stock(data: web::Data<AppState>) -> Result<impl Responder, CustomError> {
    let Some(conn) = data.get_db_read_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };
    let rows = conn
        .query(
            r#"
                SELECT id, name, volume_ml, sealed_count, open_fraction, glasses_per_bottle, updated_at
                FROM bottle_stock
                ORDER BY name ASC
            "#,
            &[],
        )
        .await
        .map_err(CustomError::from_db)?;

    let data = rows
        .into_iter()
        .map(|r| BottleRow {
            id: r.get("id"),
            name: r.get("name"),
            volume_ml: r.get("volume_ml"),
            sealed_count: r.get("sealed_count"),
            open_fraction: r.get("open_fraction"),
            glasses_per_bottle: r.get("glasses_per_bottle"),
            updated_at: r
                .get::<_, Option<DateTime<Utc>>>("updated_at")
                .map(|ts| ts.format(TS_FORMAT).to_string()),
        })
        .collect::<Vec<_>>();

    Ok(web::Json(GetStockResponse { data }))
}

#[post("/v1/stock")]
/// register a new bottle type; stock starts sealed, nothing open
pub(crate) async fn post_stock(
    body: web::Json<CreateBottleRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    if body.name.trim().is_empty()
        || body.volume_ml <= 0
        || body.sealed_count < 0
        || body.glasses_per_bottle < 1
    {
        return Err(CustomError::BadRequest);
    }
    let Some(conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let id = Uuid::new_v4();
    let name = body.name.trim();
    conn.execute(
        r#"
            INSERT INTO bottle_stock (id, name, volume_ml, sealed_count, open_fraction, glasses_per_bottle, created_at)
            VALUES ($1, $2, $3, $4, 0, $5, $6)
        "#,
        &[
            &id,
            &name,
            &body.volume_ml,
            &body.sealed_count,
            &body.glasses_per_bottle,
            &get_utc_now(),
        ],
    )
    .await
    .map_err(CustomError::from_db)?;

    Ok(web::Json(CreatedResponse { id }))
}

#[put("/v1/stock/{id}")]
/// edit a bottle type; a volume change rescales the open fraction so the
/// milliliters actually left in the open bottle stay the same
pub(crate) async fn put_stock(
    id: web::Path<Uuid>,
    body: web::Json<UpdateBottleRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    if body.name.trim().is_empty() || body.volume_ml <= 0 || body.glasses_per_bottle < 1 {
        return Err(CustomError::BadRequest);
    }
    let Some(mut conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let id = id.into_inner();
    let txn = conn.transaction().await.map_err(CustomError::from_db)?;
    let level = ledger::resize(&txn, id, body.volume_ml).await?;
    let name = body.name.trim();
    txn.execute(
        "UPDATE bottle_stock SET name = $1, glasses_per_bottle = $2, updated_at = $3 WHERE id = $4",
        &[&name, &body.glasses_per_bottle, &get_utc_now(), &id],
    )
    .await
    .map_err(CustomError::from_db)?;
    txn.commit().await.map_err(CustomError::from_db)?;

    Ok(web::Json(BottleRow {
        id,
        name: name.to_string(),
        volume_ml: body.volume_ml,
        sealed_count: level.sealed_count,
        open_fraction: level.open_fraction,
        glasses_per_bottle: body.glasses_per_bottle,
        updated_at: Some(get_utc_now().format(TS_FORMAT).to_string()),
    }))
}

#[delete("/v1/stock/{id}")]
/// retire a bottle type: drop its catalog buttons, null complement
/// references, drop its snapshots, then the bottle itself
pub(crate) async fn delete_stock(
    id: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let Some(mut conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let id = id.into_inner();
    let txn = conn.transaction().await.map_err(CustomError::from_db)?;
    txn.execute(
        "UPDATE menu_item SET complement_id = NULL WHERE complement_id = $1",
        &[&id],
    )
    .await
    .map_err(CustomError::from_db)?;
    txn.execute("DELETE FROM menu_item WHERE bottle_id = $1", &[&id])
        .await
        .map_err(CustomError::from_db)?;
    txn.execute("DELETE FROM stock_snapshot WHERE bottle_id = $1", &[&id])
        .await
        .map_err(CustomError::from_db)?;
    let deleted = txn
        .execute("DELETE FROM bottle_stock WHERE id = $1", &[&id])
        .await
        .map_err(CustomError::from_db)?;
    if deleted == 0 {
        return Err(CustomError::NotFound); // txn drops, nothing happened
    }
    txn.commit().await.map_err(CustomError::from_db)?;

    Ok(HttpResponse::Ok())
}

#[post("/v1/stock/{id}/snapshot")]
/// record tonight's opening sealed count for the reconciliation sheet; the
/// open-bottle leftover is counted by hand at close
pub(crate) async fn post_stock_snapshot(
    id: web::Path<Uuid>,
    body: web::Json<SnapshotRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    if body.sealed_count < 0 {
        return Err(CustomError::BadRequest);
    }
    let Some(mut conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let id = id.into_inner();
    let night = today();
    let txn = conn.transaction().await.map_err(CustomError::from_db)?;
    let updated = txn
        .execute(
            "UPDATE bottle_stock SET sealed_count = $1, updated_at = $2 WHERE id = $3",
            &[&body.sealed_count, &get_utc_now(), &id],
        )
        .await
        .map_err(CustomError::from_db)?;
    if updated == 0 {
        return Err(CustomError::NotFound);
    }
    txn.execute(
        r#"
            INSERT INTO stock_snapshot (bottle_id, night, sealed_count, open_fraction)
            VALUES ($1, $2, $3, 0)
            ON CONFLICT (bottle_id, night) DO UPDATE
            SET sealed_count = EXCLUDED.sealed_count
        "#,
        &[&id, &night, &body.sealed_count],
    )
    .await
    .map_err(CustomError::from_db)?;
    txn.commit().await.map_err(CustomError::from_db)?;

    Ok(HttpResponse::Ok())
}
