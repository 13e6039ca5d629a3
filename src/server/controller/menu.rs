use actix_web::{delete, get, post, put, web, HttpResponse, Responder};
use log::warn;
use uuid::Uuid;

use crate::server::controller::error::CustomError;
use crate::server::controller::DB_TIMEOUT_SECONDS;
use crate::server::model::bottle::SaleType;
use crate::server::model::menu::{
    ActiveMenuEntry, CatalogEntry, GetActiveMenuResponse, GetCatalogResponse, MenuItemPayload,
    NightConfigRequest, NightConfigResponse,
};
use crate::server::model::CreatedResponse;
use crate::server::state::AppState;
use crate::server::util::time::helper::{get_utc_now, today};

#[get("/v1/menu")]
/// tonight's buttons for the bartender screen, night overrides applied
pub(crate) async fn get_menu(data: web::Data<AppState>) -> Result<impl Responder, CustomError> {
    let Some(conn) = data.get_db_read_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let night = today();
    let rows = conn
        .query(
            r#"
                SELECT
                    mi.id,
                    mi.name,
                    COALESCE(nm.sale_type_override, mi.sale_type) AS sale_type,
                    COALESCE(nm.price_override, mi.price)         AS price,
                    mi.bottle_id,
                    COALESCE(mi.combo_desc, '')                   AS combo_desc,
                    b.name                                        AS bottle_name,
                    b.volume_ml,
                    CASE
                        WHEN COALESCE(nm.sale_type_override, mi.sale_type) = 'VASO'
                        THEN ROUND(b.volume_ml::double precision / b.glasses_per_bottle)::int
                        ELSE b.volume_ml
                    END AS ml_per_serving,
                    b.glasses_per_bottle,
                    b.sealed_count,
                    b.open_fraction,
                    (b.sealed_count + CASE WHEN b.open_fraction > 0 THEN 1 ELSE 0 END)
                        AS units_available
                FROM night_menu nm
                JOIN menu_item mi ON nm.menu_item_id = mi.id
                JOIN bottle_stock b ON mi.bottle_id = b.id
                WHERE nm.night = $1
                ORDER BY sale_type, mi.name
            "#,
            &[&night],
        )
        .await
        .map_err(CustomError::from_db)?;

    let data = rows
        .into_iter()
        .filter_map(|r| {
            let sale_type = match r.get::<_, String>("sale_type").parse::<SaleType>() {
                Ok(sale_type) => sale_type,
                Err(e) => {
                    warn!("skipping menu row with bad sale type, {}", e);
                    return None;
                }
            };
            Some(ActiveMenuEntry {
                id: r.get("id"),
                name: r.get("name"),
                sale_type,
                price: r.get("price"),
                bottle_id: r.get("bottle_id"),
                combo_desc: r.get("combo_desc"),
                bottle_name: r.get("bottle_name"),
                volume_ml: r.get("volume_ml"),
                ml_per_serving: r.get("ml_per_serving"),
                glasses_per_bottle: r.get("glasses_per_bottle"),
                sealed_count: r.get("sealed_count"),
                open_fraction: r.get("open_fraction"),
                units_available: r.get("units_available"),
            })
        })
        .collect::<Vec<_>>();

    Ok(web::Json(GetActiveMenuResponse {
        night: night.to_string(),
        data,
    }))
}

#[get("/v1/menu/catalog")]
/// every configured button, for the admin screen
pub(crate) async fn get_menu_catalog(
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let Some(conn) = data.get_db_read_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let rows = conn
        .query(
            r#"
                SELECT
                    mi.id, mi.name, mi.sale_type, mi.price, mi.promo_price,
                    mi.bottle_id, mi.complement_id, COALESCE(mi.combo_desc, '') AS combo_desc,
                    b.name AS bottle_name, b.volume_ml, b.glasses_per_bottle
                FROM menu_item mi
                JOIN bottle_stock b ON mi.bottle_id = b.id
                ORDER BY mi.sale_type, mi.name
            "#,
            &[],
        )
        .await
        .map_err(CustomError::from_db)?;

    let data = rows
        .into_iter()
        .filter_map(|r| {
            let sale_type = match r.get::<_, String>("sale_type").parse::<SaleType>() {
                Ok(sale_type) => sale_type,
                Err(e) => {
                    warn!("skipping catalog row with bad sale type, {}", e);
                    return None;
                }
            };
            Some(CatalogEntry {
                id: r.get("id"),
                name: r.get("name"),
                sale_type,
                price: r.get("price"),
                promo_price: r.get("promo_price"),
                bottle_id: r.get("bottle_id"),
                complement_id: r.get("complement_id"),
                combo_desc: r.get("combo_desc"),
                bottle_name: r.get("bottle_name"),
                volume_ml: r.get("volume_ml"),
                glasses_per_bottle: r.get("glasses_per_bottle"),
            })
        })
        .collect::<Vec<_>>();

    Ok(web::Json(GetCatalogResponse { data }))
}

/// COMBO buttons must name their second bottle; everything else must not
fn resolve_complement(payload: &MenuItemPayload) -> Result<Option<Uuid>, CustomError> {
    match (payload.sale_type, payload.complement_id) {
        (SaleType::Combo, Some(id)) => Ok(Some(id)),
        (SaleType::Combo, None) => Err(CustomError::BadRequest),
        _ => Ok(None),
    }
}

#[post("/v1/menu")]
/// add a button to the catalog
pub(crate) async fn post_menu_item(
    body: web::Json<MenuItemPayload>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    if body.name.trim().is_empty() || body.price < 0.0 {
        return Err(CustomError::BadRequest);
    }
    let complement_id = resolve_complement(&body)?;
    let Some(conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let id = Uuid::new_v4();
    let name = body.name.trim();
    let sale_type = body.sale_type.as_str();
    conn.execute(
        r#"
            INSERT INTO menu_item (id, name, sale_type, bottle_id, complement_id, price, promo_price, combo_desc, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
        &[
            &id,
            &name,
            &sale_type,
            &body.bottle_id,
            &complement_id,
            &body.price,
            &body.promo_price,
            &body.combo_desc,
            &get_utc_now(),
        ],
    )
    .await
    .map_err(CustomError::from_db_fk)?;

    Ok(web::Json(CreatedResponse { id }))
}

#[put("/v1/menu/{id}")]
/// edit a catalog button
pub(crate) async fn put_menu_item(
    id: web::Path<Uuid>,
    body: web::Json<MenuItemPayload>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    if body.name.trim().is_empty() || body.price < 0.0 {
        return Err(CustomError::BadRequest);
    }
    let complement_id = resolve_complement(&body)?;
    let Some(conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let name = body.name.trim();
    let sale_type = body.sale_type.as_str();
    let updated = conn
        .execute(
            r#"
                UPDATE menu_item
                SET name = $1, sale_type = $2, bottle_id = $3, complement_id = $4,
                    price = $5, promo_price = $6, combo_desc = $7
                WHERE id = $8
            "#,
            &[
                &name,
                &sale_type,
                &body.bottle_id,
                &complement_id,
                &body.price,
                &body.promo_price,
                &body.combo_desc,
                &id.into_inner(),
            ],
        )
        .await
        .map_err(CustomError::from_db_fk)?;
    if updated == 0 {
        return Err(CustomError::NotFound);
    }

    Ok(HttpResponse::Ok())
}

#[delete("/v1/menu/{id}")]
/// remove a catalog button; its night-menu rows go with it
pub(crate) async fn delete_menu_item(
    id: web::Path<Uuid>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let Some(conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let deleted = conn
        .execute("DELETE FROM menu_item WHERE id = $1", &[&id.into_inner()])
        .await
        .map_err(CustomError::from_db)?;
    if deleted == 0 {
        return Err(CustomError::NotFound);
    }

    Ok(HttpResponse::Ok())
}

#[post("/v1/menu/night")]
/// replace tonight's active-menu configuration wholesale
pub(crate) async fn post_night_menu(
    body: web::Json<NightConfigRequest>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let Some(mut conn) = data.get_db_write_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let night = today();
    let txn = conn.transaction().await.map_err(CustomError::from_db)?;
    txn.execute("DELETE FROM night_menu WHERE night = $1", &[&night])
        .await
        .map_err(CustomError::from_db)?;
    for entry in &body.items {
        let sale_type_override = entry.sale_type.map(SaleType::as_str);
        txn.execute(
            r#"
                INSERT INTO night_menu (menu_item_id, night, sale_type_override, price_override)
                VALUES ($1, $2, $3, $4)
                ON CONFLICT (menu_item_id, night) DO UPDATE
                SET sale_type_override = EXCLUDED.sale_type_override,
                    price_override = EXCLUDED.price_override
            "#,
            &[&entry.menu_item_id, &night, &sale_type_override, &entry.price],
        )
        .await
        .map_err(CustomError::from_db_fk)?;
    }
    txn.commit().await.map_err(CustomError::from_db)?;

    Ok(web::Json(NightConfigResponse {
        active_count: body.items.len(),
    }))
}
