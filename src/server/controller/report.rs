use std::collections::HashMap;

use actix_web::{get, web, Responder};
use chrono::NaiveDate;
use uuid::Uuid;

use crate::server::checkout::round2;
use crate::server::controller::error::CustomError;
use crate::server::controller::DB_TIMEOUT_SECONDS;
use crate::server::model::report::{ReportResponse, ReportRow, ReportTotals};
use crate::server::model::ticket::LineTag;
use crate::server::state::AppState;

/// A bottle with the sealed count it entered the night with.
#[derive(Debug)]
pub(crate) struct OpeningStock {
    pub id: Uuid,
    pub name: String,
    pub volume_ml: i32,
    pub opening_sealed: i32,
}

#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct TagTotals {
    pub units: i64,
    pub revenue: f64,
}

pub(crate) type SalesByBottle = HashMap<Uuid, HashMap<String, TagTotals>>;

#[get("/v1/report/{date}")]
/// end-of-night reconciliation sheet: opening stock vs what the ticket lines
/// say was sold, per bottle and per tag
pub(crate) async fn get_report(
    date: web::Path<String>,
    data: web::Data<AppState>,
) -> Result<impl Responder, CustomError> {
    let Ok(date) = NaiveDate::parse_from_str(&date, "%Y-%m-%d") else {
        return Err(CustomError::BadRequest);
    };
    let Some(conn) = data.get_db_read_pool().acquire(DB_TIMEOUT_SECONDS).await else {
        return Err(CustomError::ServerIsBusy);
    };

    let bottles = conn
        .query(
            r#"
                SELECT b.id, b.name, b.volume_ml,
                       COALESCE(ss.sealed_count, b.sealed_count) AS opening_sealed
                FROM bottle_stock b
                LEFT JOIN stock_snapshot ss ON ss.bottle_id = b.id AND ss.night = $1
                ORDER BY b.name ASC
            "#,
            &[&date],
        )
        .await
        .map_err(CustomError::from_db)?
        .into_iter()
        .map(|r| OpeningStock {
            id: r.get("id"),
            name: r.get("name"),
            volume_ml: r.get("volume_ml"),
            opening_sealed: r.get("opening_sealed"),
        })
        .collect::<Vec<_>>();

    let mut sales: SalesByBottle = HashMap::new();
    let rows = conn
        .query(
            r#"
                SELECT tl.bottle_id, tl.tag,
                       SUM(tl.quantity)::bigint AS units,
                       SUM(tl.subtotal)         AS revenue
                FROM ticket t
                JOIN ticket_line tl ON tl.ticket_id = t.id
                WHERE tl.bottle_id IS NOT NULL AND t.created_at::date = $1
                GROUP BY tl.bottle_id, tl.tag
            "#,
            &[&date],
        )
        .await
        .map_err(CustomError::from_db)?;
    for r in rows {
        let bottle_id: Uuid = r.get("bottle_id");
        sales.entry(bottle_id).or_default().insert(
            r.get("tag"),
            TagTotals {
                units: r.get("units"),
                revenue: r.get("revenue"),
            },
        );
    }

    Ok(web::Json(build_report(date, bottles, &sales)))
}

/// Fold opening stock and per-tag sales into the reconciliation sheet.
pub(crate) fn build_report(
    date: NaiveDate,
    bottles: Vec<OpeningStock>,
    sales: &SalesByBottle,
) -> ReportResponse {
    let mut totals = ReportTotals::default();
    let rows = bottles
        .into_iter()
        .map(|bottle| {
            let by_tag = sales.get(&bottle.id);
            let take = |tag: LineTag| {
                by_tag
                    .and_then(|m| m.get(tag.as_str()))
                    .copied()
                    .unwrap_or_default()
            };
            let promo = take(LineTag::Promo);
            let normal = take(LineTag::Normal);
            let vaso = take(LineTag::Vaso);
            let entrada = take(LineTag::Entrada);

            // only whole-bottle sales empty sealed bottles; VASO/ENTRADA pours
            // come out of the open bottle and are counted by hand at close
            let consumed = promo.units + normal.units;
            let remaining = (i64::from(bottle.opening_sealed) - consumed).max(0);
            let total_revenue =
                round2(promo.revenue + normal.revenue + vaso.revenue + entrada.revenue);

            totals.promo_units += promo.units;
            totals.promo_revenue += promo.revenue;
            totals.normal_units += normal.units;
            totals.normal_revenue += normal.revenue;
            totals.vaso_units += vaso.units;
            totals.vaso_revenue += vaso.revenue;
            totals.entrada_units += entrada.units;
            totals.entrada_revenue += entrada.revenue;
            totals.total_revenue += total_revenue;

            ReportRow {
                id: bottle.id,
                name: bottle.name,
                volume_ml: bottle.volume_ml,
                opening_sealed: bottle.opening_sealed,
                remaining,
                promo_units: promo.units,
                promo_revenue: round2(promo.revenue),
                normal_units: normal.units,
                normal_revenue: round2(normal.revenue),
                vaso_units: vaso.units,
                vaso_revenue: round2(vaso.revenue),
                entrada_units: entrada.units,
                entrada_revenue: round2(entrada.revenue),
                total_revenue,
            }
        })
        .collect::<Vec<_>>();

    totals.promo_revenue = round2(totals.promo_revenue);
    totals.normal_revenue = round2(totals.normal_revenue);
    totals.vaso_revenue = round2(totals.vaso_revenue);
    totals.entrada_revenue = round2(totals.entrada_revenue);
    totals.total_revenue = round2(totals.total_revenue);

    ReportResponse {
        date: date.to_string(),
        rows,
        totals,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bottle(name: &str, opening_sealed: i32) -> OpeningStock {
        OpeningStock {
            id: Uuid::new_v4(),
            name: name.to_string(),
            volume_ml: 750,
            opening_sealed,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
    }

    #[test]
    fn remaining_counts_only_whole_bottle_sales() {
        let fernet = bottle("Fernet", 5);
        let mut sales: SalesByBottle = HashMap::new();
        sales.entry(fernet.id).or_default().extend([
            ("PROMO".to_string(), TagTotals { units: 2, revenue: 100.0 }),
            ("VASO".to_string(), TagTotals { units: 7, revenue: 21.0 }),
        ]);

        let report = build_report(date(), vec![fernet], &sales);
        let row = &report.rows[0];
        assert_eq!(row.remaining, 3); // the 7 glasses are not whole bottles
        assert_eq!(row.promo_units, 2);
        assert_eq!(row.vaso_units, 7);
        assert_eq!(row.total_revenue, 121.0);
    }

    #[test]
    fn remaining_never_goes_negative() {
        let ron = bottle("Ron", 1);
        let mut sales: SalesByBottle = HashMap::new();
        sales.entry(ron.id).or_default().insert(
            "NORMAL".to_string(),
            TagTotals { units: 3, revenue: 420.0 },
        );

        let report = build_report(date(), vec![ron], &sales);
        assert_eq!(report.rows[0].remaining, 0);
    }

    #[test]
    fn bottles_without_sales_show_zeros() {
        let report = build_report(date(), vec![bottle("Vodka", 4)], &HashMap::new());
        let row = &report.rows[0];
        assert_eq!(row.remaining, 4);
        assert_eq!(row.promo_units, 0);
        assert_eq!(row.total_revenue, 0.0);
        assert_eq!(report.totals.total_revenue, 0.0);
    }

    #[test]
    fn totals_aggregate_across_bottles() {
        let a = bottle("A", 2);
        let b = bottle("B", 2);
        let mut sales: SalesByBottle = HashMap::new();
        sales.entry(a.id).or_default().insert(
            "PROMO".to_string(),
            TagTotals { units: 1, revenue: 50.0 },
        );
        sales.entry(b.id).or_default().insert(
            "ENTRADA".to_string(),
            TagTotals { units: 4, revenue: 0.0 },
        );

        let report = build_report(date(), vec![a, b], &sales);
        assert_eq!(report.totals.promo_units, 1);
        assert_eq!(report.totals.entrada_units, 4);
        assert_eq!(report.totals.total_revenue, 50.0);
        assert_eq!(report.date, "2025-06-14");
    }
}
