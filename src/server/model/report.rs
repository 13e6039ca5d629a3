use serde::Serialize;
use uuid::Uuid;

/// One reconciliation row per bottle: opening stock against what the night's
/// ticket lines say was poured, split by tag.
#[derive(Debug, Serialize)]
pub(crate) struct ReportRow {
    pub id: Uuid,
    pub name: String,
    pub volume_ml: i32,
    pub opening_sealed: i32,
    /// whole bottles expected to still be on the shelf; VASO/ENTRADA pours
    /// come out of the open bottle and are counted manually at close
    pub remaining: i64,
    pub promo_units: i64,
    pub promo_revenue: f64,
    pub normal_units: i64,
    pub normal_revenue: f64,
    pub vaso_units: i64,
    pub vaso_revenue: f64,
    pub entrada_units: i64,
    pub entrada_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Default, Serialize)]
pub(crate) struct ReportTotals {
    pub promo_units: i64,
    pub promo_revenue: f64,
    pub normal_units: i64,
    pub normal_revenue: f64,
    pub vaso_units: i64,
    pub vaso_revenue: f64,
    pub entrada_units: i64,
    pub entrada_revenue: f64,
    pub total_revenue: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReportResponse {
    pub date: String,
    pub rows: Vec<ReportRow>,
    pub totals: ReportTotals,
}
