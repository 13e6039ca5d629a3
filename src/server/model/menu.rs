use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::model::bottle::SaleType;

/// One button on the bartender's screen for tonight, overrides applied.
#[derive(Debug, Serialize)]
pub(crate) struct ActiveMenuEntry {
    pub id: Uuid,
    pub name: String,
    pub sale_type: SaleType,
    pub price: f64,
    pub bottle_id: Uuid,
    pub combo_desc: String,
    pub bottle_name: String,
    pub volume_ml: i32,
    /// ml one unit of this button pours; a glass for VASO, the bottle otherwise
    pub ml_per_serving: i32,
    pub glasses_per_bottle: i32,
    pub sealed_count: i32,
    pub open_fraction: f64,
    pub units_available: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetActiveMenuResponse {
    pub night: String,
    pub data: Vec<ActiveMenuEntry>,
}

#[derive(Debug, Serialize)]
pub(crate) struct CatalogEntry {
    pub id: Uuid,
    pub name: String,
    pub sale_type: SaleType,
    pub price: f64,
    pub promo_price: Option<f64>,
    pub bottle_id: Uuid,
    pub complement_id: Option<Uuid>,
    pub combo_desc: String,
    pub bottle_name: String,
    pub volume_ml: i32,
    pub glasses_per_bottle: i32,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetCatalogResponse {
    pub data: Vec<CatalogEntry>,
}

/// Create/update payload for a catalog button.
#[derive(Debug, Deserialize)]
pub(crate) struct MenuItemPayload {
    pub name: String,
    pub bottle_id: Uuid,
    pub sale_type: SaleType,
    pub price: f64,
    #[serde(default)]
    pub promo_price: Option<f64>,
    #[serde(default)]
    pub combo_desc: Option<String>,
    /// second bottle of a COMBO; required when sale_type is COMBO
    #[serde(default)]
    pub complement_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NightConfigRequest {
    pub items: Vec<NightConfigEntry>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct NightConfigEntry {
    pub menu_item_id: Uuid,
    #[serde(default)]
    pub sale_type: Option<SaleType>,
    #[serde(default)]
    pub price: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(crate) struct NightConfigResponse {
    pub active_count: usize,
}
