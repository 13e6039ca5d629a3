use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::server::model::bottle::SaleType;

/// Reporting tag stamped on every bottle-backed ticket line. Independent from
/// the menu item's own sale type: combos decompose into two PROMO lines, and
/// BOTELLA sales are folded into NORMAL at write time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum LineTag {
    Promo,
    Normal,
    Vaso,
    Entrada,
}

impl LineTag {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Promo => "PROMO",
            Self::Normal => "NORMAL",
            Self::Vaso => "VASO",
            Self::Entrada => "ENTRADA",
        }
    }
}

impl SaleType {
    pub(crate) fn line_tag(self) -> LineTag {
        match self {
            Self::Vaso => LineTag::Vaso,
            Self::Entrada => LineTag::Entrada,
            Self::Promo | Self::Combo => LineTag::Promo,
            Self::Normal | Self::Botella => LineTag::Normal,
        }
    }
}

/// One submitted ticket line; the shape of the JSON decides the kind.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum LineRequest {
    /// ad-hoc liquor + mixer pairing at an explicit price
    CustomCombo {
        #[serde(default)]
        name: Option<String>,
        liquor_item_id: Uuid,
        mixer_item_id: Uuid,
        price: f64,
        quantity: i32,
    },
    /// a catalog button
    Menu { menu_item_id: Uuid, quantity: i32 },
    /// free-text charge with no inventory effect
    Extra {
        name: String,
        price: f64,
        quantity: i32,
        label: String,
    },
}

impl LineRequest {
    pub(crate) fn quantity(&self) -> i32 {
        match self {
            Self::CustomCombo { quantity, .. }
            | Self::Menu { quantity, .. }
            | Self::Extra { quantity, .. } => *quantity,
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct CheckoutRequest {
    pub lines: Vec<LineRequest>,
    #[serde(default = "default_payment_method")]
    pub payment_method: String,
    #[serde(default)]
    pub cash_received: Option<f64>,
    #[serde(default)]
    pub created_by: Option<String>,
}

fn default_payment_method() -> String {
    "EFECTIVO".to_string()
}

#[derive(Debug, Serialize)]
pub(crate) struct ReceiptLine {
    pub name: String,
    pub quantity: i32,
    pub subtotal: f64,
}

#[derive(Debug, Serialize)]
pub(crate) struct CheckoutResponse {
    pub ticket_id: Uuid,
    pub total: f64,
    pub receipt: Vec<ReceiptLine>,
}
