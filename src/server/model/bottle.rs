use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

/// Classification of how a menu item consumes inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub(crate) enum SaleType {
    /// single glass poured from the open bottle
    Vaso,
    /// whole bottle at the regular price
    Normal,
    /// whole bottle, legacy alias of NORMAL
    Botella,
    /// whole bottle at a promotional price
    Promo,
    /// whole bottle plus a complement bottle sold as one priced unit
    Combo,
    /// cover-charge courtesy glass
    Entrada,
}

impl SaleType {
    pub(crate) fn as_str(self) -> &'static str {
        match self {
            Self::Vaso => "VASO",
            Self::Normal => "NORMAL",
            Self::Botella => "BOTELLA",
            Self::Promo => "PROMO",
            Self::Combo => "COMBO",
            Self::Entrada => "ENTRADA",
        }
    }
}

impl FromStr for SaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "VASO" => Ok(Self::Vaso),
            "NORMAL" => Ok(Self::Normal),
            "BOTELLA" => Ok(Self::Botella),
            "PROMO" => Ok(Self::Promo),
            "COMBO" => Ok(Self::Combo),
            "ENTRADA" => Ok(Self::Entrada),
            s => Err(format!("Invalid SaleType: {s}")),
        }
    }
}

#[derive(Debug, Serialize)]
pub(crate) struct BottleRow {
    pub id: Uuid,
    pub name: String,
    pub volume_ml: i32,
    pub sealed_count: i32,
    pub open_fraction: f64,
    pub glasses_per_bottle: i32,
    pub updated_at: Option<String>,
}

#[derive(Debug, Serialize)]
pub(crate) struct GetStockResponse {
    pub data: Vec<BottleRow>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct CreateBottleRequest {
    pub name: String,
    pub volume_ml: i32,
    #[serde(default)]
    pub sealed_count: i32,
    #[serde(default = "default_glasses_per_bottle")]
    pub glasses_per_bottle: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UpdateBottleRequest {
    pub name: String,
    pub volume_ml: i32,
    #[serde(default = "default_glasses_per_bottle")]
    pub glasses_per_bottle: i32,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SnapshotRequest {
    pub sealed_count: i32,
}

fn default_glasses_per_bottle() -> i32 {
    18
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sale_type_round_trips_through_text() {
        for sale_type in [
            SaleType::Vaso,
            SaleType::Normal,
            SaleType::Botella,
            SaleType::Promo,
            SaleType::Combo,
            SaleType::Entrada,
        ] {
            assert_eq!(sale_type.as_str().parse::<SaleType>(), Ok(sale_type));
        }
        assert!("SANGRIA".parse::<SaleType>().is_err());
    }

    #[test]
    fn sale_type_serde_uses_upper_case_names() {
        assert_eq!(serde_json::to_string(&SaleType::Vaso).unwrap(), "\"VASO\"");
        let parsed: SaleType = serde_json::from_str("\"COMBO\"").unwrap();
        assert_eq!(parsed, SaleType::Combo);
    }

    #[test]
    fn bottle_requests_fill_defaults() {
        let req: CreateBottleRequest =
            serde_json::from_str(r#"{"name": "Ron Bacardi", "volume_ml": 750}"#).unwrap();
        assert_eq!(req.sealed_count, 0);
        assert_eq!(req.glasses_per_bottle, 18);
    }
}
