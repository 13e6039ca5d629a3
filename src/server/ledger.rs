//! Inventory ledger: per-bottle sealed count plus one open-bottle fraction,
//! and the deduction policy applied by every sale.
//!
//! All mutating operations run inside the caller's transaction and take the
//! bottle row lock (`FOR UPDATE`) before deciding anything, so concurrent
//! checkouts against the same bottle serialize instead of double-spending the
//! last sealed unit.

use tokio_postgres::Transaction;
use uuid::Uuid;

use crate::server::controller::error::CustomError;
use crate::server::model::bottle::SaleType;
use crate::server::util::time::helper::get_utc_now;

/// Tolerance for the floating-point fraction arithmetic.
const EPSILON: f64 = 1e-3;

/// What a sale does to the bottle it draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DeductionPolicy {
    /// Opens a bottle when none is open; per-glass depletion is not tracked
    /// here, it is counted manually at shift close.
    ByGlass,
    /// Consumes 100 percentage-points of content per unit sold.
    WholeBottle,
}

impl SaleType {
    /// Single dispatch point for the deduction policy, so no call site can
    /// drift from another.
    pub(crate) fn policy(self) -> DeductionPolicy {
        match self {
            SaleType::Vaso | SaleType::Entrada => DeductionPolicy::ByGlass,
            SaleType::Normal | SaleType::Botella | SaleType::Promo | SaleType::Combo => {
                DeductionPolicy::WholeBottle
            }
        }
    }
}

/// Sealed count plus the fraction (0-100) left in the single open bottle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct BottleLevel {
    pub sealed_count: i32,
    pub open_fraction: f64,
}

/// Result of a successful deduction: the bottle's display name and its new
/// level.
#[derive(Debug)]
pub(crate) struct DeductOutcome {
    pub bottle_name: String,
    pub level: BottleLevel,
}

pub(crate) fn round4(value: f64) -> f64 {
    (value * 10_000.0).round() / 10_000.0
}

/// Apply one sale against a bottle level. Fails whole, or not at all: an
/// `InsufficientStock` result implies the input level is still valid.
pub(crate) fn apply_sale(
    level: BottleLevel,
    policy: DeductionPolicy,
    quantity: i32,
) -> Result<BottleLevel, CustomError> {
    match policy {
        DeductionPolicy::ByGlass => {
            if level.open_fraction > 0.0 {
                // a bottle is already open; how much each glass took out of
                // it is reconciled manually at close
                Ok(level)
            } else if level.sealed_count > 0 {
                Ok(BottleLevel {
                    sealed_count: level.sealed_count - 1,
                    open_fraction: 100.0,
                })
            } else {
                Err(CustomError::InsufficientStock)
            }
        }
        DeductionPolicy::WholeBottle => {
            let mut sealed = level.sealed_count;
            let mut remaining = level.open_fraction - 100.0 * f64::from(quantity);
            while remaining < -EPSILON && sealed > 0 {
                sealed -= 1;
                remaining += 100.0;
            }
            if remaining < -EPSILON {
                return Err(CustomError::InsufficientStock);
            }
            Ok(BottleLevel {
                sealed_count: sealed,
                open_fraction: round4(remaining.max(0.0)),
            })
        }
    }
}

/// Rescale the open fraction when a bottle's nominal volume changes, so the
/// absolute remaining milliliters stay the same.
pub(crate) fn rescale_fraction(open_fraction: f64, old_volume_ml: i32, new_volume_ml: i32) -> f64 {
    if old_volume_ml <= 0 || new_volume_ml <= 0 || old_volume_ml == new_volume_ml {
        return open_fraction;
    }
    let rescaled =
        (open_fraction / 100.0 * f64::from(old_volume_ml)) / f64::from(new_volume_ml) * 100.0;
    round4(rescaled.min(100.0))
}

/// Deduct one sale's consumption from a bottle, under a row lock held for the
/// rest of the transaction.
pub(crate) async fn deduct(
    txn: &Transaction<'_>,
    bottle_id: Uuid,
    sale_type: SaleType,
    quantity: i32,
) -> Result<DeductOutcome, CustomError> {
    let row = txn
        .query_opt(
            "SELECT name, sealed_count, open_fraction FROM bottle_stock WHERE id = $1 FOR UPDATE",
            &[&bottle_id],
        )
        .await
        .map_err(CustomError::from_db)?
        .ok_or(CustomError::NotFound)?;

    let level = BottleLevel {
        sealed_count: row.get("sealed_count"),
        open_fraction: row.get("open_fraction"),
    };
    let next = apply_sale(level, sale_type.policy(), quantity)?;
    if next != level {
        txn.execute(
            "UPDATE bottle_stock SET sealed_count = $1, open_fraction = $2, updated_at = $3 WHERE id = $4",
            &[&next.sealed_count, &next.open_fraction, &get_utc_now(), &bottle_id],
        )
        .await
        .map_err(CustomError::from_db)?;
    }
    Ok(DeductOutcome {
        bottle_name: row.get("name"),
        level: next,
    })
}

/// Change a bottle's nominal volume, rescaling its open fraction to preserve
/// the liquid actually left in it.
pub(crate) async fn resize(
    txn: &Transaction<'_>,
    bottle_id: Uuid,
    new_volume_ml: i32,
) -> Result<BottleLevel, CustomError> {
    if new_volume_ml <= 0 {
        return Err(CustomError::BadRequest);
    }
    let row = txn
        .query_opt(
            "SELECT volume_ml, sealed_count, open_fraction FROM bottle_stock WHERE id = $1 FOR UPDATE",
            &[&bottle_id],
        )
        .await
        .map_err(CustomError::from_db)?
        .ok_or(CustomError::NotFound)?;

    let open_fraction =
        rescale_fraction(row.get("open_fraction"), row.get("volume_ml"), new_volume_ml);
    txn.execute(
        "UPDATE bottle_stock SET volume_ml = $1, open_fraction = $2, updated_at = $3 WHERE id = $4",
        &[&new_volume_ml, &open_fraction, &get_utc_now(), &bottle_id],
    )
    .await
    .map_err(CustomError::from_db)?;

    Ok(BottleLevel {
        sealed_count: row.get("sealed_count"),
        open_fraction,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn level(sealed_count: i32, open_fraction: f64) -> BottleLevel {
        BottleLevel {
            sealed_count,
            open_fraction,
        }
    }

    #[test]
    fn whole_bottle_opens_from_sealed_stock() {
        // sell one bottle with nothing open: one sealed unit is consumed whole
        let next = apply_sale(level(2, 0.0), DeductionPolicy::WholeBottle, 1).unwrap();
        assert_eq!(next, level(1, 0.0));
    }

    #[test]
    fn whole_bottle_drains_open_fraction_first() {
        let next = apply_sale(level(1, 50.0), DeductionPolicy::WholeBottle, 1).unwrap();
        assert_eq!(next, level(0, 50.0));
    }

    #[test]
    fn whole_bottle_spans_multiple_sealed_units() {
        let next = apply_sale(level(3, 20.0), DeductionPolicy::WholeBottle, 3).unwrap();
        assert_eq!(next, level(0, 20.0));
    }

    #[test]
    fn whole_bottle_fails_when_content_runs_out() {
        let before = level(0, 40.0);
        let result = apply_sale(before, DeductionPolicy::WholeBottle, 1);
        assert!(matches!(result, Err(CustomError::InsufficientStock)));
        // nothing was written; the caller still holds the untouched level
        assert_eq!(before, level(0, 40.0));
    }

    #[test]
    fn whole_bottle_never_goes_negative() {
        let next = apply_sale(level(5, 0.0), DeductionPolicy::WholeBottle, 5).unwrap();
        assert_eq!(next.sealed_count, 0);
        assert!(next.open_fraction >= 0.0 && next.open_fraction <= 100.0);
        assert!(matches!(
            apply_sale(level(5, 0.0), DeductionPolicy::WholeBottle, 6),
            Err(CustomError::InsufficientStock)
        ));
    }

    #[test]
    fn whole_bottle_tolerates_fraction_dust() {
        // 99.9999 open is one bottle for all practical purposes
        let next = apply_sale(level(0, 99.9999), DeductionPolicy::WholeBottle, 1).unwrap();
        assert_eq!(next, level(0, 0.0));
    }

    #[test]
    fn by_glass_opens_a_bottle_when_none_is_open() {
        let next = apply_sale(level(2, 0.0), DeductionPolicy::ByGlass, 1).unwrap();
        assert_eq!(next, level(1, 100.0));
    }

    #[test]
    fn by_glass_leaves_an_open_bottle_alone() {
        // glasses poured from an already-open bottle are counted at close
        let next = apply_sale(level(0, 40.0), DeductionPolicy::ByGlass, 1).unwrap();
        assert_eq!(next, level(0, 40.0));
    }

    #[test]
    fn by_glass_fails_with_nothing_to_open() {
        assert!(matches!(
            apply_sale(level(0, 0.0), DeductionPolicy::ByGlass, 1),
            Err(CustomError::InsufficientStock)
        ));
    }

    #[test]
    fn policy_dispatch_matches_sale_types() {
        assert_eq!(SaleType::Vaso.policy(), DeductionPolicy::ByGlass);
        assert_eq!(SaleType::Entrada.policy(), DeductionPolicy::ByGlass);
        assert_eq!(SaleType::Normal.policy(), DeductionPolicy::WholeBottle);
        assert_eq!(SaleType::Botella.policy(), DeductionPolicy::WholeBottle);
        assert_eq!(SaleType::Promo.policy(), DeductionPolicy::WholeBottle);
        assert_eq!(SaleType::Combo.policy(), DeductionPolicy::WholeBottle);
    }

    #[test]
    fn rescale_preserves_absolute_volume() {
        // 40% of 750ml = 300ml, which is 30% of a 1L bottle
        assert_eq!(rescale_fraction(40.0, 750, 1000), 30.0);
    }

    #[test]
    fn rescale_round_trips_within_a_cent_of_a_percent() {
        let rescaled = rescale_fraction(40.0, 750, 1000);
        let back = rescale_fraction(rescaled, 1000, 750);
        assert!((back - 40.0).abs() < 0.01);

        let odd = rescale_fraction(33.3333, 700, 930);
        let odd_back = rescale_fraction(odd, 930, 700);
        assert!((odd_back - 33.3333).abs() < 0.01);
    }

    #[test]
    fn rescale_caps_at_full_bottle() {
        // shrinking the nominal volume below the remaining liquid caps at 100
        assert_eq!(rescale_fraction(50.0, 1000, 300), 100.0);
    }

    #[test]
    fn rescale_is_identity_for_unchanged_volume() {
        assert_eq!(rescale_fraction(73.2, 750, 750), 73.2);
    }

    #[test]
    fn round4_truncates_fraction_noise() {
        assert_eq!(round4(33.333_349), 33.3333);
        assert_eq!(round4(-0.000_01), -0.0);
    }
}
