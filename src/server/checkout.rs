//! Checkout transaction processor: prices the submitted lines, depletes the
//! bottles they draw from through the ledger, and persists the ticket with
//! its lines, all inside one transaction. All-or-nothing.

use log::debug;
use tokio_postgres::types::ToSql;
use tokio_postgres::Transaction;
use uuid::Uuid;

use crate::server::controller::error::CustomError;
use crate::server::ledger;
use crate::server::model::bottle::SaleType;
use crate::server::model::ticket::{
    CheckoutRequest, CheckoutResponse, LineRequest, LineTag, ReceiptLine,
};
use crate::server::util::time::helper::get_utc_now;

const DEFAULT_CREATED_BY: &str = "barman";
const DEFAULT_COMBO_NAME: &str = "Combo";

/// A ticket line staged for insertion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct StagedLine {
    pub menu_item_id: Option<Uuid>,
    pub bottle_id: Option<Uuid>,
    pub name: String,
    pub quantity: i32,
    pub subtotal: f64,
    pub tag: String,
}

/// An inventory deduction owed by a line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct StagedDeduction {
    pub bottle_id: Uuid,
    pub sale_type: SaleType,
    pub quantity: i32,
}

/// The menu item fields the processor works with.
#[derive(Debug, Clone)]
pub(crate) struct MenuItemRecord {
    pub id: Uuid,
    pub name: String,
    pub sale_type: SaleType,
    pub price: f64,
    pub bottle_id: Uuid,
    pub complement_id: Option<Uuid>,
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Reject tickets the processor must not touch the database for.
pub(crate) fn validate(req: &CheckoutRequest) -> Result<(), CustomError> {
    if req.lines.is_empty() {
        return Err(CustomError::EmptyTicket);
    }
    if req.lines.iter().any(|line| line.quantity() < 1) {
        return Err(CustomError::InvalidQuantity);
    }
    Ok(())
}

/// Deductions owed by one menu-item line: the primary bottle under the item's
/// own sale type, plus the complement as a whole bottle for catalog combos.
pub(crate) fn menu_line_deductions(item: &MenuItemRecord, quantity: i32) -> Vec<StagedDeduction> {
    let mut deductions = vec![StagedDeduction {
        bottle_id: item.bottle_id,
        sale_type: item.sale_type,
        quantity,
    }];
    if item.sale_type == SaleType::Combo {
        if let Some(complement_id) = item.complement_id {
            deductions.push(StagedDeduction {
                bottle_id: complement_id,
                sale_type: SaleType::Botella,
                quantity,
            });
        }
    }
    deductions
}

/// Ticket lines produced by one menu-item line. A catalog combo decomposes
/// into two PROMO lines, revenue attributed once: {price x qty, 0}.
pub(crate) fn stage_menu_lines(
    item: &MenuItemRecord,
    complement_name: Option<&str>,
    quantity: i32,
) -> Vec<StagedLine> {
    let subtotal = round2(item.price * f64::from(quantity));
    match (item.sale_type, item.complement_id) {
        (SaleType::Combo, Some(complement_id)) => vec![
            StagedLine {
                menu_item_id: Some(item.id),
                bottle_id: Some(item.bottle_id),
                name: item.name.clone(),
                quantity,
                subtotal,
                tag: LineTag::Promo.as_str().to_string(),
            },
            StagedLine {
                menu_item_id: Some(item.id),
                bottle_id: Some(complement_id),
                name: complement_name.unwrap_or(DEFAULT_COMBO_NAME).to_string(),
                quantity,
                subtotal: 0.0,
                tag: LineTag::Promo.as_str().to_string(),
            },
        ],
        _ => vec![StagedLine {
            menu_item_id: Some(item.id),
            bottle_id: Some(item.bottle_id),
            name: item.name.clone(),
            quantity,
            subtotal,
            tag: item.sale_type.line_tag().as_str().to_string(),
        }],
    }
}

/// Ad-hoc combos mirror catalog-combo accounting exactly, so reconciliation
/// cannot tell the two apart: both bottles whole, two PROMO lines {P, 0}.
pub(crate) fn stage_custom_combo(
    name: &str,
    liquor: &MenuItemRecord,
    mixer: &MenuItemRecord,
    price: f64,
    quantity: i32,
) -> (Vec<StagedLine>, Vec<StagedDeduction>) {
    let subtotal = round2(price * f64::from(quantity));
    let lines = vec![
        StagedLine {
            menu_item_id: Some(liquor.id),
            bottle_id: Some(liquor.bottle_id),
            name: name.to_string(),
            quantity,
            subtotal,
            tag: LineTag::Promo.as_str().to_string(),
        },
        StagedLine {
            menu_item_id: Some(mixer.id),
            bottle_id: Some(mixer.bottle_id),
            name: mixer.name.clone(),
            quantity,
            subtotal: 0.0,
            tag: LineTag::Promo.as_str().to_string(),
        },
    ];
    let deductions = vec![
        StagedDeduction {
            bottle_id: liquor.bottle_id,
            sale_type: SaleType::Botella,
            quantity,
        },
        StagedDeduction {
            bottle_id: mixer.bottle_id,
            sale_type: SaleType::Botella,
            quantity,
        },
    ];
    (lines, deductions)
}

/// Extras never touch inventory; the caller-supplied label becomes the tag.
pub(crate) fn stage_extra(name: &str, label: &str, price: f64, quantity: i32) -> StagedLine {
    StagedLine {
        menu_item_id: None,
        bottle_id: None,
        name: name.to_string(),
        quantity,
        subtotal: round2(price * f64::from(quantity)),
        tag: label.to_string(),
    }
}

/// Run a submitted ticket to a committed-ready state inside `txn`. Any error
/// must make the caller drop the transaction; nothing is visible until the
/// caller commits.
pub(crate) async fn process(
    txn: &Transaction<'_>,
    req: &CheckoutRequest,
) -> Result<CheckoutResponse, CustomError> {
    validate(req)?;

    let mut staged: Vec<StagedLine> = Vec::new();
    let mut receipt: Vec<ReceiptLine> = Vec::with_capacity(req.lines.len());

    for line in &req.lines {
        match line {
            LineRequest::Menu {
                menu_item_id,
                quantity,
            } => {
                let item = fetch_menu_item(txn, *menu_item_id).await?;
                let mut complement_name = None;
                for deduction in menu_line_deductions(&item, *quantity) {
                    let outcome = ledger::deduct(
                        txn,
                        deduction.bottle_id,
                        deduction.sale_type,
                        deduction.quantity,
                    )
                    .await?;
                    debug!(
                        "{} now holds {} sealed, {}% open",
                        outcome.bottle_name, outcome.level.sealed_count, outcome.level.open_fraction
                    );
                    if Some(deduction.bottle_id) == item.complement_id {
                        complement_name = Some(outcome.bottle_name);
                    }
                }
                let lines = stage_menu_lines(&item, complement_name.as_deref(), *quantity);
                receipt.push(ReceiptLine {
                    name: item.name.clone(),
                    quantity: *quantity,
                    subtotal: lines[0].subtotal,
                });
                staged.extend(lines);
            }
            LineRequest::CustomCombo {
                name,
                liquor_item_id,
                mixer_item_id,
                price,
                quantity,
            } => {
                let liquor = fetch_menu_item(txn, *liquor_item_id).await?;
                let mixer = fetch_menu_item(txn, *mixer_item_id).await?;
                let display = name.as_deref().unwrap_or(DEFAULT_COMBO_NAME);
                let (lines, deductions) =
                    stage_custom_combo(display, &liquor, &mixer, *price, *quantity);
                for deduction in &deductions {
                    let outcome = ledger::deduct(
                        txn,
                        deduction.bottle_id,
                        deduction.sale_type,
                        deduction.quantity,
                    )
                    .await?;
                    debug!(
                        "{} now holds {} sealed, {}% open",
                        outcome.bottle_name, outcome.level.sealed_count, outcome.level.open_fraction
                    );
                }
                receipt.push(ReceiptLine {
                    name: display.to_string(),
                    quantity: *quantity,
                    subtotal: lines[0].subtotal,
                });
                staged.extend(lines);
            }
            LineRequest::Extra {
                name,
                price,
                quantity,
                label,
            } => {
                let line = stage_extra(name, label, *price, *quantity);
                receipt.push(ReceiptLine {
                    name: line.name.clone(),
                    quantity: line.quantity,
                    subtotal: line.subtotal,
                });
                staged.push(line);
            }
        }
    }

    let total = round2(staged.iter().map(|line| line.subtotal).sum());
    let ticket_id = Uuid::new_v4();
    let created_by = req.created_by.as_deref().unwrap_or(DEFAULT_CREATED_BY);
    let cash_received = req.cash_received.unwrap_or(total);
    txn.execute(
        r#"
            INSERT INTO ticket (id, total, payment_method, cash_received, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
        "#,
        &[
            &ticket_id,
            &total,
            &req.payment_method,
            &cash_received,
            &created_by,
            &get_utc_now(),
        ],
    )
    .await
    .map_err(CustomError::from_db)?;

    insert_lines(txn, ticket_id, &staged).await?;

    Ok(CheckoutResponse {
        ticket_id,
        total,
        receipt,
    })
}

async fn fetch_menu_item(txn: &Transaction<'_>, id: Uuid) -> Result<MenuItemRecord, CustomError> {
    let row = txn
        .query_opt(
            "SELECT id, name, sale_type, price, bottle_id, complement_id FROM menu_item WHERE id = $1",
            &[&id],
        )
        .await
        .map_err(CustomError::from_db)?
        .ok_or(CustomError::NotFound)?;

    let sale_type: String = row.get("sale_type");
    Ok(MenuItemRecord {
        id: row.get("id"),
        name: row.get("name"),
        sale_type: sale_type.parse().map_err(|_| CustomError::DbError)?,
        price: row.get("price"),
        bottle_id: row.get("bottle_id"),
        complement_id: row.get("complement_id"),
    })
}

async fn insert_lines(
    txn: &Transaction<'_>,
    ticket_id: Uuid,
    staged: &[StagedLine],
) -> Result<(), CustomError> {
    const COLUMN_LEN: usize = 9;
    let line_ids = staged.iter().map(|_| Uuid::new_v4()).collect::<Vec<_>>();
    let line_nos = (0..staged.len() as i32).collect::<Vec<_>>();

    let mut stmt =
        "INSERT INTO ticket_line (id, ticket_id, line_no, menu_item_id, bottle_id, name, quantity, subtotal, tag) VALUES"
            .to_string();
    let mut params: Vec<&(dyn ToSql + Sync)> = Vec::with_capacity(staged.len() * COLUMN_LEN);
    let mut idx = 1;
    for (i, line) in staged.iter().enumerate() {
        let maybe_comma = if i != staged.len() - 1 { "," } else { "" };
        stmt.extend(
            format!(
                " (${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}, ${}){}",
                idx,
                idx + 1,
                idx + 2,
                idx + 3,
                idx + 4,
                idx + 5,
                idx + 6,
                idx + 7,
                idx + 8,
                maybe_comma
            )
            .chars(),
        );
        params.extend([
            &line_ids[i] as &(dyn ToSql + Sync),
            &ticket_id,
            &line_nos[i],
            &line.menu_item_id,
            &line.bottle_id,
            &line.name,
            &line.quantity,
            &line.subtotal,
            &line.tag,
        ]);
        idx += COLUMN_LEN;
    }
    txn.execute(stmt.as_str(), params.as_slice())
        .await
        .map_err(CustomError::from_db)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn menu_item(sale_type: SaleType, price: f64, complement_id: Option<Uuid>) -> MenuItemRecord {
        MenuItemRecord {
            id: Uuid::new_v4(),
            name: "Vodka Rebel".to_string(),
            sale_type,
            price,
            bottle_id: Uuid::new_v4(),
            complement_id,
        }
    }

    fn request(lines: Vec<LineRequest>) -> CheckoutRequest {
        CheckoutRequest {
            lines,
            payment_method: "EFECTIVO".to_string(),
            cash_received: None,
            created_by: None,
        }
    }

    #[test]
    fn empty_ticket_is_rejected() {
        assert!(matches!(
            validate(&request(vec![])),
            Err(CustomError::EmptyTicket)
        ));
    }

    #[test]
    fn non_positive_quantities_are_rejected() {
        for quantity in [0, -3] {
            let req = request(vec![LineRequest::Menu {
                menu_item_id: Uuid::new_v4(),
                quantity,
            }]);
            assert!(matches!(
                validate(&req),
                Err(CustomError::InvalidQuantity)
            ));
        }
    }

    #[test]
    fn plain_lines_keep_their_own_tag() {
        let item = menu_item(SaleType::Vaso, 3.0, None);
        let lines = stage_menu_lines(&item, None, 2);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].subtotal, 6.0);
        assert_eq!(lines[0].tag, "VASO");
        assert_eq!(lines[0].bottle_id, Some(item.bottle_id));

        let deductions = menu_line_deductions(&item, 2);
        assert_eq!(
            deductions,
            vec![StagedDeduction {
                bottle_id: item.bottle_id,
                sale_type: SaleType::Vaso,
                quantity: 2,
            }]
        );
    }

    #[test]
    fn botella_lines_report_as_normal() {
        let item = menu_item(SaleType::Botella, 140.0, None);
        let lines = stage_menu_lines(&item, None, 1);
        assert_eq!(lines[0].tag, "NORMAL");
    }

    #[test]
    fn catalog_combo_decomposes_into_two_promo_lines() {
        let complement_id = Uuid::new_v4();
        let item = menu_item(SaleType::Combo, 50.0, Some(complement_id));

        let deductions = menu_line_deductions(&item, 2);
        assert_eq!(deductions.len(), 2);
        assert_eq!(deductions[0].bottle_id, item.bottle_id);
        assert_eq!(deductions[0].sale_type, SaleType::Combo);
        assert_eq!(deductions[0].quantity, 2);
        assert_eq!(deductions[1].bottle_id, complement_id);
        assert_eq!(deductions[1].sale_type, SaleType::Botella);
        assert_eq!(deductions[1].quantity, 2);

        let lines = stage_menu_lines(&item, Some("Refresco 3L"), 2);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].subtotal, 100.0);
        assert_eq!(lines[0].tag, "PROMO");
        assert_eq!(lines[1].subtotal, 0.0);
        assert_eq!(lines[1].tag, "PROMO");
        assert_eq!(lines[1].bottle_id, Some(complement_id));
        assert_eq!(lines[1].name, "Refresco 3L");
    }

    #[test]
    fn combo_without_complement_degrades_to_single_promo_line() {
        let item = menu_item(SaleType::Combo, 180.0, None);
        let lines = stage_menu_lines(&item, None, 1);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].subtotal, 180.0);
        assert_eq!(lines[0].tag, "PROMO");
        assert_eq!(menu_line_deductions(&item, 1).len(), 1);
    }

    #[test]
    fn custom_combo_mirrors_catalog_accounting() {
        let liquor = menu_item(SaleType::Vaso, 4.0, None);
        let mixer = menu_item(SaleType::Botella, 15.0, None);
        let (lines, deductions) = stage_custom_combo("Ron + Cola", &liquor, &mixer, 60.0, 2);

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].name, "Ron + Cola");
        assert_eq!(lines[0].subtotal, 120.0);
        assert_eq!(lines[1].subtotal, 0.0);
        assert!(lines.iter().all(|line| line.tag == "PROMO"));

        // both bottles go down by whole units regardless of their sale types
        assert_eq!(deductions.len(), 2);
        assert!(deductions
            .iter()
            .all(|d| d.sale_type == SaleType::Botella && d.quantity == 2));
        assert_eq!(deductions[0].bottle_id, liquor.bottle_id);
        assert_eq!(deductions[1].bottle_id, mixer.bottle_id);
    }

    #[test]
    fn extra_lines_carry_their_label_and_no_bottle() {
        let line = stage_extra("Hielo", "EXTRA", 5.0, 3);
        assert_eq!(line.menu_item_id, None);
        assert_eq!(line.bottle_id, None);
        assert_eq!(line.subtotal, 15.0);
        assert_eq!(line.tag, "EXTRA");
    }

    #[test]
    fn subtotals_round_to_cents() {
        assert_eq!(round2(10.0 / 3.0), 3.33);
        let line = stage_extra("Propina", "EXTRA", 0.1, 3);
        assert_eq!(line.subtotal, 0.3);
    }
}
