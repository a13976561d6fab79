//! Bulk price commands.
//!
//! The request goes through the same form validation the console uses, so
//! the ranges match: discounts 0 to 100, adjustments above -100.

use atelier_console::api::{ApiSession, CatalogApi};
use atelier_console::bulk::{BulkPriceForm, ChangeMode, ScopeKind, SelectedProduct};
use atelier_core::{CategoryId, ProductId};

use super::CliError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Discount,
    Adjust,
}

/// Which products to change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    All,
    Category(String),
    Products(Vec<String>),
}

/// Fill a bulk form the way an operator would in the console.
#[must_use]
pub fn build_form(mode: Mode, percent: &str, target: Target) -> BulkPriceForm {
    let mut form = BulkPriceForm::default();
    match target {
        Target::All => form.choose_scope(ScopeKind::All),
        Target::Category(id) => {
            form.choose_scope(ScopeKind::Category);
            form.choose_category(Some(CategoryId::new(id)));
        }
        Target::Products(ids) => {
            form.choose_scope(ScopeKind::Search);
            for id in ids {
                let id = ProductId::new(id);
                if !form.is_selected(&id) {
                    form.toggle(SelectedProduct {
                        name: id.to_string(),
                        id,
                    });
                }
            }
        }
    }
    form.choose_mode(match mode {
        Mode::Discount => ChangeMode::Discount,
        Mode::Adjust => ChangeMode::Adjustment,
    });
    form.set_percentage(percent);
    form
}

/// Validate and apply a bulk price change.
///
/// # Errors
///
/// Returns an error if the request is invalid or the API rejects it.
pub async fn apply(
    api: &ApiSession,
    mode: Mode,
    percent: &str,
    target: Target,
) -> Result<(), CliError> {
    let request = build_form(mode, percent, target).build_request()?;
    tracing::info!(?request, "Applying bulk price change");
    let ack = api.bulk_update(&request).await?;
    tracing::info!("{}", ack.message_or("Prices updated"));
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use atelier_console::api::{PriceChange, ProductScope};
    use atelier_console::bulk::BulkFormError;

    use super::*;

    #[test]
    fn test_discount_for_category() {
        let request = build_form(Mode::Discount, "15", Target::Category("c1".into()))
            .build_request()
            .unwrap();
        assert_eq!(
            request.scope,
            ProductScope::ByCategory {
                category_id: CategoryId::new("c1")
            }
        );
        assert!(matches!(request.change, PriceChange::Discount(_)));
    }

    #[test]
    fn test_adjust_products_allows_negative() {
        let request = build_form(
            Mode::Adjust,
            "-12.5",
            Target::Products(vec!["p1".into(), "p2".into()]),
        )
        .build_request()
        .unwrap();
        assert_eq!(
            request.scope,
            ProductScope::BySearch {
                product_ids: vec![ProductId::new("p1"), ProductId::new("p2")]
            }
        );
        assert_eq!(request.path(), "updatePrice");
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = build_form(Mode::Discount, "120", Target::All)
            .build_request()
            .unwrap_err();
        assert_eq!(err, BulkFormError::DiscountOutOfRange);

        let err = build_form(Mode::Adjust, "-100", Target::All)
            .build_request()
            .unwrap_err();
        assert_eq!(err, BulkFormError::AdjustmentOutOfRange);
    }

    #[test]
    fn test_duplicate_products_collapse() {
        let form = build_form(
            Mode::Adjust,
            "5",
            Target::Products(vec!["p1".into(), "p1".into()]),
        );
        assert_eq!(form.selected().len(), 1);
    }
}
