use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

const MONEY_SCALE: u32 = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum PricingError {
    #[error("price for test {0} must be non-negative")]
    NegativePrice(String),
    #[error("invalid bundle tier table: {0}")]
    InvalidTier(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct BundleTier {
    pub(crate) min_items: usize,
    pub(crate) percent_off: Decimal,
}

/// Bundle tiers sorted by threshold. Thresholds strictly increase and the
/// discount never shrinks as the threshold grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct TierTable(Vec<BundleTier>);

impl TierTable {
    pub(crate) fn new(tiers: Vec<BundleTier>) -> Result<Self, PricingError> {
        let mut previous: Option<&BundleTier> = None;
        for tier in &tiers {
            if tier.min_items < 2 {
                return Err(PricingError::InvalidTier(format!(
                    "threshold {} must be at least 2 items",
                    tier.min_items
                )));
            }
            if tier.percent_off <= Decimal::ZERO || tier.percent_off >= Decimal::ONE_HUNDRED {
                return Err(PricingError::InvalidTier(format!(
                    "discount {}% must be between 0 and 100",
                    tier.percent_off
                )));
            }
            if let Some(prev) = previous {
                if tier.min_items <= prev.min_items {
                    return Err(PricingError::InvalidTier(
                        "thresholds must be strictly increasing".to_string(),
                    ));
                }
                if tier.percent_off < prev.percent_off {
                    return Err(PricingError::InvalidTier(
                        "discounts must not decrease for larger bundles".to_string(),
                    ));
                }
            }
            previous = Some(tier);
        }
        Ok(Self(tiers))
    }

    pub(crate) fn tiers(&self) -> &[BundleTier] {
        &self.0
    }

    /// Highest tier whose threshold `count` reaches.
    pub(crate) fn tier_for(&self, count: usize) -> Option<&BundleTier> {
        self.0.iter().rev().find(|tier| count >= tier.min_items)
    }

    fn next_after(&self, count: usize) -> Option<&BundleTier> {
        self.0.iter().find(|tier| count < tier.min_items)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct LineItem {
    pub(crate) test_id: String,
    pub(crate) price: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PricedLine {
    pub(crate) test_id: String,
    pub(crate) price: Decimal,
    pub(crate) price_paid: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PriceQuote {
    pub(crate) subtotal: Decimal,
    pub(crate) discount: Decimal,
    pub(crate) total: Decimal,
    pub(crate) savings: Decimal,
    pub(crate) applied_tier: Option<BundleTier>,
    pub(crate) bundle_info: String,
    pub(crate) lines: Vec<PricedLine>,
}

pub(crate) fn price(items: &[LineItem], tiers: &TierTable) -> Result<PriceQuote, PricingError> {
    if let Some(item) = items.iter().find(|item| item.price.is_sign_negative()) {
        return Err(PricingError::NegativePrice(item.test_id.clone()));
    }

    let subtotal = round_money(items.iter().map(|item| item.price).sum());
    let applied_tier = tiers.tier_for(items.len()).copied();
    let discount = match applied_tier {
        Some(tier) => round_money(subtotal * tier.percent_off / Decimal::ONE_HUNDRED),
        None => Decimal::ZERO,
    };
    let total = subtotal - discount;

    Ok(PriceQuote {
        subtotal,
        discount,
        total,
        savings: discount,
        applied_tier,
        bundle_info: bundle_info(items.len(), tiers),
        lines: allocate(items, subtotal, total),
    })
}

fn bundle_info(count: usize, tiers: &TierTable) -> String {
    let current = tiers.tier_for(count);
    let next = tiers.next_after(count);

    match (current, next) {
        (None, None) => "Bundle discounts are not available".to_string(),
        (None, Some(next)) => format!(
            "Add {} more {} to unlock a {}% bundle discount",
            next.min_items - count,
            plural_tests(next.min_items - count),
            next.percent_off.normalize()
        ),
        (Some(tier), Some(next)) => format!(
            "{}% bundle discount applied. Add {} more {} for {}% off",
            tier.percent_off.normalize(),
            next.min_items - count,
            plural_tests(next.min_items - count),
            next.percent_off.normalize()
        ),
        (Some(tier), None) => {
            format!("{}% bundle discount applied", tier.percent_off.normalize())
        }
    }
}

fn plural_tests(count: usize) -> &'static str {
    if count == 1 {
        "test"
    } else {
        "tests"
    }
}

/// Scales every line by total/subtotal. Rounding leftovers then move one paisa at a
/// time, most expensive line first, keeping each line within `0..=price` so the lines
/// sum exactly to `total`.
fn allocate(items: &[LineItem], subtotal: Decimal, total: Decimal) -> Vec<PricedLine> {
    let mut lines: Vec<PricedLine> = items
        .iter()
        .map(|item| PricedLine {
            test_id: item.test_id.clone(),
            price: item.price,
            price_paid: if subtotal.is_zero() {
                item.price
            } else {
                round_money(item.price * total / subtotal)
            },
        })
        .collect();

    let mut by_price: Vec<usize> = (0..lines.len()).collect();
    by_price.sort_by(|left, right| items[*right].price.cmp(&items[*left].price));

    let paisa = Decimal::new(1, MONEY_SCALE);
    let mut remainder = total - lines.iter().map(|line| line.price_paid).sum::<Decimal>();
    while !remainder.is_zero() {
        let mut moved = false;
        for &index in &by_price {
            let line = &mut lines[index];
            if remainder > Decimal::ZERO && line.price_paid + paisa <= line.price {
                line.price_paid += paisa;
                remainder -= paisa;
                moved = true;
            } else if remainder < Decimal::ZERO && line.price_paid >= paisa {
                line.price_paid -= paisa;
                remainder += paisa;
                moved = true;
            }
            if remainder.is_zero() {
                break;
            }
        }
        if !moved {
            break;
        }
    }

    lines
}

pub(crate) fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}
