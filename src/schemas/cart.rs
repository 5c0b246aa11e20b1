use rust_decimal::Decimal;
use serde::Serialize;

use crate::core::time::format_primitive;
use crate::services::cart::CartSnapshot;

#[derive(Debug, Serialize)]
pub(crate) struct CartItemResponse {
    pub(crate) test_id: String,
    pub(crate) title: String,
    pub(crate) price: Decimal,
    pub(crate) duration_minutes: i32,
    pub(crate) added_at: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct CartResponse {
    pub(crate) items: Vec<CartItemResponse>,
    pub(crate) item_count: usize,
    pub(crate) subtotal: Decimal,
    pub(crate) discount: Decimal,
    pub(crate) total: Decimal,
    pub(crate) savings: Decimal,
    pub(crate) discount_percent: Decimal,
    pub(crate) bundle_info: String,
}

impl CartResponse {
    pub(crate) fn from_snapshot(snapshot: CartSnapshot) -> Self {
        let quote = snapshot.quote;
        Self {
            item_count: snapshot.lines.len(),
            items: snapshot
                .lines
                .into_iter()
                .map(|line| CartItemResponse {
                    test_id: line.test_id,
                    title: line.title,
                    price: line.price,
                    duration_minutes: line.duration_minutes,
                    added_at: format_primitive(line.added_at),
                })
                .collect(),
            subtotal: quote.subtotal,
            discount: quote.discount,
            total: quote.total,
            savings: quote.savings,
            discount_percent: quote
                .applied_tier
                .map(|tier| tier.percent_off.normalize())
                .unwrap_or(Decimal::ZERO),
            bundle_info: quote.bundle_info,
        }
    }
}
