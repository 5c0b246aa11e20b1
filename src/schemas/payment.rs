use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::db::types::PaymentPurpose;
use crate::services::checkout::{OrderHandle, VerifiedOrder};

#[derive(Debug, Serialize)]
pub(crate) struct OrderLineResponse {
    pub(crate) test_id: String,
    pub(crate) price: Decimal,
    pub(crate) price_paid: Decimal,
}

#[derive(Debug, Serialize)]
pub(crate) struct OrderResponse {
    pub(crate) order_id: String,
    pub(crate) amount: Decimal,
    /// Amount in the currency's minor unit, as the gateway widget expects it.
    pub(crate) amount_minor: i64,
    pub(crate) currency: String,
    pub(crate) gateway_key: String,
    pub(crate) purpose: PaymentPurpose,
    pub(crate) subtotal: Decimal,
    pub(crate) discount: Decimal,
    pub(crate) savings: Decimal,
    pub(crate) bundle_info: String,
    pub(crate) items: Vec<OrderLineResponse>,
}

impl OrderResponse {
    pub(crate) fn from_handle(handle: OrderHandle) -> Self {
        Self {
            order_id: handle.order_id,
            amount: handle.amount,
            amount_minor: handle.amount_minor,
            currency: handle.currency,
            gateway_key: handle.gateway_key,
            purpose: handle.purpose,
            subtotal: handle.quote.subtotal,
            discount: handle.quote.discount,
            savings: handle.quote.savings,
            bundle_info: handle.quote.bundle_info,
            items: handle
                .quote
                .lines
                .into_iter()
                .map(|line| OrderLineResponse {
                    test_id: line.test_id,
                    price: line.price,
                    price_paid: line.price_paid,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct VerifyPaymentRequest {
    #[serde(alias = "razorpay_order_id", alias = "orderId")]
    pub(crate) order_id: String,
    #[serde(alias = "razorpay_payment_id", alias = "paymentId")]
    pub(crate) payment_id: String,
    #[serde(alias = "razorpay_signature")]
    pub(crate) signature: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct VerifyPaymentResponse {
    pub(crate) message: String,
    pub(crate) order_id: String,
    pub(crate) payment_id: String,
    pub(crate) purpose: PaymentPurpose,
    pub(crate) test_ids: Vec<String>,
    pub(crate) already_verified: bool,
    /// Paid for tests that were already owned; the order is held for a refund.
    pub(crate) refund_due: Decimal,
}

impl VerifyPaymentResponse {
    pub(crate) fn from_verified(verified: VerifiedOrder) -> Self {
        let message = if verified.replayed {
            "Payment already verified"
        } else if verified.refund_due > Decimal::ZERO {
            "Payment verified; tests you already owned have been flagged for refund"
        } else {
            "Payment verified successfully"
        };
        Self {
            message: message.to_string(),
            order_id: verified.order_id,
            payment_id: verified.payment_id,
            purpose: verified.purpose,
            test_ids: verified.test_ids,
            already_verified: verified.replayed,
            refund_due: verified.refund_due,
        }
    }
}
