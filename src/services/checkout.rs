use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use thiserror::Error;
use time::Duration;
use uuid::Uuid;

use crate::core::{state::AppState, time::primitive_now_utc};
use crate::db::models::{OrderLine, PaymentOrder};
use crate::db::types::{PaymentPurpose, PaymentStatus};
use crate::repositories;
use crate::services::cart::{self, CartError};
use crate::services::payment_gateway::{verify_payment_signature, CreateOrderRequest, GatewayError};
use crate::services::pricing::{self, LineItem, PriceQuote, PricingError};

const MAX_PENDING_ORDER_MINUTES: u64 = 24 * 60;

#[derive(Debug, Error)]
pub(crate) enum CheckoutError {
    #[error("Test not found")]
    TestNotFound,
    #[error("Test already purchased")]
    AlreadyPurchased,
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Order total must be greater than zero")]
    ZeroTotal,
    #[error("Order amount {0} cannot be charged")]
    InvalidAmount(Decimal),
    #[error("Order not found")]
    OrderNotFound,
    #[error("Payment verification failed")]
    InvalidSignature,
    #[error("Order was already paid with a different payment")]
    PaymentMismatch,
    #[error("A payment for one of these tests is already in progress")]
    PaymentPending,
    #[error("Tests in this order were already purchased; the payment has been flagged for refund")]
    DuplicatePayment,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<CartError> for CheckoutError {
    fn from(err: CartError) -> Self {
        match err {
            CartError::Pricing(err) => CheckoutError::Pricing(err),
            CartError::Database(err) => CheckoutError::Database(err),
            CartError::TestNotFound | CartError::ItemNotFound => CheckoutError::TestNotFound,
            CartError::DuplicateItem | CartError::AlreadyPurchased => CheckoutError::AlreadyPurchased,
        }
    }
}

/// What the browser needs to open the gateway checkout widget.
#[derive(Debug, Clone)]
pub(crate) struct OrderHandle {
    pub(crate) order_id: String,
    pub(crate) amount: Decimal,
    pub(crate) amount_minor: i64,
    pub(crate) currency: String,
    pub(crate) gateway_key: String,
    pub(crate) purpose: PaymentPurpose,
    pub(crate) quote: PriceQuote,
}

#[derive(Debug, Clone)]
pub(crate) struct VerifiedOrder {
    pub(crate) order_id: String,
    pub(crate) payment_id: String,
    pub(crate) purpose: PaymentPurpose,
    pub(crate) test_ids: Vec<String>,
    pub(crate) newly_granted: usize,
    /// Amount paid for lines the student already owned.
    pub(crate) refund_due: Decimal,
    pub(crate) replayed: bool,
}

pub(crate) async fn purchase_single(
    state: &AppState,
    student_id: &str,
    test_id: &str,
) -> Result<OrderHandle, CheckoutError> {
    let test = repositories::tests::find_active(state.db(), test_id)
        .await?
        .ok_or(CheckoutError::TestNotFound)?;

    if repositories::purchases::exists(state.db(), student_id, test_id).await? {
        return Err(CheckoutError::AlreadyPurchased);
    }

    let items = vec![LineItem { test_id: test.id, price: test.price }];
    create_order(state, student_id, PaymentPurpose::Single, &items).await
}

/// Prices the cart and opens a gateway order for its total. The cart itself is
/// only emptied once the payment is verified.
pub(crate) async fn checkout_cart(
    state: &AppState,
    student_id: &str,
) -> Result<OrderHandle, CheckoutError> {
    let snapshot = cart::snapshot(state, student_id).await?;
    if snapshot.lines.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }

    let items: Vec<LineItem> = snapshot
        .lines
        .iter()
        .map(|line| LineItem { test_id: line.test_id.clone(), price: line.price })
        .collect();
    create_order(state, student_id, PaymentPurpose::Cart, &items).await
}

/// An unpaid order for exactly the same tests and amount is handed back again; any
/// other unpaid order touching one of these tests blocks a new one until it ages out.
async fn create_order(
    state: &AppState,
    student_id: &str,
    purpose: PaymentPurpose,
    items: &[LineItem],
) -> Result<OrderHandle, CheckoutError> {
    let quote = pricing::price(items, &state.settings().pricing().bundle_tiers)?;
    if quote.total <= Decimal::ZERO {
        return Err(CheckoutError::ZeroTotal);
    }
    let amount_minor = to_minor_units(quote.total)?;
    let currency = state.settings().payment().currency.clone();

    let test_ids: Vec<String> = quote.lines.iter().map(|line| line.test_id.clone()).collect();
    let window = state.settings().payment().pending_order_minutes.min(MAX_PENDING_ORDER_MINUTES);
    let since = primitive_now_utc() - Duration::minutes(window as i64);
    let pending =
        repositories::payment_orders::list_pending_covering(state.db(), student_id, &test_ids, since)
            .await?;
    if let Some(order) = pending
        .iter()
        .find(|order| same_order(order, purpose, &test_ids, quote.total, &currency))
    {
        tracing::info!(order_id = %order.id, student_id, "Reusing pending payment order");
        return Ok(OrderHandle {
            order_id: order.id.clone(),
            amount: quote.total,
            amount_minor,
            currency,
            gateway_key: state.gateway().key_id().to_string(),
            purpose,
            quote,
        });
    }
    if let Some(order) = pending.first() {
        tracing::info!(order_id = %order.id, student_id, "Pending payment order blocks a new one");
        return Err(CheckoutError::PaymentPending);
    }

    let gateway_order = state
        .gateway()
        .create_order(CreateOrderRequest {
            amount: amount_minor,
            currency: currency.clone(),
            receipt: format!("rcpt_{}", Uuid::new_v4().simple()),
            notes: serde_json::json!({
                "student_id": student_id,
                "purpose": purpose,
                "items": quote.lines.len(),
            }),
        })
        .await?;

    let lines: Vec<OrderLine> = quote
        .lines
        .iter()
        .map(|line| OrderLine {
            test_id: line.test_id.clone(),
            price: line.price,
            price_paid: line.price_paid,
        })
        .collect();

    repositories::payment_orders::create(
        state.db(),
        repositories::payment_orders::CreateOrder {
            id: &gateway_order.id,
            student_id,
            purpose,
            items: lines,
            subtotal: quote.subtotal,
            discount: quote.discount,
            amount: quote.total,
            currency: &currency,
            created_at: primitive_now_utc(),
        },
    )
    .await?;

    tracing::info!(
        order_id = %gateway_order.id,
        student_id,
        purpose = ?purpose,
        amount = %quote.total,
        "Payment order created"
    );

    Ok(OrderHandle {
        order_id: gateway_order.id,
        amount: quote.total,
        amount_minor,
        currency,
        gateway_key: state.gateway().key_id().to_string(),
        purpose,
        quote,
    })
}

/// Checks the gateway signature and, in the same transaction, marks the order
/// verified, grants every line and removes paid lines from the cart. Lines the
/// student already owned are not granted twice; their share is recorded for refund.
/// Repeating a verified (order, payment) pair returns the stored outcome without
/// granting again.
pub(crate) async fn verify_payment(
    state: &AppState,
    student_id: &str,
    order_id: &str,
    payment_id: &str,
    signature: &str,
) -> Result<VerifiedOrder, CheckoutError> {
    let secret = state.settings().payment().signing_secret(state.settings().security());
    let mut tx = state.db().begin().await?;

    let order = repositories::payment_orders::lock_for_update(&mut *tx, order_id)
        .await?
        .filter(|order| order.student_id == student_id)
        .ok_or(CheckoutError::OrderNotFound)?;

    let signature_ok = verify_payment_signature(secret, order_id, payment_id, signature);

    if order.status.is_paid() {
        tx.rollback().await?;
        if order.payment_id.as_deref() != Some(payment_id) {
            return Err(CheckoutError::PaymentMismatch);
        }
        if !signature_ok {
            return Err(CheckoutError::InvalidSignature);
        }
        if order.status == PaymentStatus::RefundPending && order.refund_amount >= order.amount {
            return Err(CheckoutError::DuplicatePayment);
        }
        let refund_due = order.refund_amount;
        return Ok(verified(order, payment_id, 0, refund_due, true));
    }

    if !signature_ok {
        let now = primitive_now_utc();
        repositories::payment_orders::mark_failed(&mut *tx, order_id, now).await?;
        tx.commit().await?;
        metrics::counter!("payments_failed_total", "reason" => "signature").increment(1);
        tracing::warn!(order_id, "Payment signature mismatch");
        return Err(CheckoutError::InvalidSignature);
    }

    let now = primitive_now_utc();
    repositories::payment_orders::mark_verified(&mut *tx, order_id, payment_id, now)
        .await
        .map_err(|err| match err.as_database_error() {
            Some(db_err) if db_err.is_unique_violation() => CheckoutError::PaymentMismatch,
            _ => CheckoutError::Database(err),
        })?;

    let mut newly_granted = 0;
    let mut refund_due = Decimal::ZERO;
    for line in &order.items.0 {
        let granted = repositories::purchases::grant(
            &mut *tx,
            student_id,
            &line.test_id,
            order_id,
            line.price_paid,
            now,
        )
        .await?;
        if granted {
            newly_granted += 1;
        } else {
            refund_due += line.price_paid;
        }
    }
    if refund_due > Decimal::ZERO {
        repositories::payment_orders::flag_refund(&mut *tx, order_id, refund_due, now).await?;
    }

    if order.purpose == PaymentPurpose::Cart {
        let test_ids: Vec<String> = order.items.0.iter().map(|line| line.test_id.clone()).collect();
        repositories::cart_items::remove_many(&mut *tx, student_id, &test_ids).await?;
    }

    tx.commit().await?;

    if refund_due > Decimal::ZERO {
        metrics::counter!("payments_refund_pending_total").increment(1);
        tracing::warn!(order_id, student_id, %refund_due, "Payment covered tests already owned");
        if newly_granted == 0 {
            return Err(CheckoutError::DuplicatePayment);
        }
    }

    let purpose_label = match order.purpose {
        PaymentPurpose::Single => "single",
        PaymentPurpose::Cart => "cart",
    };
    metrics::counter!("payments_verified_total", "purpose" => purpose_label).increment(1);
    tracing::info!(order_id, student_id, newly_granted, "Payment verified");

    Ok(verified(order, payment_id, newly_granted, refund_due, false))
}

fn verified(
    order: PaymentOrder,
    payment_id: &str,
    newly_granted: usize,
    refund_due: Decimal,
    replayed: bool,
) -> VerifiedOrder {
    VerifiedOrder {
        order_id: order.id,
        payment_id: payment_id.to_string(),
        purpose: order.purpose,
        test_ids: order.items.0.into_iter().map(|line| line.test_id).collect(),
        newly_granted,
        refund_due,
        replayed,
    }
}

fn same_order(
    order: &PaymentOrder,
    purpose: PaymentPurpose,
    test_ids: &[String],
    amount: Decimal,
    currency: &str,
) -> bool {
    let mut wanted: Vec<&str> = test_ids.iter().map(String::as_str).collect();
    let mut held: Vec<&str> = order.items.0.iter().map(|line| line.test_id.as_str()).collect();
    wanted.sort_unstable();
    held.sort_unstable();
    order.purpose == purpose && order.amount == amount && order.currency == currency && wanted == held
}

fn to_minor_units(amount: Decimal) -> Result<i64, CheckoutError> {
    (amount * Decimal::ONE_HUNDRED)
        .round()
        .to_i64()
        .filter(|minor| *minor > 0)
        .ok_or(CheckoutError::InvalidAmount(amount))
}
