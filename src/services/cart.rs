use thiserror::Error;

use crate::core::{state::AppState, time::primitive_now_utc};
use crate::db::models::CartLine;
use crate::repositories;
use crate::services::pricing::{self, LineItem, PriceQuote, PricingError};

#[derive(Debug, Error)]
pub(crate) enum CartError {
    #[error("Test not found")]
    TestNotFound,
    #[error("Test is already in the cart")]
    DuplicateItem,
    #[error("Test is not in the cart")]
    ItemNotFound,
    #[error("Test already purchased")]
    AlreadyPurchased,
    #[error(transparent)]
    Pricing(#[from] PricingError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub(crate) struct CartSnapshot {
    pub(crate) lines: Vec<CartLine>,
    pub(crate) quote: PriceQuote,
}

pub(crate) async fn add(state: &AppState, student_id: &str, test_id: &str) -> Result<(), CartError> {
    repositories::tests::find_active(state.db(), test_id).await?.ok_or(CartError::TestNotFound)?;

    if repositories::purchases::exists(state.db(), student_id, test_id).await? {
        return Err(CartError::AlreadyPurchased);
    }

    let inserted =
        repositories::cart_items::add(state.db(), student_id, test_id, primitive_now_utc()).await?;
    if !inserted {
        return Err(CartError::DuplicateItem);
    }
    Ok(())
}

pub(crate) async fn remove(state: &AppState, student_id: &str, test_id: &str) -> Result<(), CartError> {
    if !repositories::cart_items::remove(state.db(), student_id, test_id).await? {
        return Err(CartError::ItemNotFound);
    }
    Ok(())
}

/// Empties the cart. Clearing an empty cart succeeds.
pub(crate) async fn clear(state: &AppState, student_id: &str) -> Result<u64, CartError> {
    Ok(repositories::cart_items::clear(state.db(), student_id).await?)
}

/// Current cart lines priced with the configured bundle tiers. Lines for tests the
/// student already owns are left out of the priced set.
pub(crate) async fn snapshot(state: &AppState, student_id: &str) -> Result<CartSnapshot, CartError> {
    let lines = repositories::cart_items::list_lines(state.db(), student_id).await?;
    let test_ids: Vec<String> = lines.iter().map(|line| line.test_id.clone()).collect();
    let owned = if test_ids.is_empty() {
        Vec::new()
    } else {
        repositories::purchases::owned_among(state.db(), student_id, &test_ids).await?
    };

    let lines: Vec<CartLine> =
        lines.into_iter().filter(|line| !owned.contains(&line.test_id)).collect();
    let quote = price_lines(state, &lines)?;

    Ok(CartSnapshot { lines, quote })
}

fn price_lines(state: &AppState, lines: &[CartLine]) -> Result<PriceQuote, CartError> {
    let items: Vec<LineItem> = lines
        .iter()
        .map(|line| LineItem { test_id: line.test_id.clone(), price: line.price })
        .collect();
    Ok(pricing::price(&items, &state.settings().pricing().bundle_tiers)?)
}
