pub(crate) mod cart_items;
pub(crate) mod password_resets;
pub(crate) mod payment_orders;
pub(crate) mod purchases;
pub(crate) mod questions;
pub(crate) mod results;
pub(crate) mod sessions;
pub(crate) mod users;
