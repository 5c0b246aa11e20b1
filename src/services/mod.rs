pub(crate) mod cart;
pub(crate) mod checkout;
pub(crate) mod grading;
pub(crate) mod password_reset;
pub(crate) mod payment_gateway;
pub(crate) mod pricing;
pub(crate) mod questions;
pub(crate) mod test_session;
