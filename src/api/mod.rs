pub(crate) mod admin;
pub(crate) mod auth;
pub(crate) mod cart;
pub(crate) mod catalog;
pub(crate) mod errors;
pub(crate) mod guards;
pub(crate) mod handlers;
pub(crate) mod payments;
pub(crate) mod router;
pub(crate) mod sessions;
pub(crate) mod validation;

#[cfg(test)]
mod tests;
