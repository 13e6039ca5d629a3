pub(crate) mod auth;
pub(crate) mod checkout;
pub(crate) mod error;
pub(crate) mod menu;
pub(crate) mod report;
pub(crate) mod stock;

/// seconds before giving up on a pooled connection or an in-flight checkout
pub(crate) const DB_TIMEOUT_SECONDS: u64 = 5;
