//! End-to-end alerting scenarios over the in-memory store.

mod helpers;

mod prescription_test;
mod purchase_test;
mod reconciliation_test;
mod sale_test;
mod stock_test;
