//! # pharmacy-entity
//!
//! Domain entity models for the pharmacy back-office. Every struct in this
//! crate represents a database table row or a domain value object. Row
//! types derive `sqlx::FromRow`; input types derive `validator::Validate`.

pub mod notification;
pub mod prescription;
pub mod product;
pub mod purchase;
pub mod sale;
pub mod user;
