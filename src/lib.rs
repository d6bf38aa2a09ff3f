//! Evermore - backend for the Evermore wedding-website platform.
//!
//! This library provides the payment-to-account provisioning workflow:
//! Stripe checkout verification, auth identity creation, the atomic
//! account transaction, rollback on partial failure, and the HTTP
//! handlers that front it.

pub mod auth;
pub mod config;
pub mod db;
pub mod email;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod id;
pub mod models;
pub mod password;
pub mod payments;
pub mod provisioning;
pub mod rate_limit;
