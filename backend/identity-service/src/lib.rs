//! Identity service: accounts, single-use tokens and access-token issuance
//!
//! - `services::TokenManager`: email-confirmation and password-reset tokens
//! - `services::IdentityService`: register / confirm / login / forgot / reset
//!   plus profile and role management
//! - `db`: account and token repositories (Postgres and in-memory)

pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod security;
pub mod services;

pub use error::{IdentityError, Result};
