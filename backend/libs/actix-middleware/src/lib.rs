//! # Actix Middleware Library
//!
//! Request authentication for the blog HTTP surface.
//!
//! ## Modules
//! - `jwt_auth`: bearer-token middleware and the `AuthenticatedUser` extractor
//! - `guards`: role and claim checks on an authenticated caller

pub mod guards;
pub mod jwt_auth;

pub use guards::{CLAIM_CAN_POST, ROLE_ADMIN};
pub use jwt_auth::{AuthError, AuthenticatedUser, JwtAuthMiddleware};
