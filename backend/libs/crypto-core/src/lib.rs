//! Shared cryptographic primitives for the blog backend
//!
//! - `jwt`: HS256 access-token codec (issue + stateless verification)
//! - `token`: opaque single-use token generation
//! - `hash`: SHA-256 digests used to store opaque tokens at rest

pub mod hash;
pub mod jwt;
pub mod token;

pub use hash::{sha256, sha256_hex};
pub use jwt::{
    AccessTokenRequest, Claims, IssuedAccessToken, JwtCodec, JwtConfig, JwtError, CLAIM_CAN_POST,
    ROLE_ADMIN, ROLE_USER,
};
pub use token::generate_opaque_token;
