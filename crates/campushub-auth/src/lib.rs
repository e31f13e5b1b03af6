//! # campushub-auth
//!
//! Token verification for CampusHub. Tokens are issued elsewhere (the
//! account gateway); this crate only decodes and validates them, and
//! exposes the claims schema the realtime and API layers bind sessions
//! to.

pub mod jwt;

pub use jwt::{Claims, JwtDecoder, JwtEncoder};
