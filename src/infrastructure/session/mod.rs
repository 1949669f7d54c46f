//! Session tokens for signed-in accounts

mod jwt;

pub use jwt::{JwtSessionManager, SessionClaims, SessionConfig};
