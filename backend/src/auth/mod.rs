//! Authentication module
//!
//! JWT access/refresh tokens, password hashing, token pair issuance and the
//! session extractor guarding authenticated routes.

pub mod cookie;
mod issuer;
mod jwt;
mod middleware;
mod password;

pub use issuer::{TokenIssuer, TokenPair};
pub use jwt::{Claims, JwtService, TokenProfile};
pub use middleware::{access_token_from, authenticate, CurrentAccount};
pub use password::PasswordService;
