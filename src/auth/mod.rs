//! Authentication module

pub mod api_key;
pub mod jwt;
pub mod password;
pub mod session;

pub use api_key::{ApiKeyGenerator, IssuedKey};
pub use jwt::{JwtService, SessionClaims};
pub use password::PasswordHasher;
pub use session::{extract_bearer, extract_cookie, session_middleware, SessionResolver};
