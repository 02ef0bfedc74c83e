pub mod auth;
pub mod error;

pub use auth::{JwtClaims, TokenResponse, User};
pub use error::AppError;
