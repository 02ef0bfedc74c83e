pub mod extractor;
pub mod jwt;
pub mod normalize;
pub mod test_utils;

pub use extractor::auth_middleware;
pub use jwt::{sign_token, validate_token};
