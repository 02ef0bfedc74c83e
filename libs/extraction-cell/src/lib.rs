//! PDF intake: uploads go to the AI provider with an instruction prompt and
//! come back as a draft patient record for review.

pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::*;
pub use router::*;
