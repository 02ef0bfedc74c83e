pub mod extraction;
pub mod gemini;
pub mod prompt;

pub use extraction::ExtractionService;
pub use gemini::GeminiClient;
