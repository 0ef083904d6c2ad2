pub mod gemini;
pub mod traits;
pub mod utils;

pub use gemini::gemini::GeminiProvider;
pub use traits::LabelExtractor;
