pub mod gemini;

pub use gemini::{GeminiApiVersion, GeminiProvider, GeminiSettings};
