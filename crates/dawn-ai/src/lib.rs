//! Text generation client surface.
//!
//! [`TextGenerator`] is the seam the pipeline depends on; [`GeminiClient`]
//! is the production implementation against the Generative Language
//! `generateContent` endpoint. There is no retry machinery here: the
//! delivery pipeline's single structured-to-freeform fallback is the only
//! recovery the system performs.

mod gemini;
mod types;

pub use gemini::{GeminiClient, GeminiConfig};
pub use types::{GenerateError, GenerateRequest, TextGenerator};
