//! The generation pipeline.
//!
//! ```text
//! object → introspect → format → LLM → recover → populate → object
//! ```
//!
//! Everything but the LLM call is synchronous. The call is made once per
//! request; provider failures end the request.

mod pipeline;

pub use pipeline::{ContentGenerator, Generation, Preview};
