//! Prompt construction for ContentPilot.
//!
//! [`format`] renders a schema tree as text (verbose or compact) and
//! [`build_prompt`] embeds it in the fixed instruction template sent as the
//! system prompt.

pub mod formatter;
pub mod template;
pub mod token;

pub use formatter::format;
pub use template::{PromptPayload, build_prompt, system_prompt};
