//! Prompt Template System
//!
//! Loads and renders `.pmt` (prompt template) files for each model call the
//! wizard makes.
//!
//! Template loading chain:
//! 1. `{prompts.dir}/{name}.pmt` (user override, when configured)
//! 2. Embedded fallback compiled in from `prompts/`
//!
//! Templates use Handlebars syntax for variable substitution.

mod assembler;
pub mod embedded;
mod loader;

pub use assembler::{NO_IMAGE_ANALYSIS, PromptAssembler, PromptContext};
pub use loader::PromptLoader;

/// Reply token the model uses to end brainstorming
pub const BRAINSTORMING_SENTINEL: &str = "BRAINSTORMING_COMPLETE";

/// Whether a model reply ends the brainstorming dialogue
pub fn is_brainstorming_complete(reply: &str) -> bool {
    reply.contains(BRAINSTORMING_SENTINEL)
}
