mod strategy;
mod templates;
mod window;

pub use strategy::{ContextStrategy, ContextWindow};
pub use templates::{render_system_prompt, DEFAULT_AI_TONE, DEFAULT_SYSTEM_PROMPT_TEMPLATE};
pub use window::{TrailingWindowStrategy, WindowMode, DEFAULT_MAX_MESSAGES, DEFAULT_MAX_TOKENS};
