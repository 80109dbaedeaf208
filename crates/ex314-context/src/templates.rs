/// `<tone>` is replaced with the user's `ai_tone` setting
pub const DEFAULT_SYSTEM_PROMPT_TEMPLATE: &str = "You are EX314, a helpful assistant. \
Keep the conversation history in mind and answer the user's latest message. \
Respond in a <tone> tone.";

pub const DEFAULT_AI_TONE: &str = "formal";

pub fn render_system_prompt(template: &str, ai_tone: &str) -> String {
    let tone = ai_tone.trim();
    template.replace("<tone>", if tone.is_empty() { DEFAULT_AI_TONE } else { tone })
}
