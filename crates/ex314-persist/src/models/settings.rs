use serde::{Deserialize, Serialize};

/// Per-user preferences. `ai_tone` feeds the system prompt of thread sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub name: String,
    pub email: String,
    pub theme: String,
    pub font_size: String,
    pub ai_tone: String,
}

impl Default for UserSettings {
    fn default() -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            theme: "dark".to_string(),
            font_size: "normal".to_string(),
            ai_tone: "formal".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_document_keeps_defaults() {
        let settings: UserSettings = serde_json::from_str(r#"{"name": "Ada"}"#).unwrap();
        assert_eq!(settings.name, "Ada");
        assert_eq!(settings.theme, "dark");
        assert_eq!(settings.ai_tone, "formal");
    }
}
