use serde::{Deserialize, Serialize};

const STORAGE_KEY_PREFIX: &str = "teachersCenterSettings_";

/// Per-document class settings sent as request requirements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    pub language: String,
    pub level: String,
    #[serde(default)]
    pub native_language: String,
    #[serde(default)]
    pub age_group: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            language: "English".to_string(),
            level: "B1".to_string(),
            native_language: "No".to_string(),
            age_group: String::new(),
        }
    }
}

impl Settings {
    /// Short "<level> <language>" label for the context badge.
    pub fn badge(&self) -> String {
        format!("{} {}", self.level, self.language)
    }

    /// Storage key for settings of one document. Anything that is not
    /// ASCII alphanumeric in the path becomes `_`.
    pub fn storage_key(document: Option<&str>) -> String {
        match document {
            Some(path) if !path.is_empty() => {
                let sanitized: String = path
                    .chars()
                    .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
                    .collect();
                format!("{STORAGE_KEY_PREFIX}{sanitized}")
            }
            _ => format!("{STORAGE_KEY_PREFIX}default"),
        }
    }
}
