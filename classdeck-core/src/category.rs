use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Requested generation kind. Selects the transform applied to a reply.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ContentCategory {
    #[default]
    Vocabulary,
    Grammar,
    Quiz,
    Homework,
}

impl ContentCategory {
    pub const ALL: [ContentCategory; 4] = [
        ContentCategory::Vocabulary,
        ContentCategory::Grammar,
        ContentCategory::Quiz,
        ContentCategory::Homework,
    ];

    /// Wire value used in the outbound `type` field.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Vocabulary => "vocabulary",
            Self::Grammar => "grammar",
            Self::Quiz => "quiz",
            Self::Homework => "homework",
        }
    }
}

impl fmt::Display for ContentCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown content category: {0}")]
pub struct UnknownCategory(pub String);

impl FromStr for ContentCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "vocabulary" | "vocab" => Ok(Self::Vocabulary),
            "grammar" => Ok(Self::Grammar),
            "quiz" => Ok(Self::Quiz),
            "homework" => Ok(Self::Homework),
            other => Err(UnknownCategory(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_vocabulary() {
        assert_eq!(ContentCategory::default(), ContentCategory::Vocabulary);
    }

    #[test]
    fn test_parse_and_display() {
        for category in ContentCategory::ALL {
            let parsed: ContentCategory = category.to_string().parse().unwrap();
            assert_eq!(parsed, category);
        }
        assert!("edit".parse::<ContentCategory>().is_err());
    }
}
