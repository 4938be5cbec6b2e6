//! Newtype identifiers shared across entities.

use std::fmt;
use std::str::FromStr;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

macro_rules! string_id {
    ($name:ident, $doc:literal) => {
        #[doc = $doc]
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Generate a new random id (UUIDv4).
            pub fn new() -> Self {
                Self(Uuid::new_v4().to_string())
            }

            /// Wrap an existing string as this id.
            pub fn from_string(s: impl Into<String>) -> Self {
                Self(s.into())
            }

            /// Borrow the inner string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl FromStr for $name {
            type Err = std::convert::Infallible;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }
    };
}

// VideoId is NOT minted via `new()` in practice: the canonical id is derived
// from the source URL (11-char YouTube id, or a hash of the URL for other
// sources) by `vlearn-transcribe::canonical_id`. The constructor is kept for
// tests and for the rare synthetic-video code path.
string_id!(VideoId, "Identity of a video, derived from its canonical source id.");
string_id!(QuestionId, "Identity of a generated question.");
string_id!(QuizId, "Identity of an assembled quiz.");
string_id!(ReportId, "Identity of a generated learning report.");
string_id!(NotesId, "Identity of a generated notes document.");
string_id!(UserId, "Identity of an end user.");
string_id!(ProjectId, "Identity of a project.");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn video_id_roundtrips_through_string() {
        let id = VideoId::from("dQw4w9WgXcQ");
        assert_eq!(id.as_str(), "dQw4w9WgXcQ");
        assert_eq!(id.to_string(), "dQw4w9WgXcQ");
    }

    #[test]
    fn generated_ids_are_unique() {
        assert_ne!(QuestionId::new(), QuestionId::new());
    }
}
