//! Language model
//!
//! Three identifier spaces meet here: the canonical key used in requests and
//! on disk, the internal integer stored in the database, and the Judge0
//! language id used on dispatch. The editor id is carried for the UI.

use serde::{Deserialize, Serialize};

/// Canonical language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Language {
    #[serde(rename = "js")]
    JavaScript,
    #[serde(rename = "cpp")]
    Cpp,
    #[serde(rename = "rs")]
    Rust,
    #[serde(rename = "java")]
    Java,
}

/// One row of the language table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LanguageInfo {
    #[serde(skip)]
    pub language: Language,
    pub key: &'static str,
    pub internal: i32,
    pub judge0: u32,
    pub editor: &'static str,
    pub name: &'static str,
}

/// The language table, in editor display order
pub const LANGUAGES: &[LanguageInfo] = &[
    LanguageInfo {
        language: Language::JavaScript,
        key: "js",
        internal: 1,
        judge0: 63,
        editor: "javascript",
        name: "Javascript",
    },
    LanguageInfo {
        language: Language::Cpp,
        key: "cpp",
        internal: 2,
        judge0: 54,
        editor: "cpp",
        name: "C++",
    },
    LanguageInfo {
        language: Language::Rust,
        key: "rs",
        internal: 3,
        judge0: 73,
        editor: "rust",
        name: "Rust",
    },
    LanguageInfo {
        language: Language::Java,
        key: "java",
        internal: 4,
        judge0: 62,
        editor: "java",
        name: "Java",
    },
];

impl Language {
    /// Look up by canonical key (`"cpp"`, `"rs"`, ...)
    pub fn from_key(key: &str) -> Option<Self> {
        LANGUAGES.iter().find(|l| l.key == key).map(|l| l.language)
    }

    /// Look up by the integer stored in the database
    pub fn from_internal(id: i32) -> Option<Self> {
        LANGUAGES.iter().find(|l| l.internal == id).map(|l| l.language)
    }

    /// The table row for this language
    pub fn info(&self) -> &'static LanguageInfo {
        match self {
            Self::JavaScript => &LANGUAGES[0],
            Self::Cpp => &LANGUAGES[1],
            Self::Rust => &LANGUAGES[2],
            Self::Java => &LANGUAGES[3],
        }
    }

    pub fn key(&self) -> &'static str {
        self.info().key
    }

    pub fn internal_id(&self) -> i32 {
        self.info().internal
    }

    pub fn judge0_id(&self) -> u32 {
        self.info().judge0
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Error for a stored language id outside the table
#[derive(Debug, thiserror::Error)]
#[error("unknown internal language id: {0}")]
pub struct UnknownLanguage(pub i32);

impl TryFrom<i32> for Language {
    type Error = UnknownLanguage;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Self::from_internal(id).ok_or(UnknownLanguage(id))
    }
}
