pub mod builder;
pub mod choices;
pub mod error;
pub mod guard;
pub mod parser;
pub mod session;
pub mod store;
pub mod timer;
pub mod weak;

pub use builder::{DifficultyTier, IdRange, SessionMode};
pub use error::{BuildError, FetchError, QuizError, SessionError, StoreError};
pub use session::{Answer, Grading, Phase, QuizSession, Summary};
pub use store::{ContentSource, RecordStore};
pub use weak::{KeyValueStore, WeakTracker};

/// Which of the two content formats a source holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ContentKind {
    Vocabulary,
    Grammar,
}

impl ContentKind {
    pub fn label(&self) -> &'static str {
        match self {
            ContentKind::Vocabulary => "vocabulary",
            ContentKind::Grammar => "grammar",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct VocabularyRecord {
    pub id: u32,
    pub term: String,
    pub meanings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GrammarRecord {
    pub id: u32,
    pub prompt: String,
    pub correct_answer: String,
    /// At most three, never equal to `correct_answer`.
    pub distractors: Vec<String>,
    pub source_label: String,
    /// "1", "2", "3" or empty.
    pub difficulty_tier: String,
    pub explanation: String,
}

/// A parsed content item. A session only ever holds one kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Record {
    Vocabulary(VocabularyRecord),
    Grammar(GrammarRecord),
}

impl Record {
    pub fn id(&self) -> u32 {
        match self {
            Record::Vocabulary(word) => word.id,
            Record::Grammar(item) => item.id,
        }
    }

    pub fn kind(&self) -> ContentKind {
        match self {
            Record::Vocabulary(_) => ContentKind::Vocabulary,
            Record::Grammar(_) => ContentKind::Grammar,
        }
    }

    /// The text the user is asked about.
    pub fn prompt_text(&self) -> &str {
        match self {
            Record::Vocabulary(word) => &word.term,
            Record::Grammar(item) => &item.prompt,
        }
    }

    /// The text of the correct option, as it is displayed among the choices.
    pub fn correct_display_text(&self) -> String {
        match self {
            Record::Vocabulary(word) => choices::meaning_display(&word.meanings),
            Record::Grammar(item) => item.correct_answer.clone(),
        }
    }

    pub fn difficulty_tier(&self) -> Option<&str> {
        match self {
            Record::Vocabulary(_) => None,
            Record::Grammar(item) => Some(&item.difficulty_tier),
        }
    }

    pub fn explanation(&self) -> Option<&str> {
        match self {
            Record::Grammar(item) if !item.explanation.is_empty() => Some(&item.explanation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ChoiceOption {
    pub display_text: String,
    pub is_correct: bool,
    pub backing: Record,
}

impl ChoiceOption {
    pub fn new(display_text: String, is_correct: bool, backing: Record) -> Self {
        Self {
            display_text,
            is_correct,
            backing,
        }
    }
}

/// A question the user got wrong or let time out on.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct MissedItem {
    pub prompt: String,
    pub correct_answer: String,
}
