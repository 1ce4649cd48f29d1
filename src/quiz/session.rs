use log::debug;
use rand::Rng;

use crate::quiz::weak::{KeyValueStore, WeakTracker};
use crate::quiz::{choices, ChoiceOption, ContentKind, MissedItem, QuizError, Record, SessionError};

/// A user's reply to the question on screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Choice(usize),
    /// The question timer ran out. Grades like a selection that matches no option.
    Timeout,
}

/// Result of grading one question.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Grading {
    pub index: usize,
    pub selected: Option<usize>,
    pub correct: bool,
    pub correct_index: usize,
    pub correct_answer: String,
    pub explanation: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum Phase {
    AwaitingStart,
    Presenting {
        index: usize,
        choices: Vec<ChoiceOption>,
    },
    Graded {
        index: usize,
        choices: Vec<ChoiceOption>,
        grading: Grading,
    },
    Completed,
}

impl Phase {
    fn name(&self) -> &'static str {
        match self {
            Phase::AwaitingStart => "awaiting start",
            Phase::Presenting { .. } => "presenting a question",
            Phase::Graded { .. } => "showing a graded question",
            Phase::Completed => "completed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub score: usize,
    pub total: usize,
    pub missed: Vec<MissedItem>,
    pub flawless: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Advance {
    Next(usize),
    Completed(Summary),
}

/// Everything the front-end needs to render the current question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionView<'a> {
    pub prompt: &'a str,
    pub choices: Vec<&'a str>,
    pub position: usize,
    pub total: usize,
    pub score: usize,
    pub grading: Option<&'a Grading>,
}

/// One quiz run over a fixed, ordered list of items of a single kind.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct QuizSession {
    kind: ContentKind,
    items: Vec<Record>,
    phase: Phase,
    score: usize,
    missed: Vec<MissedItem>,
}

impl QuizSession {
    pub fn new(kind: ContentKind, items: Vec<Record>) -> Self {
        Self {
            kind,
            items,
            phase: Phase::AwaitingStart,
            score: 0,
            missed: Vec::new(),
        }
    }

    pub fn kind(&self) -> ContentKind {
        self.kind
    }

    pub fn items(&self) -> &[Record] {
        &self.items
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn score(&self) -> usize {
        self.score
    }

    pub fn missed(&self) -> &[MissedItem] {
        &self.missed
    }

    pub fn is_completed(&self) -> bool {
        matches!(self.phase, Phase::Completed)
    }

    /// Index of the question waiting for an answer, if any.
    pub fn presenting_index(&self) -> Option<usize> {
        match self.phase {
            Phase::Presenting { index, .. } => Some(index),
            _ => None,
        }
    }

    pub fn start<R: Rng + ?Sized>(&mut self, pool: &[Record], rng: &mut R) -> Result<&[ChoiceOption], SessionError> {
        if !matches!(self.phase, Phase::AwaitingStart) {
            return Err(self.invalid("start"));
        }
        // A built session always has at least one item.
        let Some(first) = self.items.first() else {
            self.phase = Phase::Completed;
            return Err(self.invalid("start"));
        };
        let choices = choices::generate(first, pool, rng);
        self.phase = Phase::Presenting { index: 0, choices };
        Ok(self.current_choices())
    }

    /// Grades the question on screen.
    ///
    /// Returns `Ok(None)` when the question was already graded, so a timer firing
    /// after a manual answer changes nothing. Wrong vocabulary answers add the word
    /// to `weak`; if that write fails the session is left untouched.
    pub fn submit_answer<S: KeyValueStore>(
        &mut self,
        answer: Answer,
        weak: &mut WeakTracker<S>,
    ) -> Result<Option<Grading>, QuizError> {
        let (index, choices) = match &self.phase {
            Phase::Presenting { index, choices } => (*index, choices),
            Phase::Graded { .. } => return Ok(None),
            _ => return Err(self.invalid("answer").into()),
        };

        let item = &self.items[index];
        let selected = match answer {
            Answer::Choice(choice) if choice < choices.len() => Some(choice),
            _ => None,
        };
        let correct = selected.map_or(false, |choice| choices[choice].is_correct);
        let correct_index = choices.iter().position(|c| c.is_correct).unwrap_or_default();
        let correct_answer = choices
            .get(correct_index)
            .map(|c| c.display_text.clone())
            .unwrap_or_else(|| item.correct_display_text());

        if !correct && self.kind == ContentKind::Vocabulary {
            weak.add(item.id())?;
        }

        let grading = Grading {
            index,
            selected,
            correct,
            correct_index,
            correct_answer: correct_answer.clone(),
            explanation: item.explanation().map(str::to_string),
        };
        debug!("Graded question {} ({:?}): correct = {}", index, answer, correct);

        if correct {
            self.score += 1;
        } else {
            self.missed.push(MissedItem {
                prompt: item.prompt_text().to_string(),
                correct_answer,
            });
        }

        let Phase::Presenting { choices, .. } = std::mem::replace(&mut self.phase, Phase::Completed) else {
            unreachable!("phase checked above");
        };
        self.phase = Phase::Graded {
            index,
            choices,
            grading: grading.clone(),
        };
        Ok(Some(grading))
    }

    /// Moves past a graded question, generating fresh choices for the next one.
    pub fn advance<R: Rng + ?Sized>(&mut self, pool: &[Record], rng: &mut R) -> Result<Advance, SessionError> {
        let Phase::Graded { index, .. } = self.phase else {
            return Err(self.invalid("advance"));
        };

        let next = index + 1;
        if next < self.items.len() {
            let choices = choices::generate(&self.items[next], pool, rng);
            self.phase = Phase::Presenting { index: next, choices };
            return Ok(Advance::Next(next));
        }

        self.phase = Phase::Completed;
        // The summary exists once the phase is Completed.
        Ok(Advance::Completed(self.summary().ok_or_else(|| self.invalid("advance"))?))
    }

    pub fn summary(&self) -> Option<Summary> {
        if !self.is_completed() {
            return None;
        }
        let total = self.items.len();
        Some(Summary {
            score: self.score,
            total,
            missed: self.missed.clone(),
            flawless: self.score == total && total > 0,
        })
    }

    /// Data for rendering the question on screen, whether graded yet or not.
    pub fn view(&self) -> Option<QuestionView<'_>> {
        let (index, choices, grading) = match &self.phase {
            Phase::Presenting { index, choices } => (*index, choices, None),
            Phase::Graded {
                index,
                choices,
                grading,
            } => (*index, choices, Some(grading)),
            _ => return None,
        };
        Some(QuestionView {
            prompt: self.items[index].prompt_text(),
            choices: choices.iter().map(|c| c.display_text.as_str()).collect(),
            position: index + 1,
            total: self.items.len(),
            score: self.score,
            grading,
        })
    }

    /// Maps a typed or tapped answer back to an option index. When several
    /// options read the same, the correct one wins since they look identical.
    pub fn choice_index(&self, text: &str) -> Option<usize> {
        let choices = match &self.phase {
            Phase::Presenting { choices, .. } | Phase::Graded { choices, .. } => choices,
            _ => return None,
        };
        let text = text.trim();
        choices
            .iter()
            .position(|c| c.is_correct && c.display_text == text)
            .or_else(|| choices.iter().position(|c| c.display_text == text))
    }

    fn current_choices(&self) -> &[ChoiceOption] {
        match &self.phase {
            Phase::Presenting { choices, .. } | Phase::Graded { choices, .. } => choices,
            _ => &[],
        }
    }

    fn invalid(&self, action: &'static str) -> SessionError {
        SessionError::InvalidTransition {
            action,
            phase: self.phase.name(),
        }
    }
}
