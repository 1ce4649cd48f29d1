use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{ChoiceOption, GrammarRecord, Record, VocabularyRecord};

/// How many other words are drawn as distractors for a vocabulary question.
pub const VOCABULARY_DISTRACTORS: usize = 3;

const MEANING_JOIN: &str = ", ";
const MEANING_SPLIT: char = ',';
const DISPLAY_SEPARATOR: &str = " / ";

/// Builds the shuffled answer options for `target`.
///
/// Vocabulary questions borrow distractors from other words in `pool`;
/// grammar questions only ever use the distractors stored on the record.
pub fn generate<R: Rng + ?Sized>(target: &Record, pool: &[Record], rng: &mut R) -> Vec<ChoiceOption> {
    let mut options = match target {
        Record::Vocabulary(word) => vocabulary_options(word, target, pool, rng),
        Record::Grammar(item) => grammar_options(item, target),
    };
    // We shuffle the answers so the correct one isn't always the first one
    options.shuffle(rng);
    options
}

fn vocabulary_options<R: Rng + ?Sized>(
    word: &VocabularyRecord,
    target: &Record,
    pool: &[Record],
    rng: &mut R,
) -> Vec<ChoiceOption> {
    let mut seen = HashSet::from([word.id]);
    let others = pool
        .iter()
        .filter_map(|record| match record {
            Record::Vocabulary(other) if seen.insert(other.id) => Some((record, other)),
            _ => None,
        })
        .collect::<Vec<_>>();

    let mut options = vec![ChoiceOption::new(
        meaning_display(&word.meanings),
        true,
        target.clone(),
    )];
    options.extend(
        others
            .choose_multiple(rng, VOCABULARY_DISTRACTORS)
            .map(|(record, other)| {
                ChoiceOption::new(meaning_display(&other.meanings), false, (*record).clone())
            }),
    );
    options
}

fn grammar_options(item: &GrammarRecord, target: &Record) -> Vec<ChoiceOption> {
    std::iter::once(ChoiceOption::new(item.correct_answer.clone(), true, target.clone()))
        .chain(
            item.distractors
                .iter()
                .map(|d| ChoiceOption::new(d.clone(), false, target.clone())),
        )
        .collect()
}

/// Display text for a word's meanings: the meanings are joined, split again on
/// commas (so a quoted "a, b" meaning counts as two), and the first one or two
/// segments are shown.
pub fn meaning_display(meanings: &[String]) -> String {
    let joined = meanings.join(MEANING_JOIN);
    let segments = joined
        .split(MEANING_SPLIT)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    match segments.as_slice() {
        [] => String::new(),
        [only] => only.to_string(),
        [first, second, ..] => format!("{}{}{}", first, DISPLAY_SEPARATOR, second),
    }
}
