use std::collections::BTreeSet;

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::quiz::{BuildError, ContentKind, QuizSession, Record};

pub const DEFAULT_QUESTION_COUNT: usize = 20;

/// Inclusive id bounds. A missing bound doesn't constrain anything.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct IdRange {
    pub start: Option<u32>,
    pub end: Option<u32>,
}

impl IdRange {
    pub fn new(start: Option<u32>, end: Option<u32>) -> Self {
        Self { start, end }
    }

    /// Builds a range from raw user input; anything that isn't a number counts as absent.
    pub fn from_inputs(start: &str, end: &str) -> Self {
        Self {
            start: start.trim().parse().ok(),
            end: end.trim().parse().ok(),
        }
    }

    /// Accepts `"10-50"`, `"10-"`, `"-50"`, a single id, or anything else (e.g. `"all"`)
    /// as the unbounded range.
    pub fn parse(input: &str) -> Self {
        match input.split_once('-') {
            Some((start, end)) => Self::from_inputs(start, end),
            None => Self::from_inputs(input, input),
        }
    }

    pub fn contains(&self, id: u32) -> bool {
        self.start.map_or(true, |start| id >= start) && self.end.map_or(true, |end| id <= end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DifficultyTier {
    One,
    Two,
    Three,
}

impl DifficultyTier {
    /// Maps the tier strings used in grammar files. Unknown input maps to `None`.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim() {
            "1" => Some(DifficultyTier::One),
            "2" => Some(DifficultyTier::Two),
            "3" => Some(DifficultyTier::Three),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DifficultyTier::One => "1",
            DifficultyTier::Two => "2",
            DifficultyTier::Three => "3",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SessionMode {
    Range(IdRange),
    WeakOnly,
    /// `None` means any tier.
    Difficulty(Option<DifficultyTier>),
}

/// Reads a requested question count, falling back to the default for missing,
/// non-numeric or zero input.
pub fn parse_count(input: Option<&str>) -> usize {
    input
        .and_then(|raw| raw.trim().parse::<usize>().ok())
        .filter(|count| *count > 0)
        .unwrap_or(DEFAULT_QUESTION_COUNT)
}

/// Filters `records` for `mode`, shuffles what is left and keeps the first `count`.
pub fn build<R: Rng + ?Sized>(
    records: &[Record],
    kind: ContentKind,
    mode: &SessionMode,
    weak_ids: &BTreeSet<u32>,
    count: usize,
    rng: &mut R,
) -> Result<QuizSession, BuildError> {
    let of_kind = records.iter().filter(|record| record.kind() == kind);

    let mut items: Vec<Record> = match mode {
        SessionMode::WeakOnly => {
            let weak = of_kind
                .filter(|record| weak_ids.contains(&record.id()))
                .cloned()
                .collect::<Vec<_>>();
            if weak.is_empty() {
                return Err(BuildError::NoWeakItems);
            }
            weak
        }
        SessionMode::Range(range) => of_kind
            .filter(|record| range.contains(record.id()))
            .cloned()
            .collect(),
        SessionMode::Difficulty(tier) => of_kind
            .filter(|record| match tier {
                Some(tier) => record.difficulty_tier() == Some(tier.as_str()),
                None => true,
            })
            .cloned()
            .collect(),
    };

    let available = items.len();
    items.shuffle(rng);
    items.truncate(count);
    if items.is_empty() {
        return Err(BuildError::EmptySession);
    }

    debug!(
        "Built {} session with {} of {} available items ({:?})",
        kind.label(),
        items.len(),
        available,
        mode
    );
    Ok(QuizSession::new(kind, items))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::quiz::fixtures::{grammar, words};

    fn ids(session: &QuizSession) -> Vec<u32> {
        session.items().iter().map(Record::id).collect()
    }

    #[test]
    fn range_filter_respects_bounds_and_count() {
        let records = words(100);
        let mut rng = StdRng::seed_from_u64(5);
        let mode = SessionMode::Range(IdRange::new(Some(10), Some(30)));

        let session = build(&records, ContentKind::Vocabulary, &mode, &BTreeSet::new(), 5, &mut rng)
            .unwrap();
        let session_ids = ids(&session);
        assert_eq!(session_ids.len(), 5);
        assert!(session_ids.iter().all(|id| (10..=30).contains(id)));
        assert_eq!(session_ids.iter().collect::<HashSet<_>>().len(), 5);
    }

    #[test]
    fn takes_everything_when_fewer_than_count() {
        let records = words(8);
        let mode = SessionMode::Range(IdRange::from_inputs("3", "abc"));
        let session = build(
            &records,
            ContentKind::Vocabulary,
            &mode,
            &BTreeSet::new(),
            DEFAULT_QUESTION_COUNT,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        let mut session_ids = ids(&session);
        session_ids.sort();
        assert_eq!(session_ids, vec![3, 4, 5, 6, 7, 8]);
    }

    #[test]
    fn weak_only_with_empty_weak_set_fails() {
        let records = words(5);
        let result = build(
            &records,
            ContentKind::Vocabulary,
            &SessionMode::WeakOnly,
            &BTreeSet::new(),
            10,
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(result.unwrap_err(), BuildError::NoWeakItems);
    }

    #[test]
    fn weak_only_keeps_weak_items() {
        let records = words(10);
        let weak = BTreeSet::from([2, 7, 42]);
        let session = build(
            &records,
            ContentKind::Vocabulary,
            &SessionMode::WeakOnly,
            &weak,
            10,
            &mut StdRng::seed_from_u64(9),
        )
        .unwrap();
        let mut session_ids = ids(&session);
        session_ids.sort();
        assert_eq!(session_ids, vec![2, 7]);
    }

    #[test]
    fn difficulty_filter_matches_exact_tier() {
        let records = vec![
            grammar(1, "a", &["b"], "1"),
            grammar(2, "a", &["b"], "2"),
            grammar(3, "a", &["b"], "2"),
            grammar(4, "a", &["b"], ""),
        ];
        let mut rng = StdRng::seed_from_u64(3);
        let tier_two = SessionMode::Difficulty(DifficultyTier::parse("2"));
        let session =
            build(&records, ContentKind::Grammar, &tier_two, &BTreeSet::new(), 20, &mut rng).unwrap();
        let mut session_ids = ids(&session);
        session_ids.sort();
        assert_eq!(session_ids, vec![2, 3]);

        let any = SessionMode::Difficulty(DifficultyTier::parse("everything"));
        let session =
            build(&records, ContentKind::Grammar, &any, &BTreeSet::new(), 20, &mut rng).unwrap();
        assert_eq!(session.items().len(), 4);
    }

    #[test]
    fn empty_filter_result_fails() {
        let records = words(5);
        let mode = SessionMode::Range(IdRange::new(Some(50), None));
        let result = build(
            &records,
            ContentKind::Vocabulary,
            &mode,
            &BTreeSet::new(),
            10,
            &mut StdRng::seed_from_u64(1),
        );
        assert_eq!(result.unwrap_err(), BuildError::EmptySession);
    }

    #[test]
    fn other_kinds_are_ignored() {
        let mut records = words(3);
        records.push(grammar(10, "a", &["b"], "1"));
        let session = build(
            &records,
            ContentKind::Grammar,
            &SessionMode::Range(IdRange::default()),
            &BTreeSet::new(),
            10,
            &mut StdRng::seed_from_u64(1),
        )
        .unwrap();
        assert_eq!(ids(&session), vec![10]);
    }

    #[test]
    fn shuffle_is_roughly_uniform() {
        let records = words(4);
        let mut rng = StdRng::seed_from_u64(2024);
        let mut first_counts = [0usize; 4];
        for _ in 0..4000 {
            let session = build(
                &records,
                ContentKind::Vocabulary,
                &SessionMode::Range(IdRange::default()),
                &BTreeSet::new(),
                4,
                &mut rng,
            )
            .unwrap();
            first_counts[(session.items()[0].id() - 1) as usize] += 1;
        }
        assert!(
            first_counts.iter().all(|count| (800..=1200).contains(count)),
            "first positions skewed: {:?}",
            first_counts
        );
    }

    #[test]
    fn parse_count_defaults() {
        assert_eq!(parse_count(None), 20);
        assert_eq!(parse_count(Some("abc")), 20);
        assert_eq!(parse_count(Some("0")), 20);
        assert_eq!(parse_count(Some(" 15 ")), 15);
    }

    #[test]
    fn id_range_parsing() {
        assert_eq!(IdRange::parse("10-50"), IdRange::new(Some(10), Some(50)));
        assert_eq!(IdRange::parse("10-"), IdRange::new(Some(10), None));
        assert_eq!(IdRange::parse("-50"), IdRange::new(None, Some(50)));
        assert_eq!(IdRange::parse("all"), IdRange::default());
        assert_eq!(IdRange::parse("7"), IdRange::new(Some(7), Some(7)));
        assert!(IdRange::default().contains(u32::MAX));
    }
}
