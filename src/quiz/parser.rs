use log::debug;

use crate::quiz::{ContentKind, GrammarRecord, Record, VocabularyRecord};

/// A grammar line needs at least id, prompt, correct answer and three distractor slots.
const GRAMMAR_MIN_FIELDS: usize = 6;

/// Parses raw delimited text into records of the given kind.
///
/// Lines whose first field is not an integer (header rows included) and lines
/// that don't carry enough data for their kind are skipped without aborting
/// the rest of the batch.
pub fn parse(raw: &str, kind: ContentKind) -> Vec<Record> {
    let mut records = Vec::new();
    let mut skipped = 0usize;

    for line in raw.split(|c: char| c == '\n' || c == '\r') {
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_fields(line);
        let record = match kind {
            ContentKind::Vocabulary => parse_vocabulary(&fields).map(Record::Vocabulary),
            ContentKind::Grammar => parse_grammar(&fields).map(Record::Grammar),
        };
        match record {
            Some(record) => records.push(record),
            None => skipped += 1,
        }
    }

    debug!(
        "Parsed {} {} records, skipped {} lines",
        records.len(),
        kind.label(),
        skipped
    );
    records
}

/// Splits one line on commas. A `"` toggles quoted mode, in which commas are
/// literal; the quote characters themselves are dropped.
pub fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for c in line.chars() {
        match c {
            '"' => in_quotes = !in_quotes,
            ',' if !in_quotes => {
                fields.push(current.trim().to_string());
                current.clear();
            }
            _ => current.push(c),
        }
    }
    fields.push(current.trim().to_string());

    fields
}

fn parse_id(fields: &[String]) -> Option<u32> {
    fields.first()?.parse().ok()
}

fn parse_vocabulary(fields: &[String]) -> Option<VocabularyRecord> {
    let id = parse_id(fields)?;
    let term = fields.get(1)?.clone();
    let meanings = fields
        .iter()
        .skip(2)
        .filter(|m| !m.is_empty())
        .cloned()
        .collect::<Vec<_>>();
    if meanings.is_empty() {
        return None;
    }

    Some(VocabularyRecord { id, term, meanings })
}

fn parse_grammar(fields: &[String]) -> Option<GrammarRecord> {
    let id = parse_id(fields)?;
    if fields.len() < GRAMMAR_MIN_FIELDS {
        return None;
    }

    let correct_answer = fields[2].clone();
    let mut distractors: Vec<String> = Vec::new();
    for candidate in &fields[3..GRAMMAR_MIN_FIELDS] {
        if candidate.is_empty() || *candidate == correct_answer || distractors.contains(candidate) {
            continue;
        }
        distractors.push(candidate.clone());
    }

    let optional = |index: usize| fields.get(index).cloned().unwrap_or_default();

    Some(GrammarRecord {
        id,
        prompt: fields[1].clone(),
        correct_answer,
        distractors,
        source_label: optional(6),
        difficulty_tier: optional(7),
        explanation: optional(8),
    })
}
