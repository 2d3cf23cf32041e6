//! Pattern-based recognizer
//!
//! Recognises amounts, dates and numbers with regexes, then groups runs of
//! capitalised tokens into candidate names and classifies each run using
//! legal-form suffixes, organisation keywords and a jurisdiction gazetteer.
//! No model files, deterministic output.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use screen_embedding::{is_legal_suffix, normalize_entity_text};

use super::{EntityLabel, EntityRecognizer, ExtractedEntity};

static MONEY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)(?:[$€£¥]\s?\d[\d,]*(?:\.\d+)?(?:\s?(?:million|billion|thousand|mn|bn|m|k)\b)?|\b\d[\d,]*(?:\.\d+)?\s?(?:USD|EUR|GBP|CHF|JPY|dollars|euros|pounds)\b)",
    )
    .expect("money pattern should compile")
});

static DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"\b(?:\d{4}-\d{2}-\d{2}|\d{1,2}/\d{1,2}/\d{2,4}|(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{1,2},\s*\d{4}|\d{1,2}\s+(?:January|February|March|April|May|June|July|August|September|October|November|December)\s+\d{4})\b",
    )
    .expect("date pattern should compile")
});

static CARDINAL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b\d[\d,]*(?:\.\d+)?\b").expect("cardinal pattern should compile"));

/// Lower-case words allowed inside a name ("Bank of America", "Save the Children")
const CONNECTORS: &[&str] = &["of", "the", "and", "for", "de", "du", "la", "&", "und", "y"];

/// Capitalised words that start sentences rather than names
const LEADING_STOPWORDS: &[&str] = &[
    "the", "a", "an", "in", "on", "at", "for", "from", "to", "by", "with", "this", "that", "these",
    "those", "our", "their", "its", "his", "her", "mr", "mrs", "ms", "dr",
];

static ORG_KEYWORDS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "holdings", "holding", "group", "bank", "trust", "fund", "foundation", "capital",
        "partners", "org", "organization", "organisation", "association", "society", "institute",
        "ventures", "enterprises", "industries", "international", "consulting", "services",
        "solutions", "investments", "charity", "council", "agency", "ministry", "university",
        "committee", "federation", "union", "alliance", "network", "trading", "logistics",
        "securities", "finance", "financial", "insurance", "llc", "ltd", "inc", "corp",
    ]
    .into_iter()
    .collect()
});

static JURISDICTIONS: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    [
        "afghanistan", "albania", "bahamas", "barbados", "belize", "bermuda", "bvi",
        "british virgin islands", "cayman islands", "cyprus", "china", "cuba", "france",
        "germany", "gibraltar", "guernsey", "hong kong", "india", "iran", "iraq", "ireland",
        "isle of man", "italy", "jersey", "liechtenstein", "luxembourg", "malta", "mauritius",
        "monaco", "myanmar", "netherlands", "north korea", "panama", "russia", "seychelles",
        "singapore", "south sudan", "spain", "switzerland", "syria", "uae",
        "united arab emirates", "uk", "united kingdom", "us", "usa", "united states",
        "vanuatu", "venezuela", "yemen", "delaware", "nevada", "london", "new york", "zurich",
        "geneva", "dubai", "moscow", "tehran", "pyongyang",
    ]
    .into_iter()
    .collect()
});

#[derive(Debug, Clone)]
struct Token<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

impl Token<'_> {
    fn is_capitalised(&self) -> bool {
        self.text.chars().next().is_some_and(|c| c.is_uppercase())
    }

    fn is_connector(&self) -> bool {
        CONNECTORS.contains(&self.text)
    }

    fn is_title_word(&self) -> bool {
        self.is_capitalised()
            && self.text.chars().all(|c| c.is_alphabetic() || c == '\'' || c == '-')
            && self.text.chars().any(|c| c.is_lowercase())
    }

    fn is_acronym(&self) -> bool {
        self.text.chars().count() >= 2 && self.text.chars().all(|c| c.is_ascii_uppercase())
    }
}

/// Default recognizer backend
#[derive(Debug, Clone, Default)]
pub struct PatternRecognizer;

impl PatternRecognizer {
    pub fn new() -> Self {
        Self
    }

    /// Word tokens with byte positions. `&` is a token of its own; inner
    /// apostrophes and hyphens stay inside words.
    fn tokenize(text: &str) -> Vec<Token<'_>> {
        let mut tokens = Vec::new();
        let mut word_start: Option<usize> = None;

        let chars: Vec<(usize, char)> = text.char_indices().collect();
        for (idx, &(i, c)) in chars.iter().enumerate() {
            let inner_joiner = (c == '\'' || c == '-')
                && word_start.is_some()
                && chars.get(idx + 1).is_some_and(|(_, n)| n.is_alphanumeric());

            if c.is_alphanumeric() || inner_joiner {
                if word_start.is_none() {
                    word_start = Some(i);
                }
                continue;
            }

            if let Some(start) = word_start.take() {
                tokens.push(Token { start, end: i, text: &text[start..i] });
            }
            if c == '&' {
                tokens.push(Token { start: i, end: i + 1, text: &text[i..i + 1] });
            }
        }
        if let Some(start) = word_start {
            tokens.push(Token { start, end: text.len(), text: &text[start..] });
        }
        tokens
    }

    /// Group capitalised tokens into candidate name runs. Runs break on any
    /// punctuation between tokens; connectors are kept only when another
    /// capitalised token follows.
    fn capitalised_runs<'a>(text: &str, tokens: &'a [Token<'a>]) -> Vec<&'a [Token<'a>]> {
        let joined = |a: &Token<'_>, b: &Token<'_>| text[a.end..b.start].chars().all(char::is_whitespace);

        let mut runs = Vec::new();
        let mut i = 0;
        while i < tokens.len() {
            if !tokens[i].is_capitalised() {
                i += 1;
                continue;
            }
            let start = i;
            let mut end = i + 1;
            while end < tokens.len() && joined(&tokens[end - 1], &tokens[end]) {
                if tokens[end].is_capitalised() {
                    end += 1;
                } else if tokens[end].is_connector()
                    && end + 1 < tokens.len()
                    && joined(&tokens[end], &tokens[end + 1])
                    && tokens[end + 1].is_capitalised()
                {
                    end += 2;
                } else {
                    break;
                }
            }

            let mut run = &tokens[start..end];
            while let Some(first) = run.first() {
                if LEADING_STOPWORDS.contains(&first.text.to_lowercase().as_str()) || first.is_connector() {
                    run = &run[1..];
                } else {
                    break;
                }
            }
            if !run.is_empty() {
                runs.push(run);
            }
            i = end;
        }
        runs
    }

    fn classify(run: &[Token<'_>]) -> Option<EntityLabel> {
        let span_text = run.iter().map(|t| t.text).collect::<Vec<_>>().join(" ");
        let normalized = normalize_entity_text(&span_text);

        let has_org_keyword = run.iter().any(|t| {
            let lower = t.text.to_lowercase();
            is_legal_suffix(&lower) || ORG_KEYWORDS.contains(lower.as_str())
        });

        if has_org_keyword {
            Some(EntityLabel::Org)
        } else if JURISDICTIONS.contains(normalized.as_str()) {
            Some(EntityLabel::Gpe)
        } else if run.iter().any(Token::is_connector) || run.len() >= 4 {
            Some(EntityLabel::Org)
        } else if run.len() == 1 && run[0].is_acronym() {
            Some(EntityLabel::Org)
        } else if run.len() >= 2 && run.iter().all(Token::is_title_word) {
            Some(EntityLabel::Person)
        } else if run.len() >= 2 {
            Some(EntityLabel::Org)
        } else {
            None
        }
    }
}

fn overlaps(taken: &[ExtractedEntity], start: usize, end: usize) -> bool {
    taken.iter().any(|e| !(end <= e.start || start >= e.end))
}

fn push_matches(text: &str, pattern: &Regex, label: EntityLabel, out: &mut Vec<ExtractedEntity>) {
    for m in pattern.find_iter(text) {
        if !overlaps(out, m.start(), m.end()) {
            out.push(ExtractedEntity {
                text: m.as_str().trim().to_string(),
                label,
                start: m.start(),
                end: m.end(),
            });
        }
    }
}

impl EntityRecognizer for PatternRecognizer {
    fn name(&self) -> &str {
        "pattern"
    }

    fn recognize(&self, text: &str) -> Vec<ExtractedEntity> {
        let mut entities = Vec::new();

        push_matches(text, &MONEY, EntityLabel::Money, &mut entities);
        push_matches(text, &DATE, EntityLabel::Date, &mut entities);

        let tokens = Self::tokenize(text);
        for run in Self::capitalised_runs(text, &tokens) {
            let (start, end) = (run[0].start, run[run.len() - 1].end);
            if overlaps(&entities, start, end) {
                continue;
            }
            if let Some(label) = Self::classify(run) {
                entities.push(ExtractedEntity {
                    text: text[start..end].to_string(),
                    label,
                    start,
                    end,
                });
            }
        }

        push_matches(text, &CARDINAL, EntityLabel::Cardinal, &mut entities);

        entities.sort_by_key(|e| e.start);
        entities
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(text: &str) -> Vec<(String, EntityLabel)> {
        PatternRecognizer::new()
            .recognize(text)
            .into_iter()
            .map(|e| (e.text, e.label))
            .collect()
    }

    #[test]
    fn test_document_sentence() {
        assert_eq!(
            labels("Oceanic Holdings LLC made an offshore investment in Panama."),
            vec![
                ("Oceanic Holdings LLC".to_string(), EntityLabel::Org),
                ("Panama".to_string(), EntityLabel::Gpe),
            ]
        );
    }

    #[test]
    fn test_backend_name_as_trait_object() {
        let recognizer: &dyn EntityRecognizer = &PatternRecognizer::new();
        assert_eq!(recognizer.name(), "pattern");
    }

    #[test]
    fn test_connector_names() {
        assert_eq!(
            labels("Grant from Save the Children"),
            vec![("Save the Children".to_string(), EntityLabel::Org)]
        );
    }

    #[test]
    fn test_person_names() {
        assert_eq!(
            labels("Alas Chiricanas"),
            vec![("Alas Chiricanas".to_string(), EntityLabel::Person)]
        );
    }

    #[test]
    fn test_sentence_initial_word_dropped() {
        assert!(labels("Offshore investment").is_empty());
        assert!(labels("Payment for services rendered").is_empty());
    }

    #[test]
    fn test_leading_determiner_stripped() {
        assert_eq!(
            labels("The Global Health Foundation wired funds"),
            vec![("Global Health Foundation".to_string(), EntityLabel::Org)]
        );
    }

    #[test]
    fn test_multiword_jurisdiction_and_acronyms() {
        assert_eq!(labels("Cayman Islands"), vec![("Cayman Islands".to_string(), EntityLabel::Gpe)]);
        assert_eq!(labels("BVI"), vec![("BVI".to_string(), EntityLabel::Gpe)]);
        assert_eq!(labels("CCMI"), vec![("CCMI".to_string(), EntityLabel::Org)]);
    }

    #[test]
    fn test_punctuation_breaks_runs() {
        let found = labels("Acme Corp, Green Earth Org");
        assert_eq!(
            found,
            vec![
                ("Acme Corp".to_string(), EntityLabel::Org),
                ("Green Earth Org".to_string(), EntityLabel::Org),
            ]
        );
    }

    #[test]
    fn test_money_date_cardinal() {
        let found = labels("Paid $5,000,000 on 2024-03-01 in 3 tranches");
        assert_eq!(
            found,
            vec![
                ("$5,000,000".to_string(), EntityLabel::Money),
                ("2024-03-01".to_string(), EntityLabel::Date),
                ("3".to_string(), EntityLabel::Cardinal),
            ]
        );
    }

    #[test]
    fn test_month_names_inside_dates_not_names() {
        let found = labels("Settled on March 3, 2024");
        assert_eq!(found, vec![("March 3, 2024".to_string(), EntityLabel::Date)]);
    }

    #[test]
    fn test_transaction_ids_ignored() {
        assert!(labels("TXN001").is_empty());
    }
}
