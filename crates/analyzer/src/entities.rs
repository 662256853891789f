use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Pattern-based entity mention, tallied across the document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    pub text: String,
    pub kind: EntityKind,
    pub mentions: usize,
    /// Mentions over document word count.
    pub density: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// Capitalized multi-word span ("Liebherr Group").
    ProperNoun,
    /// Alphanumeric product code ("LTM-11200").
    ProductCode,
    /// Comma-joined location phrase ("Hamburg, Germany").
    Location,
}

static PRODUCT_CODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z]{2,}-?\d{2,}[A-Za-z0-9-]*\b").expect("product code regex"));

static LOCATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zäöü]+(?:\s[A-Z][a-zäöü]+)*,\s[A-Z][a-zäöü]+\b")
        .expect("location regex")
});

static PROPER_NOUN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b[A-Z][a-zäöü]+(?:\s[A-Z][a-zäöü]+)+\b").expect("proper noun regex")
});

/// Extract entity mentions by pattern. Product codes win over locations,
/// locations over plain capitalized spans, so a span is reported once.
#[must_use]
pub fn extract_entities(text: &str, word_count: usize) -> Vec<Entity> {
    if text.trim().is_empty() || word_count == 0 {
        return Vec::new();
    }

    let mut claimed: Vec<(usize, usize)> = Vec::new();
    let mut tally: HashMap<(String, EntityKind), usize> = HashMap::new();

    let passes: [(&Regex, EntityKind); 3] = [
        (&PRODUCT_CODE, EntityKind::ProductCode),
        (&LOCATION, EntityKind::Location),
        (&PROPER_NOUN, EntityKind::ProperNoun),
    ];

    for (pattern, kind) in passes {
        for m in pattern.find_iter(text) {
            let span = (m.start(), m.end());
            if claimed
                .iter()
                .any(|&(s, e)| span.0 < e && s < span.1)
            {
                continue;
            }
            claimed.push(span);
            *tally.entry((m.as_str().to_string(), kind)).or_insert(0) += 1;
        }
    }

    let mut entities: Vec<Entity> = tally
        .into_iter()
        .map(|((text, kind), mentions)| Entity {
            density: mentions as f64 / word_count as f64,
            text,
            kind,
            mentions,
        })
        .collect();

    entities.sort_by(|a, b| b.mentions.cmp(&a.mentions).then_with(|| a.text.cmp(&b.text)));
    entities
}
