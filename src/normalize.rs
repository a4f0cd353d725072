//! Location text normalization and province extraction.
//!
//! `normalize` produces a comparison key only; it is never shown to users.
//! `extract_province` is a best-effort heuristic and never fails: an
//! unrecognizable location degrades to a guess instead of dropping the record.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Words that follow a province name in free-text locations
/// ("Marmaris Açıkları", "Gökova Körfezi", "Ege Bölgesi").
const PROVINCE_SUFFIXES: &[&str] = &["ili", "ilcesi", "bolgesi", "korfezi", "aciklari"];

/// High-frequency provinces and their spelling variants, matched against
/// normalized text. First match wins, so more specific entries go first.
const PROVINCE_PATTERNS: &[(&[&str], &str)] = &[
    (&["istanbul", "ist.", "ist-"], "İstanbul"),
    (&["izmir", "izm."], "İzmir"),
    (&["ankara", "ank."], "Ankara"),
    (&["mugla"], "Muğla"),
    (&["manisa"], "Manisa"),
    (&["balikesir"], "Balıkesir"),
    (&["canakkale"], "Çanakkale"),
    (&["bursa"], "Bursa"),
    (&["antalya"], "Antalya"),
    (&["aydin"], "Aydın"),
    (&["kahramanmaras", "k.maras", "k. maras"], "Kahramanmaraş"),
    (&["malatya"], "Malatya"),
    (&["elazig"], "Elazığ"),
    (&["hatay"], "Hatay"),
    (&["denizli"], "Denizli"),
    (&["kutahya"], "Kütahya"),
    (&["duzce"], "Düzce"),
    (&["kocaeli", "izmit"], "Kocaeli"),
];

static RE_INNER_PARENS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\(([^()]*)\)").expect("static regex"));
static RE_IST_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\bist\b").expect("static regex"));
static RE_TOKEN_SPLIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\s\-]+").expect("static regex"));

/// Lowercase, strip diacritics and fold the Turkish-specific letters to ASCII.
pub fn normalize(text: &str) -> String {
    text.to_lowercase()
        .nfd()
        .filter(|c| !('\u{0300}'..='\u{036f}').contains(c))
        .map(|c| match c {
            'ı' => 'i',
            'ğ' => 'g',
            'ü' => 'u',
            'ş' => 's',
            'ö' => 'o',
            'ç' => 'c',
            other => other,
        })
        .collect()
}

/// Best-effort province name for a free-text location.
///
/// Returns `None` only for empty input.
pub fn extract_province(location: &str) -> Option<String> {
    let location = location.trim();
    if location.is_empty() {
        return None;
    }

    if let Some(province) = parenthesized(location) {
        return Some(province);
    }

    let normalized = normalize(location);
    if let Some(province) = known_province(&normalized) {
        return Some(province.to_string());
    }

    let tokens: Vec<&str> = RE_TOKEN_SPLIT
        .split(location)
        .filter(|t| !t.is_empty())
        .collect();

    if let Some(province) = before_suffix_keyword(&tokens) {
        return Some(province);
    }

    if let Some(last) = tokens.last() {
        if last.chars().count() > 2 {
            return Some(last.to_string());
        }
    }
    if let Some(first) = tokens.first() {
        return Some(first.to_string());
    }

    Some(location.to_string())
}

/// Text of the last innermost `( ... )` group, if non-empty.
fn parenthesized(location: &str) -> Option<String> {
    RE_INNER_PARENS
        .captures_iter(location)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str().trim())
        .filter(|s| !s.is_empty())
        .last()
        .map(str::to_string)
}

fn known_province(normalized: &str) -> Option<&'static str> {
    if RE_IST_WORD.is_match(normalized) {
        return Some("İstanbul");
    }
    PROVINCE_PATTERNS
        .iter()
        .find(|(patterns, _)| patterns.iter().any(|p| normalized.contains(p)))
        .map(|(_, name)| *name)
}

fn before_suffix_keyword(tokens: &[&str]) -> Option<String> {
    let idx = tokens
        .iter()
        .position(|t| PROVINCE_SUFFIXES.contains(&normalize(t).as_str()))?;
    if idx == 0 {
        return None;
    }
    let candidate = tokens[..idx].join(" ");
    (candidate.chars().count() > 2).then_some(candidate)
}
