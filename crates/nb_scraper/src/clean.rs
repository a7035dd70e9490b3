//! Normalization of extracted article text before storage.
//!
//! The cleaner guarantees two things: output is never empty (a fixed
//! placeholder substitutes for nothing-left) and never longer than
//! `MAX_CLEAN_CHARS` plus the ellipsis marker.

use lazy_static::lazy_static;
use regex::Regex;

use crate::filters::is_navigation;

pub const MAX_CLEAN_CHARS: usize = 1000;
pub const ELLIPSIS: &str = "...";
/// Substituted when cleaning leaves nothing usable.
pub const EMPTY_PLACEHOLDER: &str = "תוכן זמין בקישור המקורי";

/// Lines shorter than this carry no article prose.
const MIN_MEANINGFUL_CHARS: usize = 10;

/// Boilerplate phrase runs: each pattern removes from its anchor phrase
/// through a bounded run or to end of line.
const BOILERPLATE_PATTERNS: &[&str] = &[
    r"בחר פורום[\s\S]*?סקופים",
    r"נושא #\d+",
    r"ערכתי לאחרונה[^\n]*",
    r"חבר מתאריך[\s\S]*?ראה משוב",
    r"יום [^\n]*תשפ[^\n]*",
    "מנהל[\\s\\S]*?צל\"ש",
    r"ביקורת תקשורת[^\n]*",
    r"עיתונות זרה[^\n]*",
    r"הפורום האקסקלוסיבי[^\n]*",
    r"ביטקוין ומטבעות קריפטו[^\n]*",
    r"כושר ופיתוח גוף[^\n]*",
];

lazy_static! {
    static ref BOILERPLATE_RES: Vec<Regex> = BOILERPLATE_PATTERNS
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect();
    static ref URL_RE: Regex = Regex::new(r"https?://\S+").unwrap();
    static ref EXCESS_NEWLINES_RE: Regex = Regex::new(r"\n{3,}").unwrap();
    static ref BARE_TIME_RE: Regex = Regex::new(r"^\d{2}:\d{2}$").unwrap();
    static ref BARE_DATE_RE: Regex = Regex::new(r"^\d{2}\.\d{2}\.\d{2}$").unwrap();
    static ref HEBREW_WORD_RE: Regex = Regex::new(r"^[א-ת]+$").unwrap();
    static ref PUNCTUATION_RE: Regex = Regex::new(r#"^[,'"]+$"#).unwrap();
    static ref SEPARATOR_LINE_RE: Regex = Regex::new(r"^\s*[-=]+\s*$").unwrap();
}

fn keep_line(line: &str) -> bool {
    let trimmed = line.trim();
    if trimmed.chars().count() < MIN_MEANINGFUL_CHARS {
        return false;
    }
    if is_navigation(trimmed) {
        return false;
    }
    // Bare time/date tokens, single Hebrew words and pure punctuation are
    // leftover forum chrome.
    if BARE_TIME_RE.is_match(trimmed)
        || BARE_DATE_RE.is_match(trimmed)
        || HEBREW_WORD_RE.is_match(trimmed)
        || PUNCTUATION_RE.is_match(trimmed)
    {
        return false;
    }
    true
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Clean raw extracted body text for storage and display.
pub fn clean_content(raw: &str) -> String {
    let mut text = raw.to_string();
    for re in BOILERPLATE_RES.iter() {
        text = re.replace_all(&text, "").into_owned();
    }
    text = URL_RE.replace_all(&text, "").into_owned();
    text = EXCESS_NEWLINES_RE.replace_all(&text, "\n\n").into_owned();

    let mut lines: Vec<&str> = text.lines().filter(|l| keep_line(l)).collect();
    while lines.first().map_or(false, |l| SEPARATOR_LINE_RE.is_match(l)) {
        lines.remove(0);
    }
    while lines.last().map_or(false, |l| SEPARATOR_LINE_RE.is_match(l)) {
        lines.pop();
    }

    let joined = lines.join("\n");
    let mut cleaned = EXCESS_NEWLINES_RE
        .replace_all(joined.trim(), "\n\n")
        .into_owned();

    if cleaned.chars().count() > MAX_CLEAN_CHARS {
        cleaned = format!("{}{}", truncate_chars(&cleaned, MAX_CLEAN_CHARS), ELLIPSIS);
    }

    if cleaned.is_empty() {
        EMPTY_PLACEHOLDER.to_string()
    } else {
        cleaned
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SENTENCE: &str = "שר האוצר הציג הבוקר את תקציב המדינה המעודכן לשנה הקרובה";

    #[test]
    fn test_never_empty() {
        assert_eq!(clean_content(""), EMPTY_PLACEHOLDER);
        assert_eq!(clean_content("קצר"), EMPTY_PLACEHOLDER);
    }

    #[test]
    fn test_length_bound() {
        let long_input = format!("{}\n", SENTENCE).repeat(100);
        let cleaned = clean_content(&long_input);
        assert!(cleaned.chars().count() <= MAX_CLEAN_CHARS + ELLIPSIS.chars().count());
        assert!(cleaned.ends_with(ELLIPSIS));
    }

    #[test]
    fn test_short_input_not_truncated() {
        let cleaned = clean_content(SENTENCE);
        assert_eq!(cleaned, SENTENCE);
    }

    #[test]
    fn test_urls_removed() {
        let input = format!("{} https://example.com/some/path\n{}", SENTENCE, SENTENCE);
        let cleaned = clean_content(&input);
        assert!(!cleaned.contains("https://"));
    }

    #[test]
    fn test_bare_tokens_dropped() {
        let input = format!("09:39\n22.08.25\nמילה\n,,''\n{}", SENTENCE);
        assert_eq!(clean_content(&input), SENTENCE);
    }

    #[test]
    fn test_navigation_lines_dropped() {
        let input = format!("אל לובי הפורומים של האתר\n{}", SENTENCE);
        assert_eq!(clean_content(&input), SENTENCE);
    }

    #[test]
    fn test_excess_newlines_collapsed() {
        let input = format!("{}\n\n\n\n{}", SENTENCE, SENTENCE);
        let cleaned = clean_content(&input);
        assert!(!cleaned.contains("\n\n\n"));
    }
}
