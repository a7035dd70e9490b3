//! Fixed phrase tables shared by the extractor and the cleaner.
//!
//! The stop markers matter more than selector coverage: missing one leaks
//! reader replies into the article body, an overly broad one truncates real
//! content. Both tables come straight from observed forum chrome.

/// Phrases that mark the start of reply/thread content. Body collection
/// stops at the first line containing any of these.
pub const STOP_MARKERS: &[&str] = &[
    "תגובה עם ציטוט",
    "האשכול",
    "מחבר",
    "תאריך כתיבה",
    "ציטוט:",
    "תגובה:",
    "משתמש:",
    "הודעה:",
    "פורום:",
    "בחר פורום",
    "בית המדרש",
    "סקופים",
    "אשכול מספר",
];

/// Forum navigation and boilerplate keywords; a line containing any of them
/// is dropped.
pub const NAVIGATION_KEYWORDS: &[&str] = &[
    "בית המדרש",
    "הרגע קניתי",
    "בני ה-20",
    "סקופים",
    "אשכול מספר",
    "בחר פורום",
    "נושא #",
    "חבר מתאריך",
    "הודעות",
    "מדרגים",
    "נקודות",
    "ראה משוב",
    "מנהל",
    "סגן המנהל",
    "מפקח",
    "עיתונאי",
    "צל\"ש",
    "כותרות",
    "שעה",
    "הכותב",
    "אל לובי",
    "החופשה הבאה",
    "לוח שנה עברי",
    "Downloads",
    "שיתוף",
    "מוזיקה",
    "סרטים",
    "צילום",
    "מוטוריקה",
    "לובי",
    "חופשה",
    "Booking.com",
    "Kiwi",
    "Skyscanner",
    "TripAdvisor",
    "גירסת הדפסה",
    "קבוצות דיון",
    "אל לובי הפורומים",
    "החופשה הבאה שלך מתחילה כאן",
    "--------",
    "ביקורת תקשורת",
    "עיתונות זרה",
    "הפורום האקסקלוסיבי",
    "ביטקוין ומטבעות קריפטו",
    "כושר ופיתוח גוף",
];

pub fn is_navigation(line: &str) -> bool {
    NAVIGATION_KEYWORDS.iter().any(|kw| line.contains(kw))
}

pub fn is_stop_marker(line: &str) -> bool {
    STOP_MARKERS.iter().any(|m| line.contains(m))
}
