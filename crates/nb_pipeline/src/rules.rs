//! Relevance decision rules.
//!
//! Stage 1 is a keyword veto, not a positive classifier: a model response
//! naming any of the vetoed categories marks the item not relevant, anything
//! else passes. Ambiguous responses therefore default to relevant, a
//! deliberate bias toward over-inclusion.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Sports,
    Entertainment,
    Business,
    Routine,
    Economic,
}

/// Category keywords the relevance stage vetoes on. Kept as a named table
/// so the policy can change without touching control flow.
pub const VETO_KEYWORDS: &[(&str, Category)] = &[
    ("ספורט", Category::Sports),
    ("בידור", Category::Entertainment),
    ("עסקים", Category::Business),
    ("שגרתי", Category::Routine),
    ("כלכלי", Category::Economic),
];

/// First vetoed category mentioned in a relevance response, if any.
pub fn veto_category(response: &str) -> Option<Category> {
    VETO_KEYWORDS
        .iter()
        .find(|(keyword, _)| response.contains(keyword))
        .map(|(_, category)| *category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sports_response_is_vetoed() {
        assert_eq!(veto_category("זהו נושא ספורטיבי"), Some(Category::Sports));
    }

    #[test]
    fn test_political_response_passes() {
        assert_eq!(veto_category("נושא פוליטי שנוי במחלוקת"), None);
    }

    #[test]
    fn test_economic_response_is_vetoed() {
        assert_eq!(
            veto_category("מדובר בדיווח כלכלי שגרתי"),
            Some(Category::Routine)
        );
    }
}
