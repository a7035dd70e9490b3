//! Prompt templates for the four pipeline stages. The pipeline targets
//! Hebrew-language political coverage, so the prompts are Hebrew.

/// Stage 1: is this a politically or socially contested topic at all?
pub fn relevance(title: &str, content: &str) -> String {
    format!(
        "אתה עיתונאי ישראלי מנוסה. קרא את הכתבה הבאה וענה בקצרה:\n\n\
         1. האם זה נושא פוליטי או חברתי שנוי במחלוקת בישראל?\n\
         2. אם כן - מה סוג המחלוקת?\n\
         3. אם לא - מה קטגוריית הכתבה?\n\n\
         שים לב: משלים כמו \"כדור השלג\" או \"משחקי כוח\" הם בדרך כלל פוליטיים, לא ספורט.\n\n\
         ענה בקצרה - עד 50 מילים.\n\n\
         כותרת: {title}\n\
         תוכן: {content}\n"
    )
}

/// Stage 2: web research with explicit sourcing requirements.
pub fn research(topic: &str, summary: &str) -> String {
    format!(
        "חשוב מאוד: בצע חיפוש מעמיק באינטרנט על הנושא הזה עכשיו!\n\n\
         חפש בעברית:\n\
         1. \"{topic}\"\n\
         2. \"{topic} + מחלוקת\"\n\
         3. \"{topic} + עמדות שונות\"\n\n\
         חובה למצוא:\n\
         - לפחות 3 מקורות שונים\n\
         - דעות מנוגדות מהתקשורת הישראלית\n\
         - הצהרות רשמיות אם יש\n\n\
         אם לא מוצא מידע נוסף - כתוב במפורש \"לא מצאתי מידע נוסף\"\n\n\
         נושא: {topic}\n\
         מידע ראשוני: {summary}\n"
    )
}

/// Intensified retry used once when the research result fails the quality
/// gate.
pub fn research_retry(topic: &str) -> String {
    format!("בצע חיפוש מעמיק יותר על: {topic}. חובה למצוא מקורות אמיתיים!")
}

/// Stage 3: balanced analysis folding the research into the original text.
pub fn technical_analysis(original: &str, findings: &str) -> String {
    format!(
        "כתוב ניתוח מאוזן תוך שילוב המחקר:\n\n\
         כתוב כתבה עיתונאית זורמת וקריאה שתכלול את כל המידע החשוב מהמחקר, \
         אבל בלי כותרות משנה או חלוקה לסעיפים. הכתבה צריכה להיות טקסט רציף וזורם שכולל:\n\n\
         - פתיח שמציג את המחלוקת\n\
         - עובדות מוסכמות\n\
         - הצגת כל הצדדים\n\
         - מה שחסר מהדיווח\n\
         - הקשר רחב\n\
         - סיכום מאוזן\n\n\
         חשוב: אל תכתוב כותרות כמו \"כותרת אובייקטיבית\", \"פתיח\", \"עובדות מוסכמות\" וכו'. \
         כתוב טקסט רציף וזורם.\n\n\
         טקסט מקורי: {original}\n\
         ממצאי מחקר: {findings}\n"
    )
}

/// Stage 4: turn the technical analysis into a readable article.
pub fn journalistic_rewrite(analysis: &str) -> String {
    format!(
        "הפך את הניתוח הטכני הזה לכתבה עיתונאית זורמת וקריאה:\n\n\
         - שפה עיתונאית נעימה\n\
         - מעברים חלקים\n\
         - ללא ביטויים טכניים\n\
         - מעניינת לקורא הממוצע\n\
         - טקסט רציף וזורם בלי כותרות משנה או חלוקה לסעיפים\n\n\
         חשוב: אל תכתוב כותרות כמו \"כותרת אובייקטיבית\", \"פתיח\", \"עובדות מוסכמות\", \
         \"הצגת כל הצדדים\", \"מה שחסר מהדיווח\", \"הקשר רחב\", \"סיכום מאוזן\". \
         כתוב טקסט רציף וזורם.\n\n\
         ניתוח טכני: {analysis}\n"
    )
}
