//! Retrieval gate — decides whether a message warrants a knowledge lookup.
//!
//! Pure keyword heuristic over the raw user text. Information-seeking
//! messages (questions, purchase intent, product mentions, in German or
//! English) trigger retrieval; social messages ("thanks!", "hello")
//! skip it, saving an embedding call per turn.

/// German question words and intent phrases.
const GERMAN_INDICATORS: &[&str] = &[
    "was",
    "wie",
    "warum",
    "wo",
    "wann",
    "welche",
    "welcher",
    "welches",
    "ich brauche",
    "ich suche",
    "suche nach",
    "zeig mir",
    "zeige mir",
    "empfehlung",
    "empfiehl",
    "kaufen",
    "möchte",
    "will haben",
    "gibt es",
    "haben sie",
    "können sie",
    "kannst du",
];

/// English question words and intent phrases.
const ENGLISH_INDICATORS: &[&str] = &[
    "what",
    "how",
    "why",
    "where",
    "when",
    "which",
    "who",
    "i need",
    "i want",
    "looking for",
    "show me",
    "recommend",
    "buy",
    "purchase",
    "do you have",
    "can you",
    "is there",
];

/// Product and tech domain words.
const PRODUCT_INDICATORS: &[&str] = &[
    "laptop",
    "smartphone",
    "tablet",
    "monitor",
    "computer",
    "gaming",
    "programming",
    "tech",
    "device",
    "machine",
    "electronic",
    "homeoffice",
];

/// Whether the message should trigger knowledge retrieval.
///
/// Deterministic: a question mark anywhere, or any indicator substring
/// in the lowercased text.
pub fn needs_retrieval(user_text: &str) -> bool {
    if user_text.contains('?') {
        return true;
    }

    let lower = user_text.to_lowercase();
    let lower = lower.trim();

    GERMAN_INDICATORS.iter().any(|w| lower.contains(w))
        || ENGLISH_INDICATORS.iter().any(|w| lower.contains(w))
        || PRODUCT_INDICATORS.iter().any(|w| lower.contains(w))
}
