//! Word list for baget lines.

/// Tokens drawn for each word slot. Lowercase; the generator uppercases
/// the whole text afterwards.
#[rustfmt::skip]
pub static WORDS: &[&str] = &[
    "i", "you", "he", "we", "they", "me", "my", "your", "mom", "dad",
    "cat", "dog", "boss", "friend", "teacher", "neighbor", "bus", "train", "home", "school",
    "work", "shop", "kitchen", "window", "door", "bed", "tea", "coffee", "soup", "bread",
    "go", "come", "see", "say", "ask", "wait", "run", "sit", "sleep", "eat",
    "drink", "buy", "lose", "find", "call", "open", "close", "forget", "remember", "cry",
    "laugh", "again", "never", "always", "suddenly", "slowly", "quietly", "late", "early", "now",
    "then", "why", "how", "what", "where", "and", "but", "so", "not", "just",
    "already", "still", "tomorrow", "yesterday", "monday", "money", "phone", "rain", "snow", "night",
];
