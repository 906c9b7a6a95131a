//! Word lists that decide which web source a prompt is routed to.

pub const JOKE_WORDS: &[&str] = &[
    "joke", "jokes", "funny", "laugh", "humor", "humour", "pun", "puns",
];

/// Words that route a prompt to Open Library. They are also dropped from the
/// query sent there.
pub const BOOK_WORDS: &[&str] = &["book", "books", "novel", "novels", "author", "reading"];

pub const QUESTION_WORDS: &[&str] = &["who", "what", "where", "when", "which"];

/// Leading word sequences that ask for an encyclopedia lookup.
pub const TOPIC_PREFIXES: &[&[&str]] = &[&["tell", "me", "about"], &["define"]];
