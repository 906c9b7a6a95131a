//! Prompt classification deciding which web source to consult.

use crate::domain::WebSearchType;
use crate::domain::keywords::{BOOK_WORDS, JOKE_WORDS, QUESTION_WORDS, TOPIC_PREFIXES};

/// Classifies a prompt. Precedence is joke, book, encyclopedia, other.
pub fn classify_prompt(prompt: &str) -> WebSearchType {
    let lowered = prompt.trim().to_lowercase();
    let words: Vec<&str> = lowered
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    if words.iter().any(|w| JOKE_WORDS.contains(w)) {
        return WebSearchType::Joke;
    }

    if words.iter().any(|w| BOOK_WORDS.contains(w)) {
        return WebSearchType::Book;
    }

    let asks_question = words.first().is_some_and(|w| QUESTION_WORDS.contains(w));
    if asks_question || TOPIC_PREFIXES.iter().any(|&prefix| words.starts_with(prefix)) {
        return WebSearchType::Wiki;
    }

    WebSearchType::Other
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_joke_prompts() {
        assert_eq!(classify_prompt("Tell me a funny joke."), WebSearchType::Joke);
        assert_eq!(classify_prompt("Make me LAUGH"), WebSearchType::Joke);
    }

    #[test]
    fn test_book_prompts() {
        assert_eq!(
            classify_prompt("I want a book recommendation."),
            WebSearchType::Book
        );
        assert_eq!(classify_prompt("Novels by Tolkien"), WebSearchType::Book);
    }

    #[test]
    fn test_wiki_prompts() {
        assert_eq!(classify_prompt("Who was Alan Turing?"), WebSearchType::Wiki);
        assert_eq!(classify_prompt("what is Rust"), WebSearchType::Wiki);
        assert_eq!(classify_prompt("Tell me about Norway"), WebSearchType::Wiki);
        assert_eq!(classify_prompt("  define entropy"), WebSearchType::Wiki);
    }

    #[test]
    fn test_other_prompts() {
        assert_eq!(classify_prompt("Explain gravity."), WebSearchType::Other);
        assert_eq!(classify_prompt(""), WebSearchType::Other);
        assert_eq!(classify_prompt("?!"), WebSearchType::Other);
    }

    #[test]
    fn test_joke_wins_over_book_and_question() {
        assert_eq!(
            classify_prompt("What is the funniest book joke?"),
            WebSearchType::Joke
        );
        assert_eq!(classify_prompt("Who wrote this book?"), WebSearchType::Book);
    }

    #[test]
    fn test_keywords_match_whole_words_only() {
        // "bookkeeping" and "punch" must not trigger
        assert_eq!(classify_prompt("Explain bookkeeping"), WebSearchType::Other);
        assert_eq!(classify_prompt("Punch the clock"), WebSearchType::Other);
    }

    #[test]
    fn test_topic_prefixes_match_leading_words() {
        assert_eq!(
            classify_prompt("Defined benefit plans are boring"),
            WebSearchType::Other
        );
        assert_eq!(classify_prompt("Tell me aboutness"), WebSearchType::Other);
        assert_eq!(classify_prompt("Define: entropy"), WebSearchType::Wiki);
    }
}
