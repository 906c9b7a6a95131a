//! Turns web source JSON into Markdown-ready replies.
//!
//! Lines are joined with `<br>` because the chat front end renders the reply
//! as Markdown inside a single bubble.

use serde_json::Value;

use crate::domain::keywords::BOOK_WORDS;

const STOPWORDS: &[&str] = &[
    "what", "who", "where", "when", "is", "are", "the", "a", "an", "of", "in", "on", "was",
    "were", "tell", "me", "about",
];

const WIKIPEDIA_ATTRIBUTION: &str = "*(Information from Wikipedia, CC BY-SA 3.0)*";
const OPEN_LIBRARY_ATTRIBUTION: &str = "*(Information from Open Library, Free & Open API)*";

/// Lowercases, strips everything but ASCII letters, digits, parentheses and
/// whitespace, and drops stopwords.
fn topic_words(prompt: &str) -> Vec<String> {
    let cleaned: String = prompt
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '(' || *c == ')' || c.is_whitespace())
        .collect();

    cleaned
        .split_whitespace()
        .filter(|w| !STOPWORDS.contains(w))
        .map(str::to_string)
        .collect()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Builds a Wikipedia page title such as `Alan_Turing` from a prompt.
pub fn sanitize_prompt_for_wiki(prompt: &str) -> String {
    topic_words(prompt)
        .iter()
        .map(|w| capitalize(w))
        .collect::<Vec<_>>()
        .join("_")
}

/// Builds an Open Library search query, leaving out the words that made the
/// prompt a book request.
pub fn sanitize_prompt_for_books(prompt: &str) -> String {
    let words = topic_words(prompt);
    let specific: Vec<&str> = words
        .iter()
        .map(String::as_str)
        .filter(|w| !BOOK_WORDS.contains(w))
        .collect();

    if specific.is_empty() {
        words.join(" ")
    } else {
        specific.join(" ")
    }
}

fn text<'a>(value: &'a Value, pointer: &str) -> &'a str {
    match value.pointer(pointer) {
        Some(Value::String(s)) => s.as_str(),
        _ => "",
    }
}

/// Renders a Wikipedia REST summary. `None` when the page has no extract.
pub fn format_wikipedia_summary(topic: &str, root: &Value) -> Option<String> {
    let extract = text(root, "/extract");
    if extract.trim().is_empty() {
        return None;
    }

    let mut result = String::from(extract);

    let image_url = text(root, "/originalimage/source");
    if !image_url.trim().is_empty() {
        result.push_str(&format!("<br>![{topic}]({image_url})"));
    }

    let page_url = text(root, "/content_urls/desktop/page");
    if !page_url.trim().is_empty() {
        result.push_str(&format!("<br>Source: [Wikipedia Article]({page_url})"));
    }

    result.push_str("<br>");
    result.push_str(WIKIPEDIA_ATTRIBUTION);
    Some(result)
}

/// Renders a JokeAPI response of type `single` or `twopart`.
pub fn format_joke(root: &Value) -> Option<String> {
    match text(root, "/type") {
        "single" => root
            .get("joke")
            .and_then(Value::as_str)
            .map(str::to_string),
        "twopart" => Some(format!(
            "{}<br>{}",
            text(root, "/setup"),
            text(root, "/delivery")
        )),
        _ => None,
    }
}

/// Numbers and strings both show up for years and cover ids.
fn scalar(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

/// Renders the first document of an Open Library search response.
pub fn format_book(root: &Value, cover_base_url: &str) -> Option<String> {
    let book = root.get("docs")?.as_array()?.first()?;

    let title = text(book, "/title");
    if title.trim().is_empty() {
        return None;
    }

    let author = book
        .get("author_name")
        .and_then(Value::as_array)
        .and_then(|authors| authors.first())
        .and_then(Value::as_str)
        .unwrap_or("");
    let year = scalar(book.get("first_publish_year"));
    let cover_id = scalar(book.get("cover_i"));
    let work_key = text(book, "/key");

    let mut result = format!("### {title}");

    if !author.trim().is_empty() {
        result.push_str(&format!("<br>**Author:** {author}"));
    }

    if !year.is_empty() {
        result.push_str(&format!("<br>**First Published:** {year}"));
    }

    if !cover_id.is_empty() {
        result.push_str(&format!(
            "<br>![{title} Cover]({cover_base_url}{cover_id}-L.jpg)"
        ));
    }

    if !work_key.trim().is_empty() {
        result.push_str(&format!(
            "<br>Source: [Open Library](https://openlibrary.org{work_key})"
        ));
    }

    result.push_str("<br>");
    result.push_str(OPEN_LIBRARY_ATTRIBUTION);
    Some(result)
}
