/// Build the text blob an item is vectorized from: description, space-joined
/// tags, then the release year. Runs of whitespace collapse to one space and the
/// result is trimmed. Missing parts contribute nothing.
pub fn normalize_text(description: &str, tags: &[String], year: Option<i32>) -> String {
    let year = year.map(|y| y.to_string()).unwrap_or_default();
    let joined = format!("{} {} {}", description, tags.join(" "), year);
    joined.split_whitespace().collect::<Vec<_>>().join(" ")
}
