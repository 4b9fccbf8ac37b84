/// Paragraphs with this many characters or fewer (after trimming) are dropped.
pub const MIN_PARAGRAPH_CHARS: usize = 10;

/// Split on newlines, keep paragraphs longer than [`MIN_PARAGRAPH_CHARS`] and
/// join them with single spaces. `None` when nothing survives.
pub fn clean_paragraphs(text: &str) -> Option<String> {
    let kept: Vec<&str> = text
        .split('\n')
        .map(str::trim)
        .filter(|p| p.chars().count() > MIN_PARAGRAPH_CHARS)
        .collect();

    if kept.is_empty() {
        None
    } else {
        Some(kept.join(" "))
    }
}

/// First sentence, in document order, that contains `answer` verbatim.
pub fn find_context<'a, S: AsRef<str>>(sentences: &'a [S], answer: &str) -> Option<&'a str> {
    sentences
        .iter()
        .map(AsRef::as_ref)
        .find(|sentence| sentence.contains(answer))
}
