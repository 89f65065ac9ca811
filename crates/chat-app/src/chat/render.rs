use std::sync::LazyLock;

use regex::Regex;

static URL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"https?://\S+").expect("URL pattern should compile"));

/// Piece of turn text, either plain or a bare link.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextSegment<'a> {
    Plain(&'a str),
    Link(&'a str),
}

/// Splits `text` into plain runs and `http(s)://` links, in order.
pub fn split_links(text: &str) -> Vec<TextSegment<'_>> {
    let mut segments = Vec::new();
    let mut cursor = 0;

    for found in URL_PATTERN.find_iter(text) {
        if found.start() > cursor {
            segments.push(TextSegment::Plain(&text[cursor..found.start()]));
        }
        segments.push(TextSegment::Link(found.as_str()));
        cursor = found.end();
    }

    if cursor < text.len() {
        segments.push(TextSegment::Plain(&text[cursor..]));
    }

    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn links_are_split_out_in_order() {
        let segments = split_links("Watch https://www.youtube.com/@ghostplays90 and http://a now");
        assert_eq!(
            segments,
            vec![
                TextSegment::Plain("Watch "),
                TextSegment::Link("https://www.youtube.com/@ghostplays90"),
                TextSegment::Plain(" and "),
                TextSegment::Link("http://a"),
                TextSegment::Plain(" now"),
            ]
        );
    }

    #[test]
    fn text_without_links_is_one_segment() {
        assert_eq!(split_links("no links"), vec![TextSegment::Plain("no links")]);
        assert!(split_links("").is_empty());
    }
}
