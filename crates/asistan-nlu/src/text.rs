//! Case and diacritic folding for Turkish input.
//!
//! Users type the same word as "Yarın", "YARIN" or "yarin" depending on their
//! keyboard, so matching runs on a folded copy: lowercase with the Turkish
//! dotted/dotless I handled and Turkish letters mapped to ASCII. Keyword lists
//! are written in folded form. The folded copy keeps a byte map back into the
//! original so a span matched in folded text can be cut out of the original.

use std::ops::Range;

#[derive(Debug, Clone)]
pub struct Folded {
    text: String,
    /// `origin[i]` is the byte offset in the original of folded byte `i`.
    /// Has one extra trailing entry equal to the original length.
    origin: Vec<usize>,
}

impl Folded {
    pub fn new(original: &str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut origin = Vec::with_capacity(original.len() + 1);

        for (idx, ch) in original.char_indices() {
            let before = text.len();
            push_folded(ch, &mut text);
            origin.extend(std::iter::repeat(idx).take(text.len() - before));
        }
        origin.push(original.len());

        Self { text, origin }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Map a byte range of the folded text to the matching range of the original.
    pub fn original_range(&self, range: Range<usize>) -> Range<usize> {
        let start = self.origin[range.start.min(self.text.len())];
        let end = self.origin[range.end.min(self.text.len())];
        start..end
    }

    /// Keyword appears at the start of a word (Turkish suffixes may follow).
    pub fn has_prefix_word(&self, keyword: &str) -> bool {
        contains_word(&self.text, keyword, false)
    }

    /// Keyword appears as a complete word.
    pub fn has_whole_word(&self, keyword: &str) -> bool {
        contains_word(&self.text, keyword, true)
    }

    pub fn hits(&self, keywords: &[&'static str]) -> Vec<&'static str> {
        keywords
            .iter()
            .copied()
            .filter(|kw| self.has_prefix_word(kw))
            .collect()
    }

    pub fn any_prefix(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.has_prefix_word(kw))
    }

    pub fn any_whole(&self, keywords: &[&str]) -> bool {
        keywords.iter().any(|kw| self.has_whole_word(kw))
    }
}

fn push_folded(ch: char, out: &mut String) {
    let mapped = match ch {
        'İ' | 'I' | 'ı' | 'î' | 'Î' => 'i',
        'Ş' | 'ş' => 's',
        'Ğ' | 'ğ' => 'g',
        'Ü' | 'ü' | 'û' | 'Û' => 'u',
        'Ö' | 'ö' => 'o',
        'Ç' | 'ç' => 'c',
        'Â' | 'â' => 'a',
        other => {
            out.extend(other.to_lowercase());
            return;
        }
    };
    out.push(mapped);
}

/// Fold a string without keeping the offset map.
pub fn fold(text: &str) -> String {
    Folded::new(text).text
}

fn is_word_char(ch: char) -> bool {
    ch.is_alphanumeric()
}

fn contains_word(haystack: &str, keyword: &str, whole: bool) -> bool {
    if keyword.is_empty() {
        return false;
    }
    haystack.match_indices(keyword).any(|(pos, _)| {
        let starts_word = haystack[..pos]
            .chars()
            .next_back()
            .map_or(true, |c| !is_word_char(c));
        let ends_word = !whole
            || haystack[pos + keyword.len()..]
                .chars()
                .next()
                .map_or(true, |c| !is_word_char(c));
        starts_word && ends_word
    })
}

/// Collapse runs of whitespace into single spaces and trim.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `range` from `text` and collapse the whitespace left behind.
pub fn remove_span(text: &str, range: Range<usize>) -> String {
    let joined = format!("{} {}", &text[..range.start], &text[range.end..]);
    collapse_whitespace(&joined)
}

/// Truncate to at most `max` characters.
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fold_turkish_letters() {
        assert_eq!(fold("YARIN Saat"), "yarin saat");
        assert_eq!(fold("İşlem Ödedim Çağrı"), "islem odedim cagri");
        assert_eq!(fold("350.000 TL"), "350.000 tl");
    }

    #[test]
    fn test_original_range_survives_multibyte_letters() {
        let original = "Yarın saat 14:30 toplantı";
        let folded = Folded::new(original);
        let start = folded.as_str().find("14:30").unwrap();
        let range = folded.original_range(start..start + 5);
        assert_eq!(&original[range], "14:30");
    }

    #[test]
    fn test_prefix_word_matching() {
        let folded = Folded::new("Galeri kirasını ödedim");
        assert!(folded.has_prefix_word("kira"));
        assert!(folded.has_prefix_word("odedim"));
        assert!(!folded.has_prefix_word("eri"));
    }

    #[test]
    fn test_whole_word_matching() {
        let folded = Folded::new("evet bu ay ev kirası");
        assert!(folded.has_whole_word("ay"));
        assert!(folded.has_whole_word("ev"));
        assert!(!Folded::new("evet ayrıca").any_whole(&["ev", "ay"]));
    }

    #[test]
    fn test_remove_span_collapses_whitespace() {
        let text = "yarın saat 14:30   toplantı";
        assert_eq!(remove_span(text, 0..17), "toplantı");
        assert_eq!(remove_span("a  b  c", 3..4), "a c");
    }

    #[test]
    fn test_truncate_chars_counts_characters() {
        assert_eq!(truncate_chars("çğüşöı", 3), "çğü");
        assert_eq!(truncate_chars("abc", 10), "abc");
    }
}
