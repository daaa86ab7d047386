//! Word wrapping for character-cell screens.

/// Iterator over `text` broken into lines of at most `width` characters
///
/// Breaks at the last space that fits, hard-splits words longer than a
/// line, and keeps explicit `\n` as line breaks (blank lines included).
#[derive(Debug, Clone)]
pub struct WordWrap<'a> {
    rest: &'a str,
    width: usize,
}

/// Wrap `text` to `width` columns
pub fn wrap(text: &str, width: usize) -> WordWrap<'_> {
    WordWrap {
        rest: text,
        width: width.max(1),
    }
}

impl<'a> Iterator for WordWrap<'a> {
    type Item = &'a str;

    fn next(&mut self) -> Option<&'a str> {
        if self.rest.is_empty() {
            return None;
        }
        let line_end = self.rest.find('\n').unwrap_or(self.rest.len());
        let line = &self.rest[..line_end];

        let Some((cut, cut_char)) = line.char_indices().nth(self.width) else {
            // Whole line fits
            self.rest = self.rest.get(line_end + 1..).unwrap_or("");
            return Some(line.trim_end());
        };

        // Include the first overflowing char so a space right at the limit
        // still counts as a break point
        let window = &line[..cut + cut_char.len_utf8()];
        match window.rfind(' ') {
            Some(space) if space > 0 => {
                let out = &line[..space];
                self.rest = self.rest[space..].trim_start_matches(' ');
                Some(out.trim_end())
            }
            _ => {
                let out = &line[..cut];
                self.rest = &self.rest[cut..];
                Some(out)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::vec::Vec;

    fn lines(text: &str, width: usize) -> Vec<&str> {
        wrap(text, width).collect()
    }

    #[test]
    fn test_wrap_at_spaces() {
        assert_eq!(
            lines("the quick brown fox jumps", 10),
            ["the quick", "brown fox", "jumps"]
        );
    }

    #[test]
    fn test_wrap_space_at_limit() {
        assert_eq!(lines("abcde fghij", 5), ["abcde", "fghij"]);
    }

    #[test]
    fn test_wrap_hard_splits_long_words() {
        assert_eq!(lines("abcdefghij", 4), ["abcd", "efgh", "ij"]);
    }

    #[test]
    fn test_wrap_keeps_newlines() {
        assert_eq!(lines("setup\n\ndelivery", 20), ["setup", "", "delivery"]);
        assert_eq!(lines("one\n", 20), ["one"]);
    }

    #[test]
    fn test_wrap_multibyte() {
        assert_eq!(lines("héllo wörld", 6), ["héllo", "wörld"]);
    }

    proptest! {
        #[test]
        fn prop_wrapped_lines_fit(text in "[a-z \n]{0,200}", width in 1usize..40) {
            for line in wrap(&text, width) {
                prop_assert!(line.chars().count() <= width);
            }
        }

        #[test]
        fn prop_wrap_preserves_words(text in "[a-z]{1,8}( [a-z]{1,8}){0,20}") {
            let joined: Vec<&str> = wrap(&text, 12).flat_map(|l| l.split(' ')).collect();
            let original: Vec<&str> = text.split(' ').collect();
            prop_assert_eq!(joined, original);
        }
    }
}
