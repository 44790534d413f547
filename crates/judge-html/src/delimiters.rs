//! Delimiter Balance Scanner
//!
//! Single pass over raw submission text checking that every `(`, `<`, `{`,
//! `[`, `'` and `"` is closed in the right order. Delimiters inside HTML
//! (`<!-- -->`) and CSS (`/* */`) comments do not count, and inside an open
//! quote only the same quote character means anything.

use judge_dom::Position;

use crate::error::{DelimiterError, DelimiterErrorKind, DelimiterErrors};

/// Opening delimiter and the character that closes it
const PAIRS: [(char, char); 6] = [
    ('(', ')'),
    ('<', '>'),
    ('{', '}'),
    ('[', ']'),
    ('\'', '\''),
    ('"', '"'),
];

/// Comment start and end markers
const COMMENTS: [(&str, &str); 2] = [("<!--", "-->"), ("/*", "*/")];

fn closer_of(open: char) -> Option<char> {
    PAIRS.iter().find(|(o, _)| *o == open).map(|(_, c)| *c)
}

fn is_opening(ch: char) -> bool {
    PAIRS.iter().any(|(o, _)| *o == ch)
}

fn is_closing(ch: char) -> bool {
    PAIRS.iter().any(|(_, c)| *c == ch)
}

fn is_quote(ch: char) -> bool {
    ch == '\'' || ch == '"'
}

/// Comment currently being skipped
struct OpenComment {
    opener: &'static str,
    closer: &'static str,
    position: Position,
    /// Byte offset right after the opener
    body_start: usize,
}

/// Checks that brackets and quotes are balanced.
///
/// One scan at a time per instance; state is reset on every call.
#[derive(Debug, Default)]
pub struct DelimiterScanner {
    stack: Vec<(char, Position)>,
}

impl DelimiterScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget the state of the previous scan
    pub fn reset(&mut self) {
        self.stack.clear();
    }

    /// Scan `text`; fails with every unmatched delimiter, sorted by position
    pub fn validate(&mut self, text: &str) -> Result<(), DelimiterErrors> {
        self.reset();
        let mut errors = Vec::new();
        let mut comment: Option<OpenComment> = None;
        let mut line = 0;
        let mut column = 0;

        for (offset, ch) in text.char_indices() {
            let position = Position::new(line, column);
            if ch == '\n' {
                line += 1;
                column = 0;
            } else {
                column += 1;
            }

            if let Some(open) = &comment {
                let end = offset + ch.len_utf8();
                if end >= open.body_start + open.closer.len()
                    && text[open.body_start..end].ends_with(open.closer)
                {
                    comment = None;
                }
                continue;
            }

            // Inside a quote only the matching quote matters
            if let Some(&(top, _)) = self.stack.last() {
                if is_quote(top) {
                    if ch == top {
                        self.stack.pop();
                    }
                    continue;
                }
            }

            if let Some(&(opener, closer)) = COMMENTS
                .iter()
                .find(|(opener, _)| text[offset..].starts_with(opener))
            {
                comment = Some(OpenComment {
                    opener,
                    closer,
                    position,
                    body_start: offset + opener.len(),
                });
                continue;
            }

            let closes_top = self
                .stack
                .last()
                .and_then(|&(top, _)| closer_of(top))
                .is_some_and(|expected| expected == ch);
            if closes_top {
                self.stack.pop();
            } else if is_opening(ch) || is_closing(ch) {
                self.stack.push((ch, position));
            }
        }

        if let Some(open) = comment {
            errors.push(DelimiterError {
                kind: DelimiterErrorKind::MissingClosing,
                delimiter: open.opener.to_string(),
                position: open.position,
            });
        }

        for (ch, position) in self.stack.drain(..) {
            let kind = if is_opening(ch) {
                DelimiterErrorKind::MissingClosing
            } else {
                DelimiterErrorKind::MissingOpening
            };
            errors.push(DelimiterError { kind, delimiter: ch.to_string(), position });
        }

        if errors.is_empty() {
            Ok(())
        } else {
            tracing::debug!(count = errors.len(), "unbalanced delimiters");
            Err(DelimiterErrors::new(errors))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scan(text: &str) -> Result<(), DelimiterErrors> {
        DelimiterScanner::new().validate(text)
    }

    fn kinds(text: &str) -> Vec<(DelimiterErrorKind, String, Position)> {
        match scan(text) {
            Ok(()) => Vec::new(),
            Err(errors) => errors
                .iter()
                .map(|e| (e.kind, e.delimiter.clone(), e.position))
                .collect(),
        }
    }

    #[test]
    fn test_balanced() {
        for text in [
            "",
            "<>",
            "()",
            "{([])}",
            "{()}[[{}]]",
            "[[[[]][]]][[][]]",
            "({(test)})",
            "<html><head><meta charset='UTF-8'></head></html>",
            r#"<meta http-equiv="Content-Type" content="text/html; charset=utf-8">"#,
        ] {
            assert!(scan(text).is_ok(), "{text:?} should be balanced");
        }
    }

    #[test]
    fn test_missing_opening() {
        for text in [")", ">", "}", "]", ")((", "} test {", "({}))", "{([})}"] {
            assert!(scan(text).is_err(), "{text:?} should be unbalanced");
        }
        assert_eq!(
            kinds("a)"),
            vec![(DelimiterErrorKind::MissingOpening, ")".to_string(), Position::new(0, 1))]
        );
    }

    #[test]
    fn test_missing_closing_single() {
        assert_eq!(
            kinds("x\n  (()"),
            vec![(DelimiterErrorKind::MissingClosing, "(".to_string(), Position::new(1, 2))]
        );
        for text in ["(", "<", "{", "[", "'", "\"", "((", "{{()}", "<html><</html>"] {
            assert!(scan(text).is_err(), "{text:?} should be unbalanced");
        }
    }

    #[test]
    fn test_comments_are_skipped() {
        assert!(scan("<!--\n function displayMsg) {\n alert\"Hello\")\n//-->").is_ok());
        assert!(scan("p { color: red; /* ) ] } */ }").is_ok());
        assert!(scan("<!---->").is_ok());
    }

    #[test]
    fn test_unclosed_comment() {
        assert_eq!(
            kinds("<p></p>\n<!-- (("),
            vec![(DelimiterErrorKind::MissingClosing, "<!--".to_string(), Position::new(1, 0))]
        );
    }

    #[test]
    fn test_quotes_hide_other_delimiters() {
        assert!(scan("<html lang='bi\"boe(ba'>").is_ok());
        assert!(scan("<html lang='bi\"boe)ba'>").is_ok());
        assert!(scan("<p title=\"it's\"></p>").is_ok());
    }

    #[test]
    fn test_errors_sorted_by_position() {
        let errors = kinds("} {\n(");
        let positions: Vec<_> = errors.iter().map(|(_, _, p)| *p).collect();
        assert_eq!(positions, vec![Position::new(0, 0), Position::new(0, 2), Position::new(1, 0)]);
        assert_eq!(errors[0].0, DelimiterErrorKind::MissingOpening);
        assert_eq!(errors[2].0, DelimiterErrorKind::MissingClosing);
    }

    #[test]
    fn test_fresh_scans_agree() {
        let text = "<div>(</div>\n[x";
        assert_eq!(kinds(text), kinds(text));
    }
}
