//! Tag Tokenizer
//!
//! Splits HTML source into start tags, end tags, text, comments and
//! doctypes, stamping every token with the position of its first
//! character. It never fails: anything that does not look like markup is
//! text. Judging what the tags mean is up to the consumers.

use judge_dom::{Attribute, Position};

/// Elements whose content is raw text up to their own end tag
const RAW_TEXT_ELEMENTS: [&str; 2] = ["style", "script"];

/// One lexical item of an HTML document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub position: Position,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name attr=value>` or `<name/>`
    StartTag {
        name: String,
        attributes: Vec<Attribute>,
        self_closing: bool,
    },
    /// `</name>`
    EndTag { name: String },
    /// Character data between tags
    Text(String),
    /// `<!-- ... -->`, also used for `<?...>` and unknown `<!...>`
    Comment(String),
    /// `<!DOCTYPE name>`
    Doctype(String),
}

/// Streaming HTML tokenizer
pub struct Tokenizer<'a> {
    src: &'a str,
    /// Byte offset into `src`
    offset: usize,
    line: usize,
    column: usize,
    /// Set after a raw text start tag until its content has been emitted
    raw_text_end: Option<String>,
}

impl<'a> Tokenizer<'a> {
    pub fn new(src: &'a str) -> Self {
        Self {
            src,
            offset: 0,
            line: 0,
            column: 0,
            raw_text_end: None,
        }
    }

    fn position(&self) -> Position {
        Position::new(self.line, self.column)
    }

    fn rest(&self) -> &'a str {
        &self.src[self.offset..]
    }

    fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    fn peek_nth(&self, n: usize) -> Option<char> {
        self.rest().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.offset += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    /// Consume `n` bytes, keeping line/column in sync
    fn advance_bytes(&mut self, n: usize) {
        let end = (self.offset + n).min(self.src.len());
        while self.offset < end {
            if self.bump().is_none() {
                break;
            }
        }
    }

    fn eat(&mut self, s: &str) -> bool {
        if self.rest().starts_with(s) {
            self.advance_bytes(s.len());
            true
        } else {
            false
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    /// Consume characters while `pred` holds and return them
    fn take_while(&mut self, pred: impl Fn(char) -> bool) -> &'a str {
        let start = self.offset;
        while self.peek().is_some_and(&pred) {
            self.bump();
        }
        &self.src[start..self.offset]
    }

    /// Consume everything up to and including `terminator`; returns the
    /// text before it (or the rest of the input if it never appears)
    fn take_until(&mut self, terminator: &str) -> &'a str {
        let start = self.offset;
        match self.rest().find(terminator) {
            Some(idx) => {
                self.advance_bytes(idx);
                let text = &self.src[start..self.offset];
                self.advance_bytes(terminator.len());
                text
            }
            None => {
                self.advance_bytes(self.src.len() - start);
                &self.src[start..]
            }
        }
    }

    /// Does the input at the cursor start a markup construct?
    fn at_markup(&self) -> bool {
        if self.peek() != Some('<') {
            return false;
        }
        match self.peek_nth(1) {
            Some(c) if c.is_ascii_alphabetic() => true,
            Some('!') | Some('?') => true,
            Some('/') => self.peek_nth(2).is_some_and(|c| c.is_ascii_alphabetic()),
            _ => false,
        }
    }

    fn raw_text(&mut self, element: &str) -> Option<TokenKind> {
        let closing = format!("</{element}");
        let start = self.offset;
        // ASCII lowercasing keeps byte offsets intact
        let len = self
            .rest()
            .to_ascii_lowercase()
            .find(&closing)
            .unwrap_or(self.src.len() - start);
        self.advance_bytes(len);
        let text = &self.src[start..self.offset];
        (!text.is_empty()).then(|| TokenKind::Text(text.to_string()))
    }

    fn comment(&mut self) -> TokenKind {
        self.eat("<!--");
        TokenKind::Comment(self.take_until("-->").to_string())
    }

    fn declaration(&mut self) -> TokenKind {
        self.eat("<!");
        let body = self.take_until(">");
        let lower = body.to_ascii_lowercase();
        match lower.strip_prefix("doctype") {
            Some(name) => TokenKind::Doctype(name.trim().to_string()),
            None => TokenKind::Comment(body.to_string()),
        }
    }

    fn processing_instruction(&mut self) -> TokenKind {
        self.eat("<?");
        TokenKind::Comment(self.take_until(">").to_string())
    }

    fn end_tag(&mut self) -> TokenKind {
        self.eat("</");
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '>' && c != '/')
            .to_ascii_lowercase();
        self.take_until(">");
        TokenKind::EndTag { name }
    }

    fn start_tag(&mut self) -> TokenKind {
        self.eat("<");
        let name = self
            .take_while(|c| !c.is_whitespace() && c != '>' && c != '/')
            .to_ascii_lowercase();
        let mut attributes: Vec<Attribute> = Vec::new();
        let mut self_closing = false;

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => break,
                Some('>') => {
                    self.bump();
                    break;
                }
                Some('/') => {
                    self.bump();
                    if self.peek() == Some('>') {
                        self.bump();
                        self_closing = true;
                        break;
                    }
                    continue;
                }
                Some(_) => {}
            }

            let attr_name = self
                .take_while(|c| !c.is_whitespace() && !matches!(c, '=' | '>' | '/'))
                .to_ascii_lowercase();
            if attr_name.is_empty() {
                // Stray '=' or similar, skip it
                self.bump();
                continue;
            }

            self.skip_whitespace();
            let mut value = String::new();
            if self.peek() == Some('=') {
                self.bump();
                self.skip_whitespace();
                match self.peek() {
                    Some(q @ ('"' | '\'')) => {
                        self.bump();
                        value = self.take_while(|c| c != q).to_string();
                        self.bump();
                    }
                    _ => {
                        value = self
                            .take_while(|c| !c.is_whitespace() && c != '>')
                            .to_string();
                    }
                }
            }

            // First occurrence wins, like browsers do
            if !attributes.iter().any(|a| a.name == attr_name) {
                attributes.push(Attribute { name: attr_name, value });
            }
        }

        if !self_closing && RAW_TEXT_ELEMENTS.contains(&name.as_str()) {
            self.raw_text_end = Some(name.clone());
        }

        TokenKind::StartTag { name, attributes, self_closing }
    }

    fn text(&mut self) -> TokenKind {
        let start = self.offset;
        // The current character is text even if it is a lone '<'
        self.bump();
        while self.peek().is_some() && !self.at_markup() {
            self.bump();
        }
        TokenKind::Text(self.src[start..self.offset].to_string())
    }
}

impl Iterator for Tokenizer<'_> {
    type Item = Token;

    fn next(&mut self) -> Option<Token> {
        if let Some(element) = self.raw_text_end.take() {
            let position = Tokenizer::position(self);
            if let Some(kind) = self.raw_text(&element) {
                return Some(Token { kind, position });
            }
        }

        let position = Tokenizer::position(self);
        self.peek()?;

        let kind = if self.rest().starts_with("<!--") {
            self.comment()
        } else if self.at_markup() {
            match self.peek_nth(1) {
                Some('/') => self.end_tag(),
                Some('!') => self.declaration(),
                Some('?') => self.processing_instruction(),
                _ => self.start_tag(),
            }
        } else {
            self.text()
        };

        Some(Token { kind, position })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(html: &str) -> Vec<TokenKind> {
        Tokenizer::new(html).map(|t| t.kind).collect()
    }

    fn start(name: &str, attrs: &[(&str, &str)], self_closing: bool) -> TokenKind {
        TokenKind::StartTag {
            name: name.to_string(),
            attributes: attrs
                .iter()
                .map(|(n, v)| Attribute { name: n.to_string(), value: v.to_string() })
                .collect(),
            self_closing,
        }
    }

    #[test]
    fn test_simple_document() {
        let tokens = kinds("<!DOCTYPE html><HTML lang='en'><p>Hi</p></html>");
        assert_eq!(
            tokens,
            vec![
                TokenKind::Doctype("html".into()),
                start("html", &[("lang", "en")], false),
                start("p", &[], false),
                TokenKind::Text("Hi".into()),
                TokenKind::EndTag { name: "p".into() },
                TokenKind::EndTag { name: "html".into() },
            ]
        );
    }

    #[test]
    fn test_attribute_forms() {
        let tokens = kinds(r#"<input type=text disabled value="a b" data-x = 'y'/>"#);
        assert_eq!(
            tokens,
            vec![start(
                "input",
                &[("type", "text"), ("disabled", ""), ("value", "a b"), ("data-x", "y")],
                true
            )]
        );
    }

    #[test]
    fn test_positions() {
        let tokens: Vec<Token> = Tokenizer::new("<div>\n  <span></span>\n</div>").collect();
        let span = tokens
            .iter()
            .find(|t| matches!(&t.kind, TokenKind::StartTag { name, .. } if name == "span"))
            .map(|t| t.position);
        assert_eq!(span, Some(Position::new(1, 2)));
        assert_eq!(tokens.last().map(|t| t.position), Some(Position::new(2, 0)));
    }

    #[test]
    fn test_comment_and_lone_angle_bracket() {
        let tokens = kinds("a < b<!-- <p> -->");
        assert_eq!(
            tokens,
            vec![TokenKind::Text("a < b".into()), TokenKind::Comment(" <p> ".into())]
        );
    }

    #[test]
    fn test_style_is_raw_text() {
        let tokens = kinds("<style>.a > p { color: red }</STYLE>");
        assert_eq!(
            tokens,
            vec![
                start("style", &[], false),
                TokenKind::Text(".a > p { color: red }".into()),
                TokenKind::EndTag { name: "style".into() },
            ]
        );
    }

    #[test]
    fn test_duplicate_attribute_keeps_first() {
        let tokens = kinds("<a href='x' HREF='y'>");
        assert_eq!(tokens, vec![start("a", &[("href", "x")], false)]);
    }
}
