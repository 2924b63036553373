//! Top-level outline of a script
//!
//! Splits script text into top-level statements without interpreting them.
//! Strings, comments and nested delimiters are tracked so that a statement
//! only ends at a newline or `;` outside of any bracket.

use crate::{
    error::{Error, Result},
    types::{Location, ScriptSource},
};
use regex::Regex;
use std::sync::LazyLock;

static METHOD_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^def\s+([A-Za-z_][A-Za-z0-9_]*)\s*\(").expect("valid method regex")
});

/// The `{ ... }` body of a block statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub text: String,
    /// Position of the first character after the opening brace
    pub location: Location,
}

/// A single top-level statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    head: String,
    text: String,
    location: Location,
    body: Option<Body>,
    is_block: bool,
    method_name: Option<String>,
}

impl Statement {
    /// Leading identifier of the statement, empty when it starts with something else
    pub fn head(&self) -> &str {
        &self.head
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn body(&self) -> Option<&Body> {
        self.body.as_ref()
    }

    /// `name { ... }` or `name(args) { ... }`
    pub fn is_block(&self) -> bool {
        self.is_block
    }

    /// Name of the method when the statement is a `def name(...) { ... }` declaration
    pub fn method_name(&self) -> Option<&str> {
        self.method_name.as_deref()
    }
}

/// Outline the top-level statements of a script
pub fn parse(source: &ScriptSource) -> Result<Vec<Statement>> {
    Outliner::new(source).run()
}

struct Outliner<'a> {
    source: &'a ScriptSource,
    line: u32,
    column: u32,
    statements: Vec<Statement>,
    start: Option<(usize, Location)>,
    body_start: Option<(usize, Location)>,
    body_end: Option<usize>,
    /// Byte offset just past the last character of the current statement
    /// that is neither whitespace nor part of a comment
    code_end: usize,
}

impl<'a> Outliner<'a> {
    fn new(source: &'a ScriptSource) -> Self {
        Self {
            source,
            line: 1,
            column: 1,
            statements: Vec::new(),
            start: None,
            body_start: None,
            body_end: None,
            code_end: 0,
        }
    }

    fn advance(&mut self, c: char) {
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
    }

    fn here(&self) -> Location {
        Location::new(self.line, self.column)
    }

    fn error(&self, location: Location, message: impl Into<String>) -> Error {
        Error::compile(self.source.display_name(), Some(location), message)
    }

    fn begin(&mut self, idx: usize, location: Location) {
        if self.start.is_none() {
            self.start = Some((idx, location));
        }
    }

    fn run(mut self) -> Result<Vec<Statement>> {
        let source = self.source;
        let text = source.text();
        let mut chars = text.char_indices().peekable();
        let mut stack: Vec<(char, Location)> = Vec::new();

        while let Some((idx, c)) = chars.next() {
            let here = self.here();
            self.advance(c);

            match c {
                '/' if matches!(chars.peek(), Some((_, '/'))) => {
                    while let Some((_, next)) = chars.peek() {
                        if *next == '\n' {
                            break;
                        }
                        let next = *next;
                        chars.next();
                        self.advance(next);
                    }
                }
                '/' if matches!(chars.peek(), Some((_, '*'))) => {
                    let mut previous = '/';
                    let mut closed = false;
                    for (_, next) in chars.by_ref() {
                        self.advance(next);
                        if previous == '*' && next == '/' {
                            closed = true;
                            break;
                        }
                        // the opening '*' must not close the comment
                        previous = if previous == '/' && next == '*' { ' ' } else { next };
                    }
                    if !closed {
                        return Err(self.error(here, "unterminated comment"));
                    }
                }
                '"' | '\'' => {
                    self.begin(idx, here);
                    let mut escaped = false;
                    let mut closed = false;
                    for (next_idx, next) in chars.by_ref() {
                        self.advance(next);
                        if escaped {
                            escaped = false;
                        } else if next == '\\' {
                            escaped = true;
                        } else if next == c {
                            self.code_end = next_idx + next.len_utf8();
                            closed = true;
                            break;
                        }
                    }
                    if !closed {
                        return Err(self.error(here, "unterminated string literal"));
                    }
                }
                '\n' | ';' if stack.is_empty() => self.finish(text),
                '(' | '[' | '{' => {
                    self.begin(idx, here);
                    self.code_end = idx + 1;
                    if c == '{' && stack.is_empty() && self.body_start.is_none() {
                        self.body_start = Some((idx + 1, self.here()));
                    }
                    stack.push((c, here));
                }
                ')' | ']' | '}' => {
                    self.code_end = idx + 1;
                    let expected = opening_for(c);
                    match stack.pop() {
                        None => {
                            return Err(self.error(here, format!("unexpected '{c}'")));
                        }
                        Some((open, _)) if open != expected => {
                            return Err(self.error(
                                here,
                                format!("expected '{}' but found '{c}'", closing_for(open)),
                            ));
                        }
                        Some(_) => {
                            if c == '}'
                                && stack.is_empty()
                                && self.body_start.is_some()
                                && self.body_end.is_none()
                            {
                                self.body_end = Some(idx);
                            }
                        }
                    }
                }
                c if c.is_whitespace() => {}
                _ => {
                    self.begin(idx, here);
                    self.code_end = idx + c.len_utf8();
                }
            }
        }

        if let Some((open, location)) = stack.last() {
            return Err(self.error(*location, format!("unclosed '{open}'")));
        }
        self.finish(text);
        Ok(self.statements)
    }

    fn finish(&mut self, text: &str) {
        let body_start = self.body_start.take();
        let body_end = self.body_end.take();
        let Some((start, location)) = self.start.take() else {
            return;
        };

        // trailing comments are not part of the statement
        let end = self.code_end.max(start);
        let statement_text = &text[start..end];
        let head = leading_identifier(statement_text).to_string();

        let body = match (body_start, body_end) {
            (Some((from, body_location)), Some(to)) => Some((from, to, body_location)),
            _ => None,
        };

        let is_block = body.is_some_and(|(from, to, _)| {
            let between = text[start + head.len()..from - 1].trim();
            let after = text[to + 1..end].trim();
            !head.is_empty()
                && after.is_empty()
                && (between.is_empty() || (between.starts_with('(') && between.ends_with(')')))
        });

        let method_name = if head == "def" && body.is_some() {
            METHOD_DECLARATION
                .captures(statement_text)
                .map(|captures| captures[1].to_string())
        } else {
            None
        };

        self.statements.push(Statement {
            head,
            text: statement_text.to_string(),
            location,
            body: body.map(|(from, to, body_location)| Body {
                text: text[from..to].to_string(),
                location: body_location,
            }),
            is_block,
            method_name,
        });
    }
}

fn leading_identifier(text: &str) -> &str {
    let mut end = 0;
    for (idx, c) in text.char_indices() {
        let valid = if idx == 0 {
            c.is_ascii_alphabetic() || c == '_' || c == '$'
        } else {
            c.is_ascii_alphanumeric() || c == '_' || c == '$'
        };
        if !valid {
            break;
        }
        end = idx + c.len_utf8();
    }
    &text[..end]
}

fn opening_for(close: char) -> char {
    match close {
        ')' => '(',
        ']' => '[',
        _ => '{',
    }
}

fn closing_for(open: char) -> char {
    match open {
        '(' => ')',
        '[' => ']',
        _ => '}',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outline(text: &str) -> Result<Vec<Statement>> {
        parse(&ScriptSource::inline("build.script", text))
    }

    #[test]
    fn test_splits_top_level_statements() {
        let statements = outline(
            "plugins {\n    id(\"a\")\n}\n\nversion = '1.0'\ntask('hello') {\n  println 'x'\n}\n",
        )
        .unwrap();

        assert_eq!(statements.len(), 3);
        assert_eq!(statements[0].head(), "plugins");
        assert!(statements[0].is_block());
        assert_eq!(statements[0].location(), Location::new(1, 1));
        assert_eq!(statements[1].head(), "version");
        assert!(!statements[1].is_block());
        assert_eq!(statements[1].location(), Location::new(5, 1));
        assert_eq!(statements[2].head(), "task");
        assert!(statements[2].is_block());
    }

    #[test]
    fn test_block_body_and_location() {
        let statements = outline("  buildscript {\n    classpath 'a:b:1'\n  }").unwrap();
        let body = statements[0].body().unwrap();
        assert_eq!(statements[0].location(), Location::new(1, 3));
        assert_eq!(body.location, Location::new(1, 16));
        assert_eq!(body.text, "\n    classpath 'a:b:1'\n  ");
    }

    #[test]
    fn test_semicolons_and_comments() {
        let statements = outline("a = 1; b = 2 // trailing\n/* block\ncomment */ c()\n").unwrap();
        let heads: Vec<_> = statements.iter().map(|s| s.head()).collect();
        assert_eq!(heads, vec!["a", "b", "c"]);
        assert_eq!(statements[2].location(), Location::new(3, 12));
    }

    #[test]
    fn test_trailing_comments_after_block() {
        let statements =
            outline("plugins {\n    id 'x'\n} // lint\nmodel {\n} /* rules */\nprintln 'hi' // done\n")
                .unwrap();

        assert_eq!(statements.len(), 3);
        assert!(statements[0].is_block());
        assert_eq!(statements[0].text(), "plugins {\n    id 'x'\n}");
        assert!(statements[1].is_block());
        assert_eq!(statements[1].text(), "model {\n}");
        assert_eq!(statements[2].text(), "println 'hi'");
    }

    #[test]
    fn test_delimiters_inside_strings_are_ignored() {
        let statements = outline("println \"{ not a block (\"\nx = '}'\n").unwrap();
        assert_eq!(statements.len(), 2);
        assert!(!statements[0].is_block());
    }

    #[test]
    fn test_method_declaration() {
        let statements = outline("def greet(name) {\n  println name\n}\n").unwrap();
        assert_eq!(statements[0].method_name(), Some("greet"));
        assert!(!statements[0].is_block());

        let statements = outline("def x = 1\n").unwrap();
        assert_eq!(statements[0].method_name(), None);
    }

    #[test]
    fn test_block_with_arguments() {
        let statements = outline("configure(subprojects) {\n}\nfoo { }.bar()\n").unwrap();
        assert!(statements[0].is_block());
        assert!(!statements[1].is_block());
    }

    #[test]
    fn test_unclosed_brace() {
        let err = outline("plugins {\n  id 'a'\n").unwrap_err();
        assert_eq!(err.location(), Some(Location::new(1, 9)));
        assert!(err.to_string().contains("unclosed '{'"));
    }

    #[test]
    fn test_unexpected_closing() {
        let err = outline("a()\n}\n").unwrap_err();
        assert_eq!(err.location(), Some(Location::new(2, 1)));
        assert!(err.to_string().contains("unexpected '}'"));
    }

    #[test]
    fn test_mismatched_closing() {
        let err = outline("foo(\n]").unwrap_err();
        assert!(err.to_string().contains("expected ')' but found ']'"));
        assert_eq!(err.location(), Some(Location::new(2, 1)));
    }

    #[test]
    fn test_unterminated_string() {
        let err = outline("x = \"abc\n").unwrap_err();
        assert_eq!(err.location(), Some(Location::new(1, 5)));
        assert!(err.to_string().contains("unterminated string literal"));
    }

    #[test]
    fn test_unterminated_comment() {
        let err = outline("a()\n/* open").unwrap_err();
        assert_eq!(err.location(), Some(Location::new(2, 1)));
    }

    #[test]
    fn test_empty_script() {
        assert!(outline("").unwrap().is_empty());
        assert!(outline("\n// only a comment\n\n").unwrap().is_empty());
    }
}
