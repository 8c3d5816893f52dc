//! Lexer that splits template source into items.
//!
//! Text outside the delimiters is emitted verbatim. Inside a delimiter pair the
//! lexer recognizes the action language: fields, variables, literals, keywords
//! and punctuation. A `-` next to a delimiter and separated from the action
//! body by whitespace trims the adjacent text.

use crate::pos::{LineIndex, Pos};

const LEFT_COMMENT: &str = "/*";
const RIGHT_COMMENT: &str = "*/";
const TRIM_MARKER: u8 = b'-';
/// A trim marker plus the whitespace that separates it from the action.
const TRIM_MARKER_LEN: usize = 2;

/// Delimiters that open and close an action.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Delims {
    /// Opening delimiter.
    pub left: String,
    /// Closing delimiter.
    pub right: String,
}

impl Delims {
    /// The opening delimiter used when none is configured.
    pub const DEFAULT_LEFT: &'static str = "{{";
    /// The closing delimiter used when none is configured.
    pub const DEFAULT_RIGHT: &'static str = "}}";

    /// Create a delimiter pair. An empty string selects the default for that side.
    #[must_use]
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        let mut left = left.into();
        let mut right = right.into();
        if left.is_empty() {
            left = Self::DEFAULT_LEFT.to_string();
        }
        if right.is_empty() {
            right = Self::DEFAULT_RIGHT.to_string();
        }
        Self { left, right }
    }
}

impl Default for Delims {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LEFT, Self::DEFAULT_RIGHT)
    }
}

/// Kind of a lexer item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Lexing error; the value holds the message.
    Error,
    /// `true` or `false`.
    Bool,
    /// Printable ASCII character not otherwise recognized (e.g. `,`).
    Char,
    /// Character constant such as `'a'`.
    CharConstant,
    /// Comment text, including the `/*` and `*/` markers.
    Comment,
    /// `=`
    Assign,
    /// `:=`
    Declare,
    /// End of input.
    Eof,
    /// Field access such as `.Name`.
    Field,
    /// Function name.
    Identifier,
    /// Opening delimiter.
    LeftDelim,
    /// `(`
    LeftParen,
    /// Numeric literal.
    Number,
    /// `|`
    Pipe,
    /// Raw string such as `` `abc` ``.
    RawString,
    /// Closing delimiter.
    RightDelim,
    /// `)`
    RightParen,
    /// Run of whitespace inside an action.
    Space,
    /// Quoted string, including the quotes.
    String,
    /// Plain text outside actions.
    Text,
    /// Variable such as `$` or `$name`.
    Variable,
    /// `block` keyword.
    Block,
    /// `break` keyword.
    Break,
    /// `continue` keyword.
    Continue,
    /// `.` on its own.
    Dot,
    /// `define` keyword.
    Define,
    /// `else` keyword.
    Else,
    /// `end` keyword.
    End,
    /// `if` keyword.
    If,
    /// `nil` keyword.
    Nil,
    /// `range` keyword.
    Range,
    /// `template` keyword.
    Template,
    /// `with` keyword.
    With,
}

impl ItemKind {
    /// Whether this item is a keyword.
    #[must_use]
    pub const fn is_keyword(self) -> bool {
        matches!(
            self,
            Self::Block
                | Self::Break
                | Self::Continue
                | Self::Dot
                | Self::Define
                | Self::Else
                | Self::End
                | Self::If
                | Self::Nil
                | Self::Range
                | Self::Template
                | Self::With
        )
    }

    fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "." => Self::Dot,
            "block" => Self::Block,
            "break" => Self::Break,
            "continue" => Self::Continue,
            "define" => Self::Define,
            "else" => Self::Else,
            "end" => Self::End,
            "if" => Self::If,
            "range" => Self::Range,
            "nil" => Self::Nil,
            "template" => Self::Template,
            "with" => Self::With,
            _ => return None,
        })
    }
}

/// A token produced by the lexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Item {
    /// The item kind.
    pub kind: ItemKind,
    /// Where the item starts.
    pub pos: Pos,
    /// The source text of the item, or the message for an error item.
    pub val: String,
}

impl std::fmt::Display for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.kind {
            ItemKind::Eof => f.write_str("EOF"),
            ItemKind::Error => f.write_str(&self.val),
            kind if kind.is_keyword() => write!(f, "<{}>", self.val),
            _ if self.val.chars().count() > 10 => {
                let head: String = self.val.chars().take(10).collect();
                write!(f, "{head:?}...")
            }
            _ => write!(f, "{:?}", self.val),
        }
    }
}

/// Lex the whole input. The last item is always `Eof` or `Error`.
#[must_use]
pub fn lex(input: &str, delims: &Delims) -> Vec<Item> {
    let mut lexer = Lexer {
        input,
        left: &delims.left,
        right: &delims.right,
        lines: LineIndex::new(input),
        start: 0,
        pos: 0,
        width: 0,
        paren_depth: 0,
        items: Vec::new(),
    };
    let mut state = State::Text;
    while state != State::Done {
        state = lexer.step(state);
    }
    lexer.items
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Text,
    LeftDelim,
    Comment,
    RightDelim,
    InsideAction,
    Space,
    Identifier,
    Field,
    Variable,
    Char,
    Quote,
    RawQuote,
    Number,
    Done,
}

struct Lexer<'a> {
    input: &'a str,
    left: &'a str,
    right: &'a str,
    lines: LineIndex,
    start: usize,
    pos: usize,
    width: usize,
    paren_depth: i32,
    items: Vec<Item>,
}

impl Lexer<'_> {
    fn step(&mut self, state: State) -> State {
        match state {
            State::Text => self.lex_text(),
            State::LeftDelim => self.lex_left_delim(),
            State::Comment => self.lex_comment(),
            State::RightDelim => self.lex_right_delim(),
            State::InsideAction => self.lex_inside_action(),
            State::Space => self.lex_space(),
            State::Identifier => self.lex_identifier(),
            State::Field => self.lex_field_or_variable(ItemKind::Field),
            State::Variable => self.lex_field_or_variable(ItemKind::Variable),
            State::Char => self.lex_char(),
            State::Quote => self.lex_quote(),
            State::RawQuote => self.lex_raw_quote(),
            State::Number => self.lex_number(),
            State::Done => State::Done,
        }
    }

    fn next(&mut self) -> Option<char> {
        let c = self.input[self.pos..].chars().next()?;
        self.width = c.len_utf8();
        self.pos += self.width;
        Some(c)
    }

    /// Step back over the last character returned by `next`. Only valid once per `next`.
    fn backup(&mut self) {
        self.pos -= self.width;
        self.width = 0;
    }

    fn peek(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn accept(&mut self, valid: &str) -> bool {
        match self.peek() {
            Some(c) if valid.contains(c) => {
                self.next();
                true
            }
            _ => false,
        }
    }

    fn accept_run(&mut self, valid: &str) {
        while self.accept(valid) {}
    }

    fn emit(&mut self, kind: ItemKind) {
        self.items.push(Item {
            kind,
            pos: self.lines.pos(self.start),
            val: self.input[self.start..self.pos].to_string(),
        });
        self.start = self.pos;
    }

    fn ignore(&mut self) {
        self.start = self.pos;
    }

    fn error(&mut self, message: impl Into<String>) -> State {
        self.items.push(Item {
            kind: ItemKind::Error,
            pos: self.lines.pos(self.start),
            val: message.into(),
        });
        State::Done
    }

    fn lex_text(&mut self) -> State {
        if let Some(x) = self.input[self.pos..].find(self.left) {
            if x > 0 {
                self.pos += x;
                let delim_end = self.pos + self.left.len();
                let trim_len = if has_left_trim_marker(&self.input[delim_end..]) {
                    right_trim_length(&self.input[self.start..self.pos])
                } else {
                    0
                };
                self.pos -= trim_len;
                if self.pos > self.start {
                    self.emit(ItemKind::Text);
                }
                self.pos += trim_len;
                self.ignore();
            }
            return State::LeftDelim;
        }
        self.pos = self.input.len();
        if self.pos > self.start {
            self.emit(ItemKind::Text);
        }
        self.emit(ItemKind::Eof);
        State::Done
    }

    fn lex_left_delim(&mut self) -> State {
        self.pos += self.left.len();
        let trim_space = has_left_trim_marker(&self.input[self.pos..]);
        let after_marker = if trim_space { TRIM_MARKER_LEN } else { 0 };
        if self.input[self.pos + after_marker..].starts_with(LEFT_COMMENT) {
            self.pos += after_marker;
            self.ignore();
            return State::Comment;
        }
        self.emit(ItemKind::LeftDelim);
        self.pos += after_marker;
        self.ignore();
        self.paren_depth = 0;
        State::InsideAction
    }

    fn lex_comment(&mut self) -> State {
        self.pos += LEFT_COMMENT.len();
        let Some(x) = self.input[self.pos..].find(RIGHT_COMMENT) else {
            return self.error("unclosed comment");
        };
        self.pos += x + RIGHT_COMMENT.len();
        let (delim, trim_space) = self.at_right_delim();
        if !delim {
            return self.error("comment ends before closing delimiter");
        }
        self.emit(ItemKind::Comment);
        if trim_space {
            self.pos += TRIM_MARKER_LEN;
        }
        self.pos += self.right.len();
        if trim_space {
            self.pos += left_trim_length(&self.input[self.pos..]);
        }
        self.ignore();
        State::Text
    }

    fn lex_right_delim(&mut self) -> State {
        let (_, trim_space) = self.at_right_delim();
        if trim_space {
            self.pos += TRIM_MARKER_LEN;
            self.ignore();
        }
        self.pos += self.right.len();
        self.emit(ItemKind::RightDelim);
        if trim_space {
            self.pos += left_trim_length(&self.input[self.pos..]);
            self.ignore();
        }
        State::Text
    }

    /// Reports whether the input continues with a closing delimiter, and
    /// whether that delimiter carries a trim marker.
    fn at_right_delim(&self) -> (bool, bool) {
        let rest = &self.input[self.pos..];
        if has_right_trim_marker(rest) && rest[TRIM_MARKER_LEN..].starts_with(self.right) {
            return (true, true);
        }
        (rest.starts_with(self.right), false)
    }

    fn lex_inside_action(&mut self) -> State {
        let (delim, _) = self.at_right_delim();
        if delim {
            if self.paren_depth == 0 {
                return State::RightDelim;
            }
            return self.error("unclosed left paren");
        }
        match self.next() {
            None => self.error("unclosed action"),
            Some(c) if is_space(c) => {
                self.backup();
                State::Space
            }
            Some('=') => {
                self.emit(ItemKind::Assign);
                State::InsideAction
            }
            Some(':') => {
                if self.next() != Some('=') {
                    return self.error("expected :=");
                }
                self.emit(ItemKind::Declare);
                State::InsideAction
            }
            Some('|') => {
                self.emit(ItemKind::Pipe);
                State::InsideAction
            }
            Some('"') => State::Quote,
            Some('`') => State::RawQuote,
            Some('$') => State::Variable,
            Some('\'') => State::Char,
            Some('.') => match self.peek() {
                Some(c) if !c.is_ascii_digit() => State::Field,
                // A '.' followed by a digit, or at the end, starts a number.
                _ => {
                    self.backup();
                    State::Number
                }
            },
            Some('+' | '-' | '0'..='9') => {
                self.backup();
                State::Number
            }
            Some(c) if is_alphanumeric(c) => {
                self.backup();
                State::Identifier
            }
            Some('(') => {
                self.emit(ItemKind::LeftParen);
                self.paren_depth += 1;
                State::InsideAction
            }
            Some(')') => {
                self.emit(ItemKind::RightParen);
                self.paren_depth -= 1;
                if self.paren_depth < 0 {
                    return self.error("unexpected right paren");
                }
                State::InsideAction
            }
            Some(c) if c.is_ascii() && !c.is_ascii_control() => {
                self.emit(ItemKind::Char);
                State::InsideAction
            }
            Some(c) => self.error(format!("unrecognized character in action: {}", describe(c))),
        }
    }

    fn lex_space(&mut self) -> State {
        let mut num_spaces = 0;
        while self.peek().is_some_and(is_space) {
            self.next();
            num_spaces += 1;
        }
        // A trim-marked closing delimiter has a minus after a space.
        if has_right_trim_marker(&self.input[self.pos - 1..])
            && self.input[self.pos - 1 + TRIM_MARKER_LEN..].starts_with(self.right)
        {
            self.pos -= 1;
            if num_spaces == 1 {
                return State::RightDelim;
            }
        }
        self.emit(ItemKind::Space);
        State::InsideAction
    }

    fn lex_identifier(&mut self) -> State {
        loop {
            match self.next() {
                Some(c) if is_alphanumeric(c) => {}
                last => {
                    if last.is_some() {
                        self.backup();
                    }
                    if !self.at_terminator() {
                        return self.bad_character(last);
                    }
                    let word = &self.input[self.start..self.pos];
                    let kind = match ItemKind::keyword(word) {
                        Some(keyword) => keyword,
                        None if word.starts_with('.') => ItemKind::Field,
                        None if word == "true" || word == "false" => ItemKind::Bool,
                        None => ItemKind::Identifier,
                    };
                    self.emit(kind);
                    return State::InsideAction;
                }
            }
        }
    }

    /// Lex a field or variable; the leading `.` or `$` has been consumed.
    fn lex_field_or_variable(&mut self, kind: ItemKind) -> State {
        if self.at_terminator() {
            self.emit(if kind == ItemKind::Variable {
                ItemKind::Variable
            } else {
                ItemKind::Dot
            });
            return State::InsideAction;
        }
        let last = loop {
            match self.next() {
                Some(c) if is_alphanumeric(c) => {}
                last => {
                    if last.is_some() {
                        self.backup();
                    }
                    break last;
                }
            }
        };
        if !self.at_terminator() {
            return self.bad_character(last);
        }
        self.emit(kind);
        State::InsideAction
    }

    fn bad_character(&mut self, c: Option<char>) -> State {
        let described = c.map(describe).unwrap_or_default();
        self.error(format!("bad character {described}"))
    }

    /// Whether the next character can legally follow an identifier, field or variable.
    fn at_terminator(&self) -> bool {
        match self.peek() {
            None => true,
            Some(c) if is_space(c) => true,
            Some('.' | ',' | '|' | ':' | ')' | '(') => true,
            Some(_) => self.input[self.pos..].starts_with(self.right),
        }
    }

    fn lex_char(&mut self) -> State {
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some(c) if c != '\n' => {}
                    _ => return self.error("unterminated character constant"),
                },
                None | Some('\n') => return self.error("unterminated character constant"),
                Some('\'') => break,
                Some(_) => {}
            }
        }
        self.emit(ItemKind::CharConstant);
        State::InsideAction
    }

    fn lex_quote(&mut self) -> State {
        loop {
            match self.next() {
                Some('\\') => match self.next() {
                    Some(c) if c != '\n' => {}
                    _ => return self.error("unterminated quoted string"),
                },
                None | Some('\n') => return self.error("unterminated quoted string"),
                Some('"') => break,
                Some(_) => {}
            }
        }
        self.emit(ItemKind::String);
        State::InsideAction
    }

    fn lex_raw_quote(&mut self) -> State {
        loop {
            match self.next() {
                None => return self.error("unterminated raw quoted string"),
                Some('`') => break,
                Some(_) => {}
            }
        }
        self.emit(ItemKind::RawString);
        State::InsideAction
    }

    fn lex_number(&mut self) -> State {
        if !self.scan_number() {
            let text = self.input[self.start..self.pos].to_string();
            return self.error(format!("bad number syntax: {text:?}"));
        }
        self.emit(ItemKind::Number);
        State::InsideAction
    }

    fn scan_number(&mut self) -> bool {
        const DECIMAL: &str = "0123456789_";
        const HEX: &str = "0123456789abcdefABCDEF_";
        self.accept("+-");
        let mut digits = DECIMAL;
        if self.accept("0") {
            if self.accept("xX") {
                digits = HEX;
            } else if self.accept("oO") {
                digits = "01234567_";
            } else if self.accept("bB") {
                digits = "01_";
            }
        }
        self.accept_run(digits);
        if self.accept(".") {
            self.accept_run(digits);
        }
        if digits == DECIMAL && self.accept("eE") {
            self.accept("+-");
            self.accept_run(DECIMAL);
        }
        if digits == HEX && self.accept("pP") {
            self.accept("+-");
            self.accept_run(DECIMAL);
        }
        if self.peek().is_some_and(is_alphanumeric) {
            self.next();
            return false;
        }
        true
    }
}

const fn is_space(c: char) -> bool {
    matches!(c, ' ' | '\t' | '\r' | '\n')
}

fn is_alphanumeric(c: char) -> bool {
    c == '_' || c.is_alphanumeric()
}

fn has_left_trim_marker(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && b[0] == TRIM_MARKER && is_space(b[1] as char)
}

fn has_right_trim_marker(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() >= 2 && is_space(b[0] as char) && b[1] == TRIM_MARKER
}

fn left_trim_length(s: &str) -> usize {
    s.len() - s.trim_start_matches(is_space).len()
}

fn right_trim_length(s: &str) -> usize {
    s.len() - s.trim_end_matches(is_space).len()
}

fn describe(c: char) -> String {
    format!("U+{:04X} {c:?}", u32::from(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<ItemKind> {
        lex(input, &Delims::new("[", "]"))
            .into_iter()
            .map(|item| item.kind)
            .collect()
    }

    #[test]
    fn lex_text_only() {
        let items = lex("plain text", &Delims::new("[", "]"));
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].kind, ItemKind::Text);
        assert_eq!(items[0].val, "plain text");
        assert_eq!(items[1].kind, ItemKind::Eof);
    }

    #[test]
    fn lex_field_action() {
        use ItemKind::*;
        assert_eq!(
            kinds("/[.Date]/"),
            vec![Text, LeftDelim, Field, RightDelim, Text, Eof]
        );
    }

    #[test]
    fn lex_pipeline_with_declaration() {
        use ItemKind::*;
        assert_eq!(
            kinds("[$x := .A | len]"),
            vec![
                LeftDelim, Variable, Space, Declare, Space, Field, Space, Pipe, Space,
                Identifier, RightDelim, Eof
            ]
        );
    }

    #[test]
    fn lex_literals() {
        use ItemKind::*;
        assert_eq!(
            kinds(r#"[true 1.5 0x1F 'a' "s" `r` nil .]"#),
            vec![
                LeftDelim, Bool, Space, Number, Space, Number, Space, CharConstant, Space,
                String, Space, RawString, Space, Nil, Space, Dot, RightDelim, Eof
            ]
        );
    }

    #[test]
    fn lex_keywords() {
        use ItemKind::*;
        assert_eq!(
            kinds("[if .A][else][end]"),
            vec![
                LeftDelim, If, Space, Field, RightDelim, LeftDelim, Else, RightDelim,
                LeftDelim, End, RightDelim, Eof
            ]
        );
    }

    #[test]
    fn lex_unicode_field() {
        let items = lex("[.日期]", &Delims::new("[", "]"));
        assert_eq!(items[1].kind, ItemKind::Field);
        assert_eq!(items[1].val, ".日期");
    }

    #[test]
    fn lex_trim_markers() {
        let items = lex("a  [- .X -]  b", &Delims::new("[", "]"));
        let texts: Vec<_> = items
            .iter()
            .filter(|i| i.kind == ItemKind::Text)
            .map(|i| i.val.as_str())
            .collect();
        assert_eq!(texts, vec!["a", "b"]);
    }

    #[test]
    fn lex_comment() {
        let items = lex("a[/* note */]b", &Delims::new("[", "]"));
        assert_eq!(items[1].kind, ItemKind::Comment);
        assert_eq!(items[1].val, "/* note */");
        assert_eq!(items[2].val, "b");
    }

    #[test]
    fn lex_default_braces_are_text_with_brackets() {
        use ItemKind::*;
        assert_eq!(kinds("{{.X}}"), vec![Text, Eof]);
    }

    #[test]
    fn lex_errors() {
        let last = |input: &str| lex(input, &Delims::new("[", "]")).pop().unwrap();
        assert_eq!(last("[.X").val, "unclosed action");
        assert_eq!(last("[(.X]").val, "unclosed left paren");
        assert_eq!(last("[.X)]").val, "unexpected right paren");
        assert_eq!(last("[\"abc]").val, "unterminated quoted string");
        assert_eq!(last("[/* x").val, "unclosed comment");
        assert_eq!(last("[/* x */ .Y]").val, "comment ends before closing delimiter");
        assert!(last("[3k]").val.starts_with("bad number syntax"));
        assert_eq!(last("[: ]").val, "expected :=");
    }

    #[test]
    fn lex_lines() {
        let items = lex("a\nb[.X]\n[.Y]", &Delims::new("[", "]"));
        let fields: Vec<_> = items
            .iter()
            .filter(|i| i.kind == ItemKind::Field)
            .map(|i| (i.val.as_str(), i.pos.line))
            .collect();
        assert_eq!(fields, vec![(".X", 2), (".Y", 3)]);
    }
}
