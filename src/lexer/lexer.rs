use std::rc::Rc;

use lazy_static::lazy_static;
use regex::Regex;

use crate::{
    errors::errors::{Error, ErrorImpl},
    Position, Span, MK_DEFAULT_HANDLER, MK_TOKEN,
};

use super::tokens::{Token, TokenKind, RESERVED_LOOKUP};

pub type RegexHandler = fn(&mut Lexer, &str);

pub struct RegexPattern {
    regex: Regex,
    handler: RegexHandler,
}

impl RegexPattern {
    fn new(pattern: &str, handler: RegexHandler) -> Self {
        RegexPattern {
            // Anchored so a pattern only ever matches at the lexer position.
            regex: Regex::new(&format!("^(?:{})", pattern)).expect("invalid token pattern"),
            handler,
        }
    }
}

lazy_static! {
    static ref PATTERNS: Vec<RegexPattern> = vec![
        RegexPattern::new("\\s+", skip_handler),
        RegexPattern::new("//[^\\n]*", skip_handler),
        RegexPattern::new("[a-zA-Z_][a-zA-Z0-9_]*", symbol_handler),
        RegexPattern::new("[0-9]+\\.[0-9]+", float_handler),
        RegexPattern::new("[0-9]+", number_handler),
        RegexPattern::new("\"(\\\\.|[^\"\\\\])*\"", string_handler),
        RegexPattern::new("'(\\\\.|[^'\\\\])'", char_handler),
        RegexPattern::new("\\{", MK_DEFAULT_HANDLER!(TokenKind::OpenCurly, "{")),
        RegexPattern::new("\\}", MK_DEFAULT_HANDLER!(TokenKind::CloseCurly, "}")),
        RegexPattern::new("\\(", MK_DEFAULT_HANDLER!(TokenKind::OpenParen, "(")),
        RegexPattern::new("\\)", MK_DEFAULT_HANDLER!(TokenKind::CloseParen, ")")),
        RegexPattern::new("==", MK_DEFAULT_HANDLER!(TokenKind::Equals, "==")),
        RegexPattern::new("!=", MK_DEFAULT_HANDLER!(TokenKind::NotEquals, "!=")),
        RegexPattern::new("<=", MK_DEFAULT_HANDLER!(TokenKind::LessEquals, "<=")),
        RegexPattern::new(">=", MK_DEFAULT_HANDLER!(TokenKind::GreaterEquals, ">=")),
        RegexPattern::new("=", MK_DEFAULT_HANDLER!(TokenKind::Assignment, "=")),
        RegexPattern::new("<", MK_DEFAULT_HANDLER!(TokenKind::Less, "<")),
        RegexPattern::new(">", MK_DEFAULT_HANDLER!(TokenKind::Greater, ">")),
        RegexPattern::new("&&", MK_DEFAULT_HANDLER!(TokenKind::And, "&&")),
        RegexPattern::new("\\|\\|", MK_DEFAULT_HANDLER!(TokenKind::Or, "||")),
        RegexPattern::new("!", MK_DEFAULT_HANDLER!(TokenKind::Not, "!")),
        RegexPattern::new(";", MK_DEFAULT_HANDLER!(TokenKind::Semicolon, ";")),
        RegexPattern::new(",", MK_DEFAULT_HANDLER!(TokenKind::Comma, ",")),
        RegexPattern::new("\\+", MK_DEFAULT_HANDLER!(TokenKind::Plus, "+")),
        RegexPattern::new("-", MK_DEFAULT_HANDLER!(TokenKind::Dash, "-")),
        RegexPattern::new("/", MK_DEFAULT_HANDLER!(TokenKind::Slash, "/")),
        RegexPattern::new("\\*", MK_DEFAULT_HANDLER!(TokenKind::Star, "*")),
    ];
}

pub struct Lexer {
    tokens: Vec<Token>,
    source: String,
    pos: usize,
    line: u32,
    file: Rc<String>,
}

impl Lexer {
    pub fn new(source: String, file: Option<String>) -> Lexer {
        let file_name = if let Some(file) = file {
            Rc::new(file)
        } else {
            Rc::new(String::from("shell"))
        };

        Lexer {
            tokens: vec![],
            source,
            pos: 0,
            line: 1,
            file: file_name,
        }
    }

    pub fn position(&self) -> Position {
        Position {
            offset: self.pos as u32,
            line: self.line,
            file: Rc::clone(&self.file),
        }
    }

    /// Consumes `text`, which must be the source at the current position.
    pub fn advance(&mut self, text: &str) {
        self.pos += text.len();
        self.line += text.matches('\n').count() as u32;
    }

    /// Pushes a token whose source text is `consumed` and moves past it.
    pub fn push_token(&mut self, kind: TokenKind, value: String, consumed: &str) {
        let start = self.position();
        self.advance(consumed);
        let end = self.position();
        self.tokens.push(MK_TOKEN!(kind, value, Span { start, end }));
    }

    pub fn remainder(&self) -> &str {
        &self.source[self.pos..]
    }

    pub fn at_eof(&self) -> bool {
        self.pos >= self.source.len()
    }
}

fn skip_handler(lexer: &mut Lexer, matched: &str) {
    lexer.advance(matched);
}

fn number_handler(lexer: &mut Lexer, matched: &str) {
    lexer.push_token(TokenKind::Number, matched.to_string(), matched);
}

fn float_handler(lexer: &mut Lexer, matched: &str) {
    lexer.push_token(TokenKind::Float, matched.to_string(), matched);
}

fn string_handler(lexer: &mut Lexer, matched: &str) {
    let value = unescape(&matched[1..matched.len() - 1]);
    lexer.push_token(TokenKind::String, value, matched);
}

fn char_handler(lexer: &mut Lexer, matched: &str) {
    let value = unescape(&matched[1..matched.len() - 1]);
    lexer.push_token(TokenKind::Char, value, matched);
}

fn symbol_handler(lexer: &mut Lexer, matched: &str) {
    let kind = RESERVED_LOOKUP
        .get(matched)
        .copied()
        .unwrap_or(TokenKind::Identifier);
    lexer.push_token(kind, matched.to_string(), matched);
}

fn unescape(literal: &str) -> String {
    let mut result = String::new();
    let mut chars = literal.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            result.push(ch);
            continue;
        }

        match chars.peek() {
            Some('n') => result.push('\n'),
            Some('t') => result.push('\t'),
            Some('r') => result.push('\r'),
            Some('0') => result.push('\0'),
            Some('\\') => result.push('\\'),
            Some('"') => result.push('"'),
            Some('\'') => result.push('\''),
            // Unknown escapes keep their backslash
            Some(_) => {
                result.push(ch);
                continue;
            }
            None => {
                result.push(ch);
                break;
            }
        }
        chars.next();
    }

    result
}

pub fn tokenize(source: String, file: Option<String>) -> Result<Vec<Token>, Error> {
    let mut lex = Lexer::new(source, file);

    while !lex.at_eof() {
        let found = PATTERNS.iter().find_map(|pattern| {
            pattern
                .regex
                .find(lex.remainder())
                .map(|found| (pattern.handler, found.as_str().to_string()))
        });

        match found {
            Some((handler, matched)) => handler(&mut lex, &matched),
            None => {
                let token = lex.remainder().chars().next().unwrap_or_default().to_string();
                return Err(Error::new(ErrorImpl::UnrecognisedToken { token }, lex.line));
            }
        }
    }

    let end = lex.position();
    lex.tokens.push(MK_TOKEN!(
        TokenKind::EOF,
        String::from("EOF"),
        Span {
            start: end.clone(),
            end
        }
    ));
    Ok(lex.tokens)
}
