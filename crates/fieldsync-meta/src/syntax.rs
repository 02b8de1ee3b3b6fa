//! Reading declarations back from field-block lines
//!
//! Accepted line shapes:
//!
//! ```text
//! name :type, :unique, :limit=>4, null: false   # comment
//! field :name, :type, ...
//! field "name", :type, ...
//! timestamps
//! ```
//!
//! Blank and comment-only lines declare nothing.

use logos::Logos;

use crate::declaration::{FieldDeclaration, Specifier};
use crate::error::{Error, Result};
use crate::value::Value;

#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n\f]+")]
enum Token {
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*[?!]?", |lex| lex.slice().to_string())]
    Ident(String),

    /// `key:` (keyword-style hash key)
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*[?!]?:", |lex| lex.slice().trim_end_matches(':').to_string())]
    Label(String),

    #[regex(r":[A-Za-z_][A-Za-z0-9_]*[?!]?", |lex| lex.slice()[1..].to_string())]
    #[regex(r#":"([^"\\]|\\.)*""#, |lex| unquote(&lex.slice()[1..]))]
    #[regex(r":'([^'\\]|\\.)*'", |lex| unquote(&lex.slice()[1..]))]
    Symbol(String),

    #[regex(r#""([^"\\]|\\.)*""#, |lex| unquote(lex.slice()))]
    #[regex(r"'([^'\\]|\\.)*'", |lex| unquote(lex.slice()))]
    Str(String),

    #[regex(r"[-+]?([0-9][0-9_]*(\.[0-9][0-9_]*)?|\.[0-9]+)([eE][-+]?[0-9]+)?", |lex| lex.slice().to_string())]
    Number(String),

    #[token(",")]
    Comma,
    #[token("=>")]
    Arrow,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,

    /// Start of a trailing comment; nothing after it is read.
    #[token("#")]
    Comment,
}

/// Strip the quotes from a string literal and resolve its escapes.
///
/// Double-quoted strings understand `\n`, `\t`, `\r` and `\#`; both kinds
/// unescape their own quote and the backslash. Other escapes are kept.
fn unquote(literal: &str) -> String {
    let quote = literal.chars().next().unwrap_or('"');
    let inner = &literal[1..literal.len() - 1];
    let mut text = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }
        match (quote, chars.next()) {
            ('"', Some('n')) => text.push('\n'),
            ('"', Some('t')) => text.push('\t'),
            ('"', Some('r')) => text.push('\r'),
            ('"', Some('#')) => text.push('#'),
            (_, Some(c)) if c == quote || c == '\\' => text.push(c),
            (_, Some(c)) => {
                text.push('\\');
                text.push(c);
            }
            (_, None) => text.push('\\'),
        }
    }
    text
}

/// Tokens of `line` up to its trailing comment.
fn tokenize(line: &str) -> Result<Vec<Token>> {
    let mut lexer = Token::lexer(line);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next() {
        match token {
            Ok(Token::Comment) => break,
            Ok(token) => tokens.push(token),
            Err(()) => {
                return Err(Error::declaration(
                    line.trim(),
                    format!("unexpected `{}`", lexer.slice()),
                ));
            }
        }
    }
    Ok(tokens)
}

struct Parser<'a> {
    line: &'a str,
    tokens: std::vec::IntoIter<Token>,
}

impl Parser<'_> {
    fn error(&self, message: impl Into<String>) -> Error {
        Error::declaration(self.line.trim(), message)
    }

    fn next(&mut self) -> Option<Token> {
        self.tokens.next()
    }

    fn expect_type(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Symbol(type_name)) => Ok(type_name),
            _ => Err(self.error("expected a `:type` symbol")),
        }
    }

    fn value(&mut self) -> Result<Value> {
        match self.next() {
            Some(Token::Ident(word)) => match word.as_str() {
                "nil" => Ok(Value::Nil),
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                "BigDecimal" => {
                    let literal = match (self.next(), self.next(), self.next()) {
                        (Some(Token::LParen), Some(Token::Str(s)), Some(Token::RParen)) => s,
                        _ => return Err(self.error("expected BigDecimal('<digits>')")),
                    };
                    Value::decimal(&literal)
                }
                other => Err(self.error(format!("unsupported value `{other}`"))),
            },
            Some(Token::Number(n)) => number_value(&n).ok_or_else(|| self.error(format!("invalid number `{n}`"))),
            Some(Token::Str(s)) => Ok(Value::String(s)),
            Some(Token::Symbol(s)) => Ok(Value::Symbol(s)),
            _ => Err(self.error("expected a value")),
        }
    }

    fn rest(&mut self, declaration: &mut FieldDeclaration) -> Result<()> {
        loop {
            match self.next() {
                None => return Ok(()),
                Some(Token::Comma) => {}
                Some(_) => return Err(self.error("expected `,`")),
            }
            match self.next() {
                Some(Token::Symbol(name)) => {
                    if self.tokens.as_slice().first() == Some(&Token::Arrow) {
                        self.next();
                        let value = self.value()?;
                        declaration.attributes.insert(name, value);
                    } else {
                        let specifier: Specifier = name
                            .parse()
                            .map_err(|_| self.error(format!("unknown specifier `:{name}`")))?;
                        declaration.push_specifier(specifier);
                    }
                }
                Some(Token::Label(name)) => {
                    let value = self.value()?;
                    declaration.attributes.insert(name, value);
                }
                _ => return Err(self.error("expected a specifier or attribute")),
            }
        }
    }
}

fn number_value(literal: &str) -> Option<Value> {
    let cleaned = literal.replace('_', "");
    if let Ok(i) = cleaned.parse::<i64>() {
        return Some(Value::Integer(i));
    }
    cleaned.parse::<f64>().ok().map(Value::Float)
}

/// Parse one line of a field block into the declarations it makes.
///
/// Returns an empty vector for blank and comment-only lines, two
/// declarations for `timestamps`, and one otherwise.
pub fn parse_declaration_line(line: &str) -> Result<Vec<FieldDeclaration>> {
    let tokens = tokenize(line)?;
    if tokens.is_empty() {
        return Ok(Vec::new());
    }
    if tokens == [Token::Ident("timestamps".to_string())] {
        return Ok(vec![
            FieldDeclaration::new("created_at", "datetime"),
            FieldDeclaration::new("updated_at", "datetime"),
        ]);
    }

    let mut parser = Parser {
        line,
        tokens: tokens.into_iter(),
    };
    let name = match parser.next() {
        Some(Token::Ident(word)) if word == "field" => {
            let name = match parser.next() {
                Some(Token::Symbol(name)) | Some(Token::Str(name)) => name,
                _ => return Err(parser.error("expected a field name after `field`")),
            };
            if parser.next() != Some(Token::Comma) {
                return Err(parser.error("expected `,` after the field name"));
            }
            name
        }
        Some(Token::Ident(name)) => name,
        _ => return Err(parser.error("expected a field name")),
    };

    let mut declaration = FieldDeclaration::new(name, parser.expect_type()?);
    parser.rest(&mut declaration)?;
    Ok(vec![declaration])
}
