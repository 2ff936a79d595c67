//! Parsing of textual type signatures.
//!
//! The grammar is the usual generic-signature form:
//!
//! ```text
//! type := name ('<' arg (',' arg)* '>')? ('[' ']')*
//! arg  := '?' (('extends' | 'super') type)? | type
//! name := segment (('.' | '::') segment)*
//! ```
//!
//! Whitespace between tokens is ignored.

use thiserror::Error;

use crate::{Type, WildcardBound};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypeParseError {
    #[error("empty type signature")]
    Empty,
    #[error("unexpected end of type signature `{text}`")]
    UnexpectedEnd { text: String },
    #[error("unexpected `{found}` at offset {offset} in type signature `{text}`")]
    Unexpected {
        text: String,
        offset: usize,
        found: char,
    },
    #[error("wildcard `?` is only allowed as a type argument in `{text}`")]
    TopLevelWildcard { text: String },
}

/// Parse a type signature. Every name is treated as a class name.
pub fn parse_type(text: &str) -> Result<Type, TypeParseError> {
    parse_type_with_vars(text, &[])
}

/// Parse a type signature where the names in `type_vars` denote type variables.
pub fn parse_type_with_vars(text: &str, type_vars: &[&str]) -> Result<Type, TypeParseError> {
    let mut parser = Parser {
        text,
        pos: 0,
        type_vars,
    };
    parser.skip_ws();
    if parser.at_end() {
        return Err(TypeParseError::Empty);
    }
    let ty = parser.parse_type()?;
    parser.skip_ws();
    match parser.peek() {
        None => Ok(ty),
        Some(found) => Err(parser.unexpected(found)),
    }
}

struct Parser<'a> {
    text: &'a str,
    pos: usize,
    type_vars: &'a [&'a str],
}

impl<'a> Parser<'a> {
    fn at_end(&self) -> bool {
        self.pos >= self.text.len()
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos..].chars().next()
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos += ch.len_utf8();
        Some(ch)
    }

    fn skip_ws(&mut self) {
        while self.peek().is_some_and(char::is_whitespace) {
            self.bump();
        }
    }

    fn unexpected(&self, found: char) -> TypeParseError {
        TypeParseError::Unexpected {
            text: self.text.to_string(),
            offset: self.pos,
            found,
        }
    }

    fn end(&self) -> TypeParseError {
        TypeParseError::UnexpectedEnd {
            text: self.text.to_string(),
        }
    }

    fn expect(&mut self, expected: char) -> Result<(), TypeParseError> {
        self.skip_ws();
        match self.peek() {
            Some(ch) if ch == expected => {
                self.bump();
                Ok(())
            }
            Some(found) => Err(self.unexpected(found)),
            None => Err(self.end()),
        }
    }

    fn parse_type(&mut self) -> Result<Type, TypeParseError> {
        self.skip_ws();
        if self.peek() == Some('?') {
            return Err(TypeParseError::TopLevelWildcard {
                text: self.text.to_string(),
            });
        }

        let name = self.parse_name()?;
        self.skip_ws();

        let mut ty = if self.peek() == Some('<') {
            self.bump();
            let mut args = vec![self.parse_arg()?];
            loop {
                self.skip_ws();
                match self.bump() {
                    Some(',') => args.push(self.parse_arg()?),
                    Some('>') => break,
                    Some(found) => {
                        self.pos -= found.len_utf8();
                        return Err(self.unexpected(found));
                    }
                    None => return Err(self.end()),
                }
            }
            Type::class(name, args)
        } else if self.type_vars.contains(&name) {
            Type::type_var(name)
        } else {
            Type::named(name)
        };

        loop {
            self.skip_ws();
            if self.peek() != Some('[') {
                break;
            }
            self.bump();
            self.expect(']')?;
            ty = Type::array(ty);
        }

        Ok(ty)
    }

    fn parse_arg(&mut self) -> Result<Type, TypeParseError> {
        self.skip_ws();
        if self.peek() != Some('?') {
            return self.parse_type();
        }
        self.bump();
        self.skip_ws();
        if self.eat_keyword("extends") {
            let bound = self.parse_type()?;
            return Ok(Type::Wildcard(WildcardBound::Extends(Box::new(bound))));
        }
        if self.eat_keyword("super") {
            let bound = self.parse_type()?;
            return Ok(Type::Wildcard(WildcardBound::Super(Box::new(bound))));
        }
        Ok(Type::Wildcard(WildcardBound::Unbounded))
    }

    fn eat_keyword(&mut self, keyword: &str) -> bool {
        let rest = &self.text[self.pos..];
        let Some(after) = rest.strip_prefix(keyword) else {
            return false;
        };
        if after.chars().next().is_some_and(is_ident_char) {
            return false;
        }
        self.pos += keyword.len();
        true
    }

    fn parse_name(&mut self) -> Result<&'a str, TypeParseError> {
        let start = self.pos;
        loop {
            let segment_start = self.pos;
            while self.peek().is_some_and(is_ident_char) {
                self.bump();
            }
            if self.pos == segment_start {
                return match self.peek() {
                    Some(found) => Err(self.unexpected(found)),
                    None => Err(self.end()),
                };
            }

            let rest = &self.text[self.pos..];
            if rest.starts_with("::") {
                self.pos += 2;
            } else if rest.starts_with('.') {
                self.pos += 1;
            } else {
                break;
            }
        }
        Ok(&self.text[start..self.pos])
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_alphanumeric() || ch == '_' || ch == '$'
}
