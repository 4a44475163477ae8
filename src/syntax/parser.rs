//! Recursive-descent parser over [`lexer`](super::lexer) tokens.
//!
//! Type aliases are parsed strictly: a malformed annotation is a [`ParseError`].
//! Everything else at the top level is skipped by bracket balancing, so ordinary
//! JavaScript around the aliases never needs to be understood.

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::Regex;

use super::lexer::{Token, TokenKind, lex, unquote};
use super::{Annotation, Identifier, ObjectAnnotation, ObjectProperty, Program, Statement, TypeAlias};
use crate::error::ParseError;

/// `declare export` lines (library definitions) carry nothing we consume.
static DECLARE_EXPORT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)declare export .*?(?:\n|$)").unwrap());

pub fn parse(source: &str) -> Result<Program, ParseError> {
    let source = strip_declare_exports(source);
    let tokens = lex(&source)?;
    Parser { source: source.as_ref(), tokens, pos: 0 }.program()
}

/// Blanks out `declare export` lines, keeping byte offsets and line breaks intact
/// so error positions still point into the original text.
fn strip_declare_exports(source: &str) -> Cow<'_, str> {
    DECLARE_EXPORT.replace_all(source, |caps: &regex::Captures| {
        caps[0]
            .chars()
            .map(|c| if c == '\n' { "\n".to_string() } else { " ".repeat(c.len_utf8()) })
            .collect::<String>()
    })
}

struct Parser<'s> {
    source: &'s str,
    tokens: Vec<Token>,
    pos: usize,
}

use TokenKind::*;

impl<'s> Parser<'s> {
    // ———————————————————————————————————————————————————————————————————
    // STATEMENTS
    // ———————————————————————————————————————————————————————————————————

    fn program(&mut self) -> Result<Program, ParseError> {
        let mut body = Vec::new();
        while self.peek().is_some() {
            if self.eat(Semi) {
                continue;
            }
            body.push(self.statement()?);
        }
        Ok(Program { body })
    }

    fn statement(&mut self) -> Result<Statement, ParseError> {
        if self.at_word("export") && self.peek_at(1).is_some() {
            self.bump();
            return Ok(Statement::Export(Box::new(self.statement()?)));
        }
        if self.at_word("opaque") || self.at_word("declare") {
            // `opaque type` and `declare type` are not aliases; drop the whole declaration
            self.bump();
            self.skip_statement();
            return Ok(Statement::Other);
        }
        if self.at_alias() {
            return self.type_alias().map(Statement::TypeAlias);
        }
        self.skip_statement();
        Ok(Statement::Other)
    }

    /// `type Name =` or `type Name<`
    fn at_alias(&self) -> bool {
        self.at_word("type")
            && self.peek_at(1) == Some(Ident)
            && matches!(self.peek_at(2), Some(Eq | LAngle))
    }

    /// Consumes one statement we do not model. Stops after a `;` or a closing
    /// brace at depth zero, or right before the next declaration we do model.
    fn skip_statement(&mut self) {
        let mut depth = 0usize;
        let mut first = true;
        while let Some(kind) = self.peek() {
            let boundary = self.at_alias() || self.at_word("export") || self.at_word("import");
            if !first && depth == 0 && boundary {
                return;
            }
            first = false;
            self.pos += 1;
            match kind {
                LBrace | LParen | LBracket => depth += 1,
                RParen | RBracket => depth = depth.saturating_sub(1),
                RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return;
                    }
                }
                Semi if depth == 0 => return,
                _ => {}
            }
        }
    }

    fn type_alias(&mut self) -> Result<TypeAlias, ParseError> {
        self.bump(); // `type`
        let id = self.identifier()?;
        let type_parameters = if self.at(LAngle) {
            self.type_parameter_declaration()?
        } else {
            Vec::new()
        };
        self.expect(Eq, "`=`")?;
        let right = self.annotation()?;
        self.eat(Semi);
        Ok(TypeAlias { id, type_parameters, right })
    }

    /// `<T, +U: Bound = Default>`; bounds and defaults are parsed and dropped.
    fn type_parameter_declaration(&mut self) -> Result<Vec<Identifier>, ParseError> {
        self.expect(LAngle, "`<`")?;
        let mut params = Vec::new();
        while !self.eat(RAngle) {
            if !self.eat(Plus) {
                self.eat(Minus);
            }
            params.push(self.identifier()?);
            if self.eat(Colon) {
                self.annotation()?;
            }
            if self.eat(Eq) {
                self.annotation()?;
            }
            if !self.eat(Comma) {
                self.expect(RAngle, "`>`")?;
                break;
            }
        }
        Ok(params)
    }

    // ———————————————————————————————————————————————————————————————————
    // ANNOTATIONS
    // ———————————————————————————————————————————————————————————————————

    fn annotation(&mut self) -> Result<Annotation, ParseError> {
        self.eat(Pipe);
        let first = self.intersection()?;
        if !self.at_union_pipe() {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.at_union_pipe() {
            self.bump();
            members.push(self.intersection()?);
        }
        Ok(Annotation::Union(members))
    }

    /// A `|` that separates union members, as opposed to the `|}` closing an exact object.
    fn at_union_pipe(&self) -> bool {
        self.at(Pipe) && self.peek_at(1) != Some(RBrace)
    }

    fn intersection(&mut self) -> Result<Annotation, ParseError> {
        self.eat(Amp);
        let first = self.prefix()?;
        if !self.at(Amp) {
            return Ok(first);
        }
        let mut members = vec![first];
        while self.eat(Amp) {
            members.push(self.prefix()?);
        }
        Ok(Annotation::Intersection(members))
    }

    fn prefix(&mut self) -> Result<Annotation, ParseError> {
        if self.eat(Question) {
            return Ok(Annotation::Nullable(Box::new(self.prefix()?)));
        }
        self.postfix()
    }

    /// `T[]` is sugar for `Array<T>`.
    fn postfix(&mut self) -> Result<Annotation, ParseError> {
        let mut annotation = self.primary()?;
        while self.at(LBracket) && self.peek_at(1) == Some(RBracket) {
            self.pos += 2;
            annotation = Annotation::Generic {
                id: Identifier::new("Array"),
                type_parameters: Some(vec![annotation]),
            };
        }
        Ok(annotation)
    }

    fn primary(&mut self) -> Result<Annotation, ParseError> {
        match self.peek() {
            Some(LBrace) => self.object().map(Annotation::Object),
            Some(LBracket) => self.tuple(),
            Some(LParen) => self.parenthesized_or_function(),
            Some(LAngle) => self.function(),
            Some(Str) => {
                let raw = self.text(0).to_string();
                self.bump();
                Ok(Annotation::StringLiteral { value: unquote(&raw), raw })
            }
            Some(Number) => {
                let raw = self.text(0).to_string();
                self.bump();
                Ok(Annotation::NumberLiteral { raw })
            }
            Some(Minus) if self.peek_at(1) == Some(Number) => {
                let raw = format!("-{}", self.text(1));
                self.pos += 2;
                Ok(Annotation::NumberLiteral { raw })
            }
            Some(Ident) => self.named(),
            Some(Star) => {
                self.bump();
                Ok(Annotation::Existential)
            }
            _ => Err(self.unexpected("a type annotation")),
        }
    }

    fn named(&mut self) -> Result<Annotation, ParseError> {
        let keyword = match self.text(0) {
            "string" => Some(Annotation::String),
            "number" => Some(Annotation::Number),
            "boolean" => Some(Annotation::Boolean),
            "any" => Some(Annotation::Any),
            "mixed" => Some(Annotation::Mixed),
            "void" => Some(Annotation::Void),
            "null" => Some(Annotation::Null),
            "true" => Some(Annotation::BooleanLiteral(true)),
            "false" => Some(Annotation::BooleanLiteral(false)),
            _ => None,
        };
        if let Some(annotation) = keyword {
            self.bump();
            return Ok(annotation);
        }
        if self.at_word("typeof") {
            self.bump();
            return Ok(Annotation::Typeof(self.qualified_name()?));
        }
        let id = self.qualified_name()?;
        let type_parameters = if self.at(LAngle) {
            Some(self.type_arguments()?)
        } else {
            None
        };
        Ok(Annotation::Generic { id, type_parameters })
    }

    fn qualified_name(&mut self) -> Result<Identifier, ParseError> {
        let mut name = self.identifier()?.name;
        while self.eat(Dot) {
            name.push('.');
            name.push_str(&self.identifier()?.name);
        }
        Ok(Identifier::new(name))
    }

    fn type_arguments(&mut self) -> Result<Vec<Annotation>, ParseError> {
        self.expect(LAngle, "`<`")?;
        let mut args = Vec::new();
        while !self.eat(RAngle) {
            args.push(self.annotation()?);
            if !self.eat(Comma) {
                self.expect(RAngle, "`>`")?;
                break;
            }
        }
        Ok(args)
    }

    fn object(&mut self) -> Result<ObjectAnnotation, ParseError> {
        self.expect(LBrace, "`{`")?;
        let exact = self.eat(Pipe);
        let mut properties = Vec::new();
        loop {
            if self.at_object_close(exact) {
                self.pos += if exact { 2 } else { 1 };
                break;
            }
            if self.peek().is_none() {
                return Err(self.unexpected("`}`"));
            }
            if let Some(property) = self.object_member()? {
                properties.push(property);
            }
            if !self.eat(Semi) && !self.eat(Comma) && !self.at_object_close(exact) {
                return Err(self.unexpected("`;`, `,` or the end of the object type"));
            }
        }
        Ok(ObjectAnnotation { properties, exact })
    }

    fn at_object_close(&self, exact: bool) -> bool {
        if exact {
            self.at(Pipe) && self.peek_at(1) == Some(RBrace)
        } else {
            self.at(RBrace)
        }
    }

    /// One member of an object type. Spreads, indexers and call properties are
    /// consumed but yield no property.
    fn object_member(&mut self) -> Result<Option<ObjectProperty>, ParseError> {
        if self.eat(Ellipsis) {
            if !matches!(self.peek(), Some(Semi | Comma | RBrace | Pipe)) {
                self.annotation()?;
            }
            return Ok(None);
        }
        if self.at(LBracket) {
            self.indexer()?;
            return Ok(None);
        }
        if matches!(self.peek(), Some(LParen | LAngle)) {
            self.method()?;
            return Ok(None);
        }
        if !self.eat(Plus) {
            self.eat(Minus);
        }
        let key = match self.peek() {
            Some(Ident | Number) => self.text(0).to_string(),
            Some(Str) => unquote(self.text(0)),
            _ => return Err(self.unexpected("a property key")),
        };
        self.bump();
        if matches!(self.peek(), Some(LParen | LAngle)) {
            let value = self.method()?;
            return Ok(Some(ObjectProperty { key: Identifier::new(key), value, optional: false }));
        }
        let optional = self.eat(Question);
        self.expect(Colon, "`:`")?;
        let value = self.annotation()?;
        Ok(Some(ObjectProperty { key: Identifier::new(key), value, optional }))
    }

    /// `[key: K]: V` or `[K]: V`
    fn indexer(&mut self) -> Result<(), ParseError> {
        self.expect(LBracket, "`[`")?;
        if self.at(Ident) && self.peek_at(1) == Some(Colon) {
            self.pos += 2;
        }
        self.annotation()?;
        self.expect(RBracket, "`]`")?;
        self.expect(Colon, "`:`")?;
        self.annotation()?;
        Ok(())
    }

    fn tuple(&mut self) -> Result<Annotation, ParseError> {
        self.expect(LBracket, "`[`")?;
        let mut elements = Vec::new();
        while !self.eat(RBracket) {
            elements.push(self.annotation()?);
            if !self.eat(Comma) {
                self.expect(RBracket, "`]`")?;
                break;
            }
        }
        Ok(Annotation::Tuple(elements))
    }

    fn parenthesized_or_function(&mut self) -> Result<Annotation, ParseError> {
        if self.arrow_after_parens() {
            return self.function();
        }
        self.expect(LParen, "`(`")?;
        let inner = self.annotation()?;
        self.expect(RParen, "`)`")?;
        Ok(inner)
    }

    /// Whether the parenthesized group starting here is followed by `=>`, which
    /// makes it a parameter list: `(string, number) => void`, `(x: T) => U`.
    fn arrow_after_parens(&self) -> bool {
        let mut depth = 0usize;
        for (offset, token) in self.tokens[self.pos..].iter().enumerate() {
            match token.kind {
                LParen | LBracket | LBrace => depth += 1,
                RParen | RBracket | RBrace => {
                    depth = depth.saturating_sub(1);
                    if depth == 0 {
                        return self.peek_at(offset + 1) == Some(Arrow);
                    }
                }
                _ => {}
            }
        }
        false
    }

    /// `<T>(params) => returns`
    fn function(&mut self) -> Result<Annotation, ParseError> {
        if self.at(LAngle) {
            self.type_parameter_declaration()?;
        }
        let params = self.function_params()?;
        self.expect(Arrow, "`=>`")?;
        let returns = self.annotation()?;
        Ok(Annotation::Function { params, returns: Box::new(returns) })
    }

    /// `<T>(params): returns`, as written for methods and call properties.
    fn method(&mut self) -> Result<Annotation, ParseError> {
        if self.at(LAngle) {
            self.type_parameter_declaration()?;
        }
        let params = self.function_params()?;
        self.expect(Colon, "`:`")?;
        let returns = self.annotation()?;
        Ok(Annotation::Function { params, returns: Box::new(returns) })
    }

    fn function_params(&mut self) -> Result<Vec<Annotation>, ParseError> {
        self.expect(LParen, "`(`")?;
        let mut params = Vec::new();
        while !self.eat(RParen) {
            self.eat(Ellipsis);
            let named = self.at(Ident)
                && match self.peek_at(1) {
                    Some(Colon) => true,
                    Some(Question) => self.peek_at(2) == Some(Colon),
                    _ => false,
                };
            if named {
                self.bump();
                self.eat(Question);
                self.expect(Colon, "`:`")?;
            }
            params.push(self.annotation()?);
            if !self.eat(Comma) {
                self.expect(RParen, "`)`")?;
                break;
            }
        }
        Ok(params)
    }

    // ———————————————————————————————————————————————————————————————————
    // TOKEN CURSOR
    // ———————————————————————————————————————————————————————————————————

    fn peek(&self) -> Option<TokenKind> {
        self.peek_at(0)
    }

    fn peek_at(&self, n: usize) -> Option<TokenKind> {
        self.tokens.get(self.pos + n).map(|t| t.kind)
    }

    fn text(&self, n: usize) -> &'s str {
        let source = self.source;
        self.tokens
            .get(self.pos + n)
            .map(|t| &source[t.span.clone()])
            .unwrap_or_default()
    }

    fn at(&self, kind: TokenKind) -> bool {
        self.peek() == Some(kind)
    }

    fn at_word(&self, word: &str) -> bool {
        self.at(Ident) && self.text(0) == word
    }

    fn bump(&mut self) {
        if self.pos < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.at(kind) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect(&mut self, kind: TokenKind, what: &str) -> Result<(), ParseError> {
        if self.eat(kind) {
            Ok(())
        } else {
            Err(self.unexpected(what))
        }
    }

    fn identifier(&mut self) -> Result<Identifier, ParseError> {
        if !self.at(Ident) {
            return Err(self.unexpected("an identifier"));
        }
        let name = self.text(0).to_string();
        self.bump();
        Ok(Identifier::new(name))
    }

    fn unexpected(&self, expected: &str) -> ParseError {
        match self.tokens.get(self.pos) {
            Some(token) => ParseError::at(
                self.source,
                token.span.start,
                format!("expected {expected}, found `{}`", self.text(0)),
            ),
            None => ParseError::at(
                self.source,
                self.source.len(),
                format!("expected {expected}, found end of input"),
            ),
        }
    }
}
