//! Tokenizer for Flow-annotated JavaScript.
//!
//! Tokens are span-based; text is sliced from the source when the parser needs it.
//! JavaScript that the parser never inspects (regex literals, operators) still has
//! to tokenize, so every printable ASCII character maps to some token. A `/` in
//! operand position starts a regex literal, scanned as one [`TokenKind::Regex`].

use std::ops::Range;

use logos::Logos;

use crate::error::ParseError;

#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
#[logos(skip r"[ \t\r\n\f]+")]
pub enum TokenKind {
    #[regex(r"//[^\n]*", logos::skip)]
    LineComment,

    /// Filtered out by [`lex`]; kept as a token so an unterminated comment is an error.
    #[token("/*", block_comment)]
    BlockComment,

    #[regex(r"[a-zA-Z_$\x{80}-\x{10FFFF}][a-zA-Z0-9_$\x{80}-\x{10FFFF}]*")]
    Ident,

    #[regex(r#""([^"\\\n]|\\.)*""#)]
    #[regex(r"'([^'\\\n]|\\.)*'")]
    Str,

    #[token("`", template)]
    Template,

    #[regex(r"[0-9][0-9_]*(\.[0-9_]*)?([eE][+-]?[0-9]+)?")]
    #[regex(r"\.[0-9]+([eE][+-]?[0-9]+)?")]
    #[regex(r"0[xXbBoO][0-9a-fA-F_]+")]
    Number,

    #[token("{")]
    LBrace,
    #[token("}")]
    RBrace,
    #[token("(")]
    LParen,
    #[token(")")]
    RParen,
    #[token("[")]
    LBracket,
    #[token("]")]
    RBracket,
    #[token("<")]
    LAngle,
    #[token(">")]
    RAngle,
    #[token(";")]
    Semi,
    #[token(",")]
    Comma,
    #[token(":")]
    Colon,
    #[token("?")]
    Question,
    #[token("|")]
    Pipe,
    #[token("&")]
    Amp,
    #[token("=")]
    Eq,
    #[token("=>")]
    Arrow,
    #[token(".")]
    Dot,
    #[token("...")]
    Ellipsis,
    #[token("-")]
    Minus,
    #[token("+")]
    Plus,
    #[token("*")]
    Star,

    #[token("/")]
    Slash,

    /// Operators the parser only skips over.
    #[regex(r"[!%^~\\@#]")]
    Punct,

    /// `/body/flags`; produced by [`lex`] from a [`TokenKind::Slash`] in operand position.
    Regex,
}

fn block_comment(lex: &mut logos::Lexer<TokenKind>) -> bool {
    match lex.remainder().find("*/") {
        Some(end) => {
            lex.bump(end + 2);
            true
        }
        None => {
            lex.bump(lex.remainder().len());
            false
        }
    }
}

fn template(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let mut escaped = false;
    for (i, c) in lex.remainder().char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '`' => {
                lex.bump(i + 1);
                return true;
            }
            _ => {}
        }
    }
    lex.bump(lex.remainder().len());
    false
}

/// A `/` starts a regex literal when the previous token cannot end an operand.
fn regex_allowed(source: &str, previous: Option<&Token>) -> bool {
    use TokenKind::*;
    let Some(previous) = previous else { return true };
    match previous.kind {
        Ident => matches!(
            &source[previous.span.clone()],
            "return" | "typeof" | "case" | "in" | "of" | "delete" | "void" | "throw" | "new"
        ),
        Number | Str | Template | Regex | RParen | RBracket => false,
        _ => true,
    }
}

/// Extends the current `/` token over a regex body and its flags. Leaves the
/// token untouched when no closing `/` appears on the same line.
fn regex_literal(lex: &mut logos::Lexer<TokenKind>) -> bool {
    let remainder = lex.remainder();
    let mut escaped = false;
    let mut in_class = false;
    for (i, c) in remainder.char_indices() {
        match c {
            '\n' | '\r' => return false,
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '[' => in_class = true,
            ']' => in_class = false,
            '/' if !in_class => {
                let flags = remainder[i + 1..]
                    .find(|c: char| !c.is_ascii_alphabetic())
                    .unwrap_or(remainder.len() - i - 1);
                lex.bump(i + 1 + flags);
                return true;
            }
            _ => {}
        }
    }
    false
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Range<usize>,
}

/// Tokenizes `source`, dropping whitespace and comments.
pub fn lex(source: &str) -> Result<Vec<Token>, ParseError> {
    let mut tokens = Vec::new();
    let mut lexer = TokenKind::lexer(source);
    while let Some(next) = lexer.next() {
        let span = lexer.span();
        match next {
            Ok(TokenKind::BlockComment) => {}
            Ok(TokenKind::Slash) if regex_allowed(source, tokens.last()) => {
                let kind = if regex_literal(&mut lexer) { TokenKind::Regex } else { TokenKind::Slash };
                tokens.push(Token { kind, span: lexer.span() });
            }
            Ok(kind) => tokens.push(Token { kind, span }),
            Err(()) => {
                let slice = lexer.slice();
                let message = if slice.starts_with("/*") {
                    "unterminated block comment".to_string()
                } else if slice.starts_with('`') {
                    "unterminated template literal".to_string()
                } else {
                    match slice.chars().next() {
                        Some(c) => format!("unexpected character `{}`", c.escape_default()),
                        None => "unexpected end of input".to_string(),
                    }
                };
                return Err(ParseError::at(source, span.start, message));
            }
        }
    }
    Ok(tokens)
}

/// Decodes the body of a quoted string token.
pub fn unquote(raw: &str) -> String {
    let inner = raw.get(1..raw.len().saturating_sub(1)).unwrap_or_default();
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn alias_tokens() {
        use TokenKind::*;
        assert_eq!(
            kinds("export type ID = ?string; // trailing"),
            vec![Ident, Ident, Ident, Eq, Question, Ident, Semi],
        );
    }

    #[test]
    fn comments_are_dropped() {
        use TokenKind::*;
        assert_eq!(kinds("/* a\n b */ x /** doc */ y"), vec![Ident, Ident]);
    }

    #[test]
    fn arrow_and_ellipsis_win_over_prefixes() {
        use TokenKind::*;
        assert_eq!(kinds("(...a) => b"), vec![LParen, Ellipsis, Ident, RParen, Arrow, Ident]);
    }

    #[test]
    fn regex_literals_are_single_tokens() {
        use TokenKind::*;
        assert_eq!(kinds(r"var re = /^\d{9}$/;"), vec![Ident, Ident, Eq, Regex, Semi]);
        assert_eq!(
            kinds(r#"f(/["'`]/g, /[/]x\//i)"#),
            vec![Ident, LParen, Regex, Comma, Regex, RParen]
        );
    }

    #[test]
    fn division_is_not_a_regex() {
        use TokenKind::*;
        assert_eq!(kinds("a / b / c"), vec![Ident, Slash, Ident, Slash, Ident]);
        assert_eq!(kinds("(x) / 2"), vec![LParen, Ident, RParen, Slash, Number]);
        // no closing slash on the line: left as a plain operator
        assert_eq!(kinds("= /\nb"), vec![Eq, Slash, Ident]);
    }

    #[test]
    fn template_literal_is_one_token() {
        use TokenKind::*;
        assert_eq!(kinds("`a ${b} \\` c` x"), vec![Template, Ident]);
    }

    #[test]
    fn unterminated_comment_is_an_error() {
        let err = lex("type A = string;\n/* open").unwrap_err();
        assert_eq!(err.message, "unterminated block comment");
        assert_eq!(err.line, 2);
        assert_eq!(err.column, 1);
    }

    #[test]
    fn unterminated_string_is_an_error() {
        let err = lex("type A = \"open;").unwrap_err();
        assert_eq!(err.message, "unexpected character `\\\"`");
    }

    #[test]
    fn unquote_decodes_escapes() {
        assert_eq!(unquote(r#""a\"b""#), "a\"b");
        assert_eq!(unquote(r"'it\'s'"), "it's");
        assert_eq!(unquote(r#""A\n""#), "A\n");
    }
}
