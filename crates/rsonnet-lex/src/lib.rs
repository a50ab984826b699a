//! rsonnet-lex - Streaming lexer for Jsonnet source.
//!
//! The lexer is pull-driven: [`Lexer::next_token`] returns one token at a
//! time and never fails for recoverable garbage — unknown characters come
//! back as [`TokenKind::Illegal`] so the parser can report them in context.
//! Only string and text-block syntax violations terminate lexing with a
//! [`LexError`].
//!
//! Tokenization rules follow the Jsonnet reference grammar: JSON numbers,
//! four string flavours (quoted, single-quoted, `@`-verbatim, `|||` text
//! blocks), `//` / `#` / `/* */` comments, and maximal-munch operators
//! (`==` before `=`, `:::` before `::` before `:`). A leading `-` is always
//! the MINUS operator; the parser applies unary negation.

pub mod cursor;
pub mod token;

mod number;
mod string;

pub use cursor::Cursor;
pub use token::{lookup_ident, Token, TokenKind};

use rsonnet_util::Span;
use thiserror::Error;

/// Fatal lexical errors.
///
/// Everything else the lexer can encounter degrades to an `Illegal` token;
/// these conditions leave no sensible way to continue scanning.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum LexError {
    /// A quoted string ran into end of input.
    #[error("{span}: unterminated string literal")]
    UnterminatedString {
        /// Where the string started.
        span: Span,
    },

    /// An escape sequence was not one of the supported forms.
    #[error("{span}: invalid escape sequence: \\{found}")]
    InvalidEscape {
        /// Where the escape occurred.
        span: Span,
        /// The character following the backslash.
        found: char,
    },

    /// `|||` was not followed by a newline.
    #[error("{span}: text block requires a new line after |||")]
    TextBlockMissingNewline {
        /// Where the text block started.
        span: Span,
    },

    /// The first line of a text block was not indented.
    #[error("{span}: text block's first line must start with whitespace")]
    TextBlockMissingIndent {
        /// Where the text block started.
        span: Span,
    },

    /// A text block line broke the indentation without closing the block.
    #[error("{span}: text block not terminated with |||")]
    TextBlockNotTerminated {
        /// Where the text block started.
        span: Span,
    },

    /// End of input inside a string or text block.
    #[error("{span}: unexpected end of file")]
    UnexpectedEof {
        /// Where the unterminated construct started.
        span: Span,
    },
}

/// Result type for lexer operations.
pub type LexResult<T> = Result<T, LexError>;

/// The Jsonnet lexer.
///
/// # Example
///
/// ```
/// use rsonnet_lex::{Lexer, TokenKind};
///
/// let mut lexer = Lexer::new("local x = 1;");
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Local);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Ident);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eq);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Number);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Semicolon);
/// assert_eq!(lexer.next_token().unwrap().kind, TokenKind::Eof);
/// ```
pub struct Lexer<'a> {
    pub(crate) cursor: Cursor<'a>,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer over the given source text.
    pub fn new(source: &'a str) -> Self {
        Self {
            cursor: Cursor::new(source),
        }
    }

    /// Returns the next token, or `Eof` once the input is exhausted.
    ///
    /// # Errors
    ///
    /// Returns a [`LexError`] for unterminated strings or malformed text
    /// blocks; all other problems become `Illegal` tokens.
    pub fn next_token(&mut self) -> LexResult<Token> {
        self.skip_whitespace_and_comments();

        let span = self.cursor.span();

        if self.cursor.is_at_end() {
            return Ok(Token::eof(span));
        }

        let c = self.cursor.current_char();
        let token = match c {
            '=' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::new(TokenKind::EqEq, "==", span)
                } else {
                    Token::new(TokenKind::Eq, "=", span)
                }
            }
            '+' => {
                self.cursor.advance();
                Token::new(TokenKind::Plus, "+", span)
            }
            '-' => {
                self.cursor.advance();
                Token::new(TokenKind::Minus, "-", span)
            }
            '*' => {
                self.cursor.advance();
                Token::new(TokenKind::Star, "*", span)
            }
            '/' => {
                self.cursor.advance();
                Token::new(TokenKind::Slash, "/", span)
            }
            '%' => {
                self.cursor.advance();
                Token::new(TokenKind::Percent, "%", span)
            }
            '<' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::new(TokenKind::Le, "<=", span)
                } else if self.cursor.match_char('<') {
                    Token::new(TokenKind::Shl, "<<", span)
                } else {
                    Token::new(TokenKind::Lt, "<", span)
                }
            }
            '>' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::new(TokenKind::Ge, ">=", span)
                } else if self.cursor.match_char('>') {
                    Token::new(TokenKind::Shr, ">>", span)
                } else {
                    Token::new(TokenKind::Gt, ">", span)
                }
            }
            '&' => {
                self.cursor.advance();
                if self.cursor.match_char('&') {
                    Token::new(TokenKind::AndAnd, "&&", span)
                } else {
                    Token::new(TokenKind::Amp, "&", span)
                }
            }
            '|' => {
                if self.cursor.peek_char(1) == '|' && self.cursor.peek_char(2) == '|' {
                    let literal = self.lex_text_block()?;
                    Token::new(TokenKind::Str, literal, span)
                } else {
                    self.cursor.advance();
                    if self.cursor.match_char('|') {
                        Token::new(TokenKind::OrOr, "||", span)
                    } else {
                        Token::new(TokenKind::Pipe, "|", span)
                    }
                }
            }
            '!' => {
                self.cursor.advance();
                if self.cursor.match_char('=') {
                    Token::new(TokenKind::NotEq, "!=", span)
                } else {
                    Token::new(TokenKind::Not, "!", span)
                }
            }
            '^' => {
                self.cursor.advance();
                Token::new(TokenKind::Caret, "^", span)
            }
            '~' => {
                self.cursor.advance();
                Token::new(TokenKind::Tilde, "~", span)
            }
            '.' => {
                self.cursor.advance();
                Token::new(TokenKind::Dot, ".", span)
            }
            ',' => {
                self.cursor.advance();
                Token::new(TokenKind::Comma, ",", span)
            }
            ':' => self.lex_colons(span),
            ';' => {
                self.cursor.advance();
                Token::new(TokenKind::Semicolon, ";", span)
            }
            '(' => {
                self.cursor.advance();
                Token::new(TokenKind::LParen, "(", span)
            }
            ')' => {
                self.cursor.advance();
                Token::new(TokenKind::RParen, ")", span)
            }
            '{' => {
                self.cursor.advance();
                Token::new(TokenKind::LBrace, "{", span)
            }
            '}' => {
                self.cursor.advance();
                Token::new(TokenKind::RBrace, "}", span)
            }
            '[' => {
                self.cursor.advance();
                Token::new(TokenKind::LBracket, "[", span)
            }
            ']' => {
                self.cursor.advance();
                Token::new(TokenKind::RBracket, "]", span)
            }
            '$' => {
                self.cursor.advance();
                Token::new(TokenKind::Dollar, "$", span)
            }
            '"' | '\'' => {
                let literal = self.lex_string(false)?;
                Token::new(TokenKind::Str, literal, span)
            }
            '@' if matches!(self.cursor.peek_char(1), '"' | '\'') => {
                self.cursor.advance();
                let literal = self.lex_string(true)?;
                Token::new(TokenKind::Str, literal, span)
            }
            c if c.is_ascii_alphabetic() || c == '_' => self.lex_identifier(span),
            c if c.is_ascii_digit() => {
                let literal = self.lex_number();
                Token::new(TokenKind::Number, literal, span)
            }
            c => {
                self.cursor.advance();
                Token::new(TokenKind::Illegal, c.to_string(), span)
            }
        };

        Ok(token)
    }

    /// Lexes the whole input into a token vector, `Eof` included last.
    ///
    /// Convenience for tests and for the driver's `--ast`-free paths; the
    /// parser itself pulls tokens one at a time.
    pub fn tokenize(mut self) -> LexResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token.kind == TokenKind::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    /// Lexes an identifier or keyword.
    fn lex_identifier(&mut self, span: Span) -> Token {
        let mut literal = String::new();
        while !self.cursor.is_at_end() {
            let c = self.cursor.current_char();
            if c.is_ascii_alphanumeric() || c == '_' {
                literal.push(c);
                self.cursor.advance();
            } else {
                break;
            }
        }
        let kind = lookup_ident(&literal);
        Token::new(kind, literal, span)
    }

    /// Lexes a run of colons: `:::` > `::` > `:`.
    fn lex_colons(&mut self, span: Span) -> Token {
        let mut count = 0;
        while count < 3 && self.cursor.current_char() == ':' {
            count += 1;
            self.cursor.advance();
        }
        match count {
            1 => Token::new(TokenKind::Colon, ":", span),
            2 => Token::new(TokenKind::ColonColon, "::", span),
            _ => Token::new(TokenKind::ColonColonColon, ":::", span),
        }
    }

    /// Skips whitespace and all three comment forms.
    fn skip_whitespace_and_comments(&mut self) {
        loop {
            while !self.cursor.is_at_end() && self.cursor.current_char().is_ascii_whitespace() {
                self.cursor.advance();
            }

            let c = self.cursor.current_char();
            if c == '#' {
                self.skip_line_comment();
            } else if c == '/' && self.cursor.peek_char(1) == '/' {
                self.skip_line_comment();
            } else if c == '/' && self.cursor.peek_char(1) == '*' {
                self.skip_block_comment();
            } else {
                return;
            }
        }
    }

    /// Skips to the end of the current line.
    fn skip_line_comment(&mut self) {
        while !self.cursor.is_at_end() && self.cursor.current_char() != '\n' {
            self.cursor.advance();
        }
    }

    /// Skips a `/* ... */` comment. No nesting; an unclosed comment runs to
    /// end of input.
    fn skip_block_comment(&mut self) {
        self.cursor.advance_n(2);
        while !self.cursor.is_at_end() {
            if self.cursor.current_char() == '*' && self.cursor.peek_char(1) == '/' {
                self.cursor.advance_n(2);
                return;
            }
            self.cursor.advance();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<TokenKind> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    fn literals(source: &str) -> Vec<String> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.literal)
            .collect()
    }

    #[test]
    fn test_lex_keywords_and_idents() {
        assert_eq!(
            kinds("local foo = null"),
            vec![
                TokenKind::Local,
                TokenKind::Ident,
                TokenKind::Eq,
                TokenKind::Null,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_two_char_operators() {
        assert_eq!(
            kinds("== != <= >= && || << >>"),
            vec![
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Le,
                TokenKind::Ge,
                TokenKind::AndAnd,
                TokenKind::OrOr,
                TokenKind::Shl,
                TokenKind::Shr,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_single_char_operators() {
        assert_eq!(
            kinds("= + - * / % < > ! & | ^ ~ . $"),
            vec![
                TokenKind::Eq,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Percent,
                TokenKind::Lt,
                TokenKind::Gt,
                TokenKind::Not,
                TokenKind::Amp,
                TokenKind::Pipe,
                TokenKind::Caret,
                TokenKind::Tilde,
                TokenKind::Dot,
                TokenKind::Dollar,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_lex_colons() {
        assert_eq!(
            kinds("a: b:: c::: d"),
            vec![
                TokenKind::Ident,
                TokenKind::Colon,
                TokenKind::Ident,
                TokenKind::ColonColon,
                TokenKind::Ident,
                TokenKind::ColonColonColon,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_four_colons_split() {
        assert_eq!(
            kinds("::::"),
            vec![TokenKind::ColonColonColon, TokenKind::Colon, TokenKind::Eof]
        );
    }

    #[test]
    fn test_minus_is_always_minus() {
        // The parser applies unary negation; the lexer never folds the
        // sign into the number.
        assert_eq!(
            kinds("-42"),
            vec![TokenKind::Minus, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        assert_eq!(
            kinds("1 // one\n# two\n/* three */ 2"),
            vec![TokenKind::Number, TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_block_comment_no_nesting() {
        assert_eq!(
            kinds("/* a /* b */ 1"),
            vec![TokenKind::Number, TokenKind::Eof]
        );
    }

    #[test]
    fn test_illegal_token() {
        let tokens = Lexer::new("?").tokenize().unwrap();
        assert_eq!(tokens[0].kind, TokenKind::Illegal);
        assert_eq!(tokens[0].literal, "?");
    }

    #[test]
    fn test_token_spans() {
        let tokens = Lexer::new("a\n  b").tokenize().unwrap();
        assert_eq!(tokens[0].span, rsonnet_util::Span::new(1, 1));
        assert_eq!(tokens[1].span, rsonnet_util::Span::new(2, 3));
    }

    #[test]
    fn test_pipes_vs_text_block() {
        assert_eq!(
            kinds("a || b"),
            vec![
                TokenKind::Ident,
                TokenKind::OrOr,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
        assert_eq!(
            kinds("a | b"),
            vec![
                TokenKind::Ident,
                TokenKind::Pipe,
                TokenKind::Ident,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_ident_literals() {
        assert_eq!(literals("foo_1 _bar"), vec!["foo_1", "_bar", ""]);
    }
}
