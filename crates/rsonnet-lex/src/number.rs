//! Number lexing.
//!
//! Numbers follow the JSON grammar: integer part (`0` or `[1-9][0-9]*`),
//! optional fraction, optional exponent. The source spelling is preserved
//! in the token; the parser decides int versus float. A leading `-` is
//! never consumed here.

use crate::Lexer;

impl<'a> Lexer<'a> {
    /// Lexes a number literal starting at the current digit and returns
    /// its source spelling.
    ///
    /// The fraction dot and the exponent marker are consumed only when the
    /// lookahead confirms they belong to the number, so `1.foo` leaves the
    /// dot for the parser and `1e` stops at `1`.
    pub(crate) fn lex_number(&mut self) -> String {
        let mut literal = String::new();

        if self.cursor.current_char() == '0' {
            literal.push('0');
            self.cursor.advance();
        } else {
            while self.cursor.current_char().is_ascii_digit() {
                literal.push(self.cursor.current_char());
                self.cursor.advance();
            }
        }

        if self.cursor.current_char() == '.' && self.cursor.peek_char(1).is_ascii_digit() {
            literal.push('.');
            self.cursor.advance();
            while self.cursor.current_char().is_ascii_digit() {
                literal.push(self.cursor.current_char());
                self.cursor.advance();
            }
        }

        if matches!(self.cursor.current_char(), 'e' | 'E') {
            let sign = self.cursor.peek_char(1);
            if sign.is_ascii_digit() {
                literal.push(self.cursor.current_char());
                self.cursor.advance();
            } else if matches!(sign, '+' | '-') && self.cursor.peek_char(2).is_ascii_digit() {
                literal.push(self.cursor.current_char());
                literal.push(sign);
                self.cursor.advance_n(2);
            } else {
                return literal;
            }
            while self.cursor.current_char().is_ascii_digit() {
                literal.push(self.cursor.current_char());
                self.cursor.advance();
            }
        }

        literal
    }
}

#[cfg(test)]
mod tests {
    use crate::{Lexer, TokenKind};

    fn lex_number(source: &str) -> String {
        let token = Lexer::new(source).next_token().unwrap();
        assert_eq!(token.kind, TokenKind::Number);
        token.literal
    }

    #[test]
    fn test_integers() {
        assert_eq!(lex_number("0"), "0");
        assert_eq!(lex_number("7"), "7");
        assert_eq!(lex_number("1234567890"), "1234567890");
    }

    #[test]
    fn test_leading_zero_stops() {
        // JSON forbids 01; the lexer stops after the zero.
        let tokens = Lexer::new("01").tokenize().unwrap();
        assert_eq!(tokens[0].literal, "0");
        assert_eq!(tokens[1].literal, "1");
    }

    #[test]
    fn test_fractions() {
        assert_eq!(lex_number("3.14"), "3.14");
        assert_eq!(lex_number("0.5"), "0.5");
    }

    #[test]
    fn test_exponents() {
        assert_eq!(lex_number("1e10"), "1e10");
        assert_eq!(lex_number("1E10"), "1E10");
        assert_eq!(lex_number("2.5e-3"), "2.5e-3");
        assert_eq!(lex_number("2.5E+3"), "2.5E+3");
    }

    #[test]
    fn test_dot_without_digit_not_consumed() {
        let tokens = Lexer::new("1.foo").tokenize().unwrap();
        assert_eq!(tokens[0].literal, "1");
        assert_eq!(tokens[1].kind, TokenKind::Dot);
        assert_eq!(tokens[2].literal, "foo");
    }

    #[test]
    fn test_bare_exponent_not_consumed() {
        let tokens = Lexer::new("1e").tokenize().unwrap();
        assert_eq!(tokens[0].literal, "1");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[1].literal, "e");
    }

    #[test]
    fn test_exponent_sign_without_digit_not_consumed() {
        let tokens = Lexer::new("1e+x").tokenize().unwrap();
        assert_eq!(tokens[0].literal, "1");
        assert_eq!(tokens[1].kind, TokenKind::Ident);
        assert_eq!(tokens[2].kind, TokenKind::Plus);
    }
}
