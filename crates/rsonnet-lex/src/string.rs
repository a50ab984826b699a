//! String and text-block lexing.
//!
//! Quoted strings decode escapes as they scan; verbatim strings (`@"..."`)
//! take every character literally until the closing quote. Text blocks
//! (`||| ... |||`) strip the indentation established by their first
//! non-blank line.

use crate::{LexError, LexResult, Lexer};

impl<'a> Lexer<'a> {
    /// Lexes a quoted string literal, single- or double-quoted.
    ///
    /// The cursor must be on the opening quote. Returns the decoded
    /// content; `verbatim` disables escape processing.
    ///
    /// # Errors
    ///
    /// [`LexError::UnterminatedString`] at end of input,
    /// [`LexError::InvalidEscape`] on an unsupported escape.
    pub(crate) fn lex_string(&mut self, verbatim: bool) -> LexResult<String> {
        let span = self.cursor.span();
        let quote = self.cursor.current_char();
        self.cursor.advance();

        let mut literal = String::new();
        loop {
            if self.cursor.is_at_end() {
                return Err(LexError::UnterminatedString { span });
            }
            let c = self.cursor.current_char();
            if c == quote {
                self.cursor.advance();
                return Ok(literal);
            }
            if !verbatim && c == '\\' {
                self.cursor.advance();
                literal.push(self.lex_escape()?);
            } else {
                literal.push(c);
                self.cursor.advance();
            }
        }
    }

    /// Decodes one escape sequence; the cursor is just past the backslash.
    fn lex_escape(&mut self) -> LexResult<char> {
        let span = self.cursor.span();
        if self.cursor.is_at_end() {
            return Err(LexError::UnexpectedEof { span });
        }
        let c = self.cursor.current_char();
        self.cursor.advance();
        match c {
            '"' => Ok('"'),
            '\'' => Ok('\''),
            '\\' => Ok('\\'),
            '/' => Ok('/'),
            'b' => Ok('\u{0008}'),
            'f' => Ok('\u{000C}'),
            'n' => Ok('\n'),
            'r' => Ok('\r'),
            't' => Ok('\t'),
            'u' => {
                let mut codepoint = 0u32;
                for _ in 0..4 {
                    let h = self.cursor.current_char();
                    let digit = h
                        .to_digit(16)
                        .ok_or(LexError::InvalidEscape { span, found: h })?;
                    codepoint = codepoint * 16 + digit;
                    self.cursor.advance();
                }
                char::from_u32(codepoint).ok_or(LexError::InvalidEscape { span, found: 'u' })
            }
            found => Err(LexError::InvalidEscape { span, found }),
        }
    }

    /// Lexes a `|||` text block. The cursor must be on the first `|`.
    ///
    /// After `|||`, horizontal whitespace is chomped and a newline is
    /// required. Leading blank lines are preserved. The first non-blank
    /// line fixes the indentation, which every following line must repeat
    /// (and which is stripped from the captured text) until a line of less
    /// indentation begins with `|||`.
    pub(crate) fn lex_text_block(&mut self) -> LexResult<String> {
        let span = self.cursor.span();
        self.cursor.advance_n(3);

        while matches!(self.cursor.current_char(), ' ' | '\t' | '\r') {
            self.cursor.advance();
        }
        if self.cursor.current_char() != '\n' {
            return Err(LexError::TextBlockMissingNewline { span });
        }
        self.cursor.advance();

        let mut literal = String::new();

        // Blank lines before the first content line are kept verbatim.
        while self.cursor.current_char() == '\n' {
            self.cursor.advance();
            literal.push('\n');
        }

        // The first content line establishes the indentation.
        let mut indent = String::new();
        while matches!(self.cursor.current_char(), ' ' | '\t') {
            indent.push(self.cursor.current_char());
            self.cursor.advance();
        }
        if indent.is_empty() {
            return Err(LexError::TextBlockMissingIndent { span });
        }
        while self.cursor.current_char() != '\n' {
            if self.cursor.is_at_end() {
                return Err(LexError::UnexpectedEof { span });
            }
            literal.push(self.cursor.current_char());
            self.cursor.advance();
        }
        literal.push('\n');
        self.cursor.advance();

        'lines: loop {
            if self.cursor.is_at_end() {
                return Err(LexError::UnexpectedEof { span });
            }
            // Consume the indentation; a shorter line must close the block.
            for expected in indent.chars() {
                if self.cursor.current_char() != expected {
                    if self.cursor.current_char() == '|'
                        && self.cursor.peek_char(1) == '|'
                        && self.cursor.peek_char(2) == '|'
                    {
                        self.cursor.advance_n(3);
                        break 'lines;
                    }
                    return Err(LexError::TextBlockNotTerminated { span });
                }
                self.cursor.advance();
            }
            while self.cursor.current_char() != '\n' {
                if self.cursor.is_at_end() {
                    return Err(LexError::UnexpectedEof { span });
                }
                literal.push(self.cursor.current_char());
                self.cursor.advance();
            }
            literal.push('\n');
            self.cursor.advance();
        }

        Ok(literal)
    }
}
