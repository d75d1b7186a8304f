//! FILENAME: parser/src/lexer.rs
//! PURPOSE: Scans a raw formula string and produces a stream of Tokens.
//! CONTEXT: This is the first stage of the parsing pipeline. It handles
//! whitespace skipping, number literals (integer, decimal, scientific),
//! and A1-style cell references.
//!
//! Cell references are uppercase-only: at most three letters, at most five
//! digits. Anything longer, or a letter run with no digits, is an Illegal
//! token and surfaces as a parse error.

use crate::token::Token;
use std::iter::Peekable;
use std::str::Chars;

pub struct Lexer<'a> {
    input: Peekable<Chars<'a>>,
}

impl<'a> Lexer<'a> {
    pub fn new(input: &'a str) -> Self {
        Lexer {
            input: input.chars().peekable(),
        }
    }

    /// Advances the lexer and returns the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        match self.input.next() {
            Some('+') => Token::Plus,
            Some('-') => Token::Minus,
            Some('*') => Token::Asterisk,
            Some('/') => Token::Slash,
            Some('(') => Token::LParen,
            Some(')') => Token::RParen,

            // Numbers (starts with digit or dot)
            Some(ch) if ch.is_ascii_digit() || ch == '.' => self.read_number(ch),

            // Cell references (starts with an uppercase letter)
            Some(ch) if ch.is_ascii_uppercase() => self.read_cell_ref(ch),

            // End of input
            None => Token::EOF,

            // Unknown character
            Some(ch) => Token::Illegal(ch),
        }
    }

    fn skip_whitespace(&mut self) {
        while let Some(&ch) = self.input.peek() {
            if !ch.is_whitespace() {
                break;
            }
            self.input.next();
        }
    }

    /// Reads a decimal literal: digits, an optional fraction, and an
    /// optional exponent ("1", "2.5", "1e3", "2.5E-2").
    fn read_number(&mut self, first_char: char) -> Token {
        let mut number_str = String::from(first_char);
        let mut has_dot = first_char == '.';

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                number_str.push(ch);
                self.input.next();
            } else if ch == '.' && !has_dot {
                has_dot = true;
                number_str.push(ch);
                self.input.next();
            } else {
                break;
            }
        }

        if matches!(self.input.peek(), Some('e') | Some('E')) {
            number_str.push(self.input.next().unwrap_or('e'));
            if matches!(self.input.peek(), Some('+') | Some('-')) {
                number_str.push(self.input.next().unwrap_or('+'));
            }
            while let Some(&ch) = self.input.peek() {
                if !ch.is_ascii_digit() {
                    break;
                }
                number_str.push(ch);
                self.input.next();
            }
        }

        if let Ok(n) = number_str.parse::<f64>() {
            Token::Number(n)
        } else {
            // Fallback if parsing fails (e.g. just "." or a bare exponent)
            Token::Illegal(first_char)
        }
    }

    /// Reads an A1-style reference: uppercase letters then digits.
    fn read_cell_ref(&mut self, first_char: char) -> Token {
        let mut reference = String::from(first_char);

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_uppercase() {
                reference.push(ch);
                self.input.next();
            } else {
                break;
            }
        }
        let letters = reference.len();

        while let Some(&ch) = self.input.peek() {
            if ch.is_ascii_digit() {
                reference.push(ch);
                self.input.next();
            } else {
                break;
            }
        }
        let digits = reference.len() - letters;

        if letters > 3 || !(1..=5).contains(&digits) {
            return Token::Illegal(first_char);
        }
        Token::CellRef(reference)
    }
}
