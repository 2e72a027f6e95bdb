use crate::error::LexError;
use crate::token::{Op, Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

#[must_use]
/// Check if `ident` is a valid variable or constant name
///
/// # Examples
///
/// ```
/// # use fieldexpr::is_identifier;
///
/// assert_eq!(is_identifier("__abc3"), true);
/// assert_eq!(is_identifier("34zb"), false);
/// ```
pub fn is_identifier(ident: &str) -> bool {
    let mut chars = ident.chars();
    // Check first char
    if !chars.next().map_or(false, is_identifier_start) {
        return false;
    }
    // Check all others
    chars.all(is_identifier_part)
}

/// Splits the input into tokens on demand.
///
/// The lexer yields every token of the input followed by a single
/// [`TokenKind::End`], then stops. It also stops after the first error.
pub struct Lexer<'a> {
    source: &'a str,
    input: Peekable<CharIndices<'a>>,
    finished: bool,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str) -> Lexer<'a> {
        Lexer {
            source,
            input: source.char_indices().peekable(),
            finished: false,
        }
    }

    fn next_token(&mut self) -> Result<Token, LexError> {
        while let Some(&(_, c)) = self.input.peek() {
            if c.is_ascii_whitespace() {
                self.input.next();
            } else {
                break;
            }
        }

        let (offset, c) = match self.input.next() {
            Some(next) => next,
            None => {
                return Ok(Token {
                    kind: TokenKind::End,
                    offset: self.source.len(),
                })
            }
        };

        let kind = match c {
            c if c.is_ascii_digit() => self.number(offset)?,
            '.' if self.peek_is(|c| c.is_ascii_digit()) => self.number(offset)?,
            c if is_identifier_start(c) => {
                let end = self.eat_while(offset + 1, is_identifier_part);
                TokenKind::Identifier(self.source[offset..end].to_string())
            }
            '+' => TokenKind::Operator(Op::Plus),
            '-' => TokenKind::Operator(Op::Minus),
            '*' => TokenKind::Operator(Op::Mul),
            '/' => TokenKind::Operator(Op::Div),
            '^' => TokenKind::Operator(Op::Pow),
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ',' => TokenKind::Comma,
            '<' => TokenKind::Operator(self.followed_by('=', Op::LessEqual, Op::Less)),
            '>' => TokenKind::Operator(self.followed_by('=', Op::GreaterEqual, Op::Greater)),
            '!' => TokenKind::Operator(self.followed_by('=', Op::NotEqual, Op::Not)),
            '=' => TokenKind::Operator(self.pair('=', Op::Equal, offset)?),
            '&' => TokenKind::Operator(self.pair('&', Op::And, offset)?),
            '|' => TokenKind::Operator(self.pair('|', Op::Or, offset)?),
            other => {
                return Err(LexError::UnexpectedCharacter { ch: other, offset });
            }
        };
        Ok(Token { kind, offset })
    }

    /// Lex a numeric literal whose first character has already been consumed
    fn number(&mut self, start: usize) -> Result<TokenKind, LexError> {
        let mut end = start + 1;
        let mut seen_dot = self.source[start..].starts_with('.');
        let mut seen_exponent = false;
        while let Some(&(i, c)) = self.input.peek() {
            if c.is_ascii_digit() {
                self.input.next();
                end = i + 1;
            } else if c == '.' && !seen_dot && !seen_exponent {
                seen_dot = true;
                self.input.next();
                end = i + 1;
            } else if (c == 'e' || c == 'E') && !seen_exponent {
                seen_exponent = true;
                self.input.next();
                end = i + 1;
                if let Some(&(i, '+')) | Some(&(i, '-')) = self.input.peek() {
                    self.input.next();
                    end = i + 1;
                }
            } else {
                break;
            }
        }

        // Anything glued to the literal makes it malformed: `3eff`, `1.2.3`, `2x`
        let glued = self.peek_is(|c| c == '.' || is_identifier_part(c));
        if glued {
            end = self.eat_while(end, |c| c == '.' || is_identifier_part(c));
        }

        let literal = &self.source[start..end];
        match literal.parse::<f64>() {
            Ok(value) if !glued => Ok(TokenKind::Number(value)),
            _ => Err(LexError::MalformedNumber {
                literal: literal.to_string(),
                offset: start,
            }),
        }
    }

    /// Consume characters matching `accept`, returning the end offset
    fn eat_while(&mut self, mut end: usize, accept: impl Fn(char) -> bool) -> usize {
        while let Some(&(i, c)) = self.input.peek() {
            if !accept(c) {
                break;
            }
            self.input.next();
            end = i + c.len_utf8();
        }
        end
    }

    fn peek_is(&mut self, accept: impl Fn(char) -> bool) -> bool {
        self.input.peek().map_or(false, |&(_, c)| accept(c))
    }

    fn followed_by(&mut self, next: char, long: Op, short: Op) -> Op {
        if self.peek_is(|c| c == next) {
            self.input.next();
            long
        } else {
            short
        }
    }

    /// Lex the second half of a two character operator such as `&&`
    fn pair(&mut self, next: char, op: Op, offset: usize) -> Result<Op, LexError> {
        if self.peek_is(|c| c == next) {
            self.input.next();
            Ok(op)
        } else {
            let ch = self.source[offset..].chars().next().unwrap_or(next);
            Err(LexError::UnexpectedCharacter { ch, offset })
        }
    }
}

impl<'a> Iterator for Lexer<'a> {
    type Item = Result<Token, LexError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let token = self.next_token();
        self.finished = !matches!(
            token,
            Ok(Token {
                kind: TokenKind::Number(_)
                    | TokenKind::Identifier(_)
                    | TokenKind::Operator(_)
                    | TokenKind::LParen
                    | TokenKind::RParen
                    | TokenKind::Comma,
                ..
            })
        );
        Some(token)
    }
}

/// Check if `c` can appear at the first character of an identifier
fn is_identifier_start(c: char) -> bool {
    c == '_' || c.is_ascii_alphabetic()
}

/// Check if `c` can appear inside an identifier
fn is_identifier_part(c: char) -> bool {
    c == '_' || c.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn kinds(input: &str) -> Result<Vec<TokenKind>, LexError> {
        Lexer::new(input).map(|t| t.map(|t| t.kind)).collect()
    }

    #[test_case("2 + 2" => Ok(vec![TokenKind::Number(2.0), TokenKind::Operator(Op::Plus), TokenKind::Number(2.0), TokenKind::End]) ; "addition is lexed properly")]
    #[test_case("2+2" => Ok(vec![TokenKind::Number(2.0), TokenKind::Operator(Op::Plus), TokenKind::Number(2.0), TokenKind::End]) ; "spaces are optional")]
    #[test_case("" => Ok(vec![TokenKind::End]) ; "empty input")]
    #[test_case("pow(x,\t1)" => Ok(vec![
        TokenKind::Identifier("pow".into()),
        TokenKind::LParen,
        TokenKind::Identifier("x".into()),
        TokenKind::Comma,
        TokenKind::Number(1.0),
        TokenKind::RParen,
        TokenKind::End,
    ]) ; "function call")]
    #[test_case("a<=b>=c<d>e==f!=g&&h||!i" => Ok(vec![
        TokenKind::Identifier("a".into()),
        TokenKind::Operator(Op::LessEqual),
        TokenKind::Identifier("b".into()),
        TokenKind::Operator(Op::GreaterEqual),
        TokenKind::Identifier("c".into()),
        TokenKind::Operator(Op::Less),
        TokenKind::Identifier("d".into()),
        TokenKind::Operator(Op::Greater),
        TokenKind::Identifier("e".into()),
        TokenKind::Operator(Op::Equal),
        TokenKind::Identifier("f".into()),
        TokenKind::Operator(Op::NotEqual),
        TokenKind::Identifier("g".into()),
        TokenKind::Operator(Op::And),
        TokenKind::Identifier("h".into()),
        TokenKind::Operator(Op::Or),
        TokenKind::Operator(Op::Not),
        TokenKind::Identifier("i".into()),
        TokenKind::End,
    ]) ; "comparison and logic operators")]
    fn lex(input: &str) -> Result<Vec<TokenKind>, LexError> {
        kinds(input)
    }

    #[test_case("1" => 1.0 ; "integer")]
    #[test_case("1.5" => 1.5 ; "decimal")]
    #[test_case(".5" => 0.5 ; "leading dot")]
    #[test_case("5." => 5.0 ; "trailing dot")]
    #[test_case("1e3" => 1000.0 ; "exponent")]
    #[test_case("2.5E-2" => 0.025 ; "negative exponent")]
    #[test_case("4e+1" => 40.0 ; "positive exponent")]
    fn numbers(input: &str) -> f64 {
        match kinds(input).unwrap()[0] {
            TokenKind::Number(value) => value,
            ref other => panic!("expected a number, got {:?}", other),
        }
    }

    #[test_case("3eff" => LexError::MalformedNumber { literal: "3eff".into(), offset: 0 } ; "trailing letters")]
    #[test_case("1 + 1.2.3" => LexError::MalformedNumber { literal: "1.2.3".into(), offset: 4 } ; "two dots")]
    #[test_case("2x" => LexError::MalformedNumber { literal: "2x".into(), offset: 0 } ; "implicit multiplication")]
    #[test_case("1e" => LexError::MalformedNumber { literal: "1e".into(), offset: 0 } ; "empty exponent")]
    #[test_case("a = b" => LexError::UnexpectedCharacter { ch: '=', offset: 2 } ; "single equal")]
    #[test_case("a & b" => LexError::UnexpectedCharacter { ch: '&', offset: 2 } ; "single ampersand")]
    #[test_case("a | b" => LexError::UnexpectedCharacter { ch: '|', offset: 2 } ; "single pipe")]
    #[test_case("x @ 2" => LexError::UnexpectedCharacter { ch: '@', offset: 2 } ; "at sign")]
    #[test_case("é" => LexError::UnexpectedCharacter { ch: 'é', offset: 0 } ; "non ascii")]
    fn errors(input: &str) -> LexError {
        kinds(input).unwrap_err()
    }

    #[test]
    fn offsets() {
        let offsets: Vec<usize> = Lexer::new("  ab *(3)")
            .map(|t| t.unwrap().offset)
            .collect();
        assert_eq!(offsets, vec![2, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn stops_after_end_or_error() {
        let mut lexer = Lexer::new("x");
        assert!(lexer.next().is_some());
        assert_eq!(lexer.next().unwrap().unwrap().kind, TokenKind::End);
        assert!(lexer.next().is_none());

        let mut lexer = Lexer::new("$ x");
        assert!(lexer.next().unwrap().is_err());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn identifiers() {
        for ident in &["_______", "abc", "a__45__bc", "x1", "_t"] {
            assert!(is_identifier(ident));
        }
        for not_ident in &["a-bc", "@bc", "6bc", "", "a.b", "abc[2]"] {
            assert!(!is_identifier(not_ident));
        }
    }
}
