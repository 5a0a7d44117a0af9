//! Cursor-based lexer.
//!
//! Out of the core's scope (spec.md §1 names the lexer an external
//! collaborator); kept small and single-purpose so `kirc-front::parse` has
//! something real to run against.

use crate::error::ParseError;
use kirc_util::Span;

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Ident(String),
    Int(i32),
    KwInt,
    KwVoid,
    KwConst,
    KwIf,
    KwElse,
    KwWhile,
    KwBreak,
    KwContinue,
    KwReturn,
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Not,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    Ne,
    AndAnd,
    OrOr,
    Eof,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

struct Cursor<'a> {
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> Cursor<'a> {
    fn new(src: &'a str) -> Self {
        Self {
            bytes: src.as_bytes(),
            pos: 0,
        }
    }

    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }
}

pub fn lex(src: &str) -> Result<Vec<Token>, ParseError> {
    let mut cur = Cursor::new(src);
    let mut tokens = Vec::new();

    loop {
        skip_trivia(&mut cur)?;
        let start = cur.pos;
        let Some(c) = cur.peek() else {
            tokens.push(Token {
                kind: TokenKind::Eof,
                span: Span::new(start, start),
            });
            break;
        };

        let kind = match c {
            b'(' => {
                cur.bump();
                TokenKind::LParen
            }
            b')' => {
                cur.bump();
                TokenKind::RParen
            }
            b'{' => {
                cur.bump();
                TokenKind::LBrace
            }
            b'}' => {
                cur.bump();
                TokenKind::RBrace
            }
            b',' => {
                cur.bump();
                TokenKind::Comma
            }
            b';' => {
                cur.bump();
                TokenKind::Semi
            }
            b'+' => {
                cur.bump();
                TokenKind::Plus
            }
            b'-' => {
                cur.bump();
                TokenKind::Minus
            }
            b'*' => {
                cur.bump();
                TokenKind::Star
            }
            b'/' => {
                cur.bump();
                TokenKind::Slash
            }
            b'%' => {
                cur.bump();
                TokenKind::Percent
            }
            b'=' => {
                cur.bump();
                if cur.peek() == Some(b'=') {
                    cur.bump();
                    TokenKind::EqEq
                } else {
                    TokenKind::Assign
                }
            }
            b'!' => {
                cur.bump();
                if cur.peek() == Some(b'=') {
                    cur.bump();
                    TokenKind::Ne
                } else {
                    TokenKind::Not
                }
            }
            b'<' => {
                cur.bump();
                if cur.peek() == Some(b'=') {
                    cur.bump();
                    TokenKind::Le
                } else {
                    TokenKind::Lt
                }
            }
            b'>' => {
                cur.bump();
                if cur.peek() == Some(b'=') {
                    cur.bump();
                    TokenKind::Ge
                } else {
                    TokenKind::Gt
                }
            }
            b'&' if cur.peek_at(1) == Some(b'&') => {
                cur.bump();
                cur.bump();
                TokenKind::AndAnd
            }
            b'|' if cur.peek_at(1) == Some(b'|') => {
                cur.bump();
                cur.bump();
                TokenKind::OrOr
            }
            b'0'..=b'9' => lex_number(&mut cur, src)?,
            b'a'..=b'z' | b'A'..=b'Z' | b'_' => lex_ident_or_keyword(&mut cur, src),
            other => {
                return Err(ParseError::UnexpectedChar {
                    ch: other as char,
                    offset: start,
                });
            }
        };

        tokens.push(Token {
            kind,
            span: Span::new(start, cur.pos),
        });
    }

    Ok(tokens)
}

fn skip_trivia(cur: &mut Cursor) -> Result<(), ParseError> {
    loop {
        match cur.peek() {
            Some(b' ') | Some(b'\t') | Some(b'\r') | Some(b'\n') => {
                cur.bump();
            }
            Some(b'/') if cur.peek_at(1) == Some(b'/') => {
                while !matches!(cur.peek(), None | Some(b'\n')) {
                    cur.bump();
                }
            }
            Some(b'/') if cur.peek_at(1) == Some(b'*') => {
                let start = cur.pos;
                cur.bump();
                cur.bump();
                loop {
                    match cur.peek() {
                        None => return Err(ParseError::UnterminatedComment { offset: start }),
                        Some(b'*') if cur.peek_at(1) == Some(b'/') => {
                            cur.bump();
                            cur.bump();
                            break;
                        }
                        Some(_) => {
                            cur.bump();
                        }
                    }
                }
            }
            _ => break,
        }
    }
    Ok(())
}

fn lex_number(cur: &mut Cursor, src: &str) -> Result<TokenKind, ParseError> {
    let start = cur.pos;
    // Octal/hex literals are part of full SysY; this spec's source language
    // (spec.md §3.1) only needs decimal integer literals.
    while matches!(cur.peek(), Some(b'0'..=b'9')) {
        cur.bump();
    }
    let text = &src[start as usize..cur.pos as usize];
    text.parse::<i32>().map(TokenKind::Int).map_err(|_| {
        ParseError::InvalidInt {
            text: text.to_string(),
            span: Span::new(start, cur.pos),
        }
    })
}

fn lex_ident_or_keyword(cur: &mut Cursor, src: &str) -> TokenKind {
    let start = cur.pos;
    while matches!(cur.peek(), Some(b'0'..=b'9' | b'a'..=b'z' | b'A'..=b'Z' | b'_')) {
        cur.bump();
    }
    let text = &src[start as usize..cur.pos as usize];
    match text {
        "int" => TokenKind::KwInt,
        "void" => TokenKind::KwVoid,
        "const" => TokenKind::KwConst,
        "if" => TokenKind::KwIf,
        "else" => TokenKind::KwElse,
        "while" => TokenKind::KwWhile,
        "break" => TokenKind::KwBreak,
        "continue" => TokenKind::KwContinue,
        "return" => TokenKind::KwReturn,
        _ => TokenKind::Ident(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(src: &str) -> Vec<TokenKind> {
        lex(src).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn lexes_keywords_and_punctuation() {
        assert_eq!(
            kinds("int main() { return 0; }"),
            vec![
                TokenKind::KwInt,
                TokenKind::Ident("main".into()),
                TokenKind::LParen,
                TokenKind::RParen,
                TokenKind::LBrace,
                TokenKind::KwReturn,
                TokenKind::Int(0),
                TokenKind::Semi,
                TokenKind::RBrace,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn lexes_compound_operators() {
        assert_eq!(
            kinds("a <= b && c != d"),
            vec![
                TokenKind::Ident("a".into()),
                TokenKind::Le,
                TokenKind::Ident("b".into()),
                TokenKind::AndAnd,
                TokenKind::Ident("c".into()),
                TokenKind::Ne,
                TokenKind::Ident("d".into()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn skips_line_and_block_comments() {
        assert_eq!(
            kinds("int x; // trailing\n/* block */ int y;"),
            vec![
                TokenKind::KwInt,
                TokenKind::Ident("x".into()),
                TokenKind::Semi,
                TokenKind::KwInt,
                TokenKind::Ident("y".into()),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn rejects_unterminated_block_comment() {
        assert!(matches!(
            lex("/* never closes"),
            Err(ParseError::UnterminatedComment { .. })
        ));
    }
}
