use kirc_util::Span;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("unexpected character '{ch}' at byte {offset}")]
    UnexpectedChar { ch: char, offset: u32 },

    #[error("unterminated block comment starting at byte {offset}")]
    UnterminatedComment { offset: u32 },

    #[error("invalid integer literal '{text}' at {span:?}")]
    InvalidInt { text: String, span: Span },

    #[error("unexpected token {found}, expected {expected}")]
    UnexpectedToken { found: String, expected: String },

    #[error("unexpected end of input, expected {expected}")]
    UnexpectedEof { expected: String },
}
