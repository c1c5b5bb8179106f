use std::fmt::Display;
use std::rc::Rc;

use thiserror::Error;

use crate::lexer::{Token, TokenKind};

#[derive(Debug, PartialEq, Clone, Error)]
pub enum ParseError {
    #[error("unexpected end of input, expected {expected}")]
    PrematureEndOfInput { expected: Expected },
    #[error("{got}: expected {expected}")]
    UnexpectedToken { expected: Expected, got: Token },
    #[error("{token}: {message}")]
    Lex { token: Token, message: Rc<str> },
    #[error("{0}: unexpected prefix token")]
    NoPrefixFunction(Token),
    #[error("{token}: {reason}")]
    InvalidLiteral { token: Token, reason: String },
    #[error("{operator}: cannot perform op against {operand}")]
    InvalidOperand { operator: Token, operand: String },
    #[error("{operator}: cannot perform op on {left} and {right}")]
    InvalidOperands {
        operator: Token,
        left: String,
        right: String,
    },
    #[error("{0}: parameters require a method call")]
    ParametersRequireCall(Token),
    #[error("{0}: extraneous close")]
    ExtraneousClose(Token),
    #[error("{0}: map field key must be an identifier")]
    InvalidMapKey(Token),
    #[error("{0}: expression nested too deeply")]
    NestingTooDeep(Token),
    #[error("{token}: {context}: {source}")]
    Context {
        token: Token,
        context: &'static str,
        #[source]
        source: Box<ParseError>,
    },
}

#[derive(Debug, PartialEq, Clone)]
pub enum Expected {
    Token(TokenKind),
    Identifier,
    Expression,
}

impl Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Token(kind) => write!(f, "\"{kind}\""),
            Expected::Identifier => f.write_str("<ident>"),
            Expected::Expression => f.write_str("expression"),
        }
    }
}

impl ParseError {
    pub fn premature_end_expected_expression() -> Self {
        ParseError::PrematureEndOfInput {
            expected: Expected::Expression,
        }
    }

    pub fn unexpected_token(expected: TokenKind, got: Option<Token>) -> ParseError {
        Self::unexpected_other(Expected::Token(expected), got)
    }

    pub fn unexpected_other(expected: Expected, got: Option<Token>) -> ParseError {
        match got {
            Some(got) => ParseError::UnexpectedToken { expected, got },
            None => ParseError::PrematureEndOfInput { expected },
        }
    }

    /// Wraps the error with the token and construct that was being parsed.
    pub fn context(self, token: &Token, context: &'static str) -> ParseError {
        ParseError::Context {
            token: token.clone(),
            context,
            source: Box::new(self),
        }
    }

    /// The innermost error of a context chain.
    pub fn root(&self) -> &ParseError {
        match self {
            ParseError::Context { source, .. } => source.root(),
            _ => self,
        }
    }
}
