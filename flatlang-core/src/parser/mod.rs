pub mod error;
pub mod expressions;
pub mod literals;
pub mod statements;

use crate::lexer::{Token, TokenKind};
pub use error::{Expected, ParseError};
use statements::parse_statement;

/// How deeply groups, unary operators and interpolations may nest.
pub const MAX_NESTING_DEPTH: usize = 128;

pub struct Parser<'a> {
    pub iter: std::iter::Peekable<crate::lexer::Tokenizer<'a>>,
    depth: usize,
}

impl<'a> Parser<'a> {
    pub fn new(tokenizer: crate::lexer::Tokenizer<'a>) -> Self {
        Self::nested(tokenizer, 0)
    }

    /// A parser for source embedded `depth` levels deep in another one.
    pub(crate) fn nested(tokenizer: crate::lexer::Tokenizer<'a>, depth: usize) -> Self {
        let iter = tokenizer.peekable();
        Self { iter, depth }
    }

    pub(crate) fn depth(&self) -> usize {
        self.depth
    }

    /// Runs `parse` one nesting level below the construct opened by `token`.
    pub(crate) fn descend<T>(
        &mut self,
        token: &Token,
        parse: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.depth >= MAX_NESTING_DEPTH {
            return Err(ParseError::NestingTooDeep(token.clone()));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Takes the next token, turning lexer errors and the end of input into
    /// parse errors.
    pub(crate) fn next_token(&mut self, expected: Expected) -> Result<Token, ParseError> {
        let token = self
            .iter
            .next()
            .ok_or(ParseError::PrematureEndOfInput { expected })?;
        if let TokenKind::Illegal(message) = token.kind.clone() {
            return Err(ParseError::Lex { token, message });
        }
        Ok(token)
    }

    pub(crate) fn next_if_kind(&mut self, kind: &TokenKind) -> Option<Token> {
        self.iter.next_if(|token| &token.kind == kind)
    }

    pub(crate) fn peek_kind(&mut self) -> Option<&TokenKind> {
        self.iter.peek().map(|token| &token.kind)
    }

    pub(crate) fn expect_token(&mut self, token_kind: TokenKind) -> Result<Token, ParseError> {
        let token = self.next_token(Expected::Token(token_kind.clone()))?;
        if token.kind == token_kind {
            Ok(token)
        } else {
            Err(ParseError::unexpected_token(token_kind, Some(token)))
        }
    }

    /// Parses every statement of the input. The first error aborts the whole
    /// program.
    pub fn parse_program(&mut self) -> Result<crate::ast::Program, ParseError> {
        let mut statements = Vec::new();

        while let Some(first) = self.iter.peek().cloned() {
            let statement = parse_statement(self).map_err(|err| err.context(&first, "statement"))?;
            statements.push(statement);

            match self.iter.next() {
                Some(Token {
                    kind: TokenKind::SemiColon,
                    ..
                })
                | None => {}
                Some(token) => {
                    return Err(ParseError::unexpected_token(
                        TokenKind::SemiColon,
                        Some(token),
                    ))
                }
            }
        }

        Ok(crate::ast::Program { statements })
    }
}

/// Lexes and parses `input` in one go.
pub fn parse(input: &str) -> Result<crate::ast::Program, ParseError> {
    Parser::new(crate::lexer::Tokenizer::new(input)).parse_program()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Node, Statement};

    fn test_parsing(tests: Vec<(&str, &str)>) {
        for (input, expected) in tests {
            let program = parse(input).unwrap_or_else(|err| panic!("{input}: {err}"));

            assert_eq!(program.to_string(), expected)
        }
    }

    fn root_error(input: &str) -> ParseError {
        match parse(input) {
            Ok(program) => panic!("expected {input:?} to fail, got {program:?}"),
            Err(err) => err.root().clone(),
        }
    }

    #[test]
    fn test_statements() {
        let tests = vec![
            ("print 'hello';", "print \"hello\";\n"),
            ("x = 1 + 2;", "x = (1 + 2);\n"),
            ("x = > 1", "x = 1;\n"),
            (
                "hello = items 'test' > items 'test_two'; items 'start' > hello > items 'end' > hello '1';",
                "hello = items \"test\" > items \"test_two\";\nitems \"start\" > hello > items \"end\" > hello \"1\";\n",
            ),
            ("print (1 + 2 - 3) 34.5e4", "print ((1 + 2) - 3) 345000.0;\n"),
            ("print [1, 2] {a: true}", "print [1, 2] {a: true};\n"),
            ("// leading comment\nprint 1; // trailing", "print 1;\n"),
            ("", ""),
        ];

        test_parsing(tests)
    }

    #[test]
    fn test_statement_kinds() {
        let program = parse("x = 1; print x;").unwrap();

        match &program.statements[0] {
            Statement::Assign(statement) => {
                assert_eq!(&*statement.name.name, "x");
                assert_eq!(statement.stages[0].nodes, vec![Node::IntegerLiteral(1)]);
            }
            other => panic!("expected assignment, got {other:?}"),
        }
        match &program.statements[1] {
            Statement::Call(statement) => assert_eq!(statement.stages[0].nodes.len(), 2),
            other => panic!("expected call, got {other:?}"),
        }
    }

    #[test]
    fn test_list_literal() {
        let program = parse("x = [1, 2, 3];").unwrap();

        assert_eq!(
            program.statements[0].stages()[0].nodes,
            vec![Node::ListLiteral(vec![
                Node::IntegerLiteral(1),
                Node::IntegerLiteral(2),
                Node::IntegerLiteral(3),
            ])]
        );
        assert!(parse("x = [];").is_ok());
        assert!(matches!(
            root_error("x = [1, 2, false,];"),
            ParseError::ExtraneousClose(_)
        ));
        assert!(matches!(
            root_error("x = [, 2, false];"),
            ParseError::NoPrefixFunction(_)
        ));
    }

    #[test]
    fn test_map_literal() {
        let program = parse(r#"x = {hello: "world", test: >1 & <100};"#).unwrap();

        assert_eq!(
            program.to_string(),
            "x = {hello: \"world\", test: ((>1) & (<100))};\n"
        );
        assert!(parse("x = {};").is_ok());
        assert!(matches!(
            root_error(r#"x = {"hello": "world"};"#),
            ParseError::InvalidMapKey(_)
        ));
        assert!(matches!(
            root_error("x = {a: 1,};"),
            ParseError::ExtraneousClose(_)
        ));
    }

    #[test]
    fn test_parameters_require_call() {
        assert!(matches!(
            root_error("x = 1 2;"),
            ParseError::ParametersRequireCall(_)
        ));
        assert!(matches!(
            root_error("x = print > [1] 2;"),
            ParseError::ParametersRequireCall(_)
        ));
    }

    #[test]
    fn test_lex_errors_abort_parsing() {
        let err = parse("print 1; print 0b12;").unwrap_err();

        assert!(matches!(err, ParseError::Context { .. }));
        match err.root() {
            ParseError::Lex { message, token } => {
                assert_eq!(&**message, "invalid digit '2' in binary literal");
                assert_eq!((token.line, token.column), (1, 16));
            }
            other => panic!("expected lex error, got {other:?}"),
        }
    }

    #[test]
    fn test_nesting_depth_is_bounded() {
        let groups = |depth: usize| format!("{}1{}", "(".repeat(depth), ")".repeat(depth));

        assert!(parse(&format!("x = {}; x", groups(MAX_NESTING_DEPTH))).is_ok());
        assert!(matches!(
            root_error(&format!("x = {}; x", groups(MAX_NESTING_DEPTH + 1))),
            ParseError::NestingTooDeep(_)
        ));
        assert!(matches!(
            root_error(&format!("x = {}; x", groups(1000))),
            ParseError::NestingTooDeep(_)
        ));
        assert!(matches!(
            root_error(&format!("x = {}1", "-".repeat(1000))),
            ParseError::NestingTooDeep(_)
        ));
        assert!(matches!(
            root_error(&format!("print \"${{{}}}\"", groups(MAX_NESTING_DEPTH))),
            ParseError::NestingTooDeep(_)
        ));
        assert!(parse(&format!("print \"${{{}}}\"", groups(MAX_NESTING_DEPTH - 1))).is_ok());
    }

    #[test]
    fn test_statement_must_start_with_identifier() {
        assert!(parse("1 + 2;").is_err());
        assert!(parse("print 1;;").is_err());
    }
}
