use crate::ast::{AssignStatement, CallStatement, Identifier, Node, Stage, Statement};
use crate::lexer::{Token, TokenKind};
use crate::parser::error::Expected;
use crate::parser::expressions::{
    parse_list_literal, parse_literal_expression, parse_map_literal, Precedence,
};
use crate::parser::{ParseError, Parser};

/// `name = stages` or `call args > stages`. The terminating `;` is left to
/// the caller.
pub fn parse_statement(parser: &mut Parser) -> Result<Statement, ParseError> {
    let head = parser.next_token(Expected::Identifier)?;
    let TokenKind::Ident(name) = head.kind.clone() else {
        return Err(ParseError::unexpected_other(Expected::Identifier, Some(head)));
    };

    if parser.next_if_kind(&TokenKind::Assign).is_none() {
        let stages = parse_stages(parser, head)?;
        return Ok(Statement::Call(CallStatement { stages }));
    }

    parser.next_if_kind(&TokenKind::GreaterThan);
    let first = parser.next_token(Expected::Expression)?;
    let stages = parse_stages(parser, first)?;

    Ok(Statement::Assign(AssignStatement {
        name: Identifier { name },
        stages,
    }))
}

fn parse_stages(parser: &mut Parser, first: Token) -> Result<Vec<Stage>, ParseError> {
    let mut stages = vec![parse_stage(parser, first)?];

    while parser.next_if_kind(&TokenKind::GreaterThan).is_some() {
        let first = parser.next_token(Expected::Expression)?;
        stages.push(parse_stage(parser, first)?);
    }

    Ok(stages)
}

fn ends_stage(kind: Option<&TokenKind>) -> bool {
    matches!(
        kind,
        None | Some(TokenKind::GreaterThan) | Some(TokenKind::SemiColon)
    )
}

/// A stage is a single element, or a call followed by its arguments.
fn parse_stage(parser: &mut Parser, first: Token) -> Result<Stage, ParseError> {
    let is_call = matches!(first.kind, TokenKind::Ident(_));
    let head = first.clone();
    let mut nodes = vec![parse_element(parser, first)?];

    while !ends_stage(parser.peek_kind()) {
        let token = parser.next_token(Expected::Expression)?;
        if !is_call {
            return Err(ParseError::ParametersRequireCall(head));
        }
        nodes.push(parse_element(parser, token)?);
    }

    Ok(Stage { nodes })
}

fn parse_element(parser: &mut Parser, token: Token) -> Result<Node, ParseError> {
    match token.kind {
        TokenKind::LBracket => parse_list_literal(parser, &token),
        TokenKind::LBrace => parse_map_literal(parser, &token),
        _ => parse_literal_expression(parser, token, Precedence::Lowest),
    }
}
