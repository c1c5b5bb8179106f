use super::error::{Expected, ParseError};
use super::literals;
use crate::ast::{Identifier, InfixOperationKind, Node, PrefixOperationKind};
use crate::lexer::{Token, TokenKind};
use crate::parser::Parser;

#[derive(PartialOrd, PartialEq, Debug, Clone, Copy)]
pub enum Precedence {
    Lowest = 0,
    Logical = 1,
    Sum = 2,
    Product = 3,
    Prefix = 6,
}

/// Binding power of `token` in infix position. Anything that cannot continue
/// an expression, `>` included, is `Lowest`.
pub fn precedence_of(token: &TokenKind) -> Precedence {
    match token {
        TokenKind::Ampersand => Precedence::Logical,
        TokenKind::Pipe => Precedence::Logical,
        TokenKind::Plus => Precedence::Sum,
        TokenKind::Minus => Precedence::Sum,
        TokenKind::Asterisk => Precedence::Product,
        TokenKind::Slash => Precedence::Product,
        _ => Precedence::Lowest,
    }
}

pub fn parse_expression(parser: &mut Parser, precedence: Precedence) -> Result<Node, ParseError> {
    let token = parser.next_token(Expected::Expression)?;
    parse_literal_expression(parser, token, precedence)
}

/// Continues a literal expression whose first token has already been taken.
pub fn parse_literal_expression(
    parser: &mut Parser,
    token: Token,
    precedence: Precedence,
) -> Result<Node, ParseError> {
    let mut left_expression = prefix_parsing(token, parser)?;

    loop {
        let Some(next_kind) = parser.peek_kind() else {
            break;
        };
        if precedence >= precedence_of(next_kind) {
            break;
        }

        let Some(operator) = parser.iter.next() else {
            break;
        };
        let Some(infix_parse_function) = infix_parsing_function(operator) else {
            break;
        };
        left_expression = infix_parse_function(left_expression, parser)?;
    }

    Ok(left_expression)
}

fn prefix_operation(
    operator: Token,
    kind: PrefixOperationKind,
) -> impl FnOnce(&mut Parser) -> Result<Node, ParseError> {
    move |parser| {
        let operand = parser
            .descend(&operator, |parser| parse_expression(parser, Precedence::Prefix))
            .map_err(|err| err.context(&operator, "unary expression"))?;
        if !operand.is_number() {
            return Err(ParseError::InvalidOperand {
                operator,
                operand: operand.to_string(),
            });
        }

        Ok(Node::PrefixOperation(kind, Box::new(operand)))
    }
}

fn parse_grouped_expression(parser: &mut Parser, open: &Token) -> Result<Node, ParseError> {
    let expression = parser
        .descend(open, |parser| {
            let expression = parse_expression(parser, Precedence::Lowest)?;
            parser.expect_token(TokenKind::RParen)?;
            Ok(expression)
        })
        .map_err(|err| err.context(open, "group"))?;

    Ok(expression)
}

/// Parses `element (separator element)* terminator` after the opening token.
/// An empty sequence is allowed, a separator directly before the terminator
/// is not.
fn parse_sequence<T>(
    parser: &mut Parser,
    parse_element: impl Fn(&mut Parser) -> Result<T, ParseError>,
    separator: TokenKind,
    terminator: TokenKind,
) -> Result<Vec<T>, ParseError> {
    let mut elements = Vec::new();

    if parser.next_if_kind(&terminator).is_some() {
        return Ok(elements);
    }

    loop {
        elements.push(parse_element(parser)?);

        let next = parser.next_token(Expected::Token(separator.clone()))?;
        if next.kind == terminator {
            return Ok(elements);
        }
        if next.kind != separator {
            return Err(ParseError::unexpected_token(separator, Some(next)));
        }
        if let Some(close) = parser.next_if_kind(&terminator) {
            return Err(ParseError::ExtraneousClose(close));
        }
    }
}

pub fn parse_list_literal(parser: &mut Parser, open: &Token) -> Result<Node, ParseError> {
    let items = parse_sequence(
        parser,
        |parser| parse_expression(parser, Precedence::Lowest),
        TokenKind::Comma,
        TokenKind::RBracket,
    )
    .map_err(|err| err.context(open, "list"))?;

    Ok(Node::ListLiteral(items))
}

pub fn parse_map_literal(parser: &mut Parser, open: &Token) -> Result<Node, ParseError> {
    let fields = parse_sequence(
        parser,
        |parser| {
            let key = parser.next_token(Expected::Identifier)?;
            let TokenKind::Ident(name) = key.kind.clone() else {
                return Err(ParseError::InvalidMapKey(key));
            };
            parser.expect_token(TokenKind::Colon)?;
            let value = parse_expression(parser, Precedence::Lowest)?;
            Ok((Identifier { name }, value))
        },
        TokenKind::Comma,
        TokenKind::RBrace,
    )
    .map_err(|err| err.context(open, "map"))?;

    Ok(Node::MapLiteral(fields))
}

pub fn prefix_parsing(token: Token, parser: &mut Parser) -> Result<Node, ParseError> {
    use PrefixOperationKind as PrefixKind;

    match token.kind.clone() {
        TokenKind::Ident(name) => Ok(Node::Identifier(Identifier { name })),
        TokenKind::Bool(value) => Ok(Node::BooleanLiteral(value)),
        TokenKind::Int(text) => literals::parse_integer(&text)
            .map(Node::IntegerLiteral)
            .map_err(|reason| ParseError::InvalidLiteral { token, reason }),
        TokenKind::Float(text) => literals::parse_float(&text)
            .map(Node::FloatLiteral)
            .map_err(|reason| ParseError::InvalidLiteral { token, reason }),
        TokenKind::String(_) => literals::parse_string(parser, &token, false),
        TokenKind::RawString(_) => literals::parse_string(parser, &token, true),
        TokenKind::LParen => parse_grouped_expression(parser, &token),
        TokenKind::GreaterThan => prefix_operation(token, PrefixKind::GreaterThan)(parser),
        TokenKind::GreaterEqual => prefix_operation(token, PrefixKind::GreaterEqual)(parser),
        TokenKind::LessThan => prefix_operation(token, PrefixKind::LessThan)(parser),
        TokenKind::LessEqual => prefix_operation(token, PrefixKind::LessEqual)(parser),
        TokenKind::Plus => prefix_operation(token, PrefixKind::Plus)(parser),
        TokenKind::Minus => prefix_operation(token, PrefixKind::Minus)(parser),
        TokenKind::Illegal(message) => Err(ParseError::Lex { token, message }),
        _ => Err(ParseError::NoPrefixFunction(token)),
    }
}

type InfixFunction = Box<dyn FnOnce(Node, &mut Parser) -> Result<Node, ParseError>>;

fn infix_operation(operator: Token, kind: InfixOperationKind) -> InfixFunction {
    Box::new(
        move |left: Node, parser: &mut Parser| -> Result<Node, ParseError> {
            let new_precedence = precedence_of(&operator.kind);
            let right = parse_expression(parser, new_precedence)
                .map_err(|err| err.context(&operator, "binary expression"))?;

            if !kind.is_logical() && !operands_compatible(&left, &right) {
                return Err(ParseError::InvalidOperands {
                    operator,
                    left: left.to_string(),
                    right: right.to_string(),
                });
            }

            Ok(Node::InfixOperation(kind, Box::new(left), Box::new(right)))
        },
    )
}

/// Arithmetic never mixes a string with a non-string, and never applies to
/// booleans or matcher syntax.
fn operands_compatible(left: &Node, right: &Node) -> bool {
    let matcher = |node: &Node| node.is_boolean() || node.is_logical() || node.is_comparison();
    left.is_string() == right.is_string() && !matcher(left) && !matcher(right)
}

pub fn infix_parsing_function(operator: Token) -> Option<InfixFunction> {
    use InfixOperationKind as InfixKind;

    let kind = match operator.kind {
        TokenKind::Ampersand => InfixKind::And,
        TokenKind::Pipe => InfixKind::Or,
        TokenKind::Plus => InfixKind::Plus,
        TokenKind::Minus => InfixKind::Minus,
        TokenKind::Asterisk => InfixKind::Multiply,
        TokenKind::Slash => InfixKind::Divide,
        _ => return None,
    };
    Some(infix_operation(operator, kind))
}
