use crate::{
    ast::{
        ast::{BinaryOp, Node, NodeKind, UnaryOp},
        types::LiteralKind,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
};

use super::{lookups::BindingPower, parser::Parser};

pub fn parse_expr(parser: &mut Parser, bp: BindingPower) -> Result<Node, Error> {
    // First parse NUD
    let token_kind = parser.current_token_kind();
    let nud = match parser.get_nud_lookup().get(&token_kind) {
        Some(nud) => *nud,
        None => {
            return Err(Error::new(
                ErrorImpl::UnexpectedToken {
                    token: parser.current_token().value.clone(),
                },
                parser.get_line(),
            ))
        }
    };

    let mut left = nud(parser)?;

    // While LED and current BP is less than BP of current token, continue parsing lhs
    loop {
        let token_kind = parser.current_token_kind();
        let token_bp = *parser
            .get_bp_lookup()
            .get(&token_kind)
            .unwrap_or(&BindingPower::Default);

        if token_bp <= bp {
            break;
        }

        let led = match parser.get_led_lookup().get(&token_kind) {
            Some(led) => *led,
            None => {
                return Err(Error::new(
                    ErrorImpl::UnexpectedToken {
                        token: parser.current_token().value.clone(),
                    },
                    parser.get_line(),
                ))
            }
        };

        left = led(parser, left, token_bp)?;
    }

    Ok(left)
}

pub fn parse_primary_expr(parser: &mut Parser) -> Result<Node, Error> {
    let token = parser.advance().clone();
    let line = token.line();

    match token.kind {
        TokenKind::Number => {
            if token.value.parse::<i32>().is_err() {
                return Err(Error::new(
                    ErrorImpl::NumberParseError { token: token.value },
                    line,
                ));
            }
            Ok(Node::literal(LiteralKind::Int, token.value, line))
        }
        TokenKind::Float => Ok(Node::literal(LiteralKind::Float, token.value, line)),
        TokenKind::String => Ok(Node::literal(LiteralKind::String, token.value, line)),
        TokenKind::Char => Ok(Node::literal(LiteralKind::Char, token.value, line)),
        TokenKind::True | TokenKind::False => {
            Ok(Node::literal(LiteralKind::Bool, token.value, line))
        }
        TokenKind::Identifier => Ok(Node::identifier(token.value, line)),
        _ => Err(Error::new(
            ErrorImpl::UnexpectedToken { token: token.value },
            line,
        )),
    }
}

fn binary_op(token: &Token) -> Result<BinaryOp, Error> {
    Ok(match token.kind {
        TokenKind::Plus => BinaryOp::Add,
        TokenKind::Dash => BinaryOp::Sub,
        TokenKind::Star => BinaryOp::Mul,
        TokenKind::Slash => BinaryOp::Div,
        TokenKind::Equals => BinaryOp::Eq,
        TokenKind::NotEquals => BinaryOp::Neq,
        TokenKind::Less => BinaryOp::Lt,
        TokenKind::Greater => BinaryOp::Gt,
        TokenKind::LessEquals => BinaryOp::Leq,
        TokenKind::GreaterEquals => BinaryOp::Geq,
        TokenKind::And => BinaryOp::And,
        TokenKind::Or => BinaryOp::Or,
        _ => {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: token.value.clone(),
                    message: String::from("expected binary operator"),
                },
                token.line(),
            ))
        }
    })
}

pub fn parse_binary_expr(parser: &mut Parser, left: Node, bp: BindingPower) -> Result<Node, Error> {
    let operator_token = parser.advance().clone();
    let op = binary_op(&operator_token)?;

    let right = parse_expr(parser, bp)?;

    Ok(Node::binary(left, op, right, operator_token.line()))
}

pub fn parse_prefix_expr(parser: &mut Parser) -> Result<Node, Error> {
    let operator_token = parser.advance().clone();
    let op = match operator_token.kind {
        TokenKind::Dash => UnaryOp::Minus,
        _ => UnaryOp::Not,
    };

    let operand = parse_expr(parser, BindingPower::Unary)?;

    Ok(Node::unary(op, operand, operator_token.line()))
}

pub fn parse_grouping_expr(parser: &mut Parser) -> Result<Node, Error> {
    parser.advance();
    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::CloseParen)?;

    Ok(expr)
}

pub fn parse_call_expr(parser: &mut Parser, left: Node, _bp: BindingPower) -> Result<Node, Error> {
    let open = parser.advance().clone();

    let name = match left.kind {
        NodeKind::Identifier { name, .. } => name,
        _ => {
            let line = open.line();
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: open.value,
                    message: String::from("only builtin functions can be called"),
                },
                line,
            ));
        }
    };

    let mut args = vec![];

    while parser.current_token_kind() != TokenKind::CloseParen {
        args.push(parse_expr(parser, BindingPower::Default)?);

        if parser.current_token_kind() == TokenKind::Comma {
            parser.advance();
        } else if parser.current_token_kind() != TokenKind::CloseParen {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("expected `,` or `)` in argument list"),
                },
                parser.get_line(),
            ));
        }
    }

    parser.expect(TokenKind::CloseParen)?;

    Ok(Node::builtin_call(name, args, left.line))
}
