use crate::{
    ast::{
        ast::{Node, NodeKind},
        types::PrimitiveType,
    },
    errors::errors::{Error, ErrorImpl},
    lexer::tokens::{Token, TokenKind},
    parser::{expr::parse_expr, lookups::BindingPower},
};

use super::parser::Parser;

pub fn parse_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let handler = parser
        .get_stmt_lookup()
        .get(&parser.current_token_kind())
        .copied();

    match handler {
        Some(handler) => handler(parser),
        None => Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expected statement"),
            },
            parser.get_line(),
        )),
    }
}

fn parse_type_name(token: &Token) -> Result<PrimitiveType, Error> {
    token.value.parse::<PrimitiveType>().map_err(|message| {
        Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: token.value.clone(),
                message,
            },
            token.line(),
        )
    })
}

fn expect_identifier(parser: &mut Parser, context: &str) -> Result<Token, Error> {
    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: format!("expected identifier {}", context),
        },
        parser.get_line(),
    );
    parser.expect_error(TokenKind::Identifier, Some(error))
}

pub fn parse_declaration_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let type_token = parser.advance().clone();
    let declared_type = parse_type_name(&type_token)?;

    let name = expect_identifier(parser, "during variable declaration")?.value;

    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("variables must be initialised"),
        },
        parser.get_line(),
    );
    parser.expect_error(TokenKind::Assignment, Some(error))?;

    let initializer = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::declaration(
        declared_type,
        name,
        initializer,
        type_token.line(),
    ))
}

/// `name = value;` or a builtin call used as a statement.
pub fn parse_identifier_stmt(parser: &mut Parser) -> Result<Node, Error> {
    if parser.peek_kind() == TokenKind::Assignment {
        let name_token = parser.advance().clone();
        parser.advance();

        let value = parse_expr(parser, BindingPower::Default)?;
        parser.expect(TokenKind::Semicolon)?;

        let line = name_token.line();
        return Ok(Node::assignment(name_token.value, value, line));
    }

    let line = parser.get_line();
    let expr = parse_expr(parser, BindingPower::Default)?;

    if !matches!(expr.kind, NodeKind::BuiltinCall { .. }) {
        return Err(Error::new(
            ErrorImpl::UnexpectedTokenDetailed {
                token: parser.current_token().value.clone(),
                message: String::from("expression result is unused"),
            },
            line,
        ));
    }

    parser.expect(TokenKind::Semicolon)?;
    Ok(expr)
}

pub fn parse_print_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();

    let expr = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::print(expr, line))
}

pub fn parse_input_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();

    let error = Error::new(
        ErrorImpl::UnexpectedTokenDetailed {
            token: parser.current_token().value.clone(),
            message: String::from("expected type name after `input`"),
        },
        parser.get_line(),
    );
    let type_token = parser.expect_error(TokenKind::TypeName, Some(error))?;
    let requested_type = parse_type_name(&type_token)?;

    let name = expect_identifier(parser, "after input type")?.value;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::input(requested_type, name, line))
}

pub fn parse_return_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();

    let value = parse_expr(parser, BindingPower::Default)?;
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::ret(value, line))
}

pub fn parse_if_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let then_block = parse_block_stmt(parser)?;

    let else_block = if parser.current_token_kind() == TokenKind::Else {
        parser.advance();
        if parser.current_token_kind() == TokenKind::If {
            // `else if` becomes an else block holding the nested if
            let nested = parse_if_stmt(parser)?;
            let nested_line = nested.line;
            Some(Node::block(vec![nested], nested_line))
        } else {
            Some(parse_block_stmt(parser)?)
        }
    } else {
        None
    };

    Ok(Node::if_stmt(condition, then_block, else_block, line))
}

pub fn parse_repeat_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();

    let condition = parse_expr(parser, BindingPower::Default)?;
    let body = parse_block_stmt(parser)?;

    Ok(Node::repeat(condition, body, line))
}

pub fn parse_break_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::brk(line))
}

pub fn parse_continue_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.advance().line();
    parser.expect(TokenKind::Semicolon)?;

    Ok(Node::cont(line))
}

pub fn parse_block_stmt(parser: &mut Parser) -> Result<Node, Error> {
    let line = parser.expect(TokenKind::OpenCurly)?.line();

    let mut statements = Vec::new();
    while parser.current_token_kind() != TokenKind::CloseCurly {
        if !parser.has_tokens() {
            return Err(Error::new(
                ErrorImpl::UnexpectedTokenDetailed {
                    token: parser.current_token().value.clone(),
                    message: String::from("unterminated block, expected `}`"),
                },
                parser.get_line(),
            ));
        }
        statements.push(parse_stmt(parser)?);
    }

    parser.expect(TokenKind::CloseCurly)?;

    Ok(Node::block(statements, line))
}
