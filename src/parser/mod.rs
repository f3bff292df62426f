pub mod ast;

use crate::{
    lexer::{
        token::{Token, TokenSlice},
        Lexer,
    },
    parser::ast::{Block, Expr, Ident, Infix, Literal, Precedence, Prefix, Program, Statement},
};
use log::debug;
use nom::{
    bytes::complete::take,
    combinator::{cut, peek},
    error::{ErrorKind, ParseError},
    multi::many0,
    sequence::preceded,
    Err, IResult,
};

/// A single syntax diagnostic. Parse functions fail with this inside
/// `nom::Err`; the parser turns it into a message and keeps going.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxError {
    pub message: String,
}

impl SyntaxError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl<'a> ParseError<TokenSlice<'a>> for SyntaxError {
    fn from_error_kind(input: TokenSlice<'a>, kind: ErrorKind) -> Self {
        match kind {
            ErrorKind::Eof => Self::new("unexpected end of input"),
            _ => Self::new(format!("unexpected {} ({:?})", input.current(), kind)),
        }
    }

    fn append(_: TokenSlice<'a>, _: ErrorKind, other: Self) -> Self {
        other
    }
}

pub type ParseResult<'a, T> = IResult<TokenSlice<'a>, T, SyntaxError>;

type PrefixFn = for<'p, 'a> fn(&'p mut Parser, TokenSlice<'a>) -> ParseResult<'a, Expr>;
type InfixFn = for<'p, 'a> fn(&'p mut Parser, TokenSlice<'a>, Expr) -> ParseResult<'a, Expr>;

#[derive(Debug, Default)]
pub struct Parser {
    errors: Vec<String>,
}

impl Parser {
    pub fn new() -> Self {
        Self { errors: vec![] }
    }

    /// Lexes and parses `input` in one go.
    pub fn parse_program(input: &str) -> (Program, Vec<String>) {
        let tokens = match Lexer::new().lex_input(input) {
            Ok(tokens) => tokens,
            Err(e) => return (Program::default(), vec![e.to_string()]),
        };

        let mut parser = Parser::new();
        let program = parser.parse(TokenSlice::from_tokens(&tokens));

        (program, parser.errors)
    }

    /// Parses every statement in `tokens`. A statement that fails to parse
    /// leaves a message in `errors()` and is skipped; bad statements inside
    /// a block are skipped within that block.
    pub fn parse(&mut self, tokens: TokenSlice<'_>) -> Program {
        let mut statements = vec![];
        let mut input = tokens;

        while !input.is_at_end() {
            match self.parse_statement(input.clone()) {
                Ok((rest, statement)) => {
                    statements.push(statement);
                    input = rest;
                }
                Err(Err::Error(e)) | Err(Err::Failure(e)) => {
                    self.record(e);
                    input = Self::synchronize(input, false);
                }
                Err(Err::Incomplete(_)) => {
                    self.errors.push("unexpected end of input".to_string());
                    break;
                }
            }
        }

        Program { statements }
    }

    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    fn record(&mut self, error: SyntaxError) {
        debug!("syntax error, resynchronizing: {}", error.message);
        self.errors.push(error.message);
    }

    // Skips the statement starting at `input`: up to and including the next
    // `;` outside any brackets, or up to the next `let`/`return` outside any
    // brackets. Inside a block it also stops before the block's closing `}`.
    fn synchronize(input: TokenSlice<'_>, in_block: bool) -> TokenSlice<'_> {
        let mut depth = 0usize;

        for (index, token) in input.slice.iter().enumerate() {
            match token {
                Token::Eof => return input.advance(index),
                Token::RBrace if in_block && depth == 0 => return input.advance(index),
                Token::LBrace | Token::LParen | Token::LBracket => depth += 1,
                Token::RBrace | Token::RParen | Token::RBracket => {
                    depth = depth.saturating_sub(1)
                }
                Token::Semicolon if depth == 0 => return input.advance(index + 1),
                Token::Let | Token::Return if depth == 0 && index > 0 => {
                    return input.advance(index)
                }
                _ => {}
            }
        }

        input.advance(input.slice.len())
    }

    fn parse_statement<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Statement> {
        match input.current() {
            Token::Let => self.parse_let_statement(input),
            Token::Return => self.parse_return_statement(input),
            _ => self.parse_expression_statement(input),
        }
    }

    fn parse_let_statement<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Statement> {
        let (i, _) = Self::tag(Token::Let)(input)?;
        let (i, ident) = Self::parse_ident(i)?;
        let (i, _) = Self::tag(Token::Assign)(i)?;

        let (i, expr) = self.parse_expression(Precedence::Lowest)(i)?;
        let (i, _) = Self::parse_to_semicolon_if_exists(i)?;

        Ok((i, Statement::Let(ident, expr)))
    }

    fn parse_return_statement<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Statement> {
        let (i, _) = Self::tag(Token::Return)(input)?;

        let (i, expr) = match i.current() {
            Token::Semicolon | Token::RBrace | Token::Eof => (i, None),
            _ => {
                let (i, expr) = self.parse_expression(Precedence::Lowest)(i)?;
                (i, Some(expr))
            }
        };
        let (i, _) = Self::parse_to_semicolon_if_exists(i)?;

        Ok((i, Statement::Return(expr)))
    }

    fn parse_expression_statement<'a>(
        &mut self,
        input: TokenSlice<'a>,
    ) -> ParseResult<'a, Statement> {
        let (i, expr) = self.parse_expression(Precedence::Lowest)(input)?;

        if !Self::peek_tag(i.clone(), Token::Assign) {
            let (i, _) = Self::parse_to_semicolon_if_exists(i)?;
            return Ok((i, Statement::Expression(expr)));
        }

        let (collection, index) = match expr {
            Expr::Index(collection, index) => (*collection, *index),
            other => {
                return Self::fail(format!(
                    "cannot assign to {}: only index expressions are assignable",
                    other
                ))
            }
        };

        let (i, _) = Self::tag(Token::Assign)(i)?;
        let (i, value) = self.parse_expression(Precedence::Lowest)(i)?;
        let (i, _) = Self::parse_to_semicolon_if_exists(i)?;

        Ok((
            i,
            Statement::IndexAssign {
                collection,
                index,
                value,
            },
        ))
    }

    fn parse_expression<'a, 's>(
        &'s mut self,
        precedence: Precedence,
    ) -> impl FnMut(TokenSlice<'a>) -> ParseResult<'a, Expr> + 's {
        move |input: TokenSlice<'a>| {
            let prefix = match Self::prefix_handler(input.current()) {
                Some(prefix) => prefix,
                None => {
                    return Self::fail(format!(
                        "no prefix parse function for {} found",
                        input.current()
                    ))
                }
            };

            let (mut i, mut left) = prefix(&mut *self, input)?;

            while !Self::peek_tag(i.clone(), Token::Semicolon)
                && precedence < Self::precedence_of(i.current())
            {
                let infix = match Self::infix_handler(i.current()) {
                    Some(infix) => infix,
                    None => break,
                };

                let (inner_i, inner_left) = infix(&mut *self, i, left)?;
                left = inner_left;
                i = inner_i;
            }

            Ok((i, left))
        }
    }

    fn prefix_handler(token: &Token) -> Option<PrefixFn> {
        let handler: PrefixFn = match token {
            Token::Ident(_) => Self::parse_identifier,
            Token::Int(_) => Self::parse_integer_literal,
            Token::Float(_) => Self::parse_float_literal,
            Token::String(_)
            | Token::True
            | Token::False
            | Token::Null
            | Token::Exit
            | Token::Comment(_) => Self::parse_literal,
            Token::UnclosedComment(_) => Self::parse_unclosed_comment,
            Token::Bang | Token::Minus => Self::parse_prefix,
            Token::LParen => Self::parse_paren,
            Token::If => Self::parse_if,
            Token::Function => Self::parse_function,
            Token::LBracket => Self::parse_array,
            Token::LBrace => Self::parse_hash,
            _ => return None,
        };

        Some(handler)
    }

    fn infix_handler(token: &Token) -> Option<InfixFn> {
        let handler: InfixFn = match token {
            Token::LParen => Self::parse_call,
            Token::LBracket => Self::parse_index,
            _ if Self::infix_operator(token).is_some() => Self::parse_infix,
            _ => return None,
        };

        Some(handler)
    }

    fn precedence_of(token: &Token) -> Precedence {
        match token {
            Token::Eq | Token::NotEq => Precedence::Equals,
            Token::Lt | Token::Gt | Token::LtEq | Token::GtEq => Precedence::LessGreater,
            Token::Plus | Token::Minus => Precedence::Sum,
            Token::Asterisk | Token::Slash => Precedence::Product,
            Token::LParen => Precedence::Call,
            Token::LBracket => Precedence::Index,
            _ => Precedence::Lowest,
        }
    }

    fn infix_operator(token: &Token) -> Option<Infix> {
        let operator = match token {
            Token::Plus => Infix::Plus,
            Token::Minus => Infix::Minus,
            Token::Asterisk => Infix::Multiply,
            Token::Slash => Infix::Divide,
            Token::Eq => Infix::Equal,
            Token::NotEq => Infix::NotEqual,
            Token::Gt => Infix::GreaterThan,
            Token::Lt => Infix::LessThan,
            Token::GtEq => Infix::GreaterThanEqual,
            Token::LtEq => Infix::LessThanEqual,
            _ => return None,
        };

        Some(operator)
    }

    fn parse_identifier<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, ident) = Self::parse_ident(input)?;

        Ok((i, Expr::Ident(ident)))
    }

    fn parse_integer_literal<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, token) = Self::next(input)?;

        match token {
            Token::Int(text) => match Self::parse_int_auto_radix(text) {
                Some(value) => Ok((i, Expr::Literal(Literal::Int(value)))),
                None => Self::fail(format!("could not parse {:?} as integer", text)),
            },
            other => Self::fail(format!("expected integer literal, got {}", other)),
        }
    }

    fn parse_float_literal<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, token) = Self::next(input)?;

        match token {
            // Parsed at full width, then narrowed to the runtime float type.
            Token::Float(text) => match text.parse::<f64>() {
                Ok(value) => Ok((i, Expr::Literal(Literal::Float(value as f32)))),
                Err(_) => Self::fail(format!("could not parse {:?} as float", text)),
            },
            other => Self::fail(format!("expected float literal, got {}", other)),
        }
    }

    /// Integer text with an optional `0x`, `0o` or `0b` prefix; a bare
    /// leading zero means octal. Underscores separate digits.
    fn parse_int_auto_radix(text: &str) -> Option<i64> {
        let digits = text.replace('_', "");

        let (radix, body) = match digits.get(..2) {
            Some("0x") | Some("0X") => (16, &digits[2..]),
            Some("0o") | Some("0O") => (8, &digits[2..]),
            Some("0b") | Some("0B") => (2, &digits[2..]),
            _ if digits.len() > 1 && digits.starts_with('0') => (8, &digits[1..]),
            _ => (10, digits.as_str()),
        };

        if body.is_empty() || body.starts_with('+') || body.starts_with('-') {
            return None;
        }

        i64::from_str_radix(body, radix).ok()
    }

    fn parse_literal<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, token) = Self::next(input)?;

        let literal = match token {
            Token::String(s) => Literal::String(s.clone()),
            Token::True => Literal::Bool(true),
            Token::False => Literal::Bool(false),
            Token::Null => Literal::Null,
            Token::Exit => Literal::Exit,
            Token::Comment(text) => Literal::Comment(text.clone()),
            other => {
                return Self::fail(format!("no prefix parse function for {} found", other))
            }
        };

        Ok((i, Expr::Literal(literal)))
    }

    fn parse_unclosed_comment<'a>(&mut self, _: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        Self::fail("unclosed comment")
    }

    fn parse_paren<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, _) = Self::tag(Token::LParen)(input)?;
        let (i, expr) = self.parse_expression(Precedence::Lowest)(i)?;
        let (i, _) = Self::tag(Token::RParen)(i)?;

        Ok((i, expr))
    }

    fn parse_prefix<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, token) = Self::next(input)?;

        let prefix = match token {
            Token::Bang => Prefix::Bang,
            Token::Minus => Prefix::Minus,
            other => {
                return Self::fail(format!("no prefix parse function for {} found", other))
            }
        };

        let (i, expr) = self.parse_expression(Precedence::Prefix)(i)?;

        Ok((i, Expr::Prefix(prefix, Box::new(expr))))
    }

    // Binary operators pass their own precedence to the right-hand side,
    // which keeps them left-associative.
    fn parse_infix<'a>(&mut self, input: TokenSlice<'a>, left: Expr) -> ParseResult<'a, Expr> {
        let (i, token) = Self::next(input)?;

        let operator = match Self::infix_operator(token) {
            Some(operator) => operator,
            None => return Self::fail(format!("{} is not an infix operator", token)),
        };

        let (i, right) = self.parse_expression(Self::precedence_of(token))(i)?;

        Ok((i, Expr::Infix(operator, Box::new(left), Box::new(right))))
    }

    fn parse_call<'a>(&mut self, input: TokenSlice<'a>, function: Expr) -> ParseResult<'a, Expr> {
        let (i, _) = Self::tag(Token::LParen)(input)?;
        let (i, arguments) = self.parse_expression_list(i, Token::RParen)?;

        Ok((
            i,
            Expr::Call {
                function: Box::new(function),
                arguments,
            },
        ))
    }

    fn parse_index<'a>(&mut self, input: TokenSlice<'a>, left: Expr) -> ParseResult<'a, Expr> {
        let (i, _) = Self::tag(Token::LBracket)(input)?;
        let (i, index) = self.parse_expression(Precedence::Lowest)(i)?;
        let (i, _) = Self::tag(Token::RBracket)(i)?;

        Ok((i, Expr::Index(Box::new(left), Box::new(index))))
    }

    fn parse_if<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, _) = Self::tag(Token::If)(input)?;
        let (i, _) = Self::tag(Token::LParen)(i)?;
        let (i, condition) = self.parse_expression(Precedence::Lowest)(i)?;
        let (i, _) = Self::tag(Token::RParen)(i)?;
        let (i, consequence) = self.parse_block(i)?;

        if !Self::peek_tag(i.clone(), Token::Else) {
            return Ok((
                i,
                Expr::If {
                    condition: Box::new(condition),
                    consequence,
                    alternative: None,
                },
            ));
        }

        let (i, _) = Self::tag(Token::Else)(i)?;
        let (i, alternative) = self.parse_block(i)?;

        Ok((
            i,
            Expr::If {
                condition: Box::new(condition),
                consequence,
                alternative: Some(alternative),
            },
        ))
    }

    /// `{ statements }`. End of input closes an open block. A bad statement
    /// is recorded and skipped without leaving the block.
    fn parse_block<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Block> {
        let (mut i, _) = Self::tag(Token::LBrace)(input)?;
        let mut statements = vec![];

        loop {
            match i.current() {
                Token::RBrace => {
                    let (rest, _) = Self::tag(Token::RBrace)(i)?;
                    return Ok((rest, Block { statements }));
                }
                Token::Eof => return Ok((i, Block { statements })),
                _ => match self.parse_statement(i.clone()) {
                    Ok((rest, statement)) => {
                        statements.push(statement);
                        i = rest;
                    }
                    Err(Err::Error(e)) | Err(Err::Failure(e)) => {
                        self.record(e);
                        i = Self::synchronize(i, true);
                    }
                    Err(incomplete) => return Err(incomplete),
                },
            }
        }
    }

    fn parse_function<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, _) = Self::tag(Token::Function)(input)?;
        let (i, _) = Self::tag(Token::LParen)(i)?;
        let (i, params) = Self::parse_function_params(i)?;
        let (i, _) = Self::tag(Token::RParen)(i)?;
        let (i, body) = self.parse_block(i)?;

        Ok((i, Expr::Function { params, body }))
    }

    fn parse_function_params(input: TokenSlice<'_>) -> ParseResult<'_, Vec<Ident>> {
        if Self::peek_tag(input.clone(), Token::RParen) {
            return Ok((input, vec![]));
        }

        let (i, ident) = Self::parse_ident(input)?;
        let (i, mut idents) = many0(preceded(Self::tag(Token::Comma), cut(Self::parse_ident)))(i)?;
        idents.insert(0, ident);

        Ok((i, idents))
    }

    fn parse_expression_list<'a>(
        &mut self,
        input: TokenSlice<'a>,
        end: Token,
    ) -> ParseResult<'a, Vec<Expr>> {
        if Self::peek_tag(input.clone(), end.clone()) {
            let (i, _) = Self::tag(end)(input)?;
            return Ok((i, vec![]));
        }

        let (i, expr) = self.parse_expression(Precedence::Lowest)(input)?;
        let (i, mut list) = many0(preceded(
            Self::tag(Token::Comma),
            cut(self.parse_expression(Precedence::Lowest)),
        ))(i)?;
        list.insert(0, expr);
        let (i, _) = Self::tag(end)(i)?;

        Ok((i, list))
    }

    fn parse_array<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (i, _) = Self::tag(Token::LBracket)(input)?;
        let (i, elements) = self.parse_expression_list(i, Token::RBracket)?;

        Ok((i, Expr::Array(elements)))
    }

    fn parse_hash<'a>(&mut self, input: TokenSlice<'a>) -> ParseResult<'a, Expr> {
        let (mut i, _) = Self::tag(Token::LBrace)(input)?;
        let mut pairs = vec![];

        while !Self::peek_tag(i.clone(), Token::RBrace) {
            let (rest, key) = self.parse_expression(Precedence::Lowest)(i)?;
            let (rest, _) = Self::tag(Token::Colon)(rest)?;
            let (rest, value) = self.parse_expression(Precedence::Lowest)(rest)?;
            pairs.push((key, value));

            i = if Self::peek_tag(rest.clone(), Token::RBrace) {
                rest
            } else {
                Self::tag(Token::Comma)(rest)?.0
            };
        }

        let (i, _) = Self::tag(Token::RBrace)(i)?;

        Ok((i, Expr::Hash(pairs)))
    }

    fn peek_tag(input: TokenSlice<'_>, tag: Token) -> bool {
        peek(Self::tag(tag))(input).is_ok()
    }

    fn tag<'a>(expected: Token) -> impl FnMut(TokenSlice<'a>) -> ParseResult<'a, &'a Token> {
        move |input: TokenSlice<'a>| {
            let found = input.current();

            if *found == expected {
                Self::next(input)
            } else {
                Err(Err::Error(SyntaxError::new(format!(
                    "expected next token to be {}, got {}",
                    expected, found
                ))))
            }
        }
    }

    fn next(input: TokenSlice<'_>) -> ParseResult<'_, &Token> {
        let (i, taken) = take::<_, _, SyntaxError>(1usize)(input)?;

        Ok((i, taken.current()))
    }

    fn parse_ident(input: TokenSlice<'_>) -> ParseResult<'_, Ident> {
        match input.current() {
            Token::Ident(ident) => Ok((input.advance(1), ident.clone())),
            other => Err(Err::Error(SyntaxError::new(format!(
                "expected next token to be IDENT, got {}",
                other
            )))),
        }
    }

    fn parse_to_semicolon_if_exists(input: TokenSlice<'_>) -> ParseResult<'_, ()> {
        if Self::peek_tag(input.clone(), Token::Semicolon) {
            let (i, _) = Self::next(input)?;
            Ok((i, ()))
        } else {
            Ok((input, ()))
        }
    }

    fn fail<'a, T>(message: impl Into<String>) -> ParseResult<'a, T> {
        Err(Err::Failure(SyntaxError::new(message)))
    }
}
