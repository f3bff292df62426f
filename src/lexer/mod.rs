pub mod token;

use nom::{
    branch::alt,
    bytes::complete::{tag, take, take_while},
    character::complete::satisfy,
    combinator::{map, opt, recognize},
    error::{convert_error, VerboseError},
    multi::many0,
    sequence::{pair, preceded},
    Err, IResult,
};
use thiserror::Error;
use token::Token;

type LexResult<'a, T> = IResult<&'a str, T, VerboseError<&'a str>>;

#[derive(Debug, Error, PartialEq)]
#[error("could not tokenize input:\n{0}")]
pub struct LexError(pub String);

pub struct Lexer;

impl Default for Lexer {
    fn default() -> Self {
        Self::new()
    }
}

impl Lexer {
    pub fn new() -> Self {
        Self
    }

    /// Tokenizes the whole input. The result always ends with `Token::Eof`.
    pub fn lex_input(&self, i: &str) -> Result<Vec<Token>, LexError> {
        let operator_parsers = alt((
            Self::static_token_lexer_generator("==", Token::Eq),
            Self::static_token_lexer_generator("!=", Token::NotEq),
            Self::static_token_lexer_generator("<=", Token::LtEq),
            Self::static_token_lexer_generator(">=", Token::GtEq),
            Self::static_token_lexer_generator("=", Token::Assign),
            Self::static_token_lexer_generator("+", Token::Plus),
            Self::static_token_lexer_generator("-", Token::Minus),
            Self::static_token_lexer_generator("!", Token::Bang),
            Self::static_token_lexer_generator("*", Token::Asterisk),
            Self::static_token_lexer_generator("/", Token::Slash),
            Self::static_token_lexer_generator("<", Token::Lt),
            Self::static_token_lexer_generator(">", Token::Gt),
        ));

        let delimiter_parsers = alt((
            Self::static_token_lexer_generator("(", Token::LParen),
            Self::static_token_lexer_generator(")", Token::RParen),
            Self::static_token_lexer_generator("{", Token::LBrace),
            Self::static_token_lexer_generator("}", Token::RBrace),
            Self::static_token_lexer_generator("[", Token::LBracket),
            Self::static_token_lexer_generator("]", Token::RBracket),
            Self::static_token_lexer_generator(",", Token::Comma),
            Self::static_token_lexer_generator(";", Token::Semicolon),
            Self::static_token_lexer_generator(":", Token::Colon),
        ));

        // Comments come first so `//` never lexes as two slashes.
        let parser_result = many0(alt((
            Self::comment_lexer,
            Self::string_lexer,
            Self::number_lexer,
            operator_parsers,
            delimiter_parsers,
            Self::ident_lexer,
            Self::illegal_lexer,
        )))(i);

        let mut tokens = match parser_result {
            Ok((_, tokens)) => tokens,
            Err(Err::Error(e)) | Err(Err::Failure(e)) => return Err(LexError(convert_error(i, e))),
            Err(Err::Incomplete(needed)) => {
                return Err(LexError(format!("incomplete input: {:?}", needed)))
            }
        };

        tokens.push(Token::Eof);

        Ok(tokens)
    }

    fn static_token_lexer_generator<'a>(
        symbol: &'static str,
        token: Token,
    ) -> impl FnMut(&'a str) -> LexResult<'a, Token> {
        map(preceded(Self::whitespace, tag(symbol)), move |_| token.clone())
    }

    fn ident_lexer(input: &str) -> LexResult<'_, Token> {
        map(
            preceded(
                Self::whitespace,
                recognize(pair(
                    satisfy(|c: char| c.is_alphabetic() || c == '_'),
                    take_while(|c: char| c.is_alphanumeric() || c == '_'),
                )),
            ),
            Token::lookup_ident,
        )(input)
    }

    // Everything glued to a leading digit belongs to the literal; the parser
    // decides whether the text is a valid number.
    fn number_lexer(input: &str) -> LexResult<'_, Token> {
        map(
            preceded(
                Self::whitespace,
                recognize(pair(
                    satisfy(|c: char| c.is_ascii_digit()),
                    take_while(|c: char| c.is_ascii_alphanumeric() || c == '_' || c == '.'),
                )),
            ),
            |literal: &str| {
                if literal.contains('.') {
                    Token::Float(literal.to_string())
                } else {
                    Token::Int(literal.to_string())
                }
            },
        )(input)
    }

    fn string_lexer(input: &str) -> LexResult<'_, Token> {
        let (i, _) = preceded(Self::whitespace, tag("\""))(input)?;
        let (i, body) = take_while(|c: char| c != '"')(i)?;
        let (i, _) = opt(tag("\""))(i)?;

        Ok((i, Token::String(body.to_string())))
    }

    fn comment_lexer(input: &str) -> LexResult<'_, Token> {
        let (i, _) = preceded(Self::whitespace, tag("//"))(input)?;

        match i.find("//") {
            Some(end) => Ok((&i[end + 2..], Token::Comment(i[..end].to_string()))),
            None => Ok(("", Token::UnclosedComment(i.to_string()))),
        }
    }

    fn illegal_lexer(input: &str) -> LexResult<'_, Token> {
        map(preceded(Self::whitespace, take(1usize)), |c: &str| {
            Token::Illegal(c.to_string())
        })(input)
    }

    fn whitespace(i: &str) -> LexResult<'_, &str> {
        take_while(char::is_whitespace)(i)
    }
}
