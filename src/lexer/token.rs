use nom::{InputIter, InputLength, InputTake, Needed, UnspecializedInput};
use std::{
    fmt::{self, Display},
    iter::Enumerate,
    slice::Iter,
};

#[derive(Debug, Eq, PartialEq, Clone)]
pub enum Token {
    Eof,

    // Symbols
    Comma,
    Semicolon,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    // Operators
    Assign,
    Plus,
    Minus,
    Bang,
    Asterisk,
    Slash,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,

    // Keywords
    Function,
    Let,
    True,
    False,
    If,
    Else,
    Return,
    Null,
    Exit,

    // Complex Types
    Ident(String),
    Int(String),
    Float(String),
    String(String),
    Comment(String),
    UnclosedComment(String),
    Illegal(String),
}

pub(crate) static EOF: Token = Token::Eof;

impl Token {
    /// Maps a scanned word onto its keyword, falling back to an identifier.
    pub fn lookup_ident(word: &str) -> Token {
        match word {
            "fn" => Token::Function,
            "let" => Token::Let,
            "true" => Token::True,
            "false" => Token::False,
            "if" => Token::If,
            "else" => Token::Else,
            "return" => Token::Return,
            "null" => Token::Null,
            "exit" => Token::Exit,
            _ => Token::Ident(word.to_string()),
        }
    }
}

impl Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Eof => write!(f, "EOF"),
            Token::Comma => write!(f, ","),
            Token::Semicolon => write!(f, ";"),
            Token::Colon => write!(f, ":"),
            Token::LParen => write!(f, "("),
            Token::RParen => write!(f, ")"),
            Token::LBrace => write!(f, "{{"),
            Token::RBrace => write!(f, "}}"),
            Token::LBracket => write!(f, "["),
            Token::RBracket => write!(f, "]"),
            Token::Assign => write!(f, "="),
            Token::Plus => write!(f, "+"),
            Token::Minus => write!(f, "-"),
            Token::Bang => write!(f, "!"),
            Token::Asterisk => write!(f, "*"),
            Token::Slash => write!(f, "/"),
            Token::Lt => write!(f, "<"),
            Token::Gt => write!(f, ">"),
            Token::LtEq => write!(f, "<="),
            Token::GtEq => write!(f, ">="),
            Token::Eq => write!(f, "=="),
            Token::NotEq => write!(f, "!="),
            Token::Function => write!(f, "fn"),
            Token::Let => write!(f, "let"),
            Token::True => write!(f, "true"),
            Token::False => write!(f, "false"),
            Token::If => write!(f, "if"),
            Token::Else => write!(f, "else"),
            Token::Return => write!(f, "return"),
            Token::Null => write!(f, "null"),
            Token::Exit => write!(f, "exit"),
            Token::Ident(ident) => write!(f, "IDENT({})", ident),
            Token::Int(num) => write!(f, "INT({})", num),
            Token::Float(num) => write!(f, "FLOAT({})", num),
            Token::String(s) => write!(f, r#"STRING("{}")"#, s),
            Token::Comment(_) => write!(f, "COMMENT"),
            Token::UnclosedComment(_) => write!(f, "UNCLOSED_COMMENT"),
            Token::Illegal(s) => write!(f, "ILLEGAL({})", s),
        }
    }
}

#[derive(Clone, Eq, PartialEq, Debug)]
pub struct TokenSlice<'a> {
    pub slice: &'a [Token],
}

impl<'a> TokenSlice<'a> {
    pub fn from_tokens(tokens: &'a [Token]) -> Self {
        Self { slice: tokens }
    }

    /// The token under the cursor. An exhausted slice reads as `Eof`.
    pub fn current(&self) -> &'a Token {
        self.slice.first().unwrap_or(&EOF)
    }

    /// One token of lookahead past the cursor.
    pub fn peek(&self) -> &'a Token {
        self.slice.get(1).unwrap_or(&EOF)
    }

    pub fn advance(&self, count: usize) -> Self {
        let count = count.min(self.slice.len());
        Self {
            slice: &self.slice[count..],
        }
    }

    pub fn is_at_end(&self) -> bool {
        matches!(self.current(), Token::Eof)
    }
}

impl<'a> InputLength for TokenSlice<'a> {
    fn input_len(&self) -> usize {
        self.slice.len()
    }
}

impl<'a> InputTake for TokenSlice<'a> {
    fn take(&self, count: usize) -> Self {
        Self {
            slice: &self.slice[..count],
        }
    }

    fn take_split(&self, count: usize) -> (Self, Self) {
        let (front, back) = self.slice.split_at(count);
        (Self { slice: back }, Self { slice: front })
    }
}

impl<'a> InputIter for TokenSlice<'a> {
    type Item = &'a Token;
    type Iter = Enumerate<Iter<'a, Token>>;
    type IterElem = Iter<'a, Token>;

    fn iter_indices(&self) -> Self::Iter {
        self.slice.iter().enumerate()
    }

    fn iter_elements(&self) -> Self::IterElem {
        self.slice.iter()
    }

    fn position<P>(&self, predicate: P) -> Option<usize>
    where
        P: Fn(Self::Item) -> bool,
    {
        self.slice.iter().position(predicate)
    }

    fn slice_index(&self, count: usize) -> Result<usize, Needed> {
        if self.slice.len() >= count {
            Ok(count)
        } else {
            Err(Needed::new(count - self.slice.len()))
        }
    }
}

impl<'a> UnspecializedInput for TokenSlice<'a> {}
