use log::debug;
use phf::phf_map;
use serde::Serialize;
use std::fmt;

/// Lexeme of the integer type keyword.
pub const INT_TYPE: &str = "int";

/// Name of the function evaluated as soon as it is defined.
pub const ENTRY_POINT: &str = "main";

/// Arithmetic and comparison operators understood by the evaluator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Mod,
    Div,
    Eq,
    NotEq,
    Greater,
    Less,
    GreaterEq,
    LessEq,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Mod => "%",
            BinaryOp::Div => "/",
            BinaryOp::Eq => "==",
            BinaryOp::NotEq => "!=",
            BinaryOp::Greater => ">",
            BinaryOp::Less => "<",
            BinaryOp::GreaterEq => ">=",
            BinaryOp::LessEq => "<=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Classification of a single AST lexeme.
///
/// Structural keywords are emitted by the front-end compiler as interior
/// nodes; `Constant`, `Identifier` and `Other` are derived from the shape of
/// the lexeme itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// ';' statement sequencing
    Sequence,

    /// '~' declaration
    Declaration,

    /// '=' assignment
    Assign,

    /// 'D' function definition
    FunctionDef,

    /// 'if'
    If,

    /// 'else'
    Else,

    /// 'return'
    Return,

    /// 'apply' function application
    Apply,

    /// ',' argument / parameter separator
    Comma,

    /// 'int'
    IntType,

    /// 'print' builtin
    Print,

    Operator(BinaryOp),

    /// Digits only
    Constant,

    /// Alphabetic name
    Identifier,

    Other,
}

static KEYWORDS: phf::Map<&'static str, TokenKind> = phf_map! {
    ";"      => TokenKind::Sequence,
    "~"      => TokenKind::Declaration,
    "="      => TokenKind::Assign,
    "D"      => TokenKind::FunctionDef,
    "if"     => TokenKind::If,
    "else"   => TokenKind::Else,
    "return" => TokenKind::Return,
    "apply"  => TokenKind::Apply,
    ","      => TokenKind::Comma,
    "int"    => TokenKind::IntType,
    "print"  => TokenKind::Print,
    "+"      => TokenKind::Operator(BinaryOp::Add),
    "-"      => TokenKind::Operator(BinaryOp::Sub),
    "*"      => TokenKind::Operator(BinaryOp::Mul),
    "%"      => TokenKind::Operator(BinaryOp::Mod),
    "/"      => TokenKind::Operator(BinaryOp::Div),
    "=="     => TokenKind::Operator(BinaryOp::Eq),
    "!="     => TokenKind::Operator(BinaryOp::NotEq),
    ">"      => TokenKind::Operator(BinaryOp::Greater),
    "<"      => TokenKind::Operator(BinaryOp::Less),
    ">="     => TokenKind::Operator(BinaryOp::GreaterEq),
    "<="     => TokenKind::Operator(BinaryOp::LessEq),
};

/// A single lexeme read from one AST line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Token {
    lexeme: String,
}

impl Token {
    pub fn new<S: Into<String>>(lexeme: S) -> Self {
        Self {
            lexeme: lexeme.into(),
        }
    }

    pub fn lexeme(&self) -> &str {
        &self.lexeme
    }

    /// Numeric literal: non-empty, ASCII digits only.
    pub fn is_constant(&self) -> bool {
        !self.lexeme.is_empty() && self.lexeme.bytes().all(|b| b.is_ascii_digit())
    }

    /// Variable or function name: non-empty, alphabetic only.
    pub fn is_identifier(&self) -> bool {
        !self.lexeme.is_empty() && self.lexeme.chars().all(char::is_alphabetic)
    }

    /// Compiler generated temporary such as `t12`.
    pub fn is_temporary(&self) -> bool {
        match self.lexeme.strip_prefix('t') {
            Some(digits) => !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()),
            None => false,
        }
    }

    /// The parsed integer when the token is a constant that fits in an `i64`.
    pub fn value(&self) -> Option<i64> {
        if self.is_constant() {
            self.lexeme.parse().ok()
        } else {
            None
        }
    }

    pub fn kind(&self) -> TokenKind {
        let kind = if let Some(kind) = KEYWORDS.get(self.lexeme.as_str()) {
            *kind
        } else if self.is_constant() {
            TokenKind::Constant
        } else if self.is_identifier() {
            TokenKind::Identifier
        } else {
            TokenKind::Other
        };

        debug!("Classified token '{}' as {:?}", self.lexeme, kind);

        kind
    }

    pub fn is(&self, kind: TokenKind) -> bool {
        self.kind() == kind
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.lexeme)
    }
}

impl From<&str> for Token {
    fn from(lexeme: &str) -> Self {
        Token::new(lexeme)
    }
}
