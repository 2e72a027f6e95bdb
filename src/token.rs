/// A token with the byte offset where it starts in the source string
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Possible tokens to find in the input string
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// A numeric literal
    Number(f64),
    /// A variable, constant or function name
    Identifier(String),
    /// An operator
    Operator(Op),
    /// Left parenthesis
    LParen,
    /// Right parenthesis
    RParen,
    /// Argument separator
    Comma,
    /// End of input
    End,
}

impl TokenKind {
    /// Human readable description, used in error messages
    pub fn describe(&self) -> String {
        match self {
            Self::Number(value) => format!("number {}", value),
            Self::Identifier(name) => format!("identifier '{}'", name),
            Self::Operator(op) => format!("operator '{}'", op.symbol()),
            Self::LParen => "'('".into(),
            Self::RParen => "')'".into(),
            Self::Comma => "','".into(),
            Self::End => "end of input".into(),
        }
    }
}

/// Allowed operators in the language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Mul,
    Div,
    Pow,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
    Not,
}

impl Op {
    /// Get the binary precedence of the operator. Operators with higher
    /// precedence should be evaluated first. `!` is prefix only and has no
    /// binary precedence.
    pub fn precedence(self) -> Option<u8> {
        match self {
            Self::And | Self::Or => Some(1),
            Self::Less
            | Self::Greater
            | Self::LessEqual
            | Self::GreaterEqual
            | Self::Equal
            | Self::NotEqual => Some(2),
            Self::Plus | Self::Minus => Some(3),
            Self::Mul | Self::Div => Some(4),
            Self::Pow => Some(5),
            Self::Not => None,
        }
    }

    /// Check if the operator is left associative
    pub fn is_left_associative(self) -> bool {
        !matches!(self, Self::Pow)
    }

    /// Check if the operator is right associative
    pub fn is_right_associative(self) -> bool {
        !self.is_left_associative()
    }

    /// The source spelling of the operator
    pub fn symbol(self) -> &'static str {
        match self {
            Self::Plus => "+",
            Self::Minus => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Less => "<",
            Self::Greater => ">",
            Self::LessEqual => "<=",
            Self::GreaterEqual => ">=",
            Self::Equal => "==",
            Self::NotEqual => "!=",
            Self::And => "&&",
            Self::Or => "||",
            Self::Not => "!",
        }
    }
}
