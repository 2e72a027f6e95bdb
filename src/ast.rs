use std::fmt::{self, Display, Formatter};
use std::hash::{Hash, Hasher};

/// Maximum nesting depth of an expression, and of its syntax tree
pub const MAX_DEPTH: usize = 64;

/// Maximum number of nodes in the syntax tree of an expression
pub const MAX_NODES: usize = 4096;

fn truth(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

fn is_true(value: f64) -> bool {
    value != 0.0
}

/// Operators taking a single operand
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `-a`
    Neg,
    /// `!a`
    Not,
    Sqrt,
    Cbrt,
    Exp,
    Log,
    Log10,
    Log2,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Sinh,
    Cosh,
    Tanh,
    Abs,
    Floor,
    Ceil,
}

impl UnaryOp {
    /// Apply the operator. Never fails: domain errors give `NaN`.
    #[inline]
    pub fn apply(self, a: f64) -> f64 {
        match self {
            Self::Neg => -a,
            Self::Not => truth(!is_true(a)),
            Self::Sqrt => libm::sqrt(a),
            Self::Cbrt => libm::cbrt(a),
            Self::Exp => libm::exp(a),
            Self::Log => libm::log(a),
            Self::Log10 => libm::log10(a),
            Self::Log2 => libm::log2(a),
            Self::Sin => libm::sin(a),
            Self::Cos => libm::cos(a),
            Self::Tan => libm::tan(a),
            Self::Asin => libm::asin(a),
            Self::Acos => libm::acos(a),
            Self::Atan => libm::atan(a),
            Self::Sinh => libm::sinh(a),
            Self::Cosh => libm::cosh(a),
            Self::Tanh => libm::tanh(a),
            Self::Abs => libm::fabs(a),
            Self::Floor => libm::floor(a),
            Self::Ceil => libm::ceil(a),
        }
    }

    /// Name of the operator, as written in expressions
    pub fn name(self) -> &'static str {
        match self {
            Self::Neg => "-",
            Self::Not => "!",
            Self::Sqrt => "sqrt",
            Self::Cbrt => "cbrt",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Log10 => "log10",
            Self::Log2 => "log2",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan => "atan",
            Self::Sinh => "sinh",
            Self::Cosh => "cosh",
            Self::Tanh => "tanh",
            Self::Abs => "abs",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
        }
    }
}

/// Operators taking two operands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Min,
    Max,
    Atan2,
    Fmod,
    /// `heaviside(x, h0)`: 0 below zero, `h0` at zero, 1 above
    Heaviside,
    Less,
    Greater,
    LessEqual,
    GreaterEqual,
    Equal,
    NotEqual,
    And,
    Or,
}

impl BinaryOp {
    /// Apply the operator. Never fails: IEEE-754 rules give `inf` or `NaN`
    /// for division by zero and domain errors. Comparisons and logic
    /// operators give `1.0` or `0.0`, and any non-zero operand is true.
    #[inline]
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Pow => libm::pow(a, b),
            Self::Min => libm::fmin(a, b),
            Self::Max => libm::fmax(a, b),
            Self::Atan2 => libm::atan2(a, b),
            Self::Fmod => libm::fmod(a, b),
            Self::Heaviside => {
                if a < 0.0 {
                    0.0
                } else if a > 0.0 {
                    1.0
                } else if a == 0.0 {
                    b
                } else {
                    a
                }
            }
            Self::Less => truth(a < b),
            Self::Greater => truth(a > b),
            Self::LessEqual => truth(a <= b),
            Self::GreaterEqual => truth(a >= b),
            Self::Equal => truth(a == b),
            Self::NotEqual => truth(a != b),
            Self::And => truth(is_true(a) && is_true(b)),
            Self::Or => truth(is_true(a) || is_true(b)),
        }
    }

    /// The infix spelling of the operator, or `None` for functions
    pub fn symbol(self) -> Option<&'static str> {
        match self {
            Self::Add => Some("+"),
            Self::Sub => Some("-"),
            Self::Mul => Some("*"),
            Self::Div => Some("/"),
            Self::Pow => Some("^"),
            Self::Less => Some("<"),
            Self::Greater => Some(">"),
            Self::LessEqual => Some("<="),
            Self::GreaterEqual => Some(">="),
            Self::Equal => Some("=="),
            Self::NotEqual => Some("!="),
            Self::And => Some("&&"),
            Self::Or => Some("||"),
            Self::Min | Self::Max | Self::Atan2 | Self::Fmod | Self::Heaviside => None,
        }
    }

    /// Name of the function implementing the operator
    pub fn name(self) -> &'static str {
        match self {
            Self::Pow => "pow",
            Self::Min => "min",
            Self::Max => "max",
            Self::Atan2 => "atan2",
            Self::Fmod => "fmod",
            Self::Heaviside => "heaviside",
            other => other.symbol().unwrap_or("?"),
        }
    }
}

/// Syntax tree of an expression
#[derive(Debug, Clone)]
pub enum Ast {
    /// A constant value
    Literal(f64),
    /// A variable, read from the given slot when evaluating
    Variable(usize),
    /// op(<child>)
    Unary(UnaryOp, Box<Ast>),
    /// <left> op <right>
    Binary(BinaryOp, Box<Ast>, Box<Ast>),
    /// if(<predicate>, <then>, <else>)
    Conditional(Box<Ast>, Box<Ast>, Box<Ast>),
}

impl PartialEq<Self> for Ast {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Ast::Literal(v), Ast::Literal(v2)) => v.to_bits() == v2.to_bits(),
            (Ast::Variable(s), Ast::Variable(s2)) => s == s2,
            (Ast::Unary(op, a), Ast::Unary(op2, a2)) => op == op2 && a == a2,
            (Ast::Binary(op, a, b), Ast::Binary(op2, a2, b2)) => op == op2 && a == a2 && b == b2,
            (Ast::Conditional(p, a, b), Ast::Conditional(p2, a2, b2)) => {
                p == p2 && a == a2 && b == b2
            }
            _ => false,
        }
    }
}
impl Eq for Ast {}

impl Hash for Ast {
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Ast::Literal(v) => {
                state.write_u8(0);
                v.to_bits().hash(state);
            }
            Ast::Variable(slot) => {
                state.write_u8(1);
                slot.hash(state);
            }
            Ast::Unary(op, a) => {
                state.write_u8(2);
                op.hash(state);
                a.hash(state);
            }
            Ast::Binary(op, a, b) => {
                state.write_u8(3);
                op.hash(state);
                a.hash(state);
                b.hash(state);
            }
            Ast::Conditional(p, a, b) => {
                state.write_u8(4);
                p.hash(state);
                a.hash(state);
                b.hash(state);
            }
        }
    }
}

impl Ast {
    /// If the AST node correspond to a constant, get `Some(constant)`. Else,
    /// get `None`
    pub fn value(&self) -> Option<f64> {
        if let Self::Literal(value) = *self {
            Some(value)
        } else {
            None
        }
    }

    /// Number of nodes on the longest path from this node to a leaf
    pub fn depth(&self) -> usize {
        1 + match self {
            Self::Literal(_) | Self::Variable(_) => 0,
            Self::Unary(_, a) => a.depth(),
            Self::Binary(_, a, b) => a.depth().max(b.depth()),
            Self::Conditional(p, a, b) => p.depth().max(a.depth()).max(b.depth()),
        }
    }

    /// Number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + match self {
            Self::Literal(_) | Self::Variable(_) => 0,
            Self::Unary(_, a) => a.node_count(),
            Self::Binary(_, a, b) => a.node_count() + b.node_count(),
            Self::Conditional(p, a, b) => p.node_count() + a.node_count() + b.node_count(),
        }
    }

    /// Optimize the AST by doing constants propagation. Folding uses the
    /// same operator semantics as evaluation, so it never changes a result.
    pub fn optimize(self) -> Self {
        match self {
            Self::Literal(_) | Self::Variable(_) => self,
            Self::Unary(op, child) => {
                let child = child.optimize();
                if let Some(value) = child.value() {
                    return Self::Literal(op.apply(value));
                }
                Self::Unary(op, Box::new(child))
            }
            Self::Binary(op, left, right) => {
                let left = left.optimize();
                let right = right.optimize();
                if let (Some(left), Some(right)) = (left.value(), right.value()) {
                    return Self::Literal(op.apply(left, right));
                }
                Self::Binary(op, Box::new(left), Box::new(right))
            }
            Self::Conditional(predicate, then, otherwise) => {
                let predicate = predicate.optimize();
                let then = then.optimize();
                let otherwise = otherwise.optimize();
                match predicate.value() {
                    Some(p) if is_true(p) => then,
                    Some(_) => otherwise,
                    None => Self::Conditional(Box::new(predicate), Box::new(then), Box::new(otherwise)),
                }
            }
        }
    }

    /// Replace every variable by the node returned by `f` for its slot
    pub fn map_variables(self, f: &mut impl FnMut(usize) -> Ast) -> Self {
        match self {
            Self::Literal(_) => self,
            Self::Variable(slot) => f(slot),
            Self::Unary(op, a) => Self::Unary(op, Box::new(a.map_variables(f))),
            Self::Binary(op, a, b) => {
                let a = a.map_variables(f);
                let b = b.map_variables(f);
                Self::Binary(op, Box::new(a), Box::new(b))
            }
            Self::Conditional(p, a, b) => {
                let p = p.map_variables(f);
                let a = a.map_variables(f);
                let b = b.map_variables(f);
                Self::Conditional(Box::new(p), Box::new(a), Box::new(b))
            }
        }
    }

    /// Display the tree, fully parenthesised, naming variables with `names`
    pub fn display<'a>(&'a self, names: &'a [String]) -> impl Display + 'a {
        Named { ast: self, names }
    }
}

struct Named<'a> {
    ast: &'a Ast,
    names: &'a [String],
}

impl<'a> Named<'a> {
    fn child(&self, ast: &'a Ast) -> Self {
        Named {
            ast,
            names: self.names,
        }
    }
}

impl Display for Named<'_> {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        match self.ast {
            Ast::Literal(value) if value.is_sign_negative() => write!(fmt, "({:?})", value),
            Ast::Literal(value) => write!(fmt, "{:?}", value),
            Ast::Variable(slot) => match self.names.get(*slot) {
                Some(name) => write!(fmt, "{}", name),
                None => write!(fmt, "${}", slot),
            },
            Ast::Unary(op @ UnaryOp::Neg, a) | Ast::Unary(op @ UnaryOp::Not, a) => {
                write!(fmt, "({}{})", op.name(), self.child(a))
            }
            Ast::Unary(op, a) => write!(fmt, "{}({})", op.name(), self.child(a)),
            Ast::Binary(op, a, b) => match op.symbol() {
                Some(symbol) => write!(fmt, "({} {} {})", self.child(a), symbol, self.child(b)),
                None => write!(fmt, "{}({}, {})", op.name(), self.child(a), self.child(b)),
            },
            Ast::Conditional(p, a, b) => write!(
                fmt,
                "if({}, {}, {})",
                self.child(p),
                self.child(a),
                self.child(b)
            ),
        }
    }
}
