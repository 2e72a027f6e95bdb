use crate::ast::{BinaryOp, UnaryOp};
use hashbrown::HashMap;

/// A named function of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    /// `name(a)`
    Unary(UnaryOp),
    /// `name(a, b)`
    Binary(BinaryOp),
    /// `if(condition, then, else)`
    Conditional,
}

impl Function {
    /// Number of arguments the function takes
    pub fn arity(self) -> usize {
        match self {
            Self::Unary(_) => 1,
            Self::Binary(_) => 2,
            Self::Conditional => 3,
        }
    }
}

lazy_static! {
    /// Every function callable from an expression. The set is closed: a call
    /// to any other name is rejected when parsing.
    pub static ref FUNCTIONS: HashMap<&'static str, Function> = {
        let mut map = HashMap::new();
        map.insert("sqrt", Function::Unary(UnaryOp::Sqrt));
        map.insert("cbrt", Function::Unary(UnaryOp::Cbrt));
        map.insert("exp", Function::Unary(UnaryOp::Exp));
        map.insert("log", Function::Unary(UnaryOp::Log));
        map.insert("log10", Function::Unary(UnaryOp::Log10));
        map.insert("log2", Function::Unary(UnaryOp::Log2));
        map.insert("sin", Function::Unary(UnaryOp::Sin));
        map.insert("cos", Function::Unary(UnaryOp::Cos));
        map.insert("tan", Function::Unary(UnaryOp::Tan));
        map.insert("asin", Function::Unary(UnaryOp::Asin));
        map.insert("acos", Function::Unary(UnaryOp::Acos));
        map.insert("atan", Function::Unary(UnaryOp::Atan));
        map.insert("sinh", Function::Unary(UnaryOp::Sinh));
        map.insert("cosh", Function::Unary(UnaryOp::Cosh));
        map.insert("tanh", Function::Unary(UnaryOp::Tanh));
        map.insert("abs", Function::Unary(UnaryOp::Abs));
        map.insert("floor", Function::Unary(UnaryOp::Floor));
        map.insert("ceil", Function::Unary(UnaryOp::Ceil));
        map.insert("pow", Function::Binary(BinaryOp::Pow));
        map.insert("min", Function::Binary(BinaryOp::Min));
        map.insert("max", Function::Binary(BinaryOp::Max));
        map.insert("atan2", Function::Binary(BinaryOp::Atan2));
        map.insert("fmod", Function::Binary(BinaryOp::Fmod));
        map.insert("heaviside", Function::Binary(BinaryOp::Heaviside));
        map.insert("if", Function::Conditional);
        map.shrink_to_fit();
        map
    };
}

/// Look up a function by name
pub fn lookup(name: &str) -> Option<Function> {
    FUNCTIONS.get(name).copied()
}
