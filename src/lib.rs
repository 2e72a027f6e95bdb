#![warn(missing_docs, clippy::all, clippy::pedantic)]
#![allow(
    clippy::needless_return,
    clippy::missing_docs_in_private_items,
    clippy::non_ascii_literal,
    clippy::float_cmp,
    clippy::module_name_repetitions
)]

//! fieldexpr, parse-once evaluate-everywhere mathematical expressions.
//!
//! A formula supplied by a user, such as `2*x*exp(-(x-5)^2/2)`, is parsed
//! once into a [`CompiledExpression`]. The compiled form is immutable and can
//! then be evaluated any number of times, from any number of threads, with
//! different values for its variables:
//!
//! ```
//! use std::collections::HashMap;
//!
//! let expr = fieldexpr::parse("y + x*y - x", &HashMap::new()).unwrap();
//! assert_eq!(fieldexpr::required_variable_names(&expr), &["y", "x"]);
//! assert_eq!(fieldexpr::evaluate(&expr, &[2.0, 3.0]), Ok(5.0));
//! assert_eq!(fieldexpr::evaluate(&expr, &[1.0, 1.0]), Ok(1.0));
//! ```
//!
//! Values are given in the order of
//! [`required_variable_names`](fn.required_variable_names.html), which is the
//! order in which the variables first appear in the source. Named constants
//! are passed to the parser explicitly and folded into the expression:
//!
//! ```
//! use std::collections::HashMap;
//!
//! let mut constants = HashMap::new();
//! constants.insert("pi".to_string(), std::f64::consts::PI);
//! let expr = fieldexpr::parse("pi*2", &constants).unwrap();
//! assert!(expr.required_variable_names().is_empty());
//! assert_eq!(expr.evaluate(&[]), Ok(2.0 * std::f64::consts::PI));
//! ```
//!
//! Code that always passes the same coordinates can use a [`BoundExpr`]
//! instead of managing the variable order itself:
//!
//! ```
//! use fieldexpr::{constants, CompiledExpression};
//!
//! let density = CompiledExpression::parse("n0 * exp(-(x*x + y*y) / (w0*w0))", &{
//!     let mut c = constants::physical();
//!     c.insert("n0".into(), 1e24);
//!     c.insert("w0".into(), 5e-6);
//!     c
//! })
//! .unwrap()
//! .bind(["x", "y", "z", "t"])
//! .unwrap();
//! assert_eq!(density.at(0.0, 0.0, 1.0, 0.0), Ok(1e24));
//! ```
//!
//! # Language definition
//!
//! The language implemented by fieldexpr can contain the following elements:
//!
//! - float literal values: `12.456`, `.5`, `0.0045e78`, ...;
//! - left and right parenthesis;
//! - arithmetic operators: `+`, `-`, `*`, `/` and `^` for exponentiation;
//! - comparison operators `<`, `>`, `<=`, `>=`, `==` and `!=`, and logic
//!   operators `&&`, `||` and `!`. They give `1` for true and `0` for false,
//!   and treat any non-zero operand as true;
//! - variables and constants. Names are ASCII only, start with a letter or
//!   `_`, and can contain letters, digits and `_`;
//! - function calls: `sqrt`, `cbrt`, `exp`, `log`, `log10`, `log2`, `sin`,
//!   `cos`, `tan`, `asin`, `acos`, `atan`, `sinh`, `cosh`, `tanh`, `abs`,
//!   `floor`, `ceil` take one argument; `pow`, `min`, `max`, `atan2`, `fmod`
//!   and `heaviside` take two; `if(condition, then, else)` takes three.
//!
//! Any other symbol is forbidden in the input, and calling any other function
//! is an error.
//!
//! From tightest to loosest binding, operators are: prefix `-`, `+` and `!`;
//! `^` (right associative); `*` and `/`; `+` and `-`; comparisons; `&&` and
//! `||`. Note that prefix minus binds tighter than `^`: `-2^2` is `4`.
//!
//! Evaluation follows IEEE-754 rules and never fails on numeric grounds:
//! `1/0` is `inf`, `0/0` and `sqrt(-1)` are `NaN`.
//!
//! # Technical details
//!
//! Parsing is a precedence climbing parser over a lazy lexer. Nesting depth,
//! syntax tree size and the number of variables are bounded when parsing (see
//! [`MAX_DEPTH`], [`MAX_NODES`] and [`MAX_VARIABLES`]). Constant subtrees are
//! folded, and the tree is then flattened into postfix instructions run on a
//! fixed-size stack: evaluation does not recurse, allocate, lock or panic.

#[macro_use]
extern crate lazy_static;

pub mod ast;
mod binding;
pub mod constants;
mod error;
mod expr;
mod lexer;
mod parser;
pub mod program;
mod registry;
mod symbols;
mod token;

pub use ast::{Ast, BinaryOp, UnaryOp, MAX_DEPTH, MAX_NODES};
pub use binding::{BoundExpr, SpaceTimeExpr, SpatialExpr};
pub use error::{BindingError, Error, EvalFault, LexError, ParseError};
pub use expr::{eval, CompiledExpression};
pub use lexer::{is_identifier, Lexer};
pub use program::{Instr, Program, STACK_CAPACITY};
pub use registry::{Function, FUNCTIONS};
pub use symbols::{Resolved, Role, Symbol, SymbolTable, MAX_VARIABLES};
pub use token::{Op, Token, TokenKind};

use std::collections::HashMap;

/// Parse `source`, folding the names defined in `constants`.
///
/// Same as [`CompiledExpression::parse`].
pub fn parse(source: &str, constants: &HashMap<String, f64>) -> Result<CompiledExpression, ParseError> {
    CompiledExpression::parse(source, constants)
}

/// Evaluate `expr` with `values` bound to its variables, in the order of
/// [`required_variable_names`].
///
/// Same as [`CompiledExpression::evaluate`].
#[inline]
pub fn evaluate(expr: &CompiledExpression, values: &[f64]) -> Result<f64, EvalFault> {
    expr.evaluate(values)
}

/// The variables of `expr`, in the order their values are expected.
///
/// Same as [`CompiledExpression::required_variable_names`].
pub fn required_variable_names(expr: &CompiledExpression) -> &[String] {
    expr.required_variable_names()
}
