use crate::ast::Ast;
use crate::error::{BindingError, Error, EvalFault, ParseError};
use crate::parser;
use crate::program::Program;
use crate::symbols::SymbolTable;
use log::{debug, trace};
use std::collections::HashMap;
use std::fmt::{self, Display, Formatter};

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Evaluate a single expression from `input`.
///
/// Every name in `context` is folded into the expression as a constant. Any
/// other name is an error, since nothing is left to bind it at evaluation.
///
/// # Example
///
/// ```
/// # use std::collections::HashMap;
/// # use fieldexpr::eval;
///
/// assert_eq!(eval("45 - 2^3", &HashMap::new()), Ok(37.0));
///
/// let mut context: HashMap<String, f64> = HashMap::new();
/// context.insert("a".into(), -5.0);
/// assert_eq!(eval("3 * a", &context), Ok(-15.0));
/// assert!(eval("3 * b", &context).is_err());
/// ```
pub fn eval(input: &str, context: &HashMap<String, f64>) -> Result<f64, Error> {
    let expr = CompiledExpression::parse(input, context)?;
    if let Some(name) = expr.required_variable_names().first() {
        return Err(BindingError::UnboundVariable { name: name.clone() }.into());
    }
    Ok(expr.evaluate(&[])?)
}

/// A parsed, optimized and flattened mathematical expression.
///
/// The expression is immutable once built. It can be shared by reference
/// between threads and evaluated from all of them at once.
///
/// # Examples
/// ```
/// # use fieldexpr::CompiledExpression;
/// # use std::collections::HashMap;
/// let expr = CompiledExpression::parse("3 + 5 * 2", &HashMap::new()).unwrap();
/// assert_eq!(expr.evaluate(&[]), Ok(13.0));
///
/// let expr = CompiledExpression::parse("-2 * a + b", &HashMap::new()).unwrap();
/// assert_eq!(expr.required_variable_names(), &["a", "b"]);
/// assert_eq!(expr.evaluate(&[42.0, 1.0]), Ok(-83.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledExpression {
    ast: Ast,
    program: Program,
    variables: Vec<String>,
    depth: usize,
}

impl CompiledExpression {
    /// Parse the given mathematical `expression`.
    ///
    /// Names found in `constants` are replaced by their value. Every other
    /// name is a variable, and the variables must be supplied at evaluation
    /// time in order of first appearance in `expression`.
    ///
    /// # Examples
    /// ```
    /// # use fieldexpr::CompiledExpression;
    /// # use std::collections::HashMap;
    /// // A valid expression
    /// assert!(CompiledExpression::parse("3 + 5 * 2", &HashMap::new()).is_ok());
    /// // an invalid expression
    /// assert!(CompiledExpression::parse("3eff + 5 * 2", &HashMap::new()).is_err());
    /// ```
    pub fn parse(expression: &str, constants: &HashMap<String, f64>) -> Result<Self, ParseError> {
        let mut symbols = SymbolTable::with_constants(constants);
        let ast = parser::parse(expression, &mut symbols)?;
        let compiled = Self::build(ast, symbols.variable_names());
        debug!(
            "compiled '{}': {} variable(s), depth {}, {} instruction(s)",
            expression,
            compiled.variables.len(),
            compiled.depth,
            compiled.program.instructions().len()
        );
        Ok(compiled)
    }

    fn build(ast: Ast, variables: Vec<String>) -> Self {
        let nodes = ast.node_count();
        let ast = ast.optimize();
        trace!("constant folding: {} -> {} node(s)", nodes, ast.node_count());
        let program = Program::compile(&ast, variables.len());
        Self {
            depth: ast.depth(),
            ast,
            program,
            variables,
        }
    }

    /// Evaluate the expression, with `values` given in the order of
    /// [`required_variable_names`](#method.required_variable_names).
    ///
    /// # Examples
    ///
    /// ```
    /// # use fieldexpr::CompiledExpression;
    /// # use std::collections::HashMap;
    /// let expr = CompiledExpression::parse("y + x*y - x", &HashMap::new()).unwrap();
    /// assert_eq!(expr.required_variable_names(), &["y", "x"]);
    /// assert_eq!(expr.evaluate(&[2.0, 3.0]), Ok(5.0));
    ///
    /// let expr = CompiledExpression::parse("1/0", &HashMap::new()).unwrap();
    /// assert_eq!(expr.evaluate(&[]), Ok(f64::INFINITY));
    /// ```
    #[inline]
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, EvalFault> {
        self.program.evaluate(values)
    }

    /// Evaluate the expression once per row of `rows`, a row-major array
    /// holding one value per variable for each row, storing the results in
    /// `out`. Rows are processed in parallel with the `rayon` feature.
    ///
    /// ```
    /// # use fieldexpr::CompiledExpression;
    /// # use std::collections::HashMap;
    /// let expr = CompiledExpression::parse("x * y", &HashMap::new()).unwrap();
    /// let mut out = [0.0; 3];
    /// expr.evaluate_rows(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0], &mut out).unwrap();
    /// assert_eq!(out, [2.0, 12.0, 30.0]);
    /// ```
    pub fn evaluate_rows(&self, rows: &[f64], out: &mut [f64]) -> Result<(), EvalFault> {
        let width = self.variables.len();
        if rows.len() != width * out.len() {
            return Err(EvalFault::WrongValueCount {
                expected: width * out.len(),
                found: rows.len(),
            });
        }
        if width == 0 {
            let value = self.evaluate(&[])?;
            out.iter_mut().for_each(|o| *o = value);
            return Ok(());
        }

        #[cfg(feature = "rayon")]
        let result = out
            .par_iter_mut()
            .zip(rows.par_chunks(width))
            .try_for_each(|(o, row)| {
                *o = self.evaluate(row)?;
                Ok(())
            });
        #[cfg(not(feature = "rayon"))]
        let result = out
            .iter_mut()
            .zip(rows.chunks(width))
            .try_for_each(|(o, row)| {
                *o = self.evaluate(row)?;
                Ok(())
            });
        result
    }

    /// Replace some variables by constants, without parsing again.
    ///
    /// The remaining variables keep their relative order, and the result is
    /// folded again. Names of `constants` that are not variables of this
    /// expression are ignored.
    ///
    /// ```
    /// # use fieldexpr::CompiledExpression;
    /// # use std::collections::HashMap;
    /// let expr = CompiledExpression::parse("a * x + b", &HashMap::new()).unwrap();
    /// let mut constants = HashMap::new();
    /// constants.insert("a".to_string(), 2.0);
    /// constants.insert("b".to_string(), 1.0);
    /// let line = expr.with_constants(&constants);
    /// assert_eq!(line.required_variable_names(), &["x"]);
    /// assert_eq!(line.evaluate(&[3.0]), Ok(7.0));
    /// ```
    pub fn with_constants(&self, constants: &HashMap<String, f64>) -> Self {
        let mut replacements = Vec::with_capacity(self.variables.len());
        let mut variables = Vec::new();
        for name in &self.variables {
            replacements.push(match constants.get(name) {
                Some(&value) => Ast::Literal(value),
                None => {
                    variables.push(name.clone());
                    Ast::Variable(variables.len() - 1)
                }
            });
        }

        let ast = self
            .ast
            .clone()
            .map_variables(&mut |slot| replacements[slot].clone());
        let compiled = Self::build(ast, variables);
        debug!(
            "substituted {} constant(s) into '{}', {} variable(s) left",
            self.variables.len() - compiled.variables.len(),
            self,
            compiled.variables.len()
        );
        compiled
    }

    /// Names of the variables of this expression, in the order their values
    /// must be given to [`evaluate`](#method.evaluate)
    pub fn required_variable_names(&self) -> &[String] {
        &self.variables
    }

    /// Depth of the optimized syntax tree
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn ast(&self) -> &Ast {
        &self.ast
    }

    pub fn program(&self) -> &Program {
        &self.program
    }
}

impl Display for CompiledExpression {
    fn fmt(&self, fmt: &mut Formatter) -> fmt::Result {
        write!(fmt, "{}", self.ast.display(&self.variables))
    }
}

#[cfg(test)]
mod tests {
    use super::{eval, CompiledExpression, HashMap};
    use crate::ast::MAX_DEPTH;
    use crate::error::{BindingError, Error, EvalFault, ParseError};
    use test_case::test_case;

    fn compile(input: &str) -> CompiledExpression {
        CompiledExpression::parse(input, &HashMap::new()).unwrap()
    }

    #[test]
    fn parse() {
        let valid_expressions = [
            "3 + +5e67",
            "(3 + -5)*45",
            "(3. + 5.0)*\t\n45",
            "(3 + 5^5e-6)*45",
            "sin(34.0) ^ sqrt(28.0)",
            "2*x*exp(-(x-5)^2/2)",
            "if(t < 1e-15, 0, sin(omega*t)) * (x*x + y*y <= r0^2)",
        ];
        for expr in &valid_expressions {
            assert!(CompiledExpression::parse(expr, &HashMap::new()).is_ok(), "{}", expr);
        }
    }

    #[test_case("3 + 5" => 8.0 ; "add")]
    #[test_case("2 - 5" => -3.0 ; "sub")]
    #[test_case("2 * 5" => 10.0 ; "mul")]
    #[test_case("10 / 5" => 2.0 ; "div")]
    #[test_case("2 ^ 3" => 8.0 ; "pow")]
    #[test_case("2*3+4" => 10.0 ; "mixed")]
    #[test_case("2^10" => 1024.0 ; "power of two")]
    #[test_case("-3" => -3.0 ; "negative literal")]
    #[test_case("25 + -3" => 22.0 ; "add negative")]
    #[test_case("25 - -3" => 28.0 ; "sub negative")]
    #[test_case("3 + 5 * 2" => 13.0 ; "mul before add")]
    #[test_case("4 ^ 3 ^ 2" => 262144.0 ; "pow right assoc")]
    #[test_case("-2^2" => 4.0 ; "minus before pow")]
    #[test_case("2^-1" => 0.5 ; "negative exponent")]
    #[test_case("sqrt(9)" => 3.0 ; "sqrt")]
    #[test_case("min(2, -1) + max(2, -1)" => 1.0 ; "min max")]
    #[test_case("1 < 2 && 2 < 1" => 0.0 ; "and")]
    #[test_case("1 < 2 || 2 < 1" => 1.0 ; "or")]
    #[test_case("!(1 == 1)" => 0.0 ; "not")]
    #[test_case("1 + 1 == 2" => 1.0 ; "comparison after sum")]
    #[test_case("if(2 >= 3, 10, 20)" => 20.0 ; "conditional")]
    #[test_case("heaviside(0, 0.5)" => 0.5 ; "heaviside")]
    fn constant_expressions(input: &str) -> f64 {
        compile(input).evaluate(&[]).unwrap()
    }

    #[test]
    fn ieee_results() {
        assert_eq!(compile("1/0").evaluate(&[]), Ok(f64::INFINITY));
        assert_eq!(compile("-1/0").evaluate(&[]), Ok(f64::NEG_INFINITY));
        assert!(compile("0/0").evaluate(&[]).unwrap().is_nan());
        assert!(compile("sqrt(-1)").evaluate(&[]).unwrap().is_nan());

        let expr = compile("x / y");
        assert_eq!(expr.evaluate(&[1.0, 0.0]), Ok(f64::INFINITY));
        assert!(expr.evaluate(&[0.0, 0.0]).unwrap().is_nan());
        let expr = compile("log(x) + 1");
        assert_eq!(expr.evaluate(&[0.0]), Ok(f64::NEG_INFINITY));
        assert!(expr.evaluate(&[-1.0]).unwrap().is_nan());
    }

    #[test]
    fn variables_in_first_use_order() {
        assert_eq!(compile("y + x*y - x").required_variable_names(), &["y", "x"]);
        assert_eq!(
            compile("t * sin(z) + x - t").required_variable_names(),
            &["t", "z", "x"]
        );
        assert!(compile("1 + 2").required_variable_names().is_empty());
    }

    #[test]
    fn evaluate_with_variables() {
        let expr = compile("2*x*exp(-(x-5)^2/2)");
        assert_eq!(expr.evaluate(&[5.0]), Ok(10.0));
        // Unary minus binds tighter than `^`
        let expected = 2.0 * 4.0 * 0.5f64.exp();
        assert!((expr.evaluate(&[4.0]).unwrap() - expected).abs() < 1e-12);
        let gaussian = compile("2*x*exp(-((x-5)^2)/2)");
        let expected = 2.0 * 4.0 * (-0.5f64).exp();
        assert!((gaussian.evaluate(&[4.0]).unwrap() - expected).abs() < 1e-12);

        let expr = compile("(a + b)^2");
        assert_eq!(expr.evaluate(&[1.0, 2.0]), Ok(9.0));

        let expr = compile("if(x > 0, x, -x)");
        assert_eq!(expr.evaluate(&[-3.0]), Ok(3.0));
        assert_eq!(expr.evaluate(&[3.0]), Ok(3.0));
    }

    #[test]
    fn constants_are_folded() {
        let mut constants = HashMap::new();
        constants.insert("pi".to_string(), std::f64::consts::PI);
        let expr = CompiledExpression::parse("pi*2", &constants).unwrap();
        assert!(expr.required_variable_names().is_empty());
        assert_eq!(expr.program().instructions().len(), 1);
        assert_eq!(expr.evaluate(&[]), Ok(2.0 * std::f64::consts::PI));

        let expr = CompiledExpression::parse("x * pi / 2", &constants).unwrap();
        assert_eq!(expr.required_variable_names(), &["x"]);
        assert_eq!(expr.evaluate(&[2.0]), Ok(std::f64::consts::PI));
    }

    #[test]
    fn parsing_is_deterministic() {
        let source = "c * sin(b) + a / c - if(a < b, a, b)";
        let first = compile(source);
        let second = compile(source);
        assert_eq!(first, second);
        assert_eq!(first.required_variable_names(), second.required_variable_names());
        for values in &[[1.0, 2.0, 3.0], [-4.0, 0.5, 1e3]] {
            assert_eq!(first.evaluate(values), second.evaluate(values));
        }
    }

    #[test]
    fn unknown_function() {
        assert_eq!(
            CompiledExpression::parse("foo(x)", &HashMap::new()),
            Err(ParseError::UnknownFunction {
                name: "foo".into(),
                offset: 0
            })
        );
    }

    #[test]
    fn depth_is_checked_when_parsing() {
        let deep = format!("{}x{}", "(".repeat(MAX_DEPTH + 10), ")".repeat(MAX_DEPTH + 10));
        assert!(matches!(
            CompiledExpression::parse(&deep, &HashMap::new()),
            Err(ParseError::DepthExceeded { max: MAX_DEPTH, .. })
        ));

        let deepest_right = vec!["x"; MAX_DEPTH / 2 + 1].join("^(") + &")".repeat(MAX_DEPTH / 2);
        let expr = compile(&deepest_right);
        assert!(expr.program().max_stack() <= crate::program::STACK_CAPACITY);
        assert_eq!(expr.evaluate(&[1.0]), Ok(1.0));
    }

    #[test]
    fn wrong_number_of_values() {
        assert_eq!(
            compile("x + y").evaluate(&[1.0]),
            Err(EvalFault::WrongValueCount {
                expected: 2,
                found: 1
            })
        );
    }

    #[test]
    fn eval_folds_context() {
        let mut context: HashMap<String, f64> = HashMap::new();
        context.insert("a".into(), 1.0);
        context.insert("b".into(), 2.0);

        assert_eq!(eval("(a + b)^2", &context), Ok(9.0));
        assert_eq!(eval("sin(18.0) * 3", &context), Ok(3.0 * libm::sin(18.0)));

        let result = eval("2 * z", &context);
        assert_eq!(
            result,
            Err(Error::Binding(BindingError::UnboundVariable { name: "z".into() }))
        );
        assert_eq!(
            result.unwrap_err().to_string(),
            "BindingError: variable 'z' is not bound"
        );
        assert!(matches!(eval("2 *", &context), Err(Error::Parse(_))));
    }

    #[test]
    fn with_constants() {
        let expr = compile("a*x + b*y + a");
        let mut constants = HashMap::new();
        constants.insert("a".to_string(), 2.0);
        constants.insert("unused".to_string(), 7.0);
        let partial = expr.with_constants(&constants);
        assert_eq!(partial.required_variable_names(), &["x", "b", "y"]);
        assert_eq!(partial.evaluate(&[1.0, 3.0, 4.0]), Ok(16.0));
        assert_eq!(
            expr.evaluate(&[2.0, 1.0, 3.0, 4.0]),
            partial.evaluate(&[1.0, 3.0, 4.0])
        );

        constants.insert("x".to_string(), 1.0);
        constants.insert("b".to_string(), 3.0);
        constants.insert("y".to_string(), 4.0);
        let folded = expr.with_constants(&constants);
        assert!(folded.required_variable_names().is_empty());
        assert_eq!(folded.program().instructions().len(), 1);
        assert_eq!(folded.evaluate(&[]), Ok(16.0));
    }

    #[test]
    fn evaluate_rows() {
        let expr = compile("x - y");
        let mut out = vec![0.0; 4];
        let rows = [1.0, 1.0, 5.0, 2.0, 0.0, 3.0, 10.0, 0.5];
        assert_eq!(expr.evaluate_rows(&rows, &mut out), Ok(()));
        assert_eq!(out, vec![0.0, 3.0, -3.0, 9.5]);

        assert_eq!(
            expr.evaluate_rows(&rows[..7], &mut out),
            Err(EvalFault::WrongValueCount {
                expected: 8,
                found: 7
            })
        );

        let constant = compile("6 * 7");
        let mut out = [0.0; 3];
        assert_eq!(constant.evaluate_rows(&[], &mut out), Ok(()));
        assert_eq!(out, [42.0; 3]);
    }

    #[test]
    fn display() {
        assert_eq!(compile("-x^2 + 3*sin(t)").to_string(), "(((-x) ^ 2.0) + (3.0 * sin(t)))");
        assert_eq!(compile("2 * 3 + y").to_string(), "(6.0 + y)");
        assert_eq!(compile("max(a, b) < 1 && !c").to_string(), "((max(a, b) < 1.0) && (!c))");
    }

    #[test]
    fn display_round_trips() {
        let expr = compile("if(x < -1, y^-2, fmod(x, 3)) - atan2(y, x)");
        let again = compile(&expr.to_string());
        assert_eq!(expr.required_variable_names(), again.required_variable_names());
        for values in &[[-2.0, 4.0], [5.5, -1.0]] {
            assert_eq!(expr.evaluate(values), again.evaluate(values));
        }
    }
}
