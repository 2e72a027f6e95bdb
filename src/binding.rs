use crate::error::{BindingError, EvalFault};
use crate::expr::CompiledExpression;
use crate::symbols::MAX_VARIABLES;

/// A compiled expression attached to a fixed calling convention of `N`
/// positional arguments, such as `(x, y, z)` or `(x, y, z, t)`.
///
/// Binding is checked once, when the wrapper is built. Calls then take a
/// plain array of values and do not allocate.
///
/// # Examples
///
/// ```
/// # use fieldexpr::{BoundExpr, CompiledExpression};
/// # use std::collections::HashMap;
/// let expr = CompiledExpression::parse("t * (x + z)", &HashMap::new()).unwrap();
/// let field = BoundExpr::new(expr, ["x", "y", "z", "t"]).unwrap();
/// assert_eq!(field.at(1.0, 2.0, 3.0, 0.5), Ok(2.0));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct BoundExpr<const N: usize> {
    expr: CompiledExpression,
    /// Argument index feeding each variable slot
    arguments: Box<[usize]>,
}

/// Expression of the spatial coordinates `(x, y, z)`
pub type SpatialExpr = BoundExpr<3>;

/// Expression of the spatial coordinates and time `(x, y, z, t)`
pub type SpaceTimeExpr = BoundExpr<4>;

impl<const N: usize> BoundExpr<N> {
    /// Bind the variables of `expr` to the arguments in order. The
    /// expression must require exactly `N` variables.
    pub fn positional(expr: CompiledExpression) -> Result<Self, BindingError> {
        let found = expr.required_variable_names().len();
        if found != N {
            return Err(BindingError::Arity {
                expected: N,
                found,
            });
        }
        Ok(Self {
            expr,
            arguments: (0..N).collect(),
        })
    }

    /// Bind each variable of `expr` to the argument of the same name.
    ///
    /// Every variable must be named in `names`, but `names` may hold names the
    /// expression does not use, so `x * t` can be bound to `(x, y, z, t)`.
    pub fn new(expr: CompiledExpression, names: [&str; N]) -> Result<Self, BindingError> {
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(BindingError::DuplicateName {
                    name: (*name).to_string(),
                });
            }
        }

        let arguments = expr
            .required_variable_names()
            .iter()
            .map(|variable| {
                names
                    .iter()
                    .position(|name| name == variable)
                    .ok_or_else(|| BindingError::UnboundVariable {
                        name: variable.clone(),
                    })
            })
            .collect::<Result<Box<[usize]>, _>>()?;
        Ok(Self { expr, arguments })
    }

    /// Evaluate the expression for one set of arguments
    #[inline]
    pub fn call(&self, args: [f64; N]) -> Result<f64, EvalFault> {
        let mut values = [0.0; MAX_VARIABLES];
        for (value, &argument) in values.iter_mut().zip(self.arguments.iter()) {
            *value = args[argument];
        }
        self.expr.evaluate(&values[..self.arguments.len()])
    }

    pub fn expression(&self) -> &CompiledExpression {
        &self.expr
    }

    pub fn into_expression(self) -> CompiledExpression {
        self.expr
    }
}

impl BoundExpr<3> {
    /// Evaluate at the point `(x, y, z)`
    #[inline]
    pub fn at(&self, x: f64, y: f64, z: f64) -> Result<f64, EvalFault> {
        self.call([x, y, z])
    }
}

impl BoundExpr<4> {
    /// Evaluate at the point `(x, y, z)` and time `t`
    #[inline]
    pub fn at(&self, x: f64, y: f64, z: f64, t: f64) -> Result<f64, EvalFault> {
        self.call([x, y, z, t])
    }
}

impl CompiledExpression {
    /// Bind this expression to the argument names `names`, see
    /// [`BoundExpr::new`]
    pub fn bind<const N: usize>(self, names: [&str; N]) -> Result<BoundExpr<N>, BindingError> {
        BoundExpr::new(self, names)
    }
}
