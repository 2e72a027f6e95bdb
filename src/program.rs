use crate::ast::{Ast, BinaryOp, UnaryOp, MAX_DEPTH};
use crate::error::EvalFault;

/// Size of the operand stack used by evaluation. A tree of depth `d` never
/// needs more than `2 * d - 1` operands, so every parsed expression fits.
pub const STACK_CAPACITY: usize = 2 * MAX_DEPTH + 2;

/// One step of a [`Program`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Instr {
    /// Push a constant
    Push(f64),
    /// Push the value bound to a variable slot
    Load(usize),
    /// Replace the top of the stack by `op(top)`
    Unary(UnaryOp),
    /// Pop `b` then `a`, push `op(a, b)`
    Binary(BinaryOp),
    /// Pop `else`, `then` and the predicate, push the selected value
    Select,
}

/// A syntax tree flattened into postfix order, run on a fixed-size stack.
///
/// Evaluating a program neither recurses nor allocates. The instructions are
/// immutable, so one program can be run from any number of threads at once.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    code: Box<[Instr]>,
    max_stack: usize,
    arity: usize,
}

impl Program {
    /// Flatten `ast`, which reads variable slots below `arity`
    pub(crate) fn compile(ast: &Ast, arity: usize) -> Self {
        let mut emitter = Emitter {
            code: Vec::with_capacity(ast.node_count()),
            height: 0,
            max_stack: 0,
        };
        emitter.emit(ast);
        debug_assert!(emitter.max_stack <= STACK_CAPACITY);
        Self {
            code: emitter.code.into_boxed_slice(),
            max_stack: emitter.max_stack,
            arity,
        }
    }

    #[cfg(test)]
    pub(crate) fn from_code(code: Vec<Instr>, arity: usize) -> Self {
        Self {
            code: code.into_boxed_slice(),
            max_stack: STACK_CAPACITY,
            arity,
        }
    }

    pub fn instructions(&self) -> &[Instr] {
        &self.code
    }

    /// Highest number of operands on the stack during evaluation
    pub fn max_stack(&self) -> usize {
        self.max_stack
    }

    /// Number of values evaluation expects
    pub fn arity(&self) -> usize {
        self.arity
    }

    /// Run the program with `values` bound to the variable slots.
    ///
    /// Numeric problems propagate as `inf` and `NaN`. An error is only
    /// returned for a wrong number of values, or for a malformed program.
    pub fn evaluate(&self, values: &[f64]) -> Result<f64, EvalFault> {
        if values.len() != self.arity {
            return Err(EvalFault::WrongValueCount {
                expected: self.arity,
                found: values.len(),
            });
        }

        let mut stack = Stack::new();
        for instr in self.code.iter() {
            match *instr {
                Instr::Push(value) => stack.push(value)?,
                Instr::Load(slot) => match values.get(slot) {
                    Some(&value) => stack.push(value)?,
                    None => {
                        return Err(EvalFault::WrongValueCount {
                            expected: slot + 1,
                            found: values.len(),
                        })
                    }
                },
                Instr::Unary(op) => {
                    let a = stack.pop()?;
                    stack.push(op.apply(a))?;
                }
                Instr::Binary(op) => {
                    let b = stack.pop()?;
                    let a = stack.pop()?;
                    stack.push(op.apply(a, b))?;
                }
                Instr::Select => {
                    let otherwise = stack.pop()?;
                    let then = stack.pop()?;
                    let predicate = stack.pop()?;
                    stack.push(if predicate != 0.0 { then } else { otherwise })?;
                }
            }
        }

        let result = stack.pop()?;
        match stack.len {
            0 => Ok(result),
            remaining => Err(EvalFault::UnbalancedStack { remaining }),
        }
    }
}

/// Postfix code generation, tracking the stack height as it goes
struct Emitter {
    code: Vec<Instr>,
    height: usize,
    max_stack: usize,
}

impl Emitter {
    fn emit(&mut self, ast: &Ast) {
        match *ast {
            Ast::Literal(value) => self.push(Instr::Push(value), 1, 0),
            Ast::Variable(slot) => self.push(Instr::Load(slot), 1, 0),
            Ast::Unary(op, ref a) => {
                self.emit(a);
                self.push(Instr::Unary(op), 1, 1);
            }
            Ast::Binary(op, ref a, ref b) => {
                self.emit(a);
                self.emit(b);
                self.push(Instr::Binary(op), 1, 2);
            }
            Ast::Conditional(ref p, ref a, ref b) => {
                self.emit(p);
                self.emit(a);
                self.emit(b);
                self.push(Instr::Select, 1, 3);
            }
        }
    }

    fn push(&mut self, instr: Instr, produced: usize, consumed: usize) {
        self.code.push(instr);
        self.height = self.height + produced - consumed;
        self.max_stack = self.max_stack.max(self.height);
    }
}

/// Operand stack of a single evaluation
struct Stack {
    values: [f64; STACK_CAPACITY],
    len: usize,
}

impl Stack {
    fn new() -> Self {
        Self {
            values: [0.0; STACK_CAPACITY],
            len: 0,
        }
    }

    #[inline]
    fn push(&mut self, value: f64) -> Result<(), EvalFault> {
        match self.values.get_mut(self.len) {
            Some(top) => {
                *top = value;
                self.len += 1;
                Ok(())
            }
            None => Err(EvalFault::StackOverflow {
                capacity: STACK_CAPACITY,
            }),
        }
    }

    #[inline]
    fn pop(&mut self) -> Result<f64, EvalFault> {
        if self.len == 0 {
            return Err(EvalFault::StackUnderflow);
        }
        self.len -= 1;
        Ok(self.values[self.len])
    }
}
