use crate::ast::{Ast, BinaryOp, UnaryOp, MAX_DEPTH, MAX_NODES};
use crate::error::ParseError;
use crate::lexer::Lexer;
use crate::registry::{self, Function};
use crate::symbols::{Resolved, SymbolTable};
use crate::token::{Op, Token, TokenKind};
use std::convert::TryFrom;

/// Parse `source` into a syntax tree, resolving names through `symbols`.
///
/// The tree is returned as written, without constant propagation apart from
/// negated literals.
pub fn parse(source: &str, symbols: &mut SymbolTable) -> Result<Ast, ParseError> {
    Parser::new(source, symbols)?.parse()
}

/// A subtree together with its depth
struct Node {
    ast: Ast,
    depth: usize,
}

/// Precedence climbing parser over a [`Lexer`]
struct Parser<'a, 's> {
    lexer: Lexer<'a>,
    end: usize,
    current: Token,
    symbols: &'s mut SymbolTable,
    nesting: usize,
    nodes: usize,
}

impl<'a, 's> Parser<'a, 's> {
    fn new(source: &'a str, symbols: &'s mut SymbolTable) -> Result<Self, ParseError> {
        let end = source.len();
        let mut parser = Parser {
            lexer: Lexer::new(source),
            end,
            current: Token {
                kind: TokenKind::End,
                offset: end,
            },
            symbols,
            nesting: 0,
            nodes: 0,
        };
        parser.advance()?;
        Ok(parser)
    }

    fn parse(mut self) -> Result<Ast, ParseError> {
        let node = self.binary(0)?;
        match self.current.kind {
            TokenKind::End => Ok(node.ast),
            TokenKind::RParen => Err(ParseError::UnmatchedParenthesis {
                offset: self.current.offset,
            }),
            _ => Err(self.unexpected()),
        }
    }

    fn advance(&mut self) -> Result<(), ParseError> {
        self.current = match self.lexer.next() {
            Some(token) => token?,
            None => Token {
                kind: TokenKind::End,
                offset: self.end,
            },
        };
        Ok(())
    }

    fn unexpected(&self) -> ParseError {
        match self.current.kind {
            TokenKind::End => ParseError::UnexpectedEnd,
            ref kind => ParseError::UnexpectedToken {
                found: kind.describe(),
                offset: self.current.offset,
            },
        }
    }

    /// Run `f` one nesting level deeper
    fn nested<T>(
        &mut self,
        offset: usize,
        f: impl FnOnce(&mut Self) -> Result<T, ParseError>,
    ) -> Result<T, ParseError> {
        if self.nesting >= MAX_DEPTH {
            return Err(ParseError::DepthExceeded {
                max: MAX_DEPTH,
                offset,
            });
        }
        self.nesting += 1;
        let result = f(self);
        self.nesting -= 1;
        result
    }

    /// Account for a new node of the tree
    fn make(&mut self, offset: usize, ast: Ast, depth: usize) -> Result<Node, ParseError> {
        if depth > MAX_DEPTH {
            return Err(ParseError::DepthExceeded {
                max: MAX_DEPTH,
                offset,
            });
        }
        self.nodes += 1;
        if self.nodes > MAX_NODES {
            return Err(ParseError::TooManyNodes { max: MAX_NODES });
        }
        Ok(Node { ast, depth })
    }

    /// Parse binary operators binding at least as tightly as `min_precedence`
    fn binary(&mut self, min_precedence: u8) -> Result<Node, ParseError> {
        let mut lhs = self.unary()?;
        loop {
            let op = match self.current.kind {
                TokenKind::Operator(op) => op,
                _ => break,
            };
            let (precedence, binary) = match (op.precedence(), binary_op(op)) {
                (Some(precedence), Some(binary)) if precedence >= min_precedence => {
                    (precedence, binary)
                }
                _ => break,
            };
            let offset = self.current.offset;
            self.advance()?;

            let next = if op.is_left_associative() {
                precedence + 1
            } else {
                precedence
            };
            let rhs = self.nested(offset, |p| p.binary(next))?;
            let depth = 1 + lhs.depth.max(rhs.depth);
            lhs = self.make(
                offset,
                Ast::Binary(binary, Box::new(lhs.ast), Box::new(rhs.ast)),
                depth,
            )?;
        }
        Ok(lhs)
    }

    /// Parse prefix operators, which bind tighter than anything else
    fn unary(&mut self) -> Result<Node, ParseError> {
        let offset = self.current.offset;
        match self.current.kind {
            TokenKind::Operator(Op::Plus) => {
                self.advance()?;
                self.nested(offset, Self::unary)
            }
            TokenKind::Operator(Op::Minus) => {
                self.advance()?;
                let operand = self.nested(offset, Self::unary)?;
                if let Ast::Literal(value) = operand.ast {
                    return Ok(Node {
                        ast: Ast::Literal(-value),
                        depth: operand.depth,
                    });
                }
                let depth = operand.depth + 1;
                self.make(
                    offset,
                    Ast::Unary(UnaryOp::Neg, Box::new(operand.ast)),
                    depth,
                )
            }
            TokenKind::Operator(Op::Not) => {
                self.advance()?;
                let operand = self.nested(offset, Self::unary)?;
                let depth = operand.depth + 1;
                self.make(
                    offset,
                    Ast::Unary(UnaryOp::Not, Box::new(operand.ast)),
                    depth,
                )
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<Node, ParseError> {
        let offset = self.current.offset;
        match self.current.kind {
            TokenKind::Number(value) => {
                self.advance()?;
                self.make(offset, Ast::Literal(value), 1)
            }
            TokenKind::Identifier(ref name) => {
                let name = name.clone();
                self.advance()?;
                if self.current.kind == TokenKind::LParen {
                    return self.call(name, offset);
                }
                if registry::lookup(&name).is_some() {
                    return Err(ParseError::MissingCall { name, offset });
                }
                let ast = match self.symbols.resolve(&name)? {
                    Resolved::Constant(value) => Ast::Literal(value),
                    Resolved::Variable(slot) => Ast::Variable(slot),
                };
                self.make(offset, ast, 1)
            }
            TokenKind::LParen => {
                self.advance()?;
                let inner = self.nested(offset, |p| p.binary(0))?;
                match self.current.kind {
                    TokenKind::RParen => {
                        self.advance()?;
                        Ok(inner)
                    }
                    TokenKind::End => Err(ParseError::UnmatchedParenthesis { offset }),
                    _ => Err(self.unexpected()),
                }
            }
            _ => Err(self.unexpected()),
        }
    }

    /// Parse the argument list of a call to `name`, the current token being
    /// the opening parenthesis
    fn call(&mut self, name: String, offset: usize) -> Result<Node, ParseError> {
        let function = match registry::lookup(&name) {
            Some(function) => function,
            None => return Err(ParseError::UnknownFunction { name, offset }),
        };

        let paren = self.current.offset;
        self.advance()?;
        let mut args = Vec::with_capacity(function.arity());
        if self.current.kind == TokenKind::RParen {
            self.advance()?;
        } else {
            loop {
                args.push(self.nested(paren, |p| p.binary(0))?);
                match self.current.kind {
                    TokenKind::Comma => self.advance()?,
                    TokenKind::RParen => {
                        self.advance()?;
                        break;
                    }
                    TokenKind::End => {
                        return Err(ParseError::UnmatchedParenthesis { offset: paren })
                    }
                    _ => return Err(self.unexpected()),
                }
            }
        }

        let found = args.len();
        let mismatch = |_| ParseError::ArityMismatch {
            name: name.clone(),
            expected: function.arity(),
            found,
            offset,
        };
        let (ast, depth) = match function {
            Function::Unary(op) => {
                let [a] = <[Node; 1]>::try_from(args).map_err(mismatch)?;
                (Ast::Unary(op, Box::new(a.ast)), a.depth)
            }
            Function::Binary(op) => {
                let [a, b] = <[Node; 2]>::try_from(args).map_err(mismatch)?;
                let depth = a.depth.max(b.depth);
                (Ast::Binary(op, Box::new(a.ast), Box::new(b.ast)), depth)
            }
            Function::Conditional => {
                let [p, a, b] = <[Node; 3]>::try_from(args).map_err(mismatch)?;
                let depth = p.depth.max(a.depth).max(b.depth);
                let ast = Ast::Conditional(Box::new(p.ast), Box::new(a.ast), Box::new(b.ast));
                (ast, depth)
            }
        };
        self.make(offset, ast, depth + 1)
    }
}

fn binary_op(op: Op) -> Option<BinaryOp> {
    Some(match op {
        Op::Plus => BinaryOp::Add,
        Op::Minus => BinaryOp::Sub,
        Op::Mul => BinaryOp::Mul,
        Op::Div => BinaryOp::Div,
        Op::Pow => BinaryOp::Pow,
        Op::Less => BinaryOp::Less,
        Op::Greater => BinaryOp::Greater,
        Op::LessEqual => BinaryOp::LessEqual,
        Op::GreaterEqual => BinaryOp::GreaterEqual,
        Op::Equal => BinaryOp::Equal,
        Op::NotEqual => BinaryOp::NotEqual,
        Op::And => BinaryOp::And,
        Op::Or => BinaryOp::Or,
        Op::Not => return None,
    })
}
