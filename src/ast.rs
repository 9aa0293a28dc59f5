//! Lowered syntax tree evaluated by the interpreter.
//!
//! [`Expr::lower`] walks a [`Node`] tree once and resolves each token into a
//! closed set of variants, so the evaluator matches on `Expr` instead of
//! comparing lexemes at every step. Shape errors (a `D` without a signature,
//! an operator with one operand, ...) surface here.

use std::rc::Rc;

use log::debug;

use crate::error::{InterpError, Result};
use crate::node::{Node, Param};
use crate::token::{BinaryOp, TokenKind};

/// A user function as declared by a `D` node.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDef {
    pub name: String,
    pub return_type: String,
    pub params: Vec<Param>,
    pub body: Option<Expr>,
}

/// What an `apply` node calls.
#[derive(Debug, Clone, PartialEq)]
pub enum Callee {
    /// The `print` builtin.
    Print,

    /// A function looked up by name in the calling frame.
    Named(String),

    /// A nested application whose result is called.
    Expr(Box<Expr>),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Integer literal.
    Constant(i64),

    /// The `int` keyword in type position; evaluates to nothing.
    IntType,

    Variable(String),

    Binary {
        op: BinaryOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },

    /// `;`: `first` is evaluated for effect, `second` gives the value.
    Sequence {
        first: Option<Box<Expr>>,
        second: Option<Box<Expr>>,
    },

    /// `~`: a type followed by one or more declarators.
    Declaration { ty: Box<Expr>, targets: Vec<Expr> },

    Assign { name: String, value: Box<Expr> },

    FunctionDef(Rc<FunctionDef>),

    If {
        predicate: Box<Expr>,
        then_branch: Box<Expr>,
        else_branch: Option<Box<Expr>>,
    },

    Return(Box<Expr>),

    Apply { callee: Callee, args: Vec<Expr> },
}

impl Expr {
    /// Resolve `node` and everything below it.
    pub fn lower(node: &Node) -> Result<Expr> {
        if node.is_leaf() {
            return lower_leaf(node);
        }

        let expr = match node.token.kind() {
            TokenKind::Operator(op) => Expr::Binary {
                op,
                left: Box::new(Expr::lower(required(node, node.left(), "missing left operand")?)?),
                right: Box::new(Expr::lower(required(node, node.right(), "missing right operand")?)?),
            },

            TokenKind::Sequence => Expr::Sequence {
                first: lower_opt(node.left())?,
                second: lower_opt(node.right())?,
            },

            TokenKind::Declaration => {
                let ty = required(node, node.left(), "missing declared type")?;
                let target = required(node, node.right(), "missing declarator")?;
                let targets = if target.token.is(TokenKind::Comma) {
                    target.func_args().map(Expr::lower).collect::<Result<Vec<_>>>()?
                } else {
                    vec![Expr::lower(target)?]
                };

                Expr::Declaration {
                    ty: Box::new(Expr::lower(ty)?),
                    targets,
                }
            }

            TokenKind::Assign => {
                let target = required(node, node.left(), "missing assignment target")?;
                if !target.is_leaf() {
                    return Err(InterpError::malformed(
                        &node.token,
                        format!("cannot assign to '{}'", target),
                    ));
                }

                Expr::Assign {
                    name: target.lexeme().to_string(),
                    value: Box::new(Expr::lower(required(node, node.right(), "missing assigned value")?)?),
                }
            }

            TokenKind::FunctionDef => Expr::FunctionDef(Rc::new(lower_function(node)?)),

            TokenKind::If => {
                let predicate = required(node, node.left(), "missing predicate")?;
                let body = required(node, node.right(), "missing body")?;

                let (then_branch, else_branch) = if body.token.is(TokenKind::Else) {
                    let then_branch = required(body, body.left(), "missing if-branch")?;
                    let else_branch = required(body, body.right(), "missing else-branch")?;
                    (Expr::lower(then_branch)?, Some(Box::new(Expr::lower(else_branch)?)))
                } else {
                    (Expr::lower(body)?, None)
                };

                Expr::If {
                    predicate: Box::new(Expr::lower(predicate)?),
                    then_branch: Box::new(then_branch),
                    else_branch,
                }
            }

            TokenKind::Return => Expr::Return(Box::new(Expr::lower(required(
                node,
                node.left(),
                "missing return value",
            )?)?)),

            TokenKind::Apply => {
                let target = required(node, node.left(), "missing callee")?;
                let callee = match target.token.kind() {
                    TokenKind::Print => Callee::Print,
                    TokenKind::Apply => Callee::Expr(Box::new(Expr::lower(target)?)),
                    _ if target.is_leaf() => Callee::Named(target.lexeme().to_string()),
                    _ => {
                        return Err(InterpError::malformed(
                            &node.token,
                            format!("cannot call '{}'", target),
                        ))
                    }
                };

                let args = match node.right() {
                    Some(list) => list.func_args().map(Expr::lower).collect::<Result<Vec<_>>>()?,
                    None => Vec::new(),
                };

                Expr::Apply { callee, args }
            }

            _ => return Err(InterpError::UnrecognizedToken(node.lexeme().to_string())),
        };

        Ok(expr)
    }
}

fn lower_leaf(node: &Node) -> Result<Expr> {
    let token = &node.token;

    let expr = if token.is(TokenKind::IntType) {
        Expr::IntType
    } else if token.is_constant() {
        let value = token
            .value()
            .ok_or_else(|| InterpError::malformed(token, "integer constant out of range"))?;
        Expr::Constant(value)
    } else {
        Expr::Variable(token.lexeme().to_string())
    };

    Ok(expr)
}

fn lower_opt(node: Option<&Node>) -> Result<Option<Box<Expr>>> {
    node.map(|n| Expr::lower(n).map(Box::new)).transpose()
}

fn lower_function(node: &Node) -> Result<FunctionDef> {
    let name = node
        .function_name()
        .ok_or_else(|| InterpError::malformed(&node.token, "missing function name"))?;
    let return_type = node
        .return_type()
        .ok_or_else(|| InterpError::malformed(&node.token, "missing return type"))?;

    let def = FunctionDef {
        name: name.lexeme().to_string(),
        return_type: return_type.lexeme().to_string(),
        params: node.func_params(),
        body: node.right().map(Expr::lower).transpose()?,
    };

    debug!(
        "Lowered function '{}' -> {} with {} parameter(s)",
        def.name,
        def.return_type,
        def.params.len()
    );

    Ok(def)
}

fn required<'n>(parent: &Node, child: Option<&'n Node>, reason: &str) -> Result<&'n Node> {
    child.ok_or_else(|| InterpError::malformed(&parent.token, reason))
}
