//! Binary AST node as reconstructed from the front-end's indentation text.
//!
//! A [`Node`] knows nothing about evaluation; it only answers structural
//! questions. Function definitions (`D`) are laid out by the front-end as
//!
//! ```text
//! D
//!   d
//!     <return type>
//!     F
//!       <name>
//!       <parameter list>
//!   <body>
//! ```
//!
//! and calls (`apply`) carry the callee on the left and a right-associated
//! `,` chain of arguments on the right.

use serde::Serialize;
use std::fmt;

use crate::token::{Token, TokenKind};

/// A declared function parameter, e.g. `int n`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Param {
    pub ty: String,
    pub name: String,
}

impl Param {
    pub fn new<T: Into<String>, N: Into<String>>(ty: T, name: N) -> Self {
        Self {
            ty: ty.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({} {})", self.ty, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Node {
    pub token: Token,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub left: Option<Box<Node>>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub right: Option<Box<Node>>,
}

impl Node {
    pub fn new(token: Token, left: Option<Node>, right: Option<Node>) -> Self {
        Self {
            token,
            left: left.map(Box::new),
            right: right.map(Box::new),
        }
    }

    pub fn leaf<T: Into<Token>>(token: T) -> Self {
        Self::new(token.into(), None, None)
    }

    pub fn left(&self) -> Option<&Node> {
        self.left.as_deref()
    }

    pub fn right(&self) -> Option<&Node> {
        self.right.as_deref()
    }

    pub fn lexeme(&self) -> &str {
        self.token.lexeme()
    }

    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    pub fn has_branches(&self) -> bool {
        self.left.is_some() && self.right.is_some()
    }

    pub fn is_function_definition(&self) -> bool {
        self.token.is(TokenKind::FunctionDef)
    }

    /// Declared return type of a function definition.
    pub fn return_type(&self) -> Option<&Token> {
        if !self.is_function_definition() {
            return None;
        }
        self.left()?.left().map(|n| &n.token)
    }

    /// Declared name of a function definition.
    pub fn function_name(&self) -> Option<&Token> {
        if !self.is_function_definition() {
            return None;
        }
        self.signature()?.left().map(|n| &n.token)
    }

    /// Parameters of a function definition, taken pairwise from the leaves of
    /// the parameter subtree. A dangling type without a name is dropped.
    pub fn func_params(&self) -> Vec<Param> {
        let Some(list) = self.signature().and_then(Node::right) else {
            return Vec::new();
        };

        let leaves: Vec<&str> = list
            .iter()
            .filter(|n| n.is_leaf())
            .map(Node::lexeme)
            .collect();

        leaves
            .chunks_exact(2)
            .map(|pair| Param::new(pair[0], pair[1]))
            .collect()
    }

    /// Argument expressions of a call's argument subtree, left to right.
    pub fn func_args(&self) -> FuncArgs<'_> {
        FuncArgs { stack: vec![self] }
    }

    /// Pre-order traversal starting at this node.
    pub fn iter(&self) -> Preorder<'_> {
        Preorder { stack: vec![self] }
    }

    fn signature(&self) -> Option<&Node> {
        if !self.is_function_definition() {
            return None;
        }
        self.left()?.right()
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token)
    }
}

/// Lazy flattening of a right-associated `,` chain.
pub struct FuncArgs<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for FuncArgs<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(node) = self.stack.pop() {
            if !node.token.is(TokenKind::Comma) {
                return Some(node);
            }
            // right is pushed first so that left is yielded first
            if let Some(right) = node.right() {
                self.stack.push(right);
            }
            if let Some(left) = node.left() {
                self.stack.push(left);
            }
        }
        None
    }
}

pub struct Preorder<'a> {
    stack: Vec<&'a Node>,
}

impl<'a> Iterator for Preorder<'a> {
    type Item = &'a Node;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        if let Some(right) = node.right() {
            self.stack.push(right);
        }
        if let Some(left) = node.left() {
            self.stack.push(left);
        }
        Some(node)
    }
}
