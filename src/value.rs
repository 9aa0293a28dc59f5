use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDef;
use crate::environment::FrameId;

/// A function together with the frame it was defined in.
#[derive(Debug, Clone, PartialEq)]
pub struct Closure {
    pub def: Rc<FunctionDef>,
    pub env: FrameId,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),

    Function(Closure),

    /// Result of constructs that compute nothing (declarations, assignments, `print`).
    Void,
}

impl Value {
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Function(_) => true,
            Value::Void => false,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Int(_) => "int",
            Value::Function(_) => "function",
            Value::Void => "void",
        }
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => {
                let mut buf = itoa::Buffer::new();
                f.write_str(buf.format(*n))
            }

            Value::Function(closure) => write!(f, "<fn {}>", closure.def.name),

            Value::Void => write!(f, "void"),
        }
    }
}
