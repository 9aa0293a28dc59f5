use std::io::{self, Write};
use std::panic;
use std::rc::Rc;
use std::thread;

use log::{debug, info};

use crate::ast::{Callee, Expr, FunctionDef};
use crate::environment::{Environment, FrameId};
use crate::error::{InterpError, Result};
use crate::node::{Node, Param};
use crate::token::{BinaryOp, ENTRY_POINT, INT_TYPE};
use crate::value::{Closure, Value};

/// Outcome of evaluating one node.
///
/// `Return` is the in-flight return signal: every rule that sequences
/// evaluations hands it straight back to its caller without visiting the
/// remaining nodes, until a function call turns it into a plain value.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow {
    Normal(Value),
    Return(Value),
}

impl Flow {
    pub fn into_value(self) -> Value {
        match self {
            Flow::Normal(value) | Flow::Return(value) => value,
        }
    }
}

/// Stack size of the thread started by [`run_on_large_stack`]. Every level of
/// recursion in the interpreted program is several levels of
/// [`Interpreter::evaluate`].
pub const EVALUATOR_STACK_SIZE: usize = 64 * 1024 * 1024;

/// Unwrap a `Normal` flow, or return early with a `Return` flow.
macro_rules! value {
    ($flow:expr) => {
        match $flow {
            Flow::Normal(value) => value,
            ret @ Flow::Return(_) => return Ok(ret),
        }
    };
}

/// Recursive tree-walking evaluator.
///
/// `W` receives the output of `print`; it is stdout for [`Interpreter::new`]
/// and any writer for [`Interpreter::with_output`].
pub struct Interpreter<W: Write = io::Stdout> {
    environment: Environment,
    out: W,
}

impl Interpreter<io::Stdout> {
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl Default for Interpreter<io::Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<W: Write> Interpreter<W> {
    pub fn with_output(out: W) -> Self {
        info!("Initializing Interpreter");

        Self {
            environment: Environment::new(),
            out,
        }
    }

    /// Environment left behind by the last run.
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs `program` in a fresh top-level frame and returns the value of the
    /// `return` that ended it, or `Void` if none did.
    pub fn interpret(&mut self, program: &Expr) -> Result<Value> {
        info!("Interpreting program");

        self.environment = Environment::new();
        let global = self.environment.global();

        let result = match self.evaluate(program, global)? {
            Flow::Return(value) => value,
            Flow::Normal(_) => Value::Void,
        };

        self.out.flush()?;

        debug!("Final environment:\n{}", self.environment);

        info!(
            "Interpretation completed with {} ({} frame(s) alive)",
            result,
            self.environment.frame_count()
        );

        Ok(result)
    }

    /// Lowers and runs a built tree.
    pub fn interpret_tree(&mut self, root: &Node) -> Result<Value> {
        let program = Expr::lower(root)?;
        self.interpret(&program)
    }

    /// Evaluates `expr` in `frame`.
    pub fn evaluate(&mut self, expr: &Expr, frame: FrameId) -> Result<Flow> {
        let flow = match expr {
            Expr::Constant(n) => Flow::Normal(Value::Int(*n)),

            Expr::IntType => Flow::Normal(Value::Void),

            Expr::Variable(name) => Flow::Normal(self.lookup(name, frame)?),

            Expr::Binary { op, left, right } => self.evaluate_binary(*op, left, right, frame)?,

            Expr::Sequence { first, second } => {
                self.evaluate_sequence(first.as_deref(), second.as_deref(), frame)?
            }

            Expr::Declaration { ty, targets } => self.evaluate_declaration(ty, targets, frame)?,

            Expr::Assign { name, value } => {
                let value = value!(self.evaluate(value, frame)?);
                self.environment.set(frame, name, value);
                Flow::Normal(Value::Void)
            }

            Expr::FunctionDef(def) => self.evaluate_definition(def, frame)?,

            Expr::If {
                predicate,
                then_branch,
                else_branch,
            } => self.evaluate_if(predicate, then_branch, else_branch.as_deref(), frame)?,

            Expr::Return(expr) => {
                let value = value!(self.evaluate(expr, frame)?);
                debug!("Returning value: {}", value);
                Flow::Return(value)
            }

            Expr::Apply { callee, args } => self.evaluate_apply(callee, args, frame)?,
        };

        Ok(flow)
    }

    // ───────────────────────────── rules ─────────────────────────────

    fn lookup(&self, name: &str, frame: FrameId) -> Result<Value> {
        match self.environment.get(frame, name) {
            Some(Value::Void) | None => {
                debug!("Variable '{}' is undefined in frame {}", name, frame);
                Err(InterpError::UndefinedVariable(name.to_string()))
            }
            Some(value) => Ok(value.clone()),
        }
    }

    #[inline(never)]
    fn evaluate_binary(
        &mut self,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        frame: FrameId,
    ) -> Result<Flow> {
        let lhs = value!(self.evaluate(left, frame)?);
        let rhs = value!(self.evaluate(right, frame)?);
        Ok(Flow::Normal(Value::Int(binary(op, &lhs, &rhs)?)))
    }

    #[inline(never)]
    fn evaluate_sequence(
        &mut self,
        first: Option<&Expr>,
        second: Option<&Expr>,
        frame: FrameId,
    ) -> Result<Flow> {
        if let Some(first) = first {
            value!(self.evaluate(first, frame)?);
        }
        match second {
            Some(second) => self.evaluate(second, frame),
            None => Ok(Flow::Normal(Value::Void)),
        }
    }

    #[inline(never)]
    fn evaluate_if(
        &mut self,
        predicate: &Expr,
        then_branch: &Expr,
        else_branch: Option<&Expr>,
        frame: FrameId,
    ) -> Result<Flow> {
        let predicate = value!(self.evaluate(predicate, frame)?);

        let branch = if predicate.is_truthy() {
            debug!("Condition {} is truthy; executing if-branch", predicate);
            then_branch
        } else if let Some(else_branch) = else_branch {
            debug!("Condition {} is falsy; executing else-branch", predicate);
            else_branch
        } else {
            return Ok(Flow::Normal(Value::Void));
        };

        let block = self.environment.push_block(frame);
        let flow = self.evaluate(branch, block);
        self.environment.pop_frame(block);

        flow
    }

    #[inline(never)]
    fn evaluate_declaration(&mut self, ty: &Expr, targets: &[Expr], frame: FrameId) -> Result<Flow> {
        if matches!(ty, Expr::IntType) {
            for target in targets {
                if let Expr::Variable(name) = target {
                    self.environment.define(frame, name, Value::Int(0));
                }
            }
        }

        value!(self.evaluate(ty, frame)?);

        let mut last = Value::Void;
        for target in targets {
            last = value!(self.evaluate(target, frame)?);
        }
        Ok(Flow::Normal(last))
    }

    fn evaluate_definition(&mut self, def: &Rc<FunctionDef>, frame: FrameId) -> Result<Flow> {
        debug!("Defining function '{}' in frame {}", def.name, frame);

        let closure = Closure {
            def: Rc::clone(def),
            env: frame,
        };
        self.environment.capture(frame);
        self.environment.define(frame, &def.name, Value::Function(closure));

        if def.name != ENTRY_POINT {
            return Ok(Flow::Normal(Value::Void));
        }

        info!("Entering '{}'", ENTRY_POINT);

        let body_frame = self.environment.push_block(frame);
        let flow = match &def.body {
            Some(body) => self.evaluate(body, body_frame),
            None => Ok(Flow::Normal(Value::Void)),
        };
        self.environment.pop_frame(body_frame);

        match flow? {
            Flow::Return(value) => {
                check_return(def, &value)?;
                Ok(Flow::Return(value))
            }
            Flow::Normal(_) => {
                check_return(def, &Value::Void)?;
                Ok(Flow::Normal(Value::Void))
            }
        }
    }

    #[inline(never)]
    fn evaluate_apply(&mut self, callee: &Callee, args: &[Expr], frame: FrameId) -> Result<Flow> {
        let closure = match callee {
            Callee::Print => return self.print(args, frame),

            Callee::Named(name) => match self.environment.get(frame, name) {
                Some(Value::Function(closure)) => closure.clone(),
                Some(other) => {
                    return Err(InterpError::NotCallable {
                        name: name.clone(),
                        found: other.type_name().to_string(),
                    })
                }
                None => {
                    debug!("Function '{}' is undefined in frame {}", name, frame);
                    return Err(InterpError::UndefinedFunction(name.clone()));
                }
            },

            Callee::Expr(expr) => match value!(self.evaluate(expr, frame)?) {
                Value::Function(closure) => closure,
                other => {
                    return Err(InterpError::NotCallable {
                        name: other.to_string(),
                        found: other.type_name().to_string(),
                    })
                }
            },
        };

        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(value!(self.evaluate(arg, frame)?));
        }

        self.call(&closure, values).map(Flow::Normal)
    }

    #[inline(never)]
    fn call(&mut self, closure: &Closure, args: Vec<Value>) -> Result<Value> {
        let def = &closure.def;
        debug!("Calling function '{}' with {} argument(s)", def.name, args.len());

        if args.len() != def.params.len() {
            return Err(InterpError::arity(&def.name, &def.params, &args));
        }

        for (param, arg) in def.params.iter().zip(&args) {
            check_type(&param.ty, arg)?;
        }

        let bindings = def
            .params
            .iter()
            .map(|param| param.name.clone())
            .zip(args);
        let frame = self.environment.push_frame(closure.env, bindings);

        let flow = match &def.body {
            Some(body) => self.evaluate(body, frame),
            None => Ok(Flow::Normal(Value::Void)),
        };
        self.environment.pop_frame(frame);

        let value = match flow? {
            Flow::Return(value) => value,
            Flow::Normal(_) => Value::Void,
        };

        check_return(def, &value)?;

        info!("Function '{}' returned: {}", def.name, value);

        Ok(value)
    }

    fn print(&mut self, args: &[Expr], frame: FrameId) -> Result<Flow> {
        let mut values = Vec::with_capacity(args.len());
        for arg in args {
            values.push(value!(self.evaluate(arg, frame)?));
        }

        let [value] = values.as_slice() else {
            return Err(InterpError::arity("print", &[Param::new("any", "value")], &values));
        };

        writeln!(self.out, "{}", value)?;

        debug!("Printed value: {}", value);

        Ok(Flow::Normal(Value::Void))
    }
}

/// Builds and runs `root` on a thread with [`EVALUATOR_STACK_SIZE`] bytes of
/// stack, printing to `out`.
///
/// Returns the program's integer result, `None` for any other result, along
/// with the writer.
pub fn run_on_large_stack<W>(root: Node, out: W) -> Result<(Option<i64>, W)>
where
    W: Write + Send + 'static,
{
    let evaluator = thread::Builder::new()
        .name("evaluator".to_string())
        .stack_size(EVALUATOR_STACK_SIZE)
        .spawn(move || -> Result<(Option<i64>, W)> {
            let mut interpreter = Interpreter::with_output(out);
            let result = interpreter.interpret_tree(&root)?;
            Ok((result.as_int(), interpreter.into_output()))
        })?;

    evaluator
        .join()
        .unwrap_or_else(|payload| panic::resume_unwind(payload))
}

/// Process exit status for a program result: the low eight bits of an
/// integer result, as a shell would report them, and 0 otherwise.
///
/// Results 65 and 70 are indistinguishable from the error statuses.
pub fn exit_status(result: Option<i64>) -> i32 {
    result.map_or(0, |n| n.rem_euclid(256) as i32)
}

fn check_type(expected: &str, value: &Value) -> Result<()> {
    if expected == INT_TYPE && value.as_int().is_none() {
        return Err(InterpError::type_mismatch(expected, value));
    }
    Ok(())
}

fn check_return(def: &FunctionDef, value: &Value) -> Result<()> {
    check_type(&def.return_type, value)
}

fn binary(op: BinaryOp, lhs: &Value, rhs: &Value) -> Result<i64> {
    let a = lhs
        .as_int()
        .ok_or_else(|| InterpError::type_mismatch(INT_TYPE, lhs))?;
    let b = rhs
        .as_int()
        .ok_or_else(|| InterpError::type_mismatch(INT_TYPE, rhs))?;

    let result = match op {
        BinaryOp::Add => a.checked_add(b),
        BinaryOp::Sub => a.checked_sub(b),
        BinaryOp::Mul => a.checked_mul(b),
        BinaryOp::Div | BinaryOp::Mod if b == 0 => return Err(InterpError::DivisionByZero(op)),
        BinaryOp::Div => floor_div(a, b),
        BinaryOp::Mod => floor_mod(a, b),
        BinaryOp::Eq => Some(i64::from(a == b)),
        BinaryOp::NotEq => Some(i64::from(a != b)),
        BinaryOp::Greater => Some(i64::from(a > b)),
        BinaryOp::Less => Some(i64::from(a < b)),
        BinaryOp::GreaterEq => Some(i64::from(a >= b)),
        BinaryOp::LessEq => Some(i64::from(a <= b)),
    };

    debug!("{} {} {} = {:?}", a, op, b, result);

    result.ok_or(InterpError::Overflow(op))
}

/// Quotient rounded toward negative infinity.
fn floor_div(a: i64, b: i64) -> Option<i64> {
    let q = a.checked_div(b)?;
    if a % b != 0 && ((a < 0) != (b < 0)) {
        q.checked_sub(1)
    } else {
        Some(q)
    }
}

/// Remainder with the sign of the divisor.
fn floor_mod(a: i64, b: i64) -> Option<i64> {
    let r = a.checked_rem(b)?;
    if r != 0 && ((r < 0) != (b < 0)) {
        Some(r + b)
    } else {
        Some(r)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_rounds_toward_negative_infinity() {
        assert_eq!(floor_div(7, 2), Some(3));
        assert_eq!(floor_div(-7, 2), Some(-4));
        assert_eq!(floor_div(7, -2), Some(-4));
        assert_eq!(floor_div(-8, 2), Some(-4));
        assert_eq!(floor_div(i64::MIN, -1), None);
    }

    #[test]
    fn modulo_takes_sign_of_divisor() {
        assert_eq!(floor_mod(7, 3), Some(1));
        assert_eq!(floor_mod(-7, 3), Some(2));
        assert_eq!(floor_mod(7, -3), Some(-2));
        assert_eq!(floor_mod(-9, 3), Some(0));
    }

    #[test]
    fn comparisons_yield_zero_or_one() {
        let (a, b) = (Value::Int(2), Value::Int(3));

        assert_eq!(binary(BinaryOp::Less, &a, &b).unwrap(), 1);
        assert_eq!(binary(BinaryOp::GreaterEq, &a, &b).unwrap(), 0);
        assert_eq!(binary(BinaryOp::NotEq, &a, &a).unwrap(), 0);
    }

    #[test]
    fn operators_reject_void_operands() {
        let err = binary(BinaryOp::Add, &Value::Int(1), &Value::Void).unwrap_err();
        assert!(matches!(err, InterpError::TypeMismatch { .. }));
    }

    #[test]
    fn exit_status_keeps_low_byte() {
        assert_eq!(exit_status(Some(7)), 7);
        assert_eq!(exit_status(Some(256 + 3)), 3);
        assert_eq!(exit_status(Some(-1)), 255);
        assert_eq!(exit_status(None), 0);
    }

    #[test]
    fn division_by_zero_is_reported() {
        let err = binary(BinaryOp::Mod, &Value::Int(1), &Value::Int(0)).unwrap_err();
        assert!(matches!(err, InterpError::DivisionByZero(BinaryOp::Mod)));
    }
}
