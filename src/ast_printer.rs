use crate::ast::{Callee, Expr};

/// Renders a lowered program as a parenthesised S-expression.
pub struct AstPrinter;

impl AstPrinter {
    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Constant(n) => n.to_string(),

            Expr::IntType => "int".to_string(),

            Expr::Variable(name) => name.clone(),

            Expr::Binary { op, left, right } => {
                format!("({} {} {})", op, self.print(left), self.print(right))
            }

            Expr::Sequence { first, second } => format!(
                "(; {} {})",
                self.print_opt(first.as_deref()),
                self.print_opt(second.as_deref())
            ),

            Expr::Declaration { ty, targets } => {
                format!("(declare {} {})", self.print(ty), self.print_all(targets))
            }

            Expr::Assign { name, value } => format!("(= {} {})", name, self.print(value)),

            Expr::FunctionDef(def) => {
                let params: Vec<String> = def.params.iter().map(ToString::to_string).collect();

                format!(
                    "(define {} {} ({}) {})",
                    def.return_type,
                    def.name,
                    params.join(" "),
                    self.print_opt(def.body.as_ref())
                )
            }

            Expr::If {
                predicate,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(predicate),
                    self.print(then_branch),
                    self.print(else_branch)
                ),
                None => format!("(if {} {})", self.print(predicate), self.print(then_branch)),
            },

            Expr::Return(expr) => format!("(return {})", self.print(expr)),

            Expr::Apply { callee, args } => {
                let callee = match callee {
                    Callee::Print => "print".to_string(),
                    Callee::Named(name) => name.clone(),
                    Callee::Expr(expr) => self.print(expr),
                };

                if args.is_empty() {
                    format!("(apply {})", callee)
                } else {
                    format!("(apply {} {})", callee, self.print_all(args))
                }
            }
        }
    }

    fn print_opt(&self, expr: Option<&Expr>) -> String {
        expr.map_or_else(|| "nil".to_string(), |e| self.print(e))
    }

    fn print_all(&self, exprs: &[Expr]) -> String {
        let parts: Vec<String> = exprs.iter().map(|e| self.print(e)).collect();
        parts.join(" ")
    }
}
