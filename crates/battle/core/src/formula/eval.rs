use super::FormulaError;
use super::ast::{BinaryOp, Expr, Operand, UnaryOp};

/// Bindings visible to a formula.
pub trait FormulaScope {
    /// `a.<name>` / `b.<name>`; `None` if the name is not exposed.
    fn property(&self, operand: Operand, name: &str) -> Option<f64>;

    /// `a.<name>(args)`; `None` if the method is not exposed.
    fn method(&self, operand: Operand, name: &str, args: &[f64]) -> Option<f64>;

    /// `v[id]`.
    fn variable(&self, id: u32) -> f64;

    /// `Math.random()`, drawn from the battle stream.
    fn random(&self) -> f64;
}

fn truthy(value: f64) -> bool {
    value != 0.0 && !value.is_nan()
}

fn flag(value: bool) -> f64 {
    if value { 1.0 } else { 0.0 }
}

pub(super) fn eval(expr: &Expr, scope: &dyn FormulaScope) -> Result<f64, FormulaError> {
    match expr {
        Expr::Number(value) => Ok(*value),
        Expr::Property { operand, name } => scope
            .property(*operand, name)
            .ok_or_else(|| FormulaError::UnknownMember(name.clone())),
        Expr::Method {
            operand,
            name,
            args,
        } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            scope
                .method(*operand, name, &values)
                .ok_or_else(|| FormulaError::UnknownMember(name.clone()))
        }
        Expr::Math { name, args } => {
            let values = args
                .iter()
                .map(|arg| eval(arg, scope))
                .collect::<Result<Vec<_>, _>>()?;
            math(name, &values, scope)
        }
        Expr::Variable(index) => {
            let id = eval(index, scope)?;
            if id.is_finite() && id >= 0.0 {
                Ok(scope.variable(id as u32))
            } else {
                Ok(0.0)
            }
        }
        Expr::Unary(op, inner) => {
            let value = eval(inner, scope)?;
            Ok(match op {
                UnaryOp::Neg => -value,
                UnaryOp::Plus => value,
                UnaryOp::Not => flag(!truthy(value)),
            })
        }
        Expr::Binary(BinaryOp::And, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            if truthy(left) { eval(rhs, scope) } else { Ok(left) }
        }
        Expr::Binary(BinaryOp::Or, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            if truthy(left) { Ok(left) } else { eval(rhs, scope) }
        }
        Expr::Binary(op, lhs, rhs) => {
            let left = eval(lhs, scope)?;
            let right = eval(rhs, scope)?;
            Ok(match op {
                BinaryOp::Add => left + right,
                BinaryOp::Sub => left - right,
                BinaryOp::Mul => left * right,
                BinaryOp::Div => left / right,
                BinaryOp::Rem => left % right,
                BinaryOp::Lt => flag(left < right),
                BinaryOp::Le => flag(left <= right),
                BinaryOp::Gt => flag(left > right),
                BinaryOp::Ge => flag(left >= right),
                BinaryOp::Eq => flag(left == right),
                BinaryOp::Ne => flag(left != right),
                BinaryOp::And | BinaryOp::Or => unreachable!("short-circuit handled above"),
            })
        }
        Expr::Conditional(cond, then, otherwise) => {
            if truthy(eval(cond, scope)?) {
                eval(then, scope)
            } else {
                eval(otherwise, scope)
            }
        }
        Expr::Sequence(items) => {
            let mut last = 0.0;
            for item in items {
                last = eval(item, scope)?;
            }
            Ok(last)
        }
    }
}

fn math(name: &str, args: &[f64], scope: &dyn FormulaScope) -> Result<f64, FormulaError> {
    let arg = |i: usize| args.get(i).copied().unwrap_or(f64::NAN);
    let value = match name {
        "floor" => arg(0).floor(),
        "ceil" => arg(0).ceil(),
        // Halves round toward +infinity.
        "round" => (arg(0) + 0.5).floor(),
        "abs" => arg(0).abs(),
        "sqrt" => arg(0).sqrt(),
        "pow" => arg(0).powf(arg(1)),
        "trunc" => arg(0).trunc(),
        "sign" => {
            let x = arg(0);
            if x == 0.0 || x.is_nan() { x } else { x.signum() }
        }
        "max" => args.iter().copied().fold(f64::NEG_INFINITY, f64::max),
        "min" => args.iter().copied().fold(f64::INFINITY, f64::min),
        "random" => scope.random(),
        _ => return Err(FormulaError::UnknownFunction(name.to_string())),
    };
    Ok(value)
}
