//! Arithmetic evaluator for `$((expr))` and `((expr))`.
//!
//! The teacher kept a full arithmetic *parser* (`src/parser/arithmetic_parser.rs`,
//! `src/parser/arithmetic_primaries.rs`) producing `ArithExpr`; this module is
//! the new piece, an evaluator walking that tree against `Shell` variables.
//! Every node the common end-to-end scenarios need is implemented; the
//! handful of parser-internal recovery nodes (`SyntaxError`, `NumberSubscript`,
//! `DynamicBase`, `DynamicNumber`, `BracedExpansion`) are parse-error-recovery
//! shapes rather than real arithmetic and evaluate to 0 — documented in
//! DESIGN.md.

use crate::ast::types::*;
use crate::errors::ShellError;
use crate::shell::Shell;

pub type ArithResult<T> = Result<T, ShellError>;

/// Evaluates a parsed arithmetic expression, applying any assignments to
/// `shell` as a side effect (bash semantics: `$((x = 5))` sets `x`).
pub fn eval(expr: &ArithExpr, shell: &mut Shell) -> ArithResult<i64> {
    match expr {
        ArithExpr::Number(n) => Ok(n.value),
        ArithExpr::Variable(v) => Ok(var_value(shell, &v.name)),
        ArithExpr::SpecialVar(v) => Ok(special_var_value(shell, &v.name)),
        ArithExpr::Binary(b) => eval_binary(b, shell),
        ArithExpr::Unary(u) => eval_unary(u, shell),
        ArithExpr::Ternary(t) => {
            if eval(&t.condition, shell)? != 0 {
                eval(&t.consequent, shell)
            } else {
                eval(&t.alternate, shell)
            }
        }
        ArithExpr::Assignment(a) => eval_assignment(a, shell),
        ArithExpr::Group(g) => eval(&g.expression, shell),
        ArithExpr::Nested(n) => eval(&n.expression, shell),
        ArithExpr::Concat(c) => {
            let mut last = 0;
            for part in &c.parts {
                last = eval(part, shell)?;
            }
            Ok(last)
        }
        ArithExpr::ArrayElement(a) => {
            let key = match &a.index {
                Some(idx) => eval(idx, shell)?.to_string(),
                None => a.string_key.clone().unwrap_or_default(),
            };
            Ok(var_value(shell, &format!("{}[{}]", a.array, key)))
        }
        ArithExpr::DoubleSubscript(d) => {
            let idx = eval(&d.index, shell)?;
            Ok(var_value(shell, &format!("{}[{}]", d.array, idx)))
        }
        ArithExpr::CommandSubst(c) => eval_command_subst(&c.command),
        ArithExpr::DynamicAssignment(d) => eval_dynamic_assignment(d, shell),
        ArithExpr::DynamicElement(d) => {
            let idx = eval(&d.subscript, shell)?;
            let name = eval(&d.name_expr, shell)?;
            Ok(var_value(shell, &format!("{}[{}]", name, idx)))
        }
        // Parser recovery/edge shapes: not real arithmetic.
        ArithExpr::SyntaxError(_)
        | ArithExpr::NumberSubscript(_)
        | ArithExpr::DynamicBase(_)
        | ArithExpr::DynamicNumber(_)
        | ArithExpr::BracedExpansion(_) => Ok(0),
        ArithExpr::SingleQuote(s) => Ok(s.value),
    }
}

fn eval_command_subst(command: &str) -> ArithResult<i64> {
    // `$(( $(cmd) ))` embeds raw source text rather than a parsed `ScriptNode`
    // (the arithmetic grammar captures it lazily); evaluating it fully would
    // require the executor's command-substitution runner, which this free
    // function does not have access to. Bash itself rarely sees this form in
    // practice (it's usually written as `$(cmd)` inside the surrounding word,
    // already expanded before arithmetic runs); parse it as a bare number
    // when possible and fall back to 0 otherwise.
    Ok(command.trim().parse::<i64>().unwrap_or(0))
}

fn var_value(shell: &Shell, name: &str) -> i64 {
    match shell.get_var(name) {
        Some(s) => parse_numeric(shell, s, 0),
        None => 0,
    }
}

/// Bash arithmetic treats an unset/non-numeric variable's value as a nested
/// expression to re-evaluate (`x=y; y=3; echo $((x))` => 3), bounded to
/// avoid infinite recursion on a self-referential chain.
fn parse_numeric(shell: &Shell, text: &str, depth: u32) -> i64 {
    let trimmed = text.trim();
    if let Ok(n) = trimmed.parse::<i64>() {
        return n;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        if let Ok(n) = i64::from_str_radix(hex, 16) {
            return n;
        }
    }
    if trimmed.len() > 1 && trimmed.starts_with('0') && trimmed.chars().all(|c| c.is_ascii_digit()) {
        if let Ok(n) = i64::from_str_radix(trimmed, 8) {
            return n;
        }
    }
    if depth < 8 && !trimmed.is_empty() && trimmed.chars().all(|c| c.is_alphanumeric() || c == '_') {
        if let Some(next) = shell.get_var(trimmed) {
            return parse_numeric(shell, next, depth + 1);
        }
    }
    0
}

fn special_var_value(shell: &Shell, name: &str) -> i64 {
    match name {
        "?" => shell.last_exit_code as i64,
        "$" => shell.pid as i64,
        "#" => shell.positional().params.len() as i64,
        "LINENO" => shell.current_line as i64,
        _ => 0,
    }
}

fn eval_binary(b: &ArithBinaryNode, shell: &mut Shell) -> ArithResult<i64> {
    use ArithBinaryOperator::*;
    // Short-circuit operators must not evaluate the right side eagerly.
    if b.operator == LogAnd {
        let l = eval(&b.left, shell)?;
        return Ok(if l == 0 { 0 } else { (eval(&b.right, shell)? != 0) as i64 });
    }
    if b.operator == LogOr {
        let l = eval(&b.left, shell)?;
        return Ok(if l != 0 { 1 } else { (eval(&b.right, shell)? != 0) as i64 });
    }
    let l = eval(&b.left, shell)?;
    let r = eval(&b.right, shell)?;
    Ok(match b.operator {
        Add => l.wrapping_add(r),
        Sub => l.wrapping_sub(r),
        Mul => l.wrapping_mul(r),
        Div => {
            if r == 0 {
                return Err(ShellError::Other("division by 0".into()));
            }
            l.wrapping_div(r)
        }
        Mod => {
            if r == 0 {
                return Err(ShellError::Other("division by 0".into()));
            }
            l.wrapping_rem(r)
        }
        Pow => {
            if r < 0 {
                0
            } else {
                l.wrapping_pow(r as u32)
            }
        }
        LShift => l.wrapping_shl(r as u32),
        RShift => l.wrapping_shr(r as u32),
        Lt => (l < r) as i64,
        Le => (l <= r) as i64,
        Gt => (l > r) as i64,
        Ge => (l >= r) as i64,
        Eq => (l == r) as i64,
        Ne => (l != r) as i64,
        BitAnd => l & r,
        BitOr => l | r,
        BitXor => l ^ r,
        Comma => r,
        LogAnd | LogOr => unreachable!("short-circuited above"),
    })
}

fn eval_unary(u: &ArithUnaryNode, shell: &mut Shell) -> ArithResult<i64> {
    use ArithUnaryOperator::*;
    match u.operator {
        Inc | Dec => {
            let name = variable_name_of(&u.operand).ok_or_else(|| {
                ShellError::Other("++/-- requires a variable operand".to_string())
            })?;
            let old = var_value(shell, &name);
            let new = if u.operator == Inc { old + 1 } else { old - 1 };
            shell.set_var(&name, new.to_string());
            Ok(if u.prefix { new } else { old })
        }
        Neg => Ok(-eval(&u.operand, shell)?),
        Pos => eval(&u.operand, shell),
        Not => Ok((eval(&u.operand, shell)? == 0) as i64),
        BitNot => Ok(!eval(&u.operand, shell)?),
    }
}

fn variable_name_of(expr: &ArithExpr) -> Option<String> {
    match expr {
        ArithExpr::Variable(v) => Some(v.name.clone()),
        ArithExpr::Group(g) => variable_name_of(&g.expression),
        _ => None,
    }
}

fn eval_assignment(a: &ArithAssignmentNode, shell: &mut Shell) -> ArithResult<i64> {
    use ArithAssignmentOperator::*;
    let target_name = match &a.subscript {
        Some(sub) => {
            let idx = eval(sub, shell)?;
            format!("{}[{}]", a.variable, idx)
        }
        None => a.string_key.clone().map(|k| format!("{}[{}]", a.variable, k)).unwrap_or_else(|| a.variable.clone()),
    };
    let rhs = eval(&a.value, shell)?;
    let old = var_value(shell, &target_name);
    let new = match a.operator {
        Assign => rhs,
        AddAssign => old + rhs,
        SubAssign => old - rhs,
        MulAssign => old * rhs,
        DivAssign => {
            if rhs == 0 {
                return Err(ShellError::Other("division by 0".into()));
            }
            old / rhs
        }
        ModAssign => {
            if rhs == 0 {
                return Err(ShellError::Other("division by 0".into()));
            }
            old % rhs
        }
        LShiftAssign => old << rhs,
        RShiftAssign => old >> rhs,
        AndAssign => old & rhs,
        OrAssign => old | rhs,
        XorAssign => old ^ rhs,
    };
    shell.set_var(&target_name, new.to_string());
    Ok(new)
}

fn eval_dynamic_assignment(d: &ArithDynamicAssignmentNode, shell: &mut Shell) -> ArithResult<i64> {
    let name = match &d.target {
        ArithExpr::Variable(v) => v.name.clone(),
        other => eval(other, shell)?.to_string(),
    };
    let target_name = match &d.subscript {
        Some(sub) => format!("{}[{}]", name, eval(sub, shell)?),
        None => name,
    };
    let rhs = eval(&d.value, shell)?;
    let old = var_value(shell, &target_name);
    use ArithAssignmentOperator::*;
    let new = match d.operator {
        Assign => rhs,
        AddAssign => old + rhs,
        SubAssign => old - rhs,
        MulAssign => old * rhs,
        DivAssign => old / rhs.max(1),
        ModAssign => old % rhs.max(1),
        LShiftAssign => old << rhs,
        RShiftAssign => old >> rhs,
        AndAssign => old & rhs,
        OrAssign => old | rhs,
        XorAssign => old ^ rhs,
    };
    shell.set_var(&target_name, new.to_string());
    Ok(new)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_arithmetic_expression;

    fn eval_src(src: &str, shell: &mut Shell) -> i64 {
        let expr = parse_arithmetic_expression(src);
        eval(&expr.expression, shell).expect("evaluates")
    }

    #[test]
    fn basic_arithmetic() {
        let mut shell = Shell::new("test");
        assert_eq!(eval_src("1 + 2 * 3", &mut shell), 7);
        assert_eq!(eval_src("(1 + 2) * 3", &mut shell), 9);
        assert_eq!(eval_src("10 % 3", &mut shell), 1);
    }

    #[test]
    fn assignment_updates_shell_var() {
        let mut shell = Shell::new("test");
        assert_eq!(eval_src("x = 5", &mut shell), 5);
        assert_eq!(shell.get_var("x"), Some("5"));
        assert_eq!(eval_src("x += 2", &mut shell), 7);
    }

    #[test]
    fn ternary_and_comparison() {
        let mut shell = Shell::new("test");
        assert_eq!(eval_src("2 > 1 ? 10 : 20", &mut shell), 10);
    }
}
