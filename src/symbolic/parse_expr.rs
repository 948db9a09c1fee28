use crate::errors::MmsError;
use crate::symbolic::symbolic_engine::{Condition, Expr};
use crate::symbolic::utils::{
    find_pair_to_this_bracket, positions_outside_brackets, split_outside_brackets,
    wrapped_in_brackets,
};
use std::rc::Rc;
/// a module turns a String expression into a symbolic expression
///# Example
/// ```
/// use RustedMMS::symbolic::symbolic_engine::Expr;
/// let parsed = Expr::parse_expression("1.0 + 0.5*sin(3.0*y)").unwrap();
/// println!(" parsed_expression {}", parsed);
/// ```
//                  search recursion diagram
//                "y^2+exp(x)+log(x)/y-x^2.3"       |
//                |       left  | right             |
//                |_________________________________|
//                |      split at rightmost -       |
//                |_________________________________|
//                | y^2+exp(x)+log(x)/y |  x^2.3    |
//                |_________________________________|
//                |      split at rightmost +       |
//                |_________________________________|
//                |  y^2+exp(x) | log(x)/y          |
//                |_____________|___________________|
//                  etc...
// Splitting at the rightmost operator of the lowest precedence makes `+ - * /` left
// associative; `^` is split at its leftmost occurrence so it associates to the right.
// A unary minus binds tighter than `* /` and looser than `^`, as in Lua.

/// A sign is binary when the nearest non-blank character before it ends an operand.
/// The sign inside a literal such as `1.5e-3` is not an operator.
fn is_binary_sign(input: &str, pos: usize) -> bool {
    let before = input[..pos].trim_end();
    let Some(prev) = before.chars().last() else {
        return false;
    };
    if !(prev.is_ascii_alphanumeric() || prev == '_' || prev == ')' || prev == '.') {
        return false;
    }
    if (prev == 'e' || prev == 'E') && before.len() == input[..pos].len() {
        let token_start = before
            .rfind(|c: char| !(c.is_ascii_alphanumeric() || c == '.' || c == '_'))
            .map(|i| i + 1)
            .unwrap_or(0);
        let token = &before[token_start..];
        if token.starts_with(|c: char| c.is_ascii_digit() || c == '.') {
            return false;
        }
    }
    true
}

fn rightmost_binary(input: &str, ops: &[char]) -> Option<(usize, char)> {
    positions_outside_brackets(input)
        .into_iter()
        .filter(|(pos, c)| ops.contains(c) && (!matches!(c, '+' | '-') || is_binary_sign(input, *pos)))
        .last()
}

fn leftmost_power(input: &str) -> Option<usize> {
    positions_outside_brackets(input)
        .into_iter()
        .find(|(_, c)| *c == '^')
        .map(|(pos, _)| pos)
}

fn binary(ctor: fn(Rc<Expr>, Rc<Expr>) -> Expr, left: &str, right: &str) -> Result<Expr, MmsError> {
    Ok(ctor(
        Rc::new(parse_expression_func(left)?),
        Rc::new(parse_expression_func(right)?),
    ))
}

fn is_identifier(input: &str) -> bool {
    let mut chars = input.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn parse_function(name: &str, args: &str, input: &str) -> Result<Expr, MmsError> {
    let name = name.trim().strip_prefix("math.").unwrap_or(name.trim());
    let args = split_outside_brackets(args, ',');
    let one_arg = |ctor: fn(Rc<Expr>) -> Expr| -> Result<Expr, MmsError> {
        match args.as_slice() {
            [arg] => Ok(ctor(Rc::new(parse_expression_func(arg)?))),
            _ => Err(MmsError::parse(input, format!("{} takes one argument", name))),
        }
    };
    match name {
        "exp" => one_arg(Expr::Exp),
        "ln" | "log" => one_arg(Expr::Ln),
        "sin" => one_arg(Expr::Sin),
        "cos" => one_arg(Expr::Cos),
        "sqrt" => one_arg(Expr::Sqrt),
        "min" | "Min" => match args.as_slice() {
            [a, b] => binary(Expr::Min, a, b),
            _ => Err(MmsError::parse(input, "min takes two arguments")),
        },
        _ => Err(MmsError::parse(input, format!("unknown function '{}'", name))),
    }
}

/// Parses infix text into an expression tree, reproducing the grouping of the text exactly.
pub fn parse_expression_func(input: &str) -> Result<Expr, MmsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MmsError::parse(input, "empty expression"));
    }
    if input.contains("**") {
        return parse_expression_func(&input.replace("**", "^"));
    }
    if wrapped_in_brackets(input) {
        return parse_expression_func(&input[1..input.len() - 1]);
    }
    // addition and subtraction
    if let Some((pos, op)) = rightmost_binary(input, &['+', '-']) {
        let (left, right) = (&input[..pos], &input[pos + 1..]);
        return match op {
            '+' => binary(Expr::Add, left, right),
            _ => binary(Expr::Sub, left, right),
        };
    }
    // multiplication and division
    if let Some((pos, op)) = rightmost_binary(input, &['*', '/']) {
        let (left, right) = (&input[..pos], &input[pos + 1..]);
        return match op {
            '*' => binary(Expr::Mul, left, right),
            _ => binary(Expr::Div, left, right),
        };
    }
    // unary signs
    if let Some(rest) = input.strip_prefix('-') {
        return Ok(match parse_expression_func(rest)? {
            Expr::Const(val) => Expr::Const(-val),
            other => Expr::Mul(Rc::new(Expr::Const(-1.0)), Rc::new(other)),
        });
    }
    if let Some(rest) = input.strip_prefix('+') {
        return parse_expression_func(rest);
    }
    // power
    if let Some(pos) = leftmost_power(input) {
        return binary(Expr::Pow, &input[..pos], &input[pos + 1..]);
    }
    // function call
    if input.ends_with(')') {
        if let Some(open) = input.find('(') {
            if find_pair_to_this_bracket(input, open) == Some(input.len() - 1) {
                return parse_function(&input[..open], &input[open + 1..input.len() - 1], input);
            }
        }
        return Err(MmsError::parse(input, "unbalanced brackets"));
    }
    if let Ok(val) = input.parse::<f64>() {
        return Ok(Expr::Const(val));
    }
    match input {
        "pi" | "math.pi" => return Ok(Expr::Const(std::f64::consts::PI)),
        "math.huge" => return Ok(Expr::Const(f64::INFINITY)),
        _ => {}
    }
    if is_identifier(input) {
        return Ok(Expr::Var(input.to_string()));
    }
    Err(MmsError::parse(input, "not an expression"))
}

/// Rightmost occurrence of a keyword such as `and` standing as a separate word outside brackets.
fn rightmost_keyword(input: &str, keyword: &str) -> Option<usize> {
    let bytes = input.as_bytes();
    let boundary = |c: u8| c.is_ascii_whitespace() || c == b'(' || c == b')';
    positions_outside_brackets(input)
        .into_iter()
        .map(|(pos, _)| pos)
        .filter(|&pos| {
            input[pos..].starts_with(keyword)
                && (pos == 0 || boundary(bytes[pos - 1]))
                && bytes
                    .get(pos + keyword.len())
                    .is_some_and(|&c| boundary(c))
        })
        .last()
}

/// Parses a Lua style guard: comparisons combined with `and`, `or`, `not`.
pub fn parse_condition_func(input: &str) -> Result<Condition, MmsError> {
    let input = input.trim();
    if input.is_empty() {
        return Err(MmsError::parse(input, "empty condition"));
    }
    if wrapped_in_brackets(input) {
        if let Ok(inner) = parse_condition_func(&input[1..input.len() - 1]) {
            return Ok(inner);
        }
    }
    if let Some(pos) = rightmost_keyword(input, "or") {
        let left = parse_condition_func(&input[..pos])?;
        let right = parse_condition_func(&input[pos + 2..])?;
        return Ok(left.or(right));
    }
    if let Some(pos) = rightmost_keyword(input, "and") {
        let left = parse_condition_func(&input[..pos])?;
        let right = parse_condition_func(&input[pos + 3..])?;
        return Ok(left.and(right));
    }
    if let Some(rest) = input.strip_prefix("not") {
        if rest.starts_with(|c: char| c.is_whitespace() || c == '(') {
            return Ok(parse_condition_func(rest)?.not());
        }
    }
    match input {
        "true" | "True" => return Ok(Condition::True),
        "false" | "False" => return Ok(Condition::False),
        _ => {}
    }
    const COMPARISONS: [&str; 6] = ["<=", ">=", "==", "~=", "<", ">"];
    let positions = positions_outside_brackets(input);
    for (pos, _) in positions {
        for op in COMPARISONS {
            if input[pos..].starts_with(op) {
                let left = Rc::new(parse_expression_func(&input[..pos])?);
                let right = Rc::new(parse_expression_func(&input[pos + op.len()..])?);
                return Ok(match op {
                    "<=" => Condition::Le(left, right),
                    ">=" => Condition::Ge(left, right),
                    "==" => Condition::Eq(left, right),
                    "~=" => Condition::Ne(left, right),
                    "<" => Condition::Lt(left, right),
                    _ => Condition::Gt(left, right),
                });
            }
        }
    }
    Err(MmsError::parse(input, "not a condition"))
}

impl Expr {
    /// Parses a string into an expression.
    pub fn parse_expression(input: &str) -> Result<Expr, MmsError> {
        parse_expression_func(input)
    }
}
