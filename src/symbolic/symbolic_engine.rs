//! # Symbolic Engine Module
//!
//! Core expression type of the crate. Expressions are immutable trees whose children are
//! shared through `Rc`, so a subexpression used in many places (the density field inside
//! every flux, say) is one node with many owners rather than many copies.
//!
//! ## Main Structures and Methods
//!
//! ### `Expr` Enum
//! - **Variables**: `Var(String)` - coordinates `x, y, z, t` and free parameters
//! - **Constants**: `Const(f64)`
//! - **Operations**: `Add`, `Sub`, `Mul`, `Div`, `Pow`
//! - **Functions**: `Exp`, `Ln`, `Sin`, `Cos`, `Sqrt`, `Min`
//! - **Piecewise**: ordered `(value, guard)` branches and a final `otherwise` value
//!
//! ### `Condition` Enum
//! Boolean guards of piecewise branches: comparisons of two expressions combined with
//! `And`, `Or`, `Not`, plus the literals `True` and `False`.
//!
//! ### Key Methods
//! - `Symbols(symbols: &str)` - Create multiple variables from comma-separated string
//! - `set_variable()`, `substitute_variable()` - substitution
//! - `contains_variable()`, `all_arguments_are_variables()` - inspection
//! - `node_count()` - number of distinct shared nodes, used when logging expression sizes
//!
//! Operators `+ - * /` and unary `-` are overloaded for `Expr` and for `Expr`/`f64` pairs.
//! They go through the smart constructors of `symbolic_simplify`, so constants are folded
//! while the tree is being built.


use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

/// Symbolic expression tree.
///
/// # Examples
/// ```rust, ignore
/// use RustedMMS::symbolic::symbolic_engine::Expr;
/// let x = Expr::Var("x".to_string());
/// let f = x.clone() * x + 2.0;
/// ```
#[derive(Clone, Debug, PartialEq)]
pub enum Expr {
    /// Symbolic variable with a name (e.g., "x", "t")
    Var(String),
    /// Numerical constant value
    Const(f64),
    /// Addition operation: left + right
    Add(Rc<Expr>, Rc<Expr>),
    /// Subtraction operation: left - right
    Sub(Rc<Expr>, Rc<Expr>),
    /// Multiplication operation: left * right
    Mul(Rc<Expr>, Rc<Expr>),
    /// Division operation: left / right
    Div(Rc<Expr>, Rc<Expr>),
    /// Power operation: base ^ exponent
    Pow(Rc<Expr>, Rc<Expr>),
    /// Exponential function: e^x
    Exp(Rc<Expr>),
    /// Natural logarithm: ln(x)
    Ln(Rc<Expr>),
    /// Sine function: sin(x)
    Sin(Rc<Expr>),
    /// Cosine function: cos(x)
    Cos(Rc<Expr>),
    /// Square root
    Sqrt(Rc<Expr>),
    /// Smaller of two values
    Min(Rc<Expr>, Rc<Expr>),
    /// First branch whose guard holds wins; `otherwise` when none does
    Piecewise {
        branches: Vec<(Rc<Expr>, Condition)>,
        otherwise: Rc<Expr>,
    },
}

/// Guard of a piecewise branch.
#[derive(Clone, Debug, PartialEq)]
pub enum Condition {
    True,
    False,
    Lt(Rc<Expr>, Rc<Expr>),
    Le(Rc<Expr>, Rc<Expr>),
    Gt(Rc<Expr>, Rc<Expr>),
    Ge(Rc<Expr>, Rc<Expr>),
    Eq(Rc<Expr>, Rc<Expr>),
    Ne(Rc<Expr>, Rc<Expr>),
    And(Box<Condition>, Box<Condition>),
    Or(Box<Condition>, Box<Condition>),
    Not(Box<Condition>),
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Expr::Var(name) => write!(f, "{}", name),
            Expr::Const(val) => write!(f, "{}", val),
            Expr::Add(lhs, rhs) => write!(f, "({} + {})", lhs, rhs),
            Expr::Sub(lhs, rhs) => write!(f, "({} - {})", lhs, rhs),
            Expr::Mul(lhs, rhs) => write!(f, "({} * {})", lhs, rhs),
            Expr::Div(lhs, rhs) => write!(f, "({} / {})", lhs, rhs),
            Expr::Pow(base, exp) => write!(f, "({} ^ {})", base, exp),
            Expr::Exp(expr) => write!(f, "exp({})", expr),
            Expr::Ln(expr) => write!(f, "ln({})", expr),
            Expr::Sin(expr) => write!(f, "sin({})", expr),
            Expr::Cos(expr) => write!(f, "cos({})", expr),
            Expr::Sqrt(expr) => write!(f, "sqrt({})", expr),
            Expr::Min(lhs, rhs) => write!(f, "Min({}, {})", lhs, rhs),
            Expr::Piecewise {
                branches,
                otherwise,
            } => {
                write!(f, "Piecewise(")?;
                for (value, guard) in branches {
                    write!(f, "({}, {}), ", value, guard)?;
                }
                write!(f, "({}, True))", otherwise)
            }
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Condition::True => write!(f, "True"),
            Condition::False => write!(f, "False"),
            Condition::Lt(a, b) => write!(f, "{} < {}", a, b),
            Condition::Le(a, b) => write!(f, "{} <= {}", a, b),
            Condition::Gt(a, b) => write!(f, "{} > {}", a, b),
            Condition::Ge(a, b) => write!(f, "{} >= {}", a, b),
            Condition::Eq(a, b) => write!(f, "Eq({}, {})", a, b),
            Condition::Ne(a, b) => write!(f, "Ne({}, {})", a, b),
            Condition::And(a, b) => write!(f, "({}) & ({})", a, b),
            Condition::Or(a, b) => write!(f, "({}) | ({})", a, b),
            Condition::Not(a) => write!(f, "~({})", a),
        }
    }
}

impl From<f64> for Expr {
    fn from(value: f64) -> Self {
        Expr::Const(value)
    }
}

macro_rules! impl_binary_op {
    ($trait:ident, $method:ident, $ctor:ident) => {
        impl std::ops::$trait for Expr {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$ctor(Rc::new(self), Rc::new(rhs))
            }
        }
        impl std::ops::$trait<f64> for Expr {
            type Output = Expr;
            fn $method(self, rhs: f64) -> Expr {
                Expr::$ctor(Rc::new(self), Rc::new(Expr::Const(rhs)))
            }
        }
        impl std::ops::$trait<Expr> for f64 {
            type Output = Expr;
            fn $method(self, rhs: Expr) -> Expr {
                Expr::$ctor(Rc::new(Expr::Const(self)), Rc::new(rhs))
            }
        }
    };
}

impl_binary_op!(Add, add, sum);
impl_binary_op!(Sub, sub, difference);
impl_binary_op!(Mul, mul, product);
impl_binary_op!(Div, div, quotient);

impl std::ops::AddAssign for Expr {
    fn add_assign(&mut self, rhs: Self) {
        *self = Expr::sum(Rc::new(self.clone()), Rc::new(rhs));
    }
}

impl std::ops::SubAssign for Expr {
    fn sub_assign(&mut self, rhs: Self) {
        *self = Expr::difference(Rc::new(self.clone()), Rc::new(rhs));
    }
}

impl std::ops::Neg for Expr {
    type Output = Self;

    fn neg(self) -> Self::Output {
        match self {
            Expr::Const(val) => Expr::Const(-val),
            other => Expr::product(Rc::new(Expr::Const(-1.0)), Rc::new(other)),
        }
    }
}

impl Expr {
    /// BASIC FEATURES

    /// Creates multiple symbolic variables from a comma-separated string.
    ///
    /// # Examples
    /// ```rust, ignore
    /// let vars = Expr::Symbols("x, y, z");
    /// assert_eq!(vars.len(), 3);
    /// ```
    pub fn Symbols(symbols: &str) -> Vec<Expr> {
        symbols
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(|s| Expr::Var(s.to_string()))
            .collect()
    }

    pub fn var(name: &str) -> Expr {
        Expr::Var(name.to_string())
    }

    pub fn rc(self) -> Rc<Expr> {
        Rc::new(self)
    }

    pub fn pow(self, rhs: Expr) -> Expr {
        Expr::power(Rc::new(self), Rc::new(rhs))
    }

    pub fn powf(self, exponent: f64) -> Expr {
        Expr::power(Rc::new(self), Rc::new(Expr::Const(exponent)))
    }

    pub fn exp(self) -> Expr {
        Expr::unary(Expr::Exp, Rc::new(self))
    }

    pub fn ln(self) -> Expr {
        Expr::unary(Expr::Ln, Rc::new(self))
    }

    pub fn sin(self) -> Expr {
        Expr::unary(Expr::Sin, Rc::new(self))
    }

    pub fn cos(self) -> Expr {
        Expr::unary(Expr::Cos, Rc::new(self))
    }

    pub fn sqrt(self) -> Expr {
        Expr::unary(Expr::Sqrt, Rc::new(self))
    }

    pub fn min(self, rhs: Expr) -> Expr {
        Expr::minimum(Rc::new(self), Rc::new(rhs))
    }

    /// Builds a piecewise expression from `(value, guard)` branches and a default value.
    pub fn piecewise(branches: Vec<(Expr, Condition)>, otherwise: Expr) -> Expr {
        Expr::piecewise_rc(
            branches
                .into_iter()
                .map(|(value, guard)| (Rc::new(value), guard))
                .collect(),
            Rc::new(otherwise),
        )
    }

    pub fn lt(self, rhs: Expr) -> Condition {
        Condition::Lt(Rc::new(self), Rc::new(rhs))
    }

    pub fn le(self, rhs: Expr) -> Condition {
        Condition::Le(Rc::new(self), Rc::new(rhs))
    }

    pub fn gt(self, rhs: Expr) -> Condition {
        Condition::Gt(Rc::new(self), Rc::new(rhs))
    }

    pub fn ge(self, rhs: Expr) -> Condition {
        Condition::Ge(Rc::new(self), Rc::new(rhs))
    }

    pub fn is_zero(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 0.0)
    }

    pub fn is_one(&self) -> bool {
        matches!(self, Expr::Const(val) if *val == 1.0)
    }

    /// Substitutes a variable with a constant value throughout the expression.
    pub fn set_variable(&self, var: &str, value: f64) -> Expr {
        self.substitute_variable(var, &Expr::Const(value))
    }

    /// Replaces every occurrence of `var` with `expr`.
    ///
    /// Shared subtrees are rewritten once; the rebuilt tree keeps the sharing of the input.
    pub fn substitute_variable(&self, var: &str, expr: &Expr) -> Expr {
        let replacement = Rc::new(expr.clone());
        let mut memo: HashMap<*const Expr, Rc<Expr>> = HashMap::new();
        self.map_children(&mut |child: &Rc<Expr>| {
            substitute_rc(child, var, &replacement, &mut memo)
        })
        .unwrap_or_else(|| match self {
            Expr::Var(name) if name == var => expr.clone(),
            _ => self.clone(),
        })
    }

    /// Does the expression depend on the variable?
    pub fn contains_variable(&self, var_name: &str) -> bool {
        let mut visited: HashSet<*const Expr> = HashSet::new();
        contains_rc(self, var_name, &mut visited)
    }

    /// Sorted list of the distinct variable names the expression depends on.
    pub fn all_arguments_are_variables(&self) -> Vec<String> {
        let mut names: HashSet<String> = HashSet::new();
        self.visit_distinct(&mut |node| {
            if let Expr::Var(name) = node {
                names.insert(name.clone());
            }
        });
        let mut names: Vec<String> = names.into_iter().collect();
        names.sort();
        names
    }

    /// Number of distinct nodes reachable from `self` (shared nodes counted once).
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        self.visit_distinct(&mut |_| count += 1);
        count
    }

    /// Calls `f` once for every distinct node, children before parents.
    pub fn visit_distinct(&self, f: &mut dyn FnMut(&Expr)) {
        let mut visited: HashSet<*const Expr> = HashSet::new();
        visit_rc(self, &mut visited, f);
    }

    /// Direct children, in evaluation order. Guard operands of piecewise branches are included.
    pub fn children(&self) -> Vec<&Rc<Expr>> {
        match self {
            Expr::Var(_) | Expr::Const(_) => Vec::new(),
            Expr::Add(lhs, rhs)
            | Expr::Sub(lhs, rhs)
            | Expr::Mul(lhs, rhs)
            | Expr::Div(lhs, rhs)
            | Expr::Pow(lhs, rhs)
            | Expr::Min(lhs, rhs) => vec![lhs, rhs],
            Expr::Exp(expr) | Expr::Ln(expr) | Expr::Sin(expr) | Expr::Cos(expr) | Expr::Sqrt(expr) => {
                vec![expr]
            }
            Expr::Piecewise {
                branches,
                otherwise,
            } => {
                let mut out = Vec::new();
                for (value, guard) in branches {
                    guard.operands(&mut out);
                    out.push(value);
                }
                out.push(otherwise);
                out
            }
        }
    }

    /// Rebuilds the node with every child replaced by `f(child)`, using the smart constructors.
    /// Returns `None` for leaves.
    pub(crate) fn map_children(&self, f: &mut dyn FnMut(&Rc<Expr>) -> Rc<Expr>) -> Option<Expr> {
        let rebuilt = match self {
            Expr::Var(_) | Expr::Const(_) => return None,
            Expr::Add(lhs, rhs) => Expr::sum(f(lhs), f(rhs)),
            Expr::Sub(lhs, rhs) => Expr::difference(f(lhs), f(rhs)),
            Expr::Mul(lhs, rhs) => Expr::product(f(lhs), f(rhs)),
            Expr::Div(lhs, rhs) => Expr::quotient(f(lhs), f(rhs)),
            Expr::Pow(base, exp) => Expr::power(f(base), f(exp)),
            Expr::Min(lhs, rhs) => Expr::minimum(f(lhs), f(rhs)),
            Expr::Exp(expr) => Expr::unary(Expr::Exp, f(expr)),
            Expr::Ln(expr) => Expr::unary(Expr::Ln, f(expr)),
            Expr::Sin(expr) => Expr::unary(Expr::Sin, f(expr)),
            Expr::Cos(expr) => Expr::unary(Expr::Cos, f(expr)),
            Expr::Sqrt(expr) => Expr::unary(Expr::Sqrt, f(expr)),
            Expr::Piecewise {
                branches,
                otherwise,
            } => {
                let branches = branches
                    .iter()
                    .map(|(value, guard)| (f(value), guard.map_operands(f)))
                    .collect();
                Expr::piecewise_rc(branches, f(otherwise))
            }
        };
        Some(rebuilt)
    }
}

impl Condition {
    pub fn and(self, rhs: Condition) -> Condition {
        Condition::And(Box::new(self), Box::new(rhs))
    }

    pub fn or(self, rhs: Condition) -> Condition {
        Condition::Or(Box::new(self), Box::new(rhs))
    }

    pub fn not(self) -> Condition {
        Condition::Not(Box::new(self))
    }

    /// Collects the expressions compared by this guard, left to right.
    pub fn operands<'a>(&'a self, out: &mut Vec<&'a Rc<Expr>>) {
        match self {
            Condition::True | Condition::False => {}
            Condition::Lt(a, b)
            | Condition::Le(a, b)
            | Condition::Gt(a, b)
            | Condition::Ge(a, b)
            | Condition::Eq(a, b)
            | Condition::Ne(a, b) => {
                out.push(a);
                out.push(b);
            }
            Condition::And(a, b) | Condition::Or(a, b) => {
                a.operands(out);
                b.operands(out);
            }
            Condition::Not(a) => a.operands(out),
        }
    }

    /// Same guard with every compared expression replaced by `f(expr)`.
    pub fn map_operands(&self, f: &mut dyn FnMut(&Rc<Expr>) -> Rc<Expr>) -> Condition {
        match self {
            Condition::True => Condition::True,
            Condition::False => Condition::False,
            Condition::Lt(a, b) => Condition::Lt(f(a), f(b)),
            Condition::Le(a, b) => Condition::Le(f(a), f(b)),
            Condition::Gt(a, b) => Condition::Gt(f(a), f(b)),
            Condition::Ge(a, b) => Condition::Ge(f(a), f(b)),
            Condition::Eq(a, b) => Condition::Eq(f(a), f(b)),
            Condition::Ne(a, b) => Condition::Ne(f(a), f(b)),
            Condition::And(a, b) => Condition::And(Box::new(a.map_operands(f)), Box::new(b.map_operands(f))),
            Condition::Or(a, b) => Condition::Or(Box::new(a.map_operands(f)), Box::new(b.map_operands(f))),
            Condition::Not(a) => Condition::Not(Box::new(a.map_operands(f))),
        }
    }
}

fn substitute_rc(
    node: &Rc<Expr>,
    var: &str,
    replacement: &Rc<Expr>,
    memo: &mut HashMap<*const Expr, Rc<Expr>>,
) -> Rc<Expr> {
    let key = Rc::as_ptr(node);
    if let Some(done) = memo.get(&key) {
        return done.clone();
    }
    let result = match node.as_ref() {
        Expr::Var(name) if name == var => replacement.clone(),
        Expr::Var(_) | Expr::Const(_) => node.clone(),
        other => {
            let mut f = |child: &Rc<Expr>| substitute_rc(child, var, replacement, memo);
            match other.map_children(&mut f) {
                Some(rebuilt) => Rc::new(rebuilt),
                None => node.clone(),
            }
        }
    };
    memo.insert(key, result.clone());
    result
}

fn contains_rc(node: &Expr, var_name: &str, visited: &mut HashSet<*const Expr>) -> bool {
    if let Expr::Var(name) = node {
        return name == var_name;
    }
    for child in node.children() {
        if visited.insert(Rc::as_ptr(child)) && contains_rc(child, var_name, visited) {
            return true;
        }
    }
    false
}

fn visit_rc(node: &Expr, visited: &mut HashSet<*const Expr>, f: &mut dyn FnMut(&Expr)) {
    for child in node.children() {
        if visited.insert(Rc::as_ptr(child)) {
            visit_rc(child, visited, f);
        }
    }
    f(node);
}

/// Creates several variables at once: `let (x, y) = symbols!(x, y);`
#[macro_export]
macro_rules! symbols {
    ($($var:ident),+ $(,)?) => {
        ($( $crate::symbolic::symbolic_engine::Expr::Var(stringify!($var).to_string()) ),+)
    };
}
