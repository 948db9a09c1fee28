//! # Symbolic Engine Derivatives Module
//!
//! Analytical differentiation and numerical evaluation of `Expr` trees.
//!
//! ## Key Methods
//!
//! ### Differentiation
//! - `diff(var: &str)` - analytical partial derivative
//! - `Differentiator` - the same, but keeping a memo across many calls so that the
//!   derivatives of a shared subexpression are built once and are themselves shared
//! - `DerivativeCache` - a `Differentiator` per variable
//!
//! ### Evaluation
//! - `eval(point)` - value at a point given as a name -> value map
//! - `eval_expression(vars, values)` - the same with parallel slices
//!
//! ### Numerical validation
//! - `compare_num(var, points, tol)` - checks `diff(var)` against central differences
//!
//! Both differentiation and evaluation walk a DAG: every shared node is visited once per
//! call, so the cost is linear in the number of distinct nodes rather than in the size of the
//! fully expanded tree.

use crate::errors::MmsError;
use crate::symbolic::symbolic_engine::{Condition, Expr};
use crate::symbolic::utils::numerical_derivative;
use std::collections::HashMap;
use std::rc::Rc;

/// Memoized differentiation with respect to one variable.
///
/// Keeps both the source node and its derivative alive, so node addresses used as keys stay
/// valid for the lifetime of the differentiator.
pub struct Differentiator {
    var: String,
    memo: HashMap<*const Expr, (Rc<Expr>, Rc<Expr>)>,
}

impl Differentiator {
    pub fn new(var: &str) -> Self {
        Differentiator {
            var: var.to_string(),
            memo: HashMap::new(),
        }
    }

    pub fn variable(&self) -> &str {
        &self.var
    }

    /// Derivative of a shared node.
    pub fn diff_rc(&mut self, expr: &Rc<Expr>) -> Rc<Expr> {
        let key = Rc::as_ptr(expr);
        if let Some((_, done)) = self.memo.get(&key) {
            return done.clone();
        }
        let derivative = Rc::new(self.derive(expr));
        self.memo.insert(key, (expr.clone(), derivative.clone()));
        derivative
    }

    /// Derivative of an owned expression. Its children are memoized, the root is not.
    pub fn diff(&mut self, expr: &Expr) -> Expr {
        self.derive(expr)
    }

    fn derive(&mut self, expr: &Expr) -> Expr {
        match expr {
            Expr::Var(name) => {
                if *name == self.var {
                    Expr::Const(1.0)
                } else {
                    Expr::Const(0.0)
                }
            }
            Expr::Const(_) => Expr::Const(0.0),
            Expr::Add(lhs, rhs) => Expr::sum(self.diff_rc(lhs), self.diff_rc(rhs)),
            Expr::Sub(lhs, rhs) => Expr::difference(self.diff_rc(lhs), self.diff_rc(rhs)),
            // f'g + fg'
            Expr::Mul(lhs, rhs) => {
                let dl = self.diff_rc(lhs);
                let dr = self.diff_rc(rhs);
                Expr::sum(
                    Rc::new(Expr::product(dl, rhs.clone())),
                    Rc::new(Expr::product(lhs.clone(), dr)),
                )
            }
            // (f'g - fg') / g^2
            Expr::Div(lhs, rhs) => {
                let dl = self.diff_rc(lhs);
                let dr = self.diff_rc(rhs);
                let numerator = Expr::difference(
                    Rc::new(Expr::product(dl, rhs.clone())),
                    Rc::new(Expr::product(lhs.clone(), dr)),
                );
                let denominator = Expr::power(rhs.clone(), Rc::new(Expr::Const(2.0)));
                Expr::quotient(Rc::new(numerator), Rc::new(denominator))
            }
            Expr::Pow(base, exponent) => {
                let db = self.diff_rc(base);
                if !exponent.contains_variable(&self.var) {
                    // n * b^(n-1) * b'
                    let reduced = Expr::power(
                        base.clone(),
                        Rc::new(Expr::difference(exponent.clone(), Rc::new(Expr::Const(1.0)))),
                    );
                    Expr::product(
                        Rc::new(Expr::product(exponent.clone(), Rc::new(reduced))),
                        db,
                    )
                } else {
                    // b^n * (n' ln b + n b'/b)
                    let de = self.diff_rc(exponent);
                    let log_term = Expr::product(de, Rc::new(Expr::unary(Expr::Ln, base.clone())));
                    let ratio_term = Expr::product(
                        exponent.clone(),
                        Rc::new(Expr::quotient(db, base.clone())),
                    );
                    Expr::product(
                        Rc::new(expr.clone()),
                        Rc::new(Expr::sum(Rc::new(log_term), Rc::new(ratio_term))),
                    )
                }
            }
            Expr::Exp(arg) => {
                let da = self.diff_rc(arg);
                Expr::product(Rc::new(expr.clone()), da)
            }
            Expr::Ln(arg) => {
                let da = self.diff_rc(arg);
                Expr::quotient(da, arg.clone())
            }
            Expr::Sin(arg) => {
                let da = self.diff_rc(arg);
                Expr::product(Rc::new(Expr::unary(Expr::Cos, arg.clone())), da)
            }
            Expr::Cos(arg) => {
                let da = self.diff_rc(arg);
                let minus_sin = -Expr::unary(Expr::Sin, arg.clone());
                Expr::product(Rc::new(minus_sin), da)
            }
            // a' / (2 sqrt(a))
            Expr::Sqrt(arg) => {
                let da = self.diff_rc(arg);
                Expr::quotient(
                    da,
                    Rc::new(Expr::product(Rc::new(Expr::Const(2.0)), Rc::new(expr.clone()))),
                )
            }
            Expr::Min(lhs, rhs) => {
                let dl = self.diff_rc(lhs);
                let dr = self.diff_rc(rhs);
                Expr::piecewise_rc(vec![(dl, Condition::Le(lhs.clone(), rhs.clone()))], dr)
            }
            Expr::Piecewise {
                branches,
                otherwise,
            } => {
                let branches = branches
                    .iter()
                    .map(|(value, guard)| (self.diff_rc(value), guard.clone()))
                    .collect();
                let otherwise = self.diff_rc(otherwise);
                Expr::piecewise_rc(branches, otherwise)
            }
        }
    }
}

/// One `Differentiator` per variable, created on first use.
#[derive(Default)]
pub struct DerivativeCache {
    by_var: HashMap<String, Differentiator>,
}

impl DerivativeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn diff(&mut self, expr: &Expr, var: &str) -> Expr {
        self.by_var
            .entry(var.to_string())
            .or_insert_with(|| Differentiator::new(var))
            .diff(expr)
    }
}

impl Expr {
    /// DIFFERENTIATION

    /// Computes the analytical partial derivative of the expression with respect to a variable.
    ///
    /// Implements the standard rules:
    /// - Power rule: d/dx(x^n) = n*x^(n-1), and b^n*(n' ln b + n b'/b) for variable exponents
    /// - Product rule: d/dx(f*g) = f'*g + f*g'
    /// - Quotient rule: d/dx(f/g) = (f'*g - f*g')/g^2
    /// - Chain rule for `exp`, `ln`, `sin`, `cos`, `sqrt`
    /// - `Min(a, b)` differentiates to `Piecewise((a', a <= b), (b', True))`
    /// - piecewise expressions differentiate branch by branch with the same guards
    ///
    /// # Examples
    /// ```rust, ignore
    /// let x = Expr::var("x");
    /// let df_dx = (x.clone() * x).diff("x"); // x + x
    /// ```
    pub fn diff(&self, var: &str) -> Expr {
        Differentiator::new(var).diff(self)
    }

    /// EVALUATION

    /// Value of the expression at a point. Every variable must have a value in `point`.
    pub fn eval(&self, point: &HashMap<String, f64>) -> Result<f64, MmsError> {
        let mut cache: HashMap<*const Expr, f64> = HashMap::new();
        eval_node(self, point, &mut cache)
    }

    /// Value of the expression for variables `vars` taking the values `values`.
    pub fn eval_expression(&self, vars: &[&str], values: &[f64]) -> Result<f64, MmsError> {
        let point: HashMap<String, f64> = vars
            .iter()
            .zip(values.iter())
            .map(|(name, val)| (name.to_string(), *val))
            .collect();
        self.eval(&point)
    }

    /// Largest absolute difference between `diff(var)` and a central-difference estimate of the
    /// derivative over the sample points, and whether it stays within `tol`.
    pub fn compare_num(
        &self,
        var: &str,
        points: &[HashMap<String, f64>],
        tol: f64,
    ) -> Result<(f64, bool), MmsError> {
        let analytical = self.diff(var);
        let mut max_diff: f64 = 0.0;
        for point in points {
            let exact = analytical.eval(point)?;
            let numeric = numerical_derivative(
                |shift| {
                    let mut shifted = point.clone();
                    *shifted.entry(var.to_string()).or_insert(0.0) += shift;
                    self.eval(&shifted)
                },
                1e-5,
            )?;
            max_diff = max_diff.max((exact - numeric).abs());
        }
        Ok((max_diff, max_diff <= tol))
    }
}

impl Condition {
    /// Truth value of the guard at a point.
    pub fn holds(&self, point: &HashMap<String, f64>) -> Result<bool, MmsError> {
        let mut cache: HashMap<*const Expr, f64> = HashMap::new();
        holds_at(self, point, &mut cache)
    }
}

fn eval_rc(
    node: &Rc<Expr>,
    point: &HashMap<String, f64>,
    cache: &mut HashMap<*const Expr, f64>,
) -> Result<f64, MmsError> {
    let key = Rc::as_ptr(node);
    if let Some(val) = cache.get(&key) {
        return Ok(*val);
    }
    let val = eval_node(node, point, cache)?;
    cache.insert(key, val);
    Ok(val)
}

fn eval_node(
    node: &Expr,
    point: &HashMap<String, f64>,
    cache: &mut HashMap<*const Expr, f64>,
) -> Result<f64, MmsError> {
    let val = match node {
        Expr::Var(name) => *point
            .get(name)
            .ok_or_else(|| MmsError::UnknownSymbol(name.clone()))?,
        Expr::Const(val) => *val,
        Expr::Add(lhs, rhs) => eval_rc(lhs, point, cache)? + eval_rc(rhs, point, cache)?,
        Expr::Sub(lhs, rhs) => eval_rc(lhs, point, cache)? - eval_rc(rhs, point, cache)?,
        Expr::Mul(lhs, rhs) => eval_rc(lhs, point, cache)? * eval_rc(rhs, point, cache)?,
        Expr::Div(lhs, rhs) => eval_rc(lhs, point, cache)? / eval_rc(rhs, point, cache)?,
        Expr::Pow(base, exp) => eval_rc(base, point, cache)?.powf(eval_rc(exp, point, cache)?),
        Expr::Exp(arg) => eval_rc(arg, point, cache)?.exp(),
        Expr::Ln(arg) => eval_rc(arg, point, cache)?.ln(),
        Expr::Sin(arg) => eval_rc(arg, point, cache)?.sin(),
        Expr::Cos(arg) => eval_rc(arg, point, cache)?.cos(),
        Expr::Sqrt(arg) => eval_rc(arg, point, cache)?.sqrt(),
        Expr::Min(lhs, rhs) => eval_rc(lhs, point, cache)?.min(eval_rc(rhs, point, cache)?),
        Expr::Piecewise {
            branches,
            otherwise,
        } => {
            for (value, guard) in branches {
                if holds_at(guard, point, cache)? {
                    return eval_rc(value, point, cache);
                }
            }
            eval_rc(otherwise, point, cache)?
        }
    };
    Ok(val)
}

fn holds_at(
    guard: &Condition,
    point: &HashMap<String, f64>,
    cache: &mut HashMap<*const Expr, f64>,
) -> Result<bool, MmsError> {
    let truth = match guard {
        Condition::True => true,
        Condition::False => false,
        Condition::Lt(a, b) => eval_rc(a, point, cache)? < eval_rc(b, point, cache)?,
        Condition::Le(a, b) => eval_rc(a, point, cache)? <= eval_rc(b, point, cache)?,
        Condition::Gt(a, b) => eval_rc(a, point, cache)? > eval_rc(b, point, cache)?,
        Condition::Ge(a, b) => eval_rc(a, point, cache)? >= eval_rc(b, point, cache)?,
        Condition::Eq(a, b) => eval_rc(a, point, cache)? == eval_rc(b, point, cache)?,
        Condition::Ne(a, b) => eval_rc(a, point, cache)? != eval_rc(b, point, cache)?,
        Condition::And(a, b) => holds_at(a, point, cache)? && holds_at(b, point, cache)?,
        Condition::Or(a, b) => holds_at(a, point, cache)? || holds_at(b, point, cache)?,
        Condition::Not(a) => !holds_at(a, point, cache)?,
    };
    Ok(truth)
}
