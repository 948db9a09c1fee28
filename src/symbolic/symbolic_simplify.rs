//! # Symbolic Expression Simplification Module
//!
//! Smart constructors used everywhere an `Expr` node is built, plus a recursive `simplify()`
//! that reapplies them to an arbitrary tree.
//!
//! ## Simplification Strategy
//!
//! 1. **Constant Folding**: arithmetic and elementary functions of constants are evaluated
//! 2. **Algebraic Identities**: `x + 0 = x`, `x * 1 = x`, `x * 0 = 0`, `x ^ 1 = x`, `x ^ 0 = 1`, `0 / x = 0`
//! 3. **Guard Folding**: comparisons of constants become `True`/`False`; piecewise branches
//!    with a `False` guard are dropped and a leading `True` guard selects its value
//!
//! Nothing else is attempted: no term collection, no reordering. Derivatives of manufactured
//! fields produce a great many `0 * ...` and `... * 1` factors, and removing those is enough
//! to keep the generated code compact.

use crate::symbolic::symbolic_engine::{Condition, Expr};
use std::collections::HashMap;
use std::rc::Rc;

fn constant(expr: &Expr) -> Option<f64> {
    match expr {
        Expr::Const(val) => Some(*val),
        _ => None,
    }
}

impl Expr {
    //___________________________________SMART CONSTRUCTORS____________________________________

    pub fn sum(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Expr {
        match (constant(&lhs), constant(&rhs)) {
            (Some(a), Some(b)) => Expr::Const(a + b),
            (Some(a), _) if a == 0.0 => rhs.as_ref().clone(),
            (_, Some(b)) if b == 0.0 => lhs.as_ref().clone(),
            _ => Expr::Add(lhs, rhs),
        }
    }

    pub fn difference(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Expr {
        match (constant(&lhs), constant(&rhs)) {
            (Some(a), Some(b)) => Expr::Const(a - b),
            (_, Some(b)) if b == 0.0 => lhs.as_ref().clone(),
            (Some(a), _) if a == 0.0 => Expr::product(Rc::new(Expr::Const(-1.0)), rhs),
            _ => Expr::Sub(lhs, rhs),
        }
    }

    pub fn product(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Expr {
        match (constant(&lhs), constant(&rhs)) {
            (Some(a), Some(b)) => Expr::Const(a * b),
            (Some(a), _) if a == 0.0 => Expr::Const(0.0),
            (_, Some(b)) if b == 0.0 => Expr::Const(0.0),
            (Some(a), _) if a == 1.0 => rhs.as_ref().clone(),
            (_, Some(b)) if b == 1.0 => lhs.as_ref().clone(),
            _ => Expr::Mul(lhs, rhs),
        }
    }

    pub fn quotient(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Expr {
        match (constant(&lhs), constant(&rhs)) {
            (Some(a), Some(b)) if b != 0.0 => Expr::Const(a / b),
            (Some(a), _) if a == 0.0 => Expr::Const(0.0),
            (_, Some(b)) if b == 1.0 => lhs.as_ref().clone(),
            _ => Expr::Div(lhs, rhs),
        }
    }

    pub fn power(base: Rc<Expr>, exponent: Rc<Expr>) -> Expr {
        match (constant(&base), constant(&exponent)) {
            (Some(a), Some(b)) => Expr::Const(a.powf(b)),
            (_, Some(b)) if b == 0.0 => Expr::Const(1.0),
            (_, Some(b)) if b == 1.0 => base.as_ref().clone(),
            (Some(a), _) if a == 1.0 => Expr::Const(1.0),
            _ => Expr::Pow(base, exponent),
        }
    }

    pub fn minimum(lhs: Rc<Expr>, rhs: Rc<Expr>) -> Expr {
        match (constant(&lhs), constant(&rhs)) {
            (Some(a), Some(b)) => Expr::Const(a.min(b)),
            _ => Expr::Min(lhs, rhs),
        }
    }

    /// Wraps `arg` with a one-argument function variant, folding constant arguments.
    pub fn unary(ctor: fn(Rc<Expr>) -> Expr, arg: Rc<Expr>) -> Expr {
        let node = ctor(arg);
        match node.eval_constant() {
            Some(val) if val.is_finite() => Expr::Const(val),
            _ => node,
        }
    }

    pub fn piecewise_rc(branches: Vec<(Rc<Expr>, Condition)>, otherwise: Rc<Expr>) -> Expr {
        let mut kept = Vec::with_capacity(branches.len());
        for (value, guard) in branches {
            match guard.fold() {
                Condition::False => continue,
                Condition::True => {
                    if kept.is_empty() {
                        return value.as_ref().clone();
                    }
                    return Expr::Piecewise {
                        branches: kept,
                        otherwise: value,
                    };
                }
                folded => kept.push((value, folded)),
            }
        }
        if kept.is_empty() {
            return otherwise.as_ref().clone();
        }
        Expr::Piecewise {
            branches: kept,
            otherwise,
        }
    }

    /// Value of a node whose direct children are all constants.
    fn eval_constant(&self) -> Option<f64> {
        let val = match self {
            Expr::Exp(arg) => constant(arg)?.exp(),
            Expr::Ln(arg) => constant(arg)?.ln(),
            Expr::Sin(arg) => constant(arg)?.sin(),
            Expr::Cos(arg) => constant(arg)?.cos(),
            Expr::Sqrt(arg) => constant(arg)?.sqrt(),
            _ => return None,
        };
        Some(val)
    }

    //___________________________________SIMPLIFICATION____________________________________

    /// Rebuilds the whole tree through the smart constructors.
    ///
    /// Shared subtrees are simplified once and stay shared in the result.
    pub fn simplify(&self) -> Expr {
        let mut memo: HashMap<*const Expr, Rc<Expr>> = HashMap::new();
        let mut f = |child: &Rc<Expr>| simplify_rc(child, &mut memo);
        self.map_children(&mut f).unwrap_or_else(|| self.clone())
    }
}

fn simplify_rc(node: &Rc<Expr>, memo: &mut HashMap<*const Expr, Rc<Expr>>) -> Rc<Expr> {
    let key = Rc::as_ptr(node);
    if let Some(done) = memo.get(&key) {
        return done.clone();
    }
    let mut f = |child: &Rc<Expr>| simplify_rc(child, memo);
    let result = match node.map_children(&mut f) {
        Some(rebuilt) => Rc::new(rebuilt),
        None => node.clone(),
    };
    memo.insert(key, result.clone());
    result
}

impl Condition {
    /// Folds comparisons between constants into `True`/`False` and propagates through
    /// `And`, `Or`, `Not`.
    pub fn fold(self) -> Condition {
        let compare = |a: &Rc<Expr>, b: &Rc<Expr>, op: fn(f64, f64) -> bool| -> Option<Condition> {
            match (constant(a), constant(b)) {
                (Some(x), Some(y)) => Some(if op(x, y) {
                    Condition::True
                } else {
                    Condition::False
                }),
                _ => None,
            }
        };
        let folded = match &self {
            Condition::Lt(a, b) => compare(a, b, |x, y| x < y),
            Condition::Le(a, b) => compare(a, b, |x, y| x <= y),
            Condition::Gt(a, b) => compare(a, b, |x, y| x > y),
            Condition::Ge(a, b) => compare(a, b, |x, y| x >= y),
            Condition::Eq(a, b) => compare(a, b, |x, y| x == y),
            Condition::Ne(a, b) => compare(a, b, |x, y| x != y),
            _ => None,
        };
        if let Some(folded) = folded {
            return folded;
        }
        match self {
            Condition::And(a, b) => match (a.fold(), b.fold()) {
                (Condition::False, _) | (_, Condition::False) => Condition::False,
                (Condition::True, other) | (other, Condition::True) => other,
                (a, b) => a.and(b),
            },
            Condition::Or(a, b) => match (a.fold(), b.fold()) {
                (Condition::True, _) | (_, Condition::True) => Condition::True,
                (Condition::False, other) | (other, Condition::False) => other,
                (a, b) => a.or(b),
            },
            Condition::Not(a) => match a.fold() {
                Condition::True => Condition::False,
                Condition::False => Condition::True,
                other => other.not(),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_neutral_elements_are_dropped() {
        let x = Expr::var("x");
        assert_eq!(x.clone() + 0.0, x);
        assert_eq!(1.0 * x.clone(), x);
        assert_eq!(x.clone() * 0.0, Expr::Const(0.0));
        assert_eq!(x.clone().powf(1.0), x);
        assert_eq!(x.clone().powf(0.0), Expr::Const(1.0));
        assert_eq!(0.0 / x.clone(), Expr::Const(0.0));
        assert_eq!(x.clone() / 1.0, x);
    }

    #[test]
    fn test_constant_folding() {
        let e = (Expr::Const(2.0) + Expr::Const(3.0)) * Expr::Const(4.0);
        assert_eq!(e, Expr::Const(20.0));
        assert_eq!(Expr::Const(0.0).cos(), Expr::Const(1.0));
        assert_eq!(Expr::Const(4.0).min(Expr::Const(-1.0)), Expr::Const(-1.0));
    }

    #[test]
    fn test_simplify_raw_tree() {
        let x = Rc::new(Expr::var("x"));
        let zero = Rc::new(Expr::Const(0.0));
        let one = Rc::new(Expr::Const(1.0));
        let raw = Expr::Add(
            Rc::new(Expr::Mul(zero.clone(), x.clone())),
            Rc::new(Expr::Mul(one, x.clone())),
        );
        assert_eq!(raw.simplify(), Expr::var("x"));
    }

    #[test]
    fn test_piecewise_with_constant_guards() {
        let x = Expr::var("x");
        let pw = Expr::piecewise(
            vec![
                (Expr::Const(1.0), Expr::Const(2.0).lt(Expr::Const(1.0))),
                (x.clone(), Condition::True),
            ],
            Expr::Const(3.0),
        );
        assert_eq!(pw, x);
        let untouched = Expr::piecewise(vec![(Expr::Const(1.0), x.clone().lt(Expr::Const(0.5)))], x.clone());
        assert!(matches!(untouched, Expr::Piecewise { .. }));
    }

    #[test]
    fn test_guard_folding() {
        let x = Expr::var("x");
        let c = Condition::True.and(x.clone().gt(Expr::Const(0.0)));
        assert_eq!(c.fold(), x.gt(Expr::Const(0.0)));
        assert_eq!(Condition::False.or(Condition::True).fold(), Condition::True);
        assert_eq!(Condition::True.not().fold(), Condition::False);
    }
}
