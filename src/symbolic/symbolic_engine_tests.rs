#[cfg(test)]
mod tests {
    use crate::symbolic::symbolic_engine::{Condition, Expr};
    use crate::symbolic::symbolic_engine_derivatives::Differentiator;
    use crate::symbols;
    use approx::assert_relative_eq;
    use std::collections::HashMap;
    use std::rc::Rc;

    fn point(x: f64, y: f64, z: f64) -> HashMap<String, f64> {
        let mut p = HashMap::new();
        p.insert("x".to_string(), x);
        p.insert("y".to_string(), y);
        p.insert("z".to_string(), z);
        p
    }

    fn sample_points() -> Vec<HashMap<String, f64>> {
        vec![
            point(0.1, 0.2, 0.3),
            point(0.45, 0.75, 0.05),
            point(0.9, 0.35, 0.6),
        ]
    }

    #[test]
    fn test_symbols_macro() {
        let (x, y) = symbols!(x, y);
        assert_eq!(x, Expr::var("x"));
        assert_eq!(y, Expr::var("y"));
        assert_eq!(Expr::Symbols("x, y, ,z").len(), 3);
    }

    #[test]
    fn test_diff_polynomial() {
        let (x, y) = symbols!(x, y);
        let f = x.clone() * x.clone() * y.clone() + 3.0 * y;
        let df = f.diff("x");
        assert_relative_eq!(df.eval(&point(2.0, 5.0, 0.0)).unwrap(), 20.0);
        let dfdy = f.diff("y");
        assert_relative_eq!(dfdy.eval(&point(2.0, 5.0, 0.0)).unwrap(), 7.0);
        assert_eq!(f.diff("z"), Expr::Const(0.0));
    }

    #[test]
    fn test_diff_against_central_differences() {
        let (x, y, z) = symbols!(x, y, z);
        let rho = 1.0 + 0.15 * (2.0 * x.clone()).cos() - 0.1 * (1.3 * y.clone()).sin();
        let f = (rho.clone() * x.clone() / (2.0 + y.clone() * z.clone())).sqrt()
            + (rho.clone().ln() * z.clone()).exp()
            + rho.powf(1.0 / 6.0) * x.clone().pow(y.clone() + 1.0);
        for var in ["x", "y", "z"] {
            let (max_diff, ok) = f.compare_num(var, &sample_points(), 1e-6).unwrap();
            assert!(ok, "derivative in {} off by {}", var, max_diff);
        }
    }

    #[test]
    fn test_min_and_piecewise() {
        let (x, y) = symbols!(x, y);
        let m = x.clone().min(y.clone());
        assert_relative_eq!(m.eval(&point(0.3, 0.7, 0.0)).unwrap(), 0.3);
        let dm = m.diff("x");
        assert_relative_eq!(dm.eval(&point(0.3, 0.7, 0.0)).unwrap(), 1.0);
        assert_relative_eq!(dm.eval(&point(0.9, 0.7, 0.0)).unwrap(), 0.0);

        let pw = Expr::piecewise(
            vec![
                (x.clone() * 2.0, x.clone().lt(Expr::Const(0.0))),
                (x.clone() * 3.0, x.clone().lt(Expr::Const(1.0))),
            ],
            x.clone() * 4.0,
        );
        assert_relative_eq!(pw.eval(&point(-1.0, 0.0, 0.0)).unwrap(), -2.0);
        assert_relative_eq!(pw.eval(&point(0.5, 0.0, 0.0)).unwrap(), 1.5);
        assert_relative_eq!(pw.eval(&point(2.0, 0.0, 0.0)).unwrap(), 8.0);
        let dpw = pw.diff("x");
        assert_relative_eq!(dpw.eval(&point(0.5, 0.0, 0.0)).unwrap(), 3.0);
    }

    #[test]
    fn test_conditions_hold() {
        let (x, y) = symbols!(x, y);
        let c = x.clone().ge(Expr::Const(0.0)).and(y.clone().lt(x).not());
        assert!(c.holds(&point(0.5, 0.7, 0.0)).unwrap());
        assert!(!c.holds(&point(0.5, 0.1, 0.0)).unwrap());
        assert!(Condition::True.or(Condition::False).holds(&point(0.0, 0.0, 0.0)).unwrap());
    }

    #[test]
    fn test_unknown_symbol_is_an_error() {
        let f = Expr::var("q") + 1.0;
        assert!(f.eval(&point(0.0, 0.0, 0.0)).is_err());
    }

    #[test]
    fn test_substitution_keeps_sharing() {
        let x = Expr::var("x");
        let shared = Rc::new((x.clone() * 2.0).sin());
        let f = Expr::Add(shared.clone(), shared.clone());
        assert_eq!(f.node_count(), 5);
        let g = f.substitute_variable("x", &(Expr::var("y") + 1.0));
        assert_eq!(g.node_count(), 7);
        assert_eq!(g.all_arguments_are_variables(), vec!["y".to_string()]);
        assert!(!g.contains_variable("x"));
        let h = f.set_variable("x", 0.25);
        assert_relative_eq!(h.eval(&HashMap::new()).unwrap(), 2.0 * 0.5f64.sin());
    }

    #[test]
    fn test_differentiator_reuses_shared_derivatives() {
        let x = Expr::var("x");
        let shared = Rc::new((x.clone() * x.clone()).sin());
        let mut d = Differentiator::new("x");
        let first = d.diff_rc(&shared);
        let second = d.diff_rc(&shared);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(d.variable(), "x");
    }
}
