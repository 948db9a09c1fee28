/// a module turns a String expression into a symbolic expression
///
///# Example
/// ```
/// use RustedMMS::symbolic::symbolic_engine::Expr;
/// let input = "1.0 + 0.15*cos(0.75*3.141592653589793*x) - 0.1*sin(0.45*3.141592653589793*y)";
/// let rho = Expr::parse_expression(input).unwrap();
/// println!(" parsed_expression {}", rho);
/// let value = rho.eval_expression(&["x", "y"], &[0.5, 0.5]).unwrap();
/// println!("rho(0.5, 0.5) = {}", value);
/// ```
/// ________________________________________________________________________________________________________________________________
pub mod parse_expr;
///____________________________________________________________________________________________________________________________
/// # Symbolic engine
/// a module
/// 1) builds symbolic expressions with shared subtrees (`Rc`) through overloaded operators
/// 2) holds piecewise expressions and their guards
/// 3) turns a symbolic expression into a string expression for printing and control results
///# Example#
/// ```
/// use RustedMMS::symbolic::symbolic_engine::Expr;
/// use RustedMMS::symbols;
/// let (x, y) = symbols!(x, y);
/// let f = (x.clone() * y.clone()).sin() + x.clone().min(y.clone());
/// let df_dx = f.diff("x");
/// println!("f = {}, df_dx = {}", f, df_dx);
/// let guarded = Expr::piecewise(vec![(x.clone(), x.clone().lt(y.clone()))], y);
/// println!("{}", guarded);
/// ```
pub mod symbolic_engine;
/// analytical derivatives, numerical evaluation and comparison with finite differences
pub mod symbolic_engine_derivatives;
mod symbolic_engine_tests;
/// smart constructors: constant folding and neutral-element elimination
pub mod symbolic_simplify;
/// bracket helpers for the parser, linspace, finite differences
pub mod utils;
