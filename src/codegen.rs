//! # Code generation
//!
//! Symbolic source terms become text the solver can run: Lua assignment statements placed
//! into template frames.
//!
//!# Example
//! ```
//! use RustedMMS::codegen::lua_serializer::{Assignment, LuaDialect, serialize_assignments};
//! use RustedMMS::symbolic::symbolic_engine::Expr;
//! let x = Expr::var("x");
//! let f = Expr::piecewise(vec![(x.clone(), x.clone().lt(Expr::Const(0.5)))], Expr::Const(0.5));
//! let code = serialize_assignments(&[("f".to_string(), Assignment::from(f))], &LuaDialect::default()).unwrap();
//! println!("{}", code);
//! ```
/// Lua evaluator of generated chunks, used to check them against their expressions
pub mod lua_check;
/// expression trees to Lua statements, piecewise nodes hoisted into if-chains
pub mod lua_serializer;
/// `$placeholder` substitution into template files
pub mod template;
