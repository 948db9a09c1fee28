//! Evaluator for the Lua subset written by the serializer: `local` declarations, assignments
//! and `if / elseif / else / end` chains whose right-hand sides are arithmetic expressions.
//!
//! Used to check that a generated chunk reproduces the values of the expressions it was
//! generated from.

use crate::codegen::lua_serializer::{Assignment, LuaDialect};
use crate::errors::{MmsError, MmsResult};
use crate::mms::manufactured_field::COORDINATES;
use crate::symbolic::parse_expr::{parse_condition_func, parse_expression_func};
use log::{debug, info};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::HashMap;

/// State of one open `if` chain.
struct Frame {
    parent_active: bool,
    taken: bool,
    active: bool,
}

fn structure_error(number: usize, reason: &str) -> MmsError {
    MmsError::CodeCheck(format!("line {}: {}", number + 1, reason))
}

/// Runs `chunk` with the variables of `point` bound and returns every variable afterwards,
/// keyed by the assignment target text.
pub fn evaluate_chunk(
    chunk: &str,
    point: &HashMap<String, f64>,
    dialect: &LuaDialect,
) -> MmsResult<HashMap<String, f64>> {
    let min_call = format!("{}(", dialect.min_function);
    let normalize = |text: &str| -> String {
        if dialect.min_function == "min" {
            text.to_string()
        } else {
            text.replace(&min_call, "min(")
        }
    };
    let mut env = point.clone();
    let mut frames: Vec<Frame> = Vec::new();

    for (number, raw) in chunk.lines().enumerate() {
        let line = raw.trim();
        let active = frames.last().is_none_or(|frame| frame.active);
        if line.is_empty() || line.starts_with("--") {
            continue;
        }
        if let Some(guard) = line.strip_prefix("if ").and_then(|l| l.strip_suffix(" then")) {
            let holds = active && parse_condition_func(&normalize(guard))?.holds(&env)?;
            frames.push(Frame {
                parent_active: active,
                taken: holds,
                active: holds,
            });
        } else if let Some(guard) = line.strip_prefix("elseif ").and_then(|l| l.strip_suffix(" then")) {
            let frame = frames
                .last_mut()
                .ok_or_else(|| structure_error(number, "elseif without if"))?;
            let holds = frame.parent_active
                && !frame.taken
                && parse_condition_func(&normalize(guard))?.holds(&env)?;
            frame.active = holds;
            frame.taken |= holds;
        } else if line == "else" {
            let frame = frames
                .last_mut()
                .ok_or_else(|| structure_error(number, "else without if"))?;
            frame.active = frame.parent_active && !frame.taken;
            frame.taken = true;
        } else if line == "end" {
            frames
                .pop()
                .ok_or_else(|| structure_error(number, "end without if"))?;
        } else if let Some(declaration) = line.strip_prefix("local ") {
            if let Some((name, value)) = declaration.split_once('=') {
                if active {
                    let val = parse_expression_func(&normalize(value))?.eval(&env)?;
                    env.insert(name.trim().to_string(), val);
                }
            }
        } else if let Some((target, value)) = line.split_once(" = ") {
            if active {
                let val = parse_expression_func(&normalize(value))?.eval(&env)?;
                env.insert(target.trim().to_string(), val);
            }
        } else {
            return Err(structure_error(number, &format!("unsupported statement '{}'", line)));
        }
    }
    if !frames.is_empty() {
        return Err(MmsError::CodeCheck("unterminated if chain".to_string()));
    }
    Ok(env)
}

fn same_value(a: f64, b: f64) -> bool {
    a.to_bits() == b.to_bits() || (a.is_nan() && b.is_nan())
}

/// Evaluates `chunk` at every point and compares each expression target bit for bit with the
/// expression it was generated from.
pub fn check_chunk(
    chunk: &str,
    assignments: &[(String, Assignment)],
    points: &[HashMap<String, f64>],
    dialect: &LuaDialect,
) -> MmsResult<()> {
    for point in points {
        let values = evaluate_chunk(chunk, point, dialect)?;
        for (target, assignment) in assignments {
            let Assignment::Expression(expr) = assignment else {
                continue;
            };
            let expected = expr.eval(point)?;
            let actual = *values.get(target).ok_or_else(|| {
                MmsError::CodeCheck(format!("{} is never assigned by the generated chunk", target))
            })?;
            if !same_value(actual, expected) {
                return Err(MmsError::CodeCheck(format!(
                    "{} evaluates to {:e} in the generated chunk but to {:e} from its expression at {:?}",
                    target, actual, expected, point
                )));
            }
        }
        debug!("generated chunk matches its expressions at {:?}", point);
    }
    info!(
        "generated chunk checked at {} points for {} assignments",
        points.len(),
        assignments.len()
    );
    Ok(())
}

/// Reproducible random points in the unit cube.
pub fn sample_points(count: usize, seed: u64) -> Vec<HashMap<String, f64>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..count)
        .map(|_| {
            COORDINATES
                .iter()
                .map(|axis| (axis.to_string(), rng.random_range(0.0..1.0)))
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(x: f64) -> HashMap<String, f64> {
        HashMap::from([("x".to_string(), x)])
    }

    #[test]
    fn test_if_chain_selects_first_matching_branch() {
        let chunk = "local pw_1\nif x < 0.0 then\n    pw_1 = 1.0\nelseif x < 1.0 then\n    pw_1 = 2.0\nelse\n    pw_1 = 3.0\nend\nf = pw_1 * 10.0\n";
        let dialect = LuaDialect::default();
        for (x, expected) in [(-1.0, 10.0), (0.5, 20.0), (2.0, 30.0)] {
            let env = evaluate_chunk(chunk, &point(x), &dialect).unwrap();
            assert_eq!(env["f"], expected);
        }
    }

    #[test]
    fn test_nested_chains_skip_inactive_guards() {
        // the inner guard would fail to evaluate if it were reached
        let chunk = "if x > 0.0 then\n    f = 1.0\nelse\n    if q > 0.0 then\n        f = 2.0\n    else\n        f = 3.0\n    end\nend\n";
        let env = evaluate_chunk(chunk, &point(1.0), &LuaDialect::default()).unwrap();
        assert_eq!(env["f"], 1.0);
        assert!(evaluate_chunk(chunk, &point(-1.0), &LuaDialect::default()).is_err());
    }

    #[test]
    fn test_malformed_chunks() {
        let dialect = LuaDialect::default();
        assert!(evaluate_chunk("if x < 1.0 then\nf = 1.0\n", &point(0.0), &dialect).is_err());
        assert!(evaluate_chunk("end\n", &point(0.0), &dialect).is_err());
        assert!(evaluate_chunk("while true do\n", &point(0.0), &dialect).is_err());
    }

    #[test]
    fn test_custom_min_function() {
        let dialect = LuaDialect {
            min_function: "mmin".to_string(),
        };
        let env = evaluate_chunk("f = mmin(x, 0.25)\n", &point(0.5), &dialect).unwrap();
        assert_eq!(env["f"], 0.25);
    }

    #[test]
    fn test_sample_points_are_reproducible() {
        let a = sample_points(4, 7);
        let b = sample_points(4, 7);
        assert_eq!(a, b);
        for p in &a {
            for axis in COORDINATES {
                assert!((0.0..1.0).contains(&p[axis]));
            }
        }
    }
}
