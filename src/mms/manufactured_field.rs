//! # Manufactured field
//!
//! Primitive flow variables `rho, u, v, w, p, nuhat` of the manufactured solution. Every
//! variable is a base value plus six trigonometric waves, three along the axes and three
//! along the pairwise products of coordinates:
//!
//! ```text
//! q = q0 + Σ A_k trig_k(a_k π arg_k / L^d_k),   arg_k ∈ {x, y, z, xy, yz, zx}
//! ```
//!
//! with `d_k = 1` for single axes and `2` for products. The default coefficients are those of
//! the classic 3D Spalart-Allmaras verification case; they keep density, pressure and the
//! turbulence variable well away from zero over the unit cube.

use crate::symbolic::symbolic_engine::Expr;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use strum_macros::{AsRefStr, Display, EnumIter};

pub const X: &str = "x";
pub const Y: &str = "y";
pub const Z: &str = "z";
pub const TIME: &str = "t";
pub const COORDINATES: [&str; 3] = [X, Y, Z];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trig {
    Sin,
    Cos,
}

/// One wave `amplitude * trig(frequency * π * arg / L^d)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WaveTerm {
    pub amplitude: f64,
    pub frequency: f64,
    pub trig: Trig,
}

impl WaveTerm {
    pub const fn new(amplitude: f64, frequency: f64, trig: Trig) -> Self {
        WaveTerm {
            amplitude,
            frequency,
            trig,
        }
    }

    fn expression(&self, scale: f64, argument: Expr, length_power: f64) -> Expr {
        let amplitude = scale * self.amplitude;
        if amplitude == 0.0 {
            return Expr::Const(0.0);
        }
        let phase = (self.frequency * PI / length_power) * argument;
        let wave = match self.trig {
            Trig::Sin => phase.sin(),
            Trig::Cos => phase.cos(),
        };
        amplitude * wave
    }
}

/// Base value and the six waves of one primitive variable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VariableCoefficients {
    pub base: f64,
    pub x: WaveTerm,
    pub y: WaveTerm,
    pub z: WaveTerm,
    pub xy: WaveTerm,
    pub yz: WaveTerm,
    pub zx: WaveTerm,
}

impl VariableCoefficients {
    /// Closed-form expression of the variable; `scale` multiplies every wave amplitude.
    pub fn expression(&self, scale: f64, length: f64) -> Expr {
        let (x, y, z) = (Expr::var(X), Expr::var(Y), Expr::var(Z));
        let area = length * length;
        Expr::Const(self.base)
            + self.x.expression(scale, x.clone(), length)
            + self.y.expression(scale, y.clone(), length)
            + self.z.expression(scale, z.clone(), length)
            + self.xy.expression(scale, x.clone() * y.clone(), area)
            + self.yz.expression(scale, y * z.clone(), area)
            + self.zx.expression(scale, z * x, area)
    }
}

use Trig::{Cos, Sin};

const fn table(base: f64, waves: [(f64, f64, Trig); 6]) -> VariableCoefficients {
    VariableCoefficients {
        base,
        x: WaveTerm::new(waves[0].0, waves[0].1, waves[0].2),
        y: WaveTerm::new(waves[1].0, waves[1].1, waves[1].2),
        z: WaveTerm::new(waves[2].0, waves[2].1, waves[2].2),
        xy: WaveTerm::new(waves[3].0, waves[3].1, waves[3].2),
        yz: WaveTerm::new(waves[4].0, waves[4].1, waves[4].2),
        zx: WaveTerm::new(waves[5].0, waves[5].1, waves[5].2),
    }
}

/// Coefficients of the whole manufactured field.
///
/// `amplitude_scale` multiplies the waves of the mean-flow variables; the turbulence
/// variable is never scaled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FieldCoefficients {
    pub length: f64,
    pub amplitude_scale: f64,
    pub rho: VariableCoefficients,
    pub u: VariableCoefficients,
    pub v: VariableCoefficients,
    pub w: VariableCoefficients,
    pub p: VariableCoefficients,
    pub nuhat: VariableCoefficients,
}

impl Default for FieldCoefficients {
    fn default() -> Self {
        FieldCoefficients {
            length: 1.0,
            amplitude_scale: 1.0,
            rho: table(
                1.0,
                [(0.15, 0.75, Cos), (-0.1, 0.45, Sin), (0.1, 0.8, Sin), (0.08, 0.65, Cos), (0.05, 0.75, Cos), (0.12, 0.5, Sin)],
            ),
            u: table(
                70.0,
                [(7.0, 0.5, Sin), (-15.0, 0.85, Cos), (-10.0, 0.4, Cos), (7.0, 0.6, Cos), (4.0, 0.8, Cos), (-4.0, 0.9, Sin)],
            ),
            v: table(
                90.0,
                [(-5.0, 0.8, Sin), (10.0, 0.8, Cos), (5.0, 0.5, Cos), (-11.0, 0.9, Cos), (-5.0, 0.4, Cos), (5.0, 0.6, Sin)],
            ),
            w: table(
                80.0,
                [(-10.0, 0.85, Cos), (10.0, 0.9, Sin), (12.0, 0.5, Cos), (-12.0, 0.4, Sin), (11.0, 0.8, Cos), (5.0, 0.75, Sin)],
            ),
            p: table(
                1.0e5,
                [(0.2e5, 0.4, Cos), (0.5e5, 0.45, Cos), (0.2e5, 0.85, Sin), (-0.25e5, 0.75, Cos), (-0.1e5, 0.7, Cos), (0.1e5, 0.8, Sin)],
            ),
            nuhat: table(
                1.0,
                [(0.24, 0.35, Cos), (-0.3, 0.4, Cos), (0.8, 0.8, Sin), (0.75, 0.5, Cos), (0.5, 0.25, Cos), (-0.6, 0.6, Sin)],
            ),
        }
    }
}

/// Names of the primitive variables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr)]
pub enum Primitive {
    #[strum(serialize = "rho")]
    Density,
    #[strum(serialize = "u")]
    VelocityX,
    #[strum(serialize = "v")]
    VelocityY,
    #[strum(serialize = "w")]
    VelocityZ,
    #[strum(serialize = "p")]
    Pressure,
    #[strum(serialize = "nuhat")]
    Nuhat,
}

/// Closed-form primitive field.
#[derive(Debug, Clone)]
pub struct ManufacturedField {
    pub rho: Expr,
    pub u: Expr,
    pub v: Expr,
    pub w: Expr,
    pub p: Expr,
    pub nuhat: Expr,
}

impl ManufacturedField {
    pub fn new(coefficients: &FieldCoefficients) -> Self {
        let scale = coefficients.amplitude_scale;
        let length = coefficients.length;
        ManufacturedField {
            rho: coefficients.rho.expression(scale, length),
            u: coefficients.u.expression(scale, length),
            v: coefficients.v.expression(scale, length),
            w: coefficients.w.expression(scale, length),
            p: coefficients.p.expression(scale, length),
            nuhat: coefficients.nuhat.expression(1.0, length),
        }
    }

    pub fn get(&self, primitive: Primitive) -> &Expr {
        match primitive {
            Primitive::Density => &self.rho,
            Primitive::VelocityX => &self.u,
            Primitive::VelocityY => &self.v,
            Primitive::VelocityZ => &self.w,
            Primitive::Pressure => &self.p,
            Primitive::Nuhat => &self.nuhat,
        }
    }

    /// Velocity components in axis order.
    pub fn velocity(&self) -> [&Expr; 3] {
        [&self.u, &self.v, &self.w]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolic::utils::linspace;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn at(expr: &Expr, x: f64, y: f64, z: f64) -> f64 {
        expr.eval_expression(&[X, Y, Z], &[x, y, z]).unwrap()
    }

    #[test]
    fn test_values_at_origin() {
        let field = ManufacturedField::new(&FieldCoefficients::default());
        // at the origin sines vanish and cosines are one
        assert_relative_eq!(at(&field.rho, 0.0, 0.0, 0.0), 1.0 + 0.15 + 0.08 + 0.05, epsilon = 1e-12);
        assert_relative_eq!(at(&field.u, 0.0, 0.0, 0.0), 70.0 - 15.0 - 10.0 + 7.0 + 4.0, epsilon = 1e-10);
        assert_relative_eq!(at(&field.nuhat, 0.0, 0.0, 0.0), 1.0 + 0.24 - 0.3 + 0.75 + 0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_field_is_positive_where_it_must_be() {
        let field = ManufacturedField::new(&FieldCoefficients::default());
        let grid = linspace(0.0, 1.0, 6);
        for &x in &grid {
            for &y in &grid {
                for &z in &grid {
                    assert!(at(&field.rho, x, y, z) > 0.5);
                    assert!(at(&field.p, x, y, z) > 1.0e4);
                    assert!(at(&field.nuhat, x, y, z) > 0.0);
                }
            }
        }
    }

    #[test]
    fn test_amplitude_scale_leaves_nuhat_alone() {
        let mut coefficients = FieldCoefficients::default();
        coefficients.amplitude_scale = 0.0;
        let field = ManufacturedField::new(&coefficients);
        assert_eq!(field.rho, Expr::Const(1.0));
        assert_eq!(field.p, Expr::Const(1.0e5));
        assert!(field.nuhat.contains_variable(Z));
    }

    #[test]
    fn test_every_primitive_depends_on_every_axis() {
        let field = ManufacturedField::new(&FieldCoefficients::default());
        for primitive in Primitive::iter() {
            for axis in COORDINATES {
                assert!(field.get(primitive).contains_variable(axis), "{} {}", primitive, axis);
            }
            assert!(!field.get(primitive).contains_variable(TIME));
        }
    }
}
