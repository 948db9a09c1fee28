//! # Spalart-Allmaras closure
//!
//! Closure auxiliaries of the one-equation model built symbolically from the manufactured
//! field: viscosity ratio, damping functions, vorticity magnitude, modified vorticity,
//! production, destruction, eddy viscosity and eddy conductivity, and the net source of
//! the `nuhat` transport equation.
//!
//! The modified vorticity is `S_hat = Omega + S_bar` unless the negative-`S_hat`
//! correction is switched on, in which case it becomes
//!
//! ```text
//! S_hat = Omega + S_bar                                              if S_bar >= -cv2 Omega
//!       = Omega + Omega (cv2² Omega + cv3 S_bar) / ((cv3 - 2 cv2) Omega - S_bar)  otherwise
//! ```

use crate::mms::manufactured_field::{COORDINATES, ManufacturedField};
use crate::mms::thermo::GasModel;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_engine_derivatives::DerivativeCache;
use log::debug;

/// Model constants.
#[derive(Debug, Clone, PartialEq)]
pub struct SaConstants {
    pub cv1: f64,
    pub cv2: f64,
    pub cv3: f64,
    pub cb1: f64,
    pub cb2: f64,
    pub ct3: f64,
    pub ct4: f64,
    pub kappa: f64,
    pub sigma: f64,
    pub cw2: f64,
    pub cw3: f64,
}

impl Default for SaConstants {
    fn default() -> Self {
        SaConstants {
            cv1: 7.1,
            cv2: 0.7,
            cv3: 0.9,
            cb1: 0.1355,
            cb2: 0.622,
            ct3: 1.2,
            ct4: 0.5,
            kappa: 0.41,
            sigma: 2.0 / 3.0,
            cw2: 0.3,
            cw3: 2.0,
        }
    }
}

impl SaConstants {
    pub fn cw1(&self) -> f64 {
        self.cb1 / (self.kappa * self.kappa) + (1.0 + self.cb1) / self.sigma
    }
}

#[derive(Debug, Clone)]
pub struct SaOptions {
    /// distance to the nearest wall, a function of the coordinates
    pub wall_distance: Expr,
    pub negative_shat_correction: bool,
}

impl Default for SaOptions {
    fn default() -> Self {
        SaOptions {
            wall_distance: Expr::Const(1.0),
            negative_shat_correction: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SpalartAllmaras {
    pub constants: SaConstants,
    pub nu: Expr,
    pub chi: Expr,
    pub ft2: Expr,
    pub fv1: Expr,
    pub fv2: Expr,
    pub omega: Expr,
    pub s_bar: Expr,
    pub s_hat: Expr,
    pub r: Expr,
    pub g: Expr,
    pub fw: Expr,
    pub production: Expr,
    pub destruction: Expr,
    pub mu_t: Expr,
    pub k_t: Expr,
}

impl SpalartAllmaras {
    pub fn new(
        field: &ManufacturedField,
        gas: &GasModel,
        options: &SaOptions,
        cache: &mut DerivativeCache,
    ) -> Self {
        let c = SaConstants::default();
        let (rho, nuhat) = (field.rho.clone(), field.nuhat.clone());
        let d = options.wall_distance.clone();
        let kappa2 = c.kappa * c.kappa;

        let nu = Expr::Const(gas.mu) / rho.clone();
        let chi = nuhat.clone() / nu.clone();
        let ft2 = c.ct3 * (-c.ct4 * chi.clone().powf(2.0)).exp();
        let chi3 = chi.clone().powf(3.0);
        let fv1 = chi3.clone() / (chi3 + c.cv1.powi(3));
        let fv2 = 1.0 - chi.clone() / (1.0 + chi.clone() * fv1.clone());

        // vorticity magnitude from the antisymmetric part of the velocity gradient
        let velocity = field.velocity();
        let mut rotation_sq = Expr::Const(0.0);
        for i in 0..3 {
            for j in 0..3 {
                let w_ij = 0.5
                    * (cache.diff(velocity[i], COORDINATES[j]) - cache.diff(velocity[j], COORDINATES[i]));
                rotation_sq += w_ij.clone() * w_ij;
            }
        }
        let omega = (2.0 * rotation_sq).sqrt();

        let s_bar = nuhat.clone() / (kappa2 * d.clone().powf(2.0)) * fv2.clone();
        let s_hat = if options.negative_shat_correction {
            let blended = omega.clone()
                + omega.clone() * (c.cv2 * c.cv2 * omega.clone() + c.cv3 * s_bar.clone())
                    / ((c.cv3 - 2.0 * c.cv2) * omega.clone() - s_bar.clone());
            Expr::piecewise(
                vec![(
                    omega.clone() + s_bar.clone(),
                    s_bar.clone().ge(-c.cv2 * omega.clone()),
                )],
                blended,
            )
        } else {
            omega.clone() + s_bar.clone()
        };

        let r = (nuhat.clone() / (s_hat.clone() * kappa2 * d.clone().powf(2.0))).min(Expr::Const(10.0));
        let g = r.clone() + c.cw2 * (r.clone().powf(6.0) - r.clone());
        let cw3_6 = c.cw3.powi(6);
        let fw = g.clone() * ((1.0 + cw3_6) / (g.clone().powf(6.0) + cw3_6)).powf(1.0 / 6.0);

        let production = c.cb1 * (1.0 - ft2.clone()) * s_hat.clone() * nuhat.clone();
        let destruction = (c.cw1() * fw.clone() - c.cb1 / kappa2 * ft2.clone()) * (nuhat.clone() / d).powf(2.0);

        let mu_t = rho * nuhat * fv1.clone();
        let k_t = gas.cp() * mu_t.clone() / gas.prandtl_turbulent;
        debug!(
            "Spalart-Allmaras closure built: Omega has {} nodes, fw has {} nodes",
            omega.node_count(),
            fw.node_count()
        );

        SpalartAllmaras {
            constants: c,
            nu,
            chi,
            ft2,
            fv1,
            fv2,
            omega,
            s_bar,
            s_hat,
            r,
            g,
            fw,
            production,
            destruction,
            mu_t,
            k_t,
        }
    }

    /// Net source of the `nuhat` equation:
    /// `rho (P - D) + 1/sigma Σ ∂i(rho (nu + nuhat) ∂i nuhat) + cb2/sigma rho Σ (∂i nuhat)²`.
    pub fn source(&self, field: &ManufacturedField, cache: &mut DerivativeCache) -> Expr {
        let c = &self.constants;
        let rho = field.rho.clone();
        let diffusivity = rho.clone() * (self.nu.clone() + field.nuhat.clone());
        let mut diffusion = Expr::Const(0.0);
        let mut gradient_sq = Expr::Const(0.0);
        for axis in COORDINATES {
            let dnuhat = cache.diff(&field.nuhat, axis);
            diffusion += cache.diff(&(diffusivity.clone() * dnuhat.clone()), axis);
            gradient_sq += dnuhat.powf(2.0);
        }
        rho.clone() * (self.production.clone() - self.destruction.clone())
            + (1.0 / c.sigma) * diffusion
            + (c.cb2 / c.sigma) * rho * gradient_sq
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mms::manufactured_field::FieldCoefficients;
    use approx::assert_relative_eq;

    fn closure(correction: bool) -> (ManufacturedField, SpalartAllmaras) {
        let field = ManufacturedField::new(&FieldCoefficients::default());
        let options = SaOptions {
            negative_shat_correction: correction,
            ..SaOptions::default()
        };
        let mut cache = DerivativeCache::new();
        let sa = SpalartAllmaras::new(&field, &GasModel::default(), &options, &mut cache);
        (field, sa)
    }

    fn at(expr: &Expr, p: [f64; 3]) -> f64 {
        expr.eval_expression(&["x", "y", "z"], &p).unwrap()
    }

    #[test]
    fn test_cw1() {
        let c = SaConstants::default();
        assert_relative_eq!(c.cw1(), 0.1355 / 0.1681 + 1.1355 * 1.5, epsilon = 1e-12);
    }

    #[test]
    fn test_damping_functions() {
        let (field, sa) = closure(false);
        let p = [0.2, 0.4, 0.7];
        let gas = GasModel::default();
        let chi = at(&field.nuhat, p) * at(&field.rho, p) / gas.mu;
        assert_relative_eq!(at(&sa.chi, p), chi, max_relative = 1e-12);
        let fv1 = chi.powi(3) / (chi.powi(3) + 7.1f64.powi(3));
        assert_relative_eq!(at(&sa.fv1, p), fv1, max_relative = 1e-12);
        assert_relative_eq!(at(&sa.fv2, p), 1.0 - chi / (1.0 + chi * fv1), max_relative = 1e-12);
        assert_relative_eq!(at(&sa.ft2, p), 1.2 * (-0.5 * chi * chi).exp(), max_relative = 1e-12);
        assert_relative_eq!(
            at(&sa.mu_t, p),
            at(&field.rho, p) * at(&field.nuhat, p) * fv1,
            max_relative = 1e-12
        );
        assert_relative_eq!(at(&sa.k_t, p), gas.cp() * at(&sa.mu_t, p) / 0.89, max_relative = 1e-12);
    }

    #[test]
    fn test_r_is_capped() {
        let (_, sa) = closure(false);
        for p in [[0.1, 0.1, 0.1], [0.5, 0.9, 0.3], [0.95, 0.05, 0.6]] {
            let r = at(&sa.r, p);
            assert!(r <= 10.0);
            assert!(at(&sa.omega, p) >= 0.0);
        }
    }

    #[test]
    fn test_shat_correction_agrees_when_inactive() {
        let (_, plain) = closure(false);
        let (_, corrected) = closure(true);
        assert!(matches!(corrected.s_hat, Expr::Piecewise { .. }));
        for p in [[0.1, 0.2, 0.3], [0.6, 0.4, 0.8]] {
            let s_bar = at(&plain.s_bar, p);
            let omega = at(&plain.omega, p);
            if s_bar >= -0.7 * omega {
                assert_relative_eq!(at(&plain.s_hat, p), at(&corrected.s_hat, p), max_relative = 1e-12);
            }
        }
    }
}
