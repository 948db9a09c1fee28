#[cfg(test)]
mod tests {
    use crate::mms::field_variables::FieldVariableSet;
    use crate::mms::manufactured_field::{COORDINATES, FieldCoefficients, TIME};
    use crate::mms::residuals::{Equation, ManufacturedSolution};
    use crate::mms::spalart_allmaras::SaOptions;
    use crate::mms::thermo::GasModel;
    use crate::symbolic::symbolic_engine::Expr;
    use std::collections::HashMap;
    use strum::IntoEnumIterator;

    const H: f64 = 1e-5;

    fn solution(options: &SaOptions) -> ManufacturedSolution {
        ManufacturedSolution::derive(&FieldCoefficients::default(), &GasModel::default(), options)
    }

    fn point(p: [f64; 3]) -> HashMap<String, f64> {
        COORDINATES
            .iter()
            .zip(p.iter())
            .map(|(name, val)| (name.to_string(), *val))
            .collect()
    }

    fn at(expr: &Expr, p: [f64; 3]) -> f64 {
        expr.eval(&point(p)).unwrap()
    }

    /// Central difference of `flux` along `axis`.
    fn ddx(flux: &dyn Fn([f64; 3]) -> f64, p: [f64; 3], axis: usize) -> f64 {
        let (mut plus, mut minus) = (p, p);
        plus[axis] += H;
        minus[axis] -= H;
        (flux(plus) - flux(minus)) / (2.0 * H)
    }

    /// Divergence of a flux vector by finite differences, together with the sum of the
    /// magnitudes of its terms (the scale of cancellation errors).
    fn divergence(fluxes: &[Flux<'_>; 3], p: [f64; 3]) -> (f64, f64) {
        let terms: Vec<f64> = (0..3).map(|axis| ddx(fluxes[axis].as_ref(), p, axis)).collect();
        (terms.iter().sum(), terms.iter().map(|t| t.abs()).sum())
    }

    const POINTS: [[f64; 3]; 3] = [[0.25, 0.5, 0.75], [0.8, 0.15, 0.4], [0.55, 0.9, 0.05]];

    #[test]
    fn test_residuals_are_steady_and_complete() {
        let sol = solution(&SaOptions::default());
        for (equation, expr) in sol.residuals.iter() {
            assert!(!expr.contains_variable(TIME), "{}", equation);
            for axis in COORDINATES {
                assert!(expr.contains_variable(axis), "{} does not depend on {}", equation, axis);
            }
        }
        assert_eq!(Equation::iter().count(), sol.residuals.iter().count());
        assert_eq!(Equation::Energy.to_string(), "fe");
    }

    #[test]
    fn test_mass_residual_is_divergence_of_mass_flux() {
        let sol = solution(&SaOptions::default());
        let f = &sol.variables.field;
        let fluxes: [Flux<'_>; 3] = [
            Box::new(|p| at(&f.rho, p) * at(&f.u, p)),
            Box::new(|p| at(&f.rho, p) * at(&f.v, p)),
            Box::new(|p| at(&f.rho, p) * at(&f.w, p)),
        ];
        for p in POINTS {
            let (div, scale) = divergence(&fluxes, p);
            let fmass = at(sol.residuals.get(Equation::Mass), p);
            assert!((fmass - div).abs() < 1e-6 * (scale + 1.0), "fmass {} vs {}", fmass, div);
        }
    }

    type Flux<'a> = Box<dyn Fn([f64; 3]) -> f64 + 'a>;

    fn velocity_at(vars: &FieldVariableSet, p: [f64; 3]) -> [f64; 3] {
        let f = &vars.field;
        [at(&f.u, p), at(&f.v, p), at(&f.w, p)]
    }

    /// `rho ui uj + p δij - (τij + τᵗij)`
    fn momentum_flux(vars: &FieldVariableSet, i: usize, j: usize) -> Flux<'_> {
        let stress = vars.total_stress(i, j);
        Box::new(move |p| {
            let vel = velocity_at(vars, p);
            let pressure = if i == j { at(&vars.field.p, p) } else { 0.0 };
            at(&vars.field.rho, p) * vel[i] * vel[j] + pressure - at(&stress, p)
        })
    }

    /// `rho ui ht + qi + qᵗi - Σj uj (τij + τᵗij)`
    fn energy_flux(vars: &FieldVariableSet, i: usize) -> Flux<'_> {
        let heat = vars.total_heat_flux(i);
        let stress: Vec<Expr> = (0..3).map(|j| vars.total_stress(i, j)).collect();
        Box::new(move |p| {
            let vel = velocity_at(vars, p);
            let work: f64 = (0..3).map(|j| vel[j] * at(&stress[j], p)).sum();
            at(&vars.field.rho, p) * vel[i] * at(&vars.thermo.ht, p) + at(&heat, p) - work
        })
    }

    /// `rho nuhat ui - rho (nu + nuhat) ∂i nuhat / sigma`
    fn turbulence_flux<'a>(sol: &'a ManufacturedSolution, dnuhat: Expr, i: usize) -> Flux<'a> {
        Box::new(move |p| {
            let f = &sol.variables.field;
            let vel = velocity_at(&sol.variables, p);
            let rho = at(&f.rho, p);
            let nuhat = at(&f.nuhat, p);
            rho * nuhat * vel[i]
                - rho * (at(&sol.closure.nu, p) + nuhat) * at(&dnuhat, p) / sol.closure.constants.sigma
        })
    }

    #[test]
    fn test_momentum_residuals_balance_fluxes() {
        let sol = solution(&SaOptions::default());
        let equations = [Equation::XMomentum, Equation::YMomentum, Equation::ZMomentum];
        for (i, equation) in equations.iter().enumerate() {
            let fluxes = [0, 1, 2].map(|j| momentum_flux(&sol.variables, i, j));
            for p in POINTS {
                let (div, scale) = divergence(&fluxes, p);
                let residual = at(sol.residuals.get(*equation), p);
                assert!(
                    (residual - div).abs() < 1e-6 * (scale + 1.0),
                    "{} {} vs {}",
                    equation,
                    residual,
                    div
                );
            }
        }
    }

    #[test]
    fn test_energy_residual_balances_fluxes() {
        let sol = solution(&SaOptions::default());
        let fluxes = [0, 1, 2].map(|i| energy_flux(&sol.variables, i));
        for p in POINTS {
            let (div, scale) = divergence(&fluxes, p);
            let fe = at(sol.residuals.get(Equation::Energy), p);
            assert!((fe - div).abs() < 1e-6 * (scale + 1.0), "fe {} vs {}", fe, div);
        }
    }

    #[test]
    fn test_turbulence_residual_balances_fluxes_and_sources() {
        let sol = solution(&SaOptions::default());
        let f = &sol.variables.field;
        let sa = &sol.closure;
        let c = &sa.constants;
        let gradient: Vec<Expr> = COORDINATES.iter().map(|axis| f.nuhat.diff(axis)).collect();
        let fluxes = [0, 1, 2].map(|i| turbulence_flux(&sol, gradient[i].clone(), i));
        for p in POINTS {
            let (div, scale) = divergence(&fluxes, p);
            let rho = at(&f.rho, p);
            let grad_sq: f64 = gradient.iter().map(|g| at(g, p).powi(2)).sum();
            let sources =
                rho * (at(&sa.production, p) - at(&sa.destruction, p)) + c.cb2 / c.sigma * rho * grad_sq;
            let expected = div - sources;
            let fnuhat = at(sol.residuals.get(Equation::Turbulence), p);
            assert!(
                (fnuhat - expected).abs() < 1e-6 * (scale + sources.abs() + 1.0),
                "fnuhat {} vs {}",
                fnuhat,
                expected
            );
        }
    }

    #[test]
    fn test_shat_correction_puts_piecewise_into_turbulence_source() {
        let options = SaOptions {
            negative_shat_correction: true,
            ..SaOptions::default()
        };
        let sol = solution(&options);
        let mut piecewise = 0;
        sol.residuals.get(Equation::Turbulence).visit_distinct(&mut |node| {
            if matches!(node, Expr::Piecewise { .. }) {
                piecewise += 1;
            }
        });
        assert!(piecewise >= 1);
        let mut min_nodes = 0;
        sol.residuals.get(Equation::Turbulence).visit_distinct(&mut |node| {
            if matches!(node, Expr::Min(..)) {
                min_nodes += 1;
            }
        });
        assert!(min_nodes >= 1);
    }
}
