//! Every named physical quantity of the manufactured solution: the primitive field, its
//! thermodynamic state, transport coefficients, stress tensors and heat fluxes.

use crate::mms::manufactured_field::{COORDINATES, ManufacturedField};
use crate::mms::spalart_allmaras::SpalartAllmaras;
use crate::mms::thermo::{GasModel, Thermodynamics};
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_engine_derivatives::DerivativeCache;
use strum_macros::{AsRefStr, Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr)]
pub enum FieldQuantity {
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
    #[strum(serialize = "T")]
    Temperature,
    #[strum(serialize = "e")]
    InternalEnergy,
    #[strum(serialize = "et")]
    TotalEnergy,
    #[strum(serialize = "ht")]
    TotalEnthalpy,
    #[strum(serialize = "mu")]
    Viscosity,
    #[strum(serialize = "k")]
    Conductivity,
    #[strum(serialize = "mu_t")]
    EddyViscosity,
    #[strum(serialize = "k_t")]
    EddyConductivity,
    #[strum(serialize = "txx")]
    StressXX,
    #[strum(serialize = "tyy")]
    StressYY,
    #[strum(serialize = "tzz")]
    StressZZ,
    #[strum(serialize = "txy")]
    StressXY,
    #[strum(serialize = "tyz")]
    StressYZ,
    #[strum(serialize = "tzx")]
    StressZX,
    #[strum(serialize = "tauxx")]
    TurbulentStressXX,
    #[strum(serialize = "tauyy")]
    TurbulentStressYY,
    #[strum(serialize = "tauzz")]
    TurbulentStressZZ,
    #[strum(serialize = "tauxy")]
    TurbulentStressXY,
    #[strum(serialize = "tauyz")]
    TurbulentStressYZ,
    #[strum(serialize = "tauzx")]
    TurbulentStressZX,
    #[strum(serialize = "qlx")]
    HeatFluxX,
    #[strum(serialize = "qly")]
    HeatFluxY,
    #[strum(serialize = "qlz")]
    HeatFluxZ,
    #[strum(serialize = "qtx")]
    TurbulentHeatFluxX,
    #[strum(serialize = "qty")]
    TurbulentHeatFluxY,
    #[strum(serialize = "qtz")]
    TurbulentHeatFluxZ,
}

/// Viscous stress `mu * (∂j ui + ∂i uj - 2/3 δij div u)` written the way the solver does:
/// `2/3 mu (2 ∂i ui - ∂j uj - ∂k uk)` on the diagonal, `mu (∂j ui + ∂i uj)` off it.
fn stress_tensor(viscosity: &Expr, gradient: &[[Expr; 3]; 3]) -> [[Expr; 3]; 3] {
    std::array::from_fn(|i| {
        std::array::from_fn(|j| {
            if i == j {
                let (k, l) = ((i + 1) % 3, (i + 2) % 3);
                2.0 / 3.0
                    * viscosity.clone()
                    * (2.0 * gradient[i][i].clone() - gradient[k][k].clone() - gradient[l][l].clone())
            } else {
                viscosity.clone() * (gradient[i][j].clone() + gradient[j][i].clone())
            }
        })
    })
}

/// Read-only set of all field quantities, built once per case.
#[derive(Debug, Clone)]
pub struct FieldVariableSet {
    pub field: ManufacturedField,
    pub thermo: Thermodynamics,
    pub mu: Expr,
    pub k: Expr,
    pub mu_t: Expr,
    pub k_t: Expr,
    /// `velocity_gradient[i][j] = ∂ui/∂xj`
    pub velocity_gradient: [[Expr; 3]; 3],
    pub laminar_stress: [[Expr; 3]; 3],
    pub turbulent_stress: [[Expr; 3]; 3],
    pub laminar_heat_flux: [Expr; 3],
    pub turbulent_heat_flux: [Expr; 3],
}

impl FieldVariableSet {
    pub fn new(
        field: &ManufacturedField,
        gas: &GasModel,
        closure: &SpalartAllmaras,
        cache: &mut DerivativeCache,
    ) -> Self {
        let thermo = Thermodynamics::new(field, gas);
        let mu = Expr::Const(gas.mu);
        let k = Expr::Const(gas.conductivity);
        let velocity = field.velocity();
        let velocity_gradient: [[Expr; 3]; 3] =
            std::array::from_fn(|i| std::array::from_fn(|j| cache.diff(velocity[i], COORDINATES[j])));
        let laminar_stress = stress_tensor(&mu, &velocity_gradient);
        let turbulent_stress = stress_tensor(&closure.mu_t, &velocity_gradient);
        let temperature_gradient: [Expr; 3] = std::array::from_fn(|i| cache.diff(&thermo.T, COORDINATES[i]));
        let laminar_heat_flux = std::array::from_fn(|i| -(k.clone() * temperature_gradient[i].clone()));
        let turbulent_heat_flux =
            std::array::from_fn(|i| -(closure.k_t.clone() * temperature_gradient[i].clone()));

        FieldVariableSet {
            field: field.clone(),
            thermo,
            mu,
            k,
            mu_t: closure.mu_t.clone(),
            k_t: closure.k_t.clone(),
            velocity_gradient,
            laminar_stress,
            turbulent_stress,
            laminar_heat_flux,
            turbulent_heat_flux,
        }
    }

    pub fn get(&self, quantity: FieldQuantity) -> &Expr {
        use FieldQuantity::*;
        match quantity {
            Density => &self.field.rho,
            VelocityX => &self.field.u,
            VelocityY => &self.field.v,
            VelocityZ => &self.field.w,
            Pressure => &self.field.p,
            Nuhat => &self.field.nuhat,
            Temperature => &self.thermo.T,
            InternalEnergy => &self.thermo.e,
            TotalEnergy => &self.thermo.et,
            TotalEnthalpy => &self.thermo.ht,
            Viscosity => &self.mu,
            Conductivity => &self.k,
            EddyViscosity => &self.mu_t,
            EddyConductivity => &self.k_t,
            StressXX => &self.laminar_stress[0][0],
            StressYY => &self.laminar_stress[1][1],
            StressZZ => &self.laminar_stress[2][2],
            StressXY => &self.laminar_stress[0][1],
            StressYZ => &self.laminar_stress[1][2],
            StressZX => &self.laminar_stress[2][0],
            TurbulentStressXX => &self.turbulent_stress[0][0],
            TurbulentStressYY => &self.turbulent_stress[1][1],
            TurbulentStressZZ => &self.turbulent_stress[2][2],
            TurbulentStressXY => &self.turbulent_stress[0][1],
            TurbulentStressYZ => &self.turbulent_stress[1][2],
            TurbulentStressZX => &self.turbulent_stress[2][0],
            HeatFluxX => &self.laminar_heat_flux[0],
            HeatFluxY => &self.laminar_heat_flux[1],
            HeatFluxZ => &self.laminar_heat_flux[2],
            TurbulentHeatFluxX => &self.turbulent_heat_flux[0],
            TurbulentHeatFluxY => &self.turbulent_heat_flux[1],
            TurbulentHeatFluxZ => &self.turbulent_heat_flux[2],
        }
    }

    /// Velocity components in axis order.
    pub fn velocity(&self) -> [&Expr; 3] {
        self.field.velocity()
    }

    /// Laminar plus turbulent stress.
    pub fn total_stress(&self, i: usize, j: usize) -> Expr {
        self.laminar_stress[i][j].clone() + self.turbulent_stress[i][j].clone()
    }

    /// Laminar plus turbulent heat flux.
    pub fn total_heat_flux(&self, i: usize) -> Expr {
        self.laminar_heat_flux[i].clone() + self.turbulent_heat_flux[i].clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mms::manufactured_field::FieldCoefficients;
    use crate::mms::spalart_allmaras::SaOptions;
    use approx::assert_relative_eq;
    use strum::IntoEnumIterator;

    fn build() -> FieldVariableSet {
        let field = ManufacturedField::new(&FieldCoefficients::default());
        let gas = GasModel::default();
        let mut cache = DerivativeCache::new();
        let sa = SpalartAllmaras::new(&field, &gas, &SaOptions::default(), &mut cache);
        FieldVariableSet::new(&field, &gas, &sa, &mut cache)
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<String> = FieldQuantity::iter().map(|q| q.to_string()).collect();
        let n = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), n);
        assert_eq!(FieldQuantity::EddyViscosity.as_ref(), "mu_t");
    }

    #[test]
    fn test_stress_is_symmetric_and_traceless() {
        let vars = build();
        let p = [0.3, 0.55, 0.8];
        let at = |e: &Expr| e.eval_expression(&["x", "y", "z"], &p).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_relative_eq!(
                    at(&vars.laminar_stress[i][j]),
                    at(&vars.laminar_stress[j][i]),
                    max_relative = 1e-12
                );
            }
        }
        let trace: f64 = (0..3).map(|i| at(&vars.laminar_stress[i][i])).sum();
        let scale = at(&vars.laminar_stress[0][0]).abs() + 1.0;
        assert!(trace.abs() < 1e-10 * scale);
        let div_u: f64 = (0..3).map(|i| at(&vars.velocity_gradient[i][i])).sum();
        let mu_t = at(&vars.mu_t);
        let expected = 2.0 / 3.0 * mu_t * (3.0 * at(&vars.velocity_gradient[0][0]) - div_u);
        assert_relative_eq!(at(&vars.turbulent_stress[0][0]), expected, max_relative = 1e-10);
    }

    #[test]
    fn test_every_quantity_is_finite() {
        let vars = build();
        for q in FieldQuantity::iter() {
            let value = vars.get(q).eval_expression(&["x", "y", "z"], &[0.4, 0.1, 0.9]).unwrap();
            assert!(value.is_finite(), "{} = {}", q, value);
        }
    }
}
