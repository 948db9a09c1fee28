//! Ideal-gas thermodynamics of the manufactured field.

use crate::mms::manufactured_field::ManufacturedField;
use crate::symbolic::symbolic_engine::Expr;
use serde::{Deserialize, Serialize};

/// Calorically perfect gas with constant transport properties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GasModel {
    pub gamma: f64,
    pub gas_constant: f64,
    /// molecular viscosity
    pub mu: f64,
    /// laminar thermal conductivity
    pub conductivity: f64,
    pub prandtl_turbulent: f64,
}

impl Default for GasModel {
    fn default() -> Self {
        GasModel {
            gamma: 1.4,
            gas_constant: 287.0,
            mu: 10.0,
            conductivity: 10000.0,
            prandtl_turbulent: 0.89,
        }
    }
}

impl GasModel {
    pub fn cv(&self) -> f64 {
        self.gas_constant / (self.gamma - 1.0)
    }

    pub fn cp(&self) -> f64 {
        self.gamma * self.cv()
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.gamma > 1.0) {
            return Err(format!("gas.gamma must be > 1, got {}", self.gamma));
        }
        for (name, val) in [
            ("gas.gas_constant", self.gas_constant),
            ("gas.mu", self.mu),
            ("gas.conductivity", self.conductivity),
            ("gas.prandtl_turbulent", self.prandtl_turbulent),
        ] {
            if !(val > 0.0) {
                return Err(format!("{} must be positive, got {}", name, val));
            }
        }
        Ok(())
    }
}

/// Internal energy, temperature, total energy and total enthalpy.
#[derive(Debug, Clone)]
pub struct Thermodynamics {
    pub e: Expr,
    pub T: Expr,
    pub et: Expr,
    pub ht: Expr,
}

impl Thermodynamics {
    pub fn new(field: &ManufacturedField, gas: &GasModel) -> Self {
        let (rho, p) = (field.rho.clone(), field.p.clone());
        let e = p.clone() / rho.clone() / (gas.gamma - 1.0);
        let T = e.clone() / gas.cv();
        let kinetic = field.u.clone() * field.u.clone() / 2.0
            + field.v.clone() * field.v.clone() / 2.0
            + field.w.clone() * field.w.clone() / 2.0;
        let et = e.clone() + kinetic;
        let ht = et.clone() + p / rho;
        Thermodynamics { e, T, et, ht }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mms::manufactured_field::FieldCoefficients;
    use approx::assert_relative_eq;

    #[test]
    fn test_ideal_gas_relations() {
        let gas = GasModel::default();
        assert_relative_eq!(gas.cv(), 717.5, epsilon = 1e-9);
        assert_relative_eq!(gas.cp(), 1004.5, epsilon = 1e-9);
        let field = ManufacturedField::new(&FieldCoefficients::default());
        let thermo = Thermodynamics::new(&field, &gas);
        let vars = ["x", "y", "z"];
        let point = [0.3, 0.6, 0.2];
        let rho = field.rho.eval_expression(&vars, &point).unwrap();
        let p = field.p.eval_expression(&vars, &point).unwrap();
        let T = thermo.T.eval_expression(&vars, &point).unwrap();
        // p = rho R T
        assert_relative_eq!(p, rho * gas.gas_constant * T, max_relative = 1e-12);
        let et = thermo.et.eval_expression(&vars, &point).unwrap();
        let ht = thermo.ht.eval_expression(&vars, &point).unwrap();
        assert_relative_eq!(ht - et, p / rho, max_relative = 1e-12);
    }

    #[test]
    fn test_validation() {
        assert!(GasModel::default().validate().is_ok());
        let bad = GasModel {
            gamma: 1.0,
            ..GasModel::default()
        };
        assert!(bad.validate().is_err());
    }
}
