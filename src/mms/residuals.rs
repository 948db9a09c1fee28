//! # Governing-equation residuals
//!
//! Source terms that make the manufactured field an exact solution of the compressible
//! Reynolds-averaged Navier-Stokes equations with the Spalart-Allmaras model, in
//! conservative form:
//!
//! ```text
//! fmass  = ∂t rho + Σ ∂i(rho ui)
//! fimom  = ∂t(rho ui) + Σj ∂j(rho ui uj) + ∂i p - Σj ∂j(τij + τᵗij)
//! fe     = ∂t(rho et) + Σi ∂i(rho ui ht) + Σi ∂i(qi + qᵗi) - Σi ∂i(Σj uj (τij + τᵗij))
//! fnuhat = ∂t(rho nuhat) + Σi ∂i(rho nuhat ui) - S
//! ```

use crate::mms::field_variables::FieldVariableSet;
use crate::mms::manufactured_field::{COORDINATES, FieldCoefficients, ManufacturedField, TIME};
use crate::mms::spalart_allmaras::{SaOptions, SpalartAllmaras};
use crate::mms::thermo::GasModel;
use crate::symbolic::symbolic_engine::Expr;
use crate::symbolic::symbolic_engine_derivatives::DerivativeCache;
use log::info;
use std::time::Instant;
use strum::IntoEnumIterator;
use strum_macros::{AsRefStr, Display, EnumIter};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, Display, AsRefStr)]
pub enum Equation {
    #[strum(serialize = "fmass")]
    Mass,
    #[strum(serialize = "fxmom")]
    XMomentum,
    #[strum(serialize = "fymom")]
    YMomentum,
    #[strum(serialize = "fzmom")]
    ZMomentum,
    #[strum(serialize = "fe")]
    Energy,
    #[strum(serialize = "fnuhat")]
    Turbulence,
}

/// Source term of every equation, in `Equation` order.
#[derive(Debug, Clone)]
pub struct ResidualSet {
    residuals: [Expr; 6],
}

impl ResidualSet {
    pub fn derive(
        vars: &FieldVariableSet,
        closure: &SpalartAllmaras,
        cache: &mut DerivativeCache,
    ) -> Self {
        let field = &vars.field;
        let rho = field.rho.clone();
        let velocity = vars.velocity();

        let mut fmass = cache.diff(&rho, TIME);
        for (i, axis) in COORDINATES.iter().enumerate() {
            fmass += cache.diff(&(rho.clone() * velocity[i].clone()), axis);
        }

        let momentum: [Expr; 3] = std::array::from_fn(|i| {
            let rho_ui = rho.clone() * velocity[i].clone();
            let mut f = cache.diff(&rho_ui, TIME);
            for (j, axis) in COORDINATES.iter().enumerate() {
                f += cache.diff(&(rho_ui.clone() * velocity[j].clone()), axis);
            }
            f += cache.diff(&field.p, COORDINATES[i]);
            for (j, axis) in COORDINATES.iter().enumerate() {
                f -= cache.diff(&vars.total_stress(i, j), axis);
            }
            f
        });

        let mut fe = cache.diff(&(rho.clone() * vars.thermo.et.clone()), TIME);
        for (i, axis) in COORDINATES.iter().enumerate() {
            fe += cache.diff(&(rho.clone() * velocity[i].clone() * vars.thermo.ht.clone()), axis);
        }
        for (i, axis) in COORDINATES.iter().enumerate() {
            fe += cache.diff(&vars.total_heat_flux(i), axis);
        }
        for (i, axis) in COORDINATES.iter().enumerate() {
            let mut work = Expr::Const(0.0);
            for j in 0..3 {
                work += velocity[j].clone() * vars.total_stress(i, j);
            }
            fe -= cache.diff(&work, axis);
        }

        let rho_nuhat = rho * field.nuhat.clone();
        let mut fnuhat = cache.diff(&rho_nuhat, TIME);
        for (i, axis) in COORDINATES.iter().enumerate() {
            fnuhat += cache.diff(&(rho_nuhat.clone() * velocity[i].clone()), axis);
        }
        fnuhat -= closure.source(field, cache);

        let [fxmom, fymom, fzmom] = momentum;
        ResidualSet {
            residuals: [fmass, fxmom, fymom, fzmom, fe, fnuhat],
        }
    }

    pub fn get(&self, equation: Equation) -> &Expr {
        &self.residuals[equation as usize]
    }

    pub fn iter(&self) -> impl Iterator<Item = (Equation, &Expr)> {
        Equation::iter().zip(self.residuals.iter())
    }
}

/// Field quantities and source terms of one manufactured case.
#[derive(Debug, Clone)]
pub struct ManufacturedSolution {
    pub variables: FieldVariableSet,
    pub closure: SpalartAllmaras,
    pub residuals: ResidualSet,
}

impl ManufacturedSolution {
    pub fn derive(coefficients: &FieldCoefficients, gas: &GasModel, options: &SaOptions) -> Self {
        let start = Instant::now();
        let field = ManufacturedField::new(coefficients);
        let mut cache = DerivativeCache::new();
        let closure = SpalartAllmaras::new(&field, gas, options, &mut cache);
        let variables = FieldVariableSet::new(&field, gas, &closure, &mut cache);
        let residuals = ResidualSet::derive(&variables, &closure, &mut cache);
        for (equation, expr) in residuals.iter() {
            info!("{} derived: {} distinct nodes", equation, expr.node_count());
        }
        info!("source terms derived in {:?}", start.elapsed());
        ManufacturedSolution {
            variables,
            closure,
            residuals,
        }
    }
}
