//! # Manufactured solution of the RANS + Spalart-Allmaras equations
//!
//! A smooth analytic flow field is substituted into the governing equations and the
//! symbolic engine differentiates it to obtain the source terms that make the field an
//! exact solution.
//!
//!# Example
//! ```
//! use RustedMMS::mms::manufactured_field::FieldCoefficients;
//! use RustedMMS::mms::residuals::{Equation, ManufacturedSolution};
//! use RustedMMS::mms::spalart_allmaras::SaOptions;
//! use RustedMMS::mms::thermo::GasModel;
//! let solution = ManufacturedSolution::derive(
//!     &FieldCoefficients::default(),
//!     &GasModel::default(),
//!     &SaOptions::default(),
//! );
//! let fmass = solution.residuals.get(Equation::Mass);
//! let value = fmass.eval_expression(&["x", "y", "z"], &[0.5, 0.5, 0.5]).unwrap();
//! println!("fmass(0.5, 0.5, 0.5) = {}", value);
//! ```
/// primitive field `rho, u, v, w, p, nuhat` built from a table of trigonometric terms
pub mod manufactured_field;
/// ideal-gas state: internal energy, temperature, total energy and enthalpy
pub mod thermo;
/// one-equation turbulence closure and its source
pub mod spalart_allmaras;
/// every named quantity of the case: stresses, heat fluxes, transport coefficients
pub mod field_variables;
/// source terms of the six conservation equations
pub mod residuals;
mod residual_tests;
