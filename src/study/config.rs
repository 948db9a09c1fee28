//! # Study configuration
//!
//! A refinement study is described by a TOML file. It is parsed into typed tables, never
//! executed, and every table rejects keys it does not know:
//!
//! ```toml
//! [study]
//! ncells = [8, 16, 32, 64]
//! norms = ["rho", "p", "T", "nuhat"]
//! exe_path = "/opt/eilmer/bin/"
//! explicit = false
//!
//! [solver]
//! flux_calculator = "ausmdv"
//!
//! [gas]
//! mu = 10.0
//!
//! [turbulence]
//! wall_distance = "1.0"
//!
//! [field]
//! amplitude_scale = 1.0
//!
//! [codegen]
//! self_check_points = 2
//!
//! [logging]
//! level = "info"
//! ```
//!
//! Only `study.ncells` and `study.norms` are required. Relative paths are resolved against
//! the directory of the configuration file.

use crate::codegen::lua_serializer::LuaDialect;
use crate::errors::{MmsError, MmsResult};
use crate::mms::manufactured_field::FieldCoefficients;
use crate::mms::spalart_allmaras::SaOptions;
use crate::mms::thermo::GasModel;
use crate::symbolic::parse_expr::parse_expression_func;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Threading {
    /// the solver is limited to one CPU
    #[default]
    Single,
    Multi,
}

fn default_job_name() -> String {
    "mms".to_string()
}
fn default_explicit() -> bool {
    true
}
fn default_template_dir() -> PathBuf {
    PathBuf::from("templates")
}
fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}
fn default_report_file() -> PathBuf {
    PathBuf::from("convergence.svg")
}
fn default_csv_file() -> PathBuf {
    PathBuf::from("norms.csv")
}

/// Resolution levels, solver invocation and outputs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudySection {
    /// cells per axis of each level, coarsest first
    pub ncells: Vec<usize>,
    /// quantities whose error norms are tracked, as the solver names them
    pub norms: Vec<String>,
    /// prefix of the solver executables, usually a directory ending in `/`
    #[serde(default)]
    pub exe_path: String,
    #[serde(default = "default_job_name")]
    pub job_name: String,
    #[serde(default = "default_explicit")]
    pub explicit: bool,
    #[serde(default)]
    pub threading: Threading,
    /// skip preparation and runs, analyse the logs already present
    #[serde(default)]
    pub only_analysis: bool,
    #[serde(default = "default_template_dir")]
    pub template_dir: PathBuf,
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_report_file")]
    pub report_file: PathBuf,
    #[serde(default = "default_csv_file")]
    pub csv_file: PathBuf,
}

/// Numerical options written into the solver's case script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SolverSection {
    pub flux_calculator: String,
    pub spatial_deriv_calc: String,
    pub spatial_deriv_locn: String,
    pub interpolation_order: u32,
    pub blocking: String,
    pub turbulence_model: String,
}

impl Default for SolverSection {
    fn default() -> Self {
        SolverSection {
            flux_calculator: "ausmdv".to_string(),
            spatial_deriv_calc: "least_squares".to_string(),
            spatial_deriv_locn: "cells".to_string(),
            interpolation_order: 2,
            blocking: "single".to_string(),
            turbulence_model: "spalart_allmaras".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TurbulenceSection {
    /// distance to the nearest wall as an expression of `x, y, z`
    pub wall_distance: String,
    pub negative_shat_correction: bool,
}

impl Default for TurbulenceSection {
    fn default() -> Self {
        TurbulenceSection {
            wall_distance: "1.0".to_string(),
            negative_shat_correction: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodegenSection {
    /// name of the minimum function in the solver's Lua environment
    pub min_function: String,
    /// random points at which generated chunks are re-evaluated; 0 disables the check
    pub self_check_points: usize,
}

impl Default for CodegenSection {
    fn default() -> Self {
        CodegenSection {
            min_function: "min".to_string(),
            self_check_points: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingSection {
    /// `debug`, `info`, `warn`, `error` or `off`
    pub level: String,
    /// log file; a time-stamped name is used when absent
    pub file: Option<PathBuf>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        LoggingSection {
            level: "info".to_string(),
            file: None,
        }
    }
}

/// Whole configuration of a refinement study.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StudyConfig {
    pub study: StudySection,
    #[serde(default)]
    pub solver: SolverSection,
    #[serde(default)]
    pub gas: GasModel,
    #[serde(default)]
    pub turbulence: TurbulenceSection,
    #[serde(default)]
    pub field: FieldCoefficients,
    #[serde(default)]
    pub codegen: CodegenSection,
    #[serde(default)]
    pub logging: LoggingSection,
    /// directory relative paths are resolved against
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl StudyConfig {
    /// Reads, parses and validates a configuration file.
    pub fn load(path: &Path) -> MmsResult<Self> {
        let text = fs::read_to_string(path).map_err(|e| MmsError::io(path, e))?;
        let mut config = Self::from_toml_str(&text)?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        Ok(config)
    }

    /// Parses and validates configuration text; relative paths stay relative to the
    /// working directory.
    pub fn from_toml_str(text: &str) -> MmsResult<Self> {
        let mut config: StudyConfig = toml::from_str(text).map_err(|e| MmsError::Config(e.to_string()))?;
        config.base_dir = PathBuf::from(".");
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> MmsResult<()> {
        let study = &self.study;
        if study.ncells.is_empty() {
            return Err(MmsError::Config("study.ncells must list at least one level".to_string()));
        }
        if study.ncells.contains(&0) {
            return Err(MmsError::Config("study.ncells must be positive".to_string()));
        }
        if !study.ncells.windows(2).all(|w| w[0] < w[1]) {
            return Err(MmsError::Config(format!(
                "study.ncells must be strictly ascending, got {:?}",
                study.ncells
            )));
        }
        if study.norms.is_empty() {
            return Err(MmsError::Config("study.norms must name at least one quantity".to_string()));
        }
        if study.job_name.trim().is_empty() {
            return Err(MmsError::Config("study.job_name must not be empty".to_string()));
        }
        self.gas.validate().map_err(MmsError::Config)?;
        if !(self.field.length > 0.0) {
            return Err(MmsError::Config(format!(
                "field.length must be positive, got {}",
                self.field.length
            )));
        }
        if self.codegen.min_function.trim().is_empty() {
            return Err(MmsError::Config("codegen.min_function must not be empty".to_string()));
        }
        parse_expression_func(&self.turbulence.wall_distance)
            .map_err(|e| MmsError::Config(format!("turbulence.wall_distance: {}", e)))?;
        Ok(())
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.base_dir.join(path)
        }
    }

    pub fn template_dir(&self) -> PathBuf {
        self.resolve(&self.study.template_dir)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.resolve(&self.study.output_dir)
    }

    pub fn report_path(&self) -> PathBuf {
        self.output_dir().join(&self.study.report_file)
    }

    pub fn csv_path(&self) -> PathBuf {
        self.output_dir().join(&self.study.csv_file)
    }

    pub fn log_path(&self) -> Option<PathBuf> {
        self.logging.file.as_ref().map(|file| self.resolve(file))
    }

    /// Turbulence-model options with the wall distance parsed.
    pub fn sa_options(&self) -> MmsResult<SaOptions> {
        Ok(SaOptions {
            wall_distance: parse_expression_func(&self.turbulence.wall_distance)?,
            negative_shat_correction: self.turbulence.negative_shat_correction,
        })
    }

    pub fn dialect(&self) -> LuaDialect {
        LuaDialect {
            min_function: self.codegen.min_function.clone(),
        }
    }
}
