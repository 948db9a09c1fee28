//! Refinement study: derive the source terms once, prepare one workspace per grid level, run
//! the solver in each and analyse the norms it reports.

use crate::analysis::convergence::ConvergenceReport;
use crate::analysis::norm_log::{gather_results, level_dir_name};
use crate::analysis::report_plot::write_report_plot;
use crate::codegen::lua_check::{check_chunk, sample_points};
use crate::codegen::lua_serializer::LuaDialect;
use crate::codegen::template::TemplateTask;
use crate::errors::{MmsError, MmsResult};
use crate::mms::residuals::ManufacturedSolution;
use crate::study::config::StudyConfig;
use crate::study::tasks::{RUN_SCRIPT, build_run_script, case_task, expression_tasks};
use log::{debug, info, warn};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::time::Instant;

const SELF_CHECK_SEED: u64 = 20_240_617;

/// Runs the solver on a prepared level workspace.
pub trait CaseRunner {
    fn run(&mut self, ncells: usize, workspace: &Path) -> MmsResult<()>;
}

/// Runs `sh run.sh` inside the workspace and waits for it.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShellRunner;

impl CaseRunner for ShellRunner {
    fn run(&mut self, ncells: usize, workspace: &Path) -> MmsResult<()> {
        let status = Command::new("sh")
            .arg(RUN_SCRIPT)
            .current_dir(workspace)
            .status()
            .map_err(|e| MmsError::io(workspace.join(RUN_SCRIPT), e))?;
        if !status.success() {
            return Err(MmsError::ExternalProcess {
                level: ncells,
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

/// Level-independent generated files and the number of points they were checked at.
#[derive(Debug, Clone)]
pub struct GeneratedCode {
    /// each task with its Lua statements
    pub files: Vec<(TemplateTask, String)>,
    pub checked_points: usize,
}

/// Re-evaluates every generated file at `points` and compares each expression target bit
/// for bit with the expression it came from.
pub fn self_check(
    files: &[(TemplateTask, String)],
    points: &[HashMap<String, f64>],
    dialect: &LuaDialect,
) -> MmsResult<()> {
    for (task, code) in files {
        let start = Instant::now();
        check_chunk(code, &task.assignments, points, dialect)?;
        debug!("{} checked in {:?}", task.output_file, start.elapsed());
    }
    Ok(())
}

/// Derives the source terms, serializes every level-independent file and self-checks the
/// result at `codegen.self_check_points` seeded points.
pub fn generate_expressions(config: &StudyConfig) -> MmsResult<GeneratedCode> {
    let options = config.sa_options()?;
    let solution = ManufacturedSolution::derive(&config.field, &config.gas, &options);
    let dialect = config.dialect();
    let mut files = Vec::new();
    for task in expression_tasks(&solution) {
        let start = Instant::now();
        let code = task.generate(&dialect)?;
        debug!(
            "{}: {} bytes of Lua generated in {:?}",
            task.output_file,
            code.len(),
            start.elapsed()
        );
        files.push((task, code));
    }
    let points = sample_points(config.codegen.self_check_points, SELF_CHECK_SEED);
    if points.is_empty() {
        warn!("codegen.self_check_points is 0, generated files are not checked");
    } else {
        self_check(&files, &points, &dialect)?;
    }
    Ok(GeneratedCode {
        files,
        checked_points: points.len(),
    })
}

/// Recreates the workspace of one level and writes every generated file and the run script
/// into it.
pub fn prepare_level(
    config: &StudyConfig,
    ncells: usize,
    generated: &[(TemplateTask, String)],
) -> MmsResult<PathBuf> {
    let workspace = config.output_dir().join(level_dir_name(ncells));
    if workspace.exists() {
        fs::remove_dir_all(&workspace).map_err(|e| MmsError::io(&workspace, e))?;
    }
    fs::create_dir_all(&workspace).map_err(|e| MmsError::io(&workspace, e))?;

    let template_dir = config.template_dir();
    for (task, code) in generated {
        task.write(&template_dir, &workspace, code)?;
    }
    case_task(config, ncells).materialize(&template_dir, &workspace, &config.dialect())?;

    let script = workspace.join(RUN_SCRIPT);
    fs::write(&script, build_run_script(&config.study)).map_err(|e| MmsError::io(&script, e))?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(&script, fs::Permissions::from_mode(0o755))
            .map_err(|e| MmsError::io(&script, e))?;
    }
    Ok(workspace)
}

/// Prepares and runs every level in order; the first failing level stops the study.
pub fn run_cases(config: &StudyConfig, runner: &mut dyn CaseRunner) -> MmsResult<()> {
    let generated = generate_expressions(config)?;
    for &n in &config.study.ncells {
        info!("Working on grid: {}x{}", n, n);
        let start = Instant::now();
        let workspace = prepare_level(config, n, &generated.files)?;
        runner.run(n, &workspace)?;
        info!("grid {}x{} finished in {:?}", n, n, start.elapsed());
    }
    Ok(())
}

/// Whole study: runs (unless `only_analysis` is set), gathers the norms, logs the observed
/// orders and writes the CSV table and the convergence figure.
pub fn run_study(config: &StudyConfig, runner: &mut dyn CaseRunner) -> MmsResult<ConvergenceReport> {
    let output_dir = config.output_dir();
    fs::create_dir_all(&output_dir).map_err(|e| MmsError::io(&output_dir, e))?;
    if config.study.only_analysis {
        info!("only_analysis is set, using the norm logs already in {}", output_dir.display());
    } else {
        run_cases(config, runner)?;
    }

    let records = gather_results(&output_dir, &config.study.ncells, &config.study.norms)?;
    let report = ConvergenceReport::analyze(&records);
    report.log_summary();
    report.write_csv(&config.csv_path())?;
    if let Err(e) = write_report_plot(&report, &config.report_path()) {
        warn!("convergence plot not written: {}", e);
    }
    Ok(report)
}
