//! The generated files of one resolution level and the script that runs the solver on them.

use crate::codegen::lua_serializer::Assignment;
use crate::codegen::template::TemplateTask;
use crate::mms::field_variables::FieldVariableSet;
use crate::mms::residuals::ManufacturedSolution;
use crate::study::config::{StudyConfig, StudySection, Threading};

pub const RUN_SCRIPT: &str = "run.sh";
/// file the post-processing step writes the error norms into
pub const NORM_LOG: &str = "log.txt";
pub const REFERENCE_SOLUTION: &str = "ref-soln.lua";

fn quoted(text: &str) -> Assignment {
    Assignment::Literal(format!("\"{}\"", text))
}

fn literal(value: impl ToString) -> Assignment {
    Assignment::Literal(value.to_string())
}

/// Source terms: one statement per conservation equation.
pub fn source_terms_task(solution: &ManufacturedSolution) -> TemplateTask {
    solution.residuals.iter().fold(
        TemplateTask::new("udf-source-terms.lua", "udf-source-template.lua"),
        |task, (equation, expr)| task.assign(equation.as_ref(), expr),
    )
}

/// Boundary values, written into the ghost-cell table.
pub fn boundary_task(vars: &FieldVariableSet) -> TemplateTask {
    let f = &vars.field;
    TemplateTask::new("udf-bc.lua", "udf-bc-template.lua")
        .assign("tab.p", &f.p)
        .assign("tab.T", &vars.thermo.T)
        .assign("tab.velx", &f.u)
        .assign("tab.vely", &f.v)
        .assign("tab.velz", &f.w)
        .assign("tab.mu_t", &vars.mu_t)
        .assign("tab.k_t", &vars.k_t)
        .assign("tab.nuhat", &f.nuhat)
}

/// Exact solution the solver measures its error against.
pub fn reference_task(vars: &FieldVariableSet) -> TemplateTask {
    let f = &vars.field;
    TemplateTask::new(REFERENCE_SOLUTION, "ref-soln-template.lua")
        .assign("tab.rho", &f.rho)
        .assign("tab.p", &f.p)
        .assign("tab.T", &vars.thermo.T)
        .assign("tab['vel.x']", &f.u)
        .assign("tab['vel.y']", &f.v)
        .assign("tab['vel.z']", &f.w)
        .assign("tab.mu_t", &vars.mu_t)
        .assign("tab.k_t", &vars.k_t)
        .assign("tab.nuhat", &f.nuhat)
}

/// Initial condition of the flow domain.
pub fn fill_task(vars: &FieldVariableSet) -> TemplateTask {
    let f = &vars.field;
    TemplateTask::new("fill-fn.lua", "fill-fn-template.lua")
        .assign("rho", &f.rho)
        .assign("p", &f.p)
        .assign("T", &vars.thermo.T)
        .assign("velx", &f.u)
        .assign("vely", &f.v)
        .assign("velz", &f.w)
        .assign("mu_t", &vars.mu_t)
        .assign("k_t", &vars.k_t)
        .assign("nuhat", &f.nuhat)
}

pub fn gas_task(vars: &FieldVariableSet) -> TemplateTask {
    TemplateTask::new("gas-model.lua", "gas-template.lua").assign("mu", &vars.mu)
}

/// Tasks whose content is the same on every level.
pub fn expression_tasks(solution: &ManufacturedSolution) -> Vec<TemplateTask> {
    let vars = &solution.variables;
    vec![
        source_terms_task(solution),
        boundary_task(vars),
        reference_task(vars),
        fill_task(vars),
        gas_task(vars),
    ]
}

/// Case script of one level: numerical options and the grid size.
pub fn case_task(config: &StudyConfig, ncells: usize) -> TemplateTask {
    let solver = &config.solver;
    TemplateTask::new("mms.lua", "mms-template.lua")
        .assign("config.flux_calculator", quoted(&solver.flux_calculator))
        .assign("config.spatial_deriv_calc", quoted(&solver.spatial_deriv_calc))
        .assign("derivLocation", quoted(&solver.spatial_deriv_locn))
        .assign("config.interpolation_order", literal(solver.interpolation_order))
        .assign("blocking", quoted(&solver.blocking))
        .assign("ncells", literal(ncells))
        .assign("explicit", literal(config.study.explicit))
        .assign("config.turbulence_model", quoted(&solver.turbulence_model))
}

/// Shell script that prepares the grid, runs the solver to steady state, writes the error
/// norms into `log.txt` and exports the solution for plotting.
pub fn build_run_script(study: &StudySection) -> String {
    let exe = &study.exe_path;
    let job = &study.job_name;
    let max_cpus = match study.threading {
        Threading::Single => " --max-cpus=1",
        Threading::Multi => "",
    };
    let mut script = format!("{}e4shared --job={} --prep\n", exe, job);
    if study.explicit {
        script.push_str(&format!("{}e4shared --job={} --run{}\n", exe, job, max_cpus));
    } else {
        script.push_str(&format!("{}e4-nk-shared --job={}{}\n", exe, job, max_cpus));
    }
    script.push_str(&format!(
        "{}e4shared --job={} --post --tindx-plot=last --ref-soln={}  --norms=\"{}\" > {}\n",
        exe,
        job,
        REFERENCE_SOLUTION,
        study.norms.join(","),
        NORM_LOG
    ));
    script.push_str(&format!(
        "{}e4shared --job={} --post --tindx-plot=all  --vtk-xml\n",
        exe, job
    ));
    script
}

