//! Template materialization: generated Lua statements are placed into the solver's script
//! frames through `$name` placeholders.
//!
//! Substitution is "safe": `$name` and `${name}` are replaced when a value is supplied and
//! left untouched otherwise, and `$$` stands for a literal `$`.

use crate::codegen::lua_serializer::{Assignment, LuaDialect, LuaSerializer};
use crate::errors::{MmsError, MmsResult};
use log::debug;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Placeholder that receives the generated statements of a task.
pub const EXPRESSIONS_PLACEHOLDER: &str = "expressions";

const PLACEHOLDER: &str = r"\$(?:(\$)|([_A-Za-z][_A-Za-z0-9]*)|\{([_A-Za-z][_A-Za-z0-9]*)\})";

/// Replaces the placeholders of `template` that have a value in `values`.
pub fn safe_substitute(template: &str, values: &HashMap<String, String>) -> MmsResult<String> {
    let re = Regex::new(PLACEHOLDER).map_err(|e| MmsError::parse(PLACEHOLDER, e.to_string()))?;
    let substituted = re.replace_all(template, |caps: &Captures| {
        if caps.get(1).is_some() {
            return "$".to_string();
        }
        let name = caps.get(2).or_else(|| caps.get(3)).map_or("", |m| m.as_str());
        match values.get(name) {
            Some(value) => value.clone(),
            None => caps[0].to_string(),
        }
    });
    Ok(substituted.into_owned())
}

/// One generated file: a template frame plus the statements filled into it.
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateTask {
    pub output_file: String,
    pub template_file: String,
    pub assignments: Vec<(String, Assignment)>,
}

impl TemplateTask {
    pub fn new(output_file: &str, template_file: &str) -> Self {
        TemplateTask {
            output_file: output_file.to_string(),
            template_file: template_file.to_string(),
            assignments: Vec::new(),
        }
    }

    pub fn assign(mut self, target: &str, value: impl Into<Assignment>) -> Self {
        self.assignments.push((target.to_string(), value.into()));
        self
    }

    /// Lua statements of the task, serialized in a session of their own.
    pub fn generate(&self, dialect: &LuaDialect) -> MmsResult<String> {
        LuaSerializer::new(dialect).serialize(&self.assignments)
    }

    /// Fills the template with already generated statements.
    pub fn fill(&self, template_dir: &Path, code: &str) -> MmsResult<String> {
        let template_path = template_dir.join(&self.template_file);
        let template =
            fs::read_to_string(&template_path).map_err(|e| MmsError::io(&template_path, e))?;
        let values = HashMap::from([(EXPRESSIONS_PLACEHOLDER.to_string(), code.to_string())]);
        safe_substitute(&template, &values)
    }

    /// Fills the template with `code` and writes the result into `workspace`, replacing any
    /// previous file.
    pub fn write(&self, template_dir: &Path, workspace: &Path, code: &str) -> MmsResult<PathBuf> {
        let text = self.fill(template_dir, code)?;
        let output_path = workspace.join(&self.output_file);
        fs::write(&output_path, text).map_err(|e| MmsError::io(&output_path, e))?;
        debug!(
            "{} written from {} ({} statements)",
            output_path.display(),
            self.template_file,
            self.assignments.len()
        );
        Ok(output_path)
    }

    /// Generates the statements and writes the filled template into `workspace`.
    pub fn materialize(
        &self,
        template_dir: &Path,
        workspace: &Path,
        dialect: &LuaDialect,
    ) -> MmsResult<PathBuf> {
        let code = self.generate(dialect)?;
        self.write(template_dir, workspace, &code)
    }
}
