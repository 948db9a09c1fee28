//! Error norms reported by the solver's post-processing step.
//!
//! For every tracked quantity `log.txt` holds a header line and a line of norms:
//!
//! ```text
//! variable= rho
//!  L1= 1.52e-04 L2= 1.94e-04 Linf= 6.50e-04 x= 0.03 y= 0.97 z= 0.5
//! ```
//!
//! The fourth and sixth whitespace-separated tokens of the second line are L2 and L∞.

use crate::errors::{MmsError, MmsResult};
use crate::study::tasks::NORM_LOG;
use log::debug;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Directory of one resolution level.
pub fn level_dir_name(ncells: usize) -> String {
    format!("{}x{}", ncells, ncells)
}

/// Norms of one quantity over all levels, coarsest first.
#[derive(Debug, Clone, PartialEq)]
pub struct NormRecord {
    pub name: String,
    pub l2: Vec<f64>,
    pub linf: Vec<f64>,
    /// grid spacing of each level
    pub dx: Vec<f64>,
}

impl NormRecord {
    pub fn new(name: &str) -> Self {
        NormRecord {
            name: name.to_string(),
            l2: Vec::new(),
            linf: Vec::new(),
            dx: Vec::new(),
        }
    }

    pub fn push(&mut self, l2: f64, linf: f64, dx: f64) {
        self.l2.push(l2);
        self.linf.push(linf);
        self.dx.push(dx);
    }

    pub fn len(&self) -> usize {
        self.dx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dx.is_empty()
    }

    /// Cells per axis of each level.
    pub fn ncells(&self) -> Vec<f64> {
        self.dx.iter().map(|dx| 1.0 / dx).collect()
    }
}

fn norm_token(tokens: &[&str], idx: usize, name: &str, path: &Path) -> MmsResult<f64> {
    let token = tokens.get(idx).ok_or_else(|| {
        MmsError::norm_log(path, format!("norm line of '{}' has only {} fields", name, tokens.len()))
    })?;
    token
        .parse::<f64>()
        .map_err(|_| MmsError::norm_log(path, format!("'{}' is not a number in the norms of '{}'", token, name)))
}

/// `(L2, L∞)` of every name in `norms` found in `text`; `path` only labels errors.
pub fn parse_norm_text(text: &str, norms: &[String], path: &Path) -> MmsResult<HashMap<String, (f64, f64)>> {
    let mut found = HashMap::new();
    let mut lines = text.lines();
    while let Some(line) = lines.next() {
        let Some((_, rest)) = line.split_once("variable=") else {
            continue;
        };
        let Some(name) = rest.split_whitespace().next() else {
            continue;
        };
        if !norms.iter().any(|n| n == name) || found.contains_key(name) {
            continue;
        }
        let values = lines
            .next()
            .ok_or_else(|| MmsError::norm_log(path, format!("no norm line after 'variable= {}'", name)))?;
        let tokens: Vec<&str> = values.split_whitespace().collect();
        let l2 = norm_token(&tokens, 3, name, path)?;
        let linf = norm_token(&tokens, 5, name, path)?;
        found.insert(name.to_string(), (l2, linf));
    }
    for name in norms {
        if !found.contains_key(name) {
            return Err(MmsError::norm_log(path, format!("no norms reported for '{}'", name)));
        }
    }
    Ok(found)
}

pub fn parse_norm_log(path: &Path, norms: &[String]) -> MmsResult<HashMap<String, (f64, f64)>> {
    let text = fs::read_to_string(path).map_err(|e| MmsError::norm_log(path, e.to_string()))?;
    parse_norm_text(&text, norms, path)
}

/// Path of the norm log of one level.
pub fn norm_log_path(output_dir: &Path, ncells: usize) -> PathBuf {
    output_dir.join(level_dir_name(ncells)).join(NORM_LOG)
}

/// Reads the norm logs of all levels into one record per tracked quantity, in the order of
/// `norms`.
pub fn gather_results(output_dir: &Path, ncells: &[usize], norms: &[String]) -> MmsResult<Vec<NormRecord>> {
    let mut records: Vec<NormRecord> = norms.iter().map(|name| NormRecord::new(name)).collect();
    for &n in ncells {
        let path = norm_log_path(output_dir, n);
        let values = parse_norm_log(&path, norms)?;
        for record in records.iter_mut() {
            let (l2, linf) = values[&record.name];
            record.push(l2, linf, 1.0 / n as f64);
        }
        debug!("norms of {} read from {}", level_dir_name(n), path.display());
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "\
Post-processing
variable= rho
 L1= 1.5e-04 L2= 2.0e-04 Linf= 6.5e-04 x= 0.1 y= 0.2 z= 0.3
variable= p
 L1= 3.0 L2= 4.0 Linf= 9.0 x= 0.1 y= 0.2 z= 0.3
variable= pressure
 L1= 1.0 L2= 1.0 Linf= 1.0
Done.
";

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_log() {
        let parsed = parse_norm_text(LOG, &names(&["rho", "p"]), Path::new("log.txt")).unwrap();
        assert_eq!(parsed["rho"], (2.0e-4, 6.5e-4));
        assert_eq!(parsed["p"], (4.0, 9.0));
    }

    #[test]
    fn test_missing_quantity_names_file_and_quantity() {
        let err = parse_norm_text(LOG, &names(&["rho", "nuhat"]), Path::new("16x16/log.txt")).unwrap_err();
        let message = err.to_string();
        assert!(message.contains("16x16/log.txt"));
        assert!(message.contains("nuhat"));
    }

    #[test]
    fn test_malformed_norm_line() {
        let text = "variable= rho\n L1= 1.0 L2= abc Linf= 2.0\n";
        assert!(parse_norm_text(text, &names(&["rho"]), Path::new("log.txt")).is_err());
        let text = "variable= rho\n L1= 1.0\n";
        assert!(parse_norm_text(text, &names(&["rho"]), Path::new("log.txt")).is_err());
        let text = "variable= rho";
        assert!(parse_norm_text(text, &names(&["rho"]), Path::new("log.txt")).is_err());
    }

    #[test]
    fn test_gather_results() {
        let dir = tempfile::tempdir().unwrap();
        for (n, l2) in [(8usize, "1.0e-2"), (16, "2.5e-3")] {
            let level = dir.path().join(level_dir_name(n));
            fs::create_dir_all(&level).unwrap();
            let text = format!("variable= T\n L1= 0.0 L2= {} Linf= 0.0\n", l2);
            fs::write(level.join(NORM_LOG), text).unwrap();
        }
        let records = gather_results(dir.path(), &[8, 16], &names(&["T"])).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].l2, vec![1.0e-2, 2.5e-3]);
        assert_eq!(records[0].linf, vec![0.0, 0.0]);
        assert_eq!(records[0].dx, vec![0.125, 0.0625]);
        assert_eq!(records[0].ncells(), vec![8.0, 16.0]);

        let missing = gather_results(dir.path(), &[8, 16, 32], &names(&["T"]));
        assert!(matches!(missing, Err(MmsError::NormLog { .. })));
    }
}
