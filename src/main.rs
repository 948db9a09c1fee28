#![allow(non_snake_case)]
use RustedMMS::Utils::logger::init_logger;
use RustedMMS::errors::MmsResult;
use RustedMMS::study::config::StudyConfig;
use RustedMMS::study::driver::{ShellRunner, run_study};
use log::{error, info};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;

const USAGE: &str = "usage: RustedMMS <config.toml> [--only-analysis]";

fn banner() -> String {
    format!(
        "{} {} by {}",
        env!("CARGO_PKG_NAME"),
        env!("CARGO_PKG_VERSION"),
        env!("CARGO_PKG_AUTHORS")
    )
}

fn run(config_path: PathBuf, only_analysis: bool) -> MmsResult<()> {
    let mut config = StudyConfig::load(&config_path)?;
    if only_analysis {
        config.study.only_analysis = true;
    }
    init_logger(&config.logging.level, config.log_path().as_deref())?;
    info!(" \n \n {} started with config {}", banner(), config_path.display());
    let report = run_study(&config, &mut ShellRunner)?;
    for q in &report.quantities {
        info!(
            "{}: L2 order {:?}, Linf order {:?}",
            q.name(),
            q.l2.order(),
            q.linf.order()
        );
    }
    info!(" \n \n Program ended");
    Ok(())
}

fn main() -> ExitCode {
    let mut config_path = None;
    let mut only_analysis = false;
    for arg in env::args().skip(1) {
        match arg.as_str() {
            "--only-analysis" => only_analysis = true,
            "-h" | "--help" => {
                println!("{}", USAGE);
                return ExitCode::SUCCESS;
            }
            _ if config_path.is_none() => config_path = Some(PathBuf::from(&arg)),
            _ => {
                eprintln!("{}", USAGE);
                return ExitCode::FAILURE;
            }
        }
    }
    let Some(config_path) = config_path else {
        eprintln!("{}", USAGE);
        return ExitCode::FAILURE;
    };
    match run(config_path, only_analysis) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            // the logger may not be installed yet
            error!("{}", e);
            eprintln!("RustedMMS: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_names_package_and_authors() {
        let text = banner();
        assert!(text.starts_with("RustedMMS 0.1.0 by "));
        assert!(text.ends_with("Gleb Zasllavsky"));
    }
}
