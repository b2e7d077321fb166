//! `simform config` - show resolved paths and settings

use crate::cli::output::{print_json, print_table};
use anyhow::Result;
use serde::Serialize;
use simform::config::{config_path, logs_dir, simform_home, SimformConfig};
use std::path::PathBuf;

#[derive(Debug)]
pub struct ConfigArgs {
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ConfigReport {
    home: PathBuf,
    config_file: PathBuf,
    config_file_exists: bool,
    logs_dir: PathBuf,
    settings: SimformConfig,
}

pub fn run(args: ConfigArgs) -> Result<()> {
    let config_file = config_path();
    let report = ConfigReport {
        home: simform_home(),
        config_file_exists: config_file.exists(),
        config_file,
        logs_dir: logs_dir(),
        settings: SimformConfig::load()?,
    };

    if args.json {
        return print_json(&report);
    }

    let display = |path: &Option<PathBuf>| {
        path.as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string())
    };
    let rows = vec![
        vec!["home".to_string(), report.home.display().to_string()],
        vec![
            "config file".to_string(),
            format!(
                "{}{}",
                report.config_file.display(),
                if report.config_file_exists { "" } else { " (missing)" }
            ),
        ],
        vec!["logs".to_string(), report.logs_dir.display().to_string()],
        vec!["schema".to_string(), display(&report.settings.schema)],
        vec!["models".to_string(), display(&report.settings.models)],
        vec![
            "load delay".to_string(),
            format!("{} ms", report.settings.load_delay_ms),
        ],
    ];
    print_table(&["SETTING", "VALUE"], rows);
    Ok(())
}
