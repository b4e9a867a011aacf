//! Implementación de los subcomandos. Los errores por archivo se reportan y
//! no interrumpen el lote; el código de salida refleja si hubo fallas.

use crate::backends::pdf::PdfStripMode;
use crate::cli::{OutputFormat, PolicyArgs};
use crate::fsutil;
use crate::model::Report;
use crate::policy::{self, Policy};
use crate::report;
use crate::sanitize::{self, StripOptions};
use crate::ui;
use console::style;
use std::fs;
use std::path::{Path, PathBuf};

pub fn run_inspect(
    targets: &[PathBuf],
    recursive: bool,
    format: OutputFormat,
    report_path: Option<&Path>,
    verbose: u8,
) -> Result<(), String> {
    let files = fsutil::collect_targets(targets, recursive);
    if files.is_empty() {
        return Err("No se encontró ningún archivo para inspeccionar".to_string());
    }

    if format == OutputFormat::Pretty {
        ui::render_header("MetaLens · Inspección de metadata");
    }

    let mut results = Vec::new();
    for path in &files {
        let result = sanitize::inspect(path);
        if format == OutputFormat::Pretty {
            report::print_pretty(&result);
            if verbose > 0 {
                report::print_file_details(path);
            }
        }
        results.push(result);
    }

    let aggregated = Report::new(results);
    if format == OutputFormat::Json {
        println!("{}", report::render_json(&aggregated)?);
    }
    if let Some(path) = report_path {
        write_report(&aggregated, path)?;
    }
    Ok(())
}

pub struct StripArgs {
    pub recursive: bool,
    pub out_dir: Option<PathBuf>,
    pub in_place: bool,
    pub dry_run: bool,
    pub wipe_info: bool,
    pub report: Option<PathBuf>,
}

pub fn run_strip(
    targets: &[PathBuf],
    args: &StripArgs,
    policy_args: &PolicyArgs,
) -> Result<(), String> {
    let policy = load_policy(policy_args)?;
    let files = fsutil::collect_targets(targets, args.recursive);
    if files.is_empty() {
        return Err("No se encontró ningún archivo para limpiar".to_string());
    }

    let options = StripOptions {
        pdf_mode: if args.wipe_info {
            PdfStripMode::WipeInfoDict
        } else {
            PdfStripMode::ClearValues
        },
    };

    let mut results = Vec::new();
    let mut failures = 0_usize;
    for path in &files {
        let before = sanitize::inspect(path);
        if args.dry_run {
            report::print_plan(&before, &policy);
            continue;
        }

        let out = fsutil::derive_output_path(path, args.out_dir.as_deref(), args.in_place);
        match sanitize::strip_to(path, &out, &policy, options) {
            Ok(after) => {
                report::print_summary(&before, &after, &out);
                results.push(after);
            }
            Err(message) => {
                eprintln!(
                    "{} `{}`: {message}",
                    style("metalens:").red().bold(),
                    path.display()
                );
                failures += 1;
            }
        }
    }

    if let Some(path) = &args.report {
        write_report(&Report::new(results), path)?;
    }
    if failures > 0 {
        return Err(format!("{failures} archivo(s) no se pudieron limpiar"));
    }
    Ok(())
}

pub fn run_explain(target: &Path) -> Result<(), String> {
    let result = sanitize::inspect(target);
    report::print_risks(&result);
    Ok(())
}

pub fn run_policy(name: Option<&str>) -> Result<(), String> {
    match name {
        None => {
            println!("Políticas integradas: aggressive (por defecto), safe.");
            println!("Use --safe, --policy FILE o --keep/--drop en `strip`.");
            Ok(())
        }
        Some(name) => {
            let policy = match name {
                "aggressive" => Policy::aggressive(),
                "safe" => Policy::safe(),
                other => return Err(format!("Política integrada desconocida: `{other}`")),
            };
            let json = serde_json::to_string_pretty(&policy)
                .map_err(|error| format!("No se pudo serializar la política: {error}"))?;
            println!("{json}");
            Ok(())
        }
    }
}

fn load_policy(args: &PolicyArgs) -> Result<Policy, String> {
    policy::load_policy(args.safe, args.policy.as_deref(), &args.keep, &args.drop)
}

/// El formato del reporte sale de la extensión: `.csv` → CSV, el resto JSON.
fn write_report(aggregated: &Report, path: &Path) -> Result<(), String> {
    let is_csv = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if is_csv {
        report::export_csv(aggregated, path)
    } else {
        let json = report::render_json(aggregated)?;
        fs::write(path, json)
            .map_err(|error| format!("No se pudo guardar el reporte `{}`: {error}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_builtin_policy_is_an_error() {
        assert!(run_policy(Some("inexistente")).is_err());
        assert!(run_policy(Some("safe")).is_ok());
        assert!(run_policy(None).is_ok());
    }

    #[test]
    fn report_extension_selects_csv() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("salida.CSV");
        let json_path = dir.path().join("salida.json");
        let aggregated = Report::new(Vec::new());

        write_report(&aggregated, &csv_path).unwrap();
        write_report(&aggregated, &json_path).unwrap();

        let csv = fs::read_to_string(&csv_path).unwrap();
        assert!(csv.starts_with("file,name,value,risk,block,bytes"));
        let json = fs::read_to_string(&json_path).unwrap();
        assert!(json.contains("\"files\""));
    }

    #[test]
    fn strip_with_no_files_fails() {
        let args = StripArgs {
            recursive: false,
            out_dir: None,
            in_place: false,
            dry_run: true,
            wipe_info: false,
            report: None,
        };
        let policy_args = PolicyArgs {
            safe: false,
            policy: None,
            keep: Vec::new(),
            drop: Vec::new(),
        };
        let empty_dir = tempfile::tempdir().unwrap();
        let result = run_strip(&[empty_dir.path().to_path_buf()], &args, &policy_args);
        assert!(result.is_err());
    }
}
