//! Salidas de la herramienta: tablas en consola, plan de limpieza, resumen,
//! riesgos y exportación JSON/CSV.

use crate::detect::mime_type;
use crate::formatting::{format_mtime, format_size};
use crate::hashing::file_hash;
use crate::model::{InspectionResult, Report, RiskLevel};
use crate::policy::Policy;
use crate::ui::{build_table, label_cell, risk_cell, style_risk};
use comfy_table::{Cell, Row};
use console::style;
use std::fs;
use std::path::Path;

/// Tabla de campos canónicos de un archivo. Sin campos imprime una nota en
/// lugar de una tabla vacía.
pub fn print_pretty(result: &InspectionResult) {
    println!(
        "\n{} {}",
        style(result.file.display()).bold(),
        style(format!("[{}]", result.file_type.label())).dim()
    );

    if result.fields.is_empty() {
        println!("  {}", style("(sin metadata detectada)").dim());
        return;
    }

    let mut table = build_table(&["Campo", "Valor", "Riesgo", "Bloque", "Bytes"]);
    for field in &result.fields {
        table.add_row(Row::from(vec![
            label_cell(&field.name),
            Cell::new(&field.value),
            risk_cell(field.risk),
            Cell::new(&field.block),
            Cell::new(field.bytes.to_string()),
        ]));
    }
    println!("{table}");
    println!(
        "  {} bytes de metadata en {} campos",
        result.meta_bytes,
        result.fields.len()
    );
}

/// Propiedades de archivo para el modo verboso: tamaño, fechas, MIME y hash.
pub fn print_file_details(path: &Path) {
    let mut table = build_table(&["Propiedad", "Valor"]);

    if let Ok(metadata) = fs::metadata(path) {
        table.add_row(Row::from(vec![
            label_cell("Tamaño"),
            Cell::new(format_size(metadata.len())),
        ]));
        table.add_row(Row::from(vec![
            label_cell("Última modificación"),
            Cell::new(format_mtime(metadata.modified().ok())),
        ]));
    }
    table.add_row(Row::from(vec![
        label_cell("Tipo MIME"),
        Cell::new(mime_type(path).unwrap_or_else(|| "No disponible".to_string())),
    ]));
    table.add_row(Row::from(vec![
        label_cell("SHA-256"),
        Cell::new(file_hash(path)),
    ]));

    println!("{table}");
}

/// Plan de limpieza: qué haría la política con cada campo presente, sin tocar
/// el archivo.
pub fn print_plan(result: &InspectionResult, policy: &Policy) {
    println!(
        "\nPlan para {} (política: {}):",
        style(result.file.display()).bold(),
        policy.name
    );
    if result.fields.is_empty() {
        println!("  {}", style("(sin metadata detectada)").dim());
        return;
    }
    for field in &result.fields {
        if policy.keeps(&field.name) {
            println!("  {}  {}", style("KEEP").green(), field.name);
        } else {
            println!("  {}  {}", style("DROP").red(), field.name);
        }
    }
}

/// Resumen antes/después de una limpieza.
pub fn print_summary(before: &InspectionResult, after: &InspectionResult, out_path: &Path) {
    println!(
        "Limpiado {} → {}",
        style(before.file.display()).bold(),
        out_path.display()
    );
    println!(
        "  campos antes: {} ({} bytes) | campos después: {} ({} bytes)",
        before.fields.len(),
        before.meta_bytes,
        after.fields.len(),
        after.meta_bytes
    );
}

/// Solo los campos MEDIUM/HIGH, más el veredicto global del archivo.
pub fn print_risks(result: &InspectionResult) {
    println!("\nRiesgos de {}:", style(result.file.display()).bold());
    let mut flagged = 0;
    for field in &result.fields {
        if field.risk >= RiskLevel::Medium {
            println!("  {} ({})", field.name, style_risk(field.risk));
            flagged += 1;
        }
    }
    if flagged == 0 {
        println!("  {}", style("(sin campos de riesgo)").dim());
    }
    if let Some(worst) = result.worst_risk() {
        println!("  veredicto: {}", style_risk(worst).bold());
    }
}

pub fn render_json(report: &Report) -> Result<String, String> {
    serde_json::to_string_pretty(report)
        .map_err(|error| format!("No se pudo serializar el reporte JSON: {error}"))
}

/// Exporta el reporte como CSV plano: una fila por campo canónico.
pub fn export_csv(report: &Report, path: &Path) -> Result<(), String> {
    let mut writer = csv::Writer::from_path(path)
        .map_err(|error| format!("No se pudo crear el CSV `{}`: {error}", path.display()))?;

    writer
        .write_record(["file", "name", "value", "risk", "block", "bytes"])
        .map_err(|error| format!("No se pudo escribir el CSV: {error}"))?;

    for result in &report.files {
        for field in &result.fields {
            writer
                .write_record([
                    result.file.display().to_string(),
                    field.name.clone(),
                    field.value.clone(),
                    field.risk.label().to_string(),
                    field.block.clone(),
                    field.bytes.to_string(),
                ])
                .map_err(|error| format!("No se pudo escribir el CSV: {error}"))?;
        }
    }

    writer
        .flush()
        .map_err(|error| format!("No se pudo guardar el CSV: {error}"))
}
