//! Formateo de tamaños y fechas para la tabla de detalles.

use chrono::{DateTime, Local};
use std::time::SystemTime;

/// Fecha de modificación en hora local, al minuto. Algunos sistemas de
/// archivos no la exponen.
pub fn format_mtime(time: Option<SystemTime>) -> String {
    let Some(time) = time else {
        return "No disponible".to_string();
    };
    let local: DateTime<Local> = time.into();
    local.format("%d/%m/%Y %H:%M").to_string()
}

/// Tamaño legible en unidades decimales.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "kB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1000.0 && unit < UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.1} {}", UNITS[unit])
    }
}
