//! Rutas de salida, escritura atómica y recolección de objetivos.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use walkdir::WalkDir;

/// Deriva la ruta de salida para un archivo limpio: la misma ruta con
/// `--in-place`, o `<stem>.cleaned.<ext>` en el directorio de salida.
pub fn derive_output_path(input: &Path, out_dir: Option<&Path>, in_place: bool) -> PathBuf {
    if in_place {
        return input.to_path_buf();
    }
    let dir = out_dir
        .map(Path::to_path_buf)
        .or_else(|| input.parent().map(Path::to_path_buf))
        .unwrap_or_else(|| PathBuf::from("."));
    let stem = input.file_stem().unwrap_or_default().to_string_lossy();
    match input.extension() {
        Some(ext) => dir.join(format!("{}.cleaned.{}", stem, ext.to_string_lossy())),
        None => dir.join(format!("{stem}.cleaned")),
    }
}

/// Nombre temporal hermano de la salida, conservando la extensión para que
/// las bibliotecas que infieren el formato por extensión funcionen igual.
pub fn temp_sibling(path: &Path) -> PathBuf {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let stem = path.file_stem().unwrap_or_default().to_string_lossy();
    let extension = path.extension().unwrap_or_default().to_string_lossy();

    // Timestamp para evitar colisiones
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0);

    if extension.is_empty() {
        parent.join(format!(".{stem}_temp_{timestamp}"))
    } else {
        parent.join(format!(".{stem}_temp_{timestamp}.{extension}"))
    }
}

/// Escribe `bytes` en un temporal hermano y lo renombra sobre la salida.
/// Una escritura interrumpida nunca deja una salida parcial.
pub fn write_atomic(out_path: &Path, bytes: &[u8]) -> Result<(), String> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|error| {
                format!("No se pudo crear el directorio `{}`: {error}", parent.display())
            })?;
        }
    }

    let temp = temp_sibling(out_path);
    fs::write(&temp, bytes)
        .map_err(|error| format!("No se pudo escribir `{}`: {error}", temp.display()))?;
    fs::rename(&temp, out_path).map_err(|error| {
        let _ = fs::remove_file(&temp);
        format!("No se pudo reemplazar `{}`: {error}", out_path.display())
    })
}

/// Copia verbatim de entrada a salida, con la misma disciplina atómica.
pub fn copy_verbatim(input: &Path, out_path: &Path) -> Result<(), String> {
    if input == out_path {
        return Ok(());
    }
    let bytes = fs::read(input)
        .map_err(|error| format!("No se pudo leer `{}`: {error}", input.display()))?;
    write_atomic(out_path, &bytes)
}

/// Expande los objetivos: los archivos pasan tal cual; los directorios se
/// listan (recursivo o solo primer nivel). Entradas ilegibles se omiten.
pub fn collect_targets(targets: &[PathBuf], recursive: bool) -> Vec<PathBuf> {
    let mut collected = Vec::new();
    for target in targets {
        if target.is_dir() {
            let max_depth = if recursive { usize::MAX } else { 1 };
            for entry in WalkDir::new(target)
                .min_depth(1)
                .max_depth(max_depth)
                .sort_by_file_name()
                .into_iter()
                .filter_map(|entry| entry.ok())
            {
                if entry.file_type().is_file() {
                    collected.push(entry.into_path());
                }
            }
        } else {
            collected.push(target.clone());
        }
    }
    collected
}
