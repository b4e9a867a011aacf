//! Políticas declarativas de conservación/eliminación sobre nombres canónicos.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Conjunto de reglas keep/drop con globs. Se construye una vez por ejecución
/// y después solo se lee; toda operación de limpieza la recibe como valor
/// explícito, nunca como estado global.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Policy {
    pub name: String,
    pub keep: Vec<String>,
    pub drop: Vec<String>,
}

impl Policy {
    /// Política por defecto: conserva solo campos inocuos y descarta el resto.
    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            keep: vec![
                "EXIF.Orientation".to_string(),
                "Image.ColorProfile".to_string(),
                "Image.DPI".to_string(),
            ],
            drop: vec!["*".to_string()],
        }
    }

    /// Política "safe": mismo conjunto keep. La lista drop explícita es
    /// redundante bajo default-deny, pero documenta qué campos persigue
    /// el preset (ver DESIGN.md).
    pub fn safe() -> Self {
        Self {
            name: "safe".to_string(),
            keep: vec![
                "EXIF.Orientation".to_string(),
                "Image.ColorProfile".to_string(),
                "Image.DPI".to_string(),
            ],
            drop: vec![
                "EXIF.GPS*".to_string(),
                "EXIF.SerialNumber".to_string(),
                "XMP.CreatorTool".to_string(),
                "XMP.History*".to_string(),
                "PDF.Author".to_string(),
                "PDF.Creator".to_string(),
                "PDF.Producer".to_string(),
                "PDF.CreationDate".to_string(),
                "PDF.ModDate".to_string(),
                "ID3.TPE1".to_string(),
                "ID3.TALB".to_string(),
                "ID3.TDRC".to_string(),
                "ZIP.Comment".to_string(),
            ],
        }
    }

    /// Decide si un campo canónico sobrevive. Orden estricto:
    /// (1) algún keep coincide → conservar;
    /// (2) si no, algún drop coincide → eliminar;
    /// (3) si no, eliminar (default-deny).
    pub fn keeps(&self, canonical: &str) -> bool {
        if self.keep.iter().any(|k| glob_match(k, canonical)) {
            return true;
        }
        if self.drop.iter().any(|d| glob_match(d, canonical)) {
            return false;
        }
        false
    }
}

/// Carga la política efectiva: preset (o archivo JSON `{name, keep, drop}`)
/// más los patrones keep/drop agregados por línea de comandos.
pub fn load_policy(
    safe: bool,
    custom_path: Option<&Path>,
    keep_cli: &[String],
    drop_cli: &[String],
) -> Result<Policy, String> {
    let mut base = match custom_path {
        Some(path) => {
            let raw = fs::read_to_string(path).map_err(|error| {
                format!("No se pudo leer la política `{}`: {error}", path.display())
            })?;
            serde_json::from_str::<Policy>(&raw).map_err(|error| {
                format!(
                    "La política `{}` no es un JSON válido: {error}",
                    path.display()
                )
            })?
        }
        None if safe => Policy::safe(),
        None => Policy::aggressive(),
    };

    base.keep.extend(keep_cli.iter().cloned());
    base.drop.extend(drop_cli.iter().cloned());
    Ok(base)
}

/// Glob mínimo: `*` calza cualquier tramo (incluso vacío), `?` un byte.
/// Backtracking lineal sobre bytes.
pub fn glob_match(pattern: &str, text: &str) -> bool {
    let pat = pattern.as_bytes();
    let txt = text.as_bytes();
    let (mut pi, mut ti) = (0_usize, 0_usize);
    let mut star: Option<usize> = None;
    let mut mark = 0_usize;

    while ti < txt.len() {
        if pi < pat.len() && (pat[pi] == txt[ti] || pat[pi] == b'?') {
            pi += 1;
            ti += 1;
        } else if pi < pat.len() && pat[pi] == b'*' {
            star = Some(pi);
            pi += 1;
            mark = ti;
        } else if let Some(star_pos) = star {
            pi = star_pos + 1;
            mark += 1;
            ti = mark;
        } else {
            return false;
        }
    }
    while pi < pat.len() && pat[pi] == b'*' {
        pi += 1;
    }
    pi == pat.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_basic_cases() {
        assert!(glob_match("EXIF.GPS*", "EXIF.GPSLatitude"));
        assert!(glob_match("*", "x"));
        assert!(!glob_match("EXIF.GPS*", "EXIF.Model"));
        assert!(glob_match("*", ""));
        assert!(glob_match("PDF.?odDate", "PDF.ModDate"));
        assert!(glob_match("a*b*c", "axxbyyc"));
        assert!(!glob_match("a*b*c", "axxbyy"));
    }

    #[test]
    fn keep_beats_drop() {
        let policy = Policy {
            name: "conflicto".to_string(),
            keep: vec!["EXIF.Orientation".to_string()],
            drop: vec!["EXIF.*".to_string()],
        };
        assert!(policy.keeps("EXIF.Orientation"));
        assert!(!policy.keeps("EXIF.Model"));
    }

    #[test]
    fn unmatched_fields_default_to_drop() {
        let policy = Policy {
            name: "vacia".to_string(),
            keep: Vec::new(),
            drop: Vec::new(),
        };
        assert!(!policy.keeps("XMP.AlgoDesconocido"));
    }

    #[test]
    fn aggressive_keeps_only_whitelist() {
        let policy = Policy::aggressive();
        assert!(policy.keeps("EXIF.Orientation"));
        assert!(!policy.keeps("EXIF.GPSLatitude"));
        assert!(!policy.keeps("PDF.Author"));
        assert!(!policy.keeps("ZIP.Comment"));
    }

    #[test]
    fn cli_overlay_extends_base() {
        let policy = load_policy(
            false,
            None,
            &["PDF.Title".to_string()],
            &[],
        )
        .unwrap();
        assert!(policy.keeps("PDF.Title"));
        assert!(!policy.keeps("PDF.Author"));
    }

    #[test]
    fn policy_file_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("politica.json");
        std::fs::write(
            &path,
            r#"{"name":"mia","keep":["PDF.*"],"drop":["*"]}"#,
        )
        .unwrap();

        let policy = load_policy(false, Some(&path), &[], &[]).unwrap();
        assert_eq!(policy.name, "mia");
        assert!(policy.keeps("PDF.Title"));
        assert!(!policy.keeps("EXIF.Model"));
    }
}
