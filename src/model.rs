//! Modelos compartidos: campos canónicos, resultados de inspección y reporte.

use crate::detect::FileType;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Nivel de sensibilidad de un campo canónico, independiente de la política.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Safe,
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Safe => "SAFE",
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

/// Campo de metadata normalizado. La política y el reporte solo actúan sobre
/// el nombre canónico (`PDF.Title`, `EXIF.GPSLatitude`), nunca sobre la clave
/// cruda del formato.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CanonicalField {
    pub name: String,
    pub value: String,
    pub risk: RiskLevel,
    pub block: String,
    pub bytes: usize,
}

impl CanonicalField {
    pub fn new(
        name: impl Into<String>,
        value: impl Into<String>,
        risk: RiskLevel,
        block: impl Into<String>,
        bytes: usize,
    ) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            risk,
            block: block.into(),
            bytes,
        }
    }
}

/// Resultado de inspeccionar un archivo. `meta_bytes` es la suma exacta de
/// las contribuciones en bytes de cada campo.
#[derive(Clone, Debug, Serialize)]
pub struct InspectionResult {
    pub file: PathBuf,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub detected: Vec<String>,
    pub meta_bytes: usize,
    pub fields: Vec<CanonicalField>,
    #[serde(skip)]
    pub risk_tags: Vec<String>,
}

impl InspectionResult {
    pub fn empty(file: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            file: file.into(),
            file_type,
            detected: Vec::new(),
            meta_bytes: 0,
            fields: Vec::new(),
            risk_tags: Vec::new(),
        }
    }

    pub fn push_field(&mut self, field: CanonicalField) {
        self.meta_bytes += field.bytes;
        self.fields.push(field);
    }

    /// Veredicto global: el peor riesgo entre los campos del archivo.
    pub fn worst_risk(&self) -> Option<RiskLevel> {
        self.fields.iter().map(|f| f.risk).max()
    }
}

/// Reporte agregado con la forma JSON publicada:
/// `{ "files": [ { "file", "type", "detected", "meta_bytes", "fields" } ] }`.
#[derive(Clone, Debug, Serialize)]
pub struct Report {
    pub files: Vec<InspectionResult>,
}

impl Report {
    pub fn new(files: Vec<InspectionResult>) -> Self {
        Self { files }
    }
}
