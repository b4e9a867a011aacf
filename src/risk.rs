//! Clasificación estática de riesgo por nombre canónico.

use crate::model::RiskLevel;

/// Función total: todo nombre canónico recibe un nivel. Independiente de la
/// política; se usa solo para reportar.
pub fn risk_for(canonical: &str) -> RiskLevel {
    if canonical.starts_with("EXIF.GPS")
        || canonical == "PDF.CreationDate"
        || canonical == "PDF.ModDate"
    {
        return RiskLevel::High;
    }
    if canonical == "EXIF.SerialNumber"
        || canonical == "EXIF.Make"
        || canonical == "EXIF.Model"
        || canonical == "ID3.TPE1"
    {
        return RiskLevel::Medium;
    }
    if canonical == "EXIF.Orientation"
        || canonical == "Image.ColorProfile"
        || canonical == "Image.DPI"
    {
        return RiskLevel::Safe;
    }
    if canonical.starts_with("PDF.") {
        return RiskLevel::Medium;
    }
    if canonical == "ID3.TALB" {
        return RiskLevel::Medium;
    }
    RiskLevel::Low
}
