//! Orquestación de inspección y limpieza: detecta el tipo y enruta hacia
//! exactamente un backend.

use crate::backends::audio::{audio_inspect, audio_strip_to};
use crate::backends::image::{image_inspect, image_strip_to};
use crate::backends::pdf::{pdf_inspect, pdf_strip_to, PdfStripMode};
use crate::backends::zip::{zip_inspect, zip_strip_to};
use crate::detect::{detect_file, DetectedFile, FileType};
use crate::fsutil;
use crate::model::InspectionResult;
use crate::policy::Policy;
use std::path::Path;

/// Opciones de limpieza que no pertenecen a la política.
#[derive(Clone, Copy, Debug, Default)]
pub struct StripOptions {
    pub pdf_mode: PdfStripMode,
}

/// Inspección de solo lectura. Nunca modifica el archivo.
pub fn inspect(path: &Path) -> InspectionResult {
    let detected = detect_file(path);
    inspect_detected(&detected)
}

pub fn inspect_detected(detected: &DetectedFile) -> InspectionResult {
    match detected.file_type {
        FileType::Image => image_inspect(detected),
        FileType::Pdf => pdf_inspect(detected),
        FileType::Audio => audio_inspect(detected),
        FileType::Zip => zip_inspect(detected),
        FileType::Unknown => InspectionResult::empty(&detected.path, FileType::Unknown),
    }
}

/// Limpia `input` hacia `out_path` según la política. Los tipos desconocidos
/// se copian verbatim: la herramienta nunca inventa transformaciones para
/// formatos que no entiende.
pub fn strip_to(
    input: &Path,
    out_path: &Path,
    policy: &Policy,
    options: StripOptions,
) -> Result<InspectionResult, String> {
    let detected = detect_file(input);
    match detected.file_type {
        FileType::Image => image_strip_to(input, out_path, policy),
        FileType::Pdf => pdf_strip_to(input, out_path, policy, options.pdf_mode),
        FileType::Audio => audio_strip_to(input, out_path, policy),
        FileType::Zip => zip_strip_to(input, out_path, policy),
        FileType::Unknown => {
            fsutil::copy_verbatim(input, out_path)?;
            Ok(InspectionResult::empty(out_path, FileType::Unknown))
        }
    }
}
