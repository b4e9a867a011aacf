//! Backend de imágenes: lectura EXIF y chunks de texto PNG, y limpieza por
//! reencodificación de los píxeles.

use crate::detect::{DetectedFile, FileType};
use crate::fsutil;
use crate::model::{CanonicalField, InspectionResult};
use crate::policy::Policy;
use crate::risk::risk_for;
use image::ImageReader;
use std::fs::{self, File};
use std::io::BufReader;
use std::path::Path;

/// Canonicalización propia del núcleo: la política nunca ve claves crudas.
fn canon_from_exif(raw: &str) -> String {
    if raw.starts_with("GPSLatitude") {
        return "EXIF.GPSLatitude".to_string();
    }
    if raw.starts_with("GPSLongitude") {
        return "EXIF.GPSLongitude".to_string();
    }
    if raw == "BodySerialNumber" {
        return "EXIF.SerialNumber".to_string();
    }
    format!("EXIF.{raw}")
}

pub fn image_inspect(detected: &DetectedFile) -> InspectionResult {
    let mut result = InspectionResult::empty(&detected.path, FileType::Image);

    let exif_fields = read_exif_fields(&detected.path);
    if !exif_fields.is_empty() {
        result.detected.push("EXIF".to_string());
        for field in exif_fields {
            result.push_field(field);
        }
    }

    let text_fields = read_png_text(&detected.path);
    if !text_fields.is_empty() {
        result.detected.push("PNG".to_string());
        for field in text_fields {
            result.push_field(field);
        }
    }

    for field in &result.fields {
        if field.name.starts_with("EXIF.GPS") {
            result.risk_tags.push("gps".to_string());
        } else if field.name == "EXIF.SerialNumber" {
            result.risk_tags.push("device_serial".to_string());
        } else if field.name == "EXIF.Model" {
            result.risk_tags.push("device_model".to_string());
        } else if field.name == "XMP.CreatorTool" || field.name == "EXIF.Software" {
            result.risk_tags.push("software".to_string());
        }
    }

    result
}

fn read_exif_fields(path: &Path) -> Vec<CanonicalField> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };
    let mut reader = BufReader::new(file);
    let exif = match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => exif,
        Err(_) => return Vec::new(),
    };

    let mut fields = Vec::new();
    for field in exif.fields() {
        if field.ifd_num == exif::In::THUMBNAIL {
            continue;
        }
        let raw_key = field.tag.to_string();
        let canonical = canon_from_exif(&raw_key);
        let value = field.display_value().to_string();
        let bytes = raw_key.len() + value.len();
        fields.push(CanonicalField::new(
            canonical.clone(),
            value,
            risk_for(&canonical),
            "EXIF",
            bytes,
        ));
    }
    fields
}

fn read_png_text(path: &Path) -> Vec<CanonicalField> {
    let file = match File::open(path) {
        Ok(file) => file,
        Err(_) => return Vec::new(),
    };
    let decoder = png::Decoder::new(BufReader::new(file));
    let reader = match decoder.read_info() {
        Ok(reader) => reader,
        Err(_) => return Vec::new(),
    };

    let mut fields = Vec::new();
    let info = reader.info();
    for chunk in &info.uncompressed_latin1_text {
        push_text_field(&mut fields, &chunk.keyword, chunk.text.clone());
    }
    for chunk in &info.utf8_text {
        if let Ok(text) = chunk.get_text() {
            push_text_field(&mut fields, &chunk.keyword, text);
        }
    }
    fields
}

fn push_text_field(fields: &mut Vec<CanonicalField>, keyword: &str, text: String) {
    if text.trim().is_empty() {
        return;
    }
    let canonical = format!("PNG.{keyword}");
    let bytes = keyword.len() + text.len();
    fields.push(CanonicalField::new(
        canonical.clone(),
        text,
        risk_for(&canonical),
        "PNG",
        bytes,
    ));
}

/// Limpieza por reencodificación: decodifica los píxeles y guarda una copia
/// sin metadata. Si la política conserva todos los campos presentes, la
/// entrada se copia verbatim. La copia limpia se verifica con una lectura
/// EXIF independiente antes de renombrar.
pub fn image_strip_to(
    input: &Path,
    out_path: &Path,
    policy: &Policy,
) -> Result<InspectionResult, String> {
    let before = image_inspect(&DetectedFile::new(input, FileType::Image));
    if !before.fields.is_empty() && before.fields.iter().all(|f| policy.keeps(&f.name)) {
        fsutil::copy_verbatim(input, out_path)?;
        return Ok(image_inspect(&DetectedFile::new(out_path, FileType::Image)));
    }

    let img = ImageReader::open(input)
        .map_err(|error| format!("No se pudo abrir la imagen `{}`: {error}", input.display()))?
        .decode()
        .map_err(|error| format!("No se pudo decodificar `{}`: {error}", input.display()))?;

    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|error| {
                format!("No se pudo crear el directorio `{}`: {error}", parent.display())
            })?;
        }
    }

    let temp = fsutil::temp_sibling(out_path);
    img.save(&temp)
        .map_err(|error| format!("No se pudo guardar la imagen limpia: {error}"))?;

    match verify_image_clean(&temp) {
        Ok(true) => {}
        Ok(false) => {
            let _ = fs::remove_file(&temp);
            return Err(
                "La verificación indicó que la metadata de la imagen no se eliminó".to_string(),
            );
        }
        Err(message) => {
            let _ = fs::remove_file(&temp);
            return Err(message);
        }
    }

    fs::rename(&temp, out_path).map_err(|error| {
        let _ = fs::remove_file(&temp);
        format!("No se pudo reemplazar `{}`: {error}", out_path.display())
    })?;

    Ok(image_inspect(&DetectedFile::new(out_path, FileType::Image)))
}

fn verify_image_clean(path: &Path) -> Result<bool, String> {
    let file = File::open(path)
        .map_err(|error| format!("No se pudo abrir la imagen limpia para verificación: {error}"))?;
    let mut reader = BufReader::new(file);

    match exif::Reader::new().read_from_container(&mut reader) {
        Ok(exif) => Ok(exif.fields().next().is_none()),
        Err(exif::Error::NotFound(_))
        | Err(exif::Error::BlankValue(_))
        | Err(exif::Error::InvalidFormat(_)) => Ok(true),
        Err(exif::Error::Io(error)) => Err(format!(
            "No se pudo leer metadata EXIF durante la verificación: {error}"
        )),
        Err(other) => Err(format!("Error verificando metadata EXIF: {other}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exif_keys_canonicalize_through_core_mapping() {
        assert_eq!(canon_from_exif("GPSLatitude"), "EXIF.GPSLatitude");
        assert_eq!(canon_from_exif("GPSLatitudeRef"), "EXIF.GPSLatitude");
        assert_eq!(canon_from_exif("BodySerialNumber"), "EXIF.SerialNumber");
        assert_eq!(canon_from_exif("Orientation"), "EXIF.Orientation");
        assert_eq!(canon_from_exif("Model"), "EXIF.Model");
    }

    #[test]
    fn inspect_of_unreadable_image_is_empty() {
        let detected = DetectedFile::new("/no/existe.jpg", FileType::Image);
        let result = image_inspect(&detected);
        assert!(result.fields.is_empty());
        assert_eq!(result.meta_bytes, 0);
    }
}
