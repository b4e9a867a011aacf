//! Escaneo del EOCD y del directorio central de un ZIP, y limpieza del
//! comentario de archivo. Todo a nivel de bytes: los conteos declarados
//! nunca se confían por encima del tamaño real del buffer.

use crate::backends::{read_capped, u16_le, u32_le};
use crate::detect::{DetectedFile, FileType};
use crate::fsutil;
use crate::model::{CanonicalField, InspectionResult};
use crate::policy::Policy;
use crate::risk::risk_for;
use std::path::Path;

const SIG_EOCD: u32 = 0x0605_4b50; // fin del directorio central
const SIG_CEN: u32 = 0x0201_4b50; // encabezado de archivo en el directorio central

/// Tamaño fijo del registro EOCD sin comentario.
pub const EOCD_LEN: usize = 22;
/// Comentario máximo posible (campo de 16 bits).
const MAX_COMMENT: usize = 0x10000;

/// Registro EOCD con sus campos fijos ya interpretados.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct EocdRecord {
    pub offset: usize,
    pub disk: u16,
    pub cd_disk: u16,
    pub disk_entries: u16,
    pub total_entries: u16,
    pub cd_size: u32,
    pub cd_offset: u32,
    pub comment_len: u16,
}

impl EocdRecord {
    fn parse_at(buf: &[u8], offset: usize) -> Self {
        Self {
            offset,
            disk: u16_le(&buf[offset + 4..]),
            cd_disk: u16_le(&buf[offset + 6..]),
            disk_entries: u16_le(&buf[offset + 8..]),
            total_entries: u16_le(&buf[offset + 10..]),
            cd_size: u32_le(&buf[offset + 12..]),
            cd_offset: u32_le(&buf[offset + 16..]),
            comment_len: u16_le(&buf[offset + 20..]),
        }
    }

    /// Un registro coherente termina exactamente en el fin del archivo.
    fn is_consistent(&self, buf_len: usize) -> bool {
        self.offset + EOCD_LEN + self.comment_len as usize == buf_len
    }
}

/// Busca el EOCD barriendo hacia atrás hasta 64 KiB + 22 bytes. Entre varios
/// candidatos gana el más cercano al fin del archivo que pase la validación
/// de coherencia: un comentario hostil puede incrustar una firma señuelo.
pub fn find_eocd(buf: &[u8]) -> Option<EocdRecord> {
    if buf.len() < EOCD_LEN {
        return None;
    }
    let max_back = buf.len().min(MAX_COMMENT + EOCD_LEN);
    let mut fallback = None;

    for back in 0..max_back {
        let Some(offset) = buf.len().checked_sub(EOCD_LEN + back) else {
            break;
        };
        if u32_le(&buf[offset..]) != SIG_EOCD {
            continue;
        }
        let record = EocdRecord::parse_at(buf, offset);
        if record.is_consistent(buf.len()) {
            return Some(record);
        }
        if fallback.is_none() {
            fallback = Some(record);
        }
    }
    fallback
}

/// Agregados del directorio central: se resumen, no se enumeran, para
/// acotar la salida en archivos con muchas entradas.
#[derive(Clone, Copy, Debug, Default)]
pub struct CentralDirSummary {
    pub files_with_extra: u64,
    pub extra_bytes: u64,
    pub files_with_comment: u64,
    pub comment_bytes: u64,
}

/// Recorre hasta `total_entries` encabezados de 46 bytes desde `cd_offset`.
/// Una firma ausente o un campo variable que se saldría del buffer detiene
/// el recorrido y deja agregados parciales.
pub fn scan_central_dir(buf: &[u8], eocd: &EocdRecord) -> CentralDirSummary {
    let mut summary = CentralDirSummary::default();
    let mut pos = eocd.cd_offset as usize;
    let end = (eocd.cd_offset as usize)
        .saturating_add(eocd.cd_size as usize)
        .min(buf.len());

    for _ in 0..eocd.total_entries {
        if pos + 46 > end || u32_le(&buf[pos..]) != SIG_CEN {
            break;
        }
        let name_len = u16_le(&buf[pos + 28..]) as usize;
        let extra_len = u16_le(&buf[pos + 30..]) as usize;
        let comment_len = u16_le(&buf[pos + 32..]) as usize;

        if extra_len > 0 {
            summary.files_with_extra += 1;
            summary.extra_bytes += extra_len as u64;
        }
        if comment_len > 0 {
            summary.files_with_comment += 1;
            summary.comment_bytes += comment_len as u64;
        }

        let advance = 46 + name_len + extra_len + comment_len;
        if pos + advance > buf.len() {
            break;
        }
        pos += advance;
    }
    summary
}

pub fn zip_inspect(detected: &DetectedFile) -> InspectionResult {
    let mut result = InspectionResult::empty(&detected.path, FileType::Zip);
    let Some(buf) = read_capped(&detected.path) else {
        return result;
    };

    if let Some(eocd) = find_eocd(&buf) {
        let summary = scan_central_dir(&buf, &eocd);

        if eocd.comment_len > 0 {
            result.push_field(CanonicalField::new(
                "ZIP.Comment",
                "<archive comment>",
                risk_for("ZIP.Comment"),
                "ZIP",
                eocd.comment_len as usize,
            ));
        }
        if summary.files_with_extra > 0 {
            result.push_field(CanonicalField::new(
                "ZIP.ExtraFields",
                format!("{} files", summary.files_with_extra),
                risk_for("ZIP.ExtraFields"),
                "ZIP",
                summary.extra_bytes as usize,
            ));
        }
        if summary.files_with_comment > 0 {
            result.push_field(CanonicalField::new(
                "ZIP.FileComments",
                format!("{} files", summary.files_with_comment),
                risk_for("ZIP.FileComments"),
                "ZIP",
                summary.comment_bytes as usize,
            ));
        }
    }
    result.detected.push("central-directory".to_string());
    result
}

/// Limpia solo el comentario a nivel de archivo: escribe cero en el campo de
/// longitud (EOCD+20) y trunca el buffer a EOCD+22. Los campos extra y
/// comentarios por entrada no se tocan: modificarlos invalidaría offsets en
/// el resto del directorio central.
pub fn clear_archive_comment(buf: &mut Vec<u8>) -> bool {
    let Some(eocd) = find_eocd(buf) else {
        return false;
    };
    if eocd.comment_len == 0 {
        return false;
    }
    buf[eocd.offset + 20] = 0;
    buf[eocd.offset + 21] = 0;
    buf.truncate(eocd.offset + EOCD_LEN);
    true
}

/// Limpieza hacia `out_path`. Sin EOCD, comentario ya vacío o política que
/// conserva `ZIP.Comment` → copia verbatim (idempotente).
pub fn zip_strip_to(
    input: &Path,
    out_path: &Path,
    policy: &Policy,
) -> Result<InspectionResult, String> {
    let Some(mut buf) = read_capped(input) else {
        return Ok(InspectionResult::empty(input, FileType::Zip));
    };

    if !policy.keeps("ZIP.Comment") {
        clear_archive_comment(&mut buf);
    }
    fsutil::write_atomic(out_path, &buf)?;

    Ok(zip_inspect(&DetectedFile::new(out_path, FileType::Zip)))
}
