//! Backend de audio: lectura de tags básicos ID3v2 y Vorbis (FLAC) y
//! eliminación del bloque completo de tags.

use crate::backends::read_capped;
use crate::detect::{DetectedFile, FileType};
use crate::fsutil;
use crate::model::{CanonicalField, InspectionResult};
use crate::policy::Policy;
use crate::risk::risk_for;
use std::path::Path;

/// Tag ID3v2 interpretado: campos básicos y longitud total del bloque.
#[derive(Debug, Default)]
struct Id3Tag {
    fields: Vec<(&'static str, String)>,
    total_len: usize,
}

fn synchsafe_to_u32(bytes: &[u8]) -> u32 {
    let mut value = 0_u32;
    for &b in bytes {
        value = (value << 7) | (b as u32 & 0x7F);
    }
    value
}

fn decode_id3_text(frame: &[u8]) -> Option<String> {
    if frame.is_empty() {
        return None;
    }
    let encoding = frame[0];
    let data = &frame[1..];
    match encoding {
        0 | 3 => Some(
            String::from_utf8_lossy(data)
                .trim_matches('\0')
                .trim()
                .to_string(),
        ),
        1 | 2 => {
            if data.len() < 2 {
                return None;
            }
            let utf16 = data
                .chunks_exact(2)
                .map(|chunk| u16::from_be_bytes([chunk[0], chunk[1]]))
                .collect::<Vec<_>>();
            Some(
                String::from_utf16_lossy(&utf16)
                    .trim_matches('\0')
                    .trim()
                    .to_string(),
            )
        }
        _ => None,
    }
}

fn canonical_for_frame(frame_id: &[u8]) -> Option<&'static str> {
    match frame_id {
        b"TIT2" => Some("ID3.TIT2"),
        b"TPE1" => Some("ID3.TPE1"),
        b"TALB" => Some("ID3.TALB"),
        b"TDRC" | b"TYER" => Some("ID3.TDRC"),
        _ => None,
    }
}

fn parse_id3v2(buf: &[u8]) -> Option<Id3Tag> {
    if buf.len() < 10 || !buf.starts_with(b"ID3") {
        return None;
    }
    let size = synchsafe_to_u32(&buf[6..10]) as usize;
    let end = (10 + size).min(buf.len());
    let tag_data = &buf[10..end];

    let mut tag = Id3Tag {
        total_len: 10 + size,
        ..Id3Tag::default()
    };
    let mut offset = 0;
    while offset + 10 <= tag_data.len() {
        let frame_id = &tag_data[offset..offset + 4];
        if frame_id.iter().all(|b| *b == 0) {
            break;
        }
        let frame_size = u32::from_be_bytes([
            tag_data[offset + 4],
            tag_data[offset + 5],
            tag_data[offset + 6],
            tag_data[offset + 7],
        ]) as usize;
        let frame_start = offset + 10;
        let frame_end = frame_start + frame_size;
        if frame_end > tag_data.len() {
            break;
        }
        if let Some(canonical) = canonical_for_frame(frame_id) {
            if let Some(text) = decode_id3_text(&tag_data[frame_start..frame_end]) {
                if !text.is_empty() {
                    tag.fields.push((canonical, text));
                }
            }
        }
        offset = frame_end;
    }
    Some(tag)
}

fn has_id3v1_tail(buf: &[u8]) -> bool {
    buf.len() >= 128 && &buf[buf.len() - 128..buf.len() - 125] == b"TAG"
}

/// Bloque VORBIS_COMMENT de un FLAC: campos básicos y span del bloque
/// (offset del encabezado de 4 bytes y longitud del contenido).
fn flac_vorbis_comments(buf: &[u8]) -> Option<(Vec<(&'static str, String)>, usize, usize)> {
    if !buf.starts_with(b"fLaC") {
        return None;
    }
    let mut pos = 4;
    loop {
        if pos + 4 > buf.len() {
            return None;
        }
        let is_last = buf[pos] & 0x80 != 0;
        let block_type = buf[pos] & 0x7F;
        let length = ((buf[pos + 1] as usize) << 16)
            | ((buf[pos + 2] as usize) << 8)
            | buf[pos + 3] as usize;
        if pos + 4 + length > buf.len() {
            return None;
        }
        if block_type == 4 {
            let fields = parse_vorbis_payload(&buf[pos + 4..pos + 4 + length]);
            return Some((fields, pos, length));
        }
        if is_last {
            return None;
        }
        pos += 4 + length;
    }
}

fn parse_vorbis_payload(payload: &[u8]) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    let mut cursor = payload;

    let Some(vendor_len) = read_u32_le(&mut cursor) else {
        return fields;
    };
    if cursor.len() < vendor_len as usize {
        return fields;
    }
    cursor = &cursor[vendor_len as usize..];

    let Some(count) = read_u32_le(&mut cursor) else {
        return fields;
    };
    for _ in 0..count {
        let Some(len) = read_u32_le(&mut cursor) else {
            break;
        };
        if cursor.len() < len as usize {
            break;
        }
        let entry = String::from_utf8_lossy(&cursor[..len as usize]).to_string();
        cursor = &cursor[len as usize..];
        if let Some((key, value)) = entry.split_once('=') {
            let canonical = match key.to_ascii_uppercase().as_str() {
                "TITLE" => Some("ID3.TIT2"),
                "ARTIST" => Some("ID3.TPE1"),
                "ALBUM" => Some("ID3.TALB"),
                "DATE" | "YEAR" => Some("ID3.TDRC"),
                _ => None,
            };
            if let Some(canonical) = canonical {
                if !value.trim().is_empty() {
                    fields.push((canonical, value.trim().to_string()));
                }
            }
        }
    }
    fields
}

fn read_u32_le(cursor: &mut &[u8]) -> Option<u32> {
    if cursor.len() < 4 {
        return None;
    }
    let value = u32::from_le_bytes([cursor[0], cursor[1], cursor[2], cursor[3]]);
    *cursor = &cursor[4..];
    Some(value)
}

pub fn audio_inspect(detected: &DetectedFile) -> InspectionResult {
    let mut result = InspectionResult::empty(&detected.path, FileType::Audio);
    let Some(buf) = read_capped(&detected.path) else {
        return result;
    };

    if let Some(tag) = parse_id3v2(&buf) {
        result.detected.push("ID3".to_string());
        for (canonical, value) in tag.fields {
            let bytes = value.len();
            result.push_field(CanonicalField::new(
                canonical,
                value,
                risk_for(canonical),
                "ID3",
                bytes,
            ));
        }
        return result;
    }

    if let Some((fields, _, _)) = flac_vorbis_comments(&buf) {
        result.detected.push("Vorbis".to_string());
        for (canonical, value) in fields {
            let bytes = value.len();
            result.push_field(CanonicalField::new(
                canonical,
                value,
                risk_for(canonical),
                "Vorbis",
                bytes,
            ));
        }
    }
    result
}

/// Limpieza de tags. MP3: si la política descarta algún campo presente se
/// elimina el bloque ID3v2 completo y la cola ID3v1; no se intenta reescribir
/// frame por frame. FLAC: el bloque VORBIS_COMMENT se convierte en padding
/// (mismo largo, contenido en cero) para no invalidar ningún offset.
pub fn audio_strip_to(
    input: &Path,
    out_path: &Path,
    policy: &Policy,
) -> Result<InspectionResult, String> {
    let Some(buf) = read_capped(input) else {
        return Ok(InspectionResult::empty(input, FileType::Audio));
    };

    let output = strip_audio_buffer(buf, policy);
    fsutil::write_atomic(out_path, &output)?;
    Ok(audio_inspect(&DetectedFile::new(out_path, FileType::Audio)))
}

fn strip_audio_buffer(mut buf: Vec<u8>, policy: &Policy) -> Vec<u8> {
    if let Some(tag) = parse_id3v2(&buf) {
        let any_dropped = tag.fields.iter().any(|(canonical, _)| !policy.keeps(canonical));
        if !any_dropped && !tag.fields.is_empty() {
            return buf;
        }
        let cut = tag.total_len.min(buf.len());
        let mut output = buf.split_off(cut);
        if has_id3v1_tail(&output) {
            let new_len = output.len() - 128;
            output.truncate(new_len);
        }
        return output;
    }

    if let Some((fields, block_pos, length)) = flac_vorbis_comments(&buf) {
        let any_dropped = fields.iter().any(|(canonical, _)| !policy.keeps(canonical));
        if any_dropped {
            // conserva el bit is_last, cambia el tipo a padding y borra el contenido
            buf[block_pos] = (buf[block_pos] & 0x80) | 0x01;
            for byte in &mut buf[block_pos + 4..block_pos + 4 + length] {
                *byte = 0;
            }
        }
    }
    buf
}
