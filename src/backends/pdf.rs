//! Localización y redacción del diccionario Info de un PDF por offsets de
//! bytes, sin tokenizador. La estrategia primaria sigue la referencia del
//! trailer; la secundaria escanea objeto por objeto.

use crate::backends::{find_bytes, find_bytes_from, read_capped, rfind_bytes};
use crate::detect::{DetectedFile, FileType};
use crate::fsutil;
use crate::model::{CanonicalField, InspectionResult};
use crate::policy::Policy;
use crate::risk::risk_for;
use lopdf::{Document, Object};
use std::fs;
use std::path::Path;

/// Claves del diccionario Info con su nombre canónico.
const INFO_KEYS: [(&[u8], &str); 6] = [
    (b"/Title", "PDF.Title"),
    (b"/Author", "PDF.Author"),
    (b"/Creator", "PDF.Creator"),
    (b"/Producer", "PDF.Producer"),
    (b"/CreationDate", "PDF.CreationDate"),
    (b"/ModDate", "PDF.ModDate"),
];

/// Span [start, end) de un diccionario `<< … >>`, incluidos los delimitadores.
/// Los valores de las claves siempre quedan dentro del span.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DictSpan {
    pub start: usize,
    pub end: usize,
}

/// Estrategias intercambiables de localización del diccionario Info. El
/// escaneo `<<`/`>>` sin balancear es una simplificación deliberada; un
/// parser real puede sustituir ambas estrategias sin tocar a los llamadores.
pub trait InfoDictLocator {
    fn locate(&self, buf: &[u8]) -> Option<DictSpan>;
}

/// Estrategia primaria: el último `trailer` (en actualizaciones
/// incrementales gana el más reciente), su `/Info N 0 R`, y el primer
/// `<< … >>` después de `N 0 obj`.
pub struct TrailerLocator;

impl InfoDictLocator for TrailerLocator {
    fn locate(&self, buf: &[u8]) -> Option<DictSpan> {
        if !buf.starts_with(b"%PDF-") {
            return None;
        }
        let trailer_pos = rfind_bytes(buf, b"trailer")?;
        let dict_start = find_bytes_from(buf, b"<<", trailer_pos)?;
        let dict_end = find_bytes_from(buf, b">>", dict_start)?;

        let info_pos = find_bytes_from(buf, b"/Info", dict_start)?;
        if info_pos > dict_end {
            return None;
        }

        let mut num_start = info_pos + 5;
        while num_start < buf.len() && !buf[num_start].is_ascii_digit() {
            num_start += 1;
        }
        let mut num_end = num_start;
        while num_end < buf.len() && buf[num_end].is_ascii_digit() {
            num_end += 1;
        }
        if num_start == num_end {
            return None;
        }
        let obj_num: u64 = std::str::from_utf8(&buf[num_start..num_end])
            .ok()?
            .parse()
            .ok()?;

        let needle = format!("{obj_num} 0 obj");
        let obj_pos = find_bytes(buf, needle.as_bytes())?;
        let span_start = find_bytes_from(buf, b"<<", obj_pos)?;
        let span_end = find_bytes_from(buf, b">>", span_start)? + 2;
        Some(DictSpan {
            start: span_start,
            end: span_end,
        })
    }
}

/// Estrategia de respaldo: primer objeto cuyo diccionario contenga alguna de
/// las seis claves canónicas.
pub struct HeuristicLocator;

impl InfoDictLocator for HeuristicLocator {
    fn locate(&self, buf: &[u8]) -> Option<DictSpan> {
        let mut pos = 0;
        loop {
            let obj_pos = find_bytes_from(buf, b" obj", pos)?;
            let dict_start = find_bytes_from(buf, b"<<", obj_pos)?;
            let dict_end = find_bytes_from(buf, b">>", dict_start)?;
            let span = DictSpan {
                start: dict_start,
                end: dict_end + 2,
            };

            let dict = &buf[span.start..span.end];
            if INFO_KEYS
                .iter()
                .any(|(key, _)| find_bytes(dict, key).is_some())
            {
                return Some(span);
            }

            let endobj = find_bytes_from(buf, b"endobj", dict_end)?;
            pos = endobj + 6;
        }
    }
}

/// Localiza el diccionario Info: trailer primero, heurística si falla.
pub fn locate_info_dict(buf: &[u8]) -> Option<DictSpan> {
    TrailerLocator
        .locate(buf)
        .filter(|span| span.end > span.start)
        .or_else(|| HeuristicLocator.locate(buf))
}

fn is_pdf_space(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\r' | b'\n' | b'\x0c' | b'\x0b' | b'\0')
}

/// Span inclusivo de una cadena literal `( … )` a partir del paréntesis de
/// apertura, respetando escapes con backslash y anidación de paréntesis.
fn literal_span(buf: &[u8], open: usize) -> Option<(usize, usize)> {
    if buf.get(open) != Some(&b'(') {
        return None;
    }
    let mut depth = 0_i32;
    let mut i = open;
    while i < buf.len() {
        match buf[i] {
            b'\\' => i += 1, // salta el byte escapado
            b'(' => depth += 1,
            b')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((open, i));
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Span inclusivo, relativo al diccionario, del valor literal de `key`
/// incluyendo sus paréntesis.
fn locate_value_span(dict: &[u8], key: &[u8]) -> Option<(usize, usize)> {
    let key_pos = find_bytes(dict, key)?;
    let mut pos = key_pos + key.len();
    while pos < dict.len() && is_pdf_space(dict[pos]) {
        pos += 1;
    }
    if pos >= dict.len() || dict[pos] != b'(' {
        return None;
    }
    literal_span(dict, pos)
}

/// Extrae las seis claves canónicas presentes en el span.
pub fn extract_fields(buf: &[u8], span: DictSpan) -> Vec<CanonicalField> {
    let dict = &buf[span.start..span.end];
    let mut fields = Vec::new();
    for (key, canonical) in INFO_KEYS {
        if let Some((start, end)) = locate_value_span(dict, key) {
            let raw = &dict[start..=end];
            let value = String::from_utf8_lossy(&raw[1..raw.len() - 1]).to_string();
            fields.push(CanonicalField::new(
                canonical,
                value,
                risk_for(canonical),
                "PDF.Info",
                key.len() + raw.len(),
            ));
        }
    }
    fields
}

pub fn pdf_inspect(detected: &DetectedFile) -> InspectionResult {
    let mut result = InspectionResult::empty(&detected.path, FileType::Pdf);
    let Some(buf) = read_capped(&detected.path) else {
        return result;
    };
    let Some(span) = locate_info_dict(&buf) else {
        return result;
    };
    result.detected.push("Info".to_string());
    for field in extract_fields(&buf, span) {
        result.push_field(field);
    }
    result
}

/// Comportamiento de la redacción de PDF.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum PdfStripMode {
    /// Vacía a `()` cada valor cuya clave la política descarta.
    #[default]
    ClearValues,
    /// Reemplaza el cuerpo completo del diccionario por `<<>>`, destruyendo
    /// también claves no estándar. Modo agresivo, explícito.
    WipeInfoDict,
}

/// Vacía en el buffer los valores descartados por la política. Los spans se
/// recolectan primero y se aplican de mayor a menor offset: cada reemplazo
/// cambia longitudes y dejaría stale cualquier offset posterior.
pub fn clear_info_values(buf: &mut Vec<u8>, span: DictSpan, policy: &Policy) -> Vec<&'static str> {
    let mut edits: Vec<(usize, usize)> = Vec::new();
    let mut dropped = Vec::new();
    {
        let dict = &buf[span.start..span.end];
        for (key, canonical) in INFO_KEYS {
            if policy.keeps(canonical) {
                continue;
            }
            if let Some((start, end)) = locate_value_span(dict, key) {
                edits.push((span.start + start, span.start + end));
                dropped.push(canonical);
            }
        }
    }

    // Un valor literal puede contener textualmente otra clave con su propio
    // valor entre paréntesis; ese span queda anidado dentro del primero y
    // vaciarlo por separado dejaría stale el offset del span externo. De
    // cada grupo solapado se aplica solo el span que empieza primero:
    // vaciarlo elimina también todo lo anidado.
    edits.sort_by_key(|edit| edit.0);
    let mut applied: Vec<(usize, usize)> = Vec::new();
    for (start, end) in edits {
        match applied.last() {
            Some(&(_, last_end)) if start <= last_end => {}
            _ => applied.push((start, end)),
        }
    }

    for (start, end) in applied.into_iter().rev() {
        buf.splice(start..=end, b"()".iter().copied());
    }
    dropped
}

/// Reemplaza el diccionario completo por `<<>>`.
pub fn wipe_info_dict(buf: &mut Vec<u8>, span: DictSpan) {
    buf.splice(span.start..span.end, b"<<>>".iter().copied());
}

/// Limpia el Info de `input` hacia `out_path` según la política. Entrada
/// ilegible o sobredimensionada → resultado vacío sin salida; sin diccionario
/// localizable → copia verbatim.
pub fn pdf_strip_to(
    input: &Path,
    out_path: &Path,
    policy: &Policy,
    mode: PdfStripMode,
) -> Result<InspectionResult, String> {
    let Some(mut buf) = read_capped(input) else {
        return Ok(InspectionResult::empty(input, FileType::Pdf));
    };

    match locate_info_dict(&buf) {
        None => fsutil::write_atomic(out_path, &buf)?,
        Some(span) => {
            let dropped = match mode {
                PdfStripMode::ClearValues => clear_info_values(&mut buf, span, policy),
                PdfStripMode::WipeInfoDict => {
                    wipe_info_dict(&mut buf, span);
                    INFO_KEYS.iter().map(|(_, canonical)| *canonical).collect()
                }
            };
            write_verified(out_path, &buf, &dropped)?;
        }
    }

    Ok(pdf_inspect(&DetectedFile::new(out_path, FileType::Pdf)))
}

/// Escribe el buffer en un temporal, verifica con un lector independiente
/// que las claves descartadas quedaron vacías y recién entonces renombra.
fn write_verified(out_path: &Path, buf: &[u8], dropped: &[&str]) -> Result<(), String> {
    if let Some(parent) = out_path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).map_err(|error| {
                format!("No se pudo crear el directorio `{}`: {error}", parent.display())
            })?;
        }
    }

    let temp = fsutil::temp_sibling(out_path);
    fs::write(&temp, buf)
        .map_err(|error| format!("No se pudo escribir `{}`: {error}", temp.display()))?;

    if let Err(message) = verify_cleared(&temp, dropped) {
        let _ = fs::remove_file(&temp);
        return Err(message);
    }

    fs::rename(&temp, out_path).map_err(|error| {
        let _ = fs::remove_file(&temp);
        format!("No se pudo reemplazar `{}`: {error}", out_path.display())
    })
}

fn verify_cleared(path: &Path, dropped: &[&str]) -> Result<(), String> {
    // Los PDF que lopdf no interpreta quedan fuera del alcance de la
    // verificación; el motor de bytes igual los maneja.
    let doc = match Document::load(path) {
        Ok(doc) => doc,
        Err(_) => return Ok(()),
    };
    let info_ref = match doc.trailer.get(b"Info") {
        Ok(info) => info,
        Err(_) => return Ok(()),
    };
    let Some(dict) = deref_dictionary(&doc, info_ref) else {
        return Ok(());
    };

    for canonical in dropped {
        let key = canonical.trim_start_matches("PDF.");
        if let Ok(obj) = dict.get(key.as_bytes()) {
            if let Some(value) = object_to_string(&doc, obj) {
                if !value.is_empty() {
                    return Err(format!(
                        "La verificación indicó que `{canonical}` sigue presente tras la limpieza"
                    ));
                }
            }
        }
    }
    Ok(())
}

fn deref_dictionary<'a>(doc: &'a Document, obj: &'a Object) -> Option<&'a lopdf::Dictionary> {
    match obj {
        Object::Reference(reference) => doc.get_dictionary(*reference).ok(),
        Object::Dictionary(dict) => Some(dict),
        _ => None,
    }
}

fn object_to_string(doc: &Document, obj: &Object) -> Option<String> {
    match obj {
        Object::String(bytes, _) => Some(String::from_utf8_lossy(bytes).trim().to_string()),
        Object::Name(name) => Some(String::from_utf8_lossy(name).trim().to_string()),
        Object::Reference(reference) => doc
            .get_object(*reference)
            .ok()
            .and_then(|inner| object_to_string(doc, inner)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_pdf() -> Vec<u8> {
        b"%PDF-1.4\n5 0 obj<</Title (Secret)/Author (Bob)>>endobj\ntrailer<</Info 5 0 R>>\n%%EOF"
            .to_vec()
    }

    #[test]
    fn trailer_locator_finds_info_dict() {
        let buf = sample_pdf();
        let span = TrailerLocator.locate(&buf).expect("span del Info");
        assert!(buf[span.start..].starts_with(b"<<"));
        assert!(buf[..span.end].ends_with(b">>"));
        let dict = &buf[span.start..span.end];
        assert!(find_bytes(dict, b"/Title").is_some());
    }

    #[test]
    fn last_trailer_wins_on_incremental_updates() {
        let mut buf = sample_pdf();
        buf.extend_from_slice(b"\n9 0 obj<</Subject (x)>>endobj\ntrailer<</Info 9 0 R>>\n");
        let span = TrailerLocator.locate(&buf).expect("span del Info");
        let dict = &buf[span.start..span.end];
        assert!(find_bytes(dict, b"/Subject").is_some());
        assert!(find_bytes(dict, b"/Title").is_none());
    }

    #[test]
    fn heuristic_locator_handles_missing_trailer() {
        let buf = b"%PDF-1.4\n1 0 obj<</Type /Page>>endobj\n2 0 obj<</Producer (Tool)>>endobj\n"
            .to_vec();
        assert!(TrailerLocator.locate(&buf).is_none());
        let span = HeuristicLocator.locate(&buf).expect("span heurístico");
        let dict = &buf[span.start..span.end];
        assert!(find_bytes(dict, b"/Producer").is_some());
    }

    #[test]
    fn extracts_title_and_author() {
        let buf = sample_pdf();
        let span = locate_info_dict(&buf).unwrap();
        let fields = extract_fields(&buf, span);
        assert_eq!(fields.len(), 2);
        assert_eq!(fields[0].name, "PDF.Title");
        assert_eq!(fields[0].value, "Secret");
        assert_eq!(fields[0].block, "PDF.Info");
        // bytes = clave + valor crudo con paréntesis
        assert_eq!(fields[0].bytes, "/Title".len() + "(Secret)".len());
        assert_eq!(fields[1].name, "PDF.Author");
        assert_eq!(fields[1].value, "Bob");
    }

    #[test]
    fn literal_strings_honor_escapes_and_nesting() {
        let buf = b"<</Title (a\\)b)/Author (x(y)z)>>".to_vec();
        let span = DictSpan {
            start: 0,
            end: buf.len(),
        };
        let fields = extract_fields(&buf, span);
        assert_eq!(fields[0].value, "a\\)b");
        assert_eq!(fields[1].value, "x(y)z");
    }

    #[test]
    fn clear_applies_edits_back_to_front() {
        let mut buf = sample_pdf();
        let span = locate_info_dict(&buf).unwrap();
        let dropped = clear_info_values(&mut buf, span, &Policy::aggressive());
        assert_eq!(dropped, vec!["PDF.Title", "PDF.Author"]);
        assert!(find_bytes(&buf, b"/Title ()").is_some());
        assert!(find_bytes(&buf, b"/Author ()").is_some());
        assert!(find_bytes(&buf, b"Secret").is_none());
        assert!(find_bytes(&buf, b"Bob").is_none());
        // la estructura circundante queda intacta
        assert!(find_bytes(&buf, b"endobj").is_some());
        assert!(find_bytes(&buf, b"trailer<</Info 5 0 R>>").is_some());
    }

    #[test]
    fn clear_respects_policy_keeps() {
        let mut buf = sample_pdf();
        let span = locate_info_dict(&buf).unwrap();
        let mut policy = Policy::aggressive();
        policy.keep.push("PDF.Title".to_string());
        let dropped = clear_info_values(&mut buf, span, &policy);
        assert_eq!(dropped, vec!["PDF.Author"]);
        assert!(find_bytes(&buf, b"(Secret)").is_some());
        assert!(find_bytes(&buf, b"Bob").is_none());
    }

    #[test]
    fn wipe_replaces_whole_dictionary() {
        let mut buf = sample_pdf();
        let span = locate_info_dict(&buf).unwrap();
        wipe_info_dict(&mut buf, span);
        assert!(find_bytes(&buf, b"5 0 obj<<>>endobj").is_some());
        assert!(find_bytes(&buf, b"Secret").is_none());
    }

    #[test]
    fn nested_literal_values_clear_without_corrupting_the_dict() {
        // el valor de /Title contiene textualmente otra clave con su propio
        // literal; debe vaciarse como un único span
        let mut buf =
            b"%PDF-1.4\n5 0 obj<</Title (/Author (xyz))>>endobj\ntrailer<</Info 5 0 R>>\n%%EOF"
                .to_vec();
        let span = locate_info_dict(&buf).unwrap();
        clear_info_values(&mut buf, span, &Policy::aggressive());

        assert!(find_bytes(&buf, b"/Title ()>>endobj").is_some());
        assert!(find_bytes(&buf, b"xyz").is_none());
        assert!(buf.ends_with(b"trailer<</Info 5 0 R>>\n%%EOF"));
    }

    #[test]
    fn nested_literal_at_end_of_buffer_does_not_overrun() {
        // sin bytes después del diccionario, un offset stale se saldría del
        // buffer
        let mut buf = b"1 0 obj<</Author (/ModDate (x))>>".to_vec();
        let span = locate_info_dict(&buf).unwrap();
        clear_info_values(&mut buf, span, &Policy::aggressive());

        assert!(buf.ends_with(b"/Author ()>>"));
        assert!(find_bytes(&buf, b"/ModDate").is_none());
    }

    #[test]
    fn clearing_twice_is_a_fixed_point() {
        let mut buf = sample_pdf();
        let span = locate_info_dict(&buf).unwrap();
        clear_info_values(&mut buf, span, &Policy::aggressive());
        let once = buf.clone();
        let span = locate_info_dict(&buf).unwrap();
        clear_info_values(&mut buf, span, &Policy::aggressive());
        assert_eq!(buf, once);
    }

    #[test]
    fn no_info_dict_yields_no_span() {
        let buf = b"%PDF-1.4\n1 0 obj<</Type /Catalog>>endobj\n%%EOF".to_vec();
        assert_eq!(locate_info_dict(&buf), None);
    }
}
