//! Backends por formato: cada uno convierte claves crudas en campos
//! canónicos y aplica la redacción que su contenedor permite.

pub mod audio;
pub mod image;
pub mod pdf;
pub mod zip;

use std::fs;
use std::path::Path;

/// Tope de lectura compartido por los backends que cargan el archivo
/// completo en memoria.
pub const MAX_INPUT_BYTES: u64 = 256 * 1024 * 1024; // 256 MiB

/// Lee el archivo completo. Ilegible, vacío o sobredimensionado → `None`;
/// el llamador lo degrada a "sin metadata", nunca a error.
pub(crate) fn read_capped(path: &Path) -> Option<Vec<u8>> {
    let metadata = fs::metadata(path).ok()?;
    if metadata.len() == 0 || metadata.len() > MAX_INPUT_BYTES {
        return None;
    }
    fs::read(path).ok()
}

pub(crate) fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

pub(crate) fn find_bytes_from(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    find_bytes(&haystack[from..], needle).map(|pos| pos + from)
}

pub(crate) fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    haystack
        .windows(needle.len())
        .rposition(|window| window == needle)
}

pub(crate) fn u16_le(bytes: &[u8]) -> u16 {
    u16::from_le_bytes([bytes[0], bytes[1]])
}

pub(crate) fn u32_le(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_search_helpers() {
        let hay = b"abc obj endobj obj";
        assert_eq!(find_bytes(hay, b"obj"), Some(4));
        assert_eq!(find_bytes_from(hay, b"obj", 5), Some(11));
        assert_eq!(rfind_bytes(hay, b"obj"), Some(15));
        assert_eq!(find_bytes(hay, b"zzz"), None);
        assert_eq!(find_bytes_from(hay, b"obj", 100), None);
    }
}
