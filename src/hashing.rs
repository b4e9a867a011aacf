//! Cálculo de SHA-256 para el modo detallado del reporte.

use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;

const HASH_SIZE_LIMIT: u64 = 32 * 1024 * 1024; // 32 MiB

/// Devuelve el hash SHA-256 del archivo o un mensaje cuando no aplica.
pub fn file_hash(path: &Path) -> String {
    let metadata = match std::fs::metadata(path) {
        Ok(metadata) => metadata,
        Err(error) => return format!("No disponible ({error})"),
    };
    if !metadata.is_file() {
        return "No aplica".to_string();
    }
    if metadata.len() > HASH_SIZE_LIMIT {
        return format!("Omitido (> {} MiB)", HASH_SIZE_LIMIT / (1024 * 1024));
    }

    let mut file = match File::open(path) {
        Ok(file) => file,
        Err(error) => return format!("No disponible ({error})"),
    };

    let mut sha256 = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(bytes_read) => sha256.update(&buffer[..bytes_read]),
            Err(error) => return format!("No disponible ({error})"),
        }
    }

    format!("{:x}", sha256.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_stable_for_same_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("datos.bin");
        std::fs::write(&path, b"contenido").unwrap();
        let first = file_hash(&path);
        let second = file_hash(&path);
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
    }
}
