//! Clasificación de archivos por bytes mágicos, sin confiar en la extensión.

use infer::Infer;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Image,
    Pdf,
    Audio,
    Zip,
    Unknown,
}

impl FileType {
    pub fn label(self) -> &'static str {
        match self {
            FileType::Image => "image",
            FileType::Pdf => "pdf",
            FileType::Audio => "audio",
            FileType::Zip => "zip",
            FileType::Unknown => "unknown",
        }
    }
}

/// Archivo clasificado, listo para enrutar hacia exactamente un backend.
#[derive(Clone, Debug)]
pub struct DetectedFile {
    pub path: PathBuf,
    pub file_type: FileType,
    pub blocks: Vec<String>,
}

impl DetectedFile {
    pub fn new(path: impl Into<PathBuf>, file_type: FileType) -> Self {
        Self {
            path: path.into(),
            file_type,
            blocks: Vec::new(),
        }
    }
}

/// Lee hasta 16 bytes del encabezado y clasifica por prefijos fijos.
/// Un archivo ilegible o demasiado corto se reporta como `Unknown`,
/// nunca como error.
pub fn detect_file(path: &Path) -> DetectedFile {
    let header = match read_header(path) {
        Some(bytes) => bytes,
        None => return DetectedFile::new(path, FileType::Unknown),
    };
    DetectedFile::new(path, classify_header(&header))
}

fn read_header(path: &Path) -> Option<Vec<u8>> {
    let mut file = File::open(path).ok()?;
    let mut header = [0_u8; 16];
    let got = file.read(&mut header).ok()?;
    Some(header[..got].to_vec())
}

pub fn classify_header(header: &[u8]) -> FileType {
    // JPEG
    if header.len() >= 3 && header[0] == 0xFF && header[1] == 0xD8 && header[2] == 0xFF {
        return FileType::Image;
    }
    // PNG
    if header.starts_with(&[0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A]) {
        return FileType::Image;
    }
    // WEBP (RIFF .... WEBP)
    if header.len() >= 12 && header.starts_with(b"RIFF") && &header[8..12] == b"WEBP" {
        return FileType::Image;
    }
    if header.starts_with(b"%PDF-") {
        return FileType::Pdf;
    }
    // MP3 (ID3) o FLAC
    if header.starts_with(b"ID3") || header.starts_with(b"fLaC") {
        return FileType::Audio;
    }
    // ZIP: local, central o EOCD
    if header.len() >= 4
        && header.starts_with(b"PK")
        && matches!(header[2], 3 | 5 | 7)
        && matches!(header[3], 4 | 6 | 8)
    {
        return FileType::Zip;
    }
    FileType::Unknown
}

/// Tipo MIME inferido del contenido, solo para reportes.
pub fn mime_type(path: &Path) -> Option<String> {
    let infer = Infer::new();
    infer
        .get_from_path(path)
        .ok()
        .flatten()
        .map(|kind| kind.mime_type().to_string())
}
