//! Flujo completo de limpieza sobre archivos reales en disco.

use metalens::backends::pdf::PdfStripMode;
use metalens::policy::Policy;
use metalens::sanitize::{inspect, strip_to, StripOptions};
use std::fs::{self, File};
use std::io::Write;
use tempfile::tempdir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

fn sample_pdf() -> Vec<u8> {
    b"%PDF-1.4\n\
5 0 obj<</Title (Informe Secreto)/Author (Bob)/Producer (WordStar 4.0)>>endobj\n\
trailer<</Size 6/Info 5 0 R>>\nstartxref\n0\n%%EOF"
        .to_vec()
}

fn create_sample_zip(path: &std::path::Path) -> Result<(), Box<dyn std::error::Error>> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::<'_, ()>::default().compression_method(CompressionMethod::Stored);
    writer.start_file("hola.txt", options)?;
    writer.write_all(b"hola mundo")?;
    writer.set_comment("comentario confidencial");
    writer.finish()?;
    Ok(())
}

#[test]
fn pdf_strip_clears_dropped_values() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("doc.pdf");
    fs::write(&input, sample_pdf())?;

    let before = inspect(&input);
    assert!(
        before
            .fields
            .iter()
            .any(|f| f.name == "PDF.Title" && f.value == "Informe Secreto")
    );

    let out = dir.path().join("doc.cleaned.pdf");
    let after = strip_to(&input, &out, &Policy::aggressive(), StripOptions::default())?;

    let cleaned = fs::read(&out)?;
    assert!(!cleaned.windows(15).any(|w| w == b"Informe Secreto"));
    assert!(!cleaned.windows(3).any(|w| w == b"Bob"));
    // las claves siguen presentes, los valores quedan vacíos
    assert!(after.fields.iter().all(|f| f.value.is_empty()));

    // punto fijo: una segunda pasada no cambia ni un byte
    let out2 = dir.path().join("doc.cleaned2.pdf");
    strip_to(&out, &out2, &Policy::aggressive(), StripOptions::default())?;
    assert_eq!(fs::read(&out)?, fs::read(&out2)?);
    Ok(())
}

#[test]
fn pdf_strip_honors_keep_patterns() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("doc.pdf");
    fs::write(&input, sample_pdf())?;

    let mut policy = Policy::aggressive();
    policy.keep.push("PDF.Title".to_string());

    let out = dir.path().join("doc.cleaned.pdf");
    let after = strip_to(&input, &out, &policy, StripOptions::default())?;

    assert!(
        after
            .fields
            .iter()
            .any(|f| f.name == "PDF.Title" && f.value == "Informe Secreto")
    );
    assert!(
        after
            .fields
            .iter()
            .all(|f| f.name == "PDF.Title" || f.value.is_empty())
    );
    Ok(())
}

#[test]
fn pdf_wipe_mode_empties_the_dictionary() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("doc.pdf");
    fs::write(&input, sample_pdf())?;

    let out = dir.path().join("doc.cleaned.pdf");
    let options = StripOptions {
        pdf_mode: PdfStripMode::WipeInfoDict,
    };
    strip_to(&input, &out, &Policy::aggressive(), options)?;

    let cleaned = fs::read(&out)?;
    assert!(!cleaned.windows(6).any(|w| w == b"/Title"));
    assert!(inspect(&out).fields.is_empty());
    Ok(())
}

#[test]
fn zip_strip_removes_comment_and_preserves_entries() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("paquete.zip");
    create_sample_zip(&input)?;

    let before = inspect(&input);
    assert!(before.fields.iter().any(|f| f.name == "ZIP.Comment"));

    let out = dir.path().join("paquete.cleaned.zip");
    let after = strip_to(&input, &out, &Policy::aggressive(), StripOptions::default())?;
    assert!(!after.fields.iter().any(|f| f.name == "ZIP.Comment"));

    // el archivo sigue siendo un ZIP válido con su contenido intacto
    let mut archive = ZipArchive::new(File::open(&out)?)?;
    assert!(archive.comment().is_empty());
    let mut contents = String::new();
    std::io::Read::read_to_string(&mut archive.by_name("hola.txt")?, &mut contents)?;
    assert_eq!(contents, "hola mundo");

    // idempotente: sin comentario, la segunda pasada copia verbatim
    let out2 = dir.path().join("paquete.cleaned2.zip");
    strip_to(&out, &out2, &Policy::aggressive(), StripOptions::default())?;
    assert_eq!(fs::read(&out)?, fs::read(&out2)?);
    Ok(())
}

#[test]
fn zip_strip_respects_policy_that_keeps_the_comment() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("paquete.zip");
    create_sample_zip(&input)?;

    let mut policy = Policy::aggressive();
    policy.keep.push("ZIP.Comment".to_string());

    let out = dir.path().join("paquete.cleaned.zip");
    strip_to(&input, &out, &policy, StripOptions::default())?;
    assert_eq!(fs::read(&input)?, fs::read(&out)?);
    Ok(())
}

#[test]
fn mp3_strip_drops_the_id3_block() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("tema.mp3");

    // ID3v2.4 mínimo con un frame TPE1 en UTF-8
    let artist = b"Artista";
    let mut frame = Vec::new();
    frame.extend_from_slice(b"TPE1");
    frame.extend_from_slice(&((artist.len() as u32 + 1).to_be_bytes()));
    frame.extend_from_slice(&[0, 0]);
    frame.push(3);
    frame.extend_from_slice(artist);

    let mut buf = Vec::new();
    buf.extend_from_slice(b"ID3\x04\x00\x00");
    buf.extend_from_slice(&[0, 0, 0, frame.len() as u8]);
    buf.extend_from_slice(&frame);
    buf.extend_from_slice(&[0xFF, 0xFB, 0x90, 0x00]);
    fs::write(&input, &buf)?;

    let before = inspect(&input);
    assert!(
        before
            .fields
            .iter()
            .any(|f| f.name == "ID3.TPE1" && f.value == "Artista")
    );

    let out = dir.path().join("tema.cleaned.mp3");
    let after = strip_to(&input, &out, &Policy::aggressive(), StripOptions::default())?;
    assert!(after.fields.is_empty());

    let cleaned = fs::read(&out)?;
    assert!(cleaned.starts_with(&[0xFF, 0xFB]));
    Ok(())
}
