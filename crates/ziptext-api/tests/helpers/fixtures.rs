//! Test fixtures: in-memory ZIP archives and multipart forms.

use axum_test::multipart::{MultipartForm, Part};
use std::io::{Cursor, Write};

/// Build a ZIP from `(path, contents)` pairs. Paths ending in `/` become directories.
pub fn build_zip(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = zip::write::FileOptions::default();
        for (path, contents) in entries {
            if path.ends_with('/') {
                zip.add_directory(*path, options)
                    .expect("Failed to add directory");
            } else {
                zip.start_file(*path, options).expect("Failed to start file");
                zip.write_all(contents).expect("Failed to write file");
            }
        }
        zip.finish().expect("Failed to finish zip");
    }
    buffer
}

/// A small project with a blocked directory and a file outside the important set.
pub fn sample_project_zip() -> Vec<u8> {
    build_zip(&[
        ("README.md", b"# Demo\n"),
        ("src/main.py", b"print('hi')\n"),
        ("node_modules/pkg/index.js", b"module.exports = 1;\n"),
        ("assets/logo.png", &[0x89, 0x50, 0x4E, 0x47]),
    ])
}

/// A stored single-file archive whose data no longer matches its CRC-32.
pub fn corrupt_checksum_zip() -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut zip = zip::ZipWriter::new(Cursor::new(&mut buffer));
        let options = zip::write::FileOptions::default()
            .compression_method(zip::CompressionMethod::Stored);
        zip.start_file("main.py", options).expect("Failed to start file");
        zip.write_all(b"print('hi')\n").expect("Failed to write file");
        zip.finish().expect("Failed to finish zip");
    }
    let name_len = u16::from_le_bytes([buffer[26], buffer[27]]) as usize;
    let extra_len = u16::from_le_bytes([buffer[28], buffer[29]]) as usize;
    buffer[30 + name_len + extra_len] ^= 0xff;
    buffer
}

pub fn zip_form(filename: &str, data: Vec<u8>) -> MultipartForm {
    let part = Part::bytes(bytes::Bytes::from(data))
        .file_name(filename.to_string())
        .mime_type("application/zip");
    MultipartForm::new().add_part("zip_file", part)
}
