//! Text extraction from uploaded files, dispatched on the filename extension.

use crate::error::ExtractError;
use std::fs;
use std::path::Path;

/// Turns a file into plain text. Implementations are synchronous; callers run
/// them on the blocking pool.
pub trait TextExtractor: Send + Sync {
    fn extract_text(&self, path: &Path, filename: &str) -> Result<String, ExtractError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Pdf,
    Docx,
    Spreadsheet,
    PlainText,
    Unknown,
}

impl Format {
    pub fn from_filename(filename: &str) -> Self {
        let ext = Path::new(filename)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "pdf" => Format::Pdf,
            "docx" => Format::Docx,
            "xlsx" | "xls" | "xlsm" | "ods" => Format::Spreadsheet,
            "txt" | "md" | "csv" | "log" => Format::PlainText,
            _ => Format::Unknown,
        }
    }
}

/// Extractor backed by the local filesystem.
#[derive(Debug, Default, Clone)]
pub struct FileExtractor;

impl TextExtractor for FileExtractor {
    fn extract_text(&self, path: &Path, filename: &str) -> Result<String, ExtractError> {
        let text = match Format::from_filename(filename) {
            Format::Pdf => pdf_text(path, filename)?,
            Format::Docx => docx_text(path, filename)?,
            Format::Spreadsheet => spreadsheet_text(path, filename)?,
            Format::PlainText => {
                let bytes = fs::read(path).map_err(|e| ExtractError::failed(filename, e))?;
                decode_lossy(&bytes)
            }
            Format::Unknown => sniffed_text(path, filename)?,
        };
        tracing::debug!(filename, chars = text.chars().count(), "extracted text");
        Ok(text.trim().to_string())
    }
}

fn decode_lossy(bytes: &[u8]) -> String {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}

/// Unknown extension: accept only content that is genuinely text.
fn sniffed_text(path: &Path, filename: &str) -> Result<String, ExtractError> {
    let bytes = fs::read(path).map_err(|e| ExtractError::failed(filename, e))?;
    if let Some(kind) = infer::get(&bytes) {
        if kind.matcher_type() != infer::MatcherType::Text {
            return Err(ExtractError::UnsupportedFormat(format!(
                "{} ({})",
                filename,
                kind.mime_type()
            )));
        }
    }
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(&bytes[..]);
    match std::str::from_utf8(bytes) {
        Ok(text) => Ok(text.to_string()),
        Err(_) => Err(ExtractError::UnsupportedFormat(filename.to_string())),
    }
}

#[cfg(feature = "pdf")]
fn pdf_text(path: &Path, filename: &str) -> Result<String, ExtractError> {
    pdf_extract::extract_text(path).map_err(|e| ExtractError::failed(filename, e))
}

#[cfg(not(feature = "pdf"))]
fn pdf_text(_path: &Path, filename: &str) -> Result<String, ExtractError> {
    Err(ExtractError::UnsupportedFormat(format!(
        "{} (pdf support not enabled)",
        filename
    )))
}

#[cfg(feature = "office")]
fn docx_text(path: &Path, filename: &str) -> Result<String, ExtractError> {
    use quick_xml::events::Event;
    use std::io::Read;

    let file = fs::File::open(path).map_err(|e| ExtractError::failed(filename, e))?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| ExtractError::failed(filename, e))?;
    let mut xml = String::new();
    archive
        .by_name("word/document.xml")
        .map_err(|e| ExtractError::failed(filename, e))?
        .read_to_string(&mut xml)
        .map_err(|e| ExtractError::failed(filename, e))?;

    let mut reader = quick_xml::Reader::from_str(&xml);
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut in_run_text = false;
    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.name().as_ref() == b"w:t" => in_run_text = true,
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:tab" => paragraph.push('\t'),
                b"w:br" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_run_text => {
                let text = t.unescape().map_err(|e| ExtractError::failed(filename, e))?;
                paragraph.push_str(&text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:t" => in_run_text = false,
                b"w:p" => {
                    if !paragraph.trim().is_empty() {
                        out.push_str(&paragraph);
                        out.push('\n');
                    }
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::failed(filename, e)),
            _ => {}
        }
    }
    Ok(out)
}

#[cfg(not(feature = "office"))]
fn docx_text(_path: &Path, filename: &str) -> Result<String, ExtractError> {
    Err(ExtractError::UnsupportedFormat(format!(
        "{} (office support not enabled)",
        filename
    )))
}

#[cfg(feature = "office")]
fn spreadsheet_text(path: &Path, filename: &str) -> Result<String, ExtractError> {
    use calamine::Reader;

    let mut workbook =
        calamine::open_workbook_auto(path).map_err(|e| ExtractError::failed(filename, e))?;
    let mut out = String::new();
    for (sheet, range) in workbook.worksheets() {
        out.push_str(&format!("[{}]\n", sheet));
        for row in range.rows() {
            let cells: Vec<String> = row.iter().map(|c| c.to_string()).collect();
            if cells.iter().all(|c| c.trim().is_empty()) {
                continue;
            }
            out.push_str(&cells.join("\t"));
            out.push('\n');
        }
    }
    Ok(out)
}

#[cfg(not(feature = "office"))]
fn spreadsheet_text(_path: &Path, filename: &str) -> Result<String, ExtractError> {
    Err(ExtractError::UnsupportedFormat(format!(
        "{} (office support not enabled)",
        filename
    )))
}
