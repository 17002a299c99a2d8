//! Document ingestion: plain text and Word documents.

use quick_xml::events::{BytesRef, Event};
use quick_xml::Reader;
use std::io::{Cursor, Read};
use std::path::Path;

use crate::error::IngestError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Text,
    Docx,
}

impl DocumentKind {
    pub fn from_path(path: &Path) -> Result<Self, IngestError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match extension.as_str() {
            "txt" => Ok(Self::Text),
            "docx" => Ok(Self::Docx),
            _ => Err(IngestError::Unsupported { extension }),
        }
    }
}

/// Reads a supported document and returns its plain text.
pub fn extract_text(path: &Path) -> Result<String, IngestError> {
    let kind = DocumentKind::from_path(path)?;
    let bytes = std::fs::read(path)?;
    let text = match kind {
        DocumentKind::Text => String::from_utf8_lossy(&bytes).into_owned(),
        DocumentKind::Docx => extract_docx_text(&bytes)?,
    };
    if text.trim().is_empty() {
        return Err(IngestError::Empty);
    }
    Ok(text)
}

/// Text of every run in `word/document.xml`, one line per paragraph.
pub fn extract_docx_text(bytes: &[u8]) -> Result<String, IngestError> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;
    let mut xml = Vec::new();
    archive.by_name("word/document.xml")?.read_to_end(&mut xml)?;

    let mut reader = Reader::from_reader(xml.as_slice());
    let mut buf = Vec::with_capacity(1024);
    let mut out = String::new();
    let mut paragraph = String::new();
    let mut in_text = false;

    loop {
        buf.clear();
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                if e.local_name().as_ref() == b"t" {
                    in_text = true;
                }
            }
            Ok(Event::Empty(e)) => match e.local_name().as_ref() {
                b"tab" => paragraph.push('\t'),
                b"br" | b"cr" => paragraph.push('\n'),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                paragraph.push_str(&String::from_utf8_lossy(&t));
            }
            Ok(Event::GeneralRef(r)) if in_text => push_reference(&mut paragraph, &r),
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_text = false,
                b"p" => {
                    out.push_str(paragraph.trim_end());
                    out.push('\n');
                    paragraph.clear();
                }
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Xml(e.to_string())),
            _ => {}
        }
    }
    out.push_str(paragraph.trim_end());

    Ok(out.trim_end().to_string())
}

fn push_reference(out: &mut String, reference: &BytesRef<'_>) {
    if let Ok(Some(ch)) = reference.resolve_char_ref() {
        out.push(ch);
        return;
    }
    let name: &[u8] = reference;
    let ch = match name {
        b"amp" => '&',
        b"lt" => '<',
        b"gt" => '>',
        b"quot" => '"',
        b"apos" => '\'',
        _ => return,
    };
    out.push(ch);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use zip::write::SimpleFileOptions;

    /// Builds a minimal .docx holding `body` as the document body XML.
    fn docx_with_body(body: &str) -> Vec<u8> {
        let xml = format!(
            r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{body}</w:body></w:document>"#
        );
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("word/document.xml", SimpleFileOptions::default())
            .unwrap();
        zip.write_all(xml.as_bytes()).unwrap();
        zip.finish().unwrap().into_inner()
    }

    #[test]
    fn test_docx_paragraphs_and_entities() {
        let body = concat!(
            r#"<w:p><w:r><w:t>Solar </w:t></w:r><w:r><w:t xml:space="preserve">&amp; wind</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>Col1</w:t><w:tab/><w:t>Col2 &#x2192; done</w:t></w:r></w:p>"#,
            r#"<w:p><w:pPr><w:jc w:val="center"/></w:pPr></w:p>"#,
            r#"<w:p><w:r><w:t>Last</w:t></w:r></w:p>"#
        );
        let text = extract_docx_text(&docx_with_body(body)).unwrap();
        assert_eq!(text, "Solar & wind\nCol1\tCol2 → done\n\nLast");
    }

    #[test]
    fn test_docx_without_document_part() {
        let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
        zip.start_file("other.xml", SimpleFileOptions::default()).unwrap();
        zip.write_all(b"<x/>").unwrap();
        let bytes = zip.finish().unwrap().into_inner();
        assert!(matches!(extract_docx_text(&bytes), Err(IngestError::Zip(_))));
    }

    #[test]
    fn test_not_a_zip() {
        assert!(matches!(
            extract_docx_text(b"plain text"),
            Err(IngestError::Zip(_))
        ));
    }

    #[test]
    fn test_extract_by_extension() {
        let dir = tempfile::tempdir().unwrap();

        let txt = dir.path().join("notes.TXT");
        std::fs::write(&txt, "Topic: bees").unwrap();
        assert_eq!(extract_text(&txt).unwrap(), "Topic: bees");

        let docx = dir.path().join("doc.docx");
        std::fs::write(&docx, docx_with_body("<w:p><w:r><w:t>Hi</w:t></w:r></w:p>")).unwrap();
        assert_eq!(extract_text(&docx).unwrap(), "Hi");

        let pdf = dir.path().join("deck.pdf");
        std::fs::write(&pdf, "%PDF").unwrap();
        assert!(matches!(
            extract_text(&pdf),
            Err(IngestError::Unsupported { extension }) if extension == "pdf"
        ));

        let blank = dir.path().join("blank.txt");
        std::fs::write(&blank, "  \n ").unwrap();
        assert!(matches!(extract_text(&blank), Err(IngestError::Empty)));

        assert!(matches!(
            extract_text(&dir.path().join("missing.txt")),
            Err(IngestError::Io(_))
        ));
    }
}
