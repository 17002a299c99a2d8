//! PPTX writer for generated decks.
//!
//! The package is deliberately small: one master, one blank layout, one
//! theme, a cover slide followed by one slide per deck slide, and the
//! embedded images.

pub mod parts;
pub mod slide;

use deckgen_common::{Deck, ImagePayload};
use std::io::{Cursor, Write};
use tracing::debug;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::error::Result;
use crate::{artifact_file_name, Artifact, Exporter};
use slide::{escape_xml, Frame, SlideBuilder, TextStyle};

const BULLET_COLOR: &str = "334155";
const SUBTITLE_COLOR: &str = "CBD5E1";

/// Writes decks as `.pptx` packages.
#[derive(Debug, Clone, Copy, Default)]
pub struct PptxExporter;

impl Exporter for PptxExporter {
    fn export(&self, deck: &Deck, cover: Option<&ImagePayload>) -> Result<Artifact> {
        let bytes = write_deck(deck, cover)?;
        Ok(Artifact {
            file_name: artifact_file_name(&deck.main_title, "pptx"),
            bytes,
        })
    }
}

/// Media collected while laying out slides.
#[derive(Default)]
struct MediaStore<'a> {
    items: Vec<&'a ImagePayload>,
}

impl<'a> MediaStore<'a> {
    fn add(&mut self, payload: &'a ImagePayload) -> usize {
        self.items.push(payload);
        self.items.len() - 1
    }

    fn names(&self) -> Vec<String> {
        self.items
            .iter()
            .enumerate()
            .map(|(i, p)| format!("image{}.{}", i + 1, p.extension()))
            .collect()
    }
}

fn cover_slide<'a>(
    deck: &Deck,
    cover: Option<&'a ImagePayload>,
    media: &mut MediaStore<'a>,
) -> SlideBuilder {
    let mut slide = SlideBuilder::new();
    let full = Frame::inches(0.0, 0.0, 10.0, 5.625);
    if let Some(image) = cover.filter(|c| !c.is_empty()) {
        let index = media.add(image);
        slide.add_picture(index, full);
    }
    slide.add_rectangle(full, "000000", 60);
    slide.add_text_box(
        &deck.main_title,
        Frame::inches(1.0, 2.0, 8.0, 1.4),
        TextStyle::new(50, "FFFFFF").bold().centered().typeface("Arial"),
    );
    slide.add_text_box(
        &deck.subtitle,
        Frame::inches(1.0, 3.6, 8.0, 0.8),
        TextStyle::new(24, SUBTITLE_COLOR).centered(),
    );
    slide
}

fn content_slide<'a>(
    slide_data: &'a deckgen_common::Slide,
    theme: &str,
    media: &mut MediaStore<'a>,
) -> SlideBuilder {
    let mut slide = SlideBuilder::new();
    if let Some(image) = slide_data.image.as_ref().filter(|i| !i.is_empty()) {
        let index = media.add(image);
        slide.add_picture(index, Frame::inches(5.5, 1.2, 4.0, 4.0));
    }
    slide.add_text_box(
        &slide_data.title,
        Frame::inches(0.5, 0.3, 9.0, 0.6),
        TextStyle::new(30, theme).bold(),
    );
    slide.add_line(Frame::inches(0.5, 1.0, 9.0, 0.0), theme, 2);
    slide.add_bullets(
        slide_data.content.iter().map(|item| item.text.clone()),
        Frame::inches(0.5, 1.5, 4.5, 4.0),
        TextStyle::new(18, BULLET_COLOR),
    );
    slide
}

/// Serializes `deck` (plus its cover) into PPTX bytes. Reads only.
pub fn write_deck(deck: &Deck, cover: Option<&ImagePayload>) -> Result<Vec<u8>> {
    let theme = deck.theme_hex();
    let mut media = MediaStore::default();

    let mut slides = Vec::with_capacity(deck.slides.len() + 1);
    slides.push(cover_slide(deck, cover, &mut media));
    for slide_data in &deck.slides {
        slides.push(content_slide(slide_data, &theme, &mut media));
    }

    let media_names = media.names();
    let extensions: Vec<&str> = media.items.iter().map(|p| p.extension()).collect();

    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let put = |zip: &mut ZipWriter<Cursor<Vec<u8>>>, name: &str, data: &[u8]| -> Result<()> {
        zip.start_file(name, options)?;
        zip.write_all(data)?;
        Ok(())
    };

    let count = slides.len();
    let fixed_parts = [
        ("[Content_Types].xml", parts::content_types_xml(count, &extensions)?),
        ("_rels/.rels", parts::package_rels_xml()),
        ("docProps/core.xml", parts::core_props_xml(&escape_xml(&deck.main_title))),
        ("ppt/presentation.xml", parts::presentation_xml(count)?),
        ("ppt/_rels/presentation.xml.rels", parts::presentation_rels_xml(count)?),
        ("ppt/slideMasters/slideMaster1.xml", parts::slide_master_xml()),
        ("ppt/slideMasters/_rels/slideMaster1.xml.rels", parts::slide_master_rels_xml()),
        ("ppt/slideLayouts/slideLayout1.xml", parts::slide_layout_xml()),
        ("ppt/slideLayouts/_rels/slideLayout1.xml.rels", parts::slide_layout_rels_xml()),
        ("ppt/theme/theme1.xml", parts::theme_xml(&theme)),
    ];
    for (name, xml) in &fixed_parts {
        put(&mut zip, name, xml.as_bytes())?;
    }

    for (i, slide) in slides.iter().enumerate() {
        let n = i + 1;
        put(&mut zip, &format!("ppt/slides/slide{n}.xml"), slide.to_xml()?.as_bytes())?;
        put(
            &mut zip,
            &format!("ppt/slides/_rels/slide{n}.xml.rels"),
            slide.rels_xml(&media_names)?.as_bytes(),
        )?;
    }

    for (payload, name) in media.items.iter().zip(&media_names) {
        put(&mut zip, &format!("ppt/media/{name}"), &payload.bytes)?;
    }

    let cursor = zip.finish()?;
    let bytes = cursor.into_inner();
    debug!(
        "wrote pptx: {} slides, {} images, {} bytes",
        slides.len(),
        media_names.len(),
        bytes.len()
    );
    Ok(bytes)
}
