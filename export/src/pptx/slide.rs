/// Slide part writer.
use std::fmt::Write as FmtWrite;

use crate::error::Result;

/// English Metric Units per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// Converts inches to EMUs.
pub fn inches(value: f64) -> i64 {
    (value * EMU_PER_INCH as f64).round() as i64
}

/// Position and size of a shape, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub width: i64,
    pub height: i64,
}

impl Frame {
    pub fn inches(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x: inches(x),
            y: inches(y),
            width: inches(width),
            height: inches(height),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Align {
    Left,
    Center,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    Top,
    Middle,
}

/// Run formatting for a text box.
#[derive(Debug, Clone)]
pub struct TextStyle {
    /// Font size in points.
    pub size: u32,
    pub bold: bool,
    /// Six hex digits.
    pub color: String,
    pub typeface: Option<&'static str>,
    pub align: Align,
    pub anchor: Anchor,
}

impl TextStyle {
    pub fn new(size: u32, color: impl Into<String>) -> Self {
        Self {
            size,
            bold: false,
            color: color.into(),
            typeface: None,
            align: Align::Left,
            anchor: Anchor::Top,
        }
    }

    pub fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    pub fn centered(mut self) -> Self {
        self.align = Align::Center;
        self.anchor = Anchor::Middle;
        self
    }

    pub fn typeface(mut self, typeface: &'static str) -> Self {
        self.typeface = Some(typeface);
        self
    }
}

#[derive(Debug, Clone)]
enum Shape {
    Picture {
        rel_id: String,
        frame: Frame,
    },
    Rect {
        frame: Frame,
        color: String,
        /// Opacity in thousandths of a percent (100000 = opaque).
        alpha: u32,
    },
    Line {
        frame: Frame,
        color: String,
        width_emu: i64,
    },
    Text {
        frame: Frame,
        paragraphs: Vec<String>,
        style: TextStyle,
        bullets: bool,
    },
}

/// A slide under construction. Shapes are drawn in insertion order.
#[derive(Debug, Clone, Default)]
pub struct SlideBuilder {
    shapes: Vec<Shape>,
    images: Vec<usize>,
}

impl SlideBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    fn media(&self) -> &[usize] {
        &self.images
    }

    /// Places a picture backed by media `media_index`. The relationship id is
    /// assigned in insertion order after the layout relationship (`rId1`).
    pub fn add_picture(&mut self, media_index: usize, frame: Frame) {
        let rel_id = format!("rId{}", self.images.len() + 2);
        self.images.push(media_index);
        self.shapes.push(Shape::Picture { rel_id, frame });
    }

    pub fn add_rectangle(&mut self, frame: Frame, color: &str, transparency_pct: u32) {
        let alpha = 100_000u32.saturating_sub(transparency_pct.min(100) * 1000);
        self.shapes.push(Shape::Rect {
            frame,
            color: color.to_string(),
            alpha,
        });
    }

    pub fn add_line(&mut self, frame: Frame, color: &str, width_pt: u32) {
        self.shapes.push(Shape::Line {
            frame,
            color: color.to_string(),
            width_emu: i64::from(width_pt) * 12_700,
        });
    }

    pub fn add_text_box(&mut self, text: &str, frame: Frame, style: TextStyle) {
        self.shapes.push(Shape::Text {
            frame,
            paragraphs: vec![text.to_string()],
            style,
            bullets: false,
        });
    }

    pub fn add_bullets<I, S>(&mut self, items: I, frame: Frame, style: TextStyle)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.shapes.push(Shape::Text {
            frame,
            paragraphs: items.into_iter().map(Into::into).collect(),
            style,
            bullets: true,
        });
    }

    pub fn to_xml(&self) -> Result<String> {
        let mut xml = String::with_capacity(4096);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<p:sld xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main">"#);
        xml.push_str("<p:cSld><p:spTree>");
        xml.push_str(r#"<p:nvGrpSpPr><p:cNvPr id="1" name=""/><p:cNvGrpSpPr/><p:nvPr/></p:nvGrpSpPr>"#);
        xml.push_str(r#"<p:grpSpPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="0" cy="0"/><a:chOff x="0" y="0"/><a:chExt cx="0" cy="0"/></a:xfrm></p:grpSpPr>"#);

        for (index, shape) in self.shapes.iter().enumerate() {
            // id 1 is the group itself
            let id = index + 2;
            write_shape(&mut xml, id, shape)?;
        }

        xml.push_str("</p:spTree></p:cSld>");
        xml.push_str(r#"<p:clrMapOvr><a:masterClrMapping/></p:clrMapOvr>"#);
        xml.push_str("</p:sld>");
        Ok(xml)
    }

    pub fn rels_xml(&self, media_names: &[String]) -> Result<String> {
        let mut xml = String::with_capacity(512);
        xml.push_str(r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#);
        xml.push_str(r#"<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships">"#);
        xml.push_str(r#"<Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/slideLayout" Target="../slideLayouts/slideLayout1.xml"/>"#);
        for (offset, media_index) in self.images.iter().enumerate() {
            if let Some(name) = media_names.get(*media_index) {
                write!(
                    xml,
                    r#"<Relationship Id="rId{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/{}"/>"#,
                    offset + 2,
                    name
                )?;
            }
        }
        xml.push_str("</Relationships>");
        Ok(xml)
    }
}

fn write_xfrm(xml: &mut String, frame: &Frame) -> Result<()> {
    write!(
        xml,
        r#"<a:xfrm><a:off x="{}" y="{}"/><a:ext cx="{}" cy="{}"/></a:xfrm>"#,
        frame.x, frame.y, frame.width, frame.height
    )?;
    Ok(())
}

fn write_shape(xml: &mut String, id: usize, shape: &Shape) -> Result<()> {
    match shape {
        Shape::Picture { rel_id, frame } => {
            write!(
                xml,
                r#"<p:pic><p:nvPicPr><p:cNvPr id="{id}" name="Picture {id}"/><p:cNvPicPr><a:picLocks noChangeAspect="1"/></p:cNvPicPr><p:nvPr/></p:nvPicPr>"#
            )?;
            write!(
                xml,
                r#"<p:blipFill><a:blip r:embed="{rel_id}"/><a:stretch><a:fillRect/></a:stretch></p:blipFill><p:spPr>"#
            )?;
            write_xfrm(xml, frame)?;
            xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></p:spPr></p:pic>"#);
        }
        Shape::Rect {
            frame,
            color,
            alpha,
        } => {
            write!(
                xml,
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Rectangle {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#
            )?;
            write_xfrm(xml, frame)?;
            write!(
                xml,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:solidFill><a:srgbClr val="{color}"><a:alpha val="{alpha}"/></a:srgbClr></a:solidFill><a:ln><a:noFill/></a:ln></p:spPr></p:sp>"#
            )?;
        }
        Shape::Line {
            frame,
            color,
            width_emu,
        } => {
            write!(
                xml,
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="Line {id}"/><p:cNvSpPr/><p:nvPr/></p:nvSpPr><p:spPr>"#
            )?;
            write_xfrm(xml, frame)?;
            write!(
                xml,
                r#"<a:prstGeom prst="line"><a:avLst/></a:prstGeom><a:ln w="{width_emu}"><a:solidFill><a:srgbClr val="{color}"/></a:solidFill></a:ln></p:spPr></p:sp>"#
            )?;
        }
        Shape::Text {
            frame,
            paragraphs,
            style,
            bullets,
        } => {
            write!(
                xml,
                r#"<p:sp><p:nvSpPr><p:cNvPr id="{id}" name="TextBox {id}"/><p:cNvSpPr txBox="1"/><p:nvPr/></p:nvSpPr><p:spPr>"#
            )?;
            write_xfrm(xml, frame)?;
            xml.push_str(r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom><a:noFill/></p:spPr>"#);
            let anchor = match style.anchor {
                Anchor::Top => "t",
                Anchor::Middle => "ctr",
            };
            write!(
                xml,
                r#"<p:txBody><a:bodyPr wrap="square" rtlCol="0" anchor="{anchor}"><a:normAutofit/></a:bodyPr><a:lstStyle/>"#
            )?;
            for paragraph in paragraphs {
                write_paragraph(xml, paragraph, style, *bullets)?;
            }
            xml.push_str("</p:txBody></p:sp>");
        }
    }
    Ok(())
}

fn write_paragraph(xml: &mut String, text: &str, style: &TextStyle, bullet: bool) -> Result<()> {
    let algn = match style.align {
        Align::Left => "l",
        Align::Center => "ctr",
    };
    xml.push_str("<a:p>");
    if bullet {
        write!(
            xml,
            r#"<a:pPr marL="285750" indent="-285750" algn="{algn}"><a:buFont typeface="Arial"/><a:buChar char="&#8226;"/></a:pPr>"#
        )?;
    } else {
        write!(xml, r#"<a:pPr algn="{algn}"><a:buNone/></a:pPr>"#)?;
    }
    write!(
        xml,
        r#"<a:r><a:rPr lang="en-US" sz="{}" b="{}" dirty="0">"#,
        style.size * 100,
        u8::from(style.bold)
    )?;
    write!(
        xml,
        r#"<a:solidFill><a:srgbClr val="{}"/></a:solidFill>"#,
        style.color
    )?;
    if let Some(face) = style.typeface {
        write!(xml, r#"<a:latin typeface="{face}"/>"#)?;
    }
    write!(xml, "</a:rPr><a:t>{}</a:t></a:r></a:p>", escape_xml(text))?;
    Ok(())
}

/// Escapes text for use in element content and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // characters XML 1.0 cannot carry
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\n' | '\r') => {}
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inches_to_emu() {
        assert_eq!(inches(1.0), 914_400);
        assert_eq!(inches(0.5), 457_200);
        assert_eq!(inches(5.625), 5_143_500);
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("R&D <core> \"x\""), "R&amp;D &lt;core&gt; &quot;x&quot;");
        assert_eq!(escape_xml("a\u{1}b"), "ab");
    }

    #[test]
    fn test_picture_relationships() {
        let mut slide = SlideBuilder::new();
        slide.add_picture(3, Frame::inches(0.0, 0.0, 1.0, 1.0));
        slide.add_picture(0, Frame::inches(1.0, 0.0, 1.0, 1.0));
        assert_eq!(slide.media(), &[3, 0]);

        let names: Vec<String> = (1..=4).map(|i| format!("image{i}.png")).collect();
        let rels = slide.rels_xml(&names).unwrap();
        assert!(rels.contains(r#"Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image4.png""#));
        assert!(rels.contains(r#"Id="rId3" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="../media/image1.png""#));

        let xml = slide.to_xml().unwrap();
        assert!(xml.contains(r#"r:embed="rId2""#));
        assert!(xml.contains(r#"r:embed="rId3""#));
    }

    #[test]
    fn test_text_and_shapes_xml() {
        let mut slide = SlideBuilder::new();
        slide.add_rectangle(Frame::inches(0.0, 0.0, 10.0, 5.625), "000000", 60);
        slide.add_line(Frame::inches(0.5, 1.0, 9.0, 0.0), "1E40AF", 2);
        slide.add_text_box(
            "Q&A",
            Frame::inches(1.0, 2.5, 8.0, 1.2),
            TextStyle::new(50, "FFFFFF").bold().centered(),
        );
        let body = Frame::inches(0.5, 1.5, 4.5, 4.0);
        slide.add_bullets(["one", "two"], body, TextStyle::new(18, "334155"));
        assert_eq!(slide.shapes.len(), 4);

        let xml = slide.to_xml().unwrap();
        assert!(xml.contains(r#"<a:alpha val="40000"/>"#));
        assert!(xml.contains(r#"<a:ln w="25400">"#));
        assert!(xml.contains(r#"sz="5000" b="1""#));
        assert!(xml.contains("<a:t>Q&amp;A</a:t>"));
        assert_eq!(xml.matches("<a:buChar").count(), 2);
        assert!(xml.contains(r#"anchor="ctr""#));
    }
}
