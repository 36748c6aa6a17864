//! # PDF Serializer
//!
//! Takes the laid-out pages from the layout engine and writes a valid PDF file.
//!
//! This is a from-scratch PDF 1.7 writer. The subset an invoice needs is
//! small: filled and stroked rectangles, lines, text in one font per run,
//! and raster logos.
//!
//! ## PDF Structure (simplified)
//!
//! ```text
//! %PDF-1.7            <- header
//! 1 0 obj ... endobj  <- objects (fonts, pages, content streams, etc.)
//! 2 0 obj ... endobj
//! ...
//! xref                <- cross-reference table (byte offsets of each object)
//! trailer             <- points to the root object
//! %%EOF
//! ```
//!
//! ## Font Embedding
//!
//! Standard PDF fonts (Helvetica, Times, Courier) use simple Type1 references
//! with WinAnsiEncoding. Custom TrueType fonts are embedded whole as
//! CIDFontType2 with Identity-H encoding, producing 5 PDF objects per face:
//! FontFile2, FontDescriptor, CIDFont, ToUnicode CMap, and the root Type0
//! dictionary.

use std::collections::{BTreeSet, HashMap};
use std::fmt::Write as FmtWrite; // for write! on String
use std::io::Write as IoWrite; // for write! on Vec<u8>
use std::sync::Arc;

use miniz_oxide::deflate::compress_to_vec_zlib;

use crate::error::FolioError;
use crate::font::{CustomFace, FaceRef, FontContext, FontKey, REGULAR};
use crate::image_loader::{ImagePixelData, LoadedImage};
use crate::layout::{DrawCommand, LayoutElement, LayoutPage, Stroke};
use crate::render::Metadata;
use crate::style::Color;

#[derive(Debug, Default)]
pub struct PdfWriter;

/// One `/Fn` font resource.
struct FontResource {
    key: FontKey,
    obj_id: usize,
    /// Glyph IDs for Identity-H encoding. `None` for standard fonts.
    glyphs: Option<HashMap<char, u16>>,
}

/// Tracks allocated PDF objects during writing.
struct PdfBuilder {
    objects: Vec<PdfObject>,
    fonts: Vec<FontResource>,
    /// XObject IDs for images, indexed as /Im0, /Im1, ... Keyed by the
    /// address of the shared image so a logo is embedded once.
    images: Vec<(usize, usize)>,
}

struct PdfObject {
    data: Vec<u8>,
}

impl PdfBuilder {
    fn push(&mut self, data: Vec<u8>) -> usize {
        let id = self.objects.len();
        self.objects.push(PdfObject { data });
        id
    }

    fn push_stream(&mut self, dict_entries: &str, payload: &[u8]) -> usize {
        let mut data: Vec<u8> = Vec::new();
        let _ = write!(data, "<< {} /Length {} >>\nstream\n", dict_entries, payload.len());
        data.extend_from_slice(payload);
        data.extend_from_slice(b"\nendstream");
        self.push(data)
    }

    fn font_index(&self, key: &FontKey) -> usize {
        self.fonts.iter().position(|f| f.key == *key).unwrap_or(0)
    }

    fn image_index(&self, image: &Arc<LoadedImage>) -> Option<usize> {
        let addr = Arc::as_ptr(image) as usize;
        self.images.iter().position(|(a, _)| *a == addr)
    }
}

impl PdfWriter {
    pub fn new() -> Self {
        Self
    }

    /// Write laid-out pages to a PDF byte vector.
    pub fn write(&self, pages: &[LayoutPage], metadata: &Metadata, font_context: &FontContext) -> Result<Vec<u8>, FolioError> {
        if pages.is_empty() {
            return Err(FolioError::Output("document has no pages".to_string()));
        }

        let mut builder = PdfBuilder {
            objects: Vec::new(),
            fonts: Vec::new(),
            images: Vec::new(),
        };

        // Reserve object IDs:
        // 0 = placeholder (PDF objects are 1-indexed)
        // 1 = Catalog
        // 2 = Pages (page tree root)
        // 3+ = fonts, images, then page objects and content streams
        for _ in 0..3 {
            builder.push(Vec::new());
        }

        self.register_fonts(&mut builder, pages, font_context)?;
        self.register_images(&mut builder, pages);

        let font_resources = builder
            .fonts
            .iter()
            .enumerate()
            .map(|(i, f)| format!("/F{} {} 0 R", i, f.obj_id))
            .collect::<Vec<_>>()
            .join(" ");

        let mut page_obj_ids: Vec<usize> = Vec::new();
        for page in pages {
            let content = self.build_content_stream(page, &builder);
            let compressed = compress_to_vec_zlib(content.as_bytes(), 6);
            let content_obj_id = builder.push_stream("/Filter /FlateDecode", &compressed);

            let xobjects = self.build_xobject_resource_dict(page, &builder);
            let resources = if xobjects.is_empty() {
                format!("/Font << {} >>", font_resources)
            } else {
                format!("/Font << {} >> /XObject << {} >>", font_resources, xobjects)
            };
            let page_dict = format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {:.2} {:.2}] \
                 /Contents {} 0 R /Resources << {} >> >>",
                page.width, page.height, content_obj_id, resources
            );
            page_obj_ids.push(builder.push(page_dict.into_bytes()));
        }

        builder.objects[1].data = b"<< /Type /Catalog /Pages 2 0 R >>".to_vec();

        let kids: String = page_obj_ids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        builder.objects[2].data = format!(
            "<< /Type /Pages /Kids [{}] /Count {} >>",
            kids,
            page_obj_ids.len()
        )
        .into_bytes();

        let mut info = String::from("<< ");
        if let Some(ref title) = metadata.title {
            let _ = write!(info, "/Title {} ", Self::text_string(title));
        }
        if let Some(ref author) = metadata.author {
            let _ = write!(info, "/Author {} ", Self::text_string(author));
        }
        if let Some(ref subject) = metadata.subject {
            let _ = write!(info, "/Subject {} ", Self::text_string(subject));
        }
        let _ = write!(
            info,
            "/Producer (folio {}) /CreationDate ({}) >>",
            env!("CARGO_PKG_VERSION"),
            chrono::Utc::now().format("D:%Y%m%d%H%M%SZ")
        );
        let info_obj_id = builder.push(info.into_bytes());

        Ok(self.serialize(&builder, info_obj_id))
    }

    /// Build the PDF content stream for a single page.
    fn build_content_stream(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut stream = String::new();
        for element in &page.elements {
            self.write_element(&mut stream, element, page.height, builder);
        }
        stream
    }

    /// Write a single layout element as PDF operators. Layout coordinates
    /// run down from the top; PDF runs up from the bottom.
    fn write_element(&self, stream: &mut String, element: &LayoutElement, page_height: f64, builder: &PdfBuilder) {
        match &element.draw {
            DrawCommand::Rect { fill, stroke } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                let (w, h) = (element.width, element.height);

                if let Some(bg) = fill.filter(|c| c.a > 0.0) {
                    let _ = write!(
                        stream,
                        "q\n{:.3} {:.3} {:.3} rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                        bg.r, bg.g, bg.b, x, y, w, h
                    );
                }
                if let Some(stroke) = stroke {
                    stream.push_str("q\n");
                    Self::write_stroke_state(stream, stroke);
                    let _ = write!(stream, "{:.2} {:.2} {:.2} {:.2} re\nS\nQ\n", x, y, w, h);
                }
            }

            DrawCommand::Line { stroke } => {
                let x1 = element.x;
                let y1 = page_height - element.y;
                let x2 = element.x + element.width;
                let y2 = page_height - element.y - element.height;
                stream.push_str("q\n");
                Self::write_stroke_state(stream, stroke);
                let _ = write!(stream, "{:.2} {:.2} m\n{:.2} {:.2} l\nS\nQ\n", x1, y1, x2, y2);
            }

            DrawCommand::Text {
                lines,
                font,
                font_size,
                color,
            } => {
                let idx = builder.font_index(font);
                let glyphs = builder.fonts.get(idx).and_then(|f| f.glyphs.as_ref());
                let _ = write!(
                    stream,
                    "BT\n{:.3} {:.3} {:.3} rg\n/F{} {:.1} Tf\n",
                    color.r, color.g, color.b, idx, font_size
                );
                for line in lines {
                    let _ = write!(stream, "1 0 0 1 {:.2} {:.2} Tm\n", line.x, page_height - line.y);
                    match glyphs {
                        Some(map) => {
                            let mut hex = String::with_capacity(line.text.len() * 4);
                            for ch in line.text.chars() {
                                let gid = map.get(&ch).copied().unwrap_or(0);
                                let _ = write!(hex, "{:04X}", gid);
                            }
                            let _ = write!(stream, "<{}> Tj\n", hex);
                        }
                        None => {
                            let _ = write!(stream, "({}) Tj\n", Self::encode_winansi(&line.text));
                        }
                    }
                }
                stream.push_str("ET\n");
            }

            DrawCommand::Image { image } => {
                let x = element.x;
                let y = page_height - element.y - element.height;
                match builder.image_index(image) {
                    Some(img_idx) => {
                        let _ = write!(
                            stream,
                            "q\n{:.4} 0 0 {:.4} {:.2} {:.2} cm\n/Im{} Do\nQ\n",
                            element.width, element.height, x, y, img_idx
                        );
                    }
                    None => {
                        // Fallback: grey placeholder if image index not found
                        let _ = write!(
                            stream,
                            "q\n0.9 0.9 0.9 rg\n{:.2} {:.2} {:.2} {:.2} re\nf\nQ\n",
                            x, y, element.width, element.height
                        );
                    }
                }
            }
        }
    }

    fn write_stroke_state(stream: &mut String, stroke: &Stroke) {
        let c: Color = stroke.color;
        let _ = write!(stream, "{:.3} {:.3} {:.3} RG\n{:.2} w\n", c.r, c.g, c.b, stroke.width);
        if let Some(dash) = stroke.style.dash_pattern() {
            let _ = write!(stream, "{} d\n", dash);
        }
    }

    /// Register fonts used across all pages. Each (family, weight) pair gets
    /// its own PDF font object; the first is `/F0`.
    fn register_fonts(&self, builder: &mut PdfBuilder, pages: &[LayoutPage], font_context: &FontContext) -> Result<(), FolioError> {
        let mut used: HashMap<FontKey, BTreeSet<char>> = HashMap::new();
        for element in pages.iter().flat_map(|p| &p.elements) {
            if let DrawCommand::Text { lines, font, .. } = &element.draw {
                let chars = used.entry(font.clone()).or_default();
                for line in lines {
                    chars.extend(line.text.chars());
                }
            }
        }

        let mut keys: Vec<FontKey> = used.keys().cloned().collect();
        // Sort for deterministic ordering
        keys.sort();

        // Always have at least Helvetica
        if keys.is_empty() {
            keys.push(FontKey::new("Helvetica", REGULAR));
        }

        for key in keys {
            match font_context.face(&key) {
                FaceRef::Standard(std_font) => {
                    let font_dict = format!(
                        "<< /Type /Font /Subtype /Type1 /BaseFont /{} \
                         /Encoding /WinAnsiEncoding >>",
                        std_font.pdf_name()
                    );
                    let obj_id = builder.push(font_dict.into_bytes());
                    builder.fonts.push(FontResource {
                        key,
                        obj_id,
                        glyphs: None,
                    });
                }
                FaceRef::Custom(face) => {
                    let chars = used.get(&key).cloned().unwrap_or_default();
                    let (obj_id, glyphs) = Self::write_custom_font_objects(builder, &key, face, &chars)?;
                    builder.fonts.push(FontResource {
                        key,
                        obj_id,
                        glyphs: Some(glyphs),
                    });
                }
            }
        }
        Ok(())
    }

    /// Write the 5 CIDFont PDF objects for a custom TrueType face.
    /// Returns the Type0 object ID and the char to glyph ID map.
    fn write_custom_font_objects(
        builder: &mut PdfBuilder,
        key: &FontKey,
        face: &CustomFace,
        used_chars: &BTreeSet<char>,
    ) -> Result<(usize, HashMap<char, u16>), FolioError> {
        let parsed = ttf_parser::Face::parse(&face.data, 0).map_err(|e| {
            FolioError::Output(format!("failed to parse TTF data for font '{}': {}", key.family, e))
        })?;
        let metrics = &face.metrics;

        let char_to_gid: HashMap<char, u16> = used_chars
            .iter()
            .filter_map(|ch| metrics.glyph_ids.get(ch).map(|gid| (*ch, *gid)))
            .collect();

        let pdf_font_name = Self::sanitize_font_name(&key.family, key.weight);

        // 1. FontFile2 stream
        let compressed_ttf = compress_to_vec_zlib(&face.data, 6);
        let fontfile2_id = builder.push_stream(
            &format!("/Length1 {} /Filter /FlateDecode", face.data.len()),
            &compressed_ttf,
        );

        // 2. FontDescriptor
        let scale = 1000.0 / metrics.units_per_em as f64;
        let bbox = parsed.global_bounding_box();
        let cap_height = parsed.capital_height().unwrap_or(metrics.ascender) as f64 * scale;
        let descriptor = format!(
            "<< /Type /FontDescriptor /FontName /{} /Flags 32 \
             /FontBBox [{} {} {} {}] /ItalicAngle 0 \
             /Ascent {} /Descent {} /CapHeight {} /StemV {} \
             /FontFile2 {} 0 R >>",
            pdf_font_name,
            (bbox.x_min as f64 * scale) as i32,
            (bbox.y_min as f64 * scale) as i32,
            (bbox.x_max as f64 * scale) as i32,
            (bbox.y_max as f64 * scale) as i32,
            (metrics.ascender as f64 * scale) as i32,
            (metrics.descender as f64 * scale) as i32,
            cap_height as i32,
            if key.is_bold() { 120 } else { 80 },
            fontfile2_id,
        );
        let descriptor_id = builder.push(descriptor.into_bytes());

        // 3. CIDFont dictionary (DescendantFont)
        let w_array = Self::build_w_array(&char_to_gid, |ch| metrics.advance_widths.get(&ch).copied(), scale);
        let cidfont = format!(
            "<< /Type /Font /Subtype /CIDFontType2 /BaseFont /{} \
             /CIDSystemInfo << /Registry (Adobe) /Ordering (Identity) /Supplement 0 >> \
             /FontDescriptor {} 0 R /DW {} /W {} \
             /CIDToGIDMap /Identity >>",
            pdf_font_name,
            descriptor_id,
            (metrics.default_advance as f64 * scale) as u32,
            w_array,
        );
        let cidfont_id = builder.push(cidfont.into_bytes());

        // 4. ToUnicode CMap
        let cmap = Self::build_tounicode_cmap(&char_to_gid, &pdf_font_name);
        let compressed_cmap = compress_to_vec_zlib(cmap.as_bytes(), 6);
        let tounicode_id = builder.push_stream("/Filter /FlateDecode", &compressed_cmap);

        // 5. Type0 root
        let type0 = format!(
            "<< /Type /Font /Subtype /Type0 /BaseFont /{} /Encoding /Identity-H \
             /DescendantFonts [{} 0 R] /ToUnicode {} 0 R >>",
            pdf_font_name, cidfont_id, tounicode_id
        );
        let type0_id = builder.push(type0.into_bytes());

        Ok((type0_id, char_to_gid))
    }

    /// Build the /W array for per-glyph widths in CIDFont.
    /// Format: [gid [width] gid [width] ...]
    fn build_w_array<F>(char_to_gid: &HashMap<char, u16>, advance: F, scale: f64) -> String
    where
        F: Fn(char) -> Option<u16>,
    {
        let mut entries: Vec<(u16, u32)> = char_to_gid
            .iter()
            .map(|(&ch, &gid)| (gid, (advance(ch).unwrap_or(0) as f64 * scale) as u32))
            .collect();
        entries.sort_by_key(|(gid, _)| *gid);
        entries.dedup_by_key(|(gid, _)| *gid);

        let mut result = String::from("[");
        for (gid, width) in &entries {
            let _ = write!(result, " {} [{}]", gid, width);
        }
        result.push_str(" ]");
        result
    }

    /// Build a ToUnicode CMap for text extraction/copy-paste support.
    fn build_tounicode_cmap(char_to_gid: &HashMap<char, u16>, font_name: &str) -> String {
        let mut gid_to_unicode: Vec<(u16, char)> = char_to_gid.iter().map(|(&ch, &gid)| (gid, ch)).collect();
        gid_to_unicode.sort();

        let mut cmap = String::new();
        cmap.push_str("/CIDInit /ProcSet findresource begin\n");
        cmap.push_str("12 dict begin\n");
        cmap.push_str("begincmap\n");
        cmap.push_str("/CIDSystemInfo\n");
        cmap.push_str("<< /Registry (Adobe) /Ordering (UCS) /Supplement 0 >> def\n");
        let _ = writeln!(cmap, "/CMapName /{}-UTF16 def", font_name);
        cmap.push_str("/CMapType 2 def\n");
        cmap.push_str("1 begincodespacerange\n");
        cmap.push_str("<0000> <FFFF>\n");
        cmap.push_str("endcodespacerange\n");

        // At most 100 entries per beginbfchar block
        for chunk in gid_to_unicode.chunks(100) {
            let _ = writeln!(cmap, "{} beginbfchar", chunk.len());
            for &(gid, ch) in chunk {
                let mut units = [0u16; 2];
                let utf16: String = ch.encode_utf16(&mut units).iter().map(|u| format!("{:04X}", u)).collect();
                let _ = writeln!(cmap, "<{:04X}> <{}>", gid, utf16);
            }
            cmap.push_str("endbfchar\n");
        }

        cmap.push_str("endcmap\n");
        cmap.push_str("CMapName currentdict /CMap defineresource pop\n");
        cmap.push_str("end\n");
        cmap.push_str("end\n");
        cmap
    }

    /// Sanitize a font name for use as a PDF name object.
    fn sanitize_font_name(family: &str, weight: u32) -> String {
        let mut name: String = family
            .chars()
            .filter(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
            .collect();
        if name.is_empty() {
            name = "CustomFont".to_string();
        }
        if weight >= 700 {
            name.push_str("-Bold");
        }
        name
    }

    /// Embed every distinct image once, in first-use order.
    fn register_images(&self, builder: &mut PdfBuilder, pages: &[LayoutPage]) {
        for element in pages.iter().flat_map(|p| &p.elements) {
            if let DrawCommand::Image { image } = &element.draw {
                if builder.image_index(image).is_none() {
                    let obj_id = Self::write_image_xobject(builder, image);
                    builder.images.push((Arc::as_ptr(image) as usize, obj_id));
                }
            }
        }
    }

    /// Write a single image as one or two XObject PDF objects.
    /// Returns the main XObject ID.
    fn write_image_xobject(builder: &mut PdfBuilder, image: &LoadedImage) -> usize {
        match &image.pixel_data {
            ImagePixelData::Jpeg { data, color_space } => {
                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /{} /BitsPerComponent 8 /Filter /DCTDecode",
                    image.width_px,
                    image.height_px,
                    color_space.pdf_name()
                );
                builder.push_stream(&dict, data)
            }

            ImagePixelData::Decoded { rgb, alpha } => {
                // Write SMask first if alpha channel exists
                let smask_ref = alpha
                    .as_ref()
                    .map(|alpha_data| {
                        let dict = format!(
                            "/Type /XObject /Subtype /Image /Width {} /Height {} \
                             /ColorSpace /DeviceGray /BitsPerComponent 8 /Filter /FlateDecode",
                            image.width_px, image.height_px
                        );
                        let id = builder.push_stream(&dict, &compress_to_vec_zlib(alpha_data, 6));
                        format!(" /SMask {} 0 R", id)
                    })
                    .unwrap_or_default();

                let dict = format!(
                    "/Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode{}",
                    image.width_px, image.height_px, smask_ref
                );
                builder.push_stream(&dict, &compress_to_vec_zlib(rgb, 6))
            }
        }
    }

    /// Build the /XObject resource dict entries for a specific page.
    fn build_xobject_resource_dict(&self, page: &LayoutPage, builder: &PdfBuilder) -> String {
        let mut indices: Vec<usize> = page
            .elements
            .iter()
            .filter_map(|e| match &e.draw {
                DrawCommand::Image { image } => builder.image_index(image),
                _ => None,
            })
            .collect();
        indices.sort_unstable();
        indices.dedup();
        indices
            .iter()
            .map(|&idx| format!("/Im{} {} 0 R", idx, builder.images[idx].1))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Escape special characters in a PDF string.
    fn escape_pdf_string(s: &str) -> String {
        s.replace('\\', "\\\\").replace('(', "\\(").replace(')', "\\)")
    }

    /// A document information string: literal when ASCII, UTF-16BE with a
    /// byte order mark otherwise.
    fn text_string(s: &str) -> String {
        if s.is_ascii() {
            format!("({})", Self::escape_pdf_string(s))
        } else {
            let hex: String = s.encode_utf16().map(|u| format!("{:04X}", u)).collect();
            format!("<FEFF{}>", hex)
        }
    }

    /// Encode text for a WinAnsiEncoding literal string. Characters outside
    /// the encoding print as '?'.
    fn encode_winansi(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for ch in text.chars() {
            let b = Self::unicode_to_winansi(ch).unwrap_or(b'?');
            match b {
                b'\\' => out.push_str("\\\\"),
                b'(' => out.push_str("\\("),
                b')' => out.push_str("\\)"),
                0x20..=0x7E => out.push(b as char),
                _ => {
                    let _ = write!(out, "\\{:03o}", b);
                }
            }
        }
        out
    }

    /// Map a Unicode codepoint to a WinAnsiEncoding byte value.
    ///
    /// WinAnsiEncoding is based on Windows-1252. Most codepoints in
    /// 0x20..=0x7E and 0xA0..=0xFF map directly. The 0x80..=0x9F range
    /// contains special mappings for smart quotes, bullets, dashes, etc.
    fn unicode_to_winansi(ch: char) -> Option<u8> {
        let cp = ch as u32;
        if (0x20..=0x7E).contains(&cp) || (0xA0..=0xFF).contains(&cp) {
            return Some(cp as u8);
        }
        match cp {
            0x20AC => Some(0x80), // Euro sign
            0x201A => Some(0x82),
            0x0192 => Some(0x83),
            0x201E => Some(0x84),
            0x2026 => Some(0x85), // Horizontal ellipsis
            0x2020 => Some(0x86),
            0x2021 => Some(0x87),
            0x02C6 => Some(0x88),
            0x2030 => Some(0x89),
            0x0160 => Some(0x8A),
            0x2039 => Some(0x8B),
            0x0152 => Some(0x8C),
            0x017D => Some(0x8E),
            0x2018 => Some(0x91), // Left single quotation mark
            0x2019 => Some(0x92), // Right single quotation mark
            0x201C => Some(0x93), // Left double quotation mark
            0x201D => Some(0x94), // Right double quotation mark
            0x2022 => Some(0x95), // Bullet
            0x2013 => Some(0x96), // En dash
            0x2014 => Some(0x97), // Em dash
            0x02DC => Some(0x98),
            0x2122 => Some(0x99), // Trade mark sign
            0x0161 => Some(0x9A),
            0x203A => Some(0x9B),
            0x0153 => Some(0x9C),
            0x017E => Some(0x9E),
            0x0178 => Some(0x9F),
            _ => None,
        }
    }

    /// Serialize all objects into the final PDF byte stream.
    fn serialize(&self, builder: &PdfBuilder, info_obj_id: usize) -> Vec<u8> {
        let mut output: Vec<u8> = Vec::new();
        let mut offsets: Vec<usize> = vec![0; builder.objects.len()];

        output.extend_from_slice(b"%PDF-1.7\n");
        output.extend_from_slice(b"%\xe2\xe3\xcf\xd3\n");

        for (i, obj) in builder.objects.iter().enumerate().skip(1) {
            offsets[i] = output.len();
            let _ = write!(output, "{} 0 obj\n", i);
            output.extend_from_slice(&obj.data);
            output.extend_from_slice(b"\nendobj\n\n");
        }

        let xref_offset = output.len();
        let _ = write!(output, "xref\n0 {}\n", builder.objects.len());
        output.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets.iter().skip(1) {
            let _ = write!(output, "{:010} 00000 n \n", offset);
        }

        let _ = write!(
            output,
            "trailer\n<< /Size {} /Root 1 0 R /Info {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            builder.objects.len(),
            info_obj_id,
            xref_offset
        );
        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::font::BOLD;
    use crate::image_loader::decode_image;
    use crate::image_loader::tests::png_bytes;
    use crate::layout::TextLine;
    use crate::style::BorderStyle;

    fn page(elements: Vec<LayoutElement>) -> LayoutPage {
        LayoutPage {
            width: 595.28,
            height: 841.89,
            elements,
        }
    }

    fn text(y: f64, s: &str, weight: u32) -> LayoutElement {
        LayoutElement {
            x: 54.0,
            y,
            width: 100.0,
            height: 16.8,
            draw: DrawCommand::Text {
                lines: vec![TextLine {
                    x: 54.0,
                    y: y + 12.0,
                    width: 50.0,
                    text: s.to_string(),
                }],
                font: FontKey::new("Helvetica", weight),
                font_size: 12.0,
                color: Color::BLACK,
            },
            section: None,
        }
    }

    fn write(pages: &[LayoutPage], metadata: &Metadata) -> String {
        let bytes = PdfWriter::new().write(pages, metadata, &FontContext::new()).unwrap();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    /// Decompress every FlateDecode content stream, for asserting on operators.
    fn content_streams(pdf: &[u8]) -> Vec<String> {
        let mut streams = Vec::new();
        let mut rest = pdf;
        while let Some(start) = rest.windows(7).position(|w| w == b"stream\n") {
            let body = &rest[start + 7..];
            let Some(end) = body.windows(10).position(|w| w == b"\nendstream") else {
                break;
            };
            if let Ok(raw) = miniz_oxide::inflate::decompress_to_vec_zlib(&body[..end]) {
                streams.push(String::from_utf8_lossy(&raw).into_owned());
            }
            rest = &body[end..];
        }
        streams
    }

    #[test]
    fn test_escape_pdf_string() {
        assert_eq!(PdfWriter::escape_pdf_string("Hello (World)"), "Hello \\(World\\)");
        assert_eq!(PdfWriter::escape_pdf_string("back\\slash"), "back\\\\slash");
    }

    #[test]
    fn test_empty_page_produces_valid_pdf() {
        let text = write(&[page(vec![])], &Metadata::default());
        assert!(text.starts_with("%PDF-1.7"));
        assert!(text.contains("%%EOF"));
        assert!(text.contains("xref"));
        assert!(text.contains("trailer"));
        assert!(text.contains("/Count 1"));
    }

    #[test]
    fn test_no_pages_is_an_output_error() {
        let err = PdfWriter::new()
            .write(&[], &Metadata::default(), &FontContext::new())
            .unwrap_err();
        assert!(matches!(err, FolioError::Output(_)));
    }

    #[test]
    fn test_metadata_in_pdf() {
        let metadata = Metadata {
            title: Some("Invoice INV-1".to_string()),
            author: Some("Acme (UK)".to_string()),
            subject: None,
        };
        let text = write(&[page(vec![])], &metadata);
        assert!(text.contains("/Title (Invoice INV-1)"));
        assert!(text.contains("/Author (Acme \\(UK\\))"));
        assert!(text.contains("/Producer (folio"));
    }

    #[test]
    fn test_non_ascii_metadata_is_utf16() {
        assert_eq!(PdfWriter::text_string("Café"), "<FEFF00430061006600E9>");
        assert_eq!(PdfWriter::text_string("Cafe"), "(Cafe)");
    }

    #[test]
    fn test_bold_font_registered_separately() {
        let text = write(
            &[page(vec![text(54.0, "A", REGULAR), text(74.0, "A", BOLD)])],
            &Metadata::default(),
        );
        assert!(text.contains("/BaseFont /Helvetica "));
        assert!(text.contains("/BaseFont /Helvetica-Bold "));
    }

    #[test]
    fn test_text_is_winansi_encoded() {
        let bytes = PdfWriter::new()
            .write(&[page(vec![text(54.0, "Total: €5 (net)", REGULAR)])], &Metadata::default(), &FontContext::new())
            .unwrap();
        let streams = content_streams(&bytes);
        assert!(streams.iter().any(|s| s.contains("(Total: \\2005 \\(net\\)) Tj")));
        assert!(!String::from_utf8_lossy(&bytes).contains("CIDFontType2"));
    }

    #[test]
    fn test_dashed_line_sets_dash_pattern() {
        let stroke = Stroke::new(Color::BLACK, 1.0, BorderStyle::Dashed).unwrap();
        let line = LayoutElement {
            x: 10.0,
            y: 100.0,
            width: 200.0,
            height: 0.0,
            draw: DrawCommand::Line { stroke },
            section: None,
        };
        let bytes = PdfWriter::new()
            .write(&[page(vec![line])], &Metadata::default(), &FontContext::new())
            .unwrap();
        let streams = content_streams(&bytes);
        let content = streams.iter().find(|s| s.contains(" m\n")).unwrap();
        assert!(content.contains("[3 2] 0 d"));
        assert!(content.contains("10.00 741.89 m\n210.00 741.89 l"));
    }

    #[test]
    fn test_shared_image_embedded_once() {
        let image = Arc::new(decode_image(&png_bytes(4, 4, [0, 0, 255, 128]), "logo.png").unwrap());
        let element = |y: f64| LayoutElement {
            x: 10.0,
            y,
            width: 40.0,
            height: 40.0,
            draw: DrawCommand::Image { image: Arc::clone(&image) },
            section: None,
        };
        let text = write(&[page(vec![element(10.0)]), page(vec![element(10.0)])], &Metadata::default());
        assert_eq!(text.matches("/Subtype /Image").count(), 2); // RGB + SMask
        assert!(text.contains("/SMask"));
        assert_eq!(text.matches("/XObject << /Im0").count(), 2);
    }

    #[test]
    fn test_sanitize_font_name() {
        assert_eq!(PdfWriter::sanitize_font_name("Inter", 400), "Inter");
        assert_eq!(PdfWriter::sanitize_font_name("Inter", 700), "Inter-Bold");
        assert_eq!(PdfWriter::sanitize_font_name("Noto Sans", 400), "NotoSans");
        assert_eq!(PdfWriter::sanitize_font_name("(()) ", 400), "CustomFont");
    }

    #[test]
    fn test_tounicode_cmap_format() {
        let mut char_to_gid = HashMap::new();
        char_to_gid.insert('A', 36u16);
        char_to_gid.insert('€', 37u16);

        let cmap = PdfWriter::build_tounicode_cmap(&char_to_gid, "TestFont");
        assert!(cmap.contains("begincmap"));
        assert!(cmap.contains("2 beginbfchar"));
        assert!(cmap.contains("<0024> <0041>"));
        assert!(cmap.contains("<0025> <20AC>"));
        assert!(cmap.contains("<0000> <FFFF>"));
    }

    #[test]
    fn test_w_array_format() {
        let mut char_to_gid = HashMap::new();
        char_to_gid.insert('A', 36u16);
        char_to_gid.insert('B', 3u16);
        let w = PdfWriter::build_w_array(&char_to_gid, |ch| Some(if ch == 'A' { 1200 } else { 600 }), 0.5);
        assert_eq!(w, "[ 3 [300] 36 [600] ]");
    }
}
