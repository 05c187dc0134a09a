//! Stamp a signature image and caption onto one page of an existing PDF
//!
//! The target page gets two new content streams around its existing ones
//! (`q` before, `Q` + overlay after) and page-local copies of its resource
//! dictionaries. Every other object in the file is written back untouched.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;
use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};
use serde::{Deserialize, Serialize};

use crate::document::PdfDocument;
use crate::error::{Result, StampError};
use crate::placement::Placement;
use crate::signature::SignatureAsset;

/// How the caption is drawn under the signature.
///
/// The caption is not affected by the placement scale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionStyle {
    /// Font size in points
    pub font_size: f64,
    /// Distance from the bottom of the image down to the caption baseline
    pub offset: f64,
    /// One of the standard 14 fonts
    pub base_font: String,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_size: 10.0,
            offset: 20.0,
            base_font: "Helvetica".to_string(),
        }
    }
}

/// Escape special characters for PDF string literals
fn escape_pdf_string(s: &str) -> String {
    s.chars()
        .map(|c| match c {
            '(' => "\\(".to_string(),
            ')' => "\\)".to_string(),
            '\\' => "\\\\".to_string(),
            _ if c.is_ascii_control() => " ".to_string(),
            _ if c.is_ascii() => c.to_string(),
            _ => "?".to_string(), // Standard 14 fonts cannot show it
        })
        .collect()
}

/// Format a coordinate for a content stream: at most 4 decimals, no exponent
fn fmt_num(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "" | "-" | "-0" => "0".to_string(),
        _ => text.to_string(),
    }
}

/// Clamp a 0-based page index into the document.
///
/// Out-of-range page indexes are pulled back to the last page rather than
/// rejected; only a document without pages has no valid index.
pub fn clamp_page_index(requested: usize, page_count: usize) -> Result<usize> {
    if page_count == 0 {
        return Err(StampError::InvalidPage("Document has no pages".into()));
    }
    Ok(requested.min(page_count - 1))
}

/// Draw `image_png` into `placement` on page `page_index` of `source`, with
/// `caption` below it, using the default caption style
pub fn compose(
    source: &[u8],
    page_index: usize,
    image_png: &[u8],
    placement: &Placement,
    caption: &str,
) -> Result<Vec<u8>> {
    compose_with_style(
        source,
        page_index,
        image_png,
        placement,
        caption,
        &CaptionStyle::default(),
    )
}

pub fn compose_with_style(
    source: &[u8],
    page_index: usize,
    image_png: &[u8],
    placement: &Placement,
    caption: &str,
    style: &CaptionStyle,
) -> Result<Vec<u8>> {
    let pdf = PdfDocument::from_bytes(source)?;
    compose_document(pdf, page_index, image_png, placement, caption, style)
}

/// Compose onto an already parsed document, consuming it
pub fn compose_document(
    mut pdf: PdfDocument,
    page_index: usize,
    image_png: &[u8],
    placement: &Placement,
    caption: &str,
    style: &CaptionStyle,
) -> Result<Vec<u8>> {
    validate_placement(placement)?;

    let page_index = clamp_page_index(page_index, pdf.page_count())?;
    let page_id = pdf.page_id(page_index).ok_or_else(|| {
        StampError::InvalidPage(format!("Page index {} not found", page_index))
    })?;

    let asset = SignatureAsset::decode(image_png)?;
    let image_id = embed_image(&mut pdf.doc, asset)?;
    let font_id = pdf.doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => style.base_font.as_str(),
        "Encoding" => "WinAnsiEncoding",
    });

    let mut resources = page_resources(&pdf, page_id)?;
    let image_name = insert_resource(&pdf.doc, &mut resources, b"XObject", "SigIm", image_id)?;
    let font_name = insert_resource(&pdf.doc, &mut resources, b"Font", "SigF", font_id)?;

    let overlay = overlay_content(&image_name, &font_name, placement, caption, style);
    let contents = wrap_contents(&mut pdf.doc, page_id, overlay)?;

    let page = pdf
        .doc
        .get_object_mut(page_id)
        .and_then(Object::as_dict_mut)
        .map_err(|e| StampError::MalformedDocument(format!("Bad page object: {}", e)))?;
    page.set("Resources", Object::Dictionary(resources));
    page.set("Contents", Object::Array(contents));

    pdf.save_to_bytes()
}

fn validate_placement(placement: &Placement) -> Result<()> {
    let values = [
        placement.x,
        placement.y,
        placement.draw_width,
        placement.draw_height,
    ];
    if values.iter().any(|v| !v.is_finite()) {
        return Err(StampError::InvalidInput(format!(
            "Placement must be finite: {:?}",
            placement
        )));
    }
    if placement.draw_width <= 0.0 || placement.draw_height <= 0.0 {
        return Err(StampError::InvalidInput(format!(
            "Placement size must be positive: {}x{}",
            placement.draw_width, placement.draw_height
        )));
    }
    Ok(())
}

fn deflate(data: &[u8]) -> Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder
        .write_all(data)
        .and_then(|_| encoder.finish())
        .map_err(|e| StampError::InvalidImage(format!("Failed to compress image: {}", e)))
}

fn image_stream(width: u32, height: u32, color_space: &str, data: Vec<u8>) -> Stream {
    let dict = dictionary! {
        "Type" => "XObject",
        "Subtype" => "Image",
        "Width" => width as i64,
        "Height" => height as i64,
        "ColorSpace" => color_space,
        "BitsPerComponent" => 8,
        "Filter" => "FlateDecode",
    };
    Stream::new(dict, data).with_compression(false)
}

/// Add the signature as an Image XObject, with a soft mask when it has
/// transparent pixels. The decoded planes are dropped on return.
fn embed_image(doc: &mut Document, asset: SignatureAsset<'_>) -> Result<ObjectId> {
    let smask_id = match &asset.alpha {
        Some(alpha) if asset.is_translucent() => {
            let mask = image_stream(asset.width, asset.height, "DeviceGray", deflate(alpha)?);
            Some(doc.add_object(mask))
        }
        _ => None,
    };

    let mut image = image_stream(
        asset.width,
        asset.height,
        asset.color_model.pdf_name(),
        deflate(&asset.color)?,
    );
    if let Some(mask_id) = smask_id {
        image.dict.set("SMask", Object::Reference(mask_id));
    }
    Ok(doc.add_object(image))
}

fn resolve_dictionary(doc: &Document, obj: &Object) -> Result<Dictionary> {
    match obj {
        Object::Dictionary(dict) => Ok(dict.clone()),
        Object::Reference(id) => doc
            .get_dictionary(*id)
            .cloned()
            .map_err(|e| StampError::MalformedDocument(format!("Bad resource reference: {}", e))),
        _ => Err(StampError::MalformedDocument(
            "Resource entry is not a dictionary".into(),
        )),
    }
}

/// Owned copy of the page's effective Resources, inherited ones included
fn page_resources(pdf: &PdfDocument, page_id: ObjectId) -> Result<Dictionary> {
    let page = pdf
        .doc
        .get_dictionary(page_id)
        .map_err(|e| StampError::MalformedDocument(format!("Bad page object: {}", e)))?;

    match pdf.inherited_attribute(page, b"Resources") {
        Some(obj) => resolve_dictionary(&pdf.doc, obj),
        None => Ok(Dictionary::new()),
    }
}

/// Register `id` under a fresh name in a resource category, copying the
/// category dictionary so shared dictionaries stay untouched
fn insert_resource(
    doc: &Document,
    resources: &mut Dictionary,
    category: &[u8],
    prefix: &str,
    id: ObjectId,
) -> Result<String> {
    let mut entries = match resources.get(category) {
        Ok(obj) => resolve_dictionary(doc, obj)?,
        Err(_) => Dictionary::new(),
    };

    let mut n = 0u32;
    let name = loop {
        let candidate = format!("{}{}", prefix, n);
        if !entries.has(candidate.as_bytes()) {
            break candidate;
        }
        n += 1;
    };

    entries.set(name.clone(), Object::Reference(id));
    resources.set(category.to_vec(), Object::Dictionary(entries));
    Ok(name)
}

fn overlay_content(
    image_name: &str,
    font_name: &str,
    placement: &Placement,
    caption: &str,
    style: &CaptionStyle,
) -> Vec<u8> {
    format!(
        "q\n\
{w} 0 0 {h} {x} {y} cm\n\
/{image} Do\n\
Q\n\
q\n\
0 0 0 rg\n\
BT\n\
/{font} {fs} Tf\n\
{x} {ty} Td\n\
({text}) Tj\n\
ET\n\
Q\n",
        w = fmt_num(placement.draw_width),
        h = fmt_num(placement.draw_height),
        x = fmt_num(placement.x),
        y = fmt_num(placement.y),
        image = image_name,
        font = font_name,
        fs = fmt_num(style.font_size),
        ty = fmt_num(placement.y - style.offset),
        text = escape_pdf_string(caption),
    )
    .into_bytes()
}

/// References to the page's current content streams, in order
fn existing_contents(doc: &Document, page_id: ObjectId) -> Result<Vec<Object>> {
    let page = doc
        .get_dictionary(page_id)
        .map_err(|e| StampError::MalformedDocument(format!("Bad page object: {}", e)))?;

    match page.get(b"Contents") {
        Ok(Object::Reference(id)) => match doc.get_object(*id) {
            Ok(Object::Array(items)) => Ok(items.clone()),
            Ok(Object::Stream(_)) => Ok(vec![Object::Reference(*id)]),
            _ => Err(StampError::MalformedDocument(
                "Page Contents reference is broken".into(),
            )),
        },
        Ok(Object::Array(items)) => Ok(items.clone()),
        Ok(_) => Err(StampError::MalformedDocument(
            "Page Contents is neither a stream nor an array".into(),
        )),
        Err(_) => Ok(Vec::new()),
    }
}

/// New Contents array: `q`, the original streams, then `Q` and the overlay
fn wrap_contents(doc: &mut Document, page_id: ObjectId, overlay: Vec<u8>) -> Result<Vec<Object>> {
    let existing = existing_contents(doc, page_id)?;

    if existing.is_empty() {
        let overlay_id = doc.add_object(Stream::new(Dictionary::new(), overlay));
        return Ok(vec![Object::Reference(overlay_id)]);
    }

    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    // Leading newline keeps the last original token apart when streams are joined
    let mut closing = b"\nQ\n".to_vec();
    closing.extend(overlay);
    let close_id = doc.add_object(Stream::new(Dictionary::new(), closing));

    let mut contents = Vec::with_capacity(existing.len() + 2);
    contents.push(Object::Reference(open_id));
    contents.extend(existing);
    contents.push(Object::Reference(close_id));
    Ok(contents)
}
