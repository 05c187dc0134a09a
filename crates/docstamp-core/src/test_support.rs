//! Fixture builders shared by the unit tests

use lopdf::{dictionary, Dictionary, Document, Object, ObjectId, Stream};

pub struct PageSpec {
    pub media_box: [f64; 4],
    pub content: String,
}

impl PageSpec {
    pub fn letter(text: &str) -> Self {
        Self::sized(612.0, 792.0, text)
    }

    pub fn sized(width: f64, height: f64, text: &str) -> Self {
        Self {
            media_box: [0.0, 0.0, width, height],
            content: format!("BT /F1 24 Tf 72 700 Td ({}) Tj ET", text),
        }
    }
}

fn finish(mut doc: Document, pages_id: ObjectId, kids: Vec<Object>) -> Vec<u8> {
    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// One page per `PageSpec`, all sharing one indirect Resources dictionary
pub fn build_pdf(pages: &[PageSpec]) -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for spec in pages {
        let content_id = doc.add_object(Stream::new(
            Dictionary::new(),
            spec.content.clone().into_bytes(),
        ));
        let media_box: Vec<Object> = spec
            .media_box
            .iter()
            .map(|v| Object::Real(*v as f32))
            .collect();
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => media_box,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(Object::Reference(page_id));
    }
    finish(doc, pages_id, kids)
}

/// Pages without their own MediaBox or Resources; both live on the Pages node
pub fn build_pdf_with_inherited_media_box(count: usize, media_box: [i64; 4]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let mut kids = Vec::new();
    for _ in 0..count {
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
        });
        kids.push(Object::Reference(page_id));
    }

    let node_count = kids.len() as i64;
    let media_box: Vec<Object> = media_box.iter().map(|v| Object::Integer(*v)).collect();
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => node_count,
            "MediaBox" => media_box,
            "Resources" => Dictionary::new(),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut buffer = Vec::new();
    doc.save_to(&mut buffer).unwrap();
    buffer
}

/// Catalog with an empty page tree
pub fn build_empty_pdf() -> Vec<u8> {
    let mut doc = Document::with_version("1.7");
    let pages_id = doc.new_object_id();
    finish(doc, pages_id, Vec::new())
}

pub fn encode_png(width: u32, height: u32, color: png::ColorType, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    {
        let mut encoder = png::Encoder::new(&mut out, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        let mut writer = encoder.write_header().unwrap();
        writer.write_image_data(data).unwrap();
    }
    out
}

/// A transparent RGBA canvas with a diagonal ink pattern, like a drawn signature
pub fn signature_png(width: u32, height: u32) -> Vec<u8> {
    let mut data = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            if (x + y) % 7 == 0 {
                data.extend_from_slice(&[0, 0, 0, 255]);
            } else {
                data.extend_from_slice(&[0, 0, 0, 0]);
            }
        }
    }
    encode_png(width, height, png::ColorType::Rgba, &data)
}
