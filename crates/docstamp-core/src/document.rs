//! PDF container parsing, page geometry and document identifiers

use chrono::Utc;
use lopdf::{Dictionary, Document, Object, ObjectId};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StampError};

/// Page tree depth after which MediaBox inheritance gives up
const MAX_INHERITANCE_DEPTH: usize = 32;

/// Longest output name kept when deriving an identifier
const MAX_NAME_CHARS: usize = 120;

/// Size of one page in PDF points
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PageSize {
    pub width: f64,
    pub height: f64,
}

impl PageSize {
    pub fn letter() -> Self {
        Self {
            width: 612.0,
            height: 792.0,
        }
    }

    pub fn a4() -> Self {
        Self {
            width: 595.0,
            height: 842.0,
        }
    }
}

/// Opaque identifier of a stored document.
///
/// Identifiers double as file names in [`crate::store::FsStore`], so they are
/// restricted to `[A-Za-z0-9._-]` and can never name a path outside the store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(String);

impl DocumentId {
    /// Validate an identifier received from a caller
    pub fn parse(raw: &str) -> Result<Self> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(StampError::MissingInput("document identifier".into()));
        }
        if raw.starts_with('.') || raw.contains("..") {
            return Err(StampError::InvalidInput(format!(
                "Invalid document identifier: {}",
                raw
            )));
        }
        if !raw.chars().all(is_id_char) {
            return Err(StampError::InvalidInput(format!(
                "Invalid document identifier: {}",
                raw
            )));
        }
        Ok(Self(raw.to_string()))
    }

    /// Fresh identifier for an uploaded document: `<millis>-<uuid>.pdf`
    pub fn generate() -> Self {
        Self(format!(
            "{}-{}.pdf",
            Utc::now().timestamp_millis(),
            Uuid::new_v4()
        ))
    }

    /// Fresh identifier derived from a caller-chosen output name:
    /// `<millis>-<8 hex>-<sanitised name>.pdf`
    pub fn derived_from(name: &str) -> Self {
        let simple = Uuid::new_v4().simple().to_string();
        Self(format!(
            "{}-{}-{}",
            Utc::now().timestamp_millis(),
            &simple[..8],
            sanitize_output_name(name)
        ))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for DocumentId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-')
}

/// Reduce a caller-supplied file name to the identifier charset.
///
/// - Drops any directory components
/// - Replaces every other character with `_`
/// - Collapses dot runs so the result can never contain `..`
/// - Guarantees a `.pdf` extension and a non-empty stem
pub fn sanitize_output_name(name: &str) -> String {
    let base = name
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();

    let mut sanitized = String::with_capacity(base.len());
    for c in base.chars().take(MAX_NAME_CHARS) {
        if c == '.' && sanitized.ends_with('.') {
            continue;
        }
        sanitized.push(if is_id_char(c) { c } else { '_' });
    }

    let trimmed = sanitized.trim_matches('.');
    let stem = match trimmed.len().checked_sub(4) {
        Some(cut) if trimmed[cut..].eq_ignore_ascii_case(".pdf") => &trimmed[..cut],
        _ => trimmed,
    };
    let stem = stem.trim_end_matches('.');

    if stem.is_empty() {
        "document.pdf".to_string()
    } else {
        format!("{}.pdf", stem)
    }
}

/// A parsed PDF container
pub struct PdfDocument {
    pub(crate) doc: Document,
}

impl PdfDocument {
    /// Parse raw PDF bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.is_empty() {
            return Err(StampError::MalformedDocument("Document is empty".into()));
        }
        let doc = Document::load_mem(bytes)
            .map_err(|e| StampError::MalformedDocument(format!("PDF parse error: {}", e)))?;
        Ok(Self { doc })
    }

    /// Number of pages in the page tree
    pub fn page_count(&self) -> usize {
        self.doc.get_pages().len()
    }

    /// Object id of the page at a 0-based index
    pub fn page_id(&self, index: usize) -> Option<ObjectId> {
        self.doc.get_pages().values().nth(index).copied()
    }

    /// Size of the page at a 0-based index
    pub fn page_size(&self, index: usize) -> Result<PageSize> {
        let page_id = self.page_id(index).ok_or_else(|| {
            StampError::InvalidPage(format!(
                "Page index {} out of range for {} page(s)",
                index,
                self.page_count()
            ))
        })?;
        self.page_size_of(page_id)
    }

    /// Sizes of every page, in page order
    pub fn page_sizes(&self) -> Result<Vec<PageSize>> {
        self.doc
            .get_pages()
            .values()
            .map(|page_id| self.page_size_of(*page_id))
            .collect()
    }

    fn page_size_of(&self, page_id: ObjectId) -> Result<PageSize> {
        let page = self
            .doc
            .get_dictionary(page_id)
            .map_err(|e| StampError::MalformedDocument(format!("Bad page object: {}", e)))?;

        let [x1, y1, x2, y2] = match self.inherited_attribute(page, b"MediaBox") {
            Some(obj) => self.parse_rect(obj)?,
            None => return Ok(PageSize::letter()),
        };

        let size = PageSize {
            width: (x2 - x1).abs(),
            height: (y2 - y1).abs(),
        };
        if size.width <= 0.0 || size.height <= 0.0 {
            return Err(StampError::MalformedDocument(format!(
                "Page has degenerate MediaBox {}x{}",
                size.width, size.height
            )));
        }
        Ok(size)
    }

    /// Look up a page attribute, following `Parent` links for inheritable keys
    pub(crate) fn inherited_attribute<'a>(
        &'a self,
        page: &'a Dictionary,
        key: &[u8],
    ) -> Option<&'a Object> {
        let mut current = page;
        for _ in 0..MAX_INHERITANCE_DEPTH {
            if let Ok(value) = current.get(key) {
                return Some(value);
            }
            let parent_id = current.get(b"Parent").ok()?.as_reference().ok()?;
            current = self.doc.get_dictionary(parent_id).ok()?;
        }
        None
    }

    /// Parse a PDF rectangle array into `[x1, y1, x2, y2]`
    fn parse_rect(&self, obj: &Object) -> Result<[f64; 4]> {
        let arr = match obj {
            Object::Array(a) => a,
            Object::Reference(id) => self
                .doc
                .get_object(*id)
                .and_then(Object::as_array)
                .map_err(|e| StampError::MalformedDocument(format!("Bad MediaBox: {}", e)))?,
            _ => {
                return Err(StampError::MalformedDocument(
                    "MediaBox is not an array".into(),
                ))
            }
        };

        if arr.len() != 4 {
            return Err(StampError::MalformedDocument(format!(
                "MediaBox has {} elements, expected 4",
                arr.len()
            )));
        }

        let mut values = [0.0f64; 4];
        for (slot, obj) in values.iter_mut().zip(arr) {
            *slot = self.extract_number(obj)?;
        }
        Ok(values)
    }

    fn extract_number(&self, obj: &Object) -> Result<f64> {
        match obj {
            Object::Integer(i) => Ok(*i as f64),
            Object::Real(r) => Ok(*r as f64),
            Object::Reference(id) => {
                let resolved = self.doc.get_object(*id).map_err(|e| {
                    StampError::MalformedDocument(format!("Failed to resolve: {}", e))
                })?;
                self.extract_number(resolved)
            }
            _ => Err(StampError::MalformedDocument(
                "Expected number in rectangle".into(),
            )),
        }
    }

    /// Serialize the document
    pub fn save_to_bytes(&mut self) -> Result<Vec<u8>> {
        let mut buffer = Vec::new();
        self.doc
            .save_to(&mut buffer)
            .map_err(|e| StampError::MalformedDocument(format!("Failed to save PDF: {}", e)))?;
        Ok(buffer)
    }
}

/// Parse PDF bytes and return per-page sizes in page order
pub fn page_geometry(bytes: &[u8]) -> Result<Vec<PageSize>> {
    PdfDocument::from_bytes(bytes)?.page_sizes()
}
