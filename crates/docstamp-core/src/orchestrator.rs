//! Upload and signing pipelines
//!
//! A signing request runs strictly in order through
//! `RECEIVED -> VALIDATED -> LOADED -> PLACED -> COMPOSED -> PERSISTED -> DONE`.
//! Any failure ends in `ERROR` and nothing is written: the signed bytes are
//! only handed to the store once composition has fully succeeded.

use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use crate::compositor::{clamp_page_index, compose_document, CaptionStyle};
use crate::document::{DocumentId, PageSize, PdfDocument};
use crate::error::{Result, StampError};
use crate::placement::{BaseBox, Placement, PlacementRequest};
use crate::store::DocumentStore;

/// Tunables of the signing pipeline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SigningOptions {
    /// Reference box the signature is scaled from
    pub base_box: BaseBox,
    pub caption: CaptionStyle,
    pub min_scale: f64,
    pub max_scale: f64,
    /// Prefix of the public path a stored document is served under
    pub access_prefix: String,
}

impl Default for SigningOptions {
    fn default() -> Self {
        Self {
            base_box: BaseBox::default(),
            caption: CaptionStyle::default(),
            min_scale: 0.5,
            max_scale: 2.0,
            access_prefix: "/uploads".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SigningStage {
    Received,
    Validated,
    Loaded,
    Placed,
    Composed,
    Persisted,
    Done,
    Error,
}

impl std::fmt::Display for SigningStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SigningStage::Received => "RECEIVED",
            SigningStage::Validated => "VALIDATED",
            SigningStage::Loaded => "LOADED",
            SigningStage::Placed => "PLACED",
            SigningStage::Composed => "COMPOSED",
            SigningStage::Persisted => "PERSISTED",
            SigningStage::Done => "DONE",
            SigningStage::Error => "ERROR",
        };
        f.write_str(name)
    }
}

/// Inputs of one signing request.
///
/// Every field starts out absent; [`SigningService::sign`] reports the first
/// missing one as [`StampError::MissingInput`].
#[derive(Debug, Clone, Default)]
pub struct SignRequest {
    pub document_id: String,
    pub signature_png: Vec<u8>,
    /// 1-based page number
    pub page_number: Option<i64>,
    pub x_percent: Option<f64>,
    pub y_percent: Option<f64>,
    pub scale: Option<f64>,
    pub output_name: Option<String>,
}

impl SignRequest {
    pub fn new(document_id: impl Into<String>, signature_png: Vec<u8>) -> Self {
        Self {
            document_id: document_id.into(),
            signature_png,
            ..Default::default()
        }
    }

    pub fn page(mut self, page_number: i64) -> Self {
        self.page_number = Some(page_number);
        self
    }

    pub fn position(mut self, x_percent: f64, y_percent: f64) -> Self {
        self.x_percent = Some(x_percent);
        self.y_percent = Some(y_percent);
        self
    }

    pub fn scale(mut self, scale: f64) -> Self {
        self.scale = Some(scale);
        self
    }

    pub fn output_name(mut self, name: impl Into<String>) -> Self {
        self.output_name = Some(name.into());
        self
    }
}

/// A request that passed the RECEIVED and VALIDATED checks
struct ValidatedRequest<'a> {
    document_id: DocumentId,
    signature_png: &'a [u8],
    placement: PlacementRequest,
    output_name: &'a str,
}

/// Result of [`SigningService::upload`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UploadedDocument {
    pub document_id: DocumentId,
    pub access_path: String,
    pub page_count: usize,
    pub page_sizes: Vec<PageSize>,
    /// Hex SHA-256 of the stored bytes
    pub sha256: String,
}

/// Result of [`SigningService::sign`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SignedDocument {
    pub document_id: DocumentId,
    pub access_path: String,
    /// Placement as requested, with the page index after clamping
    pub request: PlacementRequest,
    pub placement: Placement,
    pub page_count: usize,
    pub caption: String,
}

/// Caption drawn under a signature, e.g. `Signed on: 3/5/2024, 2:07:09 PM`
pub fn caption_for<Tz: TimeZone>(signed_at: &DateTime<Tz>) -> String
where
    Tz::Offset: std::fmt::Display,
{
    format!(
        "Signed on: {}",
        signed_at.format("%-m/%-d/%Y, %-I:%M:%S %p")
    )
}

pub struct SigningService<S> {
    store: S,
    options: SigningOptions,
}

impl<S: DocumentStore> SigningService<S> {
    pub fn new(store: S) -> Self {
        Self::with_options(store, SigningOptions::default())
    }

    pub fn with_options(store: S, options: SigningOptions) -> Self {
        Self { store, options }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn options(&self) -> &SigningOptions {
        &self.options
    }

    /// Public path a stored document is served under
    pub fn access_path(&self, id: &DocumentId) -> String {
        format!("{}/{}", self.options.access_prefix.trim_end_matches('/'), id)
    }

    /// Validate and store an uploaded PDF
    pub fn upload(&self, bytes: &[u8]) -> Result<UploadedDocument> {
        if bytes.is_empty() {
            return Err(StampError::MissingInput("PDF file".into()));
        }

        let pdf = PdfDocument::from_bytes(bytes)?;
        let page_count = pdf.page_count();
        if page_count == 0 {
            return Err(StampError::MalformedDocument(
                "Document has no pages".into(),
            ));
        }
        let page_sizes = pdf.page_sizes()?;

        let document_id = self.store.put(bytes)?;
        let sha256 = hex::encode(Sha256::digest(bytes));
        info!(
            document_id = %document_id,
            page_count,
            bytes = bytes.len(),
            "Document uploaded"
        );

        Ok(UploadedDocument {
            access_path: self.access_path(&document_id),
            document_id,
            page_count,
            page_sizes,
            sha256,
        })
    }

    /// Sign a stored document, captioned with the current local time
    pub fn sign(&self, request: &SignRequest) -> Result<SignedDocument> {
        self.sign_at(request, &Local::now())
    }

    /// Sign a stored document with the caption time given explicitly
    pub fn sign_at<Tz: TimeZone>(
        &self,
        request: &SignRequest,
        signed_at: &DateTime<Tz>,
    ) -> Result<SignedDocument>
    where
        Tz::Offset: std::fmt::Display,
    {
        let mut stage = SigningStage::Received;
        let result = self.run(request, signed_at, &mut stage);

        match &result {
            Ok(signed) => info!(
                document_id = %signed.document_id,
                source_id = %request.document_id,
                page_index = signed.request.page_index,
                x = signed.placement.x,
                y = signed.placement.y,
                width = signed.placement.draw_width,
                height = signed.placement.draw_height,
                "Document signed"
            ),
            Err(e) => warn!(
                stage = %SigningStage::Error,
                failed_at = %stage,
                kind = %e.kind(),
                error = %e,
                "Signing failed"
            ),
        }
        result
    }

    fn run<Tz: TimeZone>(
        &self,
        request: &SignRequest,
        signed_at: &DateTime<Tz>,
        stage: &mut SigningStage,
    ) -> Result<SignedDocument>
    where
        Tz::Offset: std::fmt::Display,
    {
        advance(stage, SigningStage::Received);
        let validated = self.validate(request, stage)?;

        advance(stage, SigningStage::Loaded);
        let source = self.store.get(&validated.document_id)?;
        let pdf = PdfDocument::from_bytes(&source)?;
        let page_count = pdf.page_count();

        advance(stage, SigningStage::Placed);
        let page_index = clamp_page_index(validated.placement.page_index, page_count)?;
        let placement_request = PlacementRequest {
            page_index,
            ..validated.placement
        };
        let page_size = pdf.page_size(page_index)?;
        let placement = placement_request.resolve(page_size, self.options.base_box);

        advance(stage, SigningStage::Composed);
        let caption = caption_for(signed_at);
        let signed = compose_document(
            pdf,
            page_index,
            validated.signature_png,
            &placement,
            &caption,
            &self.options.caption,
        )?;

        advance(stage, SigningStage::Persisted);
        let document_id = self.store.put_named(validated.output_name, &signed)?;

        advance(stage, SigningStage::Done);
        Ok(SignedDocument {
            access_path: self.access_path(&document_id),
            document_id,
            request: placement_request,
            placement,
            page_count,
            caption,
        })
    }

    /// RECEIVED and VALIDATED checks
    fn validate<'a>(
        &self,
        request: &'a SignRequest,
        stage: &mut SigningStage,
    ) -> Result<ValidatedRequest<'a>> {
        if request.document_id.trim().is_empty() {
            return Err(StampError::MissingInput("document identifier".into()));
        }
        if request.signature_png.is_empty() {
            return Err(StampError::MissingInput("signature image".into()));
        }
        let page_number = required(request.page_number, "page number")?;
        let x_percent = required(request.x_percent, "x position")?;
        let y_percent = required(request.y_percent, "y position")?;
        let scale = required(request.scale, "scale")?;
        let output_name = match request.output_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => name,
            _ => return Err(StampError::MissingInput("output name".into())),
        };

        advance(stage, SigningStage::Validated);
        if page_number < 1 {
            return Err(StampError::InvalidInput(format!(
                "Page number must be a positive integer, got {}",
                page_number
            )));
        }
        if !x_percent.is_finite() || !y_percent.is_finite() {
            return Err(StampError::InvalidInput(format!(
                "Position must be numeric, got ({}, {})",
                x_percent, y_percent
            )));
        }
        if !scale.is_finite() || scale < self.options.min_scale || scale > self.options.max_scale {
            return Err(StampError::InvalidInput(format!(
                "Scale must be between {} and {}, got {}",
                self.options.min_scale, self.options.max_scale, scale
            )));
        }
        let document_id = DocumentId::parse(&request.document_id)?;

        // Too large for usize only on narrow targets; clamped later anyway
        let page_index = usize::try_from(page_number - 1).unwrap_or(usize::MAX);

        Ok(ValidatedRequest {
            document_id,
            signature_png: &request.signature_png,
            placement: PlacementRequest {
                page_index,
                x_percent,
                y_percent,
                scale,
            },
            output_name,
        })
    }
}

fn required<T>(value: Option<T>, what: &str) -> Result<T> {
    value.ok_or_else(|| StampError::MissingInput(what.to_string()))
}

fn advance(stage: &mut SigningStage, next: SigningStage) {
    debug!(stage = %next, "Signing stage");
    *stage = next;
}
