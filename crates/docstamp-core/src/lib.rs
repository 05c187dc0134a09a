//! Docstamp core: places a drawn signature and a "Signed on" caption onto one
//! page of a stored PDF and stores the result as a new document.
//!
//! - [`store`]: document persistence ([`FsStore`], [`MemoryStore`])
//! - [`placement`]: percentage placement to absolute PDF coordinates
//! - [`compositor`]: draws the image and caption into the page content
//! - [`orchestrator`]: the upload and signing pipelines
//!
//! ```no_run
//! use docstamp_core::{FsStore, SignRequest, SigningService};
//!
//! # fn main() -> docstamp_core::Result<()> {
//! let service = SigningService::new(FsStore::new("./uploads")?);
//! let uploaded = service.upload(&std::fs::read("contract.pdf").unwrap_or_default())?;
//! let request = SignRequest::new(uploaded.document_id.as_str(), std::fs::read("sig.png").unwrap_or_default())
//!     .page(1)
//!     .position(50.0, 10.0)
//!     .scale(1.0)
//!     .output_name("signed_contract.pdf");
//! let signed = service.sign(&request)?;
//! println!("{}", signed.access_path);
//! # Ok(())
//! # }
//! ```

pub mod compositor;
pub mod document;
pub mod error;
pub mod orchestrator;
pub mod placement;
pub mod signature;
pub mod store;

#[cfg(test)]
mod test_support;

pub use compositor::{clamp_page_index, compose, compose_with_style, CaptionStyle};
pub use document::{page_geometry, sanitize_output_name, DocumentId, PageSize, PdfDocument};
pub use error::{ErrorKind, Result, StampError};
pub use orchestrator::{
    caption_for, SignRequest, SignedDocument, SigningOptions, SigningService, SigningStage,
    UploadedDocument,
};
pub use placement::{resolve, BaseBox, Placement, PlacementRequest};
pub use signature::{ColorModel, SignatureAsset};
pub use store::{DocumentStore, FsStore, MemoryStore};
