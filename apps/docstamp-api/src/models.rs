//! Request and response bodies

use docstamp_core::{PageSize, Placement};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SIGNATURE_PAGE: i64 = 1;
pub const DEFAULT_POSITION_X: f64 = 50.0;
pub const DEFAULT_POSITION_Y: f64 = 10.0;
pub const DEFAULT_SCALE: f64 = 1.0;

/// Multipart field carrying the uploaded PDF
pub const UPLOAD_FIELD: &str = "pdfFile";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub file_name: String,
    pub file_path: String,
    pub page_count: usize,
    pub page_sizes: Vec<PageSize>,
    pub sha256: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSignatureRequest {
    /// Identifier returned by the upload
    #[serde(default)]
    pub file_name: Option<String>,
    /// PNG, as a `data:image/png;base64,` URL or bare base64
    #[serde(default)]
    pub signature_data: Option<String>,
    /// 1-based page number, default 1
    #[serde(default)]
    pub signature_page: Option<i64>,
    /// Horizontal centre in percent of page width, default 50
    #[serde(default)]
    pub position_x: Option<f64>,
    /// Bottom edge in percent of page height from the bottom, default 10
    #[serde(default)]
    pub position_y: Option<f64>,
    #[serde(default)]
    pub scale: Option<f64>,
    /// Default `signed_<fileName>`
    #[serde(default)]
    pub new_file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddSignatureResponse {
    pub message: String,
    pub file_name: String,
    pub file_path: String,
    /// 0-based page the signature landed on
    pub page_index: usize,
    pub page_count: usize,
    pub placement: Placement,
    pub caption: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}
