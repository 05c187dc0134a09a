//! HTTP handlers for the Docstamp API

use std::sync::Arc;

use axum::{
    extract::{multipart::Field, rejection::JsonRejection, Multipart, State},
    Json,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use docstamp_core::{SignRequest, StampError};

use crate::error::ApiError;
use crate::models::*;
use crate::state::AppState;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// Health check endpoint
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "Server is running".to_string(),
    })
}

/// Accept a PDF as multipart field `pdfFile` and store it
pub async fn upload_pdf(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut pdf = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            ensure_pdf_field(&field)?;
            pdf = Some(field.bytes().await?);
            break;
        }
    }
    let pdf = pdf.ok_or_else(|| StampError::MissingInput("No file uploaded".into()))?;

    let uploaded = tokio::task::spawn_blocking(move || state.service.upload(&pdf))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(Json(UploadResponse {
        message: "File uploaded successfully".to_string(),
        file_name: uploaded.document_id.to_string(),
        file_path: uploaded.access_path,
        page_count: uploaded.page_count,
        page_sizes: uploaded.page_sizes,
        sha256: uploaded.sha256,
    }))
}

fn ensure_pdf_field(field: &Field<'_>) -> Result<(), ApiError> {
    match field.content_type() {
        Some("application/pdf") => Ok(()),
        _ => Err(ApiError::InvalidRequest(
            "Only PDF files are allowed".to_string(),
        )),
    }
}

/// Stamp a signature onto a stored document
pub async fn add_signature(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<AddSignatureRequest>, JsonRejection>,
) -> Result<Json<AddSignatureResponse>, ApiError> {
    let Json(req) = payload?;
    let request = sign_request(req)?;

    let signed = tokio::task::spawn_blocking(move || state.service.sign(&request))
        .await
        .map_err(|e| ApiError::Internal(e.into()))??;

    Ok(Json(AddSignatureResponse {
        message: "Signature added successfully".to_string(),
        file_name: signed.document_id.to_string(),
        file_path: signed.access_path,
        page_index: signed.request.page_index,
        page_count: signed.page_count,
        placement: signed.placement,
        caption: signed.caption,
    }))
}

/// Apply request defaults and decode the signature image
fn sign_request(req: AddSignatureRequest) -> Result<SignRequest, ApiError> {
    let file_name = req.file_name.filter(|f| !f.trim().is_empty());
    let signature_data = req.signature_data.filter(|s| !s.trim().is_empty());
    let (file_name, signature_data) = match (file_name, signature_data) {
        (Some(file_name), Some(signature_data)) => (file_name, signature_data),
        _ => {
            return Err(StampError::MissingInput(
                "File name and signature data are required".into(),
            )
            .into())
        }
    };

    let signature_png = decode_signature(&signature_data)?;
    let output_name = req
        .new_file_name
        .filter(|n| !n.trim().is_empty())
        .unwrap_or_else(|| format!("signed_{}", file_name));

    Ok(SignRequest::new(file_name, signature_png)
        .page(req.signature_page.unwrap_or(DEFAULT_SIGNATURE_PAGE))
        .position(
            req.position_x.unwrap_or(DEFAULT_POSITION_X),
            req.position_y.unwrap_or(DEFAULT_POSITION_Y),
        )
        .scale(req.scale.unwrap_or(DEFAULT_SCALE))
        .output_name(output_name))
}

/// Decode a PNG data URL; the `data:image/png;base64,` prefix is optional
fn decode_signature(data: &str) -> Result<Vec<u8>, ApiError> {
    let data = data.trim();
    let encoded = data.strip_prefix(PNG_DATA_URL_PREFIX).unwrap_or(data);
    if encoded.starts_with("data:") {
        return Err(StampError::InvalidImage("Signature must be a PNG data URL".into()).into());
    }
    BASE64
        .decode(encoded)
        .map_err(|e| StampError::InvalidImage(format!("Invalid signature base64: {}", e)).into())
}
