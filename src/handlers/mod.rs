// src/handlers/mod.rs

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

use crate::export::ExportFile;

pub mod auth;
pub mod proforma;
pub mod responses;
pub mod surveys;
pub mod take;

/// Sends an export as a file download.
impl IntoResponse for ExportFile {
    fn into_response(self) -> Response {
        let disposition = format!("attachment; filename=\"{}\"", self.filename);
        (
            [
                (header::CONTENT_TYPE, self.format.content_type().to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}
