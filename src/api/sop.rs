use std::path::Path;

use super::UniBroApi;
use crate::error::{ApiError, Result};
use crate::models::request::ApiRequest;
use crate::models::{ReviewData, SopReview};

impl UniBroApi {
    /// Upload a statement-of-purpose PDF and return the reviewer's feedback
    pub async fn review_sop(&self, path: &Path) -> Result<ReviewData> {
        let file_name = check_pdf_name(path)?;

        let bytes = tokio::fs::read(path).await.map_err(|e| {
            ApiError::ValidationError(format!("Cannot read {}: {}", path.display(), e))
        })?;

        tracing::info!(file = %file_name, size = bytes.len(), "Uploading SOP for review");

        let request =
            ApiRequest::post("/sop-review").with_file("file", file_name, "application/pdf", bytes);
        let review: SopReview = self.http.send_json(&request).await?;

        review.review.ok_or_else(|| {
            ApiError::Internal(anyhow::anyhow!("SOP review response has no review"))
        })
    }
}

/// Only `.pdf` uploads are accepted by the reviewer
fn check_pdf_name(path: &Path) -> Result<String> {
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();

    if !file_name.ends_with(".pdf") {
        return Err(ApiError::ValidationError(
            "Only PDF files are allowed.".to_string(),
        ));
    }
    Ok(file_name.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_pdf_name() {
        assert_eq!(check_pdf_name(Path::new("/tmp/sop.pdf")).unwrap(), "sop.pdf");
        assert!(check_pdf_name(Path::new("/tmp/sop.docx")).is_err());
        assert!(check_pdf_name(Path::new("/tmp/SOP.PDF")).is_err());
        assert!(check_pdf_name(Path::new("/")).is_err());
    }
}
