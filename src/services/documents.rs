use super::ServiceError;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Keys the stored document is filed under
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentIdentifier {
    pub subscriber_id: String,
    pub jobid: String,
}

/// An eligibility page to render and store
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DocumentUpload {
    pub html: String,
    pub collection: String,
    pub identifier: DocumentIdentifier,
    pub field: String,
    pub name: String,
}

impl DocumentUpload {
    /// Eligibility confirmation for one patient
    ///
    /// Stored as `"{lname} {fname}_Eligibility_{subscriber_id}.pdf"`.
    pub fn eligibility(
        html: String,
        subscriber_id: &str,
        jobid: &str,
        fname: &str,
        lname: &str,
    ) -> Self {
        Self {
            html,
            collection: "patient".to_string(),
            identifier: DocumentIdentifier {
                subscriber_id: subscriber_id.to_string(),
                jobid: jobid.to_string(),
            },
            field: "eligibility".to_string(),
            name: format!("{} {}_Eligibility_{}.pdf", lname, fname, subscriber_id),
        }
    }
}

/// Store service reply
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct DocumentStatus {
    pub status: String,
}

impl DocumentStatus {
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}

/// Renders HTML to PDF and stores it
#[async_trait]
pub trait DocumentSink: Send + Sync {
    async fn store(&self, upload: &DocumentUpload) -> Result<DocumentStatus, ServiceError>;
}

/// Posts uploads as JSON to the configured render service
pub struct HttpDocumentSink {
    client: Client,
    url: String,
}

impl HttpDocumentSink {
    pub fn new(url: impl Into<String>) -> Result<Self, ServiceError> {
        let client = Client::builder().timeout(Duration::from_secs(60)).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl DocumentSink for HttpDocumentSink {
    async fn store(&self, upload: &DocumentUpload) -> Result<DocumentStatus, ServiceError> {
        let response = self.client.post(&self.url).json(upload).send().await?;

        if !response.status().is_success() {
            return Err(ServiceError::Rejected(format!(
                "render service returned HTTP {}",
                response.status()
            )));
        }

        Ok(response.json::<DocumentStatus>().await?)
    }
}

/// Used when no render service is configured; every upload reports `error`
#[derive(Debug, Default, Clone)]
pub struct NullDocumentSink;

#[async_trait]
impl DocumentSink for NullDocumentSink {
    async fn store(&self, upload: &DocumentUpload) -> Result<DocumentStatus, ServiceError> {
        tracing::debug!("No render service configured, dropping '{}'", upload.name);
        Ok(DocumentStatus {
            status: "error".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_eligibility_upload_shape() {
        let upload = DocumentUpload::eligibility(
            "<html></html>".to_string(),
            "555",
            "42",
            "ANA",
            "DIAZ",
        );

        assert_eq!(upload.name, "DIAZ ANA_Eligibility_555.pdf");

        let value = serde_json::to_value(&upload).unwrap();
        assert_eq!(value["collection"], "patient");
        assert_eq!(value["field"], "eligibility");
        assert_eq!(value["identifier"]["subscriber_id"], "555");
        assert_eq!(value["identifier"]["jobid"], "42");
    }

    #[tokio::test]
    async fn test_null_sink_reports_error() {
        let upload = DocumentUpload::eligibility(String::new(), "1", "2", "a", "b");
        let status = NullDocumentSink.store(&upload).await.unwrap();
        assert!(!status.is_ok());
    }
}
