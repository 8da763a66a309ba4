use anyhow::Result;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::{DocumentId, MembershipId, UserId};

/// Extensions accepted for membership documents
pub const ALLOWED_EXTENSIONS: &[&str] = &["pdf", "jpg", "jpeg", "png", "gif", "doc", "docx"];

/// Blob directory for membership documents
pub const DOCUMENT_ROOT: &str = "membership_documents";

/// Which slot a document fills. A membership holds at most one of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_kind", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    ConfirmationLetter,
    ProofDocument,
}

impl DocumentKind {
    pub const ALL: [DocumentKind; 2] = [DocumentKind::ConfirmationLetter, DocumentKind::ProofDocument];

    /// Form field / JSON key carrying this document
    pub fn field_name(&self) -> &'static str {
        match self {
            DocumentKind::ConfirmationLetter => "confirmation_letter",
            DocumentKind::ProofDocument => "proof_document",
        }
    }

    fn label(&self) -> &'static str {
        match self {
            DocumentKind::ConfirmationLetter => "Confirmation letter",
            DocumentKind::ProofDocument => "Proof document",
        }
    }
}

impl std::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.field_name())
    }
}

impl std::str::FromStr for DocumentKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "confirmation_letter" => Ok(DocumentKind::ConfirmationLetter),
            "proof_document" => Ok(DocumentKind::ProofDocument),
            _ => Err(anyhow::anyhow!("Invalid document kind: {}", s)),
        }
    }
}

/// Which party uploaded a document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "document_uploader", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum UploaderParty {
    Subject,
    Company,
    Admin,
}

/// Document attached to a membership
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct MembershipDocument {
    pub id: DocumentId,
    pub membership_id: MembershipId,
    pub kind: DocumentKind,
    pub path: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: UploaderParty,
    pub uploaded_by_user: UserId,
    pub created_at: DateTime<Utc>,
}

/// Input for storing document metadata
#[derive(Debug, Clone)]
pub struct NewDocument {
    pub membership_id: MembershipId,
    pub kind: DocumentKind,
    pub path: String,
    pub original_name: String,
    pub content_type: String,
    pub size_bytes: i64,
    pub uploaded_by: UploaderParty,
    pub uploaded_by_user: UserId,
}

/// A file received from a client, not yet stored
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadedFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    /// Lower-cased extension of the client file name
    pub fn extension(&self) -> Option<String> {
        std::path::Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    /// Content type sent by the client, or guessed from the extension
    pub fn resolved_content_type(&self) -> String {
        self.content_type
            .clone()
            .filter(|ct| !ct.is_empty() && ct != "application/octet-stream")
            .unwrap_or_else(|| {
                mime_guess::from_path(&self.file_name)
                    .first_or_octet_stream()
                    .essence_str()
                    .to_string()
            })
    }

    /// Check type and size. Returns messages keyed for the given document kind.
    pub fn check(&self, kind: DocumentKind, max_bytes: usize) -> Vec<String> {
        let mut problems = Vec::new();

        let allowed = self
            .extension()
            .map(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
            .unwrap_or(false);
        if !allowed {
            problems.push(format!(
                "{} must be a PDF, JPG, PNG, GIF, DOC, or DOCX file.",
                kind.label()
            ));
        }

        if self.bytes.is_empty() {
            problems.push(format!("{} must not be empty.", kind.label()));
        } else if self.bytes.len() > max_bytes {
            problems.push(format!(
                "{} must not exceed {}KB.",
                kind.label(),
                max_bytes / 1024
            ));
        }

        problems
    }

    /// Blob path for this upload: `membership_documents/<membership>/<uuid>.<ext>`
    pub fn storage_path(&self, membership_id: MembershipId) -> String {
        let ext = self.extension().unwrap_or_else(|| "bin".to_string());
        format!(
            "{}/{}/{}.{}",
            DOCUMENT_ROOT,
            membership_id,
            uuid::Uuid::new_v4(),
            ext
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_allowed_extension() {
        let file = UploadedFile::new("Letter.PDF", vec![1, 2, 3]);
        assert_eq!(file.extension().as_deref(), Some("pdf"));
        assert!(file.check(DocumentKind::ConfirmationLetter, 1024).is_empty());
    }

    #[test]
    fn test_rejects_unknown_extension_and_oversize() {
        let file = UploadedFile::new("payload.exe", vec![0; 2048]);
        let problems = file.check(DocumentKind::ProofDocument, 1024);
        assert_eq!(problems.len(), 2);
        assert!(problems[0].starts_with("Proof document must be a PDF"));
        assert_eq!(problems[1], "Proof document must not exceed 1KB.");
    }

    #[test]
    fn test_rejects_empty_file() {
        let file = UploadedFile::new("scan.png", Vec::new());
        let problems = file.check(DocumentKind::ProofDocument, 1024);
        assert_eq!(problems, vec!["Proof document must not be empty.".to_string()]);
    }

    #[test]
    fn test_content_type_is_guessed() {
        let file = UploadedFile::new("scan.png", vec![1]);
        assert_eq!(file.resolved_content_type(), "image/png");
    }

    #[test]
    fn test_storage_path_layout() {
        let file = UploadedFile::new("scan.jpeg", vec![1]);
        let path = file.storage_path(MembershipId::new(12));
        assert!(path.starts_with("membership_documents/12/"));
        assert!(path.ends_with(".jpeg"));
    }

    #[test]
    fn test_kind_parses_field_names() {
        for kind in DocumentKind::ALL {
            assert_eq!(kind.field_name().parse::<DocumentKind>().unwrap(), kind);
        }
    }
}
