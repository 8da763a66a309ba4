//! Multipart form parsing for the upload endpoints

use axum::extract::multipart::{Field, Multipart, MultipartError};

use crate::common::MembershipId;
use crate::domains::membership::data::{DetailsInput, ProposeMembershipInput};
use crate::domains::membership::{
    DocumentKind, FieldErrors, MembershipError, MembershipResult, UploadedFile,
};

fn malformed(e: MultipartError) -> MembershipError {
    MembershipError::validation("body", e.body_text())
}

async fn next_field(multipart: &mut Multipart) -> MembershipResult<Option<Field<'_>>> {
    multipart.next_field().await.map_err(malformed)
}

async fn read_file(field: Field<'_>) -> MembershipResult<UploadedFile> {
    let file_name = field.file_name().unwrap_or_default().to_string();
    let content_type = field.content_type().map(str::to_string);
    let bytes = field.bytes().await.map_err(malformed)?;

    let mut file = UploadedFile::new(file_name, bytes);
    file.content_type = content_type;
    Ok(file)
}

async fn read_text(field: Field<'_>) -> MembershipResult<String> {
    field.text().await.map_err(malformed)
}

/// Parse an integer form value, recording a message under `key` when it isn't one
fn parse_id(key: &str, raw: &str, errors: &mut FieldErrors) -> Option<i64> {
    match raw.trim().parse::<i64>() {
        Ok(id) => Some(id),
        Err(_) => {
            errors.add(
                key,
                format!("The {} must be an integer.", key.replace('_', " ")),
            );
            None
        }
    }
}

/// Document slot for a form field name, if it is one
fn document_kind(name: &str) -> Option<DocumentKind> {
    match name {
        "confirmation_letter" | "confirmationLetter" => Some(DocumentKind::ConfirmationLetter),
        "proof_document" | "proofDocument" => Some(DocumentKind::ProofDocument),
        _ => None,
    }
}

/// `/requestMembershipCompanySide`
pub async fn propose_form(mut multipart: Multipart) -> MembershipResult<ProposeMembershipInput> {
    let mut input = ProposeMembershipInput::default();
    let mut errors = FieldErrors::new();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(kind) = document_kind(&name) {
            let file = read_file(field).await?;
            match kind {
                DocumentKind::ConfirmationLetter => input.confirmation_letter = Some(file),
                DocumentKind::ProofDocument => input.proof_document = Some(file),
            }
            continue;
        }

        let value = read_text(field).await?;
        match name.as_str() {
            "companyId" | "company_id" | "page_id" => {
                input.company_id = parse_id("company_id", &value, &mut errors)
            }
            "user_page_id" | "userPageId" => {
                input.user_page_id = parse_id("user_page_id", &value, &mut errors)
            }
            "subject_type" | "subjectType" => input.subject_type = Some(value),
            _ => {
                input.details.set_field(&name, value)?;
            }
        }
    }

    errors.into_result(input)
}

/// `/updateMembership/{id}`: position fields plus optional replacement documents
pub async fn details_form(
    mut multipart: Multipart,
) -> MembershipResult<(DetailsInput, Vec<(DocumentKind, UploadedFile)>)> {
    let mut details = DetailsInput::default();
    let mut documents = Vec::new();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();

        if let Some(kind) = document_kind(&name) {
            let file = read_file(field).await?;
            // A later part for the same slot wins
            documents.retain(|(existing, _)| *existing != kind);
            documents.push((kind, file));
            continue;
        }

        let value = read_text(field).await?;
        details.set_field(&name, value)?;
    }

    Ok((details, documents))
}

/// `/membershipDocuments/{id}`: a `kind` and a `file`
pub async fn document_form(mut multipart: Multipart) -> MembershipResult<(DocumentKind, UploadedFile)> {
    let mut kind = None;
    let mut file = None;

    while let Some(field) = next_field(&mut multipart).await? {
        match field.name().unwrap_or_default() {
            "kind" => kind = Some(read_text(field).await?),
            "file" => file = Some(read_file(field).await?),
            _ => {}
        }
    }

    let mut errors = FieldErrors::new();
    let kind = match kind {
        None => {
            errors.add("kind", "The kind field is required.");
            None
        }
        Some(raw) => match raw.trim().parse::<DocumentKind>() {
            Ok(kind) => Some(kind),
            Err(_) => {
                errors.add("kind", "The selected kind is invalid.");
                None
            }
        },
    };
    if file.is_none() {
        errors.add("file", "The file field is required.");
    }

    match (kind, file) {
        (Some(kind), Some(file)) if errors.is_empty() => Ok((kind, file)),
        _ => Err(MembershipError::Validation(errors)),
    }
}

/// Company response to a request
pub struct ResponseForm {
    pub membership_id: MembershipId,
    pub confirmation_letter: Option<UploadedFile>,
    pub proof_document: Option<UploadedFile>,
}

/// `/storecompaniesresponses`
pub async fn response_form(mut multipart: Multipart) -> MembershipResult<ResponseForm> {
    let mut membership_id = None;
    let mut confirmation_letter = None;
    let mut proof_document = None;
    let mut errors = FieldErrors::new();

    while let Some(field) = next_field(&mut multipart).await? {
        let name = field.name().unwrap_or_default().to_string();
        match document_kind(&name) {
            Some(DocumentKind::ConfirmationLetter) => {
                confirmation_letter = Some(read_file(field).await?)
            }
            Some(DocumentKind::ProofDocument) => proof_document = Some(read_file(field).await?),
            None if name == "membership_id" || name == "membershipId" => {
                let value = read_text(field).await?;
                membership_id = parse_id("membership_id", &value, &mut errors);
            }
            None => {}
        }
    }

    if membership_id.is_none() && !errors.contains("membership_id") {
        errors.add("membership_id", "The membership id field is required.");
    }

    match membership_id {
        Some(id) if errors.is_empty() => Ok(ResponseForm {
            membership_id: MembershipId::new(id),
            confirmation_letter,
            proof_document,
        }),
        _ => Err(MembershipError::Validation(errors)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_kind_field_names() {
        assert_eq!(
            document_kind("confirmation_letter"),
            Some(DocumentKind::ConfirmationLetter)
        );
        assert_eq!(document_kind("proofDocument"), Some(DocumentKind::ProofDocument));
        assert_eq!(document_kind("jobTitle"), None);
    }

    #[test]
    fn test_parse_id_records_error() {
        let mut errors = FieldErrors::new();
        assert_eq!(parse_id("company_id", " 3 ", &mut errors), Some(3));
        assert!(errors.is_empty());

        assert_eq!(parse_id("company_id", "three", &mut errors), None);
        assert_eq!(
            errors.get("company_id"),
            Some(&["The company id must be an integer.".to_string()][..])
        );
    }
}
