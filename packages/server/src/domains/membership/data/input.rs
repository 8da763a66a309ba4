//! Client input for membership operations
//!
//! Clients send camelCase JSON (`jobTitle`) from the request screens and
//! snake_case form fields (`job_title`) from the edit screen; both are
//! accepted. Validation collects every problem before failing, keyed by the
//! snake_case field name.

use chrono::NaiveDate;
use serde::Deserialize;

use crate::common::PageId;
use crate::domains::membership::error::{FieldErrors, MembershipError, MembershipResult};
use crate::domains::membership::models::{
    DocumentKind, MembershipDetails, Subject, SubjectKind, UploadedFile,
};

const MAX_TEXT_LEN: usize = 255;
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Interpret a form checkbox / boolean field
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" | "" => Some(false),
        _ => None,
    }
}

fn trimmed(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn required_text(
    value: Option<String>,
    field: &str,
    label: &str,
    errors: &mut FieldErrors,
) -> Option<String> {
    match trimmed(value) {
        None => {
            errors.add(field, format!("The {} field is required.", label));
            None
        }
        Some(v) if v.chars().count() > MAX_TEXT_LEN => {
            errors.add(
                field,
                format!(
                    "The {} may not be greater than {} characters.",
                    label, MAX_TEXT_LEN
                ),
            );
            None
        }
        Some(v) => Some(v),
    }
}

fn date(value: Option<String>, field: &str, label: &str, errors: &mut FieldErrors) -> Option<NaiveDate> {
    let value = trimmed(value)?;
    match NaiveDate::parse_from_str(&value, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, format!("The {} is not a valid date.", label));
            None
        }
    }
}

fn required_id(value: Option<i64>, field: &str, label: &str, errors: &mut FieldErrors) -> Option<i64> {
    match value {
        Some(id) if id > 0 => Some(id),
        Some(_) => {
            errors.add(field, format!("The selected {} is invalid.", label));
            None
        }
        None => {
            errors.add(field, format!("The {} field is required.", label));
            None
        }
    }
}

// ============================================================================
// Position details
// ============================================================================

/// Claimed position as sent by the client
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetailsInput {
    #[serde(alias = "company_name")]
    pub company_name: Option<String>,
    #[serde(alias = "job_title")]
    pub job_title: Option<String>,
    pub location: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_date: Option<String>,
    #[serde(alias = "currently_working")]
    pub currently_working: Option<bool>,
    pub responsibilities: Option<String>,
}

impl DetailsInput {
    /// Set a field from a multipart form. Returns `Ok(false)` for keys that
    /// are not position fields.
    pub fn set_field(&mut self, key: &str, value: String) -> MembershipResult<bool> {
        match key {
            "companyName" | "company_name" => self.company_name = Some(value),
            "jobTitle" | "job_title" => self.job_title = Some(value),
            "location" => self.location = Some(value),
            "startDate" | "start_date" => self.start_date = Some(value),
            "endDate" | "end_date" => self.end_date = Some(value),
            "responsibilities" => self.responsibilities = Some(value),
            "currentlyWorking" | "currently_working" => {
                let flag = parse_flag(&value).ok_or_else(|| {
                    MembershipError::validation(
                        "currently_working",
                        "The currently working field must be true or false.",
                    )
                })?;
                self.currently_working = Some(flag);
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Validate into details, recording problems in `errors`.
    ///
    /// `existing_company_name` is used when the client leaves the company name
    /// out (edits keep the name the membership was created with).
    pub fn validate(
        self,
        existing_company_name: Option<&str>,
        errors: &mut FieldErrors,
    ) -> Option<MembershipDetails> {
        let company_name = match (trimmed(self.company_name.clone()), existing_company_name) {
            (None, Some(existing)) => Some(existing.to_string()),
            _ => required_text(self.company_name, "company_name", "company name", errors),
        };
        let job_title = required_text(self.job_title, "job_title", "job title", errors);
        let location = required_text(self.location, "location", "location", errors);

        let start_date = if trimmed(self.start_date.clone()).is_none() {
            errors.add("start_date", "The start date field is required.");
            None
        } else {
            date(self.start_date, "start_date", "start date", errors)
        };

        let currently_working = self.currently_working.unwrap_or(false);
        let end_date = if currently_working {
            None
        } else {
            date(self.end_date, "end_date", "end date", errors)
        };

        if let (Some(start), Some(end)) = (start_date, end_date) {
            if end <= start {
                errors.add("end_date", "The end date must be a date after start date.");
            }
        }

        let details = MembershipDetails {
            company_name: company_name?,
            job_title: job_title?,
            location: location?,
            start_date: start_date?,
            end_date,
            currently_working,
            responsibilities: trimmed(self.responsibilities),
        };

        if errors.is_empty() {
            Some(details.normalized())
        } else {
            None
        }
    }
}

// ============================================================================
// Subject-side request
// ============================================================================

/// Body of `/requestmembership` and `/requestCompanyAffiliations`
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestMembershipInput {
    #[serde(alias = "company_id", alias = "page_id")]
    pub company_id: Option<i64>,
    /// Requesting page, for page-to-company affiliations
    #[serde(alias = "user_page_id")]
    pub user_page_id: Option<i64>,
    #[serde(flatten)]
    pub details: DetailsInput,
}

impl RequestMembershipInput {
    /// Target page and details
    pub fn into_parts(self) -> MembershipResult<(PageId, MembershipDetails)> {
        let mut errors = FieldErrors::new();
        let company_id = required_id(self.company_id, "company_id", "company id", &mut errors);
        let details = self.details.validate(None, &mut errors);

        match (company_id, details) {
            (Some(company_id), Some(details)) if errors.is_empty() => {
                Ok((PageId::new(company_id), details))
            }
            _ => Err(MembershipError::Validation(errors)),
        }
    }

    /// Target page, requesting page and details
    pub fn into_page_parts(self) -> MembershipResult<(PageId, PageId, MembershipDetails)> {
        let mut errors = FieldErrors::new();
        let user_page_id =
            required_id(self.user_page_id, "user_page_id", "user page id", &mut errors);
        let company_id = required_id(self.company_id, "company_id", "company id", &mut errors);
        let details = self.details.validate(None, &mut errors);

        match (company_id, user_page_id, details) {
            (Some(company_id), Some(user_page_id), Some(details)) if errors.is_empty() => Ok((
                PageId::new(company_id),
                PageId::new(user_page_id),
                details,
            )),
            _ => Err(MembershipError::Validation(errors)),
        }
    }
}

// ============================================================================
// Company-side proposal
// ============================================================================

/// Multipart body of `/requestMembershipCompanySide`
#[derive(Debug, Clone, Default)]
pub struct ProposeMembershipInput {
    pub company_id: Option<i64>,
    /// Proposed member (user or page id, see `subject_type`)
    pub user_page_id: Option<i64>,
    /// "user" (default) or "page"
    pub subject_type: Option<String>,
    pub details: DetailsInput,
    pub confirmation_letter: Option<UploadedFile>,
    pub proof_document: Option<UploadedFile>,
}

impl ProposeMembershipInput {
    /// Subject, target page, details and the two required documents
    #[allow(clippy::type_complexity)]
    pub fn into_parts(
        self,
    ) -> MembershipResult<(Subject, PageId, MembershipDetails, Vec<(DocumentKind, UploadedFile)>)>
    {
        let mut errors = FieldErrors::new();

        let company_id = required_id(self.company_id, "company_id", "company id", &mut errors);
        let subject_id =
            required_id(self.user_page_id, "user_page_id", "user page id", &mut errors);

        let subject_kind = match self.subject_type.as_deref().map(str::trim) {
            None | Some("") => Some(SubjectKind::User),
            Some(raw) => match raw.parse::<SubjectKind>() {
                Ok(kind) => Some(kind),
                Err(_) => {
                    errors.add("subject_type", "The subject type must be user or page.");
                    None
                }
            },
        };

        let details = self.details.validate(None, &mut errors);

        let mut documents = Vec::with_capacity(2);
        for (kind, file) in [
            (DocumentKind::ConfirmationLetter, self.confirmation_letter),
            (DocumentKind::ProofDocument, self.proof_document),
        ] {
            match file {
                Some(file) => documents.push((kind, file)),
                None => errors.add(
                    kind.field_name(),
                    format!("The {} field is required.", kind.field_name().replace('_', " ")),
                ),
            }
        }

        match (company_id, subject_id, subject_kind, details) {
            (Some(company_id), Some(subject_id), Some(kind), Some(details)) if errors.is_empty() => {
                Ok((
                    Subject::from_parts(kind, subject_id),
                    PageId::new(company_id),
                    details,
                    documents,
                ))
            }
            _ => Err(MembershipError::Validation(errors)),
        }
    }
}
