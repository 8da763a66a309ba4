pub mod document;
pub mod membership;

pub use document::{
    DocumentKind, MembershipDocument, NewDocument, UploadedFile, UploaderParty,
    ALLOWED_EXTENSIONS, DOCUMENT_ROOT,
};
pub use membership::{
    InitiatedBy, InsertOutcome, Membership, MembershipDetails, MembershipFilter,
    MembershipStatus, NewMembership, Subject, SubjectKind,
};
