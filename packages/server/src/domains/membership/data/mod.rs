pub mod input;
pub mod membership;

pub use input::{parse_flag, DetailsInput, ProposeMembershipInput, RequestMembershipInput};
pub use membership::{
    CandidateListing, ConfirmedMemberships, MemberCard, MembershipData, RequestReceipt,
};
