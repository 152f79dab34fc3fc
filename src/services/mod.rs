pub mod member_service;

pub use member_service::{MemberError, MemberService};
