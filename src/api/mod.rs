pub mod members;

pub use members::{CreateMemberRequest, ListMembersQuery, LoadMoreQuery, UpdateMemberRequest};
