pub mod member;

pub use member::{Gender, Member, MemberChanges, NewMember, MEMBERS_TABLE, MEMBER_KEYSET, MEMBER_ORDER_FIELDS};
