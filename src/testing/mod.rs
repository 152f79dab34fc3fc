use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};

use crate::config::AppConfig;
use crate::database::models::{Gender, Member, NewMember};
use crate::database::{MemberStoreHandle, MemoryMemberStore};
use crate::services::member_service::{MemberInput, MemberService};

/// Member service wired to a fresh in-memory store
pub struct TestContext {
    pub store: MemberStoreHandle,
    pub service: MemberService,
}

impl TestContext {
    pub fn new() -> Self {
        let store: MemberStoreHandle = Arc::new(MemoryMemberStore::new());
        let service = MemberService::new(store.clone(), AppConfig::development().pagination);
        Self { store, service }
    }

    /// Inserts `User 1..=n` (usernames `user_1..`), so ids match the numeric suffix.
    pub async fn seed_users(&self, n: i64) -> Vec<Member> {
        let mut created = Vec::new();
        for i in 1..=n {
            let member = self
                .service
                .create(input(&format!("User {}", i), &format!("user_{}", i)))
                .await
                .expect("seed member");
            created.push(member);
        }
        created
    }
}

fn birthdate() -> NaiveDate {
    NaiveDate::from_ymd_opt(1995, 8, 17).expect("valid date")
}

pub fn input(name: &str, username: &str) -> MemberInput {
    MemberInput {
        user_id: None,
        name: name.to_string(),
        username: username.to_string(),
        gender: Gender::Male,
        birthdate: birthdate(),
        address: "Jl. Sudirman 10".to_string(),
        phone: "081200001111".to_string(),
        photo: None,
        active: true,
    }
}

pub fn new_member(name: &str, username: &str) -> NewMember {
    let i = input(name, username);
    NewMember {
        user_id: i.user_id,
        name: i.name,
        username: i.username,
        gender: i.gender,
        birthdate: i.birthdate,
        address: i.address,
        phone: i.phone,
        photo: i.photo,
        active: i.active,
        created_by: 0,
    }
}

pub fn member(id: i64, name: &str, username: &str) -> Member {
    let n = new_member(name, username);
    let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).single().expect("valid timestamp");
    Member {
        id,
        user_id: n.user_id,
        name: n.name,
        username: n.username,
        gender: n.gender,
        birthdate: n.birthdate,
        address: n.address,
        phone: n.phone,
        photo: n.photo,
        active: n.active,
        created_by: n.created_by,
        created_at: at,
        updated_by: None,
        updated_at: at,
    }
}
