// handlers/members.rs - /api/setting/members
//
// Collection: GET / (offset list), GET /load-more (keyset), POST / (create)
// Record:     GET /:id, PUT /:id, DELETE /:id

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};

use crate::api::{CreateMemberRequest, ListMembersQuery, LoadMoreQuery, UpdateMemberRequest};
use crate::app::AppState;
use crate::database::models::Member;
use crate::extractors::{MemberId, ValidatedJson};
use crate::middleware::{ApiResponse, ApiResult};

pub async fn member_list(
    State(state): State<AppState>,
    query: Result<Query<ListMembersQuery>, QueryRejection>,
) -> ApiResult<Vec<Member>> {
    let Query(query) = query?;
    let params = query.parse(&state.config.pagination)?;
    let (members, page_info) = state.members.list(&params).await?;

    Ok(ApiResponse::success(members)
        .with_pagination(page_info)
        .with_message("Members retrieved successfully"))
}

pub async fn member_load_more(
    State(state): State<AppState>,
    query: Result<Query<LoadMoreQuery>, QueryRejection>,
) -> ApiResult<Vec<Member>> {
    let Query(query) = query?;
    let query = query.parse(&state.config.pagination)?;
    let page = state.members.load_more(&query).await?;
    let meta = page.meta(query.limit());

    Ok(ApiResponse::success(page.data)
        .with_meta(meta)
        .with_message("Members retrieved successfully"))
}

pub async fn member_get(State(state): State<AppState>, MemberId(id): MemberId) -> ApiResult<Member> {
    let member = state.members.get(id).await?;
    Ok(ApiResponse::success(member).with_message("Member retrieved successfully"))
}

pub async fn member_create(
    State(state): State<AppState>,
    ValidatedJson(body): ValidatedJson<CreateMemberRequest>,
) -> ApiResult<Member> {
    let member = state.members.create(body.into_input()?).await?;
    Ok(ApiResponse::created(member).with_message("Member created successfully"))
}

pub async fn member_update(
    State(state): State<AppState>,
    MemberId(id): MemberId,
    ValidatedJson(body): ValidatedJson<UpdateMemberRequest>,
) -> ApiResult<Member> {
    let member = state.members.update(id, body.into_update()?).await?;
    Ok(ApiResponse::success(member).with_message("Member updated successfully"))
}

pub async fn member_delete(State(state): State<AppState>, MemberId(id): MemberId) -> ApiResult<()> {
    state.members.delete(id).await?;
    Ok(ApiResponse::message_only("Member deleted successfully"))
}
