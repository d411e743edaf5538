use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Form;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{notice, parse_opt, PageError, PageResult, Pager, View};
use crate::domain::{Caller, CurationStatus, IntroDecision, Role, MAX_RATING, MIN_RATING};
use crate::error::MarketError;
use crate::services::invites::{self, CreateInviteInput};
use crate::services::profiles::{self, CurateTalentInput, RateTalentInput};
use crate::services::tags::{self, CreateTagInput, TalentTagInput};
use crate::services::{admin, intros, ReviewIntroInput};
use crate::storage::{IntroFilter, InviteFilter, TalentFilter};
use crate::validation::{self, Validate};
use crate::web::guard::see_other;
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    status: Option<String>,
    q: Option<String>,
    done: Option<String>,
    #[serde(default)]
    offset: usize,
}

impl ListQuery {
    fn context(&self) -> tera::Context {
        let mut ctx = tera::Context::new();
        if let Some(text) = notice(self.done.as_deref()) {
            ctx.insert("notice", text);
        }
        ctx
    }

    fn pager<T>(&self, path: &str, items: &mut Vec<T>) -> Pager {
        let params = [
            ("status", self.status.as_deref().unwrap_or_default()),
            ("q", self.q.as_deref().unwrap_or_default()),
        ];
        Pager::split(path, &params, self.offset, items)
    }
}

pub async fn dashboard(State(state): State<AppState>, view: View) -> PageResult {
    let stats = admin::dashboard_stats(state.storage.as_ref(), Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = tera::Context::new();
    ctx.insert("stats", &stats);
    view.render("admin/dashboard.html", ctx)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct InviteForm {
    email: String,
    role: Role,
    #[serde(default)]
    note: String,
}

async fn invites_context(
    state: &AppState,
    view: &View,
    query: &ListQuery,
) -> Result<tera::Context, super::PageError> {
    let filter = InviteFilter {
        status: parse_opt(query.status.as_deref()),
        email: None,
        page: Pager::fetch(query.offset),
    };
    let mut list = invites::list_invites(state.storage.as_ref(), &filter, Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    let pager = query.pager("/admin/invites", &mut list);
    let mut ctx = query.context();
    ctx.insert("invites", &list);
    ctx.insert("pager", &pager);
    Ok(ctx)
}

pub async fn invites_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let ctx = invites_context(&state, &view, &query).await?;
    view.render("admin/invites.html", ctx)
}

/// Renders the result directly rather than redirecting: the clear token in
/// the accept link is shown exactly once
pub async fn create_invite(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<InviteForm>,
) -> PageResult {
    let admin = view.caller()?.clone();
    let input = CreateInviteInput {
        email: form.email.clone(),
        role: form.role,
        note: validation::blank_to_none(Some(form.note.clone())),
    };

    let outcome = match input.validate() {
        Ok(()) => {
            invites::create_invite(
                state.storage.as_ref(),
                &state.config,
                Some(&admin),
                &input,
                Utc::now(),
            )
            .await
        }
        Err(errors) => Err(MarketError::from(errors)),
    };

    let query = ListQuery::default();
    match outcome {
        Ok(issued) => {
            let mut ctx = invites_context(&state, &view, &query).await?;
            ctx.insert("issued", &issued);
            let page = view.render("admin/invites.html", ctx)?;
            Ok((StatusCode::CREATED, page).into_response())
        }
        Err(e) => {
            let ctx = invites_context(&state, &view, &query).await?;
            view.form_error("admin/invites.html", ctx, &form, e)
        }
    }
}

pub async fn revoke_invite(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
) -> PageResult {
    invites::revoke_invite(state.storage.as_ref(), id, Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/admin/invites?done=revoked"))
}

pub async fn talent_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let admin = view.caller()?;
    let status: Option<CurationStatus> = parse_opt(query.status.as_deref());
    let filter = TalentFilter {
        statuses: status.into_iter().collect(),
        query: validation::blank_to_none(query.q.clone()),
        page: Pager::fetch(query.offset),
        ..Default::default()
    };
    filter.validate().map_err(|e| view.fail(e.into()))?;

    let mut list = profiles::list_talent(state.storage.as_ref(), admin, &filter)
        .await
        .map_err(|e| view.fail(e))?;
    let pager = query.pager("/admin/talent", &mut list);

    let mut ctx = query.context();
    ctx.insert("profiles", &list);
    ctx.insert("pager", &pager);
    ctx.insert("filter", &filter);
    ctx.insert("statuses", &CurationStatus::ALL);
    ctx.insert("selected_status", &status);
    view.render("admin/talent.html", ctx)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct CurateForm {
    status: CurationStatus,
    /// Checkbox, present only when ticked
    #[serde(default)]
    featured: Option<String>,
    #[serde(default)]
    admin_notes: String,
}

/// Profile, work history, tags and the curation form options
async fn detail_context(
    state: &AppState,
    view: &View,
    admin: &Caller,
    id: Uuid,
    done: Option<&str>,
) -> Result<tera::Context, PageError> {
    let detail = profiles::talent_detail(state.storage.as_ref(), admin, id)
        .await
        .map_err(|e| view.fail(e))?;
    let all_tags = tags::list_tags(state.storage.as_ref(), admin)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = tera::Context::new();
    if let Some(text) = notice(done) {
        ctx.insert("notice", text);
    }
    ctx.insert("profile", &detail.profile);
    ctx.insert("past_roles", &detail.past_roles);
    ctx.insert("tags", &detail.tags);
    ctx.insert("all_tags", &all_tags);
    ctx.insert("statuses", &CurationStatus::ALL);
    ctx.insert("ratings", &(MIN_RATING..=MAX_RATING).collect::<Vec<_>>());
    Ok(ctx)
}

pub async fn talent_detail(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let admin = view.caller()?;
    let ctx = detail_context(&state, &view, admin, id, query.done.as_deref()).await?;
    view.render("admin/talent_detail.html", ctx)
}

pub async fn curate(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<CurateForm>,
) -> PageResult {
    let admin = view.caller()?.clone();
    let input = CurateTalentInput {
        id,
        status: Some(form.status),
        featured: Some(form.featured.is_some()),
        admin_notes: Some(form.admin_notes.trim().to_string()),
    };

    let outcome = match input.validate() {
        Ok(()) => {
            profiles::curate_talent(state.storage.as_ref(), &admin, &input, Utc::now()).await
        }
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other(&format!("/admin/talent/{}?done=saved", id))),
        Err(e) => {
            let ctx = detail_context(&state, &view, &admin, id, None).await?;
            view.form_error("admin/talent_detail.html", ctx, &form, e)
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RatingForm {
    /// Blank clears the rating
    #[serde(default)]
    rating: String,
}

impl RatingForm {
    fn to_input(&self, id: Uuid) -> Result<RateTalentInput, MarketError> {
        let raw = self.rating.trim();
        let rating = if raw.is_empty() {
            None
        } else {
            match raw.parse::<u8>() {
                Ok(r) => Some(r),
                Err(_) => {
                    let mut errors = validation::ValidationErrors::new();
                    errors.add("rating", "must be a whole number");
                    return Err(errors.into());
                }
            }
        };
        let input = RateTalentInput { id, rating };
        input.validate()?;
        Ok(input)
    }
}

pub async fn rate(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<RatingForm>,
) -> PageResult {
    let admin = view.caller()?;
    let outcome = match form.to_input(id) {
        Ok(input) => profiles::rate_talent(state.storage.as_ref(), admin, &input, Utc::now()).await,
        Err(e) => Err(e),
    };
    match outcome {
        Ok(_) => Ok(see_other(&format!("/admin/talent/{}?done=rated", id))),
        Err(e) => {
            let ctx = detail_context(&state, &view, admin, id, None).await?;
            view.form_error("admin/talent_detail.html", ctx, &form, e)
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AttachForm {
    tag_id: Uuid,
}

pub async fn attach_tag(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<AttachForm>,
) -> PageResult {
    let admin = view.caller()?;
    let input = TalentTagInput {
        talent_id: id,
        tag_id: form.tag_id,
    };
    tags::tag_talent(state.storage.as_ref(), admin, &input)
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other(&format!("/admin/talent/{}?done=tagged", id)))
}

pub async fn detach_tag(
    State(state): State<AppState>,
    view: View,
    Path((id, tag_id)): Path<(Uuid, Uuid)>,
) -> PageResult {
    let admin = view.caller()?;
    let input = TalentTagInput {
        talent_id: id,
        tag_id,
    };
    tags::untag_talent(state.storage.as_ref(), admin, &input)
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other(&format!("/admin/talent/{}?done=tagged", id)))
}

async fn tags_context(
    state: &AppState,
    view: &View,
    admin: &Caller,
    done: Option<&str>,
) -> Result<tera::Context, PageError> {
    let list = tags::list_tags(state.storage.as_ref(), admin)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = tera::Context::new();
    if let Some(text) = notice(done) {
        ctx.insert("notice", text);
    }
    ctx.insert("tags", &list);
    Ok(ctx)
}

pub async fn tags_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let admin = view.caller()?;
    let ctx = tags_context(&state, &view, admin, query.done.as_deref()).await?;
    view.render("admin/tags.html", ctx)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct TagForm {
    name: String,
    #[serde(default)]
    color: String,
}

pub async fn create_tag(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<TagForm>,
) -> PageResult {
    let admin = view.caller()?;
    let input = CreateTagInput {
        name: form.name.clone(),
        color: validation::blank_to_none(Some(form.color.clone())),
    };
    let outcome = match input.validate() {
        Ok(()) => tags::create_tag(state.storage.as_ref(), admin, &input, Utc::now()).await,
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other("/admin/tags?done=added")),
        Err(e) => {
            let ctx = tags_context(&state, &view, admin, None).await?;
            view.form_error("admin/tags.html", ctx, &form, e)
        }
    }
}

pub async fn intros_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<ListQuery>,
) -> PageResult {
    let admin = view.caller()?;
    let filter = IntroFilter {
        status: parse_opt(query.status.as_deref()),
        page: Pager::fetch(query.offset),
        ..Default::default()
    };
    let mut list = intros::list_intros(state.storage.as_ref(), admin, &filter)
        .await
        .map_err(|e| view.fail(e))?;
    let pager = query.pager("/admin/intros", &mut list);
    let mut ctx = query.context();
    ctx.insert("intros", &list);
    ctx.insert("pager", &pager);
    view.render("admin/intros.html", ctx)
}

#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    decision: IntroDecision,
    #[serde(default)]
    note: String,
}

pub async fn review(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<ReviewForm>,
) -> PageResult {
    let admin = view.caller()?;
    let input = ReviewIntroInput {
        id,
        decision: form.decision,
        note: validation::blank_to_none(Some(form.note)),
    };
    input.validate().map_err(|e| view.fail(e.into()))?;
    intros::review_intro(state.storage.as_ref(), admin, &input, Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/admin/intros?status=pending&done=reviewed"))
}
