use axum::extract::{Path, Query, State};
use axum::Form;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{notice, parse_opt, PageError, PageResult, View};
use crate::domain::{Availability, Caller};
use crate::error::MarketError;
use crate::services::intros::{self, CreateIntroInput};
use crate::services::profiles::{self, UpdateFounderInput};
use crate::services::shortlist::{self, ShortlistInput};
use crate::storage::types::MAX_PAGE_SIZE;
use crate::storage::{Page, TalentFilter};
use crate::validation::{self, Validate};
use crate::web::guard::see_other;
use crate::web::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct BrowseQuery {
    q: Option<String>,
    skill: Option<String>,
    availability: Option<String>,
    done: Option<String>,
}

fn with_notice(done: Option<&str>) -> tera::Context {
    let mut ctx = tera::Context::new();
    if let Some(text) = notice(done) {
        ctx.insert("notice", text);
    }
    ctx
}

pub async fn browse(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<BrowseQuery>,
) -> PageResult {
    let founder = view.caller()?;
    let filter = TalentFilter {
        query: validation::blank_to_none(query.q),
        skill: validation::blank_to_none(query.skill),
        availability: parse_opt(query.availability.as_deref()),
        page: Page::new(MAX_PAGE_SIZE, 0),
        ..TalentFilter::published()
    };
    filter.validate().map_err(|e| view.fail(e.into()))?;

    let list = profiles::list_talent(state.storage.as_ref(), founder, &filter)
        .await
        .map_err(|e| view.fail(e))?;

    let mut ctx = with_notice(query.done.as_deref());
    ctx.insert("profiles", &list);
    ctx.insert("filter", &filter);
    ctx.insert("availabilities", &Availability::ALL);
    view.render("founder/browse.html", ctx)
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IntroForm {
    message: String,
}

/// Profile, work history and shortlist state of one talent
async fn talent_context(
    state: &AppState,
    view: &View,
    founder: &Caller,
    id: Uuid,
) -> Result<tera::Context, PageError> {
    let detail = profiles::talent_detail(state.storage.as_ref(), founder, id)
        .await
        .map_err(|e| view.fail(e))?;
    let entry = state
        .storage
        .shortlists()
        .get(founder.account_id, id)
        .await
        .map_err(|e| view.fail(e.into()))?;
    let mut ctx = tera::Context::new();
    ctx.insert("profile", &detail.profile);
    ctx.insert("past_roles", &detail.past_roles);
    ctx.insert("shortlisted", &entry);
    Ok(ctx)
}

pub async fn talent_page(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
) -> PageResult {
    let founder = view.caller()?;
    let ctx = talent_context(&state, &view, founder, id).await?;
    view.render("founder/talent.html", ctx)
}

pub async fn request_intro(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<IntroForm>,
) -> PageResult {
    let founder = view.caller()?;
    let input = CreateIntroInput {
        talent_id: id,
        message: form.message.clone(),
    };

    let outcome = match input.validate() {
        Ok(()) => intros::request_intro(state.storage.as_ref(), founder, &input, Utc::now()).await,
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other("/founder/intros?done=requested")),
        Err(e) => {
            let ctx = talent_context(&state, &view, founder, id).await?;
            view.form_error("founder/talent.html", ctx, &form, e)
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct DoneQuery {
    done: Option<String>,
}

pub async fn intros_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<DoneQuery>,
) -> PageResult {
    let founder = view.caller()?;
    let list = intros::list_my_intros(state.storage.as_ref(), founder, Page::new(MAX_PAGE_SIZE, 0))
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = with_notice(query.done.as_deref());
    ctx.insert("intros", &list);
    view.render("founder/intros.html", ctx)
}

pub async fn cancel_intro(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
) -> PageResult {
    let founder = view.caller()?;
    intros::cancel_intro(state.storage.as_ref(), founder, id)
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/founder/intros?done=cancelled"))
}

pub async fn shortlist_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<DoneQuery>,
) -> PageResult {
    let founder = view.caller()?;
    let entries = shortlist::my_shortlist(state.storage.as_ref(), founder)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = with_notice(query.done.as_deref());
    ctx.insert("entries", &entries);
    view.render("founder/shortlist.html", ctx)
}

#[derive(Debug, Deserialize)]
pub struct NoteForm {
    #[serde(default)]
    note: String,
}

impl NoteForm {
    fn input(self, talent_id: Uuid) -> ShortlistInput {
        ShortlistInput {
            talent_id,
            note: Some(self.note),
        }
    }
}

pub async fn shortlist_add(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<NoteForm>,
) -> PageResult {
    let founder = view.caller()?;
    let input = form.input(id);
    input.validate().map_err(|e| view.fail(e.into()))?;
    shortlist::add_to_shortlist(state.storage.as_ref(), founder, &input, Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/founder/shortlist?done=shortlisted"))
}

pub async fn shortlist_note(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<NoteForm>,
) -> PageResult {
    let founder = view.caller()?;
    let input = form.input(id);
    input.validate().map_err(|e| view.fail(e.into()))?;
    shortlist::update_note(state.storage.as_ref(), founder, &input, Utc::now())
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/founder/shortlist?done=saved"))
}

pub async fn shortlist_remove(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
) -> PageResult {
    let founder = view.caller()?;
    shortlist::remove_from_shortlist(state.storage.as_ref(), founder, id)
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/founder/shortlist?done=removed"))
}

#[derive(Debug, Deserialize, Serialize)]
pub struct FounderForm {
    full_name: String,
    company_name: String,
    #[serde(default)]
    company_url: String,
    #[serde(default)]
    role_title: String,
    #[serde(default)]
    bio: String,
}

pub async fn profile_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<DoneQuery>,
) -> PageResult {
    let founder = view.caller()?;
    let profile = profiles::get_own_founder(state.storage.as_ref(), founder)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = with_notice(query.done.as_deref());
    ctx.insert("values", &profile);
    view.render("founder/profile.html", ctx)
}

pub async fn update_profile(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<FounderForm>,
) -> PageResult {
    let founder = view.caller()?;
    let input = UpdateFounderInput {
        full_name: form.full_name.clone(),
        company_name: form.company_name.clone(),
        company_url: validation::blank_to_none(Some(form.company_url.clone())),
        role_title: validation::blank_to_none(Some(form.role_title.clone())),
        bio: form.bio.trim().to_string(),
    };

    let outcome = match input.validate() {
        Ok(()) => {
            profiles::update_own_founder(state.storage.as_ref(), founder, &input, Utc::now()).await
        }
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other("/founder/profile?done=saved")),
        Err(e) => view.form_error("founder/profile.html", tera::Context::new(), &form, e),
    }
}
