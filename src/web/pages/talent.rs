use axum::extract::{Path, Query, State};
use axum::Form;
use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{notice, PageError, PageResult, View};
use crate::domain::{Availability, Caller, RoleDetails, TalentProfile};
use crate::error::MarketError;
use crate::services::experience::{self, UpdatePastRoleInput};
use crate::services::intros;
use crate::services::profiles::{self, UpdateTalentInput};
use crate::storage::types::MAX_PAGE_SIZE;
use crate::storage::Page;
use crate::validation::{self, Validate, ValidationErrors};
use crate::web::AppState;
use crate::web::guard::see_other;

#[derive(Debug, Default, Deserialize)]
pub struct DoneQuery {
    done: Option<String>,
}

/// The profile form as submitted. Skills arrive comma separated and years
/// as free text.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TalentForm {
    full_name: String,
    #[serde(default)]
    headline: String,
    #[serde(default)]
    location: String,
    #[serde(default)]
    skills: String,
    #[serde(default)]
    years_experience: String,
    #[serde(default)]
    availability: Availability,
    #[serde(default)]
    linkedin_url: String,
    #[serde(default)]
    github_url: String,
    #[serde(default)]
    portfolio_url: String,
    #[serde(default)]
    bio: String,
}

impl TalentForm {
    fn from_profile(profile: &TalentProfile) -> Self {
        Self {
            full_name: profile.full_name.clone(),
            headline: profile.headline.clone(),
            location: profile.location.clone(),
            skills: profile.skills.join(", "),
            years_experience: profile
                .years_experience
                .map(|y| y.to_string())
                .unwrap_or_default(),
            availability: profile.availability,
            linkedin_url: profile.linkedin_url.clone().unwrap_or_default(),
            github_url: profile.github_url.clone().unwrap_or_default(),
            portfolio_url: profile.portfolio_url.clone().unwrap_or_default(),
            bio: profile.bio.clone(),
        }
    }

    fn to_input(&self) -> Result<UpdateTalentInput, ValidationErrors> {
        let years = self.years_experience.trim();
        let years_experience = if years.is_empty() {
            None
        } else {
            match years.parse::<u16>() {
                Ok(y) => Some(y),
                Err(_) => {
                    let mut errors = ValidationErrors::new();
                    errors.add("years_experience", "must be a whole number");
                    return Err(errors);
                }
            }
        };

        Ok(UpdateTalentInput {
            full_name: self.full_name.trim().to_string(),
            headline: self.headline.trim().to_string(),
            bio: self.bio.trim().to_string(),
            location: self.location.trim().to_string(),
            skills: validation::parse_skill_list(&self.skills),
            years_experience,
            linkedin_url: validation::blank_to_none(Some(self.linkedin_url.clone())),
            github_url: validation::blank_to_none(Some(self.github_url.clone())),
            portfolio_url: validation::blank_to_none(Some(self.portfolio_url.clone())),
            availability: self.availability,
        })
    }
}

async fn profile_context(
    state: &AppState,
    view: &View,
    talent: &Caller,
    done: Option<&str>,
    profile: &TalentProfile,
) -> Result<tera::Context, PageError> {
    let skills = profiles::skill_catalog(state.storage.as_ref(), talent)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = tera::Context::new();
    if let Some(text) = notice(done) {
        ctx.insert("notice", text);
    }
    ctx.insert("status", &profile.status);
    ctx.insert("availabilities", &Availability::ALL);
    ctx.insert("known_skills", &skills);
    Ok(ctx)
}

pub async fn profile_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<DoneQuery>,
) -> PageResult {
    let talent = view.caller()?;
    let profile = profiles::get_own_talent(state.storage.as_ref(), talent)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = profile_context(&state, &view, talent, query.done.as_deref(), &profile).await?;
    ctx.insert("values", &TalentForm::from_profile(&profile));
    view.render("talent/profile.html", ctx)
}

pub async fn update_profile(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<TalentForm>,
) -> PageResult {
    let talent = view.caller()?;

    let outcome = match form.to_input().and_then(|input| input.validate().map(|()| input)) {
        Ok(input) => {
            profiles::update_own_talent(state.storage.as_ref(), talent, &input, Utc::now()).await
        }
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other("/talent?done=saved")),
        Err(e) => {
            let profile = profiles::get_own_talent(state.storage.as_ref(), talent)
                .await
                .map_err(|e| view.fail(e))?;
            let ctx = profile_context(&state, &view, talent, None, &profile).await?;
            view.form_error("talent/profile.html", ctx, &form, e)
        }
    }
}

pub async fn intros_page(State(state): State<AppState>, view: View) -> PageResult {
    let talent = view.caller()?;
    let list =
        intros::list_intros_for_talent(state.storage.as_ref(), talent, Page::new(MAX_PAGE_SIZE, 0))
            .await
            .map_err(|e| view.fail(e))?;
    let mut ctx = tera::Context::new();
    ctx.insert("intros", &list);
    view.render("talent/intros.html", ctx)
}

/// A past role as submitted. Dates come from `<input type="date">`.
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct RoleForm {
    company_name: String,
    title: String,
    start_date: String,
    #[serde(default)]
    end_date: String,
    #[serde(default)]
    description: String,
}

fn parse_date(
    errors: &mut ValidationErrors,
    field: &str,
    raw: &str,
) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            errors.add(field, "must be a date like 2024-01-31");
            None
        }
    }
}

impl RoleForm {
    fn to_details(&self) -> Result<RoleDetails, ValidationErrors> {
        let mut errors = ValidationErrors::new();
        let start_date = parse_date(&mut errors, "start_date", &self.start_date);
        let end_date = parse_date(&mut errors, "end_date", &self.end_date);
        if start_date.is_none() && errors.message_for("start_date").is_none() {
            errors.add("start_date", "is required");
        }
        match start_date {
            Some(start_date) if errors.is_empty() => {
                let details = RoleDetails {
                    company_name: self.company_name.trim().to_string(),
                    title: self.title.trim().to_string(),
                    start_date,
                    end_date,
                    description: validation::blank_to_none(Some(self.description.clone())),
                };
                details.validate()?;
                Ok(details)
            }
            _ => Err(errors),
        }
    }
}

async fn experience_context(
    state: &AppState,
    view: &View,
    talent: &Caller,
    done: Option<&str>,
) -> Result<tera::Context, PageError> {
    let roles = experience::list_own_roles(state.storage.as_ref(), talent)
        .await
        .map_err(|e| view.fail(e))?;
    let mut ctx = tera::Context::new();
    if let Some(text) = notice(done) {
        ctx.insert("notice", text);
    }
    ctx.insert("roles", &roles);
    Ok(ctx)
}

pub async fn experience_page(
    State(state): State<AppState>,
    view: View,
    Query(query): Query<DoneQuery>,
) -> PageResult {
    let talent = view.caller()?;
    let ctx = experience_context(&state, &view, talent, query.done.as_deref()).await?;
    view.render("talent/experience.html", ctx)
}

pub async fn add_role(
    State(state): State<AppState>,
    view: View,
    Form(form): Form<RoleForm>,
) -> PageResult {
    let talent = view.caller()?;
    let outcome = match form.to_details() {
        Ok(details) => {
            experience::add_role(state.storage.as_ref(), talent, &details, Utc::now()).await
        }
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other("/talent/experience?done=added")),
        Err(e) => {
            let ctx = experience_context(&state, &view, talent, None).await?;
            view.form_error("talent/experience.html", ctx, &form, e)
        }
    }
}

pub async fn update_role(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
    Form(form): Form<RoleForm>,
) -> PageResult {
    let talent = view.caller()?;
    let outcome = match form.to_details() {
        Ok(details) => {
            let input = UpdatePastRoleInput { id, details };
            experience::update_role(state.storage.as_ref(), talent, &input, Utc::now()).await
        }
        Err(errors) => Err(MarketError::from(errors)),
    };
    match outcome {
        Ok(_) => Ok(see_other("/talent/experience?done=saved")),
        Err(e) => {
            let mut ctx = experience_context(&state, &view, talent, None).await?;
            ctx.insert("editing", &id);
            view.form_error("talent/experience.html", ctx, &form, e)
        }
    }
}

pub async fn delete_role(
    State(state): State<AppState>,
    view: View,
    Path(id): Path<Uuid>,
) -> PageResult {
    let talent = view.caller()?;
    experience::delete_role(state.storage.as_ref(), talent, id)
        .await
        .map_err(|e| view.fail(e))?;
    Ok(see_other("/talent/experience?done=deleted"))
}
