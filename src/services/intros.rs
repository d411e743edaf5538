//! Introduction requests from founders to talent

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::domain::{
    Caller, CurationStatus, IntroDecision, IntroRequest, IntroStatus, Role,
};
use crate::error::{ErrorCode, MarketError, Result};
use crate::services::require_role;
use crate::storage::{IntroFilter, MarketplaceStorage, Page};
use crate::validation::{self, Validate, ValidationErrors};

const MAX_MESSAGE_LEN: usize = 2000;
const MAX_NOTE_LEN: usize = 1000;

#[derive(Debug, Clone, Deserialize)]
pub struct CreateIntroInput {
    pub talent_id: Uuid,
    pub message: String,
}

impl Validate for CreateIntroInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("message", validation::length(&self.message, 10, MAX_MESSAGE_LEN));
        errors.into_result()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReviewIntroInput {
    pub id: Uuid,
    pub decision: IntroDecision,
    #[serde(default)]
    pub note: Option<String>,
}

impl Validate for ReviewIntroInput {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        errors.check("note", validation::optional_length(self.note.as_deref(), MAX_NOTE_LEN));
        errors.into_result()
    }
}

impl Validate for IntroFilter {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }
}

/// Pages are clamped rather than rejected
impl Validate for Page {
    fn validate(&self) -> std::result::Result<(), ValidationErrors> {
        Ok(())
    }
}

/// An intro request with the names needed to display it
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IntroView {
    #[serde(flatten)]
    pub intro: IntroRequest,
    pub talent_name: String,
    pub founder_name: String,
    pub company_name: String,
}

fn intro_not_found() -> MarketError {
    MarketError::intro(ErrorCode::INTRO_NOT_FOUND, "intro request not found")
}

fn duplicate_pending() -> MarketError {
    MarketError::intro(
        ErrorCode::INTRO_DUPLICATE_PENDING,
        "you already have a pending intro request for this talent",
    )
}

pub async fn request_intro(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
    input: &CreateIntroInput,
    now: DateTime<Utc>,
) -> Result<IntroRequest> {
    require_role(founder, Role::Founder)?;

    let available = storage
        .talent()
        .get(input.talent_id)
        .await?
        .is_some_and(|p| p.status == CurationStatus::Published);
    if !available {
        return Err(MarketError::intro(
            ErrorCode::INTRO_TALENT_UNAVAILABLE,
            "talent profile not found",
        ));
    }

    if storage
        .intros()
        .find_pending(founder.account_id, input.talent_id)
        .await?
        .is_some()
    {
        return Err(duplicate_pending());
    }

    let intro = IntroRequest::new(founder.account_id, input.talent_id, &input.message, now);
    storage.intros().insert(&intro).await.map_err(|e| {
        if e.is_conflict() {
            duplicate_pending()
        } else {
            e.into()
        }
    })?;
    info!(intro_id = %intro.id, talent_id = %intro.talent_id, "Intro requested");
    Ok(intro)
}

pub async fn list_my_intros(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
    page: Page,
) -> Result<Vec<IntroView>> {
    require_role(founder, Role::Founder)?;
    let filter = IntroFilter {
        founder_id: Some(founder.account_id),
        page,
        ..Default::default()
    };
    describe(storage, storage.intros().list(&filter).await?).await
}

/// Talent only learn about requests an admin approved
pub async fn list_intros_for_talent(
    storage: &dyn MarketplaceStorage,
    talent: &Caller,
    page: Page,
) -> Result<Vec<IntroView>> {
    require_role(talent, Role::Talent)?;
    let filter = IntroFilter {
        talent_id: Some(talent.account_id),
        status: Some(IntroStatus::Approved),
        page,
        ..Default::default()
    };
    describe(storage, storage.intros().list(&filter).await?).await
}

pub async fn list_intros(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    filter: &IntroFilter,
) -> Result<Vec<IntroView>> {
    require_role(admin, Role::Admin)?;
    describe(storage, storage.intros().list(filter).await?).await
}

pub async fn review_intro(
    storage: &dyn MarketplaceStorage,
    admin: &Caller,
    input: &ReviewIntroInput,
    now: DateTime<Utc>,
) -> Result<IntroRequest> {
    require_role(admin, Role::Admin)?;
    let mut intro = storage
        .intros()
        .get(input.id)
        .await?
        .ok_or_else(intro_not_found)?;

    intro.review(
        input.decision,
        admin.account_id,
        validation::blank_to_none(input.note.clone()),
        now,
    )?;
    storage.intros().update(&intro).await?;
    info!(intro_id = %intro.id, status = %intro.status, "Intro reviewed");
    Ok(intro)
}

/// A founder withdraws their own request while it is still pending. The
/// request is deleted; a request already reviewed cannot be cancelled.
pub async fn cancel_intro(
    storage: &dyn MarketplaceStorage,
    founder: &Caller,
    id: Uuid,
) -> Result<()> {
    require_role(founder, Role::Founder)?;
    let intro = storage
        .intros()
        .get(id)
        .await?
        .filter(|i| i.founder_id == founder.account_id)
        .ok_or_else(intro_not_found)?;
    if intro.status != IntroStatus::Pending {
        return Err(MarketError::intro(
            ErrorCode::INTRO_INVALID_TRANSITION,
            format!("cannot cancel an intro request that is {}", intro.status),
        ));
    }
    storage.intros().delete_pending(id).await?;
    info!(intro_id = %id, "Intro request cancelled");
    Ok(())
}

/// Attach talent and founder names. Missing profiles fall back to blanks.
async fn describe(
    storage: &dyn MarketplaceStorage,
    intros: Vec<IntroRequest>,
) -> Result<Vec<IntroView>> {
    let mut views = Vec::with_capacity(intros.len());
    for intro in intros {
        let talent = storage.talent().get(intro.talent_id).await?;
        let founder = storage.founders().get(intro.founder_id).await?;
        views.push(IntroView {
            talent_name: talent.map(|t| t.full_name).unwrap_or_default(),
            founder_name: founder
                .as_ref()
                .map(|f| f.full_name.clone())
                .unwrap_or_default(),
            company_name: founder.map(|f| f.company_name).unwrap_or_default(),
            intro,
        });
    }
    Ok(views)
}
