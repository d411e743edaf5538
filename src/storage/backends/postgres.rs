//! PostgreSQL storage backend implementation

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgConnectOptions, PgConnection, PgPool, PgPoolOptions, PgRow};
use sqlx::{Postgres, QueryBuilder, Row};
use std::str::FromStr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};
use uuid::Uuid;

use crate::domain::{
    Account, Availability, CurationStatus, FounderProfile, IntroRequest, IntroStatus, Invite,
    InviteStatus, PasswordHash, PastRole, Role, Session, ShortlistEntry, Tag, TalentProfile,
};
use crate::storage::config::PostgresConfig;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::traits::*;
use crate::storage::types::*;

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";
const INTRO_REVIEWED: &str = "intro request has already been reviewed";

/// PostgreSQL storage backend
pub struct PostgresBackend {
    pool: Arc<PgPool>,
    schema: String,
}

impl PostgresBackend {
    /// Connect and make sure the schema exists
    pub async fn new(config: &PostgresConfig) -> StorageResult<Self> {
        info!("Initializing PostgreSQL backend");

        if !config.schema_is_valid() {
            return Err(StorageError::configuration(format!(
                "invalid schema name '{}'",
                config.schema
            )));
        }

        let connect_options = PgConnectOptions::from_str(&config.connection_string)
            .map_err(|e| StorageError::connection(format!("Invalid connection string: {}", e)))?
            .statement_cache_capacity(100);

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(config.connection_timeout)
            .idle_timeout(Some(Duration::from_secs(600)))
            .max_lifetime(Some(Duration::from_secs(3600)))
            .test_before_acquire(true)
            .connect_with(connect_options)
            .await
            .map_err(|e| StorageError::connection(format!("Failed to connect to database: {}", e)))?;

        let backend = Self {
            pool: Arc::new(pool),
            schema: config.schema.clone(),
        };

        backend.initialize_schema().await?;

        Ok(backend)
    }

    /// Create schema, tables and indexes if they do not exist
    pub async fn initialize_schema(&self) -> StorageResult<()> {
        info!("Initializing PostgreSQL schema: {}", self.schema);
        let s = &self.schema;

        let statements = [
            format!("CREATE SCHEMA IF NOT EXISTS {s}"),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.accounts (
                    id UUID PRIMARY KEY,
                    email VARCHAR(254) NOT NULL UNIQUE,
                    role VARCHAR(16) NOT NULL,
                    display_name VARCHAR(120) NOT NULL,
                    password_salt VARCHAR(64) NOT NULL,
                    password_digest VARCHAR(64) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    last_sign_in_at TIMESTAMPTZ
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.sessions (
                    token_hash VARCHAR(64) PRIMARY KEY,
                    account_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    created_at TIMESTAMPTZ NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.invites (
                    id UUID PRIMARY KEY,
                    email VARCHAR(254) NOT NULL,
                    role VARCHAR(16) NOT NULL,
                    token_hash VARCHAR(64) NOT NULL UNIQUE,
                    status VARCHAR(16) NOT NULL,
                    invited_by UUID,
                    note TEXT,
                    created_at TIMESTAMPTZ NOT NULL,
                    expires_at TIMESTAMPTZ NOT NULL,
                    accepted_at TIMESTAMPTZ,
                    accepted_account_id UUID
                )
                "#
            ),
            format!("CREATE INDEX IF NOT EXISTS idx_invites_email ON {s}.invites (email, status)"),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.talent_profiles (
                    account_id UUID PRIMARY KEY REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    full_name VARCHAR(120) NOT NULL,
                    headline VARCHAR(160) NOT NULL,
                    bio TEXT NOT NULL,
                    location VARCHAR(120) NOT NULL,
                    skills JSONB NOT NULL DEFAULT '[]'::jsonb,
                    years_experience INTEGER,
                    linkedin_url TEXT,
                    github_url TEXT,
                    portfolio_url TEXT,
                    availability VARCHAR(16) NOT NULL,
                    status VARCHAR(16) NOT NULL,
                    featured BOOLEAN NOT NULL DEFAULT FALSE,
                    admin_notes TEXT,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )
                "#
            ),
            format!(
                "ALTER TABLE {s}.talent_profiles ADD COLUMN IF NOT EXISTS internal_rating SMALLINT"
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_talent_status ON {s}.talent_profiles (status, featured, updated_at)"
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.founder_profiles (
                    account_id UUID PRIMARY KEY REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    full_name VARCHAR(120) NOT NULL,
                    company_name VARCHAR(120) NOT NULL,
                    company_url TEXT,
                    role_title VARCHAR(120),
                    bio TEXT NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.intro_requests (
                    id UUID PRIMARY KEY,
                    founder_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    talent_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    message TEXT NOT NULL,
                    status VARCHAR(16) NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL,
                    reviewed_at TIMESTAMPTZ,
                    reviewed_by UUID,
                    decision_note TEXT
                )
                "#
            ),
            format!(
                "CREATE UNIQUE INDEX IF NOT EXISTS idx_intro_one_pending ON {s}.intro_requests (founder_id, talent_id) WHERE status = 'pending'"
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.past_roles (
                    id UUID PRIMARY KEY,
                    talent_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    company_name VARCHAR(120) NOT NULL,
                    title VARCHAR(120) NOT NULL,
                    start_date DATE NOT NULL,
                    end_date DATE,
                    description TEXT,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL
                )
                "#
            ),
            format!(
                "CREATE INDEX IF NOT EXISTS idx_past_roles_talent ON {s}.past_roles (talent_id, start_date DESC)"
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.shortlists (
                    founder_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    talent_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    note TEXT,
                    created_at TIMESTAMPTZ NOT NULL,
                    updated_at TIMESTAMPTZ NOT NULL,
                    PRIMARY KEY (founder_id, talent_id)
                )
                "#
            ),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.tags (
                    id UUID PRIMARY KEY,
                    name VARCHAR(40) NOT NULL,
                    color VARCHAR(7),
                    created_at TIMESTAMPTZ NOT NULL
                )
                "#
            ),
            format!("CREATE UNIQUE INDEX IF NOT EXISTS idx_tags_name ON {s}.tags (lower(name))"),
            format!(
                r#"
                CREATE TABLE IF NOT EXISTS {s}.talent_tags (
                    talent_id UUID NOT NULL REFERENCES {s}.accounts(id) ON DELETE CASCADE,
                    tag_id UUID NOT NULL REFERENCES {s}.tags(id) ON DELETE CASCADE,
                    PRIMARY KEY (talent_id, tag_id)
                )
                "#
            ),
        ];

        for statement in statements.iter() {
            sqlx::query(statement)
                .execute(&*self.pool)
                .await
                .map_err(Self::sql_error)?;
        }

        info!("PostgreSQL schema initialized successfully");
        Ok(())
    }

    /// Convert SQL error to storage error
    fn sql_error(e: sqlx::Error) -> StorageError {
        match e {
            sqlx::Error::RowNotFound => StorageError::not_found("Record"),
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) => {
                StorageError::conflict(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
                StorageError::not_found(db_err.message().to_string())
            }
            sqlx::Error::Database(db_err) => StorageError::database(db_err.to_string()),
            sqlx::Error::PoolTimedOut | sqlx::Error::Io(_) => StorageError::connection(e.to_string()),
            _ => StorageError::database(e.to_string()),
        }
    }

    fn table(&self, name: &str) -> String {
        format!("{}.{}", self.schema, name)
    }

    /// After a guarded write touched no row: `NotFound` if the row is gone,
    /// otherwise `Stale`
    async fn missing_or_stale(
        &self,
        conn: &mut PgConnection,
        table: &str,
        id: Uuid,
        stale: &str,
    ) -> StorageError {
        let query = format!("SELECT 1 FROM {} WHERE id = $1", self.table(table));
        match sqlx::query(&query).bind(id).fetch_optional(&mut *conn).await {
            Ok(Some(_)) => StorageError::stale(stale),
            Ok(None) => StorageError::not_found(format!("{} {}", table, id)),
            Err(e) => Self::sql_error(e),
        }
    }

    async fn insert_account_on(&self, conn: &mut PgConnection, account: &Account) -> StorageResult<()> {
        debug!("Inserting account: {}", account.id);
        let query = format!(
            r#"
            INSERT INTO {} (id, email, role, display_name, password_salt, password_digest, created_at, last_sign_in_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
            self.table("accounts")
        );
        sqlx::query(&query)
            .bind(account.id)
            .bind(&account.email)
            .bind(account.role.as_str())
            .bind(&account.display_name)
            .bind(&account.password.salt)
            .bind(&account.password.digest)
            .bind(account.created_at)
            .bind(account.last_sign_in_at)
            .execute(&mut *conn)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    /// Write an invite only while the stored row is still pending
    async fn update_pending_invite_on(
        &self,
        conn: &mut PgConnection,
        invite: &Invite,
    ) -> StorageResult<()> {
        let query = format!(
            r#"
            UPDATE {}
            SET status = $2, note = $3, expires_at = $4, accepted_at = $5, accepted_account_id = $6
            WHERE id = $1 AND status = 'pending'
            "#,
            self.table("invites")
        );
        let result = sqlx::query(&query)
            .bind(invite.id)
            .bind(invite.status.as_str())
            .bind(&invite.note)
            .bind(invite.expires_at)
            .bind(invite.accepted_at)
            .bind(invite.accepted_account_id)
            .execute(&mut *conn)
            .await
            .map_err(Self::sql_error)?;
        if result.rows_affected() == 0 {
            return Err(self
                .missing_or_stale(conn, "invites", invite.id, "invite is no longer pending")
                .await);
        }
        Ok(())
    }

    async fn upsert_talent_on(&self, conn: &mut PgConnection, profile: &TalentProfile) -> StorageResult<()> {
        debug!("Upserting talent profile: {}", profile.account_id);
        let skills = serde_json::to_value(&profile.skills)?;
        let query = format!(
            r#"
            INSERT INTO {} (account_id, full_name, headline, bio, location, skills, years_experience,
                            linkedin_url, github_url, portfolio_url, availability, status, featured,
                            admin_notes, internal_rating, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17)
            ON CONFLICT (account_id) DO UPDATE
            SET full_name = $2, headline = $3, bio = $4, location = $5, skills = $6,
                years_experience = $7, linkedin_url = $8, github_url = $9, portfolio_url = $10,
                availability = $11, status = $12, featured = $13, admin_notes = $14,
                internal_rating = $15, updated_at = $17
            "#,
            self.table("talent_profiles")
        );
        sqlx::query(&query)
            .bind(profile.account_id)
            .bind(&profile.full_name)
            .bind(&profile.headline)
            .bind(&profile.bio)
            .bind(&profile.location)
            .bind(skills)
            .bind(profile.years_experience.map(i32::from))
            .bind(&profile.linkedin_url)
            .bind(&profile.github_url)
            .bind(&profile.portfolio_url)
            .bind(profile.availability.as_str())
            .bind(profile.status.as_str())
            .bind(profile.featured)
            .bind(&profile.admin_notes)
            .bind(profile.internal_rating.map(i16::from))
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn upsert_founder_on(&self, conn: &mut PgConnection, profile: &FounderProfile) -> StorageResult<()> {
        let query = format!(
            r#"
            INSERT INTO {} (account_id, full_name, company_name, company_url, role_title, bio, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            ON CONFLICT (account_id) DO UPDATE
            SET full_name = $2, company_name = $3, company_url = $4, role_title = $5, bio = $6, updated_at = $8
            "#,
            self.table("founder_profiles")
        );
        sqlx::query(&query)
            .bind(profile.account_id)
            .bind(&profile.full_name)
            .bind(&profile.company_name)
            .bind(&profile.company_url)
            .bind(&profile.role_title)
            .bind(&profile.bio)
            .bind(profile.created_at)
            .bind(profile.updated_at)
            .execute(&mut *conn)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn connection(&self) -> StorageResult<sqlx::pool::PoolConnection<Postgres>> {
        self.pool.acquire().await.map_err(Self::sql_error)
    }
}

fn parse_column<T: FromStr<Err = String>>(row: &PgRow, column: &str) -> StorageResult<T> {
    let raw: String = row.try_get(column).map_err(StorageError::serialization)?;
    raw.parse::<T>().map_err(StorageError::serialization)
}

fn account_from_row(row: &PgRow) -> StorageResult<Account> {
    Ok(Account {
        id: row.try_get("id").map_err(StorageError::serialization)?,
        email: row.try_get("email").map_err(StorageError::serialization)?,
        role: parse_column::<Role>(row, "role")?,
        display_name: row.try_get("display_name").map_err(StorageError::serialization)?,
        password: PasswordHash {
            salt: row.try_get("password_salt").map_err(StorageError::serialization)?,
            digest: row.try_get("password_digest").map_err(StorageError::serialization)?,
        },
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        last_sign_in_at: row.try_get("last_sign_in_at").map_err(StorageError::serialization)?,
    })
}

fn session_from_row(row: &PgRow) -> StorageResult<Session> {
    Ok(Session {
        token_hash: row.try_get("token_hash").map_err(StorageError::serialization)?,
        account_id: row.try_get("account_id").map_err(StorageError::serialization)?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        expires_at: row.try_get("expires_at").map_err(StorageError::serialization)?,
    })
}

fn invite_from_row(row: &PgRow) -> StorageResult<Invite> {
    Ok(Invite {
        id: row.try_get("id").map_err(StorageError::serialization)?,
        email: row.try_get("email").map_err(StorageError::serialization)?,
        role: parse_column::<Role>(row, "role")?,
        token_hash: row.try_get("token_hash").map_err(StorageError::serialization)?,
        status: parse_column::<InviteStatus>(row, "status")?,
        invited_by: row.try_get("invited_by").map_err(StorageError::serialization)?,
        note: row.try_get("note").map_err(StorageError::serialization)?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        expires_at: row.try_get("expires_at").map_err(StorageError::serialization)?,
        accepted_at: row.try_get("accepted_at").map_err(StorageError::serialization)?,
        accepted_account_id: row
            .try_get("accepted_account_id")
            .map_err(StorageError::serialization)?,
    })
}

fn talent_from_row(row: &PgRow) -> StorageResult<TalentProfile> {
    let skills: serde_json::Value = row.try_get("skills").map_err(StorageError::serialization)?;
    let years: Option<i32> = row
        .try_get("years_experience")
        .map_err(StorageError::serialization)?;
    let rating: Option<i16> = row
        .try_get("internal_rating")
        .map_err(StorageError::serialization)?;
    Ok(TalentProfile {
        account_id: row.try_get("account_id").map_err(StorageError::serialization)?,
        full_name: row.try_get("full_name").map_err(StorageError::serialization)?,
        headline: row.try_get("headline").map_err(StorageError::serialization)?,
        bio: row.try_get("bio").map_err(StorageError::serialization)?,
        location: row.try_get("location").map_err(StorageError::serialization)?,
        skills: serde_json::from_value(skills)?,
        years_experience: years.and_then(|y| u16::try_from(y).ok()),
        linkedin_url: row.try_get("linkedin_url").map_err(StorageError::serialization)?,
        github_url: row.try_get("github_url").map_err(StorageError::serialization)?,
        portfolio_url: row.try_get("portfolio_url").map_err(StorageError::serialization)?,
        availability: parse_column::<Availability>(row, "availability")?,
        status: parse_column::<CurationStatus>(row, "status")?,
        featured: row.try_get("featured").map_err(StorageError::serialization)?,
        admin_notes: row.try_get("admin_notes").map_err(StorageError::serialization)?,
        internal_rating: rating.and_then(|r| u8::try_from(r).ok()),
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::serialization)?,
    })
}

fn founder_from_row(row: &PgRow) -> StorageResult<FounderProfile> {
    Ok(FounderProfile {
        account_id: row.try_get("account_id").map_err(StorageError::serialization)?,
        full_name: row.try_get("full_name").map_err(StorageError::serialization)?,
        company_name: row.try_get("company_name").map_err(StorageError::serialization)?,
        company_url: row.try_get("company_url").map_err(StorageError::serialization)?,
        role_title: row.try_get("role_title").map_err(StorageError::serialization)?,
        bio: row.try_get("bio").map_err(StorageError::serialization)?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::serialization)?,
    })
}

fn intro_from_row(row: &PgRow) -> StorageResult<IntroRequest> {
    Ok(IntroRequest {
        id: row.try_get("id").map_err(StorageError::serialization)?,
        founder_id: row.try_get("founder_id").map_err(StorageError::serialization)?,
        talent_id: row.try_get("talent_id").map_err(StorageError::serialization)?,
        message: row.try_get("message").map_err(StorageError::serialization)?,
        status: parse_column::<IntroStatus>(row, "status")?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        reviewed_at: row.try_get("reviewed_at").map_err(StorageError::serialization)?,
        reviewed_by: row.try_get("reviewed_by").map_err(StorageError::serialization)?,
        decision_note: row.try_get("decision_note").map_err(StorageError::serialization)?,
    })
}

fn past_role_from_row(row: &PgRow) -> StorageResult<PastRole> {
    Ok(PastRole {
        id: row.try_get("id").map_err(StorageError::serialization)?,
        talent_id: row.try_get("talent_id").map_err(StorageError::serialization)?,
        company_name: row.try_get("company_name").map_err(StorageError::serialization)?,
        title: row.try_get("title").map_err(StorageError::serialization)?,
        start_date: row.try_get("start_date").map_err(StorageError::serialization)?,
        end_date: row.try_get("end_date").map_err(StorageError::serialization)?,
        description: row.try_get("description").map_err(StorageError::serialization)?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::serialization)?,
    })
}

fn shortlist_from_row(row: &PgRow) -> StorageResult<ShortlistEntry> {
    Ok(ShortlistEntry {
        founder_id: row.try_get("founder_id").map_err(StorageError::serialization)?,
        talent_id: row.try_get("talent_id").map_err(StorageError::serialization)?,
        note: row.try_get("note").map_err(StorageError::serialization)?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::serialization)?,
    })
}

fn tag_from_row(row: &PgRow) -> StorageResult<Tag> {
    Ok(Tag {
        id: row.try_get("id").map_err(StorageError::serialization)?,
        name: row.try_get("name").map_err(StorageError::serialization)?,
        color: row.try_get("color").map_err(StorageError::serialization)?,
        created_at: row.try_get("created_at").map_err(StorageError::serialization)?,
    })
}

/// Escape LIKE metacharacters in user-supplied search text
fn like_pattern(raw: &str) -> String {
    let escaped = raw
        .trim()
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

fn page_bounds(page: &Page) -> (i64, i64) {
    (
        page.clamped_limit() as i64,
        i64::try_from(page.offset).unwrap_or(i64::MAX),
    )
}

fn rows_to_counts<K: FromStr<Err = String> + std::hash::Hash + Eq>(
    rows: &[PgRow],
    column: &str,
) -> StorageResult<std::collections::HashMap<K, usize>> {
    let mut counts = std::collections::HashMap::new();
    for row in rows {
        let key = parse_column::<K>(row, column)?;
        let count: i64 = row.try_get("n").map_err(StorageError::serialization)?;
        counts.insert(key, count as usize);
    }
    Ok(counts)
}

#[async_trait]
impl MarketplaceStorage for PostgresBackend {
    fn accounts(&self) -> &dyn AccountStorage {
        self
    }

    fn sessions(&self) -> &dyn SessionStorage {
        self
    }

    fn invites(&self) -> &dyn InviteStorage {
        self
    }

    fn talent(&self) -> &dyn TalentStorage {
        self
    }

    fn founders(&self) -> &dyn FounderStorage {
        self
    }

    fn intros(&self) -> &dyn IntroStorage {
        self
    }

    fn past_roles(&self) -> &dyn PastRoleStorage {
        self
    }

    fn shortlists(&self) -> &dyn ShortlistStorage {
        self
    }

    fn tags(&self) -> &dyn TagStorage {
        self
    }

    async fn complete_onboarding(&self, onboarding: &Onboarding) -> StorageResult<()> {
        let mut tx = self.pool.begin().await.map_err(Self::sql_error)?;
        // Claim the invite first so a concurrent revoke or accept loses
        self.update_pending_invite_on(&mut tx, &onboarding.invite)
            .await?;
        self.insert_account_on(&mut tx, &onboarding.account).await?;
        match &onboarding.profile {
            StarterProfile::Talent(profile) => self.upsert_talent_on(&mut tx, profile).await?,
            StarterProfile::Founder(profile) => self.upsert_founder_on(&mut tx, profile).await?,
            StarterProfile::None => {}
        }
        tx.commit().await.map_err(Self::sql_error)?;
        info!(account_id = %onboarding.account.id, "Onboarding committed");
        Ok(())
    }

    async fn health_check(&self) -> StorageResult<HealthStatus> {
        let started = Instant::now();
        let outcome = sqlx::query("SELECT 1").execute(&*self.pool).await;
        let latency_ms = started.elapsed().as_millis() as u64;
        Ok(match outcome {
            Ok(_) => HealthStatus {
                healthy: true,
                backend_type: "postgres".to_string(),
                latency_ms,
                errors: vec![],
            },
            Err(e) => HealthStatus {
                healthy: false,
                backend_type: "postgres".to_string(),
                latency_ms,
                errors: vec![e.to_string()],
            },
        })
    }
}

#[async_trait]
impl AccountStorage for PostgresBackend {
    async fn insert(&self, account: &Account) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        self.insert_account_on(&mut conn, account).await
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Account>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", self.table("accounts"));
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn find_by_email(&self, email: &str) -> StorageResult<Option<Account>> {
        let query = format!("SELECT * FROM {} WHERE email = $1", self.table("accounts"));
        let row = sqlx::query(&query)
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(account_from_row).transpose()
    }

    async fn touch_sign_in(&self, id: Uuid, at: DateTime<Utc>) -> StorageResult<()> {
        let query = format!(
            "UPDATE {} SET last_sign_in_at = $2 WHERE id = $1",
            self.table("accounts")
        );
        let result = sqlx::query(&query)
            .bind(id)
            .bind(at)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("account {}", id)));
        }
        Ok(())
    }

    async fn list(&self, role: Option<Role>, page: Page) -> StorageResult<Vec<Account>> {
        let (limit, offset) = page_bounds(&page);
        let query = format!(
            r#"
            SELECT * FROM {}
            WHERE ($1::VARCHAR IS NULL OR role = $1)
            ORDER BY created_at DESC
            LIMIT $2 OFFSET $3
            "#,
            self.table("accounts")
        );
        let rows = sqlx::query(&query)
            .bind(role.map(Role::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(account_from_row).collect()
    }

    async fn count_by_role(&self) -> StorageResult<RoleCounts> {
        let query = format!(
            "SELECT role, COUNT(*) AS n FROM {} GROUP BY role",
            self.table("accounts")
        );
        let rows = sqlx::query(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows_to_counts(&rows, "role")
    }
}

#[async_trait]
impl SessionStorage for PostgresBackend {
    async fn insert(&self, session: &Session) -> StorageResult<()> {
        let query = format!(
            "INSERT INTO {} (token_hash, account_id, created_at, expires_at) VALUES ($1, $2, $3, $4)",
            self.table("sessions")
        );
        sqlx::query(&query)
            .bind(&session.token_hash)
            .bind(session.account_id)
            .bind(session.created_at)
            .bind(session.expires_at)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn find(&self, token_hash: &str) -> StorageResult<Option<Session>> {
        let query = format!(
            "SELECT * FROM {} WHERE token_hash = $1",
            self.table("sessions")
        );
        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(session_from_row).transpose()
    }

    async fn delete(&self, token_hash: &str) -> StorageResult<()> {
        let query = format!("DELETE FROM {} WHERE token_hash = $1", self.table("sessions"));
        sqlx::query(&query)
            .bind(token_hash)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn purge_expired(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let query = format!("DELETE FROM {} WHERE expires_at <= $1", self.table("sessions"));
        let result = sqlx::query(&query)
            .bind(now)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl InviteStorage for PostgresBackend {
    async fn insert(&self, invite: &Invite) -> StorageResult<()> {
        debug!("Inserting invite: {}", invite.id);
        let query = format!(
            r#"
            INSERT INTO {} (id, email, role, token_hash, status, invited_by, note, created_at, expires_at, accepted_at, accepted_account_id)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
            self.table("invites")
        );
        sqlx::query(&query)
            .bind(invite.id)
            .bind(&invite.email)
            .bind(invite.role.as_str())
            .bind(&invite.token_hash)
            .bind(invite.status.as_str())
            .bind(invite.invited_by)
            .bind(&invite.note)
            .bind(invite.created_at)
            .bind(invite.expires_at)
            .bind(invite.accepted_at)
            .bind(invite.accepted_account_id)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Invite>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", self.table("invites"));
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(invite_from_row).transpose()
    }

    async fn find_by_token_hash(&self, token_hash: &str) -> StorageResult<Option<Invite>> {
        let query = format!(
            "SELECT * FROM {} WHERE token_hash = $1",
            self.table("invites")
        );
        let row = sqlx::query(&query)
            .bind(token_hash)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(invite_from_row).transpose()
    }

    async fn update(&self, invite: &Invite) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        self.update_pending_invite_on(&mut conn, invite).await
    }

    async fn list(&self, filter: &InviteFilter) -> StorageResult<Vec<Invite>> {
        let (limit, offset) = page_bounds(&filter.page);
        let query = format!(
            r#"
            SELECT * FROM {}
            WHERE ($1::VARCHAR IS NULL OR status = $1)
              AND ($2::VARCHAR IS NULL OR email = $2)
            ORDER BY created_at DESC
            LIMIT $3 OFFSET $4
            "#,
            self.table("invites")
        );
        let rows = sqlx::query(&query)
            .bind(filter.status.map(InviteStatus::as_str))
            .bind(filter.email.as_deref())
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(invite_from_row).collect()
    }

    async fn pending_for_email(&self, email: &str) -> StorageResult<Vec<Invite>> {
        let query = format!(
            "SELECT * FROM {} WHERE email = $1 AND status = 'pending'",
            self.table("invites")
        );
        let rows = sqlx::query(&query)
            .bind(email)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(invite_from_row).collect()
    }

    async fn count_by_status(&self) -> StorageResult<InviteCounts> {
        let query = format!(
            "SELECT status, COUNT(*) AS n FROM {} GROUP BY status",
            self.table("invites")
        );
        let rows = sqlx::query(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows_to_counts(&rows, "status")
    }

    async fn expire_stale(&self, now: DateTime<Utc>) -> StorageResult<usize> {
        let query = format!(
            "UPDATE {} SET status = 'expired' WHERE status = 'pending' AND expires_at <= $1",
            self.table("invites")
        );
        let result = sqlx::query(&query)
            .bind(now)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(result.rows_affected() as usize)
    }
}

#[async_trait]
impl TalentStorage for PostgresBackend {
    async fn upsert(&self, profile: &TalentProfile) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        self.upsert_talent_on(&mut conn, profile).await
    }

    async fn get(&self, account_id: Uuid) -> StorageResult<Option<TalentProfile>> {
        let query = format!(
            "SELECT * FROM {} WHERE account_id = $1",
            self.table("talent_profiles")
        );
        let row = sqlx::query(&query)
            .bind(account_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(talent_from_row).transpose()
    }

    async fn list(&self, filter: &TalentFilter) -> StorageResult<Vec<TalentProfile>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT * FROM {} WHERE TRUE",
            self.table("talent_profiles")
        ));

        if !filter.statuses.is_empty() {
            let statuses: Vec<String> = filter
                .statuses
                .iter()
                .map(|s| s.as_str().to_string())
                .collect();
            builder.push(" AND status = ANY(").push_bind(statuses).push(")");
        }
        if let Some(skill) = filter.skill.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            builder
                .push(" AND EXISTS (SELECT 1 FROM jsonb_array_elements_text(skills) AS sk WHERE lower(sk) = lower(")
                .push_bind(skill.to_string())
                .push("))");
        }
        if let Some(query) = filter.query.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            let pattern = like_pattern(query);
            builder.push(" AND (full_name ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR headline ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR bio ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR location ILIKE ");
            builder.push_bind(pattern.clone());
            builder.push(" OR skills::text ILIKE ");
            builder.push_bind(pattern);
            builder.push(")");
        }
        if let Some(availability) = filter.availability {
            builder
                .push(" AND availability = ")
                .push_bind(availability.as_str().to_string());
        }
        if let Some(featured) = filter.featured {
            builder.push(" AND featured = ").push_bind(featured);
        }

        let (limit, offset) = page_bounds(&filter.page);
        builder
            .push(" ORDER BY featured DESC, updated_at DESC LIMIT ")
            .push_bind(limit)
            .push(" OFFSET ")
            .push_bind(offset);

        let rows = builder
            .build()
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(talent_from_row).collect()
    }

    async fn count_by_status(&self) -> StorageResult<CurationCounts> {
        let query = format!(
            "SELECT status, COUNT(*) AS n FROM {} GROUP BY status",
            self.table("talent_profiles")
        );
        let rows = sqlx::query(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows_to_counts(&rows, "status")
    }

    async fn skill_names(&self, statuses: &[CurationStatus]) -> StorageResult<Vec<String>> {
        let statuses: Vec<String> = statuses.iter().map(|s| s.as_str().to_string()).collect();
        let query = format!(
            r#"
            SELECT DISTINCT ON (lower(sk)) sk AS name
            FROM {}, jsonb_array_elements_text(skills) AS sk
            WHERE cardinality($1::VARCHAR[]) = 0 OR status = ANY($1)
            ORDER BY lower(sk), sk
            "#,
            self.table("talent_profiles")
        );
        let rows = sqlx::query(&query)
            .bind(statuses)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter()
            .map(|row| row.try_get("name").map_err(StorageError::serialization))
            .collect()
    }
}

#[async_trait]
impl FounderStorage for PostgresBackend {
    async fn upsert(&self, profile: &FounderProfile) -> StorageResult<()> {
        let mut conn = self.connection().await?;
        self.upsert_founder_on(&mut conn, profile).await
    }

    async fn get(&self, account_id: Uuid) -> StorageResult<Option<FounderProfile>> {
        let query = format!(
            "SELECT * FROM {} WHERE account_id = $1",
            self.table("founder_profiles")
        );
        let row = sqlx::query(&query)
            .bind(account_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(founder_from_row).transpose()
    }
}

#[async_trait]
impl IntroStorage for PostgresBackend {
    async fn insert(&self, intro: &IntroRequest) -> StorageResult<()> {
        debug!("Inserting intro request: {}", intro.id);
        let query = format!(
            r#"
            INSERT INTO {} (id, founder_id, talent_id, message, status, created_at, reviewed_at, reviewed_by, decision_note)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            self.table("intro_requests")
        );
        sqlx::query(&query)
            .bind(intro.id)
            .bind(intro.founder_id)
            .bind(intro.talent_id)
            .bind(&intro.message)
            .bind(intro.status.as_str())
            .bind(intro.created_at)
            .bind(intro.reviewed_at)
            .bind(intro.reviewed_by)
            .bind(&intro.decision_note)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<IntroRequest>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", self.table("intro_requests"));
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(intro_from_row).transpose()
    }

    async fn update(&self, intro: &IntroRequest) -> StorageResult<()> {
        let query = format!(
            r#"
            UPDATE {}
            SET status = $2, reviewed_at = $3, reviewed_by = $4, decision_note = $5
            WHERE id = $1 AND status = 'pending'
            "#,
            self.table("intro_requests")
        );
        let mut conn = self.connection().await?;
        let result = sqlx::query(&query)
            .bind(intro.id)
            .bind(intro.status.as_str())
            .bind(intro.reviewed_at)
            .bind(intro.reviewed_by)
            .bind(&intro.decision_note)
            .execute(&mut *conn)
            .await
            .map_err(Self::sql_error)?;
        if result.rows_affected() == 0 {
            return Err(self
                .missing_or_stale(&mut conn, "intro_requests", intro.id, INTRO_REVIEWED)
                .await);
        }
        Ok(())
    }

    async fn delete_pending(&self, id: Uuid) -> StorageResult<()> {
        let query = format!(
            "DELETE FROM {} WHERE id = $1 AND status = 'pending'",
            self.table("intro_requests")
        );
        let mut conn = self.connection().await?;
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&mut *conn)
            .await
            .map_err(Self::sql_error)?;
        if result.rows_affected() == 0 {
            return Err(self
                .missing_or_stale(&mut conn, "intro_requests", id, INTRO_REVIEWED)
                .await);
        }
        Ok(())
    }

    async fn list(&self, filter: &IntroFilter) -> StorageResult<Vec<IntroRequest>> {
        let (limit, offset) = page_bounds(&filter.page);
        let query = format!(
            r#"
            SELECT * FROM {}
            WHERE ($1::UUID IS NULL OR founder_id = $1)
              AND ($2::UUID IS NULL OR talent_id = $2)
              AND ($3::VARCHAR IS NULL OR status = $3)
            ORDER BY created_at DESC
            LIMIT $4 OFFSET $5
            "#,
            self.table("intro_requests")
        );
        let rows = sqlx::query(&query)
            .bind(filter.founder_id)
            .bind(filter.talent_id)
            .bind(filter.status.map(IntroStatus::as_str))
            .bind(limit)
            .bind(offset)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(intro_from_row).collect()
    }

    async fn find_pending(
        &self,
        founder_id: Uuid,
        talent_id: Uuid,
    ) -> StorageResult<Option<IntroRequest>> {
        let query = format!(
            "SELECT * FROM {} WHERE founder_id = $1 AND talent_id = $2 AND status = 'pending'",
            self.table("intro_requests")
        );
        let row = sqlx::query(&query)
            .bind(founder_id)
            .bind(talent_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(intro_from_row).transpose()
    }

    async fn count_by_status(&self) -> StorageResult<IntroCounts> {
        let query = format!(
            "SELECT status, COUNT(*) AS n FROM {} GROUP BY status",
            self.table("intro_requests")
        );
        let rows = sqlx::query(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows_to_counts(&rows, "status")
    }
}

#[async_trait]
impl PastRoleStorage for PostgresBackend {
    async fn insert(&self, role: &PastRole) -> StorageResult<()> {
        let query = format!(
            r#"
            INSERT INTO {} (id, talent_id, company_name, title, start_date, end_date, description, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
            self.table("past_roles")
        );
        sqlx::query(&query)
            .bind(role.id)
            .bind(role.talent_id)
            .bind(&role.company_name)
            .bind(&role.title)
            .bind(role.start_date)
            .bind(role.end_date)
            .bind(&role.description)
            .bind(role.created_at)
            .bind(role.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<PastRole>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", self.table("past_roles"));
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(past_role_from_row).transpose()
    }

    async fn update(&self, role: &PastRole) -> StorageResult<()> {
        let query = format!(
            r#"
            UPDATE {}
            SET company_name = $2, title = $3, start_date = $4, end_date = $5, description = $6, updated_at = $7
            WHERE id = $1
            "#,
            self.table("past_roles")
        );
        let result = sqlx::query(&query)
            .bind(role.id)
            .bind(&role.company_name)
            .bind(&role.title)
            .bind(role.start_date)
            .bind(role.end_date)
            .bind(&role.description)
            .bind(role.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        if result.rows_affected() == 0 {
            return Err(StorageError::not_found(format!("past role {}", role.id)));
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> StorageResult<bool> {
        let query = format!("DELETE FROM {} WHERE id = $1", self.table("past_roles"));
        let result = sqlx::query(&query)
            .bind(id)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn list_for(&self, talent_id: Uuid) -> StorageResult<Vec<PastRole>> {
        let query = format!(
            r#"
            SELECT * FROM {}
            WHERE talent_id = $1
            ORDER BY start_date DESC, (end_date IS NOT NULL), created_at DESC
            "#,
            self.table("past_roles")
        );
        let rows = sqlx::query(&query)
            .bind(talent_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(past_role_from_row).collect()
    }
}

#[async_trait]
impl ShortlistStorage for PostgresBackend {
    async fn upsert(&self, entry: &ShortlistEntry) -> StorageResult<()> {
        let query = format!(
            r#"
            INSERT INTO {} (founder_id, talent_id, note, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (founder_id, talent_id) DO UPDATE
            SET note = $3, updated_at = $5
            "#,
            self.table("shortlists")
        );
        sqlx::query(&query)
            .bind(entry.founder_id)
            .bind(entry.talent_id)
            .bind(&entry.note)
            .bind(entry.created_at)
            .bind(entry.updated_at)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn get(
        &self,
        founder_id: Uuid,
        talent_id: Uuid,
    ) -> StorageResult<Option<ShortlistEntry>> {
        let query = format!(
            "SELECT * FROM {} WHERE founder_id = $1 AND talent_id = $2",
            self.table("shortlists")
        );
        let row = sqlx::query(&query)
            .bind(founder_id)
            .bind(talent_id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(shortlist_from_row).transpose()
    }

    async fn remove(&self, founder_id: Uuid, talent_id: Uuid) -> StorageResult<()> {
        let query = format!(
            "DELETE FROM {} WHERE founder_id = $1 AND talent_id = $2",
            self.table("shortlists")
        );
        sqlx::query(&query)
            .bind(founder_id)
            .bind(talent_id)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn list_for(&self, founder_id: Uuid) -> StorageResult<Vec<ShortlistEntry>> {
        let query = format!(
            "SELECT * FROM {} WHERE founder_id = $1 ORDER BY created_at DESC",
            self.table("shortlists")
        );
        let rows = sqlx::query(&query)
            .bind(founder_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(shortlist_from_row).collect()
    }
}

#[async_trait]
impl TagStorage for PostgresBackend {
    async fn insert(&self, tag: &Tag) -> StorageResult<()> {
        let query = format!(
            "INSERT INTO {} (id, name, color, created_at) VALUES ($1, $2, $3, $4)",
            self.table("tags")
        );
        sqlx::query(&query)
            .bind(tag.id)
            .bind(&tag.name)
            .bind(&tag.color)
            .bind(tag.created_at)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn get(&self, id: Uuid) -> StorageResult<Option<Tag>> {
        let query = format!("SELECT * FROM {} WHERE id = $1", self.table("tags"));
        let row = sqlx::query(&query)
            .bind(id)
            .fetch_optional(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        row.as_ref().map(tag_from_row).transpose()
    }

    async fn list(&self) -> StorageResult<Vec<Tag>> {
        let query = format!("SELECT * FROM {} ORDER BY lower(name)", self.table("tags"));
        let rows = sqlx::query(&query)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(tag_from_row).collect()
    }

    async fn attach(&self, talent_id: Uuid, tag_id: Uuid) -> StorageResult<()> {
        let query = format!(
            "INSERT INTO {} (talent_id, tag_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            self.table("talent_tags")
        );
        sqlx::query(&query)
            .bind(talent_id)
            .bind(tag_id)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn detach(&self, talent_id: Uuid, tag_id: Uuid) -> StorageResult<()> {
        let query = format!(
            "DELETE FROM {} WHERE talent_id = $1 AND tag_id = $2",
            self.table("talent_tags")
        );
        sqlx::query(&query)
            .bind(talent_id)
            .bind(tag_id)
            .execute(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        Ok(())
    }

    async fn tags_for(&self, talent_id: Uuid) -> StorageResult<Vec<Tag>> {
        let query = format!(
            r#"
            SELECT t.* FROM {} t
            JOIN {} tt ON tt.tag_id = t.id
            WHERE tt.talent_id = $1
            ORDER BY lower(t.name)
            "#,
            self.table("tags"),
            self.table("talent_tags")
        );
        let rows = sqlx::query(&query)
            .bind(talent_id)
            .fetch_all(&*self.pool)
            .await
            .map_err(Self::sql_error)?;
        rows.iter().map(tag_from_row).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_like_pattern_escapes_metacharacters() {
        assert_eq!(like_pattern(" rust "), "%rust%");
        assert_eq!(like_pattern("100%_done"), "%100\\%\\_done%");
    }

    #[test]
    fn test_page_bounds_clamp() {
        assert_eq!(page_bounds(&Page::new(1000, 5)), (MAX_PAGE_SIZE as i64, 5));
    }
}
