use std::fmt::Display;
use thiserror::Error;

pub mod codes;
pub mod status;

pub use codes::{describe_error_code, ErrorCode};
pub use status::RpcErrorCode;

use crate::validation::{FieldIssue, ValidationErrors};

/// The unified error type for the talentdeck application
#[derive(Error, Debug)]
pub enum MarketError {
    #[error("[E{code:04}] Configuration error: {message}")]
    Config {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Authentication error: {message}")]
    Auth { code: u16, message: String },

    #[error("[E{code:04}] Storage error: {message}")]
    Storage {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("[E{code:04}] Invite error: {message}")]
    Invite { code: u16, message: String },

    #[error("[E{code:04}] Intro request error: {message}")]
    Intro { code: u16, message: String },

    #[error("[E{code:04}] Profile error: {message}")]
    Profile { code: u16, message: String },

    #[error("[E{code:04}] Validation error: {message}")]
    Validation {
        code: u16,
        message: String,
        issues: Vec<FieldIssue>,
    },

    #[error("[E{code:04}] Procedure error: {message}")]
    Rpc { code: u16, message: String },

    #[error("[E{code:04}] {message}")]
    Other {
        code: u16,
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl MarketError {
    /// Create a configuration error with default code
    pub fn config(message: impl Into<String>) -> Self {
        Self::config_with_code(ErrorCode::CONFIG_GENERIC, message)
    }

    /// Create a configuration error with specific code
    pub fn config_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Config {
            code,
            message: message.into(),
            source: None,
        }
    }

    /// Create an authentication error with specific code
    pub fn auth(code: u16, message: impl Into<String>) -> Self {
        Self::Auth {
            code,
            message: message.into(),
        }
    }

    /// The caller is not signed in
    pub fn unauthenticated() -> Self {
        Self::auth(ErrorCode::AUTH_SESSION_REQUIRED, "sign in required")
    }

    /// The caller is signed in but lacks the role for the operation
    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::auth(ErrorCode::AUTH_FORBIDDEN, message)
    }

    /// Create a storage error with specific code
    pub fn storage_with_code(code: u16, message: impl Into<String>) -> Self {
        Self::Storage {
            code,
            message: message.into(),
            source: None,
        }
    }

    pub fn invite(code: u16, message: impl Into<String>) -> Self {
        Self::Invite {
            code,
            message: message.into(),
        }
    }

    pub fn intro(code: u16, message: impl Into<String>) -> Self {
        Self::Intro {
            code,
            message: message.into(),
        }
    }

    pub fn profile(code: u16, message: impl Into<String>) -> Self {
        Self::Profile {
            code,
            message: message.into(),
        }
    }

    pub fn profile_not_found(message: impl Into<String>) -> Self {
        Self::profile(ErrorCode::PROFILE_NOT_FOUND, message)
    }

    /// Create a validation error carrying field-level issues
    pub fn validation(message: impl Into<String>, issues: Vec<FieldIssue>) -> Self {
        Self::Validation {
            code: ErrorCode::VALIDATION_INVALID_INPUT,
            message: message.into(),
            issues,
        }
    }

    /// Request body or query could not be decoded into the input type
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::VALIDATION_MALFORMED_PAYLOAD,
            message: message.into(),
            issues: Vec::new(),
        }
    }

    pub fn rpc(code: u16, message: impl Into<String>) -> Self {
        Self::Rpc {
            code,
            message: message.into(),
        }
    }

    /// Create a generic internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Other {
            code: ErrorCode::OTHER_INTERNAL_ERROR,
            message: message.into(),
            source: None,
        }
    }

    /// Add a source error to this error
    pub fn with_source(
        mut self,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        match &mut self {
            Self::Config { source: src, .. }
            | Self::Storage { source: src, .. }
            | Self::Other { source: src, .. } => {
                *src = Some(source.into());
            }
            _ => {}
        }
        self
    }

    /// Add context to the error message
    pub fn with_context(mut self, context: impl Display) -> Self {
        match &mut self {
            Self::Config { message, .. }
            | Self::Auth { message, .. }
            | Self::Storage { message, .. }
            | Self::Invite { message, .. }
            | Self::Intro { message, .. }
            | Self::Profile { message, .. }
            | Self::Validation { message, .. }
            | Self::Rpc { message, .. }
            | Self::Other { message, .. } => {
                *message = format!("{}: {}", message, context);
            }
        }
        self
    }

    /// Get the error code
    pub fn code(&self) -> u16 {
        match self {
            Self::Config { code, .. }
            | Self::Auth { code, .. }
            | Self::Storage { code, .. }
            | Self::Invite { code, .. }
            | Self::Intro { code, .. }
            | Self::Profile { code, .. }
            | Self::Validation { code, .. }
            | Self::Rpc { code, .. }
            | Self::Other { code, .. } => *code,
        }
    }

    /// Field-level validation issues, empty for non-validation errors
    pub fn issues(&self) -> &[FieldIssue] {
        match self {
            Self::Validation { issues, .. } => issues,
            _ => &[],
        }
    }

    /// Message safe to show to an end user. Internal details of storage and
    /// configuration failures are not exposed.
    pub fn user_message(&self) -> String {
        match self {
            Self::Config { .. } | Self::Other { .. } => "Something went wrong".to_string(),
            Self::Storage { code, message, .. } => match *code {
                ErrorCode::STORAGE_NOT_FOUND
                | ErrorCode::STORAGE_ALREADY_EXISTS
                | ErrorCode::STORAGE_STALE_WRITE => message.clone(),
                _ => "The data store is unavailable, try again shortly".to_string(),
            },
            Self::Auth { message, .. }
            | Self::Invite { message, .. }
            | Self::Intro { message, .. }
            | Self::Profile { message, .. }
            | Self::Validation { message, .. }
            | Self::Rpc { message, .. } => message.clone(),
        }
    }

    /// Map to the procedure-layer error code
    pub fn rpc_code(&self) -> RpcErrorCode {
        match self {
            Self::Config { .. } | Self::Other { .. } => RpcErrorCode::InternalServerError,
            Self::Auth { code, .. } => match *code {
                ErrorCode::AUTH_FORBIDDEN => RpcErrorCode::Forbidden,
                _ => RpcErrorCode::Unauthorized,
            },
            Self::Storage { code, .. } => match *code {
                ErrorCode::STORAGE_NOT_FOUND => RpcErrorCode::NotFound,
                ErrorCode::STORAGE_ALREADY_EXISTS => RpcErrorCode::Conflict,
                ErrorCode::STORAGE_STALE_WRITE => RpcErrorCode::PreconditionFailed,
                _ => RpcErrorCode::InternalServerError,
            },
            Self::Invite { code, .. } => match *code {
                ErrorCode::INVITE_NOT_FOUND => RpcErrorCode::NotFound,
                ErrorCode::INVITE_ACCOUNT_EXISTS => RpcErrorCode::Conflict,
                _ => RpcErrorCode::PreconditionFailed,
            },
            Self::Intro { code, .. } => match *code {
                ErrorCode::INTRO_NOT_FOUND | ErrorCode::INTRO_TALENT_UNAVAILABLE => {
                    RpcErrorCode::NotFound
                }
                ErrorCode::INTRO_DUPLICATE_PENDING => RpcErrorCode::Conflict,
                _ => RpcErrorCode::PreconditionFailed,
            },
            Self::Profile { code, .. } => match *code {
                ErrorCode::PROFILE_TAG_EXISTS => RpcErrorCode::Conflict,
                _ => RpcErrorCode::NotFound,
            },
            Self::Validation { .. } => RpcErrorCode::BadRequest,
            Self::Rpc { code, .. } => match *code {
                ErrorCode::RPC_UNKNOWN_PROCEDURE => RpcErrorCode::NotFound,
                ErrorCode::RPC_METHOD_NOT_SUPPORTED => RpcErrorCode::MethodNotSupported,
                _ => RpcErrorCode::BadRequest,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.rpc_code() == RpcErrorCode::NotFound
    }
}

/// Type alias for Results using MarketError
pub type Result<T> = std::result::Result<T, MarketError>;

impl From<ValidationErrors> for MarketError {
    fn from(errors: ValidationErrors) -> Self {
        MarketError::validation(errors.summary(), errors.into_issues())
    }
}

impl From<toml::de::Error> for MarketError {
    fn from(err: toml::de::Error) -> Self {
        MarketError::config_with_code(ErrorCode::CONFIG_PARSE_ERROR, err.to_string())
            .with_source(err)
    }
}

impl From<tera::Error> for MarketError {
    fn from(err: tera::Error) -> Self {
        MarketError::internal(format!("template rendering failed: {}", err)).with_source(err)
    }
}
