/// Error code registry for talentdeck
///
/// Error codes are organized by category:
/// - 1000-1999: Configuration errors
/// - 2000-2999: Authentication and authorization errors
/// - 3000-3999: Storage errors
/// - 4000-4999: Invite lifecycle errors
/// - 5000-5999: Intro request errors
/// - 6000-6999: Profile errors
/// - 7000-7999: Validation errors
/// - 8000-8999: Procedure (RPC) errors
/// - 9000-9999: Other errors
#[allow(dead_code)]
pub struct ErrorCode;

impl ErrorCode {
    // Configuration errors (1000-1999)
    pub const CONFIG_GENERIC: u16 = 1000;
    pub const CONFIG_NOT_FOUND: u16 = 1001;
    pub const CONFIG_PARSE_ERROR: u16 = 1002;
    pub const CONFIG_INVALID_VALUE: u16 = 1003;
    pub const CONFIG_MISSING_REQUIRED: u16 = 1004;

    // Authentication and authorization errors (2000-2999)
    pub const AUTH_GENERIC: u16 = 2000;
    pub const AUTH_INVALID_CREDENTIALS: u16 = 2001;
    pub const AUTH_SESSION_REQUIRED: u16 = 2002;
    pub const AUTH_SESSION_EXPIRED: u16 = 2003;
    pub const AUTH_FORBIDDEN: u16 = 2004;

    // Storage errors (3000-3999)
    pub const STORAGE_GENERIC: u16 = 3000;
    pub const STORAGE_NOT_FOUND: u16 = 3004;
    pub const STORAGE_ALREADY_EXISTS: u16 = 3005;
    pub const STORAGE_STALE_WRITE: u16 = 3006;
    pub const STORAGE_BACKEND_ERROR: u16 = 3010;
    pub const STORAGE_SERIALIZATION_ERROR: u16 = 3011;
    pub const STORAGE_CONNECTION_ERROR: u16 = 3012;

    // Invite lifecycle errors (4000-4999)
    pub const INVITE_GENERIC: u16 = 4000;
    pub const INVITE_NOT_FOUND: u16 = 4001;
    pub const INVITE_EXPIRED: u16 = 4002;
    pub const INVITE_ALREADY_USED: u16 = 4003;
    pub const INVITE_REVOKED: u16 = 4004;
    pub const INVITE_ACCOUNT_EXISTS: u16 = 4005;

    // Intro request errors (5000-5999)
    pub const INTRO_GENERIC: u16 = 5000;
    pub const INTRO_NOT_FOUND: u16 = 5001;
    pub const INTRO_DUPLICATE_PENDING: u16 = 5002;
    pub const INTRO_INVALID_TRANSITION: u16 = 5003;
    pub const INTRO_TALENT_UNAVAILABLE: u16 = 5004;

    // Profile errors (6000-6999)
    pub const PROFILE_GENERIC: u16 = 6000;
    pub const PROFILE_NOT_FOUND: u16 = 6001;
    pub const PROFILE_TAG_EXISTS: u16 = 6002;

    // Validation errors (7000-7999)
    pub const VALIDATION_GENERIC: u16 = 7000;
    pub const VALIDATION_INVALID_INPUT: u16 = 7008;
    pub const VALIDATION_MALFORMED_PAYLOAD: u16 = 7009;

    // Procedure errors (8000-8999)
    pub const RPC_GENERIC: u16 = 8000;
    pub const RPC_UNKNOWN_PROCEDURE: u16 = 8001;
    pub const RPC_METHOD_NOT_SUPPORTED: u16 = 8002;

    // Other errors (9000-9999)
    pub const OTHER_GENERIC: u16 = 9000;
    pub const OTHER_INTERNAL_ERROR: u16 = 9004;
}

/// Get a human-readable description for an error code
pub fn describe_error_code(code: u16) -> &'static str {
    match code {
        1000 => "Generic configuration error",
        1001 => "Configuration file not found",
        1002 => "Failed to parse configuration",
        1003 => "Invalid value in configuration",
        1004 => "Required configuration field is missing",

        2000 => "Generic authentication error",
        2001 => "Email or password is incorrect",
        2002 => "A signed-in session is required",
        2003 => "Session has expired",
        2004 => "Caller's role may not perform this operation",

        3000 => "Generic storage error",
        3004 => "Storage item not found",
        3005 => "Storage item already exists",
        3006 => "Storage item changed since it was read",
        3010 => "Storage backend error",
        3011 => "Storage serialization error",
        3012 => "Storage connection error",

        4000 => "Generic invite error",
        4001 => "Invite not found",
        4002 => "Invite has expired",
        4003 => "Invite has already been used",
        4004 => "Invite was revoked",
        4005 => "An account already exists for this email",

        5000 => "Generic intro request error",
        5001 => "Intro request not found",
        5002 => "A pending intro request already exists for this talent",
        5003 => "Intro request cannot move to the requested status",
        5004 => "Talent profile is not available for introductions",

        6000 => "Generic profile error",
        6001 => "Profile not found",
        6002 => "A tag with this name already exists",

        7000 => "Generic validation error",
        7008 => "Input failed validation",
        7009 => "Request payload could not be decoded",

        8000 => "Generic procedure error",
        8001 => "Unknown procedure",
        8002 => "Procedure does not support this HTTP method",

        9000 => "Generic error",
        9004 => "Internal error",

        _ => "Unknown error code",
    }
}
