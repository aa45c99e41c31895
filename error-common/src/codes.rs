// Error codes implementation
// Stable codes returned alongside API errors and written to logs

pub mod validation {
    pub const INVALID_INPUT: &str = "VALIDATION_1001";
    pub const MISSING_REQUIRED_FIELD: &str = "VALIDATION_1002";
    pub const INVALID_FORMAT: &str = "VALIDATION_1003";
}

pub mod authentication {
    pub const INVALID_CREDENTIALS: &str = "AUTH_2001";
    pub const TOKEN_EXPIRED: &str = "AUTH_2002";
    pub const MISSING_TOKEN: &str = "AUTH_2003";
}

pub mod authorization {
    pub const ACCESS_DENIED: &str = "AUTHZ_3001";
    pub const INSUFFICIENT_ROLE: &str = "AUTHZ_3002";
}

pub mod storage {
    pub const READ_FAILED: &str = "STORE_4001";
    pub const WRITE_FAILED: &str = "STORE_4002";
    /// Duplicate file number or username
    pub const DUPLICATE_ENTRY: &str = "STORE_4003";
    pub const NOT_FOUND: &str = "STORE_4004";
}

pub mod network {
    pub const REQUEST_FAILED: &str = "NET_5001";
    pub const UNEXPECTED_STATUS: &str = "NET_5002";
}
