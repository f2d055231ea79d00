//! Wire and client defaults
//!
//! Centralized location for the constants shared by the client crates.

// Endpoint defaults
pub const DEFAULT_ENDPOINT: &str = "https://api.neo4j.io";
pub const DEFAULT_API_VERSION: &str = "v1";
pub const DEFAULT_MAX_RETRIES: u32 = 0;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

// Paths
pub const TOKEN_PATH: &str = "/oauth/token";
pub const INSTANCES_PATH: &str = "/instances";

// Headers consumed from responses
pub const REQUEST_ID_HEADER: &str = "x-request-id";
pub const DEPRECATION_HEADER: &str = "x-tyk-api-expires";

/// Status codes that are retried by the resource retry policy. 501 and 4xx
/// are terminal.
pub const RETRYABLE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];

/// Whether a resource response status is eligible for a retry.
#[must_use]
pub fn is_retryable_status(status: u16) -> bool {
    RETRYABLE_STATUS_CODES.contains(&status)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_status_set() {
        for code in [500, 502, 503, 504] {
            assert!(is_retryable_status(code), "{code} should be retryable");
        }
        for code in [200, 400, 403, 404, 429, 501, 505] {
            assert!(!is_retryable_status(code), "{code} should not be retryable");
        }
    }
}
