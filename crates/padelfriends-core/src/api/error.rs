use reqwest::StatusCode;
use thiserror::Error;

/// Failures talking to the group service.
///
/// The server answers 400 for malformed input, 401 for a wrong group
/// password, 404 for an unknown group, 409 for a name clash on creation and
/// 500 for anything else.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("group password rejected")]
    PasswordRejected,

    #[error("group not found: {0}")]
    NotFound(String),

    #[error("request rejected ({status}): {body}")]
    Rejected { status: StatusCode, body: String },

    #[error("server error ({status}): {body}")]
    Server { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("invalid response: {0}")]
    InvalidResponse(String),
}

/// Longest response body kept in an error message
const MAX_BODY_LEN: usize = 500;

fn clip(body: &str) -> String {
    let body = body.trim();
    if body.len() <= MAX_BODY_LEN {
        return body.to_string();
    }
    let mut end = MAX_BODY_LEN;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}... ({} bytes)", &body[..end], body.len())
}

impl ApiError {
    /// Classify a non-success response.
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let body = clip(body);
        match status {
            StatusCode::UNAUTHORIZED => ApiError::PasswordRejected,
            StatusCode::NOT_FOUND => ApiError::NotFound(body),
            s if s.is_server_error() => ApiError::Server { status, body },
            _ => ApiError::Rejected { status, body },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ApiError::NotFound(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_status_mapping() {
        assert!(matches!(
            ApiError::from_status(StatusCode::UNAUTHORIZED, "invalid password"),
            ApiError::PasswordRejected
        ));
        assert!(ApiError::from_status(StatusCode::NOT_FOUND, "Group not found").is_not_found());
        assert!(matches!(
            ApiError::from_status(StatusCode::CONFLICT, "group name already exists"),
            ApiError::Rejected { status: StatusCode::CONFLICT, .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, ""),
            ApiError::Rejected { .. }
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, ""),
            ApiError::Server { .. }
        ));
    }

    #[test]
    fn test_long_body_is_clipped() {
        let body = "é".repeat(400);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::Server { body: clipped, .. } => {
                assert!(clipped.len() < 520);
                assert!(clipped.ends_with("(800 bytes)"));
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_message_includes_status() {
        let err = ApiError::from_status(StatusCode::BAD_REQUEST, "  name required\n");
        assert_eq!(err.to_string(), "request rejected (400 Bad Request): name required");
    }
}
