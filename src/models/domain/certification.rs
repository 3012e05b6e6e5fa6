use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Certification state for one user. Only a passing attempt sets it and
/// nothing clears it.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct Certification {
    pub user_id: String,
    pub is_certified: bool,
    pub certified_at: Option<DateTime<Utc>>,
    pub passing_attempt_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Certification {
    pub fn uncertified(user_id: &str) -> Self {
        Certification {
            user_id: user_id.to_string(),
            is_certified: false,
            certified_at: None,
            passing_attempt_id: None,
            updated_at: None,
        }
    }
}
