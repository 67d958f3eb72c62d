//! Client session types
//!
//! The persisted session blob (`token` + `user`) used by the client to
//! decide whether a viewer is signed in and which push events concern them.

use serde::{Deserialize, Serialize};

/// User information as returned by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    #[serde(alias = "_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Persisted client session: bearer token plus the user it belongs to
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub token: String,
    pub user: UserInfo,
}

impl Session {
    pub fn user_id(&self) -> &str {
        &self.user.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_info_accepts_underscore_id() {
        let user: UserInfo =
            serde_json::from_str(r#"{"_id":"64b1f0c2a9d3e45f6a7b8c9d","name":"Asha"}"#).unwrap();
        assert_eq!(user.id, "64b1f0c2a9d3e45f6a7b8c9d");
    }
}
