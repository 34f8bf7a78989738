use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Credentials and tenant of the signed-in seller or admin.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthData {
    pub user_id: String,
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
}

/// Auth context passed explicitly to whoever needs it.
///
/// Created signed out; changed only through [`set_auth_data`](Self::set_auth_data),
/// [`update_token`](Self::update_token) and [`logout`](Self::logout).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    data: Option<AuthData>,
}

impl AuthContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_auth_data(&mut self, data: AuthData) {
        debug!(user = %data.user_id, "auth data set");
        self.data = Some(data);
    }

    /// Replaces the access token; ignored (returns false) when signed out.
    pub fn update_token(&mut self, token: impl Into<String>) -> bool {
        match &mut self.data {
            Some(data) => {
                data.token = token.into();
                true
            }
            None => false,
        }
    }

    pub fn logout(&mut self) {
        if let Some(data) = self.data.take() {
            debug!(user = %data.user_id, "logged out");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.data.is_some()
    }

    pub fn data(&self) -> Option<&AuthData> {
        self.data.as_ref()
    }

    pub fn token(&self) -> Option<&str> {
        self.data.as_ref().map(|data| data.token.as_str())
    }

    pub fn company_id(&self) -> Option<&str> {
        self.data.as_ref().and_then(|data| data.company_id.as_deref())
    }

    /// Form overrides derived from the session, such as the tenant's `company_id`.
    pub fn prefill(&self) -> Map<String, Value> {
        let mut overrides = Map::new();
        if let Some(company_id) = self.company_id() {
            overrides.insert("company_id".into(), Value::String(company_id.to_string()));
        }
        overrides
    }
}
