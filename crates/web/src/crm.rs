//! Outbound CRM lookup backing the `get_contact_details` tool.

use serde_json::{json, Value};

/// Timeout for the upstream CRM call.
const UPSTREAM_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(30);

/// Client for the CRM contact API.
///
/// Lookups never fail: any upstream problem degrades to a canned fallback
/// payload carrying the requested id and the underlying error, so the tool
/// host stays usable in development and against a flaky upstream.
pub struct CrmClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CrmClient {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Result<Self, reqwest::Error> {
        let http = reqwest::Client::builder().timeout(UPSTREAM_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_url: base_url.into(),
            api_key,
        })
    }

    /// Fetch contact details, falling back to mock data on any error.
    pub async fn contact_details(&self, contact_id: &str) -> Value {
        match self.fetch(contact_id).await {
            Ok(details) => details,
            Err(e) => {
                tracing::warn!(contact_id, error = %e, "CRM lookup failed, serving fallback");
                fallback_contact(contact_id, &e)
            }
        }
    }

    async fn fetch(&self, contact_id: &str) -> Result<Value, reqwest::Error> {
        let url = format!("{}/GetContactDetails", self.base_url);
        let mut request = self
            .http
            .get(&url)
            .query(&[("contactId", contact_id)])
            .header("accept", "application/json");
        if let Some(key) = &self.api_key {
            request = request.header("api-key", key);
        }
        request.send().await?.error_for_status()?.json().await
    }
}

fn fallback_contact(contact_id: &str, error: &dyn std::fmt::Display) -> Value {
    json!({
        "id": contact_id,
        "name": "John Doe",
        "email": "john.doe@example.com",
        "phone": "+1-555-0123",
        "status": "mock",
        "note": format!("This is fallback mock data due to API error: {error}")
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unreachable_upstream_yields_fallback_payload() {
        let crm = CrmClient::new("http://127.0.0.1:9/api/contact", None).unwrap();
        let details = crm.contact_details("42").await;
        assert_eq!(details["id"], "42");
        assert_eq!(details["status"], "mock");
        assert!(details["note"].as_str().unwrap().contains("API error"));
    }
}
