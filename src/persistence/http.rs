//! Blocking client for the highlight API.

use std::time::Duration;

use tracing::debug;

use super::HighlightBackend;
use super::wire::{CreateLocation, ErrorBody, LocationPatch, LocationRecord};
use crate::overlay::{Highlight, HighlightDraft, HighlightPatch, PersistenceError};

const LOCATION_PATH: &str = "/api/pid/location";

pub struct HttpBackend {
    agent: ureq::Agent,
    base_url: String,
    token: Option<String>,
}

impl HttpBackend {
    pub fn new(base_url: &str, token: Option<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout_connect(timeout)
            .timeout(timeout)
            .build();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.filter(|t| !t.is_empty()),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn request(&self, method: &str, path: &str) -> ureq::Request {
        let url = self.url(path);
        debug!("{} {}", method, url);
        let request = self
            .agent
            .request(method, &url)
            .set("User-Agent", "pidmark")
            .set("Accept", "application/json");
        match &self.token {
            Some(token) => request.set("Authorization", &format!("Bearer {}", token)),
            None => request,
        }
    }
}

fn location_path(id: &str) -> String {
    format!("{}/{}", LOCATION_PATH, urlencoding::encode(id))
}

fn document_path(document_id: &str) -> String {
    format!("{}/pid/{}", LOCATION_PATH, urlencoding::encode(document_id))
}

impl HighlightBackend for HttpBackend {
    fn name(&self) -> &'static str {
        "http"
    }

    fn create(&self, draft: &HighlightDraft) -> Result<String, PersistenceError> {
        let response = self
            .request("POST", LOCATION_PATH)
            .send_json(CreateLocation::from(draft))
            .map_err(map_error)?;
        let record: LocationRecord = response
            .into_json()
            .map_err(|e| PersistenceError::Decode(e.to_string()))?;
        Ok(record.id)
    }

    fn update(&self, id: &str, patch: &HighlightPatch) -> Result<(), PersistenceError> {
        self.request("PATCH", &location_path(id))
            .send_json(LocationPatch::from(patch))
            .map_err(map_error)?;
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), PersistenceError> {
        match self
            .request("DELETE", &location_path(id))
            .call()
        {
            Ok(_) => Ok(()),
            Err(ureq::Error::Status(404, _)) => {
                // Already gone.
                debug!("Highlight {} was already deleted", id);
                Ok(())
            }
            Err(e) => Err(map_error(e)),
        }
    }

    fn list(&self, document_id: &str) -> Result<Vec<Highlight>, PersistenceError> {
        let response = self
            .request("GET", &document_path(document_id))
            .call()
            .map_err(map_error)?;
        let records: Vec<LocationRecord> = response
            .into_json()
            .map_err(|e| PersistenceError::Decode(e.to_string()))?;
        Ok(records.into_iter().map(Highlight::from).collect())
    }
}

fn map_error(error: ureq::Error) -> PersistenceError {
    match error {
        ureq::Error::Status(status, response) => {
            let message = response
                .into_json::<ErrorBody>()
                .map(|body| body.message())
                .unwrap_or_else(|_| "no details".to_string());
            PersistenceError::Status { status, message }
        }
        ureq::Error::Transport(transport) => PersistenceError::Network(transport.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_without_double_slash() {
        let backend = HttpBackend::new("http://localhost:8000/", None, Duration::from_secs(1));
        assert_eq!(
            backend.url("/api/pid/location"),
            "http://localhost:8000/api/pid/location"
        );
    }

    #[test]
    fn test_path_segments_are_encoded() {
        assert_eq!(document_path("unit#2"), "/api/pid/location/pid/unit%232");
        assert_eq!(document_path("a?b"), "/api/pid/location/pid/a%3Fb");
        assert_eq!(document_path("plant 7/sheets"), "/api/pid/location/pid/plant%207%2Fsheets");
        assert_eq!(location_path("abc-123"), "/api/pid/location/abc-123");
    }

    #[test]
    fn test_empty_token_is_ignored() {
        let backend = HttpBackend::new("http://localhost", Some(String::new()), Duration::from_secs(1));
        assert!(backend.token.is_none());
    }

    #[test]
    fn test_status_error_carries_detail() {
        let response =
            ureq::Response::new(422, "Unprocessable Entity", r#"{"detail":"bad page"}"#).unwrap();
        let error = map_error(ureq::Error::Status(422, response));
        assert_eq!(
            error,
            PersistenceError::Status {
                status: 422,
                message: "bad page".into()
            }
        );
    }

    #[test]
    fn test_unreachable_server_is_network_error() {
        let backend = HttpBackend::new("http://127.0.0.1:9", None, Duration::from_millis(500));
        let result = backend.list("pid-1");
        assert!(matches!(result, Err(PersistenceError::Network(_))));
    }
}
