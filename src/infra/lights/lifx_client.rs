use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;

use crate::core::lights::{Light, LightController, LightError, LightResult, LightState, Waveform};

/// LIFX HTTP API client. Selectors arrive already validated by the core layer.
pub struct LifxClient {
    client: Client,
    base_url: Url,
}

#[derive(Debug, Deserialize)]
struct ResultsEnvelope {
    #[serde(default)]
    results: Vec<LightResult>,
}

impl LifxClient {
    pub fn new(token: &str) -> Result<Self, LightError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "Authorization",
            HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| LightError::Transport(e.to_string()))?,
        );
        headers.insert(
            "User-Agent",
            HeaderValue::from_static(concat!("cogbot/", env!("CARGO_PKG_VERSION"))),
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| LightError::Transport(e.to_string()))?;

        let base_url = Url::parse("https://api.lifx.com/v1")
            .map_err(|e| LightError::Transport(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    /// `/lights/{selector}/{action...}`. Labels may contain `#`, `?` or `/`, so
    /// the selector is percent-encoded as a single path segment.
    fn url(&self, selector: &str, action: &[&str]) -> Result<Url, LightError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| LightError::Transport("LIFX base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .push("lights")
            .push(selector)
            .extend(action);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, LightError> {
        let response = request
            .send()
            .await
            .map_err(|e| LightError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status(status, body));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| LightError::Transport(e.to_string()))
    }

    async fn send_results(&self, request: RequestBuilder) -> Result<Vec<LightResult>, LightError> {
        let envelope: ResultsEnvelope = self.send(request).await?;
        Ok(envelope.results)
    }
}

fn map_status(status: StatusCode, body: String) -> LightError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => LightError::Unauthorized,
        StatusCode::NOT_FOUND => LightError::NotFound,
        _ => LightError::Api {
            status: status.as_u16(),
            body,
        },
    }
}

#[async_trait]
impl LightController for LifxClient {
    async fn list(&self, selector: &str) -> Result<Vec<Light>, LightError> {
        self.send(self.client.get(self.url(selector, &[])?)).await
    }

    async fn set_state(
        &self,
        selector: &str,
        state: &LightState,
    ) -> Result<Vec<LightResult>, LightError> {
        self.send_results(self.client.put(self.url(selector, &["state"])?).json(state))
            .await
    }

    async fn toggle(&self, selector: &str) -> Result<Vec<LightResult>, LightError> {
        self.send_results(self.client.post(self.url(selector, &["toggle"])?))
            .await
    }

    async fn pulse(&self, selector: &str, wave: &Waveform) -> Result<Vec<LightResult>, LightError> {
        self.send_results(
            self.client
                .post(self.url(selector, &["effects", "pulse"])?)
                .json(wave),
        )
        .await
    }

    async fn breathe(
        &self,
        selector: &str,
        wave: &Waveform,
    ) -> Result<Vec<LightResult>, LightError> {
        self.send_results(
            self.client
                .post(self.url(selector, &["effects", "breathe"])?)
                .json(wave),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lights::validate_selector;

    #[test]
    fn test_status_mapping() {
        assert!(matches!(
            map_status(StatusCode::UNAUTHORIZED, String::new()),
            LightError::Unauthorized
        ));
        assert!(matches!(
            map_status(StatusCode::NOT_FOUND, String::new()),
            LightError::NotFound
        ));
        assert!(matches!(
            map_status(StatusCode::UNPROCESSABLE_ENTITY, "bad color".to_string()),
            LightError::Api { status: 422, .. }
        ));
    }

    #[test]
    fn test_urls() {
        let client = LifxClient::new("token").unwrap();
        assert_eq!(
            client.url("label:Desk", &["effects", "pulse"]).unwrap().as_str(),
            "https://api.lifx.com/v1/lights/label:Desk/effects/pulse"
        );
        assert_eq!(
            client.url("all", &[]).unwrap().as_str(),
            "https://api.lifx.com/v1/lights/all"
        );
    }

    #[test]
    fn test_label_punctuation_stays_in_selector() {
        let client = LifxClient::new("token").unwrap();
        let selector = validate_selector("label:Room #2").unwrap();

        let url = client.url(&selector, &["state"]).unwrap();
        assert_eq!(url.path(), "/v1/lights/label:Room%20%232/state");
        assert_eq!(url.fragment(), None);

        let url = client.url("label:Up/Down?", &["toggle"]).unwrap();
        assert_eq!(url.path(), "/v1/lights/label:Up%2FDown%3F/toggle");
        assert_eq!(url.query(), None);
    }

    #[test]
    fn test_list_response_parses() {
        let body = r#"[{
            "id": "d073d5000001",
            "label": "Desk",
            "connected": true,
            "power": "on",
            "color": {"hue": 120.0, "saturation": 1.0, "kelvin": 3500},
            "brightness": 0.8,
            "group": {"id": "g1", "name": "Office"},
            "location": {"id": "l1", "name": "Home"}
        }]"#;
        let lights: Vec<Light> = serde_json::from_str(body).unwrap();
        assert_eq!(lights[0].label, "Desk");
        assert_eq!(lights[0].group.as_ref().unwrap().name, "Office");
    }

    #[test]
    fn test_results_envelope() {
        let body = r#"{"results":[{"id":"d073d5000001","label":"Desk","status":"ok"}]}"#;
        let envelope: ResultsEnvelope = serde_json::from_str(body).unwrap();
        assert_eq!(envelope.results[0].status, "ok");
    }
}
