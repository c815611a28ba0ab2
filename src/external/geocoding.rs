use std::time::Duration;

use crate::config::GeocodingConfig;
use crate::error::{AppError, AppResult};
use reqwest::Client;
use serde::Deserialize;

/// 地址标签最大长度（与 listings.location 列一致）
pub const MAX_LABEL_LEN: usize = 100;

#[derive(Debug, Default, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Default, Deserialize)]
struct GeocodeResult {
    #[serde(default)]
    formatted_address: String,
}

/// 坐标转地址失败时使用的占位标签
pub fn fallback_label(latitude: f64, longitude: f64) -> String {
    format!("Location: {latitude:.4}, {longitude:.4}")
}

fn truncate_label(label: &str) -> String {
    label.chars().take(MAX_LABEL_LEN).collect()
}

/// Google 逆地理编码
///
/// 地址只是展示用标签，不参与邻近计算。任何失败都退化为坐标占位标签，不阻断记录创建。
#[derive(Clone)]
pub struct GeocodingService {
    http: Client,
    cfg: GeocodingConfig,
}

impl GeocodingService {
    pub fn new(cfg: GeocodingConfig) -> Self {
        let http = Client::builder()
            .user_agent("agricare-backend/geocoding")
            .timeout(Duration::from_millis(cfg.timeout_ms))
            .build()
            .unwrap_or_else(|e| {
                log::warn!("Failed to build geocoding client, using defaults: {e}");
                Client::new()
            });
        Self { http, cfg }
    }

    pub fn is_enabled(&self) -> bool {
        !self.cfg.api_key.is_empty()
    }

    pub async fn reverse_geocode(&self, latitude: f64, longitude: f64) -> String {
        if !self.is_enabled() {
            return fallback_label(latitude, longitude);
        }

        match self.lookup(latitude, longitude).await {
            Ok(address) => truncate_label(&address),
            Err(e) => {
                log::warn!("Reverse geocoding failed for ({latitude}, {longitude}): {e}");
                fallback_label(latitude, longitude)
            }
        }
    }

    async fn lookup(&self, latitude: f64, longitude: f64) -> AppResult<String> {
        let latlng = format!("{latitude},{longitude}");
        let resp = self
            .http
            .get(&self.cfg.base_url)
            .query(&[("latlng", latlng.as_str()), ("key", self.cfg.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(AppError::ExternalApiError(format!(
                "Geocoding HTTP {}",
                status.as_u16()
            )));
        }

        parse_address(&body)
    }
}

fn parse_address(body: &str) -> AppResult<String> {
    let payload: GeocodeResponse = serde_json::from_str(body).unwrap_or_default();

    if payload.status != "OK" {
        return Err(AppError::ExternalApiError(format!(
            "Geocoding status {:?}: {}",
            payload.status,
            payload
                .error_message
                .unwrap_or_else(|| "No error message".to_string())
        )));
    }

    payload
        .results
        .into_iter()
        .map(|r| r.formatted_address.trim().to_string())
        .find(|a| !a.is_empty())
        .ok_or_else(|| AppError::ExternalApiError("Geocoding returned no address".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_label_format() {
        assert_eq!(
            fallback_label(31.2510782, 75.6997394),
            "Location: 31.2511, 75.6997"
        );
    }

    #[test]
    fn test_parse_ok_payload() {
        let body = r#"{
            "status": "OK",
            "results": [
                {"formatted_address": "Phagwara, Punjab 144411, India", "place_id": "x"}
            ]
        }"#;
        assert_eq!(
            parse_address(body).unwrap(),
            "Phagwara, Punjab 144411, India"
        );
    }

    #[test]
    fn test_parse_skips_blank_addresses() {
        let body = r#"{"status": "OK", "results": [{}, {"formatted_address": "Jalandhar"}]}"#;
        assert_eq!(parse_address(body).unwrap(), "Jalandhar");
    }

    #[test]
    fn test_parse_rejects_bad_payloads() {
        assert!(parse_address("not json").is_err());
        assert!(parse_address(r#"{"status": "REQUEST_DENIED", "error_message": "bad key"}"#).is_err());
        assert!(parse_address(r#"{"status": "OK", "results": []}"#).is_err());
        assert!(parse_address(r#"{"results": [{"formatted_address": "x"}]}"#).is_err());
    }

    #[test]
    fn test_truncate_label() {
        let long = "a".repeat(250);
        assert_eq!(truncate_label(&long).chars().count(), MAX_LABEL_LEN);
        assert_eq!(truncate_label("short"), "short");
    }

    #[tokio::test]
    async fn test_disabled_service_uses_fallback() {
        let service = GeocodingService::new(GeocodingConfig::default());
        assert!(!service.is_enabled());
        assert_eq!(
            service.reverse_geocode(10.0, 20.0).await,
            "Location: 10.0000, 20.0000"
        );
    }
}
