use log::debug;
use reqwest::header::USER_AGENT;
use serde_json::Value;

use super::resolver::NetworkLocator;
use crate::error::LocationError;
use crate::state::data::Coordinate;

const DEFAULT_LOOKUP_URL: &str = "https://ipapi.co/json/";

/// Approximate location from the public IP address (ipapi.co style JSON)
#[derive(Debug, Clone)]
pub struct IpLookup {
    client: reqwest::Client,
    url: String,
}

impl IpLookup {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl Default for IpLookup {
    fn default() -> Self {
        Self::new(DEFAULT_LOOKUP_URL)
    }
}

impl NetworkLocator for IpLookup {
    async fn lookup(&self) -> Result<Coordinate, LocationError> {
        debug!("Requesting network location from {}", self.url);

        let response = self
            .client
            .get(&self.url)
            .header(USER_AGENT, concat!("geo-gallery/", env!("CARGO_PKG_VERSION")))
            .send()
            .await
            .and_then(|res| res.error_for_status())
            .map_err(unavailable)?;

        let body: Value = response.json().await.map_err(unavailable)?;
        json_to_coordinate(&body)
    }
}

fn unavailable(e: reqwest::Error) -> LocationError {
    LocationError::Unavailable {
        reason: e.to_string(),
    }
}

/// Pull `latitude`/`longitude` out of the lookup response; both or nothing
fn json_to_coordinate(body: &Value) -> Result<Coordinate, LocationError> {
    let malformed = |what: &str| LocationError::Unavailable {
        reason: format!("malformed lookup response: {}", what),
    };

    if body["error"].as_bool() == Some(true) {
        let reason = body["reason"].as_str().unwrap_or("unknown error");
        return Err(malformed(reason));
    }

    let latitude = body["latitude"].as_f64().ok_or_else(|| malformed("missing latitude"))?;
    let longitude = body["longitude"].as_f64().ok_or_else(|| malformed("missing longitude"))?;

    let coordinate = Coordinate::new(latitude, longitude);
    if coordinate.is_valid() {
        Ok(coordinate)
    } else {
        Err(malformed("coordinate out of range"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_to_coordinate_valid() {
        let json_response = r#"
{
  "ip": "203.0.113.7",
  "city": "Bengaluru",
  "region": "Karnataka",
  "country_code": "IN",
  "latitude": 12.9,
  "longitude": 77.6,
  "timezone": "Asia/Kolkata"
}
"#;
        let des: Value = serde_json::from_str(json_response).unwrap();

        let coordinate = json_to_coordinate(&des).unwrap();

        assert_eq!(coordinate, Coordinate::new(12.9, 77.6));
    }

    #[test]
    fn json_to_coordinate_missing_key() {
        let des: Value = serde_json::from_str(r#"{"latitude": 12.9}"#).unwrap();

        assert!(matches!(
            json_to_coordinate(&des),
            Err(LocationError::Unavailable { .. })
        ));
    }

    #[test]
    fn json_to_coordinate_rate_limited() {
        let des: Value =
            serde_json::from_str(r#"{"error": true, "reason": "RateLimited"}"#).unwrap();

        let err = json_to_coordinate(&des).unwrap_err();
        assert!(err.to_string().contains("RateLimited"));
    }

    #[test]
    fn json_to_coordinate_string_values_are_malformed() {
        let des: Value =
            serde_json::from_str(r#"{"latitude": "12.9", "longitude": "77.6"}"#).unwrap();

        assert!(json_to_coordinate(&des).is_err());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_unavailable() {
        // Port 9 (discard) on localhost is closed in test environments
        let lookup = IpLookup::new("http://127.0.0.1:9/json/");
        assert!(matches!(
            lookup.lookup().await,
            Err(LocationError::Unavailable { .. })
        ));
    }
}
