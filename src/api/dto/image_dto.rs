//! Image-related DTOs.

use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// Query discriminators for `GET /images`.
///
/// Only `random=true&fields=url` selects an operation; any other
/// combination is rejected.
#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RandomImageQuery {
    /// Must be `true`.
    #[serde(default)]
    pub random: Option<String>,
    /// Must be `url`.
    #[serde(default)]
    pub fields: Option<String>,
}

impl RandomImageQuery {
    /// Returns `true` for the "random image, URL only" mode.
    #[must_use]
    pub fn is_random_url(&self) -> bool {
        self.random.as_deref() == Some("true") && self.fields.as_deref() == Some("url")
    }
}

/// Response body for `GET /images?random=true&fields=url`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ImageUrlResponse {
    /// Absolute URL of the chosen image.
    #[serde(rename = "imageUrl")]
    pub image_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_discriminators_match() {
        let query = |random: Option<&str>, fields: Option<&str>| RandomImageQuery {
            random: random.map(str::to_string),
            fields: fields.map(str::to_string),
        };
        assert!(query(Some("true"), Some("url")).is_random_url());
        assert!(!query(Some("false"), Some("url")).is_random_url());
        assert!(!query(Some("true"), None).is_random_url());
        assert!(!query(None, None).is_random_url());
    }

    #[test]
    fn url_response_uses_camel_case_key() {
        let body = ImageUrlResponse {
            image_url: "http://host:8080/images/a.jpg".to_string(),
        };
        assert_eq!(
            serde_json::to_string(&body).unwrap_or_default(),
            r#"{"imageUrl":"http://host:8080/images/a.jpg"}"#
        );
    }
}
