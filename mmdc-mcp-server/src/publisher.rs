//! Public locators for generated artifacts.

use mmdc_mcp_config::ServerSettings;
use url::Url;

/// Builds the URL a caller uses to fetch an artifact by file name.
pub trait LocatorBuilder: Send + Sync {
    fn locate(&self, file_name: &str) -> String;
}

/// `<public_base_url>/diagrams/<file_name>?token=<auth_token>`.
///
/// The token query parameter is omitted when the token is empty.
#[derive(Debug, Clone)]
pub struct TokenUrlLocator {
    base_url: String,
    token: String,
}

impl TokenUrlLocator {
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: token.into(),
        }
    }

    pub fn from_settings(settings: &ServerSettings) -> Self {
        Self::new(&settings.public_base_url, &settings.auth_token)
    }

    fn naive(&self, file_name: &str) -> String {
        let base = self.base_url.trim_end_matches('/');
        if self.token.is_empty() {
            format!("{base}/diagrams/{file_name}")
        } else {
            format!("{base}/diagrams/{file_name}?token={}", self.token)
        }
    }
}

impl LocatorBuilder for TokenUrlLocator {
    fn locate(&self, file_name: &str) -> String {
        let mut url = match Url::parse(&self.base_url) {
            Ok(url) if !url.cannot_be_a_base() => url,
            _ => return self.naive(file_name),
        };
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().push("diagrams").push(file_name);
        }
        if !self.token.is_empty() {
            url.query_pairs_mut().append_pair("token", &self.token);
        }
        url.to_string()
    }
}
