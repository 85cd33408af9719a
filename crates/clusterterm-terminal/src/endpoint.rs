use std::fmt;

use clusterterm_types::{SessionError, Target, DEFAULT_API_PREFIX, TERMINAL_PATH_SUFFIX};

/// WebSocket scheme of a terminal endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scheme {
    Ws,
    Wss,
}

impl Scheme {
    /// Map a page or API scheme to the matching socket scheme
    pub fn from_url_scheme(scheme: &str) -> Option<Self> {
        match scheme.trim_end_matches(':').to_lowercase().as_str() {
            "ws" | "http" => Some(Scheme::Ws),
            "wss" | "https" => Some(Scheme::Wss),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Ws => "ws",
            Scheme::Wss => "wss",
        }
    }

    /// Scheme of the REST API living next to the socket
    pub fn http(&self) -> &'static str {
        match self {
            Scheme::Ws => "http",
            Scheme::Wss => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Base address every terminal URL is composed from:
/// `{scheme}://{host}/{api_prefix}/{kind}/{id}/terminal`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalEndpoint {
    scheme: Scheme,
    host: String,
    api_prefix: String,
}

impl TerminalEndpoint {
    pub fn new(
        scheme: Scheme,
        host: impl Into<String>,
        api_prefix: impl AsRef<str>,
    ) -> Result<Self, SessionError> {
        let host = host.into();
        if host.is_empty() || host.contains('/') || host.chars().any(char::is_whitespace) {
            return Err(SessionError::InvalidEndpoint(format!("invalid host '{}'", host)));
        }
        Ok(Self {
            scheme,
            host,
            api_prefix: api_prefix.as_ref().trim_matches('/').to_string(),
        })
    }

    /// Parse `http(s)://host[/prefix]` or `ws(s)://host[/prefix]`.
    /// A base without a path uses the default API prefix.
    pub fn from_base_url(base: &str) -> Result<Self, SessionError> {
        let (scheme, rest) = base
            .split_once("://")
            .ok_or_else(|| SessionError::InvalidEndpoint(format!("'{}' has no scheme", base)))?;
        let scheme = Scheme::from_url_scheme(scheme).ok_or_else(|| {
            SessionError::InvalidEndpoint(format!("unsupported scheme '{}' in '{}'", scheme, base))
        })?;

        let (host, path) = match rest.split_once('/') {
            Some((host, path)) => (host, path.trim_matches('/')),
            None => (rest, ""),
        };
        let prefix = if path.is_empty() { DEFAULT_API_PREFIX } else { path };

        Self::new(scheme, host, prefix)
    }

    /// Replace the API prefix (e.g. from configuration)
    pub fn with_api_prefix(mut self, api_prefix: &str) -> Self {
        self.api_prefix = api_prefix.trim_matches('/').to_string();
        self
    }

    pub fn scheme(&self) -> Scheme {
        self.scheme
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn api_prefix(&self) -> &str {
        &self.api_prefix
    }

    /// Terminal socket URL for a target
    pub fn url_for(&self, target: &Target) -> String {
        format!(
            "{}/{}/{}/{}",
            self.root(self.scheme.as_str()),
            target.kind(),
            target.id(),
            TERMINAL_PATH_SUFFIX
        )
    }

    /// `http(s)://host/prefix` for the REST resource client
    pub fn http_base(&self) -> String {
        self.root(self.scheme.http())
    }

    fn root(&self, scheme: &str) -> String {
        if self.api_prefix.is_empty() {
            format!("{}://{}", scheme, self.host)
        } else {
            format!("{}://{}/{}", scheme, self.host, self.api_prefix)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clusterterm_types::TargetKind;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_url_for_composes_kind_id_and_suffix() {
        let endpoint = TerminalEndpoint::new(Scheme::Wss, "cluster.example.com", "/api/v1/").unwrap();
        let target = Target::new(TargetKind::Task, "42").unwrap();
        assert_eq!(
            endpoint.url_for(&target),
            "wss://cluster.example.com/api/v1/task/42/terminal"
        );

        let vm = Target::new(TargetKind::Vm, "vm-7").unwrap();
        assert_eq!(
            endpoint.url_for(&vm),
            "wss://cluster.example.com/api/v1/vm/vm-7/terminal"
        );
    }

    #[test]
    fn test_from_base_url_maps_http_schemes() {
        let endpoint = TerminalEndpoint::from_base_url("http://localhost:8080/api").unwrap();
        assert_eq!(endpoint.scheme(), Scheme::Ws);
        assert_eq!(endpoint.host(), "localhost:8080");
        assert_eq!(endpoint.api_prefix(), "api");
        assert_eq!(endpoint.http_base(), "http://localhost:8080/api");

        let endpoint = TerminalEndpoint::from_base_url("https://cluster.example.com").unwrap();
        assert_eq!(endpoint.scheme(), Scheme::Wss);
        assert_eq!(endpoint.api_prefix(), DEFAULT_API_PREFIX);
    }

    #[test]
    fn test_empty_prefix_has_no_double_slash() {
        let endpoint = TerminalEndpoint::new(Scheme::Ws, "10.0.0.5:9000", "").unwrap();
        let target = Target::new(TargetKind::Container, "abc").unwrap();
        assert_eq!(endpoint.url_for(&target), "ws://10.0.0.5:9000/container/abc/terminal");
    }

    #[test]
    fn test_invalid_bases_are_rejected() {
        assert!(TerminalEndpoint::from_base_url("cluster.example.com").is_err());
        assert!(TerminalEndpoint::from_base_url("ftp://cluster.example.com").is_err());
        assert!(TerminalEndpoint::from_base_url("https:///api").is_err());
    }
}
