//! Client identity policy.
//!
//! Source sites block automated access aggressively. Presenting a mobile
//! app's user agent, or asking yt-dlp to use a specific player client, lowers
//! the block rate. Which identity to use depends on the URL's host and is
//! decided by an ordered table of rules; the first rule whose domain matches
//! wins, otherwise the default applies. All values are configuration and are
//! expected to need tuning as sites change.

use serde::{Deserialize, Serialize};
use url::Url;

const ANDROID_YOUTUBE_UA: &str =
    "com.google.android.youtube/17.36.4 (Linux; U; Android 12; GB) gzip";
const MOBILE_SAFARI_UA: &str = "Mozilla/5.0 (iPhone; CPU iPhone OS 17_4 like Mac OS X) \
     AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.4 Mobile/15E148 Safari/604.1";
const DESKTOP_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// How the extractor presents itself to the source site.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientIdentity {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// YouTube player client (e.g. `android`, `ios`, `web`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub player_client: Option<String>,
}

impl ClientIdentity {
    /// yt-dlp arguments for this identity.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if let Some(ref player_client) = self.player_client {
            args.extend([
                "--extractor-args".to_string(),
                format!("youtube:player_client={}", player_client),
            ]);
        }

        if let Some(ref user_agent) = self.user_agent {
            args.extend(["--user-agent".to_string(), user_agent.clone()]);
        }

        args
    }
}

/// A domain list mapped to an identity override.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRule {
    /// Registrable domains; subdomains match too.
    pub domains: Vec<String>,
    #[serde(flatten)]
    pub identity: ClientIdentity,
}

impl IdentityRule {
    pub fn new(domains: &[&str], identity: ClientIdentity) -> Self {
        Self {
            domains: domains.iter().map(|d| d.to_string()).collect(),
            identity,
        }
    }

    /// Whether `host` is one of the rule's domains or a subdomain of one.
    pub fn matches(&self, host: &str) -> bool {
        self.domains.iter().any(|domain| {
            let domain = domain.trim().trim_start_matches('.');
            host.eq_ignore_ascii_case(domain)
                || (host.len() > domain.len()
                    && host[host.len() - domain.len()..].eq_ignore_ascii_case(domain)
                    && host.as_bytes()[host.len() - domain.len() - 1] == b'.')
        })
    }
}

/// Ordered identity rules with a fallback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPolicy {
    #[serde(default = "default_identity")]
    pub default: ClientIdentity,
    #[serde(default = "default_rules")]
    pub rules: Vec<IdentityRule>,
}

fn default_identity() -> ClientIdentity {
    ClientIdentity {
        user_agent: Some(DESKTOP_UA.to_string()),
        player_client: None,
    }
}

fn default_rules() -> Vec<IdentityRule> {
    vec![
        IdentityRule::new(
            &["youtube.com", "youtu.be", "youtube-nocookie.com"],
            ClientIdentity {
                user_agent: Some(ANDROID_YOUTUBE_UA.to_string()),
                player_client: Some("android".to_string()),
            },
        ),
        IdentityRule::new(
            &[
                "instagram.com",
                "tiktok.com",
                "facebook.com",
                "fb.watch",
                "twitter.com",
                "x.com",
            ],
            ClientIdentity {
                user_agent: Some(MOBILE_SAFARI_UA.to_string()),
                player_client: None,
            },
        ),
    ]
}

impl Default for IdentityPolicy {
    fn default() -> Self {
        Self {
            default: default_identity(),
            rules: default_rules(),
        }
    }
}

impl IdentityPolicy {
    /// Identity to use for `url`. Unparseable URLs get the default.
    pub fn resolve(&self, url: &str) -> &ClientIdentity {
        let Some(host) = host_of(url) else {
            return &self.default;
        };

        self.rules
            .iter()
            .find(|rule| rule.matches(&host))
            .map(|rule| &rule.identity)
            .unwrap_or(&self.default)
    }

    /// Checks rules for empty domain lists and blank values.
    pub fn validate(&self) -> Result<(), String> {
        let identities =
            std::iter::once(&self.default).chain(self.rules.iter().map(|r| &r.identity));
        for identity in identities {
            let blank = |v: &Option<String>| v.as_deref().is_some_and(|s| s.trim().is_empty());
            if blank(&identity.user_agent) || blank(&identity.player_client) {
                return Err("identity user_agent/player_client cannot be blank".to_string());
            }
        }

        for (i, rule) in self.rules.iter().enumerate() {
            if rule.domains.is_empty() || rule.domains.iter().any(|d| d.trim().is_empty()) {
                return Err(format!("identity.rules[{}] needs at least one domain", i));
            }
        }

        Ok(())
    }
}

fn host_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url.trim()).ok()?;
    parsed.host_str().map(|h| h.to_ascii_lowercase())
}
