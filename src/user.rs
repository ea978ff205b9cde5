//! Resolution of the per-user identifier that tags submitted records.

use serde::Serialize;
use tracing::info;

pub const DEFAULT_USER_ID: &str = "default";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserConfig {
    /// Wins over every other source when set.
    pub override_id: Option<String>,
    /// Fall back to `fallback_id` and accept it as a valid id.
    pub allow_no_uid: bool,
    pub fallback_id: String,
}

impl Default for UserConfig {
    fn default() -> Self {
        Self {
            override_id: None,
            allow_no_uid: false,
            fallback_id: DEFAULT_USER_ID.to_string(),
        }
    }
}

/// Candidate ids found outside the configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdSources<'a> {
    pub query: Option<&'a str>,
    pub persisted: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IdSource {
    Override,
    Query,
    Persisted,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserId {
    id: Option<String>,
    source: Option<IdSource>,
    allow_no_uid: bool,
    fallback_id: String,
}

impl UserId {
    /// Picks the first non-empty id from the override, the query, the
    /// persisted state and, when ids are optional, the fallback.
    pub fn resolve(config: &UserConfig, sources: IdSources<'_>) -> Self {
        let candidates = [
            (config.override_id.as_deref(), IdSource::Override),
            (sources.query, IdSource::Query),
            (sources.persisted, IdSource::Persisted),
        ];
        let mut resolved = candidates
            .into_iter()
            .find_map(|(id, source)| non_empty(id).map(|id| (id.to_string(), source)));

        if resolved.is_none() && config.allow_no_uid {
            info!("no user id found, using {:?}", config.fallback_id);
            resolved = Some((config.fallback_id.clone(), IdSource::Fallback));
        }

        let (id, source) = resolved.unzip();
        Self {
            id,
            source,
            allow_no_uid: config.allow_no_uid,
            fallback_id: config.fallback_id.clone(),
        }
    }

    pub fn current(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn source(&self) -> Option<IdSource> {
        self.source
    }

    /// Without `allow_no_uid`, the fallback id does not count.
    pub fn is_valid(&self) -> bool {
        match self.current() {
            Some(id) if self.allow_no_uid => !id.is_empty(),
            Some(id) => !id.is_empty() && id != self.fallback_id,
            None => false,
        }
    }

    pub fn is_default_user(&self) -> bool {
        self.current() == Some(self.fallback_id.as_str())
    }

    /// Short form for page footers: long ids keep their first six characters.
    pub fn display(&self) -> String {
        match self.current() {
            Some(id) if id.chars().count() > 8 => {
                format!("{}...", id.chars().take(6).collect::<String>())
            }
            Some(id) => id.to_string(),
            None => "not set".to_string(),
        }
    }

    pub fn clear(&mut self) {
        self.id = None;
        self.source = None;
    }

    /// Adds `uid=<id>` to a link unless it already carries one.
    pub fn href_with_uid(&self, href: &str) -> String {
        let Some(id) = self.current() else {
            return href.to_string();
        };
        if href.contains("uid=") {
            return href.to_string();
        }
        let (path, fragment) = match href.split_once('#') {
            Some((path, fragment)) => (path, Some(fragment)),
            None => (href, None),
        };
        let separator = if path.contains('?') { '&' } else { '?' };
        let mut out = format!("{path}{separator}uid={}", urlencoding::encode(id));
        if let Some(fragment) = fragment {
            out.push('#');
            out.push_str(fragment);
        }
        out
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict() -> UserConfig {
        UserConfig::default()
    }

    fn lenient() -> UserConfig {
        UserConfig {
            allow_no_uid: true,
            ..UserConfig::default()
        }
    }

    #[test]
    fn resolution_order_is_override_query_persisted() {
        let sources = IdSources {
            query: Some("from-query"),
            persisted: Some("from-disk"),
        };
        let mut config = strict();
        config.override_id = Some("pinned".into());
        let user = UserId::resolve(&config, sources);
        assert_eq!(user.current(), Some("pinned"));
        assert_eq!(user.source(), Some(IdSource::Override));

        let user = UserId::resolve(&strict(), sources);
        assert_eq!(user.current(), Some("from-query"));

        let user = UserId::resolve(
            &strict(),
            IdSources {
                query: Some(""),
                persisted: Some("from-disk"),
            },
        );
        assert_eq!(user.current(), Some("from-disk"));
        assert_eq!(user.source(), Some(IdSource::Persisted));
    }

    #[test]
    fn fallback_only_when_ids_are_optional() {
        let user = UserId::resolve(&strict(), IdSources::default());
        assert_eq!(user.current(), None);
        assert!(!user.is_valid());

        let user = UserId::resolve(&lenient(), IdSources::default());
        assert_eq!(user.current(), Some(DEFAULT_USER_ID));
        assert_eq!(user.source(), Some(IdSource::Fallback));
        assert!(user.is_valid());
        assert!(user.is_default_user());
    }

    #[test]
    fn fallback_id_is_invalid_in_strict_mode() {
        let user = UserId::resolve(
            &strict(),
            IdSources {
                query: None,
                persisted: Some(DEFAULT_USER_ID),
            },
        );
        assert!(user.is_default_user());
        assert!(!user.is_valid());
    }

    #[test]
    fn display_truncates_long_ids() {
        let user = UserId::resolve(
            &strict(),
            IdSources {
                query: Some("abcdefghij"),
                persisted: None,
            },
        );
        assert_eq!(user.display(), "abcdef...");

        let mut short = UserId::resolve(
            &strict(),
            IdSources {
                query: Some("abcd1234"),
                persisted: None,
            },
        );
        assert_eq!(short.display(), "abcd1234");
        short.clear();
        assert_eq!(short.display(), "not set");
    }

    #[test]
    fn links_gain_uid_once() {
        let user = UserId::resolve(
            &strict(),
            IdSources {
                query: Some("a b&c"),
                persisted: None,
            },
        );
        assert_eq!(user.href_with_uid("/entries"), "/entries?uid=a%20b%26c");
        assert_eq!(user.href_with_uid("/?tab=1#top"), "/?tab=1&uid=a%20b%26c#top");
        assert_eq!(user.href_with_uid("/?uid=other"), "/?uid=other");

        let nobody = UserId::resolve(&strict(), IdSources::default());
        assert_eq!(nobody.href_with_uid("/entries"), "/entries");

        let accented = UserId::resolve(
            &strict(),
            IdSources {
                query: Some("zoë/1"),
                persisted: None,
            },
        );
        assert_eq!(accented.href_with_uid("/entries"), "/entries?uid=zo%C3%AB%2F1");
    }
}
