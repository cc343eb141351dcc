use crate::error::ConfigError;
use gg_vcs::ConfigSource;
use std::fmt;

pub const SECTION: &str = "gerrit";
pub const DEFAULT_TRIGGER: &str = "runverify";
pub const DEFAULT_PREVENT_BUILD_TOPIC: &str = "NOCI";

// git config keys cannot contain '_' and are matched case-insensitively.
const PREVENT_BUILD_TOPIC_KEYS: [&str; 2] = ["prevent-build-topic", "preventbuildtopic"];

const ENV_USER: &str = "GERRIT_USER";
const ENV_TOKEN: &str = "GERRIT_TOKEN";
const ENV_HOST: &str = "GERRIT_HOST";
const ENV_TRIGGER: &str = "GERRIT_TRIGGER";
const ENV_PREVENT_BUILD_TOPIC: &str = "GERRIT_PREVENT_BUILD_TOPIC";

/// HTTP password or access token. Never shows up in `Debug` output.
#[derive(Clone, PartialEq, Eq)]
pub struct Token(String);

impl Token {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Token(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GerritConfig {
    pub user: String,
    pub token: Token,
    pub host: String,
    pub trigger: String,
    pub prevent_build_topic: String,
}

impl GerritConfig {
    /// `https://{host}`, unless the host was configured with its own scheme.
    pub fn base_url(&self) -> String {
        let host = self.host.trim_end_matches('/');
        if host.contains("://") {
            host.to_string()
        } else {
            format!("https://{host}")
        }
    }
}

/// One place settings may come from. `Ok(None)` hands over to the next strategy.
trait ResolveStrategy {
    fn name(&self) -> &'static str;
    fn resolve(&self) -> Result<Option<GerritConfig>, ConfigError>;
}

struct SectionStrategy<'a, C: ConfigSource + ?Sized> {
    source: &'a C,
}

impl<C: ConfigSource + ?Sized> SectionStrategy<'_, C> {
    fn lookup(&self, key: &str) -> Option<String> {
        self.source
            .value(SECTION, key)
            .filter(|value| !value.is_empty())
    }
}

impl<C: ConfigSource + ?Sized> ResolveStrategy for SectionStrategy<'_, C> {
    fn name(&self) -> &'static str {
        "git config"
    }

    fn resolve(&self) -> Result<Option<GerritConfig>, ConfigError> {
        if !self.source.has_section(SECTION) {
            return Ok(None);
        }
        let required =
            |key: &'static str| self.lookup(key).ok_or(ConfigError::MissingOption { key });
        let user = required("user")?;
        let token = required("token")?;
        let host = required("host")?;
        let prevent_build_topic = PREVENT_BUILD_TOPIC_KEYS
            .iter()
            .find_map(|key| self.lookup(key));
        Ok(Some(with_defaults(
            user,
            token,
            host,
            self.lookup("trigger"),
            prevent_build_topic,
        )))
    }
}

struct EnvStrategy<F: Fn(&str) -> Option<String>> {
    lookup: F,
}

impl<F: Fn(&str) -> Option<String>> EnvStrategy<F> {
    fn get(&self, key: &str) -> Option<String> {
        (self.lookup)(key).filter(|value| !value.is_empty())
    }
}

impl<F: Fn(&str) -> Option<String>> ResolveStrategy for EnvStrategy<F> {
    fn name(&self) -> &'static str {
        "environment"
    }

    fn resolve(&self) -> Result<Option<GerritConfig>, ConfigError> {
        let (Some(user), Some(token), Some(host)) =
            (self.get(ENV_USER), self.get(ENV_TOKEN), self.get(ENV_HOST))
        else {
            return Ok(None);
        };
        Ok(Some(with_defaults(
            user,
            token,
            host,
            self.get(ENV_TRIGGER),
            self.get(ENV_PREVENT_BUILD_TOPIC),
        )))
    }
}

fn with_defaults(
    user: String,
    token: String,
    host: String,
    trigger: Option<String>,
    prevent_build_topic: Option<String>,
) -> GerritConfig {
    GerritConfig {
        user,
        token: Token::new(token),
        host,
        trigger: trigger.unwrap_or_else(|| DEFAULT_TRIGGER.to_string()),
        prevent_build_topic: prevent_build_topic
            .unwrap_or_else(|| DEFAULT_PREVENT_BUILD_TOPIC.to_string()),
    }
}

/// Git configuration first, then the environment; the first strategy that applies wins.
pub fn resolve<C, F>(source: &C, env: F) -> Result<GerritConfig, ConfigError>
where
    C: ConfigSource + ?Sized,
    F: Fn(&str) -> Option<String>,
{
    let section = SectionStrategy { source };
    let environment = EnvStrategy { lookup: env };
    let strategies: [&dyn ResolveStrategy; 2] = [&section, &environment];
    for strategy in strategies {
        if let Some(config) = strategy.resolve()? {
            tracing::debug!(
                source = strategy.name(),
                user = %config.user,
                host = %config.host,
                "resolved gerrit configuration"
            );
            return Ok(config);
        }
    }
    Err(ConfigError::MissingSection)
}

pub fn resolve_from_process<C: ConfigSource + ?Sized>(
    source: &C,
) -> Result<GerritConfig, ConfigError> {
    resolve(source, |key| std::env::var(key).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::FakeConfig;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_section_with_required_keys_uses_defaults() {
        let source = FakeConfig::section(&[
            ("user", "jdoe"),
            ("token", "s3cret"),
            ("host", "review.example.org"),
        ]);
        let config = resolve(&source, env(&[])).unwrap();
        assert_eq!(config.user, "jdoe");
        assert_eq!(config.token.expose(), "s3cret");
        assert_eq!(config.host, "review.example.org");
        assert_eq!(config.trigger, "runverify");
        assert_eq!(config.prevent_build_topic, "NOCI");
    }

    #[test]
    fn test_section_optional_keys() {
        let source = FakeConfig::section(&[
            ("user", "jdoe"),
            ("token", "s3cret"),
            ("host", "review.example.org"),
            ("trigger", "recheck"),
            ("prevent-build-topic", "SKIPCI"),
        ]);
        let config = resolve(&source, env(&[])).unwrap();
        assert_eq!(config.trigger, "recheck");
        assert_eq!(config.prevent_build_topic, "SKIPCI");
    }

    #[test]
    fn test_section_missing_key_is_not_filled_from_env() {
        let source = FakeConfig::section(&[("user", "jdoe"), ("host", "review.example.org")]);
        let result = resolve(
            &source,
            env(&[
                ("GERRIT_USER", "envuser"),
                ("GERRIT_TOKEN", "envtoken"),
                ("GERRIT_HOST", "env.example.org"),
            ]),
        );
        assert_eq!(result, Err(ConfigError::MissingOption { key: "token" }));
        assert_eq!(
            result.unwrap_err().to_string(),
            "missing option 'token' in section gerrit in your git configuration"
        );
    }

    #[test]
    fn test_empty_section_value_counts_as_missing() {
        let source = FakeConfig::section(&[("user", ""), ("token", "t"), ("host", "h")]);
        assert_eq!(
            resolve(&source, env(&[])),
            Err(ConfigError::MissingOption { key: "user" })
        );
    }

    #[test]
    fn test_env_fallback_without_section() {
        let config = resolve(
            &FakeConfig::empty(),
            env(&[
                ("GERRIT_USER", "ci-bot"),
                ("GERRIT_TOKEN", "tok"),
                ("GERRIT_HOST", "gerrit.internal"),
                ("GERRIT_TRIGGER", "retest"),
            ]),
        )
        .unwrap();
        assert_eq!(config.user, "ci-bot");
        assert_eq!(config.trigger, "retest");
        assert_eq!(config.prevent_build_topic, "NOCI");
    }

    #[test]
    fn test_env_incomplete_fails() {
        let result = resolve(
            &FakeConfig::empty(),
            env(&[("GERRIT_USER", "ci-bot"), ("GERRIT_HOST", "gerrit.internal")]),
        );
        assert_eq!(result, Err(ConfigError::MissingSection));
    }

    #[test]
    fn test_token_is_redacted() {
        let source = FakeConfig::section(&[("user", "u"), ("token", "hunter2"), ("host", "h")]);
        let config = resolve(&source, env(&[])).unwrap();
        assert!(!format!("{config:?}").contains("hunter2"));
    }

    #[test]
    fn test_base_url() {
        let source =
            FakeConfig::section(&[("user", "u"), ("token", "t"), ("host", "review.example.org")]);
        let mut config = resolve(&source, env(&[])).unwrap();
        assert_eq!(config.base_url(), "https://review.example.org");
        config.host = "http://localhost:8080/".to_string();
        assert_eq!(config.base_url(), "http://localhost:8080");
    }
}
