//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use super::super::error::BotError;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_feed_config_defaults() {
        let config: FeedConfig = toml::from_str("").unwrap();
        assert_eq!(config.calendar_url, "https://www.forexfactory.com/calendar");
        assert_eq!(
            config.feed_url,
            "https://nfs.faireconomy.media/ff_calendar_thisweek.json"
        );
        assert!(config.resolve_version);
        assert_eq!(config.landing_timeout_secs, 12);
        assert_eq!(config.fetch_timeout_secs, 15);
    }

    #[test]
    fn test_format_config_defaults() {
        let config = FormatConfig::default();
        assert_eq!(config.max_events, 12);
        assert_eq!(config.max_chars, 3800);
        assert_eq!(config.local_offset_hours, 6);
    }

    #[test]
    fn test_telegram_config_defaults() {
        let config: TelegramConfig = toml::from_str("").unwrap();
        assert!(config.bot_token.is_none());
        assert!(config.chat_id.is_none());
        assert_eq!(config.api_base, "https://api.telegram.org");
        assert_eq!(config.send_timeout_secs, 10);
    }

    #[test]
    fn test_full_config_deserialize() {
        let toml_str = r#"
[telegram]
bot_token = "123:abc"
chat_id = "-100200300"

[feed]
resolve_version = false
fetch_timeout_secs = 10

[format]
max_events = 5
local_offset_hours = 5

[server]
port = 8080
startup_notice = false

[bot]
survey_url = "https://example.com/survey/1"
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.telegram.bot_token.as_deref(), Some("123:abc"));
        assert!(!config.feed.resolve_version);
        assert_eq!(config.feed.fetch_timeout_secs, 10);
        assert_eq!(config.format.max_events, 5);
        assert_eq!(config.format.max_chars, 3800);
        assert_eq!(config.format.local_offset_hours, 5);
        assert_eq!(config.server.host, "0.0.0.0");
        assert_eq!(config.server.port, 8080);
        assert!(!config.server.startup_notice);
        assert_eq!(config.bot.survey_url, "https://example.com/survey/1");
        assert_eq!(config.bot.poll_timeout_secs, 30);
    }

    #[test]
    fn test_credentials_present() {
        let mut config = Config::default();
        config
            .apply_env_overrides(lookup(&[("BOT_TOKEN", "123:abc"), ("CHAT_ID", "42")]))
            .unwrap();

        let creds = config.credentials().unwrap();
        assert_eq!(creds.bot_token, "123:abc");
        assert_eq!(creds.chat_id, "42");
    }

    #[test]
    fn test_credentials_missing_token() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[("CHAT_ID", "42")])).unwrap();

        let err = config.credentials().unwrap_err();
        assert!(matches!(err, BotError::ConfigMissing("BOT_TOKEN")));
    }

    #[test]
    fn test_credentials_blank_chat_id() {
        let mut config = Config::default();
        config
            .apply_env_overrides(lookup(&[("BOT_TOKEN", "123:abc"), ("CHAT_ID", "  ")]))
            .unwrap();

        let err = config.credentials().unwrap_err();
        assert!(matches!(err, BotError::ConfigMissing("CHAT_ID")));
    }

    #[test]
    fn test_port_override() {
        let mut config = Config::default();
        config.apply_env_overrides(lookup(&[("PORT", "10000")])).unwrap();
        assert_eq!(config.server.port, 10000);
    }

    #[test]
    fn test_invalid_port_override() {
        let mut config = Config::default();
        let err = config
            .apply_env_overrides(lookup(&[("PORT", "not-a-port")]))
            .unwrap_err();
        assert!(matches!(err, BotError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[format]\nmax_events = 3\n\n[feed]\nresolve_version = false").unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.format.max_events, 3);
        assert!(!config.feed.resolve_version);
        assert_eq!(config.format.max_chars, 3800);
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.format.max_events, 12);
        assert_eq!(config.feed.fetch_timeout_secs, 15);
    }
}
