use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

const TOKEN_PLACEHOLDER: &str = "YOUR_BOT_TOKEN_HERE";
const CHAT_ID_PLACEHOLDER: &str = "YOUR_CHAT_ID_HERE";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Language {
    #[default]
    Ru,
    En,
}

impl Language {
    /// Parse the config value. An empty value means the default, `ru`.
    pub fn parse(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "ru" => Ok(Language::Ru),
            "en" => Ok(Language::En),
            other => bail!("Unsupported language '{}', expected 'ru' or 'en'", other),
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Language::Ru => write!(f, "ru"),
            Language::En => write!(f, "en"),
        }
    }
}

/// Daily time of day for the scheduled report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleTime {
    pub hour: u32,
    pub minute: u32,
}

impl ScheduleTime {
    pub fn parse(value: &str) -> Result<Self> {
        let (hour, minute) = value
            .split_once(':')
            .with_context(|| format!("schedule_time must be HH:MM, got '{}'", value))?;
        let hour: u32 = hour
            .trim()
            .parse()
            .with_context(|| format!("Invalid hour in schedule_time '{}'", value))?;
        let minute: u32 = minute
            .trim()
            .parse()
            .with_context(|| format!("Invalid minute in schedule_time '{}'", value))?;
        if hour > 23 || minute > 59 {
            bail!("schedule_time out of range: '{}'", value);
        }
        Ok(Self { hour, minute })
    }

    /// Six-field cron expression firing once a day at this time.
    pub fn cron_expression(&self) -> String {
        format!("0 {} {} * * *", self.minute, self.hour)
    }
}

impl std::fmt::Display for ScheduleTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// Settings as they appear on disk, before defaults are applied.
#[derive(Debug, Deserialize, Clone, Default)]
struct RawConfig {
    #[serde(default)]
    computer_id: String,
    #[serde(default)]
    computer_name: String,
    #[serde(default)]
    telegram_token: String,
    #[serde(default)]
    chat_id: String,
    #[serde(default)]
    schedule_time: String,
    #[serde(default)]
    monitor_all_disks: bool,
    #[serde(default)]
    language: String,
    #[serde(default)]
    log_file: Option<PathBuf>,
    #[serde(default)]
    enable_polling: bool,
}

/// Validated process settings.
#[derive(Debug, Clone)]
pub struct Config {
    pub computer_id: String,
    pub computer_name: String,
    pub telegram_token: String,
    pub chat_id: String,
    pub schedule_time: ScheduleTime,
    pub monitor_all_disks: bool,
    pub language: Language,
    pub log_file: PathBuf,
    pub enable_polling: bool,
}

fn default_schedule_time() -> &'static str {
    "08:00"
}

fn default_log_file() -> PathBuf {
    PathBuf::from("monitor.log")
}

fn default_computer_id() -> String {
    sysinfo::System::host_name().unwrap_or_else(|| "unknown".to_string())
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let is_toml = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

        let raw: RawConfig = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        };

        Self::from_raw(raw)
    }

    fn from_raw(raw: RawConfig) -> Result<Self> {
        let telegram_token = raw.telegram_token.trim().to_string();
        if telegram_token.is_empty() || telegram_token == TOKEN_PLACEHOLDER {
            bail!("telegram_token is required in the config file");
        }

        let chat_id = raw.chat_id.trim().to_string();
        if chat_id.is_empty() || chat_id == CHAT_ID_PLACEHOLDER {
            bail!("chat_id is required in the config file");
        }

        let schedule_time = if raw.schedule_time.trim().is_empty() {
            ScheduleTime::parse(default_schedule_time())?
        } else {
            ScheduleTime::parse(&raw.schedule_time)?
        };

        let computer_id = if raw.computer_id.trim().is_empty() {
            default_computer_id()
        } else {
            raw.computer_id.trim().to_string()
        };

        let computer_name = if raw.computer_name.trim().is_empty() {
            computer_id.clone()
        } else {
            raw.computer_name.trim().to_string()
        };

        let language = Language::parse(&raw.language)?;

        let log_file = raw
            .log_file
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(default_log_file);

        Ok(Self {
            computer_id,
            computer_name,
            telegram_token,
            chat_id,
            schedule_time,
            monitor_all_disks: raw.monitor_all_disks,
            language,
            log_file,
            enable_polling: raw.enable_polling,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(token: &str, chat: &str) -> RawConfig {
        RawConfig {
            telegram_token: token.to_string(),
            chat_id: chat.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_placeholder_token_is_rejected() {
        let err = Config::from_raw(raw(TOKEN_PLACEHOLDER, "42")).unwrap_err();
        assert!(err.to_string().contains("telegram_token"));
    }

    #[test]
    fn test_missing_chat_id_is_rejected() {
        let err = Config::from_raw(raw("123:abc", "")).unwrap_err();
        assert!(err.to_string().contains("chat_id"));

        let err = Config::from_raw(raw("123:abc", CHAT_ID_PLACEHOLDER)).unwrap_err();
        assert!(err.to_string().contains("chat_id"));
    }

    #[test]
    fn test_defaults_applied() {
        let mut r = raw("123:abc", "42");
        r.computer_id = "srv-1".to_string();
        let config = Config::from_raw(r).unwrap();

        assert_eq!(config.computer_name, "srv-1");
        assert_eq!(config.schedule_time, ScheduleTime { hour: 8, minute: 0 });
        assert_eq!(config.language, Language::Ru);
        assert_eq!(config.log_file, PathBuf::from("monitor.log"));
        assert!(!config.enable_polling);
        assert!(!config.monitor_all_disks);
    }

    #[test]
    fn test_empty_computer_id_falls_back_to_hostname() {
        let config = Config::from_raw(raw("123:abc", "42")).unwrap();
        assert!(!config.computer_id.is_empty());
        assert_eq!(config.computer_name, config.computer_id);
    }

    #[test]
    fn test_schedule_time_parsing() {
        let t = ScheduleTime::parse("21:05").unwrap();
        assert_eq!(t, ScheduleTime { hour: 21, minute: 5 });
        assert_eq!(t.cron_expression(), "0 5 21 * * *");
        assert_eq!(t.to_string(), "21:05");

        assert!(ScheduleTime::parse("24:00").is_err());
        assert!(ScheduleTime::parse("08:60").is_err());
        assert!(ScheduleTime::parse("0800").is_err());
        assert!(ScheduleTime::parse("aa:bb").is_err());
    }

    #[test]
    fn test_json_config_parses() {
        let json = r#"{
            "computer_id": "office-pc",
            "computer_name": "Office PC",
            "telegram_token": "123:abc",
            "chat_id": "-1001",
            "schedule_time": "09:30",
            "monitor_all_disks": true,
            "language": "en",
            "log_file": "/tmp/hostwatch.log",
            "enable_polling": true
        }"#;
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        let config = Config::from_raw(raw).unwrap();

        assert_eq!(config.computer_id, "office-pc");
        assert_eq!(config.computer_name, "Office PC");
        assert_eq!(config.chat_id, "-1001");
        assert_eq!(config.schedule_time.to_string(), "09:30");
        assert_eq!(config.language, Language::En);
        assert!(config.monitor_all_disks);
        assert!(config.enable_polling);
    }

    #[test]
    fn test_toml_config_parses() {
        let toml_src = r#"
            computer_id = "nas"
            telegram_token = "123:abc"
            chat_id = "7"
            enable_polling = true
        "#;
        let raw: RawConfig = toml::from_str(toml_src).unwrap();
        let config = Config::from_raw(raw).unwrap();
        assert_eq!(config.computer_id, "nas");
        assert!(config.enable_polling);
    }

    #[test]
    fn test_unknown_language_is_rejected() {
        let json = r#"{"telegram_token": "t", "chat_id": "1", "language": "de"}"#;
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        let err = Config::from_raw(raw).unwrap_err();
        assert!(err.to_string().contains("'de'"));
    }

    #[test]
    fn test_empty_language_defaults_to_russian() {
        let json = r#"{"telegram_token": "t", "chat_id": "1", "language": ""}"#;
        let raw: RawConfig = serde_json::from_str(json).unwrap();
        assert_eq!(Config::from_raw(raw).unwrap().language, Language::Ru);
    }

    #[test]
    fn test_language_values() {
        assert_eq!(Language::parse("ru").unwrap(), Language::Ru);
        assert_eq!(Language::parse(" EN ").unwrap(), Language::En);
        assert_eq!(Language::parse("").unwrap(), Language::Ru);
        assert!(Language::parse("fr").is_err());
    }

    #[test]
    fn test_load_reads_file_by_extension() {
        let dir = std::env::temp_dir().join(format!("hostwatch-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("config.json");
        std::fs::write(&path, r#"{"telegram_token": "t", "chat_id": "1", "computer_id": "x"}"#)
            .unwrap();

        let config = Config::load(&path).unwrap();
        assert_eq!(config.computer_id, "x");

        assert!(Config::load(&dir.join("missing.json")).is_err());
        std::fs::remove_dir_all(&dir).ok();
    }
}
