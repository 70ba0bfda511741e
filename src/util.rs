use std::path::PathBuf;

const CONFIG_PATH: &str = "XMONITOR_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "./xmonitor.toml";

pub fn get_config_path() -> PathBuf {
    std::env::var(CONFIG_PATH).map_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH), PathBuf::from)
}

const SMTP_AUTHORIZATION: &str = "XMONITOR_SMTP_AUTHORIZATION";

pub fn get_smtp_authorization() -> Option<String> {
    let authorization_from_env = std::env::var(SMTP_AUTHORIZATION);
    authorization_from_env.ok().filter(|value| !value.is_empty())
}
