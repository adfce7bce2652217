use anyhow::{anyhow, Context, Result};
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;

pub fn required_env(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing env: {name}"))
}

/// Returns `None` for unset and blank variables.
pub fn optional_env(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn socket_addr_from_env(name: &str, default: &str) -> Result<SocketAddr> {
    let value = env::var(name).unwrap_or_else(|_| default.to_string());
    SocketAddr::from_str(&value).map_err(|err| anyhow!("invalid socket addr for {name}: {err}"))
}

pub fn parse_env<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match optional_env(name) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|err| anyhow!("invalid value for {name}: {err}")),
        None => Ok(default),
    }
}

/// Comma separated list; empty entries are skipped.
pub fn list_from_env(name: &str) -> Vec<String> {
    optional_env(name)
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|entry| !entry.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, MutexGuard, OnceLock};

    fn env_lock() -> MutexGuard<'static, ()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    struct EnvGuard {
        key: &'static str,
    }

    impl Drop for EnvGuard {
        fn drop(&mut self) {
            env::remove_var(self.key);
        }
    }

    fn set_env(key: &'static str, value: &str) -> EnvGuard {
        env::set_var(key, value);
        EnvGuard { key }
    }

    #[test]
    fn required_env_reads_value() {
        let _lock = env_lock();
        let _guard = set_env("CB_TEST_REQUIRED_ENV_PRESENT", "value");
        let value = required_env("CB_TEST_REQUIRED_ENV_PRESENT").unwrap();
        assert_eq!(value, "value");
    }

    #[test]
    fn required_env_missing_returns_error() {
        let _lock = env_lock();
        env::remove_var("CB_TEST_REQUIRED_ENV_MISSING");
        assert!(required_env("CB_TEST_REQUIRED_ENV_MISSING").is_err());
    }

    #[test]
    fn optional_env_treats_blank_as_unset() {
        let _lock = env_lock();
        let _guard = set_env("CB_TEST_OPTIONAL_BLANK", "   ");
        assert_eq!(optional_env("CB_TEST_OPTIONAL_BLANK"), None);
    }

    #[test]
    fn socket_addr_from_env_uses_default() {
        let _lock = env_lock();
        env::remove_var("CB_TEST_SOCKET_DEFAULT");
        let addr = socket_addr_from_env("CB_TEST_SOCKET_DEFAULT", "127.0.0.1:1234").unwrap();
        assert_eq!(addr, "127.0.0.1:1234".parse().unwrap());
    }

    #[test]
    fn socket_addr_from_env_invalid_returns_error() {
        let _lock = env_lock();
        let _guard = set_env("CB_TEST_SOCKET_INVALID", "not-a-socket");
        assert!(socket_addr_from_env("CB_TEST_SOCKET_INVALID", "127.0.0.1:1234").is_err());
    }

    #[test]
    fn parse_env_falls_back_and_rejects_garbage() {
        let _lock = env_lock();
        env::remove_var("CB_TEST_PARSE_DEFAULT");
        assert_eq!(parse_env("CB_TEST_PARSE_DEFAULT", 7u32).unwrap(), 7);

        let _guard = set_env("CB_TEST_PARSE_INVALID", "seven");
        assert!(parse_env("CB_TEST_PARSE_INVALID", 7u32).is_err());
    }

    #[test]
    fn list_from_env_splits_and_trims() {
        let _lock = env_lock();
        let _guard = set_env("CB_TEST_LIST", " CrcTrust, ,ChatMessage ");
        assert_eq!(
            list_from_env("CB_TEST_LIST"),
            vec!["CrcTrust".to_string(), "ChatMessage".to_string()]
        );
    }
}
