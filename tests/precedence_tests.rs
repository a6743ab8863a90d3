// SPDX-License-Identifier: MIT OR Apache-2.0

//! Integration tests for settings source precedence.

use packcfg::prelude::*;
use std::env;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

/// Helper to set and clean up environment variables
struct EnvGuard {
    keys: Vec<String>,
}

impl EnvGuard {
    fn new() -> Self {
        EnvGuard { keys: Vec::new() }
    }

    fn set(&mut self, key: &str, value: &str) {
        env::set_var(key, value);
        self.keys.push(key.to_string());
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for key in &self.keys {
            env::remove_var(key);
        }
    }
}

fn yaml_file(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    write!(file, "{}", content).unwrap();
    file
}

#[test]
#[cfg(all(feature = "env", feature = "yaml"))]
fn test_precedence_env_over_yaml() {
    let mut env_guard = EnvGuard::new();
    let file = yaml_file("broker:\n  host: yaml-host\n  port: 5673\n");
    env_guard.set("PREC_A_BROKER__HOST", "env-host");

    let settings = Settings::builder()
        .with_yaml_file(file.path())
        .unwrap()
        .with_env_prefix("PREC_A_")
        .build()
        .unwrap();

    // Environment variable should win (priority 2 > 1)
    assert_eq!(settings.broker.host, "env-host");
    // Keys only the file sets still come from the file
    assert_eq!(settings.broker.port, 5673);
}

#[test]
#[cfg(all(feature = "env", feature = "yaml"))]
fn test_precedence_overrides_over_everything() {
    let mut env_guard = EnvGuard::new();
    let file = yaml_file("retry:\n  max_attempts: 2\n");
    env_guard.set("PREC_B_RETRY__MAX_ATTEMPTS", "3");

    let settings = Settings::builder()
        .with_overrides(OverrideSource::new().set("retry.max_attempts", 4))
        .with_env_prefix("PREC_B_")
        .with_yaml_file(file.path())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(settings.retry.max_attempts(), 4);
}

#[test]
#[cfg(feature = "yaml")]
fn test_yaml_covers_every_section() {
    let file = yaml_file(
        "broker:\n  host: rabbit\n  username: st2\n  password: s3cr3t\n  vhost: /prod\n\
         retry:\n  base_delay_ms: 250\n  multiplier: 3\n  max_delay_ms: 5000\n\
         crypto:\n  key_path: /etc/packcfg/key\n\
         datastore:\n  url: redis://cache:6379\n  namespace: \"prod:\"\n",
    );

    let settings = Settings::builder()
        .with_yaml_file(file.path())
        .unwrap()
        .build()
        .unwrap();

    assert_eq!(settings.broker.host, "rabbit");
    assert_eq!(settings.broker.username, "st2");
    assert_eq!(settings.broker.password, "s3cr3t");
    assert_eq!(settings.broker.vhost, "/prod");
    assert_eq!(settings.retry.base_delay(), Duration::from_millis(250));
    assert_eq!(settings.retry.multiplier(), 3.0);
    assert_eq!(settings.retry.max_delay(), Duration::from_millis(5000));
    assert_eq!(
        settings.crypto.key_path.as_deref(),
        Some(std::path::Path::new("/etc/packcfg/key"))
    );
    assert_eq!(settings.datastore.url.as_deref(), Some("redis://cache:6379"));
    assert_eq!(settings.datastore.namespace, "prod:");
}

#[test]
#[cfg(feature = "env")]
fn test_invalid_env_value_is_reported() {
    let mut env_guard = EnvGuard::new();
    env_guard.set("PREC_C_RETRY__MULTIPLIER", "fast");

    let result = Settings::builder().with_env_prefix("PREC_C_").build();

    match result {
        Err(PlatformError::InvalidSetting { key, message }) => {
            assert_eq!(key, "retry.multiplier");
            assert!(message.contains("env"));
        }
        other => panic!("unexpected result: {:?}", other),
    }
}

#[test]
#[cfg(feature = "env")]
fn test_multiplier_below_one_is_rejected() {
    let mut env_guard = EnvGuard::new();
    env_guard.set("PREC_D_RETRY__MULTIPLIER", "0.5");

    let result = Settings::builder().with_env_prefix("PREC_D_").build();
    assert!(matches!(result, Err(PlatformError::InvalidSetting { .. })));
}

#[test]
#[cfg(feature = "yaml")]
fn test_missing_yaml_file_is_an_error() {
    let result = Settings::builder().with_yaml_file("/nonexistent/packcfg.yaml");
    assert!(result.is_err());
}

#[test]
fn test_source_order_does_not_matter() {
    let low = OverrideSource::new().set("broker.host", "low");

    struct Fixed(&'static str, u8);
    impl SettingSource for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }
        fn priority(&self) -> u8 {
            self.1
        }
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok((key == "broker.host").then(|| self.0.to_string()))
        }
        fn keys(&self) -> Result<Vec<String>> {
            Ok(vec!["broker.host".to_string()])
        }
    }

    let settings = Settings::builder()
        .with_source(Box::new(Fixed("file", 1)))
        .with_overrides(low)
        .with_source(Box::new(Fixed("env", 2)))
        .build()
        .unwrap();

    assert_eq!(settings.broker.host, "low");
}

#[test]
fn test_key_file_from_settings() {
    let key_file = yaml_file(&EncryptionGate::generate_base64_key());

    let settings = Settings::builder()
        .with_overrides(
            OverrideSource::new().set("crypto.key_path", key_file.path().display()),
        )
        .build()
        .unwrap();

    assert!(settings.encryption_gate().unwrap().is_provisioned());
}
