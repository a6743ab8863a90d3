// SPDX-License-Identifier: MIT OR Apache-2.0

//! Settings source trait definition.
//!
//! Process settings (broker parameters, retry budget, key path, datastore) are
//! layered from several sources. Each source implements `SettingSource`, and the
//! settings loader asks them in priority order.

use crate::domain::Result;

/// A trait for settings sources.
///
/// Keys use dot notation (`broker.host`, `retry.max_attempts`).
///
/// # Priority
///
/// Higher values take precedence over lower ones:
///
/// - **3 (highest)**: explicit overrides (command-line flags)
/// - **2**: environment variables
/// - **1 (lowest)**: settings files
///
/// # Examples
///
/// ```rust
/// use packcfg::ports::SettingSource;
/// use packcfg::domain::Result;
///
/// struct Fixed;
///
/// impl SettingSource for Fixed {
///     fn name(&self) -> &str {
///         "fixed"
///     }
///
///     fn priority(&self) -> u8 {
///         1
///     }
///
///     fn get(&self, key: &str) -> Result<Option<String>> {
///         Ok((key == "broker.host").then(|| "rabbit".to_string()))
///     }
///
///     fn keys(&self) -> Result<Vec<String>> {
///         Ok(vec!["broker.host".to_string()])
///     }
/// }
///
/// assert_eq!(Fixed.get("broker.host").unwrap().as_deref(), Some("rabbit"));
/// ```
pub trait SettingSource: Send + Sync {
    /// Returns the name of this source for logs and error messages.
    fn name(&self) -> &str;

    /// Returns the priority of this source.
    fn priority(&self) -> u8;

    /// Retrieves the raw value for `key`, if this source has one.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Returns every key this source provides.
    fn keys(&self) -> Result<Vec<String>>;
}
