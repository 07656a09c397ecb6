//! Configuration schema definitions.
//!
//! Two documents live in the extension home folder:
//! - the extension configuration (reload interval, listener filter, password mode)
//! - the credentials document (users and roles)
//!
//! Fields that the validation pass has to report on are kept as `Option` so a
//! structurally broken document still deserializes and every defect can be listed.

use std::collections::BTreeSet;

use serde::de::{DeserializeOwned, IntoDeserializer};
use serde::{Deserialize, Deserializer, Serialize};

/// Default reload interval in seconds.
pub const DEFAULT_RELOAD_INTERVAL_SECS: u64 = 60;

/// Global extension configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExtensionConfig {
    /// Credentials reload interval in seconds (must be >= 1).
    #[serde(rename = "credentials-reload-interval")]
    pub reload_interval_secs: i64,

    /// Listener names this extension applies to. Empty or absent = all listeners.
    pub listener_names: Option<BTreeSet<String>>,

    /// How user passwords are stored. Unknown values deserialize to `None`.
    #[serde(deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub password_type: Option<PasswordType>,

    /// Defer to the next authenticator instead of failing the connection.
    pub next_extension_instead_of_fail: bool,

    /// Nudge the reload driver on file system events, in addition to polling.
    pub watch_file_events: bool,
}

impl Default for ExtensionConfig {
    fn default() -> Self {
        Self {
            reload_interval_secs: DEFAULT_RELOAD_INTERVAL_SECS as i64,
            listener_names: None,
            password_type: Some(PasswordType::Hashed),
            next_extension_instead_of_fail: false,
            watch_file_events: false,
        }
    }
}

impl ExtensionConfig {
    /// Effective password type (`HASHED` when unset).
    pub fn password_type(&self) -> PasswordType {
        self.password_type.unwrap_or_default()
    }

    /// Effective reload interval, never below one second.
    pub fn reload_interval_secs(&self) -> u64 {
        if self.reload_interval_secs < 1 {
            DEFAULT_RELOAD_INTERVAL_SECS
        } else {
            self.reload_interval_secs as u64
        }
    }
}

/// Representation of user passwords in the credentials document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PasswordType {
    /// `salt:iterations:hash`, PBKDF2-HMAC-SHA512.
    #[default]
    Hashed,
    /// Stored as-is.
    Plain,
}

/// The credentials document: users and the roles they reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct CredentialsConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub users: Option<Vec<User>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<Role>>,
}

impl CredentialsConfig {
    pub fn new(users: Vec<User>, roles: Vec<Role>) -> Self {
        Self {
            users: Some(users),
            roles: Some(roles),
        }
    }

    pub fn users(&self) -> &[User] {
        self.users.as_deref().unwrap_or_default()
    }

    pub fn roles(&self) -> &[Role] {
        self.roles.as_deref().unwrap_or_default()
    }
}

/// A broker user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct User {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Plaintext or `salt:iterations:hash`, depending on [`PasswordType`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Ids of the roles granted to this user.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub roles: Option<Vec<String>>,
}

impl User {
    pub fn new(name: impl Into<String>, password: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            name: Some(name.into()),
            password: Some(password.into()),
            roles: Some(roles),
        }
    }
}

/// A named set of topic permissions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Role {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Vec<Permission>>,
}

impl Role {
    pub fn new(id: impl Into<String>, permissions: Vec<Permission>) -> Self {
        Self {
            id: Some(id.into()),
            permissions: Some(permissions),
        }
    }
}

/// A topic permission as written in the credentials document.
///
/// Constraints that are absent default to `ALL`. A constraint that is present
/// but not a known value is kept as `None` and reported by validation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Permission {
    /// Topic filter, may contain `${{clientid}}` and `${{username}}`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub topic: Option<String>,

    #[serde(
        default = "some_default",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub activity: Option<Activity>,

    #[serde(
        default = "some_default",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub qos: Option<Qos>,

    #[serde(
        default = "some_default",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub retain: Option<Retain>,

    #[serde(
        default = "some_default",
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub shared_subscription: Option<SharedSubscription>,

    #[serde(
        default = "default_shared_group",
        deserialize_with = "lenient_string",
        skip_serializing_if = "Option::is_none"
    )]
    pub shared_group: Option<String>,
}

impl Permission {
    /// A permission on `topic` with every constraint set to `ALL`.
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: Some(topic.into()),
            ..Self::default()
        }
    }
}

impl Default for Permission {
    fn default() -> Self {
        Self {
            topic: None,
            activity: Some(Activity::All),
            qos: Some(Qos::All),
            retain: Some(Retain::All),
            shared_subscription: Some(SharedSubscription::All),
            shared_group: default_shared_group(),
        }
    }
}

/// MQTT activity a permission applies to.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Activity {
    Publish,
    Subscribe,
    #[default]
    All,
}

/// Allowed QoS levels.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Qos {
    Zero,
    One,
    Two,
    ZeroOne,
    OneTwo,
    ZeroTwo,
    #[default]
    All,
}

/// Retained flag constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Retain {
    Retained,
    NotRetained,
    #[default]
    All,
}

/// Shared subscription constraint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SharedSubscription {
    Shared,
    NotShared,
    #[default]
    All,
}

fn some_default<T: Default>() -> Option<T> {
    Some(T::default())
}

fn default_shared_group() -> Option<String> {
    Some("#".to_string())
}

/// Deserialize a string-valued enum, mapping unknown values and non-strings to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let Some(raw) = lenient_string(deserializer)? else {
        return Ok(None);
    };
    let parsed: Result<T, serde::de::value::Error> = T::deserialize(raw.into_deserializer());
    Ok(parsed.ok())
}

/// Deserialize a string, mapping any other value type to `None`.
fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match toml::Value::deserialize(deserializer)? {
        toml::Value::String(raw) => Ok(Some(raw)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_permission_defaults() {
        let permission: Permission = toml::from_str(r#"topic = "a/b""#).unwrap();
        assert_eq!(permission, Permission::new("a/b"));
        assert_eq!(permission.shared_group.as_deref(), Some("#"));
    }

    #[test]
    fn test_unknown_enum_value_is_kept_as_none() {
        let permission: Permission = toml::from_str(
            r#"
            topic = "a/b"
            activity = "DANCE"
            qos = "ONE_TWO"
            "#,
        )
        .unwrap();
        assert_eq!(permission.activity, None);
        assert_eq!(permission.qos, Some(Qos::OneTwo));
        assert_eq!(permission.retain, Some(Retain::All));
    }

    #[test]
    fn test_extension_config_defaults() {
        let config: ExtensionConfig = toml::from_str("").unwrap();
        assert_eq!(config, ExtensionConfig::default());
        assert_eq!(config.reload_interval_secs(), 60);
        assert_eq!(config.password_type(), PasswordType::Hashed);
    }

    #[test]
    fn test_extension_config_unknown_password_type() {
        let config: ExtensionConfig = toml::from_str(
            r#"
            credentials-reload-interval = 0
            password-type = "ROT13"
            listener-names = ["tcp"]
            next-extension-instead-of-fail = true
            "#,
        )
        .unwrap();
        assert_eq!(config.password_type, None);
        assert_eq!(config.password_type(), PasswordType::Hashed);
        assert_eq!(config.reload_interval_secs(), 60);
        assert!(config.next_extension_instead_of_fail);
        assert!(config.listener_names.unwrap().contains("tcp"));
    }

    #[test]
    fn test_wrong_value_types_are_kept_as_none() {
        let permission: Permission = toml::from_str(
            r#"
            topic = "a/b"
            qos = 1
            retain = true
            shared-group = 7
            shared-subscription = ["SHARED"]
            "#,
        )
        .unwrap();
        assert_eq!(permission.qos, None);
        assert_eq!(permission.retain, None);
        assert_eq!(permission.shared_group, None);
        assert_eq!(permission.shared_subscription, None);
        assert_eq!(permission.activity, Some(Activity::All));

        let config: ExtensionConfig = toml::from_str(
            r#"
            credentials-reload-interval = 5
            password-type = 1
            next-extension-instead-of-fail = true
            "#,
        )
        .unwrap();
        assert_eq!(config.password_type, None);
        assert_eq!(config.reload_interval_secs(), 5);
        assert!(config.next_extension_instead_of_fail);
    }
}
