//! Credential and authorization lookups against the accepted credentials.
//!
//! The validator keeps two indexes, users by name and roles by id, each in
//! its own `ArcSwap` cell. Both are rebuilt from scratch whenever the store
//! promotes a new record; lookups only ever load a snapshot.

use std::collections::HashMap;
use std::sync::Arc;

use arc_swap::ArcSwap;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use crate::auth::hasher::CredentialsHasher;
use crate::auth::substitution::substitute;
use crate::config::schema::{
    Activity, CredentialsConfig, ExtensionConfig, PasswordType, Qos, Retain, Role,
    SharedSubscription, User,
};
use crate::config::store::CredentialsStore;

/// Whether a permission grants or denies what it matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionType {
    Allow,
    Deny,
}

/// A permission with its topic filter resolved for one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TopicPermission {
    pub topic_filter: String,
    pub activity: Activity,
    pub qos: Qos,
    pub retain: Retain,
    pub shared_subscription: SharedSubscription,
    pub shared_group: String,
    pub permission_type: PermissionType,
}

/// Answers "which roles does this user have" and "what may these roles do".
pub struct CredentialsValidator {
    users: ArcSwap<HashMap<String, User>>,
    roles: ArcSwap<HashMap<String, Role>>,
    password_type: PasswordType,
    hasher: CredentialsHasher,
}

impl CredentialsValidator {
    /// A validator with empty indexes. It rejects everything until updated.
    pub fn new(password_type: PasswordType) -> Self {
        Self {
            users: ArcSwap::from_pointee(HashMap::new()),
            roles: ArcSwap::from_pointee(HashMap::new()),
            password_type,
            hasher: CredentialsHasher::default(),
        }
    }

    /// Build from the store's current record and follow every promotion.
    pub fn attach(store: &Arc<CredentialsStore>, extension_config: &ExtensionConfig) -> Arc<Self> {
        let validator = Arc::new(Self::new(extension_config.password_type()));
        if let Some(current) = store.current() {
            validator.update(&current);
        }

        let subscriber = validator.clone();
        store.subscribe(move |_, new| subscriber.update(new));
        validator
    }

    /// Rebuild both indexes from `config`.
    pub fn update(&self, config: &CredentialsConfig) {
        let users: HashMap<String, User> = config
            .users()
            .iter()
            .filter_map(|user| Some((user.name.clone()?, user.clone())))
            .collect();
        let roles: HashMap<String, Role> = config
            .roles()
            .iter()
            .filter_map(|role| Some((role.id.clone()?, role.clone())))
            .collect();

        tracing::debug!(users = users.len(), roles = roles.len(), "Credential indexes rebuilt");
        self.users.store(Arc::new(users));
        self.roles.store(Arc::new(roles));
    }

    /// Role ids of `user_name` if `password` matches, `None` otherwise.
    pub fn get_roles(&self, user_name: &str, password: &[u8]) -> Option<Vec<String>> {
        let users = self.users.load();
        if users.is_empty() || self.roles.load().is_empty() {
            tracing::debug!("No credentials available, rejecting '{}'", user_name);
            return None;
        }

        let user = users.get(user_name)?;
        let stored = user.password.as_deref()?;

        let matches = match self.password_type {
            PasswordType::Hashed => self
                .hasher
                .check_credentials(&BASE64.encode(password), stored),
            PasswordType::Plain => String::from_utf8_lossy(password) == stored,
        };

        if !matches {
            return None;
        }
        Some(user.roles.clone().unwrap_or_default())
    }

    /// Resolve the permissions of `role_ids` for one connection.
    ///
    /// Order is role then permission; duplicates across roles are kept.
    pub fn get_permissions(
        &self,
        client_id: &str,
        user_name: &str,
        role_ids: &[String],
    ) -> Vec<TopicPermission> {
        if role_ids.is_empty() {
            return Vec::new();
        }

        let roles = self.roles.load();
        let mut permissions = Vec::new();
        for role_id in role_ids {
            let Some(role) = roles.get(role_id) else {
                tracing::debug!("Role '{}' not found, skipping", role_id);
                continue;
            };

            for permission in role.permissions.as_deref().unwrap_or_default() {
                let Some(topic) = permission.topic.as_deref() else {
                    continue;
                };
                permissions.push(TopicPermission {
                    topic_filter: substitute(topic, client_id, user_name),
                    activity: permission.activity.unwrap_or_default(),
                    qos: permission.qos.unwrap_or_default(),
                    retain: permission.retain.unwrap_or_default(),
                    shared_subscription: permission.shared_subscription.unwrap_or_default(),
                    shared_group: permission
                        .shared_group
                        .clone()
                        .unwrap_or_else(|| "#".to_string()),
                    permission_type: PermissionType::Allow,
                });
            }
        }
        permissions
    }
}
