//! Credentials validation.
//!
//! # Responsibilities
//! - Check required fields (ids, names, passwords, permissions)
//! - Check uniqueness of role ids and user names
//! - Check referential integrity (users reference existing roles)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: (PasswordType, CredentialsConfig) -> ValidationResult
//! - Runs before a document is accepted into the system

use std::collections::HashSet;

use crate::config::schema::{CredentialsConfig, PasswordType, Role, User};

/// Outcome of a validation pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationResult {
    /// Human-readable defects in discovery order.
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Validate a credentials document.
pub fn validate_credentials(
    password_type: PasswordType,
    config: &CredentialsConfig,
) -> ValidationResult {
    let mut errors = Vec::new();

    let users = config.users.as_deref().filter(|u| !u.is_empty());
    let roles = config.roles.as_deref().filter(|r| !r.is_empty());
    if users.is_none() {
        errors.push("No Users found in configuration file".to_string());
    }
    if roles.is_none() {
        errors.push("No Roles found in configuration file".to_string());
    }

    // nothing to cross-reference
    let (Some(users), Some(roles)) = (users, roles) else {
        return ValidationResult { errors };
    };

    let role_ids = validate_roles(roles, &mut errors);
    validate_users(users, &role_ids, password_type, &mut errors);

    ValidationResult { errors }
}

fn validate_roles<'a>(roles: &'a [Role], errors: &mut Vec<String>) -> HashSet<&'a str> {
    let mut role_ids = HashSet::new();

    for role in roles {
        let id = match role.id.as_deref() {
            Some(id) if !id.is_empty() => id,
            _ => {
                errors.push("A Role is missing an ID".to_string());
                continue;
            }
        };
        if !role_ids.insert(id) {
            errors.push(format!("Duplicate ID '{}' for role", id));
            continue;
        }

        let permissions = match role.permissions.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => {
                errors.push(format!("Role '{}' is missing permissions", id));
                continue;
            }
        };

        for permission in permissions {
            if permission.topic.as_deref().map_or(true, str::is_empty) {
                errors.push(format!(
                    "A Permission for role with id '{}' is missing a topic filter",
                    id
                ));
            }
            if permission.activity.is_none() {
                errors.push(invalid_value("Activity", id));
            }
            if permission.qos.is_none() {
                errors.push(invalid_value("QoS", id));
            }
            if permission.retain.is_none() {
                errors.push(invalid_value("Retain", id));
            }
            if permission.shared_group.as_deref().map_or(true, str::is_empty) {
                errors.push(invalid_value("Shared Group", id));
            }
            if permission.shared_subscription.is_none() {
                errors.push(invalid_value("Shared Subscription", id));
            }
        }
    }

    role_ids
}

fn validate_users(
    users: &[User],
    role_ids: &HashSet<&str>,
    password_type: PasswordType,
    errors: &mut Vec<String>,
) {
    let mut user_names = HashSet::new();

    for user in users {
        let name = match user.name.as_deref() {
            Some(name) if !name.is_empty() => name,
            _ => {
                errors.push("A User is missing a name".to_string());
                continue;
            }
        };
        if !user_names.insert(name) {
            errors.push(format!("Duplicate Name '{}' for user", name));
            continue;
        }

        let password = match user.password.as_deref() {
            Some(p) if !p.is_empty() => p,
            _ => {
                errors.push(format!("User '{}' is missing a password", name));
                continue;
            }
        };
        if password_type == PasswordType::Hashed && !is_hashed_password(password) {
            errors.push(format!("User '{}' has invalid password", name));
            continue;
        }

        let roles = match user.roles.as_deref() {
            Some(r) if !r.is_empty() => r,
            _ => {
                errors.push(format!("User '{}' is missing roles", name));
                continue;
            }
        };
        for role in roles {
            if role.is_empty() {
                errors.push(format!("Invalid role for user '{}'", name));
            } else if !role_ids.contains(role.as_str()) {
                errors.push(format!("Unknown role '{}' for user '{}'", role, name));
            }
        }
    }
}

/// A hashed password needs at least a non-empty salt and iteration part.
fn is_hashed_password(password: &str) -> bool {
    let mut parts = password.split(':');
    matches!(
        (parts.next(), parts.next()),
        (Some(salt), Some(iterations)) if !salt.is_empty() && !iterations.is_empty()
    )
}

fn invalid_value(field: &str, role_id: &str) -> String {
    format!(
        "Invalid value for {} in Permission for role with id '{}'",
        field, role_id
    )
}
