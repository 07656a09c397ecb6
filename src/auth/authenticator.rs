//! Connect-time authentication decision.

use std::collections::BTreeSet;
use std::sync::Arc;

use crate::auth::credentials::{CredentialsValidator, PermissionType, TopicPermission};
use crate::config::schema::ExtensionConfig;
use crate::observability::metrics;

/// Reason codes reported back to a rejected client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReasonCode {
    BadUserNameOrPassword,
    ClientIdentifierNotValid,
    NotAuthorized,
}

/// What the broker learns from a connecting client.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectRequest<'a> {
    pub client_id: &'a str,
    pub user_name: Option<&'a str>,
    pub password: Option<&'a [u8]>,
    pub listener: Option<&'a str>,
}

/// Outcome of [`FileAuthenticator::on_connect`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDecision {
    Authenticated {
        permissions: Vec<TopicPermission>,
        default_behaviour: PermissionType,
    },
    Failed {
        reason: ReasonCode,
        message: &'static str,
    },
    /// Leave the decision to the next authenticator in the chain.
    Next,
}

impl AuthDecision {
    fn label(&self) -> &'static str {
        match self {
            AuthDecision::Authenticated { .. } => "authenticated",
            AuthDecision::Failed { .. } => "failed",
            AuthDecision::Next => "next",
        }
    }
}

pub struct FileAuthenticator {
    validator: Arc<CredentialsValidator>,
    listener_names: BTreeSet<String>,
    next_instead_of_fail: bool,
}

impl FileAuthenticator {
    pub fn new(validator: Arc<CredentialsValidator>, extension_config: &ExtensionConfig) -> Self {
        Self {
            validator,
            listener_names: extension_config.listener_names.clone().unwrap_or_default(),
            next_instead_of_fail: extension_config.next_extension_instead_of_fail,
        }
    }

    pub fn on_connect(&self, request: &ConnectRequest<'_>) -> AuthDecision {
        let decision = self.decide(request);
        metrics::record_auth_decision(decision.label());
        decision
    }

    fn decide(&self, request: &ConnectRequest<'_>) -> AuthDecision {
        // a request without a listener name is not filtered
        if let Some(listener) = request.listener {
            if !self.listener_names.is_empty() && !self.listener_names.contains(listener) {
                tracing::trace!(listener, "Listener not handled by this extension");
                return AuthDecision::Next;
            }
        }

        let (Some(user_name), Some(password)) = (request.user_name, request.password) else {
            return self.fail(
                ReasonCode::BadUserNameOrPassword,
                "Authentication failed because username or password are missing",
            );
        };

        if request.client_id.contains(['#', '+']) {
            return self.fail(
                ReasonCode::ClientIdentifierNotValid,
                "The characters '#' and '+' are not allowed in the client identifier",
            );
        }

        if user_name.contains(['#', '+']) {
            return self.fail(
                ReasonCode::BadUserNameOrPassword,
                "The characters '#' and '+' are not allowed in the username",
            );
        }

        let roles = match self.validator.get_roles(user_name, password) {
            Some(roles) if !roles.is_empty() => roles,
            _ => {
                return self.fail(
                    ReasonCode::NotAuthorized,
                    "Authentication failed because of invalid credentials",
                )
            }
        };

        let permissions = self
            .validator
            .get_permissions(request.client_id, user_name, &roles);
        tracing::debug!(
            client_id = request.client_id,
            user_name,
            permissions = permissions.len(),
            "Client authenticated"
        );
        AuthDecision::Authenticated {
            permissions,
            default_behaviour: PermissionType::Deny,
        }
    }

    fn fail(&self, reason: ReasonCode, message: &'static str) -> AuthDecision {
        if self.next_instead_of_fail {
            return AuthDecision::Next;
        }
        tracing::debug!(?reason, "{}", message);
        AuthDecision::Failed { reason, message }
    }
}
