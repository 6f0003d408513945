//! Caller identity and tenant scoping.
//!
//! Authentication happens upstream; by the time a request reaches the service the
//! gateway has resolved the user, their role, and the Kreditor they act for.

use serde::{Deserialize, Serialize};

use crate::workflows::collection::domain::KreditorId;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Administrator,
    CaseWorker,
    KreditorViewer,
}

impl Role {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "admin" | "administrator" => Some(Self::Administrator),
            "case_worker" | "caseworker" | "agent" => Some(Self::CaseWorker),
            "kreditor" | "viewer" | "kreditor_viewer" => Some(Self::KreditorViewer),
            _ => None,
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Administrator => "Administrator",
            Self::CaseWorker => "Case Worker",
            Self::KreditorViewer => "Kreditor (read only)",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    user: String,
    role: Role,
    kreditor_id: Option<KreditorId>,
}

impl Caller {
    pub fn new(
        user: impl Into<String>,
        role: Role,
        kreditor_id: Option<KreditorId>,
    ) -> Result<Self, AccessError> {
        let user = user.into();
        if user.trim().is_empty() {
            return Err(AccessError::MissingIdentity);
        }
        if role != Role::Administrator && kreditor_id.is_none() {
            return Err(AccessError::MissingTenant);
        }
        Ok(Self {
            user,
            role,
            kreditor_id,
        })
    }

    pub fn administrator(user: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            role: Role::Administrator,
            kreditor_id: None,
        }
    }

    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kreditor_id(&self) -> Option<&KreditorId> {
        self.kreditor_id.as_ref()
    }

    pub fn can_view(&self, kreditor: &KreditorId) -> bool {
        match self.role {
            Role::Administrator => true,
            Role::CaseWorker | Role::KreditorViewer => self.kreditor_id.as_ref() == Some(kreditor),
        }
    }

    pub fn can_manage(&self, kreditor: &KreditorId) -> bool {
        match self.role {
            Role::Administrator => true,
            Role::CaseWorker => self.kreditor_id.as_ref() == Some(kreditor),
            Role::KreditorViewer => false,
        }
    }

    pub fn can_override_deadlines(&self) -> bool {
        self.role == Role::Administrator
    }

    pub(crate) fn require_manage(&self, kreditor: &KreditorId) -> Result<(), AccessError> {
        if self.can_manage(kreditor) {
            Ok(())
        } else {
            Err(AccessError::Forbidden {
                user: self.user.clone(),
                action: "manage cases",
            })
        }
    }
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum AccessError {
    #[error("caller identity missing")]
    MissingIdentity,
    #[error("unknown role '{0}'")]
    UnknownRole(String),
    #[error("non-administrative callers must act for a Kreditor")]
    MissingTenant,
    #[error("{user} is not allowed to {action}")]
    Forbidden { user: String, action: &'static str },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kreditor(id: &str) -> KreditorId {
        KreditorId(id.to_string())
    }

    #[test]
    fn role_parsing_accepts_aliases() {
        assert_eq!(Role::parse("Admin"), Some(Role::Administrator));
        assert_eq!(Role::parse(" agent "), Some(Role::CaseWorker));
        assert_eq!(Role::parse("kreditor_viewer"), Some(Role::KreditorViewer));
        assert_eq!(Role::parse("root"), None);
    }

    #[test]
    fn tenant_roles_require_a_kreditor() {
        assert_eq!(
            Caller::new("sachbearbeiter", Role::CaseWorker, None),
            Err(AccessError::MissingTenant)
        );
        assert_eq!(
            Caller::new("  ", Role::Administrator, None),
            Err(AccessError::MissingIdentity)
        );
        assert!(Caller::new("ops", Role::Administrator, None).is_ok());
    }

    #[test]
    fn scoping_follows_role_and_tenant() {
        let own = kreditor("kr-stadtwerke");
        let foreign = kreditor("kr-moebelhaus");

        let worker = Caller::new("jana", Role::CaseWorker, Some(own.clone())).expect("valid");
        assert!(worker.can_view(&own));
        assert!(worker.can_manage(&own));
        assert!(!worker.can_view(&foreign));
        assert!(!worker.can_override_deadlines());

        let viewer = Caller::new("kunde", Role::KreditorViewer, Some(own.clone())).expect("valid");
        assert!(viewer.can_view(&own));
        assert!(!viewer.can_manage(&own));
        assert!(matches!(
            viewer.require_manage(&own),
            Err(AccessError::Forbidden { .. })
        ));

        let admin = Caller::administrator("ops");
        assert!(admin.can_manage(&foreign));
        assert!(admin.can_override_deadlines());
    }
}
