use serde::Deserialize;
use serde_json::Value;

use crate::error::{AppError, AppResult};

const DEFAULT_NAMESPACE: &str = "default";

/// A catalog entity. Only the parts the proxy reads are typed.
#[derive(Debug, Clone, Deserialize)]
pub struct Entity {
    pub kind: String,
    pub metadata: EntityMetadata,
    #[serde(default)]
    pub spec: Value,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EntityMetadata {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

impl Entity {
    /// `spec.profile.email` of a user entity, if set and non-empty.
    pub fn profile_email(&self) -> Option<&str> {
        self.spec
            .get("profile")?
            .get("email")?
            .as_str()
            .map(str::trim)
            .filter(|email| !email.is_empty())
    }
}

/// Parsed `kind:namespace/name` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl EntityRef {
    pub fn parse(value: &str) -> AppResult<Self> {
        let invalid = || AppError::Input(format!("Invalid entity reference: {value}"));

        let (kind, rest) = value.trim().split_once(':').ok_or_else(invalid)?;
        let (namespace, name) = match rest.split_once('/') {
            Some((namespace, name)) => (namespace, name),
            None => (DEFAULT_NAMESPACE, rest),
        };

        if kind.is_empty() || namespace.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            kind: kind.to_lowercase(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn user(spec: Value) -> Entity {
        serde_json::from_value(json!({
            "apiVersion": "backstage.io/v1alpha1",
            "kind": "User",
            "metadata": { "name": "test.user", "namespace": "default" },
            "spec": spec
        }))
        .unwrap()
    }

    #[test]
    fn parses_full_and_short_refs() {
        assert_eq!(
            EntityRef::parse("user:default/test.user").unwrap(),
            EntityRef {
                kind: "user".to_string(),
                namespace: "default".to_string(),
                name: "test.user".to_string(),
            }
        );

        let short = EntityRef::parse("User:jane").unwrap();
        assert_eq!(short.kind, "user");
        assert_eq!(short.namespace, "default");
        assert_eq!(short.name, "jane");
    }

    #[test]
    fn rejects_malformed_refs() {
        for raw in ["test.user", ":default/x", "user:default/", "user:a/b/c"] {
            assert!(matches!(EntityRef::parse(raw), Err(AppError::Input(_))), "{raw}");
        }
    }

    #[test]
    fn reads_profile_email() {
        let entity = user(json!({ "profile": { "email": "test.user@example.com" } }));
        assert_eq!(entity.profile_email(), Some("test.user@example.com"));
    }

    #[test]
    fn missing_email_variants_yield_none() {
        assert_eq!(user(json!({ "profile": {} })).profile_email(), None);
        assert_eq!(user(json!({ "profile": { "email": null } })).profile_email(), None);
        assert_eq!(user(json!({ "memberOf": [] })).profile_email(), None);
        assert_eq!(user(json!({ "profile": { "email": "" } })).profile_email(), None);
    }
}
