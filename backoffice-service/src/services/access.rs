use async_trait::async_trait;
use service_core::error::AppError;
use std::collections::{HashMap, HashSet};

/// Answers whether a caller holds a permission code.
///
/// Callers are identified by email; unknown or non-active accounts hold
/// nothing.
#[async_trait]
pub trait PermissionSource: Send + Sync {
    async fn has_permission(&self, email: &str, code: i32) -> Result<bool, AppError>;
}

/// Fixed grants, keyed by lower-cased email.
#[derive(Debug, Default, Clone)]
pub struct StaticPermissions {
    grants: HashMap<String, HashSet<i32>>,
}

impl StaticPermissions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(mut self, email: &str, codes: impl IntoIterator<Item = i32>) -> Self {
        self.grants
            .entry(email.to_lowercase())
            .or_default()
            .extend(codes);
        self
    }
}

#[async_trait]
impl PermissionSource for StaticPermissions {
    async fn has_permission(&self, email: &str, code: i32) -> Result<bool, AppError> {
        Ok(self
            .grants
            .get(&email.to_lowercase())
            .is_some_and(|codes| codes.contains(&code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_grants_are_case_insensitive() {
        let source = StaticPermissions::new().grant("Clerk@Shop.test", [9001, 9002]);

        assert!(source.has_permission("clerk@shop.test", 9001).await.unwrap());
        assert!(!source.has_permission("clerk@shop.test", 17006).await.unwrap());
        assert!(!source.has_permission("other@shop.test", 9001).await.unwrap());
    }
}
