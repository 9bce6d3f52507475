//! Per-request audit trail and permission gate.
//!
//! Every gated handler goes through the same steps:
//!
//! 1. [`RequestAudit::open`] writes "Attempting to ..." for the caller. If
//!    that write fails the request is refused with a 500.
//! 2. [`RequestAudit::authorize`] checks the operation's permission code.
//! 3. [`RequestAudit::input`] / [`RequestAudit::payload`] surface extraction
//!    and validation failures as 400/422 after logging them.
//! 4. [`RequestAudit::finish`] logs the failure reason or the success message.
//!
//! Writes after the first one are best effort.

use crate::middleware::Caller;
use crate::services::metrics::PERMISSION_DENIALS_TOTAL;
use crate::services::{ActivityLog, PermissionSource};
use axum::extract::Query;
use axum::Json;
use service_core::error::AppError;
use std::fmt::Display;
use std::sync::Arc;
use validator::Validate;

pub struct RequestAudit {
    email: String,
    log: Arc<dyn ActivityLog>,
    permissions: Arc<dyn PermissionSource>,
}

impl RequestAudit {
    pub async fn open(
        log: Arc<dyn ActivityLog>,
        permissions: Arc<dyn PermissionSource>,
        caller: &Caller,
        action: &str,
    ) -> Result<Self, AppError> {
        let audit = Self {
            email: caller.email.clone(),
            log,
            permissions,
        };

        audit
            .log
            .record(&audit.email, &format!("Attempting to {}", action))
            .await
            .map_err(|e| {
                tracing::error!(error = %e, email = %audit.email, "Failed to write activity log");
                AppError::InternalError(anyhow::anyhow!("Error registering log"))
            })?;

        Ok(audit)
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    /// Best-effort log line.
    pub async fn note(&self, message: &str) {
        if let Err(e) = self.log.record(&self.email, message).await {
            tracing::warn!(error = %e, email = %self.email, "Failed to write activity log");
        }
    }

    /// Require `code`; `operation` names the operation in the denial log.
    pub async fn authorize(&self, code: i32, operation: &str) -> Result<(), AppError> {
        let granted = match self.permissions.has_permission(&self.email, code).await {
            Ok(granted) => granted,
            Err(e) => {
                self.note(&format!("Error checking permission for {}", operation))
                    .await;
                return Err(e);
            }
        };

        if !granted {
            PERMISSION_DENIALS_TOTAL
                .with_label_values(&[&code.to_string()])
                .inc();
            tracing::info!(email = %self.email, code, operation, "Permission denied");
            self.note(&format!("Permission denied for {}", operation))
                .await;
            return Err(AppError::Forbidden(anyhow::anyhow!("Permission denied")));
        }

        Ok(())
    }

    /// Unwrap an extractor result, logging and mapping rejections to 400.
    pub async fn input<T, E: Display>(&self, extracted: Result<T, E>) -> Result<T, AppError> {
        match extracted {
            Ok(value) => Ok(value),
            Err(rejection) => {
                self.note(&format!("Invalid input: {}", rejection)).await;
                Err(AppError::BadRequest(anyhow::anyhow!(
                    "Invalid input: {}",
                    rejection
                )))
            }
        }
    }

    /// Like [`Self::input`] for a JSON body, then run its validation rules.
    pub async fn payload<T: Validate, E: Display>(
        &self,
        extracted: Result<Json<T>, E>,
    ) -> Result<T, AppError> {
        let Json(value) = self.input(extracted).await?;
        self.validated(value).await
    }

    /// Like [`Self::payload`] for query parameters.
    pub async fn params<T: Validate, E: Display>(
        &self,
        extracted: Result<Query<T>, E>,
    ) -> Result<T, AppError> {
        let Query(value) = self.input(extracted).await?;
        self.validated(value).await
    }

    async fn validated<T: Validate>(&self, value: T) -> Result<T, AppError> {
        if let Err(errors) = value.validate() {
            self.note(&format!("Invalid input: {}", errors)).await;
            return Err(AppError::ValidationError(errors));
        }
        Ok(value)
    }

    /// Require a non-blank search term.
    pub async fn query_term(&self, term: Option<String>) -> Result<String, AppError> {
        match term.map(|t| t.trim().to_string()).filter(|t| !t.is_empty()) {
            Some(term) => Ok(term),
            None => {
                self.note("Invalid input: missing query parameter").await;
                Err(AppError::BadRequest(anyhow::anyhow!(
                    "Query parameter is required"
                )))
            }
        }
    }

    /// Log the outcome and pass the result through.
    pub async fn finish<T>(&self, result: Result<T, AppError>, success: &str) -> Result<T, AppError> {
        match &result {
            Ok(_) => self.note(success).await,
            Err(e) => self.note(&format!("Failed: {}", e)).await,
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{MemoryActivityLog, StaticPermissions};

    fn caller(email: &str) -> Caller {
        Caller {
            email: email.to_string(),
        }
    }

    #[tokio::test]
    async fn test_denied_request_is_logged() {
        let log = Arc::new(MemoryActivityLog::new());
        let permissions = Arc::new(StaticPermissions::new().grant("a@shop.test", [1001]));

        let audit = RequestAudit::open(log.clone(), permissions, &caller("a@shop.test"), "get item")
            .await
            .unwrap();
        assert!(audit.authorize(1001, "GetPermission").await.is_ok());

        let err = audit.authorize(9001, "GetItemByID").await.unwrap_err();
        assert!(matches!(err, AppError::Forbidden(_)));
        assert_eq!(
            log.actions_for("a@shop.test"),
            vec![
                "Attempting to get item".to_string(),
                "Permission denied for GetItemByID".to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_first_log_write_refuses_request() {
        let log = Arc::new(MemoryActivityLog::failing());
        let permissions = Arc::new(StaticPermissions::new());

        let err = RequestAudit::open(log, permissions, &caller("a@shop.test"), "list items")
            .await
            .err()
            .unwrap();
        assert_eq!(err.to_string(), "Internal server error: Error registering log");
    }

    #[tokio::test]
    async fn test_blank_query_term_is_rejected() {
        let log = Arc::new(MemoryActivityLog::new());
        let audit = RequestAudit::open(
            log,
            Arc::new(StaticPermissions::new()),
            &caller("a@shop.test"),
            "search",
        )
        .await
        .unwrap();

        assert!(audit.query_term(Some("  ".to_string())).await.is_err());
        assert_eq!(audit.query_term(Some(" ab ".to_string())).await.unwrap(), "ab");
    }
}
