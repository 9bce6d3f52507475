use super::{contains_pattern, non_empty, prefix_pattern, query_error, Database};
use crate::models::{
    IdentifierType, LogEntry, NewUser, Permission, Role, RoleWithPermissions, User, UserChanges,
    UserStateType, UserType,
};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use std::collections::HashMap;
use tracing::{info, instrument};

const USER_COLUMNS: &str = "id, email, user_type_id, user_state_type_id";

impl Database {
    // -------------------------------------------------------------------------
    // Permission Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_permission(&self, id: i32) -> Result<Option<Permission>, AppError> {
        sqlx::query_as::<_, Permission>(
            "SELECT id, name, description FROM permissions WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get permission", e))
    }

    #[instrument(skip(self))]
    pub async fn list_permissions(&self) -> Result<Vec<Permission>, AppError> {
        sqlx::query_as::<_, Permission>("SELECT id, name, description FROM permissions ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list permissions", e))
    }

    #[instrument(skip(self))]
    pub async fn search_permissions_by_id(&self, term: &str) -> Result<Vec<Permission>, AppError> {
        let rows = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description FROM permissions WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
        )
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search permissions", e))?;
        non_empty(rows, "permissions")
    }

    #[instrument(skip(self))]
    pub async fn search_permissions_by_name(
        &self,
        term: &str,
    ) -> Result<Vec<Permission>, AppError> {
        let rows = sqlx::query_as::<_, Permission>(
            "SELECT id, name, description FROM permissions WHERE name ILIKE $1 ORDER BY id",
        )
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search permissions", e))?;
        non_empty(rows, "permissions")
    }

    // -------------------------------------------------------------------------
    // Role Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_role(&self, id: i32) -> Result<Option<RoleWithPermissions>, AppError> {
        let role = sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("get role", e))?;

        match role {
            Some(role) => {
                let permissions = self.role_permission_codes(role.id).await?;
                Ok(Some(RoleWithPermissions { role, permissions }))
            }
            None => Ok(None),
        }
    }

    async fn role_permission_codes(&self, role_id: i32) -> Result<Vec<i32>, AppError> {
        sqlx::query_scalar::<_, i32>(
            "SELECT permission_id FROM role_permissions WHERE role_id = $1 ORDER BY permission_id",
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list role permissions", e))
    }

    #[instrument(skip(self))]
    pub async fn list_roles(&self) -> Result<Vec<Role>, AppError> {
        sqlx::query_as::<_, Role>("SELECT id, name, description FROM roles ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list roles", e))
    }

    /// Permissions granted by a role; `None` when the role does not exist.
    #[instrument(skip(self))]
    pub async fn list_role_permissions(
        &self,
        role_id: i32,
    ) -> Result<Option<Vec<Permission>>, AppError> {
        if !self.role_exists(role_id).await? {
            return Ok(None);
        }

        let permissions = sqlx::query_as::<_, Permission>(
            r#"
            SELECT p.id, p.name, p.description
            FROM permissions p
            JOIN role_permissions rp ON rp.permission_id = p.id
            WHERE rp.role_id = $1
            ORDER BY p.id
            "#,
        )
        .bind(role_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list role permissions", e))?;

        Ok(Some(permissions))
    }

    #[instrument(skip(self))]
    pub async fn role_exists(&self, id: i32) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM roles WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error("check role", e))
    }

    #[instrument(skip(self))]
    pub async fn search_roles_by_name(&self, term: &str) -> Result<Vec<Role>, AppError> {
        let rows = sqlx::query_as::<_, Role>(
            "SELECT id, name, description FROM roles WHERE name ILIKE $1 ORDER BY id",
        )
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search roles", e))?;
        non_empty(rows, "roles")
    }

    #[instrument(skip(self))]
    pub async fn search_roles_by_id(&self, term: &str) -> Result<Vec<Role>, AppError> {
        let rows = sqlx::query_as::<_, Role>(
            "SELECT id, name, description FROM roles WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
        )
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search roles", e))?;
        non_empty(rows, "roles")
    }

    // -------------------------------------------------------------------------
    // User Type Operations
    // -------------------------------------------------------------------------

    /// Fill in each user type's role ids.
    async fn attach_roles(&self, mut types: Vec<UserType>) -> Result<Vec<UserType>, AppError> {
        let ids: Vec<i32> = types.iter().map(|t| t.id).collect();
        let pairs = sqlx::query_as::<_, (i32, i32)>(
            "SELECT user_type_id, role_id FROM user_type_roles WHERE user_type_id = ANY($1) ORDER BY role_id",
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("load user type roles", e))?;

        let mut by_type: HashMap<i32, Vec<i32>> = HashMap::new();
        for (user_type_id, role_id) in pairs {
            by_type.entry(user_type_id).or_default().push(role_id);
        }
        for user_type in &mut types {
            user_type.roles = by_type.remove(&user_type.id).unwrap_or_default();
        }
        Ok(types)
    }

    #[instrument(skip(self))]
    pub async fn get_user_type(&self, id: i32) -> Result<Option<UserType>, AppError> {
        let found = sqlx::query_as::<_, UserType>(
            "SELECT id, name, description FROM user_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get user type", e))?;

        match found {
            Some(user_type) => Ok(self.attach_roles(vec![user_type]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self))]
    pub async fn list_user_types(&self) -> Result<Vec<UserType>, AppError> {
        let types = sqlx::query_as::<_, UserType>(
            "SELECT id, name, description FROM user_types ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list user types", e))?;
        self.attach_roles(types).await
    }

    #[instrument(skip(self))]
    pub async fn user_type_exists(&self, id: i32) -> Result<bool, AppError> {
        sqlx::query_scalar::<_, bool>("SELECT EXISTS (SELECT 1 FROM user_types WHERE id = $1)")
            .bind(id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| query_error("check user type", e))
    }

    #[instrument(skip(self))]
    pub async fn search_user_types_by_id(&self, term: &str) -> Result<Vec<UserType>, AppError> {
        let types = sqlx::query_as::<_, UserType>(
            "SELECT id, name, description FROM user_types WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
        )
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search user types", e))?;
        self.attach_roles(non_empty(types, "user types")?).await
    }

    #[instrument(skip(self))]
    pub async fn search_user_types_by_name(&self, term: &str) -> Result<Vec<UserType>, AppError> {
        let types = sqlx::query_as::<_, UserType>(
            "SELECT id, name, description FROM user_types WHERE name ILIKE $1 ORDER BY id",
        )
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search user types", e))?;
        self.attach_roles(non_empty(types, "user types")?).await
    }

    // -------------------------------------------------------------------------
    // Reference Tables
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_user_state_type(&self, id: i32) -> Result<Option<UserStateType>, AppError> {
        sqlx::query_as::<_, UserStateType>(
            "SELECT id, description FROM user_state_types WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get user state type", e))
    }

    #[instrument(skip(self))]
    pub async fn list_user_state_types(&self) -> Result<Vec<UserStateType>, AppError> {
        sqlx::query_as::<_, UserStateType>("SELECT id, description FROM user_state_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list user state types", e))
    }

    #[instrument(skip(self))]
    pub async fn get_identifier_type(&self, id: i32) -> Result<Option<IdentifierType>, AppError> {
        sqlx::query_as::<_, IdentifierType>("SELECT id, name FROM identifier_types WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("get identifier type", e))
    }

    #[instrument(skip(self))]
    pub async fn list_identifier_types(&self) -> Result<Vec<IdentifierType>, AppError> {
        sqlx::query_as::<_, IdentifierType>("SELECT id, name FROM identifier_types ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list identifier types", e))
    }

    // -------------------------------------------------------------------------
    // User Operations
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| query_error("get user", e))
    }

    #[instrument(skip(self))]
    pub async fn get_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("get user", e))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Vec<User>, AppError> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users ORDER BY id", USER_COLUMNS))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| query_error("list users", e))
    }

    #[instrument(skip(self))]
    pub async fn search_users_by_id(&self, term: &str) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE CAST(id AS TEXT) LIKE $1 ORDER BY id",
            USER_COLUMNS
        ))
        .bind(prefix_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search users", e))?;
        non_empty(rows, "users")
    }

    #[instrument(skip(self))]
    pub async fn search_users_by_email(&self, term: &str) -> Result<Vec<User>, AppError> {
        let rows = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email ILIKE $1 ORDER BY id",
            USER_COLUMNS
        ))
        .bind(contains_pattern(term))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("search users", e))?;
        non_empty(rows, "users")
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn create_user(&self, input: &NewUser) -> Result<User, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_user"])
            .start_timer();

        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (email, password_hash, user_type_id, user_state_type_id)
            VALUES ($1, $2, $3, 1)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.user_type_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                AppError::Conflict(anyhow::anyhow!("Email '{}' is already registered", input.email))
            }
            sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
                AppError::NotFound(anyhow::anyhow!("User type {} not found", input.user_type_id))
            }
            _ => query_error("create user", e),
        })?;

        timer.observe_duration();

        info!(user_id = user.id, "User created");

        Ok(user)
    }

    /// Apply the given changes; `None` when the user does not exist.
    #[instrument(skip(self, changes))]
    pub async fn update_user(
        &self,
        id: i32,
        changes: &UserChanges,
    ) -> Result<Option<User>, AppError> {
        sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                email = COALESCE($2, email),
                password_hash = COALESCE($3, password_hash),
                user_type_id = COALESCE($4, user_type_id),
                user_state_type_id = COALESCE($5, user_state_type_id)
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(changes.email.as_deref())
        .bind(changes.password_hash.as_deref())
        .bind(changes.user_type_id)
        .bind(changes.user_state_type_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| query_error("update user", e))
    }

    // -------------------------------------------------------------------------
    // Activity Log
    // -------------------------------------------------------------------------

    #[instrument(skip(self))]
    pub async fn list_logs_for_user(&self, email: &str) -> Result<Vec<LogEntry>, AppError> {
        let rows = sqlx::query_as::<_, LogEntry>(
            r#"
            SELECT id, email, action, date_time
            FROM logs
            WHERE lower(email) = lower($1)
            ORDER BY date_time DESC, id DESC
            "#,
        )
        .bind(email)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| query_error("list logs", e))?;
        non_empty(rows, "logs")
    }
}
