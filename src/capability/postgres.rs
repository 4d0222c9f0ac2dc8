use async_trait::async_trait;
use sqlx::{postgres::PgRow, PgPool, Row};
use uuid::Uuid;

use super::store::{ProfileError, ProfileStore};
use super::{Capability, Profile, Role};
use crate::database::{DatabaseError, DatabaseManager};

const GRANT_CLAUSE: &str = "capabilities = CASE WHEN $2 = ANY(COALESCE(capabilities, '{}')) THEN capabilities \
     ELSE array_append(COALESCE(capabilities, '{}'), $2) END";

const ROLE_CLAUSE: &str = "role = $2";

const REVOKE_CLAUSE: &str = "capabilities = array_remove(capabilities, $2)";

fn select_sql(table: &str) -> String {
    format!("SELECT id, role, capabilities FROM {} WHERE id = $1", table)
}

fn update_sql(table: &str, set_clause: &str) -> String {
    format!(
        "UPDATE {} SET {} WHERE id = $1 RETURNING id, role, capabilities",
        table, set_clause
    )
}

/// Profiles table with `id uuid`, `role text` and `capabilities text[]` columns
#[derive(Clone)]
pub struct PgProfileStore {
    pool: PgPool,
    table: String,
}

impl PgProfileStore {
    pub fn new(pool: PgPool, table: &str) -> Result<Self, DatabaseError> {
        Ok(Self {
            pool,
            table: DatabaseManager::qualified_table(table)?,
        })
    }

    fn row_to_profile(row: &PgRow) -> Result<Profile, ProfileError> {
        let role: Option<String> = row.try_get("role")?;
        let capabilities: Option<Vec<String>> = row.try_get("capabilities")?;

        Ok(Profile {
            id: row.try_get("id")?,
            role: match role {
                Some(r) => r.parse()?,
                None => Role::default(),
            },
            capabilities: capabilities.unwrap_or_default(),
        })
    }

    async fn update_returning(&self, set_clause: &str, id: Uuid, value: &str) -> Result<Profile, ProfileError> {
        let row = sqlx::query(&update_sql(&self.table, set_clause))
            .bind(id)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?
            .ok_or(ProfileError::NotFound(id))?;

        Self::row_to_profile(&row)
    }
}

#[async_trait]
impl ProfileStore for PgProfileStore {
    async fn profile(&self, id: Uuid) -> Result<Option<Profile>, ProfileError> {
        let row = sqlx::query(&select_sql(&self.table))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_profile).transpose()
    }

    async fn set_role(&self, id: Uuid, role: Role) -> Result<Profile, ProfileError> {
        self.update_returning(ROLE_CLAUSE, id, role.as_str()).await
    }

    async fn grant_capability(&self, id: Uuid, capability: &Capability) -> Result<Profile, ProfileError> {
        self.update_returning(GRANT_CLAUSE, id, capability.as_str()).await
    }

    async fn revoke_capability(&self, id: Uuid, capability: &Capability) -> Result<Profile, ProfileError> {
        self.update_returning(REVOKE_CLAUSE, id, capability.as_str()).await
    }

    async fn health_check(&self) -> Result<(), ProfileError> {
        DatabaseManager::health_check(&self.pool).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statements_touch_only_profile_columns() {
        let table = DatabaseManager::qualified_table("public.profiles").unwrap();

        assert_eq!(
            select_sql(&table),
            "SELECT id, role, capabilities FROM \"public\".\"profiles\" WHERE id = $1"
        );
        assert_eq!(
            update_sql(&table, ROLE_CLAUSE),
            "UPDATE \"public\".\"profiles\" SET role = $2 WHERE id = $1 RETURNING id, role, capabilities"
        );
        assert_eq!(
            update_sql("\"profiles\"", REVOKE_CLAUSE),
            "UPDATE \"profiles\" SET capabilities = array_remove(capabilities, $2) WHERE id = $1 RETURNING id, role, capabilities"
        );
    }

    #[test]
    fn grant_appends_only_missing_capabilities() {
        let sql = update_sql("\"profiles\"", GRANT_CLAUSE);
        assert!(sql.starts_with(
            "UPDATE \"profiles\" SET capabilities = CASE WHEN $2 = ANY(COALESCE(capabilities, '{}')) THEN capabilities ELSE"
        ));
        assert!(sql.contains("array_append(COALESCE(capabilities, '{}'), $2) END WHERE id = $1"));
    }
}
