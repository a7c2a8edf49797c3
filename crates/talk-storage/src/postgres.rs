//! PostgreSQL adapter for Talk storage.
//!
//! Uniqueness and referential rules are enforced by the schema itself
//! (primary keys, a canonical-order check on links, cascading foreign keys).
//! Facilitator bookkeeping runs inside a transaction holding the group row
//! lock, so concurrent demotions cannot both succeed.

use crate::traits::{GroupStore, IdeaFilter, IdeaStore, LinkStore, MembershipStore, QueryWindow};
use crate::{StorageError, StorageResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::str::FromStr;
use talk_types::{
    AccessLevel, Group, GroupId, GroupPatch, GroupStatus, Idea, IdeaCategory, IdeaId, IdeaLink,
    IdeaSource, IdeaStatus, LinkId, Membership, NewGroup, NewIdea, NewIdeaLink, Role, UserId,
};

const GROUP_COLUMNS: &str = "id, name, description, tags, access_level, status, parent_group_id, created_by, created_at, updated_at";
const MEMBER_COLUMNS: &str = "group_id, user_id, role, joined_at";
const IDEA_COLUMNS: &str = "id, group_id, author_id, parent_id, content, category, source, status, shareable, edit_count, created_at, updated_at, deleted_at";
const LINK_COLUMNS: &str = "id, idea_id_a, idea_id_b, link_type, created_by, created_at";

/// PostgreSQL-backed storage adapter.
#[derive(Clone)]
pub struct PostgresTalkStorage {
    pool: PgPool,
}

impl PostgresTalkStorage {
    /// Connect to PostgreSQL and initialize required schema.
    pub async fn connect(database_url: &str) -> StorageResult<Self> {
        Self::connect_with_options(database_url, 10, 5).await
    }

    /// Connect with explicit pool parameters.
    pub async fn connect_with_options(
        database_url: &str,
        max_connections: u32,
        connect_timeout_secs: u64,
    ) -> StorageResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(std::time::Duration::from_secs(connect_timeout_secs))
            .connect(database_url)
            .await
            .map_err(|e| StorageError::Backend(format!("failed to connect postgres: {e}")))?;
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    /// Create adapter from an existing pool.
    pub async fn from_pool(pool: PgPool) -> StorageResult<Self> {
        let store = Self { pool };
        store.init_schema().await?;
        Ok(store)
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn init_schema(&self) -> StorageResult<()> {
        let ddl = [
            r#"
            CREATE TABLE IF NOT EXISTS talk_groups (
                id BIGSERIAL PRIMARY KEY,
                name TEXT NOT NULL CHECK (name <> ''),
                description TEXT NOT NULL DEFAULT '',
                tags TEXT[] NOT NULL DEFAULT '{}',
                access_level TEXT NOT NULL,
                status TEXT NOT NULL,
                parent_group_id BIGINT REFERENCES talk_groups(id) ON DELETE SET NULL,
                created_by BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS talk_group_members (
                group_id BIGINT NOT NULL REFERENCES talk_groups(id) ON DELETE CASCADE,
                user_id BIGINT NOT NULL,
                role TEXT NOT NULL,
                joined_at TIMESTAMPTZ NOT NULL,
                PRIMARY KEY (group_id, user_id)
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS talk_ideas (
                id BIGSERIAL PRIMARY KEY,
                group_id BIGINT NOT NULL REFERENCES talk_groups(id) ON DELETE CASCADE,
                author_id BIGINT NOT NULL,
                parent_id BIGINT REFERENCES talk_ideas(id) ON DELETE SET NULL,
                content TEXT NOT NULL CHECK (content <> ''),
                category TEXT NOT NULL,
                source TEXT NOT NULL,
                status TEXT NOT NULL,
                shareable BOOLEAN NOT NULL DEFAULT FALSE,
                edit_count INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMPTZ NOT NULL,
                updated_at TIMESTAMPTZ NOT NULL,
                deleted_at TIMESTAMPTZ
            )
            "#,
            r#"
            CREATE TABLE IF NOT EXISTS talk_idea_links (
                id BIGSERIAL PRIMARY KEY,
                idea_id_a BIGINT NOT NULL REFERENCES talk_ideas(id) ON DELETE CASCADE,
                idea_id_b BIGINT NOT NULL REFERENCES talk_ideas(id) ON DELETE CASCADE,
                link_type TEXT NOT NULL,
                created_by BIGINT NOT NULL,
                created_at TIMESTAMPTZ NOT NULL,
                CHECK (idea_id_a < idea_id_b),
                UNIQUE (idea_id_a, idea_id_b, link_type)
            )
            "#,
            "CREATE INDEX IF NOT EXISTS talk_ideas_group_idx ON talk_ideas (group_id, id DESC)",
            "CREATE INDEX IF NOT EXISTS talk_ideas_author_idx ON talk_ideas (author_id, id DESC)",
            "CREATE INDEX IF NOT EXISTS talk_members_user_idx ON talk_group_members (user_id)",
        ];

        for stmt in ddl {
            sqlx::query(stmt)
                .execute(&self.pool)
                .await
                .map_err(|e| StorageError::Backend(format!("schema init failed: {e}")))?;
        }
        Ok(())
    }

    async fn idea_missing_or_invalid(&self, idea_id: IdeaId, context: &str) -> StorageError {
        match self.get_idea(idea_id).await {
            Ok(Some(idea)) if !idea.is_deleted() => StorageError::InvariantViolation(format!(
                "{context} for idea {idea_id}"
            )),
            Ok(Some(_)) => StorageError::NotFound(format!("idea {} is deleted", idea_id)),
            Ok(None) => StorageError::NotFound(format!("idea {} not found", idea_id)),
            Err(err) => err,
        }
    }
}

#[async_trait]
impl GroupStore for PostgresTalkStorage {
    async fn create_group(
        &self,
        group: NewGroup,
        created_at: DateTime<Utc>,
    ) -> StorageResult<(Group, Membership)> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO talk_groups
                (name, description, tags, access_level, status, parent_group_id, created_by, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(&group.name)
        .bind(&group.description)
        .bind(&group.tags)
        .bind(group.access_level.as_str())
        .bind(GroupStatus::default().as_str())
        .bind(group.parent_group_id.map(|g| g.get()))
        .bind(group.created_by.get())
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let record = group_row_to_record(row)?;

        let facilitator =
            Membership::new(record.id, group.created_by, Role::Facilitator).joined_at(created_at);
        sqlx::query(
            "INSERT INTO talk_group_members (group_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(facilitator.group_id.get())
        .bind(facilitator.user_id.get())
        .bind(facilitator.role.as_str())
        .bind(facilitator.joined_at)
        .execute(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;

        tx.commit().await.map_err(backend)?;
        Ok((record, facilitator))
    }

    async fn get_group(&self, group_id: GroupId) -> StorageResult<Option<Group>> {
        let row = sqlx::query(&format!(
            "SELECT {GROUP_COLUMNS} FROM talk_groups WHERE id = $1"
        ))
        .bind(group_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(group_row_to_record).transpose()
    }

    async fn list_groups(&self) -> StorageResult<Vec<Group>> {
        let rows = sqlx::query(&format!(
            "SELECT {GROUP_COLUMNS} FROM talk_groups ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(group_row_to_record).collect()
    }

    async fn list_sub_groups(&self, parent: GroupId) -> StorageResult<Vec<Group>> {
        let rows = sqlx::query(&format!(
            "SELECT {GROUP_COLUMNS} FROM talk_groups WHERE parent_group_id = $1 ORDER BY id"
        ))
        .bind(parent.get())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(group_row_to_record).collect()
    }

    async fn update_group(
        &self,
        group_id: GroupId,
        patch: &GroupPatch,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Group> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE talk_groups
               SET description = COALESCE($1, description),
                   tags = COALESCE($2, tags),
                   access_level = COALESCE($3, access_level),
                   status = COALESCE($4, status),
                   updated_at = $5
             WHERE id = $6
            RETURNING {GROUP_COLUMNS}
            "#
        ))
        .bind(patch.description.as_deref())
        .bind(patch.tags.clone())
        .bind(patch.access_level.map(|a| a.as_str()))
        .bind(patch.status.map(|s| s.as_str()))
        .bind(updated_at)
        .bind(group_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => group_row_to_record(row),
            None => Err(StorageError::NotFound(format!(
                "group {} not found",
                group_id
            ))),
        }
    }

    async fn delete_group(&self, group_id: GroupId) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM talk_groups WHERE id = $1")
            .bind(group_id.get())
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StorageError::NotFound(format!(
                "group {} not found",
                group_id
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl MembershipStore for PostgresTalkStorage {
    async fn add_membership(&self, membership: Membership) -> StorageResult<()> {
        sqlx::query(
            "INSERT INTO talk_group_members (group_id, user_id, role, joined_at) VALUES ($1, $2, $3, $4)",
        )
        .bind(membership.group_id.get())
        .bind(membership.user_id.get())
        .bind(membership.role.as_str())
        .bind(membership.joined_at)
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        Ok(())
    }

    async fn get_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> StorageResult<Option<Membership>> {
        let row = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM talk_group_members WHERE group_id = $1 AND user_id = $2"
        ))
        .bind(group_id.get())
        .bind(user_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(member_row_to_record).transpose()
    }

    async fn list_members(&self, group_id: GroupId) -> StorageResult<Vec<Membership>> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM talk_group_members WHERE group_id = $1 ORDER BY joined_at, user_id"
        ))
        .bind(group_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(member_row_to_record).collect()
    }

    async fn list_user_memberships(&self, user_id: UserId) -> StorageResult<Vec<Membership>> {
        let rows = sqlx::query(&format!(
            "SELECT {MEMBER_COLUMNS} FROM talk_group_members WHERE user_id = $1 ORDER BY group_id"
        ))
        .bind(user_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(member_row_to_record).collect()
    }

    async fn count_members(&self, group_id: GroupId) -> StorageResult<usize> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM talk_group_members WHERE group_id = $1")
                .bind(group_id.get())
                .fetch_one(&self.pool)
                .await
                .map_err(backend)?;
        to_usize(count)
    }

    async fn set_role(
        &self,
        group_id: GroupId,
        user_id: UserId,
        role: Role,
    ) -> StorageResult<Membership> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        lock_group(&mut tx, group_id).await?;

        let current = current_role(&mut tx, group_id, user_id).await?;
        if current.is_facilitator()
            && !role.is_facilitator()
            && facilitator_count(&mut tx, group_id).await? <= 1
        {
            return Err(StorageError::InvariantViolation(format!(
                "group {} must keep at least one facilitator",
                group_id
            )));
        }

        let row = sqlx::query(&format!(
            r#"
            UPDATE talk_group_members SET role = $1
             WHERE group_id = $2 AND user_id = $3
            RETURNING {MEMBER_COLUMNS}
            "#
        ))
        .bind(role.as_str())
        .bind(group_id.get())
        .bind(user_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;
        let membership = member_row_to_record(row)?;

        tx.commit().await.map_err(backend)?;
        Ok(membership)
    }

    async fn remove_membership(
        &self,
        group_id: GroupId,
        user_id: UserId,
    ) -> StorageResult<Membership> {
        let mut tx = self.pool.begin().await.map_err(backend)?;
        lock_group(&mut tx, group_id).await?;

        let current = current_role(&mut tx, group_id, user_id).await?;
        if current.is_facilitator() && facilitator_count(&mut tx, group_id).await? <= 1 {
            return Err(StorageError::InvariantViolation(format!(
                "the last facilitator cannot leave group {}",
                group_id
            )));
        }

        let row = sqlx::query(&format!(
            "DELETE FROM talk_group_members WHERE group_id = $1 AND user_id = $2 RETURNING {MEMBER_COLUMNS}"
        ))
        .bind(group_id.get())
        .bind(user_id.get())
        .fetch_one(&mut *tx)
        .await
        .map_err(backend)?;
        let membership = member_row_to_record(row)?;

        tx.commit().await.map_err(backend)?;
        Ok(membership)
    }
}

#[async_trait]
impl IdeaStore for PostgresTalkStorage {
    async fn insert_idea(&self, idea: NewIdea, created_at: DateTime<Utc>) -> StorageResult<Idea> {
        let row = sqlx::query(&format!(
            r#"
            INSERT INTO talk_ideas
                (group_id, author_id, parent_id, content, category, source, status, shareable, edit_count, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, FALSE, 0, $8, $8)
            RETURNING {IDEA_COLUMNS}
            "#
        ))
        .bind(idea.group_id.get())
        .bind(idea.author_id.get())
        .bind(idea.parent_id.map(|p| p.get()))
        .bind(&idea.content)
        .bind(idea.category.as_str())
        .bind(idea.source.as_str())
        .bind(IdeaStatus::Raw.as_str())
        .bind(created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        idea_row_to_record(row)
    }

    async fn get_idea(&self, idea_id: IdeaId) -> StorageResult<Option<Idea>> {
        let row = sqlx::query(&format!(
            "SELECT {IDEA_COLUMNS} FROM talk_ideas WHERE id = $1"
        ))
        .bind(idea_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(idea_row_to_record).transpose()
    }

    async fn list_ideas(
        &self,
        filter: &IdeaFilter,
        window: QueryWindow,
    ) -> StorageResult<Vec<Idea>> {
        let limit = if window.limit == 0 {
            None
        } else {
            Some(to_i64(window.limit)?)
        };

        let rows = sqlx::query(&format!(
            r#"
            SELECT {IDEA_COLUMNS}
              FROM talk_ideas
             WHERE ($1::BIGINT IS NULL OR group_id = $1)
               AND ($2::BIGINT IS NULL OR author_id = $2)
               AND ($3::TEXT IS NULL OR category = $3)
               AND (NOT $4 OR shareable)
               AND ($5 OR deleted_at IS NULL)
             ORDER BY id DESC
             LIMIT $6 OFFSET $7
            "#
        ))
        .bind(filter.group_id.map(|g| g.get()))
        .bind(filter.author_id.map(|a| a.get()))
        .bind(filter.category.map(|c| c.as_str()))
        .bind(filter.shareable_only)
        .bind(filter.include_deleted)
        .bind(limit)
        .bind(to_i64(window.offset)?)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(idea_row_to_record).collect()
    }

    async fn edit_idea(
        &self,
        idea_id: IdeaId,
        content: &str,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE talk_ideas
               SET content = $1, edit_count = edit_count + 1, updated_at = $2
             WHERE id = $3 AND deleted_at IS NULL
            RETURNING {IDEA_COLUMNS}
            "#
        ))
        .bind(content)
        .bind(updated_at)
        .bind(idea_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        match row {
            Some(row) => idea_row_to_record(row),
            None => Err(self.idea_missing_or_invalid(idea_id, "edit rejected").await),
        }
    }

    async fn soft_delete_idea(
        &self,
        idea_id: IdeaId,
        deleted_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE talk_ideas
               SET deleted_at = $1, updated_at = $1
             WHERE id = $2 AND deleted_at IS NULL
            RETURNING {IDEA_COLUMNS}
            "#
        ))
        .bind(deleted_at)
        .bind(idea_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => idea_row_to_record(row),
            None => Err(self.idea_missing_or_invalid(idea_id, "delete rejected").await),
        }
    }

    async fn transition_status(
        &self,
        idea_id: IdeaId,
        expected_from: IdeaStatus,
        to: IdeaStatus,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE talk_ideas
               SET status = $1, updated_at = $2
             WHERE id = $3 AND status = $4 AND deleted_at IS NULL
            RETURNING {IDEA_COLUMNS}
            "#
        ))
        .bind(to.as_str())
        .bind(updated_at)
        .bind(idea_id.get())
        .bind(expected_from.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => idea_row_to_record(row),
            None => Err(self
                .idea_missing_or_invalid(idea_id, "invalid status transition")
                .await),
        }
    }

    async fn set_shareable(
        &self,
        idea_id: IdeaId,
        shareable: bool,
        updated_at: DateTime<Utc>,
    ) -> StorageResult<Idea> {
        let row = sqlx::query(&format!(
            r#"
            UPDATE talk_ideas
               SET shareable = $1, updated_at = $2
             WHERE id = $3 AND deleted_at IS NULL
            RETURNING {IDEA_COLUMNS}
            "#
        ))
        .bind(shareable)
        .bind(updated_at)
        .bind(idea_id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        match row {
            Some(row) => idea_row_to_record(row),
            None => Err(self.idea_missing_or_invalid(idea_id, "share toggle rejected").await),
        }
    }
}

#[async_trait]
impl LinkStore for PostgresTalkStorage {
    async fn insert_link(
        &self,
        link: NewIdeaLink,
        created_at: DateTime<Utc>,
    ) -> StorageResult<IdeaLink> {
        if link.is_self_link() {
            return Err(StorageError::InvalidInput(
                "an idea cannot be linked to itself".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await.map_err(backend)?;

        let live: Vec<i64> = sqlx::query_scalar(
            "SELECT id FROM talk_ideas WHERE id IN ($1, $2) AND deleted_at IS NULL FOR SHARE",
        )
        .bind(link.idea_id_a.get())
        .bind(link.idea_id_b.get())
        .fetch_all(&mut *tx)
        .await
        .map_err(backend)?;
        for end in [link.idea_id_a, link.idea_id_b] {
            if !live.contains(&end.get()) {
                return Err(StorageError::NotFound(format!("idea {} not found", end)));
            }
        }

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO talk_idea_links (idea_id_a, idea_id_b, link_type, created_by, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {LINK_COLUMNS}
            "#
        ))
        .bind(link.idea_id_a.get())
        .bind(link.idea_id_b.get())
        .bind(&link.link_type)
        .bind(link.created_by.get())
        .bind(created_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_sqlx_error)?;
        let record = link_row_to_record(row)?;

        tx.commit().await.map_err(backend)?;
        Ok(record)
    }

    async fn links_for_idea(&self, idea_id: IdeaId) -> StorageResult<Vec<IdeaLink>> {
        let rows = sqlx::query(&format!(
            "SELECT {LINK_COLUMNS} FROM talk_idea_links WHERE idea_id_a = $1 OR idea_id_b = $1 ORDER BY id"
        ))
        .bind(idea_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(link_row_to_record).collect()
    }

    async fn count_links(&self, idea_id: IdeaId) -> StorageResult<usize> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM talk_idea_links WHERE idea_id_a = $1 OR idea_id_b = $1",
        )
        .bind(idea_id.get())
        .fetch_one(&self.pool)
        .await
        .map_err(backend)?;
        to_usize(count)
    }
}

async fn lock_group(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    group_id: GroupId,
) -> StorageResult<()> {
    let locked: Option<i64> = sqlx::query_scalar("SELECT id FROM talk_groups WHERE id = $1 FOR UPDATE")
        .bind(group_id.get())
        .fetch_optional(&mut **tx)
        .await
        .map_err(backend)?;
    match locked {
        Some(_) => Ok(()),
        None => Err(StorageError::NotFound(format!(
            "group {} not found",
            group_id
        ))),
    }
}

async fn current_role(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    group_id: GroupId,
    user_id: UserId,
) -> StorageResult<Role> {
    let role: Option<String> = sqlx::query_scalar(
        "SELECT role FROM talk_group_members WHERE group_id = $1 AND user_id = $2",
    )
    .bind(group_id.get())
    .bind(user_id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(backend)?;

    match role {
        Some(raw) => parse_column(&raw),
        None => Err(StorageError::NotFound(format!(
            "user {} is not a member of group {}",
            user_id, group_id
        ))),
    }
}

async fn facilitator_count(
    tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
    group_id: GroupId,
) -> StorageResult<usize> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM talk_group_members WHERE group_id = $1 AND role = $2",
    )
    .bind(group_id.get())
    .bind(Role::Facilitator.as_str())
    .fetch_one(&mut **tx)
    .await
    .map_err(backend)?;
    to_usize(count)
}

fn group_row_to_record(row: PgRow) -> StorageResult<Group> {
    let access_level: String = row.try_get("access_level").map_err(backend)?;
    let status: String = row.try_get("status").map_err(backend)?;
    Ok(Group {
        id: GroupId::new(row.try_get("id").map_err(backend)?),
        name: row.try_get("name").map_err(backend)?,
        description: row.try_get("description").map_err(backend)?,
        tags: row.try_get("tags").map_err(backend)?,
        access_level: parse_column::<AccessLevel>(&access_level)?,
        status: parse_column::<GroupStatus>(&status)?,
        parent_group_id: row
            .try_get::<Option<i64>, _>("parent_group_id")
            .map_err(backend)?
            .map(GroupId::new),
        created_by: UserId::new(row.try_get("created_by").map_err(backend)?),
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
    })
}

fn member_row_to_record(row: PgRow) -> StorageResult<Membership> {
    let role: String = row.try_get("role").map_err(backend)?;
    Ok(Membership {
        group_id: GroupId::new(row.try_get("group_id").map_err(backend)?),
        user_id: UserId::new(row.try_get("user_id").map_err(backend)?),
        role: parse_column::<Role>(&role)?,
        joined_at: row.try_get("joined_at").map_err(backend)?,
    })
}

fn idea_row_to_record(row: PgRow) -> StorageResult<Idea> {
    let category: String = row.try_get("category").map_err(backend)?;
    let source: String = row.try_get("source").map_err(backend)?;
    let status: String = row.try_get("status").map_err(backend)?;
    let edit_count: i32 = row.try_get("edit_count").map_err(backend)?;
    Ok(Idea {
        id: IdeaId::new(row.try_get("id").map_err(backend)?),
        group_id: GroupId::new(row.try_get("group_id").map_err(backend)?),
        author_id: UserId::new(row.try_get("author_id").map_err(backend)?),
        parent_id: row
            .try_get::<Option<i64>, _>("parent_id")
            .map_err(backend)?
            .map(IdeaId::new),
        content: row.try_get("content").map_err(backend)?,
        category: parse_column::<IdeaCategory>(&category)?,
        source: parse_column::<IdeaSource>(&source)?,
        status: parse_column::<IdeaStatus>(&status)?,
        shareable: row.try_get("shareable").map_err(backend)?,
        edit_count: u32::try_from(edit_count)
            .map_err(|_| StorageError::Serialization(format!("negative edit count {edit_count}")))?,
        created_at: row.try_get("created_at").map_err(backend)?,
        updated_at: row.try_get("updated_at").map_err(backend)?,
        deleted_at: row.try_get("deleted_at").map_err(backend)?,
    })
}

fn link_row_to_record(row: PgRow) -> StorageResult<IdeaLink> {
    Ok(IdeaLink {
        id: LinkId::new(row.try_get("id").map_err(backend)?),
        idea_id_a: IdeaId::new(row.try_get("idea_id_a").map_err(backend)?),
        idea_id_b: IdeaId::new(row.try_get("idea_id_b").map_err(backend)?),
        link_type: row.try_get("link_type").map_err(backend)?,
        created_by: UserId::new(row.try_get("created_by").map_err(backend)?),
        created_at: row.try_get("created_at").map_err(backend)?,
    })
}

fn parse_column<T>(raw: &str) -> StorageResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    T::from_str(raw).map_err(|e| StorageError::Serialization(e.to_string()))
}

fn backend(err: sqlx::Error) -> StorageError {
    StorageError::Backend(err.to_string())
}

fn map_sqlx_error(err: sqlx::Error) -> StorageError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.code().as_deref() {
            Some("23505") => return StorageError::Conflict(db_err.message().to_string()),
            Some("23503") => return StorageError::NotFound(db_err.message().to_string()),
            Some("23514") => return StorageError::InvalidInput(db_err.message().to_string()),
            _ => {}
        }
    }
    StorageError::Backend(err.to_string())
}

fn to_i64(value: usize) -> StorageResult<i64> {
    i64::try_from(value)
        .map_err(|_| StorageError::InvalidInput("window value too large".to_string()))
}

fn to_usize(value: i64) -> StorageResult<usize> {
    usize::try_from(value)
        .map_err(|_| StorageError::Serialization(format!("negative count {value}")))
}
