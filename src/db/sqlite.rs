use crate::db::models::{DbSession, DbSite, DbUser, NewUser};
use crate::db::schema::SQLITE_INIT;
use crate::error::OpenpackError;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{Pool, QueryBuilder, Row, Sqlite};
use std::str::FromStr;
use uuid::Uuid;

pub type SqlitePool = Pool<Sqlite>;

const USER_COLUMNS: &str =
    "id, created_at, username, ivion_username, ivion_password, hashed_password";
const SITE_COLUMNS: &str = "id, created_at, name, instance_url, ivion_id";

#[derive(Clone)]
pub struct Storage {
    pool: SqlitePool,
}

impl Storage {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (creating if missing) the database at `database_url` and apply the schema.
    pub async fn connect(database_url: &str) -> Result<Self, OpenpackError> {
        let connect_opts = SqliteConnectOptions::from_str(database_url)?
            .create_if_missing(true)
            .foreign_keys(true);
        let pool = SqlitePoolOptions::new().connect_with(connect_opts).await?;
        let storage = Self::new(pool);
        storage.init_schema().await?;
        Ok(storage)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Initialize the schema by executing the bundled DDL.
    pub async fn init_schema(&self) -> Result<(), OpenpackError> {
        // sqlx::query runs one statement at a time
        for stmt in SQLITE_INIT.split(';') {
            let s = stmt.trim();
            if s.is_empty() {
                continue;
            }
            sqlx::query(s).execute(&self.pool).await?;
        }
        Ok(())
    }

    pub async fn insert_user(&self, user: NewUser) -> Result<DbUser, OpenpackError> {
        let row = DbUser {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            username: user.username,
            ivion_username: user.ivion_username,
            ivion_password: user.ivion_password,
            hashed_password: user.hashed_password,
        };
        sqlx::query(
            r#"INSERT INTO user (
                id, created_at, username, ivion_username, ivion_password, hashed_password
            ) VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(row.id.to_string())
        .bind(row.created_at.to_rfc3339())
        .bind(&row.username)
        .bind(&row.ivion_username)
        .bind(&row.ivion_password)
        .bind(&row.hashed_password)
        .execute(&self.pool)
        .await?;
        Ok(row)
    }

    pub async fn get_user(&self, id: Uuid) -> Result<Option<DbUser>, OpenpackError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn get_user_by_username(
        &self,
        username: &str,
    ) -> Result<Option<DbUser>, OpenpackError> {
        let row = sqlx::query(&format!(
            "SELECT {USER_COLUMNS} FROM user WHERE username = ?"
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    pub async fn insert_site(
        &self,
        name: String,
        instance_url: String,
        ivion_id: String,
    ) -> Result<DbSite, OpenpackError> {
        let site = DbSite {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            name,
            instance_url,
            ivion_id,
        };
        sqlx::query(
            "INSERT INTO site (id, created_at, name, instance_url, ivion_id) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(site.id.to_string())
        .bind(site.created_at.to_rfc3339())
        .bind(&site.name)
        .bind(&site.instance_url)
        .bind(&site.ivion_id)
        .execute(&self.pool)
        .await?;
        Ok(site)
    }

    pub async fn get_site(&self, id: Uuid) -> Result<Option<DbSite>, OpenpackError> {
        let row = sqlx::query(&format!("SELECT {SITE_COLUMNS} FROM site WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Self::row_to_site).transpose()
    }

    /// Return the subset of `ids` that name an existing site.
    pub async fn existing_site_ids(&self, ids: &[Uuid]) -> Result<Vec<Uuid>, OpenpackError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut qb: QueryBuilder<Sqlite> = QueryBuilder::new("SELECT id FROM site WHERE id IN (");
        let mut separated = qb.separated(", ");
        for id in ids {
            separated.push_bind(id.to_string());
        }
        separated.push_unseparated(")");

        let rows = qb.build().fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| parse_uuid(&row.try_get::<String, _>("id")?))
            .collect::<Result<Vec<_>, _>>()
            .map_err(Into::into)
    }

    /// Batch insert association rows in a single transaction. Returns the number linked.
    pub async fn link_sites(&self, user_id: Uuid, site_ids: &[Uuid]) -> Result<u64, OpenpackError> {
        if site_ids.is_empty() {
            return Ok(0);
        }
        let mut tx = self.pool.begin().await?;
        let mut qb: QueryBuilder<Sqlite> =
            QueryBuilder::new("INSERT INTO user_site_link (user_id, site_id) ");
        qb.push_values(site_ids, |mut b, site_id| {
            b.push_bind(user_id.to_string())
                .push_bind(site_id.to_string());
        });
        let done = qb.build().execute(&mut *tx).await?;
        tx.commit().await?;
        Ok(done.rows_affected())
    }

    /// Sites linked to a user, oldest first.
    pub async fn sites_of_user(&self, user_id: Uuid) -> Result<Vec<DbSite>, OpenpackError> {
        let rows = sqlx::query(
            r#"SELECT s.id, s.created_at, s.name, s.instance_url, s.ivion_id
               FROM site s
               JOIN user_site_link l ON l.site_id = s.id
               WHERE l.user_id = ?
               ORDER BY s.created_at, s.id"#,
        )
        .bind(user_id.to_string())
        .fetch_all(&self.pool)
        .await?;
        rows.into_iter().map(Self::row_to_site).collect()
    }

    /// First user linked to a site, by user creation time.
    pub async fn first_user_of_site(&self, site_id: Uuid) -> Result<Option<DbUser>, OpenpackError> {
        let row = sqlx::query(
            r#"SELECT u.id, u.created_at, u.username, u.ivion_username,
                      u.ivion_password, u.hashed_password
               FROM user u
               JOIN user_site_link l ON l.user_id = u.id
               WHERE l.site_id = ?
               ORDER BY u.created_at, u.id
               LIMIT 1"#,
        )
        .bind(site_id.to_string())
        .fetch_optional(&self.pool)
        .await?;
        row.map(Self::row_to_user).transpose()
    }

    /// Persist one session row inside its own transaction.
    /// The transaction rolls back if any step fails before commit.
    pub async fn insert_session(&self, session: &DbSession) -> Result<(), OpenpackError> {
        let data = serde_json::to_string(&session.data)?;
        let mut tx = self.pool.begin().await?;
        sqlx::query(
            r#"INSERT INTO session (id, created_at, expering_at, user_id, site_id, data)
               VALUES (?, ?, ?, ?, ?, ?)"#,
        )
        .bind(session.id.to_string())
        .bind(session.created_at.to_rfc3339())
        .bind(session.expires_at.to_rfc3339())
        .bind(session.user_id.to_string())
        .bind(session.site_id.to_string())
        .bind(data)
        .execute(&mut *tx)
        .await?;
        tx.commit().await?;
        Ok(())
    }

    fn row_to_user(row: SqliteRow) -> Result<DbUser, OpenpackError> {
        let id: String = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;
        Ok(DbUser {
            id: parse_uuid(&id)?,
            created_at: parse_timestamp(&created_at)?,
            username: row.try_get("username")?,
            ivion_username: row.try_get("ivion_username")?,
            ivion_password: row.try_get("ivion_password")?,
            hashed_password: row.try_get("hashed_password")?,
        })
    }

    fn row_to_site(row: SqliteRow) -> Result<DbSite, OpenpackError> {
        let id: String = row.try_get("id")?;
        let created_at: String = row.try_get("created_at")?;
        Ok(DbSite {
            id: parse_uuid(&id)?,
            created_at: parse_timestamp(&created_at)?,
            name: row.try_get("name")?,
            instance_url: row.try_get("instance_url")?,
            ivion_id: row.try_get("ivion_id")?,
        })
    }
}

fn parse_uuid(s: &str) -> Result<Uuid, sqlx::Error> {
    Uuid::parse_str(s).map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>, sqlx::Error> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}
