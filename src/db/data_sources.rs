//! Server and data source CRUD operations.

use crate::error::DatabaseError;
use crate::types::{DataSource, DataSourceId, Server, ServerId};
use crate::{Error, Result};

use super::Database;

const SELECT_DATA_SOURCE: &str = r#"
    SELECT
        d.id, d.name, d.url, d.server_id,
        s.name AS server_name, d.current_update_id
    FROM data_sources d
    JOIN servers s ON s.id = d.server_id
"#;

fn validate_url(url: &str) -> Result<()> {
    url::Url::parse(url).map_err(|e| Error::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    Ok(())
}

impl Database {
    /// Insert a new server
    pub async fn insert_server(&self, name: &str) -> Result<ServerId> {
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query("INSERT INTO servers (name, created_at) VALUES (?, ?)")
            .bind(name)
            .bind(now)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to insert server: {}",
                    e
                )))
            })?;

        Ok(ServerId(result.last_insert_rowid()))
    }

    /// Get a server by ID
    pub async fn get_server(&self, id: ServerId) -> Result<Option<Server>> {
        let row = sqlx::query_as::<_, Server>("SELECT id, name FROM servers WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get server: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// Insert a new data source owned by `server_id`
    ///
    /// The URL must parse as an absolute URL.
    pub async fn insert_data_source(
        &self,
        server_id: ServerId,
        name: &str,
        url: &str,
    ) -> Result<DataSourceId> {
        validate_url(url)?;
        let now = chrono::Utc::now().timestamp();

        let result = sqlx::query(
            r#"
            INSERT INTO data_sources (server_id, name, url, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(server_id)
        .bind(name)
        .bind(url)
        .bind(now)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert data source: {}",
                e
            )))
        })?;

        Ok(DataSourceId(result.last_insert_rowid()))
    }

    /// Get a data source by ID, with its server name
    pub async fn get_data_source(&self, id: DataSourceId) -> Result<Option<DataSource>> {
        let row = sqlx::query_as::<_, DataSource>(&format!("{} WHERE d.id = ?", SELECT_DATA_SOURCE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to get data source: {}",
                    e
                )))
            })?;

        Ok(row)
    }

    /// List all data sources ordered by server and name
    pub async fn list_data_sources(&self) -> Result<Vec<DataSource>> {
        let rows = sqlx::query_as::<_, DataSource>(&format!(
            "{} ORDER BY s.name ASC, d.name ASC",
            SELECT_DATA_SOURCE
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list data sources: {}",
                e
            )))
        })?;

        Ok(rows)
    }

    /// Change the URL future updates of a data source are fetched from
    ///
    /// Existing update records keep the URL they were created with.
    pub async fn update_data_source_url(&self, id: DataSourceId, url: &str) -> Result<()> {
        validate_url(url)?;

        let result = sqlx::query("UPDATE data_sources SET url = ? WHERE id = ?")
            .bind(url)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to update data source url: {}",
                    e
                )))
            })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "data source {}",
                id
            ))));
        }

        Ok(())
    }
}
