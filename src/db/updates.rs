//! Update record persistence.

use crate::error::DatabaseError;
use crate::store::UpdateStore;
use crate::types::{DataSourceId, UpdateId};
use crate::update::{NewUpdate, UpdateRecord, UpdateState};
use crate::{Error, Result};
use async_trait::async_trait;

use super::{Database, UpdateRow};

impl Database {
    /// Get an update record by ID
    pub async fn get_update(&self, id: UpdateId) -> Result<Option<UpdateRecord>> {
        let row = sqlx::query_as::<_, UpdateRow>(
            r#"
            SELECT
                id, data_source_id, state, timestamp, url,
                download_time, file_path, error_message
            FROM data_source_updates
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to get update: {}",
                e
            )))
        })?;

        Ok(row.map(UpdateRecord::from))
    }

    /// List update records of a data source, newest first
    pub async fn list_updates(&self, data_source: DataSourceId) -> Result<Vec<UpdateRecord>> {
        let rows = sqlx::query_as::<_, UpdateRow>(
            r#"
            SELECT
                id, data_source_id, state, timestamp, url,
                download_time, file_path, error_message
            FROM data_source_updates
            WHERE data_source_id = ?
            ORDER BY id DESC
            "#,
        )
        .bind(data_source)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to list updates: {}",
                e
            )))
        })?;

        Ok(rows.into_iter().map(UpdateRecord::from).collect())
    }
}

#[async_trait]
impl UpdateStore for Database {
    async fn create_update(
        &self,
        data_source: DataSourceId,
        update: &NewUpdate,
    ) -> Result<UpdateRecord> {
        let timestamp = update.timestamp.timestamp();
        let state = UpdateState::Scheduled;

        let mut tx = self.pool.begin().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to begin transaction: {}",
                e
            )))
        })?;

        let result = sqlx::query(
            r#"
            INSERT INTO data_source_updates (data_source_id, state, timestamp, url)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(data_source)
        .bind(state.to_i32())
        .bind(timestamp)
        .bind(&update.url)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to insert update: {}",
                e
            )))
        })?;

        let id = result.last_insert_rowid();

        let attached = sqlx::query("UPDATE data_sources SET current_update_id = ? WHERE id = ?")
            .bind(id)
            .bind(data_source)
            .execute(&mut *tx)
            .await
            .map_err(|e| {
                Error::Database(DatabaseError::QueryFailed(format!(
                    "Failed to set current update: {}",
                    e
                )))
            })?;

        if attached.rows_affected() == 0 {
            // tx is rolled back on drop
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "data source {}",
                data_source
            ))));
        }

        tx.commit().await.map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to commit update creation: {}",
                e
            )))
        })?;

        // Built from the stored representation so it compares equal to a re-read
        Ok(UpdateRow {
            id,
            data_source_id: data_source.get(),
            state: state.to_i32(),
            timestamp,
            url: update.url.clone(),
            download_time: None,
            file_path: None,
            error_message: None,
        }
        .into())
    }

    async fn save_update(&self, update: &UpdateRecord) -> Result<()> {
        let file_path = update
            .file_path
            .as_ref()
            .map(|p| p.to_string_lossy().into_owned());

        let result = sqlx::query(
            r#"
            UPDATE data_source_updates
            SET state = ?, download_time = ?, file_path = ?, error_message = ?
            WHERE id = ?
            "#,
        )
        .bind(update.state.to_i32())
        .bind(update.download_time.map(|d| d.as_secs_f64()))
        .bind(file_path)
        .bind(&update.error_message)
        .bind(update.id)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            Error::Database(DatabaseError::QueryFailed(format!(
                "Failed to save update: {}",
                e
            )))
        })?;

        if result.rows_affected() == 0 {
            return Err(Error::Database(DatabaseError::NotFound(format!(
                "update {}",
                update.id
            ))));
        }

        Ok(())
    }

    async fn current_update(&self, data_source: DataSourceId) -> Result<Option<UpdateId>> {
        let current: Option<Option<UpdateId>> =
            sqlx::query_scalar("SELECT current_update_id FROM data_sources WHERE id = ?")
                .bind(data_source)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| {
                    Error::Database(DatabaseError::QueryFailed(format!(
                        "Failed to get current update: {}",
                        e
                    )))
                })?;

        match current {
            Some(update) => Ok(update),
            None => Err(Error::Database(DatabaseError::NotFound(format!(
                "data source {}",
                data_source
            )))),
        }
    }
}
