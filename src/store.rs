//! Persistence port for update records

use crate::types::{DataSourceId, UpdateId};
use crate::update::{NewUpdate, UpdateRecord};
use async_trait::async_trait;

/// Storage the lifecycle manager writes update records through
///
/// Business logic mutates plain [`UpdateRecord`] values and hands them to the
/// store explicitly; nothing here is implicitly saved.
#[async_trait]
pub trait UpdateStore: Send + Sync {
    /// Insert a `scheduled` record and make it the data source's current update
    ///
    /// Both writes happen together: after this returns, the current update of
    /// `data_source` is the returned record.
    async fn create_update(
        &self,
        data_source: DataSourceId,
        update: &NewUpdate,
    ) -> crate::Result<UpdateRecord>;

    /// Persist state, timing, path and diagnostic fields of a record
    ///
    /// `url` and `timestamp` are fixed at creation and are not rewritten.
    async fn save_update(&self, update: &UpdateRecord) -> crate::Result<()>;

    /// Current update of a data source
    async fn current_update(&self, data_source: DataSourceId) -> crate::Result<Option<UpdateId>>;
}
