//! SQLite repository for `t_thing` rows.

use crate::model::thing::ThingEntity;
use crate::repo::lookup_value_repo::SqliteLookupValueRepository;
use crate::repo::sqlite::{SqliteStore, SqliteWriteTransaction};
use crate::repo::{EntityRepository, RepoError, RepoResult, WriteScope, WriteTransaction};
use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::sync::Arc;

const THING_SELECT_SQL: &str = "SELECT
    th_id,
    th_guid,
    th_type,
    th_name,
    th_created_on,
    th_updated_on,
    th_version
FROM t_thing";

/// Thing persistence over a shared [`SqliteStore`].
#[derive(Clone)]
pub struct SqliteThingRepository {
    store: SqliteStore,
}

impl SqliteThingRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl EntityRepository<ThingEntity> for SqliteThingRepository {
    async fn save(&self, entity: ThingEntity) -> RepoResult<ThingEntity> {
        if entity.guid.trim().is_empty() {
            return Err(RepoError::InvalidData(
                "thing guid must be assigned before save".to_string(),
            ));
        }

        self.store
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO t_thing (th_guid, th_type, th_name, th_version)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        entity.guid.as_str(),
                        entity.entity_type.as_str(),
                        entity.name.as_str(),
                        entity.version,
                    ],
                )?;
                let id = conn.last_insert_rowid();
                load_by_id(conn, id)?.ok_or_else(|| {
                    RepoError::InvalidData(format!("thing {id} missing after insert"))
                })
            })
            .await
    }

    async fn find_by_guid(&self, guid: &str) -> RepoResult<Option<ThingEntity>> {
        let guid = guid.to_string();
        self.store
            .call(move |conn| {
                let mut stmt = conn.prepare(&format!("{THING_SELECT_SQL} WHERE th_guid = ?1;"))?;
                let row = stmt
                    .query_row([guid.as_str()], parse_thing_row)
                    .optional()?;
                Ok(row)
            })
            .await
    }

    fn find_all(&self) -> BoxStream<'static, RepoResult<ThingEntity>> {
        self.store.stream_rows(|conn| {
            let mut stmt = conn.prepare(&format!("{THING_SELECT_SQL} ORDER BY th_id ASC;"))?;
            let things = stmt
                .query_map([], parse_thing_row)?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(things)
        })
    }
}

/// Thing creations on this store run in one exclusive session.
#[async_trait]
impl WriteScope<ThingEntity> for SqliteStore {
    async fn begin(&self) -> RepoResult<Box<dyn WriteTransaction<ThingEntity>>> {
        let session = self.begin_session().await?;
        let bound = session.store();
        Ok(Box::new(SqliteWriteTransaction::new(
            session,
            Arc::new(SqliteThingRepository::new(bound.clone())),
            Arc::new(SqliteLookupValueRepository::new(bound)),
        )))
    }
}

fn load_by_id(conn: &Connection, id: i64) -> RepoResult<Option<ThingEntity>> {
    let mut stmt = conn.prepare(&format!("{THING_SELECT_SQL} WHERE th_id = ?1;"))?;
    Ok(stmt.query_row([id], parse_thing_row).optional()?)
}

fn parse_thing_row(row: &Row<'_>) -> rusqlite::Result<ThingEntity> {
    Ok(ThingEntity {
        id: Some(row.get("th_id")?),
        guid: row.get("th_guid")?,
        entity_type: row.get("th_type")?,
        name: row.get("th_name")?,
        created_on: row.get("th_created_on")?,
        updated_on: row.get("th_updated_on")?,
        version: row.get("th_version")?,
    })
}
