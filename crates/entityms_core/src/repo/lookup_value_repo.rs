//! SQLite repository for `t_lookup_value` rows.

use crate::model::entity::EntityId;
use crate::model::lookup_value::LookupValue;
use crate::repo::sqlite::SqliteStore;
use crate::repo::{LookupValueRepository, RepoError, RepoResult};
use async_trait::async_trait;
use futures::stream::BoxStream;
use rusqlite::{params, Row};

/// Lookup value persistence over a shared [`SqliteStore`].
#[derive(Clone)]
pub struct SqliteLookupValueRepository {
    store: SqliteStore,
}

impl SqliteLookupValueRepository {
    pub fn new(store: SqliteStore) -> Self {
        Self { store }
    }
}

#[async_trait]
impl LookupValueRepository for SqliteLookupValueRepository {
    async fn save(&self, value: LookupValue) -> RepoResult<LookupValue> {
        self.store
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO t_lookup_value (lv_entity_id, lv_value_type, lv_value, lv_position)
                     VALUES (?1, ?2, ?3, ?4);",
                    params![
                        value.entity_id,
                        value.value_type.as_str(),
                        value.value.as_str(),
                        value.position,
                    ],
                )?;
                Ok(value.with_id(conn.last_insert_rowid()))
            })
            .await
    }

    fn find_by_entity_id(&self, entity_id: EntityId) -> BoxStream<'static, RepoResult<LookupValue>> {
        self.store.stream_rows(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT lv_id, lv_entity_id, lv_value_type, lv_value, lv_position
                 FROM t_lookup_value
                 WHERE lv_entity_id = ?1
                 ORDER BY lv_value_type ASC, lv_position ASC, lv_id ASC;",
            )?;
            let mut rows = stmt.query([entity_id])?;
            let mut values = Vec::new();
            while let Some(row) = rows.next()? {
                values.push(parse_lookup_row(row)?);
            }
            Ok(values)
        })
    }
}

fn parse_lookup_row(row: &Row<'_>) -> RepoResult<LookupValue> {
    let position: i64 = row.get("lv_position")?;
    let position = u32::try_from(position).map_err(|_| {
        RepoError::InvalidData(format!(
            "invalid position `{position}` in t_lookup_value.lv_position"
        ))
    })?;

    Ok(LookupValue {
        id: Some(row.get("lv_id")?),
        entity_id: row.get("lv_entity_id")?,
        value_type: row.get("lv_value_type")?,
        value: row.get("lv_value")?,
        position,
    })
}
