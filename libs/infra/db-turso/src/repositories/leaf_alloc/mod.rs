// [libs/infra/db-turso/src/repositories/leaf_alloc/mod.rs]
/*!
 * =================================================================
 * APARATO: LEAF ALLOC REPOSITORY
 * CLASIFICACIÓN: INFRASTRUCTURE ADAPTER (ESTRATO L3)
 * RESPONSABILIDAD: AUTORIDAD ÚNICA SOBRE LA TABLA `leaf_alloc`
 *
 * El bump se ejecuta en una única transacción IMMEDIATE: dos
 * invocaciones concurrentes sobre la misma etiqueta serializan y
 * producen ventanas disjuntas `[m+1, m+s]` y `[m+s+1, m+2s]`.
 * =================================================================
 */

pub mod queries;

use crate::client::LedgerClient;
use crate::errors::LedgerError;
use chrono::NaiveDateTime;
use libsql::{params, Row, Transaction, TransactionBehavior};
use seqforge_domain_models::LeafAlloc;
use tracing::{debug, info, instrument, warn};

use self::queries as sql_registry;

/// Repositorio de autoridad única para el contador durable por etiqueta.
pub struct LeafAllocRepository {
    ledger_client: LedgerClient,
}

impl LeafAllocRepository {
    #[must_use]
    pub fn new(ledger_client: LedgerClient) -> Self {
        Self { ledger_client }
    }

    /// Lectura plana sin candado.
    ///
    /// # Errors:
    /// - `LedgerError::TagNotFound`: la etiqueta no existe en el ledger.
    pub async fn fetch(&self, biz_tag: &str) -> Result<LeafAlloc, LedgerError> {
        let connection = self.ledger_client.connection()?;
        let mut query_result = connection
            .query(sql_registry::SELECT_LEAF_ALLOC, params![biz_tag])
            .await?;
        match query_result.next().await? {
            Some(data_row) => map_row_to_leaf_alloc(&data_row),
            None => Err(LedgerError::TagNotFound),
        }
    }

    /// Lectura bajo el candado de escritura de una transacción IMMEDIATE
    /// ya abierta. Debe invocarse únicamente dentro del bump.
    pub async fn fetch_for_update(
        &self,
        bump_transaction: &Transaction,
        biz_tag: &str,
    ) -> Result<LeafAlloc, LedgerError> {
        let mut query_result = bump_transaction
            .query(sql_registry::SELECT_LEAF_ALLOC_FOR_BUMP, params![biz_tag])
            .await?;
        match query_result.next().await? {
            Some(data_row) => map_row_to_leaf_alloc(&data_row),
            None => Err(LedgerError::TagNotFound),
        }
    }

    /// LA TRANSACCIÓN CRÍTICA: reserva atómica de una nueva ventana.
    ///
    /// Secuencia indivisible: candado de fila vía BEGIN IMMEDIATE,
    /// `new_max = max_id + step` con guarda de desbordamiento, sellado de
    /// `max_id`/`step`/`update_time` y retorno de la post-imagen.
    ///
    /// # Errors:
    /// - `LedgerError::TagNotFound`: la etiqueta no existe.
    /// - `LedgerError::CounterOverflow`: el bump rebasaría i64::MAX.
    /// - `LedgerError::TransactionError`: colapso del sellado atómico.
    #[instrument(skip(self))]
    pub async fn bump_max_id(&self, biz_tag: &str, step: i32) -> Result<LeafAlloc, LedgerError> {
        let connection = self.ledger_client.connection()?;
        let bump_transaction = connection
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .await
            .map_err(|_| LedgerError::TransactionError)?;

        let pre_image = self.fetch_for_update(&bump_transaction, biz_tag).await?;

        let new_max = pre_image
            .max_id
            .checked_add(i64::from(step))
            .ok_or(LedgerError::CounterOverflow)?;

        bump_transaction
            .execute(
                sql_registry::APPLY_BUMP,
                params![biz_tag, new_max, i64::from(step)],
            )
            .await?;

        let post_image = self.fetch_for_update(&bump_transaction, biz_tag).await?;

        bump_transaction
            .commit()
            .await
            .map_err(|_| LedgerError::TransactionError)?;

        debug!(
            "⛏️  [LEDGER]: Tag [{}] window minted: ({}, {}].",
            biz_tag, pre_image.max_id, new_max
        );
        Ok(post_image)
    }

    /// Alta de una etiqueta con contador en 0.
    ///
    /// # Errors:
    /// - `LedgerError::DuplicateTag`: la clave primaria ya existe.
    pub async fn create(
        &self,
        biz_tag: &str,
        step: i32,
        description: &str,
    ) -> Result<(), LedgerError> {
        let connection = self.ledger_client.connection()?;
        let insert_result = connection
            .execute(
                sql_registry::INSERT_LEAF_ALLOC,
                params![biz_tag, i64::from(step), description],
            )
            .await;

        match insert_result {
            Ok(_) => {
                info!("🌱 [LEDGER]: Tag [{}] registered with step {}.", biz_tag, step);
                Ok(())
            }
            Err(fault) if fault.to_string().contains("UNIQUE constraint failed") => {
                Err(LedgerError::DuplicateTag)
            }
            Err(fault) => Err(LedgerError::QueryError(fault)),
        }
    }

    /// Actualiza el paso persistido. El paso en RAM se recoge en la
    /// próxima recarga del buffer.
    pub async fn update_step(&self, biz_tag: &str, step: i32) -> Result<(), LedgerError> {
        let connection = self.ledger_client.connection()?;
        let rows_affected_count = connection
            .execute(sql_registry::UPDATE_STEP, params![biz_tag, i64::from(step)])
            .await?;
        if rows_affected_count == 0 {
            warn!("⚠️  [LEDGER]: Step update rejected, tag [{}] is void.", biz_tag);
            return Err(LedgerError::TagNotFound);
        }
        Ok(())
    }

    /// Baja definitiva de la etiqueta.
    pub async fn delete(&self, biz_tag: &str) -> Result<(), LedgerError> {
        let connection = self.ledger_client.connection()?;
        let rows_affected_count = connection
            .execute(sql_registry::DELETE_LEAF_ALLOC, params![biz_tag])
            .await?;
        if rows_affected_count == 0 {
            return Err(LedgerError::TagNotFound);
        }
        info!("🗑️  [LEDGER]: Tag [{}] purged from the ledger.", biz_tag);
        Ok(())
    }

    /// Inventario de etiquetas conocidas.
    pub async fn list_tags(&self) -> Result<Vec<String>, LedgerError> {
        let connection = self.ledger_client.connection()?;
        let mut query_result = connection.query(sql_registry::LIST_BIZ_TAGS, ()).await?;
        let mut tag_inventory = Vec::new();
        while let Some(data_row) = query_result.next().await? {
            tag_inventory.push(data_row.get::<String>(0)?);
        }
        Ok(tag_inventory)
    }

    /// Lectura multi-fila; las etiquetas ausentes se omiten del resultado.
    pub async fn batch_fetch(&self, biz_tags: &[String]) -> Result<Vec<LeafAlloc>, LedgerError> {
        let mut found_rows = Vec::with_capacity(biz_tags.len());
        for biz_tag in biz_tags {
            match self.fetch(biz_tag).await {
                Ok(row) => found_rows.push(row),
                Err(LedgerError::TagNotFound) => continue,
                Err(fault) => return Err(fault),
            }
        }
        Ok(found_rows)
    }
}

/// Transforma una fila SQL en la entidad de dominio.
fn map_row_to_leaf_alloc(data_row: &Row) -> Result<LeafAlloc, LedgerError> {
    let biz_tag: String = data_row.get(0)?;
    let max_id: i64 = data_row.get(1)?;
    let step_raw: i64 = data_row.get(2)?;
    let step = i32::try_from(step_raw)
        .map_err(|_| LedgerError::MappingError(format!("step fuera de rango: {step_raw}")))?;

    let description = data_row.get::<Option<String>>(3)?;

    let update_time = data_row
        .get::<Option<String>>(4)
        .ok()
        .flatten()
        .and_then(|raw_timestamp| parse_sqlite_timestamp(&raw_timestamp));

    let auto_clean_raw: i64 = data_row.get(5)?;
    let auto_clean = i32::try_from(auto_clean_raw)
        .map_err(|_| LedgerError::MappingError(format!("auto_clean fuera de rango: {auto_clean_raw}")))?;

    Ok(LeafAlloc {
        biz_tag,
        max_id,
        step,
        description,
        update_time,
        auto_clean,
    })
}

/// `CURRENT_TIMESTAMP` de SQLite llega como texto `YYYY-MM-DD HH:MM:SS`.
fn parse_sqlite_timestamp(raw_timestamp: &str) -> Option<chrono::DateTime<chrono::Utc>> {
    NaiveDateTime::parse_from_str(raw_timestamp, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|naive| naive.and_utc())
}
// FIN DEL ARCHIVO [libs/infra/db-turso/src/repositories/leaf_alloc/mod.rs]
