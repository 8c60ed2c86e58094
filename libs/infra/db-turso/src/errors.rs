// [libs/infra/db-turso/src/errors.rs]
/*!
 * =================================================================
 * APARATO: LEDGER ERROR CATALOG
 * CLASIFICACIÓN: INFRASTRUCTURE CORE (ESTRATO L3)
 * RESPONSABILIDAD: CATALOGACIÓN SEMÁNTICA DE FALLOS DE PERSISTENCIA
 * =================================================================
 */

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    /// Error de enlace físico o de red con el sustrato libSQL.
    #[error("[LEDGER_NET_FAULT]: DATABASE_UPLINK_SEVERED -> {0}")]
    ConnectionError(String),

    /// Configuración de conexión incompleta o malformada.
    #[error("[LEDGER_CONFIG_FAULT]: CONNECTION_COORDINATES_VOID -> {0}")]
    ConfigurationError(String),

    /// Error de sintaxis o ejecución devuelto por el motor libSQL.
    #[error("[LEDGER_QUERY_FAULT]: SQL_QUERY_REJECTED -> {0}")]
    QueryError(#[from] libsql::Error),

    /// Fallo en la transformación de tipos entre SQLite y el dominio.
    #[error("[LEDGER_MAPPING_FAULT]: DATA_MAPPING_VIOLATION -> {0}")]
    MappingError(String),

    /// Colapso al sellar una secuencia transaccional.
    #[error("[LEDGER_TX_FAULT]: TRANSACTION_COLLAPSE")]
    TransactionError,

    /// La etiqueta de negocio no existe en el ledger.
    #[error("[LEDGER_TAG_FAULT]: BIZ_TAG_NOT_FOUND")]
    TagNotFound,

    /// Inserción rechazada por clave primaria duplicada.
    #[error("[LEDGER_TAG_FAULT]: BIZ_TAG_ALREADY_EXISTS")]
    DuplicateTag,

    /// El bump desbordaría el contador de 64 bits. Nunca se envuelve en
    /// silencio.
    #[error("[LEDGER_TAG_FAULT]: MAX_ID_COUNTER_OVERFLOW")]
    CounterOverflow,
}

impl LedgerError {
    /// Clases transitorias: el asignador las reintenta con backoff
    /// acotado antes de propagarlas.
    pub fn is_transient(&self) -> bool {
        match self {
            LedgerError::QueryError(inner) => {
                let message = inner.to_string();
                message.contains("database is locked")
                    || message.contains("database table is locked")
                    || message.contains("busy")
            }
            LedgerError::TransactionError => true,
            _ => false,
        }
    }
}
