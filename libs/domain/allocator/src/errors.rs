// [libs/domain/allocator/src/errors.rs]
/*!
 * =================================================================
 * APARATO: ALLOCATOR ERROR CATALOG
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: FALLOS VISIBLES EN LA FRONTERA DEL ASIGNADOR
 * =================================================================
 */

use seqforge_domain_models::config::ConfigFault;
use seqforge_infra_db::LedgerError;
use thiserror::Error;

/// Catálogo de fallos de la superficie pública. `SegmentFault` del núcleo
/// nunca aparece aquí: se resuelve internamente con swap o recarga.
#[derive(Error, Debug)]
pub enum AllocError {
    /// La etiqueta no existe y la política de auto-creación está apagada.
    #[error("[ALLOC_FAULT]: BIZ_TAG_NOT_FOUND")]
    BizTagNotFound,

    /// Alta duplicada de una etiqueta ya registrada.
    #[error("[ALLOC_FAULT]: BIZ_TAG_ALREADY_EXISTS")]
    BizTagAlreadyExists,

    /// Reintentos agotados sin segmento disponible.
    #[error("[ALLOC_FAULT]: BUFFER_NOT_READY")]
    BufferNotReady,

    /// Argumento rechazado en la frontera (conteo, paso, etiqueta).
    #[error("[ALLOC_FAULT]: INVALID_ARGUMENT -> {0}")]
    InvalidArgument(String),

    /// El servicio está apagado por configuración.
    #[error("[SERVICE_FAULT]: SERVICE_DISABLED")]
    ServiceDisabled,

    /// Operación previa a `initialize` o posterior a `stop`/`close`.
    #[error("[SERVICE_FAULT]: SERVICE_NOT_INITIALIZED")]
    ServiceNotInitialized,

    /// Árbol de configuración incoherente.
    #[error("[SERVICE_FAULT]: INVALID_CONFIGURATION -> {0}")]
    Configuration(#[from] ConfigFault),

    /// Fallo de persistencia no transitorio, ya agotados los reintentos.
    #[error("[ALLOC_FAULT]: LEDGER_FAILURE -> {0}")]
    Database(LedgerError),
}

impl From<LedgerError> for AllocError {
    fn from(fault: LedgerError) -> Self {
        match fault {
            LedgerError::TagNotFound => AllocError::BizTagNotFound,
            LedgerError::DuplicateTag => AllocError::BizTagAlreadyExists,
            other => AllocError::Database(other),
        }
    }
}
