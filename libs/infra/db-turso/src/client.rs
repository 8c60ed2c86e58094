// [libs/infra/db-turso/src/client.rs]
/*!
 * =================================================================
 * APARATO: LEDGER CONNECTION CLIENT
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GESTIÓN DE ENLACES AL SUSTRATO libSQL Y BOOTSTRAP
 *
 * En modo RAM el cliente conserva una conexión ancla viva: sin ella,
 * SQLite purga la base compartida al cerrar el último handle y el
 * esquema dejaría de ser visible entre hilos.
 * =================================================================
 */

use crate::errors::LedgerError;
use crate::schema::apply_leaf_schema;
use libsql::{Builder, Connection, Database};
use seqforge_domain_models::config::ConnectionTarget;
use std::sync::Arc;
use tracing::{error, info};

#[derive(Clone)]
pub struct LedgerClient {
    internal_database_driver: Arc<Database>,
    _memory_persistence_anchor: Option<Arc<Connection>>,
}

impl LedgerClient {
    /// Establece el enlace con el sustrato resuelto por la configuración
    /// y aplica el bootstrap idempotente del esquema `leaf_alloc`.
    pub async fn connect(target: &ConnectionTarget) -> Result<Self, LedgerError> {
        let database_driver = match target {
            ConnectionTarget::Remote { url, auth_token } => {
                let token = auth_token.clone().ok_or_else(|| {
                    LedgerError::ConfigurationError("remote access token missing".into())
                })?;
                info!("🔌 [LEDGER]: Initiating remote link to [{}]", url);
                Builder::new_remote(url.clone(), token).build().await
            }
            ConnectionTarget::Memory(url) => {
                info!("🔌 [LEDGER]: Igniting shared-memory ledger [{}]", url);
                Builder::new_local(url.as_str()).build().await
            }
            ConnectionTarget::LocalFile(path) => {
                info!("🔌 [LEDGER]: Opening local ledger file [{}]", path);
                Builder::new_local(path.as_str()).build().await
            }
        }
        .map_err(|fault| LedgerError::ConnectionError(format!("DRIVER_IGNITION_FAILURE: {fault}")))?;

        let shared_driver = Arc::new(database_driver);
        let mut anchor = None;

        if matches!(target, ConnectionTarget::Memory(_)) {
            // El ancla se abre ANTES de cualquier otra operación y el
            // esquema se aplica sobre ella para fijar el segmento compartido.
            let anchor_connection = shared_driver
                .connect()
                .map_err(|fault| LedgerError::ConnectionError(format!("ANCHOR_FAULT: {fault}")))?;
            apply_leaf_schema(&anchor_connection)
                .await
                .map_err(|fault| LedgerError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {fault}")))?;
            anchor = Some(Arc::new(anchor_connection));
            info!("⚓ [LEDGER]: Memory strata solidified and anchored.");
        } else {
            let bootstrap_connection = shared_driver
                .connect()
                .map_err(|fault| LedgerError::ConnectionError(format!("BOOTSTRAP_LINK_FAULT: {fault}")))?;
            apply_leaf_schema(&bootstrap_connection)
                .await
                .map_err(|fault| LedgerError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {fault}")))?;
        }

        Ok(Self {
            internal_database_driver: shared_driver,
            _memory_persistence_anchor: anchor,
        })
    }

    /// Re-aplica el bootstrap de esquema. Idempotente por construcción.
    pub async fn ensure_schema(&self) -> Result<(), LedgerError> {
        let connection = self.connection()?;
        apply_leaf_schema(&connection)
            .await
            .map_err(|fault| LedgerError::ConnectionError(format!("SCHEMA_SYNC_FAULT: {fault}")))
    }

    /// Entrega un handle de conexión ligero al ledger.
    pub fn connection(&self) -> Result<Connection, LedgerError> {
        self.internal_database_driver.connect().map_err(|fault| {
            error!("⚠️ [LEDGER_FAULT]: Connection allocation failed: {}", fault);
            LedgerError::ConnectionError(fault.to_string())
        })
    }
}
// FIN DEL ARCHIVO [libs/infra/db-turso/src/client.rs]
