// [libs/infra/db-turso/src/schema.rs]
/*!
 * =================================================================
 * APARATO: LEAF LEDGER SCHEMA
 * CLASIFICACIÓN: INFRASTRUCTURE LAYER (ESTRATO L3)
 * RESPONSABILIDAD: GOBERNANZA ESTRUCTURAL E IDEMPOTENCIA TOTAL
 * =================================================================
 */

use anyhow::{Context, Result};
use libsql::Connection;
use tracing::debug;

/// Génesis de tablas del ledger de asignación.
///
/// `auto_clean` es una bandera reservada: se persiste con default 0 y no
/// tiene comportamiento asociado.
const LEDGER_TABLES: &[(&str, &str)] = &[(
    "TABLE_LEAF_ALLOC",
    r#"
        CREATE TABLE IF NOT EXISTS leaf_alloc (
            biz_tag     TEXT PRIMARY KEY,
            max_id      INTEGER NOT NULL DEFAULT 0,
            step        INTEGER NOT NULL DEFAULT 1000,
            description TEXT,
            update_time DATETIME DEFAULT CURRENT_TIMESTAMP,
            auto_clean  INTEGER NOT NULL DEFAULT 0
        );
    "#,
)];

/// Índices de aceleración para consultas de mantenimiento.
const LEDGER_INDEXES: &[(&str, &str)] = &[(
    "INDEX_LEAF_ALLOC_UPDATE_TIME",
    r#"
        CREATE INDEX IF NOT EXISTS idx_leaf_alloc_update_time
        ON leaf_alloc (update_time);
    "#,
)];

/// Aplica el esquema completo del ledger. Cada sentencia usa
/// `IF NOT EXISTS`, por lo que invocaciones repetidas son inocuas.
pub async fn apply_leaf_schema(connection: &Connection) -> Result<()> {
    for (artifact_name, ddl_statement) in LEDGER_TABLES.iter().chain(LEDGER_INDEXES) {
        connection
            .execute(ddl_statement, ())
            .await
            .with_context(|| format!("DDL_FAULT: {artifact_name}"))?;
        debug!("🏗️  [SCHEMA]: Artifact [{}] levelized.", artifact_name);
    }
    Ok(())
}
