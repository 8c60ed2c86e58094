// [libs/domain/models/src/alloc.rs]
/*!
 * =================================================================
 * APARATO: LEAF ALLOC ENTITY
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: IMAGEN EN RAM DE UNA FILA DEL LEDGER `leaf_alloc`
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fila persistida del contador durable de un flujo de identificadores.
///
/// `max_id` se interpreta como "el mayor identificador YA reservado";
/// tras un bump exitoso la ventana recién acuñada es
/// `[max_id - step + 1, max_id]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeafAlloc {
    /// Etiqueta de negocio: clave primaria del flujo (≤128 chars imprimibles).
    pub biz_tag: String,

    /// Mayor identificador reservado hasta la fecha. Monótono no decreciente.
    pub max_id: i64,

    /// Granularidad de reserva aplicada en el último bump.
    pub step: i32,

    /// Descripción operativa opcional (≤256 chars).
    pub description: Option<String>,

    /// Marca temporal mantenida por el propio motor SQL.
    pub update_time: Option<DateTime<Utc>>,

    /// Bandera reservada para limpieza futura. Sin comportamiento asociado.
    pub auto_clean: i32,
}

impl LeafAlloc {
    /// Ventana completa reservada por el último bump: `[min, max]`.
    pub fn window(&self) -> (i64, i64) {
        (self.max_id - i64::from(self.step) + 1, self.max_id)
    }

    /// Primer identificador servible de la ventana vigente.
    pub fn first_id_of_window(&self) -> i64 {
        self.window().0
    }
}
