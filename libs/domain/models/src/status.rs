// [libs/domain/models/src/status.rs]
/*!
 * =================================================================
 * APARATO: BUFFER STATUS DTO
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: RADIOGRAFÍA SERIALIZABLE DEL DOBLE BUFFER
 * =================================================================
 */

use serde::Serialize;

/// Estado observable de un slot de segmento.
#[derive(Debug, Clone, Serialize)]
pub struct SegmentSlotStatus {
    pub min: i64,
    pub max: i64,
    /// Último valor entregado; `min - 1` si el slot está intacto.
    pub cursor: i64,
    pub usage_ratio: f64,
    pub remaining: i64,
}

/// Radiografía completa del buffer dual de una etiqueta.
#[derive(Debug, Clone, Serialize)]
pub struct BufferStatus {
    pub biz_tag: String,
    pub current_pos: usize,
    pub next_ready: bool,
    pub init_ok: bool,
    /// Paso efectivo que regirá la próxima recarga.
    pub step: i32,
    pub slots: [Option<SegmentSlotStatus>; 2],
}
