// [libs/domain/models/src/metrics.rs]
/*!
 * =================================================================
 * APARATO: METRICS SNAPSHOT DTO
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: INSTANTÁNEA SERIALIZABLE DEL PANÓPTICO POR ETIQUETA
 * =================================================================
 */

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Instantánea de contadores de una etiqueta, derivada bajo demanda.
///
/// Invariante de lectura: `total_requests = success_requests + failed_requests`
/// en todo punto de observación.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub biz_tag: String,
    pub total_requests: u64,
    pub success_requests: u64,
    pub failed_requests: u64,
    pub segment_loads: u64,
    pub buffer_switches: u64,
    pub refill_errors: u64,
    /// Peticiones por segundo promediadas desde la creación del contador.
    pub average_qps: f64,
    /// `success / max(total, 1)`.
    pub success_rate: f64,
    pub last_update: DateTime<Utc>,
}
