// [libs/core/segment/src/errors.rs]

use thiserror::Error;

/// Fallos internos del núcleo de segmentos. Nunca cruzan la frontera del
/// asignador: disparan swap o recarga en el estrato superior.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentFault {
    /// El segmento vigente está agotado o el buffer aún no fue inicializado.
    #[error("[SEGMENT_FAULT]: SEGMENT_NOT_AVAILABLE")]
    NotAvailable,
}
