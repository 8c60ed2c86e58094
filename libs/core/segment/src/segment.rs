// [libs/core/segment/src/segment.rs]
/*!
 * =================================================================
 * APARATO: SEGMENT WINDOW CORE
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: VENTANA RESERVADA `[min, max]` CON CURSOR ATÓMICO
 * =================================================================
 */

use seqforge_domain_models::status::SegmentSlotStatus;
use std::sync::atomic::{AtomicI64, Ordering};

/// Ventana inmutable de identificadores reservados por un bump confirmado.
///
/// Invariantes: `min ≤ max`; `max - min + 1 ≤ step`; el cursor arranca en
/// `min - 1` y jamás supera `max`. Cada asignación en régimen estable es
/// una única operación atómica, sin lock ni syscall.
pub struct Segment {
    min: i64,
    max: i64,
    /// Paso con el que se acuñó la ventana; se conserva para reporte.
    step: i32,
    cursor: AtomicI64,
    init_ok: bool,
}

impl Segment {
    pub fn new(min: i64, max: i64, step: i32) -> Self {
        debug_assert!(min <= max, "ventana invertida: [{min}, {max}]");
        Self {
            min,
            max,
            step,
            cursor: AtomicI64::new(min - 1),
            init_ok: true,
        }
    }

    /// Entrega el siguiente identificador de la ventana, o `None` si está
    /// agotada. El bucle CAS garantiza que el cursor nunca rebase `max`,
    /// incluso bajo contención de múltiples hilos.
    pub fn next_value(&self) -> Option<i64> {
        let mut observed = self.cursor.load(Ordering::Acquire);
        loop {
            if observed >= self.max {
                return None;
            }
            match self.cursor.compare_exchange_weak(
                observed,
                observed + 1,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Some(observed + 1),
                Err(actual) => observed = actual,
            }
        }
    }

    pub fn is_available(&self) -> bool {
        self.init_ok && self.cursor.load(Ordering::Acquire) < self.max
    }

    /// Fracción consumida de la ventana, acotada a `[0, 1]`.
    pub fn usage_ratio(&self) -> f64 {
        let consumed = (self.cursor.load(Ordering::Acquire) - self.min + 1) as f64;
        let capacity = (self.max - self.min + 1) as f64;
        (consumed / capacity).clamp(0.0, 1.0)
    }

    /// Identificadores aún servibles.
    pub fn remaining(&self) -> i64 {
        (self.max - self.cursor.load(Ordering::Acquire)).max(0)
    }

    /// Verdadero cuando el consumo alcanzó el umbral de precarga.
    pub fn is_nearly_exhausted(&self, threshold: f64) -> bool {
        self.usage_ratio() >= threshold
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max_value(&self) -> i64 {
        self.max
    }

    pub fn step(&self) -> i32 {
        self.step
    }

    pub fn current_cursor(&self) -> i64 {
        self.cursor.load(Ordering::Acquire)
    }

    /// Radiografía del slot para el estrato de observabilidad.
    pub fn slot_status(&self) -> SegmentSlotStatus {
        SegmentSlotStatus {
            min: self.min,
            max: self.max,
            cursor: self.current_cursor(),
            usage_ratio: self.usage_ratio(),
            remaining: self.remaining(),
        }
    }
}

impl std::fmt::Debug for Segment {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter
            .debug_struct("Segment")
            .field("min", &self.min)
            .field("max", &self.max)
            .field("step", &self.step)
            .field("cursor", &self.current_cursor())
            .finish()
    }
}
