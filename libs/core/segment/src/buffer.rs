// [libs/core/segment/src/buffer.rs]
/*!
 * =================================================================
 * APARATO: DUAL BUFFER COORDINATOR
 * CLASIFICACIÓN: DOMAIN CORE (ESTRATO L2)
 * RESPONSABILIDAD: ESTADO DE ASIGNACIÓN POR ETIQUETA (SLOT ACTIVO + PREFETCH)
 *
 * Política de bloqueo: todo campo mutable salvo el cursor interno de cada
 * segmento pasa por el RwLock del buffer. El cursor se muta únicamente
 * mediante la primitiva atómica del propio segmento.
 * =================================================================
 */

use crate::errors::SegmentFault;
use crate::segment::Segment;
use chrono::{DateTime, Utc};
use seqforge_domain_models::status::BufferStatus;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};
use tracing::debug;

/// Campos coordinados del buffer; viven bajo el RwLock.
struct BufferInner {
    slots: [Option<Arc<Segment>>; 2],
    current_pos: usize,
    next_ready: bool,
    init_ok: bool,
    /// Paso efectivo que regirá la próxima recarga.
    step: i32,
    /// Verdadero tras un `update_step` manual: la próxima recarga usa el
    /// paso tal cual, sin pasar por el controlador adaptativo.
    manual_step_pending: bool,
    update_time: DateTime<Utc>,
    /// Instante de la última recarga confirmada; alimenta la adaptación.
    last_refill_at: Option<Instant>,
}

/// Estado de asignación de una etiqueta: dos slots de segmento, bit de
/// swap y banderas de inicialización/precarga.
pub struct SegmentBuffer {
    key: String,
    inner: RwLock<BufferInner>,
    /// Última actividad (epoch segundos); contabilidad para el reaper.
    last_access_epoch_seconds: AtomicI64,
}

/// Base de cálculo para la próxima recarga.
#[derive(Debug, Clone, Copy)]
pub struct RefillBasis {
    pub step: i32,
    pub manual_override: bool,
    pub elapsed_since_last_refill: Option<Duration>,
}

impl SegmentBuffer {
    pub fn new(key: impl Into<String>, initial_step: i32) -> Self {
        Self {
            key: key.into(),
            inner: RwLock::new(BufferInner {
                slots: [None, None],
                current_pos: 0,
                next_ready: false,
                init_ok: false,
                step: initial_step,
                manual_step_pending: false,
                update_time: Utc::now(),
                last_refill_at: None,
            }),
            last_access_epoch_seconds: AtomicI64::new(Utc::now().timestamp()),
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Segmento activo, si existe.
    pub fn current(&self) -> Option<Arc<Segment>> {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        guard.slots[guard.current_pos].clone()
    }

    /// Slot inactivo (el destino de la precarga).
    pub fn next_slot(&self) -> Option<Arc<Segment>> {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        guard.slots[1 - guard.current_pos].clone()
    }

    /// Intenta una asignación sobre el segmento activo.
    pub fn get_id(&self) -> Result<i64, SegmentFault> {
        let active_segment = {
            let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
            if !guard.init_ok {
                return Err(SegmentFault::NotAvailable);
            }
            guard.slots[guard.current_pos]
                .clone()
                .ok_or(SegmentFault::NotAvailable)?
        };
        active_segment.next_value().ok_or(SegmentFault::NotAvailable)
    }

    /// Instala el primer segmento tras el bootstrap de la etiqueta.
    pub fn install_first(&self, segment: Segment, effective_step: i32) {
        let mut guard = self.inner.write().expect("BUFFER_LOCK_POISONED");
        guard.slots[0] = Some(Arc::new(segment));
        guard.slots[1] = None;
        guard.current_pos = 0;
        guard.next_ready = false;
        guard.init_ok = true;
        guard.step = effective_step;
        guard.manual_step_pending = false;
        guard.update_time = Utc::now();
        guard.last_refill_at = Some(Instant::now());
    }

    /// Escribe el slot inactivo y levanta `next_ready`.
    pub fn set_next_segment(&self, segment: Segment, effective_step: i32) {
        let mut guard = self.inner.write().expect("BUFFER_LOCK_POISONED");
        let inactive_position = 1 - guard.current_pos;
        guard.slots[inactive_position] = Some(Arc::new(segment));
        guard.next_ready = true;
        guard.step = effective_step;
        guard.manual_step_pending = false;
        guard.update_time = Utc::now();
        guard.last_refill_at = Some(Instant::now());
    }

    /// Conmuta al slot precargado si el activo está agotado y el inactivo
    /// listo. La verificación y el swap ocurren bajo el mismo write lock,
    /// de modo que dos llamadores concurrentes no conmutan dos veces.
    pub fn switch_to_next(&self) -> bool {
        let mut guard = self.inner.write().expect("BUFFER_LOCK_POISONED");
        let current_unavailable = guard.slots[guard.current_pos]
            .as_ref()
            .map_or(true, |segment| !segment.is_available());
        if !(current_unavailable && guard.next_ready) {
            return false;
        }
        guard.current_pos = 1 - guard.current_pos;
        guard.next_ready = false;
        guard.update_time = Utc::now();
        debug!("🔁 [BUFFER]: Tag [{}] switched to slot {}.", self.key, guard.current_pos);
        true
    }

    /// `init_ok ∧ current ≠ nil ∧ uso ≥ umbral ∧ ¬next_ready`.
    pub fn should_preload(&self, threshold: f64) -> bool {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        if !guard.init_ok || guard.next_ready {
            return false;
        }
        guard.slots[guard.current_pos]
            .as_ref()
            .map_or(false, |segment| segment.is_nearly_exhausted(threshold))
    }

    /// `(current agotado ∨ ausente) ∧ next_ready`.
    pub fn can_switch_to_next(&self) -> bool {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        let current_unavailable = guard.slots[guard.current_pos]
            .as_ref()
            .map_or(true, |segment| !segment.is_available());
        current_unavailable && guard.next_ready
    }

    pub fn is_initialized(&self) -> bool {
        self.inner.read().expect("BUFFER_LOCK_POISONED").init_ok
    }

    pub fn step(&self) -> i32 {
        self.inner.read().expect("BUFFER_LOCK_POISONED").step
    }

    /// Sobrescritura manual del paso: rige la próxima recarga tal cual.
    pub fn apply_manual_step(&self, step: i32) {
        let mut guard = self.inner.write().expect("BUFFER_LOCK_POISONED");
        guard.step = step;
        guard.manual_step_pending = true;
        guard.update_time = Utc::now();
    }

    /// Base para que el controlador adaptativo decida el próximo paso.
    pub fn refill_basis(&self) -> RefillBasis {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        RefillBasis {
            step: guard.step,
            manual_override: guard.manual_step_pending,
            elapsed_since_last_refill: guard.last_refill_at.map(|instant| instant.elapsed()),
        }
    }

    /// Radiografía completa para el estrato de observabilidad.
    pub fn status(&self) -> BufferStatus {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        BufferStatus {
            biz_tag: self.key.clone(),
            current_pos: guard.current_pos,
            next_ready: guard.next_ready,
            init_ok: guard.init_ok,
            step: guard.step,
            slots: [
                guard.slots[0].as_ref().map(|segment| segment.slot_status()),
                guard.slots[1].as_ref().map(|segment| segment.slot_status()),
            ],
        }
    }

    /// Marca temporal del último cambio estructural (instalación, swap o
    /// sobrescritura de paso).
    pub fn last_update_time(&self) -> DateTime<Utc> {
        self.inner.read().expect("BUFFER_LOCK_POISONED").update_time
    }

    /// Sella la marca de actividad; el reaper respeta buffers recientes.
    pub fn note_access(&self) {
        self.last_access_epoch_seconds
            .store(Utc::now().timestamp(), Ordering::Release);
    }

    /// Segundos transcurridos desde la última actividad observada.
    pub fn idle_seconds(&self) -> i64 {
        (Utc::now().timestamp() - self.last_access_epoch_seconds.load(Ordering::Acquire)).max(0)
    }
}

impl std::fmt::Debug for SegmentBuffer {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let guard = self.inner.read().expect("BUFFER_LOCK_POISONED");
        formatter
            .debug_struct("SegmentBuffer")
            .field("key", &self.key)
            .field("current_pos", &guard.current_pos)
            .field("next_ready", &guard.next_ready)
            .field("init_ok", &guard.init_ok)
            .field("step", &guard.step)
            .finish()
    }
}
// FIN DEL ARCHIVO [libs/core/segment/src/buffer.rs]
