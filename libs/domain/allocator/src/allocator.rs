// [libs/domain/allocator/src/allocator.rs]
/*!
 * =================================================================
 * APARATO: SEGMENT MINT CORE
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: PROTOCOLO DE DOBLE BUFFER, SINGLE-FLIGHT Y RECARGA
 *
 * Invariante de vuelo único: por etiqueta existe a lo sumo una recarga
 * en curso. La precarga y la recarga síncrona compiten por el mismo
 * token (`tokio::sync::Mutex` por etiqueta); la precarga cede si el
 * token está tomado.
 * =================================================================
 */

use crate::adaptive::StepController;
use crate::errors::AllocError;
use crate::metrics::{LeafMetrics, MetricsRegistry};
use seqforge_core_segment::{Segment, SegmentBuffer, SegmentFault};
use seqforge_domain_models::config::LeafTuning;
use seqforge_domain_models::{BufferStatus, LeafAlloc, MetricsSnapshot};
use rand::Rng;
use seqforge_infra_db::{LeafAllocRepository, LedgerClient, LedgerError};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, instrument, warn};

/// Reintentos del bucle de asignación (swap + recarga) antes de rendirse.
const MAX_ALLOCATION_ATTEMPTS: usize = 3;

/// Reintentos del bump ante fallos transitorios del ledger.
const MAX_BUMP_ATTEMPTS: u32 = 3;

/// Base del backoff exponencial entre reintentos de bump.
const BUMP_BACKOFF_BASE_MS: u64 = 40;

/// Cota superior de un lote: evita que una sola llamada acapare el flujo.
const MAX_BATCH_COUNT: u32 = 100_000;

const MAX_TAG_LENGTH: usize = 128;
const MAX_DESCRIPTION_LENGTH: usize = 256;

/// Núcleo del asignador: posee los buffers, los tokens de recarga y el
/// panóptico de métricas. Los observadores externos sólo reciben
/// instantáneas.
pub struct LeafAllocator {
    ledger_client: LedgerClient,
    tuning: LeafTuning,
    default_step: i32,
    step_controller: StepController,
    buffers: RwLock<HashMap<String, Arc<SegmentBuffer>>>,
    refill_gates: RwLock<HashMap<String, Arc<AsyncMutex<()>>>>,
    metrics: MetricsRegistry,
    closed: AtomicBool,
}

impl LeafAllocator {
    pub fn new(ledger_client: LedgerClient, tuning: LeafTuning, default_step: i32) -> Self {
        let step_controller = StepController::new(&tuning);
        Self {
            ledger_client,
            tuning,
            default_step,
            step_controller,
            buffers: RwLock::new(HashMap::new()),
            refill_gates: RwLock::new(HashMap::new()),
            metrics: MetricsRegistry::new(),
            closed: AtomicBool::new(false),
        }
    }

    // ------------------------------------------------------------------
    // SUPERFICIE DE ASIGNACIÓN
    // ------------------------------------------------------------------

    /// Entrega un identificador nuevo y único para la etiqueta.
    #[instrument(skip(self))]
    pub async fn next_id(&self, biz_tag: &str) -> Result<i64, AllocError> {
        self.ensure_open()?;
        validate_tag(biz_tag)?;

        let buffer = self.buffer_handle(biz_tag);
        buffer.note_access();
        let tag_metrics = self.metrics.handle(biz_tag);

        for _attempt in 0..MAX_ALLOCATION_ATTEMPTS {
            match buffer.get_id() {
                Ok(minted_id) => {
                    tag_metrics.record_success();
                    if self.tuning.preload_threshold < 1.0
                        && buffer.should_preload(self.tuning.preload_threshold)
                    {
                        self.spawn_preload(biz_tag, &buffer, &tag_metrics);
                    }
                    return Ok(minted_id);
                }
                Err(SegmentFault::NotAvailable) => {
                    if buffer.switch_to_next() {
                        tag_metrics.record_buffer_switch();
                        continue;
                    }
                    if let Err(fault) = self
                        .synchronous_refill(biz_tag, &buffer, &tag_metrics)
                        .await
                    {
                        tag_metrics.record_failure();
                        return Err(fault);
                    }
                }
            }
        }

        tag_metrics.record_failure();
        Err(AllocError::BufferNotReady)
    }

    /// Entrega `count` identificadores únicos, cruzando fronteras de
    /// segmento de forma transparente.
    pub async fn batch_next_id(&self, biz_tag: &str, count: u32) -> Result<Vec<i64>, AllocError> {
        self.ensure_open()?;
        if count == 0 {
            return Err(AllocError::InvalidArgument("count must be ≥ 1".into()));
        }
        if count > MAX_BATCH_COUNT {
            return Err(AllocError::InvalidArgument(format!(
                "count {count} exceeds the {MAX_BATCH_COUNT} per-call bound"
            )));
        }

        let mut minted_batch = Vec::with_capacity(count as usize);
        for _ in 0..count {
            minted_batch.push(self.next_id(biz_tag).await?);
        }
        Ok(minted_batch)
    }

    // ------------------------------------------------------------------
    // CICLO DE VIDA DE ETIQUETAS
    // ------------------------------------------------------------------

    /// Alta persistida de una etiqueta nueva.
    pub async fn create_biz_tag(
        &self,
        biz_tag: &str,
        step: i32,
        description: &str,
    ) -> Result<(), AllocError> {
        self.ensure_open()?;
        validate_tag(biz_tag)?;
        if step < 1 {
            return Err(AllocError::InvalidArgument(format!("step {step} must be ≥ 1")));
        }
        if description.len() > MAX_DESCRIPTION_LENGTH {
            return Err(AllocError::InvalidArgument(
                "description exceeds 256 chars".into(),
            ));
        }
        self.repository().create(biz_tag, step, description).await?;
        Ok(())
    }

    /// Cambia el paso persistido; el buffer lo aplica en la próxima
    /// recarga sin pasar por el controlador adaptativo.
    pub async fn update_step(&self, biz_tag: &str, step: i32) -> Result<(), AllocError> {
        self.ensure_open()?;
        validate_tag(biz_tag)?;
        if step < self.tuning.min_step_size || step > self.tuning.max_step_size {
            return Err(AllocError::InvalidArgument(format!(
                "step {step} outside [{}, {}]",
                self.tuning.min_step_size, self.tuning.max_step_size
            )));
        }
        self.repository().update_step(biz_tag, step).await?;

        let existing_buffer = self
            .buffers
            .read()
            .expect("BUFFERS_LOCK_POISONED")
            .get(biz_tag)
            .cloned();
        if let Some(buffer) = existing_buffer {
            buffer.apply_manual_step(step);
        }
        info!("🪛 [MINT]: Tag [{}] step override -> {}.", biz_tag, step);
        Ok(())
    }

    /// Baja persistida y purga del buffer en RAM, en ese orden y bajo el
    /// token de la etiqueta para no cruzarse con una recarga en vuelo.
    pub async fn delete_biz_tag(&self, biz_tag: &str) -> Result<(), AllocError> {
        self.ensure_open()?;
        validate_tag(biz_tag)?;

        let gate = self.gate_handle(biz_tag);
        let _token = gate.lock().await;

        self.repository().delete(biz_tag).await?;

        self.buffers
            .write()
            .expect("BUFFERS_LOCK_POISONED")
            .remove(biz_tag);
        self.refill_gates
            .write()
            .expect("GATES_LOCK_POISONED")
            .remove(biz_tag);
        self.metrics.remove(biz_tag);
        Ok(())
    }

    // ------------------------------------------------------------------
    // OBSERVABILIDAD
    // ------------------------------------------------------------------

    pub fn metrics_snapshot(&self, biz_tag: &str) -> Option<MetricsSnapshot> {
        self.metrics.snapshot(biz_tag)
    }

    pub fn all_metrics(&self) -> HashMap<String, MetricsSnapshot> {
        self.metrics.snapshot_all()
    }

    /// Radiografía del buffer dual de una etiqueta con actividad en RAM.
    pub fn buffer_status(&self, biz_tag: &str) -> Result<BufferStatus, AllocError> {
        self.buffers
            .read()
            .expect("BUFFERS_LOCK_POISONED")
            .get(biz_tag)
            .map(|buffer| buffer.status())
            .ok_or(AllocError::BizTagNotFound)
    }

    // ------------------------------------------------------------------
    // CIERRE Y MANTENIMIENTO
    // ------------------------------------------------------------------

    /// Drena las recargas en vuelo y libera todos los mapas. Idempotente.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let live_gates: Vec<Arc<AsyncMutex<()>>> = self
            .refill_gates
            .read()
            .expect("GATES_LOCK_POISONED")
            .values()
            .cloned()
            .collect();
        for gate in live_gates {
            let _drained = gate.lock().await;
        }

        self.buffers
            .write()
            .expect("BUFFERS_LOCK_POISONED")
            .clear();
        self.refill_gates
            .write()
            .expect("GATES_LOCK_POISONED")
            .clear();
        self.metrics.clear();
        info!("🛑 [MINT]: Allocator closed, buffers drained and purged.");
    }

    /// Expulsa buffers sin actividad más allá del intervalo dado. Las
    /// etiquetas con token tomado (recarga en vuelo) se respetan.
    pub fn evict_idle_buffers(&self, idle_threshold_seconds: u64) -> usize {
        let idle_candidates: Vec<String> = self
            .buffers
            .read()
            .expect("BUFFERS_LOCK_POISONED")
            .iter()
            .filter(|(_, buffer)| buffer.idle_seconds() >= idle_threshold_seconds as i64)
            .map(|(tag, _)| tag.clone())
            .collect();

        let mut evicted_count = 0;
        for biz_tag in idle_candidates {
            let gate = self.gate_handle(&biz_tag);
            let Ok(_token) = gate.try_lock() else {
                continue;
            };
            self.buffers
                .write()
                .expect("BUFFERS_LOCK_POISONED")
                .remove(&biz_tag);
            self.refill_gates
                .write()
                .expect("GATES_LOCK_POISONED")
                .remove(&biz_tag);
            self.metrics.remove(&biz_tag);
            evicted_count += 1;
            debug!("🧹 [MINT]: Idle buffer [{}] evicted.", biz_tag);
        }
        evicted_count
    }

    // ------------------------------------------------------------------
    // PROTOCOLO INTERNO DE RECARGA
    // ------------------------------------------------------------------

    fn ensure_open(&self) -> Result<(), AllocError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(AllocError::ServiceNotInitialized);
        }
        Ok(())
    }

    fn repository(&self) -> LeafAllocRepository {
        LeafAllocRepository::new(self.ledger_client.clone())
    }

    /// Buffer de la etiqueta, creándolo vacío si aún no existe.
    fn buffer_handle(&self, biz_tag: &str) -> Arc<SegmentBuffer> {
        if let Some(existing) = self
            .buffers
            .read()
            .expect("BUFFERS_LOCK_POISONED")
            .get(biz_tag)
        {
            return Arc::clone(existing);
        }
        let mut write_guard = self.buffers.write().expect("BUFFERS_LOCK_POISONED");
        Arc::clone(
            write_guard
                .entry(biz_tag.to_string())
                .or_insert_with(|| Arc::new(SegmentBuffer::new(biz_tag, self.default_step))),
        )
    }

    /// Token single-flight de la etiqueta.
    fn gate_handle(&self, biz_tag: &str) -> Arc<AsyncMutex<()>> {
        if let Some(existing) = self
            .refill_gates
            .read()
            .expect("GATES_LOCK_POISONED")
            .get(biz_tag)
        {
            return Arc::clone(existing);
        }
        let mut write_guard = self.refill_gates.write().expect("GATES_LOCK_POISONED");
        Arc::clone(
            write_guard
                .entry(biz_tag.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(()))),
        )
    }

    /// Recarga síncrona bajo el token. Cubre también el bootstrap de la
    /// primera ventana cuando el buffer aún no fue inicializado.
    async fn synchronous_refill(
        &self,
        biz_tag: &str,
        buffer: &Arc<SegmentBuffer>,
        tag_metrics: &Arc<LeafMetrics>,
    ) -> Result<(), AllocError> {
        let gate = self.gate_handle(biz_tag);
        let _token = gate.lock().await;

        // Re-verificación bajo el token: otro llamador pudo recargar o
        // dejar el slot siguiente listo mientras esperábamos.
        if buffer
            .current()
            .map_or(false, |segment| segment.is_available())
        {
            return Ok(());
        }
        if buffer.can_switch_to_next() {
            return Ok(());
        }

        if !buffer.is_initialized() {
            return self.bootstrap_first_segment(biz_tag, buffer, tag_metrics).await;
        }

        let repository = self.repository();
        let refill_step = self.step_controller.next_step(buffer.refill_basis());
        let post_image = bump_with_retry(&repository, biz_tag, refill_step).await?;

        let (window_min, window_max) = post_image.window();
        buffer.set_next_segment(
            Segment::new(window_min, window_max, post_image.step),
            post_image.step,
        );
        tag_metrics.record_segment_load();

        if buffer.switch_to_next() {
            tag_metrics.record_buffer_switch();
        }
        Ok(())
    }

    /// Primera ventana de una etiqueta: lectura de fila (con auto-alta
    /// opcional), bump con el paso persistido e instalación del slot 0.
    async fn bootstrap_first_segment(
        &self,
        biz_tag: &str,
        buffer: &Arc<SegmentBuffer>,
        tag_metrics: &Arc<LeafMetrics>,
    ) -> Result<(), AllocError> {
        let repository = self.repository();

        let persisted_row = match repository.fetch(biz_tag).await {
            Ok(row) => row,
            Err(LedgerError::TagNotFound) if self.tuning.auto_create_tags => {
                let auto_description = format!("auto-created stream '{biz_tag}'");
                match repository
                    .create(biz_tag, self.default_step, &auto_description)
                    .await
                {
                    // Carrera benigna: otro proceso la creó primero.
                    Ok(()) | Err(LedgerError::DuplicateTag) => {}
                    Err(fault) => return Err(fault.into()),
                }
                repository.fetch(biz_tag).await?
            }
            Err(fault) => return Err(fault.into()),
        };

        let post_image = bump_with_retry(&repository, biz_tag, persisted_row.step).await?;
        let (window_min, window_max) = post_image.window();
        buffer.install_first(
            Segment::new(window_min, window_max, post_image.step),
            post_image.step,
        );
        tag_metrics.record_segment_load();

        info!(
            "🚀 [MINT]: Tag [{}] bootstrapped with window ({}, {}].",
            biz_tag,
            window_min - 1,
            window_max
        );
        Ok(())
    }

    /// Precarga fire-and-forget del slot siguiente. Si el token está
    /// tomado, otra recarga ya vuela: ceder sin bloquear.
    fn spawn_preload(
        &self,
        biz_tag: &str,
        buffer: &Arc<SegmentBuffer>,
        tag_metrics: &Arc<LeafMetrics>,
    ) {
        let gate = self.gate_handle(biz_tag);
        let Ok(owned_token) = gate.try_lock_owned() else {
            return;
        };

        let buffer = Arc::clone(buffer);
        let tag_metrics = Arc::clone(tag_metrics);
        let repository = LeafAllocRepository::new(self.ledger_client.clone());
        let step_controller = self.step_controller;
        let preload_threshold = self.tuning.preload_threshold;
        let biz_tag = biz_tag.to_string();

        tokio::spawn(async move {
            let _token = owned_token;

            // El estado pudo cambiar entre el disparo y la adquisición.
            if !buffer.should_preload(preload_threshold) {
                return;
            }

            let refill_step = step_controller.next_step(buffer.refill_basis());
            match bump_with_retry(&repository, &biz_tag, refill_step).await {
                Ok(post_image) => {
                    let (window_min, window_max) = post_image.window();
                    buffer.set_next_segment(
                        Segment::new(window_min, window_max, post_image.step),
                        post_image.step,
                    );
                    tag_metrics.record_segment_load();
                    debug!(
                        "📦 [PRELOAD]: Tag [{}] next window ({}, {}] staged.",
                        biz_tag,
                        window_min - 1,
                        window_max
                    );
                }
                Err(fault) => {
                    tag_metrics.record_refill_error();
                    warn!(
                        "⚠️  [PRELOAD_FAULT]: Tag [{}] preload collapsed: {}. Next allocation retries.",
                        biz_tag, fault
                    );
                }
            }
        });
    }
}

/// Bump con reintentos acotados ante fallos transitorios del ledger
/// (candados de fila, BUSY). Backoff exponencial con jitter ±25%.
async fn bump_with_retry(
    repository: &LeafAllocRepository,
    biz_tag: &str,
    step: i32,
) -> Result<LeafAlloc, LedgerError> {
    let mut attempt: u32 = 0;
    loop {
        match repository.bump_max_id(biz_tag, step).await {
            Ok(post_image) => return Ok(post_image),
            Err(fault) if fault.is_transient() && attempt + 1 < MAX_BUMP_ATTEMPTS => {
                attempt += 1;
                let jitter_factor: f64 = rand::thread_rng().gen_range(0.75..1.25);
                let delay_millis =
                    (BUMP_BACKOFF_BASE_MS * (1u64 << attempt)) as f64 * jitter_factor;
                warn!(
                    "⏳ [BUMP_RETRY]: Tag [{}] transient fault ({}), attempt {} of {}.",
                    biz_tag, fault, attempt, MAX_BUMP_ATTEMPTS
                );
                tokio::time::sleep(Duration::from_millis(delay_millis as u64)).await;
            }
            Err(fault) => return Err(fault),
        }
    }
}

/// Gramática de etiquetas: no vacía, ≤128 chars, ASCII imprimible.
fn validate_tag(biz_tag: &str) -> Result<(), AllocError> {
    if biz_tag.is_empty() {
        return Err(AllocError::InvalidArgument("biz_tag must not be empty".into()));
    }
    if biz_tag.len() > MAX_TAG_LENGTH {
        return Err(AllocError::InvalidArgument(format!(
            "biz_tag exceeds {MAX_TAG_LENGTH} chars"
        )));
    }
    if !biz_tag.chars().all(|character| character.is_ascii_graphic()) {
        return Err(AllocError::InvalidArgument(
            "biz_tag must be printable ASCII without spaces".into(),
        ));
    }
    Ok(())
}
// FIN DEL ARCHIVO [libs/domain/allocator/src/allocator.rs]
