// [libs/domain/allocator/src/metrics.rs]
/*!
 * =================================================================
 * APARATO: PER-TAG METRICS PANOPTICON
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: CONTADORES ATÓMICOS Y DERIVACIÓN DE QPS POR ETIQUETA
 *
 * El total se deriva como `success + failed` en el instante de la
 * lectura: el invariante `total = success + failed` se cumple en todo
 * punto de observación sin actualizar tres contadores a la vez.
 * =================================================================
 */

use chrono::{DateTime, TimeZone, Utc};
use seqforge_domain_models::MetricsSnapshot;
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Instant;

/// Contadores vivos de una etiqueta.
pub struct LeafMetrics {
    biz_tag: String,
    success_requests: AtomicU64,
    failed_requests: AtomicU64,
    segment_loads: AtomicU64,
    buffer_switches: AtomicU64,
    refill_errors: AtomicU64,
    created_at: Instant,
    last_update_epoch_millis: AtomicI64,
}

impl LeafMetrics {
    fn new(biz_tag: impl Into<String>) -> Self {
        Self {
            biz_tag: biz_tag.into(),
            success_requests: AtomicU64::new(0),
            failed_requests: AtomicU64::new(0),
            segment_loads: AtomicU64::new(0),
            buffer_switches: AtomicU64::new(0),
            refill_errors: AtomicU64::new(0),
            created_at: Instant::now(),
            last_update_epoch_millis: AtomicI64::new(Utc::now().timestamp_millis()),
        }
    }

    fn stamp(&self) {
        self.last_update_epoch_millis
            .store(Utc::now().timestamp_millis(), Ordering::Release);
    }

    pub fn record_success(&self) {
        self.success_requests.fetch_add(1, Ordering::AcqRel);
        self.stamp();
    }

    pub fn record_failure(&self) {
        self.failed_requests.fetch_add(1, Ordering::AcqRel);
        self.stamp();
    }

    pub fn record_segment_load(&self) {
        self.segment_loads.fetch_add(1, Ordering::AcqRel);
        self.stamp();
    }

    pub fn record_buffer_switch(&self) {
        self.buffer_switches.fetch_add(1, Ordering::AcqRel);
        self.stamp();
    }

    pub fn record_refill_error(&self) {
        self.refill_errors.fetch_add(1, Ordering::AcqRel);
        self.stamp();
    }

    /// Instantánea derivada bajo demanda.
    pub fn snapshot(&self) -> MetricsSnapshot {
        let success_requests = self.success_requests.load(Ordering::Acquire);
        let failed_requests = self.failed_requests.load(Ordering::Acquire);
        let total_requests = success_requests + failed_requests;

        let elapsed_seconds = self.created_at.elapsed().as_secs_f64().max(1e-3);
        let average_qps = total_requests as f64 / elapsed_seconds;
        let success_rate = success_requests as f64 / (total_requests.max(1)) as f64;

        MetricsSnapshot {
            biz_tag: self.biz_tag.clone(),
            total_requests,
            success_requests,
            failed_requests,
            segment_loads: self.segment_loads.load(Ordering::Acquire),
            buffer_switches: self.buffer_switches.load(Ordering::Acquire),
            refill_errors: self.refill_errors.load(Ordering::Acquire),
            average_qps,
            success_rate,
            last_update: epoch_millis_to_datetime(
                self.last_update_epoch_millis.load(Ordering::Acquire),
            ),
        }
    }
}

fn epoch_millis_to_datetime(epoch_millis: i64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt(epoch_millis)
        .single()
        .unwrap_or_else(Utc::now)
}

/// Registro concurrente de contadores: una entrada por etiqueta viva.
#[derive(Default)]
pub struct MetricsRegistry {
    entries: RwLock<HashMap<String, Arc<LeafMetrics>>>,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entrega (creándolo si es preciso) el contador de una etiqueta.
    pub fn handle(&self, biz_tag: &str) -> Arc<LeafMetrics> {
        if let Some(existing) = self
            .entries
            .read()
            .expect("METRICS_LOCK_POISONED")
            .get(biz_tag)
        {
            return Arc::clone(existing);
        }
        let mut write_guard = self.entries.write().expect("METRICS_LOCK_POISONED");
        Arc::clone(
            write_guard
                .entry(biz_tag.to_string())
                .or_insert_with(|| Arc::new(LeafMetrics::new(biz_tag))),
        )
    }

    pub fn snapshot(&self, biz_tag: &str) -> Option<MetricsSnapshot> {
        self.entries
            .read()
            .expect("METRICS_LOCK_POISONED")
            .get(biz_tag)
            .map(|metrics| metrics.snapshot())
    }

    pub fn snapshot_all(&self) -> HashMap<String, MetricsSnapshot> {
        self.entries
            .read()
            .expect("METRICS_LOCK_POISONED")
            .iter()
            .map(|(tag, metrics)| (tag.clone(), metrics.snapshot()))
            .collect()
    }

    pub fn remove(&self, biz_tag: &str) {
        self.entries
            .write()
            .expect("METRICS_LOCK_POISONED")
            .remove(biz_tag);
    }

    pub fn clear(&self) {
        self.entries.write().expect("METRICS_LOCK_POISONED").clear();
    }
}
