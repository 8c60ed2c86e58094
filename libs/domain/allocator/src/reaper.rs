// [libs/domain/allocator/src/reaper.rs]
/*!
 * =================================================================
 * APARATO: IDLE BUFFER REAPER SERVICE
 * CLASIFICACIÓN: BACKGROUND MAINTENANCE SERVICE (ESTRATO L4)
 * RESPONSABILIDAD: EXPULSIÓN PERIÓDICA DE BUFFERS SIN ACTIVIDAD
 * =================================================================
 */

use crate::allocator::LeafAllocator;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::interval;
use tracing::{debug, info};

pub struct ReaperService {
    allocator: Arc<LeafAllocator>,
    cleanup_interval_seconds: u64,
}

impl ReaperService {
    pub fn new(allocator: Arc<LeafAllocator>, cleanup_interval_seconds: u64) -> Self {
        Self {
            allocator,
            cleanup_interval_seconds,
        }
    }

    /// Lanza el daemon de limpieza. El primer tick del interval se
    /// consume de inmediato; la primera pasada real ocurre un intervalo
    /// completo después del arranque.
    pub fn spawn_reaper_daemon(self) -> JoinHandle<()> {
        let tick_seconds = self.cleanup_interval_seconds.max(1);
        info!("🧹 [REAPER]: Idle-buffer sweep active. Every {}s", tick_seconds);

        tokio::spawn(async move {
            let mut timer = interval(Duration::from_secs(tick_seconds));
            timer.tick().await;

            loop {
                timer.tick().await;
                let evicted_count = self
                    .allocator
                    .evict_idle_buffers(self.cleanup_interval_seconds);
                if evicted_count > 0 {
                    debug!("🧹 [REAPER]: Swept {} idle buffers.", evicted_count);
                }
            }
        })
    }
}
