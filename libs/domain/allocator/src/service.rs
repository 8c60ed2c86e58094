// [libs/domain/allocator/src/service.rs]
/*!
 * =================================================================
 * APARATO: LEAF ID SERVICE FACADE
 * CLASIFICACIÓN: DOMAIN SERVICE (ESTRATO L2)
 * RESPONSABILIDAD: CICLO DE VIDA, SEMILLAS PREDEFINIDAS Y GUARDIAS
 *
 * Secuencia nominal: `new` -> `initialize` (o
 * `initialize_with_client` en modo framework) -> `start` -> tráfico ->
 * `stop`. Toda operación fuera de secuencia responde con el fallo de
 * ciclo de vida correspondiente.
 * =================================================================
 */

use crate::allocator::LeafAllocator;
use crate::errors::AllocError;
use crate::reaper::ReaperService;
use seqforge_domain_models::config::IdAllocConfig;
use seqforge_domain_models::{BufferStatus, MetricsSnapshot};
use seqforge_infra_db::LedgerClient;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use tokio::task::JoinHandle;
use tracing::{info, warn};

pub struct LeafIdService {
    config: IdAllocConfig,
    allocator: RwLock<Option<Arc<LeafAllocator>>>,
    reaper_handle: Mutex<Option<JoinHandle<()>>>,
}

impl LeafIdService {
    pub fn new(config: IdAllocConfig) -> Self {
        Self {
            config,
            allocator: RwLock::new(None),
            reaper_handle: Mutex::new(None),
        }
    }

    pub fn config(&self) -> &IdAllocConfig {
        &self.config
    }

    // ------------------------------------------------------------------
    // CICLO DE VIDA
    // ------------------------------------------------------------------

    /// Inicialización autónoma: valida el árbol, abre el enlace al
    /// ledger desde `database` y siembra las etiquetas predefinidas.
    pub async fn initialize(&self) -> Result<(), AllocError> {
        self.ensure_enabled()?;
        self.config.validate()?;

        if self.config.use_framework {
            return Err(AllocError::InvalidArgument(
                "use_framework activo: el handle llega por initialize_with_client".into(),
            ));
        }

        let connection_target = self.config.database.connection_target()?;
        let ledger_client = LedgerClient::connect(&connection_target)
            .await
            .map_err(AllocError::from)?;
        self.finish_initialization(ledger_client).await
    }

    /// Inicialización en modo framework: el entorno comparte su handle.
    pub async fn initialize_with_client(
        &self,
        ledger_client: LedgerClient,
    ) -> Result<(), AllocError> {
        self.ensure_enabled()?;
        self.config.validate()?;
        self.finish_initialization(ledger_client).await
    }

    async fn finish_initialization(&self, ledger_client: LedgerClient) -> Result<(), AllocError> {
        ledger_client.ensure_schema().await.map_err(AllocError::from)?;

        let allocator = Arc::new(LeafAllocator::new(
            ledger_client,
            self.config.leaf.clone(),
            self.config.effective_default_step(),
        ));

        // Siembra de etiquetas predefinidas: los duplicados son benignos
        // (re-inicialización o carrera con otro proceso).
        for (biz_tag, seed) in &self.config.biz_tags {
            if !seed.auto_create {
                continue;
            }
            let seed_step = seed.step.unwrap_or_else(|| self.config.effective_default_step());
            match allocator
                .create_biz_tag(biz_tag, seed_step, &seed.description)
                .await
            {
                Ok(()) => info!("🌱 [SERVICE]: Seed tag [{}] registered.", biz_tag),
                Err(AllocError::BizTagAlreadyExists) => {
                    warn!("♻️  [SERVICE]: Seed tag [{}] already present, skipping.", biz_tag);
                }
                Err(fault) => return Err(fault),
            }
        }

        let retired_allocator = self
            .allocator
            .write()
            .expect("SERVICE_LOCK_POISONED")
            .replace(allocator);
        // Re-inicialización en caliente: el daemon viejo apunta al
        // asignador retirado y se descarta; el asignador anterior se
        // drena fuera del lock para no retener recargas en vuelo.
        if let Some(previous) = retired_allocator {
            if let Some(stale_reaper) = self
                .reaper_handle
                .lock()
                .expect("SERVICE_LOCK_POISONED")
                .take()
            {
                stale_reaper.abort();
            }
            previous.close().await;
        }
        info!("🚀 [SERVICE]: Leaf allocator initialized and operational.");
        Ok(())
    }

    /// Arranca el daemon de mantenimiento cuando el intervalo de
    /// limpieza es no nulo.
    pub async fn start(&self) -> Result<(), AllocError> {
        let allocator = self.allocator_handle()?;
        let cleanup_interval_seconds = self.config.leaf.cleanup_interval_seconds;
        if cleanup_interval_seconds == 0 {
            return Ok(());
        }

        let mut handle_guard = self.reaper_handle.lock().expect("SERVICE_LOCK_POISONED");
        if handle_guard.is_none() {
            let reaper = ReaperService::new(allocator, cleanup_interval_seconds);
            *handle_guard = Some(reaper.spawn_reaper_daemon());
        }
        Ok(())
    }

    /// Detiene el daemon y cierra el asignador. Idempotente.
    pub async fn stop(&self) {
        if let Some(reaper) = self
            .reaper_handle
            .lock()
            .expect("SERVICE_LOCK_POISONED")
            .take()
        {
            reaper.abort();
        }

        let retired_allocator = self
            .allocator
            .write()
            .expect("SERVICE_LOCK_POISONED")
            .take();
        if let Some(allocator) = retired_allocator {
            allocator.close().await;
        }
        info!("🛑 [SERVICE]: Leaf allocator stopped.");
    }

    // ------------------------------------------------------------------
    // SUPERFICIE DELEGADA
    // ------------------------------------------------------------------

    pub async fn next_id(&self, biz_tag: &str) -> Result<i64, AllocError> {
        self.allocator_handle()?.next_id(biz_tag).await
    }

    pub async fn batch_next_id(&self, biz_tag: &str, count: u32) -> Result<Vec<i64>, AllocError> {
        self.allocator_handle()?.batch_next_id(biz_tag, count).await
    }

    pub async fn create_biz_tag(
        &self,
        biz_tag: &str,
        step: i32,
        description: &str,
    ) -> Result<(), AllocError> {
        self.allocator_handle()?
            .create_biz_tag(biz_tag, step, description)
            .await
    }

    pub async fn update_step(&self, biz_tag: &str, step: i32) -> Result<(), AllocError> {
        self.allocator_handle()?.update_step(biz_tag, step).await
    }

    pub async fn delete_biz_tag(&self, biz_tag: &str) -> Result<(), AllocError> {
        self.allocator_handle()?.delete_biz_tag(biz_tag).await
    }

    pub fn metrics(&self, biz_tag: &str) -> Result<Option<MetricsSnapshot>, AllocError> {
        Ok(self.allocator_handle()?.metrics_snapshot(biz_tag))
    }

    pub fn all_metrics(&self) -> Result<HashMap<String, MetricsSnapshot>, AllocError> {
        Ok(self.allocator_handle()?.all_metrics())
    }

    pub fn buffer_status(&self, biz_tag: &str) -> Result<BufferStatus, AllocError> {
        self.allocator_handle()?.buffer_status(biz_tag)
    }

    /// Radiografía como árbol JSON laxo, para superficies de diagnóstico.
    pub fn buffer_status_json(&self, biz_tag: &str) -> Result<serde_json::Value, AllocError> {
        let status = self.buffer_status(biz_tag)?;
        serde_json::to_value(status)
            .map_err(|fault| AllocError::InvalidArgument(format!("status serialization: {fault}")))
    }

    // ------------------------------------------------------------------
    // GUARDIAS
    // ------------------------------------------------------------------

    fn ensure_enabled(&self) -> Result<(), AllocError> {
        if !self.config.enabled {
            return Err(AllocError::ServiceDisabled);
        }
        Ok(())
    }

    fn allocator_handle(&self) -> Result<Arc<LeafAllocator>, AllocError> {
        self.ensure_enabled()?;
        self.allocator
            .read()
            .expect("SERVICE_LOCK_POISONED")
            .clone()
            .ok_or(AllocError::ServiceNotInitialized)
    }
}
// FIN DEL ARCHIVO [libs/domain/allocator/src/service.rs]
