// [libs/domain/models/src/config.rs]
/*!
 * =================================================================
 * APARATO: ALLOCATOR CONFIGURATION TREE
 * CLASIFICACIÓN: DOMAIN MODEL (ESTRATO L2)
 * RESPONSABILIDAD: GRAMÁTICA DE CONFIGURACIÓN Y VALIDACIÓN SEMÁNTICA
 * =================================================================
 */

use serde::Deserialize;
use std::collections::HashMap;
use thiserror::Error;

/// Fallos de validación del árbol de configuración.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigFault {
    /// El selector de algoritmo no corresponde al asignador segmentado.
    #[error("[CONFIG_FAULT]: UNSUPPORTED_ALGORITHM -> {0}")]
    UnsupportedAlgorithm(String),

    /// Driver fuera de la familia libSQL (sqlite | libsql | turso).
    #[error("[CONFIG_FAULT]: UNSUPPORTED_DRIVER -> {0}")]
    UnsupportedDriver(String),

    /// El umbral de precarga debe pertenecer al intervalo (0, 1].
    #[error("[CONFIG_FAULT]: PRELOAD_THRESHOLD_OUT_OF_RANGE -> {0}")]
    InvalidThreshold(f64),

    /// Pasos o cotas de paso fuera de rango.
    #[error("[CONFIG_FAULT]: INVALID_STEP_BOUNDS -> {0}")]
    InvalidStepBounds(String),

    /// El factor de ajuste adaptativo debe ser ≥ 1.0.
    #[error("[CONFIG_FAULT]: INVALID_ADJUST_RATIO -> {0}")]
    InvalidAdjustRatio(f64),

    /// Coordenadas remotas incompletas (host ausente para driver turso).
    #[error("[CONFIG_FAULT]: REMOTE_COORDINATES_VOID")]
    RemoteCoordinatesVoid,

    /// Semilla de etiqueta con paso inválido.
    #[error("[CONFIG_FAULT]: INVALID_TAG_SEED -> {0}")]
    InvalidTagSeed(String),
}

/// Destino de conexión resuelto a partir de `DatabaseConfig`.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionTarget {
    /// Base embebida en RAM (URL con `mode=memory` o `:memory:`).
    Memory(String),
    /// Archivo SQLite local.
    LocalFile(String),
    /// Cluster Turso remoto con token de acceso.
    Remote { url: String, auth_token: Option<String> },
}

/// Raíz de configuración del servicio asignador.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IdAllocConfig {
    /// Si es falso, toda operación falla con `ServiceDisabled`.
    pub enabled: bool,

    /// Selector de algoritmo. Sólo `"leaf"` está soportado.
    #[serde(rename = "type")]
    pub algorithm: String,

    /// Si es verdadero, el handle de base de datos lo aporta el entorno
    /// compartido mediante `initialize_with_client`.
    pub use_framework: bool,

    /// Paso inicial para etiquetas sin configuración propia.
    pub default_step: i32,

    pub database: DatabaseConfig,

    pub leaf: LeafTuning,

    /// Semillas de etiquetas a crear durante la inicialización.
    pub biz_tags: HashMap<String, BizTagSeed>,
}

impl Default for IdAllocConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            algorithm: "leaf".to_string(),
            use_framework: false,
            default_step: 1000,
            database: DatabaseConfig::default(),
            leaf: LeafTuning::default(),
            biz_tags: HashMap::new(),
        }
    }
}

impl IdAllocConfig {
    /// Paso por defecto efectivo: el bloque `leaf` prevalece sobre la raíz.
    pub fn effective_default_step(&self) -> i32 {
        self.leaf.default_step.unwrap_or(self.default_step)
    }

    /// Valida la coherencia semántica completa del árbol.
    pub fn validate(&self) -> Result<(), ConfigFault> {
        if self.algorithm != "leaf" {
            return Err(ConfigFault::UnsupportedAlgorithm(self.algorithm.clone()));
        }
        if self.default_step < 1 {
            return Err(ConfigFault::InvalidStepBounds(format!(
                "default_step = {}",
                self.default_step
            )));
        }
        if !self.use_framework {
            self.database.validate()?;
        }
        self.leaf.validate()?;
        for (tag, seed) in &self.biz_tags {
            if let Some(step) = seed.step {
                if step < 1 {
                    return Err(ConfigFault::InvalidTagSeed(format!("{tag}: step = {step}")));
                }
            }
        }
        Ok(())
    }
}

/// Coordenadas del sustrato de persistencia (familia libSQL).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `sqlite` (archivo local), `libsql` (DSN explícito) o `turso` (remoto).
    pub driver: String,

    /// DSN pre-construido. Si está presente, prevalece sobre host/database.
    pub dsn: Option<String>,

    /// Token de acceso para clusters remotos.
    pub auth_token: Option<String>,

    pub host: Option<String>,
    pub port: Option<u16>,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub charset: Option<String>,

    /// Parámetros de pool reconocidos y validados. El driver libSQL
    /// gestiona sus conexiones como handles ligeros, por lo que estos
    /// valores actúan como cotas consultivas.
    pub max_idle_conns: u32,
    pub max_open_conns: u32,
    pub conn_max_lifetime_seconds: u64,

    /// Nivel de trazas del estrato de persistencia: `silent|error|warn|info`.
    pub log_level: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            dsn: None,
            auth_token: None,
            host: None,
            port: None,
            database: "seqforge.db".to_string(),
            username: None,
            password: None,
            charset: None,
            max_idle_conns: 4,
            max_open_conns: 16,
            conn_max_lifetime_seconds: 3600,
            log_level: "warn".to_string(),
        }
    }
}

impl DatabaseConfig {
    /// Valida el driver y la coherencia de las coordenadas declaradas.
    pub fn validate(&self) -> Result<(), ConfigFault> {
        match self.driver.as_str() {
            "sqlite" | "libsql" => {}
            "turso" => {
                if self.dsn.is_none() && self.host.is_none() {
                    return Err(ConfigFault::RemoteCoordinatesVoid);
                }
            }
            other => return Err(ConfigFault::UnsupportedDriver(other.to_string())),
        }
        Ok(())
    }

    /// Resuelve el destino físico de conexión.
    pub fn connection_target(&self) -> Result<ConnectionTarget, ConfigFault> {
        self.validate()?;

        if let Some(dsn) = &self.dsn {
            if dsn.starts_with("libsql://") || dsn.starts_with("https://") {
                return Ok(ConnectionTarget::Remote {
                    url: dsn.clone(),
                    auth_token: self.auth_token.clone(),
                });
            }
            if dsn.contains(":memory:") || dsn.contains("mode=memory") {
                return Ok(ConnectionTarget::Memory(dsn.clone()));
            }
            return Ok(ConnectionTarget::LocalFile(dsn.clone()));
        }

        if self.driver == "turso" {
            let host = self.host.clone().ok_or(ConfigFault::RemoteCoordinatesVoid)?;
            return Ok(ConnectionTarget::Remote {
                url: format!("libsql://{host}"),
                auth_token: self.auth_token.clone(),
            });
        }

        if self.database.contains(":memory:") || self.database.contains("mode=memory") {
            return Ok(ConnectionTarget::Memory(self.database.clone()));
        }
        Ok(ConnectionTarget::LocalFile(self.database.clone()))
    }
}

/// Afinación del protocolo de doble buffer y del paso adaptativo.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeafTuning {
    /// Sobreescribe el paso por defecto de la raíz.
    pub default_step: Option<i32>,

    /// Ratio de uso que dispara la precarga asíncrona. Intervalo (0, 1].
    pub preload_threshold: f64,

    /// Intervalo del daemon de limpieza de buffers ociosos. 0 lo desactiva.
    pub cleanup_interval_seconds: u64,

    /// Cota superior del paso adaptativo.
    pub max_step_size: i32,

    /// Cota inferior del paso adaptativo.
    pub min_step_size: i32,

    /// Factor multiplicativo de expansión/contracción del paso.
    pub step_adjust_ratio: f64,

    /// Política post-borrado: si es verdadero, `next_id` sobre una
    /// etiqueta inexistente la re-crea con el paso por defecto.
    pub auto_create_tags: bool,
}

impl Default for LeafTuning {
    fn default() -> Self {
        Self {
            default_step: None,
            preload_threshold: 0.9,
            cleanup_interval_seconds: 3600,
            max_step_size: 1_000_000,
            min_step_size: 100,
            step_adjust_ratio: 2.0,
            auto_create_tags: false,
        }
    }
}

impl LeafTuning {
    pub fn validate(&self) -> Result<(), ConfigFault> {
        if !(self.preload_threshold > 0.0 && self.preload_threshold <= 1.0) {
            return Err(ConfigFault::InvalidThreshold(self.preload_threshold));
        }
        if self.min_step_size < 1 || self.max_step_size < self.min_step_size {
            return Err(ConfigFault::InvalidStepBounds(format!(
                "min = {}, max = {}",
                self.min_step_size, self.max_step_size
            )));
        }
        if let Some(step) = self.default_step {
            if step < 1 {
                return Err(ConfigFault::InvalidStepBounds(format!("leaf.default_step = {step}")));
            }
        }
        if self.step_adjust_ratio < 1.0 {
            return Err(ConfigFault::InvalidAdjustRatio(self.step_adjust_ratio));
        }
        Ok(())
    }
}

/// Semilla de bootstrap para una etiqueta predefinida.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BizTagSeed {
    /// Paso inicial de la etiqueta; en su ausencia rige el paso por defecto.
    pub step: Option<i32>,

    pub description: String,

    /// Si es verdadero, la inicialización del servicio crea la fila
    /// ignorando duplicados.
    pub auto_create: bool,
}

impl Default for BizTagSeed {
    fn default() -> Self {
        Self {
            step: None,
            description: String::new(),
            auto_create: true,
        }
    }
}
