// [libs/shared/heimdall/src/lib.rs]
/*!
 * =================================================================
 * APARATO: HEIMDALL NEURAL OBSERVER
 * CLASIFICACIÓN: SHARED UTILITY (ESTRATO L4)
 * RESPONSABILIDAD: GESTIÓN DE TELEMETRÍA, TRAZADO Y CAPTURA DE PÁNICOS
 * =================================================================
 */

use once_cell::sync::OnceCell;
use std::panic;
use tracing::error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt as formatting_layer, EnvFilter};

/// Centinela de ignición única: los tests invocan la inicialización
/// repetidamente y el suscriptor global sólo admite un registro.
static HEIMDALL_IGNITION: OnceCell<()> = OnceCell::new();

/// Inicializa el sistema de trazas con el nivel base solicitado por la
/// configuración del servicio (`silent|error|warn|info|debug`).
///
/// - Desarrollo: trazas compactas con resaltado para el operador.
/// - Producción: tramas JSON planas para la ingesta del Panóptico.
///
/// La variable `RUST_LOG`, si está presente, tiene prioridad sobre el
/// nivel configurado.
pub fn init_tracing(service_nominal_identifier: &str, base_log_level: &str) {
    let service_identifier = service_nominal_identifier.to_string();
    let normalized_level = normalize_level(base_log_level);

    HEIMDALL_IGNITION.get_or_init(|| {
        let environmental_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            format!("{}={},libsql=error", service_identifier, normalized_level).into()
        });

        if cfg!(debug_assertions) {
            tracing_subscriber::registry()
                .with(environmental_filter)
                .with(formatting_layer::layer().compact().with_target(false))
                .init();
        } else {
            tracing_subscriber::registry()
                .with(environmental_filter)
                .with(formatting_layer::layer().json().flatten_event(true))
                .init();
        }

        install_panic_monitor(service_identifier.clone());
    });
}

/// Traduce el nivel declarado en la configuración al vocabulario de
/// `tracing`. `silent` suprime todo excepto el hook de pánicos.
fn normalize_level(configured_level: &str) -> &'static str {
    match configured_level.to_ascii_lowercase().as_str() {
        "silent" => "off",
        "error" => "error",
        "warn" => "warn",
        "debug" => "debug",
        _ => "info",
    }
}

/// Hook global de pánicos: cualquier colapso en hilos secundarios
/// (tareas de precarga, daemons de limpieza) queda registrado antes de
/// la defunción del hilo.
fn install_panic_monitor(service_identifier: String) {
    panic::set_hook(Box::new(move |panic_metadata| {
        let panic_location = panic_metadata
            .location()
            .map(|location| format!("{}:{}:{}", location.file(), location.line(), location.column()))
            .unwrap_or_else(|| "UNKNOWN_COORDINATES".to_string());

        let panic_payload_message = panic_metadata
            .payload()
            .downcast_ref::<&str>()
            .copied()
            .or_else(|| {
                panic_metadata
                    .payload()
                    .downcast_ref::<String>()
                    .map(|owned| owned.as_str())
            })
            .unwrap_or("UNDEFINED_PANIC_PAYLOAD");

        error!(
            target: "panic_monitor",
            service = %service_identifier,
            location = %panic_location,
            "🔥 [CRITICAL_PANIC]: Thread terminated abruptly. Analysis: {}",
            panic_payload_message
        );
    }));
}
// FIN DEL ARCHIVO [libs/shared/heimdall/src/lib.rs]
