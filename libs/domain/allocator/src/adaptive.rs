// [libs/domain/allocator/src/adaptive.rs]
/*!
 * =================================================================
 * APARATO: ADAPTIVE STEP CONTROLLER
 * CLASIFICACIÓN: DOMAIN LOGIC (ESTRATO L2)
 * RESPONSABILIDAD: DIMENSIONADO DEL PASO SEGÚN VELOCIDAD DE CONSUMO
 * =================================================================
 */

use seqforge_core_segment::buffer::RefillBasis;
use seqforge_domain_models::config::LeafTuning;
use std::time::Duration;

/// Ventana de consumo rápido: por debajo de ella el paso se expande.
pub const STEP_EXPAND_WINDOW: Duration = Duration::from_secs(900);

/// Ventana de consumo lento: por encima de ella el paso se contrae.
pub const STEP_SHRINK_WINDOW: Duration = Duration::from_secs(1800);

/// Política de dimensionado del paso de recarga.
///
/// Reglas, en orden de prioridad:
/// 1. Un `update_step` manual pendiente rige la próxima recarga tal cual.
/// 2. Con `min_step == max_step` la adaptación es un no-op.
/// 3. Sin recarga previa (bootstrap) el paso vigente se mantiene.
/// 4. Segmento drenado en < 900 s: `paso × ratio`, techo `max_step`.
///    Drenado en > 1800 s: `paso ÷ ratio`, piso `min_step`, y nunca por
///    encima del paso vigente. Entre ambas ventanas: sin cambio.
#[derive(Debug, Clone, Copy)]
pub struct StepController {
    adjust_ratio: f64,
    min_step: i32,
    max_step: i32,
}

impl StepController {
    pub fn new(tuning: &LeafTuning) -> Self {
        Self {
            adjust_ratio: tuning.step_adjust_ratio,
            min_step: tuning.min_step_size,
            max_step: tuning.max_step_size,
        }
    }

    pub fn next_step(&self, basis: RefillBasis) -> i32 {
        if basis.manual_override {
            return basis.step.max(1);
        }
        if self.min_step == self.max_step {
            return basis.step;
        }
        let Some(elapsed) = basis.elapsed_since_last_refill else {
            return basis.step;
        };

        if elapsed < STEP_EXPAND_WINDOW {
            let expanded = (f64::from(basis.step) * self.adjust_ratio) as i32;
            expanded.min(self.max_step).max(basis.step)
        } else if elapsed > STEP_SHRINK_WINDOW {
            let shrunk = (f64::from(basis.step) / self.adjust_ratio) as i32;
            shrunk.max(self.min_step).min(basis.step).max(1)
        } else {
            basis.step
        }
    }
}
