// [tests/mirror/libs/domain/allocator/adaptive_step.test.rs]
/**
 * =================================================================
 * APARATO: ADAPTIVE STEP TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: CERTIFICACIÓN DE LA POLÍTICA DE DIMENSIONADO
 * =================================================================
 */

use seqforge_core_segment::buffer::RefillBasis;
use seqforge_domain_allocator::StepController;
use seqforge_domain_models::config::LeafTuning;
use std::time::Duration;

fn basis(step: i32, elapsed_seconds: Option<u64>, manual_override: bool) -> RefillBasis {
    RefillBasis {
        step,
        manual_override,
        elapsed_since_last_refill: elapsed_seconds.map(Duration::from_secs),
    }
}

fn controller(min_step: i32, max_step: i32, ratio: f64) -> StepController {
    StepController::new(&LeafTuning {
        min_step_size: min_step,
        max_step_size: max_step,
        step_adjust_ratio: ratio,
        ..LeafTuning::default()
    })
}

#[test]
fn certify_fast_drain_expands_step() {
    println!("\n📈 [PROVING_GROUNDS]: Auditing adaptive sizing policy...");
    let policy = controller(100, 10_000, 2.0);

    // Drenado en 10 s (< 900 s): duplicación.
    assert_eq!(policy.next_step(basis(1000, Some(10), false)), 2000);

    // La expansión respeta el techo configurado.
    assert_eq!(policy.next_step(basis(8000, Some(10), false)), 10_000);
}

#[test]
fn certify_slow_drain_shrinks_step() {
    let policy = controller(100, 10_000, 2.0);

    // Drenado en 1 hora (> 1800 s): contracción a la mitad.
    assert_eq!(policy.next_step(basis(1000, Some(3600), false)), 500);

    // La contracción respeta el piso configurado.
    assert_eq!(policy.next_step(basis(150, Some(3600), false)), 100);
}

#[test]
fn certify_comfort_window_keeps_step() {
    let policy = controller(100, 10_000, 2.0);

    // Entre 900 s y 1800 s el paso no se toca.
    assert_eq!(policy.next_step(basis(1000, Some(1200), false)), 1000);
}

#[test]
fn certify_bootstrap_without_history_keeps_step() {
    let policy = controller(100, 10_000, 2.0);
    assert_eq!(policy.next_step(basis(1000, None, false)), 1000);
}

#[test]
fn certify_manual_override_bypasses_adaptation() {
    let policy = controller(100, 10_000, 2.0);

    // El paso manual rige tal cual, aun con historial de drenado rápido.
    assert_eq!(policy.next_step(basis(777, Some(5), true)), 777);
}

#[test]
fn certify_equal_bounds_disable_adaptation() {
    // min == max: no-op para cualquier historial.
    let frozen_policy = controller(1000, 1000, 2.0);

    assert_eq!(frozen_policy.next_step(basis(1000, Some(5), false)), 1000);
    assert_eq!(frozen_policy.next_step(basis(1000, Some(7200), false)), 1000);
    assert_eq!(frozen_policy.next_step(basis(10, Some(5), false)), 10);
}
