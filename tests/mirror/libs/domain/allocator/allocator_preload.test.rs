// [tests/mirror/libs/domain/allocator/allocator_preload.test.rs]
/**
 * =================================================================
 * APARATO: ALLOCATOR PRELOAD TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: CERTIFICACIÓN DE PRECARGA POR UMBRAL Y CONMUTACIÓN
 * =================================================================
 */

use seqforge_domain_allocator::LeafAllocator;
use seqforge_domain_models::config::{ConnectionTarget, LeafTuning};
use seqforge_infra_db::LedgerClient;
use std::time::Duration;

async fn ignite(memory_name: &str, tuning: LeafTuning) -> LeafAllocator {
    let target = ConnectionTarget::Memory(format!(
        "file::{memory_name}?mode=memory&cache=shared"
    ));
    let client = LedgerClient::connect(&target).await.expect("ignición del ledger");
    LeafAllocator::new(client, tuning, 1000)
}

/// Espera acotada a que la precarga asíncrona deje listo el slot
/// siguiente (ventana de asentamiento de 1 s en pasos de 10 ms).
async fn await_next_ready(allocator: &LeafAllocator, biz_tag: &str) -> bool {
    for _ in 0..100 {
        if allocator
            .buffer_status(biz_tag)
            .map(|status| status.next_ready)
            .unwrap_or(false)
        {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn certify_threshold_triggers_async_preload() {
    println!("\n📦 [PROVING_GROUNDS]: Auditing preload at 0.8 usage...");

    // Paso constante 10 (min == max): la adaptación es un no-op y las
    // ventanas quedan deterministas para la auditoría.
    let tuning = LeafTuning {
        preload_threshold: 0.8,
        min_step_size: 10,
        max_step_size: 10,
        ..LeafTuning::default()
    };
    let allocator = ignite("mem_alloc_preload", tuning).await;
    allocator
        .create_biz_tag("orderid", 10, "")
        .await
        .expect("alta");

    // 8 asignaciones: ratio de uso exactamente 0.8.
    for expected_id in 1..=8 {
        assert_eq!(
            allocator.next_id("orderid").await.expect("asignación"),
            expected_id
        );
    }

    // Dentro de la ventana de asentamiento el slot siguiente queda listo.
    assert!(
        await_next_ready(&allocator, "orderid").await,
        "la precarga no asentó el slot siguiente a tiempo"
    );

    // Dos asignaciones más drenan la ventana vigente...
    assert_eq!(allocator.next_id("orderid").await.expect("id 9"), 9);
    assert_eq!(allocator.next_id("orderid").await.expect("id 10"), 10);

    // ...y la undécima conmuta al segmento precargado sin tocar el ledger.
    assert_eq!(allocator.next_id("orderid").await.expect("id 11"), 11);

    let metrics = allocator.metrics_snapshot("orderid").expect("panóptico");
    assert_eq!(metrics.segment_loads, 2);
    assert_eq!(metrics.buffer_switches, 1);
    assert_eq!(metrics.success_requests, 11);

    println!("   ✅ [SUCCESS]: Preload staged window and swap served id 11.");
}

#[tokio::test]
async fn certify_threshold_one_disables_preload() {
    let tuning = LeafTuning {
        preload_threshold: 1.0,
        min_step_size: 10,
        max_step_size: 10,
        ..LeafTuning::default()
    };
    let allocator = ignite("mem_alloc_nopreload", tuning).await;
    allocator.create_biz_tag("orderid", 10, "").await.expect("alta");

    for expected_id in 1..=10 {
        assert_eq!(
            allocator.next_id("orderid").await.expect("asignación"),
            expected_id
        );
    }

    // Sin precarga: tras drenar la ventana el slot siguiente sigue vacío.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let drained_status = allocator.buffer_status("orderid").expect("radiografía");
    assert!(!drained_status.next_ready);
    assert_eq!(
        allocator.metrics_snapshot("orderid").expect("panóptico").segment_loads,
        1
    );

    // La asignación 11 cae en recarga síncrona.
    assert_eq!(allocator.next_id("orderid").await.expect("id 11"), 11);
    let metrics = allocator.metrics_snapshot("orderid").expect("panóptico");
    assert_eq!(metrics.segment_loads, 2);
    assert_eq!(metrics.buffer_switches, 1);
}
