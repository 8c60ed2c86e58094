// [tests/mirror/libs/domain/allocator/allocator_bootstrap.test.rs]
/**
 * =================================================================
 * APARATO: ALLOCATOR BOOTSTRAP TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: CERTIFICACIÓN DEL PRIMER TOQUE Y RÉGIMEN ESTABLE
 * =================================================================
 */

use seqforge_domain_allocator::LeafAllocator;
use seqforge_domain_models::config::{ConnectionTarget, LeafTuning};
use seqforge_infra_db::{LeafAllocRepository, LedgerClient};
use std::collections::HashSet;

async fn ignite(memory_name: &str, tuning: LeafTuning) -> (LedgerClient, LeafAllocator) {
    let target = ConnectionTarget::Memory(format!(
        "file::{memory_name}?mode=memory&cache=shared"
    ));
    let client = LedgerClient::connect(&target).await.expect("ignición del ledger");
    let allocator = LeafAllocator::new(client.clone(), tuning, 1000);
    (client, allocator)
}

#[tokio::test]
async fn certify_first_touch_bootstrap() {
    println!("\n🚀 [PROVING_GROUNDS]: Auditing first-touch bootstrap...");

    let (client, allocator) = ignite("mem_alloc_boot", LeafTuning::default()).await;

    allocator
        .create_biz_tag("user", 1000, "users")
        .await
        .expect("alta de la etiqueta");

    // Primer identificador de la historia del flujo: exactamente 1.
    let first_id = allocator.next_id("user").await.expect("primera asignación");
    assert_eq!(first_id, 1);

    // El ledger refleja la primera ventana acuñada: (0, 1000].
    let repository = LeafAllocRepository::new(client);
    let row = repository.fetch("user").await.expect("fila persistida");
    assert_eq!(row.max_id, 1000);
    assert_eq!(row.step, 1000);

    let metrics = allocator.metrics_snapshot("user").expect("panóptico vivo");
    assert_eq!(metrics.segment_loads, 1);
    assert_eq!(metrics.success_requests, 1);
    assert_eq!(metrics.total_requests, 1);
    assert_eq!(metrics.failed_requests, 0);

    let status = allocator.buffer_status("user").expect("radiografía");
    assert!(status.init_ok);
    assert!(!status.next_ready);
    assert_eq!(status.step, 1000);

    println!("   ✅ [SUCCESS]: First touch minted id 1, ledger sealed at 1000.");
}

#[tokio::test]
async fn certify_steady_state_consumes_one_window() {
    // Umbral 1.0: la precarga queda desactivada y el régimen estable debe
    // servir las 1000 asignaciones con una única transacción de bump.
    let tuning = LeafTuning {
        preload_threshold: 1.0,
        ..LeafTuning::default()
    };
    let (client, allocator) = ignite("mem_alloc_steady", tuning).await;

    allocator
        .create_biz_tag("user", 1000, "users")
        .await
        .expect("alta");

    assert_eq!(allocator.next_id("user").await.expect("id 1"), 1);

    let mut remaining_ids = HashSet::new();
    for _ in 0..999 {
        remaining_ids.insert(allocator.next_id("user").await.expect("asignación estable"));
    }

    // Multiconjunto exacto {2, …, 1000}: sin huecos ni repeticiones.
    assert_eq!(remaining_ids.len(), 999);
    assert_eq!(*remaining_ids.iter().min().unwrap(), 2);
    assert_eq!(*remaining_ids.iter().max().unwrap(), 1000);

    // Una sola carga de segmento en toda la serie.
    let metrics = allocator.metrics_snapshot("user").expect("panóptico");
    assert_eq!(metrics.segment_loads, 1);
    assert_eq!(metrics.buffer_switches, 0);
    assert_eq!(metrics.success_requests, 1000);

    // El contador durable no se movió tras el bootstrap.
    let repository = LeafAllocRepository::new(client);
    let row = repository.fetch("user").await.expect("relectura");
    assert_eq!(row.max_id, 1000);
}
