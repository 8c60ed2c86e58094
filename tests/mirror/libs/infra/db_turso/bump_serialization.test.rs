// [tests/mirror/libs/infra/db_turso/bump_serialization.test.rs]
/**
 * =================================================================
 * APARATO: BUMP SERIALIZATION TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: CERTIFICACIÓN DE VENTANAS DISJUNTAS BAJO CONCURRENCIA
 * =================================================================
 */

use seqforge_domain_models::config::ConnectionTarget;
use seqforge_domain_models::LeafAlloc;
use seqforge_infra_db::{LeafAllocRepository, LedgerClient};
use std::collections::HashSet;
use std::time::Duration;

/// Reintenta el bump ante candados transitorios del motor (BUSY), tal
/// como hace el asignador en producción.
async fn bump_until_committed(
    repository: &LeafAllocRepository,
    biz_tag: &str,
    step: i32,
) -> LeafAlloc {
    loop {
        match repository.bump_max_id(biz_tag, step).await {
            Ok(post_image) => return post_image,
            Err(fault) if fault.is_transient() => {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
            Err(fault) => panic!("fallo no transitorio del ledger: {fault}"),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn certify_concurrent_bumps_serialize_into_disjoint_windows() {
    println!("\n⚔️  [PROVING_GROUNDS]: Hammering one tag with 4 concurrent bumpers...");

    let target = ConnectionTarget::Memory(
        "file::mem_bump_serial?mode=memory&cache=shared".to_string(),
    );
    let client = LedgerClient::connect(&target).await.expect("ignición");
    let repository = LeafAllocRepository::new(client.clone());
    repository.create("stress", 10, "").await.expect("alta");

    let mut bumper_handles = Vec::new();
    for _ in 0..4 {
        let worker_repository = LeafAllocRepository::new(client.clone());
        bumper_handles.push(tokio::spawn(async move {
            let mut minted_windows = Vec::new();
            for _ in 0..10 {
                let post_image = bump_until_committed(&worker_repository, "stress", 10).await;
                minted_windows.push(post_image.window());
            }
            minted_windows
        }));
    }

    let mut all_windows = Vec::new();
    for handle in bumper_handles {
        all_windows.extend(handle.await.expect("bumper collapsed"));
    }

    // 40 bumps de paso 10: el contador final es exactamente 400 y las
    // 40 ventanas cubren [1, 400] sin solaparse.
    assert_eq!(all_windows.len(), 40);

    let distinct_windows: HashSet<(i64, i64)> = all_windows.iter().copied().collect();
    assert_eq!(distinct_windows.len(), 40);

    let mut covered_ids = HashSet::new();
    for (window_min, window_max) in &all_windows {
        assert_eq!(window_max - window_min + 1, 10);
        for minted_id in *window_min..=*window_max {
            assert!(covered_ids.insert(minted_id), "ventanas solapadas en {minted_id}");
        }
    }
    assert_eq!(covered_ids.len(), 400);
    assert_eq!(*covered_ids.iter().min().unwrap(), 1);
    assert_eq!(*covered_ids.iter().max().unwrap(), 400);

    let final_row = repository.fetch("stress").await.expect("relectura final");
    assert_eq!(final_row.max_id, 400);

    println!("   ✅ [SUCCESS]: 40 disjoint windows, counter sealed at 400.");
}
