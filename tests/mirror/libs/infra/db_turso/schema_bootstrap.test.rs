// [tests/mirror/libs/infra/db_turso/schema_bootstrap.test.rs]
/**
 * =================================================================
 * APARATO: SCHEMA BOOTSTRAP TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L3-MIRROR
 * RESPONSABILIDAD: CERTIFICACIÓN DE IDEMPOTENCIA DDL Y PERSISTENCIA
 * =================================================================
 */

use seqforge_domain_models::config::ConnectionTarget;
use seqforge_infra_db::schema::apply_leaf_schema;
use seqforge_infra_db::{LeafAllocRepository, LedgerClient};

#[tokio::test]
async fn certify_repeated_ddl_is_a_noop() {
    println!("\n🏗️  [PROVING_GROUNDS]: Auditing DDL idempotence...");

    let target = ConnectionTarget::Memory(
        "file::mem_schema_idem?mode=memory&cache=shared".to_string(),
    );
    // connect ya aplica el esquema una vez.
    let client = LedgerClient::connect(&target).await.expect("ignición");

    let repository = LeafAllocRepository::new(client.clone());
    repository.create("keeper", 100, "").await.expect("alta");
    repository.bump_max_id("keeper", 100).await.expect("bump");

    // Re-aplicaciones sucesivas: ni fallo ni pérdida de datos.
    let connection = client.connection().expect("handle");
    apply_leaf_schema(&connection).await.expect("re-aplicación 1");
    apply_leaf_schema(&connection).await.expect("re-aplicación 2");
    client.ensure_schema().await.expect("re-aplicación vía cliente");

    let row = repository.fetch("keeper").await.expect("fila intacta");
    assert_eq!(row.max_id, 100);
    assert_eq!(row.step, 100);

    println!("   ✅ [SUCCESS]: DDL bootstrap certified idempotent.");
}

#[tokio::test]
async fn certify_disk_ledger_round_trip() {
    let scratch_directory = tempfile::tempdir().expect("directorio temporal");
    let ledger_path = scratch_directory
        .path()
        .join("seqforge_test.db")
        .to_string_lossy()
        .into_owned();
    let target = ConnectionTarget::LocalFile(ledger_path.clone());

    // Primera sesión: alta y bump.
    {
        let client = LedgerClient::connect(&target).await.expect("sesión 1");
        let repository = LeafAllocRepository::new(client);
        repository.create("durable", 50, "persistente").await.expect("alta");
        repository.bump_max_id("durable", 50).await.expect("bump");
    }

    // Segunda sesión sobre el mismo archivo: el estado sobrevive.
    let client = LedgerClient::connect(&target).await.expect("sesión 2");
    let repository = LeafAllocRepository::new(client);
    let row = repository.fetch("durable").await.expect("fila durable");
    assert_eq!(row.max_id, 50);
    assert_eq!(row.step, 50);
    assert_eq!(row.description.as_deref(), Some("persistente"));
}
