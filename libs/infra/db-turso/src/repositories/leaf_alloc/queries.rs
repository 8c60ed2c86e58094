// [libs/infra/db-turso/src/repositories/leaf_alloc/queries.rs]
/*!
 * =================================================================
 * APARATO: LEAF ALLOC SQL STORE
 * CLASIFICACIÓN: INFRASTRUCTURE SQL (ESTRATO L3)
 * RESPONSABILIDAD: DEFINICIÓN DE SENTENCIAS ATÓMICAS DEL LEDGER
 * =================================================================
 */

/// Lectura plana de una fila. No toma candados: las consultas de estado
/// jamás deben bloquear al bump.
pub const SELECT_LEAF_ALLOC: &str = r#"
    SELECT biz_tag, max_id, step, description, update_time, auto_clean
    FROM leaf_alloc
    WHERE biz_tag = ?1
"#;

/// Lectura dentro de la transacción de bump. SQLite carece de
/// `FOR UPDATE`: el candado de escritura lo aporta la transacción
/// abierta con comportamiento IMMEDIATE.
pub const SELECT_LEAF_ALLOC_FOR_BUMP: &str = r#"
    SELECT biz_tag, max_id, step, description, update_time, auto_clean
    FROM leaf_alloc
    WHERE biz_tag = ?1
"#;

/// Sella la ventana recién acuñada: nuevo máximo, paso aplicado y marca
/// temporal mantenida por el motor.
pub const APPLY_BUMP: &str = r#"
    UPDATE leaf_alloc
    SET max_id = ?2,
        step = ?3,
        update_time = CURRENT_TIMESTAMP
    WHERE biz_tag = ?1
"#;

/// Alta de una etiqueta. El contador arranca en 0: la primera ventana
/// acuñada será `[1, step]`.
pub const INSERT_LEAF_ALLOC: &str = r#"
    INSERT INTO leaf_alloc (biz_tag, max_id, step, description, auto_clean)
    VALUES (?1, 0, ?2, ?3, 0)
"#;

/// Actualización manual del paso persistido.
pub const UPDATE_STEP: &str = r#"
    UPDATE leaf_alloc
    SET step = ?2,
        update_time = CURRENT_TIMESTAMP
    WHERE biz_tag = ?1
"#;

pub const DELETE_LEAF_ALLOC: &str = r#"
    DELETE FROM leaf_alloc
    WHERE biz_tag = ?1
"#;

pub const LIST_BIZ_TAGS: &str = r#"
    SELECT biz_tag
    FROM leaf_alloc
    ORDER BY biz_tag ASC
"#;
