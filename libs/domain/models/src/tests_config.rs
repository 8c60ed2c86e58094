// [libs/domain/models/src/tests_config.rs]
/**
 * =================================================================
 * APARATO: CONFIGURATION GRAMMAR TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE DEFAULTS Y VALIDACIÓN SEMÁNTICA
 * =================================================================
 */
