// [libs/domain/models-rs/src/tests_serialization.rs]
/**
 * =================================================================
 * APARATO: DOMAIN SERIALIZATION TEST (V9.0 - INTEGRATION LEVEL)
 * CLASIFICACIÓN: TRINITY EVIDENCE (ESTRATO L2-MODELS)
 * RESPONSABILIDAD: CERTIFICACIÓN DE PARIDAD JSON DEL PROTOCOLO v1
 *
 * # Logic:
 * El cliente de examen habla camelCase y taxonomía textual abierta.
 * Estas pruebas certifican que la frontera serde reproduce el contrato
 * normativo bit a bit: claves, discriminadores y códigos de severidad.
 * =================================================================
 */
