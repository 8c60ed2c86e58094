// [tests/mirror/libs/core/segment/buffer_protocol.test.rs]
/**
 * =================================================================
 * APARATO: BUFFER PROTOCOL TEST
 * CLASIFICACIÓN: TRINITY EVIDENCE // ESTRATO L2-MIRROR
 * RESPONSABILIDAD: CERTIFICACIÓN DEL PROTOCOLO DE DOBLE BUFFER
 * =================================================================
 */

use seqforge_core_segment::{Segment, SegmentBuffer, SegmentFault};

fn drain_current(buffer: &SegmentBuffer) {
    while buffer.get_id().is_ok() {}
}

#[test]
fn certify_uninitialized_buffer_rejects_allocation() {
    let buffer = SegmentBuffer::new("order", 1000);

    assert!(!buffer.is_initialized());
    assert_eq!(buffer.get_id(), Err(SegmentFault::NotAvailable));
    assert!(!buffer.should_preload(0.5));
    assert!(!buffer.can_switch_to_next());

    let status = buffer.status();
    assert!(!status.init_ok);
    assert!(status.slots[0].is_none() && status.slots[1].is_none());
}

#[test]
fn certify_install_swap_cycle() {
    println!("\n🔁 [PROVING_GROUNDS]: Auditing dual-buffer swap protocol...");

    let buffer = SegmentBuffer::new("order", 10);
    buffer.install_first(Segment::new(1, 10, 10), 10);

    assert!(buffer.is_initialized());
    assert_eq!(buffer.get_id(), Ok(1));

    // Sin slot siguiente listo no hay swap posible.
    assert!(!buffer.can_switch_to_next());
    assert!(!buffer.switch_to_next());

    // Precarga simulada: el slot inactivo recibe la ventana (10, 20].
    buffer.set_next_segment(Segment::new(11, 20, 10), 10);
    let staged_status = buffer.status();
    assert!(staged_status.next_ready);
    assert_eq!(staged_status.current_pos, 0);

    // Con el activo aún disponible el swap sigue vetado.
    assert!(!buffer.switch_to_next());

    drain_current(&buffer);
    assert!(buffer.can_switch_to_next());
    assert!(buffer.switch_to_next());

    // Tras el swap: slot 1 activo, bandera next_ready limpia, y el
    // segundo intento de swap es rechazado.
    let swapped_status = buffer.status();
    assert_eq!(swapped_status.current_pos, 1);
    assert!(!swapped_status.next_ready);
    assert!(!buffer.switch_to_next());

    assert_eq!(buffer.get_id(), Ok(11));
    println!("   ✅ [SUCCESS]: Swap protocol levelized.");
}

#[test]
fn certify_preload_predicate_thresholds() {
    let buffer = SegmentBuffer::new("order", 10);
    buffer.install_first(Segment::new(1, 10, 10), 10);

    for _ in 0..8 {
        buffer.get_id().expect("ventana con remanente");
    }

    // Ratio 0.8: dispara con umbral 0.8, no con 0.9.
    assert!(buffer.should_preload(0.8));
    assert!(!buffer.should_preload(0.9));

    // Con el slot siguiente ya listo la precarga queda vetada.
    buffer.set_next_segment(Segment::new(11, 20, 10), 10);
    assert!(!buffer.should_preload(0.8));
}

#[test]
fn certify_manual_step_override_flow() {
    let buffer = SegmentBuffer::new("order", 100);
    buffer.install_first(Segment::new(1, 100, 100), 100);

    let baseline = buffer.refill_basis();
    assert_eq!(baseline.step, 100);
    assert!(!baseline.manual_override);
    assert!(baseline.elapsed_since_last_refill.is_some());

    buffer.apply_manual_step(500);
    let overridden = buffer.refill_basis();
    assert_eq!(overridden.step, 500);
    assert!(overridden.manual_override);
    assert_eq!(buffer.step(), 500);

    // La instalación de la siguiente ventana consume la sobrescritura.
    buffer.set_next_segment(Segment::new(101, 600, 500), 500);
    let consumed = buffer.refill_basis();
    assert!(!consumed.manual_override);
    assert_eq!(consumed.step, 500);
}

#[test]
fn certify_access_bookkeeping() {
    let buffer = SegmentBuffer::new("order", 10);
    buffer.note_access();
    // Recién sellado: la ociosidad observada es prácticamente nula.
    assert!(buffer.idle_seconds() <= 1);
}
