//! Tests for instruction, operand and terminator queries

use crate::testing::{bb, var};
use crate::{FunctionId, Instruction, Literal, Operand, Terminator};

#[test]
fn test_result_and_defined_register() {
    let x = var(0);
    let base = var(1);

    let mov = Instruction::mov(Operand::vreg(x), Operand::integer(1));
    assert_eq!(mov.result(), Some(Operand::vreg(x)));
    assert_eq!(mov.defined_register(), Some(x));

    // Results that are not virtual registers define nothing
    let to_machine = Instruction::mov(Operand::mreg(0), Operand::vreg(x));
    assert_eq!(to_machine.result(), Some(Operand::mreg(0)));
    assert_eq!(to_machine.defined_register(), None);

    let to_memory = Instruction::load(Operand::memory(base, 0), Operand::vreg(x));
    assert_eq!(to_memory.defined_register(), None);

    let store = Instruction::store(Operand::vreg(base), Operand::vreg(x));
    assert_eq!(store.result(), None);

    let void_call = Instruction::call(None, FunctionId::from_raw(0), vec![]);
    assert_eq!(void_call.result(), None);

    assert_eq!(Instruction::nop().result(), None);
    assert!(Instruction::nop().is_empty());
    assert!(!mov.is_empty());
}

#[test]
fn test_phi_construction() {
    let x = var(7);
    let phi = Instruction::phi(x, &[bb(4), bb(2), bb(4)]);

    assert!(phi.is_phi());
    assert_eq!(phi.defined_register(), Some(x));
    assert_eq!(phi.operand_count(), 3);

    let sources: Vec<_> = phi.phi_sources().unwrap().collect();
    assert_eq!(
        sources,
        vec![
            (bb(4), Operand::vreg(x)),
            (bb(2), Operand::vreg(x)),
            (bb(4), Operand::vreg(x)),
        ]
    );

    assert!(Instruction::nop().phi_sources().is_none());
}

#[test]
fn test_operand_predicates() {
    let x = var(3);

    assert!(Operand::vreg(x).is_virtual_register());
    assert!(Operand::mreg(1).is_machine_register());
    assert!(Operand::integer(1).is_constant());
    assert!(Operand::memory(x, 0).is_memory());

    assert_eq!(Operand::vreg(x).as_virtual_register(), Some(x));
    assert_eq!(Operand::memory(x, 0).as_virtual_register(), None);

    assert_eq!(Operand::from(true), Operand::Constant(Literal::Boolean(true)));
    assert_eq!(Operand::from(x), Operand::vreg(x));
    assert_eq!(Operand::Constant(Literal::Null).to_string(), "null");
}

#[test]
fn test_terminator_targets() {
    assert_eq!(Terminator::jump(bb(1)).target_blocks(), vec![bb(1)]);
    assert_eq!(
        Terminator::branch(Operand::boolean(true), bb(2), bb(2)).target_blocks(),
        vec![bb(2), bb(2)]
    );
    assert_eq!(
        Terminator::switch(Operand::integer(0), vec![bb(3), bb(1)], bb(2)).target_blocks(),
        vec![bb(3), bb(1), bb(2)]
    );
    assert!(Terminator::return_void().target_blocks().is_empty());
    assert!(Terminator::return_void().ends_function());
    assert!(Terminator::branch(Operand::vreg(var(0)), bb(1), bb(2)).is_conditional());
}
