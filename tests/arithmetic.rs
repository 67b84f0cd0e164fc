//! Arithmetic tests (ADD/SUB/INC/DEC/NEG/MUL/DIV and their flags)

use remake86::cpu::regs::{self, F_CF, F_OF, F_SF, F_ZF};
use remake86::machine::Machine;

fn machine_with(code: &[u8]) -> Machine {
    let mut m = Machine::new();
    m.load_image(code).unwrap();
    m
}

#[test]
fn sub_reg_reg_zeroes_and_sets_zf() {
    let mut m = machine_with(&[0x29, 0xC0]); // SUB AX, AX
    m.cpu.regs.set16(regs::AX, 0x1234);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0);
    assert!(m.cpu.regs.flag(F_ZF));
}

#[test]
fn flags_across_sub_inc_add() {
    // SUB AX, AX; INC AX; ADD AL, DH
    let mut m = machine_with(&[0x29, 0xC0, 0x40, 0x00, 0xF0]);
    m.cpu.regs.set16(regs::AX, 0x1234);

    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0);
    assert!(m.cpu.regs.flag(F_ZF));

    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 1);
    assert!(!m.cpu.regs.flag(F_ZF));

    m.cpu.regs.set8(regs::AL, 0xFF);
    m.cpu.regs.set8(regs::DH, 0x02);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x01);
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn add_signed_overflow() {
    let mut m = machine_with(&[0x00, 0xD8]); // ADD AL, BL
    m.cpu.regs.set8(regs::AL, 0x7F);
    m.cpu.regs.set8(regs::BL, 0x01);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x80);
    assert!(m.cpu.regs.flag(F_OF));
    assert!(m.cpu.regs.flag(F_SF));
    assert!(!m.cpu.regs.flag(F_CF));
}

#[test]
fn adc_uses_carry_in() {
    // STC; ADC AX, BX
    let mut m = machine_with(&[0xF9, 0x11, 0xD8]);
    m.cpu.regs.set16(regs::AX, 0x0001);
    m.cpu.regs.set16(regs::BX, 0x0002);
    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x0004);
}

#[test]
fn sbb_borrows() {
    // STC; SBB AX, BX
    let mut m = machine_with(&[0xF9, 0x19, 0xD8]);
    m.cpu.regs.set16(regs::AX, 0x0005);
    m.cpu.regs.set16(regs::BX, 0x0002);
    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x0002);
}

#[test]
fn cmp_sets_carry_on_smaller_minuend() {
    let mut m = machine_with(&[0x39, 0xD8]); // CMP AX, BX
    m.cpu.regs.set16(regs::AX, 1);
    m.cpu.regs.set16(regs::BX, 2);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 1);
    assert!(m.cpu.regs.flag(F_CF));
    assert!(!m.cpu.regs.flag(F_ZF));
}

#[test]
fn inc_preserves_carry() {
    // STC; INC AX
    let mut m = machine_with(&[0xF9, 0x40]);
    m.cpu.regs.set16(regs::AX, 0xFFFF);
    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::AX), 0);
    assert!(m.cpu.regs.flag(F_ZF));
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn dec_to_zero() {
    let mut m = machine_with(&[0x49]); // DEC CX
    m.cpu.regs.set16(regs::CX, 1);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::CX), 0);
    assert!(m.cpu.regs.flag(F_ZF));
}

#[test]
fn inc_dec_rm_byte() {
    let mut m = machine_with(&[0xFE, 0x06, 0x00, 0x20, 0xFE, 0x0E, 0x00, 0x20]);
    m.mem.write(0x2000, 0x41);
    m.step(); // INC BYTE [2000h]
    assert_eq!(m.mem.read(0x2000), 0x42);
    m.step(); // DEC BYTE [2000h]
    assert_eq!(m.mem.read(0x2000), 0x41);
}

#[test]
fn neg_sets_carry_unless_zero() {
    let mut m = machine_with(&[0xF7, 0xD8, 0xF7, 0xDB]); // NEG AX; NEG BX
    m.cpu.regs.set16(regs::AX, 0x0001);
    m.cpu.regs.set16(regs::BX, 0x0000);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0xFFFF);
    assert!(m.cpu.regs.flag(F_CF));
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::BX), 0);
    assert!(!m.cpu.regs.flag(F_CF));
}

#[test]
fn mul_small_and_large() {
    let mut m = machine_with(&[0xF7, 0xE1, 0xF7, 0xE1]); // MUL CX twice
    m.cpu.regs.set16(regs::AX, 3);
    m.cpu.regs.set16(regs::CX, 5);
    m.cpu.regs.set16(regs::DX, 0x1234);

    m.step();
    assert_eq!(m.cpu.regs.get16(regs::DX), 0);
    assert_eq!(m.cpu.regs.get16(regs::AX), 15);
    assert_eq!(m.cpu.regs.get16(regs::CX), 5);
    assert!(!m.cpu.regs.flag(F_CF));
    assert!(!m.cpu.regs.flag(F_OF));

    m.cpu.regs.set16(regs::AX, 0xAA55);
    m.cpu.regs.set16(regs::CX, 0x1234);
    m.cpu.regs.set16(regs::DX, 0xFFFF);

    m.step();
    assert_eq!(m.cpu.regs.get16(regs::DX), 0x0C1C);
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x9344);
    assert!(m.cpu.regs.flag(F_CF));
    assert!(m.cpu.regs.flag(F_OF));
}

#[test]
fn mul_byte_widens_into_ax() {
    let mut m = machine_with(&[0xF6, 0xE3]); // MUL BL
    m.cpu.regs.set8(regs::AL, 0x40);
    m.cpu.regs.set8(regs::BL, 0x08);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x0200);
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn div_word_quotient_and_remainder() {
    let mut m = machine_with(&[0xF7, 0xF1]); // DIV CX
    m.cpu.regs.set16(regs::DX, 0);
    m.cpu.regs.set16(regs::AX, 17);
    m.cpu.regs.set16(regs::CX, 5);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 3);
    assert_eq!(m.cpu.regs.get16(regs::DX), 2);
}

#[test]
#[should_panic(expected = "divide by zero")]
fn div_by_zero_is_fatal() {
    let mut m = machine_with(&[0xF7, 0xF1]); // DIV CX
    m.cpu.regs.set16(regs::CX, 0);
    m.step();
}

#[test]
fn imul_signs() {
    let mut m = machine_with(&[0xF6, 0xEB]); // IMUL BL
    m.cpu.regs.set8(regs::AL, 0xFF); // -1
    m.cpu.regs.set8(regs::BL, 0x02);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0xFFFE); // -2
    assert!(!m.cpu.regs.flag(F_CF));
}
