//! Shift and rotate tests

use remake86::cpu::regs::{self, F_CF, F_OF, F_SF, F_ZF};
use remake86::machine::Machine;

fn machine_with(code: &[u8]) -> Machine {
    let mut m = Machine::new();
    m.load_image(code).unwrap();
    m
}

#[test]
fn rcl_word_rotates_through_carry() {
    let mut m = machine_with(&[0xD1, 0xD3, 0xD1, 0xD3]); // RCL BX, 1 twice
    m.cpu.regs.set16(regs::BX, 0b0101010100110101);
    m.cpu.regs.set_flag(F_CF, true);

    m.step();
    assert!(!m.cpu.regs.flag(F_CF));
    assert_eq!(m.cpu.regs.get16(regs::BX), 0b1010101001101011);

    m.step();
    assert!(m.cpu.regs.flag(F_CF));
    assert_eq!(m.cpu.regs.get16(regs::BX), 0b0101010011010110);
}

#[test]
fn rcl_byte_rotates_through_carry() {
    let mut m = machine_with(&[0xD0, 0xD2]); // RCL DL, 1
    m.cpu.regs.set8(regs::DL, 0b10011010);
    m.cpu.regs.set_flag(F_CF, true);
    m.step();
    assert!(m.cpu.regs.flag(F_CF));
    assert_eq!(m.cpu.regs.get8(regs::DL), 0b00110101);
}

#[test]
fn rcr_byte_rotates_through_carry() {
    let mut m = machine_with(&[0xD0, 0xDA]); // RCR DL, 1
    m.cpu.regs.set8(regs::DL, 0b00110101);
    m.cpu.regs.set_flag(F_CF, true);
    m.step();
    assert!(m.cpu.regs.flag(F_CF));
    assert_eq!(m.cpu.regs.get8(regs::DL), 0b10011010);
}

#[test]
fn shl_shifts_out_into_carry() {
    let mut m = machine_with(&[0xD1, 0xE0]); // SHL AX, 1
    m.cpu.regs.set16(regs::AX, 0x8001);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x0002);
    assert!(m.cpu.regs.flag(F_CF));
    // Sign changed on a count-1 shift: overflow.
    assert!(m.cpu.regs.flag(F_OF));
}

#[test]
fn shr_moves_low_bit_into_carry() {
    let mut m = machine_with(&[0xD0, 0xE8]); // SHR AL, 1
    m.cpu.regs.set8(regs::AL, 0x81);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x40);
    assert!(m.cpu.regs.flag(F_CF));
    assert!(m.cpu.regs.flag(F_OF));
    assert!(!m.cpu.regs.flag(F_SF));
}

#[test]
fn sar_keeps_the_sign() {
    let mut m = machine_with(&[0xD0, 0xF8]); // SAR AL, 1
    m.cpu.regs.set8(regs::AL, 0x82);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0xC1);
    assert!(!m.cpu.regs.flag(F_CF));
    assert!(!m.cpu.regs.flag(F_OF));
    assert!(m.cpu.regs.flag(F_SF));
}

#[test]
fn shift_count_comes_from_cl() {
    let mut m = machine_with(&[0xD3, 0xE0]); // SHL AX, CL
    m.cpu.regs.set16(regs::AX, 0x0001);
    m.cpu.regs.set8(regs::CL, 4);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x0010);
}

#[test]
fn shift_count_zero_changes_nothing() {
    let mut m = machine_with(&[0xD3, 0xE0]); // SHL AX, CL
    m.cpu.regs.set16(regs::AX, 0x8000);
    m.cpu.regs.set8(regs::CL, 0);
    m.cpu.regs.set_flag(F_CF, true);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x8000);
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn shl_to_zero_sets_zf() {
    let mut m = machine_with(&[0xD0, 0xE0]); // SHL AL, 1
    m.cpu.regs.set8(regs::AL, 0x80);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0);
    assert!(m.cpu.regs.flag(F_ZF));
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn rol_wraps_the_top_bit_around() {
    let mut m = machine_with(&[0xD0, 0xC0]); // ROL AL, 1
    m.cpu.regs.set8(regs::AL, 0x81);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x03);
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn ror_wraps_the_low_bit_around() {
    let mut m = machine_with(&[0xD0, 0xC8]); // ROR AL, 1
    m.cpu.regs.set8(regs::AL, 0x01);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x80);
    assert!(m.cpu.regs.flag(F_CF));
}

#[test]
fn shift_by_immediate_count() {
    let mut m = machine_with(&[0xC1, 0xE8, 0x08]); // SHR AX, 08h
    m.cpu.regs.set16(regs::AX, 0xAB00);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x00AB);
}
