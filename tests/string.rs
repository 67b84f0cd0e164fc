//! String operation tests (MOVS, CMPS, STOS, LODS, SCAS, REP)

use remake86::cpu::regs::{self, F_DF, F_ZF};
use remake86::machine::Machine;

fn machine_with(code: &[u8]) -> Machine {
    let mut m = Machine::new();
    m.load_image(code).unwrap();
    m
}

fn set_string_regs(m: &mut Machine) {
    m.cpu.regs.set16(regs::DS, 0x1000);
    m.cpu.regs.set16(regs::SI, 0x0011);
    m.cpu.regs.set16(regs::ES, 0x1100);
    m.cpu.regs.set16(regs::DI, 0x0022);
}

#[test]
fn movsb_copies_one_byte() {
    let mut m = machine_with(&[0xFC, 0xA4]); // CLD; MOVSB
    set_string_regs(&mut m);
    m.mem.write(0x10011, 0x12);
    m.mem.write(0x11022, 0x00);

    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x0012);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0023);
    assert_eq!(m.mem.read(0x11022), 0x12);
}

#[test]
fn rep_movsb_copies_cx_bytes() {
    let mut m = machine_with(&[0xFC, 0xF3, 0xA4]); // CLD; REP MOVSB
    set_string_regs(&mut m);
    m.cpu.regs.set16(regs::CX, 3);
    m.mem.write(0x10011, 0x11);
    m.mem.write(0x10012, 0x22);
    m.mem.write(0x10013, 0x33);

    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x0014);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0025);
    assert_eq!(m.mem.read(0x11022), 0x11);
    assert_eq!(m.mem.read(0x11023), 0x22);
    assert_eq!(m.mem.read(0x11024), 0x33);
    assert_eq!(m.cpu.regs.get16(regs::CX), 0);
}

#[test]
fn rep_cmpsb_stops_at_first_mismatch() {
    let mut m = machine_with(&[0xFC, 0xF3, 0xA6]); // CLD; REPE CMPSB
    set_string_regs(&mut m);
    m.cpu.regs.set16(regs::CX, 3);
    m.mem.write(0x10011, 0x11);
    m.mem.write(0x10012, 0x22);
    m.mem.write(0x10013, 0x33);
    m.mem.write(0x11022, 0x11);
    m.mem.write(0x11023, 0x00); // mismatch on the second byte
    m.mem.write(0x11024, 0x33);

    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x0011 + 2);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0022 + 2);
    assert_eq!(m.cpu.regs.get16(regs::CX), 1);
    assert!(!m.cpu.regs.flag(F_ZF));
}

#[test]
fn rep_stosb_fills() {
    let mut m = machine_with(&[0xFC, 0xF3, 0xAA]); // CLD; REP STOSB
    set_string_regs(&mut m);
    m.cpu.regs.set8(regs::AL, 0x5A);
    m.cpu.regs.set16(regs::CX, 4);

    m.step_n(2);
    for i in 0..4 {
        assert_eq!(m.mem.read(0x11022 + i), 0x5A);
    }
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0026);
    assert_eq!(m.cpu.regs.get16(regs::CX), 0);
}

#[test]
fn lodsb_loads_al() {
    let mut m = machine_with(&[0xFC, 0xAC]); // CLD; LODSB
    set_string_regs(&mut m);
    m.mem.write(0x10011, 0x77);
    m.step_n(2);
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x77);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x0012);
}

#[test]
fn repne_scasb_finds_a_byte() {
    let mut m = machine_with(&[0xFC, 0xF2, 0xAE]); // CLD; REPNE SCASB
    set_string_regs(&mut m);
    m.cpu.regs.set8(regs::AL, 0x33);
    m.cpu.regs.set16(regs::CX, 10);
    m.mem.write(0x11022, 0x11);
    m.mem.write(0x11023, 0x22);
    m.mem.write(0x11024, 0x33); // found here

    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0025);
    assert_eq!(m.cpu.regs.get16(regs::CX), 7);
    assert!(m.cpu.regs.flag(F_ZF));
}

#[test]
fn movsw_moves_words_and_honors_df() {
    let mut m = machine_with(&[0xFD, 0xA5]); // STD; MOVSW
    set_string_regs(&mut m);
    m.mem.write_u16(0x10011, 0xCAFE);
    m.step_n(2);
    assert!(m.cpu.regs.flag(F_DF));
    assert_eq!(m.mem.read_u16(0x11022), 0xCAFE);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x0011 - 2);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0022 - 2);
}

#[test]
fn movsb_source_honors_segment_override() {
    let mut m = machine_with(&[0xFC, 0x26, 0xA4]); // CLD; ES: MOVSB
    set_string_regs(&mut m);
    // Source reads ES:SI instead of DS:SI; destination stays ES:DI.
    m.mem.write(0x10011, 0xAA); // DS:SI, must not be used
    m.mem.write(0x11011, 0xBB); // ES:SI
    m.step_n(2);
    assert_eq!(m.mem.read(0x11022), 0xBB);
}

#[test]
fn rep_with_cx_zero_does_nothing() {
    let mut m = machine_with(&[0xFC, 0xF3, 0xA4]); // CLD; REP MOVSB
    set_string_regs(&mut m);
    m.cpu.regs.set16(regs::CX, 0);
    m.mem.write(0x11022, 0x99);
    m.step_n(2);
    assert_eq!(m.mem.read(0x11022), 0x99);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x0011);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x0022);
}
