//! Basic data transfer tests (MOV, XCHG, LEA, XLAT, CBW/CWD)

use remake86::cpu::regs;
use remake86::machine::Machine;

fn machine_with(code: &[u8]) -> Machine {
    let mut m = Machine::new();
    m.load_image(code).unwrap();
    m
}

#[test]
fn nop_advances_ip() {
    let mut m = machine_with(&[0x90]);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::IP), 0x0101);
}

#[test]
fn mov_r16_imm() {
    let mut m = machine_with(&[0xB8, 0x34, 0x12, 0xB9, 0x78, 0x56]);

    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x1234);
    assert_eq!(m.cpu.regs.get16(regs::IP), 0x0103);

    m.step();
    assert_eq!(m.cpu.regs.get16(regs::CX), 0x5678);
    assert_eq!(m.cpu.regs.get16(regs::IP), 0x0106);
}

#[test]
fn mov_r16_imm_all_registers() {
    let mut m = machine_with(&[
        0xB8, 0x11, 0x11, // MOV AX, 1111h
        0xB9, 0x22, 0x22, // MOV CX, 2222h
        0xBA, 0x33, 0x33, // MOV DX, 3333h
        0xBB, 0x44, 0x44, // MOV BX, 4444h
        0xBC, 0x55, 0x55, // MOV SP, 5555h
        0xBD, 0x66, 0x66, // MOV BP, 6666h
        0xBE, 0x77, 0x77, // MOV SI, 7777h
        0xBF, 0x88, 0x88, // MOV DI, 8888h
    ]);
    m.step_n(8);
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x1111);
    assert_eq!(m.cpu.regs.get16(regs::CX), 0x2222);
    assert_eq!(m.cpu.regs.get16(regs::DX), 0x3333);
    assert_eq!(m.cpu.regs.get16(regs::BX), 0x4444);
    assert_eq!(m.cpu.regs.get16(regs::SP), 0x5555);
    assert_eq!(m.cpu.regs.get16(regs::BP), 0x6666);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x7777);
    assert_eq!(m.cpu.regs.get16(regs::DI), 0x8888);
}

#[test]
fn mov_r8_imm_byte_halves() {
    let mut m = machine_with(&[0xB4, 0x12, 0xB0, 0x34]); // MOV AH, 12h; MOV AL, 34h
    m.step_n(2);
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x1234);
    assert_eq!(m.cpu.regs.get8(regs::AH), 0x12);
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x34);
}

#[test]
fn mov_r16_direct_address() {
    let mut m = machine_with(&[0x8B, 0x2E, 0x72, 0x04]); // MOV BP, [0472h]
    m.mem.write_u16(0x0472, 0xABCD);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::BP), 0xABCD);
    assert_eq!(m.cpu.regs.get16(regs::IP), 0x0104);
}

#[test]
fn mov_mem_reg_with_segment_override() {
    // MOV [1122h], SP then MOV ES:[1122h], SP
    let mut m = machine_with(&[
        0x89, 0x26, 0x22, 0x11, // MOV [1122h], SP
        0x26, 0x89, 0x26, 0x22, 0x11, // MOV ES:[1122h], SP
    ]);
    m.cpu.regs.set16(regs::SP, 0x1234);
    m.cpu.regs.set16(regs::DS, 0);

    m.step();
    assert_eq!(m.mem.read(0x1122), 0x34);
    assert_eq!(m.mem.read(0x1123), 0x12);

    m.cpu.regs.set16(regs::SP, 0x5678);
    m.cpu.regs.set16(regs::ES, 0x0100);
    m.step();
    // The unprefixed write is untouched; the prefixed one lands at
    // (ES << 4) + 1122h.
    assert_eq!(m.mem.read(0x1122), 0x34);
    assert_eq!(m.mem.read(0x1123), 0x12);
    assert_eq!(m.mem.read(0x2122), 0x78);
    assert_eq!(m.mem.read(0x2123), 0x56);
}

#[test]
fn mov_accumulator_moffs() {
    let mut m = machine_with(&[0xA0, 0x00, 0x20, 0xA3, 0x02, 0x20]); // MOV AL, [2000h]; MOV [2002h], AX
    m.mem.write(0x2000, 0x7F);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x7F);
    m.step();
    assert_eq!(m.mem.read_u16(0x2002), 0x007F);
}

#[test]
fn xchg_r16_rm() {
    let mut m = machine_with(&[0x87, 0xF3]); // XCHG SI, BX
    m.cpu.regs.set16(regs::SI, 0x1234);
    m.cpu.regs.set16(regs::BX, 0x5678);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::BX), 0x1234);
    assert_eq!(m.cpu.regs.get16(regs::SI), 0x5678);
}

#[test]
fn xchg_ax_r16() {
    let mut m = machine_with(&[0x93]); // XCHG AX, BX
    m.cpu.regs.set16(regs::AX, 0x1111);
    m.cpu.regs.set16(regs::BX, 0x2222);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x2222);
    assert_eq!(m.cpu.regs.get16(regs::BX), 0x1111);
}

#[test]
fn lea_binds_the_offset_not_memory() {
    let mut m = machine_with(&[0x8D, 0x42, 0x05]); // LEA AX, [BP+SI+5h]
    m.cpu.regs.set16(regs::BP, 0x0100);
    m.cpu.regs.set16(regs::SI, 0x0020);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0x0125);
}

#[test]
fn mov_to_segment_register() {
    let mut m = machine_with(&[0x8E, 0xD8]); // MOV DS, AX
    m.cpu.regs.set16(regs::AX, 0x2345);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::DS), 0x2345);
}

#[test]
fn xlat_translates_through_bx() {
    let mut m = machine_with(&[0xD7]); // XLAT
    m.cpu.regs.set16(regs::BX, 0x2000);
    m.cpu.regs.set8(regs::AL, 0x05);
    m.mem.write(0x2005, 0x99);
    m.step();
    assert_eq!(m.cpu.regs.get8(regs::AL), 0x99);
}

#[test]
fn cbw_and_cwd_sign_extend() {
    let mut m = machine_with(&[0x98, 0x99]); // CBW; CWD
    m.cpu.regs.set8(regs::AL, 0xE8);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::AX), 0xFFE8);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::DX), 0xFFFF);
}

#[test]
fn lds_loads_offset_and_segment() {
    let mut m = machine_with(&[0xC5, 0x1E, 0x00, 0x20]); // LDS BX, [2000h]
    m.mem.write_u16(0x2000, 0x1234);
    m.mem.write_u16(0x2002, 0x5678);
    m.step();
    assert_eq!(m.cpu.regs.get16(regs::BX), 0x1234);
    assert_eq!(m.cpu.regs.get16(regs::DS), 0x5678);
}
