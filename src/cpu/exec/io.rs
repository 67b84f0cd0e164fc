//! Port I/O handlers (IN, OUT)
//!
//! The port number is either an immediate byte or DX. The executor cannot
//! complete the access itself; it hands a [`DeviceRequest`] to the machine
//! layer, which consults the I/O table and stores any IN result in AL.

use crate::cpu::decode::Prepared;
use crate::cpu::exec::DeviceRequest;
use crate::cpu::Cpu;
use crate::memory::Memory;

fn port(cpu: &Cpu, mem: &Memory, p: &Prepared) -> u16 {
    match p.warg2 {
        Some(arg) => cpu.read_warg(mem, arg),
        None => cpu.read_barg(mem, p.b2()) as u16,
    }
}

pub fn in_b(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) -> DeviceRequest {
    DeviceRequest::PortIn {
        port: port(cpu, mem, p),
    }
}

pub fn out_b(cpu: &mut Cpu, mem: &mut Memory, p: &Prepared) -> DeviceRequest {
    DeviceRequest::PortOut {
        port: port(cpu, mem, p),
        value: cpu.read_barg(mem, p.b1()),
    }
}
