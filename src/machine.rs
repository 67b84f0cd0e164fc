//! Machine: CPU + memory plus the pluggable surfaces
//!
//! The machine owns the interrupt table, the I/O table, and the
//! address-keyed hook map a remake shell uses to observe and patch the
//! running program. Per step, the ordering guarantee is: hooks fire
//! strictly before fetch-and-decode, which fires strictly before execute.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use crate::cpu::{regs, Cpu, DeviceRequest};
use crate::loader::{self, LoadError};
use crate::memory::Memory;

/// Handler for `INT n`. Handlers run synchronously on the emulator thread
/// and may mutate registers and memory freely; they must not re-enter
/// `step`.
pub trait InterruptHandler {
    fn handle_interrupt(&mut self, cpu: &mut Cpu, mem: &mut Memory, num: u8);
}

/// Handler for `IN`/`OUT` on a port.
pub trait IoHandler {
    fn handle_in(&mut self, port: u16) -> u8;
    fn handle_out(&mut self, port: u16, value: u8);
}

impl<T: InterruptHandler> InterruptHandler for Rc<RefCell<T>> {
    fn handle_interrupt(&mut self, cpu: &mut Cpu, mem: &mut Memory, num: u8) {
        self.borrow_mut().handle_interrupt(cpu, mem, num);
    }
}

impl<T: IoHandler> IoHandler for Rc<RefCell<T>> {
    fn handle_in(&mut self, port: u16) -> u8 {
        self.borrow_mut().handle_in(port)
    }

    fn handle_out(&mut self, port: u16, value: u8) {
        self.borrow_mut().handle_out(port, value);
    }
}

/// Callback invoked immediately before fetch of the instruction at its
/// address.
pub type Hook = Box<dyn FnMut(&mut Cpu, &mut Memory)>;

/// The emulated machine and its registration surfaces.
pub struct Machine {
    pub cpu: Cpu,
    pub mem: Memory,
    int_handlers: HashMap<u8, Box<dyn InterruptHandler>>,
    io_handlers: HashMap<u16, Box<dyn IoHandler>>,
    hooks: HashMap<u32, Hook>,
}

impl Machine {
    pub fn new() -> Self {
        Self {
            cpu: Cpu::new(),
            mem: Memory::default(),
            int_handlers: HashMap::new(),
            io_handlers: HashMap::new(),
            hooks: HashMap::new(),
        }
    }

    /// Load a `.COM` image from a byte slice and set the initial register
    /// state. Returns `(start_offset, end_offset)`.
    pub fn load_image(&mut self, image: &[u8]) -> Result<(u32, u32), LoadError> {
        self.cpu.clear_execution_state();
        loader::load_com_image(image, &mut self.mem, &mut self.cpu)
    }

    /// Load a `.COM` file.
    pub fn load_com(&mut self, path: impl AsRef<Path>) -> Result<(u32, u32), LoadError> {
        self.cpu.clear_execution_state();
        loader::load_com(path, &mut self.mem, &mut self.cpu)
    }

    /// Register the handler for one interrupt number. Registering two
    /// handlers for the same number is a programmer error.
    pub fn register_interrupt_handler(&mut self, num: u8, handler: Box<dyn InterruptHandler>) {
        let prev = self.int_handlers.insert(num, handler);
        assert!(
            prev.is_none(),
            "interrupt 0x{:02X} already has a handler",
            num
        );
    }

    /// Register the handler for one I/O port. Registering two handlers
    /// for the same port is a programmer error.
    pub fn register_io_handler(&mut self, port: u16, handler: Box<dyn IoHandler>) {
        let prev = self.io_handlers.insert(port, handler);
        assert!(prev.is_none(), "port 0x{:04X} already has a handler", port);
    }

    /// Install a hook at a linear address. At most one hook per address.
    pub fn add_hook(&mut self, address: u32, hook: Hook) {
        let prev = self.hooks.insert(address, hook);
        assert!(
            prev.is_none(),
            "address {:#07X} already has a hook",
            address
        );
    }

    /// Run one instruction: hook, fetch-and-decode, execute. If an
    /// instruction is already pending (a shell fetched it for display),
    /// only the execute phase runs.
    pub fn step(&mut self) {
        if !self.cpu.is_execute_pending() {
            let address = self.cpu.linear_cs_ip();
            if let Some(hook) = self.hooks.get_mut(&address) {
                hook(&mut self.cpu, &mut self.mem);
            }
            self.cpu.fetch_and_decode(&self.mem);
        }
        self.execute();
    }

    /// Run `n` instructions.
    pub fn step_n(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    /// Execute the pending instruction and route any device request.
    pub fn execute(&mut self) {
        match self.cpu.execute(&mut self.mem) {
            None => {}
            Some(DeviceRequest::Interrupt(num)) => match self.int_handlers.get_mut(&num) {
                Some(handler) => handler.handle_interrupt(&mut self.cpu, &mut self.mem, num),
                None => log::warn!("no handler for interrupt 0x{:02X}", num),
            },
            Some(DeviceRequest::PortIn { port }) => {
                let value = match self.io_handlers.get_mut(&port) {
                    Some(handler) => handler.handle_in(port),
                    None => {
                        log::warn!("no handler for IN on port 0x{:04X}", port);
                        0
                    }
                };
                self.cpu.regs.set8(regs::AL, value);
            }
            Some(DeviceRequest::PortOut { port, value }) => match self.io_handlers.get_mut(&port) {
                Some(handler) => handler.handle_out(port, value),
                None => log::warn!("no handler for OUT on port 0x{:04X}", port),
            },
        }
    }
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}
