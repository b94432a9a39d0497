//! Simulated peripheral and platform dependencies for driver tests
//!
//! [`SimState`] models just enough of the hardware to exercise the driver:
//! the initialization/sleep handshake in MSR, instant transmit completion
//! with an optional loop back into FIFO 0 and the release semantics of the
//! receive FIFOs. Everything else behaves like plain memory.

use crate::reg::{BusTiming, Fifo, Mailbox, MasterControl, Register, Registers};
use core::cell::{Cell, RefCell};
use fugit::{HertzU32, RateExtU32 as _};
use stm32f1_can_core::{CanId, Dependencies, InvalidPinConfiguration, PinMapping};

/// Stand-in peripheral identity; the address is never dereferenced because
/// tests go through [`SimRegisters`]
pub(crate) enum SimCan {}

unsafe impl CanId for SimCan {
    const ADDRESS: *const () = 0x4000_6400 as *const _;
}

const WORDS: usize = 0x320 / 4;
const RFOM: u32 = 1 << 5;
const FIFO_DEPTH: usize = 4;

pub(crate) struct SimState {
    words: [u32; WORDS],
    backlog: [[[u32; 4]; FIFO_DEPTH]; 2],
    backlog_len: [usize; 2],
}

impl SimState {
    pub(crate) fn new() -> Self {
        let mut state = Self {
            words: [0; WORDS],
            backlog: [[[0; 4]; FIFO_DEPTH]; 2],
            backlog_len: [0; 2],
        };
        // Power-on defaults: controller asleep, all transmit mailboxes empty
        state.words[Register::Mcr.offset() / 4] = 0x0001_0002;
        state.words[Register::Tsr.offset() / 4] = 0x1C00_0000;
        state.update_master_status();
        state
    }

    pub(crate) fn read(&self, register: Register) -> u32 {
        self.words[register.offset() / 4]
    }

    fn store(&mut self, register: Register, value: u32) {
        self.words[register.offset() / 4] = value;
    }

    pub(crate) fn write(&mut self, register: Register, value: u32) {
        match register {
            Register::Mcr => {
                self.store(register, value);
                self.update_master_status();
            }
            Register::Rf0r => self.release(Fifo::Fifo0, value),
            Register::Rf1r => self.release(Fifo::Fifo1, value),
            Register::Tir(mailbox) if value & 1 != 0 => {
                self.store(register, value);
                self.complete_transmission(mailbox);
            }
            _ => self.store(register, value),
        }
    }

    /// INAK mirrors the initialization request immediately; SLAK models the
    /// disconnected state and is cleared by an initialization request, which
    /// is exactly the bus-off recovery path.
    fn update_master_status(&mut self) {
        let mcr = MasterControl(self.read(Register::Mcr));
        let inak = mcr.inrq();
        let slak = mcr.sleep() && !mcr.inrq();
        let rest = self.read(Register::Msr) & !0b11;
        self.store(
            Register::Msr,
            rest | u32::from(inak) | (u32::from(slak) << 1),
        );
    }

    /// Transmission finishes instantly; in loop back mode the frame lands in
    /// FIFO 0 like a frame received off the wire.
    fn complete_transmission(&mut self, mailbox: Mailbox) {
        if BusTiming(self.read(Register::Btr)).lbkm() {
            let frame = [
                self.read(Register::Tir(mailbox)) & !1,
                self.read(Register::Tdtr(mailbox)),
                self.read(Register::Tdlr(mailbox)),
                self.read(Register::Tdhr(mailbox)),
            ];
            self.push_rx(Fifo::Fifo0, frame);
        }
    }

    /// Makes `frame` (identifier, frame info, data low, data high) pending
    /// in the given FIFO.
    pub(crate) fn push_rx(&mut self, fifo: Fifo, frame: [u32; 4]) {
        let len = self.backlog_len[fifo.index()];
        if len < FIFO_DEPTH {
            self.backlog[fifo.index()][len] = frame;
            self.backlog_len[fifo.index()] = len + 1;
        }
        self.sync_fifo(fifo);
    }

    fn release(&mut self, fifo: Fifo, value: u32) {
        if value & RFOM != 0 {
            let len = self.backlog_len[fifo.index()];
            if len > 0 {
                self.backlog[fifo.index()].rotate_left(1);
                self.backlog_len[fifo.index()] = len - 1;
            }
        }
        self.sync_fifo(fifo);
    }

    fn sync_fifo(&mut self, fifo: Fifo) {
        let len = self.backlog_len[fifo.index()];
        self.store(fifo.status(), len.min(3) as u32);
        if len > 0 {
            let frame = self.backlog[fifo.index()][0];
            self.store(Register::Rir(fifo), frame[0]);
            self.store(Register::Rdtr(fifo), frame[1]);
            self.store(Register::Rdlr(fifo), frame[2]);
            self.store(Register::Rdhr(fifo), frame[3]);
        }
    }

    /// Puts the controller into the disconnected state a bus-off event
    /// leaves behind.
    pub(crate) fn force_bus_off(&mut self) {
        let msr = self.read(Register::Msr);
        self.store(Register::Msr, msr | 0b10);
    }

    /// Marks a transmit mailbox as holding a pending frame.
    pub(crate) fn occupy_mailbox(&mut self, mailbox: Mailbox) {
        let tsr = self.read(Register::Tsr);
        self.store(Register::Tsr, tsr & !(1 << (26 + mailbox.index())));
    }
}

/// [`Registers`] implementation backed by [`SimState`]
///
/// Holds the state behind a shared `RefCell` so tests can inspect and
/// manipulate it while the driver owns the accessor, and after the driver
/// has been dropped.
pub(crate) struct SimRegisters<'s> {
    state: &'s RefCell<SimState>,
}

impl<'s> SimRegisters<'s> {
    pub(crate) fn new(state: &'s RefCell<SimState>) -> Self {
        Self { state }
    }
}

impl Registers for SimRegisters<'_> {
    fn read(&self, register: Register) -> u32 {
        self.state.borrow().read(register)
    }

    fn write(&mut self, register: Register, value: u32) {
        self.state.borrow_mut().write(register, value)
    }
}

/// Recording [`Dependencies`] implementation with an 8 MHz clock
pub(crate) struct SimDependencies<'t> {
    pub(crate) clock: HertzU32,
    pub(crate) powered: &'t Cell<bool>,
    pub(crate) interrupts_enabled: &'t Cell<bool>,
    pub(crate) pins: &'t Cell<Option<PinMapping>>,
    pub(crate) reject_pins: bool,
}

impl<'t> SimDependencies<'t> {
    pub(crate) fn new(
        powered: &'t Cell<bool>,
        interrupts_enabled: &'t Cell<bool>,
        pins: &'t Cell<Option<PinMapping>>,
    ) -> Self {
        Self {
            clock: 8.MHz(),
            powered,
            interrupts_enabled,
            pins,
            reject_pins: false,
        }
    }
}

unsafe impl<Id: CanId> Dependencies<Id> for SimDependencies<'_> {
    fn can_clock(&self) -> HertzU32 {
        self.clock
    }

    fn configure_pins(&mut self, mapping: PinMapping) -> Result<(), InvalidPinConfiguration> {
        if self.reject_pins {
            return Err(InvalidPinConfiguration);
        }
        self.pins.set(Some(mapping));
        Ok(())
    }

    fn power_on(&mut self) {
        self.powered.set(true);
    }

    fn power_off(&mut self) {
        self.powered.set(false);
    }

    fn enable_interrupts(&mut self) {
        self.interrupts_enabled.set(true);
    }

    fn disable_interrupts(&mut self) {
        self.interrupts_enabled.set(false);
    }
}
