//! Register protocol layer of the bxCAN peripheral
//!
//! The peripheral is a single memory-mapped block of 32-bit registers. Every
//! register the driver touches is listed in [`Register`] together with its
//! byte offset from the block base, and has a matching [`bitfield`] wrapper
//! describing its fields bit-exactly (RM0008, chapter 24).
//!
//! Access goes through the [`Registers`] trait instead of raw pointers so
//! that the rest of the driver is independent of *where* the block lives.
//! [`Hardware`] binds the trait to the fixed peripheral address; tests bind
//! it to a simulated backing store.

use bitfield::bitfield;
use core::marker::PhantomData;
use stm32f1_can_core::CanId;
use vcell::VolatileCell;

/// Number of filter banks of a connectivity-line device
pub const FILTER_BANKS: u8 = 28;

/// Transmit mailbox selector
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Mailbox {
    /// Mailbox 0, scanned first by the transmit arbiter
    Mailbox0,
    /// Mailbox 1
    Mailbox1,
    /// Mailbox 2, scanned last
    Mailbox2,
}

impl Mailbox {
    /// All mailboxes, in arbitration order
    pub const ALL: [Mailbox; 3] = [Mailbox::Mailbox0, Mailbox::Mailbox1, Mailbox::Mailbox2];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }
}

/// Receive FIFO selector
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Fifo {
    /// FIFO 0, checked first by the receive dispatcher
    Fifo0,
    /// FIFO 1
    Fifo1,
}

impl Fifo {
    /// Both FIFOs, in drain order
    pub const ALL: [Fifo; 2] = [Fifo::Fifo0, Fifo::Fifo1];

    pub(crate) const fn index(self) -> usize {
        self as usize
    }

    /// The status register (RFxR) controlling this FIFO
    pub const fn status(self) -> Register {
        match self {
            Fifo::Fifo0 => Register::Rf0r,
            Fifo::Fifo1 => Register::Rf1r,
        }
    }
}

/// One register of the peripheral block
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Register {
    /// Master control register (MCR)
    Mcr,
    /// Master status register (MSR)
    Msr,
    /// Transmit status register (TSR)
    Tsr,
    /// Receive FIFO 0 status register (RF0R)
    Rf0r,
    /// Receive FIFO 1 status register (RF1R)
    Rf1r,
    /// Interrupt enable register (IER)
    Ier,
    /// Error status register (ESR)
    Esr,
    /// Bit timing register (BTR)
    Btr,
    /// Mailbox identifier register (TIxR)
    Tir(Mailbox),
    /// Mailbox data length and time stamp register (TDTxR)
    Tdtr(Mailbox),
    /// Mailbox data low register, payload bytes 0..=3 (TDLxR)
    Tdlr(Mailbox),
    /// Mailbox data high register, payload bytes 4..=7 (TDHxR)
    Tdhr(Mailbox),
    /// FIFO identifier register (RIxR)
    Rir(Fifo),
    /// FIFO data length and time stamp register (RDTxR)
    Rdtr(Fifo),
    /// FIFO data low register (RDLxR)
    Rdlr(Fifo),
    /// FIFO data high register (RDHxR)
    Rdhr(Fifo),
    /// Filter master register (FMR)
    Fmr,
    /// Filter mode register, mask/list per bank (FM1R)
    Fm1r,
    /// Filter scale register, dual 16-bit/single 32-bit per bank (FS1R)
    Fs1r,
    /// Filter FIFO assignment register (FFA1R)
    Ffa1r,
    /// Filter activation register (FA1R)
    Fa1r,
    /// First bank register of a filter bank (FiRx1)
    Fr1(u8),
    /// Second bank register of a filter bank (FiRx2)
    Fr2(u8),
}

impl Register {
    /// Byte offset of the register from the peripheral base address
    pub const fn offset(self) -> usize {
        match self {
            Register::Mcr => 0x000,
            Register::Msr => 0x004,
            Register::Tsr => 0x008,
            Register::Rf0r => 0x00C,
            Register::Rf1r => 0x010,
            Register::Ier => 0x014,
            Register::Esr => 0x018,
            Register::Btr => 0x01C,
            Register::Tir(m) => 0x180 + 0x10 * m.index(),
            Register::Tdtr(m) => 0x184 + 0x10 * m.index(),
            Register::Tdlr(m) => 0x188 + 0x10 * m.index(),
            Register::Tdhr(m) => 0x18C + 0x10 * m.index(),
            Register::Rir(f) => 0x1B0 + 0x10 * f.index(),
            Register::Rdtr(f) => 0x1B4 + 0x10 * f.index(),
            Register::Rdlr(f) => 0x1B8 + 0x10 * f.index(),
            Register::Rdhr(f) => 0x1BC + 0x10 * f.index(),
            Register::Fmr => 0x200,
            Register::Fm1r => 0x204,
            Register::Fs1r => 0x20C,
            Register::Ffa1r => 0x214,
            Register::Fa1r => 0x21C,
            Register::Fr1(bank) => {
                debug_assert!(bank < FILTER_BANKS);
                0x240 + 0x8 * bank as usize
            }
            Register::Fr2(bank) => {
                debug_assert!(bank < FILTER_BANKS);
                0x244 + 0x8 * bank as usize
            }
        }
    }
}

/// Raw access to the peripheral registers
///
/// The driver performs every register access through this trait, which allows
/// tests to substitute a simulated backing store for the memory-mapped block.
pub trait Registers {
    /// Reads the current value of `register`
    fn read(&self, register: Register) -> u32;

    /// Replaces the whole value of `register`
    ///
    /// Only used where the hardware semantics are "write value to replace"
    /// (mailbox identifier/data words); everything else goes through
    /// [`Self::modify`].
    fn write(&mut self, register: Register, value: u32);

    /// Read-modify-write of `register`
    ///
    /// Bits that `f` leaves alone, reserved ones included, are written back
    /// unchanged.
    fn modify<F: FnOnce(u32) -> u32>(&mut self, register: Register, f: F) {
        let value = self.read(register);
        self.write(register, f(value));
    }
}

/// [`Registers`] implementation backed by the memory-mapped block of `Id`
pub struct Hardware<Id> {
    _marker: PhantomData<Id>,
}

impl<Id: CanId> Hardware<Id> {
    /// # Safety
    /// The caller must have unique ownership of the register block of `Id`;
    /// two live instances for the same `Id` alias the peripheral.
    pub unsafe fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }

    fn cell(register: Register) -> &'static VolatileCell<u32> {
        // Safety: `CanId` guarantees that ADDRESS points at a valid register
        // block and `offset` stays within it.
        unsafe { &*((Id::ADDRESS as usize + register.offset()) as *const VolatileCell<u32>) }
    }
}

impl<Id: CanId> Registers for Hardware<Id> {
    fn read(&self, register: Register) -> u32 {
        Self::cell(register).get()
    }

    fn write(&mut self, register: Register, value: u32) {
        Self::cell(register).set(value)
    }
}

/// Identity of the CAN1 peripheral of STM32F1 devices
pub enum Can1 {}

// Safety: 0x4000_6400 is the CAN1 block on every F1 part (RM0008 table 3).
unsafe impl CanId for Can1 {
    const ADDRESS: *const () = 0x4000_6400 as *const _;
}

bitfield! {
    /// Master control register (MCR)
    #[derive(Copy, Clone)]
    pub struct MasterControl(u32);
    impl Debug;
    /// Initialization request; frame traffic is halted while set
    pub inrq, set_inrq: 0;
    /// Sleep mode request
    pub sleep, set_sleep: 1;
    /// No automatic retransmission
    pub nart, set_nart: 4;
    /// Automatic bus-off management
    pub abom, set_abom: 6;
    /// Freeze reception/transmission during debug
    pub dbf, set_dbf: 16;
}

bitfield! {
    /// Master status register (MSR)
    #[derive(Copy, Clone)]
    pub struct MasterStatus(u32);
    impl Debug;
    /// Initialization acknowledge; hardware confirms entry/exit of
    /// initialization mode through this bit
    pub inak, set_inak: 0;
    /// Sleep acknowledge
    pub slak, set_slak: 1;
    /// Error interrupt pending
    pub erri, set_erri: 2;
    /// Wakeup interrupt pending
    pub wkui, set_wkui: 3;
    /// Sleep acknowledge interrupt pending
    pub slaki, set_slaki: 4;
}

bitfield! {
    /// Transmit status register (TSR)
    #[derive(Copy, Clone)]
    pub struct TransmitStatus(u32);
    impl Debug;
    /// Request completed, mailbox 0
    pub rqcp0, set_rqcp0: 0;
    /// Transmission OK, mailbox 0
    pub txok0, set_txok0: 1;
    /// Request completed, mailbox 1
    pub rqcp1, set_rqcp1: 8;
    /// Transmission OK, mailbox 1
    pub txok1, set_txok1: 9;
    /// Request completed, mailbox 2
    pub rqcp2, set_rqcp2: 16;
    /// Transmission OK, mailbox 2
    pub txok2, set_txok2: 17;
    /// Number of the next free mailbox
    pub u8, code, set_code: 25, 24;
    /// Mailbox 0 empty
    pub tme0, set_tme0: 26;
    /// Mailbox 1 empty
    pub tme1, set_tme1: 27;
    /// Mailbox 2 empty
    pub tme2, set_tme2: 28;
}

impl TransmitStatus {
    /// Returns `true` when the given mailbox is free for a new frame
    pub fn mailbox_empty(&self, mailbox: Mailbox) -> bool {
        match mailbox {
            Mailbox::Mailbox0 => self.tme0(),
            Mailbox::Mailbox1 => self.tme1(),
            Mailbox::Mailbox2 => self.tme2(),
        }
    }
}

bitfield! {
    /// Receive FIFO status register (RF0R/RF1R)
    #[derive(Copy, Clone)]
    pub struct FifoStatus(u32);
    impl Debug;
    /// Number of pending frames (0..=3)
    pub u8, fmp, set_fmp: 1, 0;
    /// Three frames are stored in the FIFO
    pub full, set_full: 3;
    /// A frame was lost because the FIFO was full
    pub fovr, set_fovr: 4;
    /// Release the output mailbox; the next pending frame becomes readable
    pub rfom, set_rfom: 5;
}

bitfield! {
    /// Interrupt enable register (IER)
    #[derive(Copy, Clone)]
    pub struct InterruptEnable(u32);
    impl Debug;
    /// Transmit mailbox empty
    pub tmeie, set_tmeie: 0;
    /// FIFO 0 message pending
    pub fmpie0, set_fmpie0: 1;
    /// FIFO 0 full
    pub ffie0, set_ffie0: 2;
    /// FIFO 0 overrun
    pub fovie0, set_fovie0: 3;
    /// FIFO 1 message pending
    pub fmpie1, set_fmpie1: 4;
    /// FIFO 1 full
    pub ffie1, set_ffie1: 5;
    /// FIFO 1 overrun
    pub fovie1, set_fovie1: 6;
    /// Error warning
    pub ewgie, set_ewgie: 8;
    /// Error passive
    pub epvie, set_epvie: 9;
    /// Bus-off
    pub bofie, set_bofie: 10;
    /// Last error code
    pub lecie, set_lecie: 11;
    /// Error
    pub errie, set_errie: 15;
    /// Wakeup
    pub wkuie, set_wkuie: 16;
    /// Sleep
    pub slkie, set_slkie: 17;
}

bitfield! {
    /// Error status register (ESR)
    #[derive(Copy, Clone)]
    pub struct ErrorStatus(u32);
    impl Debug;
    /// Error warning flag (one of the counters reached 96)
    pub ewgf, _: 0;
    /// Error passive flag (one of the counters passed 127)
    pub epvf, _: 1;
    /// Bus-off flag (transmit error counter passed 255)
    pub boff, _: 2;
    /// Last error code
    pub u8, lec, set_lec: 6, 4;
    /// Transmit error counter
    pub u8, tec, _: 23, 16;
    /// Receive error counter
    pub u8, rec, _: 31, 24;
}

bitfield! {
    /// Bit timing register (BTR)
    #[derive(Copy, Clone)]
    pub struct BusTiming(u32);
    impl Debug;
    /// Baud rate prescaler, quantum length is `(brp + 1)` clock periods
    pub u16, brp, set_brp: 9, 0;
    /// Time segment 1 in quanta, minus one
    pub u8, ts1, set_ts1: 19, 16;
    /// Time segment 2 in quanta, minus one
    pub u8, ts2, set_ts2: 22, 20;
    /// Resynchronization jump width in quanta, minus one
    pub u8, sjw, set_sjw: 25, 24;
    /// Loop back mode (self test)
    pub lbkm, set_lbkm: 30;
    /// Silent mode
    pub silm, set_silm: 31;
}

bitfield! {
    /// Filter master register (FMR)
    #[derive(Copy, Clone)]
    pub struct FilterMaster(u32);
    impl Debug;
    /// Filter bank initialization mode; banks are writable while set
    pub finit, set_finit: 0;
    /// First bank assigned to CAN2 on dual-CAN devices
    pub u8, can2sb, set_can2sb: 13, 8;
}

bitfield! {
    /// Mailbox/FIFO identifier word (TIxR/RIxR)
    #[derive(Copy, Clone)]
    pub struct MailboxIdentifier(u32);
    impl Debug;
    /// Transmit request (transmit side only; reserved on the receive side)
    pub txrq, set_txrq: 0;
    /// Remote transmission request
    pub rtr, set_rtr: 1;
    /// Identifier extension; extended 29-bit frame when set
    pub ide, set_ide: 2;
    /// Extended identifier
    pub u32, exid, set_exid: 31, 3;
    /// Standard identifier
    pub u16, stid, set_stid: 31, 21;
}

bitfield! {
    /// Mailbox/FIFO frame information word (TDTxR/RDTxR)
    #[derive(Copy, Clone)]
    pub struct FrameInfo(u32);
    impl Debug;
    /// Data length code
    pub u8, dlc, set_dlc: 3, 0;
    /// Index of the filter that accepted the frame (receive side)
    pub u8, fmi, set_fmi: 15, 8;
    /// Message time stamp
    pub u16, time, set_time: 31, 16;
}
