//! The CAN bus driver

use crate::config::{BitTiming, BitTimingError, CanConfig};
use crate::filter;
use crate::interrupt;
use crate::message::Message;
use crate::reg::{
    BusTiming, ErrorStatus, Hardware, MasterControl, MasterStatus, Register, Registers,
};
use crate::rx_fifo;
use crate::tx_mailboxes;
use core::marker::PhantomData;
use core::ops::{Deref, DerefMut};
use stm32f1_can_core::{CanId, Dependencies, InvalidPinConfiguration, PinMapping};

/// Errors that may occur during configuration
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ConfigurationError {
    /// The requested bitrate cannot be derived from the peripheral clock
    BitTiming(BitTimingError),
    /// The requested pin mapping is not available
    Pin(InvalidPinConfiguration),
}

impl From<BitTimingError> for ConfigurationError {
    fn from(value: BitTimingError) -> Self {
        Self::BitTiming(value)
    }
}

impl From<InvalidPinConfiguration> for ConfigurationError {
    fn from(value: InvalidPinConfiguration) -> Self {
        Self::Pin(value)
    }
}

/// The controller disconnected itself from the bus
///
/// Raised by the hardware once the transmit error counter exceeds 255. No
/// frames are sent or received until [`Can::bus_on`] is called.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct BusOff;

impl embedded_can::Error for BusOff {
    fn kind(&self) -> embedded_can::ErrorKind {
        embedded_can::ErrorKind::Other
    }
}

/// Requests initialization mode and waits for the hardware to acknowledge.
///
/// The handshake has no timeout; with a dead peripheral clock this spins
/// forever, which is also when no recovery is possible anyway.
fn enter_initialization<R: Registers>(reg: &mut R) {
    reg.modify(Register::Mcr, |value| {
        let mut mcr = MasterControl(value);
        mcr.set_inrq(true);
        mcr.0
    });
    while !MasterStatus(reg.read(Register::Msr)).inak() {}
}

/// Releases initialization mode and waits until the controller has
/// synchronized to the bus.
fn leave_initialization<R: Registers>(reg: &mut R) {
    reg.modify(Register::Mcr, |value| {
        let mut mcr = MasterControl(value);
        mcr.set_inrq(false);
        mcr.0
    });
    while MasterStatus(reg.read(Register::Msr)).inak() {}
}

/// Scoped initialization mode
///
/// Holds the controller in initialization mode for as long as the value
/// exists; frame transfer resumes when it is dropped, on early returns too.
struct Configuration<'r, R: Registers> {
    reg: &'r mut R,
}

impl<'r, R: Registers> Configuration<'r, R> {
    fn enter(reg: &'r mut R) -> Self {
        enter_initialization(reg);
        Self { reg }
    }
}

impl<R: Registers> Deref for Configuration<'_, R> {
    type Target = R;

    fn deref(&self) -> &Self::Target {
        self.reg
    }
}

impl<R: Registers> DerefMut for Configuration<'_, R> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.reg
    }
}

impl<R: Registers> Drop for Configuration<'_, R> {
    fn drop(&mut self) {
        leave_initialization(self.reg);
    }
}

/// A bxCAN controller
///
/// Owns the peripheral identified by `Id` together with its platform
/// dependencies. Dropping the driver masks its interrupts and powers the
/// peripheral down.
pub struct Can<'a, Id: CanId, D: Dependencies<Id>, R: Registers = Hardware<Id>> {
    reg: R,
    dependencies: D,
    rx_handler: Option<&'a mut dyn FnMut(Message)>,
    _id: PhantomData<Id>,
}

impl<'a, Id: CanId, D: Dependencies<Id>> Can<'a, Id, D> {
    /// Powers the peripheral up and brings it onto the bus.
    ///
    /// Routes the peripheral to `pins`, derives the bit timing from the
    /// clock reported by `dependencies` and installs an accept-everything
    /// filter. On success the controller participates in bus traffic; on
    /// error the peripheral is powered down again.
    pub fn new(
        config: CanConfig,
        pins: PinMapping,
        dependencies: D,
    ) -> Result<Self, ConfigurationError> {
        // Safety: `dependencies` is a singleton for `Id`, so no other code
        // accesses the register block while the driver exists.
        let reg = unsafe { Hardware::new() };
        Self::with_registers(reg, config, pins, dependencies)
    }
}

impl<'a, Id: CanId, D: Dependencies<Id>, R: Registers> Can<'a, Id, D, R> {
    pub(crate) fn with_registers(
        reg: R,
        config: CanConfig,
        pins: PinMapping,
        dependencies: D,
    ) -> Result<Self, ConfigurationError> {
        let mut can = Self {
            reg,
            dependencies,
            rx_handler: None,
            _id: PhantomData,
        };
        can.dependencies.power_on();
        // Failure drops `can`, powering the peripheral down again
        can.init(config, pins)?;
        Ok(can)
    }

    fn init(&mut self, config: CanConfig, pins: PinMapping) -> Result<(), ConfigurationError> {
        self.dependencies.configure_pins(pins)?;
        // Wake from the power-on sleep state and return retransmission and
        // bus-off handling to their defaults; a warm restart without a
        // power-on reset may leave stale flags behind
        self.reg.modify(Register::Mcr, |value| {
            let mut mcr = MasterControl(value);
            mcr.set_sleep(false);
            mcr.set_nart(false);
            mcr.set_abom(false);
            mcr.0
        });
        self.configure(config)
    }

    /// Applies `config` to the controller.
    ///
    /// Briefly takes the controller off the bus; frames arriving in that
    /// window are lost. Loop back mode is reset unless `config` requests it.
    pub fn configure(&mut self, config: CanConfig) -> Result<(), ConfigurationError> {
        let timing = BitTiming::calculate(self.dependencies.can_clock(), config.bitrate)?;
        let mut guard = Configuration::enter(&mut self.reg);
        guard.modify(Register::Btr, |value| {
            let mut btr = BusTiming(value);
            btr.set_brp(timing.prescaler - 1);
            btr.set_ts1(timing.propagation + timing.phase_seg_1 - 1);
            btr.set_ts2(timing.phase_seg_2 - 1);
            btr.set_sjw(timing.sjw - 1);
            btr.set_lbkm(config.loopback);
            btr.set_silm(false);
            btr.0
        });
        filter::accept_all(&mut *guard);
        Ok(())
    }

    /// Connects the transmitter to the receiver inside the peripheral.
    ///
    /// Transmitted frames come back through the receive path without
    /// touching the bus, which allows exercising the full driver on a board
    /// with no transceiver attached.
    pub fn enable_self_test(&mut self, enable: bool) {
        let mut guard = Configuration::enter(&mut self.reg);
        guard.modify(Register::Btr, |value| {
            let mut btr = BusTiming(value);
            btr.set_lbkm(enable);
            btr.0
        });
    }

    /// Queues `message` for transmission.
    ///
    /// Returns [`nb::Error::WouldBlock`] while all three mailboxes hold
    /// pending frames; nothing is queued in that case. During bus-off no
    /// mailbox is touched either and [`BusOff`] is returned instead.
    pub fn transmit(&mut self, message: &Message) -> nb::Result<(), BusOff> {
        tx_mailboxes::transmit(&mut self.reg, message)
    }

    /// Installs `handler` to be called for every received frame and unmasks
    /// the receive interrupts.
    ///
    /// A previously installed handler is detached and sees no further
    /// frames.
    pub fn on_receive(&mut self, handler: &'a mut dyn FnMut(Message)) {
        self.rx_handler = Some(handler);
        interrupt::enable_receive(&mut self.reg);
        self.dependencies.enable_interrupts();
    }

    /// Dispatch entry point for the RX0 and RX1 interrupt handlers.
    ///
    /// Drains both receive FIFOs and feeds the frames to the installed
    /// handler. Safe to call spuriously; with nothing pending it does
    /// nothing. Without a handler pending frames are discarded so the FIFOs
    /// cannot silt up.
    pub fn interrupt(&mut self) {
        while let Some(message) = rx_fifo::take(&mut self.reg) {
            if let Some(handler) = self.rx_handler.as_mut() {
                handler(message);
            }
        }
    }

    /// `true` while the controller has disconnected itself from the bus
    pub fn is_bus_off(&self) -> bool {
        MasterStatus(self.reg.read(Register::Msr)).slak()
    }

    /// Rejoins the bus after a bus-off event.
    ///
    /// Cycling initialization mode restarts the fault confinement state
    /// machine; the controller waits for the idle sequence and then
    /// participates again. Harmless to call when not bus-off.
    pub fn bus_on(&mut self) {
        enter_initialization(&mut self.reg);
        leave_initialization(&mut self.reg);
    }

    /// Snapshot of the error counters and fault confinement flags
    pub fn error_status(&self) -> ErrorStatus {
        ErrorStatus(self.reg.read(Register::Esr))
    }
}

impl<'a, Id: CanId, D: Dependencies<Id>, R: Registers> embedded_can::nb::Can
    for Can<'a, Id, D, R>
{
    type Frame = Message;
    type Error = BusOff;

    fn transmit(&mut self, frame: &Message) -> nb::Result<Option<Message>, BusOff> {
        Can::transmit(self, frame)?;
        Ok(None)
    }

    fn receive(&mut self) -> nb::Result<Message, BusOff> {
        rx_fifo::take(&mut self.reg).ok_or(nb::Error::WouldBlock)
    }
}

impl<'a, Id: CanId, D: Dependencies<Id>, R: Registers> Drop for Can<'a, Id, D, R> {
    fn drop(&mut self) {
        interrupt::disable_receive(&mut self.reg);
        self.dependencies.disable_interrupts();
        self.dependencies.power_off();
    }
}
