#![no_std]
#![warn(missing_docs)]

//! `stm32f1-can-core` provides the small set of abstractions that tie the
//! platform independent [`stm32f1-can`] driver to a concrete clock tree, pin
//! multiplexer, power gate and interrupt controller.
//!
//! Traits from this crate are not supposed to be implemented by the
//! application developer; implementations should be provided by board or HAL
//! crates that own the RCC, GPIO/AFIO and NVIC peripherals.
//!
//! Integrators are responsible for the soundness of their trait
//! implementations and for conforming to the respective safety prerequisites.
//!
//! [`stm32f1-can`]: <https://docs.rs/crate/stm32f1-can/>

pub use fugit;

/// Trait representing CAN peripheral identity
///
/// Types implementing this trait are expected to be used as marker types that
/// identify a specific instance of the bxCAN peripheral. The trait only
/// conveys *where* the peripheral register block is located, not that it can
/// be accessed. The latter is expressed by the [`Dependencies`] trait.
///
/// # Safety
/// `CanId::ADDRESS` points to the start of a valid bxCAN register block.
///
/// # Examples
/// ```no_run
/// use stm32f1_can_core::CanId;
///
/// pub enum Can1 {}
///
/// unsafe impl CanId for Can1 {
///     const ADDRESS: *const () = 0x4000_6400 as *const _;
/// }
/// ```
pub unsafe trait CanId {
    /// Static address of the register block of the corresponding peripheral
    const ADDRESS: *const ();
}

/// RX/TX pin pairs the bxCAN peripheral can be remapped to
///
/// The F1 alternate-function remap allows CAN1 to surface on one of three
/// pin pairs; which ones are actually bonded out depends on the package.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PinMapping {
    /// RX on PA11, TX on PA12 (no remap)
    Pa11Pa12,
    /// RX on PB8, TX on PB9
    Pb8Pb9,
    /// RX on PD0, TX on PD1
    Pd0Pd1,
}

/// The requested pin pair cannot be configured for the CAN peripheral
///
/// Returned by [`Dependencies::configure_pins`] when the mapping is not
/// routable on the target package or the pins are already claimed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct InvalidPinConfiguration;

/// Trait representing CAN peripheral dependencies
///
/// Structs implementing [`Dependencies`] should
/// - enclose all object representable dependencies of [`CanId`] and release
///   them upon destruction
/// - be a singleton (only a single instance of [`Dependencies`] for a
///   specific [`CanId`] must exist at the same time)
///
/// in order to prevent aliasing and guarantee that the driver is the sole
/// owner of the peripheral. Depending on the HAL API this can be assured
/// either at compile time by type constraints or by fallible construction.
///
/// # Safety
/// While a [`Dependencies`] instance exists
/// - the frequency reported by [`Self::can_clock`] must match the clock
///   actually feeding the peripheral and must not change
/// - the bxCAN register block of `Id` must not be accessed through any other
///   path
pub unsafe trait Dependencies<Id: CanId> {
    /// Frequency of the APB1 clock feeding the CAN peripheral.
    ///
    /// Bit timing is derived from this value; a wrong frequency silently
    /// yields a wrong bitrate on the wire.
    fn can_clock(&self) -> fugit::HertzU32;

    /// Routes the peripheral to the given RX/TX pin pair.
    ///
    /// Covers both the GPIO mode setup (RX as pulled-up input, TX as
    /// alternate-function push-pull) and the AFIO remap selection.
    fn configure_pins(&mut self, mapping: PinMapping) -> Result<(), InvalidPinConfiguration>;

    /// Enables the clock/power gate of the peripheral.
    fn power_on(&mut self);

    /// Disables the clock/power gate of the peripheral.
    fn power_off(&mut self);

    /// Unmasks the RX0, RX1 and SCE interrupt lines of the peripheral in the
    /// system interrupt controller.
    ///
    /// The platform is expected to route all three lines to a handler that
    /// calls the driver's dispatch entry point.
    fn enable_interrupts(&mut self);

    /// Masks the RX0, RX1 and SCE interrupt lines again.
    fn disable_interrupts(&mut self);
}
