//! Convenience re-exports of the traits needed to operate the driver

pub use crate::embedded_can::Frame as _;
pub use crate::embedded_can::nb::Can as _;
pub use crate::reg::Registers as _;
pub use stm32f1_can_core::Dependencies as _;
