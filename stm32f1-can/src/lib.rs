#![no_std]
#![warn(missing_docs)]
//! # stm32f1-can
//!
//! ## Overview
//! Driver for the bxCAN peripheral of STM32F1 microcontrollers.
//!
//! It provides the following features:
//!
//! - classic CAN with standard and extended identifiers, data and remote
//!   frames
//! - bit timing derivation from the peripheral clock and a requested bitrate
//! - transmission through the three hardware mailboxes with busy signalling
//!   via [`nb`]
//! - interrupt driven reception through both hardware FIFOs with an owned
//!   handler instead of a global callback
//! - loop back self test mode
//! - bus-off detection and recovery
//! - the [`embedded_can`] blocking-agnostic `Can` trait
//!
//! The interface between the peripheral and the rest of the MCU (clock tree,
//! pin multiplexing, power gating, the NVIC) is not uniform across HALs, so
//! it is abstracted behind the traits of [`stm32f1_can_core`]. A
//! platform-specific HAL implements [`Dependencies`] and hands the instance
//! to [`Can::new`]; its safety requirements guarantee that the driver is the
//! sole owner of a correctly set up peripheral.
//!
//! ## Example
//! ```no_run
//! # fn example<D>(dependencies: D) -> Result<(), stm32f1_can::bus::ConfigurationError>
//! # where D: stm32f1_can::core::Dependencies<stm32f1_can::reg::Can1> {
//! use stm32f1_can::bus::Can;
//! use stm32f1_can::config::CanConfig;
//! use stm32f1_can::core::fugit::RateExtU32;
//! use stm32f1_can::core::PinMapping;
//! use stm32f1_can::embedded_can::{Frame, StandardId};
//! use stm32f1_can::message::Message;
//! use stm32f1_can::nb;
//!
//! let mut can = Can::new(
//!     CanConfig::new(100.kHz()),
//!     PinMapping::Pa11Pa12,
//!     dependencies,
//! )?;
//!
//! let message = Message::new(StandardId::new(0x123).unwrap(), &[1, 2, 3]).unwrap();
//! nb::block!(can.transmit(&message)).ok();
//! # Ok(())
//! # }
//! ```
//!
//! Received frames are dispatched from the RX0/RX1 interrupt handlers, which
//! are expected to call [`Can::interrupt`].
//!
//! [`Can::new`]: crate::bus::Can::new
//! [`Can::interrupt`]: crate::bus::Can::interrupt
//! [`Dependencies`]: stm32f1_can_core::Dependencies

pub use embedded_can;
pub use nb;
pub use stm32f1_can_core as core;

pub mod bus;
pub mod config;
mod filter;
mod interrupt;
pub mod message;
pub mod prelude;
pub mod reg;
mod rx_fifo;
mod tx_mailboxes;

#[cfg(test)]
mod mocks;
