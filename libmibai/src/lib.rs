//! Hardware-independent core of the mibai firmware: the bounded message
//! hand-off between the wireless stack and the application, the channel
//! router, and the firmware-update state machine. Everything talking to real
//! hardware lives behind the traits in [`storage`] and [`ota`], so this crate
//! builds and tests on the host.

#![cfg_attr(not(test), no_std)]

// This must go first, so that the other modules see its macros.
pub(crate) mod fmt;

pub mod ota;
pub mod queue;
pub mod router;
pub mod storage;
pub mod types;
