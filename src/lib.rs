//! CAN(FD) adapter transport layer.
//!
//! The Linux kernel exposes CAN-devices through a network-like API
//! (see https://www.kernel.org/doc/Documentation/networking/can.txt). This
//! crate binds one such adapter interface and turns it into a byte-stream
//! abstraction for higher-level device logic, without the caller having to
//! wrestle libc calls: raw frames are read and written through
//! [`CanSocket`], serialized to a versioned byte encoding by [`codec`],
//! and the adapter's runtime configuration (loopback, self-reception,
//! error filtering, acceptance filters) is managed through an ordered
//! key/value store applied via socket options.
//!
//! # An introduction to CAN
//!
//! The CAN bus was originally designed to allow microcontrollers inside a
//! vehicle to communicate over a single shared bus. Messages called
//! *frames* are multicast to all devices on the bus. Every frame consists
//! of an ID and a payload of up to 8 bytes, or up to 64 bytes on buses
//! using the flexible-data-rate (FD) extension. The lower the ID, the
//! higher the frame's priority during bus arbitration; arbitration itself
//! is the kernel's and hardware's business, not this crate's.
//!
//! A device can be opened multiple times; every client receives all
//! frames the kernel's acceptance filters let through for its socket.
//!
//! # Shape of the crate
//!
//! - [`socket::CanSocket`] owns the adapter-bound descriptor; connect,
//!   configure, read/write frames, or move encoded bytes through the
//!   stream surface.
//! - [`codec`] is pure frame (de)serialization, tagged with a data stream
//!   version that producer and consumer must agree on.
//! - [`config`] holds the ordered option store and its typed keys/values.
//! - [`notifier::ReadNotifier`] provides poll-based read-readiness
//!   signaling for event-loop integration.
//!
//! Reads never block (zero-timeout poll); a socket with nothing pending
//! yields an empty result. There are no automatic retries anywhere:
//! every failure is reported to the caller as a typed error value, and
//! non-fatal conditions (missing timestamps, rejected options during
//! reconnect replay) are emitted through the `log` facade.

pub mod codec;
pub mod config;
pub mod constants;
pub mod errors;
pub mod filter;
pub mod frame;
pub mod notifier;
pub mod socket;
mod util;

pub use crate::codec::DATA_STREAM_V1;
pub use crate::config::{ConfigKey, ConfigStore, ConfigValue};
pub use crate::errors::{
    ConfigError, ConnectError, ConstructionError, DecodeError, ShouldRetry, WriteError,
};
pub use crate::filter::CanFilter;
pub use crate::frame::{CanFdFrame, Timestamp};
pub use crate::notifier::ReadNotifier;
pub use crate::socket::CanSocket;
