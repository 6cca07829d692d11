//! # frankenfmt-core
//!
//! A bounded, allocation-free, locale-independent `snprintf` engine.
//!
//! The engine renders a format string and a typed argument list into a
//! caller-supplied buffer. Output is always terminated when the buffer is
//! non-empty, the return value is the length the output would have had with
//! unlimited room, and floating-point conversions are exact at any precision.
//!
//! ```
//! let mut buf = [0u8; 32];
//! let len = frankenfmt_core::format_to!(&mut buf, "%s=%.3f", "pi", 3.14159265_f64).unwrap();
//! assert_eq!(&buf[..len], b"pi=3.142");
//! ```
//!
//! Without the default `std` feature the crate is `no_std`.

#![cfg_attr(not(any(feature = "std", test)), no_std)]
#![deny(unsafe_code)]

pub mod config;
pub mod error;
pub mod stdio;

pub use config::Mode;
pub use error::FormatError;
pub use stdio::{Arg, ArgCursor, format_to, format_to_mode, snprintf, vformat_to};
