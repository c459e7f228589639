#![warn(missing_docs, missing_debug_implementations, rust_2018_idioms)]

//! Encode, decode and validate ICMPv6 messages, including Neighbor Discovery
//! and Multicast Listener Discovery.
//!
//! ```
//! use std::net::Ipv6Addr;
//! use icmpv6_codec::{Icmpv6Message, Icmpv6Type, Payload};
//!
//! let src = Ipv6Addr::LOCALHOST;
//! let dst: Ipv6Addr = "::2".parse().unwrap();
//! let bytes = Icmpv6Message::echo_request(src, dst, 1, 1, &b"HI"[..])
//!     .to_bytes()
//!     .unwrap();
//!
//! let msg = Icmpv6Message::decode(&bytes, src, dst);
//! assert!(msg.is_valid());
//! assert_eq!(msg.msg_type(), Icmpv6Type::ECHO_REQUEST);
//! match msg.payload() {
//!     Some(Payload::Echo(echo)) => assert_eq!(&echo.data[..], b"HI"),
//!     _ => unreachable!(),
//! }
//! ```

#[macro_use]
mod macros;

mod error;
pub use error::{Error, Result};

mod traits;
pub use traits::{receive_message, send_message, PacketSink, PacketSource, TransportError};

pub mod checksum_utils;

pub mod icmpv6;
pub use icmpv6::{DecodedPayload, Icmpv6Message, Icmpv6Type, Payload};
