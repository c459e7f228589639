use std::fmt;
use std::net::Ipv6Addr;

use bytes::Bytes;

use crate::icmpv6::Icmpv6Message;
use crate::Error;

/// A source of received ICMPv6 messages, such as a raw socket.
pub trait PacketSource {
    /// The transport error.
    type Error;

    /// Receive one message into `buf`, returning its length together with
    /// the source and destination addresses of the carrying IPv6 packet.
    fn recv(&mut self, buf: &mut [u8]) -> Result<(usize, Ipv6Addr, Ipv6Addr), Self::Error>;
}

/// A sink for ICMPv6 messages to transmit.
pub trait PacketSink {
    /// The transport error.
    type Error;

    /// Transmit the encoded message `bytes` to `destination`.
    fn send(&mut self, bytes: &[u8], destination: Ipv6Addr) -> Result<(), Self::Error>;
}

impl<T: PacketSource + ?Sized> PacketSource for &mut T {
    type Error = T::Error;

    #[inline]
    fn recv(&mut self, buf: &mut [u8]) -> Result<(usize, Ipv6Addr, Ipv6Addr), Self::Error> {
        (**self).recv(buf)
    }
}

impl<T: PacketSink + ?Sized> PacketSink for &mut T {
    type Error = T::Error;

    #[inline]
    fn send(&mut self, bytes: &[u8], destination: Ipv6Addr) -> Result<(), Self::Error> {
        (**self).send(bytes, destination)
    }
}

/// Failure of [`receive_message`] or [`send_message`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError<E> {
    /// The message could not be encoded.
    Codec(Error),
    /// The source or sink failed.
    Transport(E),
}

impl<E: fmt::Display> fmt::Display for TransportError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::Codec(err) => write!(f, "codec error: {}", err),
            TransportError::Transport(err) => write!(f, "transport error: {}", err),
        }
    }
}

impl<E: fmt::Debug + fmt::Display> std::error::Error for TransportError<E> {}

/// Receive one message from `source`, using `scratch` as the receive buffer.
///
/// The returned message may be invalid; decoding itself never fails.
pub fn receive_message<S: PacketSource>(
    mut source: S,
    scratch: &mut [u8],
) -> Result<Icmpv6Message, TransportError<S::Error>> {
    let (len, src, dst) = source.recv(scratch).map_err(TransportError::Transport)?;
    let len = len.min(scratch.len());
    Ok(Icmpv6Message::from_bytes(
        Bytes::copy_from_slice(&scratch[..len]),
        src,
        dst,
    ))
}

/// Encode `message` into `scratch` and hand it to `sink`, addressed to the
/// message destination. Returns the number of bytes sent.
pub fn send_message<S: PacketSink>(
    mut sink: S,
    message: &Icmpv6Message,
    scratch: &mut [u8],
) -> Result<usize, TransportError<S::Error>> {
    let len = message.encode(scratch).map_err(TransportError::Codec)?;
    sink.send(&scratch[..len], message.destination())
        .map_err(TransportError::Transport)?;
    Ok(len)
}
