//! Sealed trait marker for gateway protocol implementations.
//!
//! Prevents implementations of `GatewayProtocol` outside this crate.

pub(crate) mod private {
    /// Sealed trait marker.
    pub trait Sealed {}
}
