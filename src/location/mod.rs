/// Coordinate resolution
///
/// This module handles:
/// - The fallback chain (precise device fix, then network lookup)
/// - The on-device position source
/// - The network egress lookup

pub mod device;
pub mod network;
pub mod resolver;

pub use device::DevicePosition;
pub use network::IpLookup;
pub use resolver::{NetworkLocator, Permission, PositionProvider, Resolver};
