//! Visitor info collection
//!
//! Gathers a fixed set of client attributes into a flat [`VisitorRecord`],
//! once per page load.

pub mod collector;
pub mod device;
pub mod ip_lookup;
pub mod models;

pub use collector::VisitorCollector;
pub use device::classify_device;
pub use ip_lookup::{IpLookup, IpifyLookup, LookupError};
pub use models::{ClientEnvironment, DeviceType, Dimensions, VisitorRecord, UNKNOWN};
