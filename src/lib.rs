//! Captive configuration portal for headless Ethernet controllers.
//!
//! The firmware plugs in its network interface, DNS server, HTTP server and
//! board through the traits in [`captive_portal::transport`], registers its
//! parameters, and calls [`CaptivePortal::start`]. The call blocks until the
//! operator saves or closes the portal, or the timeout runs out.

pub mod captive_portal;
pub mod config;
pub mod hostname;

pub use captive_portal::{CaptivePortal, ConfigField, PortalOutcome, StaticIpConfig};
pub use config::PortalConfig;
