//! 有线网口 Web 配置门户
//!
//! 在以太网接口上提供临时配置页面，所有 DNS 查询都解析到本机地址，
//! 收集应用参数和静态 IP 设置后把控制权交回固件。

mod handlers;
mod html;
pub mod params;
pub mod render;
mod server;
mod session;
pub mod static_ip;
pub mod transport;

pub use params::{ConfigField, LabelPlacement, ParameterRegistry, RegistryError};
pub use server::{CaptivePortal, PortalError, PortalOutcome};
pub use session::{PortalPhase, SessionState};
pub use static_ip::StaticIpConfig;
pub use transport::{Board, ChipInfo, DnsResponder, HttpTransport, NetworkInterface, PortalRequest};
