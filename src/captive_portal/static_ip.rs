//! 门户收集的静态 IPv4 设置

use std::net::Ipv4Addr;

use serde::{Deserialize, Serialize};

use super::transport::PortalRequest;

/// 静态地址、网关、掩码和 DNS，`None` 表示未设置
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaticIpConfig {
    pub ip: Option<Ipv4Addr>,
    pub gateway: Option<Ipv4Addr>,
    pub netmask: Option<Ipv4Addr>,
    pub dns1: Option<Ipv4Addr>,
    pub dns2: Option<Ipv4Addr>,
}

impl StaticIpConfig {
    pub fn new(ip: Ipv4Addr, gateway: Ipv4Addr, netmask: Ipv4Addr) -> Self {
        Self {
            ip: set(ip),
            gateway: set(gateway),
            netmask: set(netmask),
            dns1: None,
            dns2: None,
        }
    }

    pub fn with_dns(mut self, dns1: Ipv4Addr, dns2: Ipv4Addr) -> Self {
        self.dns1 = set(dns1);
        self.dns2 = set(dns2);
        self
    }

    /// 已配置静态地址时为 true
    pub fn has_static_ip(&self) -> bool {
        self.ip.is_some()
    }

    /// 把提交的表单合并进配置
    ///
    /// 空值、缺失或无法解析的字段保持原值
    pub fn apply_form(&mut self, req: &PortalRequest, with_dns: bool) {
        update(&mut self.ip, req, "ip");
        update(&mut self.gateway, req, "gw");
        update(&mut self.netmask, req, "sn");
        if with_dns {
            update(&mut self.dns1, req, "dns1");
            update(&mut self.dns2, req, "dns2");
        }
    }
}

/// `0.0.0.0` 表示未设置
fn set(addr: Ipv4Addr) -> Option<Ipv4Addr> {
    (!addr.is_unspecified()).then_some(addr)
}

fn update(slot: &mut Option<Ipv4Addr>, req: &PortalRequest, name: &str) {
    let Some(text) = req.non_empty_arg(name) else {
        return;
    };
    match text.trim().parse::<Ipv4Addr>() {
        Ok(addr) => {
            *slot = set(addr);
            log::debug!("New static {} = {:?}", name, slot);
        }
        Err(e) => log::warn!("Ignoring {} = {:?}: {}", name, text, e),
    }
}

/// 表单中显示的文本，未设置时显示 `0.0.0.0`
pub(crate) fn display(addr: Option<Ipv4Addr>) -> String {
    addr.unwrap_or(Ipv4Addr::UNSPECIFIED).to_string()
}
