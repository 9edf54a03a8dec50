//! 门户依赖但不自己实现的外部组件
//!
//! 由固件基于以太网驱动、HTTP 服务器和 DNS 服务器实现，所有调用都在门户线程上。

use std::net::Ipv4Addr;
use std::time::Duration;

use http::Method;

/// 门户所在的有线网口
pub trait NetworkInterface {
    fn local_ip(&self) -> Ipv4Addr;

    fn mac_address(&self) -> [u8; 6];

    fn is_link_up(&self) -> bool;

    fn set_hostname(&mut self, hostname: &str) -> anyhow::Result<()>;
}

/// 对 `domain` 的所有查询返回固定地址
pub trait DnsResponder {
    fn start(&mut self, port: u16, domain: &str, answer: Ipv4Addr) -> anyhow::Result<()>;

    /// 非阻塞，最多处理一个查询
    fn process_next_request(&mut self);

    /// `start` 失败或没调用过时也要能安全调用
    fn stop(&mut self);
}

/// HTTP 服务器的收发接口
///
/// 路由由门户负责，传输层只交出解析好的请求，并把门户的响应写回最近交出的那个请求。
pub trait HttpTransport {
    fn begin(&mut self, port: u16) -> anyhow::Result<()>;

    /// 非阻塞取下一个已解析的请求
    fn poll_request(&mut self) -> Option<PortalRequest>;

    fn send(&mut self, response: http::Response<String>) -> anyhow::Result<()>;

    /// 断开当前请求的客户端连接
    fn close_connection(&mut self);

    /// `begin` 失败或没调用过时也要能安全调用
    fn stop(&mut self);
}

/// 信息页显示的芯片信息
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChipInfo {
    pub chip_id: u32,
    pub chip_oui: u32,
    pub model: String,
    pub revision: u8,
    pub flash_size: u32,
}

pub trait Board {
    fn chip_info(&self) -> ChipInfo;

    fn delay(&mut self, duration: Duration);

    /// 真机上不会返回
    fn restart(&mut self);
}

/// 传输层解析出的一个 HTTP 请求
#[derive(Debug, Clone, PartialEq)]
pub struct PortalRequest {
    pub method: Method,
    /// 不含查询串的路径
    pub uri: String,
    /// `Host` 头，缺失时为空
    pub host: String,
    /// 查询和表单参数，按到达顺序
    pub args: Vec<(String, String)>,
}

impl PortalRequest {
    pub fn new(method: Method, uri: impl Into<String>) -> Self {
        Self {
            method,
            uri: uri.into(),
            host: String::new(),
            args: Vec::new(),
        }
    }

    pub fn get(uri: impl Into<String>) -> Self {
        Self::new(Method::GET, uri)
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_arg(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.args.push((name.into(), value.into()));
        self
    }

    /// 第一个名为 `name` 的参数
    pub fn arg(&self, name: &str) -> Option<&str> {
        self.args
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// 同 [`arg`](Self::arg)，但空值视为缺失
    pub fn non_empty_arg(&self, name: &str) -> Option<&str> {
        self.arg(name).filter(|v| !v.is_empty())
    }
}
