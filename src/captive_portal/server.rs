//! 门户会话：DNS、HTTP 服务和阻塞主循环

use std::time::{Duration, Instant};

use super::handlers::{self, Context, Followup, Reply};
use super::params::{ConfigField, ParameterRegistry, RegistryError};
use super::session::{PortalPhase, SessionState};
use super::static_ip::StaticIpConfig;
use super::transport::{Board, DnsResponder, HttpTransport, NetworkInterface};
use crate::config::PortalConfig;
use crate::hostname;

/// 所有域名都解析到本机
const DNS_WILDCARD: &str = "*";

/// 门户运行的结束方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalOutcome {
    /// 保存完成且设置了保存后退出
    Connected,
    /// 处理器请求停止，`saved` 表示之前是否保存过
    Stopped { saved: bool },
    TimedOut,
}

impl PortalOutcome {
    /// 用户保存过配置时为 true
    pub fn is_connected(self) -> bool {
        matches!(
            self,
            PortalOutcome::Connected | PortalOutcome::Stopped { saved: true }
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortalError {
    /// 本会话已经调用过 `start`
    SessionFinished(PortalPhase),
}

impl std::fmt::Display for PortalError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortalError::SessionFinished(phase) => {
                write!(f, "portal session already ran (phase {:?})", phase)
            }
        }
    }
}

impl std::error::Error for PortalError {}

/// 一次配置窗口
///
/// 先注册参数和静态 IP 默认值，调用 [`start`](Self::start)，再读回收集到的值。
/// 每个会话只能运行一次，再次打开门户需要新建。
pub struct CaptivePortal<N, D, H, B> {
    netif: N,
    dns: D,
    http: H,
    board: B,
    config: PortalConfig,
    hostname: String,
    params: ParameterRegistry,
    static_ip: StaticIpConfig,
    timezone: Option<String>,
    session: SessionState,
    save_callback: Option<Box<dyn FnMut()>>,
}

impl<N, D, H, B> CaptivePortal<N, D, H, B>
where
    N: NetworkInterface,
    D: DnsResponder,
    H: HttpTransport,
    B: Board,
{
    /// `hostname` 为空时使用 `ESP32-<CHIPID>`
    pub fn new(hostname: &str, config: PortalConfig, mut netif: N, dns: D, http: H, board: B) -> Self {
        let hostname = hostname::derive_hostname(hostname, board.chip_info().chip_id);
        log::warn!("RFC952 Hostname = {}", hostname);

        if let Err(e) = netif.set_hostname(&hostname) {
            log::error!("Failed to set hostname {}: {:?}", hostname, e);
        }

        Self {
            netif,
            dns,
            http,
            board,
            params: ParameterRegistry::new(config.initial_param_capacity, config.param_growth),
            session: SessionState::new(config.timeout),
            config,
            hostname,
            static_ip: StaticIpConfig::default(),
            timezone: None,
            save_callback: None,
        }
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn config(&self) -> &PortalConfig {
        &self.config
    }

    pub fn phase(&self) -> PortalPhase {
        self.session.phase()
    }

    /// 添加表单字段，按添加顺序渲染
    pub fn add_parameter(&mut self, field: ConfigField) -> Result<usize, RegistryError> {
        self.params.register(field)
    }

    pub fn params(&self) -> &ParameterRegistry {
        &self.params
    }

    pub fn set_static_ip_config(&mut self, config: StaticIpConfig) {
        log::info!("setSTAStaticIPConfig {:?}", config);
        self.static_ip = config;
    }

    pub fn static_ip_config(&self) -> StaticIpConfig {
        self.static_ip
    }

    /// 开启时区采集后，最近一次保存带上的浏览器时区
    pub fn timezone(&self) -> Option<&str> {
        self.timezone.as_deref()
    }

    /// 保存结束会话时由主循环调用一次
    pub fn set_save_callback(&mut self, callback: impl FnMut() + 'static) {
        self.save_callback = Some(Box::new(callback));
    }

    /// 0 表示不超时，会话开始后修改无效
    pub fn set_timeout(&mut self, timeout: Duration) {
        if self.session.phase() != PortalPhase::Idle {
            log::warn!("Ignoring timeout change on a started portal");
            return;
        }
        self.config.timeout = timeout;
        self.session = SessionState::new(timeout);
    }

    pub fn set_break_after_config(&mut self, should_break: bool) {
        self.config.break_after_config = should_break;
    }

    /// 运行门户直到保存、停止或超时，然后关闭两个服务
    pub fn start(&mut self) -> Result<PortalOutcome, PortalError> {
        let phase = self.session.phase();
        if phase != PortalPhase::Idle {
            return Err(PortalError::SessionFinished(phase));
        }

        self.setup();
        self.session.begin(Instant::now());

        log::info!("startConfigPortal : Enter loop");
        let outcome = self.run();
        log::info!("startConfigPortal : exit with {:?}", outcome);

        self.http.stop();
        self.dns.stop();

        Ok(outcome)
    }

    /// 服务启动失败只记日志并跳过
    fn setup(&mut self) {
        let local_ip = self.netif.local_ip();

        if let Err(e) = self.dns.start(self.config.dns_port, DNS_WILDCARD, local_ip) {
            log::error!("Can't start DNS Server: {:?}", e);
        }

        match self.http.begin(self.config.http_port) {
            Ok(()) => log::info!("HTTP server started on {}:{}", local_ip, self.config.http_port),
            Err(e) => log::error!("Can't start HTTP server: {:?}", e),
        }

        log::warn!("Config Portal IP address = {}", local_ip);
    }

    fn run(&mut self) -> PortalOutcome {
        loop {
            self.dns.process_next_request();
            self.serve_http();

            if self.session.connect_requested() && self.config.break_after_config {
                if let Some(callback) = self.save_callback.as_mut() {
                    callback();
                }
                log::debug!("Stop ConfigPortal: break after config");
                self.session.finish(PortalPhase::Connected);
                return PortalOutcome::Connected;
            }

            if self.session.stop_requested() {
                log::info!("stopConfigPortal");
                self.session.finish(PortalPhase::Stopped);
                return PortalOutcome::Stopped {
                    saved: self.session.connect_requested(),
                };
            }

            if self.session.timed_out(Instant::now()) {
                log::info!("Config portal timed out");
                self.session.finish(PortalPhase::TimedOut);
                return PortalOutcome::TimedOut;
            }

            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// 最多处理一个待处理请求
    fn serve_http(&mut self) {
        let Some(req) = self.http.poll_request() else {
            return;
        };

        let mut ctx = Context {
            config: &self.config,
            session: &mut self.session,
            params: &mut self.params,
            static_ip: &mut self.static_ip,
            timezone: &mut self.timezone,
            netif: &self.netif,
            board: &self.board,
        };

        let reply = handlers::dispatch(&req, &mut ctx).unwrap_or_else(|e| {
            log::error!("Handler for {} failed: {:?}", req.uri, e);
            Reply {
                response: handlers::internal_error(&e),
                followup: Followup::None,
            }
        });

        if let Err(e) = self.http.send(reply.response) {
            log::error!("Failed to send response for {}: {:?}", req.uri, e);
        }

        match reply.followup {
            Followup::None => {}
            Followup::CloseConnection => self.http.close_connection(),
            Followup::Restart => {
                log::debug!("Sent reset page");
                self.board.delay(self.config.reset_delay);
                log::warn!("Restarting device");
                self.board.restart();
                // 只有 restart 返回时才会到这里，之后不再处理请求
                self.session.request_stop();
            }
        }
    }
}
