//! 单次门户运行的标志和计时，主循环和各处理器共用

use std::time::{Duration, Instant};

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PortalPhase {
    Idle,
    Running,
    Connected,
    TimedOut,
    Stopped,
}

impl PortalPhase {
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            PortalPhase::Connected | PortalPhase::TimedOut | PortalPhase::Stopped
        )
    }
}

#[derive(Debug, Clone)]
pub struct SessionState {
    phase: PortalPhase,
    started_at: Option<Instant>,
    configured_timeout: Duration,
    timeout: Duration,
    connect_requested: bool,
    stop_requested: bool,
}

impl SessionState {
    /// `timeout == Duration::ZERO` 表示不超时
    pub fn new(timeout: Duration) -> Self {
        Self {
            phase: PortalPhase::Idle,
            started_at: None,
            configured_timeout: timeout,
            timeout,
            connect_requested: false,
            stop_requested: false,
        }
    }

    pub fn phase(&self) -> PortalPhase {
        self.phase
    }

    pub fn connect_requested(&self) -> bool {
        self.connect_requested
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// 当前生效的超时，有人在看页面时为 0
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub(crate) fn begin(&mut self, now: Instant) {
        self.phase = PortalPhase::Running;
        self.started_at = Some(now);
        self.connect_requested = false;
        self.stop_requested = false;
    }

    pub(crate) fn finish(&mut self, phase: PortalPhase) {
        self.phase = phase;
    }

    /// 有人在看页面，暂停超时
    pub(crate) fn hold_timeout(&mut self) {
        self.timeout = Duration::ZERO;
    }

    pub(crate) fn restore_timeout(&mut self) {
        self.timeout = self.configured_timeout;
    }

    pub(crate) fn request_connect(&mut self) {
        self.connect_requested = true;
    }

    pub(crate) fn request_stop(&mut self) {
        self.stop_requested = true;
    }

    pub(crate) fn timed_out(&self, now: Instant) -> bool {
        match self.started_at {
            Some(start) if !self.timeout.is_zero() => now.duration_since(start) > self.timeout,
            _ => false,
        }
    }
}

/// `/state` 响应内容
#[derive(Debug, Serialize)]
pub(crate) struct StateReport {
    pub phase: PortalPhase,
    pub connect_requested: bool,
    pub stop_requested: bool,
    pub timeout_secs: u64,
}

impl From<&SessionState> for StateReport {
    fn from(state: &SessionState) -> Self {
        Self {
            phase: state.phase,
            connect_requested: state.connect_requested,
            stop_requested: state.stop_requested,
            timeout_secs: state.timeout.as_secs(),
        }
    }
}
