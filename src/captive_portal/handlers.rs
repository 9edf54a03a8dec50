//! HTTP 路由处理器

use http::header::{
    ACCESS_CONTROL_ALLOW_ORIGIN, CACHE_CONTROL, CONTENT_TYPE, EXPIRES, LOCATION, PRAGMA,
};
use http::response::Builder;
use http::{Response, StatusCode};

use super::params::ParameterRegistry;
use super::render::{self, DeviceFacts};
use super::session::{SessionState, StateReport};
use super::static_ip::StaticIpConfig;
use super::transport::{Board, NetworkInterface, PortalRequest};
use crate::config::PortalConfig;

const TEXT_HTML: &str = "text/html";
const TEXT_PLAIN: &str = "text/plain";
const APPLICATION_JSON: &str = "application/json";

const NO_STORE: &str = "no-store";
const NO_CACHE_STRICT: &str = "no-cache, no-store, must-revalidate";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Route {
    Root,
    Config,
    Save,
    Close,
    Info,
    Reset,
    State,
    NotFound,
}

/// 固定路由表，各系统的联网检测地址都落到主页
pub(crate) const ROUTES: &[(&str, Route)] = &[
    ("/", Route::Root),
    ("/eth", Route::Config),
    ("/ethsave", Route::Save),
    ("/close", Route::Close),
    ("/i", Route::Info),
    ("/r", Route::Reset),
    ("/state", Route::State),
    // Windows 检测
    ("/fwlink", Route::Root),
    ("/connecttest.txt", Route::Root),
    // Android 检测
    ("/generate_204", Route::Root),
    // iOS/macOS 检测
    ("/hotspot-detect.html", Route::Root),
];

pub(crate) fn route(path: &str) -> Route {
    ROUTES
        .iter()
        .find(|(p, _)| *p == path)
        .map(|(_, r)| *r)
        .unwrap_or(Route::NotFound)
}

/// 响应发出后主循环要做的事
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Followup {
    None,
    /// 响应没有长度信息，需要主动断开连接
    CloseConnection,
    /// 等待重启延时后重启设备
    Restart,
}

#[derive(Debug)]
pub(crate) struct Reply {
    pub response: Response<String>,
    pub followup: Followup,
}

impl Reply {
    fn send(response: Response<String>) -> Self {
        Self {
            response,
            followup: Followup::None,
        }
    }
}

/// 处理器可读写的全部状态
pub(crate) struct Context<'a> {
    pub config: &'a PortalConfig,
    pub session: &'a mut SessionState,
    pub params: &'a mut ParameterRegistry,
    pub static_ip: &'a mut StaticIpConfig,
    pub timezone: &'a mut Option<String>,
    pub netif: &'a dyn NetworkInterface,
    pub board: &'a dyn Board,
}

pub(crate) fn dispatch(req: &PortalRequest, ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    let route = route(&req.uri);
    log::debug!("{} {} -> {:?}", req.method.as_str(), req.uri, route);

    match route {
        Route::Root => handle_root(req, ctx),
        Route::Config => handle_config(ctx),
        Route::Save => handle_save(req, ctx),
        Route::Close => handle_close(ctx),
        Route::Info => handle_info(ctx),
        Route::Reset => handle_reset(ctx),
        Route::State => handle_state(ctx),
        Route::NotFound => handle_not_found(req, ctx),
    }
}

/// 处理器出错时返回纯文本 500
pub(crate) fn internal_error(err: &anyhow::Error) -> Response<String> {
    let mut response = Response::new(format!("Internal Server Error\n\n{}\n", err));
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
}

/// 只含数字、`.` 和 `:`，空 Host 也算地址
pub(crate) fn is_ip(host: &str) -> bool {
    host.chars().all(|c| c == '.' || c == ':' || c.is_ascii_digit())
}

/// 请求其他域名的客户端重定向到本机地址
fn captive_portal(req: &PortalRequest, ctx: &Context<'_>) -> anyhow::Result<Option<Reply>> {
    if is_ip(&req.host) {
        return Ok(None);
    }

    let local_ip = ctx.netif.local_ip();
    log::info!(
        "Request for {:?} redirected to captive portal {}",
        req.host,
        local_ip
    );

    let response = Response::builder()
        .status(StatusCode::FOUND)
        .header(LOCATION, format!("http://{}", local_ip))
        .header(CONTENT_TYPE, TEXT_PLAIN)
        .body(String::new())?;

    Ok(Some(Reply {
        response,
        followup: Followup::CloseConnection,
    }))
}

fn no_cache(builder: Builder, cache_control: &'static str) -> Builder {
    builder
        .header(CACHE_CONTROL, cache_control)
        .header(PRAGMA, "no-cache")
        .header(EXPIRES, "-1")
}

fn cors(builder: Builder, config: &PortalConfig) -> Builder {
    match &config.cors_header {
        Some(value) => builder.header(ACCESS_CONTROL_ALLOW_ORIGIN, value.as_str()),
        None => builder,
    }
}

fn page(config: &PortalConfig, body: String) -> anyhow::Result<Response<String>> {
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, TEXT_HTML);
    let builder = cors(no_cache(builder, NO_STORE), config);
    Ok(builder.body(body)?)
}

fn handle_root(req: &PortalRequest, ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    ctx.session.hold_timeout();

    if let Some(redirect) = captive_portal(req, ctx)? {
        return Ok(redirect);
    }

    let body = render::root_page(ctx.config);
    Ok(Reply::send(page(ctx.config, body)?))
}

fn handle_config(ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    ctx.session.hold_timeout();

    let body = render::config_page(ctx.config, ctx.params, ctx.static_ip);
    log::debug!("Sent config page");
    Ok(Reply::send(page(ctx.config, body)?))
}

fn handle_save(req: &PortalRequest, ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    log::debug!("ETH save");

    if ctx.config.capture_timezone {
        match req.non_empty_arg("timezone") {
            Some(tz) => {
                log::debug!("TZ name = {}", tz);
                *ctx.timezone = Some(tz.to_string());
            }
            None => log::debug!("No TZ arg"),
        }
    }

    for field in ctx.params.iter_mut() {
        let Some(value) = field.id().and_then(|id| req.arg(id)) else {
            continue;
        };
        field.set_value(value);
        log::debug!("Parameter {:?} = {:?}", field.id(), field.value());
    }

    ctx.static_ip.apply_form(req, ctx.config.configurable_dns);

    ctx.session.request_connect();
    ctx.session.request_stop();
    ctx.session.restore_timeout();

    let body = render::saved_page(ctx.config);
    Ok(Reply::send(page(ctx.config, body)?))
}

fn handle_close(ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    log::debug!("Server Close");

    ctx.session.request_stop();
    ctx.session.restore_timeout();

    let body = render::close_page(ctx.config, ctx.netif.local_ip());
    Ok(Reply::send(page(ctx.config, body)?))
}

fn device_facts(ctx: &Context<'_>) -> DeviceFacts {
    DeviceFacts {
        chip: ctx.board.chip_info(),
        local_ip: ctx.netif.local_ip(),
        mac: ctx.netif.mac_address(),
        link_up: ctx.netif.is_link_up(),
    }
}

fn handle_info(ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    ctx.session.hold_timeout();

    let facts = device_facts(ctx);
    let body = render::info_page(ctx.config, &facts, ctx.session.connect_requested());
    Ok(Reply::send(page(ctx.config, body)?))
}

fn handle_reset(ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    log::debug!("Reset");

    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, TEXT_HTML);
    let response = no_cache(builder, NO_CACHE_STRICT).body(render::reset_page(ctx.config))?;

    Ok(Reply {
        response,
        followup: Followup::Restart,
    })
}

fn handle_state(ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    let body = serde_json::to_string(&StateReport::from(&*ctx.session))?;
    let builder = Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, APPLICATION_JSON);
    let response = cors(no_cache(builder, NO_STORE), ctx.config).body(body)?;
    Ok(Reply::send(response))
}

fn handle_not_found(req: &PortalRequest, ctx: &mut Context<'_>) -> anyhow::Result<Reply> {
    if let Some(redirect) = captive_portal(req, ctx)? {
        return Ok(redirect);
    }

    let builder = Response::builder()
        .status(StatusCode::NOT_FOUND)
        .header(CONTENT_TYPE, TEXT_PLAIN);
    let response = no_cache(builder, NO_CACHE_STRICT).body(render::not_found_text(req))?;
    Ok(Reply::send(response))
}
