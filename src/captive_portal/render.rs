//! 用 [`html`](super::html) 里的片段拼装页面
//!
//! 渲染只读输入，替换进去的值不做转义

use std::net::Ipv4Addr;

use super::html;
use super::params::{ConfigField, LabelPlacement, ParameterRegistry};
use super::static_ip::{self, StaticIpConfig};
use super::transport::{ChipInfo, PortalRequest};
use crate::config::PortalConfig;

/// 静态 IP 输入框长度，够放点分十进制地址
const IP_FIELD_LEN: &str = "15";

/// 信息页展示的设备情况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceFacts {
    pub chip: ChipInfo,
    pub local_ip: Ipv4Addr,
    pub mac: [u8; 6],
    pub link_up: bool,
}

/// 按顺序把 `tokens` 替换进 `template`，每处都替换
///
/// 值里如果含有后面的占位符，会被再次替换
fn fill(template: &str, tokens: &[(&str, &str)]) -> String {
    let mut out = template.to_string();
    for (token, value) in tokens {
        out = out.replace(token, value);
    }
    out
}

fn head(config: &PortalConfig, title: &str, extra: &str) -> String {
    let mut page = fill(html::HEAD_START, &[("{v}", title)]);
    if config.capture_timezone {
        page += html::SCRIPT_NTP;
    }
    page += html::STYLE;
    page += &config.custom_head_element;
    page += extra;
    page += html::HEAD_END;
    page
}

fn report_status(config: &PortalConfig, page: &mut String) {
    if config.capture_timezone {
        *page += html::NTP_MSG;
    }
}

pub fn root_page(config: &PortalConfig) -> String {
    let mut page = head(config, "Options", "");
    page += html::PORTAL_OPTIONS;
    page += "<div class=\"msg\">";
    report_status(config, &mut page);
    page += "</div>\n";
    page += html::END;
    page
}

fn field_markup(field: &ConfigField) -> String {
    let Some(id) = field.id() else {
        return field.custom_html().to_string();
    };

    let template = match field.label() {
        LabelPlacement::Before => html::FORM_LABEL_BEFORE,
        LabelPlacement::After => html::FORM_LABEL_AFTER,
        LabelPlacement::None => html::FORM_PARAM,
    };

    let max_len = field.max_len().to_string();
    fill(
        template,
        &[
            ("{i}", id),
            ("{n}", id),
            ("{p}", field.placeholder()),
            ("{l}", &max_len),
            ("{v}", field.value()),
            ("{c}", field.custom_html()),
        ],
    )
}

fn ip_field_markup(id: &str, label: &str, value: Option<Ipv4Addr>) -> String {
    let template = format!("{}{}", html::FORM_LABEL, html::FORM_PARAM);
    fill(
        &template,
        &[
            ("{i}", id),
            ("{n}", id),
            ("{p}", label),
            ("{l}", IP_FIELD_LEN),
            ("{v}", &static_ip::display(value)),
            ("{c}", ""),
        ],
    )
}

pub fn config_page(
    config: &PortalConfig,
    params: &ParameterRegistry,
    static_ip: &StaticIpConfig,
) -> String {
    let mut page = head(config, "Config ESP", "");
    page += "<h2>Configuration</h2>\n";
    page += html::FORM_START;

    if !params.is_empty() {
        page += html::FIELDSET_START;
        for field in params.full_list() {
            page += &field_markup(field);
        }
        page += html::FIELDSET_END;
        page += "<br/>\n";
    }

    if config.always_show_static_ip || static_ip.has_static_ip() {
        page += html::FIELDSET_START;
        page += &ip_field_markup("ip", "Static IP", static_ip.ip);
        page += &ip_field_markup("gw", "Gateway IP", static_ip.gateway);
        page += &ip_field_markup("sn", "Subnet", static_ip.netmask);
        if config.configurable_dns {
            page += &ip_field_markup("dns1", "DNS1 IP", static_ip.dns1);
            page += &ip_field_markup("dns2", "DNS2 IP", static_ip.dns2);
        }
        page += html::FIELDSET_END;
        page += "<br/>\n";
    }

    if config.capture_timezone {
        page += html::TIMEZONE_HIDDEN;
    }

    page += html::FORM_END;
    page += html::END;
    page
}

pub fn saved_page(config: &PortalConfig) -> String {
    let mut page = head(config, "Credentials Saved", "");
    page += html::SAVED;
    page += html::END;
    page
}

pub fn close_page(config: &PortalConfig, local_ip: Ipv4Addr) -> String {
    let mut page = head(config, "Close Server", "");
    page += "<div class=\"msg\">";
    page += &format!("IP address is <b>{}</b><br><br>", local_ip);
    page += "Portal closed...<br><br>";
    page += "</div>\n";
    page += html::END;
    page
}

pub fn format_mac(mac: &[u8; 6]) -> String {
    format!(
        "{:02X}:{:02X}:{:02X}:{:02X}:{:02X}:{:02X}",
        mac[0], mac[1], mac[2], mac[3], mac[4], mac[5]
    )
}

/// `connecting` 时加一行状态并 5 秒自动刷新
pub fn info_page(config: &PortalConfig, facts: &DeviceFacts, connecting: bool) -> String {
    let refresh = if connecting {
        "<meta http-equiv=\"refresh\" content=\"5; url=/i\">\n"
    } else {
        ""
    };
    let mut page = head(config, "Info", refresh);

    page += "<dl>";
    if connecting {
        let link = if facts.link_up { "Link up" } else { "Link down" };
        page += &format!("<dt>Trying to connect</dt><dd>{}</dd>", link);
    }
    page += "</dl>\n";
    page += "<h2>Information</h2>\n";
    report_status(config, &mut page);

    let chip = &facts.chip;
    page += html::FIELDSET_START;
    page += "<h3>Device Data</h3>\n<table class=\"table\">\n";
    page += "<thead><tr><th>Name</th><th>Value</th></tr></thead><tbody>\n";
    page += &format!("<tr><td>Chip ID</td><td>{:x}</td></tr>\n", chip.chip_id);
    page += &format!("<tr><td>Chip OUI</td><td>0x{:x}</td></tr>\n", chip.chip_oui);
    page += &format!(
        "<tr><td>Chip Model</td><td>{} Rev{}</td></tr>\n",
        chip.model, chip.revision
    );
    page += &format!(
        "<tr><td>Flash Size</td><td>{} bytes</td></tr>\n",
        chip.flash_size
    );
    page += &format!("<tr><td>Station IP</td><td>{}</td></tr>\n", facts.local_ip);
    page += &format!(
        "<tr><td>Station MAC</td><td>{}</td></tr>\n",
        format_mac(&facts.mac)
    );
    page += "</tbody></table>\n";
    page += html::FIELDSET_END;

    page += html::FIELDSET_START;
    page += html::AVAILABLE_PAGES;
    page += html::FIELDSET_END;

    page += html::END;
    page
}

pub fn reset_page(config: &PortalConfig) -> String {
    let mut page = head(config, "ETH Information", "");
    page += "Resetting";
    page += html::END;
    page
}

/// 纯文本 404 内容，回显客户端请求
pub fn not_found_text(req: &PortalRequest) -> String {
    let mut message = String::from("File Not Found\n\n");
    message += &format!("URI: {}\n", req.uri);
    message += &format!("Method: {}\n", req.method.as_str());
    message += &format!("Arguments: {}\n", req.args.len());
    for (name, value) in &req.args {
        message += &format!(" {}: {}\n", name, value);
    }
    message
}
