//! 内嵌 HTML 页面片段
//!
//! `{x}` 占位符由渲染器替换，值原样插入

pub const HEAD_START: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1, user-scalable=no">
    <title>{v}</title>
"#;

pub const SCRIPT_NTP: &str = r#"<script>
    function tz() {
        var el = document.getElementById('timezone');
        if (!el || !window.Intl) {
            return;
        }
        var name = Intl.DateTimeFormat().resolvedOptions().timeZone;
        if (el.tagName === 'INPUT') {
            el.value = name;
        } else {
            el.textContent = name;
        }
    }
    window.addEventListener('load', tz);
</script>
"#;

pub const STYLE: &str = r#"<style>
    * { box-sizing: border-box; }
    body {
        font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
        background: #1a1a2e;
        color: #eee;
        padding: 20px;
    }
    .c { max-width: 400px; margin: 0 auto; text-align: center; }
    div, input { padding: 5px; font-size: 1em; }
    input {
        width: 95%;
        border: 1px solid #333;
        border-radius: 8px;
        background: #16213e;
        color: #fff;
    }
    button {
        border: 0;
        border-radius: 8px;
        background: #00d4ff;
        color: #1a1a2e;
        line-height: 2.4rem;
        font-size: 1.2rem;
        width: 100%;
        cursor: pointer;
    }
    fieldset { border-radius: 8px; border-color: #333; margin-bottom: 12px; }
    .msg { padding: 12px; margin: 12px 0; border-radius: 8px; background: #1e3a5f; color: #60a5fa; }
    .table td, .table th { padding: 4px 8px; text-align: left; }
</style>
"#;

pub const HEAD_END: &str = "</head>\n<body>\n<div class=\"c\">\n";

pub const PORTAL_OPTIONS: &str = r#"<h2>Options</h2>
<form action="/eth" method="get"><button>Configuration</button></form><br/>
<form action="/i" method="get"><button>Information</button></form><br/>
<form action="/close" method="get"><button>Exit Portal</button></form><br/>
"#;

pub const FORM_START: &str = "<form method=\"get\" action=\"ethsave\">\n";

pub const FIELDSET_START: &str = "<fieldset>\n";

pub const FIELDSET_END: &str = "</fieldset>\n";

pub const FORM_LABEL: &str = "<label for=\"{i}\">{p}</label>";

pub const FORM_PARAM: &str =
    "<input id=\"{i}\" name=\"{n}\" maxlength=\"{l}\" placeholder=\"{p}\" value=\"{v}\" {c}>\n";

pub const FORM_LABEL_BEFORE: &str = "<label for=\"{i}\">{p}</label><input id=\"{i}\" name=\"{n}\" maxlength=\"{l}\" placeholder=\"{p}\" value=\"{v}\" {c}><div></div>\n";

pub const FORM_LABEL_AFTER: &str = "<input id=\"{i}\" name=\"{n}\" maxlength=\"{l}\" placeholder=\"{p}\" value=\"{v}\" {c}><label for=\"{i}\">{p}</label><div></div>\n";

pub const TIMEZONE_HIDDEN: &str = "<input type=\"hidden\" id=\"timezone\" name=\"timezone\">\n";

pub const FORM_END: &str = "<br/><button type=\"submit\">Save</button></form>\n";

pub const SAVED: &str = r#"<div class="msg">Credentials Saved<br/>Trying to connect ESP to the network.<br/>Wait around 10 seconds then check <a href="/">if it's OK.</a></div>
"#;

pub const NTP_MSG: &str = "<p>Your timezone is <b><label id=\"timezone\" name=\"timezone\"></label></b></p>\n";

pub const AVAILABLE_PAGES: &str = r#"<h3>Available pages</h3>
<table class="table">
<thead><tr><th>Page</th><th>Function</th></tr></thead>
<tbody>
<tr><td><a href="/">/</a></td><td>Menu page.</td></tr>
<tr><td><a href="/eth">/eth</a></td><td>Show config page.</td></tr>
<tr><td>/ethsave</td><td>Save config page.</td></tr>
<tr><td><a href="/close">/close</a></td><td>Close the configuration server.</td></tr>
<tr><td><a href="/i">/i</a></td><td>This page.</td></tr>
<tr><td><a href="/r">/r</a></td><td>Delete config and reset the device. Wait about 10 seconds before reconnecting.</td></tr>
<tr><td><a href="/state">/state</a></td><td>Current portal state in JSON format.</td></tr>
</tbody></table>
"#;

pub const END: &str = "</div>\n</body>\n</html>\n";
