//! Full portal sessions driven through scripted collaborators.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::net::Ipv4Addr;
use std::rc::Rc;
use std::time::{Duration, Instant};

use eth_portal::captive_portal::{
    Board, ChipInfo, DnsResponder, HttpTransport, NetworkInterface, PortalError, PortalPhase,
    PortalRequest, RegistryError,
};
use eth_portal::{CaptivePortal, ConfigField, PortalConfig, PortalOutcome, StaticIpConfig};
use http::StatusCode;

const DEVICE_IP: Ipv4Addr = Ipv4Addr::new(10, 0, 0, 5);

/// Shared record of everything the portal did to its collaborators.
#[derive(Default)]
struct Bench {
    started_at: Option<Instant>,
    script: VecDeque<(Duration, PortalRequest)>,
    sent: Vec<http::Response<String>>,
    events: Vec<String>,
    hostname: Option<String>,
    dns_fails: bool,
    http_fails: bool,
}

type Shared = Rc<RefCell<Bench>>;

struct FakeNetif(Shared);

impl NetworkInterface for FakeNetif {
    fn local_ip(&self) -> Ipv4Addr {
        DEVICE_IP
    }

    fn mac_address(&self) -> [u8; 6] {
        [0x24, 0x6f, 0x28, 0x00, 0x00, 0x01]
    }

    fn is_link_up(&self) -> bool {
        true
    }

    fn set_hostname(&mut self, hostname: &str) -> anyhow::Result<()> {
        self.0.borrow_mut().hostname = Some(hostname.to_string());
        Ok(())
    }
}

struct FakeDns(Shared);

impl DnsResponder for FakeDns {
    fn start(&mut self, port: u16, domain: &str, answer: Ipv4Addr) -> anyhow::Result<()> {
        let mut bench = self.0.borrow_mut();
        if bench.dns_fails {
            bench.events.push("dns start failed".to_string());
            anyhow::bail!("no socket available");
        }
        bench.events.push(format!("dns start {} {} {}", port, domain, answer));
        Ok(())
    }

    fn process_next_request(&mut self) {}

    fn stop(&mut self) {
        self.0.borrow_mut().events.push("dns stop".to_string());
    }
}

struct FakeHttp(Shared);

impl HttpTransport for FakeHttp {
    fn begin(&mut self, port: u16) -> anyhow::Result<()> {
        let mut bench = self.0.borrow_mut();
        bench.started_at = Some(Instant::now());
        if bench.http_fails {
            bench.events.push("http begin failed".to_string());
            anyhow::bail!("port {} in use", port);
        }
        bench.events.push(format!("http begin {}", port));
        Ok(())
    }

    fn poll_request(&mut self) -> Option<PortalRequest> {
        let mut bench = self.0.borrow_mut();
        let elapsed = bench.started_at?.elapsed();
        match bench.script.front() {
            Some((at, _)) if *at <= elapsed => bench.script.pop_front().map(|(_, req)| req),
            _ => None,
        }
    }

    fn send(&mut self, response: http::Response<String>) -> anyhow::Result<()> {
        let mut bench = self.0.borrow_mut();
        bench.events.push(format!("send {}", response.status().as_u16()));
        bench.sent.push(response);
        Ok(())
    }

    fn close_connection(&mut self) {
        self.0.borrow_mut().events.push("close connection".to_string());
    }

    fn stop(&mut self) {
        self.0.borrow_mut().events.push("http stop".to_string());
    }
}

struct FakeBoard(Shared);

impl Board for FakeBoard {
    fn chip_info(&self) -> ChipInfo {
        ChipInfo {
            chip_id: 0xabcdef,
            chip_oui: 0x246f28,
            model: "ESP32-D0WD".to_string(),
            revision: 3,
            flash_size: 4 * 1024 * 1024,
        }
    }

    fn delay(&mut self, duration: Duration) {
        self.0
            .borrow_mut()
            .events
            .push(format!("delay {}ms", duration.as_millis()));
    }

    fn restart(&mut self) {
        self.0.borrow_mut().events.push("restart".to_string());
    }
}

type Portal = CaptivePortal<FakeNetif, FakeDns, FakeHttp, FakeBoard>;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn fast_config() -> PortalConfig {
    PortalConfig {
        poll_interval: Duration::from_millis(1),
        reset_delay: Duration::from_millis(20),
        ..PortalConfig::default()
    }
}

fn portal_with(hostname: &str, config: PortalConfig) -> (Portal, Shared) {
    init_logger();
    let bench: Shared = Rc::default();
    let portal = CaptivePortal::new(
        hostname,
        config,
        FakeNetif(bench.clone()),
        FakeDns(bench.clone()),
        FakeHttp(bench.clone()),
        FakeBoard(bench.clone()),
    );
    (portal, bench)
}

fn script(bench: &Shared, requests: Vec<(u64, PortalRequest)>) {
    bench.borrow_mut().script = requests
        .into_iter()
        .map(|(ms, req)| (Duration::from_millis(ms), req.with_host(DEVICE_IP.to_string())))
        .collect();
}

fn location(response: &http::Response<String>) -> Option<&str> {
    response
        .headers()
        .get(http::header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

#[test]
fn save_with_break_after_config_connects_once() {
    let mut config = fast_config();
    config.break_after_config = true;
    let (mut portal, bench) = portal_with("node-1", config);
    portal
        .add_parameter(ConfigField::new("ssid", "SSID", "", 20))
        .unwrap();
    portal
        .add_parameter(ConfigField::new("mqtt", "MQTT Server", "broker.lan", 40))
        .unwrap();

    let saves = Rc::new(Cell::new(0));
    let counter = saves.clone();
    portal.set_save_callback(move || counter.set(counter.get() + 1));

    script(
        &bench,
        vec![
            (0, PortalRequest::get("/")),
            (0, PortalRequest::get("/eth")),
            (
                0,
                PortalRequest::get("/ethsave")
                    .with_arg("ssid", "A".repeat(25))
                    .with_arg("mqtt", "mqtt.example")
                    .with_arg("ip", "192.168.1.40")
                    .with_arg("gw", "192.168.1.1")
                    .with_arg("sn", "255.255.255.0"),
            ),
        ],
    );

    let outcome = portal.start().unwrap();

    assert_eq!(outcome, PortalOutcome::Connected);
    assert!(outcome.is_connected());
    assert_eq!(saves.get(), 1);
    assert_eq!(portal.phase(), PortalPhase::Connected);
    assert_eq!(portal.params().get("ssid").unwrap().value(), "A".repeat(20));
    assert_eq!(portal.params().get("mqtt").unwrap().value(), "mqtt.example");
    assert_eq!(
        portal.static_ip_config(),
        StaticIpConfig::new(
            Ipv4Addr::new(192, 168, 1, 40),
            Ipv4Addr::new(192, 168, 1, 1),
            Ipv4Addr::new(255, 255, 255, 0),
        )
    );

    let bench = bench.borrow();
    assert_eq!(bench.sent.len(), 3);
    assert!(bench.sent.iter().all(|r| r.status() == StatusCode::OK));
    assert!(bench.sent[1].body().contains("value=\"broker.lan\""));
    assert_eq!(bench.events.first().map(String::as_str), Some("dns start 53 * 10.0.0.5"));
    assert!(bench.events.ends_with(&["http stop".to_string(), "dns stop".to_string()]));
}

#[test]
fn save_without_break_stops_with_saved_flag() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    portal
        .add_parameter(ConfigField::new("ssid", "SSID", "", 20))
        .unwrap();
    let saves = Rc::new(Cell::new(0));
    let counter = saves.clone();
    portal.set_save_callback(move || counter.set(counter.get() + 1));

    script(
        &bench,
        vec![(0, PortalRequest::get("/ethsave").with_arg("ssid", "lab"))],
    );

    let outcome = portal.start().unwrap();
    assert_eq!(outcome, PortalOutcome::Stopped { saved: true });
    assert!(outcome.is_connected());
    assert_eq!(saves.get(), 0);
    assert_eq!(portal.params().at(0).value(), "lab");
}

#[test]
fn save_leaves_fields_missing_from_the_form_alone() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    portal
        .add_parameter(ConfigField::new("ssid", "SSID", "", 20))
        .unwrap();
    portal
        .add_parameter(ConfigField::new("mqtt", "MQTT Server", "broker.lan", 40))
        .unwrap();

    script(
        &bench,
        vec![(0, PortalRequest::get("/ethsave").with_arg("ssid", "lab"))],
    );
    portal.start().unwrap();

    assert_eq!(portal.params().get("ssid").unwrap().value(), "lab");
    assert_eq!(portal.params().get("mqtt").unwrap().value(), "broker.lan");
}

#[test]
fn blank_static_ip_keeps_previous_value() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    portal.set_static_ip_config(StaticIpConfig::new(
        DEVICE_IP,
        Ipv4Addr::new(10, 0, 0, 1),
        Ipv4Addr::new(255, 255, 255, 0),
    ));

    script(
        &bench,
        vec![(
            0,
            PortalRequest::get("/ethsave")
                .with_arg("gw", "")
                .with_arg("dns1", "1.1.1.1"),
        )],
    );
    portal.start().unwrap();

    let ip = portal.static_ip_config();
    assert_eq!(ip.ip, Some(DEVICE_IP));
    assert_eq!(ip.gateway, Some(Ipv4Addr::new(10, 0, 0, 1)));
    assert_eq!(ip.dns1, Some(Ipv4Addr::new(1, 1, 1, 1)));
    assert_eq!(ip.dns2, None);
}

#[test]
fn close_stops_without_connecting() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    script(&bench, vec![(0, PortalRequest::get("/close"))]);

    let outcome = portal.start().unwrap();
    assert_eq!(outcome, PortalOutcome::Stopped { saved: false });
    assert!(!outcome.is_connected());
    assert!(bench.borrow().sent[0].body().contains("Portal closed"));
}

#[test]
fn times_out_when_nobody_visits() {
    let (mut portal, _bench) = portal_with("node-1", fast_config());
    portal.set_timeout(Duration::from_millis(300));

    let started = Instant::now();
    let outcome = portal.start().unwrap();
    let elapsed = started.elapsed();

    assert_eq!(outcome, PortalOutcome::TimedOut);
    assert_eq!(portal.phase(), PortalPhase::TimedOut);
    assert!(elapsed >= Duration::from_millis(300), "{elapsed:?}");
    assert!(elapsed < Duration::from_secs(5), "{elapsed:?}");
}

#[test]
fn viewing_a_page_suspends_the_timeout() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    portal.set_timeout(Duration::from_millis(100));
    script(
        &bench,
        vec![
            (0, PortalRequest::get("/eth")),
            (400, PortalRequest::get("/close")),
        ],
    );

    let outcome = portal.start().unwrap();
    assert_eq!(outcome, PortalOutcome::Stopped { saved: false });
    assert_eq!(bench.borrow().sent.len(), 2);
}

#[test]
fn foreign_host_is_redirected_and_connection_closed() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    bench.borrow_mut().script = VecDeque::from(vec![
        (
            Duration::ZERO,
            PortalRequest::get("/generate_204").with_host("connectivitycheck.gstatic.com"),
        ),
        (
            Duration::ZERO,
            PortalRequest::get("/").with_host(DEVICE_IP.to_string()),
        ),
        (
            Duration::ZERO,
            PortalRequest::get("/close").with_host(DEVICE_IP.to_string()),
        ),
    ]);

    portal.start().unwrap();

    let bench = bench.borrow();
    let redirect = &bench.sent[0];
    assert_eq!(redirect.status(), StatusCode::FOUND);
    assert_eq!(location(redirect), Some("http://10.0.0.5"));
    assert!(redirect.body().is_empty());

    assert_eq!(bench.sent[1].status(), StatusCode::OK);
    assert!(location(&bench.sent[1]).is_none());

    let closes = bench
        .events
        .iter()
        .filter(|e| *e == "close connection")
        .count();
    assert_eq!(closes, 1);
    let send = bench.events.iter().position(|e| e == "send 302").unwrap();
    assert_eq!(bench.events[send + 1], "close connection");
}

#[test]
fn dns_failure_degrades_instead_of_aborting() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    bench.borrow_mut().dns_fails = true;
    script(&bench, vec![(0, PortalRequest::get("/close"))]);

    let outcome = portal.start().unwrap();
    assert_eq!(outcome, PortalOutcome::Stopped { saved: false });

    let bench = bench.borrow();
    assert!(bench.events.contains(&"dns start failed".to_string()));
    assert!(bench.events.contains(&"http stop".to_string()));
    assert!(bench.events.contains(&"dns stop".to_string()));
}

#[test]
fn http_failure_still_times_out_and_tears_down() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    bench.borrow_mut().http_fails = true;
    portal.set_timeout(Duration::from_millis(50));

    assert_eq!(portal.start().unwrap(), PortalOutcome::TimedOut);
    let bench = bench.borrow();
    assert!(bench.events.ends_with(&["http stop".to_string(), "dns stop".to_string()]));
}

#[test]
fn reset_sends_page_then_waits_then_restarts() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    script(&bench, vec![(0, PortalRequest::get("/r"))]);

    let outcome = portal.start().unwrap();
    assert_eq!(outcome, PortalOutcome::Stopped { saved: false });

    let bench = bench.borrow();
    let send = bench.events.iter().position(|e| e == "send 200").unwrap();
    assert_eq!(bench.events[send + 1], "delay 20ms");
    assert_eq!(bench.events[send + 2], "restart");
    assert_eq!(bench.events.iter().filter(|e| *e == "restart").count(), 1);
    assert!(bench.sent[0].body().contains("Resetting"));
}

#[test]
fn unknown_path_is_404_with_request_echo() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    script(
        &bench,
        vec![
            (0, PortalRequest::get("/nope").with_arg("k", "v")),
            (0, PortalRequest::get("/close")),
        ],
    );
    portal.start().unwrap();

    let bench = bench.borrow();
    assert_eq!(bench.sent[0].status(), StatusCode::NOT_FOUND);
    assert_eq!(
        bench.sent[0].body(),
        "File Not Found\n\nURI: /nope\nMethod: GET\nArguments: 1\n k: v\n"
    );
}

#[test]
fn state_route_reports_running_session() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    script(
        &bench,
        vec![
            (0, PortalRequest::get("/state")),
            (0, PortalRequest::get("/close")),
        ],
    );
    portal.start().unwrap();

    let json: serde_json::Value = serde_json::from_str(bench.borrow().sent[0].body()).unwrap();
    assert_eq!(json["phase"], "running");
    assert_eq!(json["timeout_secs"], 120);
}

#[test]
fn finished_session_cannot_start_again() {
    let (mut portal, _bench) = portal_with("node-1", fast_config());
    portal.set_timeout(Duration::from_millis(10));
    portal.start().unwrap();

    assert_eq!(
        portal.start(),
        Err(PortalError::SessionFinished(PortalPhase::TimedOut))
    );
}

#[test]
fn hostname_is_sanitized_or_derived_from_chip_id() {
    let (portal, bench) = portal_with("my device!!", fast_config());
    assert_eq!(portal.hostname(), "mydevice");
    assert_eq!(bench.borrow().hostname.as_deref(), Some("mydevice"));

    let (portal, _) = portal_with("", fast_config());
    assert_eq!(portal.hostname(), "ESP32-ABCDEF");
}

#[test]
fn registry_limits_surface_to_the_caller() {
    let mut config = fast_config();
    config.initial_param_capacity = 1;
    config.param_growth = 0;
    let (mut portal, _) = portal_with("node-1", config);

    assert_eq!(
        portal.add_parameter(ConfigField::new("a", "A", "", 4)),
        Ok(0)
    );
    assert_eq!(
        portal.add_parameter(ConfigField::new("b", "B", "", 4)),
        Err(RegistryError::Full { capacity: 1 })
    );
    assert_eq!(portal.params().count(), 1);
}

#[test]
fn config_page_renders_identically_twice() {
    let (mut portal, bench) = portal_with("node-1", fast_config());
    portal
        .add_parameter(ConfigField::new("mqtt", "MQTT Server", "broker.lan", 40))
        .unwrap();
    script(
        &bench,
        vec![
            (0, PortalRequest::get("/eth")),
            (0, PortalRequest::get("/eth")),
            (0, PortalRequest::get("/close")),
        ],
    );
    portal.start().unwrap();

    let bench = bench.borrow();
    assert_eq!(bench.sent[0].body(), bench.sent[1].body());
    assert_eq!(bench.sent[0].headers(), bench.sent[1].headers());
}
