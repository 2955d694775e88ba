#![allow(dead_code)]

//! Minimal HTTP/1.1 stub server plus a command builder for the release-verify binary.
//!
//! The server answers GET and HEAD from a fixed route table; unknown paths get 404.
//! Every request is recorded so tests can assert on what was (not) fetched.

use std::collections::HashMap;
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use assert_cmd::Command;

#[derive(Debug, Clone)]
pub struct Route {
    pub status: u16,
    pub body: String,
}

/// A request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

pub struct StubServer {
    pub base: String,
    pub port: u16,
    seen: Arc<Mutex<Vec<SeenRequest>>>,
}

impl StubServer {
    /// Start serving on an ephemeral port. `routes` receives the server's base URL
    /// and returns the route table (path → response).
    pub fn start(routes: impl FnOnce(&str) -> HashMap<String, Route>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let port = listener.local_addr().unwrap().port();
        let base = format!("http://127.0.0.1:{}", port);
        let routes = Arc::new(routes(&base));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let seen_for_server = Arc::clone(&seen);
        thread::spawn(move || {
            for stream in listener.incoming().flatten() {
                let routes = Arc::clone(&routes);
                let seen = Arc::clone(&seen_for_server);
                thread::spawn(move || handle(stream, &routes, &seen));
            }
        });

        StubServer { base, port, seen }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn requests(&self) -> Vec<SeenRequest> {
        self.seen.lock().unwrap().clone()
    }

    pub fn was_requested(&self, path: &str) -> bool {
        self.requests().iter().any(|r| r.path == path)
    }

    /// Command for the binary pointed at this server for both the API and the CDN.
    pub fn cmd(&self, channel: &str) -> Command {
        let mut cmd = assert_cmd::cargo_bin_cmd!("release-verify");
        cmd.env("NO_COLOR", "1")
            .env("AUTH_TOKEN", "test-token")
            .env("BASE_URL", self.url("/multi-channel/releases"))
            .env("BASE_LEGACY_URL", self.url("/releases"))
            .env_remove("RELEASE_VERIFY_LOG")
            .env_remove("HTTP_PROXY")
            .env_remove("http_proxy")
            .env_remove("ALL_PROXY")
            .env_remove("all_proxy")
            .args(["--channel", channel])
            .args(["--host", "127.0.0.1"])
            .args(["--port", &self.port.to_string()])
            .args(["--protocol", "http"])
            .args(["--timeout", "5"]);
        cmd
    }
}

fn handle(mut stream: TcpStream, routes: &HashMap<String, Route>, seen: &Mutex<Vec<SeenRequest>>) {
    let _ = stream.set_read_timeout(Some(Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(Duration::from_secs(2)));

    let mut data = Vec::new();
    let mut buf = [0u8; 4096];
    while !data.windows(4).any(|w| w == b"\r\n\r\n") {
        match stream.read(&mut buf) {
            Ok(0) | Err(_) => return,
            Ok(n) => data.extend_from_slice(&buf[..n]),
        }
    }
    let Ok(request) = std::str::from_utf8(&data) else {
        return;
    };

    let mut lines = request.lines();
    let mut parts = lines.next().unwrap_or("").split_whitespace();
    let method = parts.next().unwrap_or("").to_string();
    let path = parts.next().unwrap_or("").to_string();
    let authorization = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("authorization"))
        .map(|(_, value)| value.trim().to_string());

    seen.lock().unwrap().push(SeenRequest {
        method: method.clone(),
        path: path.clone(),
        authorization,
    });

    let route = routes.get(&path).cloned().unwrap_or(Route {
        status: 404,
        body: "Not Found".to_string(),
    });
    let reason = match route.status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        _ => "Unknown",
    };
    let mut response = format!(
        "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nContent-Type: text/plain\r\nConnection: close\r\n\r\n",
        route.status,
        reason,
        route.body.len()
    );
    if !method.eq_ignore_ascii_case("HEAD") {
        response.push_str(&route.body);
    }
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// Route table for a fully published `dev` release of `version` on `server_base`.
///
/// `winx64_version` lets tests publish a manifest whose platforms disagree.
pub fn published_release(server_base: &str, version: &str, winx64_version: &str) -> HashMap<String, Route> {
    let ok = |body: &str| Route {
        status: 200,
        body: body.to_string(),
    };
    let manifest = format!(
        r#"{{
            "osx": {{"version": "{v}", "url": "{b}/dl/osx/Brave.dmg"}},
            "winx64": {{"version": "{w}", "url": "{b}/dl/winx64/BraveSetup.exe"}}
        }}"#,
        v = version,
        w = winx64_version,
        b = server_base
    );

    let mut routes = HashMap::new();
    routes.insert("/api/1/releases/dev/latest".to_string(), ok(&manifest));
    for path in [
        "/dl/osx/Brave.dmg".to_string(),
        format!("/dl/osx/Brave-{version}.dmg"),
        "/dl/winx64/BraveSetup.exe".to_string(),
        "/multi-channel/releases/dev/winx64/BraveSetup-x64.exe".to_string(),
        "/multi-channel/releases/dev/winia32/BraveSetup-ia32.exe".to_string(),
        format!("/multi-channel/releases/dev/winx64/brave-{version}-full.nupkg"),
        format!("/multi-channel/releases/dev/winia32/brave-{version}-full.nupkg"),
        "/releases/winx64/brave-0.9.0-full.nupkg".to_string(),
        format!("/multi-channel/releases/dev/{version}/winx64/BraveSetup-x64.exe"),
        format!("/multi-channel/releases/dev/{version}/winia32/BraveSetup-ia32.exe"),
        format!("/multi-channel/releases/dev/{version}/debian64/brave_{version}_amd64.deb"),
        format!("/multi-channel/releases/dev/{version}/fedora64/brave-{version}.x86_64.rpm"),
    ] {
        routes.insert(path, ok(""));
    }
    routes.insert(
        "/multi-channel/releases/dev/winx64/RELEASES".to_string(),
        ok(&format!("3F2A brave-{version}-full.nupkg 95126974")),
    );
    routes.insert(
        "/multi-channel/releases/dev/winia32/RELEASES".to_string(),
        ok(&format!("8B1C brave-{version}-full.nupkg 90311002")),
    );
    routes.insert(
        "/releases/winx64/RELEASES".to_string(),
        ok("77D0 brave-0.9.0-full.nupkg 88000000"),
    );
    routes
}
