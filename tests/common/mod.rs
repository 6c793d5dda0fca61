//! Shared helpers for the integration tests: fixture profiles, zip bundles,
//! configurable test providers, and a canned-response HTTP listener standing
//! in for a profile server.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::{BufRead, BufReader, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;

use url::Url;

use preflight_config::Properties;
use preflight_profiles::{HostConfigStore, ProfileError, ProfileProvider};

/// Write one preference file into a profile directory under `root`.
pub fn write_profile_file(root: &Path, profile: &str, file: &str, content: &str) {
    let dir = root.join(profile);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(file), content).unwrap();
}

/// Build an in-memory zip bundle from `(path, content)` entries.
pub fn profile_bundle(entries: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(std::io::Cursor::new(Vec::new()));
    let options = zip::write::SimpleFileOptions::default();
    for (path, content) in entries {
        writer.start_file(*path, options).unwrap();
        writer.write_all(content.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// A provider with fully scripted behavior.
pub struct TestProvider {
    pub key: String,
    pub profiles: Vec<String>,
    pub location: Option<Url>,
    pub vars: HashMap<String, String>,
}

impl TestProvider {
    pub fn local(key: &str, profiles: &[&str], root: &Path) -> Self {
        Self {
            key: key.to_string(),
            profiles: profiles.iter().map(|s| s.to_string()).collect(),
            location: Some(Url::from_file_path(root).unwrap()),
            vars: HashMap::new(),
        }
    }

    pub fn remote(key: &str, profiles: &[&str], location: Url) -> Self {
        Self {
            key: key.to_string(),
            profiles: profiles.iter().map(|s| s.to_string()).collect(),
            location: Some(location),
            vars: HashMap::new(),
        }
    }

    pub fn empty(key: &str) -> Self {
        Self {
            key: key.to_string(),
            profiles: Vec::new(),
            location: None,
            vars: HashMap::new(),
        }
    }

    pub fn with_var(mut self, name: &str, value: &str) -> Self {
        self.vars.insert(name.to_string(), value.to_string());
        self
    }
}

impl ProfileProvider for TestProvider {
    fn requested_profiles(&self) -> Vec<String> {
        self.profiles.clone()
    }

    fn profiles_location(&self) -> Result<Url, ProfileError> {
        self.location.clone().ok_or(ProfileError::MissingLocation)
    }

    fn resolve_variable(&self, name: &str) -> Option<String> {
        self.vars.get(name).cloned()
    }

    fn cache_key(&self) -> String {
        self.key.clone()
    }
}

/// Host store that records what the pipeline registers.
#[derive(Default)]
pub struct CapturingHost {
    pub pinned: Option<PathBuf>,
}

impl CapturingHost {
    /// Load the combined preference set the pipeline registered.
    pub fn combined(&self) -> Properties {
        Properties::load_from_path(self.pinned.as_ref().expect("no combined file registered"))
            .unwrap()
    }
}

impl HostConfigStore for CapturingHost {
    fn is_overridden(&self) -> bool {
        self.pinned.is_some()
    }

    fn set_override(&mut self, path: &Path) {
        self.pinned = Some(path.to_path_buf());
    }
}

/// One request as seen by the stub server.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    /// Request target: path plus query string.
    pub target: String,
    /// Header name/value pairs in arrival order.
    pub headers: Vec<(String, String)>,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    /// Decoded value of the `profiles` query parameter.
    pub fn profiles_param(&self) -> Option<String> {
        let query = self.target.split_once('?')?.1;
        for pair in query.split('&') {
            if let Some(value) = pair.strip_prefix("profiles=") {
                return Some(value.replace("%2C", ",").replace('+', " "));
            }
        }
        None
    }
}

/// A canned HTTP response the stub server plays back.
pub enum CannedResponse {
    /// 200 with a zip body and an `X-Profile-Source: stub-server` header.
    Zip(Vec<u8>),
    /// 304 Not Modified with the `X-Profile-Source` header refreshed.
    NotModified,
    /// Arbitrary status/content-type/body.
    Status {
        code: u16,
        reason: &'static str,
        content_type: &'static str,
        body: Vec<u8>,
    },
}

/// Minimal single-threaded HTTP listener replaying canned responses.
///
/// Responses are consumed in FIFO order; with the queue empty every request
/// gets a plain 404. The accept loop lives on a background thread for the
/// rest of the test process.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    responses: Arc<Mutex<VecDeque<CannedResponse>>>,
}

impl StubServer {
    pub fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let requests: Arc<Mutex<Vec<RecordedRequest>>> = Arc::default();
        let responses: Arc<Mutex<VecDeque<CannedResponse>>> = Arc::default();

        {
            let requests = Arc::clone(&requests);
            let responses = Arc::clone(&responses);
            thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(mut stream) = stream else { continue };
                    let Some(request) = read_request(&mut stream) else {
                        continue;
                    };
                    requests.lock().unwrap().push(request);
                    let response = responses.lock().unwrap().pop_front().unwrap_or(
                        CannedResponse::Status {
                            code: 404,
                            reason: "Not Found",
                            content_type: "text/plain",
                            body: b"no stub response configured".to_vec(),
                        },
                    );
                    let _ = write_response(&mut stream, &response);
                }
            });
        }

        Self {
            addr,
            requests,
            responses,
        }
    }

    /// URL of `path` on this server.
    pub fn url(&self, path: &str) -> Url {
        Url::parse(&format!("http://{}{}", self.addr, path)).unwrap()
    }

    /// Queue the next response.
    pub fn enqueue(&self, response: CannedResponse) {
        self.responses.lock().unwrap().push_back(response);
    }

    /// All requests received so far.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }
}

fn read_request(stream: &mut TcpStream) -> Option<RecordedRequest> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let target = request_line.split_whitespace().nth(1)?.to_string();

    let mut headers = Vec::new();
    loop {
        let mut line = String::new();
        reader.read_line(&mut line).ok()?;
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    Some(RecordedRequest { target, headers })
}

fn write_response(stream: &mut TcpStream, response: &CannedResponse) -> std::io::Result<()> {
    match response {
        CannedResponse::Zip(body) => {
            write!(
                stream,
                "HTTP/1.1 200 OK\r\n\
                 Content-Type: application/zip\r\n\
                 Content-Length: {}\r\n\
                 X-Profile-Source: stub-server\r\n\
                 Connection: close\r\n\r\n",
                body.len()
            )?;
            stream.write_all(body)?;
        }
        CannedResponse::NotModified => {
            write!(
                stream,
                "HTTP/1.1 304 Not Modified\r\n\
                 X-Profile-Source: stub-server\r\n\
                 Connection: close\r\n\r\n"
            )?;
        }
        CannedResponse::Status {
            code,
            reason,
            content_type,
            body,
        } => {
            write!(
                stream,
                "HTTP/1.1 {code} {reason}\r\n\
                 Content-Type: {content_type}\r\n\
                 Content-Length: {}\r\n\
                 Connection: close\r\n\r\n",
                body.len()
            )?;
            stream.write_all(body)?;
        }
    }
    stream.flush()
}
