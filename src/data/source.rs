use std::fmt;
use std::fs;
use std::path::PathBuf;

use log::{debug, info};
use reqwest::{StatusCode, Url, header::CONTENT_TYPE};

use crate::BirdstrikeError;

const SHEETS_BASE_URL: &str = "https://docs.google.com/spreadsheets/d";
pub const DEFAULT_SHEET_NAME: &str = "birdstrikes";
pub const SHEET_TOKEN_ENV: &str = "BIRDSTRIKES_SHEET_TOKEN";

/// A place incident records can be fetched from, as raw CSV text.
pub trait RecordSource {
    fn fetch(&mut self) -> Result<String, BirdstrikeError>;

    /// Human readable description used in log lines and the UI
    fn describe(&self) -> String;
}

/// Bearer credential for a private spreadsheet.
#[derive(Clone)]
pub struct SheetCredentials {
    token: String,
}

impl SheetCredentials {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }

    /// Reads the credential from `BIRDSTRIKES_SHEET_TOKEN`. Empty values count as absent.
    pub fn from_env() -> Option<Self> {
        std::env::var(SHEET_TOKEN_ENV)
            .ok()
            .filter(|t| !t.trim().is_empty())
            .map(Self::new)
    }

    fn token(&self) -> &str {
        &self.token
    }
}

impl fmt::Debug for SheetCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SheetCredentials")
            .field("token", &"<redacted>")
            .finish()
    }
}

/// Google spreadsheet downloaded through the CSV export endpoint.
#[derive(Debug, Clone)]
pub struct GoogleSheetSource {
    sheet_id: String,
    sheet_name: String,
    credentials: Option<SheetCredentials>,
    base_url: String,
    use_system_proxy: bool,
}

impl GoogleSheetSource {
    pub fn new(sheet_id: impl Into<String>, sheet_name: impl Into<String>) -> Self {
        Self {
            sheet_id: sheet_id.into(),
            sheet_name: sheet_name.into(),
            credentials: None,
            base_url: SHEETS_BASE_URL.to_string(),
            use_system_proxy: true,
        }
    }

    pub fn with_credentials(mut self, credentials: Option<SheetCredentials>) -> Self {
        self.credentials = credentials;
        self
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Whether proxies from the environment (`HTTP_PROXY` and friends) apply.
    pub fn with_system_proxy(mut self, enabled: bool) -> Self {
        self.use_system_proxy = enabled;
        self
    }

    pub fn export_url(&self) -> Result<Url, BirdstrikeError> {
        let base = format!(
            "{}/{}/gviz/tq",
            self.base_url.trim_end_matches('/'),
            self.sheet_id
        );
        Url::parse_with_params(
            &base,
            &[("tqx", "out:csv"), ("sheet", self.sheet_name.as_str())],
        )
        .map_err(|e| BirdstrikeError::SheetUnavailable {
            reason: format!("invalid sheet url {}: {}", base, e),
        })
    }

    async fn download(&self) -> Result<String, BirdstrikeError> {
        let url = self.export_url()?;
        debug!("Requesting {}", url);

        let mut builder =
            reqwest::Client::builder().user_agent(concat!("birdstrikes/", env!("CARGO_PKG_VERSION")));
        if !self.use_system_proxy {
            builder = builder.no_proxy();
        }
        let client = builder
            .build()
            .map_err(|e| BirdstrikeError::SheetRequestError { source: e })?;
        let mut request = client.get(url);
        if let Some(credentials) = &self.credentials {
            request = request.bearer_auth(credentials.token());
        }

        let response = request
            .send()
            .await
            .map_err(|e| BirdstrikeError::SheetRequestError { source: e })?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        check_response(response.status(), content_type.as_deref())?;

        response
            .text()
            .await
            .map_err(|e| BirdstrikeError::SheetRequestError { source: e })
    }
}

/// Maps the HTTP status of a sheet export to the loader error taxonomy.
///
/// A private sheet requested without valid credentials is answered with a
/// login page rather than an error status, so an HTML body counts as an
/// authentication failure too.
pub(crate) fn check_response(
    status: StatusCode,
    content_type: Option<&str>,
) -> Result<(), BirdstrikeError> {
    if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
        return Err(BirdstrikeError::AuthenticationFailed {
            status: status.as_u16(),
        });
    }
    if !status.is_success() {
        return Err(BirdstrikeError::SheetUnavailable {
            reason: format!("HTTP {}", status),
        });
    }
    if content_type.is_some_and(|ct| ct.starts_with("text/html")) {
        return Err(BirdstrikeError::AuthenticationFailed {
            status: status.as_u16(),
        });
    }
    Ok(())
}

impl RecordSource for GoogleSheetSource {
    fn fetch(&mut self) -> Result<String, BirdstrikeError> {
        info!("Fetching incident records from {}", self.describe());
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| BirdstrikeError::RuntimeError { source: e })?;
        runtime.block_on(self.download())
    }

    fn describe(&self) -> String {
        format!("Google sheet {} ({})", self.sheet_id, self.sheet_name)
    }
}

/// CSV file on the local disk.
#[derive(Debug, Clone)]
pub struct CsvFileSource {
    path: PathBuf,
}

impl CsvFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for CsvFileSource {
    fn fetch(&mut self) -> Result<String, BirdstrikeError> {
        info!("Reading incident records from {:?}", self.path);
        fs::read_to_string(&self.path).map_err(|e| BirdstrikeError::DataFileError { source: e })
    }

    fn describe(&self) -> String {
        format!("CSV file {}", self.path.display())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::thread::{self, JoinHandle};
    use tempfile::NamedTempFile;

    /// Answers a single HTTP request on a loopback port with a canned response.
    /// Returns the base url to point the sheet source at and a handle yielding
    /// the request head that was received.
    fn serve_once(status: &str, content_type: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status,
            content_type,
            body.len(),
            body
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut head = String::new();
            loop {
                let mut line = String::new();
                if reader.read_line(&mut line).unwrap() == 0 || line == "\r\n" {
                    break;
                }
                head.push_str(&line);
            }
            stream.write_all(response.as_bytes()).unwrap();
            stream.flush().unwrap();
            head
        });
        (base_url, handle)
    }

    fn loopback_source(sheet_id: &str, base_url: String) -> GoogleSheetSource {
        GoogleSheetSource::new(sheet_id, DEFAULT_SHEET_NAME)
            .with_base_url(base_url)
            .with_system_proxy(false)
    }

    #[test]
    fn test_fetch_returns_csv_body_and_sends_token() {
        let body = "Flight Date,Phase of flight\n2000-01-01,Climb\n";
        let (base_url, server) = serve_once("200 OK", "text/csv; charset=utf-8", body);

        let mut source = loopback_source("sheet-id", base_url)
            .with_credentials(Some(SheetCredentials::new("token-123")));
        assert_eq!(source.fetch().unwrap(), body);

        let head = server.join().unwrap();
        let request_line = head.lines().next().unwrap();
        assert!(request_line.starts_with("GET /sheet-id/gviz/tq?"));
        assert!(request_line.contains("tqx=out%3Acsv"));
        assert!(request_line.contains("sheet=birdstrikes"));
        assert!(
            head.to_lowercase()
                .contains("authorization: bearer token-123")
        );
    }

    #[test]
    fn test_fetch_without_credentials_sends_no_token() {
        let (base_url, server) = serve_once("200 OK", "text/csv", "Flight Date,Phase of flight\n");

        let mut source = loopback_source("sheet-id", base_url);
        assert!(source.fetch().is_ok());
        assert!(!server.join().unwrap().to_lowercase().contains("authorization:"));
    }

    #[test]
    fn test_fetch_unauthorized_status() {
        let (base_url, server) = serve_once("401 Unauthorized", "text/plain", "denied");

        let mut source = loopback_source("sheet-id", base_url)
            .with_credentials(Some(SheetCredentials::new("expired")));
        assert!(matches!(
            source.fetch(),
            Err(BirdstrikeError::AuthenticationFailed { status: 401 })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_login_page_is_authentication_failure() {
        let (base_url, server) = serve_once(
            "200 OK",
            "text/html; charset=utf-8",
            "<html><body>Sign in</body></html>",
        );

        let mut source = loopback_source("private-sheet", base_url);
        assert!(matches!(
            source.fetch(),
            Err(BirdstrikeError::AuthenticationFailed { status: 200 })
        ));
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_server_error_is_unavailable() {
        let (base_url, server) = serve_once("503 Service Unavailable", "text/plain", "busy");

        let mut source = loopback_source("sheet-id", base_url);
        match source.fetch() {
            Err(BirdstrikeError::SheetUnavailable { reason }) => assert!(reason.contains("503")),
            other => panic!("Expected SheetUnavailable, got {:?}", other),
        }
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_connection_refused_is_request_error() {
        // bind and drop to get a port nothing listens on
        let port = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap()
            .port();
        let mut source = loopback_source("sheet-id", format!("http://127.0.0.1:{}", port));
        assert!(matches!(
            source.fetch(),
            Err(BirdstrikeError::SheetRequestError { .. })
        ));
    }

    #[test]
    fn test_export_url_encodes_sheet_name() {
        let source = GoogleSheetSource::new("abc123", "bird strikes");
        let url = source.export_url().unwrap();
        assert_eq!(url.host_str(), Some("docs.google.com"));
        assert_eq!(url.path(), "/spreadsheets/d/abc123/gviz/tq");
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("tqx".to_string(), "out:csv".to_string())));
        assert!(pairs.contains(&("sheet".to_string(), "bird strikes".to_string())));
    }

    #[test]
    fn test_export_url_with_custom_base() {
        let source = GoogleSheetSource::new("id", DEFAULT_SHEET_NAME)
            .with_base_url("http://localhost:8080/sheets/");
        let url = source.export_url().unwrap();
        assert_eq!(url.path(), "/sheets/id/gviz/tq");
    }

    #[test]
    fn test_invalid_base_url_is_unavailable() {
        let source = GoogleSheetSource::new("id", DEFAULT_SHEET_NAME).with_base_url("not a url");
        match source.export_url() {
            Err(BirdstrikeError::SheetUnavailable { reason }) => {
                assert!(reason.contains("invalid sheet url"))
            }
            other => panic!("Expected SheetUnavailable, got {:?}", other),
        }
    }

    #[test]
    fn test_check_response_classifies_statuses() {
        assert!(check_response(StatusCode::OK, Some("text/csv; charset=utf-8")).is_ok());
        assert!(check_response(StatusCode::OK, None).is_ok());

        assert!(matches!(
            check_response(StatusCode::UNAUTHORIZED, None),
            Err(BirdstrikeError::AuthenticationFailed { status: 401 })
        ));
        assert!(matches!(
            check_response(StatusCode::FORBIDDEN, Some("text/csv")),
            Err(BirdstrikeError::AuthenticationFailed { status: 403 })
        ));
        assert!(matches!(
            check_response(StatusCode::OK, Some("text/html; charset=utf-8")),
            Err(BirdstrikeError::AuthenticationFailed { status: 200 })
        ));
        assert!(matches!(
            check_response(StatusCode::NOT_FOUND, None),
            Err(BirdstrikeError::SheetUnavailable { .. })
        ));
        assert!(matches!(
            check_response(StatusCode::SERVICE_UNAVAILABLE, None),
            Err(BirdstrikeError::SheetUnavailable { .. })
        ));
    }

    #[test]
    fn test_credentials_are_redacted_in_debug() {
        let credentials = SheetCredentials::new("super-secret");
        let printed = format!("{:?}", credentials);
        assert!(!printed.contains("super-secret"));
        assert!(printed.contains("redacted"));
    }

    #[test]
    fn test_csv_file_source_reads_file() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "Flight Date,Phase of flight").unwrap();
        writeln!(file, "2000-01-01,Climb").unwrap();
        file.flush().unwrap();

        let mut source = CsvFileSource::new(file.path());
        let text = source.fetch().unwrap();
        assert!(text.starts_with("Flight Date,Phase of flight"));
        assert!(source.describe().starts_with("CSV file"));
    }

    #[test]
    fn test_csv_file_source_missing_file() {
        let mut source = CsvFileSource::new("/definitely/not/here.csv");
        assert!(matches!(
            source.fetch(),
            Err(BirdstrikeError::DataFileError { .. })
        ));
    }
}
