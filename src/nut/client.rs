use super::UpsClient;
use super::error::NutError;
use super::protocol::{ResponseLine, collect_units, collect_variables, parse_line, quote_argument};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::future::Future;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::sync::Mutex;
use tracing::debug;

pub const DEFAULT_PORT: u16 = 3493;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug)]
struct NutConnection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

async fn with_timeout<T, F>(timeout: Duration, future: F) -> Result<T, NutError>
where
    F: Future<Output = Result<T, NutError>>,
{
    tokio::time::timeout(timeout, future)
        .await
        .map_err(|_| NutError::Timeout(timeout))?
}

impl NutConnection {
    async fn open(address: &str, timeout: Duration) -> Result<Self, NutError> {
        let stream = with_timeout(timeout, async {
            TcpStream::connect(address)
                .await
                .map_err(|source| NutError::Connect {
                    address: address.to_string(),
                    source,
                })
        })
        .await?;
        stream.set_nodelay(true)?;

        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: BufReader::new(reader),
            writer,
        })
    }

    async fn send(&mut self, command: &str, timeout: Duration) -> Result<(), NutError> {
        with_timeout(timeout, async {
            self.writer.write_all(command.as_bytes()).await?;
            self.writer.write_all(b"\n").await?;
            self.writer.flush().await?;
            Ok::<(), NutError>(())
        })
        .await
    }

    async fn read_line(&mut self, timeout: Duration) -> Result<ResponseLine, NutError> {
        let mut line = String::new();
        let read = with_timeout(timeout, async {
            Ok::<_, NutError>(self.reader.read_line(&mut line).await?)
        })
        .await?;
        if read == 0 {
            return Err(NutError::ConnectionClosed);
        }
        parse_line(line.trim_end_matches(['\r', '\n']))
    }

    /// Run `LIST <query>` and return the items between BEGIN and END.
    async fn list(
        &mut self,
        query: &[String],
        timeout: Duration,
    ) -> Result<Vec<Vec<String>>, NutError> {
        let unit = query.get(1).map(String::as_str);
        let arguments = query
            .iter()
            .map(|argument| quote_argument(argument))
            .collect::<Vec<_>>()
            .join(" ");
        self.send(&format!("LIST {}", arguments), timeout).await?;

        match self.read_line(timeout).await? {
            ResponseLine::Begin(echo) if echo.as_slice() == query => {}
            ResponseLine::Error(code) => return Err(NutError::from_server_code(&code, unit)),
            other => {
                return Err(NutError::Protocol(format!(
                    "Expected BEGIN LIST {}, got {:?}",
                    arguments, other
                )));
            }
        }

        let mut items = Vec::new();
        loop {
            match self.read_line(timeout).await? {
                ResponseLine::Item(item) => items.push(item),
                ResponseLine::End(echo) if echo.as_slice() == query => return Ok(items),
                ResponseLine::Error(code) => return Err(NutError::from_server_code(&code, unit)),
                other => {
                    return Err(NutError::Protocol(format!(
                        "Unexpected line in LIST {}: {:?}",
                        arguments, other
                    )));
                }
            }
        }
    }
}

/// Client for the `upsd` network protocol.
///
/// A single TCP connection is opened on first use and reused afterwards.
/// When a call fails in a way that leaves the stream in an unknown state,
/// the connection is dropped and the next call opens a new one.
#[derive(Debug)]
pub struct NutClient {
    host: String,
    port: u16,
    timeout: Duration,
    connection: Mutex<Option<NutConnection>>,
}

impl NutClient {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            timeout: DEFAULT_TIMEOUT,
            connection: Mutex::new(None),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    async fn list(&self, query: &[String]) -> Result<Vec<Vec<String>>, NutError> {
        let mut guard = self.connection.lock().await;
        // Taken out for the whole exchange: if this future is dropped halfway,
        // the half-read connection goes with it
        let mut connection = match guard.take() {
            Some(connection) => connection,
            None => {
                let address = self.address();
                debug!("Connecting to NUT server at {}", address);
                NutConnection::open(&address, self.timeout).await?
            }
        };

        let result = connection.list(query, self.timeout).await;
        match &result {
            Err(error) if error.breaks_connection() => {
                debug!("Dropping NUT connection after error: {}", error);
            }
            _ => *guard = Some(connection),
        }
        result
    }

    /// Say goodbye to the daemon and drop the connection.
    pub async fn close(&self) {
        let mut guard = self.connection.lock().await;
        if let Some(mut connection) = guard.take() {
            // upsd answers "OK Goodbye", there is nothing to do with it
            let _ = connection.send("LOGOUT", self.timeout).await;
        }
    }
}

#[async_trait]
impl UpsClient for NutClient {
    async fn list_units(&self) -> Result<BTreeMap<String, String>, NutError> {
        let items = self.list(&["UPS".to_string()]).await?;
        collect_units(items)
    }

    async fn list_variables(&self, unit: &str) -> Result<BTreeMap<String, String>, NutError> {
        let items = self.list(&["VAR".to_string(), unit.to_string()]).await?;
        collect_variables(unit, items)
    }
}
