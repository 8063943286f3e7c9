/// A tiny fake `upsd` speaking just enough of the NUT protocol for the tests
use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

#[derive(Debug, Default)]
pub struct FakeUpsdState {
    /// unit name -> (description, variables)
    pub units: BTreeMap<String, (String, BTreeMap<String, String>)>,
    pub connections: AtomicUsize,
    pub commands: AtomicUsize,
    /// Wait before answering each command
    pub delay: Duration,
}

pub struct FakeUpsd {
    pub address: SocketAddr,
    pub state: Arc<FakeUpsdState>,
    handle: JoinHandle<()>,
}

impl FakeUpsd {
    pub async fn start(state: FakeUpsdState) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let state = Arc::new(state);

        let server_state = state.clone();
        let handle = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                server_state.connections.fetch_add(1, Ordering::SeqCst);
                tokio::spawn(serve(stream, server_state.clone()));
            }
        });

        Self {
            address,
            state,
            handle,
        }
    }

    pub fn port(&self) -> u16 {
        self.address.port()
    }

    pub fn connections(&self) -> usize {
        self.state.connections.load(Ordering::SeqCst)
    }

    pub fn commands(&self) -> usize {
        self.state.commands.load(Ordering::SeqCst)
    }
}

impl Drop for FakeUpsd {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub fn unit(
    description: &str,
    variables: &[(&str, &str)],
) -> (String, BTreeMap<String, String>) {
    (
        description.to_string(),
        variables
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect(),
    )
}

fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

fn answer(command: &str, state: &FakeUpsdState) -> Option<Vec<String>> {
    let words = command.split_whitespace().collect::<Vec<_>>();
    match words.as_slice() {
        ["LIST", "UPS"] => {
            let mut lines = vec!["BEGIN LIST UPS".to_string()];
            for (name, (description, _)) in &state.units {
                lines.push(format!("UPS {} {}", name, quote(description)));
            }
            lines.push("END LIST UPS".to_string());
            Some(lines)
        }
        ["LIST", "VAR", name] => match state.units.get(*name) {
            Some((_, variables)) => {
                let mut lines = vec![format!("BEGIN LIST VAR {}", name)];
                for (key, value) in variables {
                    lines.push(format!("VAR {} {} {}", name, key, quote(value)));
                }
                lines.push(format!("END LIST VAR {}", name));
                Some(lines)
            }
            None => Some(vec!["ERR UNKNOWN-UPS".to_string()]),
        },
        ["LOGOUT"] => None,
        _ => Some(vec!["ERR UNKNOWN-COMMAND".to_string()]),
    }
}

async fn serve(stream: TcpStream, state: Arc<FakeUpsdState>) {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader).lines();

    while let Ok(Some(command)) = lines.next_line().await {
        state.commands.fetch_add(1, Ordering::SeqCst);
        if !state.delay.is_zero() {
            tokio::time::sleep(state.delay).await;
        }
        let Some(answer) = answer(&command, &state) else {
            let _ = writer.write_all(b"OK Goodbye\n").await;
            return;
        };
        for line in answer {
            if writer.write_all(format!("{}\n", line).as_bytes()).await.is_err() {
                return;
            }
        }
    }
}
