//! Shared test helpers: an in-process cache server speaking the wire protocol.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// Minimal SET/GET/DEL server backed by a HashMap.
pub struct FakeCacheServer {
    pub addr: String,
    pub store: Arc<Mutex<HashMap<String, String>>>,
    pub commands: Arc<Mutex<Vec<String>>>,
}

impl FakeCacheServer {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();
        let store = Arc::new(Mutex::new(HashMap::new()));
        let commands = Arc::new(Mutex::new(Vec::new()));

        let (task_store, task_commands) = (store.clone(), commands.clone());
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                let (store, commands) = (task_store.clone(), task_commands.clone());
                tokio::spawn(async move {
                    let _ = serve(socket, store, commands).await;
                });
            }
        });

        Self {
            addr,
            store,
            commands,
        }
    }

    pub fn port(&self) -> u16 {
        self.addr.rsplit(':').next().unwrap().parse().unwrap()
    }

    pub fn get(&self, key: &str) -> Option<String> {
        self.store.lock().unwrap().get(key).cloned()
    }

    pub fn insert(&self, key: &str, value: &str) {
        self.store
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    pub fn contains(&self, key: &str) -> bool {
        self.store.lock().unwrap().contains_key(key)
    }

    /// Commands received so far, e.g. `["GET employees", "SET employees"]`.
    pub fn commands(&self) -> Vec<String> {
        self.commands.lock().unwrap().clone()
    }
}

async fn serve(
    socket: TcpStream,
    store: Arc<Mutex<HashMap<String, String>>>,
    commands: Arc<Mutex<Vec<String>>>,
) -> std::io::Result<()> {
    let mut reader = BufReader::new(socket);
    let tokens = read_frame(&mut reader).await?;

    let reply = {
        let mut store = store.lock().unwrap();
        let name = tokens.first().cloned().unwrap_or_default();
        let key = tokens.get(1).cloned().unwrap_or_default();
        commands.lock().unwrap().push(format!("{} {}", name, key));

        match name.as_str() {
            "SET" => {
                let value = tokens.get(2).cloned().unwrap_or_default();
                store.insert(key, value);
                b"+OK\r\n".to_vec()
            }
            "GET" => match store.get(&key) {
                Some(value) => format!("${}\r\n{}\r\n", value.len(), value).into_bytes(),
                None => b"$-1\r\n".to_vec(),
            },
            "DEL" => {
                let removed = store.remove(&key).is_some() as u8;
                format!(":{}\r\n", removed).into_bytes()
            }
            _ => b"-ERR unknown command\r\n".to_vec(),
        }
    };

    reader.get_mut().write_all(&reply).await?;
    reader.get_mut().flush().await
}

async fn read_frame(reader: &mut BufReader<TcpStream>) -> std::io::Result<Vec<String>> {
    let mut line = String::new();
    reader.read_line(&mut line).await?;
    let count: usize = line.trim_end().trim_start_matches('*').parse().unwrap_or(0);

    let mut tokens = Vec::with_capacity(count);
    for _ in 0..count {
        line.clear();
        reader.read_line(&mut line).await?;
        let len: usize = line.trim_end().trim_start_matches('$').parse().unwrap_or(0);

        let mut buf = vec![0u8; len + 2];
        reader.read_exact(&mut buf).await?;
        buf.truncate(len);
        tokens.push(String::from_utf8_lossy(&buf).into_owned());
    }
    Ok(tokens)
}
