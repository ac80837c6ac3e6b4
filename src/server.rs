use std::sync::Arc;

use anyhow::Context;
use bytes::{Buf, BytesMut};
use tokio::{
    io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    sync::Mutex,
};

use crate::command::Command;
use crate::scanner::PathIndex;
use crate::wire::{self, DecodeError, WireValue};

/// The index is single-owner by design; the mutex serializes connections
/// so that exactly one operation runs against it at a time.
pub type SharedIndex = Arc<Mutex<PathIndex>>;

pub struct CompletionServer {
    index: SharedIndex,
}

impl CompletionServer {
    pub fn new(index: PathIndex) -> Self {
        Self {
            index: Arc::new(Mutex::new(index)),
        }
    }

    pub async fn run(&self, addr: &str) -> anyhow::Result<()> {
        let listener = TcpListener::bind(addr)
            .await
            .with_context(|| format!("Bind {}", addr))?;
        eprintln!("Listening on {}", addr);

        loop {
            let (socket, peer) = listener.accept().await.context("Accept connection")?;
            eprintln!("Accepted connection from {}", peer);

            let index = Arc::clone(&self.index);
            tokio::spawn(async move {
                if let Err(e) = handle_conn(socket, index).await {
                    eprintln!("Connection error: {:#}", e);
                }
            });
        }
    }
}

async fn handle_conn<S>(mut socket: S, index: SharedIndex) -> anyhow::Result<()>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    let mut buf = BytesMut::with_capacity(1024);

    loop {
        let n = socket
            .read_buf(&mut buf)
            .await
            .context("Read from client")?;
        if n == 0 {
            eprintln!("Client disconnected");
            return Ok(());
        }

        // Drain every complete request currently buffered.
        loop {
            let (args, consumed) = match wire::decode_array_of_bulkstrings(&buf) {
                Ok((args, rest)) => (args, buf.len() - rest.len()),
                Err(DecodeError::Incomplete) => break,
                Err(e) => {
                    // No resync point after a malformed frame; report and close.
                    let reply = WireValue::ErrorString(format!("ERR {}", e));
                    socket
                        .write_all(&reply.to_bytes())
                        .await
                        .context("Send decode error")?;
                    return Ok(());
                }
            };
            buf.advance(consumed);

            let reply = dispatch(&args, &index).await;
            socket
                .write_all(&reply.to_bytes())
                .await
                .context("Send reply")?;
        }
    }
}

async fn dispatch(args: &[Vec<u8>], index: &SharedIndex) -> WireValue {
    let cmd = match Command::from_args(args) {
        Ok(cmd) => cmd,
        Err(e) => return WireValue::ErrorString(format!("ERR {}", e)),
    };

    match cmd {
        Command::Ping => {
            eprintln!("Handling PING from client");
            WireValue::SimpleString(String::from("PONG"))
        }
        Command::Insert(path) => {
            eprintln!("Handling INSERT from client");
            let mut index = index.lock().await;
            WireValue::Integer(index.insert(&path) as i64)
        }
        Command::Complete(partial) => {
            eprintln!("Handling COMPLETE from client");
            let index = index.lock().await;
            let matches = index.complete(&partial);
            WireValue::Array(matches.into_iter().map(WireValue::BulkString).collect())
        }
        Command::Scan(dir) => {
            eprintln!("Handling SCAN from client");
            let mut index = index.lock().await;
            // read_dir blocks; keep the executor thread usable for other tasks.
            let scanned = tokio::task::block_in_place(|| index.scan_dir(&dir));
            match scanned {
                Ok(n) => WireValue::Integer(n as i64),
                Err(e) => WireValue::ErrorString(format!("ERR {:#}", e)),
            }
        }
        Command::Count => {
            eprintln!("Handling COUNT from client");
            let index = index.lock().await;
            WireValue::Integer(index.len() as i64)
        }
    }
}
