use crate::core::codec::CallCodec;
use crate::core::{MethodCall, MethodResult, MethodStatus};
use crate::utils::error::{HostError, Result};
use futures::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::process::{Child, Command};
use tokio::sync::{oneshot, Mutex as AsyncMutex};
use tokio::task::JoinHandle;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, warn};

type ClientCodec = CallCodec<MethodResult, MethodCall>;
type BoxedWriter = Box<dyn AsyncWrite + Unpin + Send>;

const CLOSE_TIMEOUT: Duration = Duration::from_millis(250);

#[derive(Default)]
struct PendingCalls {
    waiters: Mutex<HashMap<u32, oneshot::Sender<MethodResult>>>,
    disconnected: AtomicBool,
}

impl PendingCalls {
    fn waiters(&self) -> std::sync::MutexGuard<'_, HashMap<u32, oneshot::Sender<MethodResult>>> {
        self.waiters.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn register(&self, id: u32, tx: oneshot::Sender<MethodResult>) -> Result<()> {
        let mut waiters = self.waiters();
        if self.disconnected.load(Ordering::SeqCst) {
            return Err(HostError::Closed);
        }
        waiters.insert(id, tx);
        Ok(())
    }

    fn complete(&self, result: MethodResult) {
        let waiter = self.waiters().remove(&result.id);
        match waiter {
            Some(tx) => {
                let _ = tx.send(result);
            }
            None => warn!("Dropping result for unknown call {}", result.id),
        }
    }

    fn forget(&self, id: u32) {
        self.waiters().remove(&id);
    }

    /// Marks the connection gone; dropped senders wake every waiter with `Closed`.
    fn fail_all(&self) {
        self.disconnected.store(true, Ordering::SeqCst);
        let drained = self.waiters().drain().count();
        if drained > 0 {
            debug!("Failed {} pending calls", drained);
        }
    }
}

/// Calls contracts on a host over a byte stream and matches results to callers by id.
pub struct ServiceClient {
    writer: AsyncMutex<FramedWrite<BoxedWriter, ClientCodec>>,
    pending: Arc<PendingCalls>,
    next_id: AtomicU32,
    listener: Mutex<Option<JoinHandle<()>>>,
    child: AsyncMutex<Option<Child>>,
    shut_down: AtomicBool,
}

impl ServiceClient {
    pub fn connect<R, W>(reader: R, writer: W) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        Self::connect_with_limit(reader, writer, crate::core::codec::DEFAULT_MAX_MESSAGE_BYTES)
    }

    pub fn connect_with_limit<R, W>(reader: R, writer: W, max_message_bytes: usize) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let pending = Arc::new(PendingCalls::default());
        let frames = FramedRead::new(reader, ClientCodec::new(max_message_bytes));
        let listener = tokio::spawn(listen(frames, Arc::clone(&pending)));
        let writer: BoxedWriter = Box::new(writer);

        Self {
            writer: AsyncMutex::new(FramedWrite::new(
                writer,
                ClientCodec::new(max_message_bytes),
            )),
            pending,
            next_id: AtomicU32::new(1),
            listener: Mutex::new(Some(listener)),
            child: AsyncMutex::new(None),
            shut_down: AtomicBool::new(false),
        }
    }

    /// Starts a host process and talks to it over its stdio.
    pub fn spawn(program: impl AsRef<Path>, args: &[String]) -> Result<Self> {
        let program = resolve_program(program.as_ref())?;
        debug!("Spawning host {} with args {:?}", program.display(), args);

        let mut child = Command::new(&program)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| HostError::transport("host stdin is not available"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| HostError::transport("host stdout is not available"))?;

        let mut client = Self::connect(stdout, stdin);
        client.child = AsyncMutex::new(Some(child));
        Ok(client)
    }

    pub async fn call<T: DeserializeOwned>(
        &self,
        class: &str,
        method: &str,
        args: Vec<Value>,
    ) -> Result<T> {
        let result = self.request(class, method, args).await?;
        unpack(result)
    }

    async fn request(&self, class: &str, method: &str, args: Vec<Value>) -> Result<MethodResult> {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let (tx, rx) = oneshot::channel();
        self.pending.register(id, tx)?;

        let call = MethodCall {
            id,
            class: class.to_string(),
            method: method.to_string(),
            args,
        };
        debug!("[{}] Calling {}::{}", id, class, method);

        let sent = self.writer.lock().await.send(call).await;
        if let Err(e) = sent {
            self.pending.forget(id);
            return Err(e);
        }

        rx.await.map_err(|_| HostError::Closed)
    }

    /// Asks the host to dispose, then releases the connection and any child process.
    pub async fn close(&self) -> Result<()> {
        if self.shut_down.swap(true, Ordering::SeqCst) {
            return Ok(());
        }

        match tokio::time::timeout(
            CLOSE_TIMEOUT,
            self.request("IDisposable", "Dispose", Vec::new()),
        )
        .await
        {
            Ok(Ok(_)) => debug!("Host acknowledged dispose"),
            Ok(Err(e)) => debug!("Dispose not acknowledged: {}", e),
            Err(_) => debug!("Dispose timed out"),
        }

        if let Some(listener) = self.take_listener() {
            listener.abort();
        }
        self.pending.fail_all();

        let _ = self.writer.lock().await.close().await;

        if let Some(mut child) = self.child.lock().await.take() {
            match tokio::time::timeout(CLOSE_TIMEOUT, child.wait()).await {
                Ok(Ok(status)) => debug!("Host exited with {}", status),
                Ok(Err(e)) => warn!("Waiting for host failed: {}", e),
                Err(_) => {
                    warn!("Host did not exit in time, killing it");
                    child.kill().await?;
                }
            }
        }
        Ok(())
    }

    fn take_listener(&self) -> Option<JoinHandle<()>> {
        self.listener
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .take()
    }
}

impl Drop for ServiceClient {
    fn drop(&mut self) {
        if let Some(listener) = self.take_listener() {
            listener.abort();
        }
    }
}

async fn listen<R>(mut frames: FramedRead<R, ClientCodec>, pending: Arc<PendingCalls>)
where
    R: AsyncRead + Unpin + Send,
{
    while let Some(frame) = frames.next().await {
        match frame {
            Ok(Ok(result)) => pending.complete(result),
            Ok(Err(e)) => warn!("Skipping undecodable result: {}", e),
            Err(e) => {
                error!("❌ Connection to host failed: {}", e);
                break;
            }
        }
    }
    pending.fail_all();
}

fn unpack<T: DeserializeOwned>(result: MethodResult) -> Result<T> {
    match result.status {
        MethodStatus::Ok => Ok(serde_json::from_value(result.result)?),
        status => {
            let message = match result.result {
                Value::String(text) => text,
                other => other.to_string(),
            };
            Err(HostError::Remote { status, message })
        }
    }
}

/// `host.exe` falls back to `host` so the same path works across platforms.
fn resolve_program(path: &Path) -> Result<PathBuf> {
    if path.exists() {
        return Ok(path.to_path_buf());
    }
    if path.extension().is_some_and(|ext| ext == "exe") {
        let stripped = path.with_extension("");
        if stripped.exists() {
            return Ok(stripped);
        }
    }
    Err(HostError::IoError(std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("Missing: {}", path.display()),
    )))
}
