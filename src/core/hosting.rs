use crate::core::codec::CallCodec;
use crate::core::data_typed::DataTypedService;
use crate::core::endpoint::{DataTypedEndpoint, ServiceEndpoint, SimultaneousEndpoint};
use crate::core::simultaneous::SimultaneousService;
use crate::core::{HostSettings, MethodCall, MethodResult, MethodStatus};
use crate::utils::error::{HostError, Result};
use futures::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::codec::{FramedRead, FramedWrite};
use tracing::{debug, error, info, warn};

type HostCodec = CallCodec<MethodCall, MethodResult>;

const RESULT_QUEUE_DEPTH: usize = 64;

/// Lowercase with underscores removed, so `GetLineCount` and `get_line_count` match.
pub fn normalize_method(name: &str) -> String {
    name.chars()
        .filter(|c| *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn is_dispose(call: &MethodCall) -> bool {
    if !call.args.is_empty() {
        return false;
    }
    matches!(normalize_method(&call.method).as_str(), "dispose" | "close")
}

/// Routes method calls to registered endpoints and serves them over a byte stream.
pub struct ClassHosting {
    endpoints: Vec<Arc<dyn ServiceEndpoint>>,
    routes: HashMap<String, usize>,
    max_message_bytes: usize,
    closed: AtomicBool,
}

impl ClassHosting {
    pub fn new(max_message_bytes: usize) -> Self {
        Self {
            endpoints: Vec::new(),
            routes: HashMap::new(),
            max_message_bytes,
            closed: AtomicBool::new(false),
        }
    }

    /// Registers the built-in services that the settings enable.
    pub fn from_settings<C: HostSettings>(settings: &C) -> Self {
        let mut hosting = Self::new(settings.max_message_bytes());
        if settings.data_typed_enabled() {
            hosting.add_service_endpoint(DataTypedEndpoint::new(
                DataTypedService::new(),
                settings.max_allocation_bytes(),
            ));
        }
        if settings.simultaneous_enabled() {
            hosting.add_service_endpoint(SimultaneousEndpoint::new(SimultaneousService::new(
                settings.work_delay(),
            )));
        }
        hosting
    }

    pub fn add_service_endpoint<E: ServiceEndpoint + 'static>(&mut self, endpoint: E) {
        let index = self.endpoints.len();
        for name in endpoint.names() {
            if self.routes.insert(name.to_lowercase(), index).is_some() {
                warn!("Contract name {} registered twice, last one wins", name);
            }
        }
        debug!(
            "Registered {} with {} methods",
            endpoint.names().first().copied().unwrap_or("endpoint"),
            endpoint.methods().len()
        );
        self.endpoints.push(Arc::new(endpoint));
    }

    /// Primary names of the registered contracts.
    pub fn contracts(&self) -> Vec<&'static str> {
        self.endpoints
            .iter()
            .filter_map(|ep| ep.names().first().copied())
            .collect()
    }

    /// Dispatches one call. A result too large for one message becomes `MethodFailed`.
    pub async fn handle(&self, call: MethodCall) -> MethodResult {
        let id = call.id;
        let result = self.dispatch(call).await;
        match serde_json::to_vec(&result) {
            Ok(encoded) if encoded.len() <= self.max_message_bytes => result,
            Ok(encoded) => {
                let e = HostError::transport(format!(
                    "result of {} bytes exceeds the message limit of {} bytes",
                    encoded.len(),
                    self.max_message_bytes
                ));
                warn!("[{}] {}", id, e);
                MethodResult::failed(id, MethodStatus::MethodFailed, e.to_string())
            }
            Err(e) => {
                warn!("[{}] Result could not be encoded: {}", id, e);
                MethodResult::failed(id, MethodStatus::MethodFailed, e.to_string())
            }
        }
    }

    async fn dispatch(&self, call: MethodCall) -> MethodResult {
        let MethodCall {
            id,
            class,
            method,
            args,
        } = call;

        let Some(endpoint) = self
            .routes
            .get(&class.to_lowercase())
            .and_then(|index| self.endpoints.get(*index))
        else {
            let e = HostError::ClassNotFound {
                class: class.clone(),
            };
            warn!("[{}] {} ({})", id, e, e.recovery_suggestion());
            return MethodResult::failed(id, MethodStatus::ClassNotFound, class);
        };

        let wanted = normalize_method(&method);
        let spec = endpoint
            .methods()
            .iter()
            .find(|spec| spec.arity == args.len() && normalize_method(spec.name) == wanted);
        let Some(spec) = spec else {
            let target = format!("{}::{}/{}", class, method, args.len());
            let e = HostError::MethodNotFound {
                method: target.clone(),
            };
            warn!("[{}] {} ({})", id, e, e.recovery_suggestion());
            return MethodResult::failed(id, MethodStatus::MethodNotFound, target);
        };

        debug!("[{}] Invoking {}::{}", id, class, spec.name);
        match endpoint.invoke(spec.name, args).await {
            Ok(value) => MethodResult::ok(id, value),
            Err(e) => {
                warn!("[{}] {}::{} failed: {}", id, class, spec.name, e);
                MethodResult::failed(id, MethodStatus::MethodFailed, e.to_string())
            }
        }
    }

    /// Serves calls until end of input or a `Dispose` call.
    ///
    /// Every call runs in its own task, so results can be written out of order.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> Result<()>
    where
        R: AsyncRead + Unpin + Send,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut frames = FramedRead::new(reader, HostCodec::new(self.max_message_bytes));
        let mut sink = FramedWrite::new(writer, HostCodec::new(self.max_message_bytes));

        let (tx, mut rx) = mpsc::channel::<MethodResult>(RESULT_QUEUE_DEPTH);
        let writer_task = tokio::spawn(async move {
            while let Some(result) = rx.recv().await {
                sink.send(result).await?;
            }
            Ok::<_, HostError>(())
        });

        info!("🚀 Serving contracts: {}", self.contracts().join(", "));

        let mut in_flight = JoinSet::new();
        let mut dispose_id = None;
        let mut outcome = Ok(());

        while let Some(frame) = frames.next().await {
            let call = match frame {
                Ok(Ok(call)) => call,
                Ok(Err(e)) => {
                    warn!("Skipping undecodable message: {}", e);
                    continue;
                }
                Err(e) => {
                    error!("❌ Transport failed: {}", e);
                    outcome = Err(e);
                    break;
                }
            };

            if is_dispose(&call) {
                info!("Dispose requested by caller");
                dispose_id = Some(call.id);
                break;
            }

            let hosting = Arc::clone(&self);
            let tx = tx.clone();
            in_flight.spawn(async move {
                let result = hosting.handle(call).await;
                // 寫端已關閉時直接丟棄
                let _ = tx.send(result).await;
            });
            reap_finished(&mut in_flight);
        }

        while let Some(joined) = in_flight.join_next().await {
            if let Err(e) = joined {
                error!("Call task failed: {}", e);
            }
        }
        if let Some(id) = dispose_id {
            let _ = tx.send(MethodResult::ok(id, Value::Null)).await;
        }
        drop(tx);

        let written = writer_task
            .await
            .map_err(|e| HostError::transport(format!("writer task failed: {}", e)))
            .and_then(|result| result);

        self.close().await;
        info!("✅ Host stopped");

        outcome.and(written)
    }

    pub async fn serve_stdio(self: Arc<Self>) -> Result<()> {
        self.serve(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Closes every endpoint. Only the first call has any effect.
    pub async fn close(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            return;
        }
        for endpoint in &self.endpoints {
            if let Err(e) = endpoint.close().await {
                warn!(
                    "Closing {} failed: {}",
                    endpoint.names().first().copied().unwrap_or("endpoint"),
                    e
                );
            }
        }
    }
}

/// Drops finished call tasks so a long-lived host does not accumulate them.
fn reap_finished(in_flight: &mut JoinSet<()>) {
    while let Some(joined) = in_flight.try_join_next() {
        if let Err(e) = joined {
            error!("Call task failed: {}", e);
        }
    }
}
