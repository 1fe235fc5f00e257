//! Gateway session engine
//!
//! Owns one logical gateway connection across any number of physical
//! sockets: HELLO handshake, heartbeat liveness, IDENTIFY/RESUME
//! branching, dispatch fan-out, and close-code driven reconnection.

use crate::codec::{Encoding, FrameCodec, Inflater, TermCodec};
use crate::error::GatewayError;
use crate::events::EventEmitter;
use crate::protocol::{
    CloseCode, GatewayFrame, Identify, IdentifyProperties, OpCode, RequestGuildMembers, Resume,
    UpdatePresence, VoiceStateUpdate, EVENT_READY, EVENT_RESUMED,
};
use crate::session::Session;
use crate::transport::{Connector, TransportEvent, TransportHandle, WebSocketConnector};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use url::Url;

/// Close code used when the engine recycles a socket itself (reconnect
/// request, missed heartbeat ACK, undecodable frame)
const RECYCLE_CLOSE_CODE: u16 = 4000;

/// Identify parameters and connection policy for one shard
#[derive(Debug, Clone)]
pub struct ShardConfig {
    pub token: String,
    pub properties: IdentifyProperties,
    /// `[shard_index, shard_total]`
    pub shard: [u64; 2],
    pub large_threshold: Option<u32>,
    pub presence: Option<Value>,
    pub intents: Option<u64>,
    pub encoding: Encoding,
    /// Negotiate zlib-stream transport compression
    pub compress: bool,
    pub version: u8,
    /// Pause between reconnection attempts
    pub reconnect_delay: Duration,
}

impl ShardConfig {
    /// Defaults: single shard, JSON encoding, no compression
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            properties: IdentifyProperties::default(),
            shard: [0, 1],
            large_threshold: None,
            presence: None,
            intents: None,
            encoding: Encoding::Json,
            compress: false,
            version: cord_common::API_VERSION,
            reconnect_delay: Duration::from_secs(1),
        }
    }

    /// Set the shard pair
    #[must_use]
    pub fn shard(mut self, index: u64, total: u64) -> Self {
        self.shard = [index, total];
        self
    }

    /// Set the intents bitfield
    #[must_use]
    pub fn intents(mut self, intents: u64) -> Self {
        self.intents = Some(intents);
        self
    }

    /// Enable zlib-stream compression
    #[must_use]
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Negotiate the binary term encoding (requires a `TermCodec`)
    #[must_use]
    pub fn encoding(mut self, encoding: Encoding) -> Self {
        self.encoding = encoding;
        self
    }

    /// Set the large-guild member threshold
    #[must_use]
    pub fn large_threshold(mut self, threshold: u32) -> Self {
        self.large_threshold = Some(threshold);
        self
    }

    /// Set the initial presence payload
    #[must_use]
    pub fn presence(mut self, presence: Value) -> Self {
        self.presence = Some(presence);
        self
    }

    /// Set the delay between reconnection attempts
    #[must_use]
    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }
}

/// How one physical connection ended
enum ConnectionEnd {
    /// Recycle the socket and go again
    Reconnect,
    /// Close code forbids reconnecting
    Fatal { code: u16, reason: String },
    /// `close(..., reconnect=false)` was requested
    Shutdown,
}

/// One gateway session engine
pub struct Shard {
    config: ShardConfig,
    url: Url,
    codec: FrameCodec,
    connector: Arc<dyn Connector>,
    session: Arc<Session>,
    emitter: Arc<EventEmitter>,
    ack_received: Arc<AtomicBool>,
    shutdown: Arc<AtomicBool>,
    handle: Mutex<Option<TransportHandle>>,
    heartbeat: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Shard {
    /// Engine over the production WebSocket connector
    pub fn new(base_url: &str, config: ShardConfig) -> Result<Arc<Self>, GatewayError> {
        Self::build(base_url, config, Arc::new(WebSocketConnector::new()), None)
    }

    /// Engine with a pluggable binary term codec
    pub fn with_term_codec(
        base_url: &str,
        config: ShardConfig,
        term: Arc<dyn TermCodec>,
    ) -> Result<Arc<Self>, GatewayError> {
        Self::build(base_url, config, Arc::new(WebSocketConnector::new()), Some(term))
    }

    /// Engine over an arbitrary connector (tests, proxies)
    pub fn with_connector(
        base_url: &str,
        config: ShardConfig,
        connector: Arc<dyn Connector>,
    ) -> Result<Arc<Self>, GatewayError> {
        Self::build(base_url, config, connector, None)
    }

    fn build(
        base_url: &str,
        config: ShardConfig,
        connector: Arc<dyn Connector>,
        term: Option<Arc<dyn TermCodec>>,
    ) -> Result<Arc<Self>, GatewayError> {
        let url = connection_url(base_url, &config)?;
        let codec = FrameCodec::new(config.encoding, term)?;

        Ok(Arc::new(Self {
            config,
            url,
            codec,
            connector,
            session: Arc::new(Session::new()),
            emitter: Arc::new(EventEmitter::new()),
            ack_received: Arc::new(AtomicBool::new(true)),
            shutdown: Arc::new(AtomicBool::new(false)),
            handle: Mutex::new(None),
            heartbeat: Mutex::new(None),
        }))
    }

    /// The fully parameterized connection URL
    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Resume state for this engine
    #[must_use]
    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    /// The dispatch fan-out emitter
    #[must_use]
    pub fn emitter(&self) -> &Arc<EventEmitter> {
        &self.emitter
    }

    /// Register a handler: an opcode name receives the full frame, a
    /// dispatch event name receives only the payload
    pub fn on<F>(&self, name: impl Into<String>, handler: F)
    where
        F: Fn(&Value) + Send + Sync + 'static,
    {
        self.emitter.on(name, handler);
    }

    /// Spawn the supervising loop
    pub fn start(self: &Arc<Self>) -> JoinHandle<Result<(), GatewayError>> {
        let shard = self.clone();
        tokio::spawn(shard.run())
    }

    /// Supervising loop: connect, drive, classify, repeat
    ///
    /// Returns `Ok` after `close(..., reconnect=false)`, `Err` on a fatal
    /// close code or an unrecoverable connect failure.
    pub async fn run(self: Arc<Self>) -> Result<(), GatewayError> {
        loop {
            if self.shutdown.load(Ordering::SeqCst) {
                return Ok(());
            }

            let (handle, events) = self.connector.connect(&self.url).await?;
            *lock(&self.handle) = Some(handle.clone());

            let outcome = self.drive(handle, events).await;

            self.stop_heartbeat();
            *lock(&self.handle) = None;

            match outcome {
                ConnectionEnd::Reconnect => {
                    tracing::info!(
                        resumable = self.session.is_resumable(),
                        "reconnecting to gateway"
                    );
                    tokio::time::sleep(self.config.reconnect_delay).await;
                }
                ConnectionEnd::Fatal { code, reason } => {
                    tracing::error!(code, reason = %reason, "gateway closed with unrecoverable code");
                    return Err(GatewayError::Fatal { code, reason });
                }
                ConnectionEnd::Shutdown => return Ok(()),
            }
        }
    }

    /// Consume one connection's event stream to its end
    async fn drive(
        &self,
        handle: TransportHandle,
        mut events: mpsc::Receiver<TransportEvent>,
    ) -> ConnectionEnd {
        // fresh inflate state per socket
        let mut inflater = Inflater::new();

        while let Some(event) = events.recv().await {
            match event {
                TransportEvent::Open => {
                    tracing::debug!(url = %self.url, "gateway socket open, awaiting hello");
                }
                TransportEvent::Text(text) => match self.codec.decode_text(&text) {
                    Ok(frame) => self.handle_frame(&handle, frame).await,
                    Err(e) => self.recycle_on_codec_error(&handle, &e).await,
                },
                TransportEvent::Binary(bytes) => {
                    let payload = if self.config.compress {
                        match inflater.push(&bytes) {
                            Ok(Some(message)) => message,
                            Ok(None) => continue,
                            Err(e) => {
                                self.recycle_on_codec_error(&handle, &e).await;
                                continue;
                            }
                        }
                    } else {
                        bytes
                    };

                    match self.codec.decode_binary(&payload) {
                        Ok(frame) => self.handle_frame(&handle, frame).await,
                        Err(e) => self.recycle_on_codec_error(&handle, &e).await,
                    }
                }
                TransportEvent::Close { code, reason } => {
                    return self.classify_close(code, &reason);
                }
            }
        }

        // event stream ended without a close frame: transport died
        if self.shutdown.load(Ordering::SeqCst) {
            ConnectionEnd::Shutdown
        } else {
            tracing::warn!("transport event stream ended unexpectedly");
            ConnectionEnd::Reconnect
        }
    }

    /// Map a close code onto the reconnect policy
    fn classify_close(&self, code: Option<u16>, reason: &str) -> ConnectionEnd {
        if self.shutdown.load(Ordering::SeqCst) {
            return ConnectionEnd::Shutdown;
        }

        let Some(raw) = code else {
            // raw I/O fault; nothing to learn from it
            return ConnectionEnd::Reconnect;
        };

        match CloseCode::from_u16(raw) {
            Some(close_code) if close_code.is_fatal() => ConnectionEnd::Fatal {
                code: raw,
                reason: reason.to_string(),
            },
            Some(close_code) => {
                if close_code.clears_session() {
                    tracing::info!(
                        code = %close_code,
                        "session invalidated by close code, next handshake will identify"
                    );
                    self.session.clear();
                }
                ConnectionEnd::Reconnect
            }
            // non-gateway codes (1000, 1006, ...) are recoverable
            None => ConnectionEnd::Reconnect,
        }
    }

    /// React to one decoded frame
    async fn handle_frame(&self, handle: &TransportHandle, frame: GatewayFrame) {
        if let Some(seq) = frame.s {
            self.session.observe_seq(seq);
        }

        // opcode-name subscribers always get the whole frame
        self.emitter.emit(
            frame.op.name(),
            &serde_json::to_value(&frame).unwrap_or_default(),
        );

        match frame.op {
            OpCode::Hello => {
                let Some(hello) = frame.as_hello() else {
                    self.recycle_on_codec_error(
                        handle,
                        &GatewayError::Codec("hello payload missing heartbeat_interval".into()),
                    )
                    .await;
                    return;
                };

                tracing::debug!(
                    heartbeat_interval_ms = hello.heartbeat_interval,
                    "hello received"
                );
                self.start_heartbeat(handle.clone(), hello.heartbeat_interval);

                let result = if self.session.is_resumable() {
                    self.send_resume().await
                } else {
                    self.send_identify().await
                };
                if let Err(e) = result {
                    tracing::warn!(error = %e, "handshake send failed");
                }
            }
            OpCode::Dispatch => self.handle_dispatch(frame),
            OpCode::Heartbeat => {
                // server-solicited heartbeat, answered immediately
                if let Err(e) = self
                    .send_packet_on(handle, GatewayFrame::heartbeat(self.session.seq()))
                    .await
                {
                    tracing::warn!(error = %e, "failed to answer heartbeat request");
                }
            }
            OpCode::HeartbeatAck => {
                self.ack_received.store(true, Ordering::SeqCst);
                tracing::trace!("heartbeat acknowledged");
            }
            OpCode::Reconnect => {
                tracing::info!("server requested reconnect");
                if handle.close(RECYCLE_CLOSE_CODE, "reconnect requested").await.is_err() {
                    tracing::debug!("transport already gone during reconnect request");
                }
            }
            OpCode::InvalidSession => {
                let resumable = frame.invalid_session_resumable().unwrap_or(false);
                tracing::warn!(resumable, "session invalidated by server");
                self.session.clear();
                if let Err(e) = self.send_identify().await {
                    tracing::warn!(error = %e, "re-identify after invalid session failed");
                }
            }
            op => {
                tracing::debug!(op = %op, "unexpected opcode from server");
            }
        }
    }

    /// Fan a dispatch out to event-name subscribers
    fn handle_dispatch(&self, frame: GatewayFrame) {
        let Some(name) = frame.event_name().map(str::to_string) else {
            tracing::debug!("dispatch frame without event name");
            return;
        };

        match name.as_str() {
            EVENT_READY => {
                if let Some(session_id) = frame.ready_session_id() {
                    self.session.set_id(session_id.clone());
                    tracing::info!(session_id = %session_id, "gateway session ready");
                } else {
                    tracing::warn!("ready dispatch without session_id");
                }
            }
            EVENT_RESUMED => {
                tracing::info!(seq = ?self.session.seq(), "gateway session resumed");
            }
            _ => {}
        }

        let payload = frame.d.unwrap_or(Value::Null);
        self.emitter.emit(&name, &payload);
    }

    async fn recycle_on_codec_error(&self, handle: &TransportHandle, error: &GatewayError) {
        tracing::warn!(error = %error, "undecodable gateway frame, recycling connection");
        if handle.close(RECYCLE_CLOSE_CODE, "codec error").await.is_err() {
            tracing::debug!("transport already gone during codec recycle");
        }
    }

    /// Launch the heartbeat task for one connection
    ///
    /// Each cycle clears the ACK flag, sends `{op:1, d:seq}`, sleeps the
    /// interval, and forces the socket closed if no ACK arrived.
    fn start_heartbeat(&self, handle: TransportHandle, interval_ms: u64) {
        self.stop_heartbeat();

        let session = self.session.clone();
        let codec = self.codec.clone();
        let ack = self.ack_received.clone();
        ack.store(true, Ordering::SeqCst);

        let task = tokio::spawn(async move {
            let interval = Duration::from_millis(interval_ms);
            loop {
                ack.store(false, Ordering::SeqCst);

                let frame = GatewayFrame::heartbeat(session.seq());
                let outbound = match codec.encode(&frame) {
                    Ok(outbound) => outbound,
                    Err(e) => {
                        tracing::error!(error = %e, "heartbeat encode failed");
                        break;
                    }
                };
                if handle.send(outbound).await.is_err() {
                    tracing::debug!("transport gone, heartbeat task stopping");
                    break;
                }
                tracing::trace!(seq = ?session.seq(), "heartbeat sent");

                tokio::time::sleep(interval).await;

                if !ack.load(Ordering::SeqCst) {
                    tracing::error!(
                        interval_ms,
                        "heartbeat ack missed, forcing connection closed"
                    );
                    let _ = handle.close(RECYCLE_CLOSE_CODE, "heartbeat ack timeout").await;
                    break;
                }
            }
        });

        *lock(&self.heartbeat) = Some(task);
    }

    fn stop_heartbeat(&self) {
        if let Some(task) = lock(&self.heartbeat).take() {
            task.abort();
        }
    }

    async fn send_identify(&self) -> Result<(), GatewayError> {
        let identify = Identify {
            token: self.config.token.clone(),
            properties: self.config.properties.clone(),
            shard: self.config.shard,
            large_threshold: self.config.large_threshold,
            presence: self.config.presence.clone(),
            intents: self.config.intents,
        };

        tracing::info!(shard = ?self.config.shard, "identifying");
        self.send_packet(OpCode::Identify, serde_json::to_value(identify)?)
            .await
    }

    async fn send_resume(&self) -> Result<(), GatewayError> {
        let (Some(session_id), Some(seq)) = (self.session.id(), self.session.seq()) else {
            // resume state evaporated between the check and the send
            return self.send_identify().await;
        };

        let resume = Resume {
            token: self.config.token.clone(),
            session_id: session_id.clone(),
            seq,
        };

        tracing::info!(session_id = %session_id, seq, "resuming session");
        self.send_packet(OpCode::Resume, serde_json::to_value(resume)?)
            .await
    }

    /// Encode and send one `{op, d}` packet on the live connection
    pub async fn send_packet(&self, op: OpCode, data: Value) -> Result<(), GatewayError> {
        let handle = lock(&self.handle).clone().ok_or(GatewayError::ChannelClosed)?;
        self.send_packet_on(&handle, GatewayFrame::command(op, data))
            .await
    }

    async fn send_packet_on(
        &self,
        handle: &TransportHandle,
        frame: GatewayFrame,
    ) -> Result<(), GatewayError> {
        let outbound = self.codec.encode(&frame)?;
        handle.send(outbound).await
    }

    /// Op 8: request offline guild member chunks
    pub async fn request_guild_members(
        &self,
        request: RequestGuildMembers,
    ) -> Result<(), GatewayError> {
        self.send_packet(OpCode::RequestGuildMembers, serde_json::to_value(request)?)
            .await
    }

    /// Op 4: join, move, or leave a voice channel
    pub async fn voice_state_update(&self, update: VoiceStateUpdate) -> Result<(), GatewayError> {
        self.send_packet(OpCode::VoiceStateUpdate, serde_json::to_value(update)?)
            .await
    }

    /// Op 3: update the client's presence
    pub async fn presence_update(&self, update: UpdatePresence) -> Result<(), GatewayError> {
        self.send_packet(OpCode::PresenceUpdate, serde_json::to_value(update)?)
            .await
    }

    /// Close the connection
    ///
    /// `reconnect = false` stops the supervising loop for good;
    /// `reconnect = true` recycles the socket and lets the loop continue.
    pub async fn close(&self, code: u16, reason: &str, reconnect: bool) -> Result<(), GatewayError> {
        if !reconnect {
            self.shutdown.store(true, Ordering::SeqCst);
        }

        let handle = lock(&self.handle).clone();
        match handle {
            Some(handle) => handle.close(code, reason).await,
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for Shard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shard")
            .field("url", &self.url.as_str())
            .field("shard", &self.config.shard)
            .finish_non_exhaustive()
    }
}

/// Compute the connection URL: scheme-checked base plus `version`,
/// `encoding`, and (when enabled) `compress=zlib-stream` query parameters
pub fn connection_url(base: &str, config: &ShardConfig) -> Result<Url, GatewayError> {
    let mut url = Url::parse(base).map_err(|e| GatewayError::Url(e.to_string()))?;

    match url.scheme() {
        "ws" | "wss" => {}
        other => {
            return Err(GatewayError::Url(format!(
                "unsupported scheme `{other}` (expected ws or wss)"
            )))
        }
    }

    url.query_pairs_mut()
        .append_pair("version", &config.version.to_string())
        .append_pair("encoding", config.encoding.name());
    if config.compress {
        url.query_pairs_mut().append_pair("compress", "zlib-stream");
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_url_parameters() {
        let config = ShardConfig::new("t").compress(true);
        let url = connection_url("wss://gateway.example", &config).unwrap();

        let query: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(query.contains(&("version".into(), cord_common::API_VERSION.to_string())));
        assert!(query.contains(&("encoding".into(), "json".into())));
        assert!(query.contains(&("compress".into(), "zlib-stream".into())));
    }

    #[test]
    fn test_connection_url_omits_compress_when_disabled() {
        let config = ShardConfig::new("t");
        let url = connection_url("wss://gateway.example", &config).unwrap();
        assert!(!url.query().unwrap_or("").contains("compress"));
    }

    #[test]
    fn test_connection_url_rejects_http() {
        let config = ShardConfig::new("t");
        assert!(matches!(
            connection_url("https://gateway.example", &config),
            Err(GatewayError::Url(_))
        ));
    }

    #[test]
    fn test_term_encoding_without_codec_refused_at_construction() {
        let config = ShardConfig::new("t").encoding(Encoding::Term);
        assert!(matches!(
            Shard::new("wss://gateway.example", config),
            Err(GatewayError::InvalidEncoding)
        ));
    }
}
