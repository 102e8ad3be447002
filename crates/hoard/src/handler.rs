//! Per-connection handler: decode inbound frames, forward them to the hub,
//! and write the hub's notifications back out.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The channel id doubles as the participant id. The first `join` hands the
//! connection's outbox to the hub; from then on the hub decides what this
//! connection sees, and dropping the outbox is how it asks us to hang up.

use std::time::{Duration, Instant};

use hoard_hub::HubHandle;
use hoard_protocol::{ClientEvent, Codec, Envelope, InboundFrame, JsonCodec, ParticipantId, ServerEvent};
use hoard_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::HoardError;

/// Per-connection settings shared by every handler.
#[derive(Debug, Clone, Copy)]
pub(crate) struct HandlerSettings {
    /// Origin for envelope timestamps.
    pub started: Instant,
    /// How long a channel may stay connected without joining.
    pub join_timeout: Duration,
    pub outbox_capacity: usize,
}

/// Tells the hub the channel is gone when the handler exits, however it
/// exits.
struct DisconnectGuard {
    participant: ParticipantId,
    hub: HubHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        self.hub.disconnected_nowait(self.participant);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    hub: HubHandle,
    settings: HandlerSettings,
) -> Result<(), HoardError> {
    let conn_id = conn.id();
    let participant = ParticipantId(conn_id.into_inner());
    tracing::debug!(%conn_id, peer = %conn.peer_addr(), "handling new connection");

    let (outbox_tx, mut outbox_rx) = mpsc::channel::<ServerEvent>(settings.outbox_capacity.max(1));
    let mut outbox = Some(outbox_tx);
    let _guard = DisconnectGuard {
        participant,
        hub: hub.clone(),
    };

    let codec = JsonCodec;
    let mut seq: u64 = 0;
    let now = tokio::time::Instant::now();
    let join_deadline = now
        .checked_add(settings.join_timeout)
        .unwrap_or_else(|| now + Duration::from_secs(30 * 24 * 60 * 60));

    loop {
        tokio::select! {
            _ = tokio::time::sleep_until(join_deadline), if outbox.is_some() => {
                tracing::info!(%participant, "no join before deadline, closing connection");
                let _ = conn.close().await;
                break;
            }

            inbound = conn.recv() => {
                let data = match inbound {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%participant, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%participant, error = %e, "recv error");
                        break;
                    }
                };

                let Some(event) = decode_event(&codec, participant, &data) else {
                    continue;
                };
                tracing::trace!(%participant, event = event.name(), "inbound event");

                if let ClientEvent::Join { username } = &event {
                    if let Some(tx) = outbox.take() {
                        hub.join(participant, username.clone(), tx).await?;
                        continue;
                    }
                }
                hub.submit(participant, event).await?;
            }

            outbound = outbox_rx.recv() => match outbound {
                Some(event) => {
                    seq += 1;
                    let timestamp = settings.started.elapsed().as_millis() as u64;
                    let text = codec.encode(&Envelope::new(seq, timestamp, event))?;
                    conn.send(&text).await?;
                }
                None => {
                    tracing::info!(%participant, "released by hub, closing connection");
                    let _ = conn.close().await;
                    break;
                }
            },
        }
    }

    // _guard drops here → hub hears about the disconnect.
    Ok(())
}

/// Parses one frame. Anything malformed or unknown is logged and skipped.
fn decode_event(codec: &JsonCodec, participant: ParticipantId, data: &[u8]) -> Option<ClientEvent> {
    let frame: InboundFrame = match codec.decode(data) {
        Ok(frame) => frame,
        Err(e) => {
            tracing::debug!(%participant, error = %e, "failed to decode frame");
            return None;
        }
    };
    match ClientEvent::from_frame(&frame) {
        Ok(event) => Some(event),
        Err(e) => {
            tracing::debug!(%participant, error = %e, "ignoring frame");
            None
        }
    }
}
