use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::Response;
use futures::{SinkExt, StreamExt};
use scribe_core::reload::{MessageType, ReloadMessage};
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::BroadcastStream;

use crate::state::AppState;

/// GET /ws/reload — live-reload socket. Pushes coalesced reload frames from
/// the file watcher; answers client pings with a pong carrying the server's
/// own timestamp.
pub async fn ws_reload(State(app): State<AppState>, ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, app))
}

async fn handle_socket(socket: WebSocket, app: AppState) {
    let (mut sink, mut stream) = socket.split();
    let mut reload_rx = BroadcastStream::new(app.reload_tx.subscribe());
    loop {
        tokio::select! {
            broadcasted = reload_rx.next() => match broadcasted {
                Some(Ok(message)) => {
                    let Ok(frame) = message.to_json() else { continue };
                    if sink.send(Message::Text(frame.into())).await.is_err() {
                        break;
                    }
                }
                Some(Err(BroadcastStreamRecvError::Lagged(skipped))) => {
                    tracing::debug!(skipped, "reload subscriber lagged");
                }
                None => break,
            },
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Text(text))) => match ReloadMessage::parse(text.as_str()) {
                    Ok(m) if m.message_type == MessageType::Ping => {
                        let Ok(frame) = ReloadMessage::pong().to_json() else { continue };
                        if sink.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    Ok(_) => {}
                    Err(_) => tracing::debug!("ignoring unrecognized reload frame"),
                },
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(_)) => break,
            },
        }
    }
}
