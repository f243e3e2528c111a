use crate::hub::SensorHub;
use axum::{
    extract::{
        ws::{Message, WebSocket},
        State, WebSocketUpgrade,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use std::sync::Arc;
use tokio::select;
use tracing::{debug, info, warn};

/// Commands a client may send after connecting.
#[derive(Debug, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
enum ClientCommand {
    #[serde(rename_all = "camelCase")]
    JoinSensor { sensor_id: String },
    #[serde(rename_all = "camelCase")]
    LeaveSensor { sensor_id: String },
}

pub async fn ws_handler(ws: WebSocketUpgrade, State(hub): State<Arc<SensorHub>>) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, hub))
}

async fn handle_socket(socket: WebSocket, hub: Arc<SensorHub>) {
    let (mut sender, mut receiver) = socket.split();
    let (client_id, mut events) = hub.register().await;

    loop {
        select! {
            event = events.recv() => {
                match event {
                    Some(event) => {
                        match serde_json::to_string(&event) {
                            Ok(json) => {
                                if sender.send(Message::Text(json)).await.is_err() {
                                    debug!(client_id = %client_id, "Client disconnected");
                                    break;
                                }
                            }
                            Err(e) => {
                                warn!(client_id = %client_id, error = %e, "Failed to serialize event");
                            }
                        }
                    }
                    // Hub dropped the channel; server is shutting down.
                    None => break,
                }
            }

            msg = receiver.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        handle_command(&hub, client_id, &text).await;
                    }
                    Some(Ok(Message::Ping(data))) => {
                        if sender.send(Message::Pong(data)).await.is_err() {
                            break;
                        }
                    }
                    Some(Ok(Message::Close(_))) => {
                        info!(client_id = %client_id, "Client closed connection");
                        break;
                    }
                    Some(Err(e)) => {
                        warn!(client_id = %client_id, error = %e, "WebSocket error");
                        break;
                    }
                    None => break,
                    _ => {}
                }
            }
        }
    }

    hub.unregister(client_id).await;
}

async fn handle_command(hub: &SensorHub, client_id: uuid::Uuid, text: &str) {
    match serde_json::from_str::<ClientCommand>(text) {
        Ok(ClientCommand::JoinSensor { sensor_id }) => {
            hub.subscribe(client_id, &sensor_id).await;
        }
        Ok(ClientCommand::LeaveSensor { sensor_id }) => {
            hub.unsubscribe(client_id, &sensor_id).await;
        }
        Err(e) => {
            debug!(client_id = %client_id, error = %e, "Ignoring unrecognized client message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_join_sensor_command() {
        let command: ClientCommand =
            serde_json::from_str(r#"{"action":"joinSensor","sensorId":"sensor-3"}"#).unwrap();
        assert!(matches!(
            command,
            ClientCommand::JoinSensor { sensor_id } if sensor_id == "sensor-3"
        ));
    }

    #[test]
    fn parses_leave_sensor_command() {
        let command: ClientCommand =
            serde_json::from_str(r#"{"action":"leaveSensor","sensorId":"sensor-3"}"#).unwrap();
        assert!(matches!(command, ClientCommand::LeaveSensor { .. }));
    }

    #[test]
    fn rejects_unknown_action() {
        assert!(serde_json::from_str::<ClientCommand>(r#"{"action":"subscribe"}"#).is_err());
    }
}
