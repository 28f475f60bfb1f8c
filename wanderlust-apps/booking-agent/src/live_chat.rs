//!  Wanderlust Booking Agent
//!
//!  Copyright (C) 2026  Mamy Ratsimbazafy
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! Websocket relay for live chat between guests and support, keyed by room id

use axum::extract::State;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::response::Response;
use serde::{Deserialize, Serialize};
use wanderlust_chat_rooms::{ChatRooms, MemberId};

use crate::api_state::SharedState;

/// Client and server frames. Only `message` frames are relayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
#[serde(tag = "event", rename_all = "lowercase")]
pub enum ChatFrame {
    Join { room: String },
    Leave { room: String },
    Message { room: String, text: String },
}

pub async fn live_chat_ws(ws: WebSocketUpgrade, State(state): State<SharedState>) -> Response {
    ws.on_upgrade(move |socket| relay(socket, state))
}

async fn relay(mut socket: WebSocket, state: SharedState) {
    let rooms = state.chat_rooms.clone();
    let (member, mut outbound) = rooms.connect().await;

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            frame = outbound.recv() => {
                let Some(frame) = frame else { break };
                let text = match serde_json::to_string(&frame) {
                    Ok(text) => text,
                    Err(e) => {
                        tracing::warn!("Dropping unserializable frame: {}", e);
                        continue;
                    }
                };
                if socket.send(Message::Text(text)).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => match incoming {
                Some(Ok(Message::Text(text))) => handle_frame(&rooms, member, &text).await,
                Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                Some(Ok(_)) => {}
            },
        }
    }

    rooms.disconnect(member).await;
}

/// Apply one client frame on behalf of `member`
pub async fn handle_frame(rooms: &ChatRooms<ChatFrame>, member: MemberId, text: &str) {
    let result = match serde_json::from_str::<ChatFrame>(text) {
        Ok(ChatFrame::Join { room }) => rooms.join(member, &room).await.map(|_| ()),
        Ok(ChatFrame::Leave { room }) => rooms.leave(member, &room).await,
        Ok(ChatFrame::Message { room, text }) => {
            let frame = ChatFrame::Message {
                room: room.clone(),
                text,
            };
            rooms.publish(member, &room, frame).await.map(|_| ())
        }
        Err(e) => {
            tracing::debug!("{} sent an unreadable frame: {}", member, e);
            return;
        }
    };
    if let Err(e) = result {
        tracing::debug!("{}: {}", member, e);
    }
}
