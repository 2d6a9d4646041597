use serde::{Deserialize, Serialize};

use crate::message::Reply;

/// Frames pushed from the server over the realtime channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum ServerEvent {
    /// A completed or short-circuited exchange produced an assistant turn
    #[serde(rename = "newMessage")]
    NewMessage(Reply),

    /// Acknowledges a `joinThread` request
    #[serde(rename = "joined")]
    Joined {
        #[serde(rename = "threadId")]
        thread_id: String,
    },

    /// The client sent a frame the server could not understand
    #[serde(rename = "error")]
    Error { message: String },
}

impl ServerEvent {
    pub fn new_message(reply: Reply) -> Self {
        Self::NewMessage(reply)
    }
}

/// Frames accepted from clients over the realtime channel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum ClientEvent {
    #[serde(rename = "joinThread")]
    JoinThread {
        #[serde(rename = "threadId")]
        thread_id: String,
    },
}
