//! High-level RPC wrappers: one request/response pair each, in domain
//! types.

use prost::Message as _;
use uuid::Uuid;

use dittoweb_proto::conversations::{
    ConversationFolder, ListConversationsRequest, ListConversationsResponse, MarkAsReadRequest,
    SendMessageRequest, SendMessageResponse,
};
use dittoweb_proto::rpc::ActionType;

use crate::client::Client;
use crate::error::{ClientError, RequestError};
use crate::rpc::SendOptions;

impl Client {
    /// List conversations in a folder.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the RPC or its response decoding
    /// fails.
    pub async fn list_conversations(
        &self,
        count: i64,
        folder: ConversationFolder,
    ) -> Result<ListConversationsResponse, ClientError> {
        let payload = ListConversationsRequest {
            count,
            folder: folder as i32,
        }
        .encode_to_vec();
        let response = self
            .session()
            .send(
                ActionType::ListConversations,
                Some(payload),
                SendOptions::default(),
            )
            .await?;
        Ok(response.decode().map_err(RequestError::from)?)
    }

    /// Send a text message into a conversation.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the RPC or its response decoding
    /// fails.
    pub async fn send_text_message(
        &self,
        conversation_id: &str,
        text: &str,
    ) -> Result<SendMessageResponse, ClientError> {
        let payload = SendMessageRequest {
            conversation_id: conversation_id.to_owned(),
            tmp_id: format!("tmp_{}", Uuid::new_v4()),
            text: text.to_owned(),
        }
        .encode_to_vec();
        let response = self
            .session()
            .send(ActionType::SendMessage, Some(payload), SendOptions::default())
            .await?;
        Ok(response.decode().map_err(RequestError::from)?)
    }

    /// Mark a conversation as read on the phone.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the RPC fails.
    pub async fn mark_read(&self, conversation_id: &str) -> Result<(), ClientError> {
        let payload = MarkAsReadRequest {
            conversation_id: conversation_id.to_owned(),
        }
        .encode_to_vec();
        self.session()
            .send(ActionType::MessageRead, Some(payload), SendOptions::default())
            .await?;
        Ok(())
    }

    /// Ask the phone to push any updates it is holding. Fire-and-forget;
    /// results arrive as events on the stream.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the POST fails.
    pub async fn request_updates(&self) -> Result<(), ClientError> {
        self.session()
            .send_no_wait(ActionType::GetUpdates, None, SendOptions::default())
            .await?;
        Ok(())
    }
}
