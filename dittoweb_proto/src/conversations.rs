//! `conversations` package: domain types surfaced as events and used by
//! the high-level RPC wrappers.

use dittoweb_pblite::{DecodeError, Decoder, Encoder, Pblite};

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Conversation {
    #[prost(string, tag = "1")]
    pub conversation_id: String,
    #[prost(string, tag = "2")]
    pub name: String,
    #[prost(message, optional, tag = "3")]
    pub latest_message: Option<LatestMessage>,
    #[prost(bool, tag = "4")]
    pub unread: bool,
    #[prost(bool, tag = "10")]
    pub is_group_chat: bool,
}

impl Pblite for Conversation {
    const NAME: &'static str = "conversations.Conversation";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.conversation_id);
        enc.string(2, &self.name);
        enc.message_opt(3, self.latest_message.as_ref());
        enc.bool(4, self.unread);
        enc.bool(10, self.is_group_chat);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            conversation_id: dec.string(1)?.unwrap_or_default(),
            name: dec.string(2)?.unwrap_or_default(),
            latest_message: dec.message(3)?,
            unread: dec.bool(4)?.unwrap_or_default(),
            is_group_chat: dec.bool(10)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct LatestMessage {
    #[prost(string, tag = "1")]
    pub display_content: String,
}

impl Pblite for LatestMessage {
    const NAME: &'static str = "conversations.LatestMessage";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.display_content);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            display_content: dec.string(1)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Message {
    #[prost(string, tag = "1")]
    pub message_id: String,
    #[prost(string, tag = "2")]
    pub tmp_id: String,
    #[prost(string, tag = "3")]
    pub conversation_id: String,
    #[prost(string, tag = "4")]
    pub participant_id: String,
    #[prost(int64, tag = "5")]
    pub timestamp_micros: i64,
    #[prost(string, tag = "6")]
    pub text: String,
}

impl Pblite for Message {
    const NAME: &'static str = "conversations.Message";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.message_id);
        enc.string(2, &self.tmp_id);
        enc.string(3, &self.conversation_id);
        enc.string(4, &self.participant_id);
        enc.int64(5, self.timestamp_micros);
        enc.string(6, &self.text);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            message_id: dec.string(1)?.unwrap_or_default(),
            tmp_id: dec.string(2)?.unwrap_or_default(),
            conversation_id: dec.string(3)?.unwrap_or_default(),
            participant_id: dec.string(4)?.unwrap_or_default(),
            timestamp_micros: dec.int64(5)?.unwrap_or_default(),
            text: dec.string(6)?.unwrap_or_default(),
        })
    }
}

/// Folder filter for conversation listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ConversationFolder {
    UnknownFolder = 0,
    Inbox = 1,
    Archived = 2,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListConversationsRequest {
    #[prost(int64, tag = "2")]
    pub count: i64,
    #[prost(enumeration = "ConversationFolder", tag = "4")]
    pub folder: i32,
}

impl Pblite for ListConversationsRequest {
    const NAME: &'static str = "conversations.ListConversationsRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.int64(2, self.count);
        enc.enumeration(4, self.folder);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            count: dec.int64(2)?.unwrap_or_default(),
            folder: dec.enumeration(4)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ListConversationsResponse {
    #[prost(message, repeated, tag = "2")]
    pub conversations: Vec<Conversation>,
}

impl Pblite for ListConversationsResponse {
    const NAME: &'static str = "conversations.ListConversationsResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.repeated_message(2, &self.conversations);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            conversations: dec.repeated_message(2)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SendMessageRequest {
    #[prost(string, tag = "1")]
    pub conversation_id: String,
    #[prost(string, tag = "2")]
    pub tmp_id: String,
    #[prost(string, tag = "3")]
    pub text: String,
}

impl Pblite for SendMessageRequest {
    const NAME: &'static str = "conversations.SendMessageRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.conversation_id);
        enc.string(2, &self.tmp_id);
        enc.string(3, &self.text);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            conversation_id: dec.string(1)?.unwrap_or_default(),
            tmp_id: dec.string(2)?.unwrap_or_default(),
            text: dec.string(3)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SendMessageResponse {
    #[prost(string, tag = "1")]
    pub message_id: String,
}

impl Pblite for SendMessageResponse {
    const NAME: &'static str = "conversations.SendMessageResponse";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.message_id);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            message_id: dec.string(1)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MarkAsReadRequest {
    #[prost(string, tag = "1")]
    pub conversation_id: String,
}

impl Pblite for MarkAsReadRequest {
    const NAME: &'static str = "conversations.MarkAsReadRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.conversation_id);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            conversation_id: dec.string(1)?.unwrap_or_default(),
        })
    }
}
