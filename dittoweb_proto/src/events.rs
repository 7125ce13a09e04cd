//! `events` package: unsolicited update envelopes pushed by the phone.

use dittoweb_pblite::{DecodeError, Decoder, Encoder, Pblite};

use crate::conversations::{Conversation, Message};

/// The update envelope a decrypted GET_UPDATES payload decodes to.
///
/// Exactly one variant is populated per envelope.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UpdateEvents {
    #[prost(message, optional, tag = "2")]
    pub conversation_event: Option<ConversationEvent>,
    #[prost(message, optional, tag = "3")]
    pub message_event: Option<MessageEvent>,
    #[prost(message, optional, tag = "4")]
    pub typing_event: Option<TypingEvent>,
    #[prost(message, optional, tag = "5")]
    pub settings_event: Option<SettingsEvent>,
    #[prost(message, optional, tag = "6")]
    pub user_alert_event: Option<UserAlertEvent>,
    #[prost(message, optional, tag = "7")]
    pub browser_presence_check_event: Option<BrowserPresenceCheckEvent>,
    #[prost(message, optional, tag = "9")]
    pub account_change: Option<AccountChangeEvent>,
}

impl Pblite for UpdateEvents {
    const NAME: &'static str = "events.UpdateEvents";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(2, self.conversation_event.as_ref());
        enc.message_opt(3, self.message_event.as_ref());
        enc.message_opt(4, self.typing_event.as_ref());
        enc.message_opt(5, self.settings_event.as_ref());
        enc.message_opt(6, self.user_alert_event.as_ref());
        enc.message_opt(7, self.browser_presence_check_event.as_ref());
        enc.message_opt(9, self.account_change.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            conversation_event: dec.message(2)?,
            message_event: dec.message(3)?,
            typing_event: dec.message(4)?,
            settings_event: dec.message(5)?,
            user_alert_event: dec.message(6)?,
            browser_presence_check_event: dec.message(7)?,
            account_change: dec.message(9)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct ConversationEvent {
    #[prost(message, repeated, tag = "1")]
    pub data: Vec<Conversation>,
}

impl Pblite for ConversationEvent {
    const NAME: &'static str = "events.ConversationEvent";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.repeated_message(1, &self.data);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            data: dec.repeated_message(1)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct MessageEvent {
    #[prost(message, repeated, tag = "1")]
    pub data: Vec<Message>,
}

impl Pblite for MessageEvent {
    const NAME: &'static str = "events.MessageEvent";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.repeated_message(1, &self.data);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            data: dec.repeated_message(1)?,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum TypingKind {
    StoppedTyping = 0,
    StartedTyping = 1,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypingEvent {
    #[prost(message, optional, tag = "1")]
    pub data: Option<TypingData>,
}

impl Pblite for TypingEvent {
    const NAME: &'static str = "events.TypingEvent";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            data: dec.message(1)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct TypingData {
    #[prost(string, tag = "1")]
    pub conversation_id: String,
    #[prost(message, optional, tag = "2")]
    pub user: Option<User>,
    #[prost(enumeration = "TypingKind", tag = "3")]
    pub kind: i32,
}

impl Pblite for TypingData {
    const NAME: &'static str = "events.TypingData";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.conversation_id);
        enc.message_opt(2, self.user.as_ref());
        enc.enumeration(3, self.kind);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            conversation_id: dec.string(1)?.unwrap_or_default(),
            user: dec.message(2)?,
            kind: dec.enumeration(3)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct User {
    #[prost(string, tag = "1")]
    pub participant_id: String,
    #[prost(string, tag = "2")]
    pub full_name: String,
}

impl Pblite for User {
    const NAME: &'static str = "events.User";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.participant_id);
        enc.string(2, &self.full_name);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            participant_id: dec.string(1)?.unwrap_or_default(),
            full_name: dec.string(2)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct SettingsEvent {
    #[prost(message, optional, tag = "1")]
    pub data: Option<Settings>,
}

impl Pblite for SettingsEvent {
    const NAME: &'static str = "events.SettingsEvent";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.message_opt(1, self.data.as_ref());
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            data: dec.message(1)?,
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct Settings {
    #[prost(bool, tag = "1")]
    pub rcs_enabled: bool,
    #[prost(bool, tag = "4")]
    pub notifications_enabled: bool,
}

impl Pblite for Settings {
    const NAME: &'static str = "events.Settings";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bool(1, self.rcs_enabled);
        enc.bool(4, self.notifications_enabled);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            rcs_enabled: dec.bool(1)?.unwrap_or_default(),
            notifications_enabled: dec.bool(4)?.unwrap_or_default(),
        })
    }
}

/// Phone-side condition reports.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum AlertType {
    AlertTypeUnknown = 0,
    BrowserInactive = 1,
    BrowserActive = 2,
    MobileDataConnection = 3,
    MobileWifiConnection = 4,
    MobileBatteryLow = 5,
    MobileBatteryRestored = 6,
    BrowserInactiveFromTimeout = 7,
    BrowserInactiveFromInactivity = 8,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct UserAlertEvent {
    #[prost(enumeration = "AlertType", tag = "1")]
    pub alert_type: i32,
}

impl Pblite for UserAlertEvent {
    const NAME: &'static str = "events.UserAlertEvent";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.enumeration(1, self.alert_type);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            alert_type: dec.enumeration(1)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct BrowserPresenceCheckEvent {}

impl Pblite for BrowserPresenceCheckEvent {
    const NAME: &'static str = "events.BrowserPresenceCheckEvent";

    fn encode_fields(&self, _enc: &mut Encoder) {}

    fn decode_fields(_dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {})
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct AccountChangeEvent {
    #[prost(string, tag = "1")]
    pub account: String,
    #[prost(bool, tag = "2")]
    pub enabled: bool,
}

impl Pblite for AccountChangeEvent {
    const NAME: &'static str = "events.AccountChangeEvent";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.string(1, &self.account);
        enc.bool(2, self.enabled);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            account: dec.string(1)?.unwrap_or_default(),
            enabled: dec.bool(2)?.unwrap_or_default(),
        })
    }
}
