//! `client` package: requests issued by the client-side health and sync
//! machinery.

use dittoweb_pblite::{DecodeError, Decoder, Encoder, Pblite};

/// Ditto pinger probe.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyDittoActivityRequest {
    #[prost(bool, tag = "2")]
    pub success: bool,
}

impl Pblite for NotifyDittoActivityRequest {
    const NAME: &'static str = "client.NotifyDittoActivityRequest";

    fn encode_fields(&self, enc: &mut Encoder) {
        enc.bool(2, self.success);
    }

    fn decode_fields(dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            success: dec.bool(2)?.unwrap_or_default(),
        })
    }
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct NotifyDittoActivityResponse {}

impl Pblite for NotifyDittoActivityResponse {
    const NAME: &'static str = "client.NotifyDittoActivityResponse";

    fn encode_fields(&self, _enc: &mut Encoder) {}

    fn decode_fields(_dec: &Decoder<'_>) -> Result<Self, DecodeError> {
        Ok(Self {})
    }
}
