//! JSON bodies exchanged between peers.
//!
//! Field names on the message and error bodies are fixed by peers already deployed, hence
//! the renames.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::{Deserialize, Serialize};

use super::ProtocolError;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakePayload {
    /// `"<e>:<n>"` or PEM
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_key: Option<String>,
    /// Base64 shared secret, only in shared-secret mode
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_key: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessagePayload {
    #[serde(rename = "mensagem", default, skip_serializing_if = "Option::is_none")]
    pub ciphertext: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mac: Option<String>,
    #[serde(rename = "assinatura", default, skip_serializing_if = "Option::is_none")]
    pub signature: Option<String>,
    #[serde(rename = "usuario", default, skip_serializing_if = "Option::is_none")]
    pub sender: Option<String>,
}

/// Authentication tag attached to a message
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageTag {
    Mac(Vec<u8>),
    Signature(Vec<u8>),
}

impl MessageTag {
    pub fn kind(&self) -> &'static str {
        match self {
            MessageTag::Mac(_) => "mac",
            MessageTag::Signature(_) => "signature",
        }
    }

    pub fn bytes(&self) -> &[u8] {
        match self {
            MessageTag::Mac(bytes) | MessageTag::Signature(bytes) => bytes,
        }
    }
}

impl MessagePayload {
    pub fn new(ciphertext: &[u8], tag: &MessageTag, sender: &str) -> Self {
        let encoded_tag = Some(BASE64.encode(tag.bytes()));
        let (mac, signature) = match tag {
            MessageTag::Mac(_) => (encoded_tag, None),
            MessageTag::Signature(_) => (None, encoded_tag),
        };
        Self {
            ciphertext: Some(BASE64.encode(ciphertext)),
            mac,
            signature,
            sender: Some(sender.to_string()),
        }
    }

    /// Decoded ciphertext bytes.
    pub fn ciphertext_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        let encoded = self
            .ciphertext
            .as_deref()
            .ok_or_else(|| ProtocolError::validation("missing field: mensagem"))?;
        BASE64
            .decode(encoded)
            .map_err(|e| ProtocolError::validation(format!("mensagem is not valid base64: {}", e)))
    }

    /// Decoded tag. Exactly one of `mac` and `assinatura` must be present.
    pub fn tag(&self) -> Result<MessageTag, ProtocolError> {
        let decode = |field: &str, value: &str| {
            BASE64.decode(value).map_err(|e| {
                ProtocolError::validation(format!("{} is not valid base64: {}", field, e))
            })
        };
        match (&self.mac, &self.signature) {
            (Some(mac), None) => Ok(MessageTag::Mac(decode("mac", mac)?)),
            (None, Some(signature)) => {
                Ok(MessageTag::Signature(decode("assinatura", signature)?))
            }
            (Some(_), Some(_)) => Err(ProtocolError::validation(
                "message carries both mac and assinatura",
            )),
            (None, None) => Err(ProtocolError::validation(
                "missing field: mac or assinatura",
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusResponse {
    pub status: String,
}

impl StatusResponse {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub erro: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            erro: message.into(),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_message_payload_field_names() {
        let payload = MessagePayload::new(b"ct", &MessageTag::Signature(vec![1, 2]), "alice");
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["mensagem"], "Y3Q=");
        assert_eq!(json["assinatura"], "AQI=");
        assert_eq!(json["usuario"], "alice");
        assert!(json.get("mac").is_none());
    }

    #[test]
    fn test_tag_requires_exactly_one_kind() {
        let mut payload = MessagePayload::new(b"ct", &MessageTag::Mac(vec![9]), "bob");
        assert_eq!(payload.tag().unwrap(), MessageTag::Mac(vec![9]));

        payload.signature = Some("AA==".into());
        assert!(matches!(payload.tag(), Err(ProtocolError::Validation(_))));

        payload.mac = None;
        payload.signature = None;
        assert!(matches!(payload.tag(), Err(ProtocolError::Validation(_))));
    }

    #[test]
    fn test_missing_and_invalid_ciphertext() {
        let payload: MessagePayload = serde_json::from_str(r#"{"mac": "AA=="}"#).unwrap();
        assert!(payload.ciphertext_bytes().is_err());

        let payload: MessagePayload =
            serde_json::from_str(r#"{"mensagem": "%%%", "mac": "AA=="}"#).unwrap();
        assert!(payload.ciphertext_bytes().is_err());
    }

    #[test]
    fn test_handshake_payload_omits_absent_fields() {
        let payload = HandshakePayload {
            public_key: Some("65537:77".into()),
            shared_key: None,
        };
        assert_eq!(
            serde_json::to_string(&payload).unwrap(),
            r#"{"public_key":"65537:77"}"#
        );
    }
}
