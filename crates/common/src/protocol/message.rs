use time::OffsetDateTime;

use crate::crypto::{hmac, CryptoError};

use super::events::{ChatEvent, Direction};
use super::node::{AuthMode, Node, DEFAULT_USER};
use super::session::EstablishedKeys;
use super::wire::{MessagePayload, MessageTag};
use super::ProtocolError;

/// A message that was sent or received successfully
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub plaintext: String,
    pub ciphertext: Vec<u8>,
    pub tag: MessageTag,
    pub sender: String,
    pub timestamp: OffsetDateTime,
}

impl Node {
    /// Encrypt, authenticate and deliver `plaintext` to the peer.
    ///
    /// A `sent` event is emitted before delivery is attempted; a delivery failure then
    /// emits an `error` event and is returned as [`ProtocolError::Transport`]. There is no
    /// retry.
    pub async fn send_message(&self, plaintext: &str) -> Result<Message, ProtocolError> {
        let keys = self.session.established()?;
        let crypto_mode = self.config.crypto_mode;

        let ciphertext = crypto_mode.encrypt(&keys.peer, plaintext.as_bytes())?;
        let tag = self.authenticate(plaintext.as_bytes(), &keys)?;

        let message = Message {
            plaintext: plaintext.to_string(),
            ciphertext,
            tag,
            sender: self.config.user.clone(),
            timestamp: OffsetDateTime::now_utc(),
        };
        self.events.emit(ChatEvent::message(
            plaintext,
            Direction::Sent,
            &message.sender,
            message.timestamp,
        ));

        let payload = MessagePayload::new(&message.ciphertext, &message.tag, &message.sender);
        tracing::debug!(
            bytes = message.ciphertext.len(),
            tag = message.tag.kind(),
            "delivering message"
        );
        if let Err(err) = self.transport.deliver(payload).await {
            tracing::warn!(error = %err, "failed to deliver message");
            self.events.emit(ChatEvent::error(plaintext, err.to_string()));
            return Err(err.into());
        }
        Ok(message)
    }

    fn authenticate(
        &self,
        plaintext: &[u8],
        keys: &EstablishedKeys,
    ) -> Result<MessageTag, ProtocolError> {
        match self.config.auth_mode {
            AuthMode::Signature => {
                let signature = self
                    .config
                    .crypto_mode
                    .sign(self.session.key_pair(), plaintext)?;
                Ok(MessageTag::Signature(signature))
            }
            AuthMode::SharedSecret => {
                let secret = keys
                    .shared_secret
                    .as_ref()
                    .ok_or_else(|| ProtocolError::state("no shared secret agreed"))?;
                Ok(MessageTag::Mac(hmac::create_tag(plaintext, secret.bytes()).to_vec()))
            }
        }
    }

    /// Decrypt an incoming message and check its tag.
    ///
    /// Decryption happens first and the tag is verified over the recovered plaintext. Any
    /// failure returns an error with no event emitted and nothing of the plaintext exposed.
    pub fn receive_message(
        &self,
        ciphertext: &[u8],
        tag: &MessageTag,
        sender: &str,
    ) -> Result<Message, ProtocolError> {
        let keys = self.session.established()?;

        let expected = match self.config.auth_mode {
            AuthMode::Signature => "signature",
            AuthMode::SharedSecret => "mac",
        };
        if tag.kind() != expected {
            return Err(ProtocolError::validation(format!(
                "expected a {} tag, got {}",
                expected,
                tag.kind()
            )));
        }

        let crypto_mode = self.config.crypto_mode;
        let plaintext = crypto_mode.decrypt(self.session.key_pair(), ciphertext)?;

        match tag {
            MessageTag::Signature(signature) => {
                crypto_mode.verify(&keys.peer, &plaintext, signature)?;
            }
            MessageTag::Mac(mac) => {
                let secret = keys
                    .shared_secret
                    .as_ref()
                    .ok_or_else(|| ProtocolError::state("no shared secret agreed"))?;
                if !hmac::verify_tag(&plaintext, mac, secret.bytes()) {
                    return Err(CryptoError::InvalidMac.into());
                }
            }
        }

        let plaintext = String::from_utf8(plaintext)
            .map_err(|_| ProtocolError::validation("message is not valid UTF-8"))?;

        let message = Message {
            plaintext,
            ciphertext: ciphertext.to_vec(),
            tag: tag.clone(),
            sender: sender.to_string(),
            timestamp: OffsetDateTime::now_utc(),
        };
        tracing::debug!(sender = %message.sender, "received message");
        self.events.emit(ChatEvent::message(
            &message.plaintext,
            Direction::Received,
            &message.sender,
            message.timestamp,
        ));
        Ok(message)
    }

    /// [`Node::receive_message`] for a JSON body as it arrives over the wire.
    pub fn receive_payload(&self, payload: &MessagePayload) -> Result<Message, ProtocolError> {
        let ciphertext = payload.ciphertext_bytes()?;
        let tag = payload.tag()?;
        let sender = payload
            .sender
            .as_deref()
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_USER);
        self.receive_message(&ciphertext, &tag, sender)
    }
}
