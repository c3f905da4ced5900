//! Request and response shapes built from the codec primitives.
//!
//! A request is a varint part count followed by that many strings; the first
//! part names the command. A response is a varint success flag (`1` or `0`)
//! followed by one string.

use std::io::Read;

use crate::codec::{self, CodecError};

/// Upper bound on the number of parts in a single request.
pub const MAX_MESSAGE_PARTS: usize = 1024;

/// One decoded request: a command name followed by positional arguments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Message {
    parts: Vec<String>,
}

impl Message {
    /// Builds a message from its parts.
    #[must_use]
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            parts: parts.into_iter().map(Into::into).collect(),
        }
    }

    /// Command name, or `None` for an empty message.
    #[must_use]
    pub fn command(&self) -> Option<&str> {
        self.parts.first().map(String::as_str)
    }

    /// Positional arguments after the command name.
    #[must_use]
    pub fn arguments(&self) -> &[String] {
        self.parts.get(1..).unwrap_or_default()
    }

    /// All parts including the command name.
    #[must_use]
    pub const fn parts(&self) -> &[String] {
        self.parts.as_slice()
    }

    /// Returns `true` when the message carries no parts at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Reads one message from `reader`.
    ///
    /// A zero part count is a valid, empty message; rejecting it is left to
    /// dispatch.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let count = codec::wire_count(codec::read_varint(reader)?);
        if count > MAX_MESSAGE_PARTS {
            return Err(CodecError::TooManyParts {
                count,
                max: MAX_MESSAGE_PARTS,
            });
        }
        let mut parts = Vec::with_capacity(count.min(16));
        for _ in 0..count {
            parts.push(codec::read_string(reader)?);
        }
        Ok(Self { parts })
    }

    /// Encodes the message into a single buffer.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let count = u32::try_from(self.parts.len())
            .ok()
            .filter(|_| self.parts.len() <= MAX_MESSAGE_PARTS)
            .ok_or(CodecError::TooManyParts {
                count: self.parts.len(),
                max: MAX_MESSAGE_PARTS,
            })?;
        let mut buffer = Vec::new();
        codec::encode_varint(count, &mut buffer);
        for part in &self.parts {
            codec::encode_string(part, &mut buffer)?;
        }
        Ok(buffer)
    }
}

/// Outcome of one request as delivered to the peer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    success: bool,
    text: String,
}

impl Response {
    /// Successful response carrying `text`.
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            success: true,
            text: text.into(),
        }
    }

    /// Failed response carrying a human-readable reason.
    #[must_use]
    pub fn failure(text: impl Into<String>) -> Self {
        Self {
            success: false,
            text: text.into(),
        }
    }

    /// Whether the command succeeded.
    #[must_use]
    pub const fn is_success(&self) -> bool {
        self.success
    }

    /// Reply text.
    #[must_use]
    pub const fn text(&self) -> &str {
        self.text.as_str()
    }

    /// Splits the response into its flag and text.
    #[must_use]
    pub fn into_parts(self) -> (bool, String) {
        (self.success, self.text)
    }

    /// Encodes the response into a single buffer.
    pub fn encode(&self) -> Result<Vec<u8>, CodecError> {
        let mut buffer = Vec::with_capacity(self.text.len() + 6);
        codec::encode_varint(u32::from(self.success), &mut buffer);
        codec::encode_string(&self.text, &mut buffer)?;
        Ok(buffer)
    }

    /// Reads one response from `reader`. Any non-zero flag means success.
    pub fn read_from<R: Read + ?Sized>(reader: &mut R) -> Result<Self, CodecError> {
        let success = codec::read_varint(reader)? != 0;
        let text = codec::read_string(reader)?;
        Ok(Self { success, text })
    }
}

impl<T, E> From<Result<T, E>> for Response
where
    T: Into<String>,
    E: ToString,
{
    fn from(result: Result<T, E>) -> Self {
        match result {
            Ok(text) => Self::success(text),
            Err(error) => Self::failure(error.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use proptest::prelude::*;
    use rstest::rstest;

    use super::*;

    #[test]
    fn message_bytes_match_wire_layout() {
        let message = Message::new(["set-fov", "90"]);
        let bytes = message.encode().expect("encode");
        let expected: Vec<u8> = [&[0x02_u8, 0x07][..], &b"set-fov"[..], &[0x02][..], &b"90"[..]]
            .concat();
        assert_eq!(bytes, expected);
    }

    #[rstest]
    #[case(Message::new(["ping"]))]
    #[case(Message::new(["send", "chat", "hello there"]))]
    #[case(Message::new(["open-config", "Sodium Extra ✓", ""]))]
    fn message_round_trips(#[case] message: Message) {
        let bytes = message.encode().expect("encode");
        let decoded = Message::read_from(&mut Cursor::new(bytes)).expect("decode");
        assert_eq!(decoded, message);
    }

    #[test]
    fn zero_count_decodes_to_empty_message() {
        let decoded = Message::read_from(&mut Cursor::new(vec![0x00])).expect("decode");
        assert!(decoded.is_empty());
        assert_eq!(decoded.command(), None);
        assert!(decoded.arguments().is_empty());
    }

    #[test]
    fn arguments_exclude_command_name() {
        let message = Message::new(["send", "chat", "hi"]);
        assert_eq!(message.command(), Some("send"));
        assert_eq!(message.arguments(), ["chat", "hi"]);
    }

    #[test]
    fn rejects_excessive_part_count() {
        let mut bytes = Vec::new();
        let count = u32::try_from(MAX_MESSAGE_PARTS + 1).expect("limit fits in u32");
        codec::encode_varint(count, &mut bytes);
        let error = Message::read_from(&mut Cursor::new(bytes)).expect_err("too many parts");
        assert!(matches!(error, CodecError::TooManyParts { .. }));
    }

    #[test]
    fn encode_refuses_excessive_part_count() {
        let message = Message::new(vec![""; MAX_MESSAGE_PARTS + 1]);
        let error = message.encode().expect_err("too many parts");
        assert!(matches!(
            error,
            CodecError::TooManyParts { count, max: MAX_MESSAGE_PARTS } if count == MAX_MESSAGE_PARTS + 1
        ));
    }

    #[test]
    fn truncated_message_reports_peer_closed() {
        let mut bytes = Message::new(["get-mods", "extra"]).encode().expect("encode");
        bytes.truncate(bytes.len() - 2);
        let error = Message::read_from(&mut Cursor::new(bytes)).expect_err("truncated");
        assert!(error.is_peer_closed());
    }

    #[rstest]
    #[case(Response::success("pong"), &[0x01, 0x04, b'p', b'o', b'n', b'g'])]
    #[case(Response::failure(""), &[0x00, 0x00])]
    fn response_bytes_match_wire_layout(#[case] response: Response, #[case] expected: &[u8]) {
        assert_eq!(response.encode().expect("encode"), expected);
    }

    #[test]
    fn response_round_trips() {
        let response = Response::failure("invalid fov: abc");
        let bytes = response.encode().expect("encode");
        let decoded = Response::read_from(&mut Cursor::new(bytes)).expect("decode");
        assert_eq!(decoded, response);
    }

    #[test]
    fn converts_results_into_responses() {
        let ok: Result<&str, String> = Ok("sent");
        let err: Result<&str, String> = Err("failed to send".to_owned());
        assert_eq!(Response::from(ok), Response::success("sent"));
        assert_eq!(Response::from(err), Response::failure("failed to send"));
    }

    proptest! {
        #[test]
        fn arbitrary_messages_round_trip(
            parts in prop::collection::vec(any::<String>(), 1..32)
        ) {
            let message = Message::new(parts);
            let bytes = message.encode().expect("encode");
            let decoded = Message::read_from(&mut Cursor::new(bytes)).expect("decode");
            prop_assert_eq!(decoded, message);
        }
    }
}
