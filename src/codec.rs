use bytes::{Buf, BytesMut};
use std::convert::TryInto;
use std::env;
use std::io::Cursor;
use tokio_util::codec::{Decoder, Encoder};

use crate::frame::{self, Frame};
use crate::Error;

/// Frames the client side of the wire: encodes request frames going out and
/// decodes exactly one reply frame at a time coming in.
pub struct FrameCodec;

impl FrameCodec {
    fn max_frame_size() -> usize {
        env::var("MAX_FRAME_SIZE")
            .map(|s| s.parse().expect("MAX_FRAME_SIZE must be a number"))
            .unwrap_or(512 * 1024 * 1024)
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // Refuse to buffer unbounded garbage from a misbehaving server.
        if src.len() > FrameCodec::max_frame_size() {
            return Err(Error::Connection("frame size exceeds limit".to_string()));
        }

        let mut cursor = Cursor::new(&src[..]);
        let frame = match Frame::parse(&mut cursor) {
            Ok(frame) => frame,
            Err(frame::Error::Incomplete) => return Ok(None), // Not enough data to parse a frame.
            // Anything else means the reply boundary is lost: fatal framing
            // corruption, not a retryable condition.
            Err(err) => return Err(Error::Connection(err.to_string())),
        };

        let position: usize = cursor
            .position()
            .try_into()
            .expect("Cursor position is too large");

        // Remove the parsed frame from the buffer.
        src.advance(position);

        Ok(Some(frame))
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, frame: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let bytes = frame.serialize();
        dst.extend_from_slice(&bytes);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    #[test]
    fn decode_waits_for_a_complete_frame() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"$5\r\nhel"[..]);

        let decoded = codec.decode(&mut buffer).unwrap();
        assert_eq!(decoded, None);

        buffer.extend_from_slice(b"lo\r\n");
        let decoded = codec.decode(&mut buffer).unwrap();
        assert_eq!(decoded, Some(Frame::Bulk(Bytes::from("hello"))));
        assert!(buffer.is_empty());
    }

    #[test]
    fn decode_consumes_exactly_one_frame() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"+OK\r\n:3\r\n"[..]);

        let first = codec.decode(&mut buffer).unwrap();
        assert_eq!(first, Some(Frame::Simple("OK".to_string())));

        let second = codec.decode(&mut buffer).unwrap();
        assert_eq!(second, Some(Frame::Integer(3)));

        assert_eq!(codec.decode(&mut buffer).unwrap(), None);
    }

    #[test]
    fn decode_rejects_an_unknown_control_byte() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::from(&b"?what\r\n"[..]);

        let decoded = codec.decode(&mut buffer);
        assert!(matches!(decoded, Err(Error::Connection(_))));
    }

    #[test]
    fn encode_writes_the_serialized_frame() {
        let mut codec = FrameCodec;
        let mut buffer = BytesMut::new();

        let frame = crate::frame::command("GET", &[Bytes::from("key")]);
        codec.encode(frame, &mut buffer).unwrap();

        assert_eq!(&buffer[..], b"*2\r\n$3\r\nGET\r\n$3\r\nkey\r\n");
    }
}
