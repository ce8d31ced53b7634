//! Line framing for method calls.
//!
//! One JSON document per line. Malformed documents surface as per-frame errors
//! so the stream keeps going; only oversized lines and IO failures end it.

use crate::utils::error::{HostError, Result};
use bytes::BytesMut;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::marker::PhantomData;
use tokio_util::codec::{Decoder, Encoder};
use tracing::trace;

pub const DEFAULT_MAX_MESSAGE_BYTES: usize = 10 * 1024 * 1024;

pub struct CallCodec<In, Out> {
    max_message_bytes: usize,
    // 已掃描過、確定沒有換行符的位元組數
    scanned: usize,
    _marker: PhantomData<fn(Out) -> In>,
}

impl<In, Out> CallCodec<In, Out> {
    #[must_use]
    pub fn new(max_message_bytes: usize) -> Self {
        Self {
            max_message_bytes,
            scanned: 0,
            _marker: PhantomData,
        }
    }
}

impl<In, Out> Default for CallCodec<In, Out> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGE_BYTES)
    }
}

impl<In: DeserializeOwned, Out> Decoder for CallCodec<In, Out> {
    type Item = Result<In>;
    type Error = HostError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        loop {
            let newline = src[self.scanned..].iter().position(|b| *b == b'\n');
            let Some(offset) = newline else {
                if src.len() > self.max_message_bytes {
                    return Err(HostError::transport(format!(
                        "Message exceeded size limit of {} bytes",
                        self.max_message_bytes
                    )));
                }
                self.scanned = src.len();
                return Ok(None);
            };

            let end = self.scanned + offset;
            self.scanned = 0;
            let line = src.split_to(end + 1);
            let mut body = &line[..end];
            if body.last() == Some(&b'\r') {
                body = &body[..body.len() - 1];
            }

            if body.len() > self.max_message_bytes {
                return Err(HostError::transport(format!(
                    "Message exceeded size limit of {} bytes",
                    self.max_message_bytes
                )));
            }
            if body.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            trace!("Decoding {} byte frame", body.len());
            return Ok(Some(serde_json::from_slice(body).map_err(HostError::from)));
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>> {
        if let Some(frame) = self.decode(src)? {
            return Ok(Some(frame));
        }
        if src.iter().all(u8::is_ascii_whitespace) {
            src.clear();
            self.scanned = 0;
            return Ok(None);
        }
        // 最後一行沒有換行符
        src.extend_from_slice(b"\n");
        self.decode(src)
    }
}

impl<In, Out: Serialize> Encoder<Out> for CallCodec<In, Out> {
    type Error = HostError;

    fn encode(&mut self, item: Out, dst: &mut BytesMut) -> Result<()> {
        let body = serde_json::to_vec(&item)?;
        dst.reserve(body.len() + 1);
        dst.extend_from_slice(&body);
        dst.extend_from_slice(b"\n");
        Ok(())
    }
}
