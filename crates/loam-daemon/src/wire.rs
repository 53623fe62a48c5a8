//! Length-delimited bincode framing.

use std::io;

use bincode::Options;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

/// Canonical payload encoding: fixint, little-endian.
fn bincode_options() -> impl bincode::Options {
    bincode::DefaultOptions::new()
        .with_fixint_encoding()
        .with_little_endian()
}

pub fn encode<T: Serialize>(value: &T) -> io::Result<Vec<u8>> {
    bincode_options()
        .serialize(value)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))
}

pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> io::Result<T> {
    bincode_options()
        .deserialize(bytes)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}

pub fn framed_read<R: AsyncRead>(reader: R) -> FramedRead<R, LengthDelimitedCodec> {
    FramedRead::new(reader, LengthDelimitedCodec::new())
}

pub fn framed_write<W: AsyncWrite>(writer: W) -> FramedWrite<W, LengthDelimitedCodec> {
    FramedWrite::new(writer, LengthDelimitedCodec::new())
}
