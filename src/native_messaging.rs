use serde::Serialize;
use serde_json::Value;
use std::io::{self, Read, Write};

use crate::error::{KiriError, Result};
use crate::relay::receiver::{BackgroundRelay, PlatformNotifications};

/// Chrome refuses to deliver anything larger to a native host.
pub const MAX_INCOMING_BYTES: usize = 64 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub enum Frame {
    Message(Value),
    /// A complete frame whose payload was not JSON.
    Malformed,
}

/// Read a message using the Chrome native messaging protocol.
/// Messages are prefixed with a 4-byte length in native byte order.
///
/// Returns `Ok(None)` on a clean EOF. EOF inside the length prefix is an error.
pub fn read_message<R: Read>(reader: &mut R) -> Result<Option<Frame>> {
    let mut length_bytes = [0u8; 4];

    // Read the 4-byte message length
    let mut filled = 0;
    while filled < length_bytes.len() {
        match reader.read(&mut length_bytes[filled..]) {
            Ok(0) if filled == 0 => return Ok(None), // No more messages
            Ok(0) => {
                return Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("length prefix cut off after {filled} bytes"),
                )
                .into());
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }

    let length = u32::from_ne_bytes(length_bytes) as usize;
    if length > MAX_INCOMING_BYTES {
        return Err(KiriError::MessageTooLarge(length));
    }

    // Read the message content
    let mut buffer = vec![0u8; length];
    reader.read_exact(&mut buffer)?;

    match serde_json::from_slice(&buffer) {
        Ok(message) => Ok(Some(Frame::Message(message))),
        Err(e) => {
            tracing::debug!("Dropping malformed native message: {}", e);
            Ok(Some(Frame::Malformed))
        }
    }
}

/// Write a response using the Chrome native messaging protocol.
pub fn write_response<W: Write, T: Serialize>(writer: &mut W, response: &T) -> Result<()> {
    let json = serde_json::to_string(response)?;

    let length = json.len() as u32;
    let length_bytes = length.to_ne_bytes();

    // Write length prefix
    writer.write_all(&length_bytes)?;

    // Write message content
    writer.write_all(json.as_bytes())?;
    writer.flush()?;

    Ok(())
}

/// Serve the background relay over a native messaging pipe until EOF.
pub fn serve<R, W, P>(relay: &BackgroundRelay<P>, reader: &mut R, writer: &mut W) -> Result<()>
where
    R: Read,
    W: Write,
    P: PlatformNotifications,
{
    while let Some(frame) = read_message(reader)? {
        let Frame::Message(message) = frame else {
            continue;
        };
        if let Some(ack) = relay.handle_value(&message) {
            write_response(writer, &ack)?;
        }
    }
    tracing::info!("native messaging pipe closed");
    Ok(())
}
