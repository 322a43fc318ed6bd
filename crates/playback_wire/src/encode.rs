//! Writing the match container.
//!
//! Frames are serialized with `rmp_serde::to_vec_named` so struct field
//! names survive and older readers can skip fields they do not know.

use playback_foundation::{Error, Result};
use playback_storage::DeltaRecord;

use crate::decode::GameMatch;
use crate::frame::{
    Frame, FrameRef, GameFooter, GameHeader, MAGIC, MatchFooter, MatchHeader, PREAMBLE_LEN,
    VERSION,
};

/// The magic and version that open every container.
#[must_use]
pub fn preamble() -> [u8; PREAMBLE_LEN] {
    let mut out = [0u8; PREAMBLE_LEN];
    out[..MAGIC.len()].copy_from_slice(&MAGIC);
    out[MAGIC.len()..].copy_from_slice(&VERSION.to_le_bytes());
    out
}

/// Encodes one frame, length prefix included.
///
/// A live producer writes [`preamble`] once and then one of these per frame.
///
/// # Errors
///
/// Returns an encode error if serialization fails or the body exceeds
/// `u32::MAX` bytes.
pub fn encode_frame(frame: &Frame) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    write_frame(&mut out, &FrameRef::from(frame))?;
    Ok(out)
}

/// Encodes a complete match: preamble, header, every delta, then the footer
/// if one is given.
///
/// # Errors
///
/// Returns an encode error if any frame fails to serialize.
pub fn encode_match(
    header: &MatchHeader,
    deltas: &[DeltaRecord],
    footer: Option<&MatchFooter>,
) -> Result<Vec<u8>> {
    let mut out = preamble().to_vec();
    write_frame(&mut out, &FrameRef::Header(header))?;
    for record in deltas {
        write_frame(&mut out, &FrameRef::Delta(record))?;
    }
    if let Some(footer) = footer {
        write_frame(&mut out, &FrameRef::Footer(footer))?;
    }
    Ok(out)
}

/// Encodes a complete game: preamble, game header, each match opened by a
/// match start frame, then the game footer if one is given.
///
/// # Errors
///
/// Returns an encode error if any frame fails to serialize, or if a match
/// other than the last has no footer.
pub fn encode_game(
    header: &GameHeader,
    matches: &[GameMatch],
    footer: Option<&GameFooter>,
) -> Result<Vec<u8>> {
    let mut out = preamble().to_vec();
    write_frame(&mut out, &FrameRef::GameHeader(header))?;
    for (index, recorded) in matches.iter().enumerate() {
        write_frame(&mut out, &FrameRef::MatchStart(&recorded.initial))?;
        for record in &recorded.deltas {
            write_frame(&mut out, &FrameRef::Delta(record))?;
        }
        match &recorded.footer {
            Some(match_footer) => write_frame(&mut out, &FrameRef::Footer(match_footer))?,
            None if index + 1 < matches.len() => {
                return Err(Error::encode(format!(
                    "match {index} has no footer but is followed by another match"
                )));
            }
            None => {}
        }
    }
    if let Some(footer) = footer {
        write_frame(&mut out, &FrameRef::GameFooter(footer))?;
    }
    Ok(out)
}

fn write_frame(out: &mut Vec<u8>, frame: &FrameRef<'_>) -> Result<()> {
    let body = rmp_serde::to_vec_named(frame).map_err(|e| Error::encode(e.to_string()))?;
    let len = u32::try_from(body.len())
        .map_err(|_| Error::encode(format!("frame of {} bytes is too large", body.len())))?;
    out.extend_from_slice(&len.to_le_bytes());
    out.extend_from_slice(&body);
    Ok(())
}
