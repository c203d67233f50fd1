/// MIME type every uploaded recording is sent upstream with.
pub const AUDIO_MIME: &str = "audio/webm";

/// Best-effort container detection from magic bytes.
pub fn detect_audio_mime(bytes: &[u8]) -> Option<&'static str> {
    match bytes {
        [0x1A, 0x45, 0xDF, 0xA3, ..] => Some("audio/webm"),
        [b'O', b'g', b'g', b'S', ..] => Some("audio/ogg"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'A', b'V', b'E', ..] => Some("audio/wav"),
        [b'I', b'D', b'3', ..] | [0xFF, 0xFB | 0xF3 | 0xF2, ..] => Some("audio/mpeg"),
        [_, _, _, _, b'f', b't', b'y', b'p', ..] => Some("audio/mp4"),
        _ => None,
    }
}

/// Tag for an uploaded recording. Always [`AUDIO_MIME`]; a differing
/// container is only logged.
pub fn tag_audio(bytes: &[u8]) -> &'static str {
    match detect_audio_mime(bytes) {
        Some(detected) if detected != AUDIO_MIME => {
            tracing::debug!(
                "Audio looks like {} but is tagged as {} ({} bytes)",
                detected,
                AUDIO_MIME,
                bytes.len()
            );
        }
        None if !bytes.is_empty() => {
            tracing::debug!(
                "Unrecognized audio container (first 4 bytes: {:02X?}), tagging as {}",
                &bytes[..bytes.len().min(4)],
                AUDIO_MIME
            );
        }
        _ => {}
    }

    AUDIO_MIME
}
