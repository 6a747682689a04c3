//! Container signature detection.

use super::types::ContainerKind;

/// Header bytes needed to recognize every supported container.
pub const HEADER_LEN: usize = 12;

const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// Recognizes a video container from the first bytes of a file.
pub fn detect_container(header: &[u8]) -> Option<ContainerKind> {
    if header.len() >= 8 && &header[4..8] == b"ftyp" {
        return Some(ContainerKind::Mp4);
    }
    if header.len() >= 4 && header[..4] == EBML_MAGIC {
        return Some(ContainerKind::WebM);
    }
    if header.len() >= 12 && &header[..4] == b"RIFF" && &header[8..12] == b"AVI " {
        return Some(ContainerKind::Avi);
    }
    None
}

/// Hex rendering of a header for error messages.
pub fn hex_preview(header: &[u8]) -> String {
    header
        .iter()
        .take(HEADER_LEN)
        .map(|b| format!("{:02x}", b))
        .collect::<Vec<_>>()
        .join(" ")
}
