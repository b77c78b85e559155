use std::io::{Cursor, Read};

use base64::{engine::general_purpose, Engine as _};
use flate2::read::GzDecoder;

use crate::error::{EditorError, EditorResult};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Turns import bytes into SVG markup, inflating `.svgz` payloads.
pub fn decode_svg_bytes(data: &[u8]) -> EditorResult<String> {
    if data.starts_with(&GZIP_MAGIC) {
        let mut markup = String::new();
        GzDecoder::new(data)
            .read_to_string(&mut markup)
            .map_err(|e| EditorError::import(format!("failed to inflate svgz: {e}")))?;
        Ok(markup)
    } else {
        String::from_utf8(data.to_vec()).map_err(|e| EditorError::import(format!("svg is not utf-8: {e}")))
    }
}

/// Payload bytes of a base64 `data:` URI, `None` for anything else.
pub fn decode_data_uri(uri: &str) -> Option<Vec<u8>> {
    let rest = uri.trim().strip_prefix("data:")?;
    let (meta, payload) = rest.split_once(',')?;
    if !meta.ends_with(";base64") {
        return None;
    }
    let cleaned: String = payload.chars().filter(|c| !c.is_whitespace()).collect();
    general_purpose::STANDARD.decode(cleaned).ok()
}

/// Intrinsic pixel size of a base64 PNG/JPEG data URI. Only the header is read.
pub fn data_uri_dimensions(uri: &str) -> Option<(f64, f64)> {
    let bytes = decode_data_uri(uri)?;
    let (w, h) = image::io::Reader::new(Cursor::new(bytes)).with_guessed_format().ok()?.into_dimensions().ok()?;
    Some((w as f64, h as f64))
}

pub fn svg_data_uri(markup: &str) -> String {
    format!("data:image/svg+xml;base64,{}", general_purpose::STANDARD.encode(markup.as_bytes()))
}
