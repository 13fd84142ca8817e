//! GBK encoding utilities for Chinese thermal printers
//!
//! Most Chinese thermal printers use GBK encoding for text. Encoded
//! instruction streams are passed through [`convert_to_gbk`] so ESC/POS
//! command bytes survive untouched while UTF-8 text is re-encoded.

use tracing::instrument;

/// Printed width of a string, in GBK bytes
///
/// ASCII takes one column, a Chinese character two.
pub fn gbk_width(s: &str) -> usize {
    let (cow, _, _) = encoding_rs::GBK.encode(s);
    cow.len()
}

/// Convert mixed UTF-8 content (with ESC/POS commands) to GBK
///
/// This function preserves ASCII bytes (0x00-0x7F) exactly as is,
/// which protects ESC/POS commands from being corrupted.
/// Only bytes >= 0x80 are treated as UTF-8 sequences and converted to GBK.
///
/// Also handles:
/// - Re-enabling Chinese mode after INIT command (ESC @)
/// - Euro symbol (€) special handling
#[instrument(skip(bytes))]
pub fn convert_to_gbk(bytes: &[u8]) -> Vec<u8> {
    let mut result = Vec::with_capacity(bytes.len() * 2);

    // Enable Chinese mode at the start
    // FS & (0x1C 0x26) - Enable Chinese mode
    // FS C 1 (0x1C 0x43 0x01) - Select GBK code page
    result.extend_from_slice(&[0x1C, 0x26, 0x1C, 0x43, 0x01]);

    let mut buffer = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];

        // Check for INIT command (ESC @ = 0x1B 0x40)
        // If we see INIT, we must re-enable Chinese mode after it
        if b == 0x1B && i + 1 < bytes.len() && bytes[i + 1] == 0x40 {
            // Flush pending non-ASCII buffer
            flush_buffer(&mut buffer, &mut result);

            // Write INIT
            result.push(0x1B);
            result.push(0x40);

            // Re-enable Chinese mode
            result.extend_from_slice(&[0x1C, 0x26]);

            i += 2;
            continue;
        }

        if b < 128 {
            // ASCII byte (Command or ASCII text)
            flush_buffer(&mut buffer, &mut result);
            result.push(b);
        } else {
            // Non-ASCII byte (Part of UTF-8 Chinese char)
            buffer.push(b);
        }
        i += 1;
    }

    // Flush remaining buffer
    flush_buffer(&mut buffer, &mut result);

    // Exit Chinese mode at the end
    // FS . (0x1C 0x2E)
    result.extend_from_slice(&[0x1C, 0x2E]);

    result
}

/// Flush the non-ASCII buffer, converting UTF-8 to GBK
fn flush_buffer(buffer: &mut Vec<u8>, result: &mut Vec<u8>) {
    if buffer.is_empty() {
        return;
    }

    let s = String::from_utf8_lossy(buffer);
    let parts: Vec<&str> = s.split('€').collect();

    for (idx, part) in parts.iter().enumerate() {
        if !part.is_empty() {
            let (gbk, _, _) = encoding_rs::GBK.encode(part);
            result.extend_from_slice(&gbk);
        }
        if idx < parts.len() - 1 {
            // Inject Euro Sequence: Exit Chinese -> PC858 -> Euro -> Enter Chinese
            result.extend_from_slice(&[0x1C, 0x2E, 0x1B, 0x74, 19, 0xD5, 0x1C, 0x26]);
        }
    }
    buffer.clear();
}
