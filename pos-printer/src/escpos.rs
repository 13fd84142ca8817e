//! ESC/POS command encoding
//!
//! Turns an [`InstructionStream`] into the byte sequence understood by
//! Epson-compatible thermal printers.

use crate::encoding::convert_to_gbk;
use crate::instruction::{Align, FontFamily, Instruction, InstructionStream, SizeMode};
use tracing::instrument;

const ESC: u8 = 0x1B;
const GS: u8 = 0x1D;

/// Encode a stream to ESC/POS with GBK text conversion
///
/// ASCII command bytes are preserved exactly; UTF-8 text is converted to GBK.
#[instrument(skip(stream), fields(width = stream.width(), len = stream.instructions().len()))]
pub fn to_escpos(stream: &InstructionStream) -> Vec<u8> {
    convert_to_gbk(&to_escpos_raw(stream))
}

/// Encode without GBK conversion (for debugging or ASCII-only content)
pub fn to_escpos_raw(stream: &InstructionStream) -> Vec<u8> {
    let mut buf = Vec::with_capacity(4096);
    for instruction in stream.instructions() {
        encode(instruction, &mut buf);
    }
    buf
}

fn encode(instruction: &Instruction, buf: &mut Vec<u8>) {
    match instruction {
        // ESC @ - Initialize printer
        Instruction::Init => buf.extend_from_slice(&[ESC, 0x40]),
        Instruction::Text(s) => buf.extend_from_slice(s.as_bytes()),
        // ESC a n
        Instruction::Align(align) => {
            let n = match align {
                Align::Left => 0x00,
                Align::Center => 0x01,
                Align::Right => 0x02,
            };
            buf.extend_from_slice(&[ESC, 0x61, n]);
        }
        // ESC E n
        Instruction::Bold(on) => buf.extend_from_slice(&[ESC, 0x45, *on as u8]),
        // ESC - n (1 dot / 2 dots)
        Instruction::Underline(on) => buf.extend_from_slice(&[ESC, 0x2D, *on as u8]),
        Instruction::UnderlineThick(on) => {
            buf.extend_from_slice(&[ESC, 0x2D, if *on { 0x02 } else { 0x00 }])
        }
        // ESC { n
        Instruction::UpsideDown(on) => buf.extend_from_slice(&[ESC, 0x7B, *on as u8]),
        // GS B n - White/black reverse
        Instruction::Invert(on) => buf.extend_from_slice(&[GS, 0x42, *on as u8]),
        // GS ! n
        Instruction::Size(size) => {
            let n = match size {
                SizeMode::Normal => 0x00,
                SizeMode::DoubleHeight => 0x01,
                SizeMode::DoubleWidth => 0x10,
                SizeMode::QuadArea => 0x11,
            };
            buf.extend_from_slice(&[GS, 0x21, n]);
        }
        // ESC M n
        Instruction::Font(font) => {
            let n = match font {
                FontFamily::A => 0x00,
                FontFamily::B => 0x01,
            };
            buf.extend_from_slice(&[ESC, 0x4D, n]);
        }
        // VT is not in the Epson set, feed one line instead
        Instruction::VerticalTab => buf.push(0x0A),
        // ESC B n t - Beep n times, t * 50ms
        Instruction::Beep => buf.extend_from_slice(&[ESC, 0x42, 0x03, 0x02]),
        // GS V 1 - Partial cut
        Instruction::PartialCut => buf.extend_from_slice(&[GS, 0x56, 0x01]),
        // GS V 0 - Full cut
        Instruction::Cut => buf.extend_from_slice(&[GS, 0x56, 0x00]),
        // ESC p m t1 t2 - Pulse on pin 2
        Instruction::CashDrawer => buf.extend_from_slice(&[ESC, 0x70, 0x00, 25, 250]),
    }
}
