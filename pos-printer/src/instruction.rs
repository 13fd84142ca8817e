//! Printer-agnostic instruction stream
//!
//! A print job is an ordered list of [`Instruction`]s. The stream is created by
//! a printer (so it knows the paper width in characters), filled through the
//! fluent builder methods, and handed back to [`crate::Printer::execute`].

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Rejected mode spelling (e.g. `size="huge"`)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown {kind}: {value}")]
pub struct ParseModeError {
    kind: &'static str,
    value: String,
}

impl ParseModeError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// Horizontal justification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

impl FromStr for Align {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "left" => Ok(Align::Left),
            "center" => Ok(Align::Center),
            "right" => Ok(Align::Right),
            other => Err(ParseModeError::new("align", other)),
        }
    }
}

/// Character size mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SizeMode {
    #[default]
    Normal,
    DoubleHeight,
    DoubleWidth,
    /// Double width and height
    QuadArea,
}

impl FromStr for SizeMode {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "normal" => Ok(SizeMode::Normal),
            "doubleHeight" => Ok(SizeMode::DoubleHeight),
            "doubleWidth" => Ok(SizeMode::DoubleWidth),
            "quadArea" => Ok(SizeMode::QuadArea),
            other => Err(ParseModeError::new("size", other)),
        }
    }
}

/// Built-in character font
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontFamily {
    #[default]
    A,
    B,
}

impl FromStr for FontFamily {
    type Err = ParseModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "A" => Ok(FontFamily::A),
            "B" => Ok(FontFamily::B),
            other => Err(ParseModeError::new("font", other)),
        }
    }
}

/// A single printer primitive
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// Reset the printer to its power-on state
    Init,
    Text(String),
    Align(Align),
    Bold(bool),
    Underline(bool),
    UnderlineThick(bool),
    UpsideDown(bool),
    Invert(bool),
    Size(SizeMode),
    Font(FontFamily),
    VerticalTab,
    Beep,
    PartialCut,
    Cut,
    CashDrawer,
}

/// Ordered instruction stream for one print job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionStream {
    width: usize,
    instructions: Vec<Instruction>,
}

impl InstructionStream {
    /// Create a stream for paper `width` characters wide
    ///
    /// Common widths:
    /// - 58mm paper: 32 characters
    /// - 80mm paper: 42 or 48 characters depending on the font
    pub fn new(width: usize) -> Self {
        Self {
            width,
            instructions: vec![Instruction::Init],
        }
    }

    /// Paper width in characters
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }

    pub fn into_instructions(self) -> Vec<Instruction> {
        self.instructions
    }

    pub fn is_empty(&self) -> bool {
        self.instructions
            .iter()
            .all(|i| matches!(i, Instruction::Init))
    }

    /// Concatenated text of all `Text` primitives (handy for previews and tests)
    pub fn plain_text(&self) -> String {
        self.instructions
            .iter()
            .filter_map(|i| match i {
                Instruction::Text(s) => Some(s.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn push(&mut self, instruction: Instruction) -> &mut Self {
        self.instructions.push(instruction);
        self
    }

    // === Text Output ===

    /// Write raw text; empty strings are dropped
    pub fn print(&mut self, s: &str) -> &mut Self {
        if !s.is_empty() {
            self.instructions.push(Instruction::Text(s.to_string()));
        }
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.print(&format!("{}\n", s))
    }

    // === Modes ===

    pub fn align(&mut self, align: Align) -> &mut Self {
        self.push(Instruction::Align(align))
    }

    pub fn size(&mut self, size: SizeMode) -> &mut Self {
        self.push(Instruction::Size(size))
    }

    pub fn font(&mut self, font: FontFamily) -> &mut Self {
        self.push(Instruction::Font(font))
    }

    pub fn bold(&mut self, on: bool) -> &mut Self {
        self.push(Instruction::Bold(on))
    }

    pub fn underline(&mut self, on: bool) -> &mut Self {
        self.push(Instruction::Underline(on))
    }

    pub fn underline_thick(&mut self, on: bool) -> &mut Self {
        self.push(Instruction::UnderlineThick(on))
    }

    pub fn upside_down(&mut self, on: bool) -> &mut Self {
        self.push(Instruction::UpsideDown(on))
    }

    pub fn invert(&mut self, on: bool) -> &mut Self {
        self.push(Instruction::Invert(on))
    }

    // === Paper & Peripherals ===

    pub fn vertical_tab(&mut self) -> &mut Self {
        self.push(Instruction::VerticalTab)
    }

    pub fn beep(&mut self) -> &mut Self {
        self.push(Instruction::Beep)
    }

    pub fn partial_cut(&mut self) -> &mut Self {
        self.push(Instruction::PartialCut)
    }

    pub fn cut(&mut self) -> &mut Self {
        self.push(Instruction::Cut)
    }

    pub fn cash_drawer(&mut self) -> &mut Self {
        self.push(Instruction::CashDrawer)
    }
}

impl fmt::Display for InstructionStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.plain_text())
    }
}
