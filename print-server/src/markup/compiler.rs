//! Markup to instruction stream compiler
//!
//! Recursive descent over the markup tree. Each known element maps to a
//! [`Tag`]; anything else is skipped so newer documents still print on older
//! servers.

use std::str::FromStr;

use pos_printer::{Align, FontFamily, InstructionStream, SizeMode};
use tracing::{debug, instrument};

use super::MarkupError;
use super::node::{MarkupDocument, MarkupElement, MarkupNode};
use super::table::{ColumnDef, TableModel, text_len};

/// Required name of the root element
pub const ROOT_TAG: &str = "printing";

/// Elements the compiler acts on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tag {
    VerticalTab,
    Beep,
    PartialCut,
    Cut,
    CashDrawer,
    Style,
    Paragraph,
    Table,
    Row,
    Separator,
}

impl Tag {
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "verticalTab" => Tag::VerticalTab,
            "beep" => Tag::Beep,
            "partialCut" => Tag::PartialCut,
            "cut" => Tag::Cut,
            "cashDrawer" => Tag::CashDrawer,
            "style" => Tag::Style,
            "p" => Tag::Paragraph,
            "table" => Tag::Table,
            "tr" => Tag::Row,
            "separator" => Tag::Separator,
            _ => return None,
        })
    }
}

/// Toggleable font flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontFlag {
    Bold,
    Underline,
    UnderlineThick,
    UpsideDown,
    Invert,
}

impl FontFlag {
    pub const ALL: [FontFlag; 5] = [
        FontFlag::Bold,
        FontFlag::Underline,
        FontFlag::UnderlineThick,
        FontFlag::UpsideDown,
        FontFlag::Invert,
    ];

    /// Attribute spelling
    pub fn attribute(self) -> &'static str {
        match self {
            FontFlag::Bold => "bold",
            FontFlag::Underline => "underline",
            FontFlag::UnderlineThick => "underlineThick",
            FontFlag::UpsideDown => "upsideDown",
            FontFlag::Invert => "invert",
        }
    }
}

/// Formatting in effect at the current point of the document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FormattingState {
    pub bold: bool,
    pub underline: bool,
    pub underline_thick: bool,
    pub upside_down: bool,
    pub invert: bool,
    pub size: SizeMode,
    pub align: Align,
    pub font: FontFamily,
}

impl FormattingState {
    fn flag_mut(&mut self, flag: FontFlag) -> &mut bool {
        match flag {
            FontFlag::Bold => &mut self.bold,
            FontFlag::Underline => &mut self.underline,
            FontFlag::UnderlineThick => &mut self.underline_thick,
            FontFlag::UpsideDown => &mut self.upside_down,
            FontFlag::Invert => &mut self.invert,
        }
    }
}

/// Compile a document into a fresh stream obtained from the target printer
///
/// The stream is only returned on success; a [`MarkupError`] leaves nothing
/// to execute.
#[instrument(skip_all, fields(width = printing.width()))]
pub fn compile(
    document: &MarkupDocument,
    printing: InstructionStream,
) -> Result<InstructionStream, MarkupError> {
    let root = document.root().ok_or(MarkupError::Empty)?;
    if root.name != ROOT_TAG {
        return Err(MarkupError::NotPrinting(root.name.clone()));
    }

    let mut compiler = MarkupCompiler::new(printing);
    compiler.build(&root.children, None);
    Ok(compiler.finish())
}

/// Parse XML text and compile it
pub fn compile_str(xml: &str, printing: InstructionStream) -> Result<InstructionStream, MarkupError> {
    compile(&MarkupDocument::parse(xml)?, printing)
}

/// Owns the instruction stream and formatting state for one print job
#[derive(Debug)]
pub struct MarkupCompiler {
    stream: InstructionStream,
    state: FormattingState,
}

impl MarkupCompiler {
    pub fn new(stream: InstructionStream) -> Self {
        Self {
            stream,
            state: FormattingState::default(),
        }
    }

    pub fn state(&self) -> &FormattingState {
        &self.state
    }

    pub fn finish(self) -> InstructionStream {
        self.stream
    }

    fn build(&mut self, nodes: &[MarkupNode], table: Option<&TableModel>) {
        for node in nodes {
            match node {
                MarkupNode::Text(text) => self.text(text),
                MarkupNode::Element(element) => match Tag::from_name(&element.name) {
                    Some(tag) => self.element(tag, element, table),
                    None => debug!(tag = %element.name, "Skipping unknown element"),
                },
            }
        }
    }

    fn element(&mut self, tag: Tag, element: &MarkupElement, table: Option<&TableModel>) {
        match tag {
            Tag::VerticalTab => {
                self.stream.vertical_tab();
            }
            Tag::Beep => {
                self.stream.beep();
            }
            Tag::PartialCut => {
                self.stream.partial_cut();
            }
            Tag::Cut => {
                self.stream.cut();
            }
            Tag::CashDrawer => {
                self.stream.cash_drawer();
            }
            Tag::Style => self.style(element),
            Tag::Paragraph => self.build(&element.children, None),
            Tag::Table => self.table(element),
            Tag::Row => match table {
                Some(table) => self.row(element, table),
                None => debug!("Skipping tr outside of a table"),
            },
            Tag::Separator => self.separator(element),
        }
    }

    fn text(&mut self, text: &str) {
        let lines: Vec<&str> = text
            .trim()
            .split('\n')
            .map(|line| line.trim_matches([' ', '\t', '\r']))
            .collect();
        self.stream.line(&lines.join("\n"));
    }

    fn separator(&mut self, element: &MarkupElement) {
        let pattern = element
            .attribute("char")
            .filter(|c| !c.is_empty())
            .unwrap_or("-");
        let width = self.stream.width();
        let mut line = String::new();
        let mut used = 0;
        for c in pattern.chars().cycle() {
            let char_width = text_len(c.encode_utf8(&mut [0; 4]));
            if char_width == 0 || used + char_width > width {
                break;
            }
            line.push(c);
            used += char_width;
        }
        self.stream.print(&line);
    }

    fn style(&mut self, element: &MarkupElement) {
        if let Some(align) = parse_attr::<Align>(element, "align") {
            self.state.align = align;
            self.stream.align(align);
        }

        self.font_flags(element, false);

        if let Some(size) = parse_attr::<SizeMode>(element, "size") {
            self.state.size = size;
            self.stream.size(size);
        }

        if let Some(font) = parse_attr::<FontFamily>(element, "font") {
            self.state.font = font;
            self.stream.font(font);
        }
    }

    /// Emit toggles for every flag attribute present on `element`
    ///
    /// `"false"` turns a flag off and any other value turns it on; `revert`
    /// emits the opposite toggles to undo a previous call.
    fn font_flags(&mut self, element: &MarkupElement, revert: bool) {
        for flag in FontFlag::ALL {
            let Some(value) = element.attribute(flag.attribute()) else {
                continue;
            };
            let on = (value != "false") != revert;
            *self.state.flag_mut(flag) = on;
            match flag {
                FontFlag::Bold => self.stream.bold(on),
                FontFlag::Underline => self.stream.underline(on),
                FontFlag::UnderlineThick => self.stream.underline_thick(on),
                FontFlag::UpsideDown => self.stream.upside_down(on),
                FontFlag::Invert => self.stream.invert(on),
            };
        }
    }

    fn table(&mut self, element: &MarkupElement) {
        let mut table = TableModel::default();

        for child in element.elements() {
            match child.name.as_str() {
                "tdef" => table.columns.extend(
                    child
                        .elements()
                        .filter(|td| td.name == "td")
                        .map(column_def),
                ),
                "tr" => table.push_row(
                    child
                        .elements()
                        .filter(|td| td.name == "td")
                        .map(MarkupElement::inner_text),
                ),
                _ => {}
            }
        }

        table.compute_layout(self.stream.width());
        debug!(
            columns = table.columns.len(),
            rows = table.rows.len(),
            "Table layout computed"
        );

        self.build(&element.children, Some(&table));
    }

    fn row(&mut self, element: &MarkupElement, table: &TableModel) {
        let mut cells = element.elements().filter(|td| td.name == "td");
        for column in &table.columns {
            let Some(td) = cells.next() else {
                // short row, pad the missing cells so the line stays full
                let (padding_left, padding_right) = column.render_cell("");
                self.stream.print(&format!("{}{}", padding_left, padding_right));
                continue;
            };
            let text = td.inner_text();
            let (padding_left, padding_right) = column.render_cell(text);

            self.stream.print(&padding_left);
            self.font_flags(td, false);
            self.stream.print(text);
            self.font_flags(td, true);
            self.stream.print(&padding_right);
        }
    }
}

fn column_def(td: &MarkupElement) -> ColumnDef {
    ColumnDef::new(
        parse_attr(td, "align").unwrap_or_default(),
        td.attribute("expand") == Some("true"),
    )
}

/// Parse a mode attribute; unknown spellings are ignored
fn parse_attr<T: FromStr>(element: &MarkupElement, name: &str) -> Option<T> {
    let value = element.attribute(name)?;
    match value.parse() {
        Ok(v) => Some(v),
        Err(_) => {
            debug!(attribute = name, value, "Ignoring invalid attribute value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pos_printer::Instruction;

    fn compile_xml(xml: &str) -> Vec<Instruction> {
        compile_str(xml, InstructionStream::new(42))
            .unwrap()
            .into_instructions()
    }

    #[test]
    fn test_empty_document_rejected() {
        let err = compile(&MarkupDocument::default(), InstructionStream::new(42)).unwrap_err();
        assert!(matches!(err, MarkupError::Empty));

        let err = compile_str("   ", InstructionStream::new(42)).unwrap_err();
        assert!(matches!(err, MarkupError::Empty));
    }

    #[test]
    fn test_wrong_root_rejected() {
        let err = compile_str("<receipt><cut/></receipt>", InstructionStream::new(42)).unwrap_err();
        assert!(matches!(err, MarkupError::NotPrinting(name) if name == "receipt"));
    }

    #[test]
    fn test_primitives_in_order() {
        let out = compile_xml(
            "<printing><verticalTab/><beep/><cashDrawer/><partialCut/><cut/></printing>",
        );
        assert_eq!(
            out,
            vec![
                Instruction::Init,
                Instruction::VerticalTab,
                Instruction::Beep,
                Instruction::CashDrawer,
                Instruction::PartialCut,
                Instruction::Cut,
            ]
        );
    }

    #[test]
    fn test_unknown_tags_skipped() {
        let out = compile_xml("<printing><qrcode data='x'/><blink><cut/></blink><beep/></printing>");
        assert_eq!(out, vec![Instruction::Init, Instruction::Beep]);
    }

    #[test]
    fn test_text_lines_trimmed() {
        let out = compile_xml("<printing><p>\n    Hello   \n\t  World\r\n  </p></printing>");
        assert_eq!(
            out,
            vec![Instruction::Init, Instruction::Text("Hello\nWorld\n".into())]
        );
    }

    #[test]
    fn test_style_flags() {
        let out = compile_xml(
            r#"<printing><style bold="" underline="false" invert="true" upsideDown="yes"/></printing>"#,
        );
        assert_eq!(
            out,
            vec![
                Instruction::Init,
                Instruction::Bold(true),
                Instruction::Underline(false),
                Instruction::UpsideDown(true),
                Instruction::Invert(true),
            ]
        );
    }

    #[test]
    fn test_style_modes_and_invalid_values() {
        let out = compile_xml(
            r#"<printing><style size="quadArea" align="right" font="B"/><style size="huge" align="middle" font="Z"/></printing>"#,
        );
        assert_eq!(
            out,
            vec![
                Instruction::Init,
                Instruction::Align(Align::Right),
                Instruction::Size(SizeMode::QuadArea),
                Instruction::Font(FontFamily::B),
            ]
        );
    }

    #[test]
    fn test_state_tracks_style() {
        let doc = MarkupDocument::parse(
            r#"<printing><style bold="true" size="doubleWidth"/><style bold="false" underlineThick="1"/></printing>"#,
        )
        .unwrap();
        let mut compiler = MarkupCompiler::new(InstructionStream::new(42));
        compiler.build(&doc.root().unwrap().children, None);

        let state = compiler.state();
        assert!(!state.bold);
        assert!(state.underline_thick);
        assert_eq!(state.size, SizeMode::DoubleWidth);
        assert_eq!(state.align, Align::Left);
    }

    #[test]
    fn test_separator_fills_width() {
        let out = compile_xml(r#"<printing><separator/><separator char="="/><separator char="-+"/></printing>"#);
        assert_eq!(out[1], Instruction::Text("-".repeat(42)));
        assert_eq!(out[2], Instruction::Text("=".repeat(42)));
        assert_eq!(out[3], Instruction::Text("-+".repeat(21)));
    }

    #[test]
    fn test_separator_counts_wide_chars() {
        let out = compile_xml(r#"<printing><separator char="＝"/></printing>"#);
        assert_eq!(out[1], Instruction::Text("＝".repeat(21)));
    }

    #[test]
    fn test_single_column_rows_end_their_line() {
        let printing = compile_str(
            "<printing><table><tr><td>abc</td></tr><tr><td>def</td></tr></table><p>next</p></printing>",
            InstructionStream::new(10),
        )
        .unwrap();
        assert_eq!(printing.plain_text(), "abc       def       next\n");
    }

    #[test]
    fn test_short_row_padded_to_width() {
        let printing = compile_str(
            r#"<printing><table>
                <tdef><td/><td align="right"/></tdef>
                <tr><td>ab</td><td>cd</td></tr>
                <tr><td>x</td></tr>
            </table></printing>"#,
            InstructionStream::new(10),
        )
        .unwrap();
        assert_eq!(printing.plain_text(), "ab      cdx         ");
    }

    #[test]
    fn test_tr_outside_table_skipped() {
        let out = compile_xml("<printing><tr><td>1</td></tr></printing>");
        assert_eq!(out, vec![Instruction::Init]);
    }

    #[test]
    fn test_table_cell_toggles() {
        let out = compile_xml(
            r#"<printing><table>
                <tdef><td align="left" expand="true"/><td align="right"/></tdef>
                <tr><td>Total</td><td bold="true">9.99</td></tr>
            </table></printing>"#,
        );
        assert_eq!(
            out,
            vec![
                Instruction::Init,
                Instruction::Text("Total".into()),
                Instruction::Text(" ".repeat(33)),
                Instruction::Bold(true),
                Instruction::Text("9.99".into()),
                Instruction::Bold(false),
            ]
        );
    }

    #[test]
    fn test_table_cell_false_toggle_reverts_on() {
        let out = compile_xml(
            r#"<printing><table><tr><td underline="false">a</td></tr></table></printing>"#,
        );
        assert_eq!(
            out,
            vec![
                Instruction::Init,
                Instruction::Underline(false),
                Instruction::Text("a".into()),
                Instruction::Underline(true),
                Instruction::Text(" ".repeat(41)),
            ]
        );
    }

    #[test]
    fn test_empty_cell() {
        let out = compile_xml(
            r#"<printing><table><tdef><td/><td expand="true"/></tdef><tr><td/><td>x</td></tr></table></printing>"#,
        );
        // first column is zero wide with one char of margin
        assert_eq!(out[1], Instruction::Text(" ".into()));
        assert_eq!(out[2], Instruction::Text("x".into()));
        assert_eq!(out[3], Instruction::Text(" ".repeat(40)));
    }
}
