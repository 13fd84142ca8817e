//! Monospace table layout
//!
//! Column widths are derived from the content of every row before the first
//! row is rendered. For a table of `n` columns on a printer `width` chars wide:
//!
//! ```text
//! sum(length) + sum(margin_right) == width      (last margin_right == 0)
//! ```
//!
//! holds whenever the content fits. Widths are printed columns, so a Chinese
//! character counts twice.

use pos_printer::{Align, gbk_width};

/// Layout of one column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnDef {
    pub align: Align,
    pub expand: bool,
    /// Shortest cell seen, `None` until a row touches this column
    pub min_length: Option<usize>,
    pub max_length: usize,
    pub length: usize,
    pub margin_right: usize,
}

impl ColumnDef {
    pub fn new(align: Align, expand: bool) -> Self {
        Self {
            align,
            expand,
            min_length: None,
            max_length: 0,
            length: 0,
            margin_right: 1,
        }
    }

    fn observe(&mut self, len: usize) {
        self.min_length = Some(self.min_length.map_or(len, |m| m.min(len)));
        self.max_length = self.max_length.max(len);
    }

    /// Pad `text` to this column's width and append the right margin
    pub fn render_cell(&self, text: &str) -> (String, String) {
        let width = self.length.saturating_sub(text_len(text));
        let (left, right) = match self.align {
            Align::Left => (0, width),
            Align::Right => (width, 0),
            Align::Center => (width / 2, width - width / 2),
        };
        (
            " ".repeat(left),
            " ".repeat(right + self.margin_right),
        )
    }
}

impl Default for ColumnDef {
    fn default() -> Self {
        Self::new(Align::Left, false)
    }
}

/// Printed width of `text` once encoded for the printer
pub fn text_len(text: &str) -> usize {
    gbk_width(text)
}

/// Columns plus every row's trimmed cell text
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableModel {
    pub columns: Vec<ColumnDef>,
    pub rows: Vec<Vec<String>>,
}

impl TableModel {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Record a row, widening (or synthesizing) its columns
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let row: Vec<String> = cells
            .into_iter()
            .map(|c| c.as_ref().trim().to_string())
            .collect();

        for (index, text) in row.iter().enumerate() {
            if index >= self.columns.len() {
                self.columns.resize_with(index + 1, ColumnDef::default);
            }
            self.columns[index].observe(text_len(text));
        }

        self.rows.push(row);
    }

    /// Derive `length` and `margin_right` of every column
    pub fn compute_layout(&mut self, printer_width: usize) {
        compute_layout(&mut self.columns, printer_width);
    }

    /// Render a row to one line of exactly the table width
    ///
    /// Cells beyond the defined columns are dropped.
    pub fn render_row<S: AsRef<str>>(&self, cells: &[S]) -> String {
        let mut line = String::new();
        for (cell, column) in cells.iter().zip(&self.columns) {
            let text = cell.as_ref().trim();
            let (left, right) = column.render_cell(text);
            line.push_str(&left);
            line.push_str(text);
            line.push_str(&right);
        }
        line
    }
}

/// Distribute `printer_width` across columns
///
/// Expanding columns share what the fixed columns leave (one char of margin
/// between neighbours); with no expanding column the leftover becomes margin.
/// `min_length`/`max_length` must already reflect every row.
pub fn compute_layout(columns: &mut [ColumnDef], printer_width: usize) {
    let count = columns.len();
    if count == 0 {
        return;
    }

    let fixed_width: usize = columns
        .iter()
        .filter(|c| !c.expand)
        .map(|c| c.max_length)
        .sum();
    let slots = columns.iter().filter(|c| c.expand).count();
    let gaps = count - 1;

    let mut first_expand = true;
    for (index, column) in columns.iter_mut().enumerate() {
        column.length = column.max_length;
        column.margin_right = 1;

        if slots > 0 {
            if column.expand {
                let available = printer_width.saturating_sub(fixed_width + gaps);
                column.length = available / slots;
                if first_expand {
                    column.length += available % slots;
                    first_expand = false;
                }
            }
        } else if gaps > 0 {
            let available = printer_width.saturating_sub(fixed_width);
            column.margin_right = available / gaps;
            if index == 0 {
                column.margin_right += available % gaps;
            }
        } else {
            // lone fixed column spans the line itself
            column.length = printer_width.max(column.max_length);
        }

        if index == count - 1 {
            column.margin_right = 0;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(columns: &[ColumnDef]) -> usize {
        columns.iter().map(|c| c.length + c.margin_right).sum()
    }

    fn receipt_table() -> TableModel {
        let mut table = TableModel::new(vec![
            ColumnDef::new(Align::Right, false),
            ColumnDef::new(Align::Left, true),
            ColumnDef::new(Align::Right, false),
        ]);
        table.push_row(["1", "Cola Zero", "2.20"]);
        table.push_row(["2", "Fanta", "4.40"]);
        table
    }

    #[test]
    fn test_expand_column_takes_remaining_width() {
        let mut table = receipt_table();
        table.compute_layout(42);

        assert_eq!(table.columns[0].max_length, 1);
        assert_eq!(table.columns[2].max_length, 4);
        assert_eq!(table.columns[1].length, 35);
        assert_eq!(table.columns[0].margin_right, 1);
        assert_eq!(table.columns[2].margin_right, 0);
        assert_eq!(total(&table.columns), 42);
    }

    #[test]
    fn test_render_receipt_rows() {
        let mut table = receipt_table();
        table.compute_layout(42);

        let row = table.render_row(&["1", "Cola Zero", "2.20"]);
        assert_eq!(row, format!("1 Cola Zero{} 2.20", " ".repeat(26)));
        assert_eq!(row.len(), 42);

        let row = table.render_row(&["2", "Fanta", "4.40"]);
        assert_eq!(row, format!("2 Fanta{} 4.40", " ".repeat(30)));
    }

    #[test]
    fn test_min_max_tracking() {
        let table = receipt_table();
        assert_eq!(table.columns[1].min_length, Some(5));
        assert_eq!(table.columns[1].max_length, 9);
    }

    #[test]
    fn test_no_expand_distributes_margin() {
        let mut table = TableModel::new(vec![
            ColumnDef::new(Align::Left, false),
            ColumnDef::new(Align::Right, false),
            ColumnDef::new(Align::Right, false),
            ColumnDef::new(Align::Right, false),
        ]);
        table.push_row(["Rate", "Basis", "Tax", "Total"]);
        table.push_row(["6%", "100.00", "6.00", "106.00"]);
        table.compute_layout(42);

        // fixed = 4 + 6 + 4 + 6 = 20, leftover 22 over 3 gaps
        let margins: Vec<_> = table.columns.iter().map(|c| c.margin_right).collect();
        assert_eq!(margins, vec![8, 7, 7, 0]);
        assert_eq!(total(&table.columns), 42);

        let row = table.render_row(&["Rate", "Basis", "Tax", "Total"]);
        assert_eq!(row.len(), 42);
        assert!(row.starts_with("Rate        "));
        assert!(row.ends_with(" Total"));
    }

    #[test]
    fn test_several_expand_columns_split_remainder() {
        let mut table = TableModel::new(vec![
            ColumnDef::new(Align::Left, true),
            ColumnDef::new(Align::Center, true),
            ColumnDef::new(Align::Right, false),
        ]);
        table.push_row(["a", "b", "cc"]);
        table.compute_layout(32);

        // 32 - 2 - 2 = 28 split 14/14; 33 -> 29 split 15/14
        assert_eq!(table.columns[0].length, 14);
        assert_eq!(table.columns[1].length, 14);
        assert_eq!(total(&table.columns), 32);

        table.compute_layout(33);
        assert_eq!(table.columns[0].length, 15);
        assert_eq!(table.columns[1].length, 14);
        assert_eq!(total(&table.columns), 33);
    }

    #[test]
    fn test_single_fixed_column_spans_width() {
        let mut table = TableModel::new(vec![ColumnDef::new(Align::Center, false)]);
        table.push_row(["abc"]);
        table.compute_layout(10);
        assert_eq!(table.columns[0].length, 10);
        assert_eq!(table.columns[0].margin_right, 0);
        assert_eq!(table.render_row(&["abc"]), "   abc    ");

        // content wider than the printer keeps its own width
        table.push_row(["0123456789ab"]);
        table.compute_layout(10);
        assert_eq!(table.columns[0].length, 12);
    }

    #[test]
    fn test_layout_fills_width_for_any_shape() {
        let shapes: Vec<(Vec<bool>, Vec<Vec<&str>>)> = vec![
            (vec![false], vec![vec!["a"], vec!["bcd"]]),
            (vec![true], vec![vec!["a"]]),
            (vec![false, false], vec![vec!["ab", "c"]]),
            (vec![false, true], vec![vec!["12", "item"], vec!["3", ""]]),
            (vec![true, true, false], vec![vec!["a", "b", "9.99"]]),
            (vec![false; 4], vec![vec!["Rate", "Basis", "Tax", "Total"]]),
            (
                vec![false, true, false, true, false],
                vec![vec!["1", "x", "22", "y", "333"]],
            ),
            (vec![false; 3], vec![vec!["a"], vec!["b", "c"]]),
        ];

        for width in [32, 42, 48] {
            for (expand, rows) in &shapes {
                let columns = expand
                    .iter()
                    .map(|&e| ColumnDef::new(Align::Left, e))
                    .collect();
                let mut table = TableModel::new(columns);
                for row in rows {
                    table.push_row(row);
                }
                table.compute_layout(width);

                assert_eq!(total(&table.columns), width, "{:?} at {}", expand, width);
                assert_eq!(table.columns.last().map(|c| c.margin_right), Some(0));
                for row in rows {
                    if row.len() == table.columns.len() {
                        assert_eq!(text_len(&table.render_row(row)), width);
                    }
                }
            }
        }
    }

    #[test]
    fn test_chinese_cell_measured_in_printed_columns() {
        let mut table = TableModel::new(vec![
            ColumnDef::new(Align::Right, false),
            ColumnDef::new(Align::Left, true),
            ColumnDef::new(Align::Right, false),
        ]);
        table.push_row(["1", "可乐", "2.20"]);
        table.push_row(["2", "Fanta", "4.40"]);
        table.compute_layout(42);

        assert_eq!(table.columns[1].max_length, 5);
        let row = table.render_row(&["1", "可乐", "2.20"]);
        assert_eq!(gbk_width(&row), 42);
        assert_eq!(row, format!("1 可乐{} 2.20", " ".repeat(31)));
    }

    #[test]
    fn test_single_expand_column_fills_width() {
        let mut table = TableModel::new(vec![ColumnDef::new(Align::Center, true)]);
        table.push_row(["abc"]);
        table.compute_layout(10);
        assert_eq!(table.columns[0].length, 10);
        assert_eq!(table.render_row(&["abc"]), "   abc    ");
    }

    #[test]
    fn test_missing_columns_synthesized() {
        let mut table = TableModel::new(vec![ColumnDef::new(Align::Right, false)]);
        table.push_row(["1", " extra "]);
        assert_eq!(table.columns.len(), 2);
        assert_eq!(table.columns[1].align, Align::Left);
        assert!(!table.columns[1].expand);
        assert_eq!(table.columns[1].max_length, 5);
    }

    #[test]
    fn test_overflow_saturates() {
        let mut table = TableModel::new(vec![
            ColumnDef::new(Align::Left, false),
            ColumnDef::new(Align::Left, true),
        ]);
        table.push_row(["0123456789", "x"]);
        table.compute_layout(8);
        assert_eq!(table.columns[1].length, 0);
        // cell wider than its column is printed unpadded
        assert_eq!(table.render_row(&["0123456789", "x"]), "0123456789 x");
    }
}
