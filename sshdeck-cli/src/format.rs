//! Text table rendering for listings.

use std::fmt::Write as _;

/// A table rendered with box-drawing borders
pub struct Table {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Creates a table with the given column headers
    pub fn new<I, S>(headers: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            headers: headers.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Appends a row; missing cells render empty, extra cells are dropped
    pub fn push_row<I, S>(&mut self, cells: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut row: Vec<String> = cells.into_iter().map(Into::into).collect();
        row.resize(self.headers.len(), String::new());
        self.rows.push(row);
    }

    fn widths(&self) -> Vec<usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                self.rows
                    .iter()
                    .map(|row| display_width(&row[i]))
                    .chain(std::iter::once(display_width(header)))
                    .max()
                    .unwrap_or(0)
            })
            .collect()
    }

    /// Renders the table
    #[must_use]
    pub fn render(&self) -> String {
        let widths = self.widths();
        let mut output = String::new();

        let _ = writeln!(output, "{}", border(&widths, '╒', '═', '╤', '╕'));
        let _ = writeln!(output, "{}", line(&self.headers, &widths));
        let _ = writeln!(output, "{}", border(&widths, '╞', '═', '╪', '╡'));
        for (i, row) in self.rows.iter().enumerate() {
            if i > 0 {
                let _ = writeln!(output, "{}", border(&widths, '├', '─', '┼', '┤'));
            }
            let _ = writeln!(output, "{}", line(row, &widths));
        }
        let _ = write!(output, "{}", border(&widths, '╘', '═', '╧', '╛'));
        output
    }
}

fn display_width(text: &str) -> usize {
    text.chars().count()
}

fn border(widths: &[usize], left: char, fill: char, join: char, right: char) -> String {
    let segments: Vec<String> = widths
        .iter()
        .map(|w| fill.to_string().repeat(w + 2))
        .collect();
    format!("{left}{}{right}", segments.join(&join.to_string()))
}

fn line(cells: &[String], widths: &[usize]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| {
            let pad = width - display_width(cell);
            format!(" {cell}{} ", " ".repeat(pad))
        })
        .collect();
    format!("│{}│", padded.join("│"))
}

/// Masks a secret for display
#[must_use]
pub fn mask(secret: &str, reveal: bool) -> String {
    if reveal {
        secret.to_string()
    } else {
        "********".to_string()
    }
}
