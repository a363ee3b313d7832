//! Table module.
//!
//! Tables fit the terminal width: cells marked as shrinkable are cut
//! with an ellipsis when the table overflows.

use anyhow::{Context, Result};
use log::trace;
use termcolor::{Color, ColorSpec};
use terminal_size::terminal_size;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::printer::{Print, PrintTableOpts, WriteColor};

/// Width used when the terminal size is unknown.
pub const DEFAULT_TERM_WIDTH: usize = 80;

/// Width under which a shrinkable cell is never cut.
pub const MAX_SHRINK_WIDTH: usize = 5;

/// Chars dropped from cell values: line breaks, tabs and emoji
/// variation selectors.
const STRIPPED_CHARS: [char; 5] = ['\r', '\n', '\t', '\u{fe0e}', '\u{fe0f}'];

/// A styled table cell.
#[derive(Debug, Default)]
pub struct Cell {
    style: ColorSpec,
    value: String,
    /// Whether the cell is cut when the table overflows.
    shrinkable: bool,
}

impl Cell {
    pub fn new<T: AsRef<str>>(value: T) -> Self {
        Self {
            value: value.as_ref().replace(&STRIPPED_CHARS[..], ""),
            ..Self::default()
        }
    }

    pub fn unicode_width(&self) -> usize {
        UnicodeWidthStr::width(self.value.as_str())
    }

    pub fn shrinkable(mut self) -> Self {
        self.shrinkable = true;
        self
    }

    pub fn is_shrinkable(&self) -> bool {
        self.shrinkable
    }

    pub fn bold(mut self) -> Self {
        self.style.set_bold(true);
        self
    }

    pub fn underline(mut self) -> Self {
        self.style.set_underline(true);
        self
    }

    fn fg(mut self, color: Color) -> Self {
        self.style.set_fg(Some(color));
        self
    }

    pub fn red(self) -> Self {
        self.fg(Color::Red)
    }

    pub fn green(self) -> Self {
        self.fg(Color::Green)
    }

    pub fn yellow(self) -> Self {
        self.fg(Color::Yellow)
    }

    pub fn blue(self) -> Self {
        self.fg(Color::Blue)
    }

    pub fn white(self) -> Self {
        self.fg(Color::White)
    }

    /// Colors the cell with a 256-color palette code.
    pub fn ansi_256(self, code: u8) -> Self {
        self.fg(Color::Ansi256(code))
    }
}

impl Print for Cell {
    fn print(&self, writer: &mut dyn WriteColor) -> Result<()> {
        writer
            .set_color(&self.style)
            .with_context(|| format!("cannot style cell {:?}", self.value))?;
        write!(writer, "{}", self.value)
            .with_context(|| format!("cannot print cell {:?}", self.value))?;
        Ok(writer.reset()?)
    }
}

/// A table row, made of cells.
#[derive(Debug, Default)]
pub struct Row(pub Vec<Cell>);

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cell(mut self, cell: Cell) -> Self {
        self.0.push(cell);
        self
    }
}

/// Something printable as a table, one row per item.
pub trait Table: Sized {
    fn head() -> Row;

    fn row(&self) -> Row;

    /// Writes the table to the writer.
    ///
    /// Shrinkable cells are cut when the table is wider than the given
    /// max width, or than the terminal.
    fn print(writer: &mut dyn WriteColor, items: &[Self], opts: PrintTableOpts) -> Result<()> {
        let max_width = opts
            .max_width
            .or_else(|| terminal_size().map(|(w, _)| w.0 as usize))
            .unwrap_or(DEFAULT_TERM_WIDTH);

        let mut rows = vec![Self::head()];
        rows.extend(items.iter().map(Self::row));

        let widths = column_widths(&rows);
        let table_width = widths.iter().sum::<usize>() + widths.len() * 2 - 1;
        let overflow = table_width.saturating_sub(max_width);
        trace!("column widths {widths:?}, table width {table_width}, overflow {overflow}");

        for row in rows.iter_mut() {
            for (i, cell) in row.0.iter_mut().enumerate() {
                if i > 0 {
                    Cell::new("│").ansi_256(8).print(writer)?;
                }

                if overflow > 0 && cell.is_shrinkable() {
                    let width = if overflow + MAX_SHRINK_WIDTH < widths[i] {
                        widths[i] - overflow
                    } else {
                        MAX_SHRINK_WIDTH
                    };
                    cell.shrink_to(width);
                } else {
                    cell.pad_to(widths[i]);
                }

                cell.print(writer)?;
            }
            writeln!(writer)?;
        }

        Ok(())
    }
}

fn column_widths(rows: &[Row]) -> Vec<usize> {
    let mut widths = Vec::new();

    for row in rows {
        for (i, cell) in row.0.iter().enumerate() {
            match widths.get_mut(i) {
                Some(width) => *width = cell.unicode_width().max(*width),
                None => widths.push(cell.unicode_width()),
            }
        }
    }

    widths
}

impl Cell {
    /// Pads the value with spaces up to the given width, plus one
    /// trailing space.
    fn pad_to(&mut self, width: usize) {
        let spaces = width.saturating_sub(self.unicode_width()) + 1;
        self.value.push_str(&" ".repeat(spaces));
    }

    /// Cuts the value so that it fits the given width, ending with an
    /// ellipsis.
    fn shrink_to(&mut self, width: usize) {
        if self.unicode_width() <= width {
            return self.pad_to(width);
        }

        let mut value = String::new();
        let mut value_width = 0;

        for c in self.value.chars() {
            let char_width = UnicodeWidthChar::width(c).unwrap_or(0);
            if value_width + char_width >= width {
                break;
            }
            value_width += char_width;
            value.push(c);
        }

        trace!("shrinking {:?} to {value:?}", self.value);
        value.push_str("… ");
        value.push_str(&" ".repeat(width - value_width - 1));
        self.value = value;
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use std::io;

    use crate::{
        activity::FailedRecords,
        printer::PrintTable,
        recipient::Member,
        report::{DeliveryStatus, TraceRecord},
    };

    use super::*;

    #[derive(Debug, Default)]
    struct StringWriter {
        content: String,
    }

    impl io::Write for StringWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.content
                .push_str(&String::from_utf8(buf.to_vec()).unwrap());
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl termcolor::WriteColor for StringWriter {
        fn supports_color(&self) -> bool {
            false
        }

        fn set_color(&mut self, _spec: &ColorSpec) -> io::Result<()> {
            Ok(())
        }

        fn reset(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl WriteColor for StringWriter {}

    fn member(name: &str, address: &str, kind: Option<&str>) -> Member {
        Member {
            address: address.into(),
            display_name: name.into(),
            kind: kind.map(String::from),
        }
    }

    fn members() -> Vec<Member> {
        vec![
            member("Alice", "alice@localhost", Some("User")),
            member("Bob Smith", "bob@localhost", None),
            member("😍 Fans 😍", "fans@localhost", Some("Group")),
        ]
    }

    fn failed(minute: u32, sender: &str, subject: &str, status: DeliveryStatus) -> TraceRecord {
        TraceRecord {
            timestamp: Utc.with_ymd_and_hms(2024, 6, 1, 10, minute, 0).unwrap(),
            sender: sender.into(),
            recipient: "team@localhost".into(),
            subject: subject.into(),
            delivery_status: status,
            message_id: None,
            size: None,
        }
    }

    fn print_members(members: &[Member], max_width: usize) -> String {
        let mut writer = StringWriter::default();
        Table::print(
            &mut writer,
            members,
            PrintTableOpts {
                max_width: Some(max_width),
            },
        )
        .unwrap();
        writer.content
    }

    #[test]
    fn members_fit_the_width() {
        let expected = concat![
            "NAME      │ADDRESS         │TYPE \n",
            "Alice     │alice@localhost │User \n",
            "Bob Smith │bob@localhost   │     \n",
        ];
        assert_eq!(expected, print_members(&members()[..2], 80));
    }

    #[test]
    fn members_names_shrink() {
        let expected = concat![
            "NAME    │ADDRESS         │TYPE  \n",
            "Alice   │alice@localhost │User  \n",
            "Bob Sm… │bob@localhost   │      \n",
            "😍 Fan… │fans@localhost  │Group \n",
        ];
        assert_eq!(expected, print_members(&members(), 32));
    }

    #[test]
    fn members_names_shrink_to_the_minimum() {
        let expected = concat![
            "NAME  │ADDRESS         │TYPE  \n",
            "Alice │alice@localhost │User  \n",
            "Bob … │bob@localhost   │      \n",
            "😍 F… │fans@localhost  │Group \n",
        ];
        assert_eq!(expected, print_members(&members(), 10));
    }

    #[test]
    fn failed_records_with_hidden_ones() {
        let records = vec![
            failed(0, "a@localhost", "Weekly sync", DeliveryStatus::Failed),
            failed(
                30,
                "b@localhost",
                "Re: weekly sync\tnotes",
                DeliveryStatus::Quarantined,
            ),
        ];

        let mut writer = StringWriter::default();
        FailedRecords {
            records: &records,
            hidden: 3,
        }
        .print_table(
            &mut writer,
            PrintTableOpts {
                max_width: Some(60),
            },
        )
        .unwrap();

        let expected = concat![
            "DATE             │SENDER      │SUBJECT         │STATUS      \n",
            "2024-06-01 10:00 │a@localhost │Weekly sync     │Failed      \n",
            "2024-06-01 10:30 │b@localhost │Re: weekly syn… │Quarantined \n",
            "… and 3 more\n",
        ];
        assert_eq!(expected, writer.content);
    }
}
