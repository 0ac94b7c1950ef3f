pub use crate::error::Error;

pub use anstream::println;
pub use color_eyre::eyre::{eyre, Context, Result};
pub use std::format as f;

use colored::Colorize;

pub fn new_table() -> prettytable::Table {
    let mut table = prettytable::Table::new();

    let format = prettytable::format::FormatBuilder::new()
        .padding(1, 1)
        .build();

    table.set_format(format);

    table
}

/// Bold cyan header row for [`new_table`] output.
pub fn header_row(titles: &[&str]) -> prettytable::Row {
    prettytable::Row::new(
        titles
            .iter()
            .map(|title| prettytable::Cell::new(&title.bold().cyan().to_string()))
            .collect(),
    )
}
