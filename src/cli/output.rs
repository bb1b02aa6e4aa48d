//! Terminal output for the skillmix commands
//!
//! Colors follow NO_COLOR, CLICOLOR and CLICOLOR_FORCE through `colored`.

use std::fmt::Display;

use colored::Colorize;

const FIELD_WIDTH: usize = 20;

pub fn error(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

pub fn warning(msg: &(impl Display + ?Sized)) {
    eprintln!("{}: {}", "warning".yellow(), msg);
}

/// Green check line, used when a dimension validates cleanly or a file is created.
pub fn success(msg: &(impl Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// One validation issue, indented under its dimension header.
pub fn failure(msg: &(impl Display + ?Sized)) {
    println!("  {} {}", "✗".red(), msg);
}

pub fn action(label: &str, msg: &(impl Display + ?Sized)) {
    println!("{}: {}", label.green(), msg);
}

/// Framework title or section name.
pub fn header(msg: &(impl Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Indented `label value` row with the label padded to a fixed column.
/// Empty values print as a dimmed dash.
pub fn field(label: &str, value: &(impl Display + ?Sized)) {
    let value = value.to_string();
    if value.is_empty() {
        println!("  {:<FIELD_WIDTH$} {}", label, "-".dimmed());
    } else {
        println!("  {:<FIELD_WIDTH$} {}", label, value);
    }
}

/// Rendered views and HTML go through unchanged.
pub fn info(msg: &(impl Display + ?Sized)) {
    println!("{}", msg);
}
