/// Shared text helpers for reports and code generators
use crate::utils::errors::Pl0Result;

/// Append one formatted line to a report buffer
pub fn write_line(buf: &mut String, args: std::fmt::Arguments) -> Pl0Result<()> {
    use std::fmt::Write;
    buf.write_fmt(args)?;
    buf.push('\n');
    Ok(())
}

/// Underlined section heading used by the text reports
pub fn heading(buf: &mut String, title: &str) {
    buf.push_str(title);
    buf.push('\n');
    buf.push_str(&"=".repeat(title.len()));
    buf.push('\n');
}
