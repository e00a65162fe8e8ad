use console::style;

/// Styling helpers for diagnostics written to stderr.
pub fn yellow_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).for_stderr().yellow().bold()
}

pub fn red_bold(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).for_stderr().red().bold()
}

pub fn dim(text: impl std::fmt::Display) -> console::StyledObject<String> {
    style(text.to_string()).for_stderr().dim()
}
