mod cli;
#[cfg(test)]
mod tests;

pub use cli::{display_events, parse_event_line, Args, Command};
