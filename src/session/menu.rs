//! Interactive game menu

use crate::error::{FrontrunnerError, FrontrunnerResult};
use crate::sequencer::interval_from_secs;

use colored::Colorize;
use std::io::{BufRead, Write};

/// Menu choices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    Automatic,
    Manual,
    Exit,
}

/// Parse a menu selection by number or name
pub fn parse_mode(input: &str) -> Option<GameMode> {
    match input.trim().to_lowercase().as_str() {
        "1" | "a" | "auto" | "automatic" => Some(GameMode::Automatic),
        "2" | "m" | "manual" => Some(GameMode::Manual),
        "3" | "e" | "q" | "exit" | "quit" => Some(GameMode::Exit),
        _ => None,
    }
}

/// Parse an attempt count; blank input selects `default`
pub fn parse_attempts(input: &str, default: u64) -> FrontrunnerResult<u64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }

    match input.parse::<i64>() {
        Ok(n) if n > 0 => Ok(n as u64),
        _ => Err(FrontrunnerError::Config(format!(
            "attempts must be a positive whole number, got `{}`",
            input
        ))),
    }
}

/// Parse an interval in seconds; blank input selects `default`
pub fn parse_interval(input: &str, default: f64) -> FrontrunnerResult<f64> {
    let input = input.trim();
    if input.is_empty() {
        return Ok(default);
    }

    let secs = input.parse::<f64>().map_err(|_| {
        FrontrunnerError::Config(format!(
            "interval must be a positive number of seconds, got `{}`",
            input
        ))
    })?;
    interval_from_secs(secs)?;
    Ok(secs)
}

/// Line-oriented prompt over any reader/writer pair
pub struct Menu<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Menu<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Run a blocking prompt on the blocking pool and hand the menu back
    pub async fn ask<T, F>(mut self, prompt: F) -> FrontrunnerResult<(Self, T)>
    where
        R: Send + 'static,
        W: Send + 'static,
        T: Send + 'static,
        F: FnOnce(&mut Self) -> FrontrunnerResult<T> + Send + 'static,
    {
        tokio::task::spawn_blocking(move || -> FrontrunnerResult<(Self, T)> {
            let answer = prompt(&mut self)?;
            Ok((self, answer))
        })
        .await
        .map_err(|e| FrontrunnerError::Internal(format!("Prompt task failed: {}", e)))?
    }

    /// Ask for a game mode until a valid one is given. End of input means exit.
    pub fn select_mode(&mut self) -> FrontrunnerResult<GameMode> {
        loop {
            writeln!(self.output, "\n{}", "🎮 SELECT GAME MODE:".cyan()).map_err(io_error)?;
            writeln!(self.output, "  1) 🤖 Automatic Mode").map_err(io_error)?;
            writeln!(self.output, "  2) 🎯 Manual Mode").map_err(io_error)?;
            writeln!(self.output, "  3) 🚪 Exit Game").map_err(io_error)?;

            let Some(line) = self.prompt("> ")? else {
                return Ok(GameMode::Exit);
            };

            match parse_mode(&line) {
                Some(mode) => return Ok(mode),
                None => {
                    writeln!(self.output, "{}", "Please choose 1, 2 or 3".red()).map_err(io_error)?
                }
            }
        }
    }

    /// Ask for attempt count and interval, re-prompting on invalid input
    pub fn manual_settings(
        &mut self,
        default_attempts: u64,
        default_interval: f64,
    ) -> FrontrunnerResult<(u64, f64)> {
        let attempts = loop {
            let question = format!(
                "Enter number of attempts (press Enter for default {}): ",
                default_attempts
            );
            let line = self.prompt(&question)?.unwrap_or_default();
            match parse_attempts(&line, default_attempts) {
                Ok(attempts) => break attempts,
                Err(_) => self.reject()?,
            }
        };

        let interval = loop {
            let question = format!(
                "Enter interval in seconds (press Enter for default {}): ",
                default_interval
            );
            let line = self.prompt(&question)?.unwrap_or_default();
            match parse_interval(&line, default_interval) {
                Ok(interval) => break interval,
                Err(_) => self.reject()?,
            }
        };

        Ok((attempts, interval))
    }

    /// Print `question` and read one line; `None` at end of input
    fn prompt(&mut self, question: &str) -> FrontrunnerResult<Option<String>> {
        write!(self.output, "{}", question.cyan()).map_err(io_error)?;
        self.output.flush().map_err(io_error)?;

        let mut line = String::new();
        let read = self.input.read_line(&mut line).map_err(io_error)?;
        if read == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn reject(&mut self) -> FrontrunnerResult<()> {
        writeln!(
            self.output,
            "{}",
            "Please enter a valid positive number".red()
        )
        .map_err(io_error)
    }
}

fn io_error(e: std::io::Error) -> FrontrunnerError {
    FrontrunnerError::Internal(format!("Terminal I/O failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn menu(input: &str) -> Menu<Cursor<Vec<u8>>, Vec<u8>> {
        Menu::new(Cursor::new(input.as_bytes().to_vec()), Vec::new())
    }

    #[test]
    fn test_parse_mode() {
        assert_eq!(parse_mode("1"), Some(GameMode::Automatic));
        assert_eq!(parse_mode(" Manual "), Some(GameMode::Manual));
        assert_eq!(parse_mode("3"), Some(GameMode::Exit));
        assert_eq!(parse_mode("4"), None);
    }

    #[test]
    fn test_parse_attempts() {
        assert_eq!(parse_attempts("", 10_000_000).unwrap(), 10_000_000);
        assert_eq!(parse_attempts("25", 10).unwrap(), 25);
        assert!(matches!(parse_attempts("0", 10), Err(FrontrunnerError::Config(_))));
        assert!(matches!(parse_attempts("-1", 10), Err(FrontrunnerError::Config(_))));
        assert!(parse_attempts("many", 10).is_err());
    }

    #[test]
    fn test_parse_interval() {
        assert_eq!(parse_interval("", 1.0).unwrap(), 1.0);
        assert_eq!(parse_interval("0.25", 1.0).unwrap(), 0.25);
        assert!(matches!(parse_interval("0", 1.0), Err(FrontrunnerError::Config(_))));
        assert!(parse_interval("-2", 1.0).is_err());
        assert!(parse_interval("inf", 1.0).is_err());
        assert!(matches!(parse_interval("1e20", 1.0), Err(FrontrunnerError::Config(_))));
    }

    #[test]
    fn test_select_mode_reprompts_on_invalid_choice() {
        let mut menu = menu("9\n2\n");
        assert_eq!(menu.select_mode().unwrap(), GameMode::Manual);

        let output = String::from_utf8(menu.output).unwrap();
        assert!(output.contains("Please choose 1, 2 or 3"));
    }

    #[test]
    fn test_select_mode_end_of_input_exits() {
        assert_eq!(menu("").select_mode().unwrap(), GameMode::Exit);
    }

    #[test]
    fn test_manual_settings_defaults() {
        let mut menu = menu("\n\n");
        assert_eq!(menu.manual_settings(10_000_000, 1.0).unwrap(), (10_000_000, 1.0));
    }

    #[test]
    fn test_manual_settings_reprompts() {
        let mut menu = menu("-1\n5\nabc\n1e20\n0.5\n");
        assert_eq!(menu.manual_settings(100, 1.0).unwrap(), (5, 0.5));

        let output = String::from_utf8(menu.output).unwrap();
        assert_eq!(output.matches("Please enter a valid positive number").count(), 3);
    }

    #[tokio::test]
    async fn test_ask_runs_prompts_off_the_runtime() {
        let menu = menu("2\n12\n\n");
        let (menu, mode) = menu.ask(|m| m.select_mode()).await.unwrap();
        assert_eq!(mode, GameMode::Manual);

        let (_, settings) = menu
            .ask(|m| m.manual_settings(100, 1.0))
            .await
            .unwrap();
        assert_eq!(settings, (12, 1.0));
    }
}
