// Surface command language parser

pub mod command;
pub mod lexer;

pub use command::{parse_command, parse_commands, SurfaceCommand};

/// Parse a full input line, turning nom's error into a message for the prompt.
pub fn parse_line(input: &str) -> Result<Vec<SurfaceCommand>, String> {
    match parse_commands(input) {
        Ok((_, commands)) => Ok(commands),
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => {
            let at = e.input.trim();
            if at.is_empty() {
                Err("unexpected end of input".to_string())
            } else {
                let near: String = at.chars().take(24).collect();
                Err(format!("cannot parse command near '{}'", near))
            }
        }
        Err(nom::Err::Incomplete(_)) => Err("incomplete command".to_string()),
    }
}
