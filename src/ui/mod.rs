pub mod login;
pub mod views;

use std::io::{self, BufRead, Write};

/// Print `prompt` and read one trimmed line from stdin.
pub fn prompt_line(prompt: &str) -> io::Result<String> {
    let mut out = io::stdout();
    write!(out, "{prompt}")?;
    out.flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}

/// Yes/no question on the terminal; anything but `y`/`yes` declines.
pub fn confirm_on_terminal(prompt: &str) -> bool {
    match prompt_line(&format!("{prompt} [y/N] ")) {
        Ok(answer) => matches!(answer.to_lowercase().as_str(), "y" | "yes"),
        Err(_) => false,
    }
}
