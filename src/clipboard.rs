use anyhow::{Context, Result};
use base64::{Engine as _, engine::general_purpose};
use std::io::Write;

pub trait Clipboard: Send {
    fn copy(&mut self, text: &str) -> Result<()>;
}

/// Copies through the terminal with an OSC 52 escape, which also works over SSH.
#[derive(Debug, Default)]
pub struct Osc52;

pub fn osc52_sequence(text: &str) -> String {
    format!(
        "\x1b]52;c;{}\x07",
        general_purpose::STANDARD.encode(text.as_bytes())
    )
}

impl Clipboard for Osc52 {
    fn copy(&mut self, text: &str) -> Result<()> {
        let mut stdout = std::io::stdout();
        stdout
            .write_all(osc52_sequence(text).as_bytes())
            .and_then(|_| stdout.flush())
            .context("Failed to write clipboard sequence")
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_osc52_sequence() {
        assert_eq!(osc52_sequence("Thanks!"), "\x1b]52;c;VGhhbmtzIQ==\x07");
    }
}
