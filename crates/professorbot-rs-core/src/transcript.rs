//! Plain-text transcript export.

use crate::error::CoreError;
use crate::types::Message;
use chrono::{DateTime, Local};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Separator placed between message blocks.
pub const BLOCK_SEPARATOR: &str = "\n---\n";

/// Rendered transcript ready to be written to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    pub file_name: String,
    pub contents: String,
}

impl Transcript {
    pub fn new(messages: &[Message], exported_at: DateTime<Local>) -> Self {
        Self {
            file_name: file_name(exported_at),
            contents: render(messages),
        }
    }

    /// Write the transcript into `dir`, creating it when missing.
    pub fn write_to(&self, dir: &Path) -> Result<PathBuf, CoreError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(&self.file_name);
        fs::write(&path, self.contents.as_bytes())?;
        info!(
            "transcript written (path={}, bytes={})",
            path.display(),
            self.contents.len()
        );
        Ok(path)
    }
}

/// Render each message as `ROLE:\n<content>\n`, joined by [`BLOCK_SEPARATOR`].
pub fn render(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|message| {
            format!(
                "{}:\n{}\n",
                message.role.as_str().to_uppercase(),
                message.content
            )
        })
        .collect::<Vec<_>>()
        .join(BLOCK_SEPARATOR)
}

/// `transcript_YYYYMMDD_HHMMSS.txt`.
pub fn file_name(exported_at: DateTime<Local>) -> String {
    format!("transcript_{}.txt", exported_at.format("%Y%m%d_%H%M%S"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    #[test]
    fn renders_uppercase_role_blocks() {
        let messages = vec![
            Message::assistant("Hi — I’m ProfessorBot."),
            Message::user("12345678"),
        ];
        assert_eq!(
            render(&messages),
            "ASSISTANT:\nHi — I’m ProfessorBot.\n\n---\nUSER:\n12345678\n"
        );
    }

    #[test]
    fn empty_conversation_renders_empty_text() {
        assert_eq!(render(&[]), "");
    }

    #[test]
    fn file_name_has_second_resolution() {
        let at = Local
            .with_ymd_and_hms(2026, 3, 4, 9, 5, 7)
            .single()
            .expect("unambiguous time");
        assert_eq!(file_name(at), "transcript_20260304_090507.txt");
    }

    #[test]
    fn writes_into_missing_directory() {
        let root = tempdir().expect("root");
        let dir = root.path().join("exports");
        let transcript = Transcript::new(&[Message::user("done")], Local::now());
        let path = transcript.write_to(&dir).expect("write");
        assert_eq!(path, dir.join(&transcript.file_name));
        assert_eq!(fs::read_to_string(path).expect("read"), "USER:\ndone\n");
    }
}
