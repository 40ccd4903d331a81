//! Output mode shared by the CLI commands.
//!
//! Snapshot rows have their own format flag (`--format jsonl|tsv`); this
//! module covers everything else a command prints: summaries, config
//! reports and failures.

use serde::Serialize;
use std::io::{self, Write};

/// Width of the label column in human key/value output.
const KV_LABEL_WIDTH: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

impl OutputMode {
    /// Returns `true` if JSON output was requested.
    pub const fn is_json(self) -> bool {
        matches!(self, Self::Json)
    }
}

/// Render a left-aligned key/value line in human output.
pub fn pretty_kv(w: &mut dyn Write, key: &str, value: impl AsRef<str>) -> io::Result<()> {
    writeln!(
        w,
        "{:<width$} {}",
        format!("{key}:"),
        value.as_ref(),
        width = KV_LABEL_WIDTH
    )
}

/// Write `value` as JSON or hand it to `human_fn`.
pub fn render<T: Serialize>(
    w: &mut dyn Write,
    mode: OutputMode,
    value: &T,
    human_fn: impl FnOnce(&T, &mut dyn Write) -> io::Result<()>,
) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            serde_json::to_writer_pretty(&mut *w, value)?;
            writeln!(w)?;
        }
        OutputMode::Human => human_fn(value, w)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kv_pads_label() {
        let mut buf = Vec::new();
        pretty_kv(&mut buf, "end_date", "2024-01-01").expect("write");
        let line = String::from_utf8(buf).expect("utf8");
        assert!(line.starts_with("end_date:"));
        assert!(line.ends_with(" 2024-01-01\n"));
    }

    #[test]
    fn json_mode_ignores_human_renderer() {
        let mut buf = Vec::new();
        render(&mut buf, OutputMode::Json, &json!({"ok": true}), |_, w| {
            writeln!(w, "human")
        })
        .expect("render");
        let value: serde_json::Value = serde_json::from_slice(&buf).expect("json");
        assert_eq!(value["ok"], true);
    }

    #[test]
    fn human_mode_uses_renderer() {
        let mut buf = Vec::new();
        render(&mut buf, OutputMode::Human, &json!({}), |_, w| writeln!(w, "human"))
            .expect("render");
        assert_eq!(String::from_utf8(buf).expect("utf8"), "human\n");
    }
}
