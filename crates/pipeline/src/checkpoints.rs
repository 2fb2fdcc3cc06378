use dialoguer::{Confirm, Input};
use std::fmt;
use tracing::debug;

/// A point where a human may look at intermediate output or skip a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Checkpoint<'a> {
    PreviewPages,
    PreviewChunks,
    ProcessChunk { chunk_id: &'a str },
    ShowExtraction,
    SaveDocument,
    PushGraph,
}

impl fmt::Display for Checkpoint<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Checkpoint::PreviewPages => f.write_str("Preview first pages?"),
            Checkpoint::PreviewChunks => f.write_str("Preview first chunks?"),
            Checkpoint::ProcessChunk { chunk_id } => write!(f, "Process {}?", chunk_id),
            Checkpoint::ShowExtraction => f.write_str("Show extracted JSON?"),
            Checkpoint::SaveDocument => f.write_str("Save to document store?"),
            Checkpoint::PushGraph => f.write_str("Push to graph?"),
        }
    }
}

/// Gates the pipeline consults. Declining skips exactly the gated step.
pub trait Checkpoints: Send + Sync {
    fn confirm(&self, checkpoint: Checkpoint<'_>) -> bool;

    /// Present intermediate output
    fn show(&self, text: &str);

    fn pause(&self);
}

/// Non-interactive runs: every gate proceeds and nothing is shown.
pub struct AlwaysProceed;

impl Checkpoints for AlwaysProceed {
    fn confirm(&self, _checkpoint: Checkpoint<'_>) -> bool {
        true
    }

    fn show(&self, _text: &str) {}

    fn pause(&self) {}
}

/// Asks on the terminal; an unreadable terminal counts as the default (yes).
pub struct TerminalCheckpoints;

impl Checkpoints for TerminalCheckpoints {
    fn confirm(&self, checkpoint: Checkpoint<'_>) -> bool {
        Confirm::new()
            .with_prompt(checkpoint.to_string())
            .default(true)
            .interact()
            .unwrap_or_else(|e| {
                debug!(error = %e, "Prompt failed, proceeding");
                true
            })
    }

    fn show(&self, text: &str) {
        println!("{}", text);
    }

    fn pause(&self) {
        let _ = Input::<String>::new()
            .with_prompt("Press Enter to continue")
            .allow_empty(true)
            .interact_text();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompts() {
        assert_eq!(
            Checkpoint::ProcessChunk { chunk_id: "chunk_4" }.to_string(),
            "Process chunk_4?"
        );
        assert_eq!(Checkpoint::PushGraph.to_string(), "Push to graph?");
    }

    #[test]
    fn test_always_proceed() {
        let gate = AlwaysProceed;
        assert!(gate.confirm(Checkpoint::PreviewPages));
        assert!(gate.confirm(Checkpoint::ProcessChunk { chunk_id: "chunk_0" }));
        assert!(gate.confirm(Checkpoint::SaveDocument));
    }
}
