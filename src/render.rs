//! Output rendering for chat runs.
//!
//! The final JSON document goes to stdout so it can be piped; everything else (session
//! details, informational lines and errors) goes to stderr.

use std::io::{self, Stderr, Stdout, Write};

use crate::{Error, QueryOutput, Result, Session};

/// ANSI escape code for dim text (used for informational lines).
const ANSI_DIM: &str = "\x1b[2m";

/// ANSI escape code to reset all styling.
const ANSI_RESET: &str = "\x1b[0m";

/// ANSI escape code for cyan text (used for metadata keys).
const ANSI_CYAN: &str = "\x1b[36m";

/// ANSI escape code for green text (used for session creation).
const ANSI_GREEN: &str = "\x1b[32m";

/// ANSI escape code for red text (used for errors).
const ANSI_RED: &str = "\x1b[31m";

/// Trait for rendering the outcome of a chat run.
pub trait Renderer: Send {
    /// Print the session that was created.
    fn print_session(&mut self, session: &Session);

    /// Print the final output of the query.
    fn print_output(&mut self, output: &QueryOutput) -> Result<()>;

    /// Print an error message.
    fn print_error(&mut self, error: &str);

    /// Print an informational message.
    fn print_info(&mut self, info: &str);
}

/// Plain text renderer with optional ANSI styling.
pub struct PlainTextRenderer<O = Stdout, E = Stderr> {
    out: O,
    err: E,
    use_color: bool,
}

impl PlainTextRenderer {
    /// Creates a new PlainTextRenderer on stdio with ANSI colors enabled.
    pub fn new() -> Self {
        Self::with_color(true)
    }

    /// Creates a new PlainTextRenderer on stdio with specified color setting.
    pub fn with_color(use_color: bool) -> Self {
        Self::with_writers(io::stdout(), io::stderr(), use_color)
    }
}

impl Default for PlainTextRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Write + Send, E: Write + Send> PlainTextRenderer<O, E> {
    /// Creates a renderer writing results to `out` and diagnostics to `err`.
    pub fn with_writers(out: O, err: E, use_color: bool) -> Self {
        Self {
            out,
            err,
            use_color,
        }
    }

    /// Consumes the renderer, returning its writers.
    pub fn into_writers(self) -> (O, E) {
        (self.out, self.err)
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_color {
            format!("{color}{text}{ANSI_RESET}")
        } else {
            text.to_string()
        }
    }

    // Diagnostics are best-effort; a closed stderr must not fail the run.
    fn diagnostic(&mut self, line: &str) {
        let _ = writeln!(self.err, "{line}");
        let _ = self.err.flush();
    }
}

impl<O: Write + Send, E: Write + Send> Renderer for PlainTextRenderer<O, E> {
    fn print_session(&mut self, session: &Session) {
        let line = self.paint(
            ANSI_GREEN,
            &format!("Chat session created. Session ID: {}", session.id()),
        );
        self.diagnostic(&line);
        if session.context_metadata().is_empty() {
            return;
        }
        self.diagnostic("Context Metadata:");
        for field in session.context_metadata() {
            let key = self.paint(ANSI_CYAN, &field.key);
            self.diagnostic(&format!("  {key}: {}", field.value));
        }
    }

    fn print_output(&mut self, output: &QueryOutput) -> Result<()> {
        let heading = self.paint(ANSI_DIM, "Final response (with contextMetadata appended):");
        self.diagnostic(&heading);
        let json = output.to_pretty_json()?;
        writeln!(self.out, "{json}")
            .and_then(|()| self.out.flush())
            .map_err(|e| Error::output(format!("could not write result: {e}"), e))
    }

    fn print_error(&mut self, error: &str) {
        let line = self.paint(ANSI_RED, &format!("error: {error}"));
        self.diagnostic(&line);
    }

    fn print_info(&mut self, info: &str) {
        let line = self.paint(ANSI_DIM, info);
        self.diagnostic(&line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ContextField, FinalResult, SyncResponse};
    use serde_json::json;

    fn buffered(use_color: bool) -> PlainTextRenderer<Vec<u8>, Vec<u8>> {
        PlainTextRenderer::with_writers(Vec::new(), Vec::new(), use_color)
    }

    fn text(bytes: Vec<u8>) -> String {
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn renderer_default_has_color() {
        let renderer = PlainTextRenderer::new();
        assert!(renderer.use_color);
    }

    #[test]
    fn renderer_without_color() {
        let renderer = PlainTextRenderer::with_color(false);
        assert!(!renderer.use_color);
    }

    #[test]
    fn session_goes_to_stderr() {
        let mut renderer = buffered(false);
        let session = Session::new(
            "S1",
            vec![ContextField::new("userId", "1"), ContextField::new("name", "John")],
        );
        renderer.print_session(&session);
        let (out, err) = renderer.into_writers();
        assert!(out.is_empty());
        assert_eq!(
            text(err),
            "Chat session created. Session ID: S1\nContext Metadata:\n  userId: 1\n  name: John\n"
        );
    }

    #[test]
    fn session_without_metadata() {
        let mut renderer = buffered(false);
        renderer.print_session(&Session::new("S1", vec![]));
        let (_, err) = renderer.into_writers();
        assert_eq!(text(err), "Chat session created. Session ID: S1\n");
    }

    #[test]
    fn output_goes_to_stdout() {
        let mut renderer = buffered(false);
        let output = QueryOutput::Sync(SyncResponse::from(json!({"data": {"answer": "hi"}})));
        renderer.print_output(&output).unwrap();
        let (out, err) = renderer.into_writers();
        let printed: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(printed, json!({"data": {"answer": "hi"}}));
        assert!(text(err).starts_with("Final response"));
    }

    #[test]
    fn stream_output_is_indented_json() {
        let mut renderer = buffered(false);
        let output = QueryOutput::Stream(FinalResult::new(
            "S1".to_string(),
            "M1".to_string(),
            "Hello".to_string(),
            None,
            vec![],
        ));
        renderer.print_output(&output).unwrap();
        let (out, _) = renderer.into_writers();
        let out = text(out);
        assert!(out.contains("\n  \"message\": \"Chat query submitted successfully\""));
        assert!(out.contains("\"metrics\": null"));
    }

    /// A writer whose reader has gone away.
    struct ClosedPipe;

    impl Write for ClosedPipe {
        fn write(&mut self, _: &[u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::BrokenPipe, "reader closed"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn failed_output_write_is_not_a_configuration_error() {
        let mut renderer = PlainTextRenderer::with_writers(ClosedPipe, Vec::new(), false);
        let output = QueryOutput::Sync(SyncResponse::from(json!({"data": {"answer": "hi"}})));
        let err = renderer.print_output(&output).unwrap_err();
        assert!(err.is_output());
        assert!(!err.is_configuration());
        assert_eq!(err.exit_code(), crate::error::EXIT_OUTPUT);
    }

    #[test]
    fn colors_only_when_enabled() {
        let mut plain = buffered(false);
        plain.print_error("boom");
        let (_, err) = plain.into_writers();
        assert_eq!(text(err), "error: boom\n");

        let mut colored = buffered(true);
        colored.print_error("boom");
        let (_, err) = colored.into_writers();
        assert_eq!(text(err), format!("{ANSI_RED}error: boom{ANSI_RESET}\n"));
    }
}
