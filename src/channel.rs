//! Vim JSON channel host
//!
//! The highlighter runs as an editor job with stdin/stdout in JSON mode.
//! Every message is one JSON array per line:
//!
//! ```text
//! editor -> job   [id, {"command": "update"|"clear", "args": [...], "range": [l1, l2]}]
//! job -> editor   [id, "updated"|"cleared"|"skipped"|{"error": "..."}]
//! job -> editor   ["expr", expr, -n]          editor replies [-n, value]
//! job -> editor   ["call", func, args, -n]    editor replies [-n, value]
//! job -> editor   ["ex", command]
//! ```
//!
//! Requests that arrive while the job waits for a reply are queued.
//!
//! # Editor side
//!
//! The job only talks to Vim 8+ channels; `vim/` in this repository is the
//! runtime directory providing the other half:
//!
//! - `:HighlighterUpdate` and `:HighlighterClear` (`-nargs=* -range`) send
//!   `{"command": "update"|"clear", "args": [<f-args>], "range": [<line1>, <line2>]}`
//!   through `ch_evalexpr` to a job started as `ctags-highlighter serve`
//!   (override the program with `g:highlighter#program`).
//! - `highlighter#initialize()` takes no arguments and defines
//!   `g:highlighter#project_root_signs`, `g:highlighter#ctags_options` and
//!   `g:highlighter#syntax` when the user has not.
//! - `highlighter#update_highlight([commands, root, filetype])` executes the
//!   `" | "`-joined commands if `&filetype` still equals `filetype`.
//! - The buffer path comes from `expand('%:p')`, the filetype from `&filetype`.

use std::collections::VecDeque;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ConfigKey;
use crate::ctags::TagIndexer;
use crate::error::{HighlighterError, Result};
use crate::highlighter::{Outcome, Session};
use crate::host::Host;
use crate::syntax_command::CommandBatch;

/// Editor function defining the default `g:highlighter#*` variables
pub const INITIALIZE_FUNC: &str = "highlighter#initialize";
/// Editor function executing a rendered batch
pub const UPDATE_HIGHLIGHT_FUNC: &str = "highlighter#update_highlight";
/// Expression evaluating to the current buffer's full path
pub const BUFFER_PATH_EXPR: &str = "expand('%:p')";

/// Value the editor sends back when evaluation fails
const EVAL_ERROR: &str = "ERROR";

/// Editor-facing commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CommandName {
    Update,
    Clear,
}

/// A command request; `args` and `range` are accepted but unused
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Request {
    pub command: CommandName,
    #[serde(default)]
    pub args: Vec<Value>,
    #[serde(default)]
    pub range: Option<Value>,
}

pub struct ChannelHost<R: BufRead, W: Write> {
    reader: R,
    writer: W,
    next_id: i64,
    pending: VecDeque<(i64, Value)>,
}

impl<R: BufRead, W: Write> ChannelHost<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader,
            writer,
            next_id: -1,
            pending: VecDeque::new(),
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }

    /// Handle requests until the editor closes the channel
    pub fn serve<I: TagIndexer>(&mut self, session: &mut Session<I>) -> Result<()> {
        tracing::info!("Channel ready");

        while let Some((id, payload)) = self.next_request()? {
            let response = match serde_json::from_value::<Request>(payload) {
                Ok(request) => self.dispatch(session, request),
                Err(e) => {
                    tracing::warn!("Invalid request {}: {}", id, e);
                    json!({ "error": format!("invalid request: {}", e) })
                }
            };

            // Id 0 marks a message that expects no response
            if id > 0 {
                self.send(&json!([id, response]))?;
            }
        }

        tracing::info!("Channel closed");
        Ok(())
    }

    fn dispatch<I: TagIndexer>(&mut self, session: &mut Session<I>, request: Request) -> Value {
        tracing::debug!("Handling {:?}", request.command);

        let result = match request.command {
            CommandName::Update => session.update(self),
            CommandName::Clear => session.clear(self),
        };

        match result {
            Ok(Outcome::Updated(_)) => json!("updated"),
            Ok(Outcome::Cleared(_)) => json!("cleared"),
            Ok(Outcome::Skipped { .. }) => json!("skipped"),
            Err(e) => {
                tracing::error!("{:?} failed: {}", request.command, e);
                json!({ "error": e.to_string() })
            }
        }
    }

    fn next_request(&mut self) -> Result<Option<(i64, Value)>> {
        if let Some(request) = self.pending.pop_front() {
            return Ok(Some(request));
        }

        while let Some((id, payload)) = self.read_message()? {
            if id >= 0 {
                return Ok(Some((id, payload)));
            }
            tracing::warn!("Ignoring unexpected reply {}", id);
        }
        Ok(None)
    }

    fn read_message(&mut self) -> Result<Option<(i64, Value)>> {
        let mut line = String::new();
        loop {
            line.clear();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(None);
            }
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            match serde_json::from_str::<(i64, Value)>(trimmed) {
                Ok(message) => return Ok(Some(message)),
                Err(e) => tracing::warn!("Dropping malformed message {:?}: {}", trimmed, e),
            }
        }
    }

    fn send(&mut self, message: &Value) -> Result<()> {
        serde_json::to_writer(&mut self.writer, message)
            .map_err(|e| HighlighterError::Io(e.to_string()))?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Send a message carrying a fresh reply id and wait for that reply
    fn round_trip(&mut self, build: impl FnOnce(i64) -> Value) -> Result<Value> {
        let id = self.next_id;
        self.next_id -= 1;
        self.send(&build(id))?;

        loop {
            let Some((reply_id, payload)) = self.read_message()? else {
                return Err(HighlighterError::Host(
                    "channel closed while waiting for a reply".to_string(),
                ));
            };

            if reply_id == id {
                return match payload {
                    Value::String(s) if s == EVAL_ERROR => {
                        Err(HighlighterError::Host(format!("request {} failed", id)))
                    }
                    value => Ok(value),
                };
            }

            if reply_id >= 0 {
                self.pending.push_back((reply_id, payload));
            } else {
                tracing::warn!("Ignoring stale reply {} while waiting for {}", reply_id, id);
            }
        }
    }

    fn call(&mut self, func: &str, args: Value) -> Result<Value> {
        self.round_trip(|id| json!(["call", func, args, id]))
            .map_err(|e| HighlighterError::Host(format!("{}(): {}", func, e)))
    }
}

impl<R: BufRead, W: Write> Host for ChannelHost<R, W> {
    fn initialize(&mut self) -> Result<()> {
        self.call(INITIALIZE_FUNC, json!([]))?;
        Ok(())
    }

    fn get_config(&mut self, key: ConfigKey) -> Result<Value> {
        self.eval(key.vim_variable()).map_err(|e| match e {
            HighlighterError::Host(msg) => HighlighterError::config(key.vim_variable(), msg),
            other => other,
        })
    }

    fn eval(&mut self, expr: &str) -> Result<Value> {
        self.round_trip(|id| json!(["expr", expr, id]))
    }

    fn current_buffer_path(&mut self) -> Result<PathBuf> {
        match self.eval(BUFFER_PATH_EXPR)? {
            Value::String(path) => Ok(PathBuf::from(path)),
            other => Err(HighlighterError::Host(format!(
                "{} evaluated to {}",
                BUFFER_PATH_EXPR, other
            ))),
        }
    }

    fn run_batch(&mut self, batch: &CommandBatch) -> Result<()> {
        let args = json!([[
            batch.render(),
            batch.root.to_string_lossy(),
            batch.filetype
        ]]);
        self.call(UPDATE_HIGHLIGHT_FUNC, args)?;
        Ok(())
    }

    fn notify(&mut self, message: &str) -> Result<()> {
        let command = format!("echo '{}'", message.replace('\'', "''"));
        self.send(&json!(["ex", command]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ctags::{parse_tags, CtagsInvocation, TagsByKind};
    use std::io::Cursor;

    const AUTOLOAD_SCRIPT: &str = include_str!("../vim/autoload/highlighter.vim");
    const PLUGIN_SCRIPT: &str = include_str!("../vim/plugin/highlighter.vim");

    struct StaticIndexer(TagsByKind);

    impl TagIndexer for StaticIndexer {
        fn index(&self, _invocation: &CtagsInvocation) -> TagsByKind {
            self.0.clone()
        }
    }

    fn session() -> Session<StaticIndexer> {
        Session::new(StaticIndexer(parse_tags("foo\tx.c\t1\tf\n").unwrap()))
    }

    fn sent_messages(host: ChannelHost<Cursor<Vec<u8>>, Vec<u8>>) -> Vec<Value> {
        String::from_utf8(host.into_writer())
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }

    const SYNTAX: &str =
        r#"{"c":[{"hlgroup":"CFunc","tagkinds":"f","syntax_type":"keyword","syntax_ignore":"cComment"}]}"#;

    fn input(lines: &[&str]) -> Cursor<Vec<u8>> {
        Cursor::new(lines.join("\n").into_bytes())
    }

    #[test]
    fn test_update_round_trip() {
        let syntax_reply = format!("[-4,{}]", SYNTAX);
        let reader = input(&[
            r#"[1,{"command":"update","args":[],"range":[1,1]}]"#,
            "[-1,0]",
            "[-2,[]]",
            "[-3,[]]",
            syntax_reply.as_str(),
            r#"[-5,"c"]"#,
            r#"[-6,"/nonexistent/dir/x.c"]"#,
            "[-7,0]",
        ]);
        let mut host = ChannelHost::new(reader, Vec::new());
        let mut session = session();
        host.serve(&mut session).unwrap();
        assert!(session.is_initialized());

        let sent = sent_messages(host);
        assert_eq!(sent[0], json!(["call", INITIALIZE_FUNC, [], -1]));
        assert_eq!(sent[1], json!(["expr", "g:highlighter#project_root_signs", -2]));
        assert_eq!(sent[4], json!(["expr", "&filetype", -5]));
        assert_eq!(sent[5], json!(["expr", BUFFER_PATH_EXPR, -6]));
        assert_eq!(
            sent[6],
            json!([
                "call",
                UPDATE_HIGHLIGHT_FUNC,
                [[
                    "syntax clear CFunc | syntax keyword CFunc foo containedin=ALLBUT,cComment",
                    "/nonexistent/dir/x.c",
                    "c"
                ]],
                -7
            ])
        );
        assert_eq!(sent[7], json!(["ex", "echo 'Highlighter: updated'"]));
        assert_eq!(sent[8], json!([1, "updated"]));
        assert_eq!(sent.len(), 9);
    }

    #[test]
    fn test_request_during_wait_is_queued() {
        let syntax_reply = format!("[-4,{}]", SYNTAX);
        let reader = input(&[
            r#"[1,{"command":"update"}]"#,
            "[-1,0]",
            r#"[2,{"command":"clear"}]"#,
            "[-2,[]]",
            "[-3,[]]",
            syntax_reply.as_str(),
            r#"[-5,"c"]"#,
            r#"[-6,"/nonexistent/dir/x.c"]"#,
            "[-7,0]",
            r#"[-8,"c"]"#,
            r#"[-9,"/nonexistent/dir/x.c"]"#,
            "[-10,0]",
        ]);
        let mut host = ChannelHost::new(reader, Vec::new());
        host.serve(&mut session()).unwrap();

        let sent = sent_messages(host);
        assert_eq!(sent[8], json!([1, "updated"]));
        // The clear reuses the loaded config: no second initialize
        assert_eq!(sent[9], json!(["expr", "&filetype", -8]));
        assert_eq!(
            sent[11],
            json!([
                "call",
                UPDATE_HIGHLIGHT_FUNC,
                [["syntax clear CFunc", "/nonexistent/dir/x.c", "c"]],
                -10
            ])
        );
        assert_eq!(sent[12], json!(["ex", "echo 'Highlighter: cleared'"]));
        assert_eq!(sent[13], json!([2, "cleared"]));
    }

    #[test]
    fn test_eval_error_fails_request() {
        let reader = input(&[r#"[3,{"command":"clear"}]"#, "[-1,0]", r#"[-2,"ERROR"]"#]);
        let mut host = ChannelHost::new(reader, Vec::new());
        let mut session = session();
        host.serve(&mut session).unwrap();
        assert!(!session.is_initialized());

        let sent = sent_messages(host);
        let reply = sent.last().unwrap();
        assert_eq!(reply[0], json!(3));
        let error = reply[1]["error"].as_str().unwrap();
        assert!(error.contains("g:highlighter#project_root_signs"), "{}", error);
    }

    #[test]
    fn test_invalid_request_gets_error_reply() {
        let reader = input(&[r#"[4,{"command":"explode"}]"#, "not json", r#"[0,{"command":"bogus"}]"#]);
        let mut host = ChannelHost::new(reader, Vec::new());
        host.serve(&mut session()).unwrap();

        let sent = sent_messages(host);
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0][0], json!(4));
        assert!(sent[0][1]["error"].as_str().unwrap().contains("invalid request"));
    }

    #[test]
    fn test_notify_escapes_quotes() {
        let mut host = ChannelHost::new(input(&[]), Vec::new());
        host.notify("it's done").unwrap();
        assert_eq!(sent_messages(host), vec![json!(["ex", "echo 'it''s done'"])]);
    }

    #[test]
    fn test_closed_channel_while_waiting() {
        let mut host = ChannelHost::new(input(&[]), Vec::new());
        assert!(matches!(
            host.eval("&filetype"),
            Err(HighlighterError::Host(_))
        ));
    }

    // ========================================================================
    // Editor-side contract
    // ========================================================================

    #[test]
    fn test_runtime_defines_called_functions() {
        assert!(AUTOLOAD_SCRIPT.contains(&format!("function! {}() abort", INITIALIZE_FUNC)));
        assert!(AUTOLOAD_SCRIPT.contains(&format!("function! {}(args) abort", UPDATE_HIGHLIGHT_FUNC)));
        assert!(AUTOLOAD_SCRIPT.contains("let [l:commands, l:root, l:filetype] = a:args"));
        assert!(AUTOLOAD_SCRIPT.contains("job_start([l:program, 'serve'], {'mode': 'json'"));
        for key in ConfigKey::ALL {
            assert!(
                AUTOLOAD_SCRIPT.contains(&format!("let {} = ", key.vim_variable())),
                "{} has no default",
                key.vim_variable()
            );
        }
    }

    #[test]
    fn test_runtime_commands_send_requests() {
        for (command, name) in [("HighlighterUpdate", "update"), ("HighlighterClear", "clear")] {
            let line = PLUGIN_SCRIPT
                .lines()
                .find(|l| l.contains(&format!(" {} ", command)))
                .unwrap_or_else(|| panic!("{} is not defined", command));
            assert!(line.starts_with("command! -nargs=* -range "));
            assert!(line.contains(&format!(
                "highlighter#request('{}', [<f-args>], [<line1>, <line2>])",
                name
            )));
        }

        // The dictionary the script builds for `ch_evalexpr`
        let request: Request = serde_json::from_value(json!({
            "command": "clear", "args": ["x"], "range": [3, 7]
        }))
        .unwrap();
        assert_eq!(request.command, CommandName::Clear);
        assert!(AUTOLOAD_SCRIPT
            .contains("{'command': a:command, 'args': a:args, 'range': a:range}"));
    }
}
