//! Command implementations
//!
//! Each command writes to the supplied writer and returns the process exit
//! code; errors bubble up to `main` which maps them with
//! [`crate::errors::exit_code_for`].

use crate::cli::{Cli, Commands};
use crate::errors::{EXIT_DISPATCH_DENIED, EXIT_GENERAL_ERROR, EXIT_INVOCATION_MISUSE, EXIT_SUCCESS};
use crate::logging::{AuditEntry, AuditLog};
use crate::output::{self, Painter};
use crate::resolver::{KnownLocationResolver, LocationResolver};
use anyhow::{Context, Result};
use flashguard_common::{
    Capabilities, DispatchGate, EvidenceProvider, EvidenceStore, FlashGuardConfig,
    FlashGuardError, StatusBoard, ToolResponse,
};
use serde_json::{json, Value};
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

/// Evidence table from a file, or the embedded reference table
pub fn load_evidence(path: Option<&Path>) -> Result<EvidenceStore> {
    match path {
        Some(path) => {
            let store = EvidenceStore::load(path)
                .with_context(|| format!("failed to load evidence table {}", path.display()))?;
            info!(path = %path.display(), locations = store.locations().len(), "evidence table loaded");
            Ok(store)
        }
        None => {
            debug!("using embedded reference evidence table");
            EvidenceStore::reference().context("embedded reference evidence table is invalid")
        }
    }
}

/// Everything a command needs for one invocation
pub struct Session {
    capabilities: Capabilities<EvidenceStore>,
    board: StatusBoard,
    audit: AuditLog,
    painter: Painter,
    json: bool,
}

impl Session {
    pub fn new(
        capabilities: Capabilities<EvidenceStore>,
        audit: AuditLog,
        painter: Painter,
        json: bool,
    ) -> Self {
        Self {
            capabilities,
            board: StatusBoard::new(),
            audit,
            painter,
            json,
        }
    }

    /// Build a session from parsed flags and loaded config
    pub fn from_config(cli: &Cli, config: &FlashGuardConfig) -> Result<Self> {
        let table = cli.table.as_deref().or(config.evidence.table_path.as_deref());
        let evidence = load_evidence(table)?;
        let thresholds = config.thresholds().context("invalid [arbiter] thresholds")?;
        let capabilities =
            Capabilities::with_gate(evidence, DispatchGate::with_thresholds(thresholds));
        let audit = AuditLog::discover(cli.audit_log.as_deref(), config.audit.log_path.as_deref());

        Ok(Self::new(
            capabilities,
            audit,
            Painter::for_mode(config.output.color),
            cli.json,
        ))
    }

    pub fn capabilities(&self) -> &Capabilities<EvidenceStore> {
        &self.capabilities
    }

    pub fn board(&self) -> &StatusBoard {
        &self.board
    }

    pub fn execute(&self, command: &Commands, out: &mut dyn Write) -> Result<i32> {
        match command {
            Commands::Check { location } => self.check(location, out),
            Commands::Signal { location } => self.signal(location, out),
            Commands::Dispatch {
                location,
                action_plan,
            } => self.dispatch(location, action_plan, out),
            Commands::Ask { text } => self.ask(&text.join(" "), out),
            Commands::Tool { name, args } => self.tool(name, args, out),
            Commands::Locations => self.locations(out),
        }
    }

    fn check(&self, location: &str, out: &mut dyn Write) -> Result<i32> {
        let resp = self.capabilities.check_primary_truth(location);
        if self.json {
            writeln!(out, "{}", resp.to_json_string())?;
        } else {
            write!(out, "{}", output::render_primary(&resp, &self.painter))?;
        }
        Ok(EXIT_SUCCESS)
    }

    fn signal(&self, location: &str, out: &mut dyn Write) -> Result<i32> {
        let resp = self.capabilities.check_secondary_signal(location);
        if self.json {
            writeln!(out, "{}", resp.to_json_string())?;
        } else {
            write!(out, "{}", output::render_signal(&resp, &self.painter))?;
        }
        Ok(EXIT_SUCCESS)
    }

    fn dispatch(&self, location: &str, action_plan: &str, out: &mut dyn Write) -> Result<i32> {
        let (outcome, resp) = self
            .capabilities
            .request_dispatch_outcome(location, action_plan)?;

        self.audit
            .record(&AuditEntry::from_outcome(&outcome, self.capabilities.evidence()));
        self.board.record_dispatch(&outcome);

        if self.json {
            writeln!(out, "{}", resp.to_json_string())?;
        } else {
            write!(out, "{}", output::render_dispatch(&resp, &self.painter))?;
        }

        Ok(if outcome.authorized() {
            EXIT_SUCCESS
        } else {
            EXIT_DISPATCH_DENIED
        })
    }

    fn ask(&self, text: &str, out: &mut dyn Write) -> Result<i32> {
        let evidence = self.capabilities.evidence();
        let resolver = KnownLocationResolver::from_provider(evidence);
        let location = resolver.resolve(text);
        debug!(query = text, resolved = ?location, "free-text location");

        let snapshot = self.board.observe(
            location.as_deref(),
            evidence,
            self.capabilities.gate().thresholds(),
        );
        let primary = location
            .as_deref()
            .map(|loc| self.capabilities.check_primary_truth(loc));
        let signal = location
            .as_deref()
            .map(|loc| self.capabilities.check_secondary_signal(loc));

        if self.json {
            let doc = json!({
                "query": text,
                "location": location,
                "board": snapshot,
                "primary_truth": primary.map(ToolResponse::into_value),
                "secondary_signal": signal.map(ToolResponse::into_value),
            });
            writeln!(out, "{}", serde_json::to_string_pretty(&doc)?)?;
        } else {
            write!(out, "{}", output::render_board(&snapshot, &self.painter))?;
            match (&primary, &signal) {
                (Some(primary), Some(signal)) => {
                    write!(out, "{}", output::render_primary(primary, &self.painter))?;
                    write!(out, "{}", output::render_signal(signal, &self.painter))?;
                }
                _ => writeln!(
                    out,
                    "No known location in \"{}\". Known locations: {}",
                    text,
                    resolver.ids().join(", ")
                )?,
            }
        }

        Ok(if location.is_some() {
            EXIT_SUCCESS
        } else {
            EXIT_GENERAL_ERROR
        })
    }

    fn tool(&self, name: &str, args: &str, out: &mut dyn Write) -> Result<i32> {
        let args: Value =
            serde_json::from_str(args).map_err(|e| FlashGuardError::InvalidArguments {
                operation: name.to_string(),
                reason: format!("arguments are not valid JSON: {}", e),
            })?;

        let resp = self.capabilities.router().invoke(name, &args);
        writeln!(out, "{}", resp.to_json_string())?;

        Ok(if resp.ok {
            EXIT_SUCCESS
        } else if resp.payload.get("error_code").is_some() {
            EXIT_INVOCATION_MISUSE
        } else {
            EXIT_DISPATCH_DENIED
        })
    }

    fn locations(&self, out: &mut dyn Write) -> Result<i32> {
        let evidence = self.capabilities.evidence();
        if self.json {
            let rows: Vec<Value> = evidence
                .locations()
                .into_iter()
                .map(|loc| {
                    json!({
                        "primary": evidence.primary(&loc).is_some(),
                        "secondary": evidence.secondary(&loc).is_some(),
                        "citizen": evidence.social(&loc).is_some(),
                        "location": loc,
                    })
                })
                .collect();
            writeln!(out, "{}", serde_json::to_string_pretty(&rows)?)?;
        } else {
            write!(out, "{}", output::render_locations(evidence, &self.painter))?;
        }
        Ok(EXIT_SUCCESS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::exit_code_for;

    fn session(json: bool) -> Session {
        Session::new(
            Capabilities::new(EvidenceStore::reference().unwrap()),
            AuditLog::default(),
            Painter::plain(),
            json,
        )
    }

    fn run(session: &Session, command: Commands) -> (i32, String) {
        let mut buf = Vec::new();
        let code = session.execute(&command, &mut buf).unwrap();
        (code, String::from_utf8(buf).unwrap())
    }

    #[test]
    fn test_dispatch_exit_codes() {
        let s = session(false);
        let (code, text) = run(
            &s,
            Commands::Dispatch {
                location: "Bulacan".into(),
                action_plan: "Evacuate".into(),
            },
        );
        assert_eq!(code, EXIT_SUCCESS);
        assert!(text.contains("SUCCESS"));

        let (code, _) = run(
            &s,
            Commands::Dispatch {
                location: "Marikina".into(),
                action_plan: "Evacuate".into(),
            },
        );
        assert_eq!(code, EXIT_DISPATCH_DENIED);
    }

    #[test]
    fn test_dispatch_misuse_is_error() {
        let s = session(false);
        let mut buf = Vec::new();
        let err = s
            .execute(
                &Commands::Dispatch {
                    location: " ".into(),
                    action_plan: "Evacuate".into(),
                },
                &mut buf,
            )
            .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INVOCATION_MISUSE);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_ask_updates_board() {
        let s = session(false);
        let (code, text) = run(
            &s,
            Commands::Ask {
                text: vec!["check".into(), "bulacan".into()],
            },
        );
        assert_eq!(code, EXIT_SUCCESS);
        assert!(text.contains("[STATUS BOARD]"));
        assert_eq!(s.board().snapshot().location.as_deref(), Some("Bulacan"));
    }

    #[test]
    fn test_ask_unresolved() {
        let s = session(true);
        let (code, text) = run(
            &s,
            Commands::Ask {
                text: vec!["random".into()],
            },
        );
        assert_eq!(code, EXIT_GENERAL_ERROR);
        let doc: Value = serde_json::from_str(&text).unwrap();
        assert!(doc["location"].is_null());
        assert_eq!(doc["board"]["state"], "READY");
    }

    #[test]
    fn test_dispatch_after_ask_lands_on_board() {
        let s = session(false);
        run(&s, Commands::Ask { text: vec!["Pasig".into()] });
        run(
            &s,
            Commands::Dispatch {
                location: "Pasig".into(),
                action_plan: "Evacuate".into(),
            },
        );
        assert_eq!(
            s.board().snapshot().last_dispatch,
            Some(flashguard_common::DispatchState::ArbiterBlocked)
        );
    }

    #[test]
    fn test_tool_exit_codes() {
        let s = session(true);
        let (code, text) = run(
            &s,
            Commands::Tool {
                name: "check_primary_truth".into(),
                args: r#"{"location": "Bulacan"}"#.into(),
            },
        );
        assert_eq!(code, EXIT_SUCCESS);
        assert!(text.contains("Angat River"));

        let (code, _) = run(
            &s,
            Commands::Tool {
                name: "request_dispatch".into(),
                args: r#"{"location": "Rizal", "action_plan": "Evacuate"}"#.into(),
            },
        );
        assert_eq!(code, EXIT_DISPATCH_DENIED);

        let (code, _) = run(
            &s,
            Commands::Tool {
                name: "launch".into(),
                args: "{}".into(),
            },
        );
        assert_eq!(code, EXIT_INVOCATION_MISUSE);
    }

    #[test]
    fn test_tool_rejects_bad_json() {
        let s = session(true);
        let mut buf = Vec::new();
        let err = s
            .execute(
                &Commands::Tool {
                    name: "check_primary_truth".into(),
                    args: "{not json".into(),
                },
                &mut buf,
            )
            .unwrap_err();
        assert_eq!(exit_code_for(&err), EXIT_INVOCATION_MISUSE);
    }

    #[test]
    fn test_locations_json() {
        let (code, text) = run(&session(true), Commands::Locations);
        assert_eq!(code, EXIT_SUCCESS);
        let rows: Vec<Value> = serde_json::from_str(&text).unwrap();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0]["location"], "Bulacan");
    }

    #[test]
    fn test_load_evidence_missing_file() {
        let err = load_evidence(Some(Path::new("/nonexistent/table.toml"))).unwrap_err();
        assert!(format!("{:#}", err).contains("failed to load evidence table"));
    }
}
