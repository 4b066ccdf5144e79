//! Terminal capability detection for inline image support
//!
//! Decides from environment signals alone whether the attached terminal speaks
//! the Kitty graphics protocol. Nothing is written to the terminal and nothing
//! is awaited, so an inconclusive environment resolves to `Unsupported`: a
//! capable terminal misdetected as unsupported still gets the text view, while
//! the reverse would paint escape garbage over the list.

use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use tracing::debug;

/// Inline graphics support of the attached terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminalCapability {
    /// No inline images, render the text fallback
    Unsupported,
    /// Kitty graphics protocol
    KittyProtocol,
}

impl TerminalCapability {
    pub fn supports_graphics(&self) -> bool {
        matches!(self, TerminalCapability::KittyProtocol)
    }
}

/// User preference for graphics, from config or `--graphics`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum GraphicsMode {
    /// Probe the environment
    #[default]
    Auto,
    /// Assume Kitty graphics support
    Kitty,
    /// Never send graphics
    None,
}

const TERM_PROGRAM: &str = "TERM_PROGRAM";
const TERM: &str = "TERM";

/// One piece of evidence the probe looks for
#[derive(Debug, Clone, Copy)]
enum Signal {
    /// `TERM_PROGRAM` equals the value exactly
    ProgramIs(&'static str),
    /// A terminal-specific session variable is set and non-empty
    VarSet(&'static str),
    /// `TERM` contains the substring, case-insensitive
    TermContains(&'static str),
}

impl Signal {
    fn matches(&self, env: &EnvSnapshot) -> bool {
        match self {
            Signal::ProgramIs(program) => env.get(TERM_PROGRAM) == Some(*program),
            Signal::VarSet(name) => env.get(name).is_some_and(|value| !value.is_empty()),
            Signal::TermContains(needle) => env
                .get(TERM)
                .is_some_and(|term| term.to_ascii_lowercase().contains(needle)),
        }
    }

    fn variable(&self) -> &'static str {
        match self {
            Signal::ProgramIs(_) => TERM_PROGRAM,
            Signal::VarSet(name) => *name,
            Signal::TermContains(_) => TERM,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Rule {
    signal: Signal,
    capability: TerminalCapability,
}

const fn kitty(signal: Signal) -> Rule {
    Rule {
        signal,
        capability: TerminalCapability::KittyProtocol,
    }
}

/// Evaluated top to bottom, first match wins
const RULES: &[Rule] = &[
    kitty(Signal::ProgramIs("kitty")),
    kitty(Signal::ProgramIs("WezTerm")),
    kitty(Signal::ProgramIs("ghostty")),
    kitty(Signal::VarSet("KITTY_WINDOW_ID")),
    kitty(Signal::VarSet("GHOSTTY_RESOURCES_DIR")),
    kitty(Signal::VarSet("WEZTERM_EXECUTABLE")),
    kitty(Signal::VarSet("KONSOLE_VERSION")),
    kitty(Signal::TermContains("kitty")),
    kitty(Signal::TermContains("ghostty")),
    kitty(Signal::TermContains("wezterm")),
];

/// The environment variables the probe consults, captured once
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    vars: HashMap<String, String>,
}

impl EnvSnapshot {
    /// Capture the relevant variables of the current process
    pub fn from_process() -> Self {
        let vars = RULES
            .iter()
            .map(|rule| rule.signal.variable())
            .filter_map(|name| env::var(name).ok().map(|value| (name.to_string(), value)))
            .collect();
        Self { vars }
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            vars: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.vars.get(name).map(String::as_str)
    }
}

/// Terminal capability detector
pub struct CapabilityDetector {
    env: EnvSnapshot,
}

impl CapabilityDetector {
    /// Detector over the current process environment
    pub fn new() -> Self {
        Self::with_env(EnvSnapshot::from_process())
    }

    pub fn with_env(env: EnvSnapshot) -> Self {
        Self { env }
    }

    /// Detect terminal graphics capability from the environment
    pub fn detect(&self) -> TerminalCapability {
        match RULES.iter().find(|rule| rule.signal.matches(&self.env)) {
            Some(rule) => {
                debug!(signal = ?rule.signal, "Graphics capability matched");
                rule.capability
            }
            None => {
                debug!("No graphics signal in environment, using text fallback");
                TerminalCapability::Unsupported
            }
        }
    }

    /// Apply an explicit mode, probing only for `Auto`
    pub fn resolve(&self, mode: GraphicsMode) -> TerminalCapability {
        match mode {
            GraphicsMode::Kitty => TerminalCapability::KittyProtocol,
            GraphicsMode::None => TerminalCapability::Unsupported,
            GraphicsMode::Auto => self.detect(),
        }
    }
}

impl Default for CapabilityDetector {
    fn default() -> Self {
        Self::new()
    }
}

/// User-facing note shown in place of an inline image
pub fn fallback_notice() -> &'static str {
    "Inline images need a terminal with the Kitty graphics protocol (kitty, WezTerm, Ghostty, Konsole)."
}
