//! Declarative keyword rules evaluated before the cache protocol

use crate::domain::intent::IntentLabel;

/// What a matched rule asks the orchestrator to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandAction {
    ShowHelp,
    EnableUncensored,
    DisableUncensored,
    StartSimulation,
    StopSimulation,
}

/// Session state a rule is evaluated against
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionMode {
    pub simulation: bool,
    pub uncensored: bool,
}

/// Mode in which a rule is eligible
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModeGuard {
    Any,
    OutsideSimulation,
    InSimulation,
    Censored,
    Uncensored,
}

impl ModeGuard {
    fn allows(self, mode: SessionMode) -> bool {
        match self {
            ModeGuard::Any => true,
            ModeGuard::OutsideSimulation => !mode.simulation,
            ModeGuard::InSimulation => mode.simulation,
            ModeGuard::Censored => !mode.uncensored,
            ModeGuard::Uncensored => mode.uncensored,
        }
    }
}

/// A rule matches when every keyword group has a keyword mentioned in the label
#[derive(Debug, Clone)]
pub struct CommandRule {
    pub action: CommandAction,
    pub guard: ModeGuard,
    pub keyword_groups: &'static [&'static [&'static str]],
}

impl CommandRule {
    pub fn matches(&self, intent: &IntentLabel, mode: SessionMode) -> bool {
        self.guard.allows(mode)
            && self
                .keyword_groups
                .iter()
                .all(|group| group.iter().any(|keyword| intent.mentions(keyword)))
    }
}

const SIMULATION_TARGETS: &[&str] = &["attack", "test", "simul"];

// "censor" is a substring of "uncensor"; the persona guards keep the two apart.
const DEFAULT_RULES: &[CommandRule] = &[
    CommandRule {
        action: CommandAction::ShowHelp,
        guard: ModeGuard::Any,
        keyword_groups: &[&["help"]],
    },
    CommandRule {
        action: CommandAction::EnableUncensored,
        guard: ModeGuard::Censored,
        keyword_groups: &[&["uncensor"]],
    },
    CommandRule {
        action: CommandAction::DisableUncensored,
        guard: ModeGuard::Uncensored,
        keyword_groups: &[&["censor"]],
    },
    CommandRule {
        action: CommandAction::StartSimulation,
        guard: ModeGuard::OutsideSimulation,
        keyword_groups: &[&["start", "run", "simul"], SIMULATION_TARGETS],
    },
    CommandRule {
        action: CommandAction::StopSimulation,
        guard: ModeGuard::InSimulation,
        keyword_groups: &[&["stop", "close"], SIMULATION_TARGETS],
    },
];

/// Ordered rule table; the first matching rule wins
#[derive(Debug, Clone)]
pub struct CommandRules {
    rules: Vec<CommandRule>,
}

impl Default for CommandRules {
    fn default() -> Self {
        Self {
            rules: DEFAULT_RULES.to_vec(),
        }
    }
}

impl CommandRules {
    /// No rules at all; every query goes straight to the cache protocol
    pub fn empty() -> Self {
        Self { rules: Vec::new() }
    }

    pub fn evaluate(&self, intent: &IntentLabel, mode: SessionMode) -> Option<CommandAction> {
        self.rules
            .iter()
            .find(|rule| rule.matches(intent, mode))
            .map(|rule| rule.action)
    }
}
