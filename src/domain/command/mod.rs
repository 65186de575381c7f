//! Command dispatch rules

mod rules;

pub use rules::{CommandAction, CommandRule, CommandRules, ModeGuard, SessionMode};
