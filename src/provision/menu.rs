// SPDX-FileCopyrightText: 2025 Jason Pena <jasonpena@awkless.com>
// SPDX-License-Identifier: MIT

//! Interactive step menu.
//!
//! Used when `fitout provision` gets no step identifiers. The operator picks
//! a step by number, `a` for the whole catalogue, or `q` to quit. After each
//! pick the operator is asked whether to keep going.

use crate::provision::{system::System, Provisioner, RunReport, Selection, SelectionError, StepId};

use inquire::{Confirm, InquireError, Text};
use std::{fmt::Write, str::FromStr};
use tracing::warn;

/// One answer to the menu prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Step(StepId),
    All,
    Quit,
}

impl FromStr for MenuChoice {
    type Err = SelectionError;

    fn from_str(data: &str) -> Result<Self, Self::Err> {
        match data.trim().to_ascii_lowercase().as_str() {
            "a" | "all" => Ok(Self::All),
            "q" | "quit" => Ok(Self::Quit),
            ident => Ok(Self::Step(ident.parse()?)),
        }
    }
}

/// Render numbered catalogue.
pub fn render() -> String {
    let mut menu = String::new();
    for step in StepId::ALL {
        let _ = writeln!(
            menu,
            "{:>3}) {:<11} {}",
            step.position(),
            step.name(),
            step.description()
        );
    }
    let _ = writeln!(menu, "  a) all");
    let _ = write!(menu, "  q) quit");

    menu
}

/// Source of operator answers.
pub trait Prompter {
    /// Ask for a menu choice, `None` when the operator bails out.
    fn choose(&mut self, menu: &str) -> Result<Option<String>>;

    /// Ask whether to pick another step.
    fn confirm_continue(&mut self) -> Result<bool>;
}

/// Terminal prompts through inquire.
#[derive(Debug, Default)]
pub struct InquirePrompter;

impl Prompter for InquirePrompter {
    fn choose(&mut self, menu: &str) -> Result<Option<String>> {
        println!("{menu}");
        match Text::new("step:").prompt() {
            Ok(answer) => Ok(Some(answer)),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(None),
            Err(err) => Err(MenuError::Prompt(err)),
        }
    }

    fn confirm_continue(&mut self) -> Result<bool> {
        match Confirm::new("continue?").with_default(true).prompt() {
            Ok(answer) => Ok(answer),
            Err(InquireError::OperationCanceled | InquireError::OperationInterrupted) => Ok(false),
            Err(err) => Err(MenuError::Prompt(err)),
        }
    }
}

/// Drive the menu until the operator quits.
///
/// Reports of every pick are merged in the order the steps ran.
///
/// # Errors
///
/// - Return [`MenuError::Prompt`] if terminal prompt fails.
pub fn run<S>(provisioner: &Provisioner<S>, prompter: &mut impl Prompter) -> Result<RunReport>
where
    S: System,
{
    let menu = render();
    let mut report = RunReport::default();

    while let Some(answer) = prompter.choose(&menu)? {
        let selection = match answer.parse::<MenuChoice>() {
            Ok(MenuChoice::Quit) => break,
            Ok(MenuChoice::All) => Selection::all(),
            Ok(MenuChoice::Step(step)) => {
                let mut selection = Selection::default();
                selection.push(step);
                selection
            }
            Err(err) => {
                warn!("{err}");
                continue;
            }
        };

        report.results.extend(provisioner.run(&selection).results);
        if !prompter.confirm_continue()? {
            break;
        }
    }

    Ok(report)
}

/// Menu error types.
#[derive(Debug, thiserror::Error)]
pub enum MenuError {
    /// Terminal prompt failed.
    #[error(transparent)]
    Prompt(#[from] InquireError),
}

/// Friendly result alias :3
type Result<T, E = MenuError> = std::result::Result<T, E>;
