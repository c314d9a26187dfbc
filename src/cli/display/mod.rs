//! Display helpers shared by command output.

pub mod table;

use console::{style, StyledObject};

pub use table::{list_table, render_list};

use crate::domain::models::MigrationState;

/// Style a migration state for terminal output.
///
/// Applied = green, Pending = yellow, Missing = red bold.
pub fn colorize_state(state: MigrationState) -> StyledObject<&'static str> {
    let label = state.as_str();
    match state {
        MigrationState::Applied => style(label).green(),
        MigrationState::Pending => style(label).yellow(),
        MigrationState::Missing => style(label).red().bold(),
    }
}

/// Render a success action result.
pub fn action_success(message: &str) -> String {
    format!("{} {}", style("\u{2713}").green().bold(), message)
}
