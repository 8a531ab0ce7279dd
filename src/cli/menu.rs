// file: src/cli/menu.rs
// version: 1.0.0
// guid: 7a52d0c8-9e41-4b36-85f7-c2d90a64e813

//! Interactive menu shown when no subcommand is given on a terminal

use crate::{ProvisionError, Result};
use colored::Colorize;
use std::io::Write;

/// Menu selection, options 1-5
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    Install,
    Uninstall,
    Update,
    Help,
    Exit,
}

/// Print the menu and read one choice from stdin
pub fn prompt() -> Result<MenuChoice> {
    println!("{}", "incus-provision".bold());
    println!("  1) Install");
    println!("  2) Uninstall");
    println!("  3) Update");
    println!("  4) Help");
    println!("  5) Exit");
    print!("Choice [1-5]: ");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    parse_choice(&line)
        .ok_or_else(|| ProvisionError::invalid_argument(format!("menu choice `{}`", line.trim())))
}

/// Parse a menu answer; anything but 1-5 is invalid
pub fn parse_choice(input: &str) -> Option<MenuChoice> {
    match input.trim() {
        "1" => Some(MenuChoice::Install),
        "2" => Some(MenuChoice::Uninstall),
        "3" => Some(MenuChoice::Update),
        "4" => Some(MenuChoice::Help),
        "5" => Some(MenuChoice::Exit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_choices() {
        assert_eq!(parse_choice("1"), Some(MenuChoice::Install));
        assert_eq!(parse_choice("2"), Some(MenuChoice::Uninstall));
        assert_eq!(parse_choice("3"), Some(MenuChoice::Update));
        assert_eq!(parse_choice("4"), Some(MenuChoice::Help));
        assert_eq!(parse_choice("5"), Some(MenuChoice::Exit));
    }

    #[test]
    fn test_whitespace_is_tolerated() {
        assert_eq!(parse_choice(" 3 \n"), Some(MenuChoice::Update));
    }

    #[test]
    fn test_invalid_choices() {
        for input in ["", "0", "6", "install", "12", "one"] {
            assert_eq!(parse_choice(input), None, "input={:?}", input);
        }
    }
}
