//! System prompt assembly.

use chrono::{Local, NaiveDate};

/// Build the `<SYSTEM_CAPABILITY>` prompt describing the host.
pub fn system_capability(today: NaiveDate) -> String {
    format!(
        "<SYSTEM_CAPABILITY>\n\
         * You are utilizing a macOS environment using {arch}.\n\
         * You can use the computer tool to see the screen, move the mouse and type, the bash tool to run shell commands, and the str_replace_editor tool to view and edit files.\n\
         * Note: Command line function calls may have latency. Chain multiple operations into single requests where feasible.\n\
         * The current date is {date}.\n\
         </SYSTEM_CAPABILITY>",
        arch = std::env::consts::ARCH,
        date = today.format("%A, %B %-d, %Y"),
    )
}

/// The system prompt sent with every request.
///
/// `override_prompt` replaces the built-in capability text; a non-empty
/// `suffix` is appended after a single space.
pub fn build_system_prompt(suffix: &str, override_prompt: Option<&str>) -> String {
    let base = match override_prompt {
        Some(prompt) => prompt.to_string(),
        None => system_capability(Local::now().date_naive()),
    };
    if suffix.is_empty() {
        base
    } else {
        format!("{base} {suffix}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capability_mentions_arch_and_date() {
        let date = NaiveDate::from_ymd_opt(2024, 10, 22).unwrap();
        let prompt = system_capability(date);
        assert!(prompt.starts_with("<SYSTEM_CAPABILITY>"));
        assert!(prompt.ends_with("</SYSTEM_CAPABILITY>"));
        assert!(prompt.contains(std::env::consts::ARCH));
        assert!(prompt.contains("Tuesday, October 22, 2024"));
    }

    #[test]
    fn suffix_is_space_separated() {
        let prompt = build_system_prompt("Only use Safari.", Some("Base."));
        assert_eq!(prompt, "Base. Only use Safari.");
    }

    #[test]
    fn empty_suffix_leaves_prompt_untouched() {
        assert_eq!(build_system_prompt("", Some("Base.")), "Base.");
        assert!(build_system_prompt("", None).contains("SYSTEM_CAPABILITY"));
    }
}
