//! Welcome banner display for chat sessions.

use console::style;

/// Print the banner shown when a chat session starts.
pub fn print_welcome_banner(provider: &str, model: Option<&str>, user_type: &str, session_id: &str) {
    println!();
    println!(
        "  {} {}",
        style("*").cyan().bold(),
        style("Parley").cyan().bold()
    );
    println!();
    match model {
        Some(model) => println!(
            "  {}     {} {}",
            style("Model:").bold(),
            style(model).dim(),
            style(format!("({provider})")).dim()
        ),
        None => println!(
            "  {}     {}",
            style("Model:").bold(),
            style(format!("{provider} (not configured, using fallback replies)")).yellow()
        ),
    }
    println!("  {}      {}", style("Role:").bold(), style(user_type).dim());
    println!(
        "  {}   {}",
        style("Session:").bold(),
        style(short_id(session_id)).dim()
    );
    println!();
    println!(
        "  {}",
        style("Type /help for commands, Ctrl+D to exit").dim()
    );
    println!("  {}", style("---").dim());
    println!();
}

/// First eight characters of a session id, on a char boundary.
pub fn short_id(session_id: &str) -> &str {
    match session_id.char_indices().nth(8) {
        Some((idx, _)) => &session_id[..idx],
        None => session_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0192f0a1-aaaa-bbbb"), "0192f0a1");
        assert_eq!(short_id("abc"), "abc");
        assert_eq!(short_id("ééééééééé"), "éééééééé");
    }
}
