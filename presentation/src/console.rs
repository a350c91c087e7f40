//! Console output around the host front-end's own terminal stream.

use std::path::Path;

use colored::Colorize;
use conclave_application::ports::display::CouncilDisplay;
use conclave_domain::{Message, MessageType, ParticipantConfig};

/// Renders other participants' replies inline with the host front-end's
/// output. Blank lines around each reply keep it visually separate from
/// whatever the host is printing.
pub struct ConsoleDisplay;

impl CouncilDisplay for ConsoleDisplay {
    fn show_reply(&self, msg: &Message) {
        let tag = format!("[{}]", msg.from);
        let tag = match msg.kind {
            MessageType::System => tag.yellow().bold(),
            _ => tag.cyan().bold(),
        };
        println!("\n\n{} {}\n", tag, msg.content);
    }
}

/// Print the startup banner: session location, host command and the
/// participant roster.
pub fn print_banner(session_dir: &Path, host_command: &str, participants: &[ParticipantConfig]) {
    println!();
    println!("{}", "Conclave council starting".bold());
    println!();
    println!("{} {}", "Session:".cyan().bold(), session_dir.display());
    println!("{} {}", "Host:".cyan().bold(), host_command);
    if !participants.is_empty() {
        println!(
            "{} ({})",
            "Participants:".cyan().bold(),
            participants.len()
        );
        for participant in participants {
            println!("   - {} ({})", participant.name, participant.provider);
        }
    }
    println!();
    println!("{}", "━".repeat(40).dimmed());
    println!();
}
