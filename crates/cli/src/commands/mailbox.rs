//! `deskpilot send` and `deskpilot inbox`.

use deskpilot_core::queue::MailMessage;

use super::{CmdResult, load_config};

pub async fn send(sender: &str, recipient: &str, content: &str) -> CmdResult {
    let config = load_config()?;
    let queue = deskpilot_queue::build_from_config(&config).await?;
    let message = queue.send_message(content, sender, recipient).await?;
    println!("Sent message {} from {} to {}", message.id, message.sender, message.recipient);
    Ok(())
}

pub async fn inbox(recipient: Option<String>, mark_read: bool) -> CmdResult {
    let config = load_config()?;
    let recipient = recipient.unwrap_or_else(|| config.queue.recipient.clone());
    let queue = deskpilot_queue::build_from_config(&config).await?;

    let messages = if mark_read {
        queue.mark_all_as_read(&recipient).await?
    } else {
        queue.get_unread_messages(&recipient).await?
    };

    if messages.is_empty() {
        println!("No unread messages for {recipient}.");
        return Ok(());
    }

    println!("Unread messages for {recipient}:");
    for message in &messages {
        println!("{}", format_message(message));
    }
    if mark_read {
        println!("\nMarked {} message(s) as read.", messages.len());
    }
    Ok(())
}

fn format_message(message: &MailMessage) -> String {
    format!(
        "  [{}] {}: {}",
        message.created_at.format("%Y-%m-%d %H:%M"),
        message.sender,
        message.content
    )
}
