// Colored terminal output for segment previews and send summaries.
//
// main.rs delegates all formatting here so the commands stay small.

use colored::Colorize;

use crate::broadcast::OutboundMessage;
use crate::db::models::Recipient;
use crate::pipeline::BroadcastOutcome;
use crate::segment::{SegmentFilter, TimeFilter};

/// Display a resolved segment: header, the first `limit` rows, and the total.
pub fn display_segment(
    filter: SegmentFilter,
    time_filter: Option<TimeFilter>,
    recipients: &[Recipient],
    limit: usize,
) {
    let window = match time_filter {
        Some(t) => format!("signed up {}+ days ago", t.days),
        None => "any signup date".to_string(),
    };
    println!(
        "\n{}",
        format!("=== Segment: {filter} ({window}) ===").bold()
    );

    if recipients.is_empty() {
        println!("\n  {}", "No users found.".yellow());
        return;
    }

    println!();
    println!(
        "  {:>4}  {:<36} {:<16} {:<12}  {}",
        "#".dimmed(),
        "Email".dimmed(),
        "Name".dimmed(),
        "Signed up".dimmed(),
        "Referral".dimmed(),
    );
    println!("  {}", "-".repeat(84).dimmed());

    for (i, r) in recipients.iter().take(limit).enumerate() {
        let name = r.first_name.as_deref().unwrap_or("-");
        let referral = if r.referral_id.is_some() {
            "yes".green()
        } else {
            "none".dimmed()
        };
        println!(
            "  {:>4}. {:<36} {:<16} {:<12}  {}",
            i + 1,
            super::truncate_chars(&r.email, 33),
            super::truncate_chars(name, 13),
            r.created_at.format("%Y-%m-%d"),
            referral,
        );
    }

    if recipients.len() > limit {
        println!(
            "  {}",
            format!("... and {} more", recipients.len() - limit).dimmed()
        );
    }

    println!();
    println!("  {} {} recipients", "→".cyan(), recipients.len());
}

/// Show the first composed message so the operator sees what goes out.
pub fn display_message_sample(message: &OutboundMessage) {
    println!("\n{}", "=== Sample message ===".bold());
    println!("  From:    {}", message.from);
    println!("  To:      {}", message.to);
    println!("  Subject: {}", message.subject.bold());
    for block in &message.body.blocks {
        let content = super::truncate_chars(block.content(), 60);
        match block.link() {
            Some(link) => println!("  [{}] {content} → {}", block.kind(), link.cyan()),
            None => println!("  [{}] {content}", block.kind()),
        }
    }
}

/// Display the result of a broadcast run.
pub fn display_send_summary(outcome: &BroadcastOutcome, provider: &str) {
    match outcome {
        BroadcastOutcome::NoRecipients => {
            println!("\n{} {}", "~".yellow(), outcome.message());
        }
        BroadcastOutcome::Sent(result) => {
            println!("\n{} {}", "✓".green().bold(), outcome.message());
            println!("  Provider: {provider}");
            if let Some(ids) = result.batch_data["data"].as_array() {
                println!("  Acknowledged: {} message ids", ids.len());
            }
        }
    }
}
