//! Reminder message rendering

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use eventhub_domain::constants::DEFAULT_RECIPIENT_NAME;
use eventhub_domain::Event;

use super::ports::ReminderMessage;

/// Subject line for an event reminder.
pub fn subject(event: &Event) -> String {
    format!("Reminder: Your event \"{}\" starts tomorrow!", event.title)
}

/// Start date in the reader's zone, e.g. `Sunday, March 2, 2031, 06:30 PM`.
pub fn format_start(start: DateTime<Utc>, zone: Tz) -> String {
    start.with_timezone(&zone).format("%A, %B %-d, %Y, %I:%M %p").to_string()
}

/// Render the reminder for the event's organizer. `None` without an e-mail.
pub fn render(event: &Event, app_url: &str, zone: Tz) -> Option<ReminderMessage> {
    let to_email = event.organizer_email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
    let organizer = Some(event.organizer_name.trim()).filter(|n| !n.is_empty());
    let date = format_start(event.start_date, zone);
    let subject = subject(event);

    let mut lines = vec![
        format!("Hi {}!", organizer.unwrap_or("there")),
        String::new(),
        format!(
            "This is a friendly reminder that your event \"{}\" is starting tomorrow ({date}).",
            event.title
        ),
        String::new(),
        "Event Details:".to_string(),
        format!("- Date: {date}"),
        format!("- Location: {}", event.location()),
    ];
    if let Some(description) = event.description.as_deref().filter(|d| !d.trim().is_empty()) {
        lines.push(format!("- Description: {description}"));
    }
    lines.push(String::new());
    lines.push("Make sure everything is ready for your event!".to_string());

    let link = format!("{}/events/{}", app_url.trim_end_matches('/'), event.id);
    let body = lines.iter().map(|l| escape_html(l)).collect::<Vec<_>>().join("<br>\n");
    let html = format!(
        "<html><body style=\"font-family:Arial,sans-serif\">\
         <h2>{title}</h2>\n<p>{body}</p>\n\
         <p><a href=\"{href}\" style=\"padding:10px 18px;background:#2563eb;color:#fff;\
         text-decoration:none;border-radius:6px\">View Event</a></p>\
         </body></html>",
        title = escape_html(&subject),
        href = escape_html(&link),
    );

    Some(ReminderMessage {
        to_email: to_email.to_string(),
        to_name: organizer.unwrap_or(DEFAULT_RECIPIENT_NAME).to_string(),
        subject,
        html,
    })
}

fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
