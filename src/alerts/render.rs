//! Email subject and body rendering

use chrono::{DateTime, Utc};

use super::config::AlertEvent;
use crate::monitor::Monitor;

const STYLE: &str = "body { font-family: Arial, sans-serif; line-height: 1.6; color: #333; max-width: 600px; margin: 0 auto; padding: 20px; } \
.header { color: white; padding: 20px; border-radius: 8px 8px 0 0; text-align: center; } \
.content { background: #f9f9f9; padding: 20px; border-radius: 0 0 8px 8px; border: 1px solid #ddd; } \
.monitor-info { background: white; padding: 15px; border-radius: 5px; margin: 15px 0; } \
.footer { margin-top: 20px; font-size: 12px; color: #666; text-align: center; }";

pub fn subject(event: AlertEvent, monitor: &Monitor) -> String {
    match event {
        AlertEvent::Failure => format!("🚨 Monitor Alert: {} is DOWN", monitor.name),
        AlertEvent::Recovery => format!("✅ Monitor Recovery: {} is UP", monitor.name),
        AlertEvent::Test => format!("🔔 Test Alert: {}", monitor.name),
    }
}

pub fn html_body(
    event: AlertEvent,
    monitor: &Monitor,
    consecutive_failures: u32,
    at: DateTime<Utc>,
) -> String {
    let time = at.format("%Y-%m-%d %H:%M:%S UTC");
    let (color, title, lead, status_row, closing) = match event {
        AlertEvent::Failure => (
            "#dc2626",
            "🚨 Monitor Alert",
            "Your endpoint is experiencing issues",
            format!(
                "<p><strong>Status:</strong> <span style=\"color:#dc2626;font-weight:bold\">DOWN</span></p>\n\
                 <p><strong>Consecutive Failures:</strong> {}</p>\n\
                 <p><strong>Time:</strong> {}</p>",
                consecutive_failures, time
            ),
            "<p>The endpoint is not responding as expected. Please check your service.</p>\n\
             <p>You will receive a recovery notification once it is back online.</p>",
        ),
        AlertEvent::Recovery => (
            "#16a34a",
            "✅ Monitor Recovery",
            "Your endpoint is back online",
            format!(
                "<p><strong>Status:</strong> <span style=\"color:#16a34a;font-weight:bold\">UP</span></p>\n\
                 <p><strong>Recovery Time:</strong> {}</p>",
                time
            ),
            "<p>The endpoint is responding normally again. Monitoring continues.</p>",
        ),
        AlertEvent::Test => (
            "#2563eb",
            "🔔 Test Alert",
            "This is a test notification",
            format!("<p><strong>Time:</strong> {}</p>", time),
            "<p>Your alert channel is configured correctly. No action is required.</p>",
        ),
    };

    format!(
        "<!DOCTYPE html>\n\
<html>\n\
<head>\n\
<meta charset=\"utf-8\">\n\
<title>{title}</title>\n\
<style>{style}</style>\n\
</head>\n\
<body>\n\
<div class=\"header\" style=\"background:{color}\">\n\
<h1>{title}</h1>\n\
<p>{lead}</p>\n\
</div>\n\
<div class=\"content\">\n\
<div class=\"monitor-info\">\n\
<h3>{name}</h3>\n\
<p><strong>URL:</strong> {url}</p>\n\
<p><strong>Method:</strong> {method}</p>\n\
{status_row}\n\
</div>\n\
{closing}\n\
</div>\n\
<div class=\"footer\"><p>Sent by your uptime monitoring service.</p></div>\n\
</body>\n\
</html>",
        title = title,
        style = STYLE,
        color = color,
        lead = lead,
        name = escape_html(&monitor.name),
        url = escape_html(&monitor.url),
        method = monitor.method,
        status_row = status_row,
        closing = closing,
    )
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for c in input.chars() {
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
