//! Plain-text rendering.

use alumni_portal_client::api::{Event, Job, Notification};
use alumni_portal_client::{DirectoryEntry, UserSummary};

pub fn print_user(user: &UserSummary) {
    println!("Name:       {}", user.name);
    println!("Email:      {}", user.email);
    println!("Role:       {}", user.role);
    if let Some(department) = &user.department {
        println!("Department: {}", department);
    }
    if let Some(year) = user.passout_year {
        println!("Passout:    {}", year);
    }
}

pub fn print_directory(entries: &[DirectoryEntry]) {
    if entries.is_empty() {
        println!("No matches found");
        return;
    }

    println!("{:<28} {:<12} {:<6} {}", "NAME", "DEPARTMENT", "YEAR", "ROLE");
    for entry in entries {
        let year = entry
            .passout_year
            .map(|y| y.to_string())
            .unwrap_or_default();
        let role = match (&entry.current_position, &entry.current_company) {
            (Some(position), Some(company)) => format!("{} at {}", position, company),
            (Some(position), None) => position.clone(),
            (None, Some(company)) => company.clone(),
            (None, None) => entry.designation.clone().unwrap_or_default(),
        };
        println!(
            "{:<28} {:<12} {:<6} {}",
            truncate(&entry.name, 28),
            truncate(&entry.department, 12),
            year,
            role
        );
    }
}

pub fn print_notifications(list: &[Notification]) {
    if list.is_empty() {
        println!("No notifications");
        return;
    }

    for n in list {
        let marker = if n.read { " " } else { "*" };
        let when = n
            .created_at()
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_default();
        println!("{} [{}] {} {} - {}", marker, n.id, when, n.title, n.message);
    }
}

pub fn print_jobs(jobs: &[Job]) {
    if jobs.is_empty() {
        println!("No job postings");
        return;
    }

    for job in jobs {
        println!(
            "[{}] {} - {} ({}, {})",
            job.id, job.title, job.company, job.location, job.job_type
        );
    }
}

pub fn print_events(events: &[Event]) {
    if events.is_empty() {
        println!("No events");
        return;
    }

    for event in events {
        let fee = if event.is_paid {
            format!("fee {:.2}", event.fee_amount)
        } else {
            "free".to_string()
        };
        println!(
            "[{}] {} on {} ({}, {} attending)",
            event.id,
            event.title,
            event.event_date.as_deref().unwrap_or("TBA"),
            fee,
            event.attendees_count
        );
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(max.saturating_sub(1)).collect();
        out.push('~');
        out
    }
}
