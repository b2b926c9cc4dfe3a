//! Subcommand handlers.

use anyhow::{Context, Result};
use chrono::Datelike;

use alumni_portal_client::api::NotificationFilter;
use alumni_portal_client::directory::passout_year_options;
use alumni_portal_client::{
    DirectoryBrowser, DirectoryQuery, DirectorySource, LoadOutcome, Portal, PortalError,
};

use crate::output;
use crate::{ContentCommand, DirectoryArgs, EventCommand, JobCommand, NotificationCommand};

pub async fn login(
    portal: &Portal,
    email: &str,
    password: Option<String>,
    admin: bool,
) -> Result<()> {
    let password = match password {
        Some(p) => p,
        None => rpassword::prompt_password("Password: ").context("Failed to read password")?,
    };

    let auth = portal.auth();
    let result = if admin {
        auth.admin_login(email, &password).await
    } else {
        auth.login(email, &password).await
    };

    match result {
        Ok(user) => {
            println!("Logged in as {} <{}> ({})", user.name, user.email, user.role);
            Ok(())
        }
        // The login endpoint answers 401 for bad credentials.
        Err(e) if e.is_unauthorized() => anyhow::bail!("Login failed: invalid email or password"),
        Err(e) => anyhow::bail!("Login failed: {}", e.detail()),
    }
}

pub fn logout(portal: &Portal) {
    if portal.auth().logout() {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
}

pub async fn whoami(portal: &Portal, refresh: bool) -> Result<()> {
    let user = if refresh {
        Some(portal.auth().me().await?)
    } else {
        portal.session().get_user()
    };

    match user {
        Some(user) => output::print_user(&user),
        None => println!("Not logged in"),
    }
    Ok(())
}

pub async fn browse(browser: DirectoryBrowser, args: &DirectoryArgs) -> Result<()> {
    let query = DirectoryQuery::new()
        .with_search(args.search.clone())
        .with_department(args.department.clone())
        .with_passout_year(args.year.clone());

    match browser.set_query(query).await {
        LoadOutcome::Unauthorized => return Err(PortalError::Unauthorized.into()),
        LoadOutcome::Failed => anyhow::bail!("Could not load the directory"),
        _ => {}
    }

    if !args.all {
        for _ in 0..args.more {
            if browser.load_more().await != LoadOutcome::Applied {
                break;
            }
        }
    }

    let view = browser.snapshot();
    let shown = if args.all { &view.all[..] } else { view.displayed() };
    if args.json {
        println!("{}", serde_json::to_string_pretty(shown)?);
        return Ok(());
    }

    output::print_directory(shown);
    if shown.len() < view.all.len() {
        println!(
            "\nShowing {} of {} (use --more N or --all)",
            view.visible_count,
            view.all.len()
        );
    } else {
        println!("\n{} result(s)", view.all.len());
    }
    Ok(())
}

pub async fn departments(portal: &Portal) -> Result<()> {
    let source = alumni_portal_client::AlumniDirectory::new(portal.gateway().clone());
    let departments = source.departments().await;
    if departments.is_empty() {
        println!("No departments available");
    }
    for department in departments {
        println!("{}", department);
    }

    let years = passout_year_options(chrono::Utc::now().year());
    if let (Some(newest), Some(oldest)) = (years.first(), years.last()) {
        println!("\nPassout years: {}-{}", oldest, newest);
    }
    Ok(())
}

pub async fn notifications(portal: &Portal, command: NotificationCommand) -> Result<()> {
    let api = portal.notifications();

    match command {
        NotificationCommand::List {
            unread,
            category,
            limit,
        } => {
            let filter = NotificationFilter {
                read: unread.then_some(false),
                category,
                limit,
            };
            let list = api.list(&filter).await?;
            output::print_notifications(&list);
        }
        NotificationCommand::Read { id } => {
            api.mark_read(&id).await?;
            println!("Marked {} as read", id);
        }
        NotificationCommand::ReadAll => {
            api.mark_all_read().await?;
            println!("All notifications marked as read");
        }
        NotificationCommand::Delete { id } => {
            api.delete(&id).await?;
            println!("Deleted {}", id);
        }
        NotificationCommand::Watch => watch_notifications(portal).await?,
    }
    Ok(())
}

async fn watch_notifications(portal: &Portal) -> Result<()> {
    if !portal.session().is_authenticated() {
        anyhow::bail!("Not logged in");
    }

    let poller = portal.notification_poller();
    let mut summaries = poller.subscribe();
    let mut session = portal.session().subscribe();
    let handle = poller.start();

    tracing::info!(
        interval_secs = portal.config().notification_interval.as_secs(),
        "Watching notifications"
    );

    let result = loop {
        tokio::select! {
            changed = summaries.changed() => {
                if changed.is_err() {
                    break Ok(());
                }
                let summary = summaries.borrow_and_update().clone();
                println!("{} unread", summary.unread);
                output::print_notifications(&summary.notifications);
            }
            changed = session.changed() => {
                if changed.is_err() || !session.borrow_and_update().is_authenticated() {
                    break Err(PortalError::Unauthorized.into());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                break Ok(());
            }
        }
    };

    handle.abort();
    result
}

pub async fn jobs(portal: &Portal, command: JobCommand) -> Result<()> {
    let api = portal.jobs();

    match command {
        JobCommand::List { json } => {
            let jobs = api.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&jobs)?);
            } else {
                output::print_jobs(&jobs);
            }
        }
        JobCommand::Show { id } => {
            let job = api.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&job)?);
        }
    }
    Ok(())
}

pub async fn events(portal: &Portal, command: EventCommand) -> Result<()> {
    let api = portal.events();

    match command {
        EventCommand::List { json } => {
            let events = api.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&events)?);
            } else {
                output::print_events(&events);
            }
        }
        EventCommand::Show { id } => {
            let event = api.get(&id).await?;
            println!("{}", serde_json::to_string_pretty(&event)?);
        }
        EventCommand::Register { id } => {
            let registration = api.register(&id).await?;
            if registration.requires_payment {
                println!("Event {} requires payment; complete it in the portal", id);
            } else {
                match registration.ticket_id {
                    Some(ticket) => println!("Registered, ticket {}", ticket),
                    None => println!("Registered"),
                }
            }
        }
    }
    Ok(())
}

pub async fn content(portal: &Portal, command: ContentCommand) -> Result<()> {
    let api = portal.content();

    let value = match command {
        ContentCommand::Get { section: Some(section) } => api.get_section(&section).await?,
        ContentCommand::Get { section: None } => api.get_all().await?,
        ContentCommand::Set { section, file } => {
            let raw = tokio::fs::read_to_string(&file)
                .await
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let data: serde_json::Value =
                serde_json::from_str(&raw).context("Content file is not valid JSON")?;
            api.set_section(&section, &data).await?
        }
        ContentCommand::Upload { section, file } => {
            api.upload_image_file(&file, &section).await?
        }
    };

    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}
