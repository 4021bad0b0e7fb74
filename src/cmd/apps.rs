//! Client commands against a running launcher server.

use anyhow::{Context, Result, bail};
use app_launcher::client::{DropOutcome, LauncherClient, Notice, Session};
use app_launcher::ui::{icons::CHECK, render_notice, render_view};
use launcher_common::{CategoryFilter, NewEntry};

fn session(server: &str) -> Result<Session> {
    let client = LauncherClient::new(server)
        .with_context(|| format!("Invalid server address: {}", server))?;
    Ok(Session::new(client))
}

fn finish(notice: Notice) -> Result<()> {
    if notice.is_error() {
        bail!(render_notice(notice));
    }
    println!("{}", render_notice(notice));
    Ok(())
}

pub async fn cmd_list(server: &str, search: Option<&str>, category: &str) -> Result<()> {
    let mut session = session(server)?;
    let Ok(filter) = category.parse::<CategoryFilter>();
    session.set_search(search.unwrap_or_default());
    session.set_category(filter);

    let view = session
        .view()
        .await
        .with_context(|| format!("Failed to fetch apps from {}", server))?;
    print!("{}", render_view(&view, &session.query));
    Ok(())
}

pub async fn cmd_add(
    server: &str,
    name: &str,
    url: &str,
    category: Option<&str>,
    access_code: Option<&str>,
) -> Result<()> {
    let mut draft = NewEntry::new(name, url);
    if let Some(category) = category {
        draft = draft.with_category(category);
    }
    draft.validate()?;

    let mut session = session(server)?;
    session.open_add_dialog();
    session.draft = draft;
    let notice = session.submit_draft(access_code).await;
    if let Some(entry) = session.last_created() {
        println!("{}", entry.id);
    }
    finish(notice)
}

pub async fn cmd_remove(server: &str, id: &str) -> Result<()> {
    let mut session = session(server)?;
    session.request_delete(id);
    match session.confirm_delete().await {
        Some(notice) => finish(notice),
        None => Ok(()),
    }
}

pub async fn cmd_move(server: &str, id: &str, onto: &str) -> Result<()> {
    let mut session = session(server)?;
    match session.drop_card(id, onto).await {
        DropOutcome::Reordered => {
            println!("{}Moved {} to the position of {}", CHECK, id, onto);
            Ok(())
        }
        DropOutcome::Unchanged => {
            bail!("Nothing to move: both ids must differ and exist on the server")
        }
        DropOutcome::Failed => finish(Notice::ReorderFailed),
        DropOutcome::DragDisabled => bail!("Reordering is only possible in the unfiltered view"),
    }
}
