//! Plain-text rendering of the launcher grid for the terminal.

use console::style;
use launcher_common::display::{display_domain, initials};
use launcher_common::{Entry, LauncherView, ViewQuery};

use super::icons::{CHECK, CROSS, FOLDER, GRIP, LINK, SEARCH};
use crate::client::Notice;

fn render_card(out: &mut String, entry: &Entry, draggable: bool) {
    let marker = if draggable { GRIP } else { LINK };
    out.push_str(&format!(
        "  {}{:<3} {:<24} {:<28} {}\n",
        marker,
        style(initials(&entry.name)).cyan(),
        style(&entry.name).bold(),
        display_domain(&entry.url),
        style(&entry.id).dim(),
    ));
}

/// Render a derived view. Grouped views print one section per category.
pub fn render_view(view: &LauncherView, query: &ViewQuery) -> String {
    let mut out = String::new();

    if !query.search.is_empty() {
        out.push_str(&format!("{}Search: {}\n", SEARCH, query.search));
    }

    if view.total > 0 {
        out.push_str(&format!("{}\n", style(view.summary(query)).dim()));
    }

    if view.entries.is_empty() {
        out.push_str(if query.is_unfiltered() {
            "No apps yet. Add one with `app-launcher add <NAME> <URL>`.\n"
        } else {
            "No apps match the current filter.\n"
        });
        return out;
    }

    if view.is_grouped() {
        for group in &view.groups {
            out.push_str(&format!(
                "\n{}{} ({})\n",
                FOLDER,
                style(&group.label).bold().underlined(),
                group.entries.len()
            ));
            for entry in &group.entries {
                render_card(&mut out, entry, view.drag_enabled);
            }
        }
    } else {
        out.push_str(&format!(
            "\n{}{}\n",
            FOLDER,
            style(query.category.as_selector()).bold()
        ));
        for entry in &view.entries {
            render_card(&mut out, entry, view.drag_enabled);
        }
    }

    if !view.categories.is_empty() {
        out.push_str(&format!(
            "\n{} {}\n",
            style("Categories:").dim(),
            view.categories.join(", ")
        ));
    }
    out
}

pub fn render_notice(notice: Notice) -> String {
    let icon = if notice.is_error() { CROSS } else { CHECK };
    format!("{}{}: {}", icon, style(notice.title()).bold(), notice.description())
}
