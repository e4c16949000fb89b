use anyhow::{Context, Result};
use crumbtrail_application::BreadcrumbPanel;
use crumbtrail_core::breadcrumb::BreadcrumbList;

use super::session::Session;

pub async fn visit(session: &Session, url: &str) -> Result<()> {
    let page = session.open_page(url).await?;
    print_panel(&page.panel);
    println!();
    println!("URL: {}", page.location);
    page.panel.unmount();
    Ok(())
}

pub async fn back(session: &Session, url: Option<String>) -> Result<()> {
    let href = session.current_page(url)?;
    let page = session.open_page(&href).await?;

    let popped = page
        .reconciler
        .handle_back_navigation()
        .await
        .context("Failed to store trail after back navigation")?;
    page.panel.unmount();

    let remaining = page.reconciler.current_list().await;
    match remaining.last() {
        Some(previous) => session.remember_location(&previous.canonical_url)?,
        None => session.forget_location()?,
    }

    match popped {
        Some(entry) => println!("Left {}", entry.display_name),
        None => println!("Trail is already empty"),
    }
    print_list(&remaining);
    Ok(())
}

pub async fn click(session: &Session, index: usize, url: Option<String>) -> Result<()> {
    let href = session.current_page(url)?;
    let page = session.open_page(&href).await?;

    let target = page
        .panel
        .click(index)
        .await
        .with_context(|| format!("Cannot follow trail item {}", index))?;
    page.panel.unmount();
    session.remember_location(&target.href)?;

    println!("{}", target.href);
    Ok(())
}

pub fn show(session: &Session) -> Result<()> {
    let list = session
        .list_store()
        .load_or_default()
        .context("Failed to read stored trail")?;
    print_list(&list);
    Ok(())
}

fn print_panel(panel: &BreadcrumbPanel) {
    let Some(links) = panel.links() else {
        println!("(breadcrumb hidden)");
        return;
    };
    if links.is_empty() {
        println!("(empty trail)");
        return;
    }
    println!("{}", panel.render_text());
    for link in links {
        println!("{:>3}  {}", link.index, link.href);
    }
}

fn print_list(list: &BreadcrumbList) {
    if list.is_empty() {
        println!("(empty trail)");
        return;
    }
    for (index, entry) in list.entries().iter().enumerate() {
        println!("{:>3}  {:<24} {}", index, entry.display_name, entry.canonical_url);
    }
}
