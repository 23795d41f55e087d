use anyhow::Result;
use console::style;

use super::{print_json, Session};
use crate::paths::get_db_path;

pub async fn run(session: &Session, json: bool) -> Result<()> {
    let stats = session.store().stats().await?;

    if json {
        return print_json(&stats);
    }

    let db_bytes = std::fs::metadata(get_db_path())
        .map(|m| m.len())
        .unwrap_or(0);

    println!();
    println!("  {}", style("GRAPH").bold());
    println!("  {}", "─".repeat(45));
    println!(
        "  {:<12} {} ({} active)",
        "persons", stats.persons, stats.active_persons
    );
    println!(
        "  {:<12} {} ({} verified)",
        "legacies", stats.legacies, stats.verified_legacies
    );
    println!(
        "  {:<12} {} ({} memberships)",
        "families", stats.families, stats.memberships
    );
    println!("  {:<12} {}", "kin edges", stats.kinship_edges);
    println!(
        "  {:<12} {:.1} MB",
        "db size",
        db_bytes as f64 / 1_000_000.0
    );
    println!();

    Ok(())
}
