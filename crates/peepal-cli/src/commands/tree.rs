use anyhow::{anyhow, Result};
use console::style;
use peepal_graph::EdgeLabel;

use super::{print_json, Session};
use crate::ui;

pub async fn show(session: &Session, uid: &str, json: bool) -> Result<()> {
    let tree = session.peepal.tree.get_family_tree(uid).await?;

    if json {
        return print_json(&tree);
    }

    println!();
    println!(
        "  {}  {}",
        style(&tree.name).bold(),
        style(tree.status.as_str()).dim()
    );
    ui::section("PARENTS");
    ui::names(&tree.parents);
    ui::section("CHILDREN");
    ui::names(&tree.children);
    println!();
    Ok(())
}

pub async fn relations(session: &Session, uid: &str, filter: &str, json: bool) -> Result<()> {
    let label = filter_label(filter).ok_or_else(|| {
        anyhow!(
            "Invalid filter type: {} (expected Fathers, Mothers, Children or Spouses)",
            filter
        )
    })?;
    let relatives = session.peepal.tree.get_relations_by_type(uid, label).await?;

    if json {
        return print_json(&relatives);
    }

    ui::section(label.as_str());
    if relatives.is_empty() {
        ui::info(&style("(none)").dim().to_string());
    }
    for relative in &relatives {
        println!("  {:<24} {}", relative.name, style(&relative.uid).dim());
    }
    println!();
    Ok(())
}

/// Map a user-facing filter name to the edge label it reads.
fn filter_label(filter: &str) -> Option<EdgeLabel> {
    match filter {
        "Fathers" => Some(EdgeLabel::FatherOf),
        "Mothers" => Some(EdgeLabel::MotherOf),
        "Children" => Some(EdgeLabel::ChildOf),
        "Spouses" => Some(EdgeLabel::SpouseOf),
        other => EdgeLabel::parse(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filter_label() {
        assert_eq!(filter_label("Fathers"), Some(EdgeLabel::FatherOf));
        assert_eq!(filter_label("Spouses"), Some(EdgeLabel::SpouseOf));
        assert_eq!(filter_label("PARENT_OF"), Some(EdgeLabel::ParentOf));
        assert_eq!(filter_label("Cousins"), None);
    }
}
