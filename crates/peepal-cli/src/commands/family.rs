use anyhow::Result;
use console::style;

use super::{print_json, Session};
use crate::ui;

pub async fn create(
    session: &Session,
    creator_uid: &str,
    name: &str,
    members: &[String],
    json: bool,
) -> Result<()> {
    let family_id = session
        .peepal
        .families
        .create_family_group(creator_uid, name, members)
        .await?;

    if json {
        return print_json(&serde_json::json!({
            "status": "success",
            "family_id": family_id,
        }));
    }

    ui::success(&format!("Family {} created.", name));
    ui::info(&format!("id: {}", family_id));
    Ok(())
}

pub async fn members(session: &Session, uid: &str, json: bool) -> Result<()> {
    let members = session.peepal.families.list_family_members(uid).await?;

    if json {
        return print_json(&members);
    }

    ui::section("FAMILY MEMBERS");
    if members.is_empty() {
        ui::info(&style("(none)").dim().to_string());
    }
    for member in &members {
        println!("  {:<24} {}", member.name, style(&member.uid).dim());
    }
    println!();
    Ok(())
}

pub async fn list(session: &Session, uid: &str, json: bool) -> Result<()> {
    let families = session.peepal.families.families_of(uid).await?;

    if json {
        return print_json(&families);
    }

    ui::section("FAMILIES");
    if families.is_empty() {
        ui::info(&style("(none)").dim().to_string());
    }
    for family in &families {
        println!(
            "  {:<24} {}",
            family.name,
            style(family.created_at.format("%Y-%m-%d")).dim()
        );
    }
    println!();
    Ok(())
}
