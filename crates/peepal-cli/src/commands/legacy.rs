use anyhow::{anyhow, Result};
use console::style;
use peepal_graph::{Gender, Legacy};

use super::{print_json, Session};
use crate::ui;

pub async fn create(
    session: &Session,
    name: &str,
    gender: &str,
    vouched_by: &str,
    json: bool,
) -> Result<()> {
    let gender: Gender = gender.parse()?;
    let vouches = &session.peepal.vouches;
    let legacy_id = vouches.create_legacy_member(name, gender, vouched_by).await?;
    let legacy = vouches
        .get_legacy(&legacy_id)
        .await?
        .ok_or_else(|| anyhow!("Legacy member {} vanished after creation", legacy_id))?;

    if json {
        return print_json(&creation_summary(&legacy));
    }

    ui::success(&format!("Legacy member {} added.", name));
    ui::info(&format!("id: {}", legacy.uid));
    if legacy.verified {
        ui::info(&format!("{}", style("Verified").green()));
    } else {
        ui::info(&format!("Needs {} vouches to be verified.", vouches.threshold()));
    }
    Ok(())
}

fn creation_summary(legacy: &Legacy) -> serde_json::Value {
    serde_json::json!({
        "legacy_id": legacy.uid,
        "vouch_count": legacy.vouch_count,
        "verified": legacy.verified,
    })
}

pub async fn vouch(session: &Session, legacy_id: &str, voter_uid: &str, json: bool) -> Result<()> {
    let verified = session.peepal.vouches.add_vouch(legacy_id, voter_uid).await?;

    if json {
        return print_json(&serde_json::json!({
            "verified": verified,
            "message": "Vouch recorded.",
        }));
    }

    ui::success("Vouch recorded.");
    if verified {
        ui::info(&format!("{}", style("Verified").green()));
    }
    Ok(())
}

pub async fn show(session: &Session, legacy_id: &str, json: bool) -> Result<()> {
    let legacy = session
        .peepal
        .vouches
        .get_legacy(legacy_id)
        .await?
        .ok_or_else(|| anyhow!("No legacy member with id {}", legacy_id))?;

    if json {
        return print_json(&legacy);
    }

    let state = if legacy.verified {
        format!("{}", style("verified").green())
    } else {
        format!(
            "{}",
            style(format!(
                "{}/{} vouches",
                legacy.vouch_count,
                session.peepal.vouches.threshold()
            ))
            .yellow()
        )
    };

    println!();
    println!("  {}  {}", style(&legacy.name).bold(), state);
    ui::section("VOUCHED BY");
    let voters: Vec<String> = legacy.vouched_by.into_iter().collect();
    ui::names(&voters);
    println!();
    Ok(())
}
