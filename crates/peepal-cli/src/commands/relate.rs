use anyhow::Result;

use super::{print_json, Session};
use crate::ui;

pub async fn run(
    session: &Session,
    subject: &str,
    target: &str,
    kind: &str,
    json: bool,
) -> Result<()> {
    let receipt = session
        .peepal
        .relations
        .declare_relation_str(subject, target, &kind.to_ascii_uppercase())
        .await?;

    if json {
        return print_json(&receipt);
    }

    ui::success(&receipt.message);
    if receipt.edges_created == 0 {
        ui::info("Already recorded, nothing changed.");
    }
    Ok(())
}
