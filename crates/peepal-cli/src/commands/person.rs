use anyhow::Result;
use clap::Args;
use peepal_graph::{Gender, NewPerson};

use super::{print_json, Session};
use crate::ui;

#[derive(Args)]
pub struct SignupArgs {
    /// Unique person id
    uid: String,
    #[arg(long)]
    name: String,
    /// male, female or other
    #[arg(long)]
    gender: String,
    #[arg(long)]
    age: u32,
    #[arg(long, default_value = "")]
    residence: String,
    #[arg(long, default_value = "")]
    phone: String,
}

pub async fn signup(session: &Session, args: SignupArgs, json: bool) -> Result<()> {
    let gender: Gender = args.gender.parse()?;
    let person = NewPerson {
        uid: args.uid,
        name: args.name,
        gender,
        age: args.age,
        residence: args.residence,
        phone: args.phone,
    };
    session.peepal.people.create_profile(&person).await?;

    if json {
        return print_json(&serde_json::json!({
            "status": "pending_verification",
            "uid": person.uid,
        }));
    }

    ui::success(&format!("Profile created for {}.", person.name));
    ui::info(&format!("Activate it with: peepal activate {}", person.uid));
    Ok(())
}

pub async fn activate(session: &Session, uid: &str, json: bool) -> Result<()> {
    let transitioned = session.peepal.people.activate(uid).await?;
    let person = session.peepal.people.get(uid).await?;

    if json {
        return print_json(&serde_json::json!({
            "uid": uid,
            "status": person.as_ref().map(|p| p.status),
            "changed": transitioned,
        }));
    }

    match person {
        Some(person) if transitioned => ui::success(&format!("{} is now active.", person.name)),
        Some(person) => ui::info(&format!("{} was already active.", person.name)),
        None => ui::error(&format!("No person with uid {}.", uid)),
    }
    Ok(())
}
