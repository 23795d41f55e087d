use anyhow::Result;
use clap::{Parser, Subcommand};

mod commands;
mod paths;
mod ui;

#[derive(Parser)]
#[command(name = "peepal")]
#[command(about = "Your family graph. Kinship, family groups and vouched legacy members.")]
#[command(version)]
struct Cli {
    /// Output as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create or update a person profile (starts inactive)
    Signup(commands::person::SignupArgs),

    /// Activate a person profile
    Activate { uid: String },

    /// Declare a kinship relation: SUBJECT is KIND of TARGET
    Relate {
        subject: String,
        target: String,
        /// FATHER, MOTHER, SPOUSE or CHILD
        #[arg(value_name = "KIND")]
        kind: String,
    },

    /// Show a person's parents and children
    Tree { uid: String },

    /// List relatives along one relation
    Relations {
        uid: String,
        /// Fathers, Mothers, Children, Spouses (or a canonical label)
        #[arg(value_name = "FILTER")]
        filter: String,
    },

    /// Manage legacy members
    Legacy {
        #[command(subcommand)]
        command: LegacyCommand,
    },

    /// Manage family groups
    Family {
        #[command(subcommand)]
        command: FamilyCommand,
    },

    /// Show graph counts
    Status,
}

#[derive(Subcommand)]
enum LegacyCommand {
    /// Add a legacy member, vouched by its creator
    Create {
        name: String,
        #[arg(long)]
        gender: String,
        /// Uid of the member adding this legacy
        #[arg(long = "vouched-by")]
        vouched_by: String,
    },
    /// Vouch for a legacy member
    Vouch { legacy_id: String, voter_uid: String },
    /// Show a legacy member and its vouches
    Show { legacy_id: String },
}

#[derive(Subcommand)]
enum FamilyCommand {
    /// Create a family group
    Create {
        creator_uid: String,
        name: String,
        /// Member uids (repeatable)
        #[arg(long = "member")]
        members: Vec<String>,
    },
    /// List everyone sharing a family with a person
    Members { uid: String },
    /// List the families a person belongs to
    List { uid: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let json = cli.json;

    let session = commands::Session::open().await?;
    let result = match cli.command {
        Commands::Signup(args) => commands::person::signup(&session, args, json).await,
        Commands::Activate { uid } => commands::person::activate(&session, &uid, json).await,
        Commands::Relate {
            subject,
            target,
            kind,
        } => commands::relate::run(&session, &subject, &target, &kind, json).await,
        Commands::Tree { uid } => commands::tree::show(&session, &uid, json).await,
        Commands::Relations { uid, filter } => {
            commands::tree::relations(&session, &uid, &filter, json).await
        }
        Commands::Legacy { command } => match command {
            LegacyCommand::Create {
                name,
                gender,
                vouched_by,
            } => commands::legacy::create(&session, &name, &gender, &vouched_by, json).await,
            LegacyCommand::Vouch {
                legacy_id,
                voter_uid,
            } => commands::legacy::vouch(&session, &legacy_id, &voter_uid, json).await,
            LegacyCommand::Show { legacy_id } => {
                commands::legacy::show(&session, &legacy_id, json).await
            }
        },
        Commands::Family { command } => match command {
            FamilyCommand::Create {
                creator_uid,
                name,
                members,
            } => commands::family::create(&session, &creator_uid, &name, &members, json).await,
            FamilyCommand::Members { uid } => {
                commands::family::members(&session, &uid, json).await
            }
            FamilyCommand::List { uid } => commands::family::list(&session, &uid, json).await,
        },
        Commands::Status => commands::status::run(&session, json).await,
    };
    session.close().await;

    result
}
