use anyhow::Result;
use clap::{Parser, Subcommand};
use server_api::CommandsController;
use shared::{
    domain::{Command, CommandId},
    error::ApiException,
};
use storage::{CommandStore, Storage};

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, env = "DATABASE_URL", default_value = "sqlite://./data/commands.db")]
    database_url: String,
    #[command(subcommand)]
    command: Action,
}

#[derive(Subcommand, Debug)]
enum Action {
    /// Insert the three sample commands.
    Seed,
    Add {
        #[arg(long)]
        id: i64,
        #[arg(long)]
        how_to: String,
        #[arg(long)]
        commanline: String,
        #[arg(long)]
        platform: String,
    },
    List,
    Delete {
        id: i64,
    },
}

fn sample_commands() -> Vec<Command> {
    (1..=3)
        .map(|id| {
            Command::new(
                id,
                format!("how to test {id}"),
                format!("command line test {id}"),
                format!("platform fake {id}"),
            )
        })
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Action::Seed => {
            for command in sample_commands() {
                let created = CommandsController::new(storage.context())
                    .create_command(command)
                    .await
                    .map_err(ApiException::from)?;
                println!("created {}", created.location);
            }
        }
        Action::Add {
            id,
            how_to,
            commanline,
            platform,
        } => {
            let created = CommandsController::new(storage.context())
                .create_command(Command::new(id, how_to, commanline, platform))
                .await
                .map_err(ApiException::from)?;
            println!("created {}", created.location);
        }
        Action::List => {
            let commands = CommandsController::new(storage.context())
                .list_commands()
                .await
                .map_err(ApiException::from)?;
            for command in commands {
                println!(
                    "{}\t{}\t{}\t{}",
                    command.id, command.platform, command.commanline, command.how_to
                );
            }
        }
        Action::Delete { id } => {
            let removed = CommandsController::new(storage.context())
                .delete_command(CommandId(id))
                .await
                .map_err(ApiException::from)?;
            println!("deleted command_id={}", removed.id);
        }
    }

    Ok(())
}
