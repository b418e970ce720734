use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use shared::domain::{Task, TaskId, MAX_TITLE_CHARS};
use storage::Storage;

#[derive(Parser, Debug)]
struct Cli {
    #[arg(long, default_value = "sqlite://./tasks.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print tasks, oldest first.
    List {
        #[arg(long)]
        active: bool,
    },
    Add {
        title: String,
    },
    Delete {
        id: i64,
    },
    Toggle {
        id: i64,
    },
    /// Print total and active counts.
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::List { active } => {
            let tasks = if active {
                storage.list_active().await?
            } else {
                storage.list_all().await?
            };
            for task in &tasks {
                println!("{}", format_task(task));
            }
        }
        Command::Add { title } => match storage.add(check_title(&title)?).await? {
            Some(id) => println!("created task_id={}", id.0),
            None => bail!("task title must not be blank"),
        },
        Command::Delete { id } => {
            if storage.delete(TaskId(id)).await? {
                println!("deleted task_id={id}");
            } else {
                println!("no task with id={id}");
            }
        }
        Command::Toggle { id } => {
            if !storage.toggle_status(TaskId(id)).await? {
                bail!("no task with id={id}");
            }
            if let Some(task) = storage.get(TaskId(id)).await? {
                println!("{}", format_task(&task));
            }
        }
        Command::Stats => {
            let counts = storage.counts().await?;
            println!("total={} active={}", counts.total, counts.active);
        }
    }

    Ok(())
}

fn check_title(title: &str) -> Result<&str> {
    if title.chars().count() > MAX_TITLE_CHARS {
        bail!("task title exceeds {MAX_TITLE_CHARS} characters");
    }
    Ok(title)
}

fn format_task(task: &Task) -> String {
    format!("{}\t{}\t{}", task.id.0, task.status_glyph(), task.title)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_task(is_completed: bool) -> Task {
        Task {
            id: TaskId(12),
            title: "water plants".into(),
            created_at: Default::default(),
            is_completed,
        }
    }

    #[test]
    fn formats_task_as_tab_separated_line() {
        assert_eq!(format_task(&sample_task(false)), "12\t❌\twater plants");
        assert_eq!(format_task(&sample_task(true)), "12\t✅\twater plants");
    }

    #[test]
    fn rejects_overlong_titles() {
        assert!(check_title(&"t".repeat(MAX_TITLE_CHARS + 1)).is_err());
        assert_eq!(check_title("short").expect("ok"), "short");
    }

    #[test]
    fn parses_list_with_active_flag() {
        let cli = Cli::try_parse_from(["tools", "list", "--active"]).expect("parse");
        assert!(matches!(cli.command, Command::List { active: true }));
        assert_eq!(cli.database_url, "sqlite://./tasks.db");
    }
}
