use std::io::{self, IsTerminal, Write};
use std::path::Path;

use anyhow::{Result, bail};

use tutor_config::AppConfig;
use tutor_session::{SessionRecord, SessionStore};

pub fn print_state(config: &AppConfig) -> Result<()> {
    let store = SessionStore::new(&config.session.path);
    println!("session file: {}", store.path().display());
    match store.try_load()? {
        None => println!("(no session saved yet)"),
        Some(record) => println!("{}", describe(&record)),
    }
    Ok(())
}

fn describe(record: &SessionRecord) -> String {
    let mut lines = vec![
        format!(
            "recipient: {}",
            record
                .recipient()
                .map(|r| r.to_string())
                .unwrap_or_else(|| "(unbound)".to_string())
        ),
        match record.topic() {
            Some(topic) => format!("topic ({}): {}", topic.date, topic.text),
            None => "topic: (none)".to_string(),
        },
        format!("unsure queue: {}", record.unsure_queue().len()),
    ];
    lines.extend(
        record
            .unsure_queue()
            .iter()
            .enumerate()
            .map(|(i, item)| format!("  {}. {item}", i + 1)),
    );
    lines.join("\n")
}

pub fn reset(config: &AppConfig, yes: bool) -> Result<()> {
    let store = SessionStore::new(&config.session.path);

    if !yes {
        if !io::stdin().is_terminal() {
            bail!("refusing to reset in non-interactive mode without --yes");
        }
        print!(
            "This deletes {} (binding, topic and review queue). Type 'RESET' to continue: ",
            store.path().display()
        );
        io::stdout().flush()?;
        let mut confirmation = String::new();
        io::stdin().read_line(&mut confirmation)?;
        if confirmation.trim() != "RESET" {
            println!("reset cancelled");
            return Ok(());
        }
    }

    store.remove()?;
    println!("session reset: {}", store.path().display());
    Ok(())
}

pub fn init_config(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    AppConfig::default().save_to(path)?;
    println!("wrote default configuration to {}", path.display());
    Ok(())
}
