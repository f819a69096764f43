use std::io::Write;
use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;
use quire_server::{QuireServer, ServerConfig};
use quire_types::{DocPath, RevisionLog};
use quire_vcs::Repository;
use serde_json::json;

use crate::cli::*;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(&cli.store)?;
    match cli.command {
        Command::Serve(args) => cmd_serve(config, args).await,
        Command::Init => cmd_init(config).await,
        Command::Log(args) => cmd_log(config, args, &cli.format).await,
        Command::Show(args) => cmd_show(config, args, &cli.format).await,
    }
}

/// Config file values, then command-line overrides.
fn load_config(store: &StoreArgs) -> anyhow::Result<ServerConfig> {
    let mut config = match &store.config {
        Some(path) => ServerConfig::load(path)?,
        None => ServerConfig::default(),
    };
    if let Some(root) = &store.root {
        config.root = root.clone();
    }
    Ok(config)
}

fn repository(config: &ServerConfig) -> Repository {
    Repository::new(Arc::new(QuireServer::new(config.clone()).backend()))
}

fn doc_path(path: &str) -> anyhow::Result<DocPath> {
    DocPath::from_url(path).with_context(|| format!("invalid document path {path:?}"))
}

async fn cmd_serve(mut config: ServerConfig, args: ServeArgs) -> anyhow::Result<()> {
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(title) = args.title {
        config.title = title;
    }
    if let Some(basepath) = args.basepath {
        config.basepath = basepath;
    }
    println!(
        "{} Serving {} on {}",
        "✓".green().bold(),
        config.root.display().to_string().bold(),
        format!("http://{}{}/", config.bind_addr, config.basepath()).cyan()
    );
    QuireServer::new(config).serve().await?;
    Ok(())
}

async fn cmd_init(config: ServerConfig) -> anyhow::Result<()> {
    repository(&config).init().await?;
    println!(
        "{} Initialized Quire store in {}",
        "✓".green().bold(),
        config.root.display().to_string().bold()
    );
    Ok(())
}

async fn cmd_log(config: ServerConfig, args: LogArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let doc = doc_path(&args.path)?;
    let repo = repository(&config);
    let log = repo.reader().await.log(&doc).await?;
    let limit = args.limit.unwrap_or(usize::MAX);

    match format {
        OutputFormat::Json => {
            let revisions: Vec<_> = log.iter().take(limit).collect();
            println!("{}", serde_json::to_string_pretty(&revisions)?);
        }
        OutputFormat::Text => print_log(&doc, &log, limit),
    }
    Ok(())
}

fn print_log(doc: &DocPath, log: &RevisionLog, limit: usize) {
    if log.is_empty() {
        println!("No revisions of {}.", doc.as_str().bold());
        return;
    }
    for (i, revision) in log.iter().take(limit).enumerate() {
        let marker = if i == 0 { " (head)".green().to_string() } else { String::new() };
        println!(
            "{}{}  {}  {}  {}",
            revision.short_id().yellow(),
            marker,
            revision.time.format("%Y-%m-%d %H:%M").to_string().dimmed(),
            revision.author.bold(),
            revision.message
        );
    }
}

async fn cmd_show(config: ServerConfig, args: ShowArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let doc = doc_path(&args.path)?;
    let revision = args.revision.unwrap_or_default();
    let repo = repository(&config);
    let reader = repo.reader().await;
    let log = reader.log(&doc).await?;
    let resolved = match log.find(&revision) {
        Some(found) if !revision.is_empty() => found.id.clone(),
        _ => revision,
    };
    let bytes = reader.show(&doc, &resolved).await.map_err(|e| {
        if e.is_not_found() {
            anyhow::anyhow!("{} has no content at {}", doc, display_revision(&resolved))
        } else {
            e.into()
        }
    })?;

    match format {
        OutputFormat::Json => {
            let value = json!({
                "path": doc.as_str(),
                "revision": resolved,
                "head": resolved.is_empty() || log.is_head(&resolved),
                "content": String::from_utf8_lossy(&bytes),
            });
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
        OutputFormat::Text => std::io::stdout().write_all(&bytes)?,
    }
    Ok(())
}

fn display_revision(revision: &str) -> &str {
    if revision.is_empty() {
        "head"
    } else {
        revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_flag_overrides_default() {
        let store = StoreArgs { config: None, root: Some("/tmp/notes".into()) };
        let config = load_config(&store).unwrap();
        assert_eq!(config.root, std::path::PathBuf::from("/tmp/notes"));
        assert_eq!(config.title, "Quire");
    }

    #[test]
    fn rejects_escaping_paths() {
        assert!(doc_path("/../etc/passwd").is_err());
        assert_eq!(doc_path("/notes/").unwrap().as_str(), "notes/index");
    }

    #[test]
    fn head_label() {
        assert_eq!(display_revision(""), "head");
        assert_eq!(display_revision("abc"), "abc");
    }
}
