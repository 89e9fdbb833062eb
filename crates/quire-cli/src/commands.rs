use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{bail, Context as _};
use colored::Colorize;
use quire_crypto::ConfigKey;
use quire_store::{ContentStore, GitStore, StoreConfig};
use quire_types::{Author, Cursor, RevisionSpec};

use crate::cli::*;
use crate::output::{format_bytes, format_time, print_json};

/// Settings shared by every subcommand.
struct Context {
    config: StoreConfig,
    key: Option<ConfigKey>,
    format: OutputFormat,
}

impl Context {
    fn from_cli(cli: &Cli) -> anyhow::Result<Self> {
        let mut config = match &cli.config {
            Some(path) => StoreConfig::load(path)?,
            None => StoreConfig::default(),
        };
        if let Some(root) = &cli.root {
            config.root = root.clone();
        }
        let key = cli.key_file.as_deref().map(read_key).transpose()?;
        Ok(Self {
            config,
            key,
            format: cli.format,
        })
    }

    /// Open the store. Without a key file, a throwaway key is used; only
    /// the config-blob commands need the real one.
    fn open(&self) -> anyhow::Result<GitStore> {
        let key = self.key.clone().unwrap_or_else(ConfigKey::generate);
        GitStore::open(&self.config, &key)
            .with_context(|| format!("opening store at {}", self.config.root.display()))
    }

    fn open_with_key(&self) -> anyhow::Result<GitStore> {
        if self.key.is_none() {
            bail!("this command needs --key-file");
        }
        self.open()
    }

    fn json(&self) -> bool {
        self.format == OutputFormat::Json
    }
}

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let ctx = Context::from_cli(&cli)?;
    match cli.command {
        Command::Init(args) => cmd_init(ctx, args),
        Command::Get(args) => cmd_get(&ctx, args),
        Command::Put(args) => cmd_put(&ctx, args),
        Command::Rm(args) => cmd_rm(&ctx, args),
        Command::Mv(args) => cmd_mv(&ctx, args),
        Command::Log(args) => cmd_log(&ctx, args),
        Command::Changes(args) => cmd_changes(&ctx, args),
        Command::Pages => cmd_pages(&ctx),
        Command::Files => cmd_files(&ctx),
        Command::Upload(args) => cmd_upload(&ctx, args),
        Command::Download(args) => cmd_download(&ctx, args),
        Command::ConfigGet(args) => cmd_config_get(&ctx, args),
        Command::ConfigPut(args) => cmd_config_put(&ctx, args),
    }
}

/// Key file contents: 64 hex characters, or any other text used as a
/// passphrase.
fn read_key(path: &Path) -> anyhow::Result<ConfigKey> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading key file {}", path.display()))?;
    let text = raw.trim();
    if text.is_empty() {
        bail!("key file {} is empty", path.display());
    }
    Ok(ConfigKey::from_hex(text).unwrap_or_else(|_| ConfigKey::derive(text.as_bytes())))
}

fn read_input(file: Option<&Path>) -> anyhow::Result<Vec<u8>> {
    match file {
        Some(path) => fs::read(path).with_context(|| format!("reading {}", path.display())),
        None => {
            let mut buf = Vec::new();
            io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

fn author(args: &WriteArgs) -> Author {
    let author = Author::new(args.author.clone());
    match &args.email {
        Some(email) => author.with_email(email.clone()),
        None => author,
    }
}

fn parse_cursor(token: Option<&str>) -> anyhow::Result<Option<Cursor>> {
    Ok(Cursor::parse_token(token.unwrap_or(""))?)
}

fn cmd_init(mut ctx: Context, args: InitArgs) -> anyhow::Result<()> {
    if let Some(path) = args.path {
        ctx.config.root = path;
    }
    if let Some(out) = &args.key_out {
        if out.exists() {
            bail!("refusing to overwrite existing key file {}", out.display());
        }
        let key = ConfigKey::generate();
        fs::write(out, format!("{}\n", key.to_hex()))
            .with_context(|| format!("writing key file {}", out.display()))?;
        ctx.key = Some(key);
    }
    let store = ctx.open()?;
    println!(
        "{} Initialized Quire wiki in {}",
        "✓".green().bold(),
        store.root().display().to_string().bold()
    );
    if let Some(out) = &args.key_out {
        println!("  Key: {}", out.display().to_string().cyan());
    }
    Ok(())
}

fn cmd_get(ctx: &Context, args: GetArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let revision = RevisionSpec::parse(args.rev.as_deref().unwrap_or(""))?;
    let page = store.get_page_at(&args.title, revision)?;
    if ctx.json() {
        return print_json(&serde_json::json!({
            "title": page.title,
            "content": page.text(),
            "last_modified": page.last_modified,
        }));
    }
    io::stdout().write_all(&page.content)?;
    Ok(())
}

fn cmd_put(ctx: &Context, args: PutArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let content = read_input(args.file.as_deref())?;
    let rev = store.put_page(&args.title, &content, &author(&args.write), &args.write.message)?;
    report_revision(ctx, "Saved", &args.title, rev)
}

fn cmd_rm(ctx: &Context, args: RmArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let rev = store.delete_page(&args.title, &author(&args.write), &args.write.message)?;
    report_revision(ctx, "Deleted", &args.title, rev)
}

fn cmd_mv(ctx: &Context, args: MvArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let rev = store.rename_page(&args.from, &args.to, &author(&args.write), &args.write.message)?;
    report_revision(ctx, "Renamed", &format!("{} → {}", args.from, args.to), rev)
}

fn report_revision(
    ctx: &Context,
    verb: &str,
    what: &str,
    rev: quire_types::RevisionId,
) -> anyhow::Result<()> {
    if ctx.json() {
        return print_json(&serde_json::json!({ "revision": rev }));
    }
    println!(
        "{} {} {} at {}",
        "✓".green().bold(),
        verb,
        what.bold(),
        rev.short_hex().yellow()
    );
    Ok(())
}

fn cmd_log(ctx: &Context, args: LogArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let cursor = parse_cursor(args.cursor.as_deref())?;
    let size = args.limit.unwrap_or_else(|| store.default_page_size());
    let page = if args.file {
        store.file_history(&args.name, cursor, size)?
    } else {
        store.page_history(&args.name, cursor, size)?
    };
    if ctx.json() {
        return print_json(&page);
    }
    if page.is_empty() {
        println!("No history for {}.", args.name.bold());
    }
    for entry in &page.entries {
        println!(
            "{}  {}  {}  {}",
            entry.revision.short_hex().yellow(),
            format_time(&entry.timestamp).dimmed(),
            entry.author.cyan(),
            entry.message
        );
    }
    print_next(&page.next_token());
    Ok(())
}

fn cmd_changes(ctx: &Context, args: ChangesArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let cursor = parse_cursor(args.cursor.as_deref())?;
    let size = args.limit.unwrap_or_else(|| store.default_page_size());
    let page = store.recent_changes(cursor, size)?;
    if ctx.json() {
        return print_json(&page);
    }
    if page.is_empty() {
        println!("No changes.");
    }
    for change in &page.entries {
        println!(
            "{}  {}  {:<8}  {}  {}",
            change.revision.short_hex().yellow(),
            format_time(&change.timestamp).dimmed(),
            change.kind.to_string().green(),
            change.name.bold(),
            change.author.cyan()
        );
    }
    print_next(&page.next_token());
    Ok(())
}

fn print_next(token: &str) {
    if !token.is_empty() {
        println!("{} {}", "next:".dimmed(), token);
    }
}

fn cmd_pages(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let titles = store.list_pages()?;
    if ctx.json() {
        return print_json(&titles);
    }
    if titles.is_empty() {
        println!("No pages.");
    }
    for title in titles {
        println!("{title}");
    }
    Ok(())
}

fn cmd_files(ctx: &Context) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let files = store.list_files()?;
    if ctx.json() {
        return print_json(&files);
    }
    if files.is_empty() {
        println!("No files.");
    }
    for file in &files {
        let modified = file
            .last_modified
            .as_ref()
            .map(|lm| format!("{} {}", format_time(&lm.timestamp), lm.author))
            .unwrap_or_default();
        println!(
            "{:>10}  {}  {}",
            format_bytes(file.size),
            file.name.bold(),
            modified.dimmed()
        );
    }
    Ok(())
}

fn cmd_upload(ctx: &Context, args: UploadArgs) -> anyhow::Result<()> {
    let name = match &args.name {
        Some(name) => name.clone(),
        None => args
            .path
            .file_name()
            .and_then(|n| n.to_str())
            .map(str::to_string)
            .with_context(|| format!("{} has no usable file name", args.path.display()))?,
    };
    let content = read_input(Some(&args.path))?;
    let store = ctx.open()?;
    let rev = store.put_file(&name, &content, &author(&args.write), &args.write.message)?;
    report_revision(ctx, "Uploaded", &name, rev)
}

fn cmd_download(ctx: &Context, args: DownloadArgs) -> anyhow::Result<()> {
    let store = ctx.open()?;
    let revision = RevisionSpec::parse(args.rev.as_deref().unwrap_or(""))?;
    let file = store.get_file_at(&args.name, revision)?;
    match &args.output {
        Some(path) => {
            fs::write(path, &file.content)
                .with_context(|| format!("writing {}", path.display()))?;
            if !ctx.json() {
                println!(
                    "{} Wrote {} ({})",
                    "✓".green().bold(),
                    path.display().to_string().bold(),
                    format_bytes(file.size())
                );
            }
        }
        None => io::stdout().write_all(&file.content)?,
    }
    Ok(())
}

fn cmd_config_get(ctx: &Context, args: ConfigGetArgs) -> anyhow::Result<()> {
    let store = ctx.open_with_key()?;
    let data = store.get_config(&args.name)?;
    io::stdout().write_all(&data)?;
    Ok(())
}

fn cmd_config_put(ctx: &Context, args: ConfigPutArgs) -> anyhow::Result<()> {
    let store = ctx.open_with_key()?;
    let data = read_input(args.file.as_deref())?;
    store.put_config(&args.name, &data)?;
    if !ctx.json() {
        println!(
            "{} Stored config {} ({})",
            "✓".green().bold(),
            args.name.bold(),
            format_bytes(data.len() as u64)
        );
    }
    Ok(())
}
