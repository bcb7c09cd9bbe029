use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use shellindex_core::{parse, DocumentKey};
use shellindex_storage::dump::{read_dump, DumpWriter};
use shellindex_storage::{Cursor, InMemoryStore, PageRequest, Storage};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shellindex")]
#[command(about = "ShellIndex query and dump CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand)]
enum Cmd {
    /// Print the parsed form of a query
    Parse {
        query: String,
        #[arg(long, default_value = "en")]
        locale: String,
    },
    /// Run one page of a search against a dump file
    Search {
        dump: PathBuf,
        #[arg(long, short)]
        query: Option<String>,
        #[arg(long, default_value = "en")]
        locale: String,
        #[arg(long, default_value_t = 20)]
        limit: usize,
        #[arg(long)]
        endpoint: Option<String>,
        #[arg(long, conflicts_with_all = ["after", "before"])]
        last: bool,
        #[arg(long, num_args = 2, value_names = ["ENDPOINT", "ID"], conflicts_with = "before")]
        after: Option<Vec<String>>,
        #[arg(long, num_args = 2, value_names = ["ENDPOINT", "ID"])]
        before: Option<Vec<String>>,
    },
    /// Rewrite a dump keeping the last version of each shell, in key order
    Compact { input: PathBuf, output: PathBuf },
}

fn key_from(parts: &[String]) -> Result<DocumentKey> {
    match parts {
        [endpoint, id] => Ok(DocumentKey::new(endpoint.as_str(), id.as_str())),
        _ => bail!("expected ENDPOINT ID"),
    }
}

async fn run(cli: Cli) -> Result<serde_json::Value> {
    match cli.cmd {
        Cmd::Parse { query, locale } => {
            let expression = parse(&query, &locale)?;
            Ok(json!({
                "structural": expression.has_structural_predicates(),
                "expression": serde_json::to_value(&expression)?,
            }))
        }
        Cmd::Search {
            dump,
            query,
            locale,
            limit,
            endpoint,
            last,
            after,
            before,
        } => {
            let store = InMemoryStore::new();
            store.load(read_dump(&dump)?)?;
            let cursor = match (after, before) {
                (Some(parts), _) => Cursor::After(key_from(&parts)?),
                (_, Some(parts)) => Cursor::Before(key_from(&parts)?),
                _ if last => Cursor::Last,
                _ => Cursor::First,
            };
            let expression = match query.as_deref().map(str::trim) {
                Some(q) if !q.is_empty() => Some(parse(q, &locale)?),
                _ => None,
            };
            let page = store
                .page(
                    PageRequest::first(limit)
                        .with_cursor(cursor)
                        .with_query(expression)
                        .with_endpoint(endpoint),
                )
                .await?;
            let documents: Vec<_> = page.documents.iter().map(|d| &d.document).collect();
            Ok(json!({
                "documents": documents,
                "previous": page.previous,
                "next": page.next,
            }))
        }
        Cmd::Compact { input, output } => {
            let store = InMemoryStore::new();
            let read = store.load(read_dump(&input)?)?;
            let mut writer = DumpWriter::create(output)?;
            for stored in store.all_documents() {
                writer.write_document(&stored.document)?;
            }
            let written = writer.finish()?;
            Ok(json!({ "read": read, "written": written }))
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let report = run(cli).await?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
