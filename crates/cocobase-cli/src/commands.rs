/*
[INPUT]:  Parsed subcommand, authenticated client, shutdown token
[OUTPUT]: JSON results for stdout, realtime events until shutdown
[POS]:    Command dispatch - maps subcommands onto SDK calls
[UPDATE]: When adding subcommands or changing their output
*/

use anyhow::{Context, Result, bail};
use clap::{Args, Subcommand};
use cocobase::{CocobaseClient, JsonObject, QueryBuilder};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::filter::FilterArg;

pub const PASSWORD_ENV: &str = "COCOBASE_PASSWORD";

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in and store the session
    Login {
        email: String,
        /// Falls back to COCOBASE_PASSWORD
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
    },
    /// Create an account and store the session
    Register {
        email: String,
        /// Falls back to COCOBASE_PASSWORD
        #[arg(long, env = PASSWORD_ENV, hide_env_values = true)]
        password: String,
        /// Extra profile fields as a JSON object
        #[arg(long, value_name = "JSON")]
        data: Option<String>,
    },
    /// Forget the stored session
    Logout,
    /// Show the signed-in user
    Whoami,
    Get {
        collection: String,
        id: String,
    },
    /// Create a document from a JSON object
    Create {
        collection: String,
        #[arg(value_name = "JSON")]
        data: String,
    },
    /// Patch a document with a JSON object
    Update {
        collection: String,
        id: String,
        #[arg(value_name = "JSON")]
        data: String,
    },
    Delete {
        collection: String,
        id: String,
    },
    /// List documents with filters, paging and sorting
    List(ListArgs),
    /// List documents with a raw query string
    Query {
        collection: String,
        #[arg(value_name = "QUERY")]
        raw: String,
    },
    /// Stream change events until interrupted
    Watch {
        collection: String,
        #[arg(long)]
        name: Option<String>,
    },
}

#[derive(Args, Debug, Default)]
pub struct ListArgs {
    pub collection: String,
    /// AND condition, `field[:op]=value`
    #[arg(long = "filter", value_name = "FILTER")]
    pub filters: Vec<FilterArg>,
    /// OR condition, `field[:op]=value`
    #[arg(long = "or", value_name = "FILTER")]
    pub or_filters: Vec<FilterArg>,
    #[arg(long)]
    pub limit: Option<u32>,
    #[arg(long, conflicts_with = "page")]
    pub offset: Option<u32>,
    /// 1-based page; uses --per-page
    #[arg(long)]
    pub page: Option<u32>,
    #[arg(long, default_value_t = 20)]
    pub per_page: u32,
    #[arg(long)]
    pub sort: Option<String>,
    #[arg(long, requires = "sort")]
    pub desc: bool,
}

impl ListArgs {
    pub fn to_query(&self) -> QueryBuilder {
        let mut query = self
            .filters
            .iter()
            .fold(QueryBuilder::new(), |query, filter| filter.apply(query));

        if !self.or_filters.is_empty() {
            query = self
                .or_filters
                .iter()
                .fold(query.or(), |group, filter| filter.apply_or(group))
                .done();
        }

        if let Some(limit) = self.limit {
            query = query.limit(limit);
        }
        if let Some(offset) = self.offset {
            query = query.offset(offset);
        }
        if let Some(page) = self.page {
            query = query.page(page, self.per_page);
        }
        if let Some(sort) = &self.sort {
            query = if self.desc {
                query.order_by_desc(sort.as_str())
            } else {
                query.order_by_asc(sort.as_str())
            };
        }
        query
    }
}

impl Command {
    pub fn is_long_running(&self) -> bool {
        matches!(self, Command::Watch { .. })
    }
}

/// Run one subcommand; returns the value to print, if any
pub async fn run(
    client: &CocobaseClient,
    command: Command,
    shutdown: CancellationToken,
) -> Result<Option<Value>> {
    let output = match command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await.context("login")?;
            Some(serde_json::to_value(user)?)
        }
        Command::Register {
            email,
            password,
            data,
        } => {
            let data = data.as_deref().map(parse_object).transpose()?;
            let user = client
                .register(&email, &password, data)
                .await
                .context("register")?;
            Some(serde_json::to_value(user)?)
        }
        Command::Logout => {
            client.logout().await.context("logout")?;
            None
        }
        Command::Whoami => {
            let user = client.get_current_user().await.context("fetch current user")?;
            Some(serde_json::to_value(user)?)
        }
        Command::Get { collection, id } => {
            let doc = client
                .get_document(&collection, &id)
                .await
                .with_context(|| format!("get {collection}/{id}"))?;
            Some(serde_json::to_value(doc)?)
        }
        Command::Create { collection, data } => {
            let data = parse_object(&data)?;
            let doc = client
                .create_document(&collection, &data)
                .await
                .with_context(|| format!("create document in {collection}"))?;
            Some(serde_json::to_value(doc)?)
        }
        Command::Update {
            collection,
            id,
            data,
        } => {
            let data = parse_object(&data)?;
            let doc = client
                .update_document(&collection, &id, &data)
                .await
                .with_context(|| format!("update {collection}/{id}"))?;
            Some(serde_json::to_value(doc)?)
        }
        Command::Delete { collection, id } => {
            client
                .delete_document(&collection, &id)
                .await
                .with_context(|| format!("delete {collection}/{id}"))?;
            None
        }
        Command::List(args) => {
            let query = args.to_query();
            let docs = client
                .list_documents(&args.collection, Some(&query))
                .await
                .with_context(|| format!("list {}", args.collection))?;
            Some(serde_json::to_value(docs)?)
        }
        Command::Query { collection, raw } => {
            let docs = client
                .query_documents(&collection, &raw)
                .await
                .with_context(|| format!("query {collection}"))?;
            Some(serde_json::to_value(docs)?)
        }
        Command::Watch { collection, name } => {
            watch(client, &collection, name.as_deref(), shutdown).await?;
            None
        }
    };
    Ok(output)
}

async fn watch(
    client: &CocobaseClient,
    collection: &str,
    name: Option<&str>,
    shutdown: CancellationToken,
) -> Result<()> {
    let mut connection = client
        .watch_collection(collection, name)
        .await
        .with_context(|| format!("watch {collection}"))?;
    info!(name = connection.name(), "watching; press Ctrl-C to stop");

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            event = connection.recv() => match event {
                Some(event) => println!("{}", serde_json::to_string(&event)?),
                None => break,
            },
        }
    }

    connection.close().await;
    Ok(())
}

/// Parse a JSON object argument
pub fn parse_object(raw: &str) -> Result<JsonObject> {
    let value: Value = serde_json::from_str(raw).context("invalid JSON")?;
    match value {
        Value::Object(map) => Ok(map),
        other => bail!("expected a JSON object, got {other}"),
    }
}
