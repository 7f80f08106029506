use crate::backend::BackendClient;
use crate::conf::Conf;
use crate::delivery::RouteDataStore;
use crate::export::{export, file::write_atomically, ExportScope};
use crate::{Error, Result};
use std::path::PathBuf;
use std::sync::Arc;
use time::OffsetDateTime;
use tracing::info;

const USAGE: &str = "Usage: export <vehicle-id|all> [--with-status] [--out DIR] [--remote]";

struct Args {
    scope: ExportScope,
    with_status: bool,
    out: PathBuf,
    remote: bool,
}

pub async fn run(conf: &Conf, args: &[String]) -> Result<()> {
    let args = parse_args(args)?;
    let client = Arc::new(BackendClient::new(conf)?);
    let store = RouteDataStore::new(client.clone());
    store.load().await?;
    let snapshot = store.current();
    let mut res = export(
        snapshot.iter(),
        args.scope,
        args.with_status,
        OffsetDateTime::now_utc().date(),
    )?;
    // Same file name, content straight from the backend
    if args.remote {
        res.content = client.download_export(args.scope, args.with_status).await?;
    }
    let path = write_atomically(&args.out, &res.file_name, &res.content)?;
    info!(
        scope = %args.scope,
        path = %path.display(),
        bytes = res.content.len(),
        "Export written"
    );
    Ok(())
}

fn parse_args(args: &[String]) -> Result<Args> {
    let Some(scope) = args.first() else {
        return Err(Error::Cli(USAGE.into()));
    };
    let mut res = Args {
        scope: scope.parse()?,
        with_status: false,
        out: PathBuf::from("."),
        remote: false,
    };
    let mut options = args[1..].iter();
    while let Some(option) = options.next() {
        match option.as_str() {
            "--with-status" => res.with_status = true,
            "--remote" => res.remote = true,
            "--out" => {
                res.out = options
                    .next()
                    .map(PathBuf::from)
                    .ok_or_else(|| Error::Cli(USAGE.into()))?
            }
            other => Err(Error::Cli(format!("Unknown option: {other}. {USAGE}")))?,
        }
    }
    Ok(res)
}
