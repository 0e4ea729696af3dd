//! ldpfs command-line client.
//!
//! Runs one request against the configured backends and prints the
//! response body to stdout.
//!
//! Usage:
//!   # List a directory as an LDP container
//!   ldpfs GET file:///home/amy/pod/
//!
//!   # Create a resource with a chosen name
//!   ldpfs POST file:///home/amy/pod/ --link resource --slug notes.ttl -d '<#a> <#b> <#c>.'
//!
//!   # Show status and headers too
//!   ldpfs HEAD file:///home/amy/pod/notes.ttl -i

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result, bail};
use clap::{Parser, ValueEnum};
use http::{HeaderName, HeaderValue};
use tracing_subscriber::{EnvFilter, fmt};

use ldpfs_kernel::{Dispatcher, LdpConfig, ObjectKind, Request, Response};

/// Run an LDP request against local or in-memory storage.
#[derive(Parser, Debug)]
#[command(name = "ldpfs")]
#[command(about = "Run an LDP request against local or in-memory storage")]
struct Args {
    /// Request method (GET, HEAD, OPTIONS, POST, PUT, PATCH, DELETE)
    method: String,

    /// Target URI, e.g. file:///srv/pod/ or app://mem/notes.ttl
    uri: String,

    /// Extra request header as "Name: value" (repeatable)
    #[arg(short = 'H', long = "header")]
    headers: Vec<String>,

    /// Request body
    #[arg(short, long, conflicts_with = "data_file")]
    data: Option<String>,

    /// Read the request body from a file
    #[arg(long)]
    data_file: Option<PathBuf>,

    /// Requested name for POST
    #[arg(long)]
    slug: Option<String>,

    /// Kind of object a POST creates
    #[arg(long, value_enum)]
    link: Option<LinkType>,

    /// Config file (default: $XDG_CONFIG_HOME/ldpfs/config.toml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print status line and headers before the body
    #[arg(short, long)]
    include: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LinkType {
    Container,
    Resource,
}

impl From<LinkType> for ObjectKind {
    fn from(link: LinkType) -> Self {
        match link {
            LinkType::Container => ObjectKind::Container,
            LinkType::Resource => ObjectKind::Resource,
        }
    }
}

fn parse_header(raw: &str) -> Result<(HeaderName, HeaderValue)> {
    let Some((name, value)) = raw.split_once(':') else {
        bail!("header must look like \"Name: value\": {raw}");
    };
    let name = HeaderName::from_bytes(name.trim().as_bytes())
        .with_context(|| format!("invalid header name in {raw:?}"))?;
    let value = HeaderValue::from_str(value.trim())
        .with_context(|| format!("invalid header value in {raw:?}"))?;
    Ok((name, value))
}

fn build_request(args: &Args) -> Result<Request> {
    let mut request = Request::new(&args.method, &args.uri);

    for raw in &args.headers {
        let (name, value) = parse_header(raw)?;
        request = request.header(name, value);
    }
    if let Some(kind) = args.link {
        request = request.link(kind.into());
    }
    if let Some(slug) = &args.slug {
        request = request.slug(slug);
    }

    if let Some(data) = &args.data {
        request = request.body(data.as_bytes());
    } else if let Some(path) = &args.data_file {
        let body = std::fs::read(path)
            .with_context(|| format!("failed to read {}", path.display()))?;
        request = request.body(body);
    }

    Ok(request)
}

fn print_response(response: &Response, include: bool) {
    if include {
        println!("{}", response.status);
        for (name, value) in &response.headers {
            println!("{}: {}", name, value.to_str().unwrap_or("<binary>"));
        }
        println!();
    }
    if let Some(body) = response.text() {
        print!("{body}");
        if !body.ends_with('\n') {
            println!();
        }
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // stdout carries the response; logs go to stderr
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => LdpConfig::load(path)?,
        None => LdpConfig::load_or_default()?,
    };
    let registry = config.build_registry()?;
    tracing::debug!(backends = ?registry.list(), "backends ready");

    let dispatcher = Dispatcher::new(registry);
    let request = build_request(&args)?;
    let response = dispatcher
        .fetch(request)
        .await
        .with_context(|| format!("{} {} failed", args.method, args.uri))?;

    print_response(&response, args.include);

    Ok(if response.status.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_header() {
        let (name, value) = parse_header("Content-Type: text/turtle").unwrap();
        assert_eq!(name, http::header::CONTENT_TYPE);
        assert_eq!(value, "text/turtle");

        assert!(parse_header("no colon here").is_err());
        assert!(parse_header("bad name: x").is_err());
    }

    #[test]
    fn test_build_request() {
        let args = Args::parse_from([
            "ldpfs",
            "post",
            "app://mem/",
            "--link",
            "container",
            "--slug",
            "box",
            "-H",
            "X-Trace: 1",
        ]);
        let request = build_request(&args).unwrap();
        assert_eq!(request.verb, ldpfs_kernel::Verb::Post);
        assert_eq!(request.intent(), Some(ObjectKind::Container));
        assert_eq!(request.requested_slug().as_deref(), Some("box"));
        assert_eq!(request.headers.get("x-trace").unwrap(), "1");
    }

    #[test]
    fn test_data_and_data_file_conflict() {
        let parsed = Args::try_parse_from([
            "ldpfs", "PUT", "app://mem/a", "-d", "x", "--data-file", "/tmp/y",
        ]);
        assert!(parsed.is_err());
    }
}
