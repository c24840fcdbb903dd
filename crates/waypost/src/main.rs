//! `waypost` CGI entry point.
//!
//! Under a CGI server the request comes from `REQUEST_URI` / `QUERY_STRING`
//! and the full response (headers and body) is written to stdout. Given a
//! request path on the command line, only the body is printed.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use waypost::{logging, App, CgiRequest, Request, Settings};

#[derive(Parser, Debug)]
#[command(
    name = "waypost",
    version,
    about = "Dispatch one request to a controller and render its view"
)]
struct Cli {
    /// Settings file (TOML). Defaults apply when omitted.
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Report dispatch errors instead of answering 404.
    #[arg(long)]
    debug: bool,

    /// Request path such as `/blog/post`. Read from the CGI environment when
    /// omitted.
    path: Option<String>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut settings = match &cli.config {
        Some(path) => Settings::load(path)?,
        None => Settings::default(),
    };
    settings.debug |= cli.debug;
    logging::init(settings.debug);

    let app = App::new(settings);
    let mut stdout = io::stdout().lock();
    match cli.path {
        Some(path) => {
            let response = app.handle(&Request::from_uri(path))?;
            stdout
                .write_all(response.body.as_bytes())
                .and_then(|_| stdout.flush())
                .context("failed to write response")?;
        }
        None => {
            let response = app.handle(&CgiRequest::from_env())?;
            response
                .write_cgi(&mut stdout)
                .context("failed to write response")?;
        }
    }
    Ok(())
}
