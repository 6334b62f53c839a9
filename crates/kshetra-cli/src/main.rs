use clap::Parser;
use kshetra_cli::{Cli, CliConfig, Command, commands};
use kshetra_logging::{KshetraSubscriberBuilder, UserContextData, UserContextGuard, user_span};
use serde::Serialize;
use tracing::Instrument;

fn print<T: Serialize + std::fmt::Display>(report: &T, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

// Single-threaded so the thread-local user context covers the whole command
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CliConfig::load(path)?,
        None => CliConfig::default(),
    };
    let mut logging = KshetraSubscriberBuilder::new()
        .with_config(config.logging.clone())
        .with_verbosity(cli.verbose);
    if let Some(dir) = &cli.log_dir {
        logging = logging.with_file_output(dir);
    }
    let _log_guard = logging.init()?;

    match cli.command {
        Command::Select { session, picks } => {
            let auth = session.auth();
            let user = UserContextData::from_auth(&auth);
            let span = user_span(&user);
            let _ctx = UserContextGuard::with_data(user);

            let report = commands::run_select(&session.fixture, &auth, &picks, &config.engine)
                .instrument(span)
                .await?;
            print(&report, cli.json)?;
        }

        Command::Drill {
            session,
            kind,
            path,
        } => {
            let auth = session.auth();
            let user = UserContextData::from_auth(&auth);
            let span = user_span(&user);
            let _ctx = UserContextGuard::with_data(user);

            let kind = kind.map(Into::into).unwrap_or(config.engine.report_kind);
            let report = commands::run_drill(&session.fixture, &auth, kind, &path, &config.engine)
                .instrument(span)
                .await?;
            print(&report, cli.json)?;
        }

        Command::Levels => print!("{}", commands::render_levels()),
    }

    Ok(())
}
