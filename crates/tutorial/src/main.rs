//! Serves one tutorial application over stdin and stdout.
//!
//! ```text
//! $ echo 'GET /users/1' | micro-api-console users
//! 404 Not Found
//! {"detail":"User with id 1 not found"}
//! ```

use std::process::ExitCode;
use std::sync::Arc;

use micro_api_tutorial::Tutorial;
use micro_api_tutorial::config::TutorialConfig;
use micro_api_tutorial::console::{parse_line, render};
use micro_api_tutorial::store::{MemoryUserStore, SessionPool};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info};
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> ExitCode {
    let config = match TutorialConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(config.log_level()).with_writer(std::io::stderr).finish();
    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("setting default subscriber failed: {e}");
        return ExitCode::FAILURE;
    }

    let tutorial = match std::env::args().nth(1).map_or(Ok(Tutorial::Users), |name| name.parse()) {
        Ok(tutorial) => tutorial,
        Err(e) => {
            error!(cause = %e, "cannot start console");
            return ExitCode::FAILURE;
        }
    };

    let pool = SessionPool::init(Arc::new(MemoryUserStore::new()), config.pool_size());
    let app = match tutorial.app(&pool) {
        Ok(app) => app,
        Err(e) => {
            error!(%tutorial, cause = %e, "application wiring failed");
            return ExitCode::FAILURE;
        }
    };
    info!(%tutorial, routes = app.router().len(), "console ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let code = loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break ExitCode::SUCCESS,
            Err(e) => {
                error!(cause = %e, "failed to read stdin");
                break ExitCode::FAILURE;
            }
        };

        match parse_line(&line) {
            Ok(Some(request)) => println!("{}", render(&app.handle(request).await)),
            Ok(None) => {}
            Err(e) => eprintln!("{e}"),
        }
    };

    pool.shutdown();
    code
}
