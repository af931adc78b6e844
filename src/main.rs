use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use quizcode::{db::Db, router, AppState};

#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// SQLite database url, e.g. `sqlite://quiz.db`.
    #[clap(env)]
    database_url: String,

    /// The address to bind to.
    #[arg(short, long, env, default_value = "127.0.0.1:1414")]
    address: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve,
    /// Create a quiz owner and print their API token.
    AddUser { username: String, email: String },
    /// Insert the demo quiz DEMO01 for an owner, unless it exists.
    SeedDemo { owner_id: i64 },
}

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    let filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tracing=info,quizcode=debug,tower_http=info".to_owned());
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_span_events(tracing_subscriber::fmt::format::FmtSpan::CLOSE)
        .init();

    let args = Args::parse();

    let db = Db::new(&args.database_url).await?;

    match args.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(db, &args.address).await?,
        Command::AddUser { username, email } => {
            let user_id = db.create_user(&username, &email).await?;
            let token = db.create_user_token(user_id).await?;
            println!("user {user_id} created, api token: {token}");
        }
        Command::SeedDemo { owner_id } => {
            let quiz_id = db.seed_demo_quiz(owner_id).await?;
            println!("demo quiz available with id {quiz_id}");
        }
    }

    Ok(())
}

async fn serve(db: Db, address: &str) -> color_eyre::Result<()> {
    let app = router(AppState::new(db));

    let address = address.parse::<SocketAddr>()?;
    let listener = tokio::net::TcpListener::bind(address).await?;
    tracing::info!("listening on {address}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for shutdown signal: {e}");
    }
    tracing::info!("shutting down");
}
