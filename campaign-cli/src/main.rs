// Copyright (c) The Campaign Engine Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

mod cli;
mod engine;
mod rest;

use clap::Parser;
use cli::Cli;
use engine::Engine;

fn main() {
    tracing_subscriber::fmt::init();

    let args = Cli::parse();
    let engine = Engine::wire(&args);

    if let Some(addr) = args.serve {
        let runtime = tokio::runtime::Runtime::new().expect("failed to start tokio runtime");
        runtime.block_on(serve(addr, engine));
        return;
    }

    match engine.load_and_run(&args) {
        Ok(()) => {
            println!("{}", engine.runner.reporter().to_text());
            std::process::exit(0);
        }
        Err(err) => {
            eprintln!("campaign run failed: {err}");
            std::process::exit(1);
        }
    }
}

async fn serve(addr: std::net::SocketAddr, engine: Engine) {
    let app = rest::router(std::sync::Arc::new(engine));
    let listener = tokio::net::TcpListener::bind(addr).await.expect("failed to bind REST listener");
    tracing::info!(%addr, "campaign REST facade listening");
    axum::serve(listener, app).await.expect("REST server crashed");
}
