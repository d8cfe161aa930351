//! Host-side helper: `cargo run` builds the glitch layer for the browser,
//! serves the demo page from `static/`, and (if asked) exposes it via ngrok.

use std::process::{exit, Command, Stdio};
use std::{thread, time::Duration};

use clap::Parser;

#[derive(Parser, Debug)]
#[command(about = "Build and serve the glitch demo page")]
struct Args {
    /// Port for the local HTTP server.
    #[arg(long, default_value_t = 8000)]
    port: u16,

    /// Serve whatever is already in static/pkg.
    #[arg(long)]
    skip_build: bool,

    /// Open an ngrok tunnel to the server.
    #[arg(long)]
    tunnel: bool,
}

fn build_pkg() {
    println!("Building WASM pkg …");
    match Command::new("wasm-pack")
        .args(["build", "--release", "--target", "web", "--out-dir", "static/pkg"])
        .status()
    {
        Ok(st) if st.success() => {}
        Ok(_) => {
            eprintln!("wasm-pack finished with errors. Ensure wasm-pack is installed (https://rustwasm.github.io/wasm-pack/).");
            exit(1);
        }
        Err(_) => {
            eprintln!("wasm-pack not found in PATH. Serving existing static/pkg; the page may run stale code.");
        }
    }
}

fn main() {
    let args = Args::parse();

    if !args.skip_build {
        build_pkg();
    }

    let port = args.port.to_string();
    println!("Launching local server at http://127.0.0.1:{port} …");
    let _server = match Command::new("python3")
        .args(["-m", "http.server", &port, "--directory", "static"])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            eprintln!("failed to start http server: {e}");
            exit(1);
        }
    };

    if args.tunnel {
        match Command::new("ngrok")
            .args(["http", &port])
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .spawn()
        {
            Ok(_) => println!("ngrok tunnel starting …"),
            Err(_) => eprintln!("ngrok not found. Install it to expose the page over the internet."),
        }
    }

    // Keep process alive
    loop {
        thread::sleep(Duration::from_secs(60));
    }
}
