//! Provides the `stl-thumbnail` tool for rendering STL previews.
//!
//! Usage: `stl-thumbnail -i <input.stl> -o <output.png> [-s SIZE]`
//!
//! Renders a square PNG thumbnail (800 pixels unless `-s` says otherwise).
//! Both ASCII and binary STL are accepted.
//!
//! # Examples
//! ```text
//! stl-thumbnail -i bracket.stl -o bracket.png -s 256
//! ```

use std::process;

use stl_thumbnail::config::{self, Config, UsageError};

fn main() {
    let mut args = std::env::args_os();
    let program = args
        .next()
        .map(|arg| arg.to_string_lossy().into_owned())
        .unwrap_or_else(|| "stl-thumbnail".to_string());

    let config = match Config::from_args(args) {
        Ok(c) => c,
        Err(e) => {
            if !matches!(e, UsageError::MissingInput | UsageError::MissingOutput) {
                eprintln!("{}: {}", program, e);
            }
            eprintln!("{}", config::usage(&program));
            process::exit(e.exit_code());
        }
    };

    eprintln!(
        "Rendering {} ({}x{})...",
        config.input.display(),
        config.size,
        config.size
    );

    match stl_thumbnail::render_to_file(&config) {
        Ok(summary) => {
            eprintln!(
                "Rendered {} triangles ({} STL)",
                summary.triangles, summary.encoding
            );
            eprintln!("Saved {}", config.output.display());
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}
