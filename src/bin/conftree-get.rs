//! `conftree-get`: print a value or subtree from any supported backend.
//!
//! ```sh
//! conftree-get --uri json:///etc/app/config.json --key database/url
//! conftree-get --uri etcd-v3://127.0.0.1:2379 --key services/api --recursive
//! RUST_LOG=conftree=debug conftree-get --key host
//! ```

use std::process::ExitCode;

use clap::Parser;

use conftree::{GetArgs, Settings};

fn main() -> ExitCode {
    env_logger::init();
    let args = GetArgs::parse();

    match Settings::load().and_then(|settings| args.run(&settings)) {
        Ok(output) => {
            print!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
