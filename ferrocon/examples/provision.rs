//! Provisioning example
//!
//! This example wipes a switch over its serial console and, optionally,
//! loads firmware from a TFTP server.
//!
//! # Usage
//!
//! ```bash
//! cargo run --example provision -- --port /dev/ttyUSB0 --model ICX7150 --codes codes.txt --upload
//! ```
//!
//! Power-cycle the switch after starting the example: the sequences begin
//! by catching the boot menu countdown.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use ferrocon::{SwitchBuilder, Transport};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();

    if args.list {
        for port in Transport::available_ports()? {
            println!("{}", port);
        }
        return Ok(());
    }

    let mut builder = SwitchBuilder::new(&args.port)
        .baud_rate(args.baud)
        .model(&args.model);
    if let Some(codes) = &args.codes {
        builder = builder.descriptor_path(codes);
    }
    if let Some(secs) = args.timeout {
        builder = builder.wait_timeout(Duration::from_secs(secs));
    }

    let mut switch = builder.build()?;
    println!("Firmware for {}: {:?}\n", switch.model(), switch.firmware());

    println!("Opening {} at {} baud...", args.port, args.baud);
    switch.connect()?;
    println!("Waiting for the boot menu, power-cycle the switch now.\n");

    let wiped = switch.wipe().await?;
    println!("Wipe: {}", wiped);

    if args.upload {
        let uploaded = switch.upload().await?;
        println!("Upload: {}", uploaded);
    }

    switch.close().await?;
    Ok(())
}

struct Args {
    port: String,
    baud: u32,
    model: String,
    codes: Option<PathBuf>,
    timeout: Option<u64>,
    upload: bool,
    list: bool,
}

impl Args {
    fn parse() -> Self {
        let args: Vec<String> = env::args().collect();
        let mut port = "/dev/ttyUSB0".to_string();
        let mut baud = 9600u32;
        let mut model = "ICX7150".to_string();
        let mut codes = None;
        let mut timeout = None;
        let mut upload = false;
        let mut list = false;

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--port" | "-p" => {
                    i += 1;
                    if i < args.len() {
                        port = args[i].clone();
                    }
                }
                "--baud" | "-b" => {
                    i += 1;
                    if i < args.len() {
                        baud = args[i].parse().unwrap_or(9600);
                    }
                }
                "--model" | "-m" => {
                    i += 1;
                    if i < args.len() {
                        model = args[i].clone();
                    }
                }
                "--codes" | "-c" => {
                    i += 1;
                    if i < args.len() {
                        codes = Some(PathBuf::from(&args[i]));
                    }
                }
                "--timeout" | "-t" => {
                    i += 1;
                    if i < args.len() {
                        timeout = args[i].parse().ok();
                    }
                }
                "--upload" | "-u" => upload = true,
                "--list" | "-l" => list = true,
                "--help" => {
                    Self::print_help();
                    std::process::exit(0);
                }
                _ => {}
            }
            i += 1;
        }

        Self {
            port,
            baud,
            model,
            codes,
            timeout,
            upload,
            list,
        }
    }

    fn print_help() {
        println!(
            r#"ferrocon provisioning example

USAGE:
    cargo run --example provision -- [OPTIONS]

OPTIONS:
    -p, --port <PORT>        Serial port [default: /dev/ttyUSB0]
    -b, --baud <BAUD>        Baud rate [default: 9600]
    -m, --model <MODEL>      Switch model [default: ICX7150]
    -c, --codes <FILE>       Firmware descriptor file
    -t, --timeout <SECS>     Give up a wait after this many seconds
    -u, --upload             Load firmware after the wipe
    -l, --list               List serial ports and exit
        --help               Print help
"#
        );
    }
}
