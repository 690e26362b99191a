use std::path::PathBuf;

use log::info;
use structopt::StructOpt;

use unikv::{BackendOptions, ConsulOptions, MarshalFormat, Options, Result, SledOptions, Store};

#[derive(StructOpt, Debug)]
struct Opt {
    /// Engine to use when no config file is given
    #[structopt(short, long, default_value = "sled", possible_values = &["sled", "consul"])]
    backend: String,

    /// JSON config file with the store options
    #[structopt(short, long, parse(from_os_str))]
    config: Option<PathBuf>,

    /// Database directory (sled)
    #[structopt(short, long, parse(from_os_str))]
    path: Option<PathBuf>,

    /// Agent address (consul)
    #[structopt(short, long)]
    address: Option<String>,

    /// Key prefix (consul)
    #[structopt(long)]
    folder: Option<String>,

    /// Value encoding: json or bincode
    #[structopt(short, long)]
    format: Option<MarshalFormat>,

    #[structopt(subcommand)]
    cmd: Command,
}

#[derive(StructOpt, Debug)]
pub enum Command {
    /// Set the value of a key
    Set { key: String, value: String },

    /// Get the value of a key
    Get { key: String },

    /// Delete a key
    Rm { key: String },
}

fn main() {
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("warn"));
    let opt = Opt::from_args();
    if let Err(e) = run(opt) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(opt: Opt) -> Result<()> {
    let options = options(&opt)?;
    info!("unikv {} with {:?}", env!("CARGO_PKG_VERSION"), options);
    let store = Store::open(options)?;
    let result = match opt.cmd {
        Command::Get { key } => store.get::<String>(&key).map(|value| match value {
            Some(value) => println!("{}", value),
            None => println!("Key not found"),
        }),
        Command::Set { key, value } => store.set(&key, &value),
        Command::Rm { key } => store.delete(&key),
    };
    let closed = store.close();
    result?;
    closed
}

fn options(opt: &Opt) -> Result<Options> {
    let mut options = match &opt.config {
        Some(path) => Options::load(path)?,
        None if opt.backend == "consul" => Options {
            marshal_format: MarshalFormat::default(),
            backend: BackendOptions::Consul(ConsulOptions::default()),
        },
        None => Options {
            marshal_format: MarshalFormat::default(),
            backend: BackendOptions::Sled(SledOptions::default()),
        },
    };

    match &mut options.backend {
        BackendOptions::Sled(sled) => {
            if let Some(path) = &opt.path {
                sled.path = path.clone();
            }
        }
        BackendOptions::Consul(consul) => {
            if let Some(address) = &opt.address {
                consul.address = address.clone();
            }
            if let Some(folder) = &opt.folder {
                consul.folder = folder.clone();
            }
        }
        BackendOptions::Memory => {}
    }
    if let Some(format) = opt.format {
        options.marshal_format = format;
    }
    Ok(options)
}
