use clap::Parser;
use folio::cli::{Cli, Commands};
use folio::{Config, init_tracing, serve};

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let explicit = cli.config.as_deref();

    if cli.command == Some(Commands::Init) {
        let path = explicit.map_or_else(Config::default_config_path, std::path::Path::to_path_buf);
        if Config::create_default_if_missing(explicit)? {
            println!("Created default config at {}", path.display());
        } else {
            println!("Config already exists at {}", path.display());
        }
        return Ok(());
    }

    let config = Config::load(explicit)?;
    init_tracing(&config)?;

    let worker_threads = config.general.worker_threads;

    let mut builder = tokio::runtime::Builder::new_multi_thread();
    builder.enable_all();

    if worker_threads > 0 {
        builder.worker_threads(worker_threads);
    }

    let runtime = builder.build()?;
    runtime.block_on(serve(config))
}
