use heapcap::adapters::{StdEnvAdapter, StdFsAdapter};
use heapcap::observability::init_observability;
use heapcap::{plan, Config, DryRunExecutor, Executor, LaunchConfig, ProcessExecutor};

fn main() {
    // Logging is best effort; the launch must go ahead regardless.
    let _ = init_observability();

    let config = Config::from_env(&StdEnvAdapter);
    let launch = LaunchConfig::from_env(&config, &StdEnvAdapter);
    let plan = plan(&launch, &StdFsAdapter);

    let result = if config.dry_run {
        DryRunExecutor::new(std::io::stdout().lock()).exec(&plan)
    } else {
        ProcessExecutor.exec(&plan)
    };

    if let Err(e) = result {
        eprintln!("heapcap: {e:#}");
        std::process::exit(1);
    }
}
