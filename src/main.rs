use cloudify_bootstrap::InstallerError;
use cloudify_bootstrap::cli::Cli;
use cloudify_bootstrap::install::run_install;
use cloudify_bootstrap::logging;

fn main() {
    let cli = Cli::parse_args();
    let logger = logging::init(cli.verbosity());

    if let Err(e) = run_install(cli, &logger) {
        logger.error(format!("{e:#}"));
        logger.flush();
        let code = e
            .downcast_ref::<InstallerError>()
            .map_or(1, InstallerError::exit_code);
        std::process::exit(code);
    }
    logger.flush();
}
