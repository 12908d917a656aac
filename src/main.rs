use clap::Parser;

use citegraph::app;
use citegraph::args::Args;
use citegraph::error::CiteGraphError;
use citegraph::logging::init_logger;

fn main() {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            let _ = e.print();
            // --help / --version 正常退出
            std::process::exit(if e.use_stderr() { 1 } else { 0 });
        }
    };
    init_logger(args.verbose);

    match app::run(&args) {
        Ok(report) => app::print_summary(&report),
        Err(e) => {
            match e.downcast_ref::<CiteGraphError>() {
                Some(err) => {
                    err.log();
                    if e.chain().count() > 1 {
                        eprintln!("citegraph: {e}");
                    }
                    eprintln!("{}", err.user_message());
                }
                None => {
                    log::error!("{e:?}");
                    eprintln!("❌ {e:#}");
                }
            }
            std::process::exit(1);
        }
    }
}
