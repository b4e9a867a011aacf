use clap::Parser;
use console::style;
use metalens::cli::{Cli, Commands};
use metalens::commands;

fn main() {
    let cli = Cli::parse();
    if cli.no_color {
        console::set_colors_enabled(false);
    }

    let outcome = match &cli.command {
        Commands::Inspect {
            targets,
            recursive,
            format,
            report,
        } => commands::run_inspect(targets, *recursive, *format, report.as_deref(), cli.verbose),
        Commands::Strip {
            targets,
            recursive,
            out_dir,
            in_place,
            dry_run,
            wipe_info,
            report,
            policy,
        } => commands::run_strip(
            targets,
            &commands::StripArgs {
                recursive: *recursive,
                out_dir: out_dir.clone(),
                in_place: *in_place,
                dry_run: *dry_run,
                wipe_info: *wipe_info,
                report: report.clone(),
            },
            policy,
        ),
        Commands::Explain { target } => commands::run_explain(target),
        Commands::Policy { name } => commands::run_policy(name.as_deref()),
    };

    if let Err(message) = outcome {
        eprintln!("{} {message}", style("metalens:").red().bold());
        std::process::exit(1);
    }
}
