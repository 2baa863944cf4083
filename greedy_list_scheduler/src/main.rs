mod disk_allocation;
mod list_scheduler;
mod machine_scheduling;
mod outputs_result;
mod priority_propagation;
mod ready_queue;

use clap::Parser;
use lib::error::Result;
use lib::instance_creator::{create_context_from_file, create_context_from_reader};
use lib::output_log::{create_scheduler_log_yaml_file, write_schedule};
use lib::schedule_validator::{calculate_score, validate_schedule};
use list_scheduler::GreedyListScheduler;
use log::{info, warn};
use outputs_result::dump_greedy_result_to_file;
use std::io::{self, BufWriter};

#[derive(Parser)]
#[clap(
    name = "Greedy_List_Scheduler",
    version = "1.0",
    about = "About:
    Greedy_List_Scheduler places a DAG of tasks on heterogeneous machines and disks.
    Tasks are prioritized by their heaviest downstream chain, disks are handed out first-fit
    to the busiest outputs, and each ready task takes the placement that finishes earliest.
    The instance is read from standard input unless a file is given."
)]
struct ArgParser {
    ///Path to the instance file. `.yaml`/`.yml` files are read as YAML.
    #[clap(short = 'f', long = "instance_file_path")]
    instance_file_path: Option<String>,
    ///Path to output directory. A YAML result log is written there when given.
    #[clap(short = 'o', long = "output_dir_path")]
    output_dir_path: Option<String>,
    ///Check the produced schedule and report its score.
    #[clap(short = 'v', long = "validate")]
    validate: bool,
}

/// `-v` reports its result at info level, so it raises the default filter to info.
fn get_default_log_level(validate: bool) -> &'static str {
    if cfg!(feature = "local") {
        "debug"
    } else if validate {
        "info"
    } else {
        "warn"
    }
}

fn init_logger(validate: bool) {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(get_default_log_level(validate)),
    )
    .init();
}

fn is_schedule_valid(scheduler: &GreedyListScheduler) -> bool {
    match validate_schedule(&scheduler.context) {
        Ok(_) => true,
        Err(err) => {
            warn!("Schedule failed validation: {}", err);
            false
        }
    }
}

fn run(arg: &ArgParser) -> Result<()> {
    let context = match &arg.instance_file_path {
        Some(file_path) => create_context_from_file(file_path)?,
        None => create_context_from_reader(io::stdin().lock())?,
    };

    let mut scheduler = GreedyListScheduler::new(context);
    let makespan = scheduler.schedule()?;

    if arg.validate {
        let validated_makespan = validate_schedule(&scheduler.context)?;
        let score = calculate_score(&scheduler.context, validated_makespan);
        info!(
            "Schedule is valid: makespan {}, score {:.3}",
            validated_makespan, score
        );
    }

    let stdout = io::stdout();
    write_schedule(&mut BufWriter::new(stdout.lock()), &scheduler.context)?;

    if let Some(output_dir_path) = &arg.output_dir_path {
        let file_path =
            create_scheduler_log_yaml_file(output_dir_path, "greedy-list-scheduling")?;
        dump_greedy_result_to_file(
            &file_path,
            makespan,
            calculate_score(&scheduler.context, makespan),
            is_schedule_valid(&scheduler),
        )?;
        scheduler
            .get_schedule_log(makespan)
            .dump_log_to_yaml(&file_path)?;
        info!("Result log written to {}", file_path);
    }
    Ok(())
}

fn main() {
    let arg: ArgParser = ArgParser::parse();
    init_logger(arg.validate);
    if let Err(err) = run(&arg) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
