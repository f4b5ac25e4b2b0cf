mod common;
mod run_batch;
mod run_expand;

use crate::common::*;
use run_batch::*;
use run_expand::*;

#[derive(Parser, Debug)]
#[command(
    version,
    about = "LENTIL",
    long_about = "Latent topic inference and query expansion for short texts.\n\
		  Topics are inferred against a pretrained LDA model \n\
		  (`topic term:count ...` per line) and each query is expanded \n\
		  into a weighted bag of related terms.",
    term_width = 80
)]
struct Cli {
    #[command(subcommand)]
    commands: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(
        about = "Expand a single query",
        long_about = "Infer the topic distribution of one query and print \n\
		      the expanded terms as `term:weight`, heaviest first."
    )]
    Expand(ExpandArgs),

    #[command(
        about = "Expand every line of a query file",
        long_about = "Process a query file line by line: echo the query, \n\
		      its `topic:probability` lines, the expanded terms and a separator."
    )]
    Batch(BatchArgs),

    #[command(
        about = "Print the topic assigned to each query term",
        long_about = "Run the sweeps on one query and print the final \n\
		      topic of every known term as `term:topic`."
    )]
    Assign(AssignArgs),
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    match &cli.commands {
        Commands::Expand(args) => {
            run_expand(args)?;
        }
        Commands::Batch(args) => {
            run_batch(args)?;
        }
        Commands::Assign(args) => {
            run_assign(args)?;
        }
    }

    Ok(())
}
