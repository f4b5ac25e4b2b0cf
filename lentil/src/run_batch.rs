use crate::common::*;
use indicatif::{ProgressBar, ProgressDrawTarget};

pub const QUERY_SEPARATOR: &str = "-----------------------------";

#[derive(Args, Debug)]
pub struct BatchArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(
        required = true,
        help = "Query file, one query per line",
        long_help = "Queries, one per line, whitespace-tokenized. \n\
		     Either plain text or gzipped (`.gz`)."
    )]
    pub input_file: Box<str>,

    #[arg(
        short,
        long,
        default_value = "stdout",
        help = "Output file",
        long_help = "Output file (`stdout`, `stderr`, plain or `.gz`). \n\
		     Each query is echoed, followed by `topic:probability` lines, \n\
		     the expanded `term:weight` lines and a separator."
    )]
    pub output: Box<str>,

    #[arg(long, default_value_t = false, help = "Hide the progress bar")]
    pub quiet: bool,
}

/// Run inference and expansion over every line of the input, in order.
pub fn run_batch(args: &BatchArgs) -> anyhow::Result<()> {
    let model = args.model.load_model()?;
    let inference = LdaInference::new(&model, args.model.inference_config())?;
    let expander = QueryExpander::new(
        TopicTermTable::from_model(&model),
        args.model.expansion_config(),
    )?;

    let queries = io::read_lines(&args.input_file)?;
    info!("read {} queries from {}", queries.len(), args.input_file);

    let mut rng = inference.config().new_rng();
    let mut out = io::open_buf_writer(&args.output)?;

    let pb = ProgressBar::new(queries.len() as u64);
    if args.quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }

    let min_prob = expander.config().min_topic_prob;
    let start = Instant::now();

    for query in queries.iter() {
        let tokens = io::split_words(query);

        let elapsed = Instant::now();
        let result = inference.infer(&tokens, &mut rng);
        let expanded = expander.expand(&result);
        info!("{:?} for '{}'", elapsed.elapsed(), query);

        let mut lines: Vec<Box<str>> = vec![query.clone()];
        lines.extend(
            result
                .sorted_distribution(min_prob)
                .into_iter()
                .map(|(t, p)| format!("{}:{}", t, p).into_boxed_str()),
        );
        lines.extend(
            expanded
                .sorted()
                .into_iter()
                .map(|(term, weight)| format!("{}:{}", term, weight).into_boxed_str()),
        );
        lines.push(QUERY_SEPARATOR.into());

        io::write_types(&lines, &mut out)?;
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("processed {} queries in {:?}", queries.len(), start.elapsed());
    Ok(())
}
