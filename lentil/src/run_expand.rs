use crate::common::*;

#[derive(Args, Debug)]
pub struct ExpandArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(
        required = true,
        num_args = 1..,
        help = "Query text",
        long_help = "Query text, either quoted or as separate words. \n\
		     Example: \"cheap flights paris\""
    )]
    pub query: Vec<Box<str>>,

    #[arg(short, long, default_value = "stdout", help = "Output file")]
    pub output: Box<str>,
}

/// Expand one query and write `term:weight` lines, heaviest first.
pub fn run_expand(args: &ExpandArgs) -> anyhow::Result<()> {
    let model = args.model.load_model()?;
    let inference = LdaInference::new(&model, args.model.inference_config())?;
    let expander = QueryExpander::new(
        TopicTermTable::from_model(&model),
        args.model.expansion_config(),
    )?;

    let tokens = query_tokens(&args.query);
    let mut rng = inference.config().new_rng();

    let start = Instant::now();
    let result = inference.infer(&tokens, &mut rng);
    let expanded = expander.expand(&result);
    info!(
        "expanded {} terms into {} in {:?}",
        result.doc_len(),
        expanded.len(),
        start.elapsed()
    );

    let lines: Vec<Box<str>> = expanded
        .sorted()
        .into_iter()
        .map(|(term, weight)| format!("{}:{}", term, weight).into_boxed_str())
        .collect();

    let mut out = io::open_buf_writer(&args.output)?;
    io::write_types(&lines, &mut out)?;
    Ok(())
}

#[derive(Args, Debug)]
pub struct AssignArgs {
    #[command(flatten)]
    pub model: ModelArgs,

    #[arg(required = true, num_args = 1.., help = "Query text")]
    pub query: Vec<Box<str>>,

    #[arg(short, long, default_value = "stdout", help = "Output file")]
    pub output: Box<str>,
}

/// Write the final topic of each known query term as `term:topic`.
pub fn run_assign(args: &AssignArgs) -> anyhow::Result<()> {
    let model = args.model.load_model()?;
    let inference = LdaInference::new(&model, args.model.inference_config())?;

    let tokens = query_tokens(&args.query);
    let mut rng = inference.config().new_rng();

    let start = Instant::now();
    let result = inference.infer(&tokens, &mut rng);
    info!(
        "{} sweeps over {} known terms in {:?}",
        result.sweeps,
        result.words.len(),
        start.elapsed()
    );

    let lines: Vec<Box<str>> = result
        .terms
        .iter()
        .zip(result.assignment.iter())
        .map(|(term, topic)| format!("{}:{}", term, topic).into_boxed_str())
        .collect();

    let mut out = io::open_buf_writer(&args.output)?;
    io::write_types(&lines, &mut out)?;
    Ok(())
}
