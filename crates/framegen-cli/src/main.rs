use std::error::Error;
use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use framegen_batch::{rerun_missing_cases, BatchLayout};
use framegen_core::bucket::{ensure_bucket_dirs, DEFAULT_BUCKET_COUNT, DEFAULT_BUCKET_SIZE, INPUT_BUCKET_PREFIX};
use framegen_core::SiteSettings;
use framegen_graph::{artifact_path, build_case_graph, export_case_graph, remove_case_artifact};
use framegen_plan::{
    read_plan, sample_plan, validate_plan, write_plan, DesignSpace, SamplerConfig,
};

#[derive(Parser, Debug)]
#[command(name = "framegen", about = "Parametric frame dataset pipeline CLI")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sample a plan of unique design cases and write it to disk.
    Sample(SampleArgs),
    /// Build and export graph artifacts for every case in a plan.
    Build(BuildArgs),
    /// Pre-create the bucketed shard directories.
    Buckets(BucketArgs),
    /// Replay cases named by a missing-case report.
    RerunMissing(RerunArgs),
}

#[derive(ClapArgs, Debug)]
struct SampleArgs {
    /// Number of unique cases to sample.
    #[arg(long)]
    target: usize,
    /// Master seed for the run.
    #[arg(long)]
    seed: u64,
    /// Plan output path (`.jsonl`, with a `.csv` sibling).
    #[arg(long)]
    out: PathBuf,
    /// Override the attempt budget.
    #[arg(long)]
    max_attempts: Option<usize>,
}

#[derive(ClapArgs, Debug)]
struct BuildArgs {
    /// Plan file produced by `framegen sample`.
    #[arg(long)]
    plan: PathBuf,
    /// Root directory for bucketed graph artifacts.
    #[arg(long)]
    out: PathBuf,
    /// Cases per bucket.
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    bucket_size: u64,
    /// Number of pre-declared buckets.
    #[arg(long = "buckets", default_value_t = DEFAULT_BUCKET_COUNT)]
    bucket_count: u64,
}

#[derive(ClapArgs, Debug)]
struct BucketArgs {
    /// Root directory for bucketed graph artifacts.
    #[arg(long)]
    out: PathBuf,
    /// Cases per bucket.
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    bucket_size: u64,
    /// Number of pre-declared buckets.
    #[arg(long = "buckets", default_value_t = DEFAULT_BUCKET_COUNT)]
    bucket_count: u64,
}

#[derive(ClapArgs, Debug)]
struct RerunArgs {
    /// Plan file produced by `framegen sample`.
    #[arg(long)]
    plan: PathBuf,
    /// Root directory holding the bucketed output.
    #[arg(long)]
    out: PathBuf,
    /// Extra directories searched for the missing-case report, in order.
    #[arg(long = "report-root", value_name = "DIR")]
    report_roots: Vec<PathBuf>,
    /// Cases per bucket.
    #[arg(long, default_value_t = DEFAULT_BUCKET_SIZE)]
    bucket_size: u64,
    /// Number of pre-declared buckets.
    #[arg(long = "buckets", default_value_t = DEFAULT_BUCKET_COUNT)]
    bucket_count: u64,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    match cli.command {
        Command::Sample(args) => run_sample(args),
        Command::Build(args) => run_build(args),
        Command::Buckets(args) => run_buckets(args),
        Command::RerunMissing(args) => run_rerun(args),
    }
}

fn run_sample(args: SampleArgs) -> Result<(), Box<dyn Error>> {
    let space = DesignSpace::default();
    let settings = SiteSettings::default();
    let config = SamplerConfig {
        target: args.target,
        seed: args.seed,
        max_attempts: args.max_attempts,
    };

    let plan = sample_plan(&space, &settings, &config)?;
    if plan.exhausted {
        eprintln!(
            "[sampler] attempt budget exhausted: {} of {} cases after {} attempts",
            plan.cases.len(),
            args.target,
            plan.attempts
        );
    }
    validate_plan(&plan.cases)?;
    let paths = write_plan(&plan.cases, &args.out)?;
    println!(
        "[sampler] {} cases written to {} (table: {}, attempts: {})",
        plan.cases.len(),
        paths.records.display(),
        paths.table.display(),
        plan.attempts
    );
    Ok(())
}

fn run_build(args: BuildArgs) -> Result<(), Box<dyn Error>> {
    let settings = SiteSettings::default();
    let cases = read_plan(&args.plan)?;
    validate_plan(&cases)?;
    ensure_bucket_dirs(&args.out, INPUT_BUCKET_PREFIX, args.bucket_size, args.bucket_count)?;

    let total = cases.len();
    let mut exported = 0usize;
    let mut skipped = 0usize;
    let mut failed = 0usize;
    for case in &cases {
        // Resumed runs skip finished cases without rebuilding their graphs.
        match artifact_path(&args.out, case.case_id, args.bucket_size, args.bucket_count) {
            Ok(path) if path.exists() => {
                skipped += 1;
                continue;
            }
            Ok(_) => {}
            Err(err) => {
                failed += 1;
                eprintln!("[graph] case {} failed: {err}", case.case_id);
                continue;
            }
        }
        let graph = build_case_graph(case, &settings);
        if !graph.skipped.is_empty() {
            eprintln!(
                "[graph] case {}: {} members dropped during resolution",
                case.case_id,
                graph.skipped.len()
            );
        }
        match export_case_graph(&graph, &settings, &args.out, args.bucket_size, args.bucket_count)
        {
            Ok(outcome) if outcome.already_existed => skipped += 1,
            Ok(_) => exported += 1,
            Err(err) => {
                // One bad case must not sink the batch.
                failed += 1;
                eprintln!("[graph] case {} failed: {err}", case.case_id);
            }
        }
    }
    println!(
        "[graph] done: total={total}, exported={exported}, existing={skipped}, failed={failed}"
    );
    if failed > 0 {
        return Err(format!("{failed} of {total} cases failed to export").into());
    }
    Ok(())
}

fn run_buckets(args: BucketArgs) -> Result<(), Box<dyn Error>> {
    let dirs = ensure_bucket_dirs(
        &args.out,
        INPUT_BUCKET_PREFIX,
        args.bucket_size,
        args.bucket_count,
    )?;
    println!(
        "[buckets] {} shard directories ready under {}",
        dirs.len(),
        args.out.display()
    );
    Ok(())
}

fn run_rerun(args: RerunArgs) -> Result<(), Box<dyn Error>> {
    let settings = SiteSettings::default();
    let cases = read_plan(&args.plan)?;
    let layout = BatchLayout::new(&args.out, args.bucket_size, args.bucket_count);

    let mut roots = args.report_roots.clone();
    roots.push(args.out.clone());
    if let Some(plan_dir) = args.plan.parent() {
        roots.push(plan_dir.to_path_buf());
    }

    let out_root = args.out.clone();
    let (bucket_size, bucket_count) = (args.bucket_size, args.bucket_count);
    let outcome = rerun_missing_cases(&cases, &layout, &roots, |case, ordinal, total| {
        println!("[rerun] case {} ({ordinal}/{total})", case.case_id);
        remove_case_artifact(&out_root, case.case_id, bucket_size, bucket_count)?;
        let graph = build_case_graph(case, &settings);
        export_case_graph(&graph, &settings, &out_root, bucket_size, bucket_count)?;
        Ok(())
    });

    match outcome {
        Ok(Some(summary)) => {
            println!(
                "[rerun] done: total={}, success={}, failed={}, skipped={}",
                summary.total, summary.success, summary.failed, summary.skipped
            );
            if !summary.failed_ids.is_empty() {
                eprintln!("[rerun] failed case ids: {:?}", summary.failed_ids);
            }
        }
        Ok(None) => println!("[rerun] no missing-case report found, nothing to do"),
        Err(err) => {
            // An unreadable report is not fatal to the surrounding pipeline.
            eprintln!("[rerun] report could not be processed: {err}");
        }
    }
    Ok(())
}
