use std::path::PathBuf;

use clap::Parser;

use psdd_rs::{ArithmeticCircuit, SddManager, Vtree};

#[derive(Debug, Parser)]
#[command(author, version)]
struct Cli {
    /// Vtree file (libsdd format).
    #[arg(value_name = "VTREE")]
    vtree: PathBuf,

    /// PSDD file over that vtree.
    #[arg(value_name = "PSDD")]
    psdd: PathBuf,

    /// Output arithmetic circuit (NNF).
    #[clap(long, value_name = "FILE", default_value = "circuit.ac")]
    ac: PathBuf,

    /// Output literal map.
    #[clap(long, value_name = "FILE", default_value = "circuit.lmap")]
    lmap: PathBuf,

    /// Also render the PSDD to this Graphviz file.
    #[clap(long, value_name = "FILE")]
    dot: Option<PathBuf>,

    /// Evidence literals to evaluate the circuit on, e.g. `1 -3`.
    #[clap(long, value_name = "LIT", num_args = 0.., allow_negative_numbers = true)]
    evidence: Vec<i32>,
}

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;

    simplelog::TermLogger::init(
        simplelog::LevelFilter::Info,
        simplelog::Config::default(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    )?;

    let time_total = std::time::Instant::now();

    let args = Cli::parse();
    println!("args = {:?}", args);

    let vtree = Vtree::load(&args.vtree)?;
    let mgr = SddManager::with_vtree(vtree);
    let root = mgr.load_psdd(&args.psdd)?;
    println!("mgr = {:?}", mgr);
    println!("root = {}, size = {}, models = {}", root, mgr.size(root), mgr.model_count(root));

    if let Some(path) = &args.dot {
        mgr.save_psdd_dot(root, None, path)?;
        println!("Wrote {}", path.display());
    }

    let ac = ArithmeticCircuit::compile(&mgr, root)?;
    println!(
        "circuit: {} nodes, {} edges, {} literals",
        ac.node_count(),
        ac.edge_count(),
        ac.literal_count()
    );
    ac.save_ac(&args.ac, &args.lmap)?;
    println!("Wrote {} and {}", args.ac.display(), args.lmap.display());

    println!("Pr({:?}) = {}", args.evidence, ac.evaluate(&args.evidence));

    println!("Total time: {:.3} s", time_total.elapsed().as_secs_f64());
    Ok(())
}
