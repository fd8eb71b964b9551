use clap::*;
use colphy::libs::phylo::{guided_nj, join_cost, tree};
use colphy::libs::similarity;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("guided-nj")
        .about("Neighbor-joining guided by a species tree")
        .after_help(
            r###"
Builds a tree from an aligned multi-FASTA with neighbor-joining, adding to
each candidate join the duplication/loss cost implied by the species tree.

Notes:
* Sequences must be aligned (equal length) and named `genome.sequence`.
* Bases are ACGT in either case; `N` and `-` are skipped pairwise.
* The species tree (file or literal Newick) is labeled by genome names.
* With both costs at 0 this is plain neighbor-joining.

Examples:
1. Plain neighbor-joining:
   colphy guided-nj aln.fa species.nwk

2. Penalize duplications and losses:
   colphy guided-nj aln.fa "((human,chimp)HC,gorilla)HCG;" --dup-cost 1 --loss-cost 0.5
"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Aligned FASTA. [stdin] for standard input"),
        )
        .arg(
            Arg::new("species")
                .required(true)
                .index(2)
                .help("Species tree"),
        )
        .arg(
            Arg::new("dup_cost")
                .long("dup-cost")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(f64))
                .help("Join cost per duplication"),
        )
        .arg(
            Arg::new("loss_cost")
                .long("loss-cost")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(f64))
                .help("Join cost per loss"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let dup_cost = *args.get_one::<f64>("dup_cost").unwrap();
    let loss_cost = *args.get_one::<f64>("loss_cost").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let species = tree::io::from_arg(args.get_one::<String>("species").unwrap())?;

    let aligned = similarity::read_aligned_fasta(infile)?;
    if aligned.is_empty() {
        anyhow::bail!("No sequences in {}", infile);
    }
    let matrix = similarity::similarity_matrix(&aligned)?;
    log::info!(
        "{} sequences from {} genomes",
        aligned.len(),
        aligned.genome_to_indices.len()
    );

    let costs = join_cost::compute_join_costs(&species, dup_cost, loss_cost)?;
    let matrix_to_join = join_cost::map_matrix_indices(&aligned.genome_to_indices, &species, &costs)?;

    let mut tree = guided_nj::guided_neighbor_joining(&matrix, &costs, &matrix_to_join, &species)?;
    guided_nj::relabel_leaves(&mut tree, &aligned.headers)?;

    let mut writer = intspan::writer(outfile);
    writer.write_all((tree.to_newick() + "\n").as_ref())?;

    Ok(())
}
