use clap::*;
use colphy::libs::phylo::coalescence::{self, Coalescence, GenomeSummaries, Summary};
use colphy::libs::phylo::tree;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("score")
        .about("Compare coalescences of an alignment tree and a reconciled tree")
        .after_help(
            r###"
For pairs of leaves found in both trees, finds the species of the pair's
MRCA in each tree and classifies the alignment tree's coalescence as
identical, early or late relative to the reconciled one.

Notes:
* Leaves are named `genome.sequence|offset`, as printed by `colphy column`.
* Internal labels name species, possibly as `genome.sequence|offset` of an
  ancestral site (the alignment tree) or as plain species names (the
  reconciled tree).
* With more than --max-pairs pairs, a seeded random sample is scored.
* Output: one line per pair
  `coalescence  first  second  aligned_species  reconciled_species  kind`,
  then `#kind  count  fraction` totals, then per genome and per genome pair
  `#genome  name  identical  early  late  fractions...` and
  `#pair  name1  name2  identical  early  late  fractions...`.
* A pair counts once for each of its genomes.

Examples:
1. Score two trees of one column:
   colphy score aligned.nwk reconciled.nwk species.nwk --max-pairs 100
"###,
        )
        .arg(
            Arg::new("aligned")
                .required(true)
                .index(1)
                .help("Tree induced by the alignment"),
        )
        .arg(
            Arg::new("reconciled")
                .required(true)
                .index(2)
                .help("Independently estimated, reconciled tree"),
        )
        .arg(
            Arg::new("species")
                .required(true)
                .index(3)
                .help("Species tree"),
        )
        .arg(
            Arg::new("max_pairs")
                .long("max-pairs")
                .num_args(1)
                .default_value("10")
                .value_parser(value_parser!(usize))
                .help("Maximum number of leaf pairs to score"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Random seed for sampling pairs"),
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
    let max_pairs = *args.get_one::<usize>("max_pairs").unwrap();
    let seed = *args.get_one::<u64>("seed").unwrap();
    let outfile = args.get_one::<String>("outfile").unwrap();

    let aligned = tree::io::from_arg(args.get_one::<String>("aligned").unwrap())?;
    let reconciled = tree::io::from_arg(args.get_one::<String>("reconciled").unwrap())?;
    let species = tree::io::from_arg(args.get_one::<String>("species").unwrap())?;

    let mut rng = StdRng::seed_from_u64(seed);
    let scores = coalescence::score_coalescences(&aligned, &reconciled, &species, max_pairs, &mut rng)?;
    if scores.is_empty() {
        log::warn!("No leaf pair is shared by the two trees");
    }

    let mut writer = intspan::writer(outfile);
    for score in &scores {
        writer.write_all(
            format!(
                "coalescence\t{}\t{}\t{}\t{}\t{}\n",
                score.first, score.second, score.aligned, score.reconciled, score.kind
            )
            .as_ref(),
        )?;
    }

    let summary = Summary::from_scores(&scores);
    for kind in [Coalescence::Identical, Coalescence::Early, Coalescence::Late] {
        writer.write_all(
            format!(
                "#{}\t{}\t{:.4}\n",
                kind,
                summary.count(kind),
                summary.fraction(kind)
            )
            .as_ref(),
        )?;
    }

    let by_genome = GenomeSummaries::from_scores(&scores);
    for (genome, summary) in &by_genome.genomes {
        writer.write_all(format!("#genome\t{}\t{}\n", genome, counts(summary)).as_ref())?;
    }
    for ((first, second), summary) in &by_genome.pairs {
        writer.write_all(
            format!("#pair\t{}\t{}\t{}\n", first, second, counts(summary)).as_ref(),
        )?;
    }

    Ok(())
}

// identical, early, late counts followed by their fractions
fn counts(summary: &Summary) -> String {
    let kinds = [Coalescence::Identical, Coalescence::Early, Coalescence::Late];
    let mut fields: Vec<String> = kinds.iter().map(|&k| summary.count(k).to_string()).collect();
    fields.extend(kinds.iter().map(|&k| format!("{:.4}", summary.fraction(k))));
    fields.join("\t")
}
