use clap::*;
use colphy::libs::hal;
use colphy::libs::phylo::normalize;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("column")
        .about("Gene tree and flanking regions of one alignment column")
        .after_help(
            r###"
Builds the tree of every site aligned to one position of a hierarchical
alignment, then prints the bases around each extant site.

Notes:
* Input: a `.halt` text alignment.
* Without --sequence, --position is in genome coordinates.
* Without --position, a site is drawn at random (see --seed).
* Output: `#<newick>` followed by FASTA records named `genome.sequence|offset`.
  Sites reversed relative to the anchor are reverse complemented.

Examples:
1. Column at offset 1 of human chr1:
   colphy column tests/hal/small.halt --genome human --sequence chr1 --position 1

2. Random column, ancestors relabeled by species:
   colphy column tests/hal/small.halt --genome human --seed 7 --lca --tree-only
"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Input .halt alignment. [stdin] for standard input"),
        )
        .arg(
            Arg::new("genome")
                .long("genome")
                .short('g')
                .required(true)
                .num_args(1)
                .help("Genome of the anchor site"),
        )
        .arg(
            Arg::new("sequence")
                .long("sequence")
                .short('s')
                .num_args(1)
                .help("Sequence of the anchor site"),
        )
        .arg(
            Arg::new("position")
                .long("position")
                .short('p')
                .num_args(1)
                .value_parser(value_parser!(usize))
                .help("0-based position of the anchor site"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("0")
                .value_parser(value_parser!(u64))
                .help("Random seed for drawing the position"),
        )
        .arg(
            Arg::new("width")
                .long("width")
                .short('w')
                .num_args(1)
                .default_value("500")
                .value_parser(value_parser!(usize))
                .help("Bases on each side of a site"),
        )
        .arg(
            Arg::new("lca")
                .long("lca")
                .action(ArgAction::SetTrue)
                .help("Label internal nodes by the species MRCA of their children"),
        )
        .arg(
            Arg::new("tree_only")
                .long("tree-only")
                .action(ArgAction::SetTrue)
                .help("Skip the FASTA output"),
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
    let genome = args.get_one::<String>("genome").unwrap();
    let sequence = args.get_one::<String>("sequence").map(|s| s.as_str());
    let seed = *args.get_one::<u64>("seed").unwrap();
    let width = *args.get_one::<usize>("width").unwrap();
    let is_lca = args.get_flag("lca");
    let is_tree_only = args.get_flag("tree_only");
    let outfile = args.get_one::<String>("outfile").unwrap();

    let aln = hal::Alignment::from_file(infile)?;

    let position = match args.get_one::<usize>("position") {
        Some(p) => *p,
        None => {
            let id = aln
                .genome_id(genome)
                .ok_or_else(|| hal::HalError::UnknownGenome(genome.to_string()))?;
            let g = aln.genome(id);
            let length = match sequence {
                Some(name) => {
                    g.sequence(name)
                        .ok_or_else(|| hal::HalError::UnknownSequence {
                            genome: genome.to_string(),
                            sequence: name.to_string(),
                        })?
                        .length
                }
                None => g.length(),
            };
            if length == 0 {
                anyhow::bail!("Nothing to sample in {}", genome);
            }
            let mut rng = StdRng::seed_from_u64(seed);
            rng.gen_range(0..length)
        }
    };

    let anchor = aln.locus(genome, sequence, position)?;
    log::info!("Anchor site {}", aln.label(anchor)?);

    let column = hal::column(&aln, anchor, true)?;
    let mut tree = hal::build_gene_tree(&aln, &column)?;
    log::info!("{} sites, {} nodes in the tree", column.len(), tree.len());

    if is_lca {
        normalize::relabel_to_lca(&mut tree, &aln.species_tree()?)?;
    }

    let mut writer = intspan::writer(outfile);
    writer.write_all(format!("#{}\n", tree.to_newick()).as_ref())?;

    if !is_tree_only {
        let extant: Vec<_> = column
            .into_iter()
            .filter(|e| aln.genome(e.locus.genome).is_leaf())
            .collect();
        for region in hal::flanking_regions(&aln, &extant, width)? {
            writer.write_all(region.to_fasta().as_ref())?;
        }
    }

    Ok(())
}
