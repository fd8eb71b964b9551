use clap::*;
use colphy::libs::phylo::{normalize, reconcile, species, tree};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("reconcile")
        .about("Reconcile a gene tree against a species tree")
        .after_help(
            r###"
Maps every gene-tree node to a species-tree node (LCA reconciliation), marks
duplications and prints the relabeled gene tree.

Notes:
* Trees are Newick files, or literal Newick strings.
* Leaves map to species through --map (two columns: gene, species). Without
  it the token before the first `.` of each leaf label is the species.
* Unary nodes are collapsed first. A multifurcating tree is resolved
  arbitrarily with a warning, unless --no-binarize is given.
* Internal nodes are labeled by species and carry `[&&NHX:D=Y]` for
  duplications, `[&&NHX:D=N]` for speciations.

Examples:
1. Reconcile with an explicit gene-to-species table:
   colphy reconcile gene.nwk species.nwk --map gene2species.tsv

2. Root at the position with the fewest duplications and losses:
   colphy reconcile gene.nwk "((human,chimp)HC,gorilla)HCG;" --reroot
"###,
        )
        .arg(
            Arg::new("gene")
                .required(true)
                .index(1)
                .help("Gene tree. [stdin] for standard input"),
        )
        .arg(
            Arg::new("species")
                .required(true)
                .index(2)
                .help("Species tree"),
        )
        .arg(
            Arg::new("map")
                .long("map")
                .num_args(1)
                .help("Gene to species table"),
        )
        .arg(
            Arg::new("reroot")
                .long("reroot")
                .action(ArgAction::SetTrue)
                .help("Reroot the gene tree to minimize duplications plus losses"),
        )
        .arg(
            Arg::new("collapse")
                .long("collapse")
                .action(ArgAction::SetTrue)
                .help("Merge nodes labeled like their parent after reconciliation"),
        )
        .arg(
            Arg::new("no_binarize")
                .long("no-binarize")
                .action(ArgAction::SetTrue)
                .help("Fail on multifurcations instead of resolving them"),
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
    let is_reroot = args.get_flag("reroot");
    let is_collapse = args.get_flag("collapse");
    let is_no_binarize = args.get_flag("no_binarize");
    let outfile = args.get_one::<String>("outfile").unwrap();

    let mut gene = tree::io::from_arg(args.get_one::<String>("gene").unwrap())?;
    let species_tree = tree::io::from_arg(args.get_one::<String>("species").unwrap())?;

    let collapsed = normalize::collapse_unary_nodes(&mut gene);
    if collapsed > 0 {
        log::info!("Collapsed {} unary nodes", collapsed);
    }

    if !gene.is_binary() {
        if is_no_binarize {
            anyhow::bail!("Gene tree is not binary");
        }
        let resolved = normalize::binarize(&mut gene)?;
        log::warn!(
            "Resolved {} multifurcations arbitrarily, results are approximate",
            resolved
        );
    }

    let table = match args.get_one::<String>("map") {
        Some(file) => species::read_gene2species(file)?,
        None => species::table_from_leaf_labels(&gene),
    };

    let mut leaf_to_species = species::map_leaves_to_species(&gene, &species_tree, &table)?;
    if is_reroot {
        gene = reconcile::root_by_reconciliation(&gene, &species_tree, &leaf_to_species)?;
        // ids changed with the new rooting
        leaf_to_species = species::map_leaves_to_species(&gene, &species_tree, &table)?;
    }

    let rec = reconcile::reconcile_and_label(&mut gene, &species_tree, &leaf_to_species)?;
    log::info!("{} duplications, {} losses", rec.dups(), rec.losses);

    if is_collapse {
        let removed = normalize::collapse_identical_ancestors(&mut gene)?;
        log::info!("Merged {} nodes into their parents", removed);
    }

    let mut writer = intspan::writer(outfile);
    writer.write_all((gene.to_newick() + "\n").as_ref())?;

    Ok(())
}
