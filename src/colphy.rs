extern crate clap;
use clap::*;

mod cmd_colphy;

fn main() -> anyhow::Result<()> {
    let app = Command::new("colphy")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`colphy` - Column phylogenies from hierarchical alignments")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::Count)
                .global(true)
                .help("Log more: -v for info, -vv for debug"),
        )
        .subcommand(cmd_colphy::column::make_subcommand())
        .subcommand(cmd_colphy::reconcile::make_subcommand())
        .subcommand(cmd_colphy::guided_nj::make_subcommand())
        .subcommand(cmd_colphy::score::make_subcommand())
        .after_help(
            r###"Subcommands:

* Alignment columns:
    * column    - Gene tree and flanking FASTA of one alignment column

* Trees:
    * reconcile - Reconcile a gene tree against a species tree
    * guided-nj - Neighbor-joining guided by species-tree join costs
    * score     - Compare coalescences of two trees of one column

"###,
        );

    let matches = app.get_matches();

    env_logger::Builder::new()
        .filter_level(match matches.get_count("verbose") {
            0 => log::LevelFilter::Warn,
            1 => log::LevelFilter::Info,
            _ => log::LevelFilter::Debug,
        })
        .init();

    match matches.subcommand() {
        Some(("column", sub_matches)) => cmd_colphy::column::execute(sub_matches),
        Some(("reconcile", sub_matches)) => cmd_colphy::reconcile::execute(sub_matches),
        Some(("guided-nj", sub_matches)) => cmd_colphy::guided_nj::execute(sub_matches),
        Some(("score", sub_matches)) => cmd_colphy::score::execute(sub_matches),
        _ => unreachable!(),
    }?;

    Ok(())
}
