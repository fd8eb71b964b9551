use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::TempDir;

#[test]
fn command_guided_nj_pair() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("colphy");
    cmd.arg("guided-nj")
        .arg("tests/fasta/pair.fa")
        .arg("tests/newick/species.nwk")
        .assert()
        .success()
        .stdout("(human.chr1:0.05,chimp.chr1:0.05);\n");

    Ok(())
}

#[test]
fn command_guided_nj() -> anyhow::Result<()> {
    let temp = TempDir::new()?;
    let output = temp.path().join("output.nwk");

    let mut cmd = cargo_bin_cmd!("colphy");
    cmd.arg("guided-nj")
        .arg("tests/fasta/aln.fa")
        .arg("((human,chimp)HC,gorilla)HCG;")
        .arg("--dup-cost")
        .arg("1")
        .arg("--loss-cost")
        .arg("0.5")
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let nwk = std::fs::read_to_string(&output)?;
    for header in ["human.chr1", "chimp.chr1", "gorilla.chr1", "human.chr2"] {
        assert!(nwk.contains(header));
    }
    // four leaves, three joins
    assert_eq!(nwk.matches('(').count(), 3);
    assert!(nwk.ends_with(";\n"));
    assert!(!nwk.contains(":-"));

    Ok(())
}

#[test]
fn command_guided_nj_errors() -> anyhow::Result<()> {
    let mut cmd = cargo_bin_cmd!("colphy");
    cmd.arg("guided-nj")
        .arg("tests/fasta/aln.fa")
        .arg("(human,chimp)HC;")
        .assert()
        .failure()
        .stderr(predicate::str::contains(
            "Node with name gorilla not found in species tree",
        ));

    let temp = TempDir::new()?;
    let input = temp.path().join("bad.fa");
    std::fs::write(&input, ">human\nACGT\n>chimp.chr1\nACGT\n")?;

    let mut cmd = cargo_bin_cmd!("colphy");
    cmd.arg("guided-nj")
        .arg(&input)
        .arg("tests/newick/species.nwk")
        .assert()
        .failure()
        .stderr(predicate::str::contains("genome.sequence"));

    let mut cmd = cargo_bin_cmd!("colphy");
    cmd.arg("guided-nj")
        .arg("tests/fasta/pair.fa")
        .arg("tests/newick/species.nwk")
        .arg("--dup-cost=-1")
        .assert()
        .failure()
        .stderr(predicate::str::contains("non-negative"));

    Ok(())
}
