mod common;

use anyhow::Result;
use predicates::prelude::*;
use protree_test::TestProteins;

use common::*;

#[test]
fn test_index_then_reuse() -> Result<()> {
    let env = CliEnvironment::new()?;
    let fasta = env.sample_fasta()?;

    protree_cmd(&env)
        .arg("index")
        .arg(&fasta)
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 2 proteins"));

    protree_cmd(&env)
        .arg("index")
        .arg(&fasta)
        .assert()
        .success()
        .stdout(predicate::str::contains("Index is current"));

    protree_cmd(&env)
        .arg("index")
        .arg(&fasta)
        .arg("--force")
        .assert()
        .success()
        .stdout(predicate::str::contains("Indexed 2 proteins"));
    Ok(())
}

#[test]
fn test_map_tsv() -> Result<()> {
    let env = CliEnvironment::new()?;
    let fasta = env.sample_fasta()?;

    protree_cmd(&env)
        .args(["map", "--format", "tsv"])
        .arg(&fasta)
        .args(["TIDE", "pept"])
        .assert()
        .success()
        .stdout(predicate::str::contains("TIDE\tTIDE\tP1\t3\n"))
        .stdout(predicate::str::contains("TIDE\tTIDE\tP2\t0\n"))
        .stdout(predicate::str::contains("PEPT\tPEPT\tP1\t0\n"));
    Ok(())
}

#[test]
fn test_map_json_with_ambiguity() -> Result<()> {
    let env = CliEnvironment::new()?;
    let proteins = TestProteins::new()
        .with("P1", "TIDEK")
        .with("P2", "TLDEK");
    let fasta = env.write_proteins(&proteins, "ambiguous.fasta")?;

    let output = protree_cmd(&env)
        .args(["map", "--format", "json", "--mode", "combinatorial"])
        .arg(&fasta)
        .arg("TJDE")
        .output()?;
    assert!(output.status.success());

    let value: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(value[0]["peptide"], "TJDE");
    assert_eq!(value[0]["matches"]["TIDE"]["P1"][0], 0);
    assert_eq!(value[0]["matches"]["TLDE"]["P2"][0], 0);
    Ok(())
}

#[test]
fn test_map_limits_x_share() -> Result<()> {
    let env = CliEnvironment::new()?;
    let proteins = TestProteins::new().with("P1", "PEPTXXEK");
    let fasta = env.write_proteins(&proteins, "unknown_residues.fasta")?;

    protree_cmd(&env)
        .args(["map", "--format", "tsv", "--mode", "combinatorial"])
        .arg(&fasta)
        .arg("TIDE")
        .assert()
        .success()
        .stdout(predicate::str::contains("TIDE\tTXXE\tP1\t3\n"));

    protree_cmd(&env)
        .args(["map", "--format", "tsv", "--mode", "combinatorial", "--limit-x", "0.25"])
        .arg(&fasta)
        .arg("TIDE")
        .assert()
        .success()
        .stdout(predicate::str::contains("TXXE").not());
    Ok(())
}

#[test]
fn test_map_peptide_file() -> Result<()> {
    let env = CliEnvironment::new()?;
    let fasta = env.sample_fasta()?;
    let peptides = env.create_input_file("peptides.txt", "# queries\nTIDE\n\nKPEP\n")?;

    protree_cmd(&env)
        .args(["map", "--format", "tsv", "--peptide-file"])
        .arg(&peptides)
        .arg(&fasta)
        .assert()
        .success()
        .stdout(predicate::str::contains("KPEP\tKPEP\tP2\t4\n"))
        .stdout(predicate::str::contains("TIDE\tTIDE\tP1\t3\n"));
    Ok(())
}

#[test]
fn test_decoy_database() -> Result<()> {
    let env = CliEnvironment::new()?;
    let proteins = protree_test::sample_proteins().with_decoys();
    let fasta = env.write_proteins(&proteins, "decoys.fasta.gz")?;

    protree_cmd(&env)
        .args(["map", "--format", "tsv"])
        .arg(&fasta)
        .arg("EDIT")
        .assert()
        .success()
        .stdout(predicate::str::contains("EDIT\tEDIT\tP1_REVERSED\t1\n"))
        .stdout(predicate::str::contains("EDIT\tEDIT\tP2_REVERSED\t4\n"));
    Ok(())
}

#[test]
fn test_info_and_clear() -> Result<()> {
    let env = CliEnvironment::new()?;
    let fasta = env.sample_fasta()?;

    protree_cmd(&env)
        .arg("info")
        .arg(&fasta)
        .assert()
        .success()
        .stdout(predicate::str::contains("No index stored"));

    index_database(&env, &fasta);

    let output = protree_cmd(&env)
        .args(["info", "--format", "json"])
        .arg(&fasta)
        .output()?;
    assert!(output.status.success());
    let info: serde_json::Value = serde_json::from_slice(&output.stdout)?;
    assert_eq!(info["exists"], true);
    assert_eq!(info["import_complete"], true);
    assert_eq!(info["initial_tag_size"], 3);
    assert_eq!(info["proteins"], 2);

    protree_cmd(&env)
        .arg("clear")
        .arg(&fasta)
        .assert()
        .success()
        .stdout(predicate::str::contains("Deleted index"));

    protree_cmd(&env)
        .arg("clear")
        .arg(&fasta)
        .assert()
        .success()
        .stdout(predicate::str::contains("No index stored"));
    Ok(())
}
