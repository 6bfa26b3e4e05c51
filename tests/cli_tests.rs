#![allow(clippy::panic_in_result_fn)]
#![allow(clippy::unwrap_used)]

use assert_cmd::Command;
use predicates::prelude::*;
use std::fs;
use tempfile::tempdir;

fn jxml() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("jxml")?;
    cmd.env("RUST_LOG", "error");
    Ok(cmd)
}

#[test]
fn test_stdin_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    jxml()?
        .write_stdin(r#"{"a": [{"b": "c"}]}"#)
        .assert()
        .success()
        .stdout("<a><b>c</b></a>");
    Ok(())
}

#[test]
fn test_indent_and_declaration() -> Result<(), Box<dyn std::error::Error>> {
    jxml()?
        .args(["-i", "space", "--declaration"])
        .write_stdin(r#"{"root": [{"a": 1}]}"#)
        .assert()
        .success()
        .stdout("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<root>\n    <a>1</a>\n</root>\n");
    Ok(())
}

#[test]
fn test_standalone_implies_declaration() -> Result<(), Box<dyn std::error::Error>> {
    jxml()?
        .args(["--standalone", "yes"])
        .write_stdin(r#"{"a": null}"#)
        .assert()
        .success()
        .stdout("<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?><a/>");
    Ok(())
}

#[test]
fn test_rows_from_ndjson() -> Result<(), Box<dyn std::error::Error>> {
    jxml()?
        .args(["--rows", "rows"])
        .write_stdin("{\"id\": 1}\n{\"id\": 2}\n")
        .assert()
        .success()
        .stdout("<rows><row><id>1</id></row><row><id>2</id></row></rows>");
    Ok(())
}

#[test]
fn test_rows_with_custom_row_name() -> Result<(), Box<dyn std::error::Error>> {
    jxml()?
        .args(["--rows", "list", "--row", "item"])
        .write_stdin("\"x\" \"y\"")
        .assert()
        .success()
        .stdout("<list><item>x</item><item>y</item></list>");
    Ok(())
}

#[test]
fn test_invalid_json_fails() -> Result<(), Box<dyn std::error::Error>> {
    jxml()?
        .write_stdin("{not json")
        .assert()
        .failure()
        .stderr(predicate::str::contains("not valid JSON"));
    Ok(())
}

#[test]
fn test_file_input_and_output() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    let input = dir.path().join("in.json");
    let output = dir.path().join("out.xml");
    fs::write(&input, r#"[{"a": 1}, {"b": {"_cdata": "x]]>y"}}]"#)?;

    jxml()?
        .arg(&input)
        .arg("-o")
        .arg(&output)
        .arg("--stream")
        .assert()
        .success();

    assert_eq!(
        fs::read_to_string(&output)?,
        "<a>1</a><b><![CDATA[x]]]]><![CDATA[>y]]></b>"
    );
    Ok(())
}

#[test]
fn test_missing_input_file() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    jxml()?
        .arg(dir.path().join("absent.json"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("failed to read input file"));
    Ok(())
}
