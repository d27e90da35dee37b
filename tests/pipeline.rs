use anyhow::Result;
use rowbeam::testing::{read_json_array, CsvFixture, FailingStore};
use rowbeam::{
    AgeDistribution, Config, DryRunStore, IngestError, IngestPipeline, MemoryStore,
    StorageErrorKind, UserStore,
};
use serde_json::json;
use std::num::NonZeroUsize;

const HEADER: &str = "name.firstName,name.lastName,age,address.city,gender";

fn people() -> std::io::Result<CsvFixture> {
    CsvFixture::new(HEADER)?
        .rows([
            "Jane,Doe,30,NYC,female",
            "John,Smith,17,,",
            "Bad,Row,,Boston,male",
            "Ann,Lee,45,LA,",
            "Old,Timer,70,,male",
        ])
        .write()
}

#[test]
fn partial_failure_keeps_going() -> Result<()> {
    let fx = people()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;

    assert_eq!(summary.total_rows, 5);
    assert_eq!(summary.success_count, 4);
    assert_eq!(summary.failed_count, 1);
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].row_index, 2);
    assert_eq!(summary.rejected[0].line, 4, "header is line 1");
    assert_eq!(
        summary.age_distribution,
        AgeDistribution {
            under_20: 25,
            from_20_to_40: 25,
            from_40_to_60: 25,
            over_60: 25,
        }
    );

    // every row, valid or not, lands in the records array
    let records = read_json_array(&summary.outputs.records)?;
    assert_eq!(records.len(), 5);
    assert_eq!(
        records[2],
        json!({"name": {"firstName": "Bad", "lastName": "Row"}, "address": {"city": "Boston"}, "gender": "male"})
    );

    // only valid rows with leftovers land in additional-info
    let extra = read_json_array(&summary.outputs.additional_info)?;
    assert_eq!(
        extra,
        vec![
            json!({"recordIndex": 0, "name": "Jane Doe", "additional_info": {"gender": "female"}}),
            json!({"recordIndex": 4, "name": "Old Timer", "additional_info": {"gender": "male"}}),
        ]
    );

    let rows = store.rows()?;
    let names: Vec<&str> = rows.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, vec!["Jane Doe", "John Smith", "Ann Lee", "Old Timer"]);
    assert_eq!(
        serde_json::to_value(&rows[0].address)?,
        json!({"city": "NYC"})
    );
    assert!(rows[1].address.is_none());
    assert!(rows[1].additional_info.is_none());
    Ok(())
}

#[test]
fn outputs_default_to_input_directory() -> Result<()> {
    let fx = people()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    assert_eq!(summary.outputs.records, fx.dir().join("output.json"));
    assert_eq!(
        summary.outputs.additional_info,
        fx.dir().join("additional-info.json")
    );
    Ok(())
}

#[test]
fn output_dir_override() -> Result<()> {
    let fx = people()?;
    let out = tempfile::tempdir()?;
    let target = out.path().join("reports");
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store)
        .with_output_dir(&target)
        .run(fx.input())?;
    assert!(target.join("output.json").is_file());
    assert!(target.join("additional-info.json").is_file());
    assert!(!fx.dir().join("output.json").exists());
    assert_eq!(summary.outputs.records, target.join("output.json"));
    Ok(())
}

#[test]
fn rerun_produces_identical_records_file() -> Result<()> {
    let fx = people()?;
    let store = MemoryStore::new();
    let pipeline = IngestPipeline::new(&store);

    let first = pipeline.run(fx.input())?;
    let records_a = std::fs::read(&first.outputs.records)?;
    let extra_a = std::fs::read(&first.outputs.additional_info)?;

    store.truncate()?;
    let second = pipeline.run(fx.input())?;
    assert_eq!(std::fs::read(&second.outputs.records)?, records_a);
    assert_eq!(std::fs::read(&second.outputs.additional_info)?, extra_a);
    assert_eq!(first, second);
    assert_eq!(store.rows()?.len(), 4);
    Ok(())
}

#[test]
fn empty_file_yields_empty_arrays() -> Result<()> {
    let fx = CsvFixture::new("")?;
    fx.write_bytes(b"")?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;

    assert_eq!(summary.total_rows, 0);
    assert_eq!(summary.age_distribution, AgeDistribution::default());
    assert_eq!(std::fs::read_to_string(&summary.outputs.records)?, "[\n\n]");
    assert_eq!(
        std::fs::read_to_string(&summary.outputs.additional_info)?,
        "[\n\n]"
    );
    assert!(store.batch_sizes()?.is_empty());
    Ok(())
}

#[test]
fn header_only_file_has_no_rows() -> Result<()> {
    let fx = CsvFixture::new(HEADER)?.write()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    assert_eq!(summary.total_rows, 0);
    assert_eq!(summary.success_count, 0);
    assert!(read_json_array(&summary.outputs.records)?.is_empty());
    Ok(())
}

#[test]
fn blank_lines_are_neither_header_nor_rows() -> Result<()> {
    let fx = CsvFixture::new("")?
        .row(HEADER)
        .row("")
        .row("Jane,Doe,30,,")
        .row("   ")
        .write()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    assert_eq!(summary.total_rows, 1);
    assert_eq!(summary.success_count, 1);
    Ok(())
}

#[test]
fn quoted_fields_keep_commas() -> Result<()> {
    let fx = CsvFixture::new("name.firstName,name.lastName,age,address.line1")?
        .row(r#"Jane,"Doe, Jr.",30,"1 Main St, Apt ""B""""#)
        .write()?;
    let store = MemoryStore::new();
    IngestPipeline::new(&store).run(fx.input())?;
    let rows = store.rows()?;
    assert_eq!(rows[0].name, "Jane Doe, Jr.");
    assert_eq!(
        serde_json::to_value(&rows[0].address)?,
        json!({"line1": "1 Main St, Apt \"B\""})
    );
    Ok(())
}

#[test]
fn batches_follow_configured_size() -> Result<()> {
    let rows: Vec<String> = (0..25).map(|i| format!("P,{i},{}", i + 10)).collect();
    let fx = CsvFixture::new("name.firstName,name.lastName,age")?
        .rows(rows)
        .write()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store)
        .with_batch_size(NonZeroUsize::new(10).expect("non-zero"))
        .run(fx.input())?;
    assert_eq!(summary.success_count, 25);
    assert_eq!(store.batch_sizes()?, vec![10, 10, 5]);
    Ok(())
}

#[test]
fn from_config_uses_batch_size_and_output_dir() -> Result<()> {
    let fx = people()?;
    let out = tempfile::tempdir()?;
    let config = Config::from_lookup(|key| match key {
        "INSERT_BATCH_SIZE" => Some("2".to_string()),
        "OUTPUT_DIR" => Some(out.path().display().to_string()),
        _ => None,
    })?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::from_config(&store, &config).run(fx.input())?;
    assert_eq!(store.batch_sizes()?, vec![2, 2]);
    assert_eq!(summary.outputs.records, out.path().join("output.json"));
    Ok(())
}

#[test]
fn storage_failure_aborts_but_closes_outputs() -> Result<()> {
    let rows: Vec<String> = (0..5).map(|i| format!("P,{i},{}", 20 + i)).collect();
    let fx = CsvFixture::new("name.firstName,name.lastName,age,hobby")?
        .rows(rows.iter().map(|r| format!("{r},chess")))
        .write()?;
    let store = FailingStore::new(2);
    let err = IngestPipeline::new(&store)
        .with_batch_size(NonZeroUsize::new(2).expect("non-zero"))
        .run(fx.input())
        .unwrap_err();

    match err {
        IngestError::Storage(e) => assert_eq!(e.kind, StorageErrorKind::Insert),
        other => panic!("expected storage error, got {other}"),
    }
    assert_eq!(store.calls(), 2);
    assert_eq!(store.inner().batch_sizes()?, vec![2]);

    // both arrays were closed and parse as JSON
    assert_eq!(read_json_array(fx.dir().join("output.json"))?.len(), 5);
    assert_eq!(read_json_array(fx.dir().join("additional-info.json"))?.len(), 5);
    Ok(())
}

#[test]
fn dry_run_persists_nothing() -> Result<()> {
    let fx = people()?;
    let store = DryRunStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    assert_eq!(summary.success_count, 4);
    assert_eq!(store.discarded(), 4);
    assert!(store.read_all_ages()?.is_empty());
    assert_eq!(read_json_array(&summary.outputs.records)?.len(), 5);
    Ok(())
}

#[test]
fn missing_input_fails_before_writing_outputs() -> Result<()> {
    let tmp = tempfile::tempdir()?;
    let store = MemoryStore::new();
    let err = IngestPipeline::new(&store)
        .run(tmp.path().join("nope.csv"))
        .unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }));
    assert!(!tmp.path().join("output.json").exists());
    Ok(())
}

#[test]
fn stored_ages_feed_the_histogram() -> Result<()> {
    let fx = CsvFixture::new("name.firstName,name.lastName,age")?
        .rows(["A,A,10", "B,B,25", "C,C,45", "D,D,70", "E,E,39"])
        .write()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    let from_store: rowbeam::AgeHistogram = store.read_all_ages()?.into_iter().collect();
    assert_eq!(from_store.distribution(), summary.age_distribution);
    assert_eq!(summary.age_distribution.from_20_to_40, 40);
    Ok(())
}

#[test]
fn summary_serializes_camel_case() -> Result<()> {
    let fx = people()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    let v = serde_json::to_value(&summary)?;
    assert_eq!(v["totalRows"], json!(5));
    assert_eq!(v["successCount"], json!(4));
    assert_eq!(v["failedCount"], json!(1));
    assert_eq!(v["ageDistribution"]["> 60"], json!(25));
    assert_eq!(v["rejected"][0]["row_index"], json!(2));
    Ok(())
}

#[test]
fn rejected_line_counts_blank_lines() -> Result<()> {
    let fx = CsvFixture::new("name.firstName,name.lastName,age")?
        .rows(["", "Jane,Doe,30", "", "", "No,Age,"])
        .write()?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    assert_eq!(summary.rejected.len(), 1);
    assert_eq!(summary.rejected[0].row_index, 1);
    assert_eq!(summary.rejected[0].line, 6);
    Ok(())
}

#[test]
fn latin1_bytes_do_not_abort_the_run() -> Result<()> {
    let fx = CsvFixture::new("")?;
    fx.write_bytes(b"name.firstName,name.lastName,age\nJane,Doe,30\nJos\xe9,Ruiz,40\nAnn,Lee,50\n")?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;

    assert_eq!(summary.total_rows, 3);
    assert_eq!(summary.success_count, 3);
    let names: Vec<String> = store.rows()?.into_iter().map(|r| r.name).collect();
    assert_eq!(names, vec!["Jane Doe", "Jos\u{fffd} Ruiz", "Ann Lee"]);
    assert_eq!(read_json_array(&summary.outputs.records)?.len(), 3);
    Ok(())
}

#[test]
fn carriage_return_only_file_yields_rows() -> Result<()> {
    let fx = CsvFixture::new("")?;
    fx.write_bytes(b"name.firstName,name.lastName,age\rJane,Doe,30\rAnn,Lee,50\r")?;
    let store = MemoryStore::new();
    let summary = IngestPipeline::new(&store).run(fx.input())?;
    assert_eq!(summary.total_rows, 2);
    assert_eq!(summary.success_count, 2);
    assert_eq!(store.read_all_ages()?, vec![30, 50]);
    Ok(())
}

#[cfg(feature = "compression-gzip")]
#[test]
fn truncated_input_fails_but_closes_outputs() -> Result<()> {
    use flate2::write::GzEncoder;
    use flate2::Compression;
    use std::io::Write;

    let mut body = String::from("name.firstName,name.lastName,age,hobby\n");
    for i in 0..200 {
        body.push_str(&format!("P,{i},{},chess\n", 20 + i % 50));
    }
    let mut enc = GzEncoder::new(Vec::new(), Compression::default());
    enc.write_all(body.as_bytes())?;
    let mut gz = enc.finish()?;
    // drop the CRC and length trailer
    gz.truncate(gz.len() - 8);

    let fx = CsvFixture::new("")?.file_name("people.csv.gz");
    fx.write_bytes(&gz)?;
    let store = MemoryStore::new();
    let err = IngestPipeline::new(&store).run(fx.input()).unwrap_err();
    assert!(matches!(err, IngestError::Io { .. }), "{err}");
    assert!(store.rows()?.is_empty(), "nothing is stored from a failed read");

    read_json_array(fx.dir().join("output.json"))?;
    read_json_array(fx.dir().join("additional-info.json"))?;
    Ok(())
}
