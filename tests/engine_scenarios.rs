//! End-to-end ingest scenarios over scripted streams

mod common;

use common::ScriptedSource;
use crossbeam_channel::unbounded;
use serialdaq_rs::chart::{ChannelPacer, ChartBuffer, LogRenderer};
use serialdaq_rs::config::{AxisSelection, ProtocolConfig};
use serialdaq_rs::engine::{IngestEngine, RunEnd};
use serialdaq_rs::sink::{FlatFileSink, RecordSink, WorkbookSink};
use std::time::Duration;
use tempfile::tempdir;

fn header() -> Vec<String> {
    vec!["Row".to_string(), "Reading".to_string(), "Value".to_string()]
}

#[test]
fn flat_file_round_trip() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let mut sink = FlatFileSink::new(&path, header(), ',').unwrap();
    let mut chart = ChartBuffer::disabled();
    let mut source = ScriptedSource::new(&[
        "CLEARDATA",
        "Row,Reading,Value",
        "DATA,1,10",
        "DATA,2,20",
        "",
    ]);

    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), None);
    let end = engine.run(&mut source, &mut sink, &mut chart);
    sink.finish().unwrap();

    assert_eq!(end, RunEnd::StreamEnded);
    assert!(source.is_closed());
    assert_eq!(sink.rows_written(), 3);

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    assert_eq!(lines, vec!["Row,Reading,Value", "DATA,1,10", "DATA,2,20"]);
}

#[test]
fn workbook_two_sheet_session() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.xlsx");
    let mut sink = WorkbookSink::new(&path, header());
    let mut chart = ChartBuffer::disabled();
    let axes = Some(AxisSelection { x: 1, y: 2 });
    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), axes);

    sink.new_page("Trial_1").unwrap();
    let mut source = ScriptedSource::new(&[
        "CLEARDATA",
        "Row,Reading,Value",
        "DATA,1,10",
        "DATA,2,20",
        "",
    ]);
    let end = engine.run(&mut source, &mut sink, &mut chart);
    assert_eq!(end, RunEnd::StreamEnded);
    assert_eq!(sink.rows_written(), 3);
    sink.attach_chart(1, 2).unwrap();

    // Second run onto a fresh sheet of the same workbook
    sink.new_page("Trial_2").unwrap();
    let mut source = ScriptedSource::new(&["CLEARDATA", "Row,Reading,Value", "DATA,3,30", ""]);
    let end = engine.run(&mut source, &mut sink, &mut chart);
    assert_eq!(end, RunEnd::StreamEnded);
    assert_eq!(sink.rows_written(), 2);

    assert_eq!(
        sink.page_names(),
        vec!["Trial_1".to_string(), "Trial_2".to_string()]
    );
    sink.finish().unwrap();
    assert!(path.exists());
    assert!(std::fs::metadata(&path).unwrap().len() > 0);
}

#[test]
fn clear_data_resets_workbook_page() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.xlsx");
    let mut sink = WorkbookSink::new(&path, header());
    let mut chart = ChartBuffer::disabled();
    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), None);

    sink.new_page("Trial_1").unwrap();
    let mut source = ScriptedSource::new(&[
        "CLEARDATA",
        "Row,Reading,Value",
        "DATA,1,10",
        "DATA,2,20",
        "CLEARDATA",
        "DATA,3,30",
        "",
    ]);
    engine.run(&mut source, &mut sink, &mut chart);

    // The in-stream directive rewrote the page: header plus one row
    assert_eq!(sink.rows_written(), 2);
    sink.finish().unwrap();
}

#[test]
fn reset_timer_restarts_elapsed_readings() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let mut sink = FlatFileSink::new(&path, header(), ',').unwrap();
    let mut chart = ChartBuffer::disabled();
    let mut source = ScriptedSource::with_delay(
        &[
            "CLEARDATA",
            "Row,Reading,Value",
            "DATA,TIMER,1",
            "RESETTIMER",
            "DATA,TIMER,2",
            "",
        ],
        Duration::from_millis(20),
    );

    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), None);
    engine.run(&mut source, &mut sink, &mut chart);
    sink.finish().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let timer_at = |line: usize| -> f64 {
        contents
            .lines()
            .nth(line)
            .unwrap()
            .split(',')
            .nth(1)
            .unwrap()
            .parse()
            .unwrap()
    };

    // Three reads elapse before the first reading, one after the reset
    let before = timer_at(1);
    let after = timer_at(2);
    assert!(before > after, "before={} after={}", before, after);
    assert!(after >= 0.0);
}

#[test]
fn label_and_message_rows() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let mut sink = FlatFileSink::new(&path, header(), ',').unwrap();
    let mut chart = ChartBuffer::disabled();
    let mut source = ScriptedSource::new(&[
        "CLEARDATA",
        "Row,Reading,Value",
        "LABEL,phase,two",
        "MSG,device says hi",
        "DATA,1,10",
        "",
    ]);

    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), None);
    engine.run(&mut source, &mut sink, &mut chart);
    sink.finish().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = contents.lines().collect();
    // The label row is written verbatim; the message row is dropped
    assert_eq!(
        lines,
        vec!["Row,Reading,Value", "LABEL,phase,two", "DATA,1,10"]
    );
}

#[test]
fn unlabeled_rows_get_the_data_token() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let mut sink = FlatFileSink::new(&path, header(), ',').unwrap();
    let mut chart = ChartBuffer::disabled();
    let mut source = ScriptedSource::new(&["CLEARDATA", "Row,Reading,Value", "5,10", ""]);

    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), None);
    engine.run(&mut source, &mut sink, &mut chart);
    sink.finish().unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().nth(1).unwrap(), "DATA,5,10");
}

#[test]
fn operator_cancellation_ends_the_run() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let mut sink = FlatFileSink::new(&path, header(), ',').unwrap();

    let (tx, rx) = unbounded();
    tx.send(String::new()).unwrap();
    let mut chart = ChartBuffer::live(
        2,
        Duration::from_millis(1),
        Box::new(LogRenderer::new()),
        Box::new(ChannelPacer::new(rx)),
    );

    let mut source = ScriptedSource::new(&[
        "CLEARDATA",
        "Row,Reading,Value",
        "DATA,1,10",
        "DATA,2,20",
        "DATA,3,30",
        "DATA,4,40",
        "",
    ]);
    let axes = Some(AxisSelection { x: 1, y: 2 });
    let mut engine = IngestEngine::new(ProtocolConfig::default(), header(), axes);
    let end = engine.run(&mut source, &mut sink, &mut chart);

    assert_eq!(end, RunEnd::Cancelled);
    assert!(source.is_closed());
    // Rows written before the cancelling flush stay in the file
    assert!(sink.rows_written() >= 2);
}

#[test]
fn custom_delimiter_and_tokens() {
    let mut cfg = ProtocolConfig::default();
    cfg.delimiter = ';';
    cfg.start_token = "BEGIN".to_string();
    cfg.clear_data_token = "BEGIN".to_string();

    let dir = tempdir().unwrap();
    let path = dir.path().join("run.csv");
    let mut sink = FlatFileSink::new(&path, header(), ';').unwrap();
    let mut chart = ChartBuffer::disabled();
    let mut source =
        ScriptedSource::new(&["BEGIN", "Row;Reading;Value", "DATA;1;10", ""]);

    let mut engine = IngestEngine::new(cfg, header(), None);
    let end = engine.run(&mut source, &mut sink, &mut chart);
    sink.finish().unwrap();

    assert_eq!(end, RunEnd::StreamEnded);
    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents.lines().nth(1).unwrap(), "DATA;1;10");
}
