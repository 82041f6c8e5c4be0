mod common;

use common::{
    AddressPattern, CODE_END, CONFIG, Event, FixedClock, MockDisplay, MockInput, MockPower,
    MockStorage, STACK_TOP, STAMP, context, new_log,
};
use crashdump_core::config::ArchProfile;
use crashdump_core::driver::{Devices, SnapshotDriver, dump_path};
use crashdump_core::kind::ExceptionVector;
use crashdump_core::platform::{EncodeError, Extent, Surface};
use crashdump_core::qr::{QR_MAX_BYTES, QrEncoder};
use crashdump_core::region::{ROW_BYTES, STACK_DUMP_LEN};
use crashdump_core::report::{ReportComposer, Snapshot};
use crashdump_core::writer::Report;
use std::collections::VecDeque;

fn section<'a>(text: &'a str, label: &str) -> Option<Vec<&'a str>> {
    let start = text.find(label)? + label.len();
    Some(
        text[start..]
            .lines()
            .take_while(|line| !line.is_empty() && !line.ends_with(':'))
            .collect(),
    )
}

#[test]
fn stack_pointer_one_dump_below_top_fills_stack_section() {
    let snapshot = Snapshot::capture(
        &CONFIG,
        ExceptionVector(4),
        context(STACK_TOP - STACK_DUMP_LEN, 0, 0),
        STAMP,
    );
    let window = snapshot.stack.expect("stack window");
    assert_eq!(window.upper(), STACK_TOP);

    let report: Report = ReportComposer::from_config(&CONFIG).compose(&snapshot, &AddressPattern);
    let rows = section(report.as_str(), "Stack:\n").expect("stack section");
    assert_eq!(rows.len(), (STACK_DUMP_LEN / ROW_BYTES) as usize);
    assert!(rows[0].starts_with("20007F80: 80 81 "));
}

#[test]
fn program_counter_past_code_end_omits_code_section() {
    let snapshot = Snapshot::capture(
        &CONFIG,
        ExceptionVector(3),
        context(STACK_TOP - 0x20, CODE_END + 4, 0),
        STAMP,
    );
    assert_eq!(snapshot.code, None);

    let report: Report = ReportComposer::from_config(&CONFIG).compose(&snapshot, &AddressPattern);
    let text = report.as_str();
    assert!(!text.contains("Code:"));
    assert_eq!(section(text, "Stack:\n").map(|rows| rows.len()), Some(2));
    assert!(text.ends_with("\n\n"));
    assert!(!report.is_truncated());
}

#[test]
fn thumb_bit_selects_code_word_width() {
    let pc = 0x0800_0200;
    let composer = ReportComposer::from_config(&CONFIG);

    let thumb = Snapshot::capture(
        &CONFIG,
        ExceptionVector(1),
        context(0, pc, ArchProfile::ARM9.thumb_mask),
        STAMP,
    );
    let report: Report = composer.compose(&thumb, &AddressPattern);
    let rows = section(report.as_str(), "Code:\n").expect("code section");
    assert_eq!(rows[0], "080001F0: F1F0 F3F2 F5F4 F7F6 F9F8 FBFA FDFC FFFE ");

    let arm = Snapshot::capture(&CONFIG, ExceptionVector(1), context(0, pc, 0), STAMP);
    let report: Report = composer.compose(&arm, &AddressPattern);
    let rows = section(report.as_str(), "Code:\n").expect("code section");
    assert_eq!(rows[0], "080001F0: F3F2F1F0 F7F6F5F4 FBFAF9F8 FFFEFDFC ");
}

#[test]
fn oversize_report_skips_code_but_keeps_summary_and_storage() {
    let log = new_log();
    let mut driver = SnapshotDriver::new(
        CONFIG,
        Devices {
            display: MockDisplay {
                log: log.clone(),
                size: Extent::new(80, 40),
                cell: 1,
            },
            encoder: QrEncoder::new(),
            storage: MockStorage {
                log: log.clone(),
                init_results: VecDeque::new(),
                fail_writes: false,
                written: Vec::new(),
            },
            input: MockInput {
                log: log.clone(),
                presses: VecDeque::new(),
            },
            power: MockPower { log: log.clone() },
        },
    );

    let snapshot = driver.capture(
        &mut FixedClock(STAMP),
        ExceptionVector(4),
        context(STACK_TOP - STACK_DUMP_LEN, 0x0800_0100, 0),
    );
    let mut report: Report<4096> = Report::new();
    driver.compose(&snapshot, &AddressPattern, &mut report);
    // Pad well past the encoder's capacity with whole lines.
    while report.len() <= QR_MAX_BYTES {
        report.append_str("padding padding padding padding\n");
    }

    driver.show_summary(&report);
    assert_eq!(driver.show_visual_code(&report), Err(EncodeError::DataTooLong));
    driver.persist_report(&snapshot.timestamp, &report);

    let events = log.borrow();
    assert!(events.contains(&Event::Clear(Surface::Primary)));
    assert!(!events.iter().any(|event| matches!(
        event,
        Event::Clear(Surface::Secondary) | Event::Code { .. }
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::Write { len, .. } if *len == report.len()
    )));
    assert_eq!(driver.devices().storage.written, report.as_bytes());
}

#[test]
fn dump_path_is_deterministic() {
    let first = dump_path(CONFIG.output_dir, &STAMP).expect("path");
    let second = dump_path(CONFIG.output_dir, &STAMP).expect("path");
    assert_eq!(first, second);
    assert_eq!(first.as_str(), "0:/dumps/exception_dump_250314150926.txt");
}
